//! Problem instance: a graph, its signal registry and the absorption ledger.
//!
//! Purpose
//! - Give every algorithm one live view of the problem: which elements
//!   remain, which signals each of them carries (own plus absorbed), and which
//!   live elements carry a given signal.
//! - Make merges reversible: `clear` restores an element's own signals and
//!   `expand` turns a result over survivors back into original elements.
//!
//! The registry is shared read-only (`Arc`) between copies; everything that
//! changes during a solve lives in the graph and the ledger.

mod builder;
mod ledger;

pub use builder::InstanceBuilder;
pub use ledger::Ledger;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::Result;
use crate::graph::{EdgeId, Elem, Graph, NodeId};
use crate::signals::{SignalId, Signals};

#[derive(Clone, Debug)]
pub struct Instance {
    graph: Graph,
    signals: Arc<Signals>,
    ledger: Ledger,
    carriers: HashMap<SignalId, BTreeSet<Elem>>,
}

impl Instance {
    /// Wrap a graph and registry after validating the registry.
    pub fn new(graph: Graph, signals: Signals) -> Result<Self> {
        signals.validate()?;
        Ok(Self::assemble(graph, Arc::new(signals), Ledger::default()))
    }

    fn assemble(graph: Graph, signals: Arc<Signals>, ledger: Ledger) -> Self {
        let mut inst = Self {
            graph,
            signals,
            ledger,
            carriers: HashMap::new(),
        };
        for x in inst.graph.elems() {
            for &s in inst.ledger.carried(&inst.signals, x) {
                inst.carriers.entry(s).or_default().insert(x);
            }
        }
        inst
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    pub fn shared_signals(&self) -> Arc<Signals> {
        Arc::clone(&self.signals)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Signals carried by a live element, sorted.
    pub fn carried(&self, x: Elem) -> &[SignalId] {
        self.ledger.carried(&self.signals, x)
    }

    /// Live elements carrying `sig`.
    pub fn carriers(&self, sig: SignalId) -> impl Iterator<Item = Elem> + '_ {
        self.carriers.get(&sig).into_iter().flatten().copied()
    }

    pub fn carrier_count(&self, sig: SignalId) -> usize {
        self.carriers.get(&sig).map_or(0, BTreeSet::len)
    }

    pub fn weight(&self, x: Elem) -> f64 {
        self.signals.sum(self.carried(x).iter().copied())
    }

    /// Score of live elements, each carried signal counted once.
    pub fn score<'a>(&self, elems: impl IntoIterator<Item = &'a Elem>) -> f64 {
        self.signals.sum(
            elems
                .into_iter()
                .flat_map(|&x| self.carried(x).iter().copied()),
        )
    }

    /// Whether some live element carries a mandatory signal.
    pub fn has_mandatory(&self) -> bool {
        self.signals
            .mandatory()
            .into_iter()
            .any(|m| self.carrier_count(m) > 0)
    }

    /// Mandatory signals with a live carrier that `elems` leaves out.
    pub fn uncovered(&self, elems: &[Elem]) -> usize {
        self.signals
            .mandatory()
            .into_iter()
            .filter(|&m| self.carrier_count(m) > 0)
            .filter(|&m| !elems.iter().any(|&x| self.carried(x).contains(&m)))
            .count()
    }

    /// Covering more mandatory signals wins, then the higher score.
    pub fn prefers(&self, cand: &[Elem], current: &[Elem]) -> bool {
        match self.uncovered(cand).cmp(&self.uncovered(current)) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.score(cand) > self.score(current),
        }
    }

    pub fn absorbed(&self, x: Elem) -> &[Elem] {
        self.ledger.absorbed(x)
    }

    /// Sum of the negative signals carried by `x`.
    pub fn neg(&self, x: Elem) -> f64 {
        self.carried(x)
            .iter()
            .map(|&s| self.signals.weight(s))
            .filter(|&w| w < 0.0)
            .sum()
    }

    /// Largest gain `x` can ever add to a selection.
    pub fn ceil(&self, x: Elem) -> f64 {
        let mut pos = 0.0;
        for &s in self.carried(x) {
            let w = self.signals.weight(s);
            if w > 0.0 {
                pos += w;
            }
        }
        pos + self.neg(x)
    }

    /// Gain `x` adds to any selection that does not contain it.
    pub fn floor(&self, x: Elem) -> f64 {
        let mut pos = 0.0;
        for &s in self.carried(x) {
            let w = self.signals.weight(s);
            if w > 0.0 && self.carrier_count(s) == 1 {
                pos += w;
            }
        }
        pos + self.neg(x)
    }

    /// Merge `victim` into `survivor` and remove `victim` from the graph.
    /// Edges still incident to a removed vertex are dropped.
    pub fn absorb(&mut self, survivor: Elem, victim: Elem) {
        let victim_sigs = self.carried(victim).to_vec();
        self.ledger.merge(&self.signals, survivor, victim);
        for s in victim_sigs {
            let set = self.carriers.entry(s).or_default();
            set.remove(&victim);
            set.insert(survivor);
        }
        self.remove(victim);
    }

    /// Merge already-expanded original elements into `survivor`.
    pub fn absorb_originals(&mut self, survivor: Elem, originals: &[Elem]) {
        let fresh = self
            .ledger
            .merge_originals(&self.signals, survivor, originals);
        for s in fresh {
            self.carriers.entry(s).or_default().insert(survivor);
        }
    }

    /// Undo every merge into `x`, restoring its own signals exactly.
    pub fn clear(&mut self, x: Elem) {
        for s in self.ledger.clear(&self.signals, x) {
            if let Some(set) = self.carriers.get_mut(&s) {
                set.remove(&x);
            }
        }
    }

    /// Remove an element (a vertex takes its incident edges along).
    pub fn remove(&mut self, x: Elem) {
        let mut gone = vec![x];
        if let Elem::Node(v) = x {
            gone.extend(self.graph.incident(v).iter().map(|&e| Elem::Edge(e)));
        }
        for &y in &gone {
            if !self.graph.contains(y) {
                continue;
            }
            for &s in self.ledger.carried(&self.signals, y) {
                if let Some(set) = self.carriers.get_mut(&s) {
                    set.remove(&y);
                }
            }
            self.ledger.forget(y);
        }
        self.graph.remove(x);
    }

    pub(crate) fn reattach(&mut self, e: EdgeId, from: NodeId, to: NodeId) {
        self.graph.reattach(e, from, to);
    }

    /// Original elements behind `elems`, sorted and deduplicated.
    pub fn expand<'a>(&self, elems: impl IntoIterator<Item = &'a Elem>) -> Vec<Elem> {
        let mut out = BTreeSet::new();
        for &x in elems {
            out.insert(x);
            out.extend(self.absorbed(x).iter().copied());
        }
        out.into_iter().collect()
    }

    /// Induced copy on `nodes`, keeping ledgers of the kept elements.
    pub fn subinstance(&self, nodes: &BTreeSet<NodeId>) -> Instance {
        self.restrict(self.graph.subgraph(nodes))
    }

    /// Copy made of `nodes` and `edges` (edges need both endpoints kept).
    pub fn subinstance_with(&self, nodes: &BTreeSet<NodeId>, edges: &BTreeSet<EdgeId>) -> Instance {
        self.restrict(self.graph.subgraph_with(nodes, edges))
    }

    fn restrict(&self, graph: Graph) -> Instance {
        let ledger = self.ledger.filtered(|x| graph.contains(x));
        Self::assemble(graph, Arc::clone(&self.signals), ledger)
    }

    /// Heaviest vertex, smallest id on ties.
    pub fn heaviest_node(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for v in self.graph.nodes() {
            let w = self.weight(Elem::Node(v));
            if best.map_or(true, |(_, bw)| w > bw) {
                best = Some((v, w));
            }
        }
        best.map(|(v, _)| v)
    }
}
