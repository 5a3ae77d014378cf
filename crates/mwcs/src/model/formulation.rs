//! Single-commodity flow formulation from a virtual root.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::graph::{EdgeId, Elem, NodeId};
use crate::instance::Instance;
use crate::signals::SignalId;

use super::separator::{Separator, SeparatorCfg};
use super::tighten::{rooted_tightening, RootedTightening, Tightening};
use super::types::{Assignment, Constraint, LinExpr, Model, VarId, VarKind, VarOrigin};

/// Slack applied to the bound-pruning constraint.
pub(crate) const PRUNE_SLACK: f64 = 1e-6;

/// Whether the model has a fixed entry vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rooting {
    #[default]
    Unrooted,
    Rooted { anchor: NodeId },
}

impl Rooting {
    pub fn anchor(self) -> Option<NodeId> {
        match self {
            Rooting::Unrooted => None,
            Rooting::Rooted { anchor } => Some(anchor),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ModelOpts {
    pub rooting: Rooting,
    /// Only solutions scoring at least this are of interest.
    pub lower_bound: Option<f64>,
}

/// A built model together with the maps from graph elements to variables.
#[derive(Clone, Debug)]
pub struct Formulation {
    pub(crate) model: Model,
    pub(crate) rooting: Rooting,
    pub(crate) y: BTreeMap<NodeId, VarId>,
    pub(crate) w: BTreeMap<EdgeId, VarId>,
    pub(crate) arcs: BTreeMap<(EdgeId, NodeId), VarId>,
    pub(crate) entry: BTreeMap<NodeId, VarId>,
    pub(crate) depth: BTreeMap<NodeId, VarId>,
    /// `Σ k·entry_k` over vertices ranked by id (unrooted models only).
    pub(crate) rank: Option<VarId>,
    /// Auxiliary signal variables with the live carriers they follow.
    pub(crate) aux: BTreeMap<SignalId, (VarId, Vec<Elem>)>,
    pub(crate) sum: VarId,
    /// Weighted signal terms defining `sum`.
    pub(crate) terms: LinExpr,
    /// `(v, e, u)`: selecting `v` selects `e` (and so `u`).
    pub(crate) dominance: Vec<(NodeId, EdgeId, NodeId)>,
    pub(crate) tightening: RootedTightening,
}

impl Formulation {
    pub fn build(inst: &Instance, opts: &ModelOpts) -> Formulation {
        let g = inst.graph();
        let n = g.node_count() as f64;
        let mut model = Model::new();

        let mut y = BTreeMap::new();
        let mut entry = BTreeMap::new();
        let mut depth = BTreeMap::new();
        for v in g.nodes() {
            y.insert(v, model.add_var(VarKind::Binary, VarOrigin::Node(v)));
            entry.insert(v, model.add_var(VarKind::Binary, VarOrigin::Entry(v)));
            let d = VarKind::Continuous { lo: 0.0, hi: n };
            depth.insert(v, model.add_var(d, VarOrigin::Depth(v)));
        }
        let mut w = BTreeMap::new();
        let mut arcs = BTreeMap::new();
        for e in g.edges() {
            w.insert(e, model.add_var(VarKind::Binary, VarOrigin::Edge(e)));
            if let Some((a, b)) = g.endpoints(e) {
                if a != b {
                    for into in [a, b] {
                        let x = model.add_var(VarKind::Binary, VarOrigin::Arc { edge: e, into });
                        arcs.insert((e, into), x);
                    }
                }
            }
        }
        let sum = model.add_var(
            VarKind::Continuous {
                lo: f64::NEG_INFINITY,
                hi: f64::INFINITY,
            },
            VarOrigin::Objective,
        );

        let mut f = Formulation {
            model,
            rooting: opts.rooting,
            y,
            w,
            arcs,
            entry,
            depth,
            rank: None,
            aux: BTreeMap::new(),
            sum,
            terms: LinExpr::new(),
            dominance: Vec::new(),
            tightening: RootedTightening::default(),
        };
        f.add_flow(inst, n);
        f.add_signals(inst);
        f.add_dominance(inst);
        match opts.rooting {
            Rooting::Unrooted => f.add_entry_symmetry(),
            Rooting::Rooted { anchor } => f.add_rooted_tightening(inst, anchor),
        }
        if let Some(lb) = opts.lower_bound.filter(|lb| lb.is_finite()) {
            f.model
                .add_constraint(Constraint::ge(LinExpr::var(f.sum), lb - PRUNE_SLACK));
        }
        debug!(
            vars = f.model.vars().len(),
            constraints = f.model.constraints().len(),
            rooted = opts.rooting.anchor().is_some(),
            "model built"
        );
        f
    }

    fn add_flow(&mut self, inst: &Instance, n: f64) {
        let g = inst.graph();
        let m = &mut self.model;

        m.add_constraint(Constraint::le(
            self.entry.values().map(|&x| (x, 1.0)).collect(),
            1.0,
        ));
        if let Some(anchor) = self.rooting.anchor() {
            if let Some(&x) = self.entry.get(&anchor) {
                m.add_constraint(Constraint::eq(LinExpr::var(x), 1.0));
            }
        }

        for v in g.nodes() {
            let mut inflow: LinExpr = self
                .arcs
                .iter()
                .filter(|((_, into), _)| *into == v)
                .map(|(_, &x)| (x, 1.0))
                .collect();
            inflow = inflow.term(self.entry[&v], 1.0).term(self.y[&v], -1.0);
            m.add_constraint(Constraint::eq(inflow, 0.0));
            // The entry vertex sits at depth 0.
            m.add_constraint(Constraint::le(
                LinExpr::var(self.depth[&v]).term(self.entry[&v], n),
                n,
            ));
        }

        for e in g.edges() {
            let Some((a, b)) = g.endpoints(e) else {
                continue;
            };
            let we = self.w[&e];
            m.add_constraint(Constraint::le(LinExpr::var(we).term(self.y[&a], -1.0), 0.0));
            m.add_constraint(Constraint::le(LinExpr::var(we).term(self.y[&b], -1.0), 0.0));
            if a == b {
                continue;
            }
            let (into_b, into_a) = (self.arcs[&(e, b)], self.arcs[&(e, a)]);
            m.add_constraint(Constraint::le(
                LinExpr::var(into_a).term(into_b, 1.0).term(we, -1.0),
                0.0,
            ));
            for (z, from, to) in [(into_b, a, b), (into_a, b, a)] {
                let (df, dt) = (self.depth[&from], self.depth[&to]);
                // z = 1 forces d_to = d_from + 1.
                m.add_constraint(Constraint::ge(
                    LinExpr::var(dt).term(df, -1.0).term(z, -(n + 1.0)),
                    -n,
                ));
                m.add_constraint(Constraint::le(
                    LinExpr::var(dt).term(df, -1.0).term(z, n - 1.0),
                    n,
                ));
                // Selected edges join vertices at most one level apart.
                m.add_constraint(Constraint::le(
                    LinExpr::var(df).term(dt, -1.0).term(we, n - 1.0),
                    n,
                ));
            }
        }
    }

    fn add_signals(&mut self, inst: &Instance) {
        let signals = inst.signals();
        let mut live: BTreeSet<SignalId> = BTreeSet::new();
        for x in inst.graph().elems() {
            live.extend(inst.carried(x).iter().copied());
        }
        for s in live {
            let carriers: Vec<Elem> = inst.carriers(s).collect();
            let vars: Vec<VarId> = carriers.iter().filter_map(|&x| self.var_of(x)).collect();
            if vars.is_empty() {
                continue;
            }
            let weight = signals.weight(s);
            if signals.is_mandatory(s) {
                self.model.add_constraint(Constraint::ge(
                    vars.iter().map(|&v| (v, 1.0)).collect(),
                    1.0,
                ));
                continue;
            }
            if weight == 0.0 {
                continue;
            }
            if let [only] = vars[..] {
                self.terms.terms.push((only, weight));
                continue;
            }
            let aux = self
                .model
                .add_var(VarKind::Binary, VarOrigin::Signal(s));
            let k = vars.len() as f64;
            let members = vars.iter().map(|&v| (v, -1.0));
            if weight > 0.0 {
                // s <= Σ members
                let c: LinExpr = members.collect();
                self.model.add_constraint(Constraint::le(c.term(aux, 1.0), 0.0));
            } else {
                // k·s >= Σ members
                let c: LinExpr = members.collect();
                self.model.add_constraint(Constraint::ge(c.term(aux, k), 0.0));
            }
            self.terms.terms.push((aux, weight));
            self.aux.insert(s, (aux, carriers));
        }
        let mut def = LinExpr::var(self.sum);
        for &(v, c) in &self.terms.terms {
            def = def.term(v, -c);
        }
        self.model.add_constraint(Constraint::eq(def, 0.0));
        self.model.set_objective(LinExpr::var(self.sum));
    }

    fn add_dominance(&mut self, inst: &Instance) {
        let g = inst.graph();
        for v in g.nodes() {
            for &e in g.incident(v) {
                let Some(u) = g.opposite(e, v) else {
                    continue;
                };
                if u == v {
                    continue;
                }
                if inst.floor(Elem::Node(u)) >= 0.0 && inst.floor(Elem::Edge(e)) >= 0.0 {
                    self.dominance.push((v, e, u));
                    self.model.add_constraint(Constraint::le(
                        LinExpr::var(self.y[&v]).term(self.w[&e], -1.0),
                        0.0,
                    ));
                }
            }
        }
    }

    /// The selected vertex of highest rank is the entry point.
    fn add_entry_symmetry(&mut self) {
        let n = self.y.len() as f64;
        let rank = self
            .model
            .add_var(VarKind::Continuous { lo: 0.0, hi: n }, VarOrigin::EntryRank);
        let mut def = LinExpr::var(rank);
        for (k, x0) in self.entry.values().enumerate() {
            def = def.term(*x0, -((k + 1) as f64));
        }
        self.model.add_constraint(Constraint::eq(def, 0.0));
        for (k, &yv) in self.y.values().enumerate() {
            self.model.add_constraint(Constraint::ge(
                LinExpr::var(rank).term(yv, -((k + 1) as f64)),
                0.0,
            ));
        }
        self.rank = Some(rank);
    }

    fn add_rooted_tightening(&mut self, inst: &Instance, anchor: NodeId) {
        self.tightening = rooted_tightening(inst.graph(), anchor);
        for t in &self.tightening.descriptors {
            match *t {
                Tightening::Dominate { node, cutpoint } => {
                    let (Some(&yv), Some(&yc)) = (self.y.get(&node), self.y.get(&cutpoint)) else {
                        continue;
                    };
                    self.model
                        .add_constraint(Constraint::le(LinExpr::var(yv).term(yc, -1.0), 0.0));
                }
                Tightening::ZeroArc { edge, into } => {
                    if let Some(&x) = self.arcs.get(&(edge, into)) {
                        self.model.add_constraint(Constraint::eq(LinExpr::var(x), 0.0));
                    }
                }
            }
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn rooting(&self) -> Rooting {
        self.rooting
    }

    pub fn var_of(&self, x: Elem) -> Option<VarId> {
        match x {
            Elem::Node(v) => self.y.get(&v).copied(),
            Elem::Edge(e) => self.w.get(&e).copied(),
        }
    }

    /// Cut separator over the rooted tightening's blocks; `None` when the
    /// model is unrooted.
    pub fn separator(&self, inst: &Instance, cfg: SeparatorCfg) -> Option<Separator> {
        self.rooting.anchor()?;
        Some(Separator::new(self, inst.graph(), cfg))
    }

    /// Selected live elements: `y > 0.5`, `w > 0.5`.
    pub fn decode(&self, values: &Assignment) -> Vec<Elem> {
        let nodes = self
            .y
            .iter()
            .filter(|(_, &v)| values.get(v) > 0.5)
            .map(|(&v, _)| Elem::Node(v));
        let edges = self
            .w
            .iter()
            .filter(|(_, &v)| values.get(v) > 0.5)
            .map(|(&e, _)| Elem::Edge(e));
        nodes.chain(edges).collect()
    }

    pub fn node_values(&self, values: &Assignment) -> HashMap<NodeId, f64> {
        self.y.iter().map(|(&v, &x)| (v, values.get(x))).collect()
    }

    pub fn edge_values(&self, values: &Assignment) -> HashMap<EdgeId, f64> {
        self.w.iter().map(|(&e, &x)| (e, values.get(x))).collect()
    }
}
