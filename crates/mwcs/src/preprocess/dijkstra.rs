//! Signal-aware shortest paths.
//!
//! The cost of a path is the total weight of the negative signals it incurs,
//! each signal counted once along the path. Every label carries the set of
//! signals already present on its path, so stepping onto an element that only
//! repeats known signals is free.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use ordered_float::OrderedFloat;

use crate::graph::{EdgeId, Elem, NodeId};
use crate::instance::Instance;
use crate::signals::SignalId;

/// Knobs for one search.
#[derive(Clone, Debug, Default)]
pub struct SearchOpts {
    /// Vertices treated as already selected: their signals are known up
    /// front, so entering them costs nothing.
    pub free: Vec<NodeId>,
    pub skip_node: Option<NodeId>,
    pub skip_edge: Option<EdgeId>,
    /// Labels costlier than this are dropped.
    pub cutoff: Option<f64>,
    /// Stop once all of these are settled (empty: explore everything).
    pub targets: Vec<NodeId>,
}

/// Settled labels of one search.
#[derive(Clone, Debug)]
pub struct Paths {
    source: NodeId,
    dist: HashMap<NodeId, f64>,
    signals: HashMap<NodeId, BTreeSet<SignalId>>,
    pred: HashMap<NodeId, (NodeId, EdgeId)>,
    settled: Vec<NodeId>,
}

impl Paths {
    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn dist(&self, v: NodeId) -> Option<f64> {
        self.dist.get(&v).copied()
    }

    /// All signals on the path to `v`, free vertices' signals included.
    pub fn signals(&self, v: NodeId) -> Option<&BTreeSet<SignalId>> {
        self.signals.get(&v)
    }

    /// Settled vertices in settling order (source first).
    pub fn settled(&self) -> &[NodeId] {
        &self.settled
    }

    /// Elements of the path from the source to `v`, source excluded, in
    /// order of travel.
    pub fn path(&self, v: NodeId) -> Vec<Elem> {
        let mut rev = Vec::new();
        let mut cur = v;
        while let Some(&(p, e)) = self.pred.get(&cur) {
            rev.push(Elem::Node(cur));
            rev.push(Elem::Edge(e));
            cur = p;
        }
        rev.reverse();
        rev
    }
}

pub fn shortest_paths(inst: &Instance, source: NodeId, opts: &SearchOpts) -> Paths {
    let g = inst.graph();
    let signals = inst.signals();
    let free: HashSet<NodeId> = opts.free.iter().copied().collect();

    let mut base: BTreeSet<SignalId> = inst.carried(Elem::Node(source)).iter().copied().collect();
    for &f in &opts.free {
        if g.contains_node(f) {
            base.extend(inst.carried(Elem::Node(f)).iter().copied());
        }
    }

    let mut paths = Paths {
        source,
        dist: HashMap::new(),
        signals: HashMap::new(),
        pred: HashMap::new(),
        settled: Vec::new(),
    };
    if !g.contains_node(source) {
        return paths;
    }
    // Best tentative labels; moved into `paths` once settled.
    let mut tentative: HashMap<NodeId, (f64, BTreeSet<SignalId>, Option<(NodeId, EdgeId)>)> =
        HashMap::new();
    tentative.insert(source, (0.0, base, None));
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), source)));
    let mut pending: HashSet<NodeId> = opts.targets.iter().copied().collect();

    while let Some(Reverse((OrderedFloat(d), cur))) = heap.pop() {
        if paths.dist.contains_key(&cur) {
            continue;
        }
        let Some((best, sigs, pred)) = tentative.remove(&cur) else {
            continue;
        };
        if d > best {
            tentative.insert(cur, (best, sigs, pred));
            continue;
        }
        paths.dist.insert(cur, best);
        if let Some(p) = pred {
            paths.pred.insert(cur, p);
        }
        paths.settled.push(cur);
        pending.remove(&cur);
        if !opts.targets.is_empty() && pending.is_empty() {
            paths.signals.insert(cur, sigs);
            break;
        }

        for &e in g.incident(cur) {
            if opts.skip_edge == Some(e) || g.is_self_loop(e) {
                continue;
            }
            let Some(n) = g.opposite(e, cur) else {
                continue;
            };
            if opts.skip_node == Some(n) || paths.dist.contains_key(&n) {
                continue;
            }
            let mut cost = 0.0;
            let mut next = sigs.clone();
            let entering = if free.contains(&n) {
                inst.carried(Elem::Edge(e)).to_vec()
            } else {
                let mut v = inst.carried(Elem::Edge(e)).to_vec();
                v.extend_from_slice(inst.carried(Elem::Node(n)));
                v
            };
            for s in entering {
                if next.insert(s) {
                    let w = signals.weight(s);
                    if w < 0.0 {
                        cost -= w;
                    }
                }
            }
            let nd = best + cost;
            if opts.cutoff.is_some_and(|c| nd > c) {
                continue;
            }
            let improves = tentative.get(&n).map_or(true, |(old, _, _)| nd < *old);
            if improves {
                tentative.insert(n, (nd, next, Some((cur, e))));
                heap.push(Reverse((OrderedFloat(nd), n)));
            }
        }
        paths.signals.insert(cur, sigs);
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceBuilder;

    #[test]
    fn costs_count_negative_signals_once() {
        // 0 -a- 1 -b- 2 and a costly shortcut 0 -c- 2.
        let mut b = InstanceBuilder::new();
        let v0 = b.add_weighted_node(0.0);
        let v1 = b.add_weighted_node(-1.0);
        let v2 = b.add_weighted_node(5.0);
        b.add_weighted_edge(v0, v1, -0.5);
        let e1 = b.add_weighted_edge(v1, v2, -0.5);
        let shortcut = b.add_weighted_edge(v0, v2, -3.0);
        let inst = b.build().expect("valid");

        let p = shortest_paths(&inst, v0, &SearchOpts::default());
        assert_eq!(p.dist(v1), Some(1.5));
        assert_eq!(p.dist(v2), Some(2.0));
        let path = p.path(v2);
        assert_eq!(path.len(), 4);
        assert_eq!(path[3], Elem::Node(v2));
        assert_eq!(path[2], Elem::Edge(e1));

        let skip = SearchOpts {
            skip_node: Some(v1),
            ..SearchOpts::default()
        };
        let p = shortest_paths(&inst, v0, &skip);
        assert_eq!(p.dist(v2), Some(3.0));
        assert_eq!(p.path(v2), vec![Elem::Edge(shortcut), Elem::Node(v2)]);
    }

    #[test]
    fn free_vertices_and_cutoff() {
        let mut b = InstanceBuilder::new();
        let v0 = b.add_weighted_node(0.0);
        let v1 = b.add_weighted_node(-4.0);
        let v2 = b.add_weighted_node(-1.0);
        b.add_weighted_edge(v0, v1, 0.0);
        b.add_weighted_edge(v1, v2, 0.0);
        let inst = b.build().expect("valid");
        let opts = SearchOpts {
            free: vec![v0, v1],
            targets: vec![v1],
            ..SearchOpts::default()
        };
        assert_eq!(shortest_paths(&inst, v0, &opts).dist(v1), Some(0.0));
        let cut = SearchOpts {
            cutoff: Some(3.0),
            ..SearchOpts::default()
        };
        let p = shortest_paths(&inst, v0, &cut);
        assert_eq!(p.dist(v1), None);
        assert_eq!(p.dist(v2), None);
    }

    #[test]
    fn shared_signal_is_charged_once_per_path() {
        let mut b = InstanceBuilder::new();
        let v0 = b.add_node();
        let v1 = b.add_node();
        let v2 = b.add_node();
        b.add_edge(v0, v1);
        b.add_edge(v1, v2);
        let bonus = b.add_signal(2.0);
        b.attach(v1, bonus);
        b.attach(v2, bonus);
        let cost = b.add_signal(-1.0);
        b.attach(v2, cost);
        let inst = b.build().expect("valid");
        let p = shortest_paths(&inst, v0, &SearchOpts::default());
        assert_eq!(p.dist(v2), Some(1.0));
        assert_eq!(p.signals(v2).map(|s| s.len()), Some(2));
    }
}
