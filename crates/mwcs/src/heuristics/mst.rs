//! Prim-style spanning tree growth.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use ordered_float::OrderedFloat;

use crate::graph::{EdgeId, Graph, NodeId};

/// One tree edge: `child` was reached from `parent` through `edge`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeLink {
    pub child: NodeId,
    pub parent: NodeId,
    pub edge: EdgeId,
}

/// Edge offer: cost, edge, tree endpoint, new endpoint.
type Candidate = (OrderedFloat<f64>, EdgeId, NodeId, NodeId);

/// Minimum spanning tree of `root`'s component, links in insertion order.
/// Ties go to the smaller edge id; loops are ignored and parallel edges
/// compete like any others.
pub fn prim_tree(g: &Graph, root: NodeId, cost: impl Fn(EdgeId) -> f64) -> Vec<TreeLink> {
    let mut links = Vec::new();
    if !g.contains_node(root) {
        return links;
    }
    let mut inside: BTreeSet<NodeId> = [root].into_iter().collect();
    let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
    let push = |heap: &mut BinaryHeap<Reverse<Candidate>>, v: NodeId| {
        for &e in g.incident(v) {
            if let Some(w) = g.opposite(e, v) {
                if w != v {
                    heap.push(Reverse((OrderedFloat(cost(e)), e, v, w)));
                }
            }
        }
    };
    push(&mut heap, root);
    while let Some(Reverse((_, e, from, to))) = heap.pop() {
        if !inside.insert(to) {
            continue;
        }
        links.push(TreeLink {
            child: to,
            parent: from,
            edge: e,
        });
        push(&mut heap, to);
    }
    links
}

/// Edge cost for heuristic trees: heavy edges are cheap.
pub fn logistic_cost(weight: f64) -> f64 {
    1.0 / (1.0 + weight.exp())
}
