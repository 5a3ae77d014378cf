//! Best connected subtree of a rooted tree.

use std::collections::HashMap;

use crate::graph::{EdgeId, Elem, NodeId};

use super::mst::TreeLink;

/// Dynamic program over a tree given by `links` (parents before children).
///
/// `with_root[v]` is the best value of a subtree hanging from `v` that
/// contains `v`; a child subtree is kept when its value plus its link is
/// non-negative. With `rooted`, the answer must contain `root`; otherwise
/// it is the best subtree anywhere, or empty if every subtree is negative.
pub fn best_subtree(
    root: NodeId,
    links: &[TreeLink],
    node_value: impl Fn(NodeId) -> f64,
    edge_value: impl Fn(EdgeId) -> f64,
    rooted: bool,
) -> Vec<Elem> {
    let mut children: HashMap<NodeId, Vec<(NodeId, EdgeId)>> = HashMap::new();
    for l in links {
        children.entry(l.parent).or_default().push((l.child, l.edge));
    }
    let order: Vec<NodeId> = std::iter::once(root)
        .chain(links.iter().map(|l| l.child))
        .collect();

    let mut with_root: HashMap<NodeId, f64> = HashMap::new();
    let mut best: HashMap<NodeId, (f64, NodeId)> = HashMap::new();
    for &v in order.iter().rev() {
        let mut own = node_value(v);
        let mut top = (f64::NEG_INFINITY, v);
        for &(c, e) in children.get(&v).map(Vec::as_slice).unwrap_or(&[]) {
            let gain = with_root[&c] + edge_value(e);
            if gain >= 0.0 {
                own += gain;
            }
            if best[&c].0 > top.0 {
                top = best[&c];
            }
        }
        with_root.insert(v, own);
        if own >= top.0 {
            top = (own, v);
        }
        best.insert(v, top);
    }

    let start = if rooted {
        root
    } else {
        let (value, at) = best[&root];
        if value < 0.0 {
            return Vec::new();
        }
        at
    };
    let mut out = vec![Elem::Node(start)];
    let mut stack = vec![start];
    while let Some(v) = stack.pop() {
        for &(c, e) in children.get(&v).map(Vec::as_slice).unwrap_or(&[]) {
            if with_root[&c] + edge_value(e) >= 0.0 {
                out.push(Elem::Edge(e));
                out.push(Elem::Node(c));
                stack.push(c);
            }
        }
    }
    out
}
