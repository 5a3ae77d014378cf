//! Reduction rules. Each returns how many elements it removed or merged.
//!
//! Bounds used throughout (see `Instance::{ceil, floor, neg}`):
//! - `ceil(x)`: the most `x` can ever add to a selection.
//! - `floor(x)`: what `x` adds to any selection not containing it.
//!
//! Negative signals have a single carrier, so dropping an element always
//! refunds exactly its negative part.

use crate::graph::{EdgeId, Elem, NodeId};
use crate::instance::Instance;

use super::dijkstra::{shortest_paths, SearchOpts};
use super::Witness;

/// Loops never connect anything: keep their value on the vertex or drop them.
pub(crate) fn self_loops(inst: &mut Instance) -> usize {
    let loops: Vec<EdgeId> = inst
        .graph()
        .edges()
        .filter(|&e| inst.graph().is_self_loop(e))
        .collect();
    let mut changed = 0;
    for e in loops {
        let Some((v, _)) = inst.graph().endpoints(e) else {
            continue;
        };
        let x = Elem::Edge(e);
        if inst.ceil(x) <= 0.0 {
            inst.remove(x);
            changed += 1;
        } else if inst.floor(x) >= 0.0 {
            inst.absorb(Elem::Node(v), x);
            changed += 1;
        }
    }
    changed
}

/// Parallel edges: merge the ones that always pay off, drop dominated ones.
pub(crate) fn parallel_edges(inst: &mut Instance) -> usize {
    let mut changed = 0;
    let nodes: Vec<NodeId> = inst.graph().nodes().collect();
    for u in nodes {
        if !inst.graph().contains_node(u) {
            continue;
        }
        for v in inst.graph().neighbors(u) {
            if v < u {
                continue;
            }
            let group = inst.graph().edges_between(u, v);
            if group.len() < 2 {
                continue;
            }
            let good: Vec<EdgeId> = group
                .iter()
                .copied()
                .filter(|&e| inst.floor(Elem::Edge(e)) >= 0.0)
                .collect();
            if let Some((&keep, rest)) = good.split_first() {
                for &e in rest {
                    inst.absorb(Elem::Edge(keep), Elem::Edge(e));
                    changed += 1;
                }
            }
            for e in inst.graph().edges_between(u, v) {
                let top = inst.ceil(Elem::Edge(e));
                if top > 0.0 {
                    continue;
                }
                let dominated = inst
                    .graph()
                    .edges_between(u, v)
                    .into_iter()
                    .any(|f| f != e && inst.floor(Elem::Edge(f)) >= top);
                if dominated {
                    inst.remove(Elem::Edge(e));
                    changed += 1;
                }
            }
        }
    }
    changed
}

/// Vertices with one neighbour that can never pay for themselves.
pub(crate) fn negative_leaves(inst: &mut Instance) -> usize {
    let mut changed = 0;
    let nodes: Vec<NodeId> = inst.graph().nodes().collect();
    for v in nodes {
        if !inst.graph().contains_node(v) || inst.graph().neighbors(v).len() > 1 {
            continue;
        }
        let mut top = inst.ceil(Elem::Node(v));
        for &e in inst.graph().incident(v) {
            top += inst.ceil(Elem::Edge(e)).max(0.0);
        }
        if top <= 0.0 {
            inst.remove(Elem::Node(v));
            changed += 1;
        }
    }
    changed
}

/// Single-edge leaves that always pay off are folded into their neighbour.
/// The leaf on its own stays available through the witness.
pub(crate) fn positive_leaves(inst: &mut Instance, witness: &mut Option<Witness>) -> usize {
    let mut changed = 0;
    let nodes: Vec<NodeId> = inst.graph().nodes().collect();
    for v in nodes {
        if !inst.graph().contains_node(v) {
            continue;
        }
        let &[e] = inst.graph().incident(v) else {
            continue;
        };
        let Some(u) = inst.graph().opposite(e, v) else {
            continue;
        };
        if u == v {
            continue;
        }
        let (leaf, link) = (Elem::Node(v), Elem::Edge(e));
        if inst.floor(leaf) + inst.floor(link) < 0.0 {
            continue;
        }
        Witness::offer(witness, inst, &[leaf]);
        inst.absorb(Elem::Node(u), link);
        inst.absorb(Elem::Node(u), leaf);
        changed += 1;
    }
    changed
}

/// Degree-2 vertices with no net value whose neighbours are joined by a path
/// at most as costly.
pub(crate) fn degree_two(inst: &mut Instance) -> usize {
    let mut changed = 0;
    let nodes: Vec<NodeId> = inst.graph().nodes().collect();
    for v in nodes {
        if !inst.graph().contains_node(v) {
            continue;
        }
        let &[ea, eb] = inst.graph().incident(v) else {
            continue;
        };
        let (Some(a), Some(b)) = (inst.graph().opposite(ea, v), inst.graph().opposite(eb, v)) else {
            continue;
        };
        if a == v || b == v || a == b {
            continue;
        }
        let cv = inst.ceil(Elem::Node(v));
        let ca = inst.ceil(Elem::Edge(ea));
        let cb = inst.ceil(Elem::Edge(eb));
        if cv > 0.0 || cv + ca > 0.0 || cv + cb > 0.0 {
            continue;
        }
        let budget = -(cv + ca + cb);
        let opts = SearchOpts {
            free: vec![a, b],
            skip_node: Some(v),
            cutoff: Some(budget),
            targets: vec![b],
            ..SearchOpts::default()
        };
        let paths = shortest_paths(inst, a, &opts);
        if paths.dist(b).is_some_and(|d| d <= budget) {
            inst.remove(Elem::Node(v));
            changed += 1;
        }
    }
    changed
}

/// Edges with no net value whose endpoints are joined by a path at most as
/// costly.
pub(crate) fn dominated_edges(inst: &mut Instance) -> usize {
    let mut changed = 0;
    let edges: Vec<EdgeId> = inst.graph().edges().collect();
    for e in edges {
        let Some((u, v)) = inst.graph().endpoints(e) else {
            continue;
        };
        if u == v {
            continue;
        }
        let top = inst.ceil(Elem::Edge(e));
        if top > 0.0 {
            continue;
        }
        let budget = -top;
        let opts = SearchOpts {
            free: vec![u, v],
            skip_edge: Some(e),
            cutoff: Some(budget),
            targets: vec![v],
            ..SearchOpts::default()
        };
        let paths = shortest_paths(inst, u, &opts);
        if paths.dist(v).is_some_and(|d| d <= budget) {
            inst.remove(Elem::Edge(e));
            changed += 1;
        }
    }
    changed
}
