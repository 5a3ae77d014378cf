//! Greedy growth by signal-aware path absorption.

use crate::graph::{Elem, NodeId};
use crate::instance::Instance;
use crate::preprocess::{shortest_paths, SearchOpts};

/// Grow a connected selection around `root`.
///
/// Each step runs a signal-aware shortest-path search from the growing
/// super-vertex, takes the reachable vertex whose path raises the score the
/// most, and absorbs that path into the super-vertex (on a private copy).
/// Stops when no path improves the score. The result is a tree over live
/// elements of `inst` that contains `root`.
pub fn greedy(inst: &Instance, root: NodeId) -> Vec<Elem> {
    if !inst.graph().contains_node(root) {
        return Vec::new();
    }
    let mut picked = vec![Elem::Node(root)];
    let mut work = inst.clone();
    let hub = Elem::Node(root);
    loop {
        let paths = shortest_paths(&work, root, &SearchOpts::default());
        let current = work.weight(hub);
        let mut best: Option<(NodeId, f64)> = None;
        for &v in paths.settled() {
            if v == root {
                continue;
            }
            let Some(sigs) = paths.signals(v) else {
                continue;
            };
            let total = work.signals().sum(sigs.iter().copied());
            if best.map_or(true, |(_, b)| total > b) {
                best = Some((v, total));
            }
        }
        let Some((target, total)) = best else {
            break;
        };
        if total <= current {
            break;
        }
        let path = paths.path(target);
        let on_path: Vec<NodeId> = path.iter().filter_map(|x| x.as_node()).collect();
        for &x in &on_path {
            for e in work.graph().incident(x).to_vec() {
                let Some(m) = work.graph().opposite(e, x) else {
                    continue;
                };
                if m != root && !on_path.contains(&m) && !path.contains(&Elem::Edge(e)) {
                    work.reattach(e, x, root);
                }
            }
        }
        for &x in &path {
            work.absorb(hub, x);
            picked.push(x);
        }
    }
    picked
}
