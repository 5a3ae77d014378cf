//! Primal heuristics.
//!
//! Purpose
//! - Produce good connected selections quickly: as lower bounds for the MIP,
//!   as the fallback answer when time runs out, and as the whole answer in
//!   heuristic-only mode.
//!
//! Why this design
//! - Greedy growth follows signal-aware shortest paths, so shared signals are
//!   never paid twice.
//! - The spanning-tree heuristic is cost-agnostic: heavy-is-cheap costs for a
//!   cold start, relaxation-derived costs when the LP has something to say.
//!
//! All heuristics return live elements of the instance they were given.

mod greedy;
mod mst;
mod tree;

pub use greedy::greedy;
pub use mst::{logistic_cost, prim_tree, TreeLink};
pub use tree::best_subtree;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::graph::{EdgeId, Elem, NodeId};
use crate::instance::Instance;

/// Spanning tree from `root` under `cost`, then the best subtree of it.
/// With `rooted`, the result contains `root`.
pub fn mst_candidate(
    inst: &Instance,
    root: NodeId,
    rooted: bool,
    cost: impl Fn(EdgeId) -> f64,
) -> Vec<Elem> {
    let links = prim_tree(inst.graph(), root, cost);
    best_subtree(
        root,
        &links,
        |v| inst.weight(Elem::Node(v)),
        |e| inst.weight(Elem::Edge(e)),
        rooted,
    )
}

/// Spanning-tree candidate with heavy-is-cheap edge costs.
pub fn mst_by_weight(inst: &Instance, root: NodeId, rooted: bool) -> Vec<Elem> {
    mst_candidate(inst, root, rooted, |e| {
        logistic_cost(inst.weight(Elem::Edge(e)))
    })
}

/// Edge costs `3 - y_u - y_v - w_e` from relaxation values: edges the LP
/// likes, between vertices it likes, become cheap.
pub fn relaxation_costs(
    inst: &Instance,
    node_value: &HashMap<NodeId, f64>,
    edge_value: &HashMap<EdgeId, f64>,
) -> HashMap<EdgeId, f64> {
    let g = inst.graph();
    g.edges()
        .filter_map(|e| {
            let (u, v) = g.endpoints(e)?;
            let y = |x: NodeId| node_value.get(&x).copied().unwrap_or(0.0);
            let w = edge_value.get(&e).copied().unwrap_or(0.0);
            Some((e, 3.0 - y(u) - y(v) - w))
        })
        .collect()
}

/// Knobs for heuristic-only solving.
#[derive(Clone, Debug)]
pub struct HeuristicCfg {
    /// Random roots tried by the spanning-tree heuristic.
    pub roots: usize,
    pub seed: u64,
}

impl Default for HeuristicCfg {
    fn default() -> Self {
        Self {
            roots: 10,
            seed: 1337,
        }
    }
}

/// Best candidate of `inst`, covering mandatory signals first and then by
/// score, or the empty selection when nothing beats it. With `root`, every
/// candidate contains it.
pub fn best_effort(inst: &Instance, root: Option<NodeId>, cfg: &HeuristicCfg) -> (Vec<Elem>, f64) {
    let nodes: Vec<NodeId> = inst.graph().nodes().collect();
    if nodes.is_empty() {
        return (Vec::new(), 0.0);
    }
    let mut best: (Vec<Elem>, f64) = (Vec::new(), 0.0);
    let mut offer = |cand: Vec<Elem>, rooted: bool| {
        if cand.is_empty() {
            return;
        }
        if (rooted && best.0.is_empty()) || inst.prefers(&cand, &best.0) {
            let s = inst.score(&cand);
            best = (cand, s);
        }
    };
    match root {
        Some(r) => {
            offer(greedy(inst, r), true);
            offer(mst_by_weight(inst, r, true), true);
        }
        None => {
            if let Some(h) = inst.heaviest_node() {
                offer(greedy(inst, h), false);
            }
            for r in mandatory_roots(inst) {
                offer(greedy(inst, r), false);
                offer(mst_by_weight(inst, r, true), false);
            }
            let mut rng = StdRng::seed_from_u64(cfg.seed);
            for _ in 0..cfg.roots {
                let r = nodes[rng.gen_range(0..nodes.len())];
                offer(mst_by_weight(inst, r, false), false);
            }
        }
    }
    debug!(score = best.1, size = best.0.len(), "heuristic candidate");
    best
}

/// A vertex touching some carrier of each live mandatory signal.
fn mandatory_roots(inst: &Instance) -> Vec<NodeId> {
    let g = inst.graph();
    let mut roots: Vec<NodeId> = inst
        .signals()
        .mandatory()
        .into_iter()
        .filter_map(|m| inst.carriers(m).next())
        .filter_map(|x| match x {
            Elem::Node(v) => Some(v),
            Elem::Edge(e) => g.endpoints(e).map(|(u, _)| u),
        })
        .collect();
    roots.sort();
    roots.dedup();
    roots
}
