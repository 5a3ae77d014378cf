//! Minimisation: trade at most `epsilon` of score for fewer edges.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::graph::{EdgeId, Elem, NodeId};
use crate::instance::Instance;
use crate::preprocess::PreprocessLevel;

use super::time::TimeLimit;
use super::{Solution, Solver, SolverCfg, Strategy};

/// Score drift tolerated when re-scoring a minimised answer.
pub(crate) const SCORE_TOL: f64 = 1e-9;

/// Re-solve the subgraph of `elems` with every edge charged
/// `epsilon / |E|`. Returns `None` for an answer without vertices.
pub(crate) fn minimize(
    original: &Instance,
    elems: &[Elem],
    solver: &Solver,
    time: &TimeLimit,
) -> Result<Option<Solution>> {
    let nodes: BTreeSet<NodeId> = elems.iter().filter_map(|x| x.as_node()).collect();
    if nodes.is_empty() {
        return Ok(None);
    }
    let edges: BTreeSet<EdgeId> = elems.iter().filter_map(|x| x.as_edge()).collect();
    let graph = original.graph().subgraph_with(&nodes, &edges);
    let penalty = -solver.cfg.epsilon / edges.len().max(1) as f64;

    let mut signals = original.signals().restricted(&graph.elems());
    signals.add_edge_penalties(graph.edges(), penalty);
    let sub = Instance::new(graph, signals)?;
    debug!(nodes = nodes.len(), edges = edges.len(), penalty, "minimising answer");

    let cfg = SolverCfg {
        time_limit: time.remaining(),
        split_threshold: 150,
        preprocess_level: PreprocessLevel::Full,
        epsilon: 0.0,
        strategy: Strategy::Cutpoints,
        ..solver.cfg.clone()
    };
    let inner = Solver::with_oracle(cfg, Arc::clone(&solver.oracle));
    inner.solve(&sub).map(Some)
}
