//! Test-only helpers: random instances and a brute-force reference solver.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{MwcsError, Result};
use crate::graph::{Elem, NodeId};
use crate::instance::{Instance, InstanceBuilder};
use crate::oracle::{Oracle, OracleOutcome, OracleRequest};
use crate::signals::SignalId;

/// Weights on a 0.5 grid keep sums exact.
fn grid_weight(rng: &mut StdRng, lo: i32, hi: i32) -> f64 {
    f64::from(rng.gen_range(lo..=hi)) / 2.0
}

/// Random multigraph (parallel edges and loops allowed) with plain weights.
pub(crate) fn random_plain(rng: &mut StdRng, n: usize, m: usize) -> Instance {
    let mut b = InstanceBuilder::new();
    let nodes: Vec<NodeId> = (0..n)
        .map(|_| {
            let w = grid_weight(rng, -10, 8);
            b.add_weighted_node(w)
        })
        .collect();
    for _ in 0..m {
        let u = nodes[rng.gen_range(0..n)];
        let v = nodes[rng.gen_range(0..n)];
        let w = grid_weight(rng, -6, 4);
        b.add_weighted_edge(u, v, w);
    }
    b.build().expect("plain instances are valid")
}

/// Random multigraph with shared positive signals and private negative ones.
pub(crate) fn random_signals(rng: &mut StdRng, n: usize, m: usize) -> Instance {
    let mut b = InstanceBuilder::new();
    let shared: Vec<SignalId> = (0..rng.gen_range(1..4))
        .map(|_| {
            let w = grid_weight(rng, 1, 8);
            b.add_signal(w)
        })
        .collect();
    let mut elems: Vec<Elem> = Vec::new();
    let nodes: Vec<NodeId> = (0..n).map(|_| b.add_node()).collect();
    elems.extend(nodes.iter().map(|&v| Elem::Node(v)));
    for _ in 0..m {
        let u = nodes[rng.gen_range(0..n)];
        let v = nodes[rng.gen_range(0..n)];
        elems.push(Elem::Edge(b.add_edge(u, v)));
    }
    for x in elems {
        if rng.gen_bool(0.5) {
            let s = shared[rng.gen_range(0..shared.len())];
            b.attach(x, s);
        }
        if rng.gen_bool(0.6) {
            let w = grid_weight(rng, -8, -1);
            let s = b.add_signal(w);
            b.attach(x, s);
        }
        if rng.gen_bool(0.2) {
            let w = grid_weight(rng, 1, 6);
            let s = b.add_signal(w);
            b.attach(x, s);
        }
    }
    b.build().expect("negative signals are private")
}

/// Random multigraph with plain weights and one or two mandatory signals,
/// each on one or two random elements.
pub(crate) fn random_mandatory(rng: &mut StdRng, n: usize, m: usize) -> Instance {
    let mut b = InstanceBuilder::new();
    let nodes: Vec<NodeId> = (0..n)
        .map(|_| {
            let w = grid_weight(rng, -10, 6);
            b.add_weighted_node(w)
        })
        .collect();
    let mut elems: Vec<Elem> = nodes.iter().map(|&v| Elem::Node(v)).collect();
    for _ in 0..m {
        let u = nodes[rng.gen_range(0..n)];
        let v = nodes[rng.gen_range(0..n)];
        let w = grid_weight(rng, -6, 4);
        elems.push(Elem::Edge(b.add_weighted_edge(u, v, w)));
    }
    for _ in 0..rng.gen_range(1..=2) {
        let s = b.add_signal(f64::INFINITY);
        for _ in 0..rng.gen_range(1..=2) {
            let x = elems[rng.gen_range(0..elems.len())];
            b.attach(x, s);
        }
    }
    b.build().expect("mandatory signals are positive")
}

/// Best connected selection of the live instance by enumeration: the empty
/// set, every single vertex, and every edge subset whose endpoints form a
/// connected subgraph. Scores use carried signals. Selections missing a live
/// mandatory signal are skipped; `-∞` when none is left.
pub(crate) fn brute_force(inst: &Instance) -> (f64, Vec<Elem>) {
    let g = inst.graph();
    let edges: Vec<_> = g.edges().collect();
    assert!(edges.len() <= 16, "too many edges to enumerate");
    let empty = if inst.has_mandatory() {
        f64::NEG_INFINITY
    } else {
        0.0
    };
    let mut best = (empty, Vec::new());
    for v in g.nodes() {
        let sel = vec![Elem::Node(v)];
        let s = inst.score(&sel);
        if s > best.0 && inst.uncovered(&sel) == 0 {
            best = (s, sel);
        }
    }
    for mask in 1u32..(1u32 << edges.len()) {
        let mut sel = Vec::new();
        for (i, &e) in edges.iter().enumerate() {
            if mask & (1 << i) != 0 {
                sel.push(Elem::Edge(e));
                if let Some((u, v)) = g.endpoints(e) {
                    sel.push(Elem::Node(u));
                    sel.push(Elem::Node(v));
                }
            }
        }
        sel.sort();
        sel.dedup();
        if !g.is_connected_selection(&sel) || inst.uncovered(&sel) > 0 {
            continue;
        }
        let s = inst.score(&sel);
        if s > best.0 {
            best = (s, sel);
        }
    }
    best
}

/// Oracle that never finds anything and reports a fixed optimality flag.
pub(crate) struct StubOracle {
    pub optimal: bool,
}

impl Oracle for StubOracle {
    fn solve(&self, _request: OracleRequest<'_>) -> Result<OracleOutcome> {
        Ok(OracleOutcome::empty(self.optimal))
    }
}

/// Oracle that always fails.
pub(crate) struct FailingOracle;

impl Oracle for FailingOracle {
    fn solve(&self, _request: OracleRequest<'_>) -> Result<OracleOutcome> {
        Err(MwcsError::oracle("backend unavailable"))
    }
}
