//! Structural and signal-aware preprocessing.
//!
//! Purpose
//! - Shrink an instance with reduction rules that never lose the optimum:
//!   every removed element is either provably worthless or merged into a
//!   survivor through the absorption ledger.
//! - Rules run to a fixed point; the level decides which ones take part.
//!
//! Why this design
//! - The rules only use per-element bounds (`ceil`, `floor`) and
//!   signal-aware path costs, so they stay sound under at-most-once scoring
//!   and may miss some reductions a sharper rule set would find.
//! - Leaf folding hides the "leaf alone" solution inside its neighbour; that
//!   solution is kept aside as a [`Witness`] and compared with the final
//!   answer.

mod dijkstra;
mod rules;

pub use dijkstra::{shortest_paths, Paths, SearchOpts};

use tracing::{debug, info};

use crate::error::{MwcsError, Result};
use crate::graph::Elem;
use crate::instance::Instance;

/// How much reduction work to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreprocessLevel {
    Off,
    /// Loops, parallel edges and leaves.
    Local,
    /// Local rules plus the path-based degree-2 and dominated-edge rules.
    #[default]
    Full,
}

impl PreprocessLevel {
    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Self::Off),
            1 => Ok(Self::Local),
            2 => Ok(Self::Full),
            other => Err(MwcsError::config(format!(
                "preprocessing level must be 0..=2, got {other}"
            ))),
        }
    }
}

/// A feasible solution over original elements set aside during reduction.
#[derive(Clone, Debug, PartialEq)]
pub struct Witness {
    pub elems: Vec<Elem>,
    pub score: f64,
}

impl Witness {
    /// Keep the live selection `elems` (expanded) if it covers every
    /// mandatory signal and beats the current witness. Without mandatory
    /// signals the empty answer is the baseline; with them any covering
    /// selection is worth keeping.
    pub(crate) fn offer(slot: &mut Option<Witness>, inst: &Instance, elems: &[Elem]) {
        if inst.uncovered(elems) > 0 {
            return;
        }
        let originals = inst.expand(elems);
        let score = inst.signals().score(&originals);
        let baseline = if inst.has_mandatory() {
            f64::NEG_INFINITY
        } else {
            0.0
        };
        if score > slot.as_ref().map_or(baseline, |w| w.score) {
            *slot = Some(Witness {
                elems: originals,
                score,
            });
        }
    }
}

/// Outcome of a preprocessing run.
#[derive(Clone, Debug, Default)]
pub struct Reduction {
    pub rounds: usize,
    pub changes: usize,
    pub witness: Option<Witness>,
}

/// Apply the rules of `level` to `inst` until nothing changes.
pub fn preprocess(inst: &mut Instance, level: PreprocessLevel) -> Reduction {
    let mut out = Reduction::default();
    if level == PreprocessLevel::Off {
        return out;
    }
    let (nodes0, edges0) = (inst.graph().node_count(), inst.graph().edge_count());
    loop {
        let mut changed = rules::self_loops(inst);
        changed += rules::parallel_edges(inst);
        changed += rules::negative_leaves(inst);
        changed += rules::positive_leaves(inst, &mut out.witness);
        if level == PreprocessLevel::Full {
            changed += rules::degree_two(inst);
            changed += rules::dominated_edges(inst);
        }
        out.rounds += 1;
        out.changes += changed;
        debug!(round = out.rounds, changed, "preprocess round");
        if changed == 0 {
            break;
        }
    }
    info!(
        nodes_before = nodes0,
        edges_before = edges0,
        nodes = inst.graph().node_count(),
        edges = inst.graph().edge_count(),
        rounds = out.rounds,
        "preprocessing done"
    );
    out
}
