//! Solving pipeline: preprocess, decompose, solve components, recombine.
//!
//! Purpose
//! - [`Solver::solve`] is the single entry point: it reduces a copy of the
//!   instance, schedules its components on a worker pool under one global
//!   time budget, expands the winning answer back to original elements and
//!   optionally minimises it.
//!
//! Why this design
//! - Workers own their component copies; the only shared mutable state is
//!   the best-known objective, used as a pruning hint.
//! - The answer is the first best in job order, so it does not depend on
//!   which worker finishes first.

mod bound;
mod postprocess;
mod scheduler;
mod time;
mod worker;

pub use bound::AtomicBound;
pub use time::TimeLimit;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::{MwcsError, Result};
use crate::graph::Elem;
use crate::heuristics::HeuristicCfg;
use crate::instance::Instance;
use crate::model::SeparatorCfg;
use crate::oracle::{MilpOracle, Oracle};
use crate::preprocess::{preprocess, PreprocessLevel};

use scheduler::Scheduler;

/// How components are split before solving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Split big components at balanced cutpoints (any weighting).
    #[default]
    Cutpoints,
    /// Biggest block plus rooted parts (plain weighting only).
    Bicomponent,
}

#[derive(Clone, Debug)]
pub struct SolverCfg {
    pub threads: usize,
    /// `None` runs without a time limit.
    pub time_limit: Option<Duration>,
    /// Components at least this big are split.
    pub split_threshold: usize,
    pub preprocess_level: PreprocessLevel,
    /// Edge penalty budget for the minimisation pass; `0` disables it.
    pub epsilon: f64,
    pub heuristic_only: bool,
    pub strategy: Strategy,
    pub separator: SeparatorCfg,
    pub heuristic_roots: usize,
    pub seed: u64,
}

impl Default for SolverCfg {
    fn default() -> Self {
        Self {
            threads: 1,
            time_limit: None,
            split_threshold: 25,
            preprocess_level: PreprocessLevel::Full,
            epsilon: 0.0,
            heuristic_only: false,
            strategy: Strategy::Cutpoints,
            separator: SeparatorCfg::default(),
            heuristic_roots: 10,
            seed: 1337,
        }
    }
}

impl SolverCfg {
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(MwcsError::config("threads must be at least 1"));
        }
        if self.split_threshold == 0 {
            return Err(MwcsError::config("split threshold must be at least 1"));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(MwcsError::config(format!(
                "epsilon must be a non-negative number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }

    pub(crate) fn heuristics(&self) -> HeuristicCfg {
        HeuristicCfg {
            roots: self.heuristic_roots,
            seed: self.seed,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolveStats {
    pub reduced_nodes: usize,
    pub reduced_edges: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// Original elements, sorted.
    pub elements: Vec<Elem>,
    pub score: f64,
    pub optimal: bool,
    pub stats: SolveStats,
}

pub struct Solver {
    cfg: SolverCfg,
    oracle: Arc<dyn Oracle>,
}

impl Solver {
    /// Solver backed by the built-in MILP oracle.
    pub fn new(cfg: SolverCfg) -> Self {
        let oracle = Arc::new(MilpOracle::new(cfg.separator.rounds));
        Self { cfg, oracle }
    }

    pub fn with_oracle(cfg: SolverCfg, oracle: Arc<dyn Oracle>) -> Self {
        Self { cfg, oracle }
    }

    pub fn cfg(&self) -> &SolverCfg {
        &self.cfg
    }

    pub fn solve(&self, inst: &Instance) -> Result<Solution> {
        self.cfg.validate()?;
        let time = TimeLimit::new(self.cfg.time_limit);

        let mut work = inst.clone();
        let reduction = preprocess(&mut work, self.cfg.preprocess_level);
        let stats = SolveStats {
            reduced_nodes: work.graph().node_count(),
            reduced_edges: work.graph().edge_count(),
            ..SolveStats::default()
        };

        let scheduler = Scheduler {
            cfg: &self.cfg,
            oracle: self.oracle.as_ref(),
            time: &time,
        };
        let outcome = scheduler.run(&work)?;
        let mut elements = outcome.elems;
        let mut score = outcome.score;
        let mut optimal = outcome.optimal;
        if let Some(w) = reduction.witness {
            if inst.prefers(&w.elems, &elements) {
                elements = w.elems;
                score = w.score;
            }
        }

        if self.cfg.epsilon > 0.0 && score > 0.0 {
            if let Some(min) = postprocess::minimize(inst, &elements, self, &time)? {
                let rescored = inst.signals().score(&min.elements);
                let covers = inst.uncovered(&min.elements) <= inst.uncovered(&elements);
                if covers && rescored >= score - self.cfg.epsilon - postprocess::SCORE_TOL {
                    elements = min.elements;
                    score = rescored;
                    optimal &= min.optimal;
                }
            }
        }

        elements.sort();
        elements.dedup();
        let stats = SolveStats {
            workers: outcome.workers,
            elapsed: time.elapsed(),
            ..stats
        };
        info!(
            score,
            optimal,
            size = elements.len(),
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "solve finished"
        );
        Ok(Solution {
            elements,
            score,
            optimal,
            stats,
        })
    }
}

#[cfg(test)]
mod tests;
