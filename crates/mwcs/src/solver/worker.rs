//! One component, heuristic first, then exact.

use tracing::{debug, warn};

use crate::error::Result;
use crate::graph::Elem;
use crate::heuristics::{best_effort, greedy, mst_candidate, relaxation_costs};
use crate::instance::Instance;
use crate::model::{Formulation, ModelOpts, Rooting};
use crate::oracle::{CutCallback, Oracle, OracleRequest};

use super::bound::AtomicBound;
use super::time::TimeLimit;
use super::SolverCfg;

/// A component to solve.
#[derive(Clone, Debug)]
pub(crate) struct Job {
    pub instance: Instance,
    pub rooting: Rooting,
    /// The answer competes for the final result: it may raise the shared
    /// bound and be pruned by it.
    pub candidate: bool,
}

/// Best selection of a job, over the job's live elements.
#[derive(Clone, Debug, Default)]
pub(crate) struct WorkerResult {
    pub elems: Vec<Elem>,
    pub score: f64,
    pub optimal: bool,
}

pub(crate) struct Worker<'a> {
    pub cfg: &'a SolverCfg,
    pub oracle: &'a dyn Oracle,
    pub bound: &'a AtomicBound,
    pub time: &'a TimeLimit,
}

impl Worker<'_> {
    pub fn run(&self, job: &Job) -> Result<WorkerResult> {
        let inst = &job.instance;
        let g = inst.graph();
        let anchor = job.rooting.anchor();

        if g.node_count() == 1 && g.edge_count() == 0 {
            let only: Vec<Elem> = g.nodes().map(Elem::Node).collect();
            let score = inst.score(&only);
            let keep = anchor.is_some() || score >= 0.0 || inst.has_mandatory();
            return Ok(self.finish(job, keep.then_some(only).unwrap_or_default(), true));
        }
        let Some(start) = anchor.or_else(|| inst.heaviest_node()) else {
            return Ok(WorkerResult {
                optimal: true,
                ..WorkerResult::default()
            });
        };

        if self.cfg.heuristic_only {
            let (elems, _) = best_effort(inst, anchor, &self.cfg.heuristics());
            return Ok(self.finish(job, elems, false));
        }

        let mut best = greedy(inst, start);
        if anchor.is_none() && !inst.has_mandatory() && inst.score(&best) < 0.0 {
            best.clear();
        }
        let heuristic = inst.score(&best);
        if job.candidate && self.bound.raise(heuristic) {
            debug!(score = heuristic, "bound raised by heuristic");
        }

        let remaining = self.time.remaining();
        if remaining.is_some_and(|r| r.is_zero()) {
            warn!(
                nodes = g.node_count(),
                score = heuristic,
                "no time left, keeping heuristic answer"
            );
            return Ok(self.finish(job, best, false));
        }

        let lower_bound = job.candidate.then(|| self.bound.get());
        let formulation = Formulation::build(
            inst,
            &ModelOpts {
                rooting: job.rooting,
                lower_bound,
            },
        );
        let separator = formulation.separator(inst, self.cfg.separator);
        let request = OracleRequest {
            model: formulation.model(),
            time_limit: remaining,
            warm_start: formulation.warm_start(inst, &best),
            cuts: separator.as_ref().map(|s| s as &dyn CutCallback),
        };
        let outcome = self.oracle.solve(request)?;
        debug!(
            nodes = g.node_count(),
            optimal = outcome.optimal,
            objective = outcome.objective,
            "oracle returned"
        );

        let mut offer = |elems: Vec<Elem>| {
            let ok = anchor.map_or(true, |a| elems.contains(&Elem::Node(a)));
            if ok && g.is_connected_selection(&elems) && inst.prefers(&elems, &best) {
                best = elems;
            }
        };
        if let Some(values) = &outcome.assignment {
            offer(formulation.decode(values));
        }
        if !outcome.optimal {
            if let Some(relaxed) = &outcome.relaxation {
                let costs = relaxation_costs(
                    inst,
                    &formulation.node_values(relaxed),
                    &formulation.edge_values(relaxed),
                );
                offer(mst_candidate(inst, start, anchor.is_some(), |e| {
                    costs.get(&e).copied().unwrap_or(3.0)
                }));
            }
        }
        Ok(self.finish(job, best, outcome.optimal))
    }

    fn finish(&self, job: &Job, elems: Vec<Elem>, optimal: bool) -> WorkerResult {
        let score = job.instance.score(&elems);
        if job.candidate && self.bound.raise(score) {
            debug!(score, "bound raised");
        }
        WorkerResult {
            elems,
            score,
            optimal,
        }
    }
}
