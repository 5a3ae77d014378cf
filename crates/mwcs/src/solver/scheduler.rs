//! Splits an instance into jobs and runs them on a worker pool.
//!
//! Jobs run on a rayon pool of `threads` workers and are collected in job
//! order, so the chosen answer does not depend on completion order. The only
//! state shared between workers is the [`AtomicBound`].

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::decomposition::{balanced_cutpoint, Plan};
use crate::error::{MwcsError, Result};
use crate::graph::{Elem, NodeId};
use crate::instance::Instance;
use crate::model::Rooting;
use crate::oracle::Oracle;
use crate::signals::SignalId;

use super::bound::AtomicBound;
use super::time::TimeLimit;
use super::worker::{Job, Worker, WorkerResult};
use super::{SolverCfg, Strategy};

/// Best answer over original elements.
#[derive(Clone, Debug)]
pub(crate) struct Outcome {
    pub elems: Vec<Elem>,
    pub score: f64,
    pub optimal: bool,
    pub workers: usize,
}

pub(crate) struct Scheduler<'a> {
    pub cfg: &'a SolverCfg,
    pub oracle: &'a dyn Oracle,
    pub time: &'a TimeLimit,
}

/// Running best over candidate answers, kept in job order.
struct Best {
    mandatory: Vec<SignalId>,
    current: Option<(Vec<Elem>, f64)>,
}

impl Best {
    fn new(inst: &Instance) -> Self {
        let mandatory = inst.signals().mandatory();
        let current = mandatory.is_empty().then(|| (Vec::new(), 0.0));
        Self { mandatory, current }
    }

    /// `score` is the worker's score, equal to the score of `originals`.
    fn offer(&mut self, inst: &Instance, originals: Vec<Elem>, score: f64) {
        let signals = inst.signals();
        let covered = self.mandatory.iter().all(|m| {
            originals
                .iter()
                .any(|&x| signals.signals_of(x).contains(m))
        });
        if !covered {
            return;
        }
        if self.current.as_ref().map_or(true, |(_, s)| score > *s) {
            self.current = Some((originals, score));
        }
    }
}

impl Scheduler<'_> {
    pub fn run(&self, inst: &Instance) -> Result<Outcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.cfg.threads)
            .build()
            .map_err(|e| MwcsError::config(format!("thread pool: {e}")))?;
        let floor = if inst.signals().mandatory().is_empty() {
            0.0
        } else {
            f64::NEG_INFINITY
        };
        let bound = AtomicBound::new(floor);
        // A bound from an answer that misses a mandatory signal could prune
        // the only covering ones.
        let prune = floor == 0.0;
        match self.cfg.strategy {
            Strategy::Cutpoints => self.run_cutpoints(&pool, &bound, inst, prune),
            Strategy::Bicomponent => self.run_bicomponent(&pool, &bound, inst, prune),
        }
    }

    fn run_jobs(
        &self,
        pool: &ThreadPool,
        bound: &AtomicBound,
        jobs: &[Job],
    ) -> Result<Vec<WorkerResult>> {
        let worker = Worker {
            cfg: self.cfg,
            oracle: self.oracle,
            bound,
            time: self.time,
        };
        let results: Vec<Result<WorkerResult>> = pool.install(|| {
            jobs.par_iter()
                .enumerate()
                .map(|(i, job)| worker.run(job).map_err(|e| MwcsError::worker(i, e)))
                .collect()
        });
        results.into_iter().collect()
    }

    /// Jobs for the cutpoint strategy: big components are solved rooted at
    /// their balanced cutpoint and the pieces left without it are queued.
    fn cutpoint_jobs(&self, inst: &Instance, prune: bool) -> Vec<Job> {
        let mut parts: Vec<BTreeSet<NodeId>> = Vec::new();
        let mut queue: BinaryHeap<(usize, Reverse<usize>)> = BinaryHeap::new();
        for comp in inst.graph().components() {
            enqueue(&mut parts, &mut queue, comp);
        }

        let mut jobs = Vec::new();
        while let Some((size, Reverse(i))) = queue.pop() {
            let comp = std::mem::take(&mut parts[i]);
            let sub = inst.subinstance(&comp);
            if size >= self.cfg.split_threshold && !self.time.is_exhausted() {
                if let Some(cut) = balanced_cutpoint(sub.graph()) {
                    debug!(size, cutpoint = cut.0, "splitting component");
                    let mut rest = comp;
                    rest.remove(&cut);
                    for piece in inst.graph().subgraph(&rest).components() {
                        enqueue(&mut parts, &mut queue, piece);
                    }
                    jobs.push(Job {
                        instance: sub,
                        rooting: Rooting::Rooted { anchor: cut },
                        candidate: prune,
                    });
                    continue;
                }
            }
            jobs.push(Job {
                instance: sub,
                rooting: Rooting::Unrooted,
                candidate: prune,
            });
        }
        jobs
    }

    fn run_cutpoints(
        &self,
        pool: &ThreadPool,
        bound: &AtomicBound,
        inst: &Instance,
        prune: bool,
    ) -> Result<Outcome> {
        let jobs = self.cutpoint_jobs(inst, prune);
        info!(jobs = jobs.len(), "components scheduled");
        let results = self.run_jobs(pool, bound, &jobs)?;
        let mut best = Best::new(inst);
        for (job, r) in jobs.iter().zip(&results) {
            best.offer(inst, job.instance.expand(&r.elems), r.score);
        }
        Ok(finish(best, &results))
    }

    fn run_bicomponent(
        &self,
        pool: &ThreadPool,
        bound: &AtomicBound,
        inst: &Instance,
        prune: bool,
    ) -> Result<Outcome> {
        if !inst.signals().is_plain() {
            return Err(MwcsError::config(
                "bicomponent decomposition needs plain weights (no shared signals)",
            ));
        }
        let Some(plan) = Plan::new(inst.graph()) else {
            return Ok(finish(Best::new(inst), &[]));
        };

        let mut wave1: Vec<Job> = plan
            .rooted
            .iter()
            .map(|part| Job {
                instance: inst.subinstance(&part.nodes),
                rooting: Rooting::Rooted { anchor: part.anchor },
                candidate: false,
            })
            .collect();
        let rooted = wave1.len();
        for comp in &plan.unrooted {
            wave1.push(Job {
                instance: inst.subinstance(comp),
                rooting: Rooting::Unrooted,
                candidate: prune,
            });
        }
        for part in &plan.rooted {
            let mut rest = part.nodes.clone();
            rest.remove(&part.anchor);
            for piece in inst.graph().subgraph(&rest).components() {
                wave1.push(Job {
                    instance: inst.subinstance(&piece),
                    rooting: Rooting::Unrooted,
                    candidate: prune,
                });
            }
        }
        info!(
            rooted,
            standalone = wave1.len() - rooted,
            biggest = plan.biggest.len(),
            "bicomponent plan"
        );
        let first = self.run_jobs(pool, bound, &wave1)?;

        let mut big = inst.subinstance(&plan.biggest);
        for ((job, r), part) in wave1.iter().zip(&first).zip(&plan.rooted) {
            let anchor = Elem::Node(part.anchor);
            let gained: Vec<Elem> = r.elems.iter().copied().filter(|&x| x != anchor).collect();
            let originals = job.instance.expand(&gained);
            big.absorb_originals(anchor, &originals);
        }
        let second_job = Job {
            instance: big,
            rooting: Rooting::Unrooted,
            candidate: prune,
        };
        let second = self
            .run_jobs(pool, bound, std::slice::from_ref(&second_job))
            .map_err(|e| match e {
                MwcsError::WorkerFailed { source, .. } => MwcsError::worker(wave1.len(), *source),
                other => other,
            })?;

        let mut best = Best::new(inst);
        for (job, r) in wave1.iter().zip(&first).skip(rooted) {
            best.offer(inst, job.instance.expand(&r.elems), r.score);
        }
        for r in &second {
            best.offer(inst, second_job.instance.expand(&r.elems), r.score);
        }
        let all: Vec<WorkerResult> = first.into_iter().chain(second).collect();
        Ok(finish(best, &all))
    }
}

/// Largest first, then first queued.
fn enqueue(
    parts: &mut Vec<BTreeSet<NodeId>>,
    queue: &mut BinaryHeap<(usize, Reverse<usize>)>,
    part: BTreeSet<NodeId>,
) {
    queue.push((part.len(), Reverse(parts.len())));
    parts.push(part);
}

fn finish(best: Best, results: &[WorkerResult]) -> Outcome {
    let optimal = results.iter().all(|r| r.optimal);
    let (elems, score) = best.current.unwrap_or((Vec::new(), f64::NEG_INFINITY));
    info!(score, optimal, workers = results.len(), "scheduler done");
    Outcome {
        elems,
        score,
        optimal,
        workers: results.len(),
    }
}
