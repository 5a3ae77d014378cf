//! `good_lp` backend on the pure-Rust `microlp` solver.
//!
//! The cutting-plane loop runs on the LP relaxation before branching: every
//! round solves the relaxation with the cuts found so far and asks the
//! callback for more. The integer solve then runs on the calling thread with
//! what is left of the time slice handed to microlp, which stops branching on
//! its own and reports the best incumbent.

use std::time::{Duration, Instant};

use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, IntoAffineExpression, ProblemVariables, ResolutionError,
    Solution, SolutionStatus, SolverModel, Variable, WithInitialSolution, WithTimeLimit,
};
use tracing::{debug, warn};

use crate::error::{MwcsError, Result};
use crate::model::{Assignment, Constraint, LinExpr, Model, Sense, VarKind, WARM_TOL};

use super::{Oracle, OracleOutcome, OracleRequest};

#[derive(Clone, Debug)]
pub struct MilpOracle {
    /// Cutting-plane rounds on the relaxation.
    pub rounds: usize,
}

impl Default for MilpOracle {
    fn default() -> Self {
        Self { rounds: 20 }
    }
}

impl MilpOracle {
    pub fn new(rounds: usize) -> Self {
        Self { rounds }
    }
}

fn expression(e: &LinExpr, vars: &[Variable]) -> Expression {
    let mut out = e.constant.into_expression();
    for &(v, c) in &e.terms {
        out += vars[v.0] * c;
    }
    out
}

/// Result of one backend call.
enum Run {
    Solved { values: Assignment, optimal: bool },
    Infeasible,
    /// The limit hit before any feasible point was found.
    OutOfTime,
}

/// Solve `model` plus `extra` within `limit`.
fn solve_once(
    model: &Model,
    extra: &[Constraint],
    relax: bool,
    limit: Option<Duration>,
    warm: Option<&Assignment>,
) -> Result<Run> {
    let mut pv = ProblemVariables::new();
    let vars: Vec<Variable> = model
        .vars()
        .iter()
        .map(|v| {
            let (lo, hi) = v.kind.bounds();
            let mut def = variable();
            if v.kind == VarKind::Binary && !relax {
                def = def.binary();
            } else {
                if lo.is_finite() {
                    def = def.min(lo);
                }
                if hi.is_finite() {
                    def = def.max(hi);
                }
            }
            pv.add(def)
        })
        .collect();
    let mut problem = pv
        .maximise(expression(model.objective(), &vars))
        .using(microlp);
    if let Some(limit) = limit {
        problem = problem.with_time_limit(limit.as_secs_f64());
    }
    if let Some(warm) = warm {
        problem = problem.with_initial_solution(vars.iter().copied().zip(warm.0.iter().copied()));
    }
    for c in model.constraints().iter().chain(extra) {
        let lhs = expression(&c.lhs, &vars);
        problem.add_constraint(match c.sense {
            Sense::Le => constraint::leq(lhs, c.rhs),
            Sense::Ge => constraint::geq(lhs, c.rhs),
            Sense::Eq => constraint::eq(lhs, c.rhs),
        });
    }
    match problem.solve() {
        Ok(sol) => Ok(Run::Solved {
            values: Assignment(vars.iter().map(|&v| sol.value(v)).collect()),
            optimal: matches!(sol.status(), SolutionStatus::Optimal),
        }),
        Err(ResolutionError::Infeasible) => Ok(Run::Infeasible),
        // microlp reports an interrupted search without incumbent this way.
        Err(ResolutionError::Other(_)) if limit.is_some() => Ok(Run::OutOfTime),
        Err(e) => Err(MwcsError::oracle(e.to_string())),
    }
}

impl Oracle for MilpOracle {
    fn solve(&self, request: OracleRequest<'_>) -> Result<OracleOutcome> {
        let started = Instant::now();
        let model = request.model;
        let remaining = || {
            request
                .time_limit
                .map(|t| t.saturating_sub(started.elapsed()))
        };
        let warm = request
            .warm_start
            .filter(|w| model.is_feasible(w, WARM_TOL));

        let mut cuts: Vec<Constraint> = Vec::new();
        let mut relaxation = None;
        if let Some(cb) = request.cuts {
            for round in 0..self.rounds {
                if remaining().is_some_and(|r| r.is_zero()) {
                    break;
                }
                let Run::Solved { values, .. } = solve_once(model, &cuts, true, remaining(), None)?
                else {
                    break;
                };
                let fresh = cb.separate(&values);
                relaxation = Some(values);
                debug!(round, cuts = fresh.len(), "separation round");
                if fresh.is_empty() {
                    break;
                }
                cuts.extend(fresh);
            }
        }

        match solve_once(model, &cuts, false, remaining(), warm.as_ref())? {
            Run::Solved { values, optimal } => {
                if !optimal {
                    warn!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "MIP time limit reached with an incumbent"
                    );
                }
                let mut objective = model.objective().eval(&values);
                let mut assignment = values;
                if let Some(w) = warm {
                    let start = model.objective().eval(&w);
                    if start > objective {
                        objective = start;
                        assignment = w;
                    }
                }
                Ok(OracleOutcome {
                    objective,
                    assignment: Some(assignment),
                    optimal,
                    relaxation,
                })
            }
            Run::Infeasible => Ok(OracleOutcome {
                relaxation,
                ..OracleOutcome::empty(true)
            }),
            Run::OutOfTime => {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "MIP time limit reached"
                );
                Ok(OracleOutcome {
                    objective: warm
                        .as_ref()
                        .map_or(f64::NEG_INFINITY, |w| model.objective().eval(w)),
                    assignment: warm,
                    optimal: false,
                    relaxation,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::model::{VarId, VarOrigin};
    use crate::oracle::CutCallback;

    fn two_binaries() -> (Model, VarId, VarId) {
        let mut m = Model::new();
        let x = m.add_var(VarKind::Binary, VarOrigin::Objective);
        let y = m.add_var(VarKind::Binary, VarOrigin::Objective);
        m.set_objective(LinExpr::var(x).term(y, 2.0));
        m.add_constraint(Constraint::le(LinExpr::var(x).term(y, 1.0), 1.5));
        (m, x, y)
    }

    #[test]
    fn solves_a_tiny_integer_program() {
        let (m, _, y) = two_binaries();
        let out = MilpOracle::default()
            .solve(OracleRequest::new(&m))
            .expect("solvable");
        assert!(out.optimal);
        assert!((out.objective - 2.0).abs() < 1e-6);
        let values = out.assignment.expect("incumbent");
        assert!(values.get(y) > 0.5);
    }

    #[test]
    fn infeasible_models_have_no_assignment() {
        let (mut m, x, _) = two_binaries();
        m.add_constraint(Constraint::ge(LinExpr::var(x), 2.0));
        let out = MilpOracle::default()
            .solve(OracleRequest::new(&m))
            .expect("infeasibility is not an error");
        assert!(out.optimal);
        assert!(out.assignment.is_none());
    }

    struct ForbidY {
        y: VarId,
        calls: AtomicUsize,
    }

    impl CutCallback for ForbidY {
        fn separate(&self, values: &Assignment) -> Vec<Constraint> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if values.get(self.y) > 1e-6 {
                vec![Constraint::le(LinExpr::var(self.y), 0.0)]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn cuts_from_the_relaxation_are_kept() {
        let (m, x, y) = two_binaries();
        let cb = ForbidY {
            y,
            calls: AtomicUsize::new(0),
        };
        let req = OracleRequest {
            cuts: Some(&cb),
            ..OracleRequest::new(&m)
        };
        let out = MilpOracle::default().solve(req).expect("solvable");
        let values = out.assignment.expect("incumbent");
        assert!(values.get(y) < 0.5);
        assert!(values.get(x) > 0.5);
        assert_eq!(cb.calls.load(Ordering::SeqCst), 2);
        assert!(out.relaxation.is_some());
    }

    #[test]
    fn warm_start_survives_an_exhausted_budget() {
        let (m, _, _) = two_binaries();
        let warm = Assignment(vec![1.0, 0.0]);
        let req = OracleRequest {
            time_limit: Some(Duration::ZERO),
            warm_start: Some(warm),
            ..OracleRequest::new(&m)
        };
        let out = MilpOracle::default().solve(req).expect("no failure");
        // Either the solver beat the clock or the warm start came back.
        assert!(out.assignment.is_some());
        assert!(out.objective >= 1.0 - 1e-6);
    }

    /// Strongly correlated knapsack: slow to close by branching.
    fn knapsack(items: usize) -> Model {
        let mut m = Model::new();
        let mut objective = LinExpr::default();
        let mut load = LinExpr::default();
        let mut total = 0.0;
        for i in 0..items {
            let x = m.add_var(VarKind::Binary, VarOrigin::Objective);
            let w = 20.0 + ((i * 37) % 61) as f64;
            objective = objective.term(x, w + 10.0);
            load = load.term(x, w);
            total += w;
        }
        m.set_objective(objective);
        m.add_constraint(Constraint::le(load, (total / 2.0).floor() + 0.5));
        m
    }

    #[test]
    fn time_limited_solve_returns_on_the_calling_thread() {
        let m = knapsack(60);
        let limit = Duration::from_millis(100);
        let req = OracleRequest {
            time_limit: Some(limit),
            warm_start: Some(Assignment::zeros(m.vars().len())),
            ..OracleRequest::new(&m)
        };
        let started = Instant::now();
        let out = MilpOracle::default().solve(req).expect("no failure");
        assert!(started.elapsed() < limit + Duration::from_secs(3));
        let values = out.assignment.expect("incumbent or warm start");
        assert!(m.is_feasible(&values, WARM_TOL));
        assert!(out.objective >= 0.0);
    }
}
