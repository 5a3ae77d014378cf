//! Seam to the mixed-integer solver.
//!
//! Purpose
//! - Hand a built [`Model`] to an exact backend and get back an incumbent,
//!   its objective and whether it is proven optimal.
//! - Keep the backend replaceable: the scheduler only sees the [`Oracle`]
//!   trait, and tests plug in doubles.
//!
//! Time limits are honoured by the backend; running out of time is not an
//! error but a non-optimal outcome.

mod milp;

pub use milp::MilpOracle;

use std::time::Duration;

use crate::error::Result;
use crate::model::{Assignment, Constraint, Model};

/// Produces constraints violated by fractional values (lazy/user cuts).
pub trait CutCallback: Send + Sync {
    fn separate(&self, values: &Assignment) -> Vec<Constraint>;
}

pub struct OracleRequest<'a> {
    pub model: &'a Model,
    pub time_limit: Option<Duration>,
    pub warm_start: Option<Assignment>,
    pub cuts: Option<&'a dyn CutCallback>,
}

impl<'a> OracleRequest<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self {
            model,
            time_limit: None,
            warm_start: None,
            cuts: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OracleOutcome {
    /// Best assignment found; `None` if nothing feasible is known.
    pub assignment: Option<Assignment>,
    pub objective: f64,
    /// The assignment is optimal, or the model is proven infeasible.
    pub optimal: bool,
    /// Last relaxation values seen by the cutting-plane loop.
    pub relaxation: Option<Assignment>,
}

impl OracleOutcome {
    pub fn empty(optimal: bool) -> Self {
        Self {
            assignment: None,
            objective: f64::NEG_INFINITY,
            optimal,
            relaxation: None,
        }
    }
}

pub trait Oracle: Send + Sync {
    fn solve(&self, request: OracleRequest<'_>) -> Result<OracleOutcome>;
}
