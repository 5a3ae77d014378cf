//! Curated surface for front ends (UNSTABLE).
//!
//! Prefer these re-exports over deep module paths so callers survive
//! internal reshuffles.

// Instances
pub use crate::graph::{EdgeId, Elem, Graph, NodeId};
pub use crate::instance::{Instance, InstanceBuilder};
pub use crate::signals::{SignalId, Signals};
// Solving
pub use crate::preprocess::PreprocessLevel;
pub use crate::solver::{Solution, SolveStats, Solver, SolverCfg, Strategy};
// Oracles
pub use crate::oracle::{MilpOracle, Oracle, OracleOutcome, OracleRequest};
// Errors
pub use crate::error::{MwcsError, Result};
