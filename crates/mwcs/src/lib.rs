//! Maximum-weight connected subgraph solver.
//!
//! The engine takes a graph whose vertices and edges carry weights, directly
//! or through shared signals, and looks for the connected subgraph of best
//! total score. A run preprocesses the instance, splits it along connected
//! components and cut vertices, and solves the pieces in parallel with a
//! heuristic warm start and an exact MIP oracle.
//!
//! API Policy
//! - [`api`] is the curated surface used by the CLI; everything else is
//!   public for tests and experiments and may change freely.

pub mod api;
pub mod blocks;
pub mod decomposition;
pub mod error;
pub mod graph;
pub mod heuristics;
pub mod instance;
pub mod model;
pub mod oracle;
pub mod preprocess;
pub mod signals;
pub mod solver;

#[cfg(test)]
mod testutil;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{MwcsError, Result};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::graph::{EdgeId, Elem, NodeId};
    pub use crate::instance::{Instance, InstanceBuilder};
    pub use crate::preprocess::PreprocessLevel;
    pub use crate::signals::SignalId;
    pub use crate::solver::{Solution, Solver, SolverCfg, Strategy};
}
