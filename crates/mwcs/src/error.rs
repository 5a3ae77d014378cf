//! Error type shared by the solving engine.
//!
//! Timeouts are not errors: they surface as `optimal = false` on results.

use thiserror::Error;

/// Failures that abort a solve.
#[derive(Debug, Error)]
pub enum MwcsError {
    /// The MIP backend could not be set up or crashed mid-solve.
    #[error("oracle failure: {reason}")]
    Oracle { reason: String },
    /// A worker failed; the whole multi-component solve is aborted.
    #[error("worker for component {component} failed: {source}")]
    WorkerFailed {
        component: usize,
        #[source]
        source: Box<MwcsError>,
    },
    /// Inconsistent input or internal state (e.g. a shared negative signal).
    #[error("invariant violated: {reason}")]
    Invariant { reason: String },
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl MwcsError {
    pub fn oracle(reason: impl Into<String>) -> Self {
        Self::Oracle {
            reason: reason.into(),
        }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::Invariant {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn worker(component: usize, source: MwcsError) -> Self {
        Self::WorkerFailed {
            component,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, MwcsError>;
