//! Integer model of the connected-subgraph problem.
//!
//! Purpose
//! - Own a small solver-neutral representation of a maximisation MIP
//!   (variables, linear constraints, objective) and build the single-commodity
//!   flow formulation of one instance into it.
//! - Provide what the oracle needs around the model: a warm start from a
//!   heuristic selection, lazy connectivity cuts, and decoding of assignments
//!   back to live elements.
//!
//! Why this design
//! - Variables carry their origin, so every consumer addresses them by graph
//!   element instead of by position.
//! - The rooted tightening is computed as a list of descriptors by walking the
//!   block-cut tree; the builder only translates them.
//!
//! References
//! - Álvarez-Miranda, Ljubić, Mutzel: "The maximum weight connected subgraph
//!   problem" (flow model with depth variables).

mod flow;
mod formulation;
mod separator;
mod tighten;
mod types;
mod warm;

pub use flow::{FlowNetwork, MinCut};
pub use formulation::{Formulation, ModelOpts, Rooting};
pub use separator::{Separator, SeparatorCfg};
pub use tighten::{rooted_tightening, RootedTightening, SeparatorComponent, Tightening};
pub use types::{
    Assignment, Constraint, LinExpr, Model, Sense, Var, VarId, VarKind, VarOrigin, Violation,
};

pub(crate) use warm::WARM_TOL;
