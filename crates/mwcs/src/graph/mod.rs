//! Graph model: stable element ids and an undirected multigraph store.
//!
//! Subgraphs are independent containers that reuse the parent's ids, so an
//! answer found on any piece is directly expressed in original identities.

mod store;
mod types;

pub use store::Graph;
pub use types::{EdgeId, Elem, NodeId};

#[cfg(test)]
mod tests;
