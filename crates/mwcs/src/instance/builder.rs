//! Incremental construction of instances with fresh ids.

use crate::error::Result;
use crate::graph::{EdgeId, Elem, Graph, NodeId};
use crate::signals::{SignalId, Signals};

use super::Instance;

/// Hands out consecutive vertex and edge ids while the graph and registry
/// are filled in.
#[derive(Debug, Default)]
pub struct InstanceBuilder {
    graph: Graph,
    signals: Signals,
    next_node: usize,
    next_edge: usize,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self) -> NodeId {
        let v = NodeId(self.next_node);
        self.next_node += 1;
        self.graph.add_node(v);
        v
    }

    pub fn add_edge(&mut self, u: NodeId, v: NodeId) -> EdgeId {
        let e = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.graph.add_edge(e, u, v);
        e
    }

    pub fn add_signal(&mut self, weight: f64) -> SignalId {
        self.signals.add_signal(weight)
    }

    pub fn attach(&mut self, x: impl Into<Elem>, sig: SignalId) {
        self.signals.attach(x.into(), sig);
    }

    /// Vertex with its own singleton signal.
    pub fn add_weighted_node(&mut self, weight: f64) -> NodeId {
        let v = self.add_node();
        self.signals.add_weighted(Elem::Node(v), weight);
        v
    }

    /// Edge with its own singleton signal.
    pub fn add_weighted_edge(&mut self, u: NodeId, v: NodeId, weight: f64) -> EdgeId {
        let e = self.add_edge(u, v);
        self.signals.add_weighted(Elem::Edge(e), weight);
        e
    }

    pub fn build(self) -> Result<Instance> {
        Instance::new(self.graph, self.signals)
    }
}
