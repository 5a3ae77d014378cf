//! Identifier types shared by every module.

/// Vertex id, stable across subgraph copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// Edge id, stable across subgraph copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub usize);

/// A graph element: the unit signals attach to and solutions are made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Elem {
    Node(NodeId),
    Edge(EdgeId),
}

impl Elem {
    pub fn as_node(self) -> Option<NodeId> {
        match self {
            Elem::Node(v) => Some(v),
            Elem::Edge(_) => None,
        }
    }

    pub fn as_edge(self) -> Option<EdgeId> {
        match self {
            Elem::Edge(e) => Some(e),
            Elem::Node(_) => None,
        }
    }
}

impl From<NodeId> for Elem {
    fn from(v: NodeId) -> Self {
        Elem::Node(v)
    }
}

impl From<EdgeId> for Elem {
    fn from(e: EdgeId) -> Self {
        Elem::Edge(e)
    }
}
