//! Undirected multigraph keyed by stable ids.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::types::{EdgeId, Elem, NodeId};

/// Undirected multigraph with parallel edges and self-loops.
///
/// Ordered maps keep every traversal deterministic. A self-loop appears once
/// in its vertex's incidence list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    adj: BTreeMap<NodeId, Vec<EdgeId>>,
    ends: BTreeMap<EdgeId, (NodeId, NodeId)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex; no-op if present.
    pub fn add_node(&mut self, v: NodeId) {
        self.adj.entry(v).or_default();
    }

    /// Insert an edge, creating missing endpoints.
    pub fn add_edge(&mut self, e: EdgeId, u: NodeId, v: NodeId) {
        if self.ends.contains_key(&e) {
            return;
        }
        self.ends.insert(e, (u, v));
        self.adj.entry(u).or_default().push(e);
        if u != v {
            self.adj.entry(v).or_default().push(e);
        }
    }

    pub fn remove_edge(&mut self, e: EdgeId) -> bool {
        let Some((u, v)) = self.ends.remove(&e) else {
            return false;
        };
        for x in [u, v] {
            if let Some(list) = self.adj.get_mut(&x) {
                list.retain(|&f| f != e);
            }
        }
        true
    }

    /// Remove a vertex and its incident edges; returns the removed edges.
    pub fn remove_node(&mut self, v: NodeId) -> Vec<EdgeId> {
        let Some(incident) = self.adj.get(&v).cloned() else {
            return Vec::new();
        };
        for &e in &incident {
            self.remove_edge(e);
        }
        self.adj.remove(&v);
        incident
    }

    pub fn remove(&mut self, x: Elem) {
        match x {
            Elem::Node(v) => {
                self.remove_node(v);
            }
            Elem::Edge(e) => {
                self.remove_edge(e);
            }
        }
    }

    /// Move the `from` endpoint of `e` onto `to`.
    pub fn reattach(&mut self, e: EdgeId, from: NodeId, to: NodeId) {
        let Some(&(u, v)) = self.ends.get(&e) else {
            return;
        };
        let (a, b) = if u == from {
            (to, v)
        } else if v == from {
            (u, to)
        } else {
            return;
        };
        self.remove_edge(e);
        self.add_edge(e, a, b);
    }

    pub fn contains_node(&self, v: NodeId) -> bool {
        self.adj.contains_key(&v)
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.ends.contains_key(&e)
    }

    pub fn contains(&self, x: Elem) -> bool {
        match x {
            Elem::Node(v) => self.contains_node(v),
            Elem::Edge(e) => self.contains_edge(e),
        }
    }

    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    pub fn edge_count(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adj.keys().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.ends.keys().copied()
    }

    /// All elements, vertices first.
    pub fn elems(&self) -> Vec<Elem> {
        self.nodes()
            .map(Elem::Node)
            .chain(self.edges().map(Elem::Edge))
            .collect()
    }

    pub fn endpoints(&self, e: EdgeId) -> Option<(NodeId, NodeId)> {
        self.ends.get(&e).copied()
    }

    /// The endpoint of `e` other than `v` (`v` itself for a self-loop).
    pub fn opposite(&self, e: EdgeId, v: NodeId) -> Option<NodeId> {
        let (a, b) = self.endpoints(e)?;
        if a == v {
            Some(b)
        } else if b == v {
            Some(a)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self, e: EdgeId) -> bool {
        matches!(self.endpoints(e), Some((a, b)) if a == b)
    }

    pub fn incident(&self, v: NodeId) -> &[EdgeId] {
        self.adj.get(&v).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, v: NodeId) -> usize {
        self.incident(v).len()
    }

    /// Distinct neighbours of `v`, excluding `v`, sorted.
    pub fn neighbors(&self, v: NodeId) -> Vec<NodeId> {
        let set: BTreeSet<NodeId> = self
            .incident(v)
            .iter()
            .filter_map(|&e| self.opposite(e, v))
            .filter(|&u| u != v)
            .collect();
        set.into_iter().collect()
    }

    pub fn edges_between(&self, u: NodeId, v: NodeId) -> Vec<EdgeId> {
        self.incident(u)
            .iter()
            .copied()
            .filter(|&e| self.opposite(e, u) == Some(v))
            .collect()
    }

    /// Induced subgraph on `nodes`.
    pub fn subgraph(&self, nodes: &BTreeSet<NodeId>) -> Graph {
        let mut g = Graph::new();
        for &v in nodes {
            if self.contains_node(v) {
                g.add_node(v);
            }
        }
        for (&e, &(u, v)) in &self.ends {
            if nodes.contains(&u) && nodes.contains(&v) {
                g.add_edge(e, u, v);
            }
        }
        g
    }

    /// Subgraph made of `nodes` and those `edges` whose endpoints are both kept.
    pub fn subgraph_with(&self, nodes: &BTreeSet<NodeId>, edges: &BTreeSet<EdgeId>) -> Graph {
        let mut g = Graph::new();
        for &v in nodes {
            if self.contains_node(v) {
                g.add_node(v);
            }
        }
        for &e in edges {
            if let Some((u, v)) = self.endpoints(e) {
                if g.contains_node(u) && g.contains_node(v) {
                    g.add_edge(e, u, v);
                }
            }
        }
        g
    }

    /// Connected components, each sorted, ordered by smallest vertex.
    pub fn components(&self) -> Vec<BTreeSet<NodeId>> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for v in self.nodes() {
            if seen.contains(&v) {
                continue;
            }
            let comp = self.reach(v, |_| true);
            seen.extend(comp.iter().copied());
            out.push(comp);
        }
        out
    }

    /// Vertices reachable from `start` through vertices accepted by `keep`.
    pub fn reach(&self, start: NodeId, keep: impl Fn(NodeId) -> bool) -> BTreeSet<NodeId> {
        let mut comp = BTreeSet::new();
        if !self.contains_node(start) {
            return comp;
        }
        comp.insert(start);
        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            for &e in self.incident(u) {
                let Some(w) = self.opposite(e, u) else {
                    continue;
                };
                if keep(w) && comp.insert(w) {
                    queue.push_back(w);
                }
            }
        }
        comp
    }

    /// Whether `elems` forms a connected subgraph of `self` (edges need both endpoints).
    pub fn is_connected_selection(&self, elems: &[Elem]) -> bool {
        let nodes: BTreeSet<NodeId> = elems.iter().filter_map(|x| x.as_node()).collect();
        let edges: BTreeSet<EdgeId> = elems.iter().filter_map(|x| x.as_edge()).collect();
        for &e in &edges {
            match self.endpoints(e) {
                Some((u, v)) if nodes.contains(&u) && nodes.contains(&v) => {}
                _ => return false,
            }
        }
        for &v in &nodes {
            if !self.contains_node(v) {
                return false;
            }
        }
        let Some(&first) = nodes.iter().next() else {
            return true;
        };
        let sub = self.subgraph_with(&nodes, &edges);
        sub.reach(first, |_| true).len() == nodes.len()
    }
}
