//! Edmonds–Karp max-flow on a dense residual matrix.

use std::collections::{BTreeSet, HashMap, VecDeque};

use nalgebra::DMatrix;

use crate::graph::NodeId;

/// Residual capacities at or below this count as saturated.
const FLOW_EPS: f64 = 1e-9;

/// Undirected capacitated network over a fixed vertex set.
#[derive(Clone, Debug)]
pub struct FlowNetwork {
    index: HashMap<NodeId, usize>,
    nodes: Vec<NodeId>,
    cap: DMatrix<f64>,
}

/// Max-flow value and the source side of a minimum cut.
#[derive(Clone, Debug, PartialEq)]
pub struct MinCut {
    pub value: f64,
    pub source_side: BTreeSet<NodeId>,
}

impl FlowNetwork {
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        let index = nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let n = nodes.len();
        Self {
            index,
            nodes,
            cap: DMatrix::zeros(n, n),
        }
    }

    /// Add `c` in both directions between `u` and `v`; unknown vertices and
    /// loops are ignored.
    pub fn add_capacity(&mut self, u: NodeId, v: NodeId, c: f64) {
        let (Some(&i), Some(&j)) = (self.index.get(&u), self.index.get(&v)) else {
            return;
        };
        if i == j || c <= 0.0 {
            return;
        }
        self.cap[(i, j)] += c;
        self.cap[(j, i)] += c;
    }

    pub fn max_flow(&self, s: NodeId, t: NodeId) -> MinCut {
        let (Some(&si), Some(&ti)) = (self.index.get(&s), self.index.get(&t)) else {
            return MinCut {
                value: 0.0,
                source_side: BTreeSet::new(),
            };
        };
        let n = self.nodes.len();
        let mut residual = self.cap.clone();
        let mut value = 0.0;
        loop {
            let pred = self.bfs(&residual, si);
            if si == ti || pred[ti].is_none() {
                let source_side = (0..n)
                    .filter(|&i| i == si || pred[i].is_some())
                    .map(|i| self.nodes[i])
                    .collect();
                return MinCut { value, source_side };
            }
            let mut push = f64::INFINITY;
            let mut at = ti;
            while let Some(p) = pred[at] {
                push = push.min(residual[(p, at)]);
                at = p;
            }
            let mut at = ti;
            while let Some(p) = pred[at] {
                residual[(p, at)] -= push;
                residual[(at, p)] += push;
                at = p;
            }
            value += push;
        }
    }

    fn bfs(&self, residual: &DMatrix<f64>, s: usize) -> Vec<Option<usize>> {
        let n = self.nodes.len();
        let mut pred = vec![None; n];
        let mut seen = vec![false; n];
        seen[s] = true;
        let mut queue = VecDeque::from([s]);
        while let Some(u) = queue.pop_front() {
            for v in 0..n {
                if !seen[v] && residual[(u, v)] > FLOW_EPS {
                    seen[v] = true;
                    pred[v] = Some(u);
                    queue.push_back(v);
                }
            }
        }
        pred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diamond_flow_and_cut() {
        let n: Vec<NodeId> = (0..4).map(NodeId).collect();
        let mut net = FlowNetwork::new(n.iter().copied());
        net.add_capacity(n[0], n[1], 0.5);
        net.add_capacity(n[0], n[2], 0.25);
        net.add_capacity(n[1], n[3], 1.0);
        net.add_capacity(n[2], n[3], 1.0);
        let cut = net.max_flow(n[0], n[3]);
        assert!((cut.value - 0.75).abs() < 1e-12);
        assert_eq!(cut.source_side, [n[0]].into_iter().collect());
    }

    #[test]
    fn disconnected_sink_has_zero_flow() {
        let n: Vec<NodeId> = (0..3).map(NodeId).collect();
        let mut net = FlowNetwork::new(n.iter().copied());
        net.add_capacity(n[0], n[1], 1.0);
        let cut = net.max_flow(n[0], n[2]);
        assert_eq!(cut.value, 0.0);
        assert_eq!(cut.source_side, [n[0], n[1]].into_iter().collect());
    }
}
