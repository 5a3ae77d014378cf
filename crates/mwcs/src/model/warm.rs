//! Warm starts from heuristic selections.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::graph::{EdgeId, Elem, NodeId};
use crate::instance::Instance;

use super::formulation::Formulation;
use super::types::Assignment;

/// Feasibility tolerance for warm starts.
pub(crate) const WARM_TOL: f64 = 1e-6;

impl Formulation {
    /// Full assignment for a connected selection of live elements, or `None`
    /// if the selection (closed under the dominance rule) violates the model.
    pub fn warm_start(&self, inst: &Instance, candidate: &[Elem]) -> Option<Assignment> {
        let g = inst.graph();
        let mut nodes: BTreeSet<NodeId> = candidate.iter().filter_map(|x| x.as_node()).collect();
        let mut edges: BTreeSet<EdgeId> = candidate
            .iter()
            .filter_map(|x| x.as_edge())
            .filter(|e| self.w.contains_key(e))
            .collect();
        loop {
            let mut grown = false;
            for &(v, e, u) in &self.dominance {
                if nodes.contains(&v) && edges.insert(e) {
                    nodes.insert(u);
                    grown = true;
                }
            }
            if !grown {
                break;
            }
        }

        let mut values = Assignment::zeros(self.model.vars().len());
        let root = self
            .rooting
            .anchor()
            .or_else(|| nodes.iter().next_back().copied());
        if let Some(root) = root {
            values.set(*self.entry.get(&root)?, 1.0);
            let mut level: BTreeMap<NodeId, usize> = BTreeMap::from([(root, 0)]);
            let mut queue = VecDeque::from([root]);
            while let Some(v) = queue.pop_front() {
                for &e in g.incident(v) {
                    if !edges.contains(&e) {
                        continue;
                    }
                    let Some(u) = g.opposite(e, v) else {
                        continue;
                    };
                    if level.contains_key(&u) {
                        continue;
                    }
                    level.insert(u, level[&v] + 1);
                    values.set(*self.arcs.get(&(e, u))?, 1.0);
                    queue.push_back(u);
                }
            }
            if level.len() != nodes.len() || !nodes.contains(&root) {
                return None;
            }
            for (v, d) in level {
                values.set(self.depth[&v], d as f64);
            }
            if let Some(rank) = self.rank {
                let k = self.y.keys().position(|&v| v == root)? + 1;
                values.set(rank, k as f64);
            }
        }
        for v in &nodes {
            values.set(*self.y.get(v)?, 1.0);
        }
        for e in &edges {
            values.set(self.w[e], 1.0);
        }
        for (aux, carriers) in self.aux.values() {
            let hit = carriers.iter().any(|x| match *x {
                Elem::Node(v) => nodes.contains(&v),
                Elem::Edge(e) => edges.contains(&e),
            });
            values.set(*aux, if hit { 1.0 } else { 0.0 });
        }
        values.set(self.sum, self.terms.eval(&values));

        self.model.is_feasible(&values, WARM_TOL).then_some(values)
    }
}
