//! Connectivity cuts for rooted models.
//!
//! For a block entered at `root` and a vertex `v` of it, every selection
//! containing `v` uses some edge of each `root`–`v` edge cut inside the
//! block. When the relaxation routes less than `y_v` flow from `root` to
//! `v` over the edge values, the minimum cut yields `Σ w_e >= y_v`.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::graph::{EdgeId, Graph, NodeId};
use crate::oracle::CutCallback;

use super::flow::FlowNetwork;
use super::formulation::Formulation;
use super::tighten::SeparatorComponent;
use super::types::{Assignment, Constraint, LinExpr, VarId};

#[derive(Clone, Copy, Debug)]
pub struct SeparatorCfg {
    pub max_cuts_per_round: usize,
    /// Blocks outside `[min_block_size, max_block_size]` are skipped.
    pub min_block_size: usize,
    pub max_block_size: usize,
    /// Cutting-plane rounds on the root relaxation.
    pub rounds: usize,
    pub eps: f64,
}

impl Default for SeparatorCfg {
    fn default() -> Self {
        Self {
            max_cuts_per_round: 10,
            min_block_size: 3,
            max_block_size: 1500,
            rounds: 20,
            eps: 1e-6,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Separator {
    cfg: SeparatorCfg,
    y: BTreeMap<NodeId, VarId>,
    w: BTreeMap<EdgeId, VarId>,
    ends: HashMap<EdgeId, (NodeId, NodeId)>,
    components: Vec<SeparatorComponent>,
}

impl Separator {
    pub(crate) fn new(f: &Formulation, g: &Graph, cfg: SeparatorCfg) -> Self {
        let components: Vec<SeparatorComponent> = f
            .tightening
            .components
            .iter()
            .filter(|c| (cfg.min_block_size..=cfg.max_block_size).contains(&c.nodes.len()))
            .cloned()
            .collect();
        let ends = components
            .iter()
            .flat_map(|c| c.edges.iter())
            .filter_map(|&e| Some((e, g.endpoints(e)?)))
            .collect();
        Self {
            cfg,
            y: f.y.clone(),
            w: f.w.clone(),
            ends,
            components,
        }
    }

    pub fn cfg(&self) -> SeparatorCfg {
        self.cfg
    }

    fn cuts_for(&self, comp: &SeparatorComponent, values: &Assignment, out: &mut Vec<Constraint>) {
        let mut net = FlowNetwork::new(comp.nodes.iter().copied());
        for &e in &comp.edges {
            if let (Some(&(a, b)), Some(&we)) = (self.ends.get(&e), self.w.get(&e)) {
                net.add_capacity(a, b, values.get(we));
            }
        }
        for &v in &comp.nodes {
            if out.len() >= self.cfg.max_cuts_per_round {
                return;
            }
            if v == comp.root {
                continue;
            }
            let Some(&yv) = self.y.get(&v) else {
                continue;
            };
            let need = values.get(yv);
            if need <= self.cfg.eps {
                continue;
            }
            let cut = net.max_flow(comp.root, v);
            if cut.value >= need - self.cfg.eps {
                continue;
            }
            let mut lhs = LinExpr::new();
            for &e in &comp.edges {
                let (Some(&(a, b)), Some(&we)) = (self.ends.get(&e), self.w.get(&e)) else {
                    continue;
                };
                if cut.source_side.contains(&a) != cut.source_side.contains(&b) {
                    lhs = lhs.term(we, 1.0);
                }
            }
            trace!(node = v.0, flow = cut.value, need, "connectivity cut");
            out.push(Constraint::ge(lhs.term(yv, -1.0), 0.0));
        }
    }
}

impl CutCallback for Separator {
    fn separate(&self, values: &Assignment) -> Vec<Constraint> {
        let mut out = Vec::new();
        for comp in &self.components {
            if out.len() >= self.cfg.max_cuts_per_round {
                break;
            }
            self.cuts_for(comp, values, &mut out);
        }
        out
    }
}
