//! Decomposition planning along the block-cut tree.
//!
//! Two splitting schemes live here:
//! - [`Plan`]: the biggest block, rooted parts hanging off its cutpoints, and
//!   every other connected component. Rooted answers are absorbed into their
//!   anchors before the biggest block is solved.
//! - [`balanced_cutpoint`]: the cutpoint whose removal leaves the smallest
//!   largest piece, used by the scheduler to split oversized components.

use std::collections::{BTreeSet, HashMap};

use crate::blocks::{BcNode, Blocks};
use crate::graph::{Graph, NodeId};

/// Part of the biggest block's component hanging off one of its cutpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootedPart {
    pub anchor: NodeId,
    /// Vertices of the part, anchor included.
    pub nodes: BTreeSet<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub biggest: BTreeSet<NodeId>,
    pub rooted: Vec<RootedPart>,
    pub unrooted: Vec<BTreeSet<NodeId>>,
}

impl Plan {
    /// Plan for `g`; `None` when the graph has no vertex.
    pub fn new(g: &Graph) -> Option<Plan> {
        let blocks = Blocks::compute(g);
        let big = blocks.biggest()?;
        let biggest = blocks.block(big).clone();
        let anchor_of_big = biggest.iter().next().copied()?;

        let mut plan = Plan {
            biggest,
            ..Plan::default()
        };
        for comp in g.components() {
            if !comp.contains(&anchor_of_big) {
                plan.unrooted.push(comp);
            }
        }

        let tree = blocks.tree();
        let blocked: BTreeSet<BcNode> = [BcNode::Block(big)].into_iter().collect();
        for anchor in blocks.cutpoints_of(big) {
            let mut nodes: BTreeSet<NodeId> = [anchor].into_iter().collect();
            for (x, _) in tree.walk(BcNode::Cut(anchor), &blocked) {
                if let BcNode::Block(b) = x {
                    nodes.extend(blocks.block(b).iter().copied());
                }
            }
            plan.rooted.push(RootedPart { anchor, nodes });
        }
        Some(plan)
    }

    /// Every vertex exactly once: the biggest block, rooted parts without
    /// their anchors, and the other components.
    pub fn partition(&self) -> Vec<BTreeSet<NodeId>> {
        let mut out = vec![self.biggest.clone()];
        for part in &self.rooted {
            let mut rest = part.nodes.clone();
            rest.remove(&part.anchor);
            out.push(rest);
        }
        out.extend(self.unrooted.iter().cloned());
        out
    }
}

/// Cutpoint of a connected graph minimising the largest piece left after its
/// removal; smallest id on ties. `None` without cutpoints.
pub fn balanced_cutpoint(g: &Graph) -> Option<NodeId> {
    let blocks = Blocks::compute(g);
    let first = blocks.ids().next()?;
    if blocks.cutpoints().is_empty() {
        return None;
    }
    let tree = blocks.tree();
    let order = tree.walk(BcNode::Block(first), &BTreeSet::new());

    let own = |x: BcNode| match x {
        BcNode::Block(b) => blocks.block(b).len() - blocks.cutpoints_of(b).len(),
        BcNode::Cut(_) => 1,
    };
    let mut sub: HashMap<BcNode, usize> = HashMap::new();
    for &(x, parent) in order.iter().rev() {
        let total = own(x) + sub.get(&x).copied().unwrap_or(0);
        sub.insert(x, total);
        if let Some(p) = parent {
            *sub.entry(p).or_insert(0) += total;
        }
    }
    let parent_of: HashMap<BcNode, BcNode> = order
        .iter()
        .filter_map(|&(x, p)| p.map(|p| (x, p)))
        .collect();

    let n = g.node_count();
    let mut best: Option<(NodeId, usize)> = None;
    for &c in blocks.cutpoints() {
        let me = BcNode::Cut(c);
        let mut largest = n - sub.get(&me).copied().unwrap_or(1);
        for &y in tree.neighbors(me) {
            if parent_of.get(&y) == Some(&me) {
                largest = largest.max(sub.get(&y).copied().unwrap_or(0));
            }
        }
        if best.map_or(true, |(_, b)| largest < b) {
            best = Some((c, largest));
        }
    }
    best.map(|(c, _)| c)
}
