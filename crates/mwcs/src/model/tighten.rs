//! Rooted tightening along the block-cut tree.
//!
//! With a fixed root, every block is entered through exactly one vertex: the
//! root itself or the cutpoint on the root's side. Anything selected in the
//! block needs that vertex, and flow can never enter it from inside the
//! block. The walk only emits descriptors; the builder turns them into
//! constraints.

use std::collections::BTreeSet;

use crate::blocks::{BcNode, Blocks};
use crate::graph::{EdgeId, Graph, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tightening {
    /// `y[node] <= y[cutpoint]`.
    Dominate { node: NodeId, cutpoint: NodeId },
    /// The arc of `edge` entering `into` is unused.
    ZeroArc { edge: EdgeId, into: NodeId },
}

/// A block with its entry vertex, for cut separation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeparatorComponent {
    pub nodes: BTreeSet<NodeId>,
    pub edges: Vec<EdgeId>,
    pub root: NodeId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootedTightening {
    pub descriptors: Vec<Tightening>,
    pub components: Vec<SeparatorComponent>,
}

/// Walk the block-cut tree of `root`'s component outwards from `root`.
pub fn rooted_tightening(g: &Graph, root: NodeId) -> RootedTightening {
    let mut out = RootedTightening::default();
    if !g.contains_node(root) {
        return out;
    }
    let blocks = Blocks::compute(g);
    let start = if blocks.is_cutpoint(root) {
        BcNode::Cut(root)
    } else {
        match blocks.blocks_of(root).first() {
            Some(&b) => BcNode::Block(b),
            None => return out,
        }
    };
    let tree = blocks.tree();
    for (x, parent) in tree.walk(start, &BTreeSet::new()) {
        let BcNode::Block(b) = x else {
            continue;
        };
        let entry = match parent {
            Some(BcNode::Cut(c)) => c,
            _ => root,
        };
        for &v in blocks.block(b) {
            if v != entry && entry != root {
                out.descriptors.push(Tightening::Dominate {
                    node: v,
                    cutpoint: entry,
                });
            }
        }
        for &e in blocks.edges_of(b) {
            if g.is_self_loop(e) {
                continue;
            }
            if g.opposite(e, entry).is_some() {
                out.descriptors.push(Tightening::ZeroArc { edge: e, into: entry });
            }
        }
        out.components.push(SeparatorComponent {
            nodes: blocks.block(b).clone(),
            edges: blocks.edges_of(b).to_vec(),
            root: entry,
        });
    }
    out
}
