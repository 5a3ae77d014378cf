//! Biconnected decomposition and the block-cut tree.
//!
//! Purpose
//! - Cutpoints and blocks (maximal biconnected subgraphs) of a multigraph,
//!   plus the block/cutpoint incidence used by the decomposition planner and
//!   by the rooted model tightening.
//!
//! Why this design
//! - One iterative depth-first traversal with discovery/low-link values and an
//!   edge stack (Hopcroft–Tarjan); no recursion, so deep paths are fine.
//! - Tree edges are tracked by edge id rather than parent vertex, so a pair of
//!   parallel edges correctly forms a block of its own.
//! - Self-loops never affect connectivity; each is attached to a block of its
//!   vertex afterwards. Vertices without other edges are trivial blocks.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::graph::{EdgeId, Graph, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub usize);

#[derive(Clone, Debug, Default)]
pub struct Blocks {
    blocks: Vec<BTreeSet<NodeId>>,
    block_edges: Vec<Vec<EdgeId>>,
    cutpoints: BTreeSet<NodeId>,
    node_blocks: BTreeMap<NodeId, Vec<BlockId>>,
    edge_block: HashMap<EdgeId, BlockId>,
}

/// DFS frame: vertex, tree edge it was entered by, next incidence index.
struct Frame {
    node: NodeId,
    via: Option<EdgeId>,
    next: usize,
}

impl Blocks {
    pub fn compute(g: &Graph) -> Blocks {
        let mut out = Blocks::default();
        let mut disc: HashMap<NodeId, usize> = HashMap::new();
        let mut low: HashMap<NodeId, usize> = HashMap::new();
        let mut clock = 0usize;

        for start in g.nodes() {
            if disc.contains_key(&start) {
                continue;
            }
            disc.insert(start, clock);
            low.insert(start, clock);
            clock += 1;
            if g.neighbors(start).is_empty() {
                out.push_block([start].into_iter().collect(), Vec::new());
                continue;
            }
            let mut root_children = 0usize;
            let mut frames = vec![Frame {
                node: start,
                via: None,
                next: 0,
            }];
            let mut edge_stack: Vec<EdgeId> = Vec::new();

            while let Some(frame) = frames.last_mut() {
                let v = frame.node;
                let incident = g.incident(v);
                if frame.next < incident.len() {
                    let e = incident[frame.next];
                    frame.next += 1;
                    if frame.via == Some(e) || g.is_self_loop(e) {
                        continue;
                    }
                    let Some(w) = g.opposite(e, v) else {
                        continue;
                    };
                    match disc.get(&w).copied() {
                        None => {
                            edge_stack.push(e);
                            disc.insert(w, clock);
                            low.insert(w, clock);
                            clock += 1;
                            if v == start {
                                root_children += 1;
                            }
                            frames.push(Frame {
                                node: w,
                                via: Some(e),
                                next: 0,
                            });
                        }
                        Some(dw) if dw < disc[&v] => {
                            edge_stack.push(e);
                            if dw < low[&v] {
                                low.insert(v, dw);
                            }
                        }
                        Some(_) => {}
                    }
                    continue;
                }

                let done = frames.pop();
                let (Some(done), Some(parent)) = (done, frames.last()) else {
                    continue;
                };
                let p = parent.node;
                let lv = low[&done.node];
                if lv < low[&p] {
                    low.insert(p, lv);
                }
                if lv >= disc[&p] {
                    if p != start {
                        out.cutpoints.insert(p);
                    }
                    let mut nodes = BTreeSet::new();
                    let mut edges = Vec::new();
                    while let Some(f) = edge_stack.pop() {
                        if let Some((a, b)) = g.endpoints(f) {
                            nodes.insert(a);
                            nodes.insert(b);
                        }
                        edges.push(f);
                        if Some(f) == done.via {
                            break;
                        }
                    }
                    edges.reverse();
                    out.push_block(nodes, edges);
                }
            }
            if root_children >= 2 {
                out.cutpoints.insert(start);
            }
        }

        for e in g.edges() {
            if !g.is_self_loop(e) {
                continue;
            }
            let Some((v, _)) = g.endpoints(e) else {
                continue;
            };
            if let Some(&b) = out.node_blocks.get(&v).and_then(|bs| bs.first()) {
                out.block_edges[b.0].push(e);
                out.edge_block.insert(e, b);
            }
        }
        out
    }

    fn push_block(&mut self, nodes: BTreeSet<NodeId>, edges: Vec<EdgeId>) {
        let id = BlockId(self.blocks.len());
        for &v in &nodes {
            self.node_blocks.entry(v).or_default().push(id);
        }
        for &e in &edges {
            self.edge_block.insert(e, id);
        }
        self.blocks.push(nodes);
        self.block_edges.push(edges);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    pub fn block(&self, b: BlockId) -> &BTreeSet<NodeId> {
        &self.blocks[b.0]
    }

    pub fn edges_of(&self, b: BlockId) -> &[EdgeId] {
        &self.block_edges[b.0]
    }

    pub fn cutpoints(&self) -> &BTreeSet<NodeId> {
        &self.cutpoints
    }

    pub fn is_cutpoint(&self, v: NodeId) -> bool {
        self.cutpoints.contains(&v)
    }

    /// Blocks containing `v`.
    pub fn blocks_of(&self, v: NodeId) -> &[BlockId] {
        self.node_blocks.get(&v).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn block_of_edge(&self, e: EdgeId) -> Option<BlockId> {
        self.edge_block.get(&e).copied()
    }

    pub fn cutpoints_of(&self, b: BlockId) -> Vec<NodeId> {
        self.blocks[b.0]
            .iter()
            .copied()
            .filter(|v| self.cutpoints.contains(v))
            .collect()
    }

    /// Largest block by vertex count; the first one found wins ties.
    pub fn biggest(&self) -> Option<BlockId> {
        let mut best: Option<BlockId> = None;
        for b in self.ids() {
            if best.map_or(true, |c| self.blocks[b.0].len() > self.blocks[c.0].len()) {
                best = Some(b);
            }
        }
        best
    }

    pub fn tree(&self) -> BlockCutTree {
        let mut adj: BTreeMap<BcNode, Vec<BcNode>> = BTreeMap::new();
        for b in self.ids() {
            adj.entry(BcNode::Block(b)).or_default();
            for c in self.cutpoints_of(b) {
                adj.entry(BcNode::Block(b)).or_default().push(BcNode::Cut(c));
                adj.entry(BcNode::Cut(c)).or_default().push(BcNode::Block(b));
            }
        }
        BlockCutTree { adj }
    }
}

/// Vertex of the block-cut tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BcNode {
    Block(BlockId),
    Cut(NodeId),
}

/// Bipartite forest of blocks and cutpoints (one tree per component).
#[derive(Clone, Debug, Default)]
pub struct BlockCutTree {
    adj: BTreeMap<BcNode, Vec<BcNode>>,
}

impl BlockCutTree {
    pub fn neighbors(&self, x: BcNode) -> &[BcNode] {
        self.adj.get(&x).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Breadth-first order from `start` with each node's parent; nodes in
    /// `blocked` are neither entered nor expanded.
    pub fn walk(&self, start: BcNode, blocked: &BTreeSet<BcNode>) -> Vec<(BcNode, Option<BcNode>)> {
        let mut order = vec![(start, None)];
        let mut seen: BTreeSet<BcNode> = [start].into_iter().collect();
        let mut queue = VecDeque::from([start]);
        while let Some(x) = queue.pop_front() {
            for &y in self.neighbors(x) {
                if blocked.contains(&y) || !seen.insert(y) {
                    continue;
                }
                order.push((y, Some(x)));
                queue.push_back(y);
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(i: usize) -> NodeId {
        NodeId(i)
    }

    fn build(edges: &[(usize, usize)]) -> Graph {
        let mut g = Graph::new();
        for (i, &(u, v)) in edges.iter().enumerate() {
            g.add_edge(EdgeId(i), n(u), n(v));
        }
        g
    }

    #[test]
    fn two_triangles_share_a_cutpoint() {
        // 0-1-2 triangle, 2-3-4 triangle, pendant 5 on 4.
        let g = build(&[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2), (4, 5)]);
        let b = Blocks::compute(&g);
        assert_eq!(b.len(), 3);
        assert_eq!(b.cutpoints().iter().copied().collect::<Vec<_>>(), vec![n(2), n(4)]);
        assert_eq!(b.blocks_of(n(2)).len(), 2);
        let big = b.biggest().expect("non-empty");
        assert_eq!(b.block(big).len(), 3);
        for e in g.edges() {
            assert!(b.block_of_edge(e).is_some());
        }
    }

    #[test]
    fn dfs_root_is_cutpoint_only_with_two_children() {
        // Star centred at 0: root with three children.
        let g = build(&[(0, 1), (0, 2), (0, 3)]);
        let b = Blocks::compute(&g);
        assert!(b.is_cutpoint(n(0)));
        assert_eq!(b.len(), 3);
        // Path starting at an end: the root has one child.
        let p = build(&[(0, 1), (1, 2)]);
        let bp = Blocks::compute(&p);
        assert_eq!(bp.cutpoints().iter().copied().collect::<Vec<_>>(), vec![n(1)]);
    }

    #[test]
    fn parallel_edges_and_loops_do_not_fake_biconnectivity() {
        // 0=1 parallel pair, 1-2 bridge, loop on 2.
        let g = build(&[(0, 1), (0, 1), (1, 2), (2, 2)]);
        let b = Blocks::compute(&g);
        assert_eq!(b.len(), 2);
        assert!(b.is_cutpoint(n(1)));
        assert!(!b.is_cutpoint(n(2)));
        let pair = b.block_of_edge(EdgeId(0)).expect("assigned");
        assert_eq!(b.block_of_edge(EdgeId(1)), Some(pair));
        assert_eq!(b.edges_of(pair).len(), 2);
        assert!(b.block_of_edge(EdgeId(3)).is_some());
    }

    #[test]
    fn isolated_vertex_is_trivial_block() {
        let mut g = build(&[(0, 1)]);
        g.add_node(n(7));
        g.add_edge(EdgeId(9), n(8), n(8));
        let b = Blocks::compute(&g);
        assert_eq!(b.len(), 3);
        let iso = b.blocks_of(n(7))[0];
        assert_eq!(b.block(iso).len(), 1);
        assert_eq!(b.block_of_edge(EdgeId(9)), Some(b.blocks_of(n(8))[0]));
    }

    #[test]
    fn block_cut_tree_is_acyclic() {
        let g = build(&[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2), (4, 5), (5, 6)]);
        let b = Blocks::compute(&g);
        let t = b.tree();
        let nodes = b.len() + b.cutpoints().len();
        let edges: usize = b.ids().map(|id| b.cutpoints_of(id).len()).sum();
        assert_eq!(edges, nodes - 1);
        let order = t.walk(BcNode::Block(BlockId(0)), &BTreeSet::new());
        assert_eq!(order.len(), nodes);
    }
}
