use std::collections::BTreeSet;

use super::*;

fn n(i: usize) -> NodeId {
    NodeId(i)
}

fn e(i: usize) -> EdgeId {
    EdgeId(i)
}

/// Triangle 0-1-2 plus a pendant 3 on 2, a parallel edge 0=1 and a loop on 3.
fn sample() -> Graph {
    let mut g = Graph::new();
    g.add_edge(e(0), n(0), n(1));
    g.add_edge(e(1), n(1), n(2));
    g.add_edge(e(2), n(2), n(0));
    g.add_edge(e(3), n(2), n(3));
    g.add_edge(e(4), n(0), n(1));
    g.add_edge(e(5), n(3), n(3));
    g
}

#[test]
fn neighbors_are_distinct_and_skip_loops() {
    let g = sample();
    assert_eq!(g.neighbors(n(0)), vec![n(1), n(2)]);
    assert_eq!(g.neighbors(n(3)), vec![n(2)]);
    assert_eq!(g.degree(n(3)), 2);
    assert_eq!(g.edges_between(n(0), n(1)), vec![e(0), e(4)]);
    assert!(g.is_self_loop(e(5)));
    assert_eq!(g.opposite(e(5), n(3)), Some(n(3)));
}

#[test]
fn remove_node_drops_incident_edges() {
    let mut g = sample();
    let removed = g.remove_node(n(2));
    assert_eq!(removed.len(), 3);
    assert!(!g.contains_edge(e(3)));
    assert_eq!(g.edge_count(), 3);
    assert_eq!(g.components().len(), 2);
}

#[test]
fn induced_and_edge_subgraphs() {
    let g = sample();
    let nodes: BTreeSet<_> = [n(0), n(1)].into_iter().collect();
    let sub = g.subgraph(&nodes);
    assert_eq!(sub.edge_count(), 2);
    let edges: BTreeSet<_> = [e(4), e(1)].into_iter().collect();
    let sub2 = g.subgraph_with(&nodes, &edges);
    assert_eq!(sub2.edges().collect::<Vec<_>>(), vec![e(4)]);
}

#[test]
fn reattach_moves_endpoint() {
    let mut g = sample();
    g.reattach(e(3), n(3), n(0));
    assert_eq!(g.endpoints(e(3)), Some((n(2), n(0))));
    assert!(!g.incident(n(3)).contains(&e(3)));
    assert!(g.incident(n(0)).contains(&e(3)));
}

#[test]
fn connected_selection_checks_edges_and_reachability() {
    let g = sample();
    let ok = [Elem::Node(n(0)), Elem::Node(n(1)), Elem::Edge(e(0))];
    assert!(g.is_connected_selection(&ok));
    let split = [Elem::Node(n(0)), Elem::Node(n(3))];
    assert!(!g.is_connected_selection(&split));
    let dangling = [Elem::Node(n(0)), Elem::Edge(e(0))];
    assert!(!g.is_connected_selection(&dangling));
    assert!(g.is_connected_selection(&[]));
}
