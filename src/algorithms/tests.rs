use super::*;

use crate::internal::EmptyGraph;
use crate::support::{self, Orientation};

use std::collections::BTreeSet;

//-----------------------------------------------------------------------------

fn forward(node_id: usize) -> usize {
    support::encode_node(node_id, Orientation::Forward)
}

fn reverse(node_id: usize) -> usize {
    support::encode_node(node_id, Orientation::Reverse)
}

// Builds a graph with the given nodes and edges over encoded handles.
fn build_graph(nodes: &[usize], edges: &[(usize, usize)]) -> EmptyGraph {
    let mut graph = EmptyGraph::new();
    for &node_id in nodes {
        graph.create_node(node_id);
    }
    for &(from, to) in edges {
        graph.create_edge(from, to).unwrap();
    }
    graph.remove_duplicate_edges();
    graph
}

// A graph with two components: a diamond over nodes 1..4 and a cycle over
// nodes 8..9.
fn two_components() -> EmptyGraph {
    build_graph(
        &[1, 2, 3, 4, 8, 9],
        &[
            (forward(1), forward(2)),
            (forward(1), forward(3)),
            (forward(2), forward(4)),
            (forward(3), forward(4)),
            (forward(8), forward(9)),
            (forward(9), forward(8)),
        ],
    )
}

//-----------------------------------------------------------------------------

#[test]
fn components_ordering() {
    let graph = two_components();
    let components = weakly_connected_components(&graph);
    assert_eq!(components.len(), 2);
    assert_eq!(components[0], vec![1, 2, 3, 4]);
    assert_eq!(components[1], vec![8, 9]);
}

#[test]
fn components_follow_both_directions() {
    // Edges that only meet head-to-head still connect the component.
    let graph = build_graph(
        &[1, 2, 3],
        &[(forward(1), forward(3)), (forward(2), forward(3))],
    );
    let components = weakly_connected_components(&graph);
    assert_eq!(components.len(), 1);
    assert_eq!(components[0], vec![1, 2, 3]);
}

#[test]
fn every_node_in_one_component() {
    let graph = two_components();
    let components = weakly_connected_components(&graph);
    let mut seen: BTreeSet<usize> = BTreeSet::new();
    for component in components.iter() {
        for &node_id in component {
            assert!(seen.insert(node_id), "Node {} is in multiple components", node_id);
        }
    }
    assert_eq!(seen.len(), graph.node_count());
}

//-----------------------------------------------------------------------------

#[test]
fn nice_and_acyclic_diamond() {
    let graph = two_components();
    let heads = is_nice_and_acyclic(&graph, &[1, 2, 3, 4]);
    assert_eq!(heads, vec![1]);
}

#[test]
fn nice_and_acyclic_orientation_conflict() {
    // Node 2 is reachable in both orientations.
    let graph = build_graph(
        &[1, 2],
        &[(forward(1), forward(2)), (forward(1), reverse(2))],
    );
    let heads = is_nice_and_acyclic(&graph, &[1, 2]);
    assert!(heads.is_empty(), "Accepted a component with an orientation conflict");
}

#[test]
fn nice_and_acyclic_cycle() {
    let graph = two_components();
    let heads = is_nice_and_acyclic(&graph, &[8, 9]);
    assert!(heads.is_empty(), "Accepted a cyclic component");
}

#[test]
fn nice_and_acyclic_missing_nodes() {
    let graph = two_components();
    // Node 5 is not in the graph and should be ignored.
    let heads = is_nice_and_acyclic(&graph, &[1, 2, 3, 4, 5]);
    assert_eq!(heads, vec![1]);
}

//-----------------------------------------------------------------------------

// Checks that every edge within the subgraph is respected by the order.
fn check_topological_order(graph: &EmptyGraph, subgraph: &BTreeSet<usize>, order: &[usize]) {
    let mut rank: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
    for (offset, &handle) in order.iter().enumerate() {
        rank.insert(handle, offset);
    }
    for &handle in order {
        graph.follow_edges(handle, false, |next| {
            if subgraph.contains(&support::node_id(next)) {
                assert!(
                    rank[&handle] < rank[&next],
                    "Edge from {} to {} does not respect the order", handle, next
                );
            }
            true
        });
    }
}

#[test]
fn topological_order_diamond() {
    let graph = two_components();
    let subgraph: BTreeSet<usize> = [1, 2, 3, 4].into_iter().collect();
    let order = topological_order(&graph, &subgraph);
    assert_eq!(order.len(), 2 * subgraph.len());
    check_topological_order(&graph, &subgraph, &order);
}

#[test]
fn topological_order_restricted() {
    // The cycle is outside the subgraph, so the restriction is acyclic.
    let graph = two_components();
    let subgraph: BTreeSet<usize> = [2, 4, 8].into_iter().collect();
    let order = topological_order(&graph, &subgraph);
    assert_eq!(order.len(), 2 * subgraph.len());
    check_topological_order(&graph, &subgraph, &order);
}

#[test]
fn topological_order_cycle() {
    let graph = two_components();
    let subgraph: BTreeSet<usize> = [8, 9].into_iter().collect();
    let order = topological_order(&graph, &subgraph);
    assert!(order.is_empty(), "Found a topological order for a cyclic subgraph");
}

//-----------------------------------------------------------------------------

#[test]
fn jobs_combine_small_components() {
    let graph = two_components();
    // One job should be enough for all 6 nodes.
    let jobs = construction_jobs(&graph, graph.node_count());
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs.components(), 2);
    assert_eq!(jobs.nodes_per_job, vec![6]);
    for node_id in [1, 2, 3, 4, 8, 9] {
        assert_eq!(jobs.job(node_id), Some(0), "Wrong job for node {}", node_id);
    }
    assert_eq!(jobs.job(5), None);
    assert_eq!(jobs.components_per_job(), vec![vec![0, 1]]);
}

#[test]
fn jobs_split_large_components() {
    let graph = two_components();
    let jobs = construction_jobs(&graph, 4);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs.nodes_per_job, vec![4, 2]);
    assert_eq!(jobs.component(1), Some(0));
    assert_eq!(jobs.component(8), Some(1));
    assert_eq!(jobs.job(4), Some(0));
    assert_eq!(jobs.job(9), Some(1));
}

#[test]
fn contig_names_from_paths() {
    let graph = two_components();
    let jobs = construction_jobs(&graph, 4);
    let paths = [(1, "chr1"), (4, "ignored"), (9, "chr2")];
    let names = jobs.contig_names(paths.into_iter());
    assert_eq!(names, vec![String::from("chr1"), String::from("chr2")]);
}

//-----------------------------------------------------------------------------
