use super::*;

use crate::gfa::{gfa_to_gbz, GFAParsingParameters};

use simple_sds::serialize;

use std::fs;

//-----------------------------------------------------------------------------

fn build_gbz(content: &str) -> GBZ {
    let filename = serialize::temp_file_name("subgraph-tests");
    fs::write(&filename, content).unwrap();
    let result = gfa_to_gbz(&filename, &GFAParsingParameters::default());
    fs::remove_file(&filename).unwrap();
    result.unwrap()
}

// A linear graph with three 50 bp nodes and a single reference path.
fn linear_graph() -> (GBZ, PathIndex) {
    let gfa = format!(
        "S\t1\t{}\nS\t2\t{}\nS\t3\t{}\nL\t1\t+\t2\t+\t0M\nL\t2\t+\t3\t+\t0M\nP\tp1\t1+,2+,3+\t*\n",
        "A".repeat(50), "C".repeat(50), "G".repeat(50)
    );
    let graph = build_gbz(&gfa);
    let path_index = PathIndex::new(&graph, 3, false).unwrap();
    (graph, path_index)
}

// A bubble with a reference path that skips the middle node and two
// identical haplotype walks through it.
fn bubble_graph() -> (GBZ, PathIndex) {
    let gfa = "S\t1\tAC\nS\t2\tGT\nS\t3\tTT\n\
        L\t1\t+\t2\t+\t0M\nL\t2\t+\t3\t+\t0M\nL\t1\t+\t3\t+\t0M\n\
        P\tp1\t1+,3+\t*\n\
        W\tsample\t1\tp1\t0\t6\t>1>2>3\n\
        W\tsample\t2\tp1\t0\t6\t>1>2>3\n";
    let graph = build_gbz(gfa);
    let path_index = PathIndex::new(&graph, 3, false).unwrap();
    (graph, path_index)
}

fn subgraph_gfa(subgraph: &Subgraph) -> String {
    let mut output: Vec<u8> = Vec::new();
    subgraph.write_gfa(&mut output).unwrap();
    String::from_utf8(output).unwrap()
}

//-----------------------------------------------------------------------------

#[test]
fn node_query() {
    let (graph, _) = linear_graph();

    // All three nodes are within 30 bp of node 2.
    let query = SubgraphQuery::node(2).with_context(30);
    let subgraph = Subgraph::from_gbz(&graph, None, &query).unwrap();
    assert_eq!(subgraph.node_count(), 3);
    for node_id in 1..=3 {
        assert!(subgraph.has_node(node_id), "Missing node {}", node_id);
    }
}

#[test]
fn node_query_missing_node() {
    let (graph, _) = linear_graph();
    let query = SubgraphQuery::node(42).with_context(30);
    assert!(Subgraph::from_gbz(&graph, None, &query).is_err(), "Extracted a subgraph around a missing node");
}

#[test]
fn node_query_rejects_reference_only() {
    let (graph, _) = linear_graph();
    let query = SubgraphQuery::node(2).with_output(HaplotypeOutput::ReferenceOnly);
    assert!(Subgraph::from_gbz(&graph, None, &query).is_err(), "Node queries cannot output only the reference");
}

//-----------------------------------------------------------------------------

#[test]
fn path_offset_query() {
    let (graph, path_index) = linear_graph();

    // Offset 60 is at offset 10 of node 2; with no context, the subgraph is
    // that node only.
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_offset(&path_name, 60).with_context(0);
    let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();
    assert_eq!(subgraph.node_count(), 1);
    assert!(subgraph.has_node(2));
    assert_eq!(subgraph.path_count(), 1);

    let gfa = subgraph_gfa(&subgraph);
    assert!(gfa.contains("W\t_gbwt_ref\t0\tp1\t50\t100\t>2"), "Wrong reference walk:\n{}", gfa);
}

#[test]
fn path_offset_query_with_context() {
    let (graph, path_index) = linear_graph();

    // Offset 95 is 5 bp from the end of node 2, so node 3 is within a
    // 10 bp context but node 1 is not.
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_offset(&path_name, 95).with_context(10);
    let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();
    assert_eq!(subgraph.node_count(), 2);
    assert!(subgraph.has_node(2));
    assert!(subgraph.has_node(3));
}

#[test]
fn path_offset_query_requires_path_index() {
    let (graph, _) = linear_graph();
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_offset(&path_name, 60);
    assert!(Subgraph::from_gbz(&graph, None, &query).is_err(), "Ran a path query without a path index");
}

#[test]
fn path_offset_query_unknown_path() {
    let (graph, path_index) = linear_graph();
    let path_name = FullPathName::generic("missing");
    let query = SubgraphQuery::path_offset(&path_name, 60);
    assert!(Subgraph::from_gbz(&graph, Some(&path_index), &query).is_err(), "Found a missing path");
}

#[test]
fn path_offset_query_past_the_end() {
    let (graph, path_index) = linear_graph();
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_offset(&path_name, 1000);
    assert!(Subgraph::from_gbz(&graph, Some(&path_index), &query).is_err(), "Found an offset past the end of the path");
}

//-----------------------------------------------------------------------------

#[test]
fn path_interval_query() {
    let (graph, path_index) = linear_graph();

    // The interval covers node 1 partially and node 2 fully. Node 3 starts
    // within the interval but does not end within it.
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_interval(&path_name, 40..110).with_context(0);
    let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();
    assert_eq!(subgraph.node_count(), 2);
    assert!(subgraph.has_node(1));
    assert!(subgraph.has_node(2));
    assert!(!subgraph.has_node(3));

    let gfa = subgraph_gfa(&subgraph);
    assert!(gfa.contains("W\t_gbwt_ref\t0\tp1\t0\t100\t>1>2"), "Wrong reference walk:\n{}", gfa);
}

#[test]
fn path_interval_query_with_context() {
    let (graph, path_index) = linear_graph();
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_interval(&path_name, 40..110).with_context(50);
    let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();
    assert_eq!(subgraph.node_count(), 3);
}

#[test]
fn path_interval_query_empty_interval() {
    let (graph, path_index) = linear_graph();
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_interval(&path_name, 50..50);
    assert!(Subgraph::from_gbz(&graph, Some(&path_index), &query).is_err(), "Accepted an empty interval");
}

//-----------------------------------------------------------------------------

#[test]
fn all_haplotypes() {
    let (graph, path_index) = bubble_graph();
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_offset(&path_name, 1).with_context(10);
    let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();

    assert_eq!(subgraph.node_count(), 3);
    // The reference path and two identical haplotypes.
    assert_eq!(subgraph.path_count(), 3);
}

#[test]
fn distinct_haplotypes() {
    let (graph, path_index) = bubble_graph();
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_offset(&path_name, 1)
        .with_context(10)
        .with_output(HaplotypeOutput::Distinct);
    let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();

    // The two identical haplotypes collapse into one with weight 2.
    assert_eq!(subgraph.path_count(), 2);
    let gfa = subgraph_gfa(&subgraph);
    assert!(gfa.contains("WT:i:2"), "Missing weight for duplicated haplotypes:\n{}", gfa);
    assert!(gfa.contains("WT:i:1"), "Missing weight for the reference:\n{}", gfa);
}

#[test]
fn reference_only() {
    let (graph, path_index) = bubble_graph();
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_offset(&path_name, 1)
        .with_context(10)
        .with_output(HaplotypeOutput::ReferenceOnly);
    let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();

    assert_eq!(subgraph.path_count(), 1);
    let gfa = subgraph_gfa(&subgraph);
    let walks: Vec<&str> = gfa.lines().filter(|line| line.starts_with('W')).collect();
    assert_eq!(walks.len(), 1);
    assert!(walks[0].starts_with("W\t_gbwt_ref"), "Wrong reference walk:\n{}", gfa);
}

//-----------------------------------------------------------------------------

#[test]
fn subgraph_gfa_output() {
    let (graph, path_index) = bubble_graph();
    let path_name = FullPathName::generic("p1");
    let query = SubgraphQuery::path_offset(&path_name, 1).with_context(10);
    let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();
    let gfa = subgraph_gfa(&subgraph);
    let lines: Vec<&str> = gfa.lines().collect();

    assert_eq!(lines[0], "H\tVN:Z:1.1\tRS:Z:_gbwt_ref");
    assert_eq!(lines.iter().filter(|line| line.starts_with('S')).count(), subgraph.node_count());
    // Every link is in canonical orientation and within the subgraph.
    assert_eq!(lines.iter().filter(|line| line.starts_with('L')).count(), 3);
}

//-----------------------------------------------------------------------------
