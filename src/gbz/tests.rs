use super::*;

use crate::algorithms;
use crate::gfa::{gfa_to_gbz, GFAParsingParameters};
use crate::gbwt::GBWTBuilder;
use crate::utils;

use std::io::Cursor;
use std::process;

//-----------------------------------------------------------------------------

fn load_example() -> GBZ {
    let filename = utils::get_test_data("example.gfa");
    gfa_to_gbz(&filename, &GFAParsingParameters::default()).unwrap()
}

fn serialized_bytes(graph: &GBZ) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    graph.serialize(&mut cursor).unwrap();
    cursor.into_inner()
}

//-----------------------------------------------------------------------------

#[test]
fn nodes_and_sequences() {
    let graph = load_example();
    assert_eq!(graph.nodes(), 12);

    // Identifiers within the range are nodes exactly when they are in the
    // node enumeration.
    let nodes: Vec<usize> = graph.node_iter().collect();
    for node_id in 0..=graph.max_node_id() + 1 {
        let within = node_id >= graph.min_node_id() && node_id <= graph.max_node_id();
        assert_eq!(
            graph.has_node(node_id),
            within && nodes.contains(&node_id),
            "Wrong has_node() for {}", node_id
        );
    }

    assert_eq!(graph.sequence(14), Some(b"T".as_slice()));
    assert_eq!(graph.sequence_len(14), 1);
    assert_eq!(graph.sequence(18), None);
    assert_eq!(graph.oriented_sequence(16, Orientation::Reverse), Some(b"G".to_vec()));
}

#[test]
fn edges_are_symmetric() {
    let graph = load_example();
    for node_id in graph.node_iter() {
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            let successors: Vec<(usize, Orientation)> = graph.successors(node_id, orientation).unwrap().collect();
            for (to_id, to_orientation) in successors {
                // The reverse edge exists: flip(to) -> flip(from).
                let reverse: Vec<(usize, Orientation)> = graph
                    .successors(to_id, to_orientation.flip())
                    .unwrap()
                    .collect();
                assert!(
                    reverse.contains(&(node_id, orientation.flip())),
                    "No reverse edge for ({} {}) -> ({} {})", node_id, orientation, to_id, to_orientation
                );
            }
        }
    }
}

#[test]
fn edge_iterators() {
    let graph = load_example();
    let successors: Vec<(usize, Orientation)> = graph.successors(14, Orientation::Forward).unwrap().collect();
    assert_eq!(successors, vec![(15, Orientation::Forward), (16, Orientation::Forward)]);
    let predecessors: Vec<(usize, Orientation)> = graph.predecessors(14, Orientation::Forward).unwrap().collect();
    assert_eq!(predecessors, vec![(12, Orientation::Forward), (13, Orientation::Forward)]);
    assert!(graph.successors(18, Orientation::Forward).is_none());
}

#[test]
fn handle_graph_interface() {
    let graph = load_example();
    let components = algorithms::weakly_connected_components(&graph);
    assert_eq!(components.len(), 2);
    assert_eq!(components[0], vec![11, 12, 13, 14, 15, 16, 17]);
    assert_eq!(components[1], vec![21, 22, 23, 24, 25]);

    let heads = algorithms::is_nice_and_acyclic(&graph, &components[0]);
    assert_eq!(heads, vec![11]);
}

//-----------------------------------------------------------------------------

#[test]
fn serialization_round_trip() {
    let graph = load_example();
    let bytes = serialized_bytes(&graph);
    let mut cursor = Cursor::new(bytes);
    let loaded = GBZ::load(&mut cursor).unwrap();
    assert_eq!(loaded, graph);
}

#[test]
fn size_in_elements_matches() {
    let graph = load_example();
    let bytes = serialized_bytes(&graph);
    assert_eq!(graph.size_in_elements() * 8, bytes.len(), "Wrong size in elements");
}

#[test]
fn invalid_magic_fails() {
    let graph = load_example();
    let mut bytes = serialized_bytes(&graph);
    // The tag is in the low bytes of the first word of the header.
    bytes[8] ^= 0xFF;
    let mut cursor = Cursor::new(bytes);
    assert!(GBZ::load(&mut cursor).is_err(), "Accepted an invalid tag");
}

#[test]
fn extra_tags_survive_serialization() {
    let mut graph = load_example();
    graph.tags_mut().insert("extra", "value");
    let bytes = serialized_bytes(&graph);
    let mut cursor = Cursor::new(bytes);
    let loaded = GBZ::load(&mut cursor).unwrap();
    assert_eq!(loaded.tags().get("extra"), Some("value"));
    assert_eq!(loaded.tags().get(crate::SOURCE_KEY), Some(crate::SOURCE_VALUE));
}

//-----------------------------------------------------------------------------

#[test]
fn two_file_round_trip() {
    let graph = load_example();
    let gbwt_file = simple_sds::serialize::temp_file_name("two-file-gbwt");
    let graph_file = simple_sds::serialize::temp_file_name("two-file-graph");

    graph.serialize_to_files(&gbwt_file, &graph_file, false).unwrap();
    let loaded = GBZ::load_from_files(&gbwt_file, &graph_file).unwrap();
    assert_eq!(loaded, graph);

    std::fs::remove_file(&gbwt_file).unwrap();
    std::fs::remove_file(&graph_file).unwrap();
}

#[test]
fn two_file_drops_container_tags() {
    let mut graph = load_example();
    let expected = graph.clone();
    graph.tags_mut().insert("extra", "value");

    let gbwt_file = simple_sds::serialize::temp_file_name("two-file-gbwt");
    let graph_file = simple_sds::serialize::temp_file_name("two-file-graph");
    graph.serialize_to_files(&gbwt_file, &graph_file, false).unwrap();
    let loaded = GBZ::load_from_files(&gbwt_file, &graph_file).unwrap();
    assert_eq!(loaded, expected, "Container tags other than source should not survive");

    std::fs::remove_file(&gbwt_file).unwrap();
    std::fs::remove_file(&graph_file).unwrap();
}

#[test]
fn two_file_rejects_simple_sds_graph() {
    let graph = load_example();
    let gbwt_file = simple_sds::serialize::temp_file_name("two-file-gbwt");
    let graph_file = simple_sds::serialize::temp_file_name("two-file-graph");

    graph.serialize_to_files(&gbwt_file, &graph_file, true).unwrap();
    assert!(GBZ::load_from_files(&gbwt_file, &graph_file).is_err(), "Loaded a graph in the wrong format");

    std::fs::remove_file(&gbwt_file).unwrap();
    std::fs::remove_file(&graph_file).unwrap();
}

//-----------------------------------------------------------------------------

#[test]
fn shared_memory_placement() {
    let graph = load_example();
    let bytes = serialized_bytes(&graph);
    let segment_name = format!("gbz-test-{}", process::id());

    let mut cursor = Cursor::new(bytes);
    let shared = GBZ::load_with(&mut cursor, Placement::SharedOwner(segment_name.clone())).unwrap();
    assert_eq!(shared, graph, "Shared-memory placement changed the graph");

    let segment_file = {
        let backing: &Graph = shared.as_ref();
        assert!(backing.is_shared());
        crate::shared::SharedMemory::open(&segment_name).unwrap().path().to_path_buf()
    };
    assert!(utils::file_exists(&segment_file));

    // Only the owner releases the segment.
    drop(shared);
    assert!(!utils::file_exists(&segment_file), "The owner did not release the segment");
}

//-----------------------------------------------------------------------------

#[test]
fn missing_sequence_fails() {
    let mut builder = GBWTBuilder::new();
    builder.insert(&[support::encode_node(5, Orientation::Forward)]).unwrap();
    let index = builder.finish();
    let source = SequenceSource::new();
    assert!(GBZ::new(index, &source).is_err(), "Built a graph without sequences");
}

//-----------------------------------------------------------------------------
