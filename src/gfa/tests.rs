use super::*;

use crate::support::Orientation;
use crate::utils;

use simple_sds::serialize::{self, Serialize};

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

//-----------------------------------------------------------------------------

fn write_gfa_file(content: &str) -> PathBuf {
    let filename = serialize::temp_file_name("gfa-tests");
    fs::write(&filename, content).unwrap();
    filename
}

fn build_gbwt(content: &str, parameters: &GFAParsingParameters) -> Result<(GBWT, SequenceSource), String> {
    let filename = write_gfa_file(content);
    let result = gfa_to_gbwt(&filename, parameters);
    fs::remove_file(&filename).unwrap();
    result
}

fn build_gbz(content: &str, parameters: &GFAParsingParameters) -> GBZ {
    let filename = write_gfa_file(content);
    let result = gfa_to_gbz(&filename, parameters);
    fs::remove_file(&filename).unwrap();
    result.unwrap()
}

fn serialized_bytes(graph: &GBZ) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    graph.serialize(&mut cursor).unwrap();
    cursor.into_inner()
}

fn forward(node_id: usize) -> usize {
    support::encode_node(node_id, Orientation::Forward)
}

//-----------------------------------------------------------------------------

#[test]
fn minimal_round_trip() {
    let gfa = "S\tA\tACGT\nP\tp1\tA+\t*\n";
    let (index, source) = build_gbwt(gfa, &GFAParsingParameters::default()).unwrap();

    // The segment name is not an integer, so it is translated to node 1.
    assert!(source.uses_translation());
    assert_eq!(source.segment_range("A"), Some(1..2));

    let graph = GBZ::new(index, &source).unwrap();
    assert_eq!(graph.nodes(), 1);
    assert_eq!(graph.sequence(1), Some(b"ACGT".as_slice()));
    assert_eq!(graph.oriented_sequence(1, Orientation::Forward), Some(b"ACGT".to_vec()));
    assert_eq!(graph.oriented_sequence(1, Orientation::Reverse), Some(b"ACGT".to_vec()));

    assert_eq!(graph.paths(), 1);
    assert_eq!(graph.path(0, Orientation::Forward), Some(vec![forward(1)]));
    let metadata = graph.metadata().unwrap();
    assert_eq!(metadata.full_path_name(0), Some(FullPathName::generic("p1")));

    // Round trip through serialization.
    let bytes = serialized_bytes(&graph);
    let mut cursor = Cursor::new(bytes);
    let loaded = GBZ::load(&mut cursor).unwrap();
    assert_eq!(loaded, graph);
    assert_eq!(loaded.tags().get(crate::SOURCE_KEY), Some(crate::SOURCE_VALUE));
}

#[test]
fn chopped_segments() {
    let sequence: String = std::iter::repeat('A').take(120).chain(std::iter::repeat('C').take(130)).collect();
    let gfa = format!("S\tseg\t{}\nP\tp1\tseg+\t*\n", sequence);
    let parameters = GFAParsingParameters {
        max_node_length: 100,
        ..GFAParsingParameters::default()
    };
    let (index, source) = build_gbwt(&gfa, &parameters).unwrap();

    // Three nodes with consecutive identifiers.
    assert_eq!(source.segment_range("seg"), Some(1..4));
    assert_eq!(source.sequence_len(1), 100);
    assert_eq!(source.sequence_len(2), 100);
    assert_eq!(source.sequence_len(3), 50);
    assert_eq!(source.sequence(1).unwrap(), sequence.as_bytes()[0..100].to_vec().as_slice());

    // The path traverses the chopped nodes in order.
    let graph = GBZ::new(index, &source).unwrap();
    assert_eq!(graph.path(0, Orientation::Forward), Some(vec![forward(1), forward(2), forward(3)]));
    let successors: Vec<(usize, Orientation)> = graph.successors(1, Orientation::Forward).unwrap().collect();
    assert_eq!(successors, vec![(2, Orientation::Forward)]);
    let successors: Vec<(usize, Orientation)> = graph.successors(2, Orientation::Forward).unwrap().collect();
    assert_eq!(successors, vec![(3, Orientation::Forward)]);
}

#[test]
fn translation_file() {
    let sequence: String = std::iter::repeat('G').take(250).collect();
    let gfa = format!("S\tseg\t{}\nP\tp1\tseg+\t*\n", sequence);
    let parameters = GFAParsingParameters {
        max_node_length: 100,
        ..GFAParsingParameters::default()
    };
    let (_, source) = build_gbwt(&gfa, &parameters).unwrap();

    let filename = serialize::temp_file_name("translation");
    source.write_translation(&filename).unwrap();
    let content = fs::read_to_string(&filename).unwrap();
    fs::remove_file(&filename).unwrap();
    assert_eq!(content, "T\tseg\t1\t4\n");
}

//-----------------------------------------------------------------------------

#[test]
fn example_graph() {
    let filename = utils::get_test_data("example.gfa");
    let graph = gfa_to_gbz(&filename, &GFAParsingParameters::default()).unwrap();

    assert_eq!(graph.nodes(), 12);
    assert_eq!(graph.min_node_id(), 11);
    assert_eq!(graph.max_node_id(), 25);
    let nodes: Vec<usize> = graph.node_iter().collect();
    assert_eq!(nodes, vec![11, 12, 13, 14, 15, 16, 17, 21, 22, 23, 24, 25]);

    // P-lines become reference paths because the file also contains W-lines.
    assert_eq!(graph.paths(), 5);
    let metadata = graph.metadata().unwrap();
    assert_eq!(metadata.find_path(&FullPathName::generic("A")), Some(0));
    assert_eq!(metadata.find_path(&FullPathName::generic("B")), Some(3));
    assert!(metadata.path_is_reference(0));
    assert!(!metadata.path_is_reference(1));
    assert_eq!(metadata.paths_for("sample", "A").len(), 2);

    // Walks keep their metadata.
    let name = metadata.full_path_name(1).unwrap();
    assert_eq!(name, FullPathName::haplotype("sample", "A", 1, 0));
}

#[test]
fn path_name_regex() {
    let gfa = "S\t1\tACGT\nS\t2\tGGGG\nP\talice#chr1#2\t1+,2+\t*\nP\tbob#chr1#1\t1+\t*\n";
    let parameters = GFAParsingParameters {
        path_name_regex: String::from("(.*)#(.*)#(.*)"),
        path_name_fields: String::from("-SCH"),
        ..GFAParsingParameters::default()
    };
    let graph = build_gbz(gfa, &parameters);

    let metadata = graph.metadata().unwrap();
    assert_eq!(metadata.paths(), 2);
    assert_eq!(metadata.full_path_name(0), Some(FullPathName::haplotype("alice", "chr1", 2, 0)));
    assert_eq!(metadata.full_path_name(1), Some(FullPathName::haplotype("bob", "chr1", 1, 0)));
}

#[test]
fn duplicate_name_fields() {
    let gfa = "S\t1\tACGT\nP\tp1\t1+\t*\n";
    let parameters = GFAParsingParameters {
        path_name_fields: String::from("CC"),
        ..GFAParsingParameters::default()
    };
    assert!(build_gbwt(gfa, &parameters).is_err(), "Accepted duplicate path name fields");
}

//-----------------------------------------------------------------------------

#[test]
fn parallel_jobs_do_not_change_the_output() {
    let filename = utils::get_test_data("example.gfa");
    let sequential = gfa_to_gbz(&filename, &GFAParsingParameters::default()).unwrap();
    let parallel = gfa_to_gbz(&filename, &GFAParsingParameters {
        parallel_jobs: 3,
        ..GFAParsingParameters::default()
    }).unwrap();
    assert_eq!(serialized_bytes(&parallel), serialized_bytes(&sequential));
}

#[test]
fn batch_size_does_not_change_the_output() {
    let filename = utils::get_test_data("example.gfa");
    let automatic = gfa_to_gbz(&filename, &GFAParsingParameters::default()).unwrap();
    let manual = gfa_to_gbz(&filename, &GFAParsingParameters {
        automatic_batch_size: false,
        batch_size: 3,
        ..GFAParsingParameters::default()
    }).unwrap();
    assert_eq!(serialized_bytes(&manual), serialized_bytes(&automatic));
}

//-----------------------------------------------------------------------------

#[test]
fn malformed_inputs() {
    let inputs = [
        ("S\t1\t\n", "empty sequence"),
        ("S\t1\n", "truncated segment line"),
        ("S\t1\tACGT\nS\t1\tGGGG\n", "duplicate segment"),
        ("S\t1\tACGT\nL\t1\t+\t2\t+\t0M\n", "unknown segment in a link"),
        ("S\t1\tACGT\nS\t2\tGGGG\nL\t1\t+\t2\t+\t5M\n", "unsupported overlap"),
        ("S\t1\tACGT\nS\t2\tGGGG\nL\t1\t?\t2\t+\t0M\n", "invalid orientation"),
        ("S\t1\tACGT\nP\tp1\t2+\t*\n", "unknown segment on a path"),
        ("S\t1\tACGT\nP\tp1\t\t*\n", "empty path"),
        ("S\t1\tACGT\nW\tsample\tx\tchr1\t0\t4\t>1\n", "invalid haplotype"),
        ("S\t1\tACGT\nW\tsample\t1\tchr1\t0\t4\t1>\n", "invalid walk"),
        ("S\t1\tACGT\nW\tsample\t1\tchr1\t0\t4\t\n", "truncated walk line"),
    ];
    for (gfa, name) in inputs {
        assert!(build_gbwt(gfa, &GFAParsingParameters::default()).is_err(), "Accepted {}", name);
    }
}

#[test]
fn skips_unknown_records() {
    let gfa = "H\tVN:Z:1.1\nS\t1\tACGT\nX\tunknown record\nP\tp1\t1+\t*\n";
    let graph = build_gbz(gfa, &GFAParsingParameters::default());
    assert_eq!(graph.nodes(), 1);
    assert_eq!(graph.paths(), 1);
}

//-----------------------------------------------------------------------------

#[test]
fn export_is_normalized() {
    let filename = utils::get_test_data("example.gfa");
    let graph = gfa_to_gbz(&filename, &GFAParsingParameters::default()).unwrap();

    let mut output: Vec<u8> = Vec::new();
    gbwt_to_gfa(&graph, &mut output).unwrap();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with('H'), "Output does not start with a header");
    let kinds: Vec<char> = lines.iter().map(|line| line.chars().next().unwrap()).collect();
    let mut sorted_kinds = kinds.clone();
    // Section order: H, S, L, P, W.
    let section = |kind: char| match kind {
        'H' => 0,
        'S' => 1,
        'L' => 2,
        'P' => 3,
        _ => 4,
    };
    sorted_kinds.sort_by_key(|&kind| section(kind));
    assert_eq!(kinds, sorted_kinds, "Sections are out of order");

    // S-lines in ascending node id order.
    let segment_ids: Vec<usize> = lines.iter()
        .filter(|line| line.starts_with('S'))
        .map(|line| line.split('\t').nth(1).unwrap().parse::<usize>().unwrap())
        .collect();
    let mut sorted_ids = segment_ids.clone();
    sorted_ids.sort_unstable();
    assert_eq!(segment_ids, sorted_ids, "Segments are out of order");
    assert_eq!(segment_ids.len(), 12);

    // Reference paths as P-lines, other paths as W-lines.
    assert_eq!(kinds.iter().filter(|&&kind| kind == 'P').count(), 2);
    assert_eq!(kinds.iter().filter(|&&kind| kind == 'W').count(), 3);
}

#[test]
fn export_round_trip() {
    let filename = utils::get_test_data("example.gfa");
    let graph = gfa_to_gbz(&filename, &GFAParsingParameters::default()).unwrap();

    let mut output: Vec<u8> = Vec::new();
    gbwt_to_gfa(&graph, &mut output).unwrap();
    let reparsed = build_gbz(std::str::from_utf8(&output).unwrap(), &GFAParsingParameters::default());

    assert_eq!(serialized_bytes(&reparsed), serialized_bytes(&graph), "The graph changed in a GFA round trip");
}

//-----------------------------------------------------------------------------
