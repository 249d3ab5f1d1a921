use super::*;

use crate::metadata::{FullPathName, MetadataBuilder};
use crate::support::Orientation;

use std::io::Cursor;

//-----------------------------------------------------------------------------

fn serialize_and_load(original: &GBWT) -> GBWT {
    let mut cursor = Cursor::new(Vec::new());
    original.serialize(&mut cursor).unwrap();
    let bytes = cursor.into_inner();
    let mut cursor = Cursor::new(bytes);
    GBWT::load(&mut cursor).unwrap()
}

fn encode(steps: &[(usize, Orientation)]) -> Vec<usize> {
    steps.iter().map(|(id, orientation)| support::encode_node(*id, *orientation)).collect()
}

fn build_index(paths: &[Vec<usize>]) -> GBWT {
    let mut builder = GBWTBuilder::new();
    for path in paths {
        builder.insert(path).unwrap();
    }
    builder.finish()
}

//-----------------------------------------------------------------------------

#[test]
fn empty_index() {
    let index = GBWTBuilder::new().finish();
    assert!(index.is_empty());
    assert_eq!(index.sequences(), 0);
    assert_eq!(index.paths(), 0);
    assert!(index.is_bidirectional());
    assert!(!index.has_metadata());
    assert_eq!(index.tags().get(crate::SOURCE_KEY), Some(crate::SOURCE_VALUE));
    assert_eq!(serialize_and_load(&index), index);
}

#[test]
fn single_path() {
    let path = encode(&[
        (1, Orientation::Forward),
        (2, Orientation::Forward),
        (3, Orientation::Reverse),
    ]);
    let index = build_index(std::slice::from_ref(&path));

    assert_eq!(index.sequences(), 2);
    assert_eq!(index.paths(), 1);
    assert_eq!(index.len(), 8);
    assert_eq!(index.first_node(), support::encode_node(1, Orientation::Forward));
    assert_eq!(index.alphabet_size(), support::encode_node(3, Orientation::Reverse) + 1);

    // Both orientations of every node on the path have records.
    for id in 1..=3 {
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            assert!(index.has_node(support::encode_node(id, orientation)), "Missing record for node {} {}", id, orientation);
        }
    }
    assert!(!index.has_node(support::encode_node(4, Orientation::Forward)));

    // Extraction in both orientations.
    assert_eq!(index.extract(0), Some(path.clone()));
    assert_eq!(index.extract(1), Some(support::reverse_path(&path)));
    assert_eq!(index.extract(2), None);

    // Navigation matches extraction.
    let mut extracted = Vec::new();
    let mut pos = index.start(0);
    while let Some(p) = pos {
        extracted.push(p.node);
        pos = index.forward(p);
    }
    assert_eq!(extracted, path);
}

#[test]
fn shared_nodes() {
    let first = encode(&[(1, Orientation::Forward), (2, Orientation::Forward), (4, Orientation::Forward)]);
    let second = encode(&[(1, Orientation::Forward), (3, Orientation::Forward), (4, Orientation::Forward)]);
    let third = encode(&[(1, Orientation::Forward), (2, Orientation::Forward), (4, Orientation::Forward)]);
    let paths = vec![first.clone(), second.clone(), third.clone()];
    let index = build_index(&paths);

    assert_eq!(index.sequences(), 6);
    for (path_id, path) in paths.iter().enumerate() {
        let forward = GBWT::path_to_sequence(path_id, Orientation::Forward);
        let reverse = GBWT::path_to_sequence(path_id, Orientation::Reverse);
        assert_eq!(index.extract(forward), Some(path.clone()), "Wrong forward sequence for path {}", path_id);
        assert_eq!(index.extract(reverse), Some(support::reverse_path(path)), "Wrong reverse sequence for path {}", path_id);
    }

    // Record for node 1 in forward orientation has three occurrences and
    // sorted edges to nodes 2 and 3.
    let record = index.record(support::encode_node(1, Orientation::Forward)).unwrap();
    assert_eq!(record.len(), 3);
    let successors: Vec<usize> = record.successors().collect();
    assert_eq!(successors, vec![
        support::encode_node(2, Orientation::Forward),
        support::encode_node(3, Orientation::Forward),
    ]);
}

#[test]
fn cyclic_path() {
    let path = encode(&[
        (1, Orientation::Forward),
        (2, Orientation::Forward),
        (1, Orientation::Forward),
        (2, Orientation::Forward),
    ]);
    let index = build_index(std::slice::from_ref(&path));
    assert_eq!(index.extract(0), Some(path.clone()));
    assert_eq!(index.extract(1), Some(support::reverse_path(&path)));

    let record = index.record(support::encode_node(1, Orientation::Forward)).unwrap();
    assert_eq!(record.len(), 2, "Wrong number of occurrences on a cyclic path");
}

#[test]
fn insert_errors() {
    let mut builder = GBWTBuilder::new();
    assert!(builder.insert(&[]).is_err(), "Inserted an empty path");
    assert!(builder.insert(&[support::encode_node(0, Orientation::Forward)]).is_err(), "Inserted a path with the endmarker");
}

#[test]
fn batch_size_does_not_matter() {
    let paths = vec![
        encode(&[(1, Orientation::Forward), (2, Orientation::Forward)]),
        encode(&[(1, Orientation::Forward), (3, Orientation::Reverse)]),
        encode(&[(2, Orientation::Forward), (3, Orientation::Forward)]),
    ];
    let default_batch = build_index(&paths);

    let mut builder = GBWTBuilder::with_batch_size(1);
    for path in paths.iter() {
        builder.insert(path).unwrap();
    }
    let small_batch = builder.finish();

    assert_eq!(small_batch, default_batch, "Batch size changed the index");
}

//-----------------------------------------------------------------------------

#[test]
fn merge_disjoint() {
    let first_paths = vec![
        encode(&[(1, Orientation::Forward), (2, Orientation::Forward)]),
        encode(&[(1, Orientation::Forward), (2, Orientation::Reverse)]),
    ];
    let second_paths = vec![
        encode(&[(5, Orientation::Forward), (6, Orientation::Forward)]),
    ];
    let first = build_index(&first_paths);
    let second = build_index(&second_paths);
    let merged = GBWT::merge(vec![first, second]).unwrap();

    // Sequences of the first part come before the sequences of the second part.
    assert_eq!(merged.sequences(), 6);
    assert_eq!(merged.extract(0), Some(first_paths[0].clone()));
    assert_eq!(merged.extract(2), Some(first_paths[1].clone()));
    assert_eq!(merged.extract(4), Some(second_paths[0].clone()));
    assert_eq!(merged.extract(5), Some(support::reverse_path(&second_paths[0])));

    assert_eq!(serialize_and_load(&merged), merged);
}

#[test]
fn merge_overlapping_fails() {
    let path = encode(&[(1, Orientation::Forward), (2, Orientation::Forward)]);
    let first = build_index(std::slice::from_ref(&path));
    let second = build_index(std::slice::from_ref(&path));
    assert!(GBWT::merge(vec![first, second]).is_err(), "Merged indexes with overlapping node records");
}

//-----------------------------------------------------------------------------

#[test]
fn metadata_roundtrip() {
    let paths = vec![
        encode(&[(1, Orientation::Forward), (2, Orientation::Forward)]),
        encode(&[(1, Orientation::Forward), (3, Orientation::Forward)]),
    ];
    let mut index = build_index(&paths);

    let mut builder = MetadataBuilder::new(1);
    builder.add_path(0, FullPathName::generic("chr1")).unwrap();
    builder.add_path(0, FullPathName::haplotype("sample", "chr1", 1, 0)).unwrap();
    index.set_metadata(builder.build()).unwrap();

    assert!(index.has_metadata());
    let metadata = index.metadata().unwrap();
    assert_eq!(metadata.paths(), 2);
    assert!(metadata.path_is_reference(0));
    assert!(!metadata.path_is_reference(1));
    assert_eq!(metadata.find_path(&FullPathName::generic("chr1")), Some(0));
    assert_eq!(metadata.paths_for("sample", "chr1"), vec![1]);

    assert_eq!(serialize_and_load(&index), index);
}

#[test]
fn metadata_path_count_mismatch() {
    let paths = vec![encode(&[(1, Orientation::Forward)])];
    let mut index = build_index(&paths);
    let builder = MetadataBuilder::new(1);
    assert!(index.set_metadata(builder.build()).is_err(), "Accepted metadata with a wrong path count");
}

//-----------------------------------------------------------------------------
