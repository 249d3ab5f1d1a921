use super::*;

use simple_sds::serialize::Serialize;

use std::io::Cursor;

//-----------------------------------------------------------------------------

fn serialize_and_load<T: Serialize>(original: &T) -> T {
    let mut cursor = Cursor::new(Vec::new());
    original.serialize(&mut cursor).unwrap();
    let bytes = cursor.into_inner();
    let mut cursor = Cursor::new(bytes);
    T::load(&mut cursor).unwrap()
}

//-----------------------------------------------------------------------------

#[test]
fn orientation_flip() {
    assert_eq!(Orientation::Forward.flip(), Orientation::Reverse);
    assert_eq!(Orientation::Reverse.flip(), Orientation::Forward);
    assert!(!Orientation::Forward.is_reverse());
    assert!(Orientation::Reverse.is_reverse());
}

#[test]
fn node_encoding() {
    for id in [1, 2, 42, 1000] {
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            let handle = encode_node(id, orientation);
            assert_eq!(decode_node(handle), (id, orientation), "Wrong decoding for node {} {}", id, orientation);
            assert_eq!(node_id(handle), id, "Wrong node id for node {} {}", id, orientation);
            assert_eq!(node_orientation(handle), orientation, "Wrong orientation for node {} {}", id, orientation);
            assert_eq!(flip_node(flip_node(handle)), handle, "Flip is not an involution for node {} {}", id, orientation);
            assert_eq!(node_id(flip_node(handle)), id, "Flip changes the node id for node {} {}", id, orientation);
        }
    }
}

#[test]
fn canonical_edges() {
    let edges = [
        ((1, Orientation::Forward), (2, Orientation::Forward)),
        ((2, Orientation::Forward), (1, Orientation::Forward)),
        ((1, Orientation::Forward), (2, Orientation::Reverse)),
        ((1, Orientation::Reverse), (2, Orientation::Forward)),
        ((3, Orientation::Forward), (3, Orientation::Reverse)),
        ((5, Orientation::Forward), (5, Orientation::Forward)),
    ];
    for (from, to) in edges {
        let reverse = ((to.0, to.1.flip()), (from.0, from.1.flip()));
        let forward_canonical = edge_is_canonical(from, to);
        let reverse_canonical = edge_is_canonical(reverse.0, reverse.1);
        if (from, to) == reverse {
            assert!(forward_canonical, "A self-symmetric edge is not canonical");
        } else {
            assert_ne!(
                forward_canonical, reverse_canonical,
                "Canonical status is not unique for edge ({} {}, {} {})", from.0, from.1, to.0, to.1
            );
        }
    }
}

#[test]
fn paths_over_handles() {
    let path: Vec<usize> = vec![
        encode_node(1, Orientation::Forward),
        encode_node(2, Orientation::Reverse),
        encode_node(3, Orientation::Forward),
    ];
    let reverse = reverse_path(&path);
    assert_eq!(reverse, vec![
        encode_node(3, Orientation::Reverse),
        encode_node(2, Orientation::Forward),
        encode_node(1, Orientation::Reverse),
    ]);
    assert_eq!(reverse_path(&reverse), path, "Path reversal is not an involution");

    // Exactly one of a path and its reverse is canonical, except when they are equal.
    assert_ne!(encoded_path_is_canonical(&path), encoded_path_is_canonical(&reverse));
    let palindrome = vec![encode_node(4, Orientation::Forward), encode_node(4, Orientation::Reverse)];
    assert_eq!(reverse_path(&palindrome), palindrome);
    assert!(encoded_path_is_canonical(&palindrome));
}

//-----------------------------------------------------------------------------

#[test]
fn reverse_complement_involution() {
    let sequences: [&[u8]; 5] = [
        b"",
        b"ACGT",
        b"GATTACA",
        b"ACGTRYSWKMBDHVN",
        b"acgtryswkmbdhvn",
    ];
    for sequence in sequences {
        let rc = reverse_complement(sequence);
        assert_eq!(reverse_complement(&rc), sequence, "Reverse complement is not an involution for {}", String::from_utf8_lossy(sequence));
    }
}

#[test]
fn reverse_complement_values() {
    assert_eq!(reverse_complement(b"ACGT"), b"ACGT");
    assert_eq!(reverse_complement(b"GATTACA"), b"TGTAATC");
    assert_eq!(reverse_complement(b"AAC"), b"GTT");

    let mut sequence = b"GATTACA".to_vec();
    reverse_complement_in_place(&mut sequence);
    assert_eq!(sequence, b"TGTAATC");
}

//-----------------------------------------------------------------------------

#[test]
fn string_array_access() {
    let strings = ["first", "", "third", "fourth"];
    let array = StringArray::from(strings.as_slice());
    assert_eq!(array.len(), 4);
    assert!(!array.is_empty());
    for (id, string) in strings.iter().enumerate() {
        assert_eq!(array.bytes(id), string.as_bytes(), "Wrong bytes for string {}", id);
        assert_eq!(array.str_len(id), string.len(), "Wrong length for string {}", id);
        assert_eq!(array.string(id), *string, "Wrong string for string {}", id);
    }
    assert_eq!(array.range(1..3), b"third");
    assert_eq!(array.find("third"), Some(2));
    assert_eq!(array.find("missing"), None);

    let collected: Vec<&[u8]> = array.iter().collect();
    assert_eq!(collected.concat(), b"firstthirdfourth");
}

#[test]
fn string_array_serialize() {
    let empty = StringArray::default();
    assert_eq!(serialize_and_load(&empty), empty);

    let strings = ["sample", "", "contig"];
    let array = StringArray::from(strings.as_slice());
    assert_eq!(serialize_and_load(&array), array);
}

//-----------------------------------------------------------------------------

#[test]
fn tags_behavior() {
    let mut tags = Tags::new();
    assert!(tags.is_empty());
    tags.insert("source", "test");
    tags.insert("other", "value");
    tags.insert("source", "overwritten");
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.get("source"), Some("overwritten"));
    assert_eq!(tags.get("missing"), None);
    assert!(tags.contains_key("other"));

    // Iteration is in sorted key order.
    let keys: Vec<&String> = tags.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, ["other", "source"]);
}

#[test]
fn tags_serialize() {
    let mut tags = Tags::new();
    tags.insert("source", "jltsiren/gbwtgraph");
    tags.insert("build", "test");
    assert_eq!(serialize_and_load(&tags), tags);

    let empty = Tags::new();
    assert_eq!(serialize_and_load(&empty), empty);
}

//-----------------------------------------------------------------------------
