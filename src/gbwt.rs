//! The path index: a bidirectional index over paths in a bidirected graph.
//!
//! The index stores a collection of paths as sequences of GBWT node
//! identifiers (handles). Inserting a path also inserts its reverse
//! complement, so the index is always bidirectional. Each node has a record
//! with the sorted list of successor nodes and the positions of the
//! successor occurrences, which supports LF-style stepping with
//! [`GBWT::forward`] and path extraction with [`GBWT::extract`].
//!
//! The construction pipeline builds a partial index for each construction
//! job with [`GBWTBuilder`] and merges the partial indexes with
//! [`GBWT::merge`]. Jobs own disjoint sets of graph components, so the node
//! records of the partial indexes never overlap and merging reduces to
//! concatenating the sequence lists in job order.

use crate::{ENDMARKER, SOURCE_KEY, SOURCE_VALUE};
use crate::headers::{Header, GBWTPayload};
use crate::metadata::Metadata;
use crate::support::{self, Tags};

use simple_sds::serialize::Serialize;

use std::collections::BTreeMap;
use std::io::{Error, ErrorKind};
use std::io;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A position in the path index: an occurrence of a node on some sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    /// GBWT node identifier.
    pub node: usize,
    /// Occurrence rank within the record of the node.
    pub offset: usize,
}

impl Pos {
    /// Creates a new position.
    #[inline]
    pub fn new(node: usize, offset: usize) -> Self {
        Pos { node, offset }
    }
}

//-----------------------------------------------------------------------------

/// A record for a single node in the path index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeRecord {
    // Successor nodes in sorted order. May contain the endmarker.
    edges: Vec<usize>,
    // Successor positions for the occurrences of this node, in occurrence order.
    // The successor of a path-final occurrence is (ENDMARKER, sequence id).
    body: Vec<Pos>,
}

impl NodeRecord {
    /// Returns the number of occurrences of the node.
    #[inline]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` if the node has no occurrences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Returns the number of outgoing edges, including a possible edge to the endmarker.
    #[inline]
    pub fn outdegree(&self) -> usize {
        self.edges.len()
    }

    /// Returns the successor node for the given edge rank.
    ///
    /// # Panics
    ///
    /// Panics if `rank >= self.outdegree()`.
    #[inline]
    pub fn successor(&self, rank: usize) -> usize {
        self.edges[rank]
    }

    /// Returns an iterator over the successor nodes, skipping the endmarker.
    pub fn successors(&self) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().copied().filter(|&node| node != ENDMARKER)
    }

    /// Follows the occurrence at the given offset forward.
    ///
    /// Returns [`None`] if the offset is invalid or the occurrence ends its path.
    pub fn lf(&self, offset: usize) -> Option<Pos> {
        match self.body.get(offset) {
            Some(pos) if pos.node != ENDMARKER => Some(*pos),
            _ => None,
        }
    }

    /// Returns the successor positions for all occurrences of the node.
    ///
    /// Path-final occurrences have the endmarker as the successor node.
    pub fn decompress(&self) -> Vec<Pos> {
        self.body.clone()
    }

    fn add_edge(&mut self, successor: usize) {
        if let Err(rank) = self.edges.binary_search(&successor) {
            self.edges.insert(rank, successor);
        }
    }
}

//-----------------------------------------------------------------------------

/// The path index.
///
/// # Examples
///
/// ```
/// use gbwtgraph::{GBWT, GBWTBuilder, Orientation, support};
///
/// // Insert the path (1, forward), (2, forward), (3, reverse).
/// let path: Vec<usize> = vec![
///     support::encode_node(1, Orientation::Forward),
///     support::encode_node(2, Orientation::Forward),
///     support::encode_node(3, Orientation::Reverse),
/// ];
/// let mut builder = GBWTBuilder::new();
/// builder.insert(&path).unwrap();
/// let index: GBWT = builder.finish();
///
/// // The path and its reverse complement.
/// assert_eq!(index.sequences(), 2);
/// assert_eq!(index.extract(0), Some(path.clone()));
/// assert_eq!(index.extract(1), Some(support::reverse_path(&path)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GBWT {
    header: Header<GBWTPayload>,
    tags: Tags,
    records: BTreeMap<usize, NodeRecord>,
    // Starting positions for the sequences: the record of the endmarker.
    endmarker: Vec<Pos>,
    metadata: Option<Metadata>,
}

/// Statistics.
impl GBWT {
    /// Returns the total length of the sequences in the index, including the endmarkers.
    #[inline]
    pub fn len(&self) -> usize {
        self.header.payload().size as usize
    }

    /// Returns `true` if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of sequences in the index.
    #[inline]
    pub fn sequences(&self) -> usize {
        self.header.payload().sequences as usize
    }

    /// Returns the number of paths in the index.
    ///
    /// Each path corresponds to two sequences, one in each orientation.
    #[inline]
    pub fn paths(&self) -> usize {
        self.sequences() / 2
    }

    /// Returns the size of the alphabet, including the endmarker.
    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.header.payload().alphabet_size as usize
    }

    /// Returns the alphabet offset for the effective alphabet.
    #[inline]
    pub fn alphabet_offset(&self) -> usize {
        self.header.payload().offset as usize
    }

    /// Returns the smallest node identifier in the effective alphabet.
    #[inline]
    pub fn first_node(&self) -> usize {
        self.alphabet_offset() + 1
    }

    /// Returns `true` if node identifier `node` has a record in the index.
    pub fn has_node(&self, node: usize) -> bool {
        node > self.alphabet_offset() && node < self.alphabet_size() && self.records.contains_key(&node)
    }

    /// Returns `true` if the index is bidirectional.
    ///
    /// Indexes built with this crate are always bidirectional.
    #[inline]
    pub fn is_bidirectional(&self) -> bool {
        self.header.is_set(GBWTPayload::FLAG_BIDIRECTIONAL)
    }
}

/// Records and navigation.
impl GBWT {
    /// Returns the record for the given node, or [`None`] if there is no such node.
    pub fn record(&self, node: usize) -> Option<&NodeRecord> {
        if node == ENDMARKER {
            return None;
        }
        self.records.get(&node)
    }

    /// Returns an iterator over the node identifiers with records, in sorted order.
    pub fn node_iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.keys().copied()
    }

    /// Returns the first position in the given sequence, or [`None`] if there is no such sequence.
    pub fn start(&self, sequence: usize) -> Option<Pos> {
        self.endmarker.get(sequence).copied()
    }

    /// Follows the sequence forward and returns the next position, or [`None`] at the end.
    pub fn forward(&self, pos: Pos) -> Option<Pos> {
        self.record(pos.node)?.lf(pos.offset)
    }

    /// Extracts the given sequence as a vector of GBWT node identifiers.
    ///
    /// Returns [`None`] if there is no such sequence.
    pub fn extract(&self, sequence: usize) -> Option<Vec<usize>> {
        let mut result = Vec::new();
        let mut pos = self.start(sequence);
        while let Some(p) = pos {
            result.push(p.node);
            pos = self.forward(p);
        }
        if result.is_empty() { None } else { Some(result) }
    }

    /// Returns the sequence identifier for the given path and orientation.
    #[inline]
    pub fn path_to_sequence(path_id: usize, orientation: support::Orientation) -> usize {
        2 * path_id + (orientation as usize)
    }

    /// Returns the path identifier and orientation for the given sequence.
    #[inline]
    pub fn sequence_to_path(sequence: usize) -> (usize, support::Orientation) {
        (sequence / 2, support::Orientation::from_bit(sequence))
    }
}

/// Tags and metadata.
impl GBWT {
    /// Returns a reference to the tags.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns a mutable reference to the tags.
    pub fn tags_mut(&mut self) -> &mut Tags {
        &mut self.tags
    }

    /// Returns `true` if the index contains path metadata.
    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    /// Returns the path metadata, or [`None`] if there is none.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Sets the path metadata.
    ///
    /// Returns an error if the number of paths in the metadata does not
    /// match the number of paths in the index.
    pub fn set_metadata(&mut self, metadata: Metadata) -> Result<(), String> {
        if 2 * metadata.paths() != self.sequences() {
            return Err(format!(
                "GBWT: Expected metadata for {} paths, got {}",
                self.paths(), metadata.paths()
            ));
        }
        self.header.set(GBWTPayload::FLAG_METADATA);
        self.metadata = Some(metadata);
        Ok(())
    }
}

/// Merging.
impl GBWT {
    /// Merges partial indexes over disjoint node ranges into a single index.
    ///
    /// Sequence order is preserved: all sequences of the first partial index
    /// come first, then the sequences of the second, and so on. Metadata and
    /// tags of the partial indexes are discarded.
    ///
    /// Returns an error if a node has records in multiple partial indexes.
    pub fn merge(parts: Vec<GBWT>) -> Result<GBWT, String> {
        let mut records: BTreeMap<usize, NodeRecord> = BTreeMap::new();
        let mut endmarker: Vec<Pos> = Vec::new();

        for part in parts {
            let sequence_offset = endmarker.len();
            for (node, mut record) in part.records {
                for pos in record.body.iter_mut() {
                    if pos.node == ENDMARKER {
                        pos.offset += sequence_offset;
                    }
                }
                if records.insert(node, record).is_some() {
                    return Err(format!("GBWT: Node {} has records in multiple partial indexes", node));
                }
            }
            endmarker.extend(part.endmarker);
        }

        Ok(GBWT::from_parts(records, endmarker))
    }

    fn from_parts(records: BTreeMap<usize, NodeRecord>, endmarker: Vec<Pos>) -> GBWT {
        let min_node = records.keys().next().copied().unwrap_or(1);
        let max_node = records.keys().next_back().copied().unwrap_or(0);
        let size: usize = records.values().map(|record| record.len()).sum();
        let payload = GBWTPayload {
            sequences: endmarker.len() as u64,
            size: (size + endmarker.len()) as u64,
            offset: (min_node - 1) as u64,
            alphabet_size: (max_node + 1) as u64,
        };
        let mut header = Header::new(payload);
        header.set(GBWTPayload::FLAG_BIDIRECTIONAL);

        let mut tags = Tags::new();
        tags.insert(SOURCE_KEY, SOURCE_VALUE);

        GBWT {
            header,
            tags,
            records,
            endmarker,
            metadata: None,
        }
    }
}

//-----------------------------------------------------------------------------

impl Serialize for GBWT {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.header.serialize(writer)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.tags.serialize(writer)?;
        self.encode_records().serialize(writer)?;
        self.encode_endmarker().serialize(writer)?;
        if let Some(metadata) = self.metadata.as_ref() {
            metadata.serialize(writer)?;
        }
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let header = Header::<GBWTPayload>::load(reader)?;
        if let Err(msg) = header.validate() {
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }

        let mut tags = Tags::load(reader)?;
        tags.insert(SOURCE_KEY, SOURCE_VALUE);

        let records = Self::decode_records(&Vec::<u64>::load(reader)?)?;
        let endmarker = Self::decode_endmarker(&Vec::<u64>::load(reader)?)?;

        let metadata = if header.is_set(GBWTPayload::FLAG_METADATA) {
            Some(Metadata::load(reader)?)
        } else {
            None
        };

        let result = GBWT { header, tags, records, endmarker, metadata };
        if result.sequences() != result.endmarker.len() {
            return Err(Error::new(ErrorKind::InvalidData, "GBWT: Sequence count does not match the endmarker record"));
        }
        let size: usize = result.records.values().map(|record| record.len()).sum();
        if result.len() != size + result.endmarker.len() {
            return Err(Error::new(ErrorKind::InvalidData, "GBWT: Total length does not match the records"));
        }
        if let Some(metadata) = result.metadata.as_ref() {
            if 2 * metadata.paths() != result.sequences() {
                return Err(Error::new(ErrorKind::InvalidData, "GBWT: Path count mismatch between the index and the metadata"));
            }
        }
        result.check_positions().map_err(|msg| Error::new(ErrorKind::InvalidData, msg))?;

        Ok(result)
    }

    fn size_in_elements(&self) -> usize {
        let mut result = self.header.size_in_elements() + self.tags.size_in_elements();
        result += self.encode_records().size_in_elements();
        result += self.encode_endmarker().size_in_elements();
        if let Some(metadata) = self.metadata.as_ref() {
            result += metadata.size_in_elements();
        }
        result
    }
}

// Serialization internals.
impl GBWT {
    fn encode_records(&self) -> Vec<u64> {
        let mut words: Vec<u64> = Vec::new();
        words.push(self.records.len() as u64);
        for (node, record) in self.records.iter() {
            words.push(*node as u64);
            words.push(record.edges.len() as u64);
            words.extend(record.edges.iter().map(|&edge| edge as u64));
            words.push(record.body.len() as u64);
            for pos in record.body.iter() {
                words.push(pos.node as u64);
                words.push(pos.offset as u64);
            }
        }
        words
    }

    fn decode_records(words: &[u64]) -> io::Result<BTreeMap<usize, NodeRecord>> {
        fn invalid() -> Error {
            Error::new(ErrorKind::InvalidData, "GBWT: Invalid record encoding")
        }
        let mut iter = words.iter().copied();
        let mut next = move || iter.next().ok_or_else(invalid);

        let record_count = next()? as usize;
        let mut records: BTreeMap<usize, NodeRecord> = BTreeMap::new();
        let mut prev_node = 0;
        for _ in 0..record_count {
            let node = next()? as usize;
            if node <= prev_node {
                return Err(Error::new(ErrorKind::InvalidData, "GBWT: Records are not sorted by node"));
            }
            prev_node = node;

            let edge_count = next()? as usize;
            let mut edges = Vec::with_capacity(edge_count);
            for _ in 0..edge_count {
                edges.push(next()? as usize);
            }
            if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(Error::new(ErrorKind::InvalidData, "GBWT: Record edges are not sorted"));
            }

            let body_len = next()? as usize;
            let mut body = Vec::with_capacity(body_len);
            for _ in 0..body_len {
                let succ = next()? as usize;
                let offset = next()? as usize;
                if succ != ENDMARKER && edges.binary_search(&succ).is_err() {
                    return Err(Error::new(ErrorKind::InvalidData, "GBWT: Record body refers to a missing edge"));
                }
                body.push(Pos::new(succ, offset));
            }
            records.insert(node, NodeRecord { edges, body });
        }
        Ok(records)
    }

    fn encode_endmarker(&self) -> Vec<u64> {
        let mut words: Vec<u64> = Vec::with_capacity(2 * self.endmarker.len());
        for pos in self.endmarker.iter() {
            words.push(pos.node as u64);
            words.push(pos.offset as u64);
        }
        words
    }

    fn decode_endmarker(words: &[u64]) -> io::Result<Vec<Pos>> {
        if words.len() % 2 != 0 {
            return Err(Error::new(ErrorKind::InvalidData, "GBWT: Invalid endmarker encoding"));
        }
        Ok(words.chunks_exact(2).map(|pair| Pos::new(pair[0] as usize, pair[1] as usize)).collect())
    }

    // Checks that every position in the index points to a valid occurrence.
    fn check_positions(&self) -> Result<(), String> {
        let check = |pos: &Pos| -> Result<(), String> {
            if pos.node == ENDMARKER {
                if pos.offset >= self.endmarker.len() {
                    return Err(String::from("GBWT: Invalid sequence terminator"));
                }
                return Ok(());
            }
            match self.records.get(&pos.node) {
                Some(record) if pos.offset < record.len() => Ok(()),
                _ => Err(format!("GBWT: Invalid position ({}, {})", pos.node, pos.offset)),
            }
        };
        for pos in self.endmarker.iter() {
            check(pos)?;
        }
        for record in self.records.values() {
            for pos in record.body.iter() {
                check(pos)?;
            }
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// Builds a path index from paths of GBWT node identifiers.
///
/// Inserted paths are buffered and flushed into the node records when the
/// buffer reaches the batch size. See [`GBWT`] for an example.
#[derive(Clone, Debug)]
pub struct GBWTBuilder {
    records: BTreeMap<usize, NodeRecord>,
    endmarker: Vec<Pos>,
    buffer: Vec<Vec<usize>>,
    buffered_nodes: usize,
    batch_size: usize,
}

impl GBWTBuilder {
    /// Default number of buffered nodes before a flush.
    pub const INSERT_BATCH_SIZE: usize = 100_000_000;

    /// Minimum number of sequences that should fit in a batch when the batch
    /// size is determined automatically.
    pub const MIN_SEQUENCES_PER_BATCH: usize = 20;

    /// Creates a builder with the default batch size.
    pub fn new() -> Self {
        Self::with_batch_size(Self::INSERT_BATCH_SIZE)
    }

    /// Creates a builder with the given batch size in nodes.
    ///
    /// Batch size `0` is interpreted as [`Self::INSERT_BATCH_SIZE`].
    pub fn with_batch_size(batch_size: usize) -> Self {
        let batch_size = if batch_size == 0 { Self::INSERT_BATCH_SIZE } else { batch_size };
        GBWTBuilder {
            records: BTreeMap::new(),
            endmarker: Vec::new(),
            buffer: Vec::new(),
            buffered_nodes: 0,
            batch_size,
        }
    }

    /// Returns the number of sequences inserted or buffered so far.
    pub fn sequences(&self) -> usize {
        self.endmarker.len() + 2 * self.buffer.len()
    }

    /// Inserts a path in both orientations.
    ///
    /// Returns an error if the path is empty or contains the endmarker.
    pub fn insert(&mut self, path: &[usize]) -> Result<(), String> {
        if path.is_empty() {
            return Err(String::from("GBWTBuilder: Cannot insert an empty path"));
        }
        if path.iter().any(|&handle| support::node_id(handle) == ENDMARKER) {
            return Err(String::from("GBWTBuilder: Path contains the endmarker"));
        }
        self.buffered_nodes += 2 * path.len();
        self.buffer.push(path.to_vec());
        if self.buffered_nodes >= self.batch_size {
            self.flush();
        }
        Ok(())
    }

    /// Flushes the buffered paths into the node records.
    pub fn flush(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        for path in buffer {
            let reverse = support::reverse_path(&path);
            self.insert_sequence(&path);
            self.insert_sequence(&reverse);
        }
        self.buffered_nodes = 0;
    }

    /// Finishes the construction and returns the path index.
    pub fn finish(mut self) -> GBWT {
        self.flush();
        GBWT::from_parts(self.records, self.endmarker)
    }

    // Appends a single sequence to the records.
    fn insert_sequence(&mut self, path: &[usize]) {
        let sequence_id = self.endmarker.len();

        // Reserve an occurrence in each record first, so that the successor
        // offsets are known even when the path visits a node multiple times.
        let mut offsets: Vec<usize> = Vec::with_capacity(path.len());
        for &node in path {
            let record = self.records.entry(node).or_default();
            offsets.push(record.len());
            record.body.push(Pos::default());
        }

        for (rank, &node) in path.iter().enumerate() {
            let successor = if rank + 1 < path.len() {
                Pos::new(path[rank + 1], offsets[rank + 1])
            } else {
                Pos::new(ENDMARKER, sequence_id)
            };
            // The record exists after the reservation pass.
            let record = self.records.get_mut(&node).unwrap();
            record.add_edge(successor.node);
            record.body[offsets[rank]] = successor;
        }

        self.endmarker.push(Pos::new(path[0], offsets[0]));
    }
}

impl Default for GBWTBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//-----------------------------------------------------------------------------
