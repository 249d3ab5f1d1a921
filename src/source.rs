//! An in-memory source of node sequences for graph construction.

use crate::support::StringArray;

use simple_sds::sparse_vector::{SparseVector, SparseBuilder};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::Path;

//-----------------------------------------------------------------------------

/// Node sequences and an optional segment-name-to-node-range translation.
///
/// The sequences are stored in a single concatenated buffer. A segment that
/// is longer than the maximum node length is chopped into nodes with
/// consecutive identifiers, and the translation maps the segment name to
/// that range of identifiers.
#[derive(Clone, Debug, Default)]
pub struct SequenceSource {
    // Maps node ids to (offset, length) in the concatenated sequences.
    nodes: HashMap<usize, (usize, usize)>,
    sequences: Vec<u8>,
    segment_translation: HashMap<String, Range<usize>>,
    // The next unused node id for chopped segments.
    next_id: usize,
}

impl SequenceSource {
    /// File extension for serialized segment translations.
    pub const TRANSLATION_EXTENSION: &'static str = ".trans";

    /// Creates an empty sequence source.
    pub fn new() -> Self {
        SequenceSource {
            nodes: HashMap::new(),
            sequences: Vec::new(),
            segment_translation: HashMap::new(),
            next_id: 1,
        }
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the source is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if the source contains a node with the given identifier.
    #[inline]
    pub fn has_node(&self, node_id: usize) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Returns the smallest node identifier, or [`None`] if the source is empty.
    pub fn min_node_id(&self) -> Option<usize> {
        self.nodes.keys().min().copied()
    }

    /// Returns the largest node identifier, or [`None`] if the source is empty.
    pub fn max_node_id(&self) -> Option<usize> {
        self.nodes.keys().max().copied()
    }

    /// Returns the sequence for the given node, or [`None`] if there is no such node.
    pub fn sequence(&self, node_id: usize) -> Option<&[u8]> {
        let (offset, len) = self.nodes.get(&node_id)?;
        Some(&self.sequences[*offset..*offset + *len])
    }

    /// Returns the length of the sequence for the given node, or `0` if there is no such node.
    pub fn sequence_len(&self, node_id: usize) -> usize {
        self.nodes.get(&node_id).map(|(_, len)| *len).unwrap_or(0)
    }

    /// Returns the total length of the stored sequences.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.sequences.len()
    }

    /// Returns an iterator over the node identifiers, in arbitrary order.
    pub fn node_iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.keys().copied()
    }

    /// Adds a node with the given identifier and sequence.
    ///
    /// Does nothing if the sequence is empty or the node already exists.
    pub fn add_node(&mut self, node_id: usize, sequence: &[u8]) {
        if sequence.is_empty() || self.nodes.contains_key(&node_id) {
            return;
        }
        let offset = self.sequences.len();
        self.sequences.extend_from_slice(sequence);
        self.nodes.insert(node_id, (offset, sequence.len()));
        self.next_id = self.next_id.max(node_id + 1);
    }

    /// Adds a segment, chopping it into nodes of at most `max_length` bp.
    ///
    /// The nodes get consecutive identifiers from the internal counter, and
    /// the segment name maps to the resulting identifier range. Does nothing
    /// if the sequence is empty or the segment already exists.
    pub fn translate_segment(&mut self, name: &str, sequence: &[u8], max_length: usize) {
        if sequence.is_empty() || self.segment_translation.contains_key(name) {
            return;
        }
        let max_length = if max_length == 0 { sequence.len() } else { max_length };

        let start = self.next_id;
        let limit = start + (sequence.len() + max_length - 1) / max_length;
        for id in start..limit {
            let offset = (id - start) * max_length;
            let len = max_length.min(sequence.len() - offset);
            self.add_node(id, &sequence[offset..offset + len]);
        }

        self.segment_translation.insert(String::from(name), start..limit);
        self.next_id = limit;
    }

    /// Returns `true` if the source contains a segment translation.
    #[inline]
    pub fn uses_translation(&self) -> bool {
        !self.segment_translation.is_empty()
    }

    /// Returns the number of translated segments.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segment_translation.len()
    }

    /// Returns the node range for the given segment name, or [`None`] if there is no such segment.
    pub fn segment_range(&self, name: &str) -> Option<Range<usize>> {
        self.segment_translation.get(name).cloned()
    }

    /// Returns an iterator over the translated segments, in arbitrary order.
    pub fn translation_iter(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.segment_translation.iter().map(|(name, range)| (name.as_str(), range.clone()))
    }

    /// Inverts the segment translation for graph construction.
    ///
    /// The return value consists of segment names ordered by their node
    /// ranges and a sparse bitvector with set bits at the first node
    /// identifier of each segment. The universe of the bitvector is the
    /// past-the-end node identifier.
    pub fn invert_translation(&self) -> Result<(StringArray, SparseVector), String> {
        let mut inverse: Vec<(Range<usize>, &str)> = self.segment_translation.iter()
            .map(|(name, range)| (range.clone(), name.as_str()))
            .collect();
        inverse.sort_unstable_by_key(|(range, _)| range.start);

        let names: Vec<&str> = inverse.iter().map(|(_, name)| *name).collect();
        let names = StringArray::from(names.as_slice());

        let mut builder = SparseBuilder::new(self.next_id, inverse.len()).map_err(|x| x.to_string())?;
        for (range, _) in inverse.iter() {
            builder.set(range.start);
        }
        let mapping = SparseVector::try_from(builder).map_err(|x| x.to_string())?;

        Ok((names, mapping))
    }

    /// Writes the segment translation to the given file as tab-separated lines.
    ///
    /// Each line is `T <name> <start> <limit>`, where `start..limit` is the
    /// node range of the segment. The lines are ordered by node ranges.
    pub fn write_translation<P: AsRef<Path>>(&self, filename: P) -> Result<(), String> {
        let file = File::create(&filename).map_err(|x| x.to_string())?;
        let mut writer = BufWriter::new(file);

        let mut inverse: Vec<(Range<usize>, &str)> = self.segment_translation.iter()
            .map(|(name, range)| (range.clone(), name.as_str()))
            .collect();
        inverse.sort_unstable_by_key(|(range, _)| range.start);

        for (range, name) in inverse {
            writeln!(writer, "T\t{}\t{}\t{}", name, range.start, range.end).map_err(|x| x.to_string())?;
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------
