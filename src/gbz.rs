//! GBZ: a self-describing container for a path index and a node graph.
//!
//! The container combines the path index with the node sequences and
//! exposes the graph interface by combining the two. Nodes that are not
//! visited by any path have sequences in the graph but are not part of the
//! node graph.

use crate::{ENDMARKER, SOURCE_KEY, SOURCE_VALUE};
use crate::algorithms::HandleGraph;
use crate::gbwt::{GBWT, NodeRecord, Pos};
use crate::graph::{Graph, Placement, SegmentIter};
use crate::headers::{Header, GBZPayload};
use crate::metadata::{FullPathName, Metadata};
use crate::source::SequenceSource;
use crate::support::{self, Orientation, Tags};

use simple_sds::bit_vector::{BitVector, OneIter, Identity};
use simple_sds::ops::{BitVec, Select};
use simple_sds::raw_vector::{RawVector, AccessRaw};
use simple_sds::serialize::{self, Serialize};

use std::fs::File;
use std::io::{BufReader, BufWriter, Error, ErrorKind};
use std::iter::FusedIterator;
use std::path::Path;
use std::io;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A GBZ graph: a path index, node sequences, and an optional segment translation.
///
/// # Examples
///
/// ```no_run
/// use gbwtgraph::GBZ;
/// use simple_sds::serialize;
///
/// let gbz: GBZ = serialize::load_from("example.gbz").unwrap();
/// for node_id in gbz.node_iter() {
///     let _ = gbz.sequence(node_id).unwrap();
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GBZ {
    header: Header<GBZPayload>,
    tags: Tags,
    index: GBWT,
    graph: Graph,
    // Marks the sequence identifiers that correspond to nodes visited by paths.
    real_nodes: BitVector,
}

//-----------------------------------------------------------------------------

/// Construction.
impl GBZ {
    /// File extension for serialized GBZ graphs.
    pub const EXTENSION: &'static str = ".gbz";

    /// File extension for serialized path indexes.
    pub const GBWT_EXTENSION: &'static str = ".gbwt";

    /// Builds a GBZ graph from a path index and a sequence source.
    ///
    /// Sequence data is placed in private memory.
    pub fn new(index: GBWT, source: &SequenceSource) -> Result<Self, String> {
        Self::with_placement(index, source, Placement::Private)
    }

    /// Builds a GBZ graph from a path index and a sequence source with the
    /// given sequence data placement.
    pub fn with_placement(index: GBWT, source: &SequenceSource, placement: Placement) -> Result<Self, String> {
        let graph = Graph::new(source, placement)?;
        let real_nodes = Self::cache_real_nodes(&index, &graph).map_err(|err| err.to_string())?;

        let mut tags = Tags::new();
        tags.insert(SOURCE_KEY, SOURCE_VALUE);

        Ok(GBZ {
            header: Header::new(GBZPayload),
            tags,
            index,
            graph,
            real_nodes,
        })
    }

    // Marks the sequence ids of the nodes present in the path index and
    // checks that each of them has a sequence.
    fn cache_real_nodes(index: &GBWT, graph: &Graph) -> io::Result<BitVector> {
        let mut real_nodes = RawVector::with_len(graph.sequences(), false);
        for gbwt_node in index.node_iter() {
            if support::node_orientation(gbwt_node) != Orientation::Forward {
                continue;
            }
            let node_id = support::node_id(gbwt_node);
            let sequence_id = graph.node_to_sequence(node_id).ok_or_else(|| Error::new(
                ErrorKind::InvalidData,
                format!("GBZ: The path index contains node {} without a sequence", node_id),
            ))?;
            if graph.sequence_len(sequence_id) == 0 {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("GBZ: The path index contains node {} with an empty sequence", node_id),
                ));
            }
            real_nodes.set_bit(sequence_id, true);
        }
        Ok(BitVector::from(real_nodes))
    }
}

//-----------------------------------------------------------------------------

/// Statistics and nodes.
impl GBZ {
    /// Returns the number of nodes in the graph.
    #[inline]
    pub fn nodes(&self) -> usize {
        self.real_nodes.count_ones()
    }

    /// Returns `true` if the graph contains a node with the given identifier.
    pub fn has_node(&self, node_id: usize) -> bool {
        match self.graph.node_to_sequence(node_id) {
            Some(sequence_id) => self.real_nodes.get(sequence_id),
            None => false,
        }
    }

    /// Returns the smallest node identifier in the graph.
    #[inline]
    pub fn min_node_id(&self) -> usize {
        self.graph.min_id()
    }

    /// Returns the largest node identifier in the graph.
    #[inline]
    pub fn max_node_id(&self) -> usize {
        self.graph.min_id() + self.graph.sequences() - 1
    }

    /// Returns an iterator over the node identifiers in the graph.
    pub fn node_iter(&self) -> NodeIter<'_> {
        NodeIter {
            parent: self,
            iter: self.real_nodes.one_iter(),
        }
    }

    /// Returns the sequence of the node in forward orientation, or [`None`]
    /// if there is no such node.
    pub fn sequence(&self, node_id: usize) -> Option<&[u8]> {
        if !self.has_node(node_id) {
            return None;
        }
        Some(self.graph.sequence(self.graph.node_to_sequence(node_id)?))
    }

    /// Returns the length of the node sequence, or `0` if there is no such node.
    pub fn sequence_len(&self, node_id: usize) -> usize {
        self.sequence(node_id).map(|sequence| sequence.len()).unwrap_or(0)
    }

    /// Returns the sequence of the node in the given orientation, or [`None`]
    /// if there is no such node.
    ///
    /// The sequence is reverse complemented on the fly for the reverse orientation.
    pub fn oriented_sequence(&self, node_id: usize, orientation: Orientation) -> Option<Vec<u8>> {
        let sequence = self.sequence(node_id)?;
        match orientation {
            Orientation::Forward => Some(sequence.to_vec()),
            Orientation::Reverse => Some(support::reverse_complement(sequence)),
        }
    }
}

/// Edges.
impl GBZ {
    /// Returns the record for the given oriented node, or [`None`] if there is no such node.
    pub fn record(&self, handle: usize) -> Option<&NodeRecord> {
        self.index.record(handle)
    }

    /// Returns an iterator over the successors of an oriented node, or
    /// [`None`] if there is no such node.
    pub fn successors(&self, node_id: usize, orientation: Orientation) -> Option<EdgeIter<'_>> {
        let record = self.index.record(support::encode_node(node_id, orientation))?;
        Some(EdgeIter::new(record, false))
    }

    /// Returns an iterator over the predecessors of an oriented node, or
    /// [`None`] if there is no such node.
    pub fn predecessors(&self, node_id: usize, orientation: Orientation) -> Option<EdgeIter<'_>> {
        let record = self.index.record(support::encode_node(node_id, orientation.flip()))?;
        Some(EdgeIter::new(record, true))
    }
}

/// Paths.
impl GBZ {
    /// Returns the number of paths in the graph.
    #[inline]
    pub fn paths(&self) -> usize {
        self.index.paths()
    }

    /// Returns the path metadata, or [`None`] if there is none.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.index.metadata()
    }

    /// Extracts the path with the given identifier in the given orientation.
    ///
    /// The path is returned as a vector of encoded handles. Returns [`None`]
    /// if there is no such path.
    pub fn path(&self, path_id: usize, orientation: Orientation) -> Option<Vec<usize>> {
        self.index.extract(GBWT::path_to_sequence(path_id, orientation))
    }

    /// Returns the sampled positions for all reference and generic paths.
    ///
    /// For each such path, the result contains the sampled `(sequence
    /// offset, path index position)` pairs at intervals of approximately
    /// `interval` bp, along with the path length in bp.
    pub fn reference_positions(&self, interval: usize, verbose: bool) -> Vec<ReferencePath> {
        let metadata = match self.metadata() {
            Some(metadata) => metadata,
            None => return Vec::new(),
        };
        let interval = interval.max(1);

        let mut result = Vec::new();
        for (path_id, _) in metadata.path_iter().enumerate() {
            if !metadata.path_is_reference(path_id) {
                continue;
            }
            let name = match metadata.full_path_name(path_id) {
                Some(name) => name,
                None => continue,
            };

            let mut positions: Vec<(usize, Pos)> = Vec::new();
            let mut offset = 0;
            let mut next_sample = 0;
            let mut pos = self.index.start(GBWT::path_to_sequence(path_id, Orientation::Forward));
            while let Some(p) = pos {
                if offset >= next_sample {
                    positions.push((offset, p));
                    next_sample = offset + interval;
                }
                offset += self.sequence_len(support::node_id(p.node));
                pos = self.index.forward(p);
            }

            if verbose {
                eprintln!("Path {}: length {}, {} samples", name, offset, positions.len());
            }
            result.push(ReferencePath {
                id: path_id,
                name,
                len: offset,
                positions,
            });
        }
        result
    }
}

/// Segments and tags.
impl GBZ {
    /// Returns `true` if the graph contains a node-to-segment translation.
    #[inline]
    pub fn has_translation(&self) -> bool {
        self.graph.has_translation()
    }

    /// Returns an iterator over the segments in the translation, or [`None`]
    /// if there is no translation.
    pub fn segment_iter(&self) -> Option<SegmentIter<'_>> {
        if self.has_translation() {
            Some(self.graph.segment_iter())
        } else {
            None
        }
    }

    /// Returns a reference to the tags.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns a mutable reference to the tags.
    pub fn tags_mut(&mut self) -> &mut Tags {
        &mut self.tags
    }
}

/// A reference path with sampled positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferencePath {
    /// Path identifier in the metadata.
    pub id: usize,
    /// Full name of the path.
    pub name: FullPathName,
    /// Length of the path in bp.
    pub len: usize,
    /// Sampled (sequence offset, path index position) pairs.
    pub positions: Vec<(usize, Pos)>,
}

//-----------------------------------------------------------------------------

impl AsRef<GBWT> for GBZ {
    fn as_ref(&self) -> &GBWT {
        &self.index
    }
}

impl AsRef<Graph> for GBZ {
    fn as_ref(&self) -> &Graph {
        &self.graph
    }
}

//-----------------------------------------------------------------------------

impl HandleGraph for GBZ {
    fn has_node(&self, node_id: usize) -> bool {
        GBZ::has_node(self, node_id)
    }

    fn node_count(&self) -> usize {
        self.nodes()
    }

    fn min_node_id(&self) -> usize {
        GBZ::min_node_id(self)
    }

    fn max_node_id(&self) -> usize {
        GBZ::max_node_id(self)
    }

    fn follow_edges<F: FnMut(usize) -> bool>(&self, handle: usize, go_left: bool, mut visit: F) -> bool {
        let (node_id, orientation) = support::decode_node(handle);
        let iter = if go_left {
            self.predecessors(node_id, orientation)
        } else {
            self.successors(node_id, orientation)
        };
        if let Some(iter) = iter {
            for (next_id, next_orientation) in iter {
                if !visit(support::encode_node(next_id, next_orientation)) {
                    return false;
                }
            }
        }
        true
    }

    fn for_each_node<F: FnMut(usize) -> bool>(&self, mut visit: F) -> bool {
        for node_id in self.node_iter() {
            if !visit(node_id) {
                return false;
            }
        }
        true
    }

    fn degree(&self, handle: usize, go_left: bool) -> usize {
        let (node_id, orientation) = support::decode_node(handle);
        let iter = if go_left {
            self.predecessors(node_id, orientation)
        } else {
            self.successors(node_id, orientation)
        };
        iter.map(|iter| iter.count()).unwrap_or(0)
    }
}

//-----------------------------------------------------------------------------

impl Serialize for GBZ {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.header.serialize(writer)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.tags.serialize(writer)?;
        self.index.serialize(writer)?;
        self.graph.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let header = Header::<GBZPayload>::load(reader)?;
        if let Err(msg) = header.validate() {
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }

        let mut tags = Tags::load(reader)?;
        tags.insert(SOURCE_KEY, SOURCE_VALUE);

        let index = GBWT::load(reader)?;
        if !index.is_bidirectional() {
            return Err(Error::new(ErrorKind::InvalidData, "GBZ: The path index is not bidirectional"));
        }

        let graph = Graph::load(reader)?;
        let real_nodes = Self::cache_real_nodes(&index, &graph)?;

        Ok(GBZ { header, tags, index, graph, real_nodes })
    }

    fn size_in_elements(&self) -> usize {
        self.header.size_in_elements()
            + self.tags.size_in_elements()
            + self.index.size_in_elements()
            + self.graph.size_in_elements()
    }
}

/// Two-file serialization.
impl GBZ {
    /// Serializes the path index and the graph to separate files.
    ///
    /// The path index uses its normal serialization format. The graph uses
    /// the legacy format by default and its normal serialization format if
    /// `simple_sds_graph` is set.
    pub fn serialize_to_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self, gbwt_file: P, graph_file: Q, simple_sds_graph: bool
    ) -> io::Result<()> {
        serialize::serialize_to(&self.index, gbwt_file)?;
        if simple_sds_graph {
            serialize::serialize_to(&self.graph, graph_file)?;
        } else {
            let mut writer = BufWriter::new(File::create(graph_file)?);
            self.graph.write_legacy(&mut writer)?;
        }
        Ok(())
    }

    /// Loads a GBZ graph from a path index file and a graph file.
    ///
    /// Only the legacy graph format is accepted. Tags stored in the path
    /// index file are preserved; container tags are reset.
    pub fn load_from_files<P: AsRef<Path>, Q: AsRef<Path>>(gbwt_file: P, graph_file: Q) -> io::Result<Self> {
        let index: GBWT = serialize::load_from(gbwt_file)?;
        if !index.is_bidirectional() {
            return Err(Error::new(ErrorKind::InvalidData, "GBZ: The path index is not bidirectional"));
        }
        let mut reader = BufReader::new(File::open(graph_file)?);
        let graph = Graph::read_legacy(&mut reader)?;
        let real_nodes = Self::cache_real_nodes(&index, &graph)?;

        let mut tags = Tags::new();
        tags.insert(SOURCE_KEY, SOURCE_VALUE);

        Ok(GBZ {
            header: Header::new(GBZPayload),
            tags,
            index,
            graph,
            real_nodes,
        })
    }

    /// Loads a GBZ graph and places the sequence data as requested.
    ///
    /// See [`Placement`] for the options. With [`Placement::SharedOwner`],
    /// this process creates the shared memory segment and releases it when
    /// the graph is dropped. With [`Placement::SharedMapper`], the segment
    /// must already exist, and dropping the graph only detaches from it.
    pub fn load_with<T: io::Read>(reader: &mut T, placement: Placement) -> io::Result<Self> {
        let mut result = Self::load(reader)?;
        result.graph.set_placement(placement)
            .map_err(|msg| Error::new(ErrorKind::Other, msg))?;
        Ok(result)
    }
}

//-----------------------------------------------------------------------------

/// An iterator over the node identifiers in a GBZ graph, in ascending order.
#[derive(Clone, Debug)]
pub struct NodeIter<'a> {
    parent: &'a GBZ,
    iter: OneIter<'a, Identity>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, sequence_id)| sequence_id + self.parent.graph.min_id())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a> DoubleEndedIterator for NodeIter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(_, sequence_id)| sequence_id + self.parent.graph.min_id())
    }
}

impl<'a> ExactSizeIterator for NodeIter<'a> {}

impl<'a> FusedIterator for NodeIter<'a> {}

//-----------------------------------------------------------------------------

/// An iterator over the predecessors or successors of an oriented node.
///
/// The type of `Item` is `(usize, Orientation)`. Successors are listed in
/// sorted order; predecessors are sorted by the flipped orientation.
#[derive(Clone, Debug)]
pub struct EdgeIter<'a> {
    record: &'a NodeRecord,
    // The first edge rank that has not been visited.
    next: usize,
    // The first edge rank that we should not visit.
    limit: usize,
    // Flip the orientations in the iterated values.
    flip: bool,
}

impl<'a> EdgeIter<'a> {
    fn new(record: &'a NodeRecord, flip: bool) -> Self {
        let next = if record.outdegree() > 0 && record.successor(0) == ENDMARKER { 1 } else { 0 };
        EdgeIter {
            record,
            next,
            limit: record.outdegree(),
            flip,
        }
    }
}

impl<'a> Iterator for EdgeIter<'a> {
    type Item = (usize, Orientation);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.limit {
            None
        } else {
            let successor = self.record.successor(self.next);
            self.next += 1;
            // Predecessors are iterated through the record of the flipped
            // node: flipping a successor of the flip gives a predecessor.
            let mut orientation = support::node_orientation(successor);
            if self.flip {
                orientation = orientation.flip();
            }
            Some((support::node_id(successor), orientation))
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.limit - self.next;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for EdgeIter<'a> {}

impl<'a> FusedIterator for EdgeIter<'a> {}

//-----------------------------------------------------------------------------
