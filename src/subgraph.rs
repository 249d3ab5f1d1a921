//! Extracting a subgraph around a node or a position on a reference path.
//!
//! A subgraph contains all nodes within a given context and all edges
//! between them, along with every path segment of the original graph that
//! stays within the subgraph. The path used for anchoring the query becomes
//! the reference path of the subgraph; other paths have no metadata, as the
//! identity of a path cannot be determined efficiently from a path index
//! position.

use crate::formats::{self, WalkMetadata};
use crate::gbwt::Pos;
use crate::gbz::GBZ;
use crate::metadata::FullPathName;
use crate::path_index::PathIndex;
use crate::support::{self, Orientation};
use crate::ENDMARKER;

pub mod query;

pub use query::{HaplotypeOutput, SubgraphQuery};
use query::QueryType;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, BTreeMap, HashMap};
use std::io::{self, Write};
use std::ops::Range;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

// A record for an oriented node in the subgraph.
#[derive(Clone, Debug)]
struct SubgraphRecord {
    // Successor handles, in sorted order.
    successors: Vec<usize>,
    // Successor positions for the occurrences of the handle.
    positions: Vec<Pos>,
    // Sequence in the orientation of the handle.
    sequence: Vec<u8>,
}

impl SubgraphRecord {
    fn new(graph: &GBZ, handle: usize) -> Result<Self, String> {
        let record = graph.record(handle).ok_or(
            format!("The graph does not contain handle {}", handle)
        )?;
        let (node_id, orientation) = support::decode_node(handle);
        let sequence = graph.oriented_sequence(node_id, orientation).ok_or(
            format!("The graph does not contain a sequence for node {}", node_id)
        )?;
        Ok(SubgraphRecord {
            successors: record.successors().collect(),
            positions: record.decompress(),
            sequence,
        })
    }

    #[inline]
    fn sequence_len(&self) -> usize {
        self.sequence.len()
    }
}

//-----------------------------------------------------------------------------

// A position on an oriented node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct GraphPosition {
    node: usize,
    orientation: Orientation,
    offset: usize,
}

// A starting point for the context extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Seed {
    // The entire node is within the query; neighbors are at distance 0.
    Node(usize),
    // The query covers the node from the given position onward.
    Position(GraphPosition),
}

impl Seed {
    fn node_id(&self) -> usize {
        match self {
            Seed::Node(node_id) => *node_id,
            Seed::Position(pos) => pos.node,
        }
    }
}

//-----------------------------------------------------------------------------

/// A subgraph extracted from a GBZ graph.
///
/// # Examples
///
/// ```no_run
/// use gbwtgraph::{GBZ, PathIndex, Subgraph, SubgraphQuery, HaplotypeOutput};
/// use gbwtgraph::FullPathName;
/// use simple_sds::serialize;
///
/// let graph: GBZ = serialize::load_from("example.gbz").unwrap();
/// let path_index = PathIndex::new(&graph, PathIndex::DEFAULT_INTERVAL, false).unwrap();
///
/// let path_name = FullPathName::generic("chr1");
/// let query = SubgraphQuery::path_offset(&path_name, 1000).with_context(100);
/// let subgraph = Subgraph::from_gbz(&graph, Some(&path_index), &query).unwrap();
/// subgraph.write_gfa(&mut std::io::stdout()).unwrap();
/// ```
pub struct Subgraph {
    // Records for both orientations of the nodes in the subgraph.
    records: BTreeMap<usize, SubgraphRecord>,

    // Paths in the subgraph.
    paths: Vec<PathInfo>,

    // Offset in `paths` for the reference path.
    ref_id: Option<usize>,

    // Name of the reference path.
    ref_path: Option<FullPathName>,

    // Interval of the reference path that is present in the subgraph.
    ref_interval: Option<Range<usize>>,
}

impl Subgraph {
    /// Extracts a subgraph from a GBZ graph.
    ///
    /// A path index is required for the path-based queries.
    ///
    /// # Arguments
    ///
    /// * `graph`: A GBZ graph.
    /// * `path_index`: A path index for the graph.
    /// * `query`: Arguments for extracting the subgraph.
    pub fn from_gbz(graph: &GBZ, path_index: Option<&PathIndex>, query: &SubgraphQuery) -> Result<Self, String> {
        match query.query_type() {
            QueryType::Node(node_id) => {
                if query.output() == HaplotypeOutput::ReferenceOnly {
                    return Err(String::from("Node queries cannot output the reference path only"));
                }
                if !graph.has_node(*node_id) {
                    return Err(format!("The graph does not contain node {}", node_id));
                }
                let records = extract_context(graph, &[Seed::Node(*node_id)], query.context())?;
                Self::with_paths(records, None, None, None, query.output())
            }
            QueryType::PathOffset(path_name, offset) => {
                let path_index = path_index.ok_or(
                    String::from("Path-based queries require a path index")
                )?;
                let index_offset = find_indexed_path(graph, path_index, path_name)?;
                let (query_pos, index_pos) = query_position(graph, path_index, index_offset, *offset)?;
                let records = extract_context(graph, &[Seed::Position(query_pos)], query.context())?;
                let ref_path = graph.metadata()
                    .and_then(|metadata| {
                        path_index.offset_to_path(index_offset)
                            .and_then(|path_id| metadata.full_path_name(path_id))
                    })
                    .ok_or(String::from("The reference path has no metadata"))?;
                Self::with_paths(records, Some(index_pos), Some((*offset, query_pos)), Some(ref_path), query.output())
            }
            QueryType::PathInterval(path_name, interval) => {
                if interval.is_empty() {
                    return Err(String::from("The query interval is empty"));
                }
                let path_index = path_index.ok_or(
                    String::from("Path-based queries require a path index")
                )?;
                let index_offset = find_indexed_path(graph, path_index, path_name)?;
                let (query_pos, index_pos) = query_position(graph, path_index, index_offset, interval.start)?;
                let seeds = interval_seeds(graph, query_pos, index_pos, interval)?;
                let records = extract_context(graph, &seeds, query.context())?;
                let ref_path = graph.metadata()
                    .and_then(|metadata| {
                        path_index.offset_to_path(index_offset)
                            .and_then(|path_id| metadata.full_path_name(path_id))
                    })
                    .ok_or(String::from("The reference path has no metadata"))?;
                Self::with_paths(records, Some(index_pos), Some((interval.start, query_pos)), Some(ref_path), query.output())
            }
        }
    }

    // Extracts the paths in the subgraph and applies the haplotype output option.
    fn with_paths(
        records: BTreeMap<usize, SubgraphRecord>,
        ref_pos: Option<Pos>,
        ref_offset: Option<(usize, GraphPosition)>,
        ref_path: Option<FullPathName>,
        output: HaplotypeOutput,
    ) -> Result<Self, String> {
        let (mut paths, ref_info) = extract_paths(&records, ref_pos)?;
        let mut ref_id = ref_info.map(|(id, _)| id);

        let ref_interval = match (ref_offset, ref_info) {
            (Some((query_offset, query_pos)), Some((id, path_offset))) => {
                let start = query_offset - distance_to(&records, &paths[id].path, path_offset, query_pos.offset);
                Some(start..start + paths[id].len)
            }
            _ => None,
        };

        match output {
            HaplotypeOutput::All => {}
            HaplotypeOutput::Distinct => {
                let (distinct, new_ref_id) = make_distinct(paths, ref_id);
                paths = distinct;
                ref_id = new_ref_id;
            }
            HaplotypeOutput::ReferenceOnly => {
                let id = ref_id.ok_or(String::from("Could not find the reference path"))?;
                paths = vec![paths[id].clone()];
                ref_id = Some(0);
            }
        }

        Ok(Subgraph { records, paths, ref_id, ref_path, ref_interval })
    }

    /// Returns the number of nodes in the subgraph.
    pub fn node_count(&self) -> usize {
        self.records.len() / 2
    }

    /// Returns the number of paths in the subgraph.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if the subgraph contains the given node.
    pub fn has_node(&self, node_id: usize) -> bool {
        self.records.contains_key(&support::encode_node(node_id, Orientation::Forward))
    }

    /// Writes the subgraph in the GFA format to the given output.
    pub fn write_gfa<T: Write>(&self, output: &mut T) -> io::Result<()> {
        // Header.
        let reference_samples = self.ref_path.as_ref().map(|name| name.sample.as_str());
        formats::write_gfa_header(reference_samples, output)?;

        // Segments.
        for (handle, record) in self.records.iter() {
            if support::node_orientation(*handle) == Orientation::Forward {
                formats::write_gfa_node(support::node_id(*handle), &record.sequence, output)?;
            }
        }

        // Links.
        for (handle, record) in self.records.iter() {
            let from = support::decode_node(*handle);
            for successor in record.successors.iter() {
                let to = support::decode_node(*successor);
                if self.records.contains_key(successor) && support::edge_is_canonical(from, to) {
                    formats::write_gfa_link(
                        (from.0.to_string().as_bytes(), from.1),
                        (to.0.to_string().as_bytes(), to.1),
                        output
                    )?;
                }
            }
        }

        // The reference path.
        let contig_name = self.ref_path.as_ref().map(|name| name.contig.clone()).unwrap_or(String::from("unknown"));
        if let (Some(ref_id), Some(ref_path), Some(ref_interval)) = (self.ref_id, self.ref_path.as_ref(), self.ref_interval.clone()) {
            let mut metadata = WalkMetadata::path_interval(ref_path, ref_interval);
            metadata.add_weight(self.paths[ref_id].weight);
            formats::write_gfa_walk(&self.paths[ref_id].path, &metadata, output)?;
        }

        // Other paths.
        let mut haplotype = 1;
        for (id, info) in self.paths.iter().enumerate() {
            if Some(id) == self.ref_id {
                continue;
            }
            let mut metadata = WalkMetadata::anonymous(haplotype, &contig_name, info.len);
            metadata.add_weight(info.weight);
            formats::write_gfa_walk(&info.path, &metadata, output)?;
            haplotype += 1;
        }

        Ok(())
    }
}

//-----------------------------------------------------------------------------

// Finds the offset of the reference path in the path index.
fn find_indexed_path(graph: &GBZ, path_index: &PathIndex, path_name: &FullPathName) -> Result<usize, String> {
    let metadata = graph.metadata().ok_or(
        String::from("The graph does not contain path metadata")
    )?;
    let path_ids = metadata.paths_for(&path_name.sample, &path_name.contig);
    if path_ids.len() != 1 {
        return Err(format!(
            "Found {} reference paths for sample {}, contig {}",
            path_ids.len(), path_name.sample, path_name.contig
        ));
    }
    path_index.path_to_offset(path_ids[0]).ok_or(format!(
        "Path {} has not been indexed for random access", path_name
    ))
}

// Returns the graph position and the path index position covering the given
// offset on the path.
fn query_position(graph: &GBZ, path_index: &PathIndex, index_offset: usize, query_offset: usize) -> Result<(GraphPosition, Pos), String> {
    let (mut path_offset, mut pos) = path_index.indexed_position(index_offset, query_offset).ok_or(
        String::from("The path has no indexed positions")
    )?;

    loop {
        let node_id = support::node_id(pos.node);
        let len = graph.sequence_len(node_id);
        if len == 0 {
            return Err(format!("The graph does not contain node {}", node_id));
        }
        if path_offset + len > query_offset {
            let graph_pos = GraphPosition {
                node: node_id,
                orientation: support::node_orientation(pos.node),
                offset: query_offset - path_offset,
            };
            return Ok((graph_pos, pos));
        }
        path_offset += len;
        let index: &crate::gbwt::GBWT = graph.as_ref();
        pos = index.forward(pos).ok_or(format!(
            "The path does not contain offset {}", query_offset
        ))?;
    }
}

// Returns a seed for every node covered by the interval: the node covering
// the start of the interval and the following nodes that end within it.
fn interval_seeds(graph: &GBZ, query_pos: GraphPosition, index_pos: Pos, interval: &Range<usize>) -> Result<Vec<Seed>, String> {
    let mut seeds: Vec<Seed> = vec![Seed::Position(query_pos)];

    let index: &crate::gbwt::GBWT = graph.as_ref();
    let mut path_offset = interval.start - query_pos.offset + graph.sequence_len(query_pos.node);
    let mut pos = index.forward(index_pos);
    while let Some(p) = pos {
        let node_id = support::node_id(p.node);
        let len = graph.sequence_len(node_id);
        if path_offset + len > interval.end {
            break;
        }
        seeds.push(Seed::Position(GraphPosition {
            node: node_id,
            orientation: support::node_orientation(p.node),
            offset: 0,
        }));
        path_offset += len;
        pos = index.forward(p);
    }

    Ok(seeds)
}

// The number of bp from the given position to the end of the node in the
// orientation of the record.
fn distance_to_end(record: &SubgraphRecord, record_orientation: Orientation, pos: &GraphPosition) -> usize {
    if pos.orientation == record_orientation {
        record.sequence_len() - pos.offset
    } else {
        pos.offset + 1
    }
}

// Extracts all node records within the given context of the seeds.
fn extract_context(graph: &GBZ, seeds: &[Seed], context: usize) -> Result<BTreeMap<usize, SubgraphRecord>, String> {
    let seed_nodes: HashMap<usize, Seed> = seeds.iter().map(|seed| (seed.node_id(), *seed)).collect();

    // Start the graph traversal from the seed nodes.
    let mut active: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::new(); // (distance, node id)
    for seed in seeds {
        active.push(Reverse((0, seed.node_id())));
    }

    // Traverse in both directions.
    let mut selected: BTreeMap<usize, SubgraphRecord> = BTreeMap::new();
    while let Some(Reverse((distance, node_id))) = active.pop() {
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            let handle = support::encode_node(node_id, orientation);
            if selected.contains_key(&handle) {
                continue;
            }
            let record = SubgraphRecord::new(graph, handle)?;
            let next_distance = match seed_nodes.get(&node_id) {
                Some(Seed::Node(_)) => 0,
                Some(Seed::Position(pos)) => distance_to_end(&record, orientation, pos),
                None => distance + record.sequence_len(),
            };
            if next_distance <= context {
                for successor in record.successors.iter() {
                    if !selected.contains_key(successor) {
                        active.push(Reverse((next_distance, support::node_id(*successor))));
                    }
                }
            }
            selected.insert(handle, record);
        }
    }

    Ok(selected)
}

//-----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PathInfo {
    path: Vec<usize>,
    len: usize,
    weight: Option<usize>,
}

impl PathInfo {
    fn new(path: Vec<usize>, len: usize) -> Self {
        PathInfo { path, len, weight: None }
    }

    fn weighted(path: Vec<usize>, len: usize) -> Self {
        PathInfo { path, len, weight: Some(1) }
    }

    fn increment_weight(&mut self) {
        if let Some(weight) = self.weight {
            self.weight = Some(weight + 1);
        }
    }
}

fn next_pos(pos: Pos, successors: &BTreeMap<usize, Vec<(Pos, bool)>>) -> Option<Pos> {
    let positions = successors.get(&pos.node)?;
    let (next, _) = positions[pos.offset];
    if next.node == ENDMARKER || !successors.contains_key(&next.node) {
        None
    } else {
        Some(next)
    }
}

// Extracts all paths in the subgraph. The second return value is
// (offset in the result, offset on that path) for the position `ref_pos`.
fn extract_paths(
    records: &BTreeMap<usize, SubgraphRecord>,
    ref_pos: Option<Pos>,
) -> Result<(Vec<PathInfo>, Option<(usize, usize)>), String> {
    // Successor positions for the records, with a flag for positions that
    // have a predecessor in the subgraph.
    let mut successors: BTreeMap<usize, Vec<(Pos, bool)>> = BTreeMap::new();
    for (handle, record) in records.iter() {
        let positions: Vec<(Pos, bool)> = record.positions.iter().map(|pos| (*pos, false)).collect();
        successors.insert(*handle, positions);
    }

    // Mark the positions that have predecessors in the subgraph.
    let keys: Vec<usize> = successors.keys().copied().collect();
    for handle in keys.iter() {
        let positions = successors.get(handle).unwrap().clone();
        for (pos, _) in positions.iter() {
            if let Some(value) = successors.get_mut(&pos.node) {
                if pos.offset < value.len() {
                    value[pos.offset].1 = true;
                }
            }
        }
    }

    // Extract all paths and note if one of them passes through `ref_pos`.
    let total_positions: usize = successors.values().map(|positions| positions.len()).sum();
    let mut result: Vec<PathInfo> = Vec::new();
    let mut ref_id_offset: Option<(usize, usize)> = None;
    for (handle, positions) in successors.iter() {
        for (offset, (_, has_predecessor)) in positions.iter().enumerate() {
            if *has_predecessor {
                continue;
            }
            let mut curr = Some(Pos::new(*handle, offset));
            let mut is_ref = false;
            let mut path: Vec<usize> = Vec::new();
            let mut len = 0;
            while let Some(pos) = curr {
                // A path cannot visit a position twice.
                if path.len() > total_positions {
                    return Err(String::from("Found a cyclic path in the subgraph"));
                }
                if Some(pos) == ref_pos {
                    ref_id_offset = Some((result.len(), path.len()));
                    is_ref = true;
                }
                path.push(pos.node);
                len += records.get(&pos.node).unwrap().sequence_len();
                curr = next_pos(pos, &successors);
            }
            if is_ref {
                if !support::encoded_path_is_canonical(&path) {
                    eprintln!("Warning: the reference path is not in canonical orientation");
                }
                result.push(PathInfo::new(path, len));
            } else if support::encoded_path_is_canonical(&path) {
                result.push(PathInfo::new(path, len));
            }
        }
    }

    if ref_pos.is_some() && ref_id_offset.is_none() {
        return Err(String::from("Could not find the reference path"));
    }
    Ok((result, ref_id_offset))
}

// Returns the distance in bp from the start of the path to the given position.
fn distance_to(records: &BTreeMap<usize, SubgraphRecord>, path: &[usize], path_offset: usize, node_offset: usize) -> usize {
    let mut result = node_offset;
    for handle in path.iter().take(path_offset) {
        result += records.get(handle).unwrap().sequence_len();
    }
    result
}

// Returns all distinct paths, using the weight field for storing their
// counts, and the updated reference path offset.
fn make_distinct(paths: Vec<PathInfo>, ref_id: Option<usize>) -> (Vec<PathInfo>, Option<usize>) {
    let ref_path = ref_id.map(|id| paths[id].path.clone());
    let mut paths = paths;
    paths.sort_unstable();

    let mut new_paths: Vec<PathInfo> = Vec::new();
    let mut new_ref_id: Option<usize> = None;
    for info in paths.iter() {
        if new_paths.is_empty() || new_paths.last().unwrap().path != info.path {
            if ref_path.as_deref() == Some(info.path.as_slice()) {
                new_ref_id = Some(new_paths.len());
            }
            new_paths.push(PathInfo::weighted(info.path.clone(), info.len));
        } else {
            new_paths.last_mut().unwrap().increment_weight();
        }
    }

    (new_paths, new_ref_id)
}

//-----------------------------------------------------------------------------
