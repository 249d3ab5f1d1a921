//! An index for random access to reference paths by sequence offsets.

use crate::gbwt::Pos;
use crate::gbz::GBZ;
use crate::metadata::FullPathName;

use simple_sds::ops::PredSucc;
use simple_sds::sparse_vector::{SparseVector, SparseBuilder};

use std::collections::HashMap;


//-----------------------------------------------------------------------------

/// An index for random access to reference and generic paths in a GBZ graph.
///
/// The index stores a sampled `(sequence offset, path index position)` pair
/// approximately once every `sample_interval` bp for each reference path.
/// A query for a sequence offset finds the last sampled position at or
/// before the offset with a predecessor query on an Elias–Fano encoded
/// sequence; the caller then walks forward from that position.
///
/// Indexed paths are identified by their offsets in this index, which range
/// from 0 to `path_count() - 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathIndex {
    // Maps path identifiers to index offsets.
    path_to_offset: HashMap<usize, usize>,

    // Maps index offsets to path identifiers.
    offset_to_path: Vec<usize>,

    // Sequence lengths for each indexed path in bp.
    path_lengths: Vec<usize>,

    // Indexed sequence positions for each path.
    sequence_positions: Vec<SparseVector>,

    // Path index positions corresponding to the indexed sequence positions.
    index_positions: Vec<Vec<Pos>>,
}

impl PathIndex {
    /// Default distance between indexed positions (in bp).
    pub const DEFAULT_INTERVAL: usize = 1024;

    /// Creates a new path index for the given GBZ graph.
    ///
    /// The index covers all reference and generic paths.
    ///
    /// # Arguments
    ///
    /// * `graph`: A GBZ graph.
    /// * `interval`: Approximate distance between indexed positions (in bp).
    /// * `verbose`: Print progress information to stderr.
    pub fn new(graph: &GBZ, interval: usize, verbose: bool) -> Result<Self, String> {
        if verbose {
            eprintln!("Building path index");
        }

        let reference_paths = graph.reference_positions(interval, verbose);
        if reference_paths.is_empty() {
            return Err(String::from("No reference paths to index"));
        }

        let mut path_to_offset: HashMap<usize, usize> = HashMap::with_capacity(reference_paths.len());
        let mut offset_to_path: Vec<usize> = Vec::with_capacity(reference_paths.len());
        let mut path_lengths: Vec<usize> = Vec::with_capacity(reference_paths.len());
        let mut sequence_positions: Vec<SparseVector> = Vec::with_capacity(reference_paths.len());
        let mut index_positions: Vec<Vec<Pos>> = Vec::with_capacity(reference_paths.len());
        for ref_path in reference_paths.iter() {
            path_to_offset.insert(ref_path.id, offset_to_path.len());
            offset_to_path.push(ref_path.id);
            path_lengths.push(ref_path.len);
            let mut sequence = SparseBuilder::new(ref_path.len + 1, ref_path.positions.len())
                .map_err(|x| x.to_string())?;
            let mut positions = Vec::with_capacity(ref_path.positions.len());
            for (sequence_pos, index_pos) in ref_path.positions.iter() {
                sequence.set(*sequence_pos);
                positions.push(*index_pos);
            }
            sequence_positions.push(SparseVector::try_from(sequence).map_err(|x| x.to_string())?);
            index_positions.push(positions);
        }

        Ok(PathIndex { path_to_offset, offset_to_path, path_lengths, sequence_positions, index_positions })
    }

    /// Returns the number of indexed paths.
    #[inline]
    pub fn path_count(&self) -> usize {
        self.sequence_positions.len()
    }

    /// Returns the index offset for the path with the given identifier.
    ///
    /// Returns [`None`] if the path has not been indexed.
    #[inline]
    pub fn path_to_offset(&self, path_id: usize) -> Option<usize> {
        self.path_to_offset.get(&path_id).copied()
    }

    /// Returns the path identifier for the given index offset.
    ///
    /// Returns [`None`] if there is no such path.
    #[inline]
    pub fn offset_to_path(&self, index_offset: usize) -> Option<usize> {
        self.offset_to_path.get(index_offset).copied()
    }

    /// Returns the index offset for the path with the given name.
    ///
    /// Returns [`None`] if the path does not exist or has not been indexed.
    pub fn find_path(&self, graph: &GBZ, path_name: &FullPathName) -> Option<usize> {
        let metadata = graph.metadata()?;
        let path_id = metadata.find_path(path_name)?;
        self.path_to_offset(path_id)
    }

    /// Returns the length of the indexed path in bp.
    ///
    /// Returns [`None`] if there is no such path.
    #[inline]
    pub fn path_length(&self, index_offset: usize) -> Option<usize> {
        self.path_lengths.get(index_offset).copied()
    }

    /// Returns the last indexed position at or before `query_offset` on the path.
    ///
    /// The return value consists of a sequence offset and a path index
    /// position. Returns [`None`] if there is no such path or no indexed
    /// position at or before the offset.
    ///
    /// # Arguments
    ///
    /// * `index_offset`: Offset of the path in this index.
    /// * `query_offset`: Sequence position on the path (in bp).
    pub fn indexed_position(&self, index_offset: usize, query_offset: usize) -> Option<(usize, Pos)> {
        let samples = self.sequence_positions.get(index_offset)?;
        let mut iter = samples.predecessor(query_offset);
        if let Some((sample_rank, sequence_offset)) = iter.next() {
            let index_pos = self.index_positions[index_offset][sample_rank];
            Some((sequence_offset, index_pos))
        } else {
            None
        }
    }
}

//-----------------------------------------------------------------------------
