//! Building a path index from GFA, and writing a graph back as GFA.
//!
//! Construction is done in several passes over a memory-mapped GFA file:
//!
//! 1. Record the segments and build a [`SequenceSource`], chopping long
//!    segments and translating segment names when necessary.
//! 2. Record the links and build a transient topology-only graph.
//! 3. Partition the graph into weakly connected components and the
//!    components into construction jobs.
//! 4. Assign the paths and walks to construction jobs and collect their
//!    metadata.
//! 5. Build a partial path index for each job, possibly in parallel, and
//!    merge the partial indexes in job order.
//!
//! The parsers work on byte slices of the mapped file and never load the
//! file into memory.

use crate::algorithms::{self, ConstructionJobs, HandleGraph};
use crate::formats::{self, WalkMetadata};
use crate::gbwt::{GBWT, GBWTBuilder};
use crate::gbz::GBZ;
use crate::internal::EmptyGraph;
use crate::metadata::{FullPathName, MetadataBuilder};
use crate::source::SequenceSource;
use crate::support::{self, Orientation};

use memmap2::Mmap;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use regex::Regex;

use std::fs::File;
use std::io::Write;
use std::ops::Range;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use std::io;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// File extension for GFA files.
pub const GFA_EXTENSION: &str = ".gfa";

/// Parameters for GFA parsing and path index construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GFAParsingParameters {
    /// Number of nodes per insertion batch. See [`GFAParsingParameters::automatic_batch_size`].
    pub batch_size: usize,

    /// Chop segments longer than this into multiple nodes. Use `0` to disable chopping.
    pub max_node_length: usize,

    /// Combine small consecutive components into jobs of at most
    /// `num_nodes / approximate_num_jobs` nodes. Value `0` is interpreted as `1`.
    pub approximate_num_jobs: usize,

    /// Try to run this many construction jobs in parallel. Value `0` is interpreted as `1`.
    pub parallel_jobs: usize,

    /// Determine the batch size automatically.
    ///
    /// If the longest path is `N` segments, the batch size will be the
    /// maximum of [`GFAParsingParameters::batch_size`] and
    /// `GBWTBuilder::MIN_SEQUENCES_PER_BATCH * (N + 1)`, but no more than
    /// the GFA file size in bytes. This ensures that each batch consists of
    /// a reasonable number of paths and their reverse complements.
    pub automatic_batch_size: bool,

    /// Print progress information to stderr.
    pub show_progress: bool,

    /// Regex used for parsing path names from P-lines.
    ///
    /// Each submatch is a field, with 0 corresponding to the entire name.
    /// See [`GFAParsingParameters::path_name_fields`].
    pub path_name_regex: String,

    /// Maps regex fields to path name components.
    ///
    /// Character `i` of the string maps submatch `i` to a component:
    /// `S` for sample, `C` for contig, `H` for haplotype, and `F` for
    /// fragment, case-insensitively. Any other character skips the field.
    /// Each component may occur only once.
    pub path_name_fields: String,
}

impl GFAParsingParameters {
    /// Default maximum node length.
    pub const MAX_NODE_LENGTH: usize = 1024;

    /// Default number of construction jobs to aim for.
    pub const APPROXIMATE_NUM_JOBS: usize = 32;

    /// Default regex for path names: a single field for the entire name.
    pub const DEFAULT_REGEX: &'static str = "(.*)";

    /// Default fields for path names: the entire name is the contig name.
    pub const DEFAULT_FIELDS: &'static str = "C";
}

impl Default for GFAParsingParameters {
    fn default() -> Self {
        GFAParsingParameters {
            batch_size: GBWTBuilder::INSERT_BATCH_SIZE,
            max_node_length: Self::MAX_NODE_LENGTH,
            approximate_num_jobs: Self::APPROXIMATE_NUM_JOBS,
            parallel_jobs: 1,
            automatic_batch_size: true,
            show_progress: false,
            path_name_regex: String::from(Self::DEFAULT_REGEX),
            path_name_fields: String::from(Self::DEFAULT_FIELDS),
        }
    }
}

//-----------------------------------------------------------------------------

/// Builds a path index and a sequence source from a GFA file.
///
/// The file may contain P-lines and/or W-lines. If it contains both,
/// P-lines are interpreted as reference paths with sample name
/// [`crate::REF_SAMPLE`] and the path name as the contig name. If there are
/// only P-lines, path names are parsed using the regex defined in the
/// parameters.
///
/// If there are segments longer than the maximum node length, they are
/// chopped into multiple nodes. If segment names are not positive integers,
/// they are translated into such identifiers. In both cases the sequence
/// source will contain a translation from segment names to node ranges.
pub fn gfa_to_gbwt<P: AsRef<Path>>(
    filename: P,
    parameters: &GFAParsingParameters
) -> Result<(GBWT, SequenceSource), String> {
    let start = Instant::now();
    let file = File::open(&filename).map_err(|err| {
        format!("Cannot open GFA file {}: {}", filename.as_ref().display(), err)
    })?;
    let file_len = file.metadata().map_err(|err| err.to_string())?.len() as usize;
    let mmap = if file_len > 0 {
        Some(unsafe { Mmap::map(&file) }.map_err(|err| {
            format!("Cannot memory map GFA file {}: {}", filename.as_ref().display(), err)
        })?)
    } else {
        None
    };
    let bytes: &[u8] = mmap.as_deref().unwrap_or(&[]);

    // Pass 1: Segments.
    let (source, stats) = parse_segments(bytes, parameters)?;
    if parameters.show_progress {
        eprintln!(
            "Parsed {} segments into {} nodes in {:.3} seconds",
            stats.segments, source.node_count(), start.elapsed().as_secs_f64()
        );
    }

    // Pass 2: Links.
    let graph = parse_links(bytes, &source)?;

    // Pass 3: Components and jobs.
    let size_bound = graph.node_count() / parameters.approximate_num_jobs.max(1);
    let jobs = algorithms::construction_jobs(&graph, size_bound);
    if parameters.show_progress {
        eprintln!("Partitioned {} components into {} jobs", jobs.components(), jobs.len());
    }

    // Pass 4: Paths and walks.
    let assignment = parse_paths(bytes, &source, &jobs, &stats, parameters)?;

    // Pass 5: Insertion and merging.
    let batch_size = batch_size(parameters, assignment.longest_path, file_len);
    let mut index = insert_and_merge(assignment.job_paths, batch_size, parameters)?;
    index.set_metadata(assignment.metadata.build())?;

    if parameters.show_progress {
        eprintln!(
            "Built a path index with {} paths in {:.3} seconds",
            index.paths(), start.elapsed().as_secs_f64()
        );
    }
    Ok((index, source))
}

/// Builds a GBZ graph from a GFA file.
///
/// This is a convenience wrapper over [`gfa_to_gbwt`] and [`GBZ::new`].
pub fn gfa_to_gbz<P: AsRef<Path>>(filename: P, parameters: &GFAParsingParameters) -> Result<GBZ, String> {
    let (index, source) = gfa_to_gbwt(filename, parameters)?;
    GBZ::new(index, &source)
}

//-----------------------------------------------------------------------------

// Line-level parsing utilities.

fn line_iter(bytes: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    bytes.split(|&byte| byte == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(number, line)| (number + 1, line))
}

fn split_fields(line: &[u8]) -> Vec<&[u8]> {
    line.split(|&byte| byte == b'\t').collect()
}

fn parse_usize(bytes: &[u8], what: &str, line: usize) -> Result<usize, String> {
    let string = std::str::from_utf8(bytes).map_err(|_| {
        format!("Line {}: Invalid {}", line, what)
    })?;
    string.parse::<usize>().map_err(|_| {
        format!("Line {}: Cannot parse {} from {}", line, what, string)
    })
}

fn parse_orientation(bytes: &[u8], line: usize) -> Result<Orientation, String> {
    match bytes {
        b"+" => Ok(Orientation::Forward),
        b"-" => Ok(Orientation::Reverse),
        _ => Err(format!("Line {}: Invalid orientation", line)),
    }
}

// Returns the name as a positive integer node identifier, if possible.
fn name_as_node_id(name: &[u8]) -> Option<usize> {
    let string = std::str::from_utf8(name).ok()?;
    let id = string.parse::<usize>().ok()?;
    if id > 0 { Some(id) } else { None }
}

//-----------------------------------------------------------------------------

// Pass 1: Segments.

#[derive(Clone, Debug, Default)]
struct FileStats {
    segments: usize,
    p_lines: usize,
    w_lines: usize,
}

impl FileStats {
    fn has_both_paths_and_walks(&self) -> bool {
        self.p_lines > 0 && self.w_lines > 0
    }
}

fn parse_segments(bytes: &[u8], parameters: &GFAParsingParameters) -> Result<(SequenceSource, FileStats), String> {
    // Determine if the segments must be translated before storing any of them.
    let mut stats = FileStats::default();
    let mut needs_translation = false;
    for (number, line) in line_iter(bytes) {
        match line.first() {
            Some(b'S') => {
                let fields = split_fields(line);
                if fields.len() < 3 {
                    return Err(format!("Line {}: Invalid segment line", number));
                }
                if fields[1].is_empty() {
                    return Err(format!("Line {}: Empty segment name", number));
                }
                if fields[2].is_empty() {
                    return Err(format!("Line {}: Empty sequence for segment {}", number, String::from_utf8_lossy(fields[1])));
                }
                stats.segments += 1;
                if name_as_node_id(fields[1]).is_none() {
                    needs_translation = true;
                }
                if parameters.max_node_length > 0 && fields[2].len() > parameters.max_node_length {
                    needs_translation = true;
                }
            }
            Some(b'P') => { stats.p_lines += 1; }
            Some(b'W') => { stats.w_lines += 1; }
            _ => {}
        }
    }

    // Store the segments.
    let mut source = SequenceSource::new();
    for (number, line) in line_iter(bytes) {
        if line.first() != Some(&b'S') {
            continue;
        }
        let fields = split_fields(line);
        let name = std::str::from_utf8(fields[1]).map_err(|_| {
            format!("Line {}: Invalid segment name", number)
        })?;
        if needs_translation {
            if source.segment_range(name).is_some() {
                return Err(format!("Line {}: Duplicate segment {}", number, name));
            }
            source.translate_segment(name, fields[2], parameters.max_node_length);
        } else {
            let id = name_as_node_id(fields[1]).unwrap();
            if source.has_node(id) {
                return Err(format!("Line {}: Duplicate segment {}", number, name));
            }
            source.add_node(id, fields[2]);
        }
    }

    Ok((source, stats))
}

//-----------------------------------------------------------------------------

// Pass 2: Links.

// Returns the handle for an endpoint of a link. The `is_from` endpoint of a
// chopped segment is its last node and the other endpoint its first node,
// with reverse orientation swapping the two.
fn link_endpoint(source: &SequenceSource, name: &[u8], orientation: Orientation, is_from: bool, line: usize) -> Result<usize, String> {
    let range = segment_nodes(source, name, line)?;
    let id = if (orientation == Orientation::Forward) == is_from {
        range.end - 1
    } else {
        range.start
    };
    Ok(support::encode_node(id, orientation))
}

// Returns the node range for a segment referenced by a path or a link.
fn segment_nodes(source: &SequenceSource, name: &[u8], line: usize) -> Result<Range<usize>, String> {
    if source.uses_translation() {
        let name = std::str::from_utf8(name).map_err(|_| {
            format!("Line {}: Invalid segment name", line)
        })?;
        source.segment_range(name).ok_or(format!("Line {}: Unknown segment {}", line, name))
    } else {
        let id = name_as_node_id(name).ok_or_else(|| {
            format!("Line {}: Invalid segment name {}", line, String::from_utf8_lossy(name))
        })?;
        if !source.has_node(id) {
            return Err(format!("Line {}: Unknown segment {}", line, id));
        }
        Ok(id..id + 1)
    }
}

fn parse_links(bytes: &[u8], source: &SequenceSource) -> Result<EmptyGraph, String> {
    let mut graph = EmptyGraph::new();
    for node_id in source.node_iter() {
        graph.create_node(node_id);
    }

    // Consecutive nodes of a chopped segment are linked implicitly.
    for (_, range) in source.translation_iter() {
        for id in range.start..range.end - 1 {
            graph.create_edge(
                support::encode_node(id, Orientation::Forward),
                support::encode_node(id + 1, Orientation::Forward),
            )?;
        }
    }

    for (number, line) in line_iter(bytes) {
        if line.first() != Some(&b'L') {
            continue;
        }
        let fields = split_fields(line);
        if fields.len() < 6 {
            return Err(format!("Line {}: Invalid link line", number));
        }
        if fields[5] != b"*" && fields[5] != b"0M" {
            return Err(format!("Line {}: Unsupported overlap {}", number, String::from_utf8_lossy(fields[5])));
        }
        let from_orientation = parse_orientation(fields[2], number)?;
        let to_orientation = parse_orientation(fields[4], number)?;
        let from = link_endpoint(source, fields[1], from_orientation, true, number)?;
        let to = link_endpoint(source, fields[3], to_orientation, false, number)?;
        graph.create_edge(from, to)?;
    }

    graph.remove_duplicate_edges();
    Ok(graph)
}

//-----------------------------------------------------------------------------

// Pass 4: Paths and walks.

struct PathAssignment {
    // Encoded paths for each job, in file order.
    job_paths: Vec<Vec<Vec<usize>>>,
    metadata: MetadataBuilder,
    // Length of the longest path in segments.
    longest_path: usize,
}

// Maps regex submatches to path name components.
#[derive(Clone, Debug, Default)]
struct NameFields {
    sample: Option<usize>,
    contig: Option<usize>,
    haplotype: Option<usize>,
    fragment: Option<usize>,
}

impl NameFields {
    fn new(fields: &str) -> Result<Self, String> {
        let mut result = NameFields::default();
        for (submatch, value) in fields.chars().enumerate() {
            let field = match value.to_ascii_uppercase() {
                'S' => &mut result.sample,
                'C' => &mut result.contig,
                'H' => &mut result.haplotype,
                'F' => &mut result.fragment,
                _ => continue,
            };
            if field.is_some() {
                return Err(format!("Duplicate path name field {}", value));
            }
            *field = Some(submatch);
        }
        Ok(result)
    }
}

// Parses a path name with the given regex and field assignments.
//
// A missing submatch leaves the field at its default value, while an empty
// submatch yields an empty string. Empty values for the numeric fields are
// errors.
fn parse_path_name(name: &str, regex: &Regex, fields: &NameFields, line: usize) -> Result<FullPathName, String> {
    let captures = regex.captures(name).ok_or(format!(
        "Line {}: Path name {} does not match the name regex", line, name
    ))?;
    let submatch = |index: Option<usize>| -> Option<&str> {
        captures.get(index?).map(|value| value.as_str())
    };

    let mut result = FullPathName::generic("");
    if let Some(value) = submatch(fields.sample) {
        result.sample = String::from(value);
    }
    if let Some(value) = submatch(fields.contig) {
        result.contig = String::from(value);
    }
    if let Some(value) = submatch(fields.haplotype) {
        result.haplotype = value.parse::<usize>().map_err(|_| {
            format!("Line {}: Cannot parse haplotype from {}", line, value)
        })?;
    }
    if let Some(value) = submatch(fields.fragment) {
        result.fragment = value.parse::<usize>().map_err(|_| {
            format!("Line {}: Cannot parse fragment from {}", line, value)
        })?;
    }
    Ok(result)
}

// Appends the nodes visited by an oriented segment to the path.
fn append_segment(source: &SequenceSource, name: &[u8], orientation: Orientation, path: &mut Vec<usize>, line: usize) -> Result<(), String> {
    let range = segment_nodes(source, name, line)?;
    match orientation {
        Orientation::Forward => {
            for id in range {
                path.push(support::encode_node(id, Orientation::Forward));
            }
        }
        Orientation::Reverse => {
            for id in range.rev() {
                path.push(support::encode_node(id, Orientation::Reverse));
            }
        }
    }
    Ok(())
}

// Parses the steps of a P-line. Returns the path and its length in segments.
fn parse_path_steps(source: &SequenceSource, steps: &[u8], line: usize) -> Result<(Vec<usize>, usize), String> {
    let mut path: Vec<usize> = Vec::new();
    let mut segments = 0;
    for step in steps.split(|&byte| byte == b',') {
        if step.len() < 2 {
            return Err(format!("Line {}: Invalid path step", line));
        }
        let orientation = match step.last() {
            Some(b'+') => Orientation::Forward,
            Some(b'-') => Orientation::Reverse,
            _ => return Err(format!("Line {}: Invalid orientation in a path step", line)),
        };
        append_segment(source, &step[..step.len() - 1], orientation, &mut path, line)?;
        segments += 1;
    }
    Ok((path, segments))
}

// Parses the steps of a W-line. Returns the path and its length in segments.
fn parse_walk_steps(source: &SequenceSource, steps: &[u8], line: usize) -> Result<(Vec<usize>, usize), String> {
    let mut path: Vec<usize> = Vec::new();
    let mut segments = 0;
    let mut offset = 0;
    while offset < steps.len() {
        let orientation = match steps[offset] {
            b'>' => Orientation::Forward,
            b'<' => Orientation::Reverse,
            _ => return Err(format!("Line {}: Invalid orientation in a walk", line)),
        };
        let start = offset + 1;
        let mut end = start;
        while end < steps.len() && steps[end] != b'>' && steps[end] != b'<' {
            end += 1;
        }
        if start == end {
            return Err(format!("Line {}: Empty segment name in a walk", line));
        }
        append_segment(source, &steps[start..end], orientation, &mut path, line)?;
        segments += 1;
        offset = end;
    }
    Ok((path, segments))
}

fn parse_paths(
    bytes: &[u8],
    source: &SequenceSource,
    jobs: &ConstructionJobs,
    stats: &FileStats,
    parameters: &GFAParsingParameters
) -> Result<PathAssignment, String> {
    let regex = Regex::new(&format!("^(?:{})$", parameters.path_name_regex))
        .map_err(|err| format!("Invalid path name regex: {}", err))?;
    let fields = NameFields::new(&parameters.path_name_fields)?;
    let references_only = stats.has_both_paths_and_walks();

    let mut result = PathAssignment {
        job_paths: vec![Vec::new(); jobs.len()],
        metadata: MetadataBuilder::new(jobs.len()),
        longest_path: 0,
    };

    for (number, line) in line_iter(bytes) {
        let (name, path, segments) = match line.first() {
            Some(b'P') => {
                let fields_p = split_fields(line);
                if fields_p.len() < 3 {
                    return Err(format!("Line {}: Invalid path line", number));
                }
                let name = std::str::from_utf8(fields_p[1]).map_err(|_| {
                    format!("Line {}: Invalid path name", number)
                })?;
                let name = if references_only {
                    FullPathName::generic(name)
                } else {
                    parse_path_name(name, &regex, &fields, number)?
                };
                let (path, segments) = parse_path_steps(source, fields_p[2], number)?;
                (name, path, segments)
            }
            Some(b'W') => {
                let fields_w = split_fields(line);
                if fields_w.len() < 7 {
                    return Err(format!("Line {}: Invalid walk line", number));
                }
                let sample = std::str::from_utf8(fields_w[1]).map_err(|_| {
                    format!("Line {}: Invalid sample name", number)
                })?;
                let haplotype = parse_usize(fields_w[2], "haplotype", number)?;
                let contig = std::str::from_utf8(fields_w[3]).map_err(|_| {
                    format!("Line {}: Invalid contig name", number)
                })?;
                let start = parse_usize(fields_w[4], "interval start", number)?;
                let name = FullPathName::haplotype(sample, contig, haplotype, start);
                let (path, segments) = parse_walk_steps(source, fields_w[6], number)?;
                (name, path, segments)
            }
            _ => continue,
        };

        if path.is_empty() {
            return Err(format!("Line {}: Empty path", number));
        }
        result.longest_path = result.longest_path.max(segments);

        let first_node = support::node_id(path[0]);
        let job = match jobs.job(first_node) {
            Some(job) if job < jobs.len() => job,
            _ => {
                eprintln!("Warning: Line {}: Path {} starts outside the graph components", number, name);
                continue;
            }
        };
        result.job_paths[job].push(path);
        result.metadata.add_path(job, name)?;
    }

    Ok(result)
}

//-----------------------------------------------------------------------------

// Pass 5: Insertion and merging.

fn batch_size(parameters: &GFAParsingParameters, longest_path: usize, file_len: usize) -> usize {
    if !parameters.automatic_batch_size {
        return parameters.batch_size;
    }
    let batch = parameters.batch_size.max(GBWTBuilder::MIN_SEQUENCES_PER_BATCH * (longest_path + 1));
    batch.min(file_len.max(1))
}

fn insert_and_merge(
    job_paths: Vec<Vec<Vec<usize>>>,
    batch_size: usize,
    parameters: &GFAParsingParameters
) -> Result<GBWT, String> {
    let num_threads = parameters.parallel_jobs.max(1).min(job_paths.len().max(1));
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|err| format!("Cannot create a thread pool: {}", err))?;

    // Progress output is the only side effect shared by the jobs.
    let progress = Mutex::new(());
    let partial: Vec<Result<GBWT, String>> = pool.install(|| {
        job_paths.par_iter().enumerate().map(|(job, paths)| {
            if parameters.show_progress && !paths.is_empty() {
                let _guard = progress.lock().unwrap();
                eprintln!("Job {}: Inserting {} paths", job, paths.len());
            }
            let mut builder = GBWTBuilder::with_batch_size(batch_size);
            for path in paths {
                builder.insert(path)?;
            }
            Ok(builder.finish())
        }).collect()
    });

    // A failed job aborts the construction only after all jobs have finished.
    let mut parts: Vec<GBWT> = Vec::with_capacity(partial.len());
    for result in partial {
        parts.push(result?);
    }
    GBWT::merge(parts)
}

//-----------------------------------------------------------------------------

/// Writes the graph as GFA in a normalized form.
///
/// The lines are ordered in the following way:
///
/// 1. S-lines ordered by node identifiers.
/// 2. L-lines in canonical orientation, ordered by
///    `(from id, from orientation, to id, to orientation)`.
///    All overlaps are `*`.
/// 3. P-lines for paths with sample name [`crate::REF_SAMPLE`], ordered by
///    path identifiers.
/// 4. W-lines for the remaining paths, ordered by path identifiers.
///
/// If the path index does not contain path metadata, all paths are written
/// as P-lines named by their path identifiers.
pub fn gbwt_to_gfa<T: Write>(graph: &GBZ, output: &mut T) -> io::Result<()> {
    formats::write_gfa_header(None, output)?;

    // Segments.
    for node_id in graph.node_iter() {
        // Nodes returned by the iterator always have sequences.
        formats::write_gfa_node(node_id, graph.sequence(node_id).unwrap(), output)?;
    }

    // Links.
    for node_id in graph.node_iter() {
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            if let Some(iter) = graph.successors(node_id, orientation) {
                for to in iter {
                    if support::edge_is_canonical((node_id, orientation), to) {
                        formats::write_gfa_link(
                            (node_id.to_string().as_bytes(), orientation),
                            (to.0.to_string().as_bytes(), to.1),
                            output
                        )?;
                    }
                }
            }
        }
    }

    // Paths.
    match graph.metadata() {
        Some(metadata) => {
            for path_id in 0..metadata.paths() {
                if !metadata.path_is_reference(path_id) {
                    continue;
                }
                if let (Some(name), Some(path)) = (metadata.full_path_name(path_id), graph.path(path_id, Orientation::Forward)) {
                    formats::write_gfa_path(name.contig.as_bytes(), &path, output)?;
                }
            }
            for path_id in 0..metadata.paths() {
                if metadata.path_is_reference(path_id) {
                    continue;
                }
                if let Some(path) = graph.path(path_id, Orientation::Forward) {
                    let len: usize = path.iter().map(|&handle| graph.sequence_len(support::node_id(handle))).sum();
                    if let Some(walk_metadata) = WalkMetadata::full_path(metadata, path_id, len) {
                        formats::write_gfa_walk(&path, &walk_metadata, output)?;
                    }
                }
            }
        }
        None => {
            for path_id in 0..graph.paths() {
                if let Some(path) = graph.path(path_id, Orientation::Forward) {
                    formats::write_gfa_path(path_id.to_string().as_bytes(), &path, output)?;
                }
            }
        }
    }

    Ok(())
}

//-----------------------------------------------------------------------------
