//! Writing graphs in the GFA format.
//!
//! These functions support line-by-line writing of GFA version 1.1:
//!
//! * [`write_gfa_header`]: Write the header line.
//! * [`write_gfa_segment`], [`write_gfa_node`]: Write a segment line.
//! * [`write_gfa_link`]: Write a link line for an edge.
//! * [`write_gfa_path`]: Write a path line.
//! * [`write_gfa_walk`]: Write a walk line.
//!
//! A walk line contains metadata, which is stored in a [`WalkMetadata`]
//! object: a structured path name, the end position of the path, and an
//! optional weight. Weights represent the number of duplicate paths
//! collapsed into a single line and are stored as tag `WT` of type `i`.

use crate::metadata::{FullPathName, Metadata};
use crate::support::{self, Orientation};

use std::io::{self, Write};
use std::ops::Range;


//-----------------------------------------------------------------------------

/// Metadata for a walk line in a GFA file.
pub struct WalkMetadata {
    // Structured name with a sample name, contig name, haplotype / phase
    // number, and starting offset.
    name: FullPathName,

    // Past-the-end offset of the path.
    end: usize,

    // Optional weight for the path, representing the number of identical
    // paths collapsed into a single line.
    weight: Option<usize>,
}

impl WalkMetadata {
    /// Creates new metadata for an interval of a path.
    pub fn path_interval(path_name: &FullPathName, interval: Range<usize>) -> Self {
        let mut name = path_name.clone();
        let end = name.fragment + interval.end;
        name.fragment += interval.start;
        WalkMetadata { name, end, weight: None }
    }

    /// Creates new metadata for a full path using path index metadata.
    ///
    /// Returns [`None`] if the path does not exist.
    pub fn full_path(metadata: &Metadata, path_id: usize, len: usize) -> Option<Self> {
        let name = metadata.full_path_name(path_id)?;
        let end = name.fragment + len;
        Some(WalkMetadata { name, end, weight: None })
    }

    /// Creates new metadata for a haplotype of unknown origin.
    pub fn anonymous(haplotype: usize, contig: &str, len: usize) -> Self {
        let name = FullPathName::haplotype("unknown", contig, haplotype, 0);
        WalkMetadata { name, end: len, weight: None }
    }

    /// Adds a weight to the metadata.
    pub fn add_weight(&mut self, weight: Option<usize>) {
        self.weight = weight;
    }
}

//-----------------------------------------------------------------------------

/// Writes the GFA header line.
///
/// The header line may contain a list of reference sample names.
/// Following the convention set by vg, the names are stored as a string in
/// the `RS` tag of type `Z`, separated by single spaces.
pub fn write_gfa_header<T: Write>(reference_samples: Option<&str>, output: &mut T) -> io::Result<()> {
    let header = if let Some(sample_names) = reference_samples {
        format!("H\tVN:Z:1.1\tRS:Z:{}\n", sample_names)
    } else {
        "H\tVN:Z:1.1\n".to_string()
    };
    output.write_all(header.as_bytes())?;
    Ok(())
}

/// Writes a GFA segment line corresponding to a segment with a string name.
pub fn write_gfa_segment<T: Write>(name: &[u8], sequence: &[u8], output: &mut T) -> io::Result<()> {
    output.write_all(b"S\t")?;
    output.write_all(name)?;
    output.write_all(b"\t")?;
    output.write_all(sequence)?;
    output.write_all(b"\n")?;
    Ok(())
}

/// Writes a GFA segment line corresponding to a node with an integer identifier.
pub fn write_gfa_node<T: Write>(node_id: usize, sequence: &[u8], output: &mut T) -> io::Result<()> {
    write_gfa_segment(node_id.to_string().as_bytes(), sequence, output)
}

/// Writes a GFA link line corresponding to an edge between two oriented segments.
pub fn write_gfa_link<T: Write>(
    from: (&[u8], Orientation),
    to: (&[u8], Orientation),
    output: &mut T
) -> io::Result<()> {
    output.write_all(b"L\t")?;
    output.write_all(from.0)?;
    match from.1 {
        Orientation::Forward => output.write_all(b"\t+\t")?,
        Orientation::Reverse => output.write_all(b"\t-\t")?,
    }
    output.write_all(to.0)?;
    match to.1 {
        Orientation::Forward => output.write_all(b"\t+\t*\n")?,
        Orientation::Reverse => output.write_all(b"\t-\t*\n")?,
    }
    Ok(())
}

/// Writes a GFA path line for a path of encoded handles.
pub fn write_gfa_path<T: Write>(name: &[u8], path: &[usize], output: &mut T) -> io::Result<()> {
    let mut buffer: Vec<u8> = Vec::new();
    buffer.extend_from_slice(b"P\t");
    buffer.extend_from_slice(name);
    buffer.push(b'\t');
    for (rank, handle) in path.iter().enumerate() {
        if rank > 0 {
            buffer.push(b',');
        }
        buffer.extend_from_slice(support::node_id(*handle).to_string().as_bytes());
        match support::node_orientation(*handle) {
            Orientation::Forward => buffer.push(b'+'),
            Orientation::Reverse => buffer.push(b'-'),
        }
    }
    buffer.extend_from_slice(b"\t*\n");
    output.write_all(&buffer)?;
    Ok(())
}

/// Writes a GFA walk line for a path of encoded handles.
pub fn write_gfa_walk<T: Write>(path: &[usize], metadata: &WalkMetadata, output: &mut T) -> io::Result<()> {
    let mut buffer: Vec<u8> = Vec::new();
    buffer.extend_from_slice(b"W\t");
    buffer.extend_from_slice(metadata.name.sample.as_bytes());
    buffer.push(b'\t');
    buffer.extend_from_slice(metadata.name.haplotype.to_string().as_bytes());
    buffer.push(b'\t');
    buffer.extend_from_slice(metadata.name.contig.as_bytes());
    buffer.push(b'\t');
    buffer.extend_from_slice(metadata.name.fragment.to_string().as_bytes());
    buffer.push(b'\t');
    buffer.extend_from_slice(metadata.end.to_string().as_bytes());
    buffer.push(b'\t');
    for handle in path.iter() {
        match support::node_orientation(*handle) {
            Orientation::Forward => buffer.push(b'>'),
            Orientation::Reverse => buffer.push(b'<'),
        }
        buffer.extend_from_slice(support::node_id(*handle).to_string().as_bytes());
    }
    if let Some(weight) = metadata.weight {
        buffer.extend_from_slice(b"\tWT:i:");
        buffer.extend_from_slice(weight.to_string().as_bytes());
    }
    buffer.push(b'\n');
    output.write_all(&buffer)?;
    Ok(())
}

//-----------------------------------------------------------------------------
