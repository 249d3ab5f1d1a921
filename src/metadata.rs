//! Path metadata: structured path names for the path index.
//!
//! Each path has a name consisting of a sample name, a contig name, a
//! haplotype identifier, and a fragment index. Reference and generic paths
//! use [`crate::REF_SAMPLE`] as the sample name and store the actual path
//! name as the contig name. For fragmented paths, the fragment field stores
//! the starting offset of the fragment in the full path.

use crate::REF_SAMPLE;
use crate::headers::{Header, MetadataPayload};
use crate::support::StringArray;

use simple_sds::serialize::Serialize;

use std::collections::HashMap;
use std::fmt::Display;
use std::io::{Error, ErrorKind};
use std::io;

//-----------------------------------------------------------------------------

/// A structured path name with the names replaced by identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathName {
    /// Sample identifier.
    pub sample: usize,
    /// Contig identifier.
    pub contig: usize,
    /// Haplotype / phase number.
    pub haplotype: usize,
    /// Fragment index or starting offset.
    pub fragment: usize,
}

//-----------------------------------------------------------------------------

/// A structured path name with the actual names.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FullPathName {
    /// Sample name.
    pub sample: String,
    /// Contig name.
    pub contig: String,
    /// Haplotype / phase number.
    pub haplotype: usize,
    /// Fragment index or starting offset.
    pub fragment: usize,
}

impl FullPathName {
    /// Creates a name for a generic path with the given name.
    pub fn generic(name: &str) -> Self {
        FullPathName {
            sample: String::from(REF_SAMPLE),
            contig: String::from(name),
            haplotype: 0,
            fragment: 0,
        }
    }

    /// Creates a name for a haplotype path.
    pub fn haplotype(sample: &str, contig: &str, haplotype: usize, fragment: usize) -> Self {
        FullPathName {
            sample: String::from(sample),
            contig: String::from(contig),
            haplotype,
            fragment,
        }
    }

    /// Returns `true` if this is the name of a reference or generic path.
    pub fn is_reference(&self) -> bool {
        self.sample == REF_SAMPLE
    }
}

impl Display for FullPathName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}#{}@{}", self.sample, self.haplotype, self.contig, self.fragment)
    }
}

//-----------------------------------------------------------------------------

/// Metadata for the paths in a path index.
///
/// Path identifiers are offsets in the path list. Sample and contig names
/// are stored once and referred to by identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    header: Header<MetadataPayload>,
    path_names: Vec<PathName>,
    samples: StringArray,
    contigs: StringArray,
}

impl Metadata {
    /// Returns the number of paths.
    #[inline]
    pub fn paths(&self) -> usize {
        self.path_names.len()
    }

    /// Returns the number of distinct sample names.
    #[inline]
    pub fn samples(&self) -> usize {
        self.samples.len()
    }

    /// Returns the number of distinct contig names.
    #[inline]
    pub fn contigs(&self) -> usize {
        self.contigs.len()
    }

    /// Returns the name of the path, or [`None`] if there is no such path.
    pub fn path(&self, path_id: usize) -> Option<&PathName> {
        self.path_names.get(path_id)
    }

    /// Returns an iterator over the path names.
    pub fn path_iter(&self) -> impl Iterator<Item = &PathName> {
        self.path_names.iter()
    }

    /// Returns the sample name with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `sample_id >= self.samples()`.
    pub fn sample_name(&self, sample_id: usize) -> String {
        self.samples.string(sample_id)
    }

    /// Returns the contig name with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `contig_id >= self.contigs()`.
    pub fn contig_name(&self, contig_id: usize) -> String {
        self.contigs.string(contig_id)
    }

    /// Returns the identifier of the given sample name, or [`None`] if there is no such sample.
    pub fn find_sample(&self, name: &str) -> Option<usize> {
        self.samples.find(name)
    }

    /// Returns the identifier of the given contig name, or [`None`] if there is no such contig.
    pub fn find_contig(&self, name: &str) -> Option<usize> {
        self.contigs.find(name)
    }

    /// Returns the full name of the path, or [`None`] if there is no such path.
    pub fn full_path_name(&self, path_id: usize) -> Option<FullPathName> {
        let name = self.path(path_id)?;
        Some(FullPathName {
            sample: self.sample_name(name.sample),
            contig: self.contig_name(name.contig),
            haplotype: name.haplotype,
            fragment: name.fragment,
        })
    }

    /// Returns `true` if the path is a reference or generic path.
    ///
    /// Returns `false` if there is no such path.
    pub fn path_is_reference(&self, path_id: usize) -> bool {
        match self.path(path_id) {
            Some(name) => self.samples.bytes(name.sample) == REF_SAMPLE.as_bytes(),
            None => false,
        }
    }

    /// Returns the identifiers of all paths with the given sample and contig names.
    pub fn paths_for(&self, sample: &str, contig: &str) -> Vec<usize> {
        let sample_id = self.find_sample(sample);
        let contig_id = self.find_contig(contig);
        let (sample_id, contig_id) = match (sample_id, contig_id) {
            (Some(sample_id), Some(contig_id)) => (sample_id, contig_id),
            _ => return Vec::new(),
        };
        self.path_names.iter().enumerate()
            .filter(|(_, name)| name.sample == sample_id && name.contig == contig_id)
            .map(|(path_id, _)| path_id)
            .collect()
    }

    /// Returns the identifier of the path with the given full name, or [`None`] if there is no such path.
    ///
    /// The fragment field is ignored in the comparison.
    pub fn find_path(&self, name: &FullPathName) -> Option<usize> {
        let sample_id = self.find_sample(&name.sample)?;
        let contig_id = self.find_contig(&name.contig)?;
        self.path_names.iter().position(|path| {
            path.sample == sample_id && path.contig == contig_id && path.haplotype == name.haplotype
        })
    }
}

impl Serialize for Metadata {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.header.serialize(writer)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        let mut words: Vec<u64> = Vec::with_capacity(4 * self.path_names.len());
        for name in self.path_names.iter() {
            words.push(name.sample as u64);
            words.push(name.contig as u64);
            words.push(name.haplotype as u64);
            words.push(name.fragment as u64);
        }
        words.serialize(writer)?;
        self.samples.serialize(writer)?;
        self.contigs.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let header = Header::<MetadataPayload>::load(reader)?;
        if let Err(msg) = header.validate() {
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }

        let words = Vec::<u64>::load(reader)?;
        if words.len() != 4 * header.payload().paths as usize {
            return Err(Error::new(ErrorKind::InvalidData, "Metadata: Invalid path name count"));
        }
        let samples = StringArray::load(reader)?;
        let contigs = StringArray::load(reader)?;
        if samples.len() != header.payload().samples as usize {
            return Err(Error::new(ErrorKind::InvalidData, "Metadata: Invalid sample count"));
        }
        if contigs.len() != header.payload().contigs as usize {
            return Err(Error::new(ErrorKind::InvalidData, "Metadata: Invalid contig count"));
        }

        let mut path_names = Vec::with_capacity(words.len() / 4);
        for chunk in words.chunks_exact(4) {
            let name = PathName {
                sample: chunk[0] as usize,
                contig: chunk[1] as usize,
                haplotype: chunk[2] as usize,
                fragment: chunk[3] as usize,
            };
            if name.sample >= samples.len() || name.contig >= contigs.len() {
                return Err(Error::new(ErrorKind::InvalidData, "Metadata: Path name refers to an unknown sample or contig"));
            }
            path_names.push(name);
        }

        Ok(Metadata { header, path_names, samples, contigs })
    }

    fn size_in_elements(&self) -> usize {
        let words = 1 + 4 * self.path_names.len();
        self.header.size_in_elements() + words + self.samples.size_in_elements() + self.contigs.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

/// Builds path metadata during construction.
///
/// Paths are added to numbered construction jobs. The final path order is
/// determined by the jobs: all paths in job 0 in insertion order, then all
/// paths in job 1, and so on. This matches the sequence order in the merged
/// path index.
#[derive(Clone, Debug)]
pub struct MetadataBuilder {
    jobs: Vec<Vec<FullPathName>>,
}

impl MetadataBuilder {
    /// Creates a builder for the given number of jobs.
    pub fn new(num_jobs: usize) -> Self {
        MetadataBuilder {
            jobs: vec![Vec::new(); num_jobs],
        }
    }

    /// Adds a path name to the given job.
    ///
    /// Returns an error if the job does not exist.
    pub fn add_path(&mut self, job: usize, name: FullPathName) -> Result<(), String> {
        if job >= self.jobs.len() {
            return Err(format!("MetadataBuilder: Invalid job identifier {}", job));
        }
        self.jobs[job].push(name);
        Ok(())
    }

    /// Returns the number of paths added so far.
    pub fn paths(&self) -> usize {
        self.jobs.iter().map(|paths| paths.len()).sum()
    }

    /// Builds the metadata, consuming the builder.
    ///
    /// Sample and contig identifiers are assigned in the order of first occurrence.
    pub fn build(self) -> Metadata {
        let mut sample_ids: HashMap<String, usize> = HashMap::new();
        let mut contig_ids: HashMap<String, usize> = HashMap::new();
        let mut sample_names: Vec<String> = Vec::new();
        let mut contig_names: Vec<String> = Vec::new();
        let mut path_names: Vec<PathName> = Vec::new();

        for job in self.jobs {
            for name in job {
                let sample = *sample_ids.entry(name.sample.clone()).or_insert_with(|| {
                    sample_names.push(name.sample.clone());
                    sample_names.len() - 1
                });
                let contig = *contig_ids.entry(name.contig.clone()).or_insert_with(|| {
                    contig_names.push(name.contig.clone());
                    contig_names.len() - 1
                });
                path_names.push(PathName {
                    sample,
                    contig,
                    haplotype: name.haplotype,
                    fragment: name.fragment,
                });
            }
        }

        let payload = MetadataPayload {
            paths: path_names.len() as u64,
            samples: sample_names.len() as u64,
            contigs: contig_names.len() as u64,
        };
        Metadata {
            header: Header::new(payload),
            path_names,
            samples: StringArray::from(sample_names.as_slice()),
            contigs: StringArray::from(contig_names.as_slice()),
        }
    }
}

//-----------------------------------------------------------------------------
