//! Node sequences and the node-to-segment translation for a GBZ graph.

use crate::headers::{Header, GraphPayload};
use crate::shared::SharedMemory;
use crate::source::SequenceSource;
use crate::support::StringArray;

use simple_sds::ops::{BitVec, Select};
use simple_sds::serialize::Serialize;
use simple_sds::sparse_vector::{SparseVector, SparseBuilder, OneIter};

use std::io::{Error, ErrorKind, Read, Write};
use std::iter::FusedIterator;
use std::ops::Range;
use std::io;

//-----------------------------------------------------------------------------

/// Where the sequence data of a graph is placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Private memory owned by the graph.
    Private,
    /// A new shared memory segment with the given name, owned by this process.
    SharedOwner(String),
    /// An existing shared memory segment with the given name.
    SharedMapper(String),
}

// Sequence data in private memory or in a shared memory segment.
#[derive(Debug)]
enum ByteStore {
    Private(Vec<u8>),
    Shared(SharedMemory),
}

impl ByteStore {
    fn as_bytes(&self) -> &[u8] {
        match self {
            ByteStore::Private(data) => data,
            ByteStore::Shared(segment) => segment.as_bytes(),
        }
    }

    fn len(&self) -> usize {
        self.as_bytes().len()
    }
}

// Copies of shared-backed data are placed in private memory.
impl Clone for ByteStore {
    fn clone(&self) -> Self {
        ByteStore::Private(self.as_bytes().to_vec())
    }
}

impl PartialEq for ByteStore {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ByteStore {}

//-----------------------------------------------------------------------------

/// Node sequences and an optional node-to-segment translation.
///
/// The graph stores a sequence for every node identifier in the range from
/// the smallest to the largest identifier. Sequences for unused identifiers
/// are empty. Sequence identifier `id` corresponds to node identifier
/// `id + min_id`. When the translation is present, each segment name
/// corresponds to a range of node identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    header: Header<GraphPayload>,
    // Cumulative lengths of the sequences, with `sequences() + 1` values.
    offsets: Vec<u64>,
    data: ByteStore,
    segments: StringArray,
    // Set bits at the first node identifier of each segment; the universe
    // is the past-the-end node identifier.
    mapping: SparseVector,
}

impl Graph {
    /// Builds a graph from a sequence source.
    ///
    /// # Arguments
    ///
    /// * `source`: Node sequences and a possible segment translation.
    /// * `placement`: Where to place the sequence data.
    pub fn new(source: &SequenceSource, placement: Placement) -> Result<Self, String> {
        let min_id = source.min_node_id().unwrap_or(1);
        let max_id = source.max_node_id().unwrap_or(0);
        let sequence_count = if source.is_empty() { 0 } else { max_id - min_id + 1 };

        let mut offsets: Vec<u64> = Vec::with_capacity(sequence_count + 1);
        let mut data: Vec<u8> = Vec::with_capacity(source.total_len());
        offsets.push(0);
        for id in min_id..min_id + sequence_count {
            if let Some(sequence) = source.sequence(id) {
                data.extend_from_slice(sequence);
            }
            offsets.push(data.len() as u64);
        }

        let mut header = Header::new(GraphPayload {
            sequences: sequence_count as u64,
            min_id: min_id as u64,
        });
        let (segments, mapping) = if source.uses_translation() {
            header.set(GraphPayload::FLAG_TRANSLATION);
            source.invert_translation()?
        } else {
            let builder = SparseBuilder::new(0, 0).map_err(|x| x.to_string())?;
            (StringArray::default(), SparseVector::try_from(builder).map_err(|x| x.to_string())?)
        };

        let data = Self::place(data, &placement)?;
        Ok(Graph { header, offsets, data, segments, mapping })
    }

    fn place(data: Vec<u8>, placement: &Placement) -> Result<ByteStore, String> {
        match placement {
            Placement::Private => Ok(ByteStore::Private(data)),
            Placement::SharedOwner(name) => {
                let segment = SharedMemory::create(name, &data)?;
                Ok(ByteStore::Shared(segment))
            }
            Placement::SharedMapper(name) => {
                let segment = SharedMemory::open(name)?;
                if segment.len() != data.len() {
                    return Err(format!(
                        "Graph: Shared memory segment {} has {} bytes, expected {}",
                        name, segment.len(), data.len()
                    ));
                }
                Ok(ByteStore::Shared(segment))
            }
        }
    }

    /// Moves the sequence data to the given placement.
    pub fn set_placement(&mut self, placement: Placement) -> Result<(), String> {
        if matches!(self.data, ByteStore::Private(_)) && placement == Placement::Private {
            return Ok(());
        }
        let data = self.data.as_bytes().to_vec();
        self.data = Self::place(data, &placement)?;
        Ok(())
    }

    /// Returns `true` if the sequence data lives in a shared memory segment.
    pub fn is_shared(&self) -> bool {
        matches!(self.data, ByteStore::Shared(_))
    }
}

/// Sequences.
impl Graph {
    /// Returns the number of sequences, including gaps in the node identifier space.
    #[inline]
    pub fn sequences(&self) -> usize {
        self.header.payload().sequences as usize
    }

    /// Returns `true` if the graph is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequences() == 0
    }

    /// Returns the smallest node identifier in the graph.
    #[inline]
    pub fn min_id(&self) -> usize {
        self.header.payload().min_id as usize
    }

    /// Returns the sequence identifier for a node identifier, or [`None`] if out of range.
    #[inline]
    pub fn node_to_sequence(&self, node_id: usize) -> Option<usize> {
        if node_id < self.min_id() || node_id >= self.min_id() + self.sequences() {
            None
        } else {
            Some(node_id - self.min_id())
        }
    }

    /// Returns the sequence with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.sequences()`.
    pub fn sequence(&self, id: usize) -> &[u8] {
        &self.data.as_bytes()[self.offsets[id] as usize..self.offsets[id + 1] as usize]
    }

    /// Returns the length of the sequence with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.sequences()`.
    #[inline]
    pub fn sequence_len(&self, id: usize) -> usize {
        (self.offsets[id + 1] - self.offsets[id]) as usize
    }

    /// Returns the total length of the sequences.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.data.len()
    }
}

/// Segments.
impl Graph {
    /// Returns `true` if the graph contains a node-to-segment translation.
    #[inline]
    pub fn has_translation(&self) -> bool {
        self.header.is_set(GraphPayload::FLAG_TRANSLATION)
    }

    /// Returns the number of segments in the translation.
    #[inline]
    pub fn segments(&self) -> usize {
        self.segments.len()
    }

    /// Returns the name of the segment with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.segments()`.
    #[inline]
    pub fn segment_name(&self, id: usize) -> &[u8] {
        self.segments.bytes(id)
    }

    /// Returns the range of node identifiers corresponding to the segment.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.segments()`.
    pub fn segment_nodes(&self, id: usize) -> Range<usize> {
        let mut iter = self.mapping.select_iter(id);
        let (_, start) = iter.next().unwrap();
        let end = if id + 1 < self.segments() {
            iter.next().unwrap().1
        } else {
            self.mapping.len()
        };
        start..end
    }

    /// Returns an iterator over the segments in the translation.
    pub fn segment_iter(&self) -> SegmentIter<'_> {
        let mut iter = self.mapping.one_iter();
        let first_node = iter.next().map(|(_, value)| value).unwrap_or(0);
        SegmentIter {
            parent: self,
            iter,
            next: (0, first_node),
            limit: (self.segments(), self.mapping.len()),
        }
    }
}

//-----------------------------------------------------------------------------

impl Serialize for Graph {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.header.serialize(writer)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.offsets.serialize(writer)?;
        self.data.as_bytes().to_vec().serialize(writer)?;
        self.segments.serialize(writer)?;
        self.mapping.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let header = Header::<GraphPayload>::load(reader)?;
        if let Err(msg) = header.validate() {
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }

        let offsets = Vec::<u64>::load(reader)?;
        if offsets.len() != header.payload().sequences as usize + 1 {
            return Err(Error::new(ErrorKind::InvalidData, "Graph: Offset count does not match the sequence count"));
        }
        if offsets.first() != Some(&0) || offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(Error::new(ErrorKind::InvalidData, "Graph: Invalid sequence offsets"));
        }

        let data = Vec::<u8>::load(reader)?;
        if offsets.last().copied().unwrap_or(0) as usize != data.len() {
            return Err(Error::new(ErrorKind::InvalidData, "Graph: Sequence offsets do not match the data"));
        }

        let segments = StringArray::load(reader)?;
        if header.is_set(GraphPayload::FLAG_TRANSLATION) == segments.is_empty() {
            return Err(Error::new(ErrorKind::InvalidData, "Graph: Translation flag does not match the presence of segment names"));
        }

        let mapping = SparseVector::load(reader)?;
        if header.is_set(GraphPayload::FLAG_TRANSLATION) {
            if mapping.count_ones() != segments.len() {
                return Err(Error::new(ErrorKind::InvalidData, "Graph: Node-to-segment mapping does not match the number of segments"));
            }
        } else if mapping.count_ones() != 0 {
            return Err(Error::new(ErrorKind::InvalidData, "Graph: Translation flag does not match the presence of node-to-segment mapping"));
        }

        Ok(Graph {
            header,
            offsets,
            data: ByteStore::Private(data),
            segments,
            mapping,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.header.size_in_elements()
            + self.offsets.size_in_elements()
            + self.data.as_bytes().to_vec().size_in_elements()
            + self.segments.size_in_elements()
            + self.mapping.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

// The legacy file format: a 16-byte tag followed by the counts and the raw
// arrays. Only used for the two-file serialization of a GBZ.

const LEGACY_TAG: &[u8; 16] = b"GBWTGraph\0\0\0\0\0\0\0";
const LEGACY_VERSION: u64 = 1;
const LEGACY_FLAG_TRANSLATION: u64 = 0x0001;

fn write_u64<T: Write>(writer: &mut T, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_u64<T: Read>(reader: &mut T) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

impl Graph {
    /// Writes the graph to the given writer in the legacy file format.
    pub fn write_legacy<T: Write>(&self, writer: &mut T) -> io::Result<()> {
        writer.write_all(LEGACY_TAG)?;
        write_u64(writer, LEGACY_VERSION)?;
        let flags = if self.has_translation() { LEGACY_FLAG_TRANSLATION } else { 0 };
        write_u64(writer, flags)?;
        write_u64(writer, self.header.payload().sequences)?;
        write_u64(writer, self.header.payload().min_id)?;

        for offset in self.offsets.iter() {
            write_u64(writer, *offset)?;
        }
        writer.write_all(self.data.as_bytes())?;

        write_u64(writer, self.segments() as u64)?;
        for id in 0..self.segments() {
            let name = self.segment_name(id);
            let nodes = self.segment_nodes(id);
            write_u64(writer, name.len() as u64)?;
            writer.write_all(name)?;
            write_u64(writer, nodes.start as u64)?;
            write_u64(writer, nodes.end as u64)?;
        }
        Ok(())
    }

    /// Reads a graph in the legacy file format from the given reader.
    pub fn read_legacy<T: Read>(reader: &mut T) -> io::Result<Self> {
        let mut tag = [0u8; 16];
        reader.read_exact(&mut tag)?;
        if &tag != LEGACY_TAG {
            return Err(Error::new(ErrorKind::InvalidData, "Graph: Invalid tag in the legacy format"));
        }
        let version = read_u64(reader)?;
        if version != LEGACY_VERSION {
            return Err(Error::new(ErrorKind::InvalidData, format!("Graph: Expected legacy version {}, got {}", LEGACY_VERSION, version)));
        }
        let flags = read_u64(reader)?;
        if flags & LEGACY_FLAG_TRANSLATION != flags {
            return Err(Error::new(ErrorKind::InvalidData, "Graph: Invalid flags in the legacy format"));
        }
        let sequences = read_u64(reader)? as usize;
        let min_id = read_u64(reader)?;

        let mut offsets: Vec<u64> = Vec::with_capacity(sequences + 1);
        for _ in 0..sequences + 1 {
            offsets.push(read_u64(reader)?);
        }
        if offsets.first() != Some(&0) || offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(Error::new(ErrorKind::InvalidData, "Graph: Invalid sequence offsets in the legacy format"));
        }
        let mut data = vec![0u8; offsets.last().copied().unwrap_or(0) as usize];
        reader.read_exact(&mut data)?;

        let segment_count = read_u64(reader)? as usize;
        let mut names: Vec<String> = Vec::with_capacity(segment_count);
        let mut starts: Vec<usize> = Vec::with_capacity(segment_count);
        let mut universe = 1;
        for _ in 0..segment_count {
            let name_len = read_u64(reader)? as usize;
            let mut name = vec![0u8; name_len];
            reader.read_exact(&mut name)?;
            let name = String::from_utf8(name)
                .map_err(|_| Error::new(ErrorKind::InvalidData, "Graph: Invalid segment name in the legacy format"))?;
            let start = read_u64(reader)? as usize;
            let end = read_u64(reader)? as usize;
            if start >= end || start < universe {
                return Err(Error::new(ErrorKind::InvalidData, "Graph: Invalid segment range in the legacy format"));
            }
            names.push(name);
            starts.push(start);
            universe = end;
        }

        let mut header = Header::new(GraphPayload {
            sequences: sequences as u64,
            min_id,
        });
        let mapping = if flags & LEGACY_FLAG_TRANSLATION != 0 {
            header.set(GraphPayload::FLAG_TRANSLATION);
            let mut builder = SparseBuilder::new(universe, starts.len())
                .map_err(|msg| Error::new(ErrorKind::InvalidData, msg))?;
            for start in starts {
                builder.set(start);
            }
            SparseVector::try_from(builder).map_err(|msg| Error::new(ErrorKind::InvalidData, msg))?
        } else {
            if segment_count > 0 {
                return Err(Error::new(ErrorKind::InvalidData, "Graph: Segments without a translation in the legacy format"));
            }
            let builder = SparseBuilder::new(0, 0).map_err(|msg| Error::new(ErrorKind::InvalidData, msg))?;
            SparseVector::try_from(builder).map_err(|msg| Error::new(ErrorKind::InvalidData, msg))?
        };

        Ok(Graph {
            header,
            offsets,
            data: ByteStore::Private(data),
            segments: StringArray::from(names.as_slice()),
            mapping,
        })
    }
}

//-----------------------------------------------------------------------------

/// An iterator over the segments in the node-to-segment translation.
///
/// The type of `Item` is `(&[u8], Range<usize>, &[u8])`, corresponding to
/// the segment name, the node identifier range, and the concatenated
/// sequence of the segment.
#[derive(Clone, Debug)]
pub struct SegmentIter<'a> {
    parent: &'a Graph,
    // Iterator over the set bits in `parent.mapping`.
    iter: OneIter<'a>,
    // The first (segment, node) identifier we have not used.
    next: (usize, usize),
    // The first (segment, node) identifier we should not use.
    limit: (usize, usize),
}

impl<'a> Iterator for SegmentIter<'a> {
    type Item = (&'a [u8], Range<usize>, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.0 >= self.limit.0 {
            None
        } else {
            let name = self.parent.segments.bytes(self.next.0);
            self.next.0 += 1;
            let start = self.next.1;
            self.next.1 = self.iter.next().map(|(_, value)| value).unwrap_or(self.limit.1);
            let min_id = self.parent.min_id();
            let sequence = &self.parent.data.as_bytes()[
                self.parent.offsets[start - min_id] as usize..self.parent.offsets[self.next.1 - min_id] as usize
            ];
            Some((name, start..self.next.1, sequence))
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.limit.0 - self.next.0;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for SegmentIter<'a> {}

impl<'a> FusedIterator for SegmentIter<'a> {}

//-----------------------------------------------------------------------------
