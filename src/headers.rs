//! Headers for the serialized structures.
//!
//! Each serialized structure starts with a header identifying the structure,
//! its file format version, and a word of flags. The header is serialized as
//! a vector of 64-bit words, which makes it self-delimiting. The first word
//! packs the magic tag (low 32 bits) and the version (high 32 bits), the
//! second word contains the flags, and the remaining words are payload.

use simple_sds::serialize::Serialize;

use std::io::{Error, ErrorKind};
use std::io;

//-----------------------------------------------------------------------------

/// Structure-specific header contents.
pub trait Payload: Copy + PartialEq {
    /// Name of the structure for error messages.
    const NAME: &'static str;

    /// Magic tag identifying the structure.
    const TAG: u32;

    /// Current file format version.
    const VERSION: u32;

    /// Mask of the flag bits valid in the current version.
    const FLAG_MASK: u64;

    /// Number of payload words after the tag and flag words.
    const WORDS: usize;

    /// Encodes the payload as `Self::WORDS` words.
    fn encode(&self) -> Vec<u64>;

    /// Decodes the payload from `Self::WORDS` words.
    fn decode(words: &[u64]) -> Self;

    /// Checks payload-specific invariants.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// A versioned header with a magic tag, flags, and a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header<P: Payload> {
    version: u32,
    flags: u64,
    payload: P,
}

impl<P: Payload> Header<P> {
    /// Creates a header with the current version and no flags set.
    pub fn new(payload: P) -> Self {
        Header {
            version: P::VERSION,
            flags: 0,
            payload,
        }
    }

    /// Returns the file format version in the header.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns a reference to the payload.
    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Returns a mutable reference to the payload.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Sets the given flag.
    #[inline]
    pub fn set(&mut self, flag: u64) {
        self.flags |= flag;
    }

    /// Unsets the given flag.
    #[inline]
    pub fn unset(&mut self, flag: u64) {
        self.flags &= !flag;
    }

    /// Returns `true` if the given flag is set.
    #[inline]
    pub fn is_set(&self, flag: u64) -> bool {
        self.flags & flag != 0
    }

    /// Checks the tag, the version, the flags, and the payload.
    pub fn validate(&self) -> Result<(), String> {
        if self.version != P::VERSION {
            return Err(format!("{}: Expected version {}, got version {}", P::NAME, P::VERSION, self.version));
        }
        if self.flags & P::FLAG_MASK != self.flags {
            return Err(format!("{}: Invalid flags {:#x}", P::NAME, self.flags));
        }
        self.payload.validate()
    }
}

impl<P: Payload> Serialize for Header<P> {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        let mut words: Vec<u64> = Vec::with_capacity(2 + P::WORDS);
        words.push((P::TAG as u64) | ((self.version as u64) << 32));
        words.push(self.flags);
        words.extend(self.payload.encode());
        words.serialize(writer)
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let words = Vec::<u64>::load(reader)?;
        if words.len() != 2 + P::WORDS {
            return Err(Error::new(ErrorKind::InvalidData, format!("{}: Invalid header length", P::NAME)));
        }
        let tag = (words[0] & 0xFFFF_FFFF) as u32;
        if tag != P::TAG {
            return Err(Error::new(ErrorKind::InvalidData, format!("{}: Invalid tag {:#x}", P::NAME, tag)));
        }
        let header = Header {
            version: (words[0] >> 32) as u32,
            flags: words[1],
            payload: P::decode(&words[2..]),
        };
        Ok(header)
    }

    fn size_in_elements(&self) -> usize {
        1 + 2 + P::WORDS
    }
}

//-----------------------------------------------------------------------------

/// Header payload for the GBZ container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GBZPayload;

impl Payload for GBZPayload {
    const NAME: &'static str = "GBZ";
    const TAG: u32 = 0x205A4247; // "GBZ "
    const VERSION: u32 = 1;
    const FLAG_MASK: u64 = 0x0000;
    const WORDS: usize = 0;

    fn encode(&self) -> Vec<u64> {
        Vec::new()
    }

    fn decode(_: &[u64]) -> Self {
        GBZPayload
    }
}

//-----------------------------------------------------------------------------

/// Header payload for the GBWT path index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GBWTPayload {
    /// Number of sequences in the index.
    pub sequences: u64,
    /// Total length of the sequences, including the endmarkers.
    pub size: u64,
    /// Alphabet offset: the smallest GBWT node identifier is `offset + 1`.
    pub offset: u64,
    /// Size of the alphabet, including the endmarker.
    pub alphabet_size: u64,
}

impl GBWTPayload {
    /// The index is bidirectional: even sequences are forward orientations
    /// and odd sequences their reverse complements.
    pub const FLAG_BIDIRECTIONAL: u64 = 0x0001;

    /// The index contains path metadata.
    pub const FLAG_METADATA: u64 = 0x0002;
}

impl Payload for GBWTPayload {
    const NAME: &'static str = "GBWT";
    const TAG: u32 = 0x54574247; // "GBWT"
    const VERSION: u32 = 1;
    const FLAG_MASK: u64 = 0x0003;
    const WORDS: usize = 4;

    fn encode(&self) -> Vec<u64> {
        vec![self.sequences, self.size, self.offset, self.alphabet_size]
    }

    fn decode(words: &[u64]) -> Self {
        GBWTPayload {
            sequences: words[0],
            size: words[1],
            offset: words[2],
            alphabet_size: words[3],
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.alphabet_size > 0 && self.offset >= self.alphabet_size {
            return Err(String::from("GBWT: Alphabet offset is too large"));
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// Header payload for the node sequences and the segment translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphPayload {
    /// Number of node sequences, including possible gaps in the identifier space.
    pub sequences: u64,
    /// Smallest node identifier in the graph, or `0` if the graph is empty.
    pub min_id: u64,
}

impl GraphPayload {
    /// The graph contains a node-to-segment translation.
    pub const FLAG_TRANSLATION: u64 = 0x0001;
}

impl Payload for GraphPayload {
    const NAME: &'static str = "Graph";
    const TAG: u32 = 0x47475747; // "GWGG"
    const VERSION: u32 = 1;
    const FLAG_MASK: u64 = 0x0001;
    const WORDS: usize = 2;

    fn encode(&self) -> Vec<u64> {
        vec![self.sequences, self.min_id]
    }

    fn decode(words: &[u64]) -> Self {
        GraphPayload {
            sequences: words[0],
            min_id: words[1],
        }
    }
}

//-----------------------------------------------------------------------------

/// Header payload for path metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetadataPayload {
    /// Number of paths.
    pub paths: u64,
    /// Number of distinct sample names.
    pub samples: u64,
    /// Number of distinct contig names.
    pub contigs: u64,
}

impl Payload for MetadataPayload {
    const NAME: &'static str = "Metadata";
    const TAG: u32 = 0x6154454D; // "META"-ish
    const VERSION: u32 = 1;
    const FLAG_MASK: u64 = 0x0000;
    const WORDS: usize = 3;

    fn encode(&self) -> Vec<u64> {
        vec![self.paths, self.samples, self.contigs]
    }

    fn decode(words: &[u64]) -> Self {
        MetadataPayload {
            paths: words[0],
            samples: words[1],
            contigs: words[2],
        }
    }
}

//-----------------------------------------------------------------------------
