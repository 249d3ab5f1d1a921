//! Low-level support: node encodings, DNA sequences, tags, and string arrays.
//!
//! A node in the bidirected graph has two orientations.
//! A (node, orientation) pair is encoded as a single integer handle, with the orientation in the lowest bit.
//! Handle `0` is reserved for the endmarker (see [`crate::ENDMARKER`]).

use crate::REF_SAMPLE;

use simple_sds::serialize::Serialize;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Orientation of a node or a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Orientation {
    /// The node or the path as stored in the graph.
    Forward,
    /// Reverse complement of the forward orientation.
    Reverse,
}

impl Orientation {
    /// Returns the opposite orientation.
    #[inline]
    pub fn flip(self) -> Orientation {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }

    /// Returns `true` if this is the reverse orientation.
    #[inline]
    pub fn is_reverse(self) -> bool {
        self == Orientation::Reverse
    }

    /// Converts a bit value into an orientation.
    #[inline]
    pub fn from_bit(bit: usize) -> Orientation {
        if bit & 1 == 1 { Orientation::Reverse } else { Orientation::Forward }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Forward => write!(f, "forward"),
            Orientation::Reverse => write!(f, "reverse"),
        }
    }
}

//-----------------------------------------------------------------------------

// Handle encoding.

/// Encodes a node identifier and an orientation as a handle.
#[inline]
pub fn encode_node(node_id: usize, orientation: Orientation) -> usize {
    2 * node_id + (orientation as usize)
}

/// Decodes a handle into a node identifier and an orientation.
#[inline]
pub fn decode_node(handle: usize) -> (usize, Orientation) {
    (handle / 2, Orientation::from_bit(handle))
}

/// Returns the node identifier of the handle.
#[inline]
pub fn node_id(handle: usize) -> usize {
    handle / 2
}

/// Returns the orientation of the handle.
#[inline]
pub fn node_orientation(handle: usize) -> Orientation {
    Orientation::from_bit(handle)
}

/// Returns the handle for the same node in the opposite orientation.
#[inline]
pub fn flip_node(handle: usize) -> usize {
    handle ^ 1
}

//-----------------------------------------------------------------------------

// Edges and paths over handles.

/// Returns `true` if the edge is in canonical orientation.
///
/// Each edge between two oriented nodes can be traversed in two directions.
/// Exactly one of `(from, to)` and `(flip(to), flip(from))` is canonical,
/// except when the two are the same edge.
pub fn edge_is_canonical(from: (usize, Orientation), to: (usize, Orientation)) -> bool {
    let forward = (encode_node(from.0, from.1), encode_node(to.0, to.1));
    let reverse = (flip_node(forward.1), flip_node(forward.0));
    forward <= reverse
}

/// Returns the reverse edge for the given edge of encoded handles.
#[inline]
pub fn reverse_edge(edge: (usize, usize)) -> (usize, usize) {
    (flip_node(edge.1), flip_node(edge.0))
}

/// Returns the reverse orientation of a path of encoded handles.
pub fn reverse_path(path: &[usize]) -> Vec<usize> {
    path.iter().rev().map(|&handle| flip_node(handle)).collect()
}

/// Returns `true` if the path of encoded handles is in canonical orientation.
///
/// A path is canonical if it is lexicographically no greater than its reverse orientation.
pub fn encoded_path_is_canonical(path: &[usize]) -> bool {
    let mut forward = path.iter();
    let mut reverse = path.iter().rev().map(|&handle| flip_node(handle));
    loop {
        match (forward.next(), reverse.next()) {
            (Some(&a), Some(b)) => {
                if a < b { return true; }
                if a > b { return false; }
            }
            _ => return true,
        }
    }
}

//-----------------------------------------------------------------------------

// Sequences.

const fn generate_complement() -> [u8; 256] {
    let mut result = [b'N'; 256];
    let forward = *b"ACGTRYSWKMBDHVNacgtryswkmbdhvn";
    let reverse = *b"TGCAYRSWMKVHDBNtgcayrswmkvhdbn";
    let mut i = 0;
    while i < forward.len() {
        result[forward[i] as usize] = reverse[i];
        i += 1;
    }
    result
}

const COMPLEMENT: [u8; 256] = generate_complement();

/// Returns the complement of a base, with unexpected values mapped to `N`.
#[inline]
pub fn complement(base: u8) -> u8 {
    COMPLEMENT[base as usize]
}

/// Returns the reverse complement of a DNA sequence over the IUPAC alphabet.
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&base| complement(base)).collect()
}

/// Reverse complements a DNA sequence in place.
pub fn reverse_complement_in_place(sequence: &mut [u8]) {
    let len = sequence.len();
    for i in 0..len / 2 {
        let tmp = sequence[i];
        sequence[i] = complement(sequence[len - 1 - i]);
        sequence[len - 1 - i] = complement(tmp);
    }
    if len % 2 != 0 {
        sequence[len / 2] = complement(sequence[len / 2]);
    }
}

/// Returns `true` if the sample name marks a reference or generic path.
#[inline]
pub fn is_reference_sample(sample: &str) -> bool {
    sample == REF_SAMPLE
}

//-----------------------------------------------------------------------------

/// An immutable array of strings stored in a single byte buffer.
///
/// The serialization format consists of an offset array followed by the
/// concatenated strings. Offsets are cumulative lengths, with `len() + 1`
/// values in total.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringArray {
    offsets: Vec<u64>,
    data: Vec<u8>,
}

impl StringArray {
    /// Returns the number of strings in the array.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Returns `true` if the array is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the length of the string with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.len()`.
    #[inline]
    pub fn str_len(&self, id: usize) -> usize {
        (self.offsets[id + 1] - self.offsets[id]) as usize
    }

    /// Returns the string with the given identifier as a byte slice.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.len()`.
    #[inline]
    pub fn bytes(&self, id: usize) -> &[u8] {
        &self.data[self.offsets[id] as usize..self.offsets[id + 1] as usize]
    }

    /// Returns the string with the given identifier, assuming valid UTF-8.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.len()`.
    pub fn string(&self, id: usize) -> String {
        String::from_utf8_lossy(self.bytes(id)).into_owned()
    }

    /// Returns the concatenation of the strings in the given range as a byte slice.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn range(&self, range: std::ops::Range<usize>) -> &[u8] {
        &self.data[self.offsets[range.start] as usize..self.offsets[range.end] as usize]
    }

    /// Returns the identifier of the given string, or [`None`] if there is no such string.
    ///
    /// Uses a linear scan, which is fine for the small arrays in this crate.
    pub fn find(&self, string: &str) -> Option<usize> {
        (0..self.len()).find(|&id| self.bytes(id) == string.as_bytes())
    }

    /// Returns an iterator over the strings in the array.
    pub fn iter(&self) -> StringIter<'_> {
        StringIter { parent: self, next: 0 }
    }
}

impl<T: AsRef<str>> From<&[T]> for StringArray {
    fn from(strings: &[T]) -> Self {
        let mut offsets: Vec<u64> = Vec::with_capacity(strings.len() + 1);
        let mut data: Vec<u8> = Vec::new();
        offsets.push(0);
        for string in strings {
            data.extend_from_slice(string.as_ref().as_bytes());
            offsets.push(data.len() as u64);
        }
        StringArray { offsets, data }
    }
}

impl Serialize for StringArray {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.offsets.serialize(writer)?;
        self.data.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let offsets = Vec::<u64>::load(reader)?;
        let data = Vec::<u8>::load(reader)?;
        if offsets.first() != Some(&0) && !offsets.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "StringArray: Offsets do not start at 0"));
        }
        if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "StringArray: Offsets are not sorted"));
        }
        if offsets.last().copied().unwrap_or(0) as usize != data.len() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "StringArray: Offsets do not match the data"));
        }
        Ok(StringArray { offsets, data })
    }

    fn size_in_elements(&self) -> usize {
        self.offsets.size_in_elements() + self.data.size_in_elements()
    }
}

/// An iterator over the strings in a [`StringArray`].
#[derive(Clone, Debug)]
pub struct StringIter<'a> {
    parent: &'a StringArray,
    next: usize,
}

impl<'a> Iterator for StringIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.parent.len() {
            None
        } else {
            let result = self.parent.bytes(self.next);
            self.next += 1;
            Some(result)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.parent.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for StringIter<'a> {}

//-----------------------------------------------------------------------------

/// An append-only mapping from string keys to string values.
///
/// Tags store arbitrary information about a structure.
/// Serialization is deterministic: key-value pairs are written in sorted key order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tags {
    map: BTreeMap<String, String>,
}

impl Tags {
    /// Creates an empty set of tags.
    pub fn new() -> Self {
        Tags::default()
    }

    /// Returns the number of tags.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no tags.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Inserts a tag, overwriting a possible old value.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    /// Returns the value for the key, or [`None`] if there is no such tag.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|value| value.as_str())
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Removes all tags.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Returns an iterator over the tags in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }
}

impl Serialize for Tags {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        let mut strings: Vec<&str> = Vec::with_capacity(2 * self.map.len());
        for (key, value) in self.map.iter() {
            strings.push(key);
            strings.push(value);
        }
        let array = StringArray::from(strings.as_slice());
        array.serialize(writer)
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let array = StringArray::load(reader)?;
        if array.len() % 2 != 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "Tags: Key without a value"));
        }
        let mut map = BTreeMap::new();
        for id in 0..array.len() / 2 {
            let key = String::from_utf8(array.bytes(2 * id).to_vec())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Tags: Invalid key"))?;
            let value = String::from_utf8(array.bytes(2 * id + 1).to_vec())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Tags: Invalid value"))?;
            map.insert(key, value);
        }
        Ok(Tags { map })
    }

    fn size_in_elements(&self) -> usize {
        let mut strings: Vec<&str> = Vec::with_capacity(2 * self.map.len());
        for (key, value) in self.map.iter() {
            strings.push(key);
            strings.push(value);
        }
        StringArray::from(strings.as_slice()).size_in_elements()
    }
}

//-----------------------------------------------------------------------------
