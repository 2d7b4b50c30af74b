//! `OctetString` type for variable-length byte sequences.
//!
//! Keys, KDF parameters and NAS payloads are carried as `OctetString`s.
//! Derived values (`concat`, `slice`, `xor`) are always new strings; the source
//! is never modified. The `append_*` family exists for building a string once,
//! field by field, before handing it out.

use std::fmt;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::octet::{Endianness, Octet2, Octet3, Octet4};

/// A variable-length sequence of octets.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct OctetString {
    data: Vec<u8>,
}

impl OctetString {
    /// Creates a new empty `OctetString`.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates an `OctetString` from a byte slice.
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Creates an `OctetString` of `length` zero octets.
    pub fn from_spare(length: usize) -> Self {
        Self {
            data: vec![0u8; length],
        }
    }

    /// Creates an `OctetString` from a single octet.
    pub fn from_octet(value: u8) -> Self {
        Self { data: vec![value] }
    }

    /// Creates a two-octet big-endian `OctetString`.
    pub fn from_u16(value: u16) -> Self {
        Self {
            data: value.to_be_bytes().to_vec(),
        }
    }

    /// Creates a four-octet big-endian `OctetString`.
    pub fn from_u32(value: u32) -> Self {
        Self {
            data: value.to_be_bytes().to_vec(),
        }
    }

    /// Parses a hex string; whitespace is ignored.
    ///
    /// Returns `None` if the input is not valid hex.
    pub fn from_hex(text: &str) -> Option<Self> {
        let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(text).ok().map(|data| Self { data })
    }

    /// Creates an `OctetString` from an ASCII string.
    pub fn from_ascii(ascii: &str) -> Self {
        Self {
            data: ascii.as_bytes().to_vec(),
        }
    }

    // --- Append methods ---

    /// Appends a single octet.
    pub fn append_octet(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Appends a two-octet group.
    pub fn append_octet2(&mut self, value: Octet2, endianness: Endianness) {
        self.data.extend_from_slice(&value.to_bytes(endianness));
    }

    /// Appends a three-octet group.
    pub fn append_octet3(&mut self, value: Octet3, endianness: Endianness) {
        self.data.extend_from_slice(&value.to_bytes(endianness));
    }

    /// Appends a four-octet group.
    pub fn append_octet4(&mut self, value: Octet4, endianness: Endianness) {
        self.data.extend_from_slice(&value.to_bytes(endianness));
    }

    /// Appends raw bytes.
    pub fn append_slice(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    // --- Accessors ---

    /// Returns the number of octets.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the string has no octets.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the octets.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the octet at `index`.
    pub fn get(&self, index: usize) -> Result<u8> {
        self.data
            .get(index)
            .copied()
            .ok_or_else(|| Error::boundary(index + 1, self.data.len()))
    }

    /// Converts to an uppercase hex string.
    pub fn to_hex_string(&self) -> String {
        hex::encode_upper(&self.data)
    }

    /// Consumes self and returns the underlying `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    // --- Derived strings ---

    /// Copies the octets in `range`.
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.data.len() {
            return Err(Error::boundary(
                range.end.saturating_sub(range.start),
                self.data.len().saturating_sub(range.start),
            ));
        }
        Ok(Self {
            data: self.data[range].to_vec(),
        })
    }

    /// Copies the octets from `index` to the end.
    pub fn sub_copy(&self, index: usize) -> Result<Self> {
        self.slice(index..self.data.len().max(index))
    }

    /// Copies `length` octets starting at `index`.
    pub fn sub_copy_len(&self, index: usize, length: usize) -> Result<Self> {
        self.slice(index..index + length)
    }

    /// Concatenates any number of byte sequences.
    pub fn concat<T: AsRef<[u8]>>(parts: &[T]) -> Self {
        let total = parts.iter().map(|p| p.as_ref().len()).sum();
        let mut data = Vec::with_capacity(total);
        for part in parts {
            data.extend_from_slice(part.as_ref());
        }
        Self { data }
    }

    /// XORs two strings; the result has the length of the shorter one.
    pub fn xor(a: &OctetString, b: &OctetString) -> Self {
        Self {
            data: a.data.iter().zip(b.data.iter()).map(|(x, y)| x ^ y).collect(),
        }
    }
}

impl fmt::Debug for OctetString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OctetString({})", self.to_hex_string())
    }
}

impl fmt::Display for OctetString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl From<Vec<u8>> for OctetString {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for OctetString {
    fn from(data: &[u8]) -> Self {
        Self::from_slice(data)
    }
}

impl<const N: usize> From<[u8; N]> for OctetString {
    fn from(data: [u8; N]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

impl AsRef<[u8]> for OctetString {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
