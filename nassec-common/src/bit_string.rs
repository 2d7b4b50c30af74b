//! BitString type for bit-level operations.
//!
//! A `BitString` is a resizable sequence of bits addressed by absolute index.
//! Bits are packed MSB first: bit 0 of the sequence is the most significant bit
//! of octet 0. Writing past the end grows the sequence and zero-fills the gap;
//! converting back to octets pads the final octet with zero bits on the low end.

use std::fmt;

use crate::error::{Error, Result};

/// A variable-length sequence of bits.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitString {
    /// Packed storage, MSB first. Bits past `bit_length` are kept zero.
    data: Vec<u8>,
    /// Number of valid bits.
    bit_length: usize,
}

impl BitString {
    /// Creates a new empty `BitString`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zero-filled `BitString` of `bit_length` bits.
    pub fn zeros(bit_length: usize) -> Self {
        Self {
            data: vec![0u8; bit_length.div_ceil(8)],
            bit_length,
        }
    }

    /// Creates a `BitString` holding the first `bit_length` bits of `octets`.
    ///
    /// Missing octets read as zero, so `bit_length` may exceed `8 * octets.len()`.
    pub fn from_octets(octets: &[u8], bit_length: usize) -> Self {
        let mut data = vec![0u8; bit_length.div_ceil(8)];
        let copy = data.len().min(octets.len());
        data[..copy].copy_from_slice(&octets[..copy]);
        let mut bits = Self { data, bit_length };
        bits.clear_tail();
        bits
    }

    /// Creates a `BitString` covering every bit of `octets`.
    pub fn from_bytes(octets: &[u8]) -> Self {
        Self::from_octets(octets, octets.len() * 8)
    }

    /// Packs the sequence into octets, zero-padding the final octet.
    pub fn to_octets(&self) -> Vec<u8> {
        self.data[..self.octet_length()].to_vec()
    }

    /// Returns the packed octets, consuming the `BitString`.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.data.truncate(self.octet_length());
        self.data
    }

    /// Returns the number of bits.
    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    /// Returns the number of octets needed to store the bits.
    pub fn octet_length(&self) -> usize {
        self.bit_length.div_ceil(8)
    }

    /// Returns true if the sequence holds no bits.
    pub fn is_empty(&self) -> bool {
        self.bit_length == 0
    }

    fn check_range(&self, start: usize, len: usize) -> Result<()> {
        match start.checked_add(len) {
            Some(end) if end <= self.bit_length => Ok(()),
            end => Err(Error::BitIndex {
                index: end.unwrap_or(usize::MAX),
                length: self.bit_length,
            }),
        }
    }

    /// Reads bit `index`.
    pub fn get(&self, index: usize) -> Result<bool> {
        if index >= self.bit_length {
            return Err(Error::BitIndex {
                index,
                length: self.bit_length,
            });
        }
        Ok((self.data[index / 8] >> (7 - index % 8)) & 1 == 1)
    }

    /// Sets bit `index`, growing the sequence with zero bits if needed.
    pub fn set(&mut self, index: usize, bit: bool) {
        if index >= self.bit_length {
            self.resize(index + 1);
        }
        let mask = 1u8 << (7 - index % 8);
        if bit {
            self.data[index / 8] |= mask;
        } else {
            self.data[index / 8] &= !mask;
        }
    }

    /// Appends a single bit.
    pub fn write(&mut self, bit: bool) {
        let index = self.bit_length;
        self.set(index, bit);
    }

    /// Appends the low `len` bits of `value`, MSB first.
    ///
    /// Two fields that do not fill an octet each, such as a 3-bit and a 5-bit
    /// value, pack into a single octet.
    ///
    /// # Panics
    /// Panics if `len` is greater than 32.
    pub fn write_bits(&mut self, value: u32, len: usize) {
        assert!(len <= 32, "Cannot write more than 32 bits at once");
        for i in 0..len {
            self.write((value >> (len - 1 - i)) & 1 == 1);
        }
    }

    /// Reads `len` bits starting at `index` as an integer, MSB first.
    pub fn read_bits(&self, index: usize, len: usize) -> Result<u32> {
        assert!(len <= 32, "Cannot read more than 32 bits at once");
        self.check_range(index, len)?;
        let mut result = 0u32;
        for i in 0..len {
            result = (result << 1) | self.get(index + i)? as u32;
        }
        Ok(result)
    }

    /// Returns a copy of `len` bits starting at `start`.
    pub fn sub_string(&self, start: usize, len: usize) -> Result<BitString> {
        self.check_range(start, len)?;
        let mut out = BitString::zeros(len);
        for i in 0..len {
            if self.get(start + i)? {
                out.set(i, true);
            }
        }
        Ok(out)
    }

    /// Bitwise xor of two sequences, truncated to the shorter length.
    pub fn xor(&self, other: &BitString) -> BitString {
        let length = self.bit_length.min(other.bit_length);
        let data: Vec<u8> = self
            .data
            .iter()
            .zip(other.data.iter())
            .take(length.div_ceil(8))
            .map(|(a, b)| a ^ b)
            .collect();
        let mut out = BitString {
            data,
            bit_length: length,
        };
        out.clear_tail();
        out
    }

    /// Grows or shrinks the sequence to `bit_length` bits; new bits are zero.
    pub fn resize(&mut self, bit_length: usize) {
        self.data.resize(bit_length.div_ceil(8), 0);
        self.bit_length = bit_length;
        self.clear_tail();
    }

    /// Zero-extends to the next octet boundary.
    pub fn octet_align(&mut self) {
        let aligned = self.octet_length() * 8;
        self.resize(aligned);
    }

    fn clear_tail(&mut self) {
        let used = self.bit_length % 8;
        if used != 0 {
            if let Some(last) = self.data.last_mut() {
                *last &= 0xFFu8 << (8 - used);
            }
        }
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitString({self})")
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.bit_length {
            let bit = (self.data[i / 8] >> (7 - i % 8)) & 1;
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}
