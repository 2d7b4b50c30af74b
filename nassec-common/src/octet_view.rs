//! `OctetView` - a sequential cursor over byte slices for parsing protocol messages.
//!
//! Two access modes are kept apart:
//! - `peek*` methods take `&self` and never move the cursor,
//! - `read*` methods take `&mut self` and advance by exactly the consumed width.
//!
//! Multi-octet fields are assembled in the byte order fixed when the view is
//! created. Every access that would run past the end of the buffer returns
//! [`Error::Boundary`]; nothing is truncated or zero-filled.

use crate::error::{Error, Result};
use crate::octet::{assemble, Endianness, Octet, Octet2, Octet3, Octet4};
use crate::OctetString;

/// A cursor over a byte slice for sequential parsing.
///
/// # Example
/// ```
/// use nassec_common::OctetView;
///
/// let data = [0x12, 0x34, 0x56, 0x78];
/// let mut view = OctetView::new(&data);
///
/// assert_eq!(view.peek().unwrap(), 0x12);
/// assert_eq!(view.read().unwrap(), 0x12);
/// assert_eq!(view.read_u16().unwrap(), 0x3456);
/// assert_eq!(view.read().unwrap(), 0x78);
/// assert!(view.read().unwrap_err().is_boundary());
/// ```
#[derive(Debug, Clone)]
pub struct OctetView<'a> {
    data: &'a [u8],
    position: usize,
    endianness: Endianness,
}

impl<'a> OctetView<'a> {
    /// Creates a big-endian view over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_endianness(data, Endianness::Big)
    }

    /// Creates a view that assembles multi-octet fields in `endianness` order.
    pub fn with_endianness(data: &'a [u8], endianness: Endianness) -> Self {
        Self {
            data,
            position: 0,
            endianness,
        }
    }

    /// Creates a big-endian view over an `OctetString`.
    pub fn from_octet_string(data: &'a OctetString) -> Self {
        Self::new(data.data())
    }

    /// Byte order used for multi-octet fields.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    fn span(&self, offset: usize, width: usize) -> Result<&'a [u8]> {
        let needed = offset
            .checked_add(width)
            .ok_or_else(|| Error::boundary(usize::MAX, self.remaining()))?;
        if needed > self.remaining() {
            return Err(Error::boundary(needed, self.remaining()));
        }
        let start = self.position + offset;
        Ok(&self.data[start..start + width])
    }

    fn peek_width(&self, width: usize) -> Result<u32> {
        Ok(assemble(self.span(0, width)?, self.endianness))
    }

    // --- Peek methods (don't advance) ---

    /// Peeks at the current octet.
    #[inline]
    pub fn peek(&self) -> Result<u8> {
        self.peek_at(0)
    }

    /// Peeks at the octet `offset` positions after the cursor.
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Result<u8> {
        Ok(self.span(offset, 1)?[0])
    }

    /// Peeks at bit `index` counted from the cursor, MSB of the current octet first.
    pub fn peek_bit(&self, index: usize) -> Result<bool> {
        let octet = Octet::new(self.peek_at(index / 8)?);
        Ok(octet.bit(index % 8))
    }

    /// Peeks at a two-octet field.
    pub fn peek_u16(&self) -> Result<u16> {
        Ok(self.peek_width(2)? as u16)
    }

    /// Peeks at a three-octet field.
    pub fn peek_u24(&self) -> Result<u32> {
        self.peek_width(3)
    }

    /// Peeks at a four-octet field.
    pub fn peek_u32(&self) -> Result<u32> {
        self.peek_width(4)
    }

    // --- Read methods (advance) ---

    /// Reads a single octet.
    #[inline]
    pub fn read(&mut self) -> Result<u8> {
        let value = self.peek()?;
        self.position += 1;
        Ok(value)
    }

    /// Reads a two-octet field.
    pub fn read_u16(&mut self) -> Result<u16> {
        let value = self.peek_u16()?;
        self.position += 2;
        Ok(value)
    }

    /// Reads a three-octet field.
    pub fn read_u24(&mut self) -> Result<u32> {
        let value = self.peek_u24()?;
        self.position += 3;
        Ok(value)
    }

    /// Reads a four-octet field.
    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.peek_u32()?;
        self.position += 4;
        Ok(value)
    }

    /// Reads a two-octet group.
    pub fn read_octet2(&mut self) -> Result<Octet2> {
        self.read_u16().map(Octet2::new)
    }

    /// Reads a three-octet group.
    pub fn read_octet3(&mut self) -> Result<Octet3> {
        self.read_u24().map(Octet3::new)
    }

    /// Reads a four-octet group.
    pub fn read_octet4(&mut self) -> Result<Octet4> {
        self.read_u32().map(Octet4::new)
    }

    /// Reads `length` raw octets, borrowing from the underlying buffer.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let bytes = self.span(0, length)?;
        self.position += length;
        Ok(bytes)
    }

    /// Reads exactly `N` octets into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads an `OctetString` of `length` octets.
    pub fn read_octet_string(&mut self, length: usize) -> Result<OctetString> {
        self.read_bytes(length).map(OctetString::from_slice)
    }

    /// Reads everything after the cursor.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        self.position = self.data.len();
        rest
    }

    /// Skips `count` octets.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.span(0, count)?;
        self.position += count;
        Ok(())
    }

    // --- Position and state methods ---

    /// Returns the cursor position.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the total length of the underlying data.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of octets after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns true if at least one octet is left.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the unread part of the buffer without consuming it.
    #[inline]
    pub fn remaining_data(&self) -> &'a [u8] {
        &self.data[self.position..]
    }
}

impl<'a> From<&'a [u8]> for OctetView<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<'a> From<&'a OctetString> for OctetView<'a> {
    fn from(data: &'a OctetString) -> Self {
        Self::from_octet_string(data)
    }
}
