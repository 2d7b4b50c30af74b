//! Fixed-width octet groups.
//!
//! `Octet`, `Octet2`, `Octet3` and `Octet4` wrap 1 to 4 octets of a wire field.
//! Values are masked to their width on construction, and conversions to and from
//! raw octets always name the byte order.

use std::fmt;

/// Byte order of a multi-octet field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    /// Most significant octet first (network order).
    #[default]
    Big,
    /// Least significant octet first.
    Little,
}

/// Assembles up to four octets into an integer.
#[inline]
pub(crate) fn assemble(bytes: &[u8], endianness: Endianness) -> u32 {
    match endianness {
        Endianness::Big => bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32),
        Endianness::Little => bytes
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32),
    }
}

macro_rules! octet_group {
    ($(#[$meta:meta])* $name:ident, $width:expr, $repr:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        pub struct $name($repr);

        impl $name {
            /// Width of the group in octets.
            pub const WIDTH: usize = $width;

            /// Largest value representable in this width.
            pub const MAX: $repr = (((1u64 << ($width * 8)) - 1) as $repr);

            /// Creates the group, masking `value` to its width.
            #[inline]
            pub fn new(value: $repr) -> Self {
                Self(value & Self::MAX)
            }

            /// Assembles the group from exactly `WIDTH` octets.
            #[inline]
            pub fn from_bytes(bytes: [u8; $width], endianness: Endianness) -> Self {
                Self(assemble(&bytes, endianness) as $repr)
            }

            /// Returns the numeric value.
            #[inline]
            pub fn value(&self) -> $repr {
                self.0
            }

            /// Splits the group into octets in the given byte order.
            pub fn to_bytes(&self, endianness: Endianness) -> [u8; $width] {
                let mut out = [0u8; $width];
                for (i, slot) in out.iter_mut().enumerate() {
                    let shift = match endianness {
                        Endianness::Big => ($width - 1 - i) * 8,
                        Endianness::Little => i * 8,
                    };
                    *slot = ((self.0 as u64) >> shift) as u8;
                }
                out
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> $repr {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:0width$X}", self.0, width = $width * 2)
            }
        }
    };
}

octet_group!(
    /// A single octet.
    Octet, 1, u8
);
octet_group!(
    /// Two octets, e.g. a KDF parameter length.
    Octet2, 2, u16
);
octet_group!(
    /// Three octets, e.g. the NAS COUNT without its spare octet.
    Octet3, 3, u32
);
octet_group!(
    /// Four octets, e.g. a MAC or the full COUNT input.
    Octet4, 4, u32
);

impl Octet {
    /// Returns bit `index` of the octet, where index 0 is the most significant bit.
    ///
    /// # Panics
    /// Panics if `index >= 8`.
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        assert!(index < 8, "bit index {index} outside octet");
        (self.0 >> (7 - index)) & 1 == 1
    }

    /// Returns the high half-octet.
    #[inline]
    pub fn high_nibble(&self) -> u8 {
        self.0 >> 4
    }

    /// Returns the low half-octet.
    #[inline]
    pub fn low_nibble(&self) -> u8 {
        self.0 & 0x0F
    }

    /// Packs two half-octets into one octet.
    #[inline]
    pub fn from_nibbles(high: u8, low: u8) -> Self {
        Self(((high & 0x0F) << 4) | (low & 0x0F))
    }
}
