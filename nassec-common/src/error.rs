//! Error types for nassec

use thiserror::Error;

/// Error types for the nassec library.
#[derive(Debug, Error)]
pub enum Error {
    /// A read or peek needed more octets than the buffer has left.
    #[error("Boundary error: needed {needed} octets, {remaining} remaining")]
    Boundary {
        /// Octets required by the access
        needed: usize,
        /// Octets left after the cursor
        remaining: usize,
    },

    /// A bit-level access outside the sequence.
    #[error("Bit index {index} out of range for length {length}")]
    BitIndex {
        /// Requested bit index
        index: usize,
        /// Current bit length
        length: usize,
    },

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Protocol-related errors.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Cryptographic operation errors.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Convenience result alias used across the binary primitives.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds a boundary error for an access of `needed` octets.
    pub fn boundary(needed: usize, remaining: usize) -> Self {
        Error::Boundary { needed, remaining }
    }

    /// Returns true for buffer underruns.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Error::Boundary { .. })
    }
}
