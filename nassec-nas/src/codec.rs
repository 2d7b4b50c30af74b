//! NAS encoding/decoding traits and errors
//!
//! Encoding writes into any [`bytes::BufMut`]. Decoding reads from an
//! [`OctetView`] cursor, so every short buffer surfaces as the common
//! boundary error instead of a panic or a silent truncation.
//!
//! # Example
//!
//! ```rust
//! use nassec_nas::codec::{NasDecode, NasEncode};
//! use nassec_nas::enums::MmMessageType;
//! use nassec_nas::message::NasMessage;
//!
//! let msg = NasMessage::mm(MmMessageType::RegistrationComplete, vec![]);
//! let bytes = msg.to_bytes().unwrap();
//! assert_eq!(bytes, vec![0x7E, 0x00, 0x43]);
//!
//! let decoded = NasMessage::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use bytes::BufMut;
use nassec_common::{Error as CommonError, OctetView};
use thiserror::Error;

use crate::enums::MessageTypeError;

/// Errors that can occur during NAS encoding/decoding
#[derive(Debug, Error)]
pub enum CodecError {
    /// Cursor or slicing error from the binary primitives (usually a boundary error)
    #[error(transparent)]
    Primitive(#[from] CommonError),

    /// Invalid protocol discriminator
    #[error("Invalid protocol discriminator: 0x{0:02X}")]
    InvalidProtocolDiscriminator(u8),

    /// Invalid security header type
    #[error("Invalid security header type: 0x{0:02X}")]
    InvalidSecurityHeaderType(u8),

    /// A plain message was expected but the header says it is protected
    #[error("Expected a plain NAS message, found security header type 0x{0:X}")]
    UnexpectedSecurityHeader(u8),

    /// Unknown message type for the discriminator
    #[error(transparent)]
    MessageType(#[from] MessageTypeError),

    /// Octets left over after a fixed-size structure
    #[error("{0} trailing octets after decoding")]
    TrailingOctets(usize),

    /// Invalid value encountered during decoding
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl CodecError {
    /// Returns true if this wraps a boundary (short buffer) error.
    pub fn is_boundary(&self) -> bool {
        matches!(self, CodecError::Primitive(e) if e.is_boundary())
    }
}

/// Result type for NAS codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Types that serialize to NAS wire format.
pub trait NasEncode {
    /// Encode this value to the provided buffer
    fn nas_encode<B: BufMut>(&self, buf: &mut B) -> CodecResult<()>;

    /// Returns the encoded size in bytes
    fn encoded_len(&self) -> usize;

    /// Encode into a freshly allocated vector.
    fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.nas_encode(&mut buf)?;
        Ok(buf)
    }
}

/// Types that parse from NAS wire format.
pub trait NasDecode: Sized {
    /// Decode a value, advancing the cursor past it.
    fn nas_decode(view: &mut OctetView<'_>) -> CodecResult<Self>;

    /// Decode a value that must span the whole buffer.
    fn from_bytes(data: &[u8]) -> CodecResult<Self> {
        let mut view = OctetView::new(data);
        let value = Self::nas_decode(&mut view)?;
        if view.has_next() {
            return Err(CodecError::TrailingOctets(view.remaining()));
        }
        Ok(value)
    }
}
