//! Plain (unprotected) NAS messages
//!
//! The security engine only needs the header of a plain message: which
//! protocol it belongs to and its message type. The information elements
//! after the header are carried as an opaque body and reproduced byte for byte.
//!
//! ```text
//! 5GMM: | EPD 0x7E | spare(4) SHT(4) = 0 | message type | body ... |
//! 5GSM: | EPD 0x2E | PDU session id | PTI | message type | body ... |
//! ```

use bytes::BufMut;
use nassec_common::OctetView;

use crate::codec::{CodecError, CodecResult, NasDecode, NasEncode};
use crate::enums::{
    ExtendedProtocolDiscriminator, MessageType, MessageTypeError, MmMessageType, SecurityHeaderType,
    SmMessageType,
};

/// Plain 5GMM message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainMmMessage {
    /// Message type
    pub message_type: MmMessageType,
    /// Information elements after the 3-octet header
    pub body: Vec<u8>,
}

/// Plain 5GSM message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainSmMessage {
    /// PDU session identity
    pub pdu_session_id: u8,
    /// Procedure transaction identity
    pub pti: u8,
    /// Message type
    pub message_type: SmMessageType,
    /// Information elements after the 4-octet header
    pub body: Vec<u8>,
}

/// A plain NAS message as handed to and returned from the protection layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NasMessage {
    /// Mobility management
    Mm(PlainMmMessage),
    /// Session management
    Sm(PlainSmMessage),
}

impl NasMessage {
    /// Length of the plain 5GMM header
    pub const MM_HEADER_LEN: usize = 3;
    /// Length of the plain 5GSM header
    pub const SM_HEADER_LEN: usize = 4;

    /// Creates a 5GMM message.
    pub fn mm(message_type: MmMessageType, body: Vec<u8>) -> Self {
        NasMessage::Mm(PlainMmMessage { message_type, body })
    }

    /// Creates a 5GSM message.
    pub fn sm(pdu_session_id: u8, pti: u8, message_type: SmMessageType, body: Vec<u8>) -> Self {
        NasMessage::Sm(PlainSmMessage {
            pdu_session_id,
            pti,
            message_type,
            body,
        })
    }

    /// Extended protocol discriminator
    pub fn epd(&self) -> ExtendedProtocolDiscriminator {
        match self {
            NasMessage::Mm(_) => ExtendedProtocolDiscriminator::MobilityManagement,
            NasMessage::Sm(_) => ExtendedProtocolDiscriminator::SessionManagement,
        }
    }

    /// Message type
    pub fn message_type(&self) -> MessageType {
        match self {
            NasMessage::Mm(m) => MessageType::Mm(m.message_type),
            NasMessage::Sm(m) => MessageType::Sm(m.message_type),
        }
    }

    /// Returns true for SECURITY MODE COMPLETE, which is sent under the new context.
    pub fn is_security_mode_complete(&self) -> bool {
        self.message_type() == MessageType::Mm(MmMessageType::SecurityModeComplete)
    }

    /// Message body after the header
    pub fn body(&self) -> &[u8] {
        match self {
            NasMessage::Mm(m) => &m.body,
            NasMessage::Sm(m) => &m.body,
        }
    }

    /// Encodes the message to its wire octets.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf
    }

    /// Decodes a complete plain message.
    pub fn decode(data: &[u8]) -> CodecResult<Self> {
        Self::from_bytes(data)
    }

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.epd().into());
        match self {
            NasMessage::Mm(m) => {
                buf.put_u8(SecurityHeaderType::NotProtected.into());
                buf.put_u8(m.message_type.into());
                buf.put_slice(&m.body);
            }
            NasMessage::Sm(m) => {
                buf.put_u8(m.pdu_session_id);
                buf.put_u8(m.pti);
                buf.put_u8(m.message_type.into());
                buf.put_slice(&m.body);
            }
        }
    }
}

impl NasEncode for NasMessage {
    fn nas_encode<B: BufMut>(&self, buf: &mut B) -> CodecResult<()> {
        self.write_to(buf);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        match self {
            NasMessage::Mm(m) => Self::MM_HEADER_LEN + m.body.len(),
            NasMessage::Sm(m) => Self::SM_HEADER_LEN + m.body.len(),
        }
    }
}

impl NasDecode for NasMessage {
    fn nas_decode(view: &mut OctetView<'_>) -> CodecResult<Self> {
        let raw_epd = view.read()?;
        let epd = ExtendedProtocolDiscriminator::try_from(raw_epd)
            .map_err(|_| CodecError::InvalidProtocolDiscriminator(raw_epd))?;

        let message = match epd {
            ExtendedProtocolDiscriminator::MobilityManagement => {
                let sht = view.read()? & 0x0F;
                if sht != u8::from(SecurityHeaderType::NotProtected) {
                    return Err(CodecError::UnexpectedSecurityHeader(sht));
                }
                let raw_type = view.read()?;
                let message_type = MmMessageType::try_from(raw_type)
                    .map_err(|_| MessageTypeError::UnknownMmType(raw_type))?;
                NasMessage::mm(message_type, view.read_remaining().to_vec())
            }
            ExtendedProtocolDiscriminator::SessionManagement => {
                let pdu_session_id = view.read()?;
                let pti = view.read()?;
                let raw_type = view.read()?;
                let message_type = SmMessageType::try_from(raw_type)
                    .map_err(|_| MessageTypeError::UnknownSmType(raw_type))?;
                NasMessage::sm(pdu_session_id, pti, message_type, view.read_remaining().to_vec())
            }
        };
        Ok(message)
    }
}
