//! EAP and EAP-AKA' message codec (RFC 3748, RFC 4187, RFC 5448)
//!
//! Only what the key hierarchy needs: the EAP header, Identity type-data and
//! EAP-AKA' messages with their TLV attributes. Attributes keep insertion
//! order so that re-encoding a received message reproduces its octets, which
//! the AT_MAC computation depends on.
//!
//! ```text
//! | Code | Identifier | Length (2) | Type | Subtype | Reserved (2) | attributes ... |
//! attribute: | Type | Length (4-octet units) | value, zero padded ... |
//! ```

use nassec_common::{Endianness, Octet2, OctetView};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// Length of AT_MAC's MAC value
pub const AT_MAC_VALUE_SIZE: usize = 16;

/// Largest attribute value a one-octet length in 4-octet units can carry
pub const MAX_ATTRIBUTE_VALUE_SIZE: usize = u8::MAX as usize * 4 - 2;

/// Error type for EAP encoding/decoding
#[derive(Debug, Error)]
pub enum EapError {
    /// Buffer shorter than a field
    #[error(transparent)]
    Primitive(#[from] nassec_common::Error),
    /// Invalid EAP code
    #[error("Invalid EAP code: {0}")]
    InvalidCode(u8),
    /// Invalid or unsupported EAP type
    #[error("Invalid EAP type: {0}")]
    InvalidType(u8),
    /// Invalid EAP-AKA' subtype
    #[error("Invalid EAP-AKA' subtype: {0}")]
    InvalidSubType(u8),
    /// Unknown attribute type
    #[error("Invalid attribute type: {0}")]
    InvalidAttributeType(u8),
    /// Zero-length or oversized attribute
    #[error("Invalid attribute length: {0}")]
    InvalidAttributeLength(u8),
    /// Attribute value too long for its length field
    #[error("Attribute value of {0} octets exceeds {max}", max = MAX_ATTRIBUTE_VALUE_SIZE)]
    AttributeTooLong(usize),
    /// Packet too long for the EAP length field
    #[error("EAP message of {0} octets exceeds {max}", max = u16::MAX)]
    MessageTooLong(usize),
    /// EAP length field disagrees with the buffer
    #[error("EAP length field {length} does not match {available} available octets")]
    LengthMismatch {
        /// Length field value
        length: usize,
        /// Octets actually present
        available: usize,
    },
}

/// EAP Code values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum EapCode {
    Request = 1,
    Response = 2,
    Success = 3,
    Failure = 4,
}

/// EAP Type values handled here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum EapType {
    Identity = 1,
    EapAkaPrime = 50,
}

/// EAP-AKA' subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum EapAkaSubType {
    AkaChallenge = 1,
    AkaAuthenticationReject = 2,
    AkaSynchronizationFailure = 4,
    AkaIdentity = 5,
    AkaNotification = 12,
    AkaClientError = 14,
}

/// EAP-AKA' attribute types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum EapAttributeType {
    AtRand = 1,
    AtAutn = 2,
    AtRes = 3,
    AtAuts = 4,
    AtPadding = 6,
    AtPermanentIdReq = 10,
    AtMac = 11,
    AtNotification = 12,
    AtAnyIdReq = 13,
    AtIdentity = 14,
    AtFullauthIdReq = 17,
    AtCounter = 19,
    AtClientErrorCode = 22,
    AtKdfInput = 23,
    AtKdf = 24,
    AtIv = 129,
    AtEncrData = 130,
    AtCheckcode = 134,
    AtResultInd = 135,
    AtBidding = 136,
}

/// Ordered EAP-AKA' attribute list
///
/// Values are stored as they appear on the wire after the type and length
/// octets, including reserved fields and padding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EapAttributes {
    entries: Vec<(EapAttributeType, Vec<u8>)>,
}

impl EapAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of an attribute
    pub fn get(&self, key: EapAttributeType) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Insert or replace an attribute, zero padding the value so that
    /// `2 + value` is a multiple of four. Replacing keeps the original position.
    pub fn put_raw_attribute(&mut self, key: EapAttributeType, mut value: Vec<u8>) {
        let padded = (value.len() + 2).div_ceil(4) * 4 - 2;
        value.resize(padded, 0);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// AT_RAND value (after the reserved field)
    pub fn rand(&self) -> Option<&[u8]> {
        self.get(EapAttributeType::AtRand).and_then(|v| v.get(2..))
    }

    /// AT_AUTN value (after the reserved field)
    pub fn autn(&self) -> Option<&[u8]> {
        self.get(EapAttributeType::AtAutn).and_then(|v| v.get(2..))
    }

    /// AT_MAC value (after the reserved field)
    pub fn mac(&self) -> Option<&[u8]> {
        self.get(EapAttributeType::AtMac).and_then(|v| v.get(2..))
    }

    /// AT_RES value, trimmed to its bit length
    pub fn res(&self) -> Option<&[u8]> {
        let v = self.get(EapAttributeType::AtRes)?;
        let bits = usize::from(u16::from_be_bytes([*v.first()?, *v.get(1)?]));
        v.get(2..2 + bits.div_ceil(8))
    }

    /// AT_KDF value
    pub fn kdf(&self) -> Option<u16> {
        let v = self.get(EapAttributeType::AtKdf)?;
        Some(u16::from_be_bytes([*v.first()?, *v.get(1)?]))
    }

    /// AT_KDF_INPUT network name
    pub fn kdf_input(&self) -> Option<&[u8]> {
        let v = self.get(EapAttributeType::AtKdfInput)?;
        let len = usize::from(u16::from_be_bytes([*v.first()?, *v.get(1)?]));
        v.get(2..2 + len)
    }

    pub fn put_rand(&mut self, rand: &[u8]) {
        self.put_reserved(EapAttributeType::AtRand, rand);
    }

    pub fn put_autn(&mut self, autn: &[u8]) {
        self.put_reserved(EapAttributeType::AtAutn, autn);
    }

    pub fn put_mac(&mut self, mac: &[u8]) {
        self.put_reserved(EapAttributeType::AtMac, mac);
    }

    /// Set AT_MAC to sixteen zero octets, as required before computing the MAC.
    pub fn replace_mac(&mut self) {
        self.put_mac(&[0u8; AT_MAC_VALUE_SIZE]);
    }

    /// AT_RES with its bit length prefix
    pub fn put_res(&mut self, res: &[u8]) {
        self.put_length_prefixed(EapAttributeType::AtRes, (res.len() * 8) as u16, res);
    }

    pub fn put_kdf(&mut self, kdf: u16) {
        self.put_raw_attribute(EapAttributeType::AtKdf, kdf.to_be_bytes().to_vec());
    }

    pub fn put_kdf_input(&mut self, network_name: &str) {
        let name = network_name.as_bytes();
        self.put_length_prefixed(EapAttributeType::AtKdfInput, name.len() as u16, name);
    }

    fn put_reserved(&mut self, key: EapAttributeType, value: &[u8]) {
        self.put_length_prefixed(key, 0, value);
    }

    fn put_length_prefixed(&mut self, key: EapAttributeType, prefix: u16, value: &[u8]) {
        let mut data = Vec::with_capacity(2 + value.len());
        data.extend_from_slice(&prefix.to_be_bytes());
        data.extend_from_slice(value);
        self.put_raw_attribute(key, data);
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (EapAttributeType, &[u8])> {
        self.entries.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn encoded_len(&self) -> usize {
        self.entries.iter().map(|(_, v)| 2 + v.len()).sum()
    }
}

/// EAP-AKA' message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapAkaPrime {
    pub code: EapCode,
    pub id: u8,
    pub sub_type: EapAkaSubType,
    pub attributes: EapAttributes,
}

impl EapAkaPrime {
    pub fn new(code: EapCode, id: u8, sub_type: EapAkaSubType) -> Self {
        Self {
            code,
            id,
            sub_type,
            attributes: EapAttributes::new(),
        }
    }

    /// Copy of this message with AT_MAC zeroed (appended if absent)
    pub fn with_zero_mac(&self) -> Self {
        let mut copy = self.clone();
        copy.attributes.replace_mac();
        copy
    }
}

/// EAP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eap {
    /// Success / Failure, header only
    Simple { code: EapCode, id: u8 },
    /// EAP-Identity
    Identity { code: EapCode, id: u8, identity: Vec<u8> },
    /// EAP-AKA'
    AkaPrime(EapAkaPrime),
}

impl Eap {
    const HEADER_LEN: usize = 4;

    pub fn code(&self) -> EapCode {
        match self {
            Eap::Simple { code, .. } | Eap::Identity { code, .. } => *code,
            Eap::AkaPrime(m) => m.code,
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            Eap::Simple { id, .. } | Eap::Identity { id, .. } => *id,
            Eap::AkaPrime(m) => m.id,
        }
    }

    /// Value of the EAP length field
    pub fn encoded_len(&self) -> usize {
        match self {
            Eap::Simple { .. } => Self::HEADER_LEN,
            Eap::Identity { identity, .. } => Self::HEADER_LEN + 1 + identity.len(),
            Eap::AkaPrime(m) => Self::HEADER_LEN + 4 + m.attributes.encoded_len(),
        }
    }

    /// Encode to wire octets.
    ///
    /// Fails when an attribute or the whole packet does not fit its length
    /// field.
    pub fn encode(&self) -> Result<Vec<u8>, EapError> {
        let total = self.encoded_len();
        let length = u16::try_from(total).map_err(|_| EapError::MessageTooLong(total))?;
        let mut buf = Vec::with_capacity(total);
        buf.push(self.code().into());
        buf.push(self.id());
        buf.extend_from_slice(&Octet2::new(length).to_bytes(Endianness::Big));
        match self {
            Eap::Simple { .. } => {}
            Eap::Identity { identity, .. } => {
                buf.push(EapType::Identity.into());
                buf.extend_from_slice(identity);
            }
            Eap::AkaPrime(m) => {
                buf.push(EapType::EapAkaPrime.into());
                buf.push(m.sub_type.into());
                buf.extend_from_slice(&[0, 0]);
                for (key, value) in m.attributes.iter() {
                    let units = u8::try_from((2 + value.len()) / 4)
                        .map_err(|_| EapError::AttributeTooLong(value.len()))?;
                    buf.push(key.into());
                    buf.push(units);
                    buf.extend_from_slice(value);
                }
            }
        }
        Ok(buf)
    }

    /// Decode one EAP message; octets after its length field are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, EapError> {
        let mut view = OctetView::new(data);
        let raw_code = view.read()?;
        let code = EapCode::try_from(raw_code).map_err(|_| EapError::InvalidCode(raw_code))?;
        let id = view.read()?;
        let length = usize::from(view.read_octet2()?.value());
        if length < Self::HEADER_LEN || length > data.len() {
            return Err(EapError::LengthMismatch {
                length,
                available: data.len(),
            });
        }
        if length == Self::HEADER_LEN {
            return Ok(Eap::Simple { code, id });
        }

        let mut body = OctetView::new(view.read_bytes(length - Self::HEADER_LEN)?);
        let raw_type = body.read()?;
        match EapType::try_from(raw_type).map_err(|_| EapError::InvalidType(raw_type))? {
            EapType::Identity => Ok(Eap::Identity {
                code,
                id,
                identity: body.read_remaining().to_vec(),
            }),
            EapType::EapAkaPrime => {
                let raw_sub = body.read()?;
                let sub_type = EapAkaSubType::try_from(raw_sub)
                    .map_err(|_| EapError::InvalidSubType(raw_sub))?;
                body.skip(2)?;

                let mut msg = EapAkaPrime::new(code, id, sub_type);
                while body.has_next() {
                    let raw_key = body.read()?;
                    let key = EapAttributeType::try_from(raw_key)
                        .map_err(|_| EapError::InvalidAttributeType(raw_key))?;
                    let units = body.read()?;
                    if units == 0 {
                        return Err(EapError::InvalidAttributeLength(units));
                    }
                    let value = body.read_bytes(usize::from(units) * 4 - 2)?;
                    msg.attributes.put_raw_attribute(key, value.to_vec());
                }
                Ok(Eap::AkaPrime(msg))
            }
        }
    }
}
