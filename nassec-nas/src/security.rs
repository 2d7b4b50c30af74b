//! NAS security building blocks
//!
//! Algorithm identifiers, NAS COUNT arithmetic, the security-protected
//! message container and the MAC/cipher dispatch used by
//! [`protection`](crate::protection).
//!
//! Algorithm identifiers are 3-bit wire values. Every value 0-7 decodes to a
//! variant; only the variants with a registered primitive can actually run.
//! Reaching an unregistered one at dispatch time is a configuration fault
//! ([`SecurityError::UnsupportedCipheringAlgorithm`] /
//! [`SecurityError::UnsupportedIntegrityAlgorithm`]), never a silent fallback
//! to the null algorithm.

use std::fmt;

use bytes::BufMut;
use nassec_common::{BitString, Endianness, Octet, Octet3, OctetString, OctetView, SupportedAlgs};
use nassec_crypto::nea::{self, CipherFn};
use nassec_crypto::nia::{self, IntegrityFn, KEY_SIZE, MAC_SIZE};
use num_enum::IntoPrimitive;

use crate::codec::{CodecError, CodecResult, NasDecode, NasEncode};
use crate::context::SecurityContextState;
use crate::enums::{ExtendedProtocolDiscriminator, SecurityHeaderType};

/// Security-related errors
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    /// The negotiated ciphering algorithm has no primitive
    #[error("Unsupported ciphering algorithm: {0}")]
    UnsupportedCipheringAlgorithm(CipheringAlgorithm),
    /// The negotiated integrity algorithm has no primitive
    #[error("Unsupported integrity algorithm: {0}")]
    UnsupportedIntegrityAlgorithm(IntegrityAlgorithm),
    /// A key needed by the operation has not been derived
    #[error("Missing key: {0}")]
    MissingKey(&'static str),
    /// encrypt/decrypt called outside the Active state
    #[error("Security context not active (state {0:?})")]
    SecurityContextNotActive(SecurityContextState),
    /// Lifecycle transition that the state machine does not allow
    #[error("Invalid security context transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: SecurityContextState,
        to: SecurityContextState,
    },
    /// NAS COUNT would exceed 24 bits
    #[error("NAS count overflow detected")]
    NasCountOverflow,
    /// Malformed container or plain message
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] nassec_common::Error),
}

/// 5G NAS ciphering algorithm (3-bit identifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive)]
#[repr(u8)]
pub enum CipheringAlgorithm {
    /// NEA0, null ciphering
    #[default]
    Ea0 = 0,
    /// 128-NEA1 (SNOW 3G), not implemented
    Ea1 = 1,
    /// 128-NEA2 (AES-CTR)
    Ea2 = 2,
    /// 128-NEA3 (ZUC)
    Ea3 = 3,
    /// Reserved, no primitive
    Ea4 = 4,
    /// Reserved, no primitive
    Ea5 = 5,
    /// Reserved, no primitive
    Ea6 = 6,
    /// Reserved, no primitive
    Ea7 = 7,
}

impl CipheringAlgorithm {
    /// Decodes the low 3 bits of `id`.
    pub fn from_id(id: u8) -> Self {
        match id & 0b111 {
            0 => Self::Ea0,
            1 => Self::Ea1,
            2 => Self::Ea2,
            3 => Self::Ea3,
            4 => Self::Ea4,
            5 => Self::Ea5,
            6 => Self::Ea6,
            _ => Self::Ea7,
        }
    }

    /// Wire identifier
    pub fn id(self) -> u8 {
        self.into()
    }

    /// Returns true for NEA0.
    pub fn is_null(self) -> bool {
        self == Self::Ea0
    }

    /// Ciphering primitive for this identifier.
    ///
    /// `None` for NEA0, which has no primitive, and for identifiers without an
    /// implementation.
    pub fn cipher_fn(self) -> Option<CipherFn> {
        match self {
            Self::Ea2 => Some(nea::nea2_encrypt),
            Self::Ea3 => Some(nea::nea3_encrypt),
            _ => None,
        }
    }

    /// Returns true if this algorithm can run.
    pub fn is_implemented(self) -> bool {
        self.is_null() || self.cipher_fn().is_some()
    }
}

impl fmt::Display for CipheringAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NEA{}", self.id())
    }
}

/// 5G NAS integrity algorithm (3-bit identifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive)]
#[repr(u8)]
pub enum IntegrityAlgorithm {
    /// NIA0, null integrity
    #[default]
    Ia0 = 0,
    /// 128-NIA1 (SNOW 3G), not implemented
    Ia1 = 1,
    /// 128-NIA2 (AES-CMAC)
    Ia2 = 2,
    /// 128-NIA3 (ZUC)
    Ia3 = 3,
    /// Reserved, no primitive
    Ia4 = 4,
    /// Reserved, no primitive
    Ia5 = 5,
    /// Reserved, no primitive
    Ia6 = 6,
    /// Reserved, no primitive
    Ia7 = 7,
}

impl IntegrityAlgorithm {
    /// Decodes the low 3 bits of `id`.
    pub fn from_id(id: u8) -> Self {
        match id & 0b111 {
            0 => Self::Ia0,
            1 => Self::Ia1,
            2 => Self::Ia2,
            3 => Self::Ia3,
            4 => Self::Ia4,
            5 => Self::Ia5,
            6 => Self::Ia6,
            _ => Self::Ia7,
        }
    }

    /// Wire identifier
    pub fn id(self) -> u8 {
        self.into()
    }

    /// Returns true for NIA0.
    pub fn is_null(self) -> bool {
        self == Self::Ia0
    }

    /// MAC primitive for this identifier; `None` for NIA0 and unimplemented ids.
    pub fn integrity_fn(self) -> Option<IntegrityFn> {
        match self {
            Self::Ia2 => Some(nia::nia2_compute_mac),
            Self::Ia3 => Some(nia::nia3_compute_mac),
            _ => None,
        }
    }

    /// Returns true if this algorithm can run.
    pub fn is_implemented(self) -> bool {
        self.is_null() || self.integrity_fn().is_some()
    }
}

impl fmt::Display for IntegrityAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NIA{}", self.id())
    }
}

/// Selected NAS security algorithms
///
/// Wire octet (TS 24.501 9.11.3.34): ciphering type in the high nibble,
/// integrity type in the low nibble, each masked to 3 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NasSecurityAlgorithms {
    /// Ciphering algorithm
    pub ciphering: CipheringAlgorithm,
    /// Integrity algorithm
    pub integrity: IntegrityAlgorithm,
}

impl NasSecurityAlgorithms {
    /// Network-side preference for ciphering
    const CIPHERING_PREFERENCE: [u8; 3] = [2, 3, 0];
    /// Network-side preference for integrity
    const INTEGRITY_PREFERENCE: [u8; 2] = [2, 3];

    /// Create a new algorithm selection
    pub fn new(ciphering: CipheringAlgorithm, integrity: IntegrityAlgorithm) -> Self {
        Self {
            ciphering,
            integrity,
        }
    }

    /// Encode to the selected algorithms octet
    pub fn encode(&self) -> u8 {
        Octet::from_nibbles(self.ciphering.id(), self.integrity.id()).value()
    }

    /// Decode from the selected algorithms octet
    pub fn decode(value: u8) -> Self {
        let octet = Octet::new(value);
        Self {
            ciphering: CipheringAlgorithm::from_id(octet.high_nibble()),
            integrity: IntegrityAlgorithm::from_id(octet.low_nibble()),
        }
    }

    /// Picks the strongest implemented pair the UE also supports.
    ///
    /// Returns `None` when no non-null integrity algorithm is shared.
    pub fn select(ue: &SupportedAlgs) -> Option<Self> {
        let integrity = Self::INTEGRITY_PREFERENCE
            .into_iter()
            .map(IntegrityAlgorithm::from_id)
            .find(|alg| alg.is_implemented() && ue.supports_integrity(alg.id()))?;
        let ciphering = Self::CIPHERING_PREFERENCE
            .into_iter()
            .map(CipheringAlgorithm::from_id)
            .find(|alg| alg.is_implemented() && ue.supports_ciphering(alg.id()))
            .unwrap_or(CipheringAlgorithm::Ea0);
        Some(Self::new(ciphering, integrity))
    }
}

/// Type of security context flag (TSC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityContextType {
    /// Native security context
    #[default]
    Native,
    /// Mapped security context
    Mapped,
}

/// NAS key set identifier (ngKSI), a half-octet `TSC(1) | KSI(3)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NasKeySetIdentifier {
    /// Type of security context
    pub tsc: SecurityContextType,
    /// Key set identifier (0-6, 7 = no key available)
    pub ksi: u8,
}

impl NasKeySetIdentifier {
    /// KSI value meaning "no key is available"
    pub const NO_KEY: u8 = 0b111;

    /// Create a new identifier; `ksi` is truncated to 3 bits.
    pub fn new(tsc: SecurityContextType, ksi: u8) -> Self {
        Self {
            tsc,
            ksi: ksi & 0b111,
        }
    }

    /// Identifier meaning no key is available
    pub fn no_key() -> Self {
        Self::new(SecurityContextType::Native, Self::NO_KEY)
    }

    /// Returns true if no key is available
    pub fn is_no_key(&self) -> bool {
        self.ksi == Self::NO_KEY
    }

    /// Encode to a half-octet value
    pub fn encode(&self) -> u8 {
        let tsc = match self.tsc {
            SecurityContextType::Native => 0,
            SecurityContextType::Mapped => 1,
        };
        (tsc << 3) | self.ksi
    }

    /// Decode from the low nibble of `value`
    pub fn decode(value: u8) -> Self {
        let tsc = if Octet::new(value).bit(4) {
            SecurityContextType::Mapped
        } else {
            SecurityContextType::Native
        };
        Self::new(tsc, value)
    }
}

impl Default for NasKeySetIdentifier {
    fn default() -> Self {
        Self::no_key()
    }
}

/// NAS COUNT: a 16-bit overflow counter and the 8-bit sequence number sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NasCount {
    /// Overflow counter, never transmitted
    pub overflow: u16,
    /// Sequence number, the low octet of the count
    pub sqn: u8,
}

impl NasCount {
    /// Largest representable count
    pub const MAX: NasCount = NasCount {
        overflow: u16::MAX,
        sqn: u8::MAX,
    };

    /// Create a new NAS count
    pub fn new(overflow: u16, sqn: u8) -> Self {
        Self { overflow, sqn }
    }

    /// 32-bit value fed to the algorithms: `0x00 || overflow || sqn`
    pub fn to_u32(&self) -> u32 {
        let [high, low] = self.overflow.to_be_bytes();
        Octet3::from_bytes([high, low, self.sqn], Endianness::Big).value()
    }

    /// Inverse of [`to_u32`](Self::to_u32); the top octet is ignored.
    pub fn from_u32(value: u32) -> Self {
        let [high, low, sqn] = Octet3::new(value).to_bytes(Endianness::Big);
        Self {
            overflow: u16::from_be_bytes([high, low]),
            sqn,
        }
    }

    /// Advance by one, rolling the overflow when the sequence number wraps.
    pub fn increment(&mut self) -> Result<(), SecurityError> {
        if *self == Self::MAX {
            return Err(SecurityError::NasCountOverflow);
        }
        self.sqn = self.sqn.wrapping_add(1);
        if self.sqn == 0 {
            self.overflow += 1;
        }
        Ok(())
    }
}

impl fmt::Display for NasCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.overflow, self.sqn)
    }
}

/// Reconstructs a full receive count from the last known count and a received sqn.
///
/// A received sqn numerically below the stored one means the sender wrapped
/// exactly once. A wrap past the highest overflow value is
/// [`SecurityError::NasCountOverflow`]; the count never rolls back to zero.
pub fn estimate_downlink_count(
    last: NasCount,
    received_sqn: u8,
) -> Result<NasCount, SecurityError> {
    let overflow = if received_sqn < last.sqn {
        last.overflow
            .checked_add(1)
            .ok_or(SecurityError::NasCountOverflow)?
    } else {
        last.overflow
    };
    Ok(NasCount::new(overflow, received_sqn))
}

/// Direction bit fed to the algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum NasDirection {
    /// UE to network
    Uplink = 0,
    /// Network to UE
    Downlink = 1,
}

/// Security-protected NAS message
///
/// ```text
/// | EPD | spare(4) SHT(4) | MAC (4) | SQN | payload ... |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuredNasMessage {
    /// Extended protocol discriminator of the outer header
    pub epd: ExtendedProtocolDiscriminator,
    /// Security header type
    pub security_header_type: SecurityHeaderType,
    /// Message authentication code
    pub mac: [u8; MAC_SIZE],
    /// Sequence number (low octet of the sender's count)
    pub sequence_number: u8,
    /// Plain or ciphered NAS message
    pub payload: Vec<u8>,
}

impl SecuredNasMessage {
    /// Length of the security protected header
    pub const HEADER_LEN: usize = 7;

    /// Create a new 5GMM security-protected message
    pub fn new(
        security_header_type: SecurityHeaderType,
        mac: [u8; MAC_SIZE],
        sequence_number: u8,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            epd: ExtendedProtocolDiscriminator::MobilityManagement,
            security_header_type,
            mac,
            sequence_number,
            payload,
        }
    }

    /// Returns true if the payload is ciphered
    pub fn is_ciphered(&self) -> bool {
        self.security_header_type.is_ciphered()
    }

    /// Encodes to wire octets.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf
    }

    /// Decodes a complete container.
    pub fn decode(data: &[u8]) -> CodecResult<Self> {
        Self::from_bytes(data)
    }

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        // spare half octet, then the security header type
        let mut header = BitString::new();
        header.write_bits(0, 4);
        header.write_bits(u8::from(self.security_header_type).into(), 4);
        buf.put_u8(self.epd.into());
        buf.put_slice(&header.into_bytes());
        buf.put_slice(&self.mac);
        buf.put_u8(self.sequence_number);
        buf.put_slice(&self.payload);
    }
}

impl NasEncode for SecuredNasMessage {
    fn nas_encode<B: BufMut>(&self, buf: &mut B) -> CodecResult<()> {
        self.write_to(buf);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        Self::HEADER_LEN + self.payload.len()
    }
}

impl NasDecode for SecuredNasMessage {
    fn nas_decode(view: &mut OctetView<'_>) -> CodecResult<Self> {
        let raw_epd = view.read()?;
        let epd = ExtendedProtocolDiscriminator::try_from(raw_epd)
            .map_err(|_| CodecError::InvalidProtocolDiscriminator(raw_epd))?;
        let raw_sht = Octet::new(view.read()?).low_nibble();
        let security_header_type = SecurityHeaderType::try_from(raw_sht)
            .map_err(|_| CodecError::InvalidSecurityHeaderType(raw_sht))?;
        let mac = view.read_array::<MAC_SIZE>()?;
        let sequence_number = view.read()?;
        let payload = view.read_remaining().to_vec();

        Ok(Self {
            epd,
            security_header_type,
            mac,
            sequence_number,
            payload,
        })
    }
}

/// Computes the NAS MAC over `sqn || payload`.
///
/// NIA0 yields four zero octets without touching the key or any primitive.
pub fn compute_nas_mac(
    algorithm: IntegrityAlgorithm,
    key: Option<&[u8; KEY_SIZE]>,
    count: NasCount,
    bearer: u8,
    direction: NasDirection,
    payload: &[u8],
) -> Result<[u8; MAC_SIZE], SecurityError> {
    if algorithm.is_null() {
        return Ok([0u8; MAC_SIZE]);
    }
    let mac_fn = algorithm
        .integrity_fn()
        .ok_or(SecurityError::UnsupportedIntegrityAlgorithm(algorithm))?;
    let key = key.ok_or(SecurityError::MissingKey("KNASint"))?;

    let mut data = OctetString::from_octet(count.sqn);
    data.append_slice(payload);

    Ok(mac_fn(count.to_u32(), bearer, direction.into(), key, data.data()))
}

/// Applies the ciphering keystream in place. NEA0 leaves `data` unchanged.
pub fn apply_nas_cipher(
    algorithm: CipheringAlgorithm,
    key: Option<&[u8; KEY_SIZE]>,
    count: NasCount,
    bearer: u8,
    direction: NasDirection,
    data: &mut [u8],
) -> Result<(), SecurityError> {
    if algorithm.is_null() {
        return Ok(());
    }
    let cipher = algorithm
        .cipher_fn()
        .ok_or(SecurityError::UnsupportedCipheringAlgorithm(algorithm))?;
    let key = key.ok_or(SecurityError::MissingKey("KNASenc"))?;
    cipher(count.to_u32(), bearer, direction.into(), key, data);
    Ok(())
}

/// Constant-time equality for MACs.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_ids_cover_three_bits() {
        for id in 0..8u8 {
            assert_eq!(CipheringAlgorithm::from_id(id).id(), id);
            assert_eq!(IntegrityAlgorithm::from_id(id).id(), id);
        }
        assert_eq!(CipheringAlgorithm::from_id(0x0A), CipheringAlgorithm::Ea2);
        assert_eq!(IntegrityAlgorithm::from_id(0xFB), IntegrityAlgorithm::Ia3);
    }

    #[test]
    fn test_dispatch_table() {
        assert!(CipheringAlgorithm::Ea0.cipher_fn().is_none());
        assert!(CipheringAlgorithm::Ea0.is_implemented());
        assert!(CipheringAlgorithm::Ea2.cipher_fn().is_some());
        assert!(CipheringAlgorithm::Ea3.cipher_fn().is_some());
        for id in [1u8, 4, 5, 6, 7] {
            assert!(!CipheringAlgorithm::from_id(id).is_implemented());
            assert!(!IntegrityAlgorithm::from_id(id).is_implemented());
        }
        assert!(IntegrityAlgorithm::Ia2.integrity_fn().is_some());
        assert_eq!(IntegrityAlgorithm::Ia3.to_string(), "NIA3");
        assert_eq!(CipheringAlgorithm::Ea1.to_string(), "NEA1");
    }

    #[test]
    fn test_algorithms_octet() {
        let algs = NasSecurityAlgorithms::new(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia3);
        assert_eq!(algs.encode(), 0x23);
        assert_eq!(NasSecurityAlgorithms::decode(0x23), algs);
        // spare bits are masked
        let decoded = NasSecurityAlgorithms::decode(0xFA);
        assert_eq!(decoded.ciphering, CipheringAlgorithm::Ea7);
        assert_eq!(decoded.integrity, IntegrityAlgorithm::Ia2);
    }

    #[test]
    fn test_select_prefers_aes() {
        let algs = NasSecurityAlgorithms::select(&SupportedAlgs::default()).unwrap();
        assert_eq!(algs.ciphering, CipheringAlgorithm::Ea2);
        assert_eq!(algs.integrity, IntegrityAlgorithm::Ia2);
    }

    #[test]
    fn test_select_falls_back() {
        let ue = SupportedAlgs {
            nia1: true,
            nia2: false,
            nia3: true,
            nea1: true,
            nea2: false,
            nea3: false,
        };
        let algs = NasSecurityAlgorithms::select(&ue).unwrap();
        assert_eq!(algs.ciphering, CipheringAlgorithm::Ea0);
        assert_eq!(algs.integrity, IntegrityAlgorithm::Ia3);

        let only_snow = SupportedAlgs {
            nia1: true,
            nia2: false,
            nia3: false,
            ..ue
        };
        assert!(NasSecurityAlgorithms::select(&only_snow).is_none());
    }

    #[test]
    fn test_ng_ksi() {
        let ksi = NasKeySetIdentifier::new(SecurityContextType::Mapped, 3);
        assert_eq!(ksi.encode(), 0b1011);
        assert_eq!(NasKeySetIdentifier::decode(0b1011), ksi);
        assert!(NasKeySetIdentifier::default().is_no_key());
        assert_eq!(NasKeySetIdentifier::no_key().encode(), 0x07);
    }

    #[test]
    fn test_count_to_u32() {
        let count = NasCount::new(0x1234, 0x56);
        assert_eq!(count.to_u32(), 0x0012_3456);
        assert_eq!(NasCount::from_u32(0xFF12_3456), count);
    }

    #[test]
    fn test_count_increment_wraps_sqn() {
        let mut count = NasCount::new(0, 255);
        count.increment().unwrap();
        assert_eq!(count, NasCount::new(1, 0));
    }

    #[test]
    fn test_count_increment_at_max() {
        let mut count = NasCount::MAX;
        assert!(matches!(count.increment(), Err(SecurityError::NasCountOverflow)));
        assert_eq!(count, NasCount::MAX);
    }

    #[test]
    fn test_estimate_downlink_count() {
        let last = NasCount::new(3, 200);
        assert_eq!(estimate_downlink_count(last, 201).unwrap(), NasCount::new(3, 201));
        assert_eq!(estimate_downlink_count(last, 200).unwrap(), NasCount::new(3, 200));
        assert_eq!(estimate_downlink_count(last, 5).unwrap(), NasCount::new(4, 5));
        assert_eq!(
            estimate_downlink_count(NasCount::new(0, 255), 0).unwrap(),
            NasCount::new(1, 0)
        );
    }

    #[test]
    fn test_estimate_downlink_count_at_ceiling() {
        let last = NasCount::new(u16::MAX, 200);
        assert_eq!(estimate_downlink_count(last, 201).unwrap(), NasCount::new(u16::MAX, 201));
        assert!(matches!(
            estimate_downlink_count(last, 5),
            Err(SecurityError::NasCountOverflow)
        ));
        assert!(matches!(
            estimate_downlink_count(NasCount::MAX, 0),
            Err(SecurityError::NasCountOverflow)
        ));
    }

    #[test]
    fn test_secured_message_layout() {
        let msg = SecuredNasMessage::new(
            SecurityHeaderType::IntegrityProtectedAndCiphered,
            [0xDE, 0xAD, 0xBE, 0xEF],
            0x2A,
            vec![0x01, 0x02],
        );
        let bytes = msg.encode();
        assert_eq!(bytes, vec![0x7E, 0x02, 0xDE, 0xAD, 0xBE, 0xEF, 0x2A, 0x01, 0x02]);
        assert_eq!(msg.encoded_len(), SecuredNasMessage::HEADER_LEN + 2);
        assert_eq!(SecuredNasMessage::decode(&bytes).unwrap(), msg);
        assert!(msg.is_ciphered());
    }

    #[test]
    fn test_header_octets_pack_half_octets() {
        let msg = SecuredNasMessage::new(
            SecurityHeaderType::IntegrityProtectedWithNewSecurityContext,
            [0; MAC_SIZE],
            0,
            Vec::new(),
        );
        assert_eq!(msg.encode()[1], 0x03);
        assert_eq!(NasCount::new(0x1234, 0x56).to_u32(), 0x0012_3456);
        assert_eq!(NasCount::from_u32(0xFF12_3456), NasCount::new(0x1234, 0x56));
        let ksi = NasKeySetIdentifier::decode(0xF8);
        assert_eq!(ksi.tsc, SecurityContextType::Mapped);
        assert_eq!(ksi.ksi, 0);
    }

    #[test]
    fn test_secured_message_ignores_spare_nibble() {
        let bytes = [0x7E, 0xF1, 0, 0, 0, 0, 9];
        let msg = SecuredNasMessage::decode(&bytes).unwrap();
        assert_eq!(msg.security_header_type, SecurityHeaderType::IntegrityProtected);
        assert!(msg.payload.is_empty());
    }

    #[test]
    fn test_secured_message_errors() {
        let short = SecuredNasMessage::decode(&[0x7E, 0x01, 0, 0, 0]).unwrap_err();
        assert!(short.is_boundary());
        assert!(matches!(
            SecuredNasMessage::decode(&[0x7E, 0x05, 0, 0, 0, 0, 0]),
            Err(CodecError::InvalidSecurityHeaderType(5))
        ));
    }

    #[test]
    fn test_null_mac_needs_no_key() {
        let mac = compute_nas_mac(
            IntegrityAlgorithm::Ia0,
            None,
            NasCount::new(0, 1),
            1,
            NasDirection::Uplink,
            &[0x7E, 0x00, 0x41],
        )
        .unwrap();
        assert_eq!(mac, [0u8; 4]);
    }

    #[test]
    fn test_mac_covers_sqn() {
        let key = [0x11u8; 16];
        let payload = [0x7E, 0x00, 0x43];
        let mac = compute_nas_mac(
            IntegrityAlgorithm::Ia2,
            Some(&key),
            NasCount::new(0, 1),
            1,
            NasDirection::Uplink,
            &payload,
        )
        .unwrap();
        let direct = nia::nia2_compute_mac(1, 1, 0, &key, &[1, 0x7E, 0x00, 0x43]);
        assert_eq!(mac, direct);
    }

    #[test]
    fn test_dispatch_faults() {
        let key = [0u8; 16];
        let count = NasCount::default();
        let up = NasDirection::Uplink;
        assert!(matches!(
            compute_nas_mac(IntegrityAlgorithm::Ia1, Some(&key), count, 1, up, &[]),
            Err(SecurityError::UnsupportedIntegrityAlgorithm(IntegrityAlgorithm::Ia1))
        ));
        assert!(matches!(
            compute_nas_mac(IntegrityAlgorithm::Ia2, None, count, 1, up, &[]),
            Err(SecurityError::MissingKey(_))
        ));
        let mut data = vec![1, 2, 3];
        assert!(matches!(
            apply_nas_cipher(CipheringAlgorithm::Ea5, Some(&key), count, 1, up, &mut data),
            Err(SecurityError::UnsupportedCipheringAlgorithm(CipheringAlgorithm::Ea5))
        ));
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn test_null_cipher_passthrough() {
        let mut data = vec![0x7E, 0x00, 0x5E];
        let count = NasCount::new(0, 7);
        apply_nas_cipher(CipheringAlgorithm::Ea0, None, count, 1, NasDirection::Uplink, &mut data)
            .unwrap();
        assert_eq!(data, vec![0x7E, 0x00, 0x5E]);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&[1, 2, 3, 4], &[1, 2, 3, 4]));
        assert!(!constant_time_eq(&[1, 2, 3, 4], &[1, 2, 3, 5]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 3, 4]));
    }
}
