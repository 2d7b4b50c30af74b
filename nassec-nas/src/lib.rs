//! NAS security library
//!
//! Implements the 5G NAS security procedures of 3GPP TS 24.501 and TS 33.501:
//! - the per-association security context (keys, NAS COUNTs, algorithms)
//! - wiring of the key hierarchy from KAUSF down to the NAS keys
//! - protection and verification of NAS messages
//! - the minimal EAP-AKA' codec needed to compute AT_MAC
//!
//! # Message Structure
//!
//! - [`NasMessage`]: plain 5GMM (3-byte header) or 5GSM (4-byte header) message
//! - [`SecuredNasMessage`]: security protected container (7-byte header)
//!
//! # Example
//!
//! ```rust
//! use nassec_nas::context::{ConnectionIdentifier, NasEndpoint, NasSecurityContext};
//! use nassec_nas::enums::MmMessageType;
//! use nassec_nas::message::NasMessage;
//! use nassec_nas::protection::{decrypt, encrypt};
//! use nassec_nas::security::{CipheringAlgorithm, IntegrityAlgorithm, NasSecurityAlgorithms};
//!
//! let algs = NasSecurityAlgorithms::new(CipheringAlgorithm::Ea2, IntegrityAlgorithm::Ia2);
//! let mut ue = NasSecurityContext::new(NasEndpoint::Ue, ConnectionIdentifier::ThreeGpp);
//! let mut amf = NasSecurityContext::new(NasEndpoint::Network, ConnectionIdentifier::ThreeGpp);
//! for ctx in [&mut ue, &mut amf] {
//!     ctx.set_algorithms(algs);
//!     ctx.install_nas_keys(&[0x01; 16], &[0x02; 16]).unwrap();
//!     ctx.activate().unwrap();
//! }
//!
//! let msg = NasMessage::mm(MmMessageType::RegistrationComplete, vec![]);
//! let secured = encrypt(&msg, &mut ue).unwrap();
//! assert_eq!(decrypt(&secured, &mut amf).unwrap(), Some(msg));
//! ```

pub mod codec;
pub mod context;
pub mod eap;
pub mod enums;
pub mod keys;
pub mod message;
pub mod protection;
pub mod security;

pub use codec::{CodecError, CodecResult, NasDecode, NasEncode};
pub use context::{
    ConnectionIdentifier, NasEndpoint, NasSecurityContext, SecurityContextState, UeKeys,
};
pub use eap::{
    Eap, EapAkaPrime, EapAkaSubType, EapAttributeType, EapAttributes, EapCode, EapError, EapType,
};
pub use enums::{
    ExtendedProtocolDiscriminator, MessageType, MmMessageType, SecurityHeaderType, SmMessageType,
};
pub use keys::{
    calculate_eap_aka_prime_mac, derive_kausf_5g_aka, derive_keys_seaf_amf, derive_nas_keys,
    establish_eap_aka_prime, verify_eap_aka_prime_mac,
};
pub use message::{NasMessage, PlainMmMessage, PlainSmMessage};
pub use protection::{classify_header, decrypt, encrypt};
pub use security::{
    apply_nas_cipher, compute_nas_mac, estimate_downlink_count, CipheringAlgorithm,
    IntegrityAlgorithm, NasCount, NasDirection, NasKeySetIdentifier, NasSecurityAlgorithms,
    SecuredNasMessage, SecurityContextType, SecurityError,
};
