//! Cryptographic primitives for nassec
//!
//! - Key derivation (3GPP KDF, PRF', EAP-AKA' key split)
//! - NEA2/NEA3 ciphering
//! - NIA2/NIA3 integrity

pub mod kdf;
pub mod nea;
pub mod nia;
