//! Key derivation functions for 5G security
//!
//! Every key in the NAS hierarchy is produced by one generic function,
//! [`calculate_kdf_key`], which is HMAC-SHA-256 over a function-code-tagged,
//! length-framed parameter string (3GPP TS 33.220 Annex B.2). The derivations
//! below only differ in key, FC value, parameters and which part of the output
//! they keep:
//!
//! ```text
//! CK || IK ──┬── KAUSF (5G-AKA) ──┐
//!            ├── RES*             │
//!            └── CK' / IK' ── MK ─┴─ KAUSF (EAP-AKA')
//!                                      └── KSEAF ── KAMF ──┬── KNASenc
//!                                                          └── KNASint
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use unicode_normalization::UnicodeNormalization;

/// HMAC-SHA256 output size in bytes
pub const HMAC_SHA256_SIZE: usize = 32;

/// Key size for 256-bit keys
pub const KEY_256_SIZE: usize = 32;

/// Key size for 128-bit keys
pub const KEY_128_SIZE: usize = 16;

/// Length of the EAP-AKA' master key output (RFC 5448 Section 3.3)
pub const MK_SIZE: usize = 208;

/// Offset of the EMSK within the EAP-AKA' master key output
pub const EMSK_OFFSET: usize = 144;

/// Size of the RES* / XRES* value
pub const RES_STAR_SIZE: usize = 16;

/// Size of the EAP-AKA' AT_MAC value
pub const EAP_MAC_SIZE: usize = 16;

/// ABBA value used for the initial 5G security context (TS 33.501 A.7.1)
pub const DEFAULT_ABBA: [u8; 2] = [0x00, 0x00];

/// FC values for key derivation as defined in 3GPP TS 33.501 Annex A
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FcValue {
    /// FC = 0x20: Derivation of CK' and IK' (TS 33.402 A.2)
    CkIkPrime = 0x20,
    /// FC = 0x69: Derivation of `KNASint` and `KNASenc` from KAMF
    NasKey = 0x69,
    /// FC = 0x6A: Derivation of KAUSF from CK and IK
    Kausf = 0x6A,
    /// FC = 0x6B: Derivation of RES* from CK and IK
    ResStar = 0x6B,
    /// FC = 0x6C: Derivation of KSEAF from KAUSF
    Kseaf = 0x6C,
    /// FC = 0x6D: Derivation of KAMF from KSEAF
    Kamf = 0x6D,
}

/// Algorithm type distinguisher for NAS key derivation (TS 33.501 A.8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlgorithmTypeDistinguisher {
    /// NAS encryption algorithm
    NasEnc = 0x01,
    /// NAS integrity algorithm
    NasInt = 0x02,
}

/// Compute HMAC-SHA256
pub fn hmac_sha256(key: &[u8], input: &[u8]) -> [u8; HMAC_SHA256_SIZE] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts keys of any size"));
    mac.update(input);
    let mut output = [0u8; HMAC_SHA256_SIZE];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}

/// Builds the KDF input string `S = FC || P0 || L0 || ... || Pn || Ln`
/// (TS 33.220 Annex B.2).
///
/// Each `Li` is the length of `Pi` as two big-endian octets and follows its
/// parameter.
pub fn build_kdf_input(fc: u8, parameters: &[&[u8]]) -> Vec<u8> {
    let total: usize = parameters.iter().map(|p| p.len() + 2).sum();
    let mut input = Vec::with_capacity(1 + total);
    input.push(fc);
    for param in parameters {
        input.extend_from_slice(param);
        input.extend_from_slice(&(param.len() as u16).to_be_bytes());
    }
    input
}

/// Generic 3GPP KDF: `HMAC-SHA-256(key, S)` with `S` from [`build_kdf_input`].
///
/// The key may have any length; callers pass 256-bit keys or CK || IK.
pub fn calculate_kdf_key(key: &[u8], fc: u8, parameters: &[&[u8]]) -> [u8; KEY_256_SIZE] {
    hmac_sha256(key, &build_kdf_input(fc, parameters))
}

/// PRF' from RFC 5448 Section 3.4.
///
/// ```text
/// T1 = HMAC(K, S | 0x01)
/// Ti = HMAC(K, Ti-1 | S | i)
/// PRF'(K, S) = T1 | T2 | ... truncated to output_length
/// ```
///
/// # Panics
/// Panics if `output_length` needs more than 255 rounds.
pub fn calculate_prf_prime(key: &[u8], input: &[u8], output_length: usize) -> Vec<u8> {
    let rounds = output_length.div_ceil(HMAC_SHA256_SIZE);
    assert!(rounds <= 255, "PRF' output length too large");

    let mut output = Vec::with_capacity(rounds * HMAC_SHA256_SIZE);
    let mut previous: Option<[u8; HMAC_SHA256_SIZE]> = None;
    for i in 1..=rounds {
        let mut s = Vec::with_capacity(HMAC_SHA256_SIZE + input.len() + 1);
        if let Some(t) = previous {
            s.extend_from_slice(&t);
        }
        s.extend_from_slice(input);
        s.push(i as u8);

        let t = hmac_sha256(key, &s);
        output.extend_from_slice(&t);
        previous = Some(t);
    }
    output.truncate(output_length);
    output
}

/// Encodes a character string parameter (TS 33.220 B.2.1.2): NFKC, then UTF-8.
pub fn encode_kdf_string(value: &str) -> Vec<u8> {
    value.nfkc().collect::<String>().into_bytes()
}

fn concat_ck_ik(ck: &[u8; KEY_128_SIZE], ik: &[u8; KEY_128_SIZE]) -> [u8; KEY_256_SIZE] {
    let mut key = [0u8; KEY_256_SIZE];
    key[..KEY_128_SIZE].copy_from_slice(ck);
    key[KEY_128_SIZE..].copy_from_slice(ik);
    key
}

/// Derive KAUSF for 5G-AKA (3GPP TS 33.501 Annex A.2)
///
/// KAUSF = KDF(CK || IK, 0x6A, SN name, SQN ⊕ AK)
pub fn derive_kausf(
    ck: &[u8; KEY_128_SIZE],
    ik: &[u8; KEY_128_SIZE],
    sn_name: &str,
    sqn_xor_ak: &[u8; 6],
) -> [u8; KEY_256_SIZE] {
    let snn = encode_kdf_string(sn_name);
    calculate_kdf_key(&concat_ck_ik(ck, ik), FcValue::Kausf as u8, &[&snn, sqn_xor_ak])
}

/// Derive the anchor key KSEAF from KAUSF (3GPP TS 33.501 Annex A.6)
pub fn derive_kseaf(kausf: &[u8; KEY_256_SIZE], sn_name: &str) -> [u8; KEY_256_SIZE] {
    let snn = encode_kdf_string(sn_name);
    calculate_kdf_key(kausf, FcValue::Kseaf as u8, &[&snn])
}

/// Derive the mobility management key KAMF from KSEAF (3GPP TS 33.501 Annex A.7)
///
/// KAMF = KDF(KSEAF, 0x6D, SUPI, ABBA)
pub fn derive_kamf(kseaf: &[u8; KEY_256_SIZE], supi: &str, abba: &[u8]) -> [u8; KEY_256_SIZE] {
    let supi = encode_kdf_string(supi);
    calculate_kdf_key(kseaf, FcValue::Kamf as u8, &[&supi, abba])
}

/// Derive a NAS key from KAMF (3GPP TS 33.501 Annex A.8)
///
/// The key is the least significant 128 bits of the KDF output.
pub fn derive_nas_key(
    kamf: &[u8; KEY_256_SIZE],
    algorithm_type: AlgorithmTypeDistinguisher,
    algorithm_id: u8,
) -> [u8; KEY_128_SIZE] {
    let output = calculate_kdf_key(
        kamf,
        FcValue::NasKey as u8,
        &[&[algorithm_type as u8], &[algorithm_id]],
    );
    let mut key = [0u8; KEY_128_SIZE];
    key.copy_from_slice(&output[KEY_256_SIZE - KEY_128_SIZE..]);
    key
}

/// Derive `KNASenc` for ciphering algorithm `algorithm_id`
pub fn derive_knas_enc(kamf: &[u8; KEY_256_SIZE], algorithm_id: u8) -> [u8; KEY_128_SIZE] {
    derive_nas_key(kamf, AlgorithmTypeDistinguisher::NasEnc, algorithm_id)
}

/// Derive `KNASint` for integrity algorithm `algorithm_id`
pub fn derive_knas_int(kamf: &[u8; KEY_256_SIZE], algorithm_id: u8) -> [u8; KEY_128_SIZE] {
    derive_nas_key(kamf, AlgorithmTypeDistinguisher::NasInt, algorithm_id)
}

/// Derive CK' and IK' (3GPP TS 33.402 Annex A.2, used by TS 33.501 Annex A.3)
///
/// The 256-bit KDF output is split: the first `len(CK)` octets are CK',
/// the rest IK'.
pub fn derive_ck_ik_prime(
    ck: &[u8; KEY_128_SIZE],
    ik: &[u8; KEY_128_SIZE],
    sn_name: &str,
    sqn_xor_ak: &[u8; 6],
) -> ([u8; KEY_128_SIZE], [u8; KEY_128_SIZE]) {
    let snn = encode_kdf_string(sn_name);
    let output = calculate_kdf_key(
        &concat_ck_ik(ck, ik),
        FcValue::CkIkPrime as u8,
        &[&snn, sqn_xor_ak],
    );
    let mut ck_prime = [0u8; KEY_128_SIZE];
    let mut ik_prime = [0u8; KEY_128_SIZE];
    ck_prime.copy_from_slice(&output[..ck.len()]);
    ik_prime.copy_from_slice(&output[ck.len()..]);
    (ck_prime, ik_prime)
}

/// Derive the EAP-AKA' master key MK (RFC 5448 Section 3.3)
///
/// MK = PRF'(IK' || CK', "EAP-AKA'" || Identity), 208 octets.
pub fn derive_mk(
    ck_prime: &[u8; KEY_128_SIZE],
    ik_prime: &[u8; KEY_128_SIZE],
    identity: &str,
) -> Vec<u8> {
    let key = concat_ck_ik(ik_prime, ck_prime);
    let mut input = b"EAP-AKA'".to_vec();
    input.extend_from_slice(identity.as_bytes());
    calculate_prf_prime(&key, &input, MK_SIZE)
}

/// Split an EAP-AKA' master key into K_encr, K_aut, K_re, MSK and EMSK.
pub fn split_mk(mk: &[u8]) -> Option<EapAkaPrimeKeys<'_>> {
    if mk.len() < MK_SIZE {
        return None;
    }
    Some(EapAkaPrimeKeys {
        k_encr: &mk[0..16],
        k_aut: &mk[16..48],
        k_re: &mk[48..80],
        msk: &mk[80..EMSK_OFFSET],
        emsk: &mk[EMSK_OFFSET..MK_SIZE],
    })
}

/// Views into an EAP-AKA' master key (RFC 5448 Section 3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EapAkaPrimeKeys<'a> {
    /// Encryption key for AT_ENCR_DATA (128 bits)
    pub k_encr: &'a [u8],
    /// Authentication key for AT_MAC (256 bits)
    pub k_aut: &'a [u8],
    /// Re-authentication key (256 bits)
    pub k_re: &'a [u8],
    /// Master session key (512 bits)
    pub msk: &'a [u8],
    /// Extended master session key (512 bits)
    pub emsk: &'a [u8],
}

/// Derive KAUSF for EAP-AKA' (3GPP TS 33.501 Annex F)
///
/// KAUSF is the most significant 256 bits of the EMSK.
///
/// # Panics
/// Panics if `mk` is shorter than [`MK_SIZE`].
pub fn derive_kausf_eap_aka_prime(mk: &[u8]) -> [u8; KEY_256_SIZE] {
    assert!(mk.len() >= MK_SIZE, "MK must be {MK_SIZE} octets");
    let mut kausf = [0u8; KEY_256_SIZE];
    kausf.copy_from_slice(&mk[EMSK_OFFSET..EMSK_OFFSET + KEY_256_SIZE]);
    kausf
}

/// Derive RES* (3GPP TS 33.501 Annex A.4)
///
/// RES* = least significant 128 bits of KDF(CK || IK, 0x6B, SN name, RAND, RES).
pub fn derive_res_star(
    ck: &[u8; KEY_128_SIZE],
    ik: &[u8; KEY_128_SIZE],
    sn_name: &str,
    rand: &[u8; 16],
    res: &[u8],
) -> [u8; RES_STAR_SIZE] {
    let snn = encode_kdf_string(sn_name);
    let output = calculate_kdf_key(
        &concat_ck_ik(ck, ik),
        FcValue::ResStar as u8,
        &[&snn, rand, res],
    );
    let mut res_star = [0u8; RES_STAR_SIZE];
    res_star.copy_from_slice(&output[KEY_256_SIZE - RES_STAR_SIZE..]);
    res_star
}

/// HMAC-SHA-256 truncated to the 16-octet EAP-AKA' AT_MAC width.
///
/// `message` must already carry an all-zero AT_MAC value.
pub fn eap_aka_prime_mac(k_aut: &[u8], message: &[u8]) -> [u8; EAP_MAC_SIZE] {
    let full = hmac_sha256(k_aut, message);
    let mut mac = [0u8; EAP_MAC_SIZE];
    mac.copy_from_slice(&full[..EAP_MAC_SIZE]);
    mac
}
