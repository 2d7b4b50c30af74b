//! NIA (5G integrity algorithms) implementations
//!
//! - NIA2: AES-CMAC (128-EIA2, TS 33.401 Annex B.2.3)
//! - NIA3: ZUC universal hash (128-EIA3, TS 35.223)
//!
//! Every primitive returns a 32-bit MAC as four big-endian octets.

use aes::Aes128;
use cmac::{Cmac, Mac};
use zuc::Zuc128Core;

use crate::nea::count_bearer_direction;

/// Key size in bytes (128 bits)
pub const KEY_SIZE: usize = 16;

/// MAC size in bytes (32 bits)
pub const MAC_SIZE: usize = 4;

/// Signature shared by every NIA primitive.
pub type IntegrityFn =
    fn(count: u32, bearer: u8, direction: u8, key: &[u8; KEY_SIZE], data: &[u8]) -> [u8; MAC_SIZE];

/// NIA2 (128-EIA2): AES-CMAC truncated to 32 bits.
///
/// The CMAC input is `COUNT || BEARER || DIRECTION || 0^26 || MESSAGE`.
pub fn nia2_compute_mac(
    count: u32,
    bearer: u8,
    direction: u8,
    key: &[u8; KEY_SIZE],
    data: &[u8],
) -> [u8; MAC_SIZE] {
    let mut mac = Cmac::<Aes128>::new(key.into());
    mac.update(&count_bearer_direction(count, bearer, direction));
    mac.update(data);
    let tag = mac.finalize().into_bytes();

    let mut out = [0u8; MAC_SIZE];
    out.copy_from_slice(&tag[..MAC_SIZE]);
    out
}

/// NIA3 (128-EIA3) over a whole number of octets.
pub fn nia3_compute_mac(
    count: u32,
    bearer: u8,
    direction: u8,
    key: &[u8; KEY_SIZE],
    data: &[u8],
) -> [u8; MAC_SIZE] {
    nia3_compute_mac_bits(count, bearer, direction, key, data, data.len() * 8)
}

/// NIA3 (128-EIA3) over the first `length_bits` bits of `data`.
///
/// `length_bits` is clamped to the bits actually present in `data`.
pub fn nia3_compute_mac_bits(
    count: u32,
    bearer: u8,
    direction: u8,
    key: &[u8; KEY_SIZE],
    data: &[u8],
    length_bits: usize,
) -> [u8; MAC_SIZE] {
    let length_bits = length_bits.min(data.len() * 8);
    let iv = build_nia3_iv(count, bearer, direction);
    let mut zuc = Zuc128Core::new(key, &iv);

    // L = ceil((LENGTH + 64) / 32) keystream words
    let words = (length_bits + 64).div_ceil(32);
    let keystream: Vec<u32> = (0..words).map(|_| zuc.generate()).collect();

    let mut t: u32 = 0;
    for i in 0..length_bits {
        if (data[i / 8] >> (7 - (i % 8))) & 1 == 1 {
            t ^= keystream_word_at(&keystream, i);
        }
    }
    t ^= keystream_word_at(&keystream, length_bits);
    let mac = t ^ keystream[words - 1];

    mac.to_be_bytes()
}

/// Builds the EIA3 initialisation vector.
///
/// ```text
/// IV[0..4]   = COUNT
/// IV[4]      = BEARER << 3
/// IV[8]      = COUNT[0] ^ (DIRECTION << 7)
/// IV[9..12]  = COUNT[1..4]
/// IV[12]     = BEARER << 3
/// IV[14]     = DIRECTION << 7
/// ```
fn build_nia3_iv(count: u32, bearer: u8, direction: u8) -> [u8; 16] {
    let count = count.to_be_bytes();
    let bearer = (bearer & 0x1F) << 3;
    let direction = (direction & 0x01) << 7;

    let mut iv = [0u8; 16];
    iv[..4].copy_from_slice(&count);
    iv[4] = bearer;
    iv[8..12].copy_from_slice(&count);
    iv[8] ^= direction;
    iv[12] = bearer;
    iv[14] = direction;
    iv
}

/// 32-bit word of the keystream starting at bit `bit_pos` (MSB first).
fn keystream_word_at(keystream: &[u32], bit_pos: usize) -> u32 {
    let index = bit_pos / 32;
    let offset = bit_pos % 32;
    if offset == 0 {
        keystream[index]
    } else {
        (keystream[index] << offset) | (keystream[index + 1] >> (32 - offset))
    }
}
