//! NEA (5G encryption algorithms) implementations
//!
//! - NEA2: AES-128 in counter mode (128-EEA2, TS 33.401 Annex B.1.3)
//! - NEA3: ZUC keystream (128-EEA3, TS 35.221/35.222)
//!
//! All ciphers share the signature
//! `(count, bearer, direction, key, data)` and work in place. Encryption and
//! decryption are the same keystream XOR.

use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use zuc::Zuc128Core;

/// 128-bit key size in bytes
pub const KEY_SIZE: usize = 16;

/// IV size in bytes
pub const IV_SIZE: usize = 16;

/// Type alias for AES-128 CTR mode with a 128-bit big-endian counter
type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// Signature shared by every NEA primitive.
pub type CipherFn = fn(count: u32, bearer: u8, direction: u8, key: &[u8; KEY_SIZE], data: &mut [u8]);

/// Builds the 64-bit `COUNT || BEARER || DIRECTION || 0..0` block.
///
/// ```text
/// | COUNT (32 bits) | BEARER (5 bits) | DIRECTION (1 bit) | 0 (26 bits) |
/// ```
pub(crate) fn count_bearer_direction(count: u32, bearer: u8, direction: u8) -> [u8; 8] {
    let mut block = [0u8; 8];
    block[..4].copy_from_slice(&count.to_be_bytes());
    block[4] = ((bearer & 0x1F) << 3) | ((direction & 0x01) << 2);
    block
}

/// NEA2 (128-EEA2): AES-128-CTR.
///
/// The initial counter block is `COUNT || BEARER || DIRECTION || 0^90`.
pub fn nea2_encrypt(count: u32, bearer: u8, direction: u8, key: &[u8; KEY_SIZE], data: &mut [u8]) {
    let mut iv = [0u8; IV_SIZE];
    iv[..8].copy_from_slice(&count_bearer_direction(count, bearer, direction));
    let mut cipher = Aes128Ctr::new(key.into(), &iv.into());
    cipher.apply_keystream(data);
}

/// NEA2 decryption (same as encryption in CTR mode)
#[inline]
pub fn nea2_decrypt(count: u32, bearer: u8, direction: u8, key: &[u8; KEY_SIZE], data: &mut [u8]) {
    nea2_encrypt(count, bearer, direction, key, data);
}

/// NEA3 (128-EEA3): ZUC keystream XOR.
///
/// The IV repeats the 64-bit `COUNT || BEARER || DIRECTION` block twice.
pub fn nea3_encrypt(count: u32, bearer: u8, direction: u8, key: &[u8; KEY_SIZE], data: &mut [u8]) {
    let block = count_bearer_direction(count, bearer, direction);
    let mut iv = [0u8; IV_SIZE];
    iv[..8].copy_from_slice(&block);
    iv[8..].copy_from_slice(&block);

    let mut zuc = Zuc128Core::new(key, &iv);
    for chunk in data.chunks_mut(4) {
        let keystream = zuc.generate().to_be_bytes();
        for (byte, ks) in chunk.iter_mut().zip(keystream) {
            *byte ^= ks;
        }
    }
}

/// NEA3 decryption (same as encryption)
#[inline]
pub fn nea3_decrypt(count: u32, bearer: u8, direction: u8, key: &[u8; KEY_SIZE], data: &mut [u8]) {
    nea3_encrypt(count, bearer, direction, key, data);
}
