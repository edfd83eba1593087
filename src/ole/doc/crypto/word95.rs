//! Word 6/95 XOR encryption.
//!
//! The 16-byte key is derived from the password and the high half of `lKey`.
//! The low half of `lKey` is a verifier computed from the password alone.

use super::CryptoError;

/// Pads passwords shorter than 16 bytes, starting at index 0 of the filler.
const PASSWORD_FILLER: [u8; 15] = [
    0xBB, 0xFF, 0xFF, 0xBA, 0xFF, 0xFF, 0xB9, 0x80, 0x00, 0xBE, 0x0F, 0x00, 0xBF, 0x0F, 0x00,
];

/// Bytes before this offset are stored in clear.
pub const CLEAR_PREFIX: usize = 0x30;

const VERIFIER_SEED: u16 = 0xCE4B;

/// A derived Word 95 key together with the verifier for its password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word95Key {
    key: [u8; 16],
    verifier: u16,
}

/// Rotate the low 15 bits of `value` left by `shift` bits.
#[inline]
fn rotl15(value: u16, shift: u32) -> u16 {
    let shift = shift % 15;
    let value = value & 0x7FFF;
    ((value << shift) | (value >> (15 - shift))) & 0x7FFF
}

impl Word95Key {
    /// Derive the key without checking the verifier.
    pub fn derive(password: &str, l_key: u32) -> Result<Self, CryptoError> {
        if password.is_empty() {
            return Err(CryptoError::PasswordRequired);
        }

        let mut pw = [0u8; 16];
        let bytes = password.as_bytes();
        let len = bytes.len().min(16);
        pw[..len].copy_from_slice(&bytes[..len]);
        for (j, slot) in pw[len..].iter_mut().enumerate() {
            *slot = PASSWORD_FILLER[j % PASSWORD_FILLER.len()];
        }

        let pw_key = [(l_key >> 16) as u8, (l_key >> 24) as u8];
        let mut key = [0u8; 16];
        let mut verifier = VERIFIER_SEED;
        for (i, &byte) in pw.iter().enumerate() {
            key[i] = (byte ^ pw_key[i & 1]).rotate_left(7);
            let step = i as u16;
            verifier ^= rotl15(byte as u16, i as u32 + 1) ^ (step + 1) ^ step;
        }

        Ok(Self { key, verifier })
    }

    /// The 16-bit verifier stored in the low half of `lKey`.
    #[inline]
    pub fn verifier(&self) -> u16 {
        self.verifier
    }

    /// Apply the cipher to `data`, which starts at stream offset 0.
    ///
    /// Zero bytes are left untouched in both directions.
    pub fn apply(&self, data: &mut [u8]) {
        for (offset, byte) in data.iter_mut().enumerate().skip(CLEAR_PREFIX) {
            if *byte != 0 {
                *byte ^= self.key[offset % 16];
            }
        }
    }
}

/// Decrypt a Word 95 WordDocument stream.
///
/// Fails with [`CryptoError::InvalidPassword`] before producing any output when the
/// password does not match the verifier in `l_key`.
pub fn decrypt(data: &[u8], password: &str, l_key: u32) -> Result<Vec<u8>, CryptoError> {
    let key = Word95Key::derive(password, l_key)?;
    if key.verifier() != (l_key & 0xFFFF) as u16 {
        return Err(CryptoError::InvalidPassword);
    }

    let mut plain = data.to_vec();
    key.apply(&mut plain);
    Ok(plain)
}
