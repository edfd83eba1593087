//! Word 97-2003 RC4 encryption ("Office 97/2000 compatible").
//!
//! The password is hashed with MD5, mixed with the per-document `doc_id`, and the
//! resulting digest keys RC4. Each 0x200-byte block of a stream uses its own key,
//! `MD5(digest[0..5] || block_le32)`.

use super::rc4::Rc4;
use super::{CryptoError, Rc4EncryptionHeader, password_to_utf16le};

/// Maximum number of UTF-16 code units of the password that are used
const MAX_PASSWORD_UNITS: usize = 15;

/// Streams are re-keyed at every multiple of this offset
pub const BLOCK_SIZE: usize = 0x200;

/// The intermediate password digest; every block key is derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word97Key {
    digest: [u8; 16],
}

impl Word97Key {
    /// Derive the key for `password` and the document's 16-byte id.
    pub fn derive(password: &str, doc_id: &[u8; 16]) -> Result<Self, CryptoError> {
        if password.is_empty() {
            return Err(CryptoError::PasswordRequired);
        }

        let password_hash = md5::compute(password_to_utf16le(password, MAX_PASSWORD_UNITS));

        let mut buf = Vec::with_capacity(16 * 21);
        for _ in 0..16 {
            buf.extend_from_slice(&password_hash[..5]);
            buf.extend_from_slice(doc_id);
        }

        Ok(Self {
            digest: md5::compute(&buf).0,
        })
    }

    /// Fresh RC4 state for block number `block`.
    fn block_cipher(&self, block: u32) -> Rc4 {
        let mut seed = [0u8; 9];
        seed[..5].copy_from_slice(&self.digest[..5]);
        seed[5..].copy_from_slice(&block.to_le_bytes());
        Rc4::new(&md5::compute(seed).0)
    }

    /// Check the password against the encrypted salt and salt hash.
    pub fn verify(&self, salt: &[u8; 16], salt_hash: &[u8; 16]) -> bool {
        let mut buf = [0u8; 32];
        buf[..16].copy_from_slice(salt);
        buf[16..].copy_from_slice(salt_hash);
        self.block_cipher(0).apply_keystream(&mut buf);

        md5::compute(&buf[..16]).0 == buf[16..]
    }

    /// Produce the encrypted `(salt, salt_hash)` pair that verifies this key.
    pub fn seal_verifier(&self, salt: &[u8; 16]) -> ([u8; 16], [u8; 16]) {
        let mut buf = [0u8; 32];
        buf[..16].copy_from_slice(salt);
        buf[16..].copy_from_slice(&md5::compute(salt).0);
        self.block_cipher(0).apply_keystream(&mut buf);

        let mut sealed_salt = [0u8; 16];
        let mut sealed_hash = [0u8; 16];
        sealed_salt.copy_from_slice(&buf[..16]);
        sealed_hash.copy_from_slice(&buf[16..]);
        (sealed_salt, sealed_hash)
    }

    /// Apply the cipher to a whole stream, starting at stream offset 0.
    pub fn apply(&self, data: &mut [u8]) {
        for (block, chunk) in data.chunks_mut(BLOCK_SIZE).enumerate() {
            self.block_cipher(block as u32).apply_keystream(chunk);
        }
    }
}

/// Decrypt the table and WordDocument streams of a Word 97 document.
///
/// Returns `(table, main)` plaintext. The caller restores any regions that were
/// stored in clear.
pub fn decrypt(
    table: &[u8],
    main: &[u8],
    password: &str,
    header: &Rc4EncryptionHeader,
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let key = Word97Key::derive(password, &header.doc_id)?;
    if !key.verify(&header.salt, &header.salt_hash) {
        return Err(CryptoError::InvalidPassword);
    }

    let mut table = table.to_vec();
    let mut main = main.to_vec();
    key.apply(&mut table);
    key.apply(&mut main);
    Ok((table, main))
}
