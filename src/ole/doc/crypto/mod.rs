//! Word document encryption.
//!
//! Two schemes are supported:
//! - [`word95`]: the XOR cipher of Word 6/95, keyed from the password and `lKey`
//! - `word97`: RC4 with MD5 key derivation (Office 97/2000 compatible encryption),
//!   compiled only when the `encryption` feature is enabled
//!
//! Both are pure functions from ciphertext, password and key material to plaintext.

pub mod rc4;
pub mod word95;
#[cfg(feature = "encryption")]
pub mod word97;

use crate::common::binary::read_u16_le;
use thiserror::Error;

/// Errors raised while decrypting a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Document is encrypted and no password was supplied")]
    PasswordRequired,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),
}

/// Length of the RC4 encryption header at the start of the table stream
pub const RC4_HEADER_LEN: usize = 52;

/// Key material of an RC4-encrypted Word 97 document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rc4EncryptionHeader {
    pub doc_id: [u8; 16],
    pub salt: [u8; 16],
    pub salt_hash: [u8; 16],
}

impl Rc4EncryptionHeader {
    /// Parse the encryption header stored at the start of the table stream.
    ///
    /// Only version 1.1 (plain RC4) is supported; the CryptoAPI and AES variants
    /// are reported as [`CryptoError::UnsupportedEncryption`].
    pub fn parse(table: &[u8]) -> Result<Self, CryptoError> {
        let (Ok(major), Ok(minor)) = (read_u16_le(table, 0), read_u16_le(table, 2)) else {
            return Err(CryptoError::UnsupportedEncryption(
                "missing encryption header".to_string(),
            ));
        };

        match (major, minor) {
            (1, 1) => {},
            (2..=4, 2) => {
                return Err(CryptoError::UnsupportedEncryption(
                    "RC4 CryptoAPI".to_string(),
                ));
            },
            (4, 4) => return Err(CryptoError::UnsupportedEncryption("AES".to_string())),
            _ => {
                return Err(CryptoError::UnsupportedEncryption(format!(
                    "encryption version {major}.{minor}"
                )));
            },
        }

        let field = |offset: usize| -> Result<[u8; 16], CryptoError> {
            table
                .get(offset..offset + 16)
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or_else(|| {
                    CryptoError::UnsupportedEncryption("truncated RC4 header".to_string())
                })
        };

        Ok(Self {
            doc_id: field(4)?,
            salt: field(20)?,
            salt_hash: field(36)?,
        })
    }
}

/// Encode a password as UTF-16LE, keeping at most `max_units` code units.
#[cfg(any(feature = "encryption", test))]
fn password_to_utf16le(password: &str, max_units: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(max_units * 2);
    for unit in password.encode_utf16().take(max_units) {
        buf.extend_from_slice(&unit.to_le_bytes());
    }
    buf
}
