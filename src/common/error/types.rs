//! Unified error type for docbin.
//!
//! Each layer (container, cipher, document) has its own error enum; this module
//! folds them into one type for the top-level convenience API.
use thiserror::Error;

/// Main error type for docbin operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not a compound file
    #[error("Not a valid compound file")]
    InvalidContainer,

    /// The input is a different format (e.g. an OOXML/ZIP package)
    #[error("Wrong format: {0}")]
    WrongFormat(String),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Stream not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// The document is encrypted and no password was given
    #[error("Password required")]
    PasswordRequired,

    /// The password does not match the document's verifier
    #[error("Invalid password")]
    InvalidPassword,

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

/// Result type for docbin operations.
pub type Result<T> = std::result::Result<T, Error>;
