//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::ole::OleError;
use crate::ole::doc::crypto::CryptoError;
use crate::ole::doc::package::DocError;

impl From<OleError> for Error {
    fn from(err: OleError) -> Self {
        match err {
            OleError::NotOleFile => Error::InvalidContainer,
            OleError::InvalidFormat(s) => Error::InvalidFormat(s),
            OleError::StreamNotFound(s) => Error::ComponentNotFound(s),
        }
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::PasswordRequired => Error::PasswordRequired,
            CryptoError::InvalidPassword => Error::InvalidPassword,
            CryptoError::UnsupportedEncryption(s) => Error::Unsupported(s),
        }
    }
}

impl From<DocError> for Error {
    fn from(err: DocError) -> Self {
        match err {
            DocError::Io(e) => Error::Io(e),
            DocError::Ole(ole_err) => Error::from(ole_err),
            DocError::WrongFormat(s) => Error::WrongFormat(s),
            DocError::MissingStream(s) => Error::ComponentNotFound(s),
            DocError::MissingTableStream(s) => Error::ComponentNotFound(s),
            DocError::PasswordRequired => Error::PasswordRequired,
            DocError::InvalidPassword => Error::InvalidPassword,
            DocError::UnsupportedEncryption(s) => Error::Unsupported(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_error_conversion() {
        let err = Error::from(DocError::Ole(OleError::NotOleFile));
        assert!(matches!(err, Error::InvalidContainer));

        let err = Error::from(DocError::WrongFormat("OOXML".to_string()));
        assert_eq!(err.to_string(), "Wrong format: OOXML");

        let err = Error::from(DocError::InvalidPassword);
        assert!(matches!(err, Error::InvalidPassword));

        let err = Error::from(DocError::MissingTableStream("1Table".to_string()));
        assert!(matches!(err, Error::ComponentNotFound(name) if name == "1Table"));
    }
}
