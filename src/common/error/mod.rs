//! Unified error types for docbin.
//!
//! This module provides a unified error type that encompasses errors from the
//! container reader, the ciphers and the document decoder.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
