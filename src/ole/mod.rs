/// Constants for the compound file format
pub mod consts;

/// Compound file (OLE2 structured storage) reader
mod file;

/// Code page selection and 8-bit text decoding
pub mod codepage;

/// PLC (n+1 positions, n elements) parsing
pub mod plcf;

/// SPRM opcode stream parsing for Word 6/95 and Word 97+
pub mod sprm;

/// Legacy Word document (.doc) reader
///
/// This module provides functionality to parse Microsoft Word documents
/// in the legacy binary format (.doc files), which are OLE2-based files.
pub mod doc;

// Re-export public types for convenient access
pub use file::{CompoundFile, DirectoryEntry, OleError, is_ole_file};
