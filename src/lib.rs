//! docbin - text extraction for legacy Microsoft Word binary documents
//!
//! This library reads `.doc` files written by Word 6, 95, 97, 2000, 2002 and 2003
//! without Word or any platform document library.
//!
//! # Features
//!
//! - **Compound file reader**: FAT/DIFAT/MiniFAT sector chains and directory lookup
//! - **Piece table**: mixed UTF-16 and 8-bit code page text
//! - **Paragraphs and runs**: PAPX/CHPX pages, character formatting and style names
//! - **Sub-documents**: headers, footers, footnotes and text boxes
//! - **Encryption**: Word 95 XOR and Word 97 RC4 (`encryption` feature) documents
//!
//! Logging goes through the [`log`] facade; install any logger to see it.
//!
//! # Example - Extracting text
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("document.doc")?;
//! let text = docbin::extract_text(bytes, None)?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Reading the document model
//!
//! ```no_run
//! use docbin::ole::doc::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pkg = Package::open("document.doc")?;
//! let doc = pkg.document()?;
//!
//! for para in doc.paragraphs() {
//!     for run in para.runs() {
//!         println!("{:?} bold={}", run.text(), run.properties().bold);
//!     }
//! }
//! for footnote in &doc.footnotes {
//!     println!("Footnote: {}", footnote.text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Low-level compound file access
//!
//! ```no_run
//! use docbin::ole::CompoundFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfb = CompoundFile::open(std::fs::read("document.doc")?)?;
//! for entry in cfb.list_entries() {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! let data = cfb.read_stream_by_name("WordDocument")?;
//! println!("WordDocument: {} bytes", data.len());
//! # Ok(())
//! # }
//! ```

/// Shared binary readers and the unified error type
pub mod common;

/// OLE2 (Object Linking and Embedding) file format parser
///
/// This module provides functionality to parse OLE2 structured storage files.
/// It also contains the `doc` submodule for legacy Word documents, since .doc
/// files are OLE2-based.
pub mod ole;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use ole::doc;

use ole::doc::{LoadOptions, Package};

/// Extract the main text of a `.doc` held in memory.
///
/// Paragraph marks become `\n`. `password` is only consulted for encrypted
/// documents.
pub fn extract_text(data: impl Into<bytes::Bytes>, password: Option<&str>) -> Result<String> {
    let options = match password {
        Some(password) => LoadOptions::default().with_password(password),
        None => LoadOptions::default(),
    };
    let package = Package::from_bytes(data)?;
    Ok(package.document_with(&options)?.text())
}
