/// Word (.doc) document support.
///
/// This module provides parsing of Microsoft Word documents in the legacy
/// binary format (.doc files), which uses OLE2 structured storage.
///
/// # Architecture
///
/// The module is organized around these key types:
/// - `Package`: The overall .doc file package (compound file container)
/// - `DocumentModel`: Sections, headers/footers, footnotes and text boxes
/// - `Paragraph`: A paragraph with runs (formatted text)
/// - `Run`: A text run with formatting
///
/// # DOC File Structure
///
/// A .doc file is an OLE2 structured storage containing several streams:
/// - **WordDocument**: Main document stream containing the FIB, text and FKP pages
/// - **1Table** or **0Table**: Piece table, bin tables, stylesheet and story PLCs
///   (Word 6/95 keep these in the WordDocument stream)
///
/// # Example
///
/// ```rust,no_run
/// use docbin::ole::doc::{LoadOptions, Package};
///
/// let package = Package::open("document.doc")?;
/// let doc = package.document_with(&LoadOptions::default().with_password("secret"))?;
///
/// println!("Document text: {}", doc.text());
/// for para in doc.paragraphs() {
///     println!("[{}] {}", para.style_name, para.text());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod crypto;
pub mod document;
pub mod model;
pub mod package;
pub mod parts;

pub use document::DocumentAssembler;
pub use model::{
    DocumentModel, Footnote, HeaderFooter, HeaderFooterKind, Paragraph, Run, Section, TextBox,
};
pub use package::{DocError, LoadOptions, Package};
