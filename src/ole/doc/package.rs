/// Package implementation for legacy Word documents (.doc).
use super::crypto::{CryptoError, Rc4EncryptionHeader, word95};
use super::document::DocumentAssembler;
use super::model::DocumentModel;
use super::parts::fib::Fib;
use crate::ole::codepage::{CodePageResolver, WindowsCodePages};
use crate::ole::consts::ZIP_MAGIC;
use crate::ole::{CompoundFile, OleError};
use bytes::Bytes;
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const WORD_DOCUMENT: &str = "WordDocument";

/// Error types for DOC file parsing.
#[derive(Debug, Error)]
pub enum DocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OLE error: {0}")]
    Ole(#[from] OleError),
    /// The input is another format, such as a `.docx` ZIP package
    #[error("Wrong format: {0}")]
    WrongFormat(String),
    #[error("Stream not found: {0}")]
    MissingStream(String),
    #[error("Table stream not found: {0}")]
    MissingTableStream(String),
    #[error("Document is encrypted and no password was supplied")]
    PasswordRequired,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),
}

impl From<CryptoError> for DocError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::PasswordRequired => DocError::PasswordRequired,
            CryptoError::InvalidPassword => DocError::InvalidPassword,
            CryptoError::UnsupportedEncryption(s) => DocError::UnsupportedEncryption(s),
        }
    }
}

/// Result type for DOC operations.
pub type Result<T> = std::result::Result<T, DocError>;

/// Options for decoding a document.
///
/// ```rust
/// use docbin::ole::codepage::FixedCodePage;
/// use docbin::ole::doc::LoadOptions;
/// use std::sync::Arc;
///
/// let options = LoadOptions::default()
///     .with_password("secret")
///     .with_code_pages(Arc::new(FixedCodePage(1251)));
/// assert_eq!(options.password.as_deref(), Some("secret"));
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Password for encrypted documents
    pub password: Option<String>,
    /// Code page candidates for 8-bit text
    pub code_pages: Arc<dyn CodePageResolver>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            password: None,
            code_pages: Arc::new(WindowsCodePages),
        }
    }
}

impl LoadOptions {
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_code_pages(mut self, code_pages: Arc<dyn CodePageResolver>) -> Self {
        self.code_pages = code_pages;
        self
    }

    fn password(&self) -> Result<&str> {
        self.password.as_deref().ok_or(DocError::PasswordRequired)
    }
}

/// A Word (.doc) package.
///
/// This is the main entry point for working with legacy Word documents.
/// It wraps a compound file and provides Word-specific functionality.
///
/// # Examples
///
/// ```rust,no_run
/// use docbin::ole::doc::Package;
///
/// let pkg = Package::open("document.doc")?;
/// let doc = pkg.document()?;
/// println!("{}", doc.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Package {
    ole: CompoundFile,
}

impl Package {
    /// Open a .doc package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Create a Package from an in-memory file.
    ///
    /// ZIP input (`.docx` and other OOXML packages) is rejected before any
    /// compound file decoding.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.starts_with(ZIP_MAGIC) {
            return Err(DocError::WrongFormat(
                "ZIP/OOXML package, not a Word binary document".to_string(),
            ));
        }

        let ole = CompoundFile::open(data)?;
        if !ole.exists(WORD_DOCUMENT) {
            return Err(DocError::MissingStream(WORD_DOCUMENT.to_string()));
        }
        Ok(Self { ole })
    }

    /// Get the underlying compound file.
    #[inline]
    pub fn compound_file(&self) -> &CompoundFile {
        &self.ole
    }

    /// Decode the document with default options.
    pub fn document(&self) -> Result<DocumentModel> {
        self.document_with(&LoadOptions::default())
    }

    /// Decode the document, decrypting it when needed.
    pub fn document_with(&self, options: &LoadOptions) -> Result<DocumentModel> {
        let main = self.ole.read_stream_by_name(WORD_DOCUMENT)?;
        let fib = Fib::parse(&main);
        debug!(
            "FIB: nFib {:#06x} ({:?}), lid {:#06x}, ccpText {}",
            fib.nfib,
            fib.version(),
            fib.lid,
            fib.ccp.text
        );

        let (fib, main, table) = if fib.is_legacy() {
            self.legacy_streams(fib, main, options)?
        } else {
            self.modern_streams(fib, main, options)?
        };

        let table: &[u8] = match &table {
            Some(table) => table,
            None => &main,
        };
        Ok(DocumentAssembler::new(&fib, &main, table, options.code_pages.as_ref()).assemble())
    }

    /// Word 6/95 keep their tables in the WordDocument stream.
    fn legacy_streams(
        &self,
        fib: Fib,
        main: Vec<u8>,
        options: &LoadOptions,
    ) -> Result<(Fib, Vec<u8>, Option<Vec<u8>>)> {
        if !fib.is_encrypted() {
            return Ok((fib, main, None));
        }

        let main = word95::decrypt(&main, options.password()?, fib.l_key)?;
        let fib = Fib::parse(&main);
        Ok((fib, main, None))
    }

    /// Word 97+ read the table stream the FIB selects, decrypting both streams if needed.
    fn modern_streams(
        &self,
        fib: Fib,
        main: Vec<u8>,
        options: &LoadOptions,
    ) -> Result<(Fib, Vec<u8>, Option<Vec<u8>>)> {
        let table = self.read_table_stream(&fib)?;
        if !fib.is_encrypted() {
            return Ok((fib, main, Some(table)));
        }
        if fib.is_obfuscated() {
            return Err(DocError::UnsupportedEncryption("XOR obfuscation".to_string()));
        }

        let header = Rc4EncryptionHeader::parse(&table)?;
        let password = options.password()?;
        let (main, table) = decrypt_rc4(main, table, password, &header)?;
        let fib = Fib::parse(&main);
        Ok((fib, main, Some(table)))
    }

    fn read_table_stream(&self, fib: &Fib) -> Result<Vec<u8>> {
        let preferred = fib.table_stream_name();
        if self.ole.exists(preferred) {
            return Ok(self.ole.read_stream_by_name(preferred)?);
        }

        let other = if preferred == "1Table" { "0Table" } else { "1Table" };
        if self.ole.exists(other) {
            warn!("{preferred} not found, using {other}");
            return Ok(self.ole.read_stream_by_name(other)?);
        }
        Err(DocError::MissingTableStream(preferred.to_string()))
    }
}

/// Bytes of the WordDocument stream stored in clear (FibBase)
#[cfg(feature = "encryption")]
const CLEAR_FIB_BASE: usize = 0x44;

#[cfg(feature = "encryption")]
fn decrypt_rc4(
    main: Vec<u8>,
    table: Vec<u8>,
    password: &str,
    header: &Rc4EncryptionHeader,
) -> Result<(Vec<u8>, Vec<u8>)> {
    use super::crypto::{RC4_HEADER_LEN, word97};

    let (mut plain_table, mut plain_main) = word97::decrypt(&table, &main, password, header)?;
    restore_clear(&mut plain_main, &main, CLEAR_FIB_BASE);
    restore_clear(&mut plain_table, &table, RC4_HEADER_LEN);
    Ok((plain_main, plain_table))
}

#[cfg(not(feature = "encryption"))]
fn decrypt_rc4(
    _main: Vec<u8>,
    _table: Vec<u8>,
    _password: &str,
    _header: &Rc4EncryptionHeader,
) -> Result<(Vec<u8>, Vec<u8>)> {
    Err(DocError::UnsupportedEncryption(
        "RC4 decryption is disabled (enable the `encryption` feature)".to_string(),
    ))
}

/// Copy the first `len` bytes of `original` back over `plain`.
#[cfg(feature = "encryption")]
fn restore_clear(plain: &mut [u8], original: &[u8], len: usize) {
    let len = len.min(plain.len()).min(original.len());
    plain[..len].copy_from_slice(&original[..len]);
}
