//! Codepage decoding utilities for legacy Word text.
//!
//! 8-bit text pieces carry no code page of their own. The document's language id
//! (`lid` in the FIB) suggests one; when it is wrong, decoding with the wrong table
//! shows up as replacement characters and stray C1 controls. [`decode_best`]
//! tries each candidate from a [`CodePageResolver`] and keeps the cleanest result.
//!
//! # Performance Considerations
//!
//! - Uses `encoding_rs` for fast, optimized codepage conversion
//! - Pure ASCII input short-circuits the candidate search

use encoding_rs::Encoding;
use smallvec::{SmallVec, smallvec};
use std::fmt;

/// The Western European default used when nothing better is known
pub const DEFAULT_CODEPAGE: u32 = 1252;

/// Map Windows codepage identifier to encoding_rs Encoding
///
/// The returned encoding references are static, so no allocation occurs.
///
/// # Returns
///
/// Returns `Some(&'static Encoding)` if the codepage is supported, `None` otherwise.
#[inline]
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        // DOS codepages
        866 => Some(encoding_rs::IBM866), // Cyrillic DOS

        // Windows codepages (Western scripts)
        874 => Some(encoding_rs::WINDOWS_874),   // Thai
        1250 => Some(encoding_rs::WINDOWS_1250), // Central European
        1251 => Some(encoding_rs::WINDOWS_1251), // Cyrillic
        1252 => Some(encoding_rs::WINDOWS_1252), // Western European (most common)
        1253 => Some(encoding_rs::WINDOWS_1253), // Greek
        1254 => Some(encoding_rs::WINDOWS_1254), // Turkish
        1255 => Some(encoding_rs::WINDOWS_1255), // Hebrew
        1256 => Some(encoding_rs::WINDOWS_1256), // Arabic
        1257 => Some(encoding_rs::WINDOWS_1257), // Baltic
        1258 => Some(encoding_rs::WINDOWS_1258), // Vietnamese

        // East Asian codepages
        932 => Some(encoding_rs::SHIFT_JIS), // Japanese Shift-JIS
        936 => Some(encoding_rs::GBK),       // Simplified Chinese (GB2312/GBK)
        949 => Some(encoding_rs::EUC_KR),    // Korean
        950 => Some(encoding_rs::BIG5),      // Traditional Chinese (Big5)
        54936 => Some(encoding_rs::GB18030), // Chinese GB18030

        // Cyrillic KOI8
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),

        // Macintosh
        10000 => Some(encoding_rs::MACINTOSH), // Macintosh Roman

        65001 => Some(encoding_rs::UTF_8),

        // Unsupported codepage
        _ => None,
    }
}

/// ANSI code page implied by a Windows language identifier.
///
/// Returns `None` for Western languages (and unknown ids); callers fall back to
/// [`DEFAULT_CODEPAGE`].
pub fn codepage_for_lid(lid: u16) -> Option<u32> {
    let primary = lid & 0x03FF;
    let codepage = match primary {
        // Russian, Ukrainian, Belarusian, Bulgarian, Macedonian, Kazakh, Tatar, Mongolian
        0x19 | 0x22 | 0x23 | 0x02 | 0x2F | 0x3F | 0x44 | 0x50 => 1251,
        // Serbian Cyrillic shares its primary id with Croatian
        0x1A if matches!(lid, 0x0C1A | 0x1C1A) => 1251,
        // Czech, Hungarian, Polish, Romanian, Croatian, Slovak, Albanian, Slovenian
        0x05 | 0x0E | 0x15 | 0x18 | 0x1A | 0x1B | 0x1C | 0x24 => 1250,
        0x08 => 1253,
        0x1F => 1254,
        0x0D => 1255,
        // Arabic, Urdu, Farsi
        0x01 | 0x20 | 0x29 => 1256,
        // Estonian, Latvian, Lithuanian
        0x25..=0x27 => 1257,
        0x2A => 1258,
        0x1E => 874,
        0x11 => 932,
        // PRC and Singapore use simplified script
        0x04 if matches!(lid, 0x0804 | 0x1004) => 936,
        0x04 => 950,
        0x12 => 949,
        _ => return None,
    };
    Some(codepage)
}

/// Chooses the candidate code pages for 8-bit text.
///
/// Implementations return candidates in preference order; ties in the decode
/// score keep the earlier one.
pub trait CodePageResolver: fmt::Debug + Send + Sync {
    /// Candidate code pages for a document with language id `lid`.
    fn candidates(&self, lid: u16) -> SmallVec<[u32; 4]>;
}

/// The default resolver: the `lid` code page, then Windows-1252, then Windows-1251.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsCodePages;

impl CodePageResolver for WindowsCodePages {
    fn candidates(&self, lid: u16) -> SmallVec<[u32; 4]> {
        let mut pages: SmallVec<[u32; 4]> = smallvec![];
        for page in codepage_for_lid(lid).into_iter().chain([DEFAULT_CODEPAGE, 1251]) {
            if !pages.contains(&page) {
                pages.push(page);
            }
        }
        pages
    }
}

/// A resolver that always decodes with one code page.
#[derive(Debug, Clone, Copy)]
pub struct FixedCodePage(pub u32);

impl CodePageResolver for FixedCodePage {
    fn candidates(&self, _lid: u16) -> SmallVec<[u32; 4]> {
        smallvec![self.0]
    }
}

/// Number of characters that indicate a wrong code page guess.
fn mojibake_score(text: &str) -> usize {
    text.chars()
        .filter(|&c| c == '\u{FFFD}' || ('\u{80}'..='\u{9F}').contains(&c))
        .count()
}

/// Decode bytes using the specified Windows codepage, keeping NULs.
///
/// Returns `None` if the codepage is not supported.
#[inline]
pub fn decode_bytes(bytes: &[u8], codepage: u32) -> Option<String> {
    let encoding = codepage_to_encoding(codepage)?;
    // No BOM sniffing: pieces are raw code page text
    Some(encoding.decode_without_bom_handling(bytes).0.into_owned())
}

/// Decode 8-bit text with the best of several candidate code pages.
///
/// Unsupported candidates are skipped. If none is supported, Windows-1252 is used.
pub fn decode_best(bytes: &[u8], candidates: &[u32]) -> String {
    if bytes.is_ascii() {
        // Every supported single-byte table agrees on ASCII
        return bytes.iter().map(|&b| b as char).collect();
    }

    let mut best: Option<(usize, String)> = None;
    for &page in candidates {
        let Some(text) = decode_bytes(bytes, page) else {
            continue;
        };
        let score = mojibake_score(&text);
        if best.as_ref().is_none_or(|(best_score, _)| score < *best_score) {
            best = Some((score, text));
        }
        if score == 0 {
            break;
        }
    }

    match best {
        Some((_, text)) => text,
        None => encoding_rs::WINDOWS_1252
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}

/// Decode UTF-16 LE bytes to a String, stopping at the first NUL.
///
/// Returns a String with invalid sequences replaced by U+FFFD (lossy conversion).
///
/// # Examples
///
/// ```
/// use docbin::ole::codepage::decode_utf16le;
///
/// let bytes = b"H\x00e\x00l\x00l\x00o\x00";
/// assert_eq!(decode_utf16le(bytes), "Hello");
/// ```
#[inline]
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .take_while(|&c| c != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decode a whole UTF-16 LE text run, NULs included.
#[inline]
pub fn decode_utf16le_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
