/// File Information Block (FIB) parser for DOC files.
///
/// The FIB is located at the beginning of the WordDocument stream and contains
/// critical information about the document structure, including:
/// - File format version
/// - Which table stream to use (0Table or 1Table)
/// - Encryption flags and key material
/// - Lengths of the main text and every sub-document
/// - (offset, length) pairs locating structures in the table stream
///
/// Word 6/95 and Word 97+ lay the FIB out differently; every offset below depends
/// on `nFib`, which is therefore read first.
use crate::common::binary::{read_u8, read_u16_le, read_u32_le};
use bitflags::bitflags;
use log::debug;

/// Size of the FIB region the parser requires; shorter streams yield a zeroed FIB
pub const FIB_MIN_SIZE: usize = 512;

/// `nFib` values below this use the Word 6/95 layout
const FIRST_MODERN_NFIB: u16 = 0x0076;

/// wIdent of Word 97 and later
pub const WIDENT_WORD97: u16 = 0xA5EC;
/// wIdent of Word 6.0/95
pub const WIDENT_WORD6: u16 = 0xA5DC;

/// Start of FibRgFcLcb in the Word 97+ layout
const FC_LCB_BASE: usize = 0x9A;

bitflags! {
    /// Flags of the FIB word at offset 0x0A
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct FibFlags: u16 {
        /// Document is a template
        const DOT = 0x0001;
        /// Document is a glossary
        const GLSY = 0x0002;
        /// Last save was a fast (incremental) save
        const COMPLEX = 0x0004;
        /// Document contains pictures
        const HAS_PIC = 0x0008;
        /// Number of fast saves (4 bits)
        const QUICK_SAVES = 0x00F0;
        /// Document is encrypted or obfuscated
        const ENCRYPTED = 0x0100;
        /// Table stream is 1Table instead of 0Table
        const WHICH_TBL_STM = 0x0200;
        const READ_ONLY_RECOMMENDED = 0x0400;
        const WRITE_RESERVATION = 0x0800;
        const EXT_CHAR = 0x1000;
        const LOAD_OVERRIDE = 0x2000;
        const FAR_EAST = 0x4000;
        /// With ENCRYPTED: XOR obfuscation instead of RC4
        const OBFUSCATED = 0x8000;
    }
}

bitflags! {
    /// Flags of the FIB byte at offset 0x13
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct FibFlags2: u8 {
        const MAC = 0x01;
        const EMPTY_SPECIAL = 0x02;
        const LOAD_OVERRIDE_PAGE = 0x04;
        const FUTURE_SAVED_UNDO = 0x08;
        const WORD97_SAVED = 0x10;
    }
}

/// An (offset, length) pair pointing into the table stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FcLcb {
    pub fc: u32,
    pub lcb: u32,
}

impl FcLcb {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lcb == 0
    }

    /// The bytes this pair points at, or `None` if absent or out of bounds.
    pub fn slice<'a>(&self, stream: &'a [u8]) -> Option<&'a [u8]> {
        if self.is_empty() {
            return None;
        }
        let start = self.fc as usize;
        let end = start.checked_add(self.lcb as usize)?;
        stream.get(start..end)
    }
}

/// Character counts of the main text and the sub-documents that follow it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CcpCounts {
    pub text: u32,
    pub footnote: u32,
    pub header: u32,
    pub macro_text: u32,
    pub annotation: u32,
    pub endnote: u32,
    pub textbox: u32,
    pub header_textbox: u32,
}

/// Word release that wrote the file, derived from `nFib`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordVersion {
    Word6,
    Word95,
    Word97,
    Word2000,
    Word2002,
    Word2003,
    Word2007,
    Unknown(u16),
}

impl WordVersion {
    fn from_nfib(nfib: u16) -> Self {
        match nfib {
            0x0065 => WordVersion::Word6,
            0x0068 => WordVersion::Word95,
            0x00C1 => WordVersion::Word97,
            0x00D9 => WordVersion::Word2000,
            0x0101 => WordVersion::Word2002,
            0x010C => WordVersion::Word2003,
            0x0112 => WordVersion::Word2007,
            other => WordVersion::Unknown(other),
        }
    }
}

/// File Information Block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fib {
    /// Magic number (0xA5EC for Word 97+, 0xA5DC for Word 6/95)
    pub ident: u16,
    /// File format version
    pub nfib: u16,
    /// Language id of the document
    pub lid: u16,
    pub flags: FibFlags,
    pub nfib_back: u16,
    /// Encryption key material (verifier in the low half for Word 95)
    pub l_key: u32,
    pub envr: u8,
    pub flags2: FibFlags2,
    /// First text byte in the WordDocument stream
    pub fc_min: u32,
    /// Byte after the last text byte
    pub fc_mac: u32,
    pub ccp: CcpCounts,
    /// Stylesheet (STSH)
    pub stshf: FcLcb,
    /// Footnote text boundaries
    pub plcffnd_txt: FcLcb,
    /// Section descriptors
    pub plcf_sed: FcLcb,
    /// Header/footer story boundaries
    pub plcf_hdd: FcLcb,
    /// Character formatting bin table
    pub plcf_bte_chpx: FcLcb,
    /// Paragraph formatting bin table
    pub plcf_bte_papx: FcLcb,
    /// Complex part: the piece table
    pub clx: FcLcb,
    /// Main document text box boundaries
    pub plcftxbx_txt: FcLcb,
}

/// Offsets of the FcLcb pairs in one FIB layout.
struct FcLcbLayout {
    ccp_base: usize,
    stshf: usize,
    plcffnd_txt: usize,
    plcf_sed: usize,
    plcf_hdd: usize,
    plcf_bte_chpx: usize,
    plcf_bte_papx: usize,
    clx: usize,
    plcftxbx_txt: usize,
}

const LEGACY_LAYOUT: FcLcbLayout = FcLcbLayout {
    ccp_base: 0x34,
    stshf: 0x60,
    plcffnd_txt: 0x70,
    plcf_sed: 0x88,
    plcf_hdd: 0xB0,
    plcf_bte_chpx: 0xB8,
    plcf_bte_papx: 0xC0,
    clx: 0x160,
    plcftxbx_txt: 0x222,
};

const MODERN_LAYOUT: FcLcbLayout = FcLcbLayout {
    ccp_base: 0x4C,
    stshf: FC_LCB_BASE + 8,
    plcffnd_txt: FC_LCB_BASE + 8 * 3,
    plcf_sed: FC_LCB_BASE + 8 * 6,
    plcf_hdd: FC_LCB_BASE + 8 * 11,
    plcf_bte_chpx: FC_LCB_BASE + 8 * 12,
    plcf_bte_papx: FC_LCB_BASE + 8 * 13,
    clx: FC_LCB_BASE + 8 * 33,
    plcftxbx_txt: FC_LCB_BASE + 8 * 56,
};

impl Fib {
    /// Parse a FIB from the WordDocument stream.
    ///
    /// Never fails: a stream shorter than [`FIB_MIN_SIZE`] yields a zeroed FIB, and
    /// fields past the end of the stream read as zero.
    pub fn parse(word_document: &[u8]) -> Self {
        if word_document.len() < FIB_MIN_SIZE {
            debug!(
                "WordDocument stream has {} bytes, too short for a FIB",
                word_document.len()
            );
            return Fib::default();
        }

        let u16_at = |offset: usize| read_u16_le(word_document, offset).unwrap_or(0);
        let u32_at = |offset: usize| read_u32_le(word_document, offset).unwrap_or(0);
        let pair_at = |offset: usize| FcLcb {
            fc: u32_at(offset),
            lcb: u32_at(offset + 4),
        };

        let ident = u16_at(0);
        let nfib = u16_at(2);
        if ident != WIDENT_WORD97 && ident != WIDENT_WORD6 {
            debug!("unexpected FIB wIdent {ident:#06x}, continuing");
        }

        let layout = if nfib < FIRST_MODERN_NFIB {
            &LEGACY_LAYOUT
        } else {
            &MODERN_LAYOUT
        };
        let ccp_at = |index: usize| u32_at(layout.ccp_base + index * 4);

        Fib {
            ident,
            nfib,
            lid: u16_at(6),
            flags: FibFlags::from_bits_retain(u16_at(0x0A)),
            nfib_back: u16_at(0x0C),
            l_key: u32_at(0x0E),
            envr: read_u8(word_document, 0x12).unwrap_or(0),
            flags2: FibFlags2::from_bits_retain(read_u8(word_document, 0x13).unwrap_or(0)),
            fc_min: u32_at(0x18),
            fc_mac: u32_at(0x1C),
            ccp: CcpCounts {
                text: ccp_at(0),
                footnote: ccp_at(1),
                header: ccp_at(2),
                macro_text: ccp_at(3),
                annotation: ccp_at(4),
                endnote: ccp_at(5),
                textbox: ccp_at(6),
                header_textbox: ccp_at(7),
            },
            stshf: pair_at(layout.stshf),
            plcffnd_txt: pair_at(layout.plcffnd_txt),
            plcf_sed: pair_at(layout.plcf_sed),
            plcf_hdd: pair_at(layout.plcf_hdd),
            plcf_bte_chpx: pair_at(layout.plcf_bte_chpx),
            plcf_bte_papx: pair_at(layout.plcf_bte_papx),
            clx: pair_at(layout.clx),
            plcftxbx_txt: pair_at(layout.plcftxbx_txt),
        }
    }

    /// Word 6/95 layout (`nFib < 0x76`).
    #[inline]
    pub fn is_legacy(&self) -> bool {
        self.nfib < FIRST_MODERN_NFIB
    }

    #[inline]
    pub fn version(&self) -> WordVersion {
        WordVersion::from_nfib(self.nfib)
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(FibFlags::ENCRYPTED)
    }

    #[inline]
    pub fn is_obfuscated(&self) -> bool {
        self.flags.contains(FibFlags::OBFUSCATED)
    }

    #[inline]
    pub fn is_complex(&self) -> bool {
        self.flags.contains(FibFlags::COMPLEX)
    }

    /// Number of fast saves since the last full save.
    #[inline]
    pub fn quick_saves(&self) -> u8 {
        ((self.flags & FibFlags::QUICK_SAVES).bits() >> 4) as u8
    }

    /// Name of the table stream this FIB selects.
    #[inline]
    pub fn table_stream_name(&self) -> &'static str {
        if self.flags.contains(FibFlags::WHICH_TBL_STM) {
            "1Table"
        } else {
            "0Table"
        }
    }

    /// Total characters of the main text and every sub-document.
    ///
    /// Macro text only counts for Word 6/95 files.
    pub fn total_ccp(&self) -> u32 {
        let c = &self.ccp;
        let macro_text = if self.is_legacy() { c.macro_text } else { 0 };
        [
            c.text,
            c.footnote,
            c.header,
            macro_text,
            c.annotation,
            c.endnote,
            c.textbox,
            c.header_textbox,
        ]
        .iter()
        .fold(0u32, |acc, &n| acc.saturating_add(n))
    }
}
