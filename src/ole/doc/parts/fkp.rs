/// FKP (Formatted Disk Page) parser for DOC files.
///
/// FKPs are 512-byte pages of the WordDocument stream holding character (CHPX)
/// or paragraph (PAPX) property runs. Each page contains:
/// - an FC array at the start (4 bytes each, crun+1 entries)
/// - a BX array after the FCs (1 byte for CHPX, 13 or 7 bytes for PAPX)
/// - property data growing backwards from the end of the page
/// - crun at byte 511
///
/// References:
/// - [MS-DOC] 2.9.39 ChpxFkp
/// - [MS-DOC] 2.9.175 PapxFkp
use crate::common::binary::{read_u8, read_u16_le, read_u32_le};

/// Size of an FKP page in bytes (always 512)
pub const FKP_PAGE_SIZE: usize = 512;

/// Offset of the run count
const CRUN_OFFSET: usize = FKP_PAGE_SIZE - 1;

/// BX entry size in a Word 97+ PAPX FKP
const PAPX_BX_SIZE: usize = 13;
/// BX entry size in a Word 6/95 PAPX FKP
const LEGACY_PAPX_BX_SIZE: usize = 7;

/// Load page `pn` from the stream, zero-padding a short final page.
///
/// Returns `None` when the page starts at or beyond the end of the stream.
pub fn read_fkp_page(stream: &[u8], pn: u32) -> Option<Box<[u8; FKP_PAGE_SIZE]>> {
    let start = (pn as usize).checked_mul(FKP_PAGE_SIZE)?;
    if start >= stream.len() {
        return None;
    }
    let end = (start + FKP_PAGE_SIZE).min(stream.len());

    let mut page = Box::new([0u8; FKP_PAGE_SIZE]);
    page[..end - start].copy_from_slice(&stream[start..end]);
    Some(page)
}

/// Read the crun+1 FC boundaries of a page whose BX entries are `bx_size` bytes.
fn read_fcs(page: &[u8; FKP_PAGE_SIZE], bx_size: usize) -> Option<Vec<u32>> {
    let crun = page[CRUN_OFFSET] as usize;
    if crun == 0 || (crun + 1) * 4 + crun * bx_size > CRUN_OFFSET {
        return None;
    }
    (0..=crun)
        .map(|i| read_u32_le(page.as_slice(), i * 4).ok())
        .collect()
}

/// A single run in an FKP page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FkpEntry {
    /// First byte of the run in the WordDocument stream
    pub fc_start: u32,
    /// Byte after the run
    pub fc_end: u32,
    /// Property data (grpprl - group of SPRMs)
    pub grpprl: Vec<u8>,
}

/// CHPX FKP (Character Property Formatted Disk Page).
#[derive(Debug, Clone)]
pub struct ChpxFkp {
    /// Entries in this FKP page
    entries: Vec<FkpEntry>,
}

impl ChpxFkp {
    /// Parse a CHPX FKP page. Returns `None` for an empty or inconsistent page.
    pub fn parse(page: &[u8; FKP_PAGE_SIZE]) -> Option<Self> {
        let fcs = read_fcs(page, 1)?;
        let crun = fcs.len() - 1;
        let bx_offset = (crun + 1) * 4;

        let entries = (0..crun)
            .map(|i| {
                // BX = 0 means no formatting (use default)
                let grpprl = match page[bx_offset + i] as usize {
                    0 => Vec::new(),
                    bx => {
                        let cb_offset = bx * 2;
                        let cb = page.get(cb_offset).copied().unwrap_or(0) as usize;
                        let end = (cb_offset + 1 + cb).min(CRUN_OFFSET);
                        page.get(cb_offset + 1..end).unwrap_or_default().to_vec()
                    },
                };
                FkpEntry {
                    fc_start: fcs[i],
                    fc_end: fcs[i + 1],
                    grpprl,
                }
            })
            .collect();

        Some(Self { entries })
    }

    /// Get the number of entries in this FKP.
    #[inline]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Get all entries.
    #[inline]
    pub fn entries(&self) -> &[FkpEntry] {
        &self.entries
    }

    /// Consume the page into its entries.
    #[inline]
    pub fn into_entries(self) -> Vec<FkpEntry> {
        self.entries
    }
}

/// PAPX FKP (Paragraph Property Formatted Disk Page).
///
/// Only the run boundaries and each paragraph's style index are decoded.
#[derive(Debug, Clone)]
pub struct PapxFkp {
    page: Box<[u8; FKP_PAGE_SIZE]>,
    fcs: Vec<u32>,
    legacy: bool,
}

impl PapxFkp {
    /// Parse a PAPX FKP page. Returns `None` for an empty or inconsistent page.
    pub fn parse(page: Box<[u8; FKP_PAGE_SIZE]>, legacy: bool) -> Option<Self> {
        let bx_size = if legacy {
            LEGACY_PAPX_BX_SIZE
        } else {
            PAPX_BX_SIZE
        };
        let fcs = read_fcs(&page, bx_size)?;
        Some(Self { page, fcs, legacy })
    }

    /// Number of paragraph runs on the page.
    #[inline]
    pub fn run_count(&self) -> usize {
        self.fcs.len() - 1
    }

    /// FC boundary `index` (valid for `0..=run_count()`).
    #[inline]
    pub fn fc(&self, index: usize) -> Option<u32> {
        self.fcs.get(index).copied()
    }

    /// Index of the run containing `fc`: the largest `k` with `rgfc[k] <= fc`,
    /// provided `fc` lies before the page's final boundary.
    pub fn find_run(&self, fc: u32) -> Option<usize> {
        let last = *self.fcs.last()?;
        if fc >= last {
            return None;
        }
        let k = self.fcs.partition_point(|&boundary| boundary <= fc).checked_sub(1)?;
        // Unsorted pages can make the search land on a run that does not hold fc
        (self.fcs[k] <= fc && fc < self.fcs[k + 1]).then_some(k)
    }

    /// Style index (`istd`) of paragraph run `run`.
    ///
    /// A run without PAPX data uses style 0 (Normal).
    pub fn style_index(&self, run: usize) -> Option<u16> {
        if run >= self.run_count() {
            return None;
        }
        let bx_size = if self.legacy {
            LEGACY_PAPX_BX_SIZE
        } else {
            PAPX_BX_SIZE
        };
        let page = self.page.as_slice();
        let bx = read_u8(page, self.fcs.len() * 4 + run * bx_size).ok()? as usize;
        if bx == 0 {
            return Some(0);
        }

        // cb == 0 means the real count follows in the next byte
        let papx = bx * 2;
        let istd_offset = match read_u8(page, papx).ok()? {
            0 => papx + 2,
            _ => papx + 1,
        };
        if self.legacy {
            read_u8(page, istd_offset).ok().map(u16::from)
        } else {
            read_u16_le(page, istd_offset).ok()
        }
    }
}
