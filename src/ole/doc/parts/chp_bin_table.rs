/// CHPX bin table (PlcfBteChpx) parser.
///
/// This handles the two-level structure of character properties in DOC files:
/// 1. PlcfBteChpx (table stream): FC breakpoints with FKP page numbers
/// 2. CHPX FKP pages (WordDocument stream): 512-byte pages of character runs
///
/// Runs stay in FC space; callers map them through the piece table.
///
/// References:
/// - [MS-DOC] 2.8.5 PlcfBteChpx
/// - [MS-DOC] 2.9.39 ChpxFkp
use super::chp::CharacterProperties;
use super::fkp::{ChpxFkp, FkpEntry, read_fkp_page};
use crate::common::binary::{read_u16_le, read_u32_le};
use crate::ole::plcf::PlcfParser;
use log::debug;

/// Significant bits of a Word 97+ PnFkpChpx
const PN_MASK: u32 = 0x003F_FFFF;

/// Character runs from every CHPX FKP page, sorted by FC.
#[derive(Debug, Clone, Default)]
pub struct ChpBinTable {
    runs: Vec<FkpEntry>,
    legacy: bool,
}

impl ChpBinTable {
    /// Parse the bin table and load its FKP pages.
    ///
    /// Page numbers are 4 bytes (low 22 bits) on Word 97+ and 2 bytes on Word 6/95.
    /// Unreadable pages are skipped.
    pub fn parse(plcf_bte_chpx: &[u8], word_document: &[u8], legacy: bool) -> Self {
        let element_size = if legacy { 2 } else { 4 };
        let Some(bte) = PlcfParser::parse(plcf_bte_chpx, element_size) else {
            return Self {
                runs: Vec::new(),
                legacy,
            };
        };

        let mut all_runs = Vec::new();
        for (_, _, pn) in bte.iter() {
            let pn = if legacy {
                read_u16_le(pn, 0).map(u32::from)
            } else {
                read_u32_le(pn, 0).map(|pn| pn & PN_MASK)
            };
            let Ok(pn) = pn else {
                continue;
            };
            // Page 0 holds the FIB
            if pn == 0 {
                continue;
            }

            match read_fkp_page(word_document, pn).and_then(|page| ChpxFkp::parse(&page)) {
                Some(fkp) => all_runs.extend(fkp.into_entries()),
                None => debug!("skipping unreadable CHPX page {pn}"),
            }
        }

        // Consecutive runs must not overlap
        all_runs.sort_by_key(|run| (run.fc_start, run.fc_end));
        let mut runs: Vec<FkpEntry> = Vec::with_capacity(all_runs.len());
        let mut last_end = 0u32;
        for mut run in all_runs {
            if run.fc_start < last_end {
                if run.fc_end <= last_end {
                    continue;
                }
                run.fc_start = last_end;
            }
            if run.fc_start >= run.fc_end {
                continue;
            }
            last_end = run.fc_end;
            runs.push(run);
        }

        debug!("CHPX bin table: {} runs", runs.len());
        Self { runs, legacy }
    }

    /// Get all character runs.
    #[inline]
    pub fn runs(&self) -> &[FkpEntry] {
        &self.runs
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The grpprl of the run containing byte `fc`.
    pub fn chpx_at(&self, fc: u32) -> Option<&[u8]> {
        let index = self.runs.partition_point(|run| run.fc_start <= fc).checked_sub(1)?;
        let run = &self.runs[index];
        (fc < run.fc_end).then_some(run.grpprl.as_slice())
    }

    /// Decoded properties of the run containing byte `fc`.
    pub fn properties_at(&self, fc: u32) -> CharacterProperties {
        self.chpx_at(fc)
            .map(|grpprl| CharacterProperties::from_grpprl(grpprl, self.legacy))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::doc::parts::fkp::FKP_PAGE_SIZE;

    /// A WordDocument stream with one CHPX page at `pn` holding runs
    /// `[fcs[0], fcs[1])`, ... where the first run is bold.
    fn stream_with_page(pn: usize, fcs: &[u32]) -> Vec<u8> {
        let mut stream = vec![0u8; (pn + 1) * FKP_PAGE_SIZE];
        let page = &mut stream[pn * FKP_PAGE_SIZE..];
        for (i, fc) in fcs.iter().enumerate() {
            page[i * 4..i * 4 + 4].copy_from_slice(&fc.to_le_bytes());
        }
        page[fcs.len() * 4] = 0x80;
        page[0x100..0x104].copy_from_slice(&[3, 0x35, 0x08, 0x01]);
        page[FKP_PAGE_SIZE - 1] = (fcs.len() - 1) as u8;
        stream
    }

    fn bte(fcs: &[u32], pns: &[u32]) -> Vec<u8> {
        fcs.iter().chain(pns).flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_runs_and_lookup() {
        let stream = stream_with_page(2, &[0x600, 0x610, 0x640]);
        let table = ChpBinTable::parse(&bte(&[0x600, 0x640], &[2]), &stream, false);

        assert_eq!(table.runs().len(), 2);
        assert_eq!(table.chpx_at(0x605), Some(&[0x35, 0x08, 0x01][..]));
        assert_eq!(table.chpx_at(0x610), Some(&[][..]));
        assert_eq!(table.chpx_at(0x640), None);
        assert_eq!(table.chpx_at(0x10), None);
        assert!(table.properties_at(0x600).bold);
        assert!(!table.properties_at(0x620).bold);
    }

    #[test]
    fn test_legacy_page_numbers() {
        let stream = stream_with_page(1, &[0x300, 0x320]);
        let mut plc = Vec::new();
        for fc in [0x300u32, 0x320] {
            plc.extend_from_slice(&fc.to_le_bytes());
        }
        plc.extend_from_slice(&1u16.to_le_bytes());

        let table = ChpBinTable::parse(&plc, &stream, true);
        assert_eq!(table.runs().len(), 1);
        assert!(table.properties_at(0x310).bold);
    }

    #[test]
    fn test_bad_pages_are_skipped() {
        let stream = stream_with_page(1, &[0x300, 0x320]);
        let table = ChpBinTable::parse(&bte(&[0x300, 0x320, 0x400], &[0, 9]), &stream, false);
        assert!(table.is_empty());
        assert!(ChpBinTable::parse(&[1, 2], &stream, false).is_empty());
    }
}
