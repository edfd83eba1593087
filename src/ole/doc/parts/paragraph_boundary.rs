/// Paragraph boundary resolution.
///
/// Paragraph runs are recorded in PAPX FKP pages by byte offset (FC), while the
/// text is addressed by character position (CP) through the piece table. A
/// paragraph can span several pieces whose bytes are not adjacent, so finding
/// its limits means walking the pieces and asking the FKP at each step.
///
/// References:
/// - [MS-DOC] 2.8.16 PlcBtePapx
/// - [MS-DOC] 2.4.2 Determining Paragraph Boundaries
use super::fkp::{PapxFkp, read_fkp_page};
use super::piece_table::{Piece, PieceTable};
use crate::common::binary::{read_u16_le, read_u32_le};
use crate::ole::plcf::PlcfParser;
use log::debug;

/// Significant bits of a Word 97+ PnBte
const PN_MASK: u32 = 0x003F_FFFF;

/// Finds the paragraph containing a character position.
#[derive(Debug)]
pub struct ParagraphBoundaryResolver<'a> {
    pieces: &'a PieceTable,
    /// PlcBtePapx: FC breakpoints and FKP page numbers
    bte: PlcfParser,
    /// WordDocument stream holding the FKP pages
    stream: &'a [u8],
    legacy: bool,
    /// Last CP of the main text
    fallback: u32,
}

impl<'a> ParagraphBoundaryResolver<'a> {
    /// Build a resolver over the PlcBtePapx bytes.
    ///
    /// Returns `None` when the bin table holds no page at all.
    pub fn new(
        pieces: &'a PieceTable,
        plcf_bte_papx: &[u8],
        stream: &'a [u8],
        ccp_text: u32,
        legacy: bool,
    ) -> Option<Self> {
        let element_size = if legacy { 2 } else { 4 };
        let bte = PlcfParser::parse(plcf_bte_papx, element_size).filter(|plc| plc.count() > 0)?;
        Some(Self {
            pieces,
            bte,
            stream,
            legacy,
            fallback: ccp_text.saturating_sub(1),
        })
    }

    /// Page number of bin table entry `index`.
    fn page_number(&self, index: usize) -> Option<u32> {
        let pn = self.bte.property(index)?;
        if self.legacy {
            read_u16_le(pn, 0).ok().map(u32::from)
        } else {
            read_u32_le(pn, 0).ok().map(|pn| pn & PN_MASK)
        }
    }

    /// The FKP page and run holding byte `fc`.
    fn locate(&self, fc: u32) -> Option<(PapxFkp, usize)> {
        let index = self.bte.find_index(fc)?;
        let pn = self.page_number(index)?;
        let Some(page) = read_fkp_page(self.stream, pn) else {
            debug!("PAPX page {pn} lies beyond the WordDocument stream");
            return None;
        };
        let fkp = PapxFkp::parse(page, self.legacy)?;
        let run = fkp.find_run(fc)?;
        Some((fkp, run))
    }

    /// First CP of the paragraph containing `cp`.
    ///
    /// Never exceeds `cp`; unresolvable input yields the end of the main text
    /// clamped to `cp`.
    pub fn paragraph_start(&self, cp: u32) -> u32 {
        let fallback = self.fallback.min(cp);
        let pieces = self.pieces.pieces();
        let Some(mut index) = self.pieces.piece_index_for_cp(cp) else {
            return fallback;
        };
        let Some(mut fc) = pieces[index].cp_to_fc(cp) else {
            return fallback;
        };

        for _ in 0..=pieces.len() {
            let piece = &pieces[index];
            let Some((fkp, run)) = self.locate(fc) else {
                return fallback;
            };
            let Some(fc_first) = fkp.fc(run) else {
                return fallback;
            };

            if fc_first > piece.fc_start {
                let start = piece.cp_start + (fc_first - piece.fc_start) / piece.char_width();
                return start.min(cp);
            }
            if piece.cp_start == 0 || index == 0 {
                return 0;
            }

            // The run began before this piece: ask about the end of the previous one
            index -= 1;
            fc = pieces[index].fc_end();
        }

        debug!("paragraph start search for cp {cp} exceeded the piece count");
        fallback
    }

    /// Last CP (inclusive, the paragraph mark) of the paragraph containing `cp`.
    ///
    /// Never less than `cp`; unresolvable input yields the end of the main text.
    pub fn paragraph_end(&self, cp: u32) -> u32 {
        let fallback = self.fallback.max(cp);
        let pieces = self.pieces.pieces();
        let Some(mut index) = self.pieces.piece_index_for_cp(cp) else {
            return fallback;
        };
        let Some(mut fc) = pieces[index].cp_to_fc(cp) else {
            return fallback;
        };

        for _ in 0..=pieces.len() {
            let piece = &pieces[index];
            let Some((fkp, run)) = self.locate(fc) else {
                return fallback;
            };
            let Some(fc_lim) = fkp.fc(run + 1) else {
                return fallback;
            };

            if fc_lim <= piece.fc_end() {
                return last_cp_before(piece, fc_lim).max(cp);
            }
            if index + 1 >= pieces.len() {
                return piece.cp_end.saturating_sub(1).max(cp);
            }

            index += 1;
            fc = pieces[index].fc_start;
        }

        debug!("paragraph end search for cp {cp} exceeded the piece count");
        fallback
    }

    /// Style index of the paragraph containing `cp`.
    pub fn style_at(&self, cp: u32) -> Option<u16> {
        let index = self.pieces.piece_index_for_cp(cp)?;
        let fc = self.pieces.pieces()[index].cp_to_fc(cp)?;
        let (fkp, run) = self.locate(fc)?;
        fkp.style_index(run)
    }
}

/// CP of the character that ends just before byte `fc_lim` in `piece`.
#[inline]
fn last_cp_before(piece: &Piece, fc_lim: u32) -> u32 {
    (piece.cp_start + (fc_lim - piece.fc_start) / piece.char_width()).saturating_sub(1)
}
