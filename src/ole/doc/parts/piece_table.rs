/// Piece Table parser for DOC files.
///
/// The piece table maps Character Positions (CP) to File Characters (FC)
/// in the WordDocument stream. Each piece is a run of consecutive characters
/// stored either as UTF-16LE or as 8-bit code page text.
///
/// References:
/// - [MS-DOC] 2.9.38 Clx (Complex file information)
/// - [MS-DOC] 2.9.177 PlcPcd
/// - [MS-DOC] 2.9.179 Pcd (Piece Descriptor)
use super::fib::Fib;
use crate::common::binary::{read_u16_le, read_u32_le};
use crate::ole::plcf::PlcfParser;
use log::{debug, warn};

/// Size of a piece descriptor (PCD)
pub const PCD_SIZE: usize = 8;

/// Set in a PCD offset when the piece holds 8-bit text
const FC_COMPRESSED: u32 = 0x4000_0000;
const FC_MASK: u32 = 0x3FFF_FFFF;

const CLX_PRC: u8 = 0x01;
const CLX_PCDT: u8 = 0x02;

/// A text piece - maps a range of CPs to an FC in the WordDocument stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// Start character position (CP)
    pub cp_start: u32,
    /// End character position (CP), exclusive
    pub cp_end: u32,
    /// Byte offset of the first character in the WordDocument stream
    pub fc_start: u32,
    /// Whether the text is Unicode (true) or single-byte (false)
    pub is_unicode: bool,
    /// Property modifier of the descriptor
    pub prm: u16,
    /// Raw CHPX grpprl in effect at the start of the piece
    pub chpx: Option<Vec<u8>>,
}

impl Piece {
    /// Bytes per character.
    #[inline]
    pub fn char_width(&self) -> u32 {
        if self.is_unicode { 2 } else { 1 }
    }

    /// Get the length in characters.
    #[inline]
    pub fn len(&self) -> u32 {
        self.cp_end - self.cp_start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cp_end == self.cp_start
    }

    /// Byte offset just past the last character.
    #[inline]
    pub fn fc_end(&self) -> u32 {
        self.fc_start
            .saturating_add(self.len().saturating_mul(self.char_width()))
    }

    #[inline]
    pub fn contains_cp(&self, cp: u32) -> bool {
        (self.cp_start..self.cp_end).contains(&cp)
    }

    /// Convert a CP within this piece (end inclusive) to an FC.
    pub fn cp_to_fc(&self, cp: u32) -> Option<u32> {
        if cp < self.cp_start || cp > self.cp_end {
            return None;
        }
        Some(self.fc_start + (cp - self.cp_start) * self.char_width())
    }

    /// Convert an FC to a CP within this piece (end inclusive).
    pub fn fc_to_cp(&self, fc: u32) -> Option<u32> {
        if fc < self.fc_start {
            return None;
        }
        let cp = self.cp_start + (fc - self.fc_start) / self.char_width();
        if cp > self.cp_end { None } else { Some(cp) }
    }
}

/// Piece Table - the ordered, contiguous list of pieces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceTable {
    /// All text pieces, sorted by CP
    pieces: Vec<Piece>,
    /// Whether the table was synthesized from `fcMin..fcMac`
    synthetic: bool,
}

impl PieceTable {
    /// Build the piece table for a document.
    ///
    /// `clx` is the CLX blob (absent when the FIB points nowhere); `stream_len` is the
    /// WordDocument stream length used to validate every piece. Any structural
    /// anomaly falls back to [`PieceTable::synthetic`].
    pub fn parse(clx: Option<&[u8]>, fib: &Fib, stream_len: usize) -> Self {
        let parsed = match clx {
            Some(clx) => Self::parse_clx(clx, fib.is_legacy(), stream_len),
            None => Err("no CLX".to_string()),
        };

        match parsed {
            Ok(pieces) => {
                debug!("piece table: {} pieces", pieces.len());
                Self {
                    pieces,
                    synthetic: false,
                }
            },
            Err(reason) => {
                warn!(
                    "unusable piece table ({reason}); using one 8-bit piece over {:#x}..{:#x}",
                    fib.fc_min, fib.fc_mac
                );
                Self::synthetic(fib.fc_min, fib.fc_mac, stream_len)
            },
        }
    }

    /// One 8-bit piece spanning `[fc_min, fc_mac)`, clipped to the stream.
    pub fn synthetic(fc_min: u32, fc_mac: u32, stream_len: usize) -> Self {
        let fc_mac = fc_mac.min(u32::try_from(stream_len).unwrap_or(u32::MAX));
        let pieces = if fc_mac > fc_min {
            vec![Piece {
                cp_start: 0,
                cp_end: fc_mac - fc_min,
                fc_start: fc_min,
                is_unicode: false,
                prm: 0,
                chpx: None,
            }]
        } else {
            Vec::new()
        };

        Self {
            pieces,
            synthetic: true,
        }
    }

    /// Decode the CLX, trying the tagged layout first and then the bare PlcPcd.
    fn parse_clx(clx: &[u8], legacy: bool, stream_len: usize) -> Result<Vec<Piece>, String> {
        let tagged = locate_pcdt(clx).and_then(|body| decode_plcpcd(body, legacy, stream_len));
        match tagged {
            Ok(pieces) => Ok(pieces),
            Err(tagged_reason) => decode_plcpcd(clx, legacy, stream_len).map_err(|bare_reason| {
                format!("tagged: {tagged_reason}; untagged: {bare_reason}")
            }),
        }
    }

    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Total number of characters covered by all pieces.
    #[inline]
    pub fn total_cp(&self) -> u32 {
        self.pieces.last().map_or(0, |piece| piece.cp_end)
    }

    /// Index of the piece containing `cp`.
    pub fn piece_index_for_cp(&self, cp: u32) -> Option<usize> {
        let index = self.pieces.partition_point(|piece| piece.cp_end <= cp);
        self.pieces
            .get(index)
            .filter(|piece| piece.cp_start <= cp)
            .map(|_| index)
    }

    /// Attach CHPX bytes to each piece from a lookup by start FC.
    pub fn attach_chpx(&mut self, lookup: impl Fn(u32) -> Option<Vec<u8>>) {
        for piece in &mut self.pieces {
            piece.chpx = lookup(piece.fc_start);
        }
    }
}

/// Find the Pcdt body inside a tagged CLX.
fn locate_pcdt(clx: &[u8]) -> Result<&[u8], String> {
    let mut offset = clx.iter().take_while(|&&b| b == 0).count();

    loop {
        match clx.get(offset) {
            Some(&CLX_PRC) => {
                let size = read_u16_le(clx, offset + 1).map_err(|e| e.to_string())? as usize;
                offset += 3 + size;
            },
            Some(&CLX_PCDT) => {
                let lcb = read_u32_le(clx, offset + 1).map_err(|e| e.to_string())? as usize;
                let start = offset + 5;
                return start
                    .checked_add(lcb)
                    .and_then(|end| clx.get(start..end))
                    .ok_or_else(|| format!("Pcdt of {lcb} bytes overruns the CLX"));
            },
            Some(tag) => return Err(format!("unexpected CLX tag {tag:#04x} at {offset}")),
            None => return Err("CLX ends before a Pcdt".to_string()),
        }
    }
}

/// Decode and validate a PlcPcd.
fn decode_plcpcd(body: &[u8], legacy: bool, stream_len: usize) -> Result<Vec<Piece>, String> {
    if body.len() < 4 + 4 + PCD_SIZE || (body.len() - 4) % (4 + PCD_SIZE) != 0 {
        return Err(format!("PlcPcd length {} is not 4 + 12n", body.len()));
    }
    let plc = PlcfParser::parse(body, PCD_SIZE).ok_or("PlcPcd too short")?;
    if plc.position(0) != Some(0) {
        return Err(format!("first cp is {:?}, not 0", plc.position(0)));
    }

    let mut pieces = Vec::with_capacity(plc.count());
    for (cp_start, cp_end, pcd) in plc.iter() {
        if cp_end < cp_start {
            return Err(format!("cp {cp_end} follows {cp_start}"));
        }

        let raw = read_u32_le(pcd, 2).map_err(|e| e.to_string())?;
        let prm = read_u16_le(pcd, 6).map_err(|e| e.to_string())?;
        let (fc_start, is_unicode) = if raw & FC_COMPRESSED != 0 {
            ((raw & FC_MASK) / 2, false)
        } else {
            // Word 6/95 pieces are always 8-bit
            (raw & FC_MASK, !legacy)
        };

        let width = if is_unicode { 2 } else { 1 };
        let fc_end = fc_start as u64 + (cp_end - cp_start) as u64 * width;
        if fc_end > stream_len as u64 {
            return Err(format!(
                "piece {cp_start}..{cp_end} ends at {fc_end:#x}, past the {stream_len:#x}-byte stream"
            ));
        }

        pieces.push(Piece {
            cp_start,
            cp_end,
            fc_start,
            is_unicode,
            prm,
            chpx: None,
        });
    }

    Ok(pieces)
}
