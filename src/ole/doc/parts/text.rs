/// Text decoding over the piece table.
///
/// Callers address text by byte range (FC) or character range (CP); the decoder
/// clips the range against every piece and concatenates the decoded overlaps, so
/// piece boundaries are invisible. The result is raw text: paragraph marks, field
/// delimiters and other control characters are preserved for the caller to clean.
use super::piece_table::{Piece, PieceTable};
use crate::ole::codepage::{decode_best, decode_utf16le_text};
use memchr::memchr;
use smallvec::SmallVec;

/// Decodes piece text from the WordDocument stream.
#[derive(Debug, Clone)]
pub struct TextDecoder<'a> {
    stream: &'a [u8],
    pieces: &'a PieceTable,
    /// Candidate code pages for 8-bit pieces, in preference order
    code_pages: SmallVec<[u32; 4]>,
}

impl<'a> TextDecoder<'a> {
    pub fn new(stream: &'a [u8], pieces: &'a PieceTable, code_pages: SmallVec<[u32; 4]>) -> Self {
        Self {
            stream,
            pieces,
            code_pages,
        }
    }

    #[inline]
    pub fn pieces(&self) -> &'a PieceTable {
        self.pieces
    }

    /// Decode the bytes `[fc_start, fc_end)` of one piece.
    ///
    /// The range is clipped to the piece and to the stream; Unicode ranges are
    /// aligned to whole characters.
    pub fn decode_piece_range(&self, piece: &Piece, fc_start: u32, fc_end: u32) -> String {
        let width = piece.char_width();
        let mut start = fc_start.max(piece.fc_start);
        let mut end = fc_end.min(piece.fc_end());
        if width == 2 {
            start = piece.fc_start + (start - piece.fc_start).div_ceil(2) * 2;
            end = piece.fc_start + ((end.max(piece.fc_start) - piece.fc_start) / 2) * 2;
        }
        if start >= end {
            return String::new();
        }

        let end = (end as usize).min(self.stream.len());
        let Some(bytes) = self.stream.get(start as usize..end) else {
            return String::new();
        };

        if piece.is_unicode {
            decode_utf16le_text(bytes)
        } else {
            decode_best(bytes, &self.code_pages)
        }
    }

    /// Text of the byte range `[fc_start, fc_end)` across all pieces, in piece order.
    pub fn text_for_range(&self, fc_start: u32, fc_end: u32) -> String {
        let mut text = String::new();
        for piece in self.pieces.pieces() {
            if piece.fc_end() <= fc_start || piece.fc_start >= fc_end {
                continue;
            }
            text.push_str(&self.decode_piece_range(piece, fc_start, fc_end));
        }
        text
    }

    /// Text of the character range `[cp_start, cp_end)`.
    pub fn text_for_cp_range(&self, cp_start: u32, cp_end: u32) -> String {
        self.segments_for_cp_range(cp_start, cp_end)
            .map(|(_, text)| text)
            .collect()
    }

    /// The piece overlaps of `[cp_start, cp_end)`, each decoded separately.
    pub fn segments_for_cp_range(
        &self,
        cp_start: u32,
        cp_end: u32,
    ) -> impl Iterator<Item = (&'a Piece, String)> + '_ {
        let pieces = self.pieces.pieces();
        let first = pieces.partition_point(|piece| piece.cp_end <= cp_start);

        pieces[first..]
            .iter()
            .take_while(move |piece| piece.cp_start < cp_end)
            .filter_map(move |piece| {
                let start = cp_start.max(piece.cp_start);
                let end = cp_end.min(piece.cp_end);
                if start >= end {
                    return None;
                }
                let fc_start = piece.cp_to_fc(start)?;
                let fc_end = piece.cp_to_fc(end)?;
                Some((piece, self.decode_piece_range(piece, fc_start, fc_end)))
            })
    }

    /// The piece overlaps of `[cp_start, cp_end)`, split after each paragraph mark.
    ///
    /// Each chunk comes with its first CP. Marks are found in the stored bytes, so
    /// the CPs stay exact when a double-byte code page decodes two bytes to one
    /// character.
    pub fn paragraph_chunks_for_cp_range(
        &self,
        cp_start: u32,
        cp_end: u32,
    ) -> impl Iterator<Item = (&'a Piece, u32, String)> + '_ {
        let pieces = self.pieces.pieces();
        let first = pieces.partition_point(|piece| piece.cp_end <= cp_start);

        pieces[first..]
            .iter()
            .take_while(move |piece| piece.cp_start < cp_end)
            .flat_map(move |piece| {
                let end = cp_end.min(piece.cp_end);
                let mut cp = cp_start.max(piece.cp_start);
                let mut chunks = Vec::new();
                while cp < end {
                    let next = self.next_mark(piece, cp, end).map_or(end, |mark| mark + 1);
                    let (Some(fc_start), Some(fc_end)) = (piece.cp_to_fc(cp), piece.cp_to_fc(next))
                    else {
                        break;
                    };
                    chunks.push((piece, cp, self.decode_piece_range(piece, fc_start, fc_end)));
                    cp = next;
                }
                chunks
            })
    }

    /// CP of the first paragraph mark of `piece` in `[cp_start, cp_end)`.
    fn next_mark(&self, piece: &Piece, cp_start: u32, cp_end: u32) -> Option<u32> {
        let fc_start = piece.cp_to_fc(cp_start)? as usize;
        let fc_end = (piece.cp_to_fc(cp_end)? as usize).min(self.stream.len());
        let bytes = self.stream.get(fc_start..fc_end)?;

        let offset = if piece.is_unicode {
            bytes.chunks_exact(2).position(|unit| unit == [0x0D, 0x00])? * 2
        } else {
            memchr(b'\r', bytes)?
        };
        Some(cp_start + offset as u32 / piece.char_width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::doc::parts::fib::Fib;
    use smallvec::smallvec;

    /// "Hello " as 8-bit at 0x10 and "World" as UTF-16 at 0x40.
    fn hello_world() -> (Vec<u8>, PieceTable) {
        let mut stream = vec![0u8; 0x60];
        stream[0x10..0x16].copy_from_slice(b"Hello ");
        for (i, unit) in "World".encode_utf16().enumerate() {
            stream[0x40 + i * 2..0x42 + i * 2].copy_from_slice(&unit.to_le_bytes());
        }

        let mut clx: Vec<u8> = [0u32, 6, 11].iter().flat_map(|cp| cp.to_le_bytes()).collect();
        for fc in [0x4000_0000u32 | 0x20, 0x40] {
            clx.extend_from_slice(&[0, 0]);
            clx.extend_from_slice(&fc.to_le_bytes());
            clx.extend_from_slice(&[0, 0]);
        }
        let fib = Fib {
            nfib: 0x00C1,
            ..Fib::default()
        };
        let table = PieceTable::parse(Some(&clx), &fib, stream.len());
        (stream, table)
    }

    #[test]
    fn test_text_for_cp_range() {
        let (stream, table) = hello_world();
        let decoder = TextDecoder::new(&stream, &table, smallvec![1252]);
        assert_eq!(decoder.text_for_cp_range(0, 11), "Hello World");
        assert_eq!(decoder.text_for_cp_range(4, 8), "o Wo");
        assert_eq!(decoder.text_for_cp_range(9, 100), "ld");
        assert_eq!(decoder.segments_for_cp_range(0, 11).count(), 2);
    }

    #[test]
    fn test_text_for_range_clips_pieces() {
        let (stream, table) = hello_world();
        let decoder = TextDecoder::new(&stream, &table, smallvec![1252]);
        assert_eq!(decoder.text_for_range(0, 0x100), "Hello World");
        assert_eq!(decoder.text_for_range(0x12, 0x44), "llo Wo");
        // Odd bounds inside a Unicode piece round inward to whole characters
        assert_eq!(decoder.text_for_range(0x41, 0x45), "o");
        assert_eq!(decoder.text_for_range(0x20, 0x30), "");
    }

    #[test]
    fn test_8bit_pieces_use_code_pages() {
        let stream = vec![0xCF, 0xF0, 0xE8];
        let table = PieceTable::synthetic(0, 3, stream.len());
        let decoder = TextDecoder::new(&stream, &table, smallvec![1251, 1252]);
        assert_eq!(decoder.text_for_cp_range(0, 3), "При");
    }

    #[test]
    fn test_paragraph_chunks_keep_byte_cps() {
        // Shift-JIS "日本" is four bytes and two characters
        let stream = b"\x93\xFA\x96\x7B\rB\rC".to_vec();
        let table = PieceTable::synthetic(0, stream.len() as u32, stream.len());
        let decoder = TextDecoder::new(&stream, &table, smallvec![932]);

        let chunks: Vec<(u32, String)> = decoder
            .paragraph_chunks_for_cp_range(0, 8)
            .map(|(_, cp, text)| (cp, text))
            .collect();
        assert_eq!(
            chunks,
            [
                (0, "日本\r".to_string()),
                (5, "B\r".to_string()),
                (7, "C".to_string())
            ]
        );
    }

    #[test]
    fn test_paragraph_chunks_in_unicode_pieces() {
        let mut stream = vec![0u8; 0x60];
        stream[0x10..0x16].copy_from_slice(b"Hello ");
        for (i, unit) in "Wo\rld".encode_utf16().enumerate() {
            stream[0x40 + i * 2..0x42 + i * 2].copy_from_slice(&unit.to_le_bytes());
        }
        let mut clx: Vec<u8> = [0u32, 6, 11].iter().flat_map(|cp| cp.to_le_bytes()).collect();
        for fc in [0x4000_0000u32 | 0x20, 0x40] {
            clx.extend_from_slice(&[0, 0]);
            clx.extend_from_slice(&fc.to_le_bytes());
            clx.extend_from_slice(&[0, 0]);
        }
        let fib = Fib {
            nfib: 0x00C1,
            ..Fib::default()
        };
        let table = PieceTable::parse(Some(&clx), &fib, stream.len());
        let decoder = TextDecoder::new(&stream, &table, smallvec![1252]);

        let chunks: Vec<(u32, String)> = decoder
            .paragraph_chunks_for_cp_range(2, 11)
            .map(|(_, cp, text)| (cp, text))
            .collect();
        assert_eq!(
            chunks,
            [
                (2, "llo ".to_string()),
                (6, "Wo\r".to_string()),
                (9, "ld".to_string())
            ]
        );
    }
}
