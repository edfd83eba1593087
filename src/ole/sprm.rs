//! SPRM (Single Property Modifier) parsing.
//!
//! A grpprl is a flat sequence of SPRMs, each an opcode followed by its operand.
//! Word 97 and later use 2-byte opcodes that carry the operand size in bits 13-15.
//! Word 6/95 use 1-byte opcodes whose operand width must be known per opcode.

use crate::common::binary::{read_i16_le, read_u16_le};

/// SPRM operation types based on the size code of a 2-byte opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprmOperation {
    /// Size code 0 - toggle (1 byte operand)
    Toggle,
    /// Size code 1 - 1 byte operand
    Byte,
    /// Size code 2 - 2 byte operand
    Word,
    /// Size code 3 - 4 byte operand
    DWord,
    /// Size code 4 - 2 byte operand
    Word2,
    /// Size code 5 - 2 byte operand
    Word3,
    /// Size code 6 - variable length operand
    Variable,
    /// Size code 7 - 3 byte operand
    ThreeByte,
}

impl From<u8> for SprmOperation {
    fn from(size_code: u8) -> Self {
        match size_code & 0x07 {
            0 => SprmOperation::Toggle,
            1 => SprmOperation::Byte,
            2 => SprmOperation::Word,
            3 => SprmOperation::DWord,
            4 => SprmOperation::Word2,
            5 => SprmOperation::Word3,
            6 => SprmOperation::Variable,
            _ => SprmOperation::ThreeByte,
        }
    }
}

/// An SPRM (Single Property Modifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprm {
    /// SPRM opcode (a 1-byte legacy opcode is widened to u16)
    pub opcode: u16,
    /// SPRM operation type
    pub operation: SprmOperation,
    /// SPRM operand data, without any length prefix
    pub operand: Vec<u8>,
}

impl Sprm {
    /// Get the operand as a byte.
    #[inline]
    pub fn operand_byte(&self) -> Option<u8> {
        self.operand.first().copied()
    }

    /// Get the operand as a word (u16).
    #[inline]
    pub fn operand_word(&self) -> Option<u16> {
        read_u16_le(&self.operand, 0).ok()
    }

    /// Get the operand as a signed word (i16).
    #[inline]
    pub fn operand_i16(&self) -> Option<i16> {
        read_i16_le(&self.operand, 0).ok()
    }
}

/// sprmTDefTable: variable operand with a 2-byte length
const SPRM_T_DEF_TABLE: u16 = 0xD608;

/// Parse SPRMs using 2-byte opcodes (Word 97+).
///
/// Parsing stops at the first SPRM whose operand would run past the buffer.
pub fn parse_sprms(grpprl: &[u8]) -> Vec<Sprm> {
    let mut sprms = Vec::new();
    let mut offset = 0;

    while offset + 2 <= grpprl.len() {
        let opcode = read_u16_le(grpprl, offset).unwrap_or(0);
        offset += 2;

        // Bits 13-15 hold the size code
        let operation = SprmOperation::from((opcode >> 13) as u8);

        let (prefix, operand_size) = match operation {
            SprmOperation::Toggle | SprmOperation::Byte => (0, 1),
            SprmOperation::Word | SprmOperation::Word2 | SprmOperation::Word3 => (0, 2),
            SprmOperation::DWord => (0, 4),
            SprmOperation::ThreeByte => (0, 3),
            SprmOperation::Variable if opcode == SPRM_T_DEF_TABLE => {
                match read_u16_le(grpprl, offset) {
                    // The stored length counts one byte of its own
                    Ok(len) => (2, (len as usize).saturating_sub(1)),
                    Err(_) => break,
                }
            },
            SprmOperation::Variable => match grpprl.get(offset) {
                Some(&len) => (1, len as usize),
                None => break,
            },
        };

        let start = offset + prefix;
        let Some(operand) = grpprl.get(start..start + operand_size) else {
            break;
        };

        sprms.push(Sprm {
            opcode,
            operation,
            operand: operand.to_vec(),
        });
        offset = start + operand_size;
    }

    sprms
}

/// Operand width of a Word 6/95 character opcode.
///
/// Opcodes outside the table are assumed to carry one byte, which is enough to
/// stay aligned on the character SPRMs written by those versions.
fn legacy_operand_size(opcode: u8) -> usize {
    match opcode {
        // sprmCFBold .. sprmCFVanish
        85..=92 => 1,
        // sprmCFtc
        93 => 2,
        // sprmCKul
        94 => 1,
        // sprmCSizePos
        95 => 3,
        // sprmCDxaSpace, sprmCLid
        96 | 97 => 2,
        // sprmCIco
        98 => 1,
        // sprmCHps
        99 => 2,
        // sprmCHpsInc
        100 => 1,
        // sprmCHpsPos
        101 => 2,
        // sprmCHpsPosAdj, sprmCIss, sprmCFtcDefault
        102 | 104 => 1,
        103 => 2,
        // sprmCPicLocation
        68 => 4,
        _ => 1,
    }
}

/// Parse SPRMs using 1-byte opcodes (Word 6/95).
pub fn parse_legacy_sprms(grpprl: &[u8]) -> Vec<Sprm> {
    let mut sprms = Vec::new();
    let mut offset = 0;

    while let Some(&opcode) = grpprl.get(offset) {
        offset += 1;
        let size = legacy_operand_size(opcode);
        let Some(operand) = grpprl.get(offset..offset + size) else {
            break;
        };

        let operation = match size {
            2 => SprmOperation::Word,
            3 => SprmOperation::ThreeByte,
            4 => SprmOperation::DWord,
            _ => SprmOperation::Byte,
        };
        sprms.push(Sprm {
            opcode: opcode as u16,
            operation,
            operand: operand.to_vec(),
        });
        offset += size;
    }

    sprms
}
