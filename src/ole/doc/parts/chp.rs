/// Character Properties (CHP) decoding.
///
/// Only the attributes that matter for text extraction are decoded:
/// - toggles: bold, italic, strikethrough, small caps, all caps, hidden
/// - underline style
/// - font size, character scale, spacing and language
///
/// Word 97+ grpprls use 2-byte opcodes; Word 6/95 use 1-byte opcodes with
/// different numbers for the same properties.
use crate::ole::sprm::{Sprm, parse_legacy_sprms, parse_sprms};

/// Default font size in half-points (10pt)
pub const DEFAULT_FONT_SIZE: u16 = 20;
/// Default character scale in percent
pub const DEFAULT_SCALE: u16 = 100;

/// Character Properties structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterProperties {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub small_caps: bool,
    pub caps: bool,
    /// Hidden (vanished) text
    pub hidden: bool,
    pub underline: UnderlineStyle,
    /// Font size in half-points (e.g., 24 = 12pt)
    pub font_size: u16,
    /// Horizontal scale in percent
    pub scale: u16,
    /// Extra spacing between characters in twips
    pub spacing: i16,
    /// Language ID
    pub lid: Option<u16>,
}

impl Default for CharacterProperties {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strike: false,
            small_caps: false,
            caps: false,
            hidden: false,
            underline: UnderlineStyle::None,
            font_size: DEFAULT_FONT_SIZE,
            scale: DEFAULT_SCALE,
            spacing: 0,
            lid: None,
        }
    }
}

/// Underline styles supported in DOC format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderlineStyle {
    /// No underline
    #[default]
    None,
    Single,
    Double,
    Dotted,
    Dashed,
    Wavy,
    Thick,
    /// Word-only underline (skip spaces)
    WordsOnly,
    DashDot,
    DashDotDot,
}

impl UnderlineStyle {
    /// Map a `kul` operand.
    fn from_kul(kul: u8) -> Self {
        match kul {
            0 => UnderlineStyle::None,
            1 => UnderlineStyle::Single,
            2 => UnderlineStyle::WordsOnly,
            3 => UnderlineStyle::Double,
            4 => UnderlineStyle::Dotted,
            6 => UnderlineStyle::Thick,
            7 => UnderlineStyle::Dashed,
            9 => UnderlineStyle::DashDot,
            10 => UnderlineStyle::DashDotDot,
            11 => UnderlineStyle::Wavy,
            _ => UnderlineStyle::Single,
        }
    }
}

/// The character attributes this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharAttr {
    Bold,
    Italic,
    Strike,
    SmallCaps,
    Caps,
    Hidden,
    Underline,
    FontSize,
    Scale,
    Spacing,
    Language,
}

/// Attribute set by a Word 97+ SPRM.
fn modern_attr(opcode: u16) -> Option<CharAttr> {
    Some(match opcode {
        0x0835 => CharAttr::Bold,
        0x0836 => CharAttr::Italic,
        0x0837 => CharAttr::Strike,
        0x083A => CharAttr::SmallCaps,
        0x083B => CharAttr::Caps,
        0x083C => CharAttr::Hidden,
        0x2A3E => CharAttr::Underline,
        0x4A43 => CharAttr::FontSize,
        0x4852 => CharAttr::Scale,
        0x8840 => CharAttr::Spacing,
        // sprmCRgLid0_80, sprmCRgLid0
        0x486D | 0x4873 => CharAttr::Language,
        _ => return None,
    })
}

/// Attribute set by a Word 6/95 SPRM.
fn legacy_attr(opcode: u16) -> Option<CharAttr> {
    Some(match opcode {
        85 => CharAttr::Bold,
        86 => CharAttr::Italic,
        87 => CharAttr::Strike,
        90 => CharAttr::SmallCaps,
        91 => CharAttr::Caps,
        92 => CharAttr::Hidden,
        94 => CharAttr::Underline,
        96 => CharAttr::Spacing,
        97 => CharAttr::Language,
        99 => CharAttr::FontSize,
        _ => return None,
    })
}

impl CharacterProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode character properties from a CHPX grpprl.
    ///
    /// Later SPRMs override earlier ones; unknown SPRMs are skipped.
    pub fn from_grpprl(grpprl: &[u8], legacy: bool) -> Self {
        let mut chp = Self::default();
        if legacy {
            for sprm in parse_legacy_sprms(grpprl) {
                if let Some(attr) = legacy_attr(sprm.opcode) {
                    chp.apply(attr, &sprm);
                }
            }
        } else {
            for sprm in parse_sprms(grpprl) {
                if let Some(attr) = modern_attr(sprm.opcode) {
                    chp.apply(attr, &sprm);
                }
            }
        }
        chp
    }

    fn apply(&mut self, attr: CharAttr, sprm: &Sprm) {
        match attr {
            CharAttr::Bold => self.bold = toggle(sprm),
            CharAttr::Italic => self.italic = toggle(sprm),
            CharAttr::Strike => self.strike = toggle(sprm),
            CharAttr::SmallCaps => self.small_caps = toggle(sprm),
            CharAttr::Caps => self.caps = toggle(sprm),
            CharAttr::Hidden => self.hidden = toggle(sprm),
            CharAttr::Underline => {
                if let Some(kul) = sprm.operand_byte() {
                    self.underline = UnderlineStyle::from_kul(kul);
                }
            },
            CharAttr::FontSize => {
                if let Some(hps) = sprm.operand_word() {
                    self.font_size = hps;
                }
            },
            CharAttr::Scale => {
                if let Some(scale) = sprm.operand_word() {
                    self.scale = scale;
                }
            },
            CharAttr::Spacing => {
                if let Some(dxa) = sprm.operand_i16() {
                    self.spacing = dxa;
                }
            },
            CharAttr::Language => self.lid = sprm.operand_word(),
        }
    }

    /// Check if any formatting differs from the defaults.
    pub fn has_formatting(&self) -> bool {
        *self != Self::default()
    }
}

/// Toggle operand, resolved against the default (off):
/// - 0: false
/// - 1: true
/// - 0x80: keep the default
/// - 0x81: invert the default
fn toggle(sprm: &Sprm) -> bool {
    matches!(sprm.operand_byte(), Some(1 | 0x81))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chp() {
        let chp = CharacterProperties::new();
        assert!(!chp.bold);
        assert_eq!(chp.underline, UnderlineStyle::None);
        assert_eq!(chp.font_size, 20);
        assert_eq!(chp.scale, 100);
        assert!(!chp.has_formatting());
    }

    #[test]
    fn test_modern_toggles_and_values() {
        let grpprl = [
            0x35, 0x08, 0x01, // bold on
            0x36, 0x08, 0x81, // italic inverted
            0x37, 0x08, 0x80, // strike kept
            0x3C, 0x08, 0x01, // hidden
            0x3E, 0x2A, 0x03, // double underline
            0x43, 0x4A, 0x18, 0x00, // 12pt
            0x52, 0x48, 0x50, 0x00, // 80%
            0x40, 0x88, 0xF6, 0xFF, // -10 twips
            0x6D, 0x48, 0x19, 0x04, // Russian
        ];
        let chp = CharacterProperties::from_grpprl(&grpprl, false);
        assert!(chp.bold);
        assert!(chp.italic);
        assert!(!chp.strike);
        assert!(chp.hidden);
        assert_eq!(chp.underline, UnderlineStyle::Double);
        assert_eq!(chp.font_size, 24);
        assert_eq!(chp.scale, 80);
        assert_eq!(chp.spacing, -10);
        assert_eq!(chp.lid, Some(0x0419));
        assert!(chp.has_formatting());
    }

    #[test]
    fn test_later_sprm_wins_and_unknown_skipped() {
        let grpprl = [
            0x35, 0x08, 0x01, // bold on
            0x4F, 0x4A, 0x02, 0x00, // font index, not decoded
            0x35, 0x08, 0x00, // bold off
            0x3B, 0x08, 0x01, // caps
        ];
        let chp = CharacterProperties::from_grpprl(&grpprl, false);
        assert!(!chp.bold);
        assert!(chp.caps);
    }

    #[test]
    fn test_legacy_opcodes() {
        let grpprl = [
            85, 0x01, // bold
            80, 0x07, // unrecognised, 1-byte operand
            90, 0x81, // small caps
            94, 0x01, // single underline
            99, 0x1C, 0x00, // 14pt
            97, 0x09, 0x04, // English (US)
            96, 0x14, 0x00, // 20 twips
        ];
        let chp = CharacterProperties::from_grpprl(&grpprl, true);
        assert!(chp.bold);
        assert!(chp.small_caps);
        assert_eq!(chp.underline, UnderlineStyle::Single);
        assert_eq!(chp.font_size, 28);
        assert_eq!(chp.lid, Some(0x0409));
        assert_eq!(chp.spacing, 20);
        assert_eq!(chp.scale, 100);
    }

    #[test]
    fn test_truncated_grpprl() {
        let chp = CharacterProperties::from_grpprl(&[0x35, 0x08], false);
        assert_eq!(chp, CharacterProperties::default());
    }
}
