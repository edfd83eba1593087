/// Stylesheet (STSH) decoding.
///
/// Only style names and built-in identifiers are read. Decoding is best-effort:
/// a style whose record is empty, truncated or has an unusable name takes its
/// name from the built-in table by position, so every index has a name.
///
/// References:
/// - [MS-DOC] 2.9.271 STSH
/// - [MS-DOC] 2.9.260 STD
use crate::common::binary::{read_u8, read_u16_le};
use crate::ole::codepage::{decode_best, decode_utf16le_text};
use log::debug;
use std::borrow::Cow;

/// Longest accepted style name, in characters
const MAX_NAME_LEN: usize = 255;

/// Names of the built-in styles by position.
const BUILTIN_NAMES: [&str; 17] = [
    "Normal",
    "heading 1",
    "heading 2",
    "heading 3",
    "heading 4",
    "heading 5",
    "heading 6",
    "heading 7",
    "heading 8",
    "heading 9",
    "List",
    "List 2",
    "List 3",
    "List 4",
    "List 5",
    "Header",
    "Footer",
];

/// Name of the built-in style at `index`, or `Style{index}`.
pub fn builtin_style_name(index: u16) -> Cow<'static, str> {
    match BUILTIN_NAMES.get(index as usize) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("Style{index}")),
    }
}

/// A style definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Style index (istd)
    pub index: u16,
    pub name: String,
    /// Built-in style identifier, when the record was readable
    pub sti: Option<u16>,
}

impl Style {
    fn builtin(index: u16) -> Self {
        Self {
            index,
            name: builtin_style_name(index).into_owned(),
            sti: None,
        }
    }
}

/// The document's styles, indexed by istd.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    styles: Vec<Style>,
}

impl Stylesheet {
    /// Parse an STSH blob.
    ///
    /// Word 97+ names are UTF-16 with a u16 length; Word 6/95 names are 8-bit
    /// with a u8 length and are decoded with `code_pages`.
    pub fn parse(stsh: &[u8], legacy: bool, code_pages: &[u32]) -> Self {
        let Ok(cb_stshi) = read_u16_le(stsh, 0) else {
            return Self::default();
        };
        let stshi = 2usize;
        let (Ok(cstd), Ok(cb_base)) = (read_u16_le(stsh, stshi), read_u16_le(stsh, stshi + 2))
        else {
            return Self::default();
        };

        let mut styles = Vec::with_capacity(cstd as usize);
        let mut offset = stshi + cb_stshi as usize;
        for index in 0..cstd {
            let Ok(cb_std) = read_u16_le(stsh, offset) else {
                debug!("stylesheet ends after {index} of {cstd} styles");
                break;
            };
            let start = offset + 2;
            offset = start + cb_std as usize;

            let style = stsh
                .get(start..offset)
                .filter(|std| !std.is_empty())
                .and_then(|std| read_std(std, index, cb_base as usize, legacy, code_pages))
                .unwrap_or_else(|| Style::builtin(index));
            styles.push(style);
        }

        Self { styles }
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn get(&self, istd: u16) -> Option<&Style> {
        self.styles.get(istd as usize)
    }

    /// Name of style `istd`, falling back to the built-in table.
    pub fn name(&self, istd: u16) -> Cow<'_, str> {
        match self.get(istd) {
            Some(style) => Cow::Borrowed(&style.name),
            None => builtin_style_name(istd),
        }
    }
}

/// Decode one STD record; `None` when its name is unusable.
fn read_std(std: &[u8], index: u16, cb_base: usize, legacy: bool, code_pages: &[u32]) -> Option<Style> {
    let sti = read_u16_le(std, 0).ok()? & 0x0FFF;

    let name = if legacy {
        let len = read_u8(std, cb_base).ok()? as usize;
        let bytes = std.get(cb_base + 1..cb_base + 1 + len)?;
        decode_best(bytes, code_pages)
    } else {
        let len = read_u16_le(std, cb_base).ok()? as usize;
        if len > MAX_NAME_LEN {
            return None;
        }
        let bytes = std.get(cb_base + 2..cb_base + 2 + len * 2)?;
        decode_utf16le_text(bytes)
    };

    let name = name.trim_end_matches('\0');
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return None;
    }

    Some(Style {
        index,
        name: name.to_string(),
        sti: Some(sti),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modern_std(sti: u16, name: &str) -> Vec<u8> {
        let mut std = sti.to_le_bytes().to_vec();
        std.extend_from_slice(&[0u8; 8]);
        std.extend_from_slice(&(name.encode_utf16().count() as u16).to_le_bytes());
        for unit in name.encode_utf16() {
            std.extend_from_slice(&unit.to_le_bytes());
        }
        std.extend_from_slice(&[0, 0]);
        std
    }

    fn stsh(records: &[Vec<u8>], cb_base: u16) -> Vec<u8> {
        let mut data = 18u16.to_le_bytes().to_vec();
        let mut stshi = vec![0u8; 18];
        stshi[0..2].copy_from_slice(&(records.len() as u16).to_le_bytes());
        stshi[2..4].copy_from_slice(&cb_base.to_le_bytes());
        data.extend_from_slice(&stshi);
        for record in records {
            data.extend_from_slice(&(record.len() as u16).to_le_bytes());
            data.extend_from_slice(record);
        }
        data
    }

    #[test]
    fn test_modern_names() {
        let data = stsh(
            &[modern_std(0, "Normal"), Vec::new(), modern_std(0x3E, "Zitat")],
            10,
        );
        let sheet = Stylesheet::parse(&data, false, &[1252]);

        assert_eq!(sheet.styles().len(), 3);
        assert_eq!(sheet.name(0), "Normal");
        assert_eq!(sheet.get(0).unwrap().sti, Some(0));
        // Empty slot
        assert_eq!(sheet.name(1), "heading 1");
        assert_eq!(sheet.get(1).unwrap().sti, None);
        assert_eq!(sheet.name(2), "Zitat");
        assert_eq!(sheet.get(2).unwrap().sti, Some(0x3E));
        // Beyond the table
        assert_eq!(sheet.name(16), "Footer");
        assert_eq!(sheet.name(40), "Style40");
    }

    #[test]
    fn test_legacy_names() {
        let mut std = vec![0x01, 0x00, 0, 0, 0, 0];
        std.push(5);
        std.extend_from_slice(b"Titel");
        let data = stsh(&[std], 6);

        let sheet = Stylesheet::parse(&data, true, &[1252]);
        assert_eq!(sheet.name(0), "Titel");
    }

    #[test]
    fn test_truncated_records_fall_back() {
        let mut data = stsh(&[modern_std(0, "Normal"), modern_std(1, "Heading")], 10);
        data.truncate(data.len() - 6);

        let sheet = Stylesheet::parse(&data, false, &[1252]);
        assert_eq!(sheet.name(0), "Normal");
        assert_eq!(sheet.name(1), "heading 1");
        assert!(Stylesheet::parse(&[1], false, &[1252]).styles().is_empty());
    }

    #[test]
    fn test_overlong_name_falls_back() {
        let mut std = modern_std(0, "x");
        std[10..12].copy_from_slice(&1000u16.to_le_bytes());
        let sheet = Stylesheet::parse(&stsh(&[std], 10), false, &[1252]);
        assert_eq!(sheet.name(0), "Normal");
    }
}
