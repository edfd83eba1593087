/// Field code removal and control character cleanup for extracted text.
///
/// Fields are stored inline as `0x13 code 0x14 result 0x15` and nest freely.
/// Extraction keeps the result and drops the code; a field without a result whose
/// code is `HYPERLINK` contributes its target instead. A field can span pieces,
/// runs and paragraphs, so [`FieldCleaner`] keeps its state between calls.
use fixedbitset::FixedBitSet;
use memchr::{memchr, memchr3};

pub const FIELD_BEGIN: char = '\u{13}';
pub const FIELD_SEPARATOR: char = '\u{14}';
pub const FIELD_END: char = '\u{15}';

/// Word's cell/row mark
const CELL_MARK: char = '\u{07}';
/// Word's soft line break
const LINE_BREAK: char = '\u{0B}';

#[derive(Debug, Default, Clone)]
struct FieldFrame {
    /// The separator has been seen; text now belongs to the result
    in_result: bool,
    /// Collected field code
    code: String,
}

/// Streaming field and control character cleaner.
///
/// Use one cleaner per story (main text, one footnote, one header, ...) and feed
/// it the raw text of the story in order.
#[derive(Debug, Default, Clone)]
pub struct FieldCleaner {
    stack: Vec<FieldFrame>,
    /// Field begins seen so far
    begins: usize,
    /// Ordinals of field begins that no field end closes
    unclosed: FixedBitSet,
}

impl FieldCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cleaner for a story whose complete raw text is `raw`.
    ///
    /// Field begins that are never closed are dropped, and the text after them
    /// is kept as ordinary text.
    pub fn for_story(raw: &str) -> Self {
        let mut cleaner = Self::new();
        if memchr(0x13, raw.as_bytes()).is_none() {
            return cleaner;
        }

        let mut open = Vec::new();
        let mut begins = 0;
        for c in raw.chars() {
            match c {
                FIELD_BEGIN => {
                    open.push(begins);
                    begins += 1;
                },
                FIELD_END => {
                    open.pop();
                },
                _ => {},
            }
        }

        cleaner.unclosed.grow(begins);
        for ordinal in open {
            cleaner.unclosed.insert(ordinal);
        }
        cleaner
    }

    /// Whether an unterminated field is open.
    #[inline]
    pub fn is_inside_field(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Clean the next chunk of raw text.
    pub fn clean(&mut self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());

        if self.stack.is_empty() && memchr3(0x13, 0x14, 0x15, raw.as_bytes()).is_none() {
            out.extend(raw.chars().filter_map(map_control));
            return out;
        }

        for c in raw.chars() {
            match c {
                FIELD_BEGIN => {
                    let ordinal = self.begins;
                    self.begins += 1;
                    if !self.unclosed.contains(ordinal) {
                        self.stack.push(FieldFrame::default());
                    }
                },
                FIELD_SEPARATOR => {
                    // A separator outside any field is dropped
                    if let Some(frame) = self.stack.last_mut() {
                        frame.in_result = true;
                    }
                },
                FIELD_END => {
                    if let Some(frame) = self.stack.pop()
                        && !frame.in_result
                        && let Some(target) = hyperlink_target(&frame.code)
                    {
                        for c in target.chars() {
                            self.emit(c, &mut out);
                        }
                    }
                },
                _ => self.emit(c, &mut out),
            }
        }

        out
    }

    /// Route a character to the innermost field code being collected, or to the output.
    fn emit(&mut self, c: char, out: &mut String) {
        match self.stack.iter_mut().rev().find(|frame| !frame.in_result) {
            Some(frame) => frame.code.push(c),
            None => {
                if let Some(c) = map_control(c) {
                    out.push(c);
                }
            },
        }
    }
}

/// Clean a complete, self-contained piece of text.
pub fn clean_text(raw: &str) -> String {
    FieldCleaner::for_story(raw).clean(raw)
}

/// Map Word's control characters; `None` drops the character.
#[inline]
fn map_control(c: char) -> Option<char> {
    match c {
        CELL_MARK => Some('\t'),
        LINE_BREAK => Some('\n'),
        '\r' | '\n' | '\t' => Some(c),
        c if c.is_control() => None,
        c => Some(c),
    }
}

/// Target of a `HYPERLINK "url"` field code.
fn hyperlink_target(code: &str) -> Option<String> {
    let code = code.trim_start();
    let keyword = code.get(..9)?;
    if !keyword.eq_ignore_ascii_case("HYPERLINK") {
        return None;
    }

    let rest = code[9..].trim_start();
    let target = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or_default(),
        None => rest.split_whitespace().next().unwrap_or_default(),
    };

    (!target.is_empty()).then(|| target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_result_is_kept() {
        let raw = "Page \u{13} PAGE \u{14}3\u{15} of 9";
        assert_eq!(clean_text(raw), "Page 3 of 9");
    }

    #[test]
    fn test_field_without_result_is_dropped() {
        assert_eq!(clean_text("a\u{13} TOC \\o \u{15}b"), "ab");
    }

    #[test]
    fn test_hyperlink_without_result() {
        let raw = "see \u{13} HYPERLINK \"http://example.com/a b\" \u{15}.";
        assert_eq!(clean_text(raw), "see http://example.com/a b.");

        let raw = "\u{13}hyperlink http://x.org\u{15}";
        assert_eq!(clean_text(raw), "http://x.org");
    }

    #[test]
    fn test_hyperlink_with_result_keeps_result() {
        let raw = "\u{13} HYPERLINK \"http://x.org\" \u{14}click\u{15}";
        assert_eq!(clean_text(raw), "click");
    }

    #[test]
    fn test_nested_fields() {
        // The inner field's result belongs to the outer field's code
        let raw = "[\u{13} IF \u{13} MERGEFIELD x \u{14}1\u{15} = 1 \u{14}yes\u{15}]";
        assert_eq!(clean_text(raw), "[yes]");
    }

    #[test]
    fn test_field_across_chunks() {
        let mut cleaner = FieldCleaner::new();
        let mut text = cleaner.clean("a\u{13} DATE ");
        assert!(cleaner.is_inside_field());
        text.push_str(&cleaner.clean("\u{14}today"));
        text.push_str(&cleaner.clean("\u{15}b"));
        assert_eq!(text, "atodayb");
        assert!(!cleaner.is_inside_field());
    }

    #[test]
    fn test_lone_delimiters_are_dropped() {
        assert_eq!(clean_text("x\u{14}y\u{15}z"), "xyz");
    }

    #[test]
    fn test_unclosed_field_begin_keeps_following_text() {
        assert_eq!(
            clean_text("Hello \u{13}World\rTail text\r"),
            "Hello World\rTail text\r"
        );
    }

    #[test]
    fn test_unclosed_outer_field_keeps_inner_result() {
        let raw = "a\u{13}b\u{13} PAGE \u{14}2\u{15}c";
        assert_eq!(clean_text(raw), "ab2c");
    }

    #[test]
    fn test_unclosed_field_across_chunks() {
        let chunks = ["Intro \u{13}stray\r", "Second\r", "\u{13} X \u{14}ok\u{15}\r"];
        let mut cleaner = FieldCleaner::for_story(&chunks.concat());
        let cleaned: Vec<String> = chunks.iter().map(|chunk| cleaner.clean(chunk)).collect();
        assert_eq!(cleaned, ["Intro stray\r", "Second\r", "ok\r"]);
        assert!(!cleaner.is_inside_field());
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(
            clean_text("a\u{07}b\u{0B}c\rd\u{01}e\u{0C}f\tg"),
            "a\tb\nc\rdef\tg"
        );
        assert_eq!(clean_text("\u{08}pic\u{05}"), "pic");
    }
}
