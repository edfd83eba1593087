/// Document model produced by the assembler.
///
/// Run text is cleaned of field codes and control characters but keeps its
/// paragraph marks (`\r`); [`DocumentModel::text`] turns them into newlines.
use super::parts::chp::CharacterProperties;
use super::parts::fib::Fib;
use super::parts::stylesheet::Stylesheet;

/// A text run with uniform character formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub properties: CharacterProperties,
}

impl Run {
    pub fn new(text: String, properties: CharacterProperties) -> Self {
        Self { text, properties }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn properties(&self) -> &CharacterProperties {
        &self.properties
    }
}

/// A paragraph in a Word document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    /// Paragraph style index (istd)
    pub style_index: u16,
    pub style_name: String,
}

impl Paragraph {
    pub(crate) fn new(runs: Vec<Run>, style_index: u16, style_name: String) -> Self {
        Self {
            runs,
            style_index,
            style_name,
        }
    }

    /// Get the runs in this paragraph.
    #[inline]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Text of all runs, including the paragraph mark.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Whether the paragraph holds nothing but its mark.
    pub fn is_blank(&self) -> bool {
        self.runs
            .iter()
            .all(|run| run.text.chars().all(|c| c == '\r'))
    }
}

/// A section of the main text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub paragraphs: Vec<Paragraph>,
}

impl Section {
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }
}

/// Where a header/footer story is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderFooterKind {
    EvenHeader,
    OddHeader,
    EvenFooter,
    OddFooter,
    FirstHeader,
    FirstFooter,
}

impl HeaderFooterKind {
    /// Story order within each section's block of PlcfHdd.
    pub const ORDER: [HeaderFooterKind; 6] = [
        HeaderFooterKind::EvenHeader,
        HeaderFooterKind::OddHeader,
        HeaderFooterKind::EvenFooter,
        HeaderFooterKind::OddFooter,
        HeaderFooterKind::FirstHeader,
        HeaderFooterKind::FirstFooter,
    ];

    #[inline]
    pub fn is_header(self) -> bool {
        matches!(
            self,
            HeaderFooterKind::EvenHeader | HeaderFooterKind::OddHeader | HeaderFooterKind::FirstHeader
        )
    }
}

/// A header or footer story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFooter {
    pub kind: HeaderFooterKind,
    /// Index of the section the story belongs to
    pub section: usize,
    pub paragraphs: Vec<Paragraph>,
}

/// A footnote's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footnote {
    pub paragraphs: Vec<Paragraph>,
}

/// A text box's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBox {
    pub paragraphs: Vec<Paragraph>,
}

/// Text of a list of paragraphs, with paragraph marks as newlines.
pub(crate) fn paragraphs_text(paragraphs: &[Paragraph]) -> String {
    let mut text = String::new();
    for paragraph in paragraphs {
        for run in &paragraph.runs {
            text.extend(run.text.chars().map(|c| if c == '\r' { '\n' } else { c }));
        }
    }
    text
}

/// A decoded Word document.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    pub fib: Fib,
    pub stylesheet: Stylesheet,
    pub sections: Vec<Section>,
    pub headers_footers: Vec<HeaderFooter>,
    pub footnotes: Vec<Footnote>,
    pub text_boxes: Vec<TextBox>,
}

impl DocumentModel {
    /// Text of the main document, with paragraph marks as newlines.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for section in &self.sections {
            text.push_str(&paragraphs_text(&section.paragraphs));
        }
        text
    }

    /// All body paragraphs in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.sections
            .iter()
            .flat_map(|section| section.paragraphs.iter())
    }

    pub fn paragraph_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.paragraphs.len())
            .sum()
    }

    /// Headers of every section.
    pub fn headers(&self) -> impl Iterator<Item = &HeaderFooter> {
        self.headers_footers.iter().filter(|story| story.kind.is_header())
    }

    /// Footers of every section.
    pub fn footers(&self) -> impl Iterator<Item = &HeaderFooter> {
        self.headers_footers.iter().filter(|story| !story.kind.is_header())
    }
}

impl HeaderFooter {
    pub fn text(&self) -> String {
        paragraphs_text(&self.paragraphs)
    }
}

impl Footnote {
    pub fn text(&self) -> String {
        paragraphs_text(&self.paragraphs)
    }
}

impl TextBox {
    pub fn text(&self) -> String {
        paragraphs_text(&self.paragraphs)
    }
}
