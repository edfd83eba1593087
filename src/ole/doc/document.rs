/// Document assembly: pieces, paragraphs and sub-documents into a [`DocumentModel`].
///
/// The CP space of a document holds the main text followed by its sub-documents,
/// in the order footnotes, headers, (macros, Word 6/95 only), annotations,
/// endnotes, text boxes and header text boxes. Each story gets its own
/// [`FieldCleaner`] so fields never leak from one story into the next.
use super::model::{
    DocumentModel, Footnote, HeaderFooter, HeaderFooterKind, Paragraph, Run, Section, TextBox,
};
use super::parts::chp::CharacterProperties;
use super::parts::chp_bin_table::ChpBinTable;
use super::parts::fib::Fib;
use super::parts::fields::FieldCleaner;
use super::parts::paragraph_boundary::ParagraphBoundaryResolver;
use super::parts::piece_table::{Piece, PieceTable};
use super::parts::stylesheet::Stylesheet;
use super::parts::text::TextDecoder;
use crate::ole::codepage::CodePageResolver;
use crate::ole::plcf::PlcfParser;
use log::{debug, info};
use smallvec::SmallVec;

/// Size of a SED in PlcfSed
const SED_SIZE: usize = 12;
/// Size of a FTXBXS in PlcftxbxTxt
const FTXBXS_SIZE: usize = 22;
/// Leading PlcfHdd stories holding footnote/endnote separators
const HDD_SEPARATOR_STORIES: usize = 6;

/// CP ranges of the main text and its sub-documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StoryLayout {
    text_end: u32,
    footnote_start: u32,
    header_start: u32,
    textbox_start: u32,
}

impl StoryLayout {
    fn new(fib: &Fib, total_cp: u32) -> Self {
        let ccp = &fib.ccp;
        let text_end = if ccp.text == 0 {
            total_cp
        } else {
            ccp.text.min(total_cp)
        };

        let footnote_start = ccp.text;
        let header_start = footnote_start.saturating_add(ccp.footnote);
        let mut annotation_start = header_start.saturating_add(ccp.header);
        if fib.is_legacy() {
            annotation_start = annotation_start.saturating_add(ccp.macro_text);
        }
        let endnote_start = annotation_start.saturating_add(ccp.annotation);
        let textbox_start = endnote_start.saturating_add(ccp.endnote);

        Self {
            text_end,
            footnote_start,
            header_start,
            textbox_start,
        }
    }
}

/// Builds the document model from decrypted WordDocument and table streams.
#[derive(Debug)]
pub struct DocumentAssembler<'a> {
    fib: &'a Fib,
    word_document: &'a [u8],
    table: &'a [u8],
    code_pages: SmallVec<[u32; 4]>,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(
        fib: &'a Fib,
        word_document: &'a [u8],
        table: &'a [u8],
        code_pages: &dyn CodePageResolver,
    ) -> Self {
        Self {
            fib,
            word_document,
            table,
            code_pages: code_pages.candidates(fib.lid),
        }
    }

    /// Decode every story of the document.
    pub fn assemble(&self) -> DocumentModel {
        let fib = self.fib;
        let legacy = fib.is_legacy();

        let mut pieces = PieceTable::parse(fib.clx.slice(self.table), fib, self.word_document.len());
        let chpx = fib
            .plcf_bte_chpx
            .slice(self.table)
            .map(|bte| ChpBinTable::parse(bte, self.word_document, legacy))
            .unwrap_or_default();
        pieces.attach_chpx(|fc| chpx.chpx_at(fc).map(<[u8]>::to_vec));

        let stylesheet = fib
            .stshf
            .slice(self.table)
            .map(|stsh| Stylesheet::parse(stsh, legacy, &self.code_pages))
            .unwrap_or_default();

        let decoder = TextDecoder::new(self.word_document, &pieces, self.code_pages.clone());
        let resolver = fib.plcf_bte_papx.slice(self.table).and_then(|bte| {
            ParagraphBoundaryResolver::new(&pieces, bte, self.word_document, fib.ccp.text, legacy)
        });
        if resolver.is_none() {
            debug!("no PAPX bin table; paragraphs follow paragraph marks");
        }

        let builder = StoryBuilder {
            decoder: &decoder,
            resolver: resolver.as_ref(),
            stylesheet: &stylesheet,
            legacy,
        };
        let layout = StoryLayout::new(fib, pieces.total_cp());

        let body = match builder.resolver {
            Some(resolver) => builder.resolved_paragraphs(resolver, 0, layout.text_end),
            None => builder.folded_paragraphs(0, layout.text_end),
        };
        let sections = self.split_sections(body);
        let footnotes = self.footnotes(&builder, &layout);
        let headers_footers = self.headers_footers(&builder, &layout);
        let text_boxes = self.text_boxes(&builder, &layout);

        info!(
            "assembled {} sections, {} headers/footers, {} footnotes, {} text boxes",
            sections.len(),
            headers_footers.len(),
            footnotes.len(),
            text_boxes.len()
        );

        DocumentModel {
            fib: fib.clone(),
            stylesheet,
            sections,
            headers_footers,
            footnotes,
            text_boxes,
        }
    }

    /// Split body paragraphs at the PlcfSed section limits.
    fn split_sections(&self, paragraphs: Vec<(u32, Paragraph)>) -> Vec<Section> {
        let sed = self
            .fib
            .plcf_sed
            .slice(self.table)
            .and_then(|data| PlcfParser::parse(data, SED_SIZE))
            .filter(|plc| plc.count() > 0);
        let Some(sed) = sed else {
            return vec![Section {
                paragraphs: paragraphs.into_iter().map(|(_, paragraph)| paragraph).collect(),
            }];
        };

        let limits = &sed.positions()[1..];
        let mut sections = vec![Section::default(); sed.count()];
        for (cp, paragraph) in paragraphs {
            let index = limits
                .partition_point(|&limit| limit <= cp)
                .min(sections.len() - 1);
            sections[index].paragraphs.push(paragraph);
        }
        sections
    }

    /// Story ranges of a sub-document PLC, made absolute and clipped to the sub-document.
    fn stories(&self, plc: Option<PlcfParser>, base: u32, len: u32) -> Vec<(u32, u32)> {
        let Some(plc) = plc else {
            return Vec::new();
        };
        let limit = base.saturating_add(len);
        (0..plc.count())
            .filter_map(|i| plc.range(i))
            .map(|(start, end)| {
                (
                    base.saturating_add(start).min(limit),
                    base.saturating_add(end).min(limit),
                )
            })
            .collect()
    }

    fn footnotes(&self, builder: &StoryBuilder<'_, '_>, layout: &StoryLayout) -> Vec<Footnote> {
        let plc = self
            .fib
            .plcffnd_txt
            .slice(self.table)
            .and_then(|data| PlcfParser::parse(data, 0));
        self.stories(plc, layout.footnote_start, self.fib.ccp.footnote)
            .into_iter()
            .filter_map(|(start, end)| builder.story(start, end))
            .map(|paragraphs| Footnote { paragraphs })
            .collect()
    }

    fn headers_footers(
        &self,
        builder: &StoryBuilder<'_, '_>,
        layout: &StoryLayout,
    ) -> Vec<HeaderFooter> {
        let plc = self
            .fib
            .plcf_hdd
            .slice(self.table)
            .and_then(|data| PlcfParser::parse(data, 0));
        self.stories(plc, layout.header_start, self.fib.ccp.header)
            .into_iter()
            .enumerate()
            .skip(HDD_SEPARATOR_STORIES)
            .filter_map(|(i, (start, end))| {
                let position = i - HDD_SEPARATOR_STORIES;
                let paragraphs = builder.story(start, end)?;
                Some(HeaderFooter {
                    kind: HeaderFooterKind::ORDER[position % HeaderFooterKind::ORDER.len()],
                    section: position / HeaderFooterKind::ORDER.len(),
                    paragraphs,
                })
            })
            .collect()
    }

    fn text_boxes(&self, builder: &StoryBuilder<'_, '_>, layout: &StoryLayout) -> Vec<TextBox> {
        let plc = self
            .fib
            .plcftxbx_txt
            .slice(self.table)
            .and_then(|data| PlcfParser::parse(data, FTXBXS_SIZE));
        self.stories(plc, layout.textbox_start, self.fib.ccp.textbox)
            .into_iter()
            .filter_map(|(start, end)| builder.story(start, end))
            .map(|paragraphs| TextBox { paragraphs })
            .collect()
    }
}

/// Turns CP ranges into paragraphs of runs.
struct StoryBuilder<'s, 'a> {
    decoder: &'s TextDecoder<'a>,
    resolver: Option<&'s ParagraphBoundaryResolver<'a>>,
    stylesheet: &'s Stylesheet,
    legacy: bool,
}

impl StoryBuilder<'_, '_> {
    fn run(&self, piece: &Piece, text: String) -> Run {
        let properties = piece
            .chpx
            .as_deref()
            .map(|grpprl| CharacterProperties::from_grpprl(grpprl, self.legacy))
            .unwrap_or_default();
        Run::new(text, properties)
    }

    /// A field cleaner primed with the raw text of the story `[start, end)`.
    fn cleaner(&self, start: u32, end: u32) -> FieldCleaner {
        FieldCleaner::for_story(&self.decoder.text_for_cp_range(start, end))
    }

    fn paragraph(&self, runs: Vec<Run>, cp: u32) -> Paragraph {
        let style = self
            .resolver
            .and_then(|resolver| resolver.style_at(cp))
            .unwrap_or(0);
        Paragraph::new(runs, style, self.stylesheet.name(style).into_owned())
    }

    /// Paragraphs of `[start, end)` with limits from the PAPX pages.
    fn resolved_paragraphs(
        &self,
        resolver: &ParagraphBoundaryResolver<'_>,
        start: u32,
        end: u32,
    ) -> Vec<(u32, Paragraph)> {
        let mut cleaner = self.cleaner(start, end);
        let mut paragraphs = Vec::new();
        let mut cp = start;

        while cp < end {
            let last = resolver.paragraph_end(cp).clamp(cp, end - 1);
            let runs = self
                .decoder
                .segments_for_cp_range(cp, last + 1)
                .filter_map(|(piece, raw)| {
                    let text = cleaner.clean(&raw);
                    (!text.is_empty()).then(|| self.run(piece, text))
                })
                .collect();
            paragraphs.push((cp, self.paragraph(runs, cp)));
            cp = last + 1;
        }

        paragraphs
    }

    /// Paragraphs of `[start, end)` closed by each paragraph mark.
    fn folded_paragraphs(&self, start: u32, end: u32) -> Vec<(u32, Paragraph)> {
        let mut cleaner = self.cleaner(start, end);
        let chunks = self.decoder.paragraph_chunks_for_cp_range(start, end);

        let (mut paragraphs, open) = chunks.fold(
            (Vec::new(), None::<(u32, Vec<Run>)>),
            |(mut paragraphs, open), (piece, at, raw)| {
                let (first_cp, mut runs) = open.unwrap_or((at, Vec::new()));
                let text = cleaner.clean(&raw);
                if !text.is_empty() {
                    runs.push(self.run(piece, text));
                }
                if raw.ends_with('\r') {
                    paragraphs.push((first_cp, self.paragraph(runs, first_cp)));
                    (paragraphs, None)
                } else {
                    (paragraphs, Some((first_cp, runs)))
                }
            },
        );

        if let Some((first_cp, runs)) = open
            && !runs.is_empty()
        {
            paragraphs.push((first_cp, self.paragraph(runs, first_cp)));
        }
        paragraphs
    }

    /// Paragraphs of one sub-document story, or `None` when it holds no text.
    fn story(&self, start: u32, end: u32) -> Option<Vec<Paragraph>> {
        if start >= end {
            return None;
        }
        let paragraphs: Vec<Paragraph> = self
            .folded_paragraphs(start, end)
            .into_iter()
            .map(|(_, paragraph)| paragraph)
            .collect();
        (!paragraphs.iter().all(Paragraph::is_blank)).then_some(paragraphs)
    }
}
