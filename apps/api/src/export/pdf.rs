use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, ObjectId, Stream};

use crate::export::{Block, Document, DocumentRenderer, ExportError};

// ────────────────────────────────────────────────────────────────────────────
// Page geometry (A4, points)
// ────────────────────────────────────────────────────────────────────────────

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Average Helvetica glyph width as a fraction of the font size. Wrapping is
/// approximate; this errs toward shorter lines.
const AVG_GLYPH_WIDTH: f32 = 0.52;
const LEADING: f32 = 1.35;

#[derive(Debug, Clone, Copy)]
struct Style {
    font: &'static str,
    size: i64,
}

const TITLE: Style = Style { font: BOLD, size: 20 };
const HEADING: Style = Style { font: BOLD, size: 14 };
const BODY: Style = Style { font: REGULAR, size: 11 };
const LABEL: Style = Style { font: BOLD, size: 11 };
const SPACER_HEIGHT: i64 = 12;

/// A run of text in one style; a line is a sequence of runs.
#[derive(Debug, Clone, PartialEq)]
struct Run {
    font: &'static str,
    size: i64,
    text: String,
}

/// Renders [`Document`]s as Helvetica text on A4 pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl DocumentRenderer for PdfRenderer {
    fn render(&self, document: &Document) -> Result<Vec<u8>, ExportError> {
        let mut layout = Layout::new();
        for block in &document.blocks {
            layout.place(block);
        }
        write_pdf(layout.finish())
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout: blocks → positioned lines → pages of operations
// ────────────────────────────────────────────────────────────────────────────

struct Layout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn place(&mut self, block: &Block) {
        match block {
            Block::Title(text) => self.words(&[(TITLE, text.as_str())]),
            Block::Heading(text) => {
                self.gap(4);
                self.words(&[(HEADING, text.as_str())]);
            }
            Block::Field { label, value } => {
                let label = format!("{label}:");
                self.words(&[(LABEL, label.as_str()), (BODY, value.as_str())]);
            }
            Block::Paragraph(text) => {
                for line in text.lines() {
                    if line.trim().is_empty() {
                        self.gap(BODY.size / 2);
                    } else {
                        self.words(&[(BODY, line)]);
                    }
                }
            }
            Block::Spacer => self.gap(SPACER_HEIGHT),
        }
    }

    fn words(&mut self, parts: &[(Style, &str)]) {
        for line in wrap(parts, PAGE_WIDTH - 2 * MARGIN) {
            self.line(line);
        }
    }

    fn line(&mut self, runs: Vec<Run>) {
        let size = runs.iter().map(|r| r.size).max().unwrap_or(BODY.size);
        let height = (size as f32 * LEADING).ceil() as i64;
        if self.y - height < MARGIN {
            self.break_page();
        }
        self.y -= height;

        self.current.push(Operation::new("BT", vec![]));
        self.current.push(Operation::new(
            "Td",
            vec![MARGIN.into(), self.y.into()],
        ));
        for run in runs {
            self.current.push(Operation::new(
                "Tf",
                vec![Object::Name(run.font.as_bytes().to_vec()), run.size.into()],
            ));
            self.current.push(Operation::new(
                "Tj",
                vec![Object::string_literal(to_latin1(&run.text))],
            ));
        }
        self.current.push(Operation::new("ET", vec![]));
    }

    fn gap(&mut self, height: i64) {
        self.y -= height;
        if self.y < MARGIN {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn text_width(text: &str, size: i64) -> i64 {
    (text.chars().count() as f32 * size as f32 * AVG_GLYPH_WIDTH).ceil() as i64
}

/// Greedy word wrap across styled parts. Words longer than a full line are
/// split by characters.
fn wrap(parts: &[(Style, &str)], max_width: i64) -> Vec<Vec<Run>> {
    let mut lines: Vec<Vec<Run>> = Vec::new();
    let mut line: Vec<Run> = Vec::new();
    let mut width = 0;

    for (style, text) in parts {
        let space = text_width(" ", style.size);
        for word in text.split_whitespace() {
            for piece in split_long(word, style.size, max_width) {
                let w = text_width(&piece, style.size);
                let lead = if line.is_empty() { 0 } else { space };
                if !line.is_empty() && width + lead + w > max_width {
                    lines.push(std::mem::take(&mut line));
                    width = 0;
                }
                let prefix = if line.is_empty() { "" } else { " " };
                match line.last_mut() {
                    Some(run) if run.font == style.font && run.size == style.size => {
                        run.text.push_str(prefix);
                        run.text.push_str(&piece);
                    }
                    _ => line.push(Run {
                        font: style.font,
                        size: style.size,
                        text: format!("{prefix}{piece}"),
                    }),
                }
                width += if prefix.is_empty() { w } else { space + w };
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn split_long(word: &str, size: i64, max_width: i64) -> Vec<String> {
    let per_line = ((max_width as f32) / (size as f32 * AVG_GLYPH_WIDTH)).floor().max(1.0) as usize;
    let chars: Vec<char> = word.chars().collect();
    chars.chunks(per_line).map(|c| c.iter().collect()).collect()
}

/// WinAnsi bytes for the standard 14 fonts. Characters outside Latin-1 and
/// control characters become `?`.
fn to_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            0x20..=0x7e | 0xa0..=0xff => u32::from(c) as u8,
            _ => b'?',
        })
        .collect()
}

fn write_pdf(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, ExportError> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular,
            BOLD => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_text(bytes: &[u8]) -> (usize, String) {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        let mut text = String::new();
        for page_id in pages.values() {
            let content = Content::decode(&doc.get_page_content(*page_id).unwrap()).unwrap();
            for op in content.operations.iter().filter(|op| op.operator == "Tj") {
                for operand in &op.operands {
                    if let Object::String(s, _) = operand {
                        text.push_str(&String::from_utf8_lossy(s));
                        text.push('\n');
                    }
                }
            }
        }
        (pages.len(), text)
    }

    #[test]
    fn test_renders_a_loadable_pdf() {
        let doc = Document::new()
            .title("AI Career Advisor Report")
            .field("Goal", "Become an SRE")
            .paragraph("## Paths\n- SRE");
        let bytes = PdfRenderer.render(&doc).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let (pages, text) = page_text(&bytes);
        assert_eq!(pages, 1);
        assert!(text.contains("AI Career Advisor Report"));
        assert!(text.contains("Goal:"));
        assert!(text.contains(" Become an SRE"));
        assert!(text.contains("- SRE"));
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let bytes = PdfRenderer.render(&Document::new()).unwrap();
        assert_eq!(page_text(&bytes).0, 1);
    }

    #[test]
    fn test_long_documents_paginate() {
        let long = "Learn Rust and ship small services. ".repeat(40);
        let mut doc = Document::new();
        for _ in 0..20 {
            doc = doc.paragraph(long.clone()).spacer();
        }
        let (pages, _) = page_text(&PdfRenderer.render(&doc).unwrap());
        assert!(pages > 1);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let lines = wrap(&[(BODY, text)], 100);
        assert!(lines.len() > 1);
        for line in &lines {
            let width: i64 = line.iter().map(|r| text_width(&r.text, r.size)).sum();
            assert!(width <= 100, "{line:?}");
        }
        let rejoined: Vec<String> = lines
            .iter()
            .map(|l| l.iter().map(|r| r.text.as_str()).collect::<String>())
            .collect();
        assert_eq!(rejoined.join(" "), text);
    }

    #[test]
    fn test_wrap_mixes_label_and_value_on_one_line() {
        let lines = wrap(&[(LABEL, "Skills:"), (BODY, "Python, Go")], 400);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][0].font, BOLD);
        assert_eq!(lines[0][0].text, "Skills:");
        assert_eq!(lines[0][1].font, REGULAR);
        assert_eq!(lines[0][1].text, " Python, Go");
    }

    #[test]
    fn test_overlong_word_is_split() {
        let word = "x".repeat(300);
        let lines = wrap(&[(BODY, word.as_str())], 100);
        assert!(lines.len() > 1);
        let total: usize = lines.iter().map(|l| l[0].text.len()).sum();
        assert_eq!(total, 300);
    }

    #[test]
    fn test_non_latin1_is_replaced() {
        assert_eq!(to_latin1("café 🎯\t"), b"caf\xe9 ??".to_vec());
    }
}
