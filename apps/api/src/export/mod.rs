//! Document export.
//!
//! Reports are built as a flat [`Document`] of styled blocks and handed to a
//! [`DocumentRenderer`]. Nothing upstream knows about the output format; the
//! default renderer produces PDF via `lopdf`.

use axum::{
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub mod pdf;
pub mod reports;

pub use pdf::PdfRenderer;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error while writing document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    Heading(String),
    /// Bold label followed by its value on the same line.
    Field { label: String, value: String },
    /// Free text; embedded newlines start new lines.
    Paragraph(String),
    Spacer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Title(text.into()));
        self
    }

    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Heading(text.into()));
        self
    }

    pub fn field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.blocks.push(Block::Field {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn spacer(mut self) -> Self {
        self.blocks.push(Block::Spacer);
        self
    }
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &Document) -> Result<Vec<u8>, ExportError>;

    fn content_type(&self) -> &'static str;
}

/// A rendered document sent as a download.
pub struct Attachment {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn render(
        renderer: &dyn DocumentRenderer,
        document: &Document,
        file_name: impl Into<String>,
    ) -> Result<Self, ExportError> {
        Ok(Self {
            file_name: file_name.into(),
            content_type: renderer.content_type(),
            bytes: renderer.render(document)?,
        })
    }
}

impl IntoResponse for Attachment {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        (
            [
                (CONTENT_TYPE, self.content_type.to_string()),
                (CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Reduces a username to characters safe inside a quoted header filename.
pub fn file_stem(username: &str) -> String {
    username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_block_order() {
        let doc = Document::new()
            .title("Report")
            .spacer()
            .field("Goal", "SRE")
            .paragraph("text");
        assert_eq!(
            doc.blocks,
            vec![
                Block::Title("Report".into()),
                Block::Spacer,
                Block::Field {
                    label: "Goal".into(),
                    value: "SRE".into()
                },
                Block::Paragraph("text".into()),
            ]
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("alice"), "alice");
        assert_eq!(file_stem("a\"b/c é"), "a_b_c__");
    }

    #[test]
    fn test_attachment_headers() {
        let response = Attachment {
            file_name: "career_report.pdf".into(),
            content_type: "application/pdf",
            bytes: b"%PDF-".to_vec(),
        }
        .into_response();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"career_report.pdf\""
        );
    }
}
