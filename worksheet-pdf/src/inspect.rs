//! Read back text runs from a produced worksheet
//!
//! Only understands documents written by this crate: headings are WinAnsi
//! literals shown with the `heading` font, everything else is Identity-H
//! UTF-16 shown with one of the composite faces.

use crate::error::{PdfError, Result};
use crate::fonts::FontFace;
use lopdf::{Document, Object};
use std::path::Path;

/// One `Tj` run found in a page's content stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    /// Zero-based page index.
    pub page: usize,
    /// Resource name of the font that was active.
    pub font: String,
    pub text: String,
}

fn load(path: &Path) -> Result<Document> {
    Document::load(path).map_err(|e| PdfError::layout(format!("cannot read {}: {e}", path.display())))
}

pub fn page_count(path: &Path) -> Result<usize> {
    Ok(load(path)?.get_pages().len())
}

/// All text runs in page order.
pub fn read_text_runs(path: &Path) -> Result<Vec<TextRun>> {
    let document = load(path)?;
    let mut runs = Vec::new();

    for (page, (_number, page_id)) in document.get_pages().into_iter().enumerate() {
        let content = document.get_and_decode_page_content(page_id)?;
        let mut font = String::new();

        for op in &content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                        font = String::from_utf8_lossy(name).into_owned();
                    }
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = op.operands.first() {
                        runs.push(TextRun {
                            page,
                            text: decode_run(&font, bytes),
                            font: font.clone(),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    Ok(runs)
}

/// English headings in the order they appear in the document.
pub fn read_headings(path: &Path) -> Result<Vec<String>> {
    Ok(read_text_runs(path)?
        .into_iter()
        .filter(|run| run.font == FontFace::Heading.resource_name())
        .map(|run| run.text)
        .collect())
}

fn decode_run(font: &str, bytes: &[u8]) -> String {
    if font == FontFace::Heading.resource_name() {
        bytes.iter().map(|&b| char::from(b)).collect()
    } else {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    }
}
