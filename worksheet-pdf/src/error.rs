//! Errors raised while loading fonts, laying out pages and writing the PDF

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    /// A font file is missing or could not be parsed.
    #[error("failed to load font asset {}: {reason}", path.display())]
    AssetLoad { path: PathBuf, reason: String },

    /// The canvas rejected a draw or the document structure is inconsistent.
    #[error("layout failed: {reason}")]
    Layout { reason: String },

    /// The output file could not be created, written or flushed.
    #[error("failed to write PDF to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PdfError {
    pub(crate) fn layout(reason: impl Into<String>) -> Self {
        PdfError::Layout {
            reason: reason.into(),
        }
    }
}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        PdfError::layout(format!("PDF object error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
