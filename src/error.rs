//! Error taxonomy for a worksheet run
//!
//! Translation errors are recovered inside the vocabulary source and never
//! leave it; what reaches `run`'s caller is always fatal.

use crate::reply::ReplyError;
use thiserror::Error;
use worksheet_pdf::PdfError;

/// Why the HTTP exchange with the translation endpoint failed
#[derive(Error, Debug)]
pub enum RequestFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

impl RequestFailure {
    /// Connect failures, timeouts, rate limiting and server errors are worth
    /// one more attempt; everything else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            RequestFailure::Transport(e) => e.is_connect() || e.is_timeout(),
            RequestFailure::Status { status, .. } => *status == 429 || *status >= 500,
            RequestFailure::Envelope(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("translation is not configured: {0}")]
    Configuration(String),

    #[error("nothing to translate: the phrase is empty")]
    EmptyPhrase,

    #[error("translation request failed: {0}")]
    TranslationRequest(#[from] RequestFailure),

    #[error("translation response contained no choices")]
    EmptyResponse,

    #[error("translation reply could not be parsed: {0}")]
    MalformedReply(#[from] ReplyError),

    #[error("translation deadline passed before a reply arrived")]
    DeadlineExceeded,
}

/// Failure that ends a worksheet run with a non-zero exit
#[derive(Error, Debug)]
pub enum WorksheetError {
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

pub type Result<T> = std::result::Result<T, WorksheetError>;
