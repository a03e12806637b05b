//! Hanzi Worksheet
//!
//! Builds a printable Chinese handwriting worksheet from a built-in vocabulary
//! list, optionally extended with one phrase translated through an
//! OpenRouter-compatible chat-completion endpoint.

pub mod config;
pub mod error;
pub mod reply;
pub mod translate;
pub mod vocabulary;

pub use config::{AppConfig, TranslatorConfig};
pub use error::{RequestFailure, TranslationError, WorksheetError};
pub use reply::{parse_reply, ReplyError};
pub use translate::TranslationClient;
pub use vocabulary::{builtin_entries, collect_entries};
pub use worksheet_pdf::{Entry, RenderSummary};

use log::{info, warn};
use worksheet_pdf::inspect::read_headings;
use worksheet_pdf::{create_worksheet_pdf, FontContext};

/// Run the whole pipeline and write the worksheet to `config.output_path`.
///
/// Fonts are loaded before any translation is attempted, so a missing asset
/// fails fast. Translation problems never reach the caller.
pub fn run(config: &AppConfig, phrase: Option<&str>) -> error::Result<RenderSummary> {
    let fonts = FontContext::load(&config.fonts, config.layout.use_calligraphy)?;
    let entries = collect_entries(config, phrase);
    info!("Rendering {} vocabulary entries", entries.len());

    let summary = create_worksheet_pdf(&entries, &config.output_path, &fonts, &config.layout)?;
    match read_headings(&config.output_path) {
        Ok(headings) => info!("Worksheet headings: {}", headings.join(" | ")),
        Err(e) => warn!("Could not read back {}: {e}", config.output_path.display()),
    }
    Ok(summary)
}
