//! Vocabulary source: the built-in list plus an optional translated entry

use crate::config::AppConfig;
use crate::translate::TranslationClient;
use log::{info, warn};
use worksheet_pdf::Entry;

/// The static vocabulary every worksheet starts with.
pub fn builtin_entries() -> Vec<Entry> {
    vec![
        Entry::new("hello", &["nǐ", "hǎo"], &["你", "好"]),
        Entry::new("goodbye", &["zài", "jiàn"], &["再", "见"]),
        Entry::new(
            "Chinese, Chinese written language",
            &["zhōng", "wén"],
            &["中", "文"],
        ),
        Entry::new("to welcome", &["huān", "yíng"], &["欢", "迎"]),
    ]
}

/// Built-in entries, plus the translation of `phrase` when one is given and
/// the translation succeeds. Translation failures are logged and skipped.
pub fn collect_entries(config: &AppConfig, phrase: Option<&str>) -> Vec<Entry> {
    let mut entries = builtin_entries();

    let Some(phrase) = phrase.map(str::trim).filter(|p| !p.is_empty()) else {
        info!("No phrase given, using the built-in vocabulary");
        return entries;
    };

    let translated = TranslationClient::from_config(&config.translator)
        .and_then(|client| client.translate(phrase));
    match translated {
        Ok(entry) => {
            if !entry.is_aligned() {
                warn!(
                    "Translation of {:?} has {} syllables for {} characters",
                    phrase,
                    entry.pinyin.len(),
                    entry.chinese.len()
                );
            }
            entries.push(entry);
        }
        Err(e) => warn!("Skipping translation of {phrase:?}: {e}"),
    }

    entries
}
