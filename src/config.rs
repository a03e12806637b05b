//! Run configuration read from the environment

use log::warn;
use std::path::PathBuf;
use std::time::Duration;
use worksheet_pdf::{FontPaths, WorksheetOptions};

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const ENDPOINT_VAR: &str = "OPENROUTER_ENDPOINT";
pub const MODEL_VAR: &str = "OPENROUTER_MODEL";
pub const TIMEOUT_VAR: &str = "OPENROUTER_TIMEOUT_SECS";
pub const FONT_DIR_VAR: &str = "WORKSHEET_FONT_DIR";
pub const OUTPUT_VAR: &str = "WORKSHEET_OUTPUT";
pub const CALLIGRAPHY_VAR: &str = "WORKSHEET_CALLIGRAPHY";

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "allenai/molmo-7b-d:free";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the chat-completion translation call
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatorConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    /// Overall deadline for one translation, retries included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Pause before the single retry.
    pub retry_backoff: Duration,
    /// Honour HTTP(S)_PROXY from the environment.
    pub use_system_proxy: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(500),
            use_system_proxy: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub translator: TranslatorConfig,
    pub fonts: FontPaths,
    pub output_path: PathBuf,
    pub layout: WorksheetOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            translator: TranslatorConfig::default(),
            fonts: FontPaths::default(),
            output_path: PathBuf::from("output.pdf"),
            layout: WorksheetOptions::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        config.translator.api_key = get(API_KEY_VAR);
        if let Some(endpoint) = get(ENDPOINT_VAR) {
            config.translator.endpoint = endpoint;
        }
        if let Some(model) = get(MODEL_VAR) {
            config.translator.model = model;
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.translator.timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring {TIMEOUT_VAR}={raw:?}, expected a positive number of seconds"),
            }
        }

        if let Some(dir) = get(FONT_DIR_VAR) {
            config.fonts.dir = PathBuf::from(dir);
        }
        if let Some(output) = get(OUTPUT_VAR) {
            config.output_path = PathBuf::from(output);
        }
        if let Some(raw) = get(CALLIGRAPHY_VAR) {
            match parse_flag(&raw) {
                Some(flag) => config.layout.use_calligraphy = flag,
                None => warn!("Ignoring {CALLIGRAPHY_VAR}={raw:?}, expected on/off"),
            }
        }

        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
