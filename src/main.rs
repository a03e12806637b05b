use anyhow::{Context, Result};
use hanzi_worksheet::{run, AppConfig};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    let phrase = prompt_phrase().unwrap_or_else(|e| {
        log::warn!("Could not read a phrase: {e:#}");
        None
    });

    match run(&config, phrase.as_deref()).context("worksheet generation failed") {
        Ok(summary) => {
            println!(
                "PDF created successfully: {} ({} pages)",
                config.output_path.display(),
                summary.pages
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error creating PDF: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Ask for one optional phrase; an empty line or EOF means none.
fn prompt_phrase() -> Result<Option<String>> {
    print!("Enter an English phrase to translate (or press Enter to skip): ");
    io::stdout().flush().context("flushing prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading phrase from stdin")?;
    let phrase = line.trim();
    Ok((!phrase.is_empty()).then(|| phrase.to_string()))
}
