//! Shared fixtures for the worksheet PDF tests

use std::path::{Path, PathBuf};
use worksheet_pdf::{Entry, FontPaths};

/// TrueType fonts commonly installed on CI images and desktops, CJK first.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/fonts/chinese.msyh.ttf",
    "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
    "/usr/share/fonts/google-droid/DroidSansFallback.ttf",
    "/usr/share/fonts/truetype/arphic-gkai00mp/gkai00mp.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

/// Minimal TrueType face shipped with the tests (glyphs for `.notdef` and `A`).
pub fn fixture_font() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/demo.ttf")
}

/// Font paths using one TrueType file for both faces.
///
/// Prefers an installed font so the output is viewable, and falls back to the
/// bundled fixture so the PDF path is always exercised.
pub fn test_font_paths() -> FontPaths {
    let found = SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
        .unwrap_or_else(fixture_font);
    paths_for(&found)
}

pub fn paths_for(font: &Path) -> FontPaths {
    let file = font
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    FontPaths {
        dir: font.parent().map(Path::to_path_buf).unwrap_or_default(),
        default_file: file.clone(),
        calligraphy_file: file,
    }
}

pub fn sample_entries() -> Vec<Entry> {
    vec![
        Entry::new("hello", &["nǐ", "hǎo"], &["你", "好"]),
        Entry::new("goodbye", &["zài", "jiàn"], &["再", "见"]),
        Entry::new("Chinese, Chinese written language", &["zhōng", "wén"], &["中", "文"]),
        Entry::new("to welcome", &["huān", "yíng"], &["欢", "迎"]),
    ]
}
