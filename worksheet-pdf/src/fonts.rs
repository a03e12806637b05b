//! Font management for the worksheet
//!
//! Loads the default CJK face and the optional calligraphy face from a font
//! directory, keeps their raw bytes for embedding, and exposes glyph lookup and
//! advance widths through fontdue so cells can be centered.

use crate::canvas::pt_to_mm;
use crate::error::{PdfError, Result};
use fontdue::{Font, FontSettings};
use log::info;
use std::path::{Path, PathBuf};

/// Font faces a cell can be drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    /// Built-in bold sans used for the English heading.
    Heading,
    /// Default CJK face, also used for Pinyin.
    Default,
    /// Brush-style face for the trace-over characters.
    Calligraphy,
}

impl FontFace {
    /// Name of the font in the page resource dictionary.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontFace::Heading => "heading",
            FontFace::Default => "default",
            FontFace::Calligraphy => "calligraphy",
        }
    }
}

/// Where the TrueType files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontPaths {
    pub dir: PathBuf,
    pub default_file: String,
    pub calligraphy_file: String,
}

impl Default for FontPaths {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/fonts"),
            default_file: "chinese.msyh.ttf".to_string(),
            calligraphy_file: "simsun.ttf".to_string(),
        }
    }
}

impl FontPaths {
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn default_path(&self) -> PathBuf {
        self.dir.join(&self.default_file)
    }

    pub fn calligraphy_path(&self) -> PathBuf {
        self.dir.join(&self.calligraphy_file)
    }
}

/// A parsed font together with the bytes it was parsed from
#[derive(Clone)]
pub struct LoadedFont {
    pub font: Font,
    pub font_name: String,  // PDF BaseFont name
    pub font_path: PathBuf,
    pub font_data: Vec<u8>,
}

impl LoadedFont {
    /// Read and parse a TrueType file, failing with `AssetLoad` on any problem.
    ///
    /// Only single-face `.ttf` files are accepted: they go into a FontFile2
    /// stream and the CID to glyph map is built from their cmap.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PdfError::AssetLoad {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }
        let is_ttf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"));
        if !is_ttf {
            return Err(PdfError::AssetLoad {
                path: path.to_path_buf(),
                reason: "not a TrueType (.ttf) file".to_string(),
            });
        }

        let font_data = std::fs::read(path).map_err(|e| PdfError::AssetLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = Font::from_bytes(font_data.as_slice(), FontSettings::default()).map_err(|e| {
            PdfError::AssetLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            font,
            font_name: sanitize_pdf_font_name(&stem),
            font_path: path.to_path_buf(),
            font_data,
        })
    }
}

/// Loaded fonts for one worksheet run
#[derive(Clone)]
pub struct FontContext {
    pub default_font: LoadedFont,
    pub calligraphy_font: Option<LoadedFont>,
}

impl FontContext {
    /// Load the default face, and the calligraphy face when it is requested.
    pub fn load(paths: &FontPaths, use_calligraphy: bool) -> Result<Self> {
        let default_path = paths.default_path();
        info!("Loading default font from {}", default_path.display());
        let default_font = LoadedFont::from_file(&default_path)?;

        let calligraphy_font = if use_calligraphy {
            let calligraphy_path = paths.calligraphy_path();
            info!("Loading calligraphy font from {}", calligraphy_path.display());
            Some(LoadedFont::from_file(&calligraphy_path)?)
        } else {
            None
        };

        Ok(Self {
            default_font,
            calligraphy_font,
        })
    }

    /// Faces that must be registered as composite fonts in the document.
    pub fn embedded_faces(&self) -> Vec<(FontFace, &LoadedFont)> {
        let mut faces = vec![(FontFace::Default, &self.default_font)];
        if let Some(calligraphy) = &self.calligraphy_font {
            faces.push((FontFace::Calligraphy, calligraphy));
        }
        faces
    }

    /// Resolve a face; calligraphy falls back to the default face when absent.
    pub fn face(&self, face: FontFace) -> Option<&LoadedFont> {
        match face {
            FontFace::Heading => None,
            FontFace::Default => Some(&self.default_font),
            FontFace::Calligraphy => self.calligraphy_font.as_ref().or(Some(&self.default_font)),
        }
    }

    /// Face actually used when `face` is requested.
    pub fn resolve(&self, face: FontFace) -> FontFace {
        match face {
            FontFace::Calligraphy if self.calligraphy_font.is_none() => FontFace::Default,
            other => other,
        }
    }

    /// Advance width of `text` in millimetres at `size_pt`.
    pub fn text_width_mm(&self, face: FontFace, text: &str, size_pt: f32) -> f32 {
        match self.face(face) {
            Some(loaded) => {
                let width_pt: f32 = text
                    .chars()
                    .map(|ch| loaded.font.metrics(ch, size_pt).advance_width)
                    .sum();
                pt_to_mm(width_pt)
            }
            // Helvetica-Bold averages a little over half an em per glyph.
            None => pt_to_mm(text.chars().count() as f32 * size_pt * 0.56),
        }
    }
}

/// Turn a file stem into a valid PDF name token.
pub fn sanitize_pdf_font_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if ch.is_whitespace() || ch == '.' {
            out.push('-');
        }
    }
    if out.is_empty() {
        "CJKFont".to_string()
    } else {
        out
    }
}
