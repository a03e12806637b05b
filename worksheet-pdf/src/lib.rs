//! Chinese Handwriting Worksheet PDF
//!
//! Lays vocabulary entries out as an English heading over a ruled grid of
//! Pinyin cells and light-grey trace-over characters, paginates the grid on A4,
//! and writes the result with embedded CJK fonts.

pub mod canvas;
pub mod entry;
pub mod error;
pub mod fonts;
pub mod inspect;
pub mod layout;
pub mod pdf_canvas;
pub mod worksheet_generator;

// Re-export commonly used functions and types
pub use canvas::{Canvas, CellRole, TextCell};
pub use entry::Entry;
pub use error::PdfError;
pub use fonts::{FontContext, FontPaths};
pub use layout::{GridLayoutEngine, WorksheetOptions};
pub use worksheet_generator::{create_worksheet_pdf, RenderSummary, WorksheetGenerator};
