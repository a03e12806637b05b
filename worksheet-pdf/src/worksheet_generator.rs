//! Worksheet generation: entry placement, pagination and file output

use crate::canvas::{Canvas, CellRole, TextCell};
use crate::entry::Entry;
use crate::error::{PdfError, Result};
use crate::fonts::FontContext;
use crate::layout::{GridLayoutEngine, WorksheetOptions};
use crate::pdf_canvas::PdfCanvas;
use log::{debug, info, warn};
use lopdf::Document;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Counts gathered while rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    pub entries: usize,
    pub pinyin_cells: usize,
    pub hanzi_cells: usize,
    pub placeholder_cells: usize,
}

/// Mutable cursor state threaded through every placement call
#[derive(Debug, Clone, Default)]
pub struct LayoutContext {
    /// Vertical cursor on the current page, in mm.
    pub cursor_y: f32,
    /// Whether anything has been drawn since the last page break.
    pub page_has_content: bool,
    pub summary: RenderSummary,
}

/// Places entries onto a canvas, breaking pages as the cursor runs out of room
pub struct WorksheetGenerator {
    engine: GridLayoutEngine,
}

impl WorksheetGenerator {
    pub fn new(options: WorksheetOptions) -> Self {
        Self {
            engine: GridLayoutEngine::new(options),
        }
    }

    pub fn engine(&self) -> &GridLayoutEngine {
        &self.engine
    }

    /// Render all entries in order. Always produces at least one page.
    pub fn render<C: Canvas>(&self, canvas: &mut C, entries: &[Entry]) -> Result<RenderSummary> {
        let mut ctx = LayoutContext::default();
        for entry in entries {
            self.place_entry(canvas, &mut ctx, entry)?;
        }
        if ctx.summary.pages == 0 {
            self.start_page(canvas, &mut ctx)?;
        }
        Ok(ctx.summary)
    }

    /// Draw one entry at the cursor and advance it.
    pub fn place_entry<C: Canvas>(
        &self,
        canvas: &mut C,
        ctx: &mut LayoutContext,
        entry: &Entry,
    ) -> Result<()> {
        let opts = self.engine.options();
        let page_bottom = opts.page_height - opts.margin_bottom;

        if ctx.summary.pages == 0 {
            self.start_page(canvas, ctx)?;
        }

        // Heading and first band move to the next page together.
        let mut block = self.engine.plan_entry(entry, opts.origin_x, ctx.cursor_y);
        if block.lead_bottom() > page_bottom && ctx.page_has_content {
            self.start_page(canvas, ctx)?;
            block = self.engine.plan_entry(entry, opts.origin_x, ctx.cursor_y);
        }
        if block.lead_bottom() > page_bottom {
            warn!(
                "Entry '{}' does not fit on an empty page, drawing past the bottom margin",
                entry.english
            );
        }

        self.draw(canvas, ctx, &block.heading)?;

        let mut shift = 0.0;
        for (index, band) in block.bands.iter().enumerate() {
            let mut band = band.clone();
            band.shift(shift);
            if index > 0 && band.bottom() > page_bottom {
                self.start_page(canvas, ctx)?;
                let dy = opts.origin_y - band.top;
                band.shift(dy);
                shift += dy;
            }
            for cell in &band.cells {
                self.draw(canvas, ctx, cell)?;
            }
            ctx.cursor_y = band.bottom() + self.engine.trailing_gap();
        }

        ctx.summary.entries += 1;
        debug!(
            "Placed '{}' in {} band(s), cursor now at {:.1}mm on page {}",
            entry.english,
            block.bands.len(),
            ctx.cursor_y,
            ctx.summary.pages
        );
        Ok(())
    }

    fn start_page<C: Canvas>(&self, canvas: &mut C, ctx: &mut LayoutContext) -> Result<()> {
        canvas.begin_page()?;
        ctx.summary.pages += 1;
        ctx.cursor_y = self.engine.options().origin_y;
        ctx.page_has_content = false;
        Ok(())
    }

    fn draw<C: Canvas>(&self, canvas: &mut C, ctx: &mut LayoutContext, cell: &TextCell) -> Result<()> {
        canvas.draw_cell(cell)?;
        ctx.page_has_content = true;
        match cell.role {
            CellRole::Heading => {}
            CellRole::Pinyin => ctx.summary.pinyin_cells += 1,
            CellRole::Hanzi => ctx.summary.hanzi_cells += 1,
            CellRole::Placeholder => ctx.summary.placeholder_cells += 1,
        }
        Ok(())
    }
}

/// Render `entries` into a PDF at `output_path`.
///
/// The whole document is built in memory first, so a layout failure never
/// leaves a partial file behind.
pub fn create_worksheet_pdf(
    entries: &[Entry],
    output_path: &Path,
    fonts: &FontContext,
    options: &WorksheetOptions,
) -> Result<RenderSummary> {
    let generator = WorksheetGenerator::new(options.clone());
    let mut canvas = PdfCanvas::new(fonts, options)?;
    let summary = generator.render(&mut canvas, entries)?;
    let mut document = canvas.finish()?;

    save_document(&mut document, output_path)?;
    info!(
        "Wrote {} entries on {} page(s) to {}",
        summary.entries,
        summary.pages,
        output_path.display()
    );
    Ok(summary)
}

fn save_document(document: &mut Document, output_path: &Path) -> Result<()> {
    let write_error = |source: io::Error| PdfError::OutputWrite {
        path: output_path.to_path_buf(),
        source,
    };

    document.compress();
    let file = File::create(output_path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    document
        .save_to(&mut writer)
        .map_err(|e| write_error(io::Error::other(e.to_string())))?;
    writer.flush().map_err(write_error)?;
    Ok(())
}
