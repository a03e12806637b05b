//! Worksheet grid layout
//!
//! Places an entry's English heading above one or more bands of practice
//! cells. Each band is a Pinyin row over a row of square character boxes and
//! always spans the full usable width, so every entry gets a complete ruled
//! grid regardless of how short its text is. Entries with more cells than fit
//! in one band wrap into additional bands.

use crate::canvas::{Align, CellRole, Rect, Rgb, TextCell, TextStyle};
use crate::entry::Entry;
use crate::fonts::FontFace;

/// Page geometry and typography, lengths in millimetres
#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetOptions {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    /// Where the first entry of every page starts.
    pub origin_x: f32,
    pub origin_y: f32,

    pub cell_size: f32,
    pub cell_gap: f32,

    pub heading_height: f32,
    pub heading_size: f32,
    /// Distance from the heading's top to the first band.
    pub heading_offset: f32,

    pub pinyin_height: f32,
    pub pinyin_size: f32,
    pub hanzi_size: f32,

    /// Entry advance is `cell_size + vertical_gap` for a single-band entry.
    pub vertical_gap: f32,
    /// Space between wrapped bands of the same entry.
    pub band_gap: f32,

    pub use_calligraphy: bool,
}

impl Default for WorksheetOptions {
    fn default() -> Self {
        Self {
            // A4 portrait
            page_width: 210.0,
            page_height: 297.0,
            margin_left: 10.0,
            margin_top: 10.0,
            margin_right: 10.0,
            margin_bottom: 10.0,
            origin_x: 20.0,
            origin_y: 20.0,

            cell_size: 20.0,
            cell_gap: 2.0,

            heading_height: 10.0,
            heading_size: 12.0,
            heading_offset: 12.0,

            pinyin_height: 10.0,
            pinyin_size: 12.0,
            hanzi_size: 40.0,

            vertical_gap: 35.0,
            band_gap: 2.0,

            use_calligraphy: true,
        }
    }
}

/// Values derived once from the options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub usable_width: f32,
    /// Columns per band.
    pub row_capacity: usize,
    /// Horizontal distance between the left edges of neighbouring cells.
    pub cell_pitch: f32,
    /// Pinyin row plus character row.
    pub band_height: f32,
    /// Vertical distance between the tops of wrapped bands.
    pub band_pitch: f32,
}

impl LayoutMetrics {
    pub fn from_options(options: &WorksheetOptions) -> Self {
        let usable_width = options.page_width - options.margin_left - options.margin_right;
        let cell_pitch = options.cell_size + options.cell_gap;
        let row_capacity = if cell_pitch > 0.0 {
            (usable_width / cell_pitch).floor().max(1.0) as usize
        } else {
            1
        };
        let band_height = options.pinyin_height + options.cell_size;

        Self {
            usable_width,
            row_capacity,
            cell_pitch,
            band_height,
            band_pitch: band_height + options.band_gap,
        }
    }
}

/// One row of Pinyin cells over one row of character boxes
#[derive(Debug, Clone, PartialEq)]
pub struct GridBand {
    pub top: f32,
    pub height: f32,
    pub cells: Vec<TextCell>,
}

impl GridBand {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Move the whole band down by `dy`.
    pub fn shift(&mut self, dy: f32) {
        self.top += dy;
        for cell in &mut self.cells {
            cell.rect.y += dy;
        }
    }

    pub fn count(&self, role: CellRole) -> usize {
        self.cells.iter().filter(|c| c.role == role).count()
    }
}

/// An entry placed at a position, before pagination
#[derive(Debug, Clone, PartialEq)]
pub struct EntryBlock {
    pub heading: TextCell,
    pub bands: Vec<GridBand>,
}

impl EntryBlock {
    /// Bottom of the heading plus the first band, which always stay together.
    pub fn lead_bottom(&self) -> f32 {
        self.bands
            .first()
            .map(|b| b.bottom())
            .unwrap_or_else(|| self.heading.rect.bottom())
    }

    pub fn bottom(&self) -> f32 {
        self.bands
            .last()
            .map(|b| b.bottom())
            .unwrap_or_else(|| self.heading.rect.bottom())
    }

    pub fn count(&self, role: CellRole) -> usize {
        let in_bands: usize = self.bands.iter().map(|b| b.count(role)).sum();
        in_bands + usize::from(self.heading.role == role)
    }
}

/// Grid layout engine
#[derive(Debug, Clone)]
pub struct GridLayoutEngine {
    options: WorksheetOptions,
    metrics: LayoutMetrics,
}

impl GridLayoutEngine {
    pub fn new(options: WorksheetOptions) -> Self {
        let metrics = LayoutMetrics::from_options(&options);
        Self { options, metrics }
    }

    pub fn options(&self) -> &WorksheetOptions {
        &self.options
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    /// Number of bands an entry occupies; never zero.
    pub fn band_count(&self, entry: &Entry) -> usize {
        entry.cell_count().div_ceil(self.metrics.row_capacity).max(1)
    }

    /// Gap left below the last band so a single-band entry advances by
    /// exactly `cell_size + vertical_gap`.
    pub fn trailing_gap(&self) -> f32 {
        self.options.vertical_gap - self.options.heading_offset - self.options.pinyin_height
    }

    /// Cursor advance for an entry with `bands` bands.
    pub fn entry_advance(&self, bands: usize) -> f32 {
        let extra = bands.saturating_sub(1) as f32 * self.metrics.band_pitch;
        self.options.cell_size + self.options.vertical_gap + extra
    }

    fn hanzi_face(&self) -> FontFace {
        if self.options.use_calligraphy {
            FontFace::Calligraphy
        } else {
            FontFace::Default
        }
    }

    /// English phrase, left-aligned, bold and black.
    pub fn heading_cell(&self, text: &str, x: f32, y: f32) -> TextCell {
        TextCell {
            rect: Rect::new(x, y, 0.0, self.options.heading_height),
            text: text.to_string(),
            style: TextStyle {
                face: FontFace::Heading,
                size_pt: self.options.heading_size,
                color: Rgb::BLACK,
            },
            align: Align::Left,
            border: false,
            role: CellRole::Heading,
        }
    }

    /// Cells of band `band_index` with its top edge at `top`.
    pub fn band(&self, entry: &Entry, band_index: usize, x: f32, top: f32) -> GridBand {
        let opts = &self.options;
        let capacity = self.metrics.row_capacity;
        let first = band_index * capacity;
        let mut cells = Vec::with_capacity(capacity * 2);

        for column in 0..capacity {
            let i = first + column;
            let x_pos = x + column as f32 * self.metrics.cell_pitch;

            if let Some(syllable) = entry.pinyin.get(i) {
                cells.push(TextCell {
                    rect: Rect::new(x_pos, top, opts.cell_size, opts.pinyin_height),
                    text: syllable.clone(),
                    style: TextStyle {
                        face: FontFace::Default,
                        size_pt: opts.pinyin_size,
                        color: Rgb::BLACK,
                    },
                    align: Align::Center,
                    border: true,
                    role: CellRole::Pinyin,
                });
            }

            let box_rect = Rect::new(x_pos, top + opts.pinyin_height, opts.cell_size, opts.cell_size);
            let cell = match entry.chinese.get(i) {
                Some(character) => TextCell {
                    rect: box_rect,
                    text: character.clone(),
                    style: TextStyle {
                        face: self.hanzi_face(),
                        size_pt: opts.hanzi_size,
                        color: Rgb::TRACE_GREY,
                    },
                    align: Align::Center,
                    border: true,
                    role: CellRole::Hanzi,
                },
                None => TextCell {
                    rect: box_rect,
                    text: String::new(),
                    style: TextStyle {
                        face: FontFace::Default,
                        size_pt: opts.hanzi_size,
                        color: Rgb::TRACE_GREY,
                    },
                    align: Align::Center,
                    border: true,
                    role: CellRole::Placeholder,
                },
            };
            cells.push(cell);
        }

        GridBand {
            top,
            height: self.metrics.band_height,
            cells,
        }
    }

    /// Place an entry with its heading at (x, y), bands stacked below.
    pub fn plan_entry(&self, entry: &Entry, x: f32, y: f32) -> EntryBlock {
        let heading = self.heading_cell(&entry.english, x, y);
        let first_top = y + self.options.heading_offset;
        let bands = (0..self.band_count(entry))
            .map(|index| {
                let top = first_top + index as f32 * self.metrics.band_pitch;
                self.band(entry, index, x, top)
            })
            .collect();

        EntryBlock { heading, bands }
    }
}
