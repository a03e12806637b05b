//! Drawing surface used by the layout engine
//!
//! The layout engine only ever asks for one primitive: a rectangular cell,
//! optionally bordered, optionally holding one aligned run of text. Everything
//! is expressed in millimetres from the top-left corner of the page.

use crate::error::Result;
use crate::fonts::FontFace;

pub const MM_PER_PT: f32 = 25.4 / 72.0;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_PT
}

/// Axis-aligned rectangle in millimetres, y growing downwards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// RGB ink, 0-255 per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const TRACE_GREY: Rgb = Rgb(200, 200, 200);

    /// Channels scaled to the 0.0-1.0 range PDF colour operators expect.
    pub fn unit(&self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size_pt: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// What a cell represents on the worksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellRole {
    Heading,
    Pinyin,
    Hanzi,
    Placeholder,
}

/// One draw request
#[derive(Debug, Clone, PartialEq)]
pub struct TextCell {
    pub rect: Rect,
    pub text: String,
    pub style: TextStyle,
    pub align: Align,
    pub border: bool,
    pub role: CellRole,
}

/// A page-oriented drawing target
pub trait Canvas {
    /// Close the current page (if any) and start a new blank one.
    fn begin_page(&mut self) -> Result<()>;

    /// Draw a cell on the current page.
    fn draw_cell(&mut self, cell: &TextCell) -> Result<()>;
}
