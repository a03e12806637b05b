//! lopdf-backed canvas
//!
//! Builds the PDF object graph page by page: a Type1 font for headings,
//! composite Type0/CIDFontType2 fonts for the CJK faces, and one content
//! stream per page holding the cell borders and text runs.

use crate::canvas::{mm_to_pt, pt_to_mm, Align, Canvas, TextCell};
use crate::error::{PdfError, Result};
use crate::fonts::{FontContext, FontFace, LoadedFont};
use crate::layout::WorksheetOptions;
use lopdf::{
    content::{Content, Operation},
    Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};
use std::collections::BTreeMap;

/// Border stroke width, about 0.2mm.
const BORDER_WIDTH_PT: f32 = 0.567;
/// Inner padding for left-aligned text.
const CELL_MARGIN_MM: f32 = 1.0;

pub struct PdfCanvas<'a> {
    fonts: &'a FontContext,
    page_width: f32,
    page_height: f32,
    document: Document,
    font_objects: BTreeMap<String, ObjectId>,
    pages_id: ObjectId,
    current_page: Option<Content>,
}

impl<'a> PdfCanvas<'a> {
    pub fn new(fonts: &'a FontContext, options: &WorksheetOptions) -> Result<Self> {
        let mut canvas = Self {
            fonts,
            page_width: options.page_width,
            page_height: options.page_height,
            document: Document::with_version("1.5"),
            font_objects: BTreeMap::new(),
            pages_id: (0, 0), // set in initialize_document
            current_page: None,
        };
        canvas.initialize_document()?;
        Ok(canvas)
    }

    /// Close the last page and hand back the finished document.
    pub fn finish(mut self) -> Result<Document> {
        self.flush_page()?;
        if self.page_count()? == 0 {
            return Err(PdfError::layout("document has no pages"));
        }
        Ok(self.document)
    }

    /// Initialize PDF document with fonts and metadata
    fn initialize_document(&mut self) -> Result<()> {
        self.add_heading_font();
        let fonts = self.fonts;
        for (face, loaded) in fonts.embedded_faces() {
            self.add_composite_font(face.resource_name(), loaded);
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Kids", Object::Array(vec![]));
        pages_dict.set("Count", Object::Integer(0));
        let pages_id = self.document.add_object(Object::Dictionary(pages_dict));

        let mut info_dict = Dictionary::new();
        info_dict.set("Title", Object::string_literal("Chinese handwriting worksheet"));
        info_dict.set("Producer", Object::string_literal("hanzi-worksheet"));
        info_dict.set("Creator", Object::string_literal("worksheet-pdf"));
        let info_id = self.document.add_object(Object::Dictionary(info_dict));

        let mut catalog_dict = Dictionary::new();
        catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog_dict.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.document.add_object(Object::Dictionary(catalog_dict));

        self.document.trailer.set("Root", Object::Reference(catalog_id));
        self.document.trailer.set("Info", Object::Reference(info_id));
        self.pages_id = pages_id;

        Ok(())
    }

    /// Built-in bold sans for the English headings.
    fn add_heading_font(&mut self) {
        let mut font_dict = Dictionary::new();
        font_dict.set("Type", Object::Name(b"Font".to_vec()));
        font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
        font_dict.set("BaseFont", Object::Name(b"Helvetica-Bold".to_vec()));
        font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));

        let font_id = self.document.add_object(Object::Dictionary(font_dict));
        self.font_objects
            .insert(FontFace::Heading.resource_name().to_string(), font_id);
    }

    /// Register a CJK face as Type0 over an embedded CIDFontType2.
    fn add_composite_font(&mut self, name: &str, loaded: &LoadedFont) {
        let base_font = Object::Name(loaded.font_name.clone().into_bytes());

        let mut file_dict = Dictionary::new();
        file_dict.set("Length1", Object::Integer(loaded.font_data.len() as i64));
        let file_id = self
            .document
            .add_object(Stream::new(file_dict, loaded.font_data.clone()));
        let descriptor_id = self
            .document
            .add_object(Object::Dictionary(font_descriptor(loaded, file_id)));
        let gid_map_id = self.document.add_object(cid_to_gid_map_stream(loaded));

        let descendant = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
            ("BaseFont", base_font.clone()),
            ("CIDSystemInfo", Object::Dictionary(identity_system_info())),
            ("FontDescriptor", Object::Reference(descriptor_id)),
            ("DW", Object::Integer(1000)),
            ("CIDToGIDMap", Object::Reference(gid_map_id)),
        ]);
        let descendant_id = self.document.add_object(Object::Dictionary(descendant));
        let to_unicode_id = self.document.add_object(bmp_to_unicode_stream());

        let type0 = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("BaseFont", base_font),
            ("Encoding", Object::Name(b"Identity-H".to_vec())),
            ("DescendantFonts", Object::Array(vec![Object::Reference(descendant_id)])),
            ("ToUnicode", Object::Reference(to_unicode_id)),
        ]);
        let font_id = self.document.add_object(Object::Dictionary(type0));
        self.font_objects.insert(name.to_string(), font_id);
    }

    fn create_resources_dict(&self) -> Object {
        let mut font_dict = Dictionary::new();
        for (font_name, &font_id) in &self.font_objects {
            font_dict.set(font_name.as_str(), Object::Reference(font_id));
        }

        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(font_dict));
        Object::Dictionary(resources)
    }

    /// Turn the open page's operations into a page object.
    fn flush_page(&mut self) -> Result<()> {
        let Some(content) = self.current_page.take() else {
            return Ok(());
        };

        let page_id = self.document.new_object_id();
        let content_stream = Stream::new(Dictionary::new(), content.encode()?);
        let content_id = self.document.add_object(content_stream);

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(self.pages_id));
        page_dict.set("Resources", self.create_resources_dict());
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(mm_to_pt(self.page_width)),
                Object::Real(mm_to_pt(self.page_height)),
            ]),
        );
        page_dict.set("Contents", Object::Reference(content_id));

        self.document
            .objects
            .insert(page_id, Object::Dictionary(page_dict));
        self.add_page_to_tree(page_id)
    }

    fn add_page_to_tree(&mut self, page_id: ObjectId) -> Result<()> {
        let pages_obj = self.document.get_object_mut(self.pages_id)?;
        let Object::Dictionary(pages_dict) = pages_obj else {
            return Err(PdfError::layout("Pages object is not a dictionary"));
        };

        let kids = pages_dict.get_mut(b"Kids")?.as_array_mut()?;
        kids.push(Object::Reference(page_id));
        let count = kids.len() as i64;
        pages_dict.set("Count", Object::Integer(count));
        Ok(())
    }

    fn page_count(&self) -> Result<usize> {
        let pages_obj = self.document.get_object(self.pages_id)?;
        if let Object::Dictionary(ref pages_dict) = pages_obj {
            Ok(pages_dict.get(b"Kids")?.as_array()?.len())
        } else {
            Ok(0)
        }
    }

    /// Operations drawing one cell, coordinates flipped to PDF space.
    fn cell_operations(&self, cell: &TextCell) -> Vec<Operation> {
        let mut ops = Vec::new();
        let page_height_pt = mm_to_pt(self.page_height);
        let rect = cell.rect;

        if cell.border {
            ops.push(Operation::new("q", vec![]));
            ops.push(Operation::new("w", vec![Object::Real(BORDER_WIDTH_PT)]));
            ops.push(Operation::new(
                "RG",
                vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
            ));
            ops.push(Operation::new(
                "re",
                vec![
                    Object::Real(mm_to_pt(rect.x)),
                    Object::Real(page_height_pt - mm_to_pt(rect.bottom())),
                    Object::Real(mm_to_pt(rect.width)),
                    Object::Real(mm_to_pt(rect.height)),
                ],
            ));
            ops.push(Operation::new("S", vec![]));
            ops.push(Operation::new("Q", vec![]));
        }

        if cell.text.is_empty() {
            return ops;
        }

        let face = self.fonts.resolve(cell.style.face);
        let size_pt = cell.style.size_pt;
        let size_mm = pt_to_mm(size_pt);
        let text_x = match cell.align {
            Align::Left => rect.x + CELL_MARGIN_MM,
            Align::Center => {
                let width = self.fonts.text_width_mm(face, &cell.text, size_pt);
                rect.x + (rect.width - width) / 2.0
            }
        };
        // Baseline sits a little below the cell's vertical middle.
        let baseline = rect.y + rect.height / 2.0 + 0.3 * size_mm;
        let [r, g, b] = cell.style.color.unit();

        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(face.resource_name().as_bytes().to_vec()),
                Object::Real(size_pt),
            ],
        ));
        ops.push(Operation::new(
            "rg",
            vec![Object::Real(r), Object::Real(g), Object::Real(b)],
        ));
        ops.push(Operation::new(
            "Tm",
            vec![
                Object::Real(1.0),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(1.0),
                Object::Real(mm_to_pt(text_x)),
                Object::Real(page_height_pt - mm_to_pt(baseline)),
            ],
        ));
        ops.push(Operation::new("Tj", vec![encode_text(face, &cell.text)]));
        ops.push(Operation::new("ET", vec![]));
        ops
    }
}

impl Canvas for PdfCanvas<'_> {
    fn begin_page(&mut self) -> Result<()> {
        self.flush_page()?;
        self.current_page = Some(Content {
            operations: Vec::new(),
        });
        Ok(())
    }

    fn draw_cell(&mut self, cell: &TextCell) -> Result<()> {
        let ops = self.cell_operations(cell);
        let page = self
            .current_page
            .as_mut()
            .ok_or_else(|| PdfError::layout("draw_cell called before begin_page"))?;
        page.operations.extend(ops);
        Ok(())
    }
}

/// Encode a run for the font it is shown with.
pub fn encode_text(face: FontFace, text: &str) -> Object {
    match face {
        FontFace::Heading => Object::String(encode_winansi(text), StringFormat::Literal),
        FontFace::Default | FontFace::Calligraphy => {
            // Identity-H: CID equals the UTF-16 code unit.
            let mut utf16be = Vec::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                utf16be.extend_from_slice(&unit.to_be_bytes());
            }
            Object::String(utf16be, StringFormat::Hexadecimal)
        }
    }
}

/// Latin-1 subset of WinAnsi; anything else is shown as `?`.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match u32::from(ch) {
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => b'?',
        })
        .collect()
}

fn identity_system_info() -> Dictionary {
    Dictionary::from_iter(vec![
        ("Registry", Object::string_literal("Adobe")),
        ("Ordering", Object::string_literal("Identity")),
        ("Supplement", Object::Integer(0)),
    ])
}

/// Descriptor with vertical metrics scaled to the 1000-unit glyph space.
fn font_descriptor(loaded: &LoadedFont, file_id: ObjectId) -> Dictionary {
    let (ascent, descent) = loaded
        .font
        .horizontal_line_metrics(1000.0)
        .map(|m| (m.ascent.round() as i64, m.descent.round() as i64))
        .unwrap_or((880, -120));

    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"FontDescriptor".to_vec())),
        ("FontName", Object::Name(loaded.font_name.clone().into_bytes())),
        ("Flags", Object::Integer(4)),
        (
            "FontBBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(descent),
                Object::Integer(1000),
                Object::Integer(ascent),
            ]),
        ),
        ("ItalicAngle", Object::Integer(0)),
        ("Ascent", Object::Integer(ascent)),
        ("Descent", Object::Integer(descent)),
        ("CapHeight", Object::Integer(ascent * 4 / 5)),
        ("StemV", Object::Integer(80)),
        ("FontFile2", Object::Reference(file_id)),
    ])
}

/// ToUnicode CMap mapping every two-byte code to the same UTF-16 unit,
/// one bfrange per high byte.
fn bmp_to_unicode_stream() -> Stream {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    // At most 100 entries per bfrange block.
    let highs: Vec<u32> = (0..=0xFF).collect();
    for block in highs.chunks(100) {
        cmap.push_str(&format!("{} beginbfrange\n", block.len()));
        for high in block {
            let first = high << 8;
            cmap.push_str(&format!("<{first:04X}> <{:04X}> <{first:04X}>\n", first | 0xFF));
        }
        cmap.push_str("endbfrange\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend");
    Stream::new(Dictionary::new(), cmap.into_bytes())
}

/// Two bytes per CID over the BMP: content streams use the UTF-16 code unit
/// as the CID, so each slot holds that character's glyph index.
fn cid_to_gid_map_stream(loaded: &LoadedFont) -> Stream {
    let map: Vec<u8> = (0u32..=0xFFFF)
        .flat_map(|cid| {
            let gid = char::from_u32(cid)
                .map(|ch| loaded.font.lookup_glyph_index(ch))
                .unwrap_or(0);
            gid.to_be_bytes()
        })
        .collect();
    Stream::new(Dictionary::new(), map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_replaces_characters_outside_latin1() {
        assert_eq!(encode_winansi("to welcome"), b"to welcome".to_vec());
        assert_eq!(encode_winansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_winansi("nǐ 你"), b"n? ?".to_vec());
    }

    #[test]
    fn cjk_runs_are_utf16_hex() {
        match encode_text(FontFace::Calligraphy, "你好") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(bytes, vec![0x4F, 0x60, 0x59, 0x7D]);
            }
            other => panic!("unexpected object {other:?}"),
        }
    }

    #[test]
    fn to_unicode_ranges_stay_within_one_high_byte() {
        let cmap = String::from_utf8(bmp_to_unicode_stream().content).unwrap();
        assert_eq!(cmap.matches("beginbfrange").count(), 3);
        assert!(cmap.contains("56 beginbfrange"));
        assert!(cmap.contains("<4F00> <4FFF> <4F00>"));
        assert!(cmap.contains("<FF00> <FFFF> <FF00>"));
        assert!(!cmap.contains("<0000> <FFFF> <0000>"));
    }

    #[test]
    fn heading_runs_are_literal() {
        assert!(matches!(
            encode_text(FontFace::Heading, "hello"),
            Object::String(_, StringFormat::Literal)
        ));
    }
}
