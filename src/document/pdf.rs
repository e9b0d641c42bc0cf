//! Page recording and PDF output.
//!
//! Layout code draws into a [`Canvas`], which only records operations.
//! [`write_pdf`] hands the recorded pages to `pdf-writer` for serialization.
//! No file id or creation date is written, so the same pages always produce
//! the same bytes.

use super::metrics::Font;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

/// An RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// From `0xRRGGBB`.
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    pub const WHITE: Color = Color::hex(0xFFFFFF);

    fn components(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

/// One recorded drawing operation. Coordinates are points from the
/// bottom-left corner of the page.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_width: f32,
        color: Color,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        line_width: f32,
        color: Color,
    },
    /// Single line of text with its baseline starting at (x, y).
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        color: Color,
        text: String,
    },
}

/// Drawing operations for one page.
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    ops: Vec<DrawOp>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.ops.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32, color: Color) {
        self.ops.push(DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            line_width,
            color,
        });
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), line_width: f32, color: Color) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            line_width,
            color,
        });
    }

    pub fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Color, text: &str) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            font,
            size,
            color,
            text: text.to_string(),
        });
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Encode the recorded operations as a content stream.
    fn content(&self) -> Vec<u8> {
        let mut content = Content::new();
        for op in &self.ops {
            match op {
                DrawOp::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    let (r, g, b) = color.components();
                    content.set_fill_rgb(r, g, b);
                    content.rect(*x, *y, *width, *height);
                    content.fill_nonzero();
                }
                DrawOp::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                    line_width,
                    color,
                } => {
                    let (r, g, b) = color.components();
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(*line_width);
                    content.rect(*x, *y, *width, *height);
                    content.stroke();
                }
                DrawOp::Line {
                    from,
                    to,
                    line_width,
                    color,
                } => {
                    let (r, g, b) = color.components();
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(*line_width);
                    content.move_to(from.0, from.1);
                    content.line_to(to.0, to.1);
                    content.stroke();
                }
                DrawOp::Text {
                    x,
                    y,
                    font,
                    size,
                    color,
                    text,
                } => {
                    let (r, g, b) = color.components();
                    let encoded = encode_win_ansi(text);
                    content.begin_text();
                    content.set_font(Name(font.resource().as_bytes()), *size);
                    content.set_fill_rgb(r, g, b);
                    content.next_line(*x, *y);
                    content.show(Str(&encoded));
                    content.end_text();
                }
            }
        }
        content.finish()
    }
}

/// Document-level metadata.
#[derive(Clone, Debug)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
}

/// Serialize pages of the given size into a complete PDF file.
pub fn write_pdf(pages: &[Canvas], page_size: (f32, f32), info: &DocumentInfo) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let regular_id = Ref::new(3);
    let bold_id = Ref::new(4);
    let info_id = Ref::new(5);
    // Each page is followed by its content stream.
    let page_id = |i: usize| Ref::new(6 + 2 * i as i32);
    let content_id = |i: usize| Ref::new(7 + 2 * i as i32);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids((0..pages.len()).map(page_id))
        .count(pages.len() as i32);

    for (id, font) in [(regular_id, Font::Regular), (bold_id, Font::Bold)] {
        pdf.type1_font(id)
            .base_font(Name(font.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    pdf.document_info(info_id)
        .title(TextStr(&info.title))
        .author(TextStr(&info.author))
        .producer(TextStr("purchase-ledger"));

    for (i, canvas) in pages.iter().enumerate() {
        let mut page = pdf.page(page_id(i));
        page.media_box(Rect::new(0.0, 0.0, page_size.0, page_size.1));
        page.parent(tree_id);
        page.contents(content_id(i));
        page.resources()
            .fonts()
            .pair(Name(Font::Regular.resource().as_bytes()), regular_id)
            .pair(Name(Font::Bold.resource().as_bytes()), bold_id);
        page.finish();

        pdf.stream(content_id(i), &canvas.content());
    }

    pdf.finish()
}

/// Map text onto the WinAnsi code page used by the built-in fonts.
///
/// Characters with no WinAnsi code become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\t' => b' ',
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}
