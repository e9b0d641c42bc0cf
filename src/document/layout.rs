//! Page flow and table drawing for the purchase-order document.
//!
//! Content is laid out top to bottom into a [`Flow`], which starts a new
//! page whenever the next block does not fit above the bottom margin.

use super::metrics::{wrap, Font};
use super::pdf::{Canvas, Color};
use std::mem;

/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

pub const MARGIN_X: f32 = 18.0 * MM;
pub const MARGIN_TOP: f32 = 16.0 * MM;
pub const MARGIN_BOTTOM: f32 = 16.0 * MM;

/// Usable width between the side margins.
pub const FRAME_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

/// Horizontal cell padding.
const PAD_X: f32 = 8.0;
/// Vertical cell padding.
const PAD_Y: f32 = 6.0;

#[derive(Clone, Copy, Debug)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub leading: f32,
    pub color: Color,
}

impl TextStyle {
    /// Baseline of line `index` in a block whose top edge is at `top`, with
    /// capitals centred in each line slot.
    fn baseline(&self, top: f32, index: usize) -> f32 {
        top - self.leading * (index as f32 + 0.5) - 0.36 * self.size
    }

    fn width(&self, text: &str) -> f32 {
        self.font.text_width(text, self.size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn x(self, left: f32, width: f32, text_width: f32) -> f32 {
        match self {
            Align::Left => left,
            Align::Center => left + (width - text_width) / 2.0,
            Align::Right => left + width - text_width,
        }
    }
}

/// Vertical cursor over a growing list of pages.
pub struct Flow {
    done: Vec<Canvas>,
    current: Canvas,
    y: f32,
    /// Nothing placed on the current page yet.
    fresh: bool,
}

impl Flow {
    pub fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Canvas::new(),
            y: PAGE_HEIGHT - MARGIN_TOP,
            fresh: true,
        }
    }

    fn remaining(&self) -> f32 {
        self.y - MARGIN_BOTTOM
    }

    fn new_page(&mut self) {
        self.done.push(mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN_TOP;
        self.fresh = true;
    }

    /// Break the page unless `height` fits. A block taller than a whole
    /// page is placed on a fresh page and allowed to overflow.
    pub fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.fresh {
            self.new_page();
        }
    }

    fn advance(&mut self, height: f32) {
        self.y -= height;
        self.fresh = false;
    }

    /// Vertical gap. Dropped at a page break.
    pub fn space(&mut self, height: f32) {
        if height < self.remaining() {
            self.y -= height;
        } else {
            self.new_page();
        }
    }

    /// One line of text per entry, each checked against the page bottom.
    pub fn lines(&mut self, lines: &[String], style: TextStyle, align: Align) {
        for line in lines {
            self.ensure(style.leading);
            let x = align.x(MARGIN_X, FRAME_WIDTH, style.width(line));
            let y = style.baseline(self.y, 0);
            self.current
                .text(x, y, style.font, style.size, style.color, line);
            self.advance(style.leading);
        }
    }

    pub fn finish(mut self) -> Vec<Canvas> {
        if !self.current.is_empty() || self.done.is_empty() {
            self.done.push(self.current);
        }
        self.done
    }
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapped text of one table cell.
#[derive(Clone, Debug)]
pub struct Cell {
    lines: Vec<String>,
    style: TextStyle,
    align: Align,
}

impl Cell {
    /// Wrap `text` to fit a column `column_width` points wide.
    pub fn new(text: &str, style: TextStyle, align: Align, column_width: f32) -> Self {
        Self {
            lines: wrap(text, style.font, style.size, column_width - 2.0 * PAD_X),
            style,
            align,
        }
    }

    fn height(&self) -> f32 {
        self.lines.len() as f32 * self.style.leading
    }
}

#[derive(Clone, Debug)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub background: Color,
}

impl Row {
    fn height(&self) -> f32 {
        let content = self.cells.iter().map(Cell::height).fold(0.0, f32::max);
        content + 2.0 * PAD_Y
    }
}

/// Stroke colour and width.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub width: f32,
    pub color: Color,
}

/// A horizontally centred table. The optional header row is repeated at
/// the top of every page the table spans.
#[derive(Clone, Debug)]
pub struct Table {
    pub columns: Vec<f32>,
    pub header: Option<Row>,
    pub rows: Vec<Row>,
    pub border: Rule,
    pub grid: Rule,
}

impl Table {
    pub fn width(&self) -> f32 {
        self.columns.iter().sum()
    }

    /// Height when drawn on a single page.
    pub fn height(&self) -> f32 {
        self.header.iter().chain(&self.rows).map(Row::height).sum()
    }

    pub fn draw(&self, flow: &mut Flow) {
        let left = MARGIN_X + (FRAME_WIDTH - self.width()) / 2.0;
        let header_height = self.header.as_ref().map_or(0.0, Row::height);
        let first_height = self.rows.first().map_or(0.0, Row::height);

        flow.ensure(header_height + first_height);
        let mut segment = Segment::start(flow.y);
        self.draw_header(flow, left, &mut segment);

        for row in &self.rows {
            let height = row.height();
            if height > flow.remaining() && segment.body_rows > 0 {
                self.close(flow, left, &segment);
                flow.new_page();
                segment = Segment::start(flow.y);
                self.draw_header(flow, left, &mut segment);
            }
            self.draw_row(flow, left, row);
            segment.push(flow.y, true);
        }

        self.close(flow, left, &segment);
    }

    fn draw_header(&self, flow: &mut Flow, left: f32, segment: &mut Segment) {
        if let Some(header) = &self.header {
            self.draw_row(flow, left, header);
            segment.push(flow.y, false);
        }
    }

    /// Fill and text of one row at the cursor; moves the cursor below it.
    fn draw_row(&self, flow: &mut Flow, left: f32, row: &Row) {
        let top = flow.y;
        let height = row.height();
        flow.current
            .fill_rect(left, top - height, self.width(), height, row.background);

        let mut x = left;
        for (cell, column) in row.cells.iter().zip(&self.columns) {
            let block_top = top - (height - cell.height()) / 2.0;
            let inner = column - 2.0 * PAD_X;
            for (i, line) in cell.lines.iter().enumerate() {
                let tx = cell.align.x(x + PAD_X, inner, cell.style.width(line));
                let ty = cell.style.baseline(block_top, i);
                let style = cell.style;
                flow.current
                    .text(tx, ty, style.font, style.size, style.color, line);
            }
            x += column;
        }

        flow.advance(height);
    }

    /// Grid and outer box for the rows drawn on the current page.
    fn close(&self, flow: &mut Flow, left: f32, segment: &Segment) {
        let bottom = flow.y;
        let height = segment.top - bottom;
        if height <= 0.0 {
            return;
        }
        let right = left + self.width();
        let canvas = &mut flow.current;

        // Row separators, excluding the outer edges.
        if let Some((_, inner)) = segment.boundaries.split_last() {
            for y in inner {
                canvas.line((left, *y), (right, *y), self.grid.width, self.grid.color);
            }
        }

        let mut x = left;
        if let Some((_, inner)) = self.columns.split_last() {
            for column in inner {
                x += column;
                canvas.line((x, segment.top), (x, bottom), self.grid.width, self.grid.color);
            }
        }

        canvas.stroke_rect(left, bottom, self.width(), height, self.border.width, self.border.color);
    }
}

/// Rows of a table drawn on one page.
struct Segment {
    top: f32,
    /// Bottom edge of every row drawn so far.
    boundaries: Vec<f32>,
    body_rows: usize,
}

impl Segment {
    fn start(top: f32) -> Self {
        Self {
            top,
            boundaries: Vec::new(),
            body_rows: 0,
        }
    }

    fn push(&mut self, bottom: f32, body: bool) {
        self.boundaries.push(bottom);
        if body {
            self.body_rows += 1;
        }
    }
}
