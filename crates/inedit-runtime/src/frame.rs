#![forbid(unsafe_code)]

//! Frame: the render target handed to `Model::view`.
//!
//! A frame is a fixed-size grid of styled cells plus an optional cursor
//! position and a hit grid. Wide graphemes occupy their leading cell; the
//! cells they cover are stored as empty continuation cells.
//!
//! # Example
//! ```
//! use crossterm::style::ContentStyle;
//! use inedit_runtime::frame::Frame;
//!
//! let mut frame = Frame::new(10, 2);
//! frame.print(0, 0, "Room 1", ContentStyle::new());
//! assert_eq!(frame.row_text(0), "Room 1    ");
//! ```

use crossterm::style::ContentStyle;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Grapheme drawn here; empty for continuation cells.
    pub symbol: String,
    /// Style of the cell.
    pub style: ContentStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            symbol: " ".to_string(),
            style: ContentStyle::new(),
        }
    }
}

impl Cell {
    /// Whether this cell is covered by a wide grapheme to its left.
    pub fn is_continuation(&self) -> bool {
        self.symbol.is_empty()
    }
}

/// Rectangular region registered for pointer hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRegion {
    /// Left column.
    pub x: u16,
    /// Row.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
    /// Caller-chosen identifier.
    pub id: u64,
}

impl HitRegion {
    fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && u32::from(x) < u32::from(self.x) + u32::from(self.width)
            && u32::from(y) < u32::from(self.y) + u32::from(self.height)
    }
}

/// Fixed-size grid of styled cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    cursor: Option<(u16, u16)>,
    hits: Vec<HitRegion>,
}

impl Frame {
    /// Blank frame of `width` x `height` cells.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
            cursor: None,
            hits: Vec::new(),
        }
    }

    /// Width in columns.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Reset every cell, the cursor and the hit grid.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
        self.cursor = None;
        self.hits.clear();
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    /// Cell at `(x, y)`.
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable cell at `(x, y)`.
    pub fn cell_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    /// Draw `text` starting at `(x, y)`, clipped to the row.
    ///
    /// Control characters are skipped. Returns the number of columns
    /// written.
    pub fn print(&mut self, x: u16, y: u16, text: &str, style: ContentStyle) -> u16 {
        self.print_clipped(x, y, text, style, u16::MAX)
    }

    /// Like [`print`](Self::print), but writes at most `max_width` columns.
    pub fn print_clipped(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        style: ContentStyle,
        max_width: u16,
    ) -> u16 {
        if y >= self.height {
            return 0;
        }
        let limit = u32::from(self.width).min(u32::from(x) + u32::from(max_width));
        let mut col = x;
        for g in text.graphemes(true) {
            if g.chars().any(char::is_control) {
                continue;
            }
            let w = UnicodeWidthStr::width(g).max(1) as u16;
            if u32::from(col) + u32::from(w) > limit {
                break;
            }
            if let Some(cell) = self.cell_mut(col, y) {
                cell.symbol = g.to_string();
                cell.style = style;
            }
            for extra in 1..w {
                if let Some(cell) = self.cell_mut(col + extra, y) {
                    cell.symbol.clear();
                    cell.style = style;
                }
            }
            col += w;
        }
        col - x
    }

    /// Restyle `width` cells starting at `(x, y)` without changing symbols.
    pub fn set_style(&mut self, x: u16, y: u16, width: u16, style: ContentStyle) {
        for dx in 0..width {
            let Some(col) = x.checked_add(dx) else { break };
            if let Some(cell) = self.cell_mut(col, y) {
                cell.style = style;
            }
        }
    }

    /// Place (or hide, with `None`) the terminal cursor.
    pub fn set_cursor(&mut self, position: Option<(u16, u16)>) {
        self.cursor = position.filter(|&(x, y)| x < self.width && y < self.height);
    }

    /// Cursor position, if shown.
    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    /// Register a hit region. Later registrations win where regions overlap.
    pub fn register_hit(&mut self, region: HitRegion) {
        self.hits.push(region);
    }

    /// Identifier of the topmost region containing `(x, y)`.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<u64> {
        self.hits
            .iter()
            .rev()
            .find(|region| region.contains(x, y))
            .map(|region| region.id)
    }

    /// Text of row `y`, continuation cells omitted.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = usize::from(y) * usize::from(self.width);
        self.cells[start..start + usize::from(self.width)]
            .iter()
            .map(|cell| cell.symbol.as_str())
            .collect()
    }

    /// Whole frame as text, one line per row, trailing spaces trimmed.
    pub fn to_text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_text(y).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::style::{Attribute, Color};

    #[test]
    fn new_frame_is_blank() {
        let frame = Frame::new(4, 2);
        assert_eq!(frame.row_text(0), "    ");
        assert_eq!(frame.cursor(), None);
        assert!(frame.cell(4, 0).is_none());
    }

    #[test]
    fn print_clips_at_edge() {
        let mut frame = Frame::new(5, 1);
        let written = frame.print(2, 0, "Room 1", ContentStyle::new());
        assert_eq!(written, 3);
        assert_eq!(frame.row_text(0), "  Roo");
    }

    #[test]
    fn print_clipped_respects_max_width() {
        let mut frame = Frame::new(10, 1);
        assert_eq!(frame.print_clipped(1, 0, "Room 12", ContentStyle::new(), 4), 4);
        assert_eq!(frame.row_text(0), " Room     ");
        assert_eq!(frame.print_clipped(0, 0, "会议", ContentStyle::new(), 3), 2);
    }

    #[test]
    fn wide_graphemes_take_two_cells() {
        let mut frame = Frame::new(6, 1);
        let written = frame.print(0, 0, "会议", ContentStyle::new());
        assert_eq!(written, 4);
        assert!(frame.cell(1, 0).unwrap().is_continuation());
        assert_eq!(frame.row_text(0), "会议  ");
    }

    #[test]
    fn wide_grapheme_not_split_at_edge() {
        let mut frame = Frame::new(3, 1);
        assert_eq!(frame.print(0, 0, "a会议", ContentStyle::new()), 3);
        assert_eq!(frame.row_text(0), "a会");
    }

    #[test]
    fn set_style_keeps_symbols() {
        let mut frame = Frame::new(4, 1);
        frame.print(0, 0, "abcd", ContentStyle::new());
        let mut style = ContentStyle::new();
        style.foreground_color = Some(Color::Red);
        style.attributes.set(Attribute::Reverse);
        frame.set_style(1, 0, 2, style);
        assert_eq!(frame.row_text(0), "abcd");
        assert_eq!(frame.cell(1, 0).unwrap().style, style);
        assert_eq!(frame.cell(3, 0).unwrap().style, ContentStyle::new());
    }

    #[test]
    fn cursor_outside_frame_is_hidden() {
        let mut frame = Frame::new(4, 1);
        frame.set_cursor(Some((9, 0)));
        assert_eq!(frame.cursor(), None);
        frame.set_cursor(Some((3, 0)));
        assert_eq!(frame.cursor(), Some((3, 0)));
    }

    #[test]
    fn hit_test_prefers_latest_region() {
        let mut frame = Frame::new(20, 5);
        frame.register_hit(HitRegion {
            x: 0,
            y: 1,
            width: 10,
            height: 1,
            id: 1,
        });
        frame.register_hit(HitRegion {
            x: 5,
            y: 1,
            width: 10,
            height: 1,
            id: 2,
        });
        assert_eq!(frame.hit_test(2, 1), Some(1));
        assert_eq!(frame.hit_test(7, 1), Some(2));
        assert_eq!(frame.hit_test(7, 2), None);
        frame.clear();
        assert_eq!(frame.hit_test(2, 1), None);
    }
}
