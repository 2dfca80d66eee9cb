//! Headless geometry: the coordinate-mapping seam and a monospace reference layout.
//!
//! The selection layer never measures text itself. It asks a [`LayoutView`] where offsets land
//! on screen, which is exactly what a host framework exposes. [`GridLayout`] is a headless
//! implementation: every character occupies a fixed number of cells (UAX #11 widths, tab
//! expansion) and lines soft-wrap at a fixed cell width.

use crate::document::Document;
use std::ops::Range;
use unicode_width::UnicodeWidthChar;

/// Default tab width (in cells).
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Soft wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// No soft wrapping.
    None,
    /// Wrap at character boundaries.
    #[default]
    Char,
    /// Prefer wrapping after whitespace, falling back to character wrap.
    Word,
}

/// A screen rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl Rect {
    /// Rectangle from its four edges.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal extent.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Which way a probe leans when an offset sits on a visual row boundary.
///
/// At a soft-wrap point the same offset is both the end of one row (`Before`) and the start of
/// the next (`After`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Associate with the preceding character.
    Before,
    /// Associate with the following character.
    After,
}

/// Coordinate mapping supplied by the host.
pub trait LayoutView {
    /// Caret rectangle at `offset`, or `None` when the position is not laid out.
    fn coords_at_pos(&self, offset: usize, side: Side) -> Option<Rect>;

    /// Bounding box of the content area in the same coordinate space.
    fn content_rect(&self) -> Rect;
}

/// Visual width of a character (UAX #11). Control characters count as one cell.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Width of `ch` placed at `cell_offset` within its line; tabs advance to the next stop.
pub fn cell_width_at(ch: char, cell_offset: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        tab_width - cell_offset % tab_width
    } else {
        char_width(ch)
    }
}

/// Total visual width of a string, with tab expansion.
pub fn str_width(s: &str, tab_width: usize) -> usize {
    s.chars()
        .fold(0, |x, ch| x.saturating_add(cell_width_at(ch, x, tab_width)))
}

/// Byte offsets (relative to `text`) where soft-wrapped rows begin.
pub fn wrap_points(text: &str, width: usize, tab_width: usize, mode: WrapMode) -> Vec<usize> {
    if width == 0 {
        return Vec::new();
    }
    match mode {
        WrapMode::None => Vec::new(),
        WrapMode::Char => char_wrap_points(text, width, tab_width),
        WrapMode::Word => word_wrap_points(text, width, tab_width),
    }
}

fn char_wrap_points(text: &str, width: usize, tab_width: usize) -> Vec<usize> {
    let mut points = Vec::new();
    let mut x_in_row = 0usize;
    let mut x_in_line = 0usize;

    for (byte, ch) in text.char_indices() {
        let w = cell_width_at(ch, x_in_line, tab_width);
        // A wide character that does not fit moves to the next row whole.
        if x_in_row > 0 && x_in_row + w > width {
            points.push(byte);
            x_in_row = 0;
        }
        x_in_row += w;
        x_in_line += w;
    }
    points
}

fn word_wrap_points(text: &str, width: usize, tab_width: usize) -> Vec<usize> {
    let mut points = Vec::new();
    let mut row_start = 0usize;
    let mut row_start_x = 0usize;
    // (byte offset, line x) just after the last whitespace in the current row
    let mut last_break: Option<(usize, usize)> = None;
    let mut x_in_line = 0usize;

    for (byte, ch) in text.char_indices() {
        let w = cell_width_at(ch, x_in_line, tab_width);

        if byte > row_start && x_in_line - row_start_x + w > width {
            match last_break {
                Some((break_byte, break_x)) if break_byte > row_start && !ch.is_whitespace() => {
                    points.push(break_byte);
                    row_start = break_byte;
                    row_start_x = break_x;
                }
                _ => {
                    points.push(byte);
                    row_start = byte;
                    row_start_x = x_in_line;
                }
            }
            last_break = None;
        }

        x_in_line += w;
        if ch.is_whitespace() {
            last_break = Some((byte + ch.len_utf8(), x_in_line));
        }
    }
    points
}

#[derive(Debug, Clone)]
struct LaidOutLine {
    from: usize,
    text: String,
    /// Absolute byte offsets where continuation rows begin.
    wraps: Vec<usize>,
    /// Column before each byte of `text`, plus one entry for the end of the line.
    columns: Vec<usize>,
    first_row: usize,
}

/// Cell column before every byte of `text`. Bytes inside a character repeat the column of the
/// character's first byte.
fn prefix_columns(text: &str, tab_width: usize) -> Vec<usize> {
    let mut columns = Vec::with_capacity(text.len() + 1);
    let mut col = 0usize;
    for ch in text.chars() {
        columns.extend(std::iter::repeat_n(col, ch.len_utf8()));
        col += cell_width_at(ch, col, tab_width);
    }
    columns.push(col);
    columns
}

impl LaidOutLine {
    /// Column of absolute `offset`, measured from the start of the logical line.
    fn column_at(&self, offset: usize) -> usize {
        self.columns
            .get(offset - self.from)
            .copied()
            .unwrap_or_default()
    }

    fn row_count(&self) -> usize {
        self.wraps.len() + 1
    }

    /// Row index within the line and the byte offset where that row starts.
    fn row_of(&self, offset: usize, side: Side) -> (usize, usize) {
        let row = match side {
            Side::After => self.wraps.partition_point(|&w| w <= offset),
            Side::Before => self.wraps.partition_point(|&w| w < offset),
        };
        let start = if row == 0 {
            self.from
        } else {
            self.wraps[row - 1]
        };
        (row, start)
    }
}

/// Monospace soft-wrapping layout over a [`Document`].
#[derive(Debug, Clone)]
pub struct GridLayout {
    lines: Vec<LaidOutLine>,
    doc_len: usize,
    cell_width: f32,
    cell_height: f32,
    width_cells: usize,
    tab_width: usize,
    wrap_mode: WrapMode,
    origin: (f32, f32),
    scroll_top: f32,
    visible_lines: Option<Range<usize>>,
}

impl GridLayout {
    /// Lay out `doc` with `width_cells` columns of `cell_width` x `cell_height` pixels.
    pub fn new(doc: &Document, width_cells: usize, cell_width: f32, cell_height: f32) -> Self {
        let mut layout = Self {
            lines: Vec::new(),
            doc_len: doc.len(),
            cell_width,
            cell_height,
            width_cells,
            tab_width: DEFAULT_TAB_WIDTH,
            wrap_mode: WrapMode::Char,
            origin: (0.0, 0.0),
            scroll_top: 0.0,
            visible_lines: None,
        };
        layout.relayout(doc);
        layout
    }

    /// Change the wrap mode (relayouts).
    pub fn with_wrap_mode(mut self, doc: &Document, mode: WrapMode) -> Self {
        self.wrap_mode = mode;
        self.relayout(doc);
        self
    }

    /// Change the tab width (relayouts).
    pub fn with_tab_width(mut self, doc: &Document, tab_width: usize) -> Self {
        self.tab_width = tab_width.max(1);
        self.relayout(doc);
        self
    }

    /// Position of the content area's top-left corner in viewport coordinates.
    pub fn with_origin(mut self, left: f32, top: f32) -> Self {
        self.origin = (left, top);
        self
    }

    /// Vertical scroll offset in pixels.
    pub fn set_scroll_top(&mut self, scroll_top: f32) {
        self.scroll_top = scroll_top.max(0.0);
    }

    /// Restrict laid-out lines to `lines` (0-based, end exclusive); other lines report no
    /// coordinates, like a virtualized host viewport.
    pub fn set_visible_lines(&mut self, lines: Option<Range<usize>>) {
        self.visible_lines = lines;
    }

    /// Total number of visual rows.
    pub fn visual_row_count(&self) -> usize {
        self.lines
            .last()
            .map_or(0, |line| line.first_row + line.row_count())
    }

    /// Number of visual rows of logical line `number`.
    pub fn rows_in_line(&self, number: usize) -> Option<usize> {
        self.lines.get(number).map(LaidOutLine::row_count)
    }

    fn relayout(&mut self, doc: &Document) {
        self.doc_len = doc.len();
        self.lines.clear();
        let mut first_row = 0usize;
        for number in 0..doc.line_count() {
            let Some(line) = doc.line(number) else {
                break;
            };
            let text = doc
                .slice(line.from, line.to)
                .map(|s| s.into_owned())
                .unwrap_or_default();
            let wraps: Vec<usize> =
                wrap_points(&text, self.width_cells, self.tab_width, self.wrap_mode)
                    .into_iter()
                    .map(|w| line.from + w)
                    .collect();
            let columns = prefix_columns(&text, self.tab_width);
            let laid_out = LaidOutLine {
                from: line.from,
                text,
                wraps,
                columns,
                first_row,
            };
            first_row += laid_out.row_count();
            self.lines.push(laid_out);
        }
    }

    fn line_index_at(&self, offset: usize) -> usize {
        self.lines
            .partition_point(|line| line.from <= offset)
            .saturating_sub(1)
    }

    fn row_top(&self, row: usize) -> f32 {
        self.origin.1 + row as f32 * self.cell_height - self.scroll_top
    }
}

impl LayoutView for GridLayout {
    fn coords_at_pos(&self, offset: usize, side: Side) -> Option<Rect> {
        if offset > self.doc_len {
            return None;
        }
        let index = self.line_index_at(offset);
        if let Some(visible) = &self.visible_lines
            && !visible.contains(&index)
        {
            return None;
        }
        let line = self.lines.get(index)?;
        let rel = offset.checked_sub(line.from)?;
        if rel > line.text.len() || !line.text.is_char_boundary(rel) {
            return None;
        }

        let (row, row_start) = line.row_of(offset, side);
        // Tab stops are measured from the start of the logical line.
        let x_cells = line.column_at(offset) - line.column_at(row_start);

        let left = self.origin.0 + x_cells as f32 * self.cell_width;
        let top = self.row_top(line.first_row + row);
        Some(Rect::new(left, top, left, top + self.cell_height))
    }

    fn content_rect(&self) -> Rect {
        let top = self.origin.1 - self.scroll_top;
        Rect::new(
            self.origin.0,
            top,
            self.origin.0 + self.width_cells as f32 * self.cell_width,
            top + self.visual_row_count() as f32 * self.cell_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('你'), 2);
        assert_eq!(char_width('\u{0301}'), 0);
        assert_eq!(cell_width_at('\t', 1, 4), 3);
        assert_eq!(str_width("a\tb", 4), 5);
    }

    #[test]
    fn test_char_wrap_points() {
        assert_eq!(wrap_points("hello world", 5, 4, WrapMode::Char), vec![5, 10]);
        assert!(wrap_points("hello", 5, 4, WrapMode::Char).is_empty());
        assert!(wrap_points("hello world", 5, 4, WrapMode::None).is_empty());
    }

    #[test]
    fn test_wide_char_moves_whole() {
        // "你好你" is 6 cells; width 5 cannot split the third character.
        assert_eq!(wrap_points("你好你", 5, 4, WrapMode::Char), vec![6]);
    }

    #[test]
    fn test_word_wrap_points() {
        assert_eq!(wrap_points("hello world", 8, 4, WrapMode::Word), vec![6]);
        // A word longer than the row falls back to character wrapping.
        assert_eq!(wrap_points("abcdefghij", 4, 4, WrapMode::Word), vec![4, 8]);
    }

    #[test]
    fn test_prefix_columns_match_str_width() {
        let text = "a\t你b";
        let columns = prefix_columns(text, 4);
        assert_eq!(columns.len(), text.len() + 1);
        for (byte, _) in text.char_indices().chain([(text.len(), ' ')]) {
            assert_eq!(columns[byte], str_width(&text[..byte], 4), "byte {byte}");
        }
    }

    #[test]
    fn test_coords_after_tab_and_wide_char() {
        let doc = Document::new("a\t你b");
        let layout = GridLayout::new(&doc, 80, 10.0, 20.0);
        // 'a' then a tab to column 4, then a two-cell character.
        assert_eq!(layout.coords_at_pos(2, Side::After).unwrap().left, 40.0);
        assert_eq!(layout.coords_at_pos(5, Side::After).unwrap().left, 60.0);
    }

    #[test]
    fn test_coords_on_wrap_boundary() {
        let doc = Document::new("abcdefgh");
        let layout = GridLayout::new(&doc, 4, 10.0, 20.0);
        assert_eq!(layout.visual_row_count(), 2);

        let end_of_row = layout.coords_at_pos(4, Side::Before).unwrap();
        assert_eq!((end_of_row.left, end_of_row.top), (40.0, 0.0));
        let start_of_row = layout.coords_at_pos(4, Side::After).unwrap();
        assert_eq!((start_of_row.left, start_of_row.top), (0.0, 20.0));
    }

    #[test]
    fn test_coords_across_lines_and_scroll() {
        let doc = Document::new("ab\ncd");
        let mut layout = GridLayout::new(&doc, 10, 8.0, 16.0).with_origin(5.0, 100.0);
        let rect = layout.coords_at_pos(4, Side::After).unwrap();
        assert_eq!((rect.left, rect.top, rect.height()), (13.0, 116.0, 16.0));

        layout.set_scroll_top(16.0);
        let rect = layout.coords_at_pos(4, Side::After).unwrap();
        assert_eq!(rect.top, 100.0);
        assert_eq!(layout.content_rect().top, 84.0);
    }

    #[test]
    fn test_offscreen_lines_have_no_coords() {
        let doc = Document::new("one\ntwo\nthree");
        let mut layout = GridLayout::new(&doc, 10, 8.0, 16.0);
        layout.set_visible_lines(Some(1..2));
        assert!(layout.coords_at_pos(0, Side::After).is_none());
        assert!(layout.coords_at_pos(5, Side::After).is_some());
        assert!(layout.coords_at_pos(9, Side::After).is_none());
        assert!(layout.coords_at_pos(99, Side::After).is_none());
    }
}
