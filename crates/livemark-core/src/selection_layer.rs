//! Text-accurate selection rectangles.
//!
//! Native selection painting extends wrapped rows to the full line width. This layer instead
//! emits one rectangle per visual row segment actually covered by the selection, measured
//! through the host's [`LayoutView`].

use crate::config::LivePreviewConfig;
use crate::document::Document;
use crate::layout::{LayoutView, Rect, Side};
use crate::selection::EditorSelection;

/// Theme rule that turns off the host's native selection highlight so it never doubles up with
/// the rectangles painted from [`SelectionLayer::markers`].
pub const SUPPRESS_NATIVE_SELECTION_CSS: &str = "\
.cm-content ::selection, .cm-line::selection, .cm-selectionBackground {
  background: transparent !important;
}";

/// One selection rectangle, relative to the content area's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

/// Computes [`SelectionRect`]s from a selection and a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionLayer {
    row_epsilon: f32,
}

impl Default for SelectionLayer {
    fn default() -> Self {
        Self::new(LivePreviewConfig::default().row_epsilon)
    }
}

impl SelectionLayer {
    /// A layer treating tops closer than `row_epsilon` pixels as the same visual row.
    pub fn new(row_epsilon: f32) -> Self {
        Self {
            row_epsilon: row_epsilon.max(0.0),
        }
    }

    /// Row threshold in pixels.
    pub fn row_epsilon(&self) -> f32 {
        self.row_epsilon
    }

    /// Rectangles covering every non-empty range of `selection`.
    ///
    /// Positions the view cannot map (offscreen, not laid out) are skipped, so the result may
    /// cover only part of a selection.
    pub fn markers(
        &self,
        doc: &Document,
        selection: &EditorSelection,
        view: &dyn LayoutView,
    ) -> Vec<SelectionRect> {
        let content = view.content_rect();
        let mut rects = Vec::new();

        for range in selection.ranges().iter().filter(|r| !r.is_empty()) {
            let from = range.from().min(doc.len());
            let to = range.to().min(doc.len());
            let first = doc.line_at(from).number;
            let last = doc.line_at(to).number;

            for number in first..=last {
                let Some(line) = doc.line(number) else {
                    continue;
                };
                let start = from.max(line.from);
                let end = to.min(line.to);
                if start >= end {
                    continue;
                }
                self.line_segments(doc, start, end, view, &content, &mut rects);
            }
        }

        tracing::trace!(rects = rects.len(), "selection markers computed");
        rects
    }

    fn line_segments(
        &self,
        doc: &Document,
        start: usize,
        end: usize,
        view: &dyn LayoutView,
        content: &Rect,
        out: &mut Vec<SelectionRect>,
    ) {
        let (Some(head), Some(tail)) = (
            view.coords_at_pos(start, Side::After),
            view.coords_at_pos(end, Side::Before),
        ) else {
            return;
        };

        if self.same_row(&head, &tail) {
            out.push(relative(content, &head, tail.left));
            return;
        }

        let mut row_head = head;
        let mut pos = start;
        while let Some(next) = next_boundary(doc, pos, end) {
            pos = next;
            if pos == end {
                break;
            }
            let Some(after) = view.coords_at_pos(pos, Side::After) else {
                continue;
            };
            if self.same_row(&row_head, &after) {
                continue;
            }
            if let Some(before) = view.coords_at_pos(pos, Side::Before) {
                out.push(relative(content, &row_head, before.left));
            }
            row_head = after;
        }
        out.push(relative(content, &row_head, tail.left));
    }

    fn same_row(&self, a: &Rect, b: &Rect) -> bool {
        (a.top - b.top).abs() <= self.row_epsilon
    }
}

fn relative(content: &Rect, row_head: &Rect, right: f32) -> SelectionRect {
    SelectionRect {
        left: row_head.left - content.left,
        top: row_head.top - content.top,
        width: (right - row_head.left).max(0.0),
        height: row_head.height(),
    }
}

/// Next char boundary after `pos`, capped at `end`.
fn next_boundary(doc: &Document, pos: usize, end: usize) -> Option<usize> {
    if pos >= end {
        return None;
    }
    let mut next = pos + 1;
    while next < end && doc.slice(pos, next).is_none() {
        next += 1;
    }
    Some(next.min(end))
}
