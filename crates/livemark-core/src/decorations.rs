//! Decoration data model.
//!
//! Decorations are paint instructions anchored to byte offsets of the document. They never modify
//! the text: a [`DecorationSpec::Hide`] removes a span from the rendered view, a mark styles it, a
//! line decoration styles a whole line and a widget inserts (or replaces a span with) a stand-in.
//!
//! A [`DecorationSet`] is immutable and strictly ordered by `(from, start_side, to)`. The only way
//! to build one is through [`DecorationSetBuilder`], which rejects out-of-order input instead of
//! re-sorting it.

use crate::config::DATA_URL_ATTRIBUTE;
use crate::widgets::Widget;
use thiserror::Error;

/// Tie-break rank of line decorations.
pub const LINE_SIDE: i32 = -3;
/// Tie-break rank of hide/replace decorations.
pub const REPLACE_SIDE: i32 = -2;
/// Tie-break rank of marks.
pub const MARK_SIDE: i32 = 0;

/// Which side of its anchor a point widget is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetSide {
    /// Before content at the same offset.
    Before,
    /// After content at the same offset.
    After,
}

impl WidgetSide {
    fn rank(self) -> i32 {
        match self {
            Self::Before => -1,
            Self::After => 1,
        }
    }
}

/// What a decoration does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecorationSpec {
    /// Remove the span from the rendered view.
    Hide,
    /// Style the span without altering it.
    Mark {
        /// Space-separated class list.
        class: String,
        /// Extra attributes for the span's element.
        attributes: Vec<(String, String)>,
    },
    /// Style the whole line starting at the anchor.
    Line {
        /// Space-separated class list.
        class: String,
    },
    /// Insert a widget at a point.
    Widget {
        /// The stand-in.
        widget: Widget,
        /// Side relative to content at the same offset.
        side: WidgetSide,
    },
    /// Replace the span with a widget.
    Replace {
        /// The stand-in.
        widget: Widget,
    },
}

/// A single decoration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decoration {
    /// Start offset (inclusive).
    pub from: usize,
    /// End offset (exclusive). Equal to `from` for line and point-widget decorations.
    pub to: usize,
    /// Effect.
    pub spec: DecorationSpec,
}

impl Decoration {
    /// Hide `[from, to)`.
    pub fn hide(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            spec: DecorationSpec::Hide,
        }
    }

    /// Style `[from, to)` with `class`.
    pub fn mark(from: usize, to: usize, class: impl Into<String>) -> Self {
        Self {
            from,
            to,
            spec: DecorationSpec::Mark {
                class: class.into(),
                attributes: Vec::new(),
            },
        }
    }

    /// Style `[from, to)` as a link to `url`.
    pub fn link(from: usize, to: usize, class: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            from,
            to,
            spec: DecorationSpec::Mark {
                class: class.into(),
                attributes: vec![(DATA_URL_ATTRIBUTE.to_string(), url.into())],
            },
        }
    }

    /// Style the line starting at `line_start`.
    pub fn line(line_start: usize, class: impl Into<String>) -> Self {
        Self {
            from: line_start,
            to: line_start,
            spec: DecorationSpec::Line {
                class: class.into(),
            },
        }
    }

    /// Insert `widget` at `at`.
    pub fn widget(at: usize, widget: Widget, side: WidgetSide) -> Self {
        Self {
            from: at,
            to: at,
            spec: DecorationSpec::Widget { widget, side },
        }
    }

    /// Replace `[from, to)` with `widget`.
    pub fn replace(from: usize, to: usize, widget: Widget) -> Self {
        Self {
            from,
            to,
            spec: DecorationSpec::Replace { widget },
        }
    }

    /// Tie-break rank for decorations starting at the same offset.
    pub fn start_side(&self) -> i32 {
        match &self.spec {
            DecorationSpec::Line { .. } => LINE_SIDE,
            DecorationSpec::Hide | DecorationSpec::Replace { .. } => REPLACE_SIDE,
            DecorationSpec::Mark { .. } => MARK_SIDE,
            DecorationSpec::Widget { side, .. } => side.rank(),
        }
    }

    /// The `(from, side, to)` ordering key.
    pub fn sort_key(&self) -> (usize, i32, usize) {
        (self.from, self.start_side(), self.to)
    }

    /// Whether this decoration removes its span from view (hide or widget replacement).
    pub fn is_replace(&self) -> bool {
        matches!(
            self.spec,
            DecorationSpec::Hide | DecorationSpec::Replace { .. }
        )
    }

    /// Whether this decoration must be zero-width.
    pub fn is_point(&self) -> bool {
        matches!(
            self.spec,
            DecorationSpec::Line { .. } | DecorationSpec::Widget { .. }
        )
    }

    /// Class list of a mark or line decoration.
    pub fn class(&self) -> Option<&str> {
        match &self.spec {
            DecorationSpec::Mark { class, .. } | DecorationSpec::Line { class } => Some(class),
            _ => None,
        }
    }

    /// Whether the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.class()
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Value of a mark attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match &self.spec {
            DecorationSpec::Mark { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Widget carried by a widget or replace decoration.
    pub fn widget_ref(&self) -> Option<&Widget> {
        match &self.spec {
            DecorationSpec::Widget { widget, .. } | DecorationSpec::Replace { widget } => {
                Some(widget)
            }
            _ => None,
        }
    }
}

/// Errors raised while assembling a [`DecorationSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecorationError {
    /// A decoration sorts before the one added previously.
    #[error(
        "decoration {from}..{to} (side {side}) added after {prev_from}..{prev_to} (side {prev_side})"
    )]
    OutOfOrder {
        /// Start of the rejected decoration.
        from: usize,
        /// Side of the rejected decoration.
        side: i32,
        /// End of the rejected decoration.
        to: usize,
        /// Start of the previous decoration.
        prev_from: usize,
        /// Side of the previous decoration.
        prev_side: i32,
        /// End of the previous decoration.
        prev_to: usize,
    },
    /// `from > to`.
    #[error("decoration range {from}..{to} is inverted")]
    InvertedRange {
        /// Range start.
        from: usize,
        /// Range end.
        to: usize,
    },
    /// A line or point-widget decoration with a non-empty range.
    #[error("point decoration must be zero-width, got {from}..{to}")]
    NotAPoint {
        /// Range start.
        from: usize,
        /// Range end.
        to: usize,
    },
}

/// An immutable, ordered collection of decorations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of decorations.
    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    /// Iterate in `(from, side, to)` order.
    pub fn iter(&self) -> std::slice::Iter<'_, Decoration> {
        self.decorations.iter()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Decorations touching `[from, to]` (point decorations at either end included).
    pub fn between(&self, from: usize, to: usize) -> impl Iterator<Item = &Decoration> {
        self.decorations
            .iter()
            .take_while(move |d| d.from <= to)
            .filter(move |d| d.to >= from)
    }

    /// URL of the link mark covering `pos`, if any.
    pub fn link_url_at(&self, pos: usize) -> Option<&str> {
        self.decorations
            .iter()
            .take_while(|d| d.from <= pos)
            .filter(|d| d.from <= pos && pos < d.to)
            .find_map(|d| d.attribute(DATA_URL_ATTRIBUTE))
    }

    /// First pair of decorations violating the non-overlap invariant.
    ///
    /// Two hide/replace ranges may never overlap, and a mark overlapping a hide/replace range
    /// must contain it entirely (styling around hidden syntax is fine, styling text that is
    /// itself hidden is not). Quadratic in the worst case.
    pub fn find_conflict(&self) -> Option<(&Decoration, &Decoration)> {
        for (i, hidden) in self.decorations.iter().enumerate() {
            if !hidden.is_replace() || hidden.from == hidden.to {
                continue;
            }
            for (j, other) in self.decorations.iter().enumerate() {
                if other.from >= hidden.to {
                    break;
                }
                if i == j || other.is_point() || other.to <= hidden.from {
                    continue;
                }
                let contains = other.from <= hidden.from && hidden.to <= other.to;
                if other.is_replace() || !contains {
                    return Some((hidden, other));
                }
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a DecorationSet {
    type Item = &'a Decoration;
    type IntoIter = std::slice::Iter<'a, Decoration>;

    fn into_iter(self) -> Self::IntoIter {
        self.decorations.iter()
    }
}

/// Assembles a [`DecorationSet`] from decorations supplied in order.
#[derive(Debug, Default)]
pub struct DecorationSetBuilder {
    decorations: Vec<Decoration>,
}

impl DecorationSetBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with room for `capacity` decorations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            decorations: Vec::with_capacity(capacity),
        }
    }

    /// Append a decoration.
    ///
    /// Fails when the decoration sorts before the previous one; the builder is left unchanged.
    pub fn add(&mut self, decoration: Decoration) -> Result<(), DecorationError> {
        if decoration.from > decoration.to {
            return Err(DecorationError::InvertedRange {
                from: decoration.from,
                to: decoration.to,
            });
        }
        if decoration.is_point() && decoration.from != decoration.to {
            return Err(DecorationError::NotAPoint {
                from: decoration.from,
                to: decoration.to,
            });
        }
        if let Some(prev) = self.decorations.last()
            && decoration.sort_key() < prev.sort_key()
        {
            return Err(DecorationError::OutOfOrder {
                from: decoration.from,
                side: decoration.start_side(),
                to: decoration.to,
                prev_from: prev.from,
                prev_side: prev.start_side(),
                prev_to: prev.to,
            });
        }

        self.decorations.push(decoration);
        Ok(())
    }

    /// Number of decorations added so far.
    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    /// Whether nothing was added yet.
    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    /// Freeze into a set.
    pub fn finish(self) -> DecorationSet {
        DecorationSet {
            decorations: self.decorations,
        }
    }
}
