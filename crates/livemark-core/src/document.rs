//! Read-only document buffer.
//!
//! Wraps a [`Rope`] and answers the line/offset questions the decoration builder and the
//! selection layer ask on every rebuild. All offsets are byte offsets into the UTF-8 text,
//! matching the spans carried by [`SyntaxTree`](crate::syntax::SyntaxTree) nodes.

use ropey::Rope;
use std::borrow::Cow;

/// A logical (unwrapped) document line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Line {
    /// Zero-based line number.
    pub number: usize,
    /// Byte offset of the first character of the line.
    pub from: usize,
    /// Byte offset just past the last character, excluding the line break.
    pub to: usize,
}

impl Line {
    /// Byte length of the line content.
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    /// Whether the line has no content.
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Whether `offset` lies on this line (the end of the line counts).
    pub fn contains(&self, offset: usize) -> bool {
        self.from <= offset && offset <= self.to
    }
}

/// Immutable, line-addressable text buffer.
#[derive(Debug, Clone, Default)]
pub struct Document {
    rope: Rope,
}

impl Document {
    /// Build a document from text.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Number of lines (an empty document has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Look up a line by its zero-based number.
    pub fn line(&self, number: usize) -> Option<Line> {
        if number >= self.rope.len_lines() {
            return None;
        }

        let from = self.rope.line_to_byte(number);
        let slice = self.rope.line(number);
        let mut content_len = slice.len_bytes();

        // Rope lines include their terminator.
        let mut chars = slice.chars_at(slice.len_chars());
        while let Some(ch) = chars.prev() {
            if is_line_break(ch) {
                content_len -= ch.len_utf8();
            } else {
                break;
            }
        }

        Some(Line {
            number,
            from,
            to: from + content_len,
        })
    }

    /// Look up the line containing `offset`. Offsets past the end resolve to the last line.
    pub fn line_at(&self, offset: usize) -> Line {
        let offset = offset.min(self.rope.len_bytes());
        let number = self.rope.byte_to_line(offset);
        self.line(number).unwrap_or(Line {
            number,
            from: offset,
            to: offset,
        })
    }

    /// Extract `[from, to)`.
    ///
    /// Returns `None` when the range is inverted, out of bounds, or splits a character.
    pub fn slice(&self, from: usize, to: usize) -> Option<Cow<'_, str>> {
        if from > to {
            return None;
        }
        self.rope.get_byte_slice(from..to).map(Cow::from)
    }

    /// Byte at `offset`, if it is ASCII.
    ///
    /// Marker detection only ever looks for ASCII punctuation, so this avoids building slices.
    pub fn ascii_at(&self, offset: usize) -> Option<u8> {
        if offset >= self.rope.len_bytes() {
            return None;
        }
        let byte = self.rope.byte(offset);
        byte.is_ascii().then_some(byte)
    }

    /// Get the complete text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}
