//! Live-preview configuration.
//!
//! Class names are plain strings handed to the host painter untouched. Hosts usually load
//! them together with the rest of their theme, so the whole configuration (de)serializes
//! with `serde` and every field falls back to its default when absent.

use serde::{Deserialize, Serialize};

/// Attribute carrying a link's resolved URL on link-text marks.
pub const DATA_URL_ATTRIBUTE: &str = "data-url";

/// When the `#` marker of a heading is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingReveal {
    /// Reveal while the cursor touches the marker span (its end included).
    #[default]
    Marker,
    /// Reveal while the cursor is anywhere on the heading's line.
    Line,
}

/// Visual class names emitted by the decoration builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    /// Low-emphasis styling for revealed markdown syntax.
    pub formatting_mark: String,
    /// Prefix of the per-level heading class (`heading-1` .. `heading-6`).
    pub heading_prefix: String,
    /// `**strong**` content.
    pub strong: String,
    /// `*emphasis*` content.
    pub emphasis: String,
    /// `~~strikethrough~~` content.
    pub strikethrough: String,
    /// `` `inline code` `` content.
    pub inline_code: String,
    /// Line decoration for every blockquote line.
    pub blockquote_line: String,
    /// Blockquote content after the `>` run.
    pub quote_text: String,
    /// Line decoration for every fenced code block line.
    pub code_block_line: String,
    /// Additional line decoration for fence lines.
    pub code_fence_line: String,
    /// Fenced code language tag.
    pub code_language: String,
    /// Line decoration for list item lines.
    pub list_line: String,
    /// Prefix of the nesting-depth class (`indent-0`, `indent-1`, ...).
    pub indent_prefix: String,
    /// Ordered list markers (`1.`), which stay visible.
    pub ordered_list_mark: String,
    /// Clickable link text and bare URLs.
    pub link: String,
    /// Bullet widget.
    pub bullet: String,
    /// Link-icon widget.
    pub link_icon: String,
    /// Horizontal-rule widget.
    pub horizontal_rule: String,
}

impl ClassNames {
    /// Heading class for `level` (clamped to 1-6).
    pub fn heading(&self, level: u8) -> String {
        format!("{}{}", self.heading_prefix, level.clamp(1, 6))
    }

    /// Nesting-depth class.
    pub fn indent(&self, depth: usize) -> String {
        format!("{}{}", self.indent_prefix, depth)
    }
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            formatting_mark: "formatting-mark".to_string(),
            heading_prefix: "heading-".to_string(),
            strong: "strong".to_string(),
            emphasis: "emphasis".to_string(),
            strikethrough: "strikethrough".to_string(),
            inline_code: "inline-code".to_string(),
            blockquote_line: "blockquote-line".to_string(),
            quote_text: "quote-text".to_string(),
            code_block_line: "code-block-line".to_string(),
            code_fence_line: "code-fence-line".to_string(),
            code_language: "code-language".to_string(),
            list_line: "list-line".to_string(),
            indent_prefix: "indent-".to_string(),
            ordered_list_mark: "ordered-list-mark".to_string(),
            link: "link".to_string(),
            bullet: "bullet".to_string(),
            link_icon: "link-icon".to_string(),
            horizontal_rule: "horizontal-rule".to_string(),
        }
    }
}

/// Configuration shared by the decoration builder and the selection layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivePreviewConfig {
    /// Class names handed to the painter.
    pub classes: ClassNames,
    /// Heading marker reveal policy.
    pub heading_reveal: HeadingReveal,
    /// Vertical distance (in pixels) above which two coordinates are on different visual rows.
    pub row_epsilon: f32,
}

impl Default for LivePreviewConfig {
    fn default() -> Self {
        Self {
            classes: ClassNames::default(),
            heading_reveal: HeadingReveal::default(),
            row_epsilon: 2.0,
        }
    }
}

impl LivePreviewConfig {
    /// Set the heading reveal policy.
    pub fn with_heading_reveal(mut self, reveal: HeadingReveal) -> Self {
        self.heading_reveal = reveal;
        self
    }

    /// Set the row epsilon used by the selection layer.
    pub fn with_row_epsilon(mut self, epsilon: f32) -> Self {
        self.row_epsilon = epsilon.max(0.0);
        self
    }
}
