//! Per-editor live-preview context.
//!
//! A [`LivePreview`] is owned by one editor instance and wires the host's update cycle to the
//! decoration builder and the selection layer. It carries configuration only; every call
//! recomputes its output from the inputs it is given.

use crate::builder::DecorationBuilder;
use crate::config::LivePreviewConfig;
use crate::decorations::DecorationSet;
use crate::document::Document;
use crate::layout::LayoutView;
use crate::selection::EditorSelection;
use crate::selection_layer::{SelectionLayer, SelectionRect};
use crate::syntax::{SyntaxSource, SyntaxTree};
use crate::widgets::ExternalOpener;
use std::ops::Range;

/// What changed in the host since the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewUpdate {
    /// The document text changed.
    pub doc_changed: bool,
    /// The selection (or cursor) was set.
    pub selection_set: bool,
    /// The visible range moved or the layout changed.
    pub viewport_changed: bool,
}

impl ViewUpdate {
    /// Whether decorations and selection markers must be recomputed.
    pub fn needs_rebuild(&self) -> bool {
        self.doc_changed || self.selection_set || self.viewport_changed
    }
}

/// Live preview for one editor.
#[derive(Debug, Clone)]
pub struct LivePreview {
    builder: DecorationBuilder,
    selection_layer: SelectionLayer,
}

impl Default for LivePreview {
    fn default() -> Self {
        Self::new(LivePreviewConfig::default())
    }
}

impl LivePreview {
    /// Create the preview for one editor.
    pub fn new(config: LivePreviewConfig) -> Self {
        let selection_layer = SelectionLayer::new(config.row_epsilon);
        Self {
            builder: DecorationBuilder::new(config),
            selection_layer,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LivePreviewConfig {
        self.builder.config()
    }

    /// Decorations for the current state. The primary selection head drives hide/show.
    pub fn decorations(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        selection: &EditorSelection,
        visible: Option<Range<usize>>,
    ) -> DecorationSet {
        self.builder
            .build_in(doc, tree, selection.primary_head(), visible)
    }

    /// Selection rectangles for the current layout.
    pub fn selection_markers(
        &self,
        doc: &Document,
        selection: &EditorSelection,
        view: &dyn LayoutView,
    ) -> Vec<SelectionRect> {
        self.selection_layer.markers(doc, selection, view)
    }

    /// Parse `doc` with `source` and build decorations for the whole document.
    pub fn refresh<S: SyntaxSource>(
        &self,
        source: &mut S,
        doc: &Document,
        selection: &EditorSelection,
    ) -> Result<DecorationSet, S::Error> {
        let tree = source.syntax_tree(doc)?;
        Ok(self.decorations(doc, &tree, selection, None))
    }

    /// Handle a click at `pos`: opens the URL of the link text under it, if any.
    pub fn click_link(
        &self,
        decorations: &DecorationSet,
        pos: usize,
        opener: &dyn ExternalOpener,
    ) -> bool {
        let Some(url) = decorations.link_url_at(pos) else {
            return false;
        };
        tracing::debug!(pos, url, "opening link from click");
        opener.open_external(url);
        true
    }
}
