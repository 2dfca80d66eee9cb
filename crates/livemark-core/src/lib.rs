#![warn(missing_docs)]
//! Livemark Core - headless live-preview engine for markdown editing surfaces
//!
//! # Overview
//!
//! `livemark-core` decorates a plain markdown buffer so that it reads like rendered text while
//! remaining editable source. Formatting marks (`#`, `**`, `` ` ``, `[`, `](url)`, list dashes,
//! `>`) are hidden while the cursor is away from them and revealed as soon as the cursor enters
//! their span. A companion selection layer computes text-accurate selection rectangles for
//! soft-wrapped lines.
//!
//! The crate does not parse markdown and does not paint pixels. A syntax provider (see
//! `livemark-treesitter`) supplies a [`SyntaxTree`]; the host consumes the produced
//! [`DecorationSet`] and [`SelectionRect`]s.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  LivePreview (per editor instance)          │  ← Public API
//! ├──────────────────────┬──────────────────────┤
//! │  DecorationBuilder   │  SelectionLayer      │  ← Per-rebuild computation
//! ├──────────────────────┼──────────────────────┤
//! │  DecorationSet       │  LayoutView          │  ← Output model / geometry seam
//! ├──────────────────────┴──────────────────────┤
//! │  SyntaxTree + Document (rope-backed)        │  ← Inputs
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use livemark_core::{
//!     Document, EditorSelection, LivePreview, LivePreviewConfig, NodeKind, SyntaxTreeBuilder,
//! };
//!
//! let doc = Document::new("# Title");
//! let mut tree = SyntaxTreeBuilder::new(doc.len());
//! tree.enter(NodeKind::Heading(1), 0, 7);
//! tree.leaf(NodeKind::HeaderMark, 0, 1);
//! tree.exit();
//! let tree = tree.finish();
//!
//! let preview = LivePreview::new(LivePreviewConfig::default());
//!
//! // Cursor inside "Title": the "# " marker is hidden.
//! let set = preview.decorations(&doc, &tree, &EditorSelection::cursor(5), None);
//! let marker = set.iter().next().unwrap();
//! assert_eq!((marker.from, marker.to), (0, 2));
//! assert!(marker.is_replace());
//! ```
//!
//! # Module Description
//!
//! - [`document`] - rope-backed text with byte-offset line lookup
//! - [`syntax`] - syntax-tree arena handed in by a parser
//! - [`decorations`] - ordered decoration model and set builder
//! - [`widgets`] - bullet, link icon and horizontal-rule stand-ins
//! - [`builder`] - per-construct hide/show rules
//! - [`layout`] - coordinate mapping seam and a monospace soft-wrap layout
//! - [`selection`] / [`selection_layer`] - selection state and rectangles
//! - [`preview`] - per-editor context tying everything to the host update cycle
//!
//! # Logging
//!
//! The crate emits `tracing` events (discarded spans, malformed nodes, rebuild statistics) and
//! never installs a subscriber.

pub mod builder;
pub mod config;
pub mod decorations;
pub mod document;
pub mod layout;
pub mod preview;
pub mod selection;
pub mod selection_layer;
pub mod syntax;
pub mod widgets;

pub use builder::DecorationBuilder;
pub use config::{ClassNames, DATA_URL_ATTRIBUTE, HeadingReveal, LivePreviewConfig};
pub use decorations::{
    Decoration, DecorationError, DecorationSet, DecorationSetBuilder, DecorationSpec, LINE_SIDE,
    MARK_SIDE, REPLACE_SIDE, WidgetSide,
};
pub use document::{Document, Line};
pub use layout::{GridLayout, LayoutView, Rect, Side, WrapMode};
pub use preview::{LivePreview, ViewUpdate};
pub use selection::{EditorSelection, SelectionRange};
pub use selection_layer::{SUPPRESS_NATIVE_SELECTION_CSS, SelectionLayer, SelectionRect};
pub use syntax::{Node, NodeId, NodeKind, SyntaxSource, SyntaxTree, SyntaxTreeBuilder};
pub use widgets::{ExternalOpener, Widget};
