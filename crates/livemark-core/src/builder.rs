//! The decoration builder.
//!
//! One depth-first walk over the syntax tree per rebuild. Every construct contributes
//! decorations to a per-rebuild arena; the arena drops duplicates and out-of-bounds spans, and the
//! survivors are sorted once and frozen into a [`DecorationSet`].
//!
//! Hide/show rule: the formatting marks of a construct are revealed (styled as low-emphasis
//! formatting marks) while the cursor touches the construct, and hidden or replaced by a widget
//! otherwise. What "touches" means differs per construct; see the individual handlers.

use crate::config::{HeadingReveal, LivePreviewConfig};
use crate::decorations::{Decoration, DecorationSet, DecorationSetBuilder, WidgetSide};
use crate::document::{Document, Line};
use crate::syntax::{Node, NodeKind, SyntaxTree};
use crate::widgets::Widget;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

/// Opening/closing fence line: indentation, a 3+ backtick or tilde run, optional info string.
const FENCE_LINE_PATTERN: &str = r"^([ \t]*)(`{3,}|~{3,})[ \t]*([^`]*?)[ \t]*$";
/// Leading `>` run of a blockquote line, nested quotes included.
const QUOTE_MARKER_PATTERN: &str = r"^[ \t]*(?:>[ \t]?)+";

/// Inputs of one rebuild.
struct BuildContext<'a> {
    doc: &'a Document,
    cursor: usize,
    cursor_line: Line,
}

impl BuildContext<'_> {
    /// Cursor inside `[from, to]`, both ends included.
    fn touches(&self, from: usize, to: usize) -> bool {
        from <= self.cursor && self.cursor <= to
    }
}

/// Decorations proposed during one walk. Created per rebuild and discarded afterwards.
struct Arena {
    doc_len: usize,
    proposals: Vec<Decoration>,
    occupied: HashSet<Decoration>,
    discarded: usize,
}

impl Arena {
    fn new(doc_len: usize) -> Self {
        Self {
            doc_len,
            proposals: Vec::new(),
            occupied: HashSet::new(),
            discarded: 0,
        }
    }

    fn propose(&mut self, decoration: Decoration) {
        if decoration.from > decoration.to || decoration.to > self.doc_len {
            tracing::debug!(
                from = decoration.from,
                to = decoration.to,
                doc_len = self.doc_len,
                "discarding out-of-bounds decoration"
            );
            self.discarded += 1;
            return;
        }
        if !decoration.is_point() && decoration.from == decoration.to {
            return;
        }
        if self.occupied.insert(decoration.clone()) {
            self.proposals.push(decoration);
        }
    }
}

/// Builds decoration sets from `(document, syntax tree, cursor)`.
#[derive(Debug, Clone)]
pub struct DecorationBuilder {
    config: LivePreviewConfig,
    fence_line: Regex,
    quote_marker: Regex,
}

impl DecorationBuilder {
    /// Create a builder.
    pub fn new(config: LivePreviewConfig) -> Self {
        Self {
            config,
            fence_line: Regex::new(FENCE_LINE_PATTERN).expect("fence line pattern is valid"),
            quote_marker: Regex::new(QUOTE_MARKER_PATTERN)
                .expect("quote marker pattern is valid"),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LivePreviewConfig {
        &self.config
    }

    /// Build the decoration set for the whole document.
    pub fn build(&self, doc: &Document, tree: &SyntaxTree, cursor: usize) -> DecorationSet {
        self.build_in(doc, tree, cursor, None)
    }

    /// Build the decoration set, optionally restricted to subtrees intersecting `visible`.
    pub fn build_in(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        cursor: usize,
        visible: Option<Range<usize>>,
    ) -> DecorationSet {
        let ctx = BuildContext {
            doc,
            cursor,
            cursor_line: doc.line_at(cursor),
        };
        let mut arena = Arena::new(doc.len());

        let mut stack = vec![tree.root()];
        let mut visited = 0usize;
        while let Some(node) = stack.pop() {
            if let Some(visible) = &visible
                && (node.to() < visible.start || node.from() > visible.end)
            {
                continue;
            }
            visited += 1;
            self.visit(node, &ctx, &mut arena);
            stack.extend(node.children().rev());
        }

        let Arena {
            mut proposals,
            discarded,
            ..
        } = arena;
        // Stable: equal keys keep walk order.
        proposals.sort_by_key(Decoration::sort_key);

        let mut builder = DecorationSetBuilder::with_capacity(proposals.len());
        for decoration in proposals {
            if let Err(err) = builder.add(decoration) {
                tracing::error!(%err, "decoration rejected by set builder");
                if cfg!(debug_assertions) {
                    panic!("decoration rejected by set builder: {err}");
                }
            }
        }
        let set = builder.finish();

        tracing::trace!(
            nodes = tree.len(),
            visited,
            decorations = set.len(),
            discarded,
            cursor,
            "rebuilt decorations"
        );
        set
    }

    fn visit(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        if node.from() > node.to() || node.to() > ctx.doc.len() {
            tracing::debug!(
                kind = node.kind().name(),
                from = node.from(),
                to = node.to(),
                "skipping node with out-of-bounds span"
            );
            return;
        }

        match node.kind() {
            NodeKind::Heading(level) => self.heading(node, level, ctx, arena),
            NodeKind::StrongEmphasis => {
                self.delimited(node, 2, b"*_", &self.config.classes.strong, ctx, arena)
            }
            NodeKind::Emphasis => {
                self.delimited(node, 1, b"*_", &self.config.classes.emphasis, ctx, arena)
            }
            NodeKind::Strikethrough => self.delimited(
                node,
                2,
                b"~",
                &self.config.classes.strikethrough,
                ctx,
                arena,
            ),
            NodeKind::InlineCode => self.inline_code(node, ctx, arena),
            NodeKind::Blockquote => self.blockquote(node, ctx, arena),
            NodeKind::FencedCode => self.fenced_code(node, ctx, arena),
            NodeKind::ListMark => self.list_mark(node, ctx, arena),
            NodeKind::Link => self.link(node, ctx, arena),
            NodeKind::Url => self.url(node, ctx, arena),
            NodeKind::Autolink => self.autolink(node, ctx, arena),
            NodeKind::HorizontalRule => self.horizontal_rule(node, ctx, arena),
            NodeKind::Document
            | NodeKind::Paragraph
            | NodeKind::HeaderMark
            | NodeKind::EmphasisMark
            | NodeKind::StrikethroughMark
            | NodeKind::CodeMark
            | NodeKind::QuoteMark
            | NodeKind::CodeInfo
            | NodeKind::CodeText
            | NodeKind::BulletList
            | NodeKind::OrderedList
            | NodeKind::ListItem
            | NodeKind::LinkMark
            | NodeKind::Other => {}
        }
    }

    /// Reveal `spans` as formatting marks or hide them.
    fn toggle_marks(&self, spans: &[(usize, usize)], revealed: bool, arena: &mut Arena) {
        for &(from, to) in spans {
            if revealed {
                arena.propose(Decoration::mark(
                    from,
                    to,
                    &self.config.classes.formatting_mark,
                ));
            } else {
                arena.propose(Decoration::hide(from, to));
            }
        }
    }

    fn heading(&self, node: Node<'_>, level: u8, ctx: &BuildContext<'_>, arena: &mut Arena) {
        let doc = ctx.doc;
        let from = node.from();
        let line = doc.line_at(from);
        // Setext headings span two lines; only the text line is styled.
        let end = node.to().min(line.to);

        let mut marker_end = from;
        while marker_end < end && doc.ascii_at(marker_end) == Some(b'#') {
            marker_end += 1;
        }
        let has_marker = marker_end > from;
        while has_marker && marker_end < end && matches!(doc.ascii_at(marker_end), Some(b' ' | b'\t'))
        {
            marker_end += 1;
        }

        let class = self.config.classes.heading(level);
        if has_marker {
            let revealed = match self.config.heading_reveal {
                HeadingReveal::Marker => ctx.touches(from, marker_end),
                HeadingReveal::Line => ctx.cursor_line.number == line.number,
            };
            if revealed {
                arena.propose(Decoration::mark(
                    from,
                    marker_end,
                    format!("{class} {}", self.config.classes.formatting_mark),
                ));
            } else {
                arena.propose(Decoration::hide(from, marker_end));
            }
        }

        arena.propose(Decoration::mark(marker_end, end, class));
    }

    /// Strong, emphasis and strikethrough: `marker_len` delimiter characters on both ends.
    fn delimited(
        &self,
        node: Node<'_>,
        marker_len: usize,
        delimiters: &[u8],
        class: &str,
        ctx: &BuildContext<'_>,
        arena: &mut Arena,
    ) {
        let (from, to) = (node.from(), node.to());
        if to - from < marker_len * 2 {
            tracing::debug!(
                kind = node.kind().name(),
                from,
                to,
                "delimited node too short"
            );
            return;
        }

        let is_delimiter = |pos: usize| {
            ctx.doc
                .ascii_at(pos)
                .is_some_and(|b| delimiters.contains(&b))
        };
        let open = from..from + marker_len;
        let close = to - marker_len..to;
        if !open.clone().all(is_delimiter) || !close.clone().all(is_delimiter) {
            tracing::debug!(
                kind = node.kind().name(),
                from,
                to,
                "delimited node without delimiters"
            );
            return;
        }

        arena.propose(Decoration::mark(open.end, close.start, class));
        self.toggle_marks(
            &[(open.start, open.end), (close.start, close.end)],
            ctx.touches(from, to),
            arena,
        );
    }

    fn inline_code(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        let (from, to) = (node.from(), node.to());
        let doc = ctx.doc;

        let mut run = 0usize;
        while from + run < to && doc.ascii_at(from + run) == Some(b'`') {
            run += 1;
        }
        let closing_ok = run > 0
            && to - from >= run * 2
            && (to - run..to).all(|pos| doc.ascii_at(pos) == Some(b'`'));
        if !closing_ok {
            tracing::debug!(from, to, "inline code without matching backtick runs");
            return;
        }

        arena.propose(Decoration::mark(
            from + run,
            to - run,
            &self.config.classes.inline_code,
        ));
        self.toggle_marks(
            &[(from, from + run), (to - run, to)],
            ctx.touches(from, to),
            arena,
        );
    }

    /// Lines covered by `node`. A span ending right after a line break does not include the
    /// following line.
    fn node_lines<'d>(doc: &'d Document, node: Node<'_>) -> impl Iterator<Item = Line> + use<'d> {
        let first = doc.line_at(node.from()).number;
        let last_offset = if node.to() > node.from() {
            node.to() - 1
        } else {
            node.from()
        };
        let last = doc.line_at(last_offset).number.max(first);
        (first..=last).filter_map(move |n| doc.line(n))
    }

    /// Each quote claims only its own `>` on a line: the first one on its opening line, and on
    /// later lines the one after the markers of its enclosing quotes.
    fn blockquote(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        let classes = &self.config.classes;
        let depth = node
            .ancestors()
            .filter(|n| n.kind() == NodeKind::Blockquote)
            .count();
        for line in Self::node_lines(ctx.doc, node) {
            arena.propose(Decoration::line(line.from, &classes.blockquote_line));

            let start = line.from.max(node.from());
            let Some(text) = ctx.doc.slice(start, line.to) else {
                continue;
            };
            let run_len = self.quote_marker.find(&text).map_or(0, |m| m.end());
            let own = if start == node.from() { 0 } else { depth };
            if let Some(&(from, to)) = quote_markers(&text[..run_len]).get(own) {
                self.toggle_marks(
                    &[(start + from, start + to)],
                    line.number == ctx.cursor_line.number,
                    arena,
                );
            }

            arena.propose(Decoration::mark(
                start + run_len,
                line.to,
                &classes.quote_text,
            ));
        }
    }

    fn fenced_code(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        let classes = &self.config.classes;
        let revealed = ctx.touches(node.from(), node.to());
        let quoted = node
            .ancestors()
            .any(|n| n.kind() == NodeKind::Blockquote);

        for line in Self::node_lines(ctx.doc, node) {
            let mut start = line.from.max(node.from());
            let Some(text) = ctx.doc.slice(start, line.to) else {
                arena.propose(Decoration::line(line.from, &classes.code_block_line));
                continue;
            };
            let mut text = text.as_ref();
            if quoted && let Some(m) = self.quote_marker.find(text) {
                start += m.end();
                text = &text[m.end()..];
            }

            let Some(caps) = self.fence_line.captures(text) else {
                arena.propose(Decoration::line(line.from, &classes.code_block_line));
                continue;
            };

            arena.propose(Decoration::line(
                line.from,
                format!("{} {}", classes.code_block_line, classes.code_fence_line),
            ));
            if let Some(run) = caps.get(2) {
                self.toggle_marks(&[(start + run.start(), start + run.end())], revealed, arena);
            }
            if let Some(info) = caps.get(3) {
                arena.propose(Decoration::mark(
                    start + info.start(),
                    start + info.end(),
                    &classes.code_language,
                ));
            }
        }
    }

    fn list_mark(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        let classes = &self.config.classes;
        let (from, to) = (node.from(), node.to());
        let depth = node
            .ancestors()
            .filter(|n| n.kind() == NodeKind::ListItem)
            .count()
            .saturating_sub(1);

        let line = ctx.doc.line_at(from);
        arena.propose(Decoration::line(
            line.from,
            format!("{} {}", classes.list_line, classes.indent(depth)),
        ));

        let in_ordered_list = node
            .ancestors()
            .find(|n| matches!(n.kind(), NodeKind::BulletList | NodeKind::OrderedList))
            .is_some_and(|list| list.kind() == NodeKind::OrderedList);
        let starts_with_digit = ctx.doc.ascii_at(from).is_some_and(|b| b.is_ascii_digit());
        if in_ordered_list || starts_with_digit {
            arena.propose(Decoration::mark(from, to, &classes.ordered_list_mark));
            return;
        }

        if ctx.touches(from, to) {
            arena.propose(Decoration::mark(from, to, &classes.formatting_mark));
        } else {
            let end = match ctx.doc.ascii_at(to) {
                Some(b' ' | b'\t') => to + 1,
                _ => to,
            };
            arena.propose(Decoration::replace(from, end, Widget::Bullet));
        }
    }

    fn link(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        let doc = ctx.doc;
        let mut open = None;
        let mut close = None;
        let mut url = None;
        for child in node.children() {
            match child.kind() {
                NodeKind::LinkMark => match doc.ascii_at(child.from()) {
                    Some(b'[') if open.is_none() => open = Some(child),
                    Some(b']') if close.is_none() => close = Some(child),
                    _ => {}
                },
                NodeKind::Url if url.is_none() => url = Some(child),
                _ => {}
            }
        }

        let (Some(open), Some(close), Some(url)) = (open, close, url) else {
            tracing::debug!(
                from = node.from(),
                to = node.to(),
                "link without brackets or destination left raw"
            );
            return;
        };
        let Some(url) = url.text(doc).map(|t| resolve_url(&t)) else {
            return;
        };
        let (from, to) = (node.from(), node.to());
        let (text_from, text_to) = (open.to(), close.from());
        if text_from > text_to || from > text_from || text_to > to {
            tracing::debug!(from, to, "link children out of order");
            return;
        }

        arena.propose(Decoration::link(
            text_from,
            text_to,
            &self.config.classes.link,
            url.clone(),
        ));

        let revealed = ctx.touches(from, to);
        self.toggle_marks(&[(from, text_from), (text_to, to)], revealed, arena);
        if !revealed {
            arena.propose(Decoration::widget(
                text_to,
                Widget::link_icon(url),
                WidgetSide::After,
            ));
        }
    }

    fn url(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        // Link destinations are handled (and usually hidden) by the link itself.
        if node.parent().is_some_and(|p| p.kind() == NodeKind::Link) {
            return;
        }
        let Some(url) = node.text(ctx.doc).map(|t| resolve_url(&t)) else {
            return;
        };
        arena.propose(Decoration::link(
            node.from(),
            node.to(),
            &self.config.classes.link,
            url,
        ));
    }

    fn autolink(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        let (from, to) = (node.from(), node.to());
        let bracketed = to - from >= 2
            && ctx.doc.ascii_at(from) == Some(b'<')
            && ctx.doc.ascii_at(to - 1) == Some(b'>');
        if bracketed {
            self.toggle_marks(
                &[(from, from + 1), (to - 1, to)],
                ctx.touches(from, to),
                arena,
            );
        }

        if node.child_of_kind(NodeKind::Url).is_none() {
            let (inner_from, inner_to) = if bracketed {
                (from + 1, to - 1)
            } else {
                (from, to)
            };
            if let Some(url) = ctx.doc.slice(inner_from, inner_to) {
                arena.propose(Decoration::link(
                    inner_from,
                    inner_to,
                    &self.config.classes.link,
                    resolve_url(&url),
                ));
            }
        }
    }

    fn horizontal_rule(&self, node: Node<'_>, ctx: &BuildContext<'_>, arena: &mut Arena) {
        let (from, to) = (node.from(), node.to());
        if ctx.doc.line_at(from).number != ctx.cursor_line.number {
            arena.propose(Decoration::replace(from, to, Widget::HorizontalRule));
        } else {
            arena.propose(Decoration::mark(
                from,
                to,
                &self.config.classes.formatting_mark,
            ));
        }
    }
}

impl Default for DecorationBuilder {
    fn default() -> Self {
        Self::new(LivePreviewConfig::default())
    }
}

fn resolve_url(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Splits a leading `>` run into one span per marker. The first span keeps the indentation in
/// front of it.
fn quote_markers(run: &str) -> Vec<(usize, usize)> {
    let bytes = run.as_bytes();
    let mut spans = Vec::new();
    let mut from = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'>' {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        if matches!(bytes.get(end), Some(b' ' | b'\t')) {
            end += 1;
        }
        spans.push((from, end));
        from = end;
        i = end;
    }
    spans
}
