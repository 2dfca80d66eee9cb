use livemark_core::{Document, NodeKind, SyntaxSource, SyntaxTree, SyntaxTreeBuilder};
use std::collections::HashMap;
use thiserror::Error;
use tree_sitter::{Language, Node, Parser, Range, Tree};

/// Errors produced by [`TreeSitterMarkdown`].
#[derive(Debug, Error)]
pub enum TreeSitterError {
    /// Loading one of the markdown grammars failed.
    #[error("tree-sitter language error: {0}")]
    Language(String),
    /// The parser rejected the included ranges of an inline region.
    #[error("tree-sitter included ranges rejected: {0}")]
    IncludedRanges(String),
    /// The parser returned no tree (cancelled or timed out).
    #[error("tree-sitter parse produced no tree")]
    Parse,
}

/// Markdown syntax provider backed by the tree-sitter block and inline grammars.
///
/// Markdown is parsed in two levels: the block grammar yields the document structure, and every
/// `inline` region is parsed again with the inline grammar restricted to that region. Both levels
/// are lowered into one [`SyntaxTree`].
pub struct TreeSitterMarkdown {
    parser: Parser,
    block_language: Language,
    inline_language: Language,
}

impl TreeSitterMarkdown {
    /// Create a provider, loading both grammars.
    pub fn new() -> Result<Self, TreeSitterError> {
        let block_language: Language = tree_sitter_md::LANGUAGE.into();
        let inline_language: Language = tree_sitter_md::INLINE_LANGUAGE.into();

        let mut parser = Parser::new();
        parser
            .set_language(&inline_language)
            .map_err(|e| TreeSitterError::Language(e.to_string()))?;
        parser
            .set_language(&block_language)
            .map_err(|e| TreeSitterError::Language(e.to_string()))?;

        Ok(Self {
            parser,
            block_language,
            inline_language,
        })
    }

    /// Parse `text` into a [`SyntaxTree`].
    pub fn parse(&mut self, text: &str) -> Result<SyntaxTree, TreeSitterError> {
        let block_tree = self.parse_blocks(text)?;
        let inline_trees = self.parse_inlines(text, &block_tree)?;

        let mut lowering = Lowering {
            text: text.as_bytes(),
            inline_trees: &inline_trees,
            out: SyntaxTreeBuilder::new(text.len()),
        };
        lowering.block_children(block_tree.root_node());
        let tree = lowering.out.finish();

        tracing::trace!(
            bytes = text.len(),
            inline_regions = inline_trees.len(),
            nodes = tree.len(),
            "parsed markdown"
        );
        Ok(tree)
    }

    fn parse_blocks(&mut self, text: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .set_included_ranges(&[])
            .map_err(|e| TreeSitterError::IncludedRanges(e.to_string()))?;
        self.parser
            .set_language(&self.block_language)
            .map_err(|e| TreeSitterError::Language(e.to_string()))?;
        self.parser.parse(text, None).ok_or(TreeSitterError::Parse)
    }

    /// Parse every `inline` region of `block_tree`, keyed by the block node's id.
    fn parse_inlines(
        &mut self,
        text: &str,
        block_tree: &Tree,
    ) -> Result<HashMap<usize, Tree>, TreeSitterError> {
        self.parser
            .set_language(&self.inline_language)
            .map_err(|e| TreeSitterError::Language(e.to_string()))?;

        let mut trees = HashMap::new();
        let mut stack = vec![block_tree.root_node()];
        while let Some(node) = stack.pop() {
            let mut cursor = node.walk();
            if node.kind() != "inline" {
                stack.extend(node.children(&mut cursor));
                continue;
            }

            let ranges = inline_ranges(node, &mut cursor);
            if ranges.is_empty() {
                continue;
            }
            self.parser
                .set_included_ranges(&ranges)
                .map_err(|e| TreeSitterError::IncludedRanges(e.to_string()))?;
            let tree = self.parser.parse(text, None).ok_or(TreeSitterError::Parse)?;
            trees.insert(node.id(), tree);
        }

        self.parser
            .set_included_ranges(&[])
            .map_err(|e| TreeSitterError::IncludedRanges(e.to_string()))?;
        Ok(trees)
    }
}

impl SyntaxSource for TreeSitterMarkdown {
    type Error = TreeSitterError;

    fn syntax_tree(&mut self, doc: &Document) -> Result<SyntaxTree, Self::Error> {
        self.parse(&doc.text())
    }
}

/// The byte ranges of an `inline` node minus its named children (block continuations such as
/// the `>` of quoted lines).
fn inline_ranges<'t>(node: Node<'t>, cursor: &mut tree_sitter::TreeCursor<'t>) -> Vec<Range> {
    let mut range = node.range();
    let mut ranges = Vec::new();
    for child in node.named_children(cursor) {
        let child_range = child.range();
        if child_range.start_byte > range.start_byte {
            ranges.push(Range {
                start_byte: range.start_byte,
                end_byte: child_range.start_byte,
                start_point: range.start_point,
                end_point: child_range.start_point,
            });
        }
        range.start_byte = child_range.end_byte;
        range.start_point = child_range.end_point;
    }
    if range.end_byte > range.start_byte {
        ranges.push(range);
    }
    ranges
}

/// Converts tree-sitter nodes into [`SyntaxTreeBuilder`] calls.
struct Lowering<'a> {
    text: &'a [u8],
    inline_trees: &'a HashMap<usize, Tree>,
    out: SyntaxTreeBuilder,
}

impl Lowering<'_> {
    /// Span of `node` without its trailing line break.
    fn span(&self, node: Node<'_>) -> (usize, usize) {
        let from = node.start_byte();
        let mut to = node.end_byte().min(self.text.len());
        while to > from && matches!(self.text[to - 1], b'\n' | b'\r') {
            to -= 1;
        }
        (from, to)
    }

    fn block_children(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        for child in children {
            self.block(child);
        }
    }

    fn block(&mut self, node: Node<'_>) {
        let (from, to) = self.span(node);
        let kind = match node.kind() {
            "section" => return self.block_children(node),
            "block_continuation" => return,
            "inline" => {
                let inline_trees = self.inline_trees;
                if let Some(tree) = inline_trees.get(&node.id()) {
                    self.inline_children(tree.root_node());
                }
                return;
            }
            "list_marker_minus" | "list_marker_plus" | "list_marker_star"
            | "list_marker_dot" | "list_marker_parenthesis" => {
                let mut end = to;
                while end > from && matches!(self.text[end - 1], b' ' | b'\t') {
                    end -= 1;
                }
                self.out.leaf(NodeKind::ListMark, from, end);
                return;
            }
            "atx_heading" => NodeKind::Heading(atx_level(node)),
            "setext_heading" => NodeKind::Heading(setext_level(node)),
            "list" => {
                if is_ordered_list(node) {
                    NodeKind::OrderedList
                } else {
                    NodeKind::BulletList
                }
            }
            name => block_kind(name),
        };

        self.out.enter(kind, from, to);
        self.block_children(node);
        self.out.exit();
    }

    fn inline_children(&mut self, node: Node<'_>) {
        let parent = node.kind();
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        for child in children {
            if child.is_named() {
                self.inline(child, parent);
            } else if matches!(parent, "inline_link" | "image")
                && matches!(child.kind(), "[" | "]" | "(" | ")" | "![")
            {
                let (from, to) = self.span(child);
                self.out.leaf(NodeKind::LinkMark, from, to);
            }
        }
    }

    fn inline(&mut self, node: Node<'_>, parent: &str) {
        let (from, to) = self.span(node);
        let kind = match node.kind() {
            "uri_autolink" => {
                self.out.enter(NodeKind::Autolink, from, to);
                if to >= from + 2 {
                    self.out.leaf(NodeKind::LinkMark, from, from + 1);
                    self.out.leaf(NodeKind::Url, from + 1, to - 1);
                    self.out.leaf(NodeKind::LinkMark, to - 1, to);
                }
                self.out.exit();
                return;
            }
            "emphasis_delimiter" if parent == "strikethrough" => NodeKind::StrikethroughMark,
            name => inline_kind(name),
        };

        self.out.enter(kind, from, to);
        self.inline_children(node);
        self.out.exit();
    }
}

fn block_kind(name: &str) -> NodeKind {
    match name {
        "paragraph" => NodeKind::Paragraph,
        "atx_h1_marker" | "atx_h2_marker" | "atx_h3_marker" | "atx_h4_marker"
        | "atx_h5_marker" | "atx_h6_marker" => NodeKind::HeaderMark,
        "block_quote" => NodeKind::Blockquote,
        "block_quote_marker" => NodeKind::QuoteMark,
        "fenced_code_block" => NodeKind::FencedCode,
        "fenced_code_block_delimiter" => NodeKind::CodeMark,
        "info_string" => NodeKind::CodeInfo,
        "code_fence_content" => NodeKind::CodeText,
        "list_item" => NodeKind::ListItem,
        "thematic_break" => NodeKind::HorizontalRule,
        _ => NodeKind::Other,
    }
}

fn inline_kind(name: &str) -> NodeKind {
    match name {
        "emphasis" => NodeKind::Emphasis,
        "strong_emphasis" => NodeKind::StrongEmphasis,
        "emphasis_delimiter" => NodeKind::EmphasisMark,
        "strikethrough" => NodeKind::Strikethrough,
        "code_span" => NodeKind::InlineCode,
        "code_span_delimiter" => NodeKind::CodeMark,
        "inline_link" => NodeKind::Link,
        "link_destination" | "www_autolink" | "url_autolink" => NodeKind::Url,
        _ => NodeKind::Other,
    }
}

fn atx_level(node: Node<'_>) -> u8 {
    let mut cursor = node.walk();
    let level = node
        .named_children(&mut cursor)
        .find_map(|child| match child.kind() {
            "atx_h1_marker" => Some(1),
            "atx_h2_marker" => Some(2),
            "atx_h3_marker" => Some(3),
            "atx_h4_marker" => Some(4),
            "atx_h5_marker" => Some(5),
            "atx_h6_marker" => Some(6),
            _ => None,
        });
    level.unwrap_or(1)
}

fn setext_level(node: Node<'_>) -> u8 {
    let mut cursor = node.walk();
    let is_level_two = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "setext_h2_underline");
    if is_level_two { 2 } else { 1 }
}

fn is_ordered_list(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let Some(item) = node.named_children(&mut cursor).next() else {
        return false;
    };
    let mut item_cursor = item.walk();
    item.named_children(&mut item_cursor)
        .next()
        .is_some_and(|marker| matches!(marker.kind(), "list_marker_dot" | "list_marker_parenthesis"))
}
