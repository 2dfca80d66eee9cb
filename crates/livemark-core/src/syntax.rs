//! Read-only markdown syntax tree.
//!
//! The decoration builder never parses markdown. A host (or an integration crate such as
//! `livemark-treesitter`) lowers its own parse into this arena once per document change, and the
//! builder walks it read-only.
//!
//! Node kinds are a closed enum so the builder dispatches with an exhaustive `match`; the
//! conventional node names (`ATXHeading1`, `StrongEmphasis`, `URL`, ...) are only used at the
//! boundary through [`NodeKind::from_name`].

use crate::document::Document;

/// Kind of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root node.
    Document,
    /// A paragraph block.
    Paragraph,
    /// A heading of level 1-6 (ATX or setext).
    Heading(u8),
    /// The `#` run of an ATX heading.
    HeaderMark,
    /// `*text*` / `_text_`.
    Emphasis,
    /// `**text**` / `__text__`.
    StrongEmphasis,
    /// One delimiter of an emphasis or strong emphasis.
    EmphasisMark,
    /// `~~text~~`.
    Strikethrough,
    /// One delimiter of a strikethrough.
    StrikethroughMark,
    /// `` `code` ``.
    InlineCode,
    /// Backtick run of inline code, or the fence of a fenced code block.
    CodeMark,
    /// A (possibly multi-line) blockquote.
    Blockquote,
    /// A `>` marker.
    QuoteMark,
    /// A fenced code block including both fences.
    FencedCode,
    /// The info string (language tag) of a fenced code block.
    CodeInfo,
    /// Body text of a code block.
    CodeText,
    /// An unordered list.
    BulletList,
    /// An ordered list.
    OrderedList,
    /// A list item.
    ListItem,
    /// A list marker (`-`, `*`, `+`, `1.`, `1)`).
    ListMark,
    /// `[text](url)`.
    Link,
    /// One of `[`, `]`, `(`, `)`, `<`, `>` inside a link or autolink.
    LinkMark,
    /// A URL, either the destination of a link or a bare URL.
    Url,
    /// `<url>`.
    Autolink,
    /// `---`, `***`, `___`.
    HorizontalRule,
    /// Anything the builder does not decorate.
    Other,
}

impl NodeKind {
    /// Map a conventional node name to a kind. Unknown names map to [`NodeKind::Other`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "Document" => Self::Document,
            "Paragraph" => Self::Paragraph,
            "ATXHeading1" | "SetextHeading1" => Self::Heading(1),
            "ATXHeading2" | "SetextHeading2" => Self::Heading(2),
            "ATXHeading3" => Self::Heading(3),
            "ATXHeading4" => Self::Heading(4),
            "ATXHeading5" => Self::Heading(5),
            "ATXHeading6" => Self::Heading(6),
            "HeaderMark" => Self::HeaderMark,
            "Emphasis" => Self::Emphasis,
            "StrongEmphasis" => Self::StrongEmphasis,
            "EmphasisMark" => Self::EmphasisMark,
            "Strikethrough" => Self::Strikethrough,
            "StrikethroughMark" => Self::StrikethroughMark,
            "InlineCode" => Self::InlineCode,
            "CodeMark" => Self::CodeMark,
            "Blockquote" => Self::Blockquote,
            "QuoteMark" => Self::QuoteMark,
            "FencedCode" => Self::FencedCode,
            "CodeInfo" => Self::CodeInfo,
            "CodeText" => Self::CodeText,
            "BulletList" => Self::BulletList,
            "OrderedList" => Self::OrderedList,
            "ListItem" => Self::ListItem,
            "ListMark" => Self::ListMark,
            "Link" => Self::Link,
            "LinkMark" => Self::LinkMark,
            "URL" => Self::Url,
            "Autolink" => Self::Autolink,
            "HorizontalRule" => Self::HorizontalRule,
            _ => Self::Other,
        }
    }

    /// Conventional name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Paragraph => "Paragraph",
            Self::Heading(1) => "ATXHeading1",
            Self::Heading(2) => "ATXHeading2",
            Self::Heading(3) => "ATXHeading3",
            Self::Heading(4) => "ATXHeading4",
            Self::Heading(5) => "ATXHeading5",
            Self::Heading(_) => "ATXHeading6",
            Self::HeaderMark => "HeaderMark",
            Self::Emphasis => "Emphasis",
            Self::StrongEmphasis => "StrongEmphasis",
            Self::EmphasisMark => "EmphasisMark",
            Self::Strikethrough => "Strikethrough",
            Self::StrikethroughMark => "StrikethroughMark",
            Self::InlineCode => "InlineCode",
            Self::CodeMark => "CodeMark",
            Self::Blockquote => "Blockquote",
            Self::QuoteMark => "QuoteMark",
            Self::FencedCode => "FencedCode",
            Self::CodeInfo => "CodeInfo",
            Self::CodeText => "CodeText",
            Self::BulletList => "BulletList",
            Self::OrderedList => "OrderedList",
            Self::ListItem => "ListItem",
            Self::ListMark => "ListMark",
            Self::Link => "Link",
            Self::LinkMark => "LinkMark",
            Self::Url => "URL",
            Self::Autolink => "Autolink",
            Self::HorizontalRule => "HorizontalRule",
            Self::Other => "Other",
        }
    }
}

/// Handle to a node inside a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    from: usize,
    to: usize,
    parent: Option<NodeId>,
    /// Position inside the parent's child list.
    index_in_parent: usize,
    children: Vec<NodeId>,
}

/// An immutable syntax tree over a document.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// The `Document` root.
    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Resolve a handle.
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then_some(Node { tree: self, id })
    }

    /// Total node count, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Pre-order (depth-first, document order) iteration over every node.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![NodeId(0)],
        }
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Borrowed view of one node.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    tree: &'a SyntaxTree,
    id: NodeId,
}

impl<'a> Node<'a> {
    /// Handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.tree.data(self.id).kind
    }

    /// Span start (inclusive).
    pub fn from(&self) -> usize {
        self.tree.data(self.id).from
    }

    /// Span end (exclusive).
    pub fn to(&self) -> usize {
        self.tree.data(self.id).to
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<Node<'a>> {
        self.tree.data(self.id).parent.map(|id| Node {
            tree: self.tree,
            id,
        })
    }

    /// Immediate children in document order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'a>> + use<'a> {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    /// First immediate child of the given kind.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<Node<'a>> {
        self.children().find(|c| c.kind() == kind)
    }

    /// Following sibling.
    pub fn next_sibling(&self) -> Option<Node<'a>> {
        self.sibling_at(1)
    }

    /// Preceding sibling.
    pub fn prev_sibling(&self) -> Option<Node<'a>> {
        self.sibling_at(-1)
    }

    fn sibling_at(&self, delta: isize) -> Option<Node<'a>> {
        let data = self.tree.data(self.id);
        let parent = data.parent?;
        let index = data.index_in_parent.checked_add_signed(delta)?;
        let id = *self.tree.data(parent).children.get(index)?;
        Some(Node {
            tree: self.tree,
            id,
        })
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'a>> + use<'a> {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// Source text of the node.
    pub fn text<'d>(&self, doc: &'d Document) -> Option<std::borrow::Cow<'d, str>> {
        doc.slice(self.from(), self.to())
    }
}

/// Iterator returned by [`SyntaxTree::preorder`].
pub struct Preorder<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.data(id).children.iter().rev().copied());
        Some(Node {
            tree: self.tree,
            id,
        })
    }
}

/// Incrementally assembles a [`SyntaxTree`].
///
/// ```rust
/// use livemark_core::{NodeKind, SyntaxTreeBuilder};
///
/// let mut builder = SyntaxTreeBuilder::new(7);
/// builder.enter(NodeKind::Heading(1), 0, 7);
/// builder.leaf(NodeKind::HeaderMark, 0, 1);
/// builder.exit();
/// let tree = builder.finish();
/// assert_eq!(tree.len(), 3);
/// ```
#[derive(Debug)]
pub struct SyntaxTreeBuilder {
    nodes: Vec<NodeData>,
    open: Vec<NodeId>,
}

impl SyntaxTreeBuilder {
    /// Start a tree whose `Document` root spans `[0, len)`.
    pub fn new(len: usize) -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                from: 0,
                to: len,
                parent: None,
                index_in_parent: 0,
                children: Vec::new(),
            }],
            open: vec![NodeId(0)],
        }
    }

    fn push(&mut self, kind: NodeKind, from: usize, to: usize) -> NodeId {
        let parent = *self.open.last().unwrap_or(&NodeId(0));
        let id = NodeId(self.nodes.len() as u32);
        let index_in_parent = self.nodes[parent.index()].children.len();
        self.nodes.push(NodeData {
            kind,
            from,
            to,
            parent: Some(parent),
            index_in_parent,
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Open a node; following nodes become its children until [`exit`](Self::exit).
    pub fn enter(&mut self, kind: NodeKind, from: usize, to: usize) -> NodeId {
        let id = self.push(kind, from, to);
        self.open.push(id);
        id
    }

    /// Add a childless node under the currently open node.
    pub fn leaf(&mut self, kind: NodeKind, from: usize, to: usize) -> NodeId {
        self.push(kind, from, to)
    }

    /// Close the most recently entered node. The root cannot be closed.
    pub fn exit(&mut self) {
        if self.open.len() > 1 {
            self.open.pop();
        }
    }

    /// Finish the tree; nodes still open are closed implicitly.
    pub fn finish(self) -> SyntaxTree {
        SyntaxTree { nodes: self.nodes }
    }
}

/// A producer of syntax trees for a document (e.g. a markdown parser integration).
pub trait SyntaxSource {
    /// The error type returned by [`SyntaxSource::syntax_tree`].
    type Error;

    /// Parse `doc` and return its tree.
    fn syntax_tree(&mut self, doc: &Document) -> Result<SyntaxTree, Self::Error>;
}
