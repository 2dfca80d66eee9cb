#![warn(missing_docs)]
//! `livemark-treesitter` - tree-sitter markdown syntax provider for `livemark-core`.
//!
//! Parses markdown with the block and inline grammars of `tree-sitter-md` and lowers the
//! two-level parse into a [`livemark_core::SyntaxTree`]. The provider implements
//! [`livemark_core::SyntaxSource`], so it plugs straight into
//! [`livemark_core::LivePreview::refresh`].

mod parser;

pub use parser::{TreeSitterError, TreeSitterMarkdown};
