//! Renderable trait and CodeFragment for decoupled printing.
//!
//! Syntax nodes describe their layout as fragments; the [`CodeBuilder`]
//! applies indentation once, at the end.
//!
//! [`CodeBuilder`]: super::CodeBuilder

use crate::format::FormatOptions;

/// A piece of rendered output.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeFragment {
    /// A single line (will have newline appended).
    Line(String),
    /// A block with header, indented body, and optional closing line.
    ///
    /// The closing line is omitted when the next fragment continues the
    /// block, as `} else {` does.
    Block {
        header: String,
        body: Vec<CodeFragment>,
        close: Option<String>,
    },
    /// A sequence of fragments at the same level.
    Sequence(Vec<CodeFragment>),
}

impl CodeFragment {
    /// Create a line fragment.
    pub fn line(s: impl Into<String>) -> Self {
        Self::Line(s.into())
    }

    /// Create a block closed by `}`.
    pub fn block(header: impl Into<String>, body: Vec<CodeFragment>) -> Self {
        Self::Block {
            header: header.into(),
            body,
            close: Some("}".to_string()),
        }
    }

    /// Create a block left open for a continuation header.
    pub fn open_block(header: impl Into<String>, body: Vec<CodeFragment>) -> Self {
        Self::Block {
            header: header.into(),
            body,
            close: None,
        }
    }

    /// Create a sequence of fragments.
    pub fn sequence(fragments: Vec<CodeFragment>) -> Self {
        Self::Sequence(fragments)
    }
}

/// Trait for nodes that can be rendered to fragments.
pub trait Renderable {
    /// Convert this node to a sequence of fragments.
    fn to_fragments(&self, options: &FormatOptions) -> Vec<CodeFragment>;
}

impl<T: Renderable + ?Sized> Renderable for &T {
    fn to_fragments(&self, options: &FormatOptions) -> Vec<CodeFragment> {
        (*self).to_fragments(options)
    }
}

impl<T: Renderable> Renderable for [T] {
    fn to_fragments(&self, options: &FormatOptions) -> Vec<CodeFragment> {
        self.iter().flat_map(|node| node.to_fragments(options)).collect()
    }
}
