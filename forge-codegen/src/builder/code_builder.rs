//! Indentation-aware text builder for program output.

use super::{CodeFragment, Indent, Renderable};
use crate::format::FormatOptions;

/// Fluent API for building program text with proper indentation.
///
/// # Example
///
/// ```
/// use oqforge_codegen::builder::CodeBuilder;
///
/// let mut builder = CodeBuilder::new(Default::default());
/// builder
///     .push_line("while (j < 5) {")
///     .push_indent()
///     .push_line("j += 1;")
///     .push_dedent()
///     .push_line("}");
///
/// assert_eq!(builder.finish(), "while (j < 5) {\n    j += 1;\n}");
/// ```
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    indent_level: usize,
    indent: Indent,
    buffer: String,
}

impl CodeBuilder {
    /// Create a new CodeBuilder with the specified indentation.
    pub fn new(indent: Indent) -> Self {
        Self {
            indent_level: 0,
            indent,
            buffer: String::new(),
        }
    }

    /// Add a line with current indentation.
    pub fn push_line(&mut self, s: &str) -> &mut Self {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
        self
    }

    /// Increase indentation level.
    pub fn push_indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    /// Decrease indentation level.
    pub fn push_dedent(&mut self) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    /// Emit a Renderable node.
    pub fn emit(&mut self, node: &impl Renderable, options: &FormatOptions) -> &mut Self {
        for fragment in node.to_fragments(options) {
            self.apply_fragment(fragment);
        }
        self
    }

    /// Apply a single fragment.
    pub fn apply_fragment(&mut self, fragment: CodeFragment) {
        match fragment {
            CodeFragment::Line(s) => {
                self.push_line(&s);
            }
            CodeFragment::Block {
                header,
                body,
                close,
            } => {
                self.push_line(&header);
                self.push_indent();
                for f in body {
                    self.apply_fragment(f);
                }
                self.push_dedent();
                if let Some(c) = close {
                    self.push_line(&c);
                }
            }
            CodeFragment::Sequence(fragments) => {
                for f in fragments {
                    self.apply_fragment(f);
                }
            }
        }
    }

    /// Get the current indentation level.
    pub fn current_indent(&self) -> usize {
        self.indent_level
    }

    /// Build the text, every line newline-terminated.
    pub fn build(self) -> String {
        self.buffer
    }

    /// Build the text without the final newline.
    pub fn finish(self) -> String {
        let mut out = self.buffer;
        if out.ends_with('\n') {
            out.pop();
        }
        out
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.indent.write_to(&mut self.buffer);
        }
    }
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self::new(Indent::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_api() {
        let mut builder = CodeBuilder::new(Indent::Spaces(2));
        builder
            .push_line("cal {")
            .push_indent()
            .push_line("port p;")
            .push_dedent()
            .push_line("}");
        assert_eq!(builder.build(), "cal {\n  port p;\n}\n");
    }

    #[test]
    fn test_dedent_saturates() {
        let mut builder = CodeBuilder::default();
        builder.push_dedent().push_dedent();
        assert_eq!(builder.current_indent(), 0);
        builder.push_line("x $0;");
        assert_eq!(builder.finish(), "x $0;");
    }

    #[test]
    fn test_nested_blocks_with_tab() {
        let mut builder = CodeBuilder::new(Indent::Tab);
        builder.apply_fragment(CodeFragment::block(
            "box {",
            vec![CodeFragment::block(
                "cal {",
                vec![CodeFragment::line("delay[100.0ns];")],
            )],
        ));
        assert_eq!(
            builder.finish(),
            "box {\n\tcal {\n\t\tdelay[100.0ns];\n\t}\n}"
        );
    }

    #[test]
    fn test_open_block_continuation() {
        let mut builder = CodeBuilder::default();
        builder.apply_fragment(CodeFragment::sequence(vec![
            CodeFragment::open_block("if (b) {", vec![CodeFragment::line("i = 1;")]),
            CodeFragment::block("} else {", vec![CodeFragment::line("i = 2;")]),
        ]));
        assert_eq!(
            builder.finish(),
            "if (b) {\n    i = 1;\n} else {\n    i = 2;\n}"
        );
    }

    #[test]
    fn test_empty_finish() {
        assert_eq!(CodeBuilder::default().finish(), "");
    }
}
