//! Canonical text rendering for OpenQASM 3 / OpenPulse syntax trees.
//!
//! # Module Organization
//!
//! - [`builder`] - Indentation-aware text building (CodeBuilder, CodeFragment, etc.)
//! - [`format`] - Literal formatting (floats, durations, complex numbers)
//! - [`qasm`] - Printer from `oqforge-ir` nodes to dialect text
//!
//! The printer performs no validation. Whatever tree it is handed is printed
//! as-is, so rendering the same tree twice always yields the same text.

pub mod builder;
pub mod format;
pub mod qasm;

pub use builder::{CodeBuilder, CodeFragment, Indent, Renderable};
pub use format::FormatOptions;
pub use qasm::{render_expression, render_program, render_statement, render_type};
