//! AST types for OpenQASM 3 / OpenPulse programs.
//!
//! This crate holds the plain syntax tree that the `oqforge` builder produces
//! and that `oqforge-codegen` prints. It carries no construction rules: type
//! validation, name resolution and declaration tracking all happen before a
//! node lands here.
//!
//! # Architecture
//!
//! ```text
//! oqforge (builder) → oqforge-ir (syntax tree) → oqforge-codegen (text)
//! ```
//!
//! The IR types are designed to be:
//! - Grammar-shaped (one node per construct of the dialect)
//! - Serializable (every node derives `serde` traits for dumps and snapshots)
//! - Self-contained (no dependencies beyond `serde`)

mod expr;
mod stmt;
mod types;
mod version;

pub use expr::{BinaryOp, Expression, UnaryOp};
pub use stmt::{AssignOp, Param, Program, Statement};
pub use types::Type;
pub use version::Version;
