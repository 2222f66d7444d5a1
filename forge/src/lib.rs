//! Typed builder for OpenQASM 3 / OpenPulse programs.
//!
//! Build a [`Program`] statement by statement from typed [`Var`]s and
//! [`Expr`]s, then render it to canonical text. Variables are declared
//! automatically the first time a statement uses them, externs are
//! declared once, and blocks nest through closures or explicit
//! `open_*`/`close` pairs.
//!
//! ```
//! use oqforge::{Extern, Program, RenderOptions, Var, VarType, args};
//!
//! # fn main() -> oqforge::Result<()> {
//! let constant = Extern::waveform_generator(
//!     "constant",
//!     [("length", VarType::Duration), ("iq", VarType::COMPLEX128)],
//! );
//! let port = Var::port("d0");
//! let frame = Var::new_frame("xy", &port, 5e9)?;
//! let q = Var::physical_qubit(0);
//!
//! let mut prog = Program::with_version("3.0")?;
//! prog.defcal(oqforge::Defcal::new("x90", &q), |prog| {
//!     prog.play(&frame, constant.call(args![32e-9, 0.5])?)?;
//!     Ok(())
//! })?;
//! prog.for_in(0..100, "shot", |prog, _| {
//!     prog.gate(&q, "x90")?.measure(&q)?;
//!     Ok(())
//! })?;
//!
//! let text = prog.render_with(&RenderOptions::default().with_hoisted_preamble())?;
//! assert_eq!(
//!     text,
//!     r#"OPENQASM 3.0;
//! defcalgrammar "openpulse";
//! cal {
//!     extern constant(duration, complex[float[64]]) -> waveform;
//!     port d0;
//!     frame xy = newframe(d0, 5000000000.0, 0);
//! }
//! defcal x90 $0 {
//!     play(xy, constant(32.0ns, 0.5));
//! }
//! for int shot in [0:99] {
//!     x90 $0;
//!     measure $0;
//! }"#
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Variable types, numbers and complex values
//! - [`expr`] - Expressions, operators and the [`IntoExpr`] conversion
//! - [`var`] - Typed variables
//! - [`call`] - Externs, subroutines and defcal heads
//! - [`program`] - The program builder, blocks, rendering and composition
//! - [`config`] - Render options

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

pub mod call;
pub mod config;
mod error;
pub mod expr;
pub mod program;
mod registry;
pub mod types;
pub mod var;

pub use call::{Annotation, Args, Call, Callee, Defcal, Extern, Signature, Subroutine};
pub use config::RenderOptions;
pub use error::{Error, ErrorKind, Result};
pub use expr::{BinaryOp, Expr, IntoExpr, Literal, Operand, UnaryOp, make_duration};
pub use oqforge_codegen::{FormatOptions, Indent, render_statement};
pub use oqforge_ir as ir;
pub use program::{IntoTargets, IntoVars, Iterable, Program};
pub use registry::DefcalKey;
pub use types::{Complex, NativeType, Number, VarType};
pub use var::Var;
