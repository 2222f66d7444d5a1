//! The program builder.
//!
//! A [`Program`] owns a stack of open scopes and a declaration registry.
//! Statement operations append one statement to the innermost scope and
//! return the program again, so calls chain with `?`:
//!
//! ```
//! use oqforge::{Operand, Program, Var};
//!
//! # fn main() -> oqforge::Result<()> {
//! let i = Var::int("i").with_init(5)?;
//! let j = Var::int("j").with_init(2)?;
//! let mut prog = Program::new();
//! prog.set(&i, oqforge::Expr::from(2).times(i.plus(&j)))?;
//! assert_eq!(
//!     prog.render()?,
//!     "int[32] i = 5;\nint[32] j = 2;\ni = 2 * (i + j);"
//! );
//! # Ok(())
//! # }
//! ```

mod blocks;
mod compose;
mod render;

use std::borrow::Borrow;

use log::{Level, log_enabled, trace};
use oqforge_codegen::{FormatOptions, render_statement};
use oqforge_ir::{self as ir, AssignOp};

use crate::call::{Call, Callee, Extern};
use crate::error::{Error, Result};
use crate::expr::{Expr, IntoExpr, coerce_to, make_duration};
use crate::registry::{DefcalKey, Lowerer, Registry};
use crate::types::VarType;
use crate::var::Var;

pub use blocks::Iterable;

/// Structural role of an open scope, with whatever the closing statement
/// needs besides the body.
#[derive(Debug, Clone)]
enum ScopeKind {
    Top,
    If(ir::Expression),
    ElseIf(ir::Expression),
    Else,
    For {
        var_type: ir::Type,
        var: String,
        iterable: ir::Expression,
    },
    While(ir::Expression),
    Box(Option<ir::Expression>),
    Cal,
    Defcal {
        key: DefcalKey,
        params: Vec<ir::Param>,
        qubits: Vec<ir::Expression>,
        returns: Option<ir::Type>,
    },
    Subroutine,
}

impl ScopeKind {
    fn name(&self) -> &'static str {
        match self {
            ScopeKind::Top => "top level",
            ScopeKind::If(_) => "if",
            ScopeKind::ElseIf(_) => "else if",
            ScopeKind::Else => "else",
            ScopeKind::For { .. } => "for",
            ScopeKind::While(_) => "while",
            ScopeKind::Box(_) => "box",
            ScopeKind::Cal => "cal",
            ScopeKind::Defcal { .. } => "defcal",
            ScopeKind::Subroutine => "subroutine",
        }
    }
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    body: Vec<ir::Statement>,
    /// The last statement is an `if` that an `else` may still extend.
    accepts_else: bool,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            body: Vec::new(),
            accepts_else: false,
        }
    }
}

/// An OpenQASM 3 / OpenPulse program under construction.
///
/// Every fallible operation leaves the program exactly as it was when it
/// fails.
#[derive(Debug, Clone)]
pub struct Program {
    version: Option<ir::Version>,
    /// `stack[0]` is the top level.
    stack: Vec<Scope>,
    /// Scopes at or below this depth belong to a running closure body or
    /// subroutine and cannot be closed by hand.
    floor: usize,
    registry: Registry,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    /// An empty program without a version header.
    pub fn new() -> Self {
        Self {
            version: None,
            stack: vec![Scope::new(ScopeKind::Top)],
            floor: 1,
            registry: Registry::default(),
        }
    }

    /// An empty program starting with `OPENQASM <version>;`.
    pub fn with_version(version: &str) -> Result<Self> {
        let parsed = version
            .parse::<ir::Version>()
            .map_err(|reason| Error::InvalidVersion {
                version: version.to_string(),
                reason,
            })?;
        Ok(Self {
            version: Some(parsed),
            ..Self::new()
        })
    }

    pub fn version(&self) -> Option<ir::Version> {
        self.version
    }

    fn scope(&mut self) -> &mut Scope {
        if self.stack.is_empty() {
            self.stack.push(Scope::new(ScopeKind::Top));
        }
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Number of scopes opened and not yet closed.
    pub fn open_scopes(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Run `f` against the registry and commit what it registered, only if
    /// it succeeds.
    fn lower<T>(&mut self, f: impl FnOnce(&mut Lowerer<'_>) -> Result<T>) -> Result<T> {
        let mut lowerer = Lowerer::new(&self.registry);
        let value = f(&mut lowerer)?;
        let pending = lowerer.finish();
        self.registry.commit(pending);
        Ok(value)
    }

    fn emit(
        &mut self,
        build: impl FnOnce(&mut Lowerer<'_>) -> Result<Vec<ir::Statement>>,
    ) -> Result<&mut Self> {
        let statements = self.lower(build)?;
        for statement in statements {
            self.push_statement(statement);
        }
        Ok(self)
    }

    fn push_statement(&mut self, statement: ir::Statement) {
        if log_enabled!(Level::Trace) {
            trace!(
                "emit at depth {}: {}",
                self.open_scopes(),
                render_statement(&statement, &FormatOptions::default())
            );
        }
        let scope = self.scope();
        scope.body.push(statement);
        scope.accepts_else = false;
    }

    /// Declare variables. A variable already declared in scope is skipped.
    pub fn declare(&mut self, vars: impl IntoVars) -> Result<&mut Self> {
        let vars = vars.into_vars();
        self.emit(|lw| {
            let mut statements = Vec::with_capacity(vars.len());
            for var in &vars {
                if let Some(statement) = lw.declare(var)? {
                    statements.push(statement);
                }
            }
            Ok(statements)
        })
    }

    /// `target <op> value;` with `value` adapted to the target's type.
    pub fn assign(
        &mut self,
        target: impl IntoExpr,
        op: AssignOp,
        value: impl IntoExpr,
    ) -> Result<&mut Self> {
        let target = target.into_expr()?;
        if !matches!(target, Expr::Var(_) | Expr::Index { .. } | Expr::Raw(_)) {
            return Err(Error::NotAssignable {
                expr: target.to_string(),
            });
        }
        let value = value.into_expr()?;
        let value = match target.ty() {
            Some(ty) => coerce_to(&ty, value)?,
            None => value,
        };
        self.emit(|lw| {
            Ok(vec![ir::Statement::Assignment {
                target: lw.expr(&target)?,
                op,
                value: lw.expr(&value)?,
            }])
        })
    }

    /// `target = value;`
    pub fn set(&mut self, target: impl IntoExpr, value: impl IntoExpr) -> Result<&mut Self> {
        self.assign(target, AssignOp::Set, value)
    }

    /// `target += value;`
    pub fn increment(&mut self, target: impl IntoExpr, value: impl IntoExpr) -> Result<&mut Self> {
        self.assign(target, AssignOp::Add, value)
    }

    /// `target -= value;`
    pub fn decrement(&mut self, target: impl IntoExpr, value: impl IntoExpr) -> Result<&mut Self> {
        self.assign(target, AssignOp::Sub, value)
    }

    /// `target %= value;`
    pub fn mod_equals(&mut self, target: impl IntoExpr, value: impl IntoExpr) -> Result<&mut Self> {
        self.assign(target, AssignOp::Mod, value)
    }

    pub fn reset(&mut self, qubit: impl IntoExpr) -> Result<&mut Self> {
        let qubit = qubit.into_expr()?;
        self.emit(|lw| Ok(vec![ir::Statement::Reset(lw.expr(&qubit)?)]))
    }

    /// `measure qubit;`
    pub fn measure(&mut self, qubit: impl IntoExpr) -> Result<&mut Self> {
        let qubit = qubit.into_expr()?;
        self.emit(|lw| {
            Ok(vec![ir::Statement::Measure {
                qubit: lw.expr(&qubit)?,
                target: None,
            }])
        })
    }

    /// `target = measure qubit;`
    pub fn measure_into(&mut self, qubit: impl IntoExpr, target: impl IntoExpr) -> Result<&mut Self> {
        let qubit = qubit.into_expr()?;
        let target = target.into_expr()?;
        self.emit(|lw| {
            Ok(vec![ir::Statement::Measure {
                qubit: lw.expr(&qubit)?,
                target: Some(lw.expr(&target)?),
            }])
        })
    }

    fn frame_call(&mut self, name: &str, frame: impl IntoExpr, arg: impl IntoExpr) -> Result<&mut Self> {
        let frame = frame.into_expr()?;
        match frame.ty() {
            Some(VarType::Frame) | None => {}
            Some(other) => {
                return Err(Error::type_mismatch(
                    "a frame",
                    format!("`{frame}` of type `{other}`"),
                ));
            }
        }
        let call = Expr::Call(Box::new(Call {
            callee: Callee::builtin(name, None),
            args: vec![frame, arg.into_expr()?],
        }));
        self.emit(|lw| Ok(vec![ir::Statement::Expression(lw.expr(&call)?)]))
    }

    /// `play(frame, waveform);`
    pub fn play(&mut self, frame: impl IntoExpr, waveform: impl IntoExpr) -> Result<&mut Self> {
        self.frame_call("play", frame, waveform)
    }

    /// `capture(frame, kernel);`
    pub fn capture(&mut self, frame: impl IntoExpr, kernel: impl IntoExpr) -> Result<&mut Self> {
        self.frame_call("capture", frame, kernel)
    }

    pub fn set_frequency(&mut self, frame: impl IntoExpr, freq: impl IntoExpr) -> Result<&mut Self> {
        self.frame_call("set_frequency", frame, freq)
    }

    pub fn shift_frequency(&mut self, frame: impl IntoExpr, freq: impl IntoExpr) -> Result<&mut Self> {
        self.frame_call("shift_frequency", frame, freq)
    }

    pub fn set_phase(&mut self, frame: impl IntoExpr, phase: impl IntoExpr) -> Result<&mut Self> {
        self.frame_call("set_phase", frame, phase)
    }

    pub fn shift_phase(&mut self, frame: impl IntoExpr, phase: impl IntoExpr) -> Result<&mut Self> {
        self.frame_call("shift_phase", frame, phase)
    }

    pub fn set_scale(&mut self, frame: impl IntoExpr, scale: impl IntoExpr) -> Result<&mut Self> {
        self.frame_call("set_scale", frame, scale)
    }

    pub fn shift_scale(&mut self, frame: impl IntoExpr, scale: impl IntoExpr) -> Result<&mut Self> {
        self.frame_call("shift_scale", frame, scale)
    }

    /// `delay[duration] targets;`. Numbers are read as seconds.
    pub fn delay(&mut self, duration: impl IntoExpr, targets: impl IntoTargets) -> Result<&mut Self> {
        let duration = make_duration(duration)?;
        let targets = targets.into_targets();
        self.emit(|lw| {
            Ok(vec![ir::Statement::Delay {
                duration: lw.expr(&duration)?,
                targets: lw.exprs(&targets)?,
            }])
        })
    }

    pub fn barrier(&mut self, targets: impl IntoTargets) -> Result<&mut Self> {
        let targets = targets.into_targets();
        self.emit(|lw| Ok(vec![ir::Statement::Barrier(lw.exprs(&targets)?)]))
    }

    /// `name qubits;`
    pub fn gate(&mut self, qubits: impl IntoTargets, name: impl Into<String>) -> Result<&mut Self> {
        self.gate_with_args(qubits, name, &[])
    }

    /// `name(args) qubits;`
    pub fn gate_with_args(
        &mut self,
        qubits: impl IntoTargets,
        name: impl Into<String>,
        args: &[Expr],
    ) -> Result<&mut Self> {
        let qubits = qubits.into_targets();
        let name = name.into();
        self.emit(|lw| {
            Ok(vec![ir::Statement::Gate {
                name,
                args: lw.exprs(args)?,
                qubits: lw.exprs(&qubits)?,
            }])
        })
    }

    /// Use an expression as a statement, e.g. an extern call whose result
    /// is discarded.
    pub fn evaluate(&mut self, expr: impl IntoExpr) -> Result<&mut Self> {
        let expr = expr.into_expr()?;
        self.emit(|lw| Ok(vec![ir::Statement::Expression(lw.expr(&expr)?)]))
    }

    pub fn include(&mut self, path: impl Into<String>) -> Result<&mut Self> {
        self.push_statement(ir::Statement::Include(path.into()));
        Ok(self)
    }

    /// `pragma text`
    pub fn pragma(&mut self, text: impl Into<String>) -> Result<&mut Self> {
        self.push_statement(ir::Statement::Pragma(text.into()));
        Ok(self)
    }

    /// Frames seen anywhere in the program, in first-use order.
    pub fn frame_vars(&self) -> impl Iterator<Item = &Var> {
        self.registry.frame_vars()
    }

    /// Waveform variables seen anywhere in the program, in first-use order.
    /// Inline waveforms are not variables and are not listed.
    pub fn waveform_vars(&self) -> impl Iterator<Item = &Var> {
        self.registry.waveform_vars()
    }

    /// Variables explicitly declared at the top level.
    pub fn declared_vars(&self) -> impl Iterator<Item = &Var> {
        self.registry.globals()
    }

    /// Externs used so far, in first-use order.
    pub fn externs(&self) -> impl Iterator<Item = &Extern> {
        self.registry.externs()
    }

    /// Closed `defcal` blocks keyed by (targets, gate name).
    pub fn defcals(&self) -> &indexmap::IndexMap<DefcalKey, ir::Statement> {
        self.registry.defcals()
    }

    /// The `defcal` of gate `name` on `target` (space-separated qubits).
    pub fn find_defcal(&self, target: &str, name: &str) -> Option<&ir::Statement> {
        self.registry
            .defcals()
            .get(&(target.to_string(), name.to_string()))
    }
}

/// Qubit or frame operands of a statement.
///
/// Implemented for single variables and expressions, for collections of
/// them, and for `()` meaning no operands.
pub trait IntoTargets {
    fn into_targets(self) -> Vec<Expr>;
}

impl IntoTargets for () {
    fn into_targets(self) -> Vec<Expr> {
        Vec::new()
    }
}

impl IntoTargets for Var {
    fn into_targets(self) -> Vec<Expr> {
        vec![Expr::from(self)]
    }
}

impl IntoTargets for &Var {
    fn into_targets(self) -> Vec<Expr> {
        vec![Expr::from(self)]
    }
}

impl IntoTargets for Expr {
    fn into_targets(self) -> Vec<Expr> {
        vec![self]
    }
}

impl IntoTargets for &Expr {
    fn into_targets(self) -> Vec<Expr> {
        vec![self.clone()]
    }
}

impl<T: Into<Expr>> IntoTargets for Vec<T> {
    fn into_targets(self) -> Vec<Expr> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Expr>, const N: usize> IntoTargets for [T; N] {
    fn into_targets(self) -> Vec<Expr> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<'a, T> IntoTargets for &'a [T]
where
    &'a T: Into<Expr>,
{
    fn into_targets(self) -> Vec<Expr> {
        self.iter().map(Into::into).collect()
    }
}

/// One or more variables to declare.
pub trait IntoVars {
    fn into_vars(self) -> Vec<Var>;
}

impl IntoVars for Var {
    fn into_vars(self) -> Vec<Var> {
        vec![self]
    }
}

impl IntoVars for &Var {
    fn into_vars(self) -> Vec<Var> {
        vec![self.clone()]
    }
}

impl<T: Borrow<Var>> IntoVars for Vec<T> {
    fn into_vars(self) -> Vec<Var> {
        self.iter().map(|var| var.borrow().clone()).collect()
    }
}

impl<T: Borrow<Var>, const N: usize> IntoVars for [T; N] {
    fn into_vars(self) -> Vec<Var> {
        self.iter().map(|var| var.borrow().clone()).collect()
    }
}

impl<T: Borrow<Var>> IntoVars for &[T] {
    fn into_vars(self) -> Vec<Var> {
        self.iter().map(|var| var.borrow().clone()).collect()
    }
}
