//! Scoped blocks: `if`/`else`, loops, `box`, `cal`, `defcal` and
//! subroutine bodies.
//!
//! Each block can be driven explicitly (`open_*` then [`Program::close`])
//! or through a closure that receives the program with the block open.
//! A closure that fails rolls the program back to where it was before the
//! block opened.

use std::num::NonZeroI64;
use std::ops::{Range, RangeInclusive};

use log::debug;
use oqforge_ir as ir;

use super::{Program, Scope, ScopeKind};
use crate::call::{Defcal, Signature, Subroutine};
use crate::error::{Error, Result};
use crate::expr::{Expr, IntoExpr, Literal, check_guard, coerce_to, make_duration};
use crate::registry::{Registry, TableKind};
use crate::types::{Number, VarType};
use crate::var::Var;

/// What a `for` loop iterates over.
#[derive(Debug, Clone, PartialEq)]
pub enum Iterable {
    /// Inclusive integer range, `[start:end]` or `[start:step:end]`.
    Range {
        start: i64,
        step: Option<i64>,
        end: i64,
    },
    /// Explicit values, `{a, b, c}`.
    Values(Vec<Number>),
    /// A named array or waveform, referenced bare.
    Var(Var),
}

impl Iterable {
    /// The integers `start, start + step, ...` stopping before `stop`.
    ///
    /// An empty range whose bounds cannot be written as `i64` becomes an
    /// empty value list.
    pub fn range_step(start: i64, stop: i64, step: NonZeroI64) -> Self {
        let step = step.get();
        let (first, last, stride) = (i128::from(start), i128::from(stop), i128::from(step));
        let span = last - first;
        let count = if stride > 0 {
            (span + stride - 1).div_euclid(stride)
        } else {
            (-span - stride - 1).div_euclid(-stride)
        };
        let end = if count > 0 {
            first + (count - 1) * stride
        } else {
            last - stride
        };
        match i64::try_from(end) {
            Ok(end) => Iterable::Range {
                start,
                step: Some(step),
                end,
            },
            Err(_) => Iterable::Values(Vec::new()),
        }
    }

    /// `start..end` as an inclusive range.
    fn half_open(start: i64, end: i64) -> Self {
        match end.checked_sub(1) {
            Some(end) => Iterable::Range {
                start,
                step: None,
                end,
            },
            None => Iterable::Values(Vec::new()),
        }
    }

    fn to_ir(&self) -> ir::Expression {
        match self {
            Iterable::Range { start, step, end } => ir::Expression::Range {
                start: Some(Box::new(ir::Expression::Int(*start))),
                step: step.map(|step| Box::new(ir::Expression::Int(step))),
                end: Some(Box::new(ir::Expression::Int(*end))),
            },
            Iterable::Values(values) => Literal::array(values.iter().copied()).to_ir(),
            Iterable::Var(var) => ir::Expression::ident(var.name()),
        }
    }
}

macro_rules! iterable_from_ranges {
    ($($ty:ty),+) => {
        $(
            impl From<Range<$ty>> for Iterable {
                fn from(range: Range<$ty>) -> Self {
                    Iterable::half_open(i64::from(range.start), i64::from(range.end))
                }
            }

            impl From<RangeInclusive<$ty>> for Iterable {
                fn from(range: RangeInclusive<$ty>) -> Self {
                    Iterable::Range {
                        start: i64::from(*range.start()),
                        step: None,
                        end: i64::from(*range.end()),
                    }
                }
            }
        )+
    };
}

iterable_from_ranges!(i32, i64, u32);

impl<T: Into<Number>> From<Vec<T>> for Iterable {
    fn from(values: Vec<T>) -> Self {
        Iterable::Values(Number::widen(values.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Number>, const N: usize> From<[T; N]> for Iterable {
    fn from(values: [T; N]) -> Self {
        Iterable::from(Vec::from(values))
    }
}

impl From<&Var> for Iterable {
    fn from(var: &Var) -> Self {
        Iterable::Var(var.clone())
    }
}

impl From<Var> for Iterable {
    fn from(var: Var) -> Self {
        Iterable::Var(var)
    }
}

impl Program {
    fn open(&mut self, kind: ScopeKind) -> &mut Self {
        debug!("open {} scope at depth {}", kind.name(), self.open_scopes() + 1);
        self.stack.push(Scope::new(kind));
        self
    }

    fn innermost(&self) -> &'static str {
        self.stack
            .last()
            .map_or("top level", |scope| scope.kind.name())
    }

    fn lower_guard(&mut self, condition: impl IntoExpr) -> Result<ir::Expression> {
        let condition = condition.into_expr()?;
        check_guard(&condition)?;
        self.lower(|lw| lw.expr(&condition))
    }

    fn ensure_else_allowed(&mut self) -> Result<()> {
        if self.scope().accepts_else {
            Ok(())
        } else {
            Err(Error::ElseWithoutIf)
        }
    }

    /// Open `if (condition) {`.
    pub fn open_if(&mut self, condition: impl IntoExpr) -> Result<&mut Self> {
        let condition = self.lower_guard(condition)?;
        Ok(self.open(ScopeKind::If(condition)))
    }

    /// Open `} else if (condition) {`; the last statement must be an `if`
    /// without an `else` block.
    pub fn open_else_if(&mut self, condition: impl IntoExpr) -> Result<&mut Self> {
        self.ensure_else_allowed()?;
        let condition = self.lower_guard(condition)?;
        Ok(self.open(ScopeKind::ElseIf(condition)))
    }

    /// Open `} else {`; the last statement must be an `if` without an
    /// `else` block.
    pub fn open_else(&mut self) -> Result<&mut Self> {
        self.ensure_else_allowed()?;
        Ok(self.open(ScopeKind::Else))
    }

    /// Open `for int name in iterable {` and return the loop variable.
    pub fn open_for(&mut self, iterable: impl Into<Iterable>, name: &str) -> Result<Var> {
        let var = Var::new(name, VarType::Int(None)).without_declaration();
        self.open_for_var(iterable, &var)?;
        Ok(var)
    }

    /// Open a `for` loop with a caller-supplied loop variable, whose type
    /// is used as the loop type.
    pub fn open_for_var(&mut self, iterable: impl Into<Iterable>, var: &Var) -> Result<&mut Self> {
        let iterable = iterable.into();
        let iterable = match &iterable {
            Iterable::Var(source) => self.lower(|lw| lw.expr(&Expr::from(source)))?,
            other => other.to_ir(),
        };
        self.registry
            .push_table(TableKind::Block, std::slice::from_ref(var));
        Ok(self.open(ScopeKind::For {
            var_type: var.ty().to_ir(),
            var: var.name().to_string(),
            iterable,
        }))
    }

    /// Open `while (condition) {`.
    pub fn open_while(&mut self, condition: impl IntoExpr) -> Result<&mut Self> {
        let condition = self.lower_guard(condition)?;
        Ok(self.open(ScopeKind::While(condition)))
    }

    /// Open `box {`.
    pub fn open_box(&mut self) -> Result<&mut Self> {
        Ok(self.open(ScopeKind::Box(None)))
    }

    /// Open `box[duration] {`.
    pub fn open_box_for(&mut self, duration: impl IntoExpr) -> Result<&mut Self> {
        let duration = make_duration(duration)?;
        let duration = self.lower(|lw| lw.expr(&duration))?;
        Ok(self.open(ScopeKind::Box(Some(duration))))
    }

    /// Open `cal {`. Declarations made inside stay visible after it closes.
    pub fn open_cal(&mut self) -> Result<&mut Self> {
        self.registry.push_table(TableKind::Calibration, &[]);
        Ok(self.open(ScopeKind::Cal))
    }

    /// Open `defcal name(params) qubits -> ret {`.
    pub fn open_defcal(&mut self, defcal: Defcal) -> Result<&mut Self> {
        let key = (defcal.target(), defcal.name.clone());
        let qubits = self.lower(|lw| lw.exprs(&defcal.qubits))?;
        let params = defcal
            .params
            .iter()
            .map(|param| ir::Param::new(param.ty().to_ir(), param.name()))
            .collect();
        self.registry
            .push_table(TableKind::Calibration, &defcal.params);
        Ok(self.open(ScopeKind::Defcal {
            key,
            params,
            qubits,
            returns: defcal.returns.as_ref().map(VarType::to_ir),
        }))
    }

    /// Close the innermost block and append it to its parent.
    pub fn close(&mut self) -> Result<&mut Self> {
        if self.stack.len() <= 1 {
            return Err(Error::NoOpenScope);
        }
        if self.stack.len() <= self.floor {
            return Err(Error::ScopeMismatch {
                expected: "block",
                found: self.innermost(),
            });
        }
        let definition = match self.stack.last() {
            Some(Scope {
                kind:
                    ScopeKind::Defcal {
                        key,
                        params,
                        qubits,
                        returns,
                    },
                body,
                ..
            }) => {
                let definition = ir::Statement::Defcal {
                    name: key.1.clone(),
                    params: params.clone(),
                    qubits: qubits.clone(),
                    returns: returns.clone(),
                    body: body.clone(),
                };
                self.registry.check_defcal(key, &definition)?;
                Some((key.clone(), definition))
            }
            _ => None,
        };
        let Some(scope) = self.stack.pop() else {
            return Err(Error::NoOpenScope);
        };
        debug!("close {} scope at depth {}", scope.kind.name(), self.open_scopes() + 1);
        match scope.kind {
            ScopeKind::If(condition) => {
                self.push_statement(ir::Statement::If {
                    condition,
                    then_body: scope.body,
                    else_body: Vec::new(),
                });
                self.scope().accepts_else = true;
            }
            ScopeKind::ElseIf(condition) => {
                let nested = ir::Statement::If {
                    condition,
                    then_body: scope.body,
                    else_body: Vec::new(),
                };
                self.attach_else(vec![nested])?;
                self.scope().accepts_else = true;
            }
            ScopeKind::Else => {
                self.attach_else(scope.body)?;
                self.scope().accepts_else = false;
            }
            ScopeKind::For {
                var_type,
                var,
                iterable,
            } => {
                self.registry.pop_table();
                self.push_statement(ir::Statement::For {
                    var_type,
                    var,
                    iterable,
                    body: scope.body,
                });
            }
            ScopeKind::While(condition) => self.push_statement(ir::Statement::While {
                condition,
                body: scope.body,
            }),
            ScopeKind::Box(duration) => self.push_statement(ir::Statement::Box {
                duration,
                body: scope.body,
            }),
            ScopeKind::Cal => {
                self.registry.pop_table();
                self.push_statement(ir::Statement::Cal(scope.body));
            }
            ScopeKind::Defcal { .. } => {
                self.registry.pop_table();
                if let Some((key, definition)) = definition {
                    self.registry.record_defcal(key, definition.clone());
                    self.push_statement(definition);
                }
            }
            ScopeKind::Top | ScopeKind::Subroutine => {}
        }
        Ok(self)
    }

    /// Put `body` in the empty else branch at the end of the trailing
    /// if/else-if chain.
    fn attach_else(&mut self, body: Vec<ir::Statement>) -> Result<()> {
        let slot = self
            .scope()
            .body
            .last_mut()
            .and_then(open_else_branch)
            .ok_or(Error::ElseWithoutIf)?;
        *slot = body;
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            depth: self.stack.len(),
            body_len: self.stack.last().map_or(0, |scope| scope.body.len()),
            accepts_else: self.stack.last().is_some_and(|scope| scope.accepts_else),
            registry: self.registry.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.stack.truncate(checkpoint.depth);
        let scope = self.scope();
        scope.body.truncate(checkpoint.body_len);
        scope.accepts_else = checkpoint.accepts_else;
        self.registry = checkpoint.registry;
    }

    /// Run `body` with every scope up to the current depth protected from
    /// `close`.
    fn guarded<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let floor = std::mem::replace(&mut self.floor, self.stack.len());
        let result = body(self);
        self.floor = floor;
        result
    }

    /// Open a block with `open`, run `body` inside it and close it. On any
    /// failure the program is restored.
    fn scoped<T>(
        &mut self,
        open: impl FnOnce(&mut Self) -> Result<T>,
        body: impl FnOnce(&mut Self, T) -> Result<()>,
    ) -> Result<&mut Self> {
        let checkpoint = self.checkpoint();
        match self.run_scoped(open, body) {
            Ok(()) => Ok(self),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    fn run_scoped<T>(
        &mut self,
        open: impl FnOnce(&mut Self) -> Result<T>,
        body: impl FnOnce(&mut Self, T) -> Result<()>,
    ) -> Result<()> {
        let handle = open(self)?;
        let depth = self.stack.len();
        let expected = self.innermost();
        self.guarded(|prog| body(prog, handle))?;
        if self.stack.len() != depth {
            return Err(Error::ScopeMismatch {
                expected,
                found: self.innermost(),
            });
        }
        self.close()?;
        Ok(())
    }

    pub fn if_(
        &mut self,
        condition: impl IntoExpr,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<&mut Self> {
        self.scoped(|prog| prog.open_if(condition).map(drop), |prog, ()| body(prog))
    }

    pub fn else_if(
        &mut self,
        condition: impl IntoExpr,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<&mut Self> {
        self.scoped(
            |prog| prog.open_else_if(condition).map(drop),
            |prog, ()| body(prog),
        )
    }

    pub fn else_(&mut self, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<&mut Self> {
        self.scoped(|prog| prog.open_else().map(drop), |prog, ()| body(prog))
    }

    /// Loop over `iterable` with an `int` loop variable called `name`,
    /// handed to `body`.
    pub fn for_in(
        &mut self,
        iterable: impl Into<Iterable>,
        name: &str,
        body: impl FnOnce(&mut Self, &Var) -> Result<()>,
    ) -> Result<&mut Self> {
        self.scoped(
            |prog| prog.open_for(iterable, name),
            |prog, var| body(prog, &var),
        )
    }

    pub fn while_(
        &mut self,
        condition: impl IntoExpr,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<&mut Self> {
        self.scoped(
            |prog| prog.open_while(condition).map(drop),
            |prog, ()| body(prog),
        )
    }

    pub fn box_(&mut self, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<&mut Self> {
        self.scoped(|prog| prog.open_box().map(drop), |prog, ()| body(prog))
    }

    pub fn box_for(
        &mut self,
        duration: impl IntoExpr,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<&mut Self> {
        self.scoped(
            |prog| prog.open_box_for(duration).map(drop),
            |prog, ()| body(prog),
        )
    }

    pub fn cal(&mut self, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<&mut Self> {
        self.scoped(|prog| prog.open_cal().map(drop), |prog, ()| body(prog))
    }

    pub fn defcal(
        &mut self,
        defcal: Defcal,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<&mut Self> {
        self.scoped(
            |prog| prog.open_defcal(defcal).map(drop),
            |prog, ()| body(prog),
        )
    }

    /// Define a subroutine. `body` receives the parameter variables and may
    /// return the value of the trailing `return` statement.
    ///
    /// The definition is emitted once, before the first program statement,
    /// by any program that calls it.
    pub fn subroutine(
        &mut self,
        signature: Signature,
        body: impl FnOnce(&mut Self, &[Var]) -> Result<Option<Expr>>,
    ) -> Result<Subroutine> {
        let (params, returns) = signature.resolve()?;
        let checkpoint = self.checkpoint();
        match self.run_subroutine(&params, returns, body) {
            Ok(statements) => {
                debug!("defined subroutine `{}`", signature.name());
                Ok(Subroutine::new(
                    signature.name().to_string(),
                    &params,
                    returns,
                    statements,
                ))
            }
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    fn run_subroutine(
        &mut self,
        params: &[Var],
        returns: Option<VarType>,
        body: impl FnOnce(&mut Self, &[Var]) -> Result<Option<Expr>>,
    ) -> Result<Vec<ir::Statement>> {
        self.registry.push_table(TableKind::Isolated, params);
        self.open(ScopeKind::Subroutine);
        let depth = self.stack.len();
        let value = self.guarded(|prog| body(prog, params))?;
        if self.stack.len() != depth {
            return Err(Error::ScopeMismatch {
                expected: "subroutine",
                found: self.innermost(),
            });
        }
        if let Some(value) = value {
            let value = match returns {
                Some(ty) => coerce_to(&ty, value)?,
                None => value,
            };
            self.emit(|lw| Ok(vec![ir::Statement::Return(Some(lw.expr(&value)?))]))?;
        }
        let scope = self.stack.pop().map(|scope| scope.body).unwrap_or_default();
        self.registry.pop_table();
        Ok(scope)
    }
}

/// State a failed closure block rolls back to. Scopes below `depth` are
/// guarded from `close` while the block runs, so only the enclosing
/// scope's tail and the registry can have changed.
struct Checkpoint {
    depth: usize,
    body_len: usize,
    accepts_else: bool,
    registry: Registry,
}

/// The empty else branch at the end of an if/else-if chain, if any.
fn open_else_branch(statement: &mut ir::Statement) -> Option<&mut Vec<ir::Statement>> {
    let ir::Statement::If { else_body, .. } = statement else {
        return None;
    };
    if else_body.is_empty() {
        return Some(else_body);
    }
    match else_body.as_mut_slice() {
        [nested @ ir::Statement::If { .. }] => open_else_branch(nested),
        _ => None,
    }
}
