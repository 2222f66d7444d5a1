//! Expression trees built from variables and literals.

use std::fmt;
use std::time::Duration;

use oqforge_codegen::{FormatOptions, render_expression};
use oqforge_ir as ir;

pub use oqforge_ir::{BinaryOp, UnaryOp};

use crate::call::Call;
use crate::error::{Error, Result};
use crate::types::{Complex, Number, VarType};
use crate::var::Var;

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex),
    /// A duration in seconds.
    Duration(f64),
    /// A sequence of numbers, widened to one category.
    Array(Vec<Number>),
}

impl Literal {
    /// Build an array literal, widening the values to their widest category.
    pub fn array(values: impl IntoIterator<Item = impl Into<Number>>) -> Self {
        Literal::Array(Number::widen(values.into_iter().map(Into::into).collect()))
    }

    fn ty(&self) -> Option<VarType> {
        match self {
            Literal::Bool(_) => Some(VarType::Bool),
            Literal::Int(_) => Some(VarType::Int(None)),
            Literal::Float(_) => Some(VarType::Float(None)),
            Literal::Complex(_) => Some(VarType::COMPLEX128),
            Literal::Duration(_) => Some(VarType::Duration),
            Literal::Array(_) => None,
        }
    }

    pub(crate) fn to_ir(&self) -> ir::Expression {
        match self {
            Literal::Bool(v) => ir::Expression::Bool(*v),
            Literal::Int(v) => ir::Expression::Int(*v),
            Literal::Float(v) => ir::Expression::Float(*v),
            Literal::Complex(c) => ir::Expression::Complex { re: c.re, im: c.im },
            Literal::Duration(seconds) => ir::Expression::Duration(*seconds),
            Literal::Array(values) => ir::Expression::Set(values.iter().map(Number::to_ir).collect()),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Literal::Bool(_) => "a bool literal",
            Literal::Int(_) => "an int literal",
            Literal::Float(_) => "a float literal",
            Literal::Complex(_) => "a complex literal",
            Literal::Duration(_) => "a duration literal",
            Literal::Array(_) => "an array literal",
        }
    }
}

/// An expression node.
///
/// Expressions are immutable values. Variables inside them are registered
/// with a program only when the expression is used by a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Var(Var),
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Explicit grouping, always printed.
    Paren(Box<Expr>),
    Call(Box<Call>),
    /// A syntax node passed through untouched.
    Raw(ir::Expression),
}

impl Expr {
    /// A duration literal of `seconds`.
    pub fn duration(seconds: f64) -> Self {
        Expr::Literal(Literal::Duration(seconds))
    }

    /// Inferred result type, `None` when unknown (raw nodes, arrays).
    pub fn ty(&self) -> Option<VarType> {
        match self {
            Expr::Literal(literal) => literal.ty(),
            Expr::Var(var) => Some(var.ty()),
            Expr::Index { .. } => Some(VarType::Bit(None)),
            Expr::Unary {
                op: UnaryOp::Not, ..
            } => Some(VarType::Bool),
            Expr::Unary { operand, .. } => operand.ty(),
            Expr::Binary { op, .. } if op.is_comparison() || op.is_logical() => {
                Some(VarType::Bool)
            }
            Expr::Binary {
                op: BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Mod
                | BinaryOp::Pow,
                lhs,
                rhs,
            } => promote(lhs.ty(), rhs.ty()),
            Expr::Binary { lhs, .. } => lhs.ty(),
            Expr::Paren(inner) => inner.ty(),
            Expr::Call(call) => call.callee.returns(),
            Expr::Raw(_) => None,
        }
    }

    /// Lower to a syntax node without touching any program state.
    pub fn to_ir(&self) -> ir::Expression {
        match self {
            Expr::Literal(literal) => literal.to_ir(),
            Expr::Var(var) => ir::Expression::ident(var.name()),
            Expr::Index { target, index } => ir::Expression::Index {
                target: Box::new(target.to_ir()),
                index: vec![index.to_ir()],
            },
            Expr::Unary { op, operand } => ir::Expression::Unary {
                op: *op,
                operand: Box::new(operand.to_ir()),
            },
            Expr::Binary { op, lhs, rhs } => ir::Expression::binary(*op, lhs.to_ir(), rhs.to_ir()),
            Expr::Paren(inner) => ir::Expression::Paren(Box::new(inner.to_ir())),
            Expr::Call(call) => ir::Expression::call(
                call.callee.name(),
                call.args.iter().map(Expr::to_ir).collect(),
            ),
            Expr::Raw(node) => node.clone(),
        }
    }

    fn is_comparison(&self) -> bool {
        matches!(self, Expr::Binary { op, .. } if op.is_comparison())
    }
}

fn rank(ty: &VarType) -> u8 {
    match ty {
        VarType::Duration => 5,
        VarType::Angle(_) => 4,
        VarType::Complex(_) => 3,
        VarType::Float(_) => 2,
        VarType::Int(_) | VarType::Uint(_) => 1,
        _ => 0,
    }
}

fn promote(lhs: Option<VarType>, rhs: Option<VarType>) -> Option<VarType> {
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) if rank(&rhs) > rank(&lhs) => Some(rhs),
        (Some(lhs), _) => Some(lhs),
        (None, rhs) => rhs,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_expression(&self.to_ir(), &FormatOptions::default()))
    }
}

/// Builder methods shared by everything that can stand on the left of an
/// operator.
///
/// ```
/// use oqforge::{Expr, Operand, Var};
///
/// let i = Var::int("i");
/// let j = Var::int("j");
/// let e = Expr::from(2).times(i.plus(&j));
/// assert_eq!(e.to_string(), "2 * (i + j)");
/// ```
pub trait Operand: Sized {
    fn into_operand(self) -> Expr;

    fn binary(self, op: BinaryOp, rhs: impl Into<Expr>) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(self.into_operand()),
            rhs: Box::new(rhs.into()),
        }
    }

    fn plus(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Add, rhs)
    }

    fn minus(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Sub, rhs)
    }

    fn times(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Mul, rhs)
    }

    fn divided_by(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Div, rhs)
    }

    fn modulo(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Mod, rhs)
    }

    fn pow(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Pow, rhs)
    }

    fn lt(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Lt, rhs)
    }

    fn le(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Le, rhs)
    }

    fn gt(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Gt, rhs)
    }

    fn ge(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ge, rhs)
    }

    fn equals(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Eq, rhs)
    }

    fn not_equals(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ne, rhs)
    }

    fn logical_and(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::And, rhs)
    }

    fn logical_or(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Or, rhs)
    }

    fn bit_and(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::BitAnd, rhs)
    }

    fn bit_or(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::BitOr, rhs)
    }

    fn bit_xor(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::BitXor, rhs)
    }

    fn shl(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Shl, rhs)
    }

    fn shr(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Shr, rhs)
    }

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self.into_operand()),
        }
    }

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self.into_operand()),
        }
    }

    fn bit_not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::BitNot,
            operand: Box::new(self.into_operand()),
        }
    }

    /// Group explicitly; the printer keeps the parentheses.
    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self.into_operand()))
    }
}

impl Operand for Expr {
    fn into_operand(self) -> Expr {
        self
    }
}

impl Operand for &Expr {
    fn into_operand(self) -> Expr {
        self.clone()
    }
}

impl Operand for &Var {
    fn into_operand(self) -> Expr {
        Expr::Var(self.clone())
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Literal(Literal::Bool(value))
    }
}

macro_rules! expr_from_number {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::from(Number::from(value))
                }
            }
        )+
    };
}

expr_from_number!(i8, i16, i32, i64, u8, u16, u32, f32, f64, Complex);

impl From<Number> for Expr {
    fn from(value: Number) -> Self {
        Expr::Literal(match value {
            Number::Int(v) => Literal::Int(v),
            Number::Float(v) => Literal::Float(v),
            Number::Complex(v) => Literal::Complex(v),
        })
    }
}

impl From<Duration> for Expr {
    fn from(value: Duration) -> Self {
        Expr::duration(value.as_secs_f64())
    }
}

impl From<Literal> for Expr {
    fn from(value: Literal) -> Self {
        Expr::Literal(value)
    }
}

impl From<Var> for Expr {
    fn from(value: Var) -> Self {
        Expr::Var(value)
    }
}

impl From<&Var> for Expr {
    fn from(value: &Var) -> Self {
        Expr::Var(value.clone())
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

impl From<ir::Expression> for Expr {
    fn from(value: ir::Expression) -> Self {
        Expr::Raw(value)
    }
}

impl<T: Into<Number>> From<Vec<T>> for Expr {
    fn from(values: Vec<T>) -> Self {
        Expr::Literal(Literal::array(values))
    }
}

impl<T: Into<Number>, const N: usize> From<[T; N]> for Expr {
    fn from(values: [T; N]) -> Self {
        Expr::Literal(Literal::array(values))
    }
}

impl<T: Into<Number> + Copy> From<&[T]> for Expr {
    fn from(values: &[T]) -> Self {
        Expr::Literal(Literal::array(values.iter().copied()))
    }
}

/// Conversion into an expression, checked at the call site.
///
/// Everything that can appear where an expression is expected implements
/// this trait. Implement it for your own types to pass them to the builder
/// directly:
///
/// ```
/// use oqforge::{Expr, IntoExpr, Result, Var};
///
/// struct Settle(&'static str);
///
/// impl IntoExpr for Settle {
///     fn into_expr(self) -> Result<Expr> {
///         Ok(Var::duration(self.0).with_init(100e-9)?.into())
///     }
/// }
///
/// assert_eq!(Settle("settle").into_expr().unwrap().to_string(), "settle");
/// ```
pub trait IntoExpr {
    fn into_expr(self) -> Result<Expr>;
}

macro_rules! into_expr_via_from {
    ($($ty:ty),+) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self) -> Result<Expr> {
                    Ok(Expr::from(self))
                }
            }
        )+
    };
}

into_expr_via_from!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    Complex,
    Number,
    Duration,
    Literal,
    Var,
    Expr,
    ir::Expression
);

impl IntoExpr for &Var {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::from(self))
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Result<Expr> {
        Ok(self.clone())
    }
}

impl<T: Into<Number>> IntoExpr for Vec<T> {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::from(self))
    }
}

impl<T: Into<Number>, const N: usize> IntoExpr for [T; N] {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::from(self))
    }
}

impl<T: Into<Number> + Copy> IntoExpr for &[T] {
    fn into_expr(self) -> Result<Expr> {
        Ok(Expr::from(self))
    }
}

impl<T: IntoExpr> IntoExpr for Option<T> {
    fn into_expr(self) -> Result<Expr> {
        match self {
            Some(value) => value.into_expr(),
            None => Err(Error::UnsupportedLiteral {
                what: "`None`".to_string(),
            }),
        }
    }
}

impl IntoExpr for &str {
    fn into_expr(self) -> Result<Expr> {
        Err(Error::UnsupportedLiteral {
            what: format!("the string {self:?}"),
        })
    }
}

impl IntoExpr for String {
    fn into_expr(self) -> Result<Expr> {
        self.as_str().into_expr()
    }
}

/// Turn `value` into a duration expression.
///
/// Numeric literals are read as seconds. Duration literals and raw nodes
/// pass through, as do variables, calls and operations whose type is
/// `duration` or unknown; anything else is rejected.
pub fn make_duration(value: impl IntoExpr) -> Result<Expr> {
    let expr = value.into_expr()?;
    match expr {
        Expr::Literal(Literal::Int(v)) => Ok(Expr::duration(v as f64)),
        Expr::Literal(Literal::Float(v)) => Ok(Expr::duration(v)),
        Expr::Literal(Literal::Duration(_)) | Expr::Raw(_) => Ok(expr),
        Expr::Literal(ref literal) => Err(Error::type_mismatch("a duration", literal.describe())),
        _ => match expr.ty() {
            Some(ty) if ty != VarType::Duration => Err(Error::type_mismatch(
                "a duration",
                format!("`{expr}` of type `{ty}`"),
            )),
            _ => Ok(expr),
        },
    }
}

/// Adapt `expr` to a slot of type `ty`: durations are made explicit and
/// real numbers stored into complex slots become complex literals.
pub(crate) fn coerce_to(ty: &VarType, expr: Expr) -> Result<Expr> {
    match (ty, expr) {
        (VarType::Duration, expr) => make_duration(expr),
        (VarType::Complex(_), Expr::Literal(Literal::Int(v))) => {
            Ok(Expr::from(Complex::from(v as f64)))
        }
        (VarType::Complex(_), Expr::Literal(Literal::Float(v))) => Ok(Expr::from(Complex::from(v))),
        (_, expr) => Ok(expr),
    }
}

/// Reject `a < b || c > d` style guards; the grouping must be explicit.
pub(crate) fn check_guard(condition: &Expr) -> Result<()> {
    match condition {
        Expr::Binary { op, lhs, rhs }
            if op.is_logical() && lhs.is_comparison() && rhs.is_comparison() =>
        {
            Err(Error::CompoundCondition {
                condition: condition.to_string(),
            })
        }
        _ => Ok(()),
    }
}
