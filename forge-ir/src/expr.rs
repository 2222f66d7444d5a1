//! Expression nodes.

use serde::{Deserialize, Serialize};

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    /// Returns true for `<`, `<=`, `>`, `>=`, `==` and `!=`.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    /// Returns true for the short-circuit combinators `&&` and `||`.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// An expression in the syntax tree.
///
/// Literal values are stored unformatted; choosing the textual form (float
/// notation, duration unit, complex layout) is the printer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Identifier(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Complex literal, printed as `re + imim` with zero parts dropped.
    Complex {
        re: f64,
        im: f64,
    },
    /// Duration literal in seconds.
    Duration(f64),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// Explicit grouping kept regardless of precedence.
    Paren(Box<Expression>),
    Call {
        name: String,
        args: Vec<Expression>,
    },
    Index {
        target: Box<Expression>,
        index: Vec<Expression>,
    },
    /// Inclusive range `[start:step:end]`.
    Range {
        start: Option<Box<Expression>>,
        step: Option<Box<Expression>>,
        end: Option<Box<Expression>>,
    },
    /// Brace-delimited value list, `{a, b, c}`.
    Set(Vec<Expression>),
}

impl Expression {
    /// Create an identifier expression.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Create a call expression.
    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::Call {
            name: name.into(),
            args,
        }
    }

    /// Create a binary expression.
    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Returns the identifier name if this is a bare identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Self::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols() {
        assert_eq!(BinaryOp::Pow.as_str(), "**");
        assert_eq!(BinaryOp::Ne.as_str(), "!=");
        assert_eq!(UnaryOp::BitNot.as_str(), "~");
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOp::Le.is_comparison());
        assert!(!BinaryOp::And.is_comparison());
        assert!(BinaryOp::Or.is_logical());
        assert!(!BinaryOp::BitOr.is_logical());
    }

    #[test]
    fn test_serialize_call() {
        let expr = Expression::call("play", vec![Expression::ident("f1"), Expression::Int(1)]);
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["call"]["name"], "play");
        assert_eq!(json["call"]["args"][0]["identifier"], "f1");
        assert_eq!(json["call"]["args"][1]["int"], 1);
    }
}
