//! Statement nodes and the program root.

use serde::{Deserialize, Serialize};

use crate::{Expression, Type, Version};

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
        }
    }
}

/// A typed parameter of a subroutine or calibration definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    pub ty: Type,
    pub name: String,
}

impl Param {
    pub fn new(ty: Type, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

/// A statement in the syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    /// `include "file";`
    Include(String),
    /// `pragma text` (no trailing semicolon).
    Pragma(String),
    /// `defcalgrammar "name";`
    CalGrammar(String),
    /// `<type> <name>[ = <init>];`
    Declaration {
        ty: Type,
        name: String,
        init: Option<Expression>,
    },
    /// `extern name(types...) -> ret;`
    Extern {
        name: String,
        params: Vec<Type>,
        returns: Option<Type>,
    },
    Assignment {
        target: Expression,
        op: AssignOp,
        value: Expression,
    },
    /// An expression used as a statement (`play(f, wf);`).
    Expression(Expression),
    Reset(Expression),
    Measure {
        qubit: Expression,
        target: Option<Expression>,
    },
    Delay {
        duration: Expression,
        targets: Vec<Expression>,
    },
    Barrier(Vec<Expression>),
    Gate {
        name: String,
        args: Vec<Expression>,
        qubits: Vec<Expression>,
    },
    Return(Option<Expression>),
    If {
        condition: Expression,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
    },
    For {
        var_type: Type,
        var: String,
        iterable: Expression,
        body: Vec<Statement>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    Box {
        duration: Option<Expression>,
        body: Vec<Statement>,
    },
    Cal(Vec<Statement>),
    Defcal {
        name: String,
        params: Vec<Param>,
        qubits: Vec<Expression>,
        returns: Option<Type>,
        body: Vec<Statement>,
    },
    Subroutine {
        name: String,
        params: Vec<Param>,
        returns: Option<Type>,
        body: Vec<Statement>,
    },
}

impl Statement {
    /// Returns true for declarations that belong in a calibration region:
    /// port/frame/waveform variables and extern signatures.
    pub fn is_pulse_declaration(&self) -> bool {
        match self {
            Statement::Declaration { ty, .. } => ty.is_pulse(),
            Statement::Extern { .. } => true,
            _ => false,
        }
    }
}

/// A complete program: optional version header followed by statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub version: Option<Version>,
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(version: Option<Version>, statements: Vec<Statement>) -> Self {
        Self {
            version,
            statements,
        }
    }
}
