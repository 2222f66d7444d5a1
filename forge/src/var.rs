//! Typed variables.

use crate::call::{Call, Callee};
use crate::error::{Error, Result};
use crate::expr::{Expr, IntoExpr, Literal, coerce_to};
use crate::types::VarType;

/// A named, typed slot.
///
/// Two variables are equal when every attribute matches, initializer
/// included. A program treats equal variables as the same symbol and
/// rejects a different variable under a name it already knows.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    name: String,
    ty: VarType,
    init: Option<Box<Expr>>,
    needs_declaration: bool,
}

impl Var {
    pub fn new(name: impl Into<String>, ty: VarType) -> Self {
        Self {
            name: name.into(),
            ty,
            init: None,
            needs_declaration: true,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, VarType::Bool)
    }

    /// `int[32]`.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, VarType::INT32)
    }

    /// `uint[32]`.
    pub fn uint(name: impl Into<String>) -> Self {
        Self::new(name, VarType::UINT32)
    }

    /// `float[64]`.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, VarType::FLOAT64)
    }

    /// `angle[32]`.
    pub fn angle(name: impl Into<String>) -> Self {
        Self::new(name, VarType::ANGLE32)
    }

    pub fn duration(name: impl Into<String>) -> Self {
        Self::new(name, VarType::Duration)
    }

    /// A single bit.
    pub fn bit(name: impl Into<String>) -> Self {
        Self::new(name, VarType::Bit(None))
    }

    /// `bit[len]`.
    pub fn bit_array(name: impl Into<String>, len: impl Into<crate::Number>) -> Result<Self> {
        Ok(Self::new(name, VarType::bit_array(len)?))
    }

    /// `complex[float[64]]`.
    pub fn complex(name: impl Into<String>) -> Self {
        Self::new(name, VarType::COMPLEX128)
    }

    pub fn port(name: impl Into<String>) -> Self {
        Self::new(name, VarType::Port)
    }

    /// A frame with no initializer.
    pub fn frame(name: impl Into<String>) -> Self {
        Self::new(name, VarType::Frame)
    }

    pub fn waveform(name: impl Into<String>) -> Self {
        Self::new(name, VarType::Waveform)
    }

    /// A logical qubit.
    pub fn qubit(name: impl Into<String>) -> Self {
        Self::new(name, VarType::Qubit)
    }

    /// Hardware qubit `$n`; never declared.
    pub fn physical_qubit(index: u32) -> Self {
        Self::new(format!("${index}"), VarType::Qubit).without_declaration()
    }

    /// `frame name = newframe(port, frequency, 0);`
    pub fn new_frame(name: impl Into<String>, port: &Var, frequency: impl IntoExpr) -> Result<Self> {
        Self::frame_with(name, Some(port), Some(frequency.into_expr()?), None)
    }

    /// A frame from optional parts. A port and a frequency must be given
    /// together; the phase defaults to `0`.
    pub fn frame_with(
        name: impl Into<String>,
        port: Option<&Var>,
        frequency: Option<Expr>,
        phase: Option<Expr>,
    ) -> Result<Self> {
        let name = name.into();
        match (port, frequency) {
            (None, None) => Ok(Self::frame(name)),
            (Some(port), Some(frequency)) => {
                if port.ty != VarType::Port {
                    return Err(Error::type_mismatch(
                        "a port",
                        format!("`{}` of type `{}`", port.name, port.ty),
                    ));
                }
                let init = Expr::Call(Box::new(Call {
                    callee: Callee::builtin("newframe", Some(VarType::Frame)),
                    args: vec![
                        Expr::from(port),
                        frequency,
                        phase.unwrap_or(Expr::Literal(Literal::Int(0))),
                    ],
                }));
                Ok(Self {
                    init: Some(Box::new(init)),
                    ..Self::frame(name)
                })
            }
            _ => Err(Error::IncompleteFrame { name }),
        }
    }

    /// Bind an initial value, adapted to the declared type.
    pub fn with_init(mut self, value: impl IntoExpr) -> Result<Self> {
        let init = coerce_to(&self.ty, value.into_expr()?)?;
        self.init = Some(Box::new(init));
        Ok(self)
    }

    /// Refer to a symbol that exists outside the program; it is never
    /// auto-declared.
    pub fn without_declaration(mut self) -> Self {
        self.needs_declaration = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> VarType {
        self.ty
    }

    pub fn init(&self) -> Option<&Expr> {
        self.init.as_deref()
    }

    pub fn needs_declaration(&self) -> bool {
        self.needs_declaration
    }

    /// Index a bit register. The result is a single-bit expression.
    pub fn index(&self, index: impl IntoExpr) -> Result<Expr> {
        let Some(len) = self.ty.bit_len() else {
            return Err(Error::NotIndexable {
                name: self.name.clone(),
                ty: self.ty.to_string(),
            });
        };
        let index = index.into_expr()?;
        match &index {
            Expr::Literal(Literal::Int(i)) if *i < 0 || *i >= i64::from(len) => {
                return Err(Error::IndexOutOfRange {
                    name: self.name.clone(),
                    index: *i,
                    len,
                });
            }
            Expr::Literal(Literal::Int(_)) => {}
            other => match other.ty() {
                Some(VarType::Int(_) | VarType::Uint(_)) | None => {}
                Some(_) => {
                    return Err(Error::NonIntegerIndex {
                        name: self.name.clone(),
                        index: other.to_string(),
                    });
                }
            },
        }
        Ok(Expr::Index {
            target: Box::new(Expr::from(self)),
            index: Box::new(index),
        })
    }
}
