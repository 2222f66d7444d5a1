//! Variable kinds, their size rules, and the numeric literal model.

use std::fmt;
use std::num::NonZeroU32;

use oqforge_codegen::render_type;
use oqforge_ir as ir;

use crate::error::{Error, Result};

const fn width(bits: u32) -> NonZeroU32 {
    match NonZeroU32::new(bits) {
        Some(bits) => bits,
        None => NonZeroU32::MIN,
    }
}

const W32: NonZeroU32 = width(32);
const W64: NonZeroU32 = width(64);

/// A complex number literal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    /// The imaginary unit.
    pub const I: Complex = Complex { re: 0.0, im: 1.0 };

    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl From<f64> for Complex {
    fn from(re: f64) -> Self {
        Self { re, im: 0.0 }
    }
}

/// A numeric literal, ordered by category: `Int < Float < Complex`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
    Complex(Complex),
}

impl Number {
    fn rank(&self) -> u8 {
        match self {
            Number::Int(_) => 0,
            Number::Float(_) => 1,
            Number::Complex(_) => 2,
        }
    }

    /// Widen to the category of `other` if that category is wider.
    pub fn widen_to(self, other: &Number) -> Number {
        match (self, other.rank()) {
            (Number::Int(v), 1) => Number::Float(v as f64),
            (Number::Int(v), 2) => Number::Complex(Complex::from(v as f64)),
            (Number::Float(v), 2) => Number::Complex(Complex::from(v)),
            (n, _) => n,
        }
    }

    /// Widen every value to the widest category present.
    pub fn widen(values: Vec<Number>) -> Vec<Number> {
        let Some(widest) = values.iter().max_by_key(|n| n.rank()).copied() else {
            return values;
        };
        values.into_iter().map(|n| n.widen_to(&widest)).collect()
    }

    pub fn to_ir(&self) -> ir::Expression {
        match *self {
            Number::Int(v) => ir::Expression::Int(v),
            Number::Float(v) => ir::Expression::Float(v),
            Number::Complex(c) => ir::Expression::Complex { re: c.re, im: c.im },
        }
    }

    fn describe(&self) -> String {
        match self {
            Number::Int(v) => v.to_string(),
            Number::Float(v) => v.to_string(),
            Number::Complex(c) => format!("{}{:+}i", c.re, c.im),
        }
    }
}

macro_rules! number_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::$variant(value.into())
                }
            }
        )+
    };
}

number_from!(Int: i8, i16, i32, i64, u8, u16, u32);
number_from!(Float: f32, f64);
number_from!(Complex: Complex);

/// Scalar types that can annotate a subroutine signature but have no
/// variable kind of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    Int,
    Float,
    Bool,
    Complex,
    Str,
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeType::Int => "int",
            NativeType::Float => "float",
            NativeType::Bool => "bool",
            NativeType::Complex => "complex",
            NativeType::Str => "str",
        };
        f.write_str(name)
    }
}

/// The declared type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Bool,
    Int(Option<NonZeroU32>),
    Uint(Option<NonZeroU32>),
    Float(Option<NonZeroU32>),
    Angle(Option<NonZeroU32>),
    Duration,
    /// A single bit, or a fixed-length bit register.
    Bit(Option<NonZeroU32>),
    /// Complex number over a `float[n]` base; holds `n`.
    Complex(NonZeroU32),
    Port,
    Frame,
    Waveform,
    Qubit,
}

fn size_of(kind: &'static str, size: Number) -> Result<NonZeroU32> {
    let invalid = || Error::InvalidSize {
        kind,
        size: size.describe(),
    };
    match size {
        Number::Int(n) => u32::try_from(n)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(invalid),
        Number::Float(_) | Number::Complex(_) => Err(invalid()),
    }
}

impl VarType {
    pub const INT32: VarType = VarType::Int(Some(W32));
    pub const UINT32: VarType = VarType::Uint(Some(W32));
    pub const FLOAT32: VarType = VarType::Float(Some(W32));
    pub const FLOAT64: VarType = VarType::Float(Some(W64));
    pub const ANGLE32: VarType = VarType::Angle(Some(W32));
    pub const COMPLEX128: VarType = VarType::Complex(W64);

    pub fn int(size: impl Into<Number>) -> Result<Self> {
        Ok(VarType::Int(Some(size_of("int", size.into())?)))
    }

    pub fn uint(size: impl Into<Number>) -> Result<Self> {
        Ok(VarType::Uint(Some(size_of("uint", size.into())?)))
    }

    pub fn float(size: impl Into<Number>) -> Result<Self> {
        Ok(VarType::Float(Some(size_of("float", size.into())?)))
    }

    pub fn angle(size: impl Into<Number>) -> Result<Self> {
        Ok(VarType::Angle(Some(size_of("angle", size.into())?)))
    }

    pub fn bit_array(len: impl Into<Number>) -> Result<Self> {
        Ok(VarType::Bit(Some(size_of("bit", len.into())?)))
    }

    /// `complex[base]`, where `base` must be a float type.
    pub fn complex_of(base: VarType) -> Result<Self> {
        match base {
            VarType::Float(size) => Ok(VarType::Complex(size.unwrap_or(W64))),
            other => Err(Error::InvalidComplexBase {
                found: other.to_string(),
            }),
        }
    }

    /// Length of a bit register, `None` for everything else.
    pub fn bit_len(&self) -> Option<u32> {
        match self {
            VarType::Bit(Some(len)) => Some(len.get()),
            _ => None,
        }
    }

    pub fn to_ir(&self) -> ir::Type {
        let bits = |size: &Option<NonZeroU32>| size.map(NonZeroU32::get);
        match self {
            VarType::Bool => ir::Type::Bool,
            VarType::Int(size) => ir::Type::Int(bits(size)),
            VarType::Uint(size) => ir::Type::Uint(bits(size)),
            VarType::Float(size) => ir::Type::Float(bits(size)),
            VarType::Angle(size) => ir::Type::Angle(bits(size)),
            VarType::Duration => ir::Type::Duration,
            VarType::Bit(size) => ir::Type::Bit(bits(size)),
            VarType::Complex(base) => ir::Type::Complex(Box::new(ir::Type::Float(Some(base.get())))),
            VarType::Port => ir::Type::Port,
            VarType::Frame => ir::Type::Frame,
            VarType::Waveform => ir::Type::Waveform,
            VarType::Qubit => ir::Type::Qubit(None),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_type(&self.to_ir()))
    }
}
