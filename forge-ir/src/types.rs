//! Type names as they appear in declarations and signatures.

use serde::{Deserialize, Serialize};

/// A dialect type.
///
/// Sizes are already validated by the builder; `None` means the type is
/// written without a designator (`int`, `bit`, `qubit`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Bool,
    Int(Option<u32>),
    Uint(Option<u32>),
    Float(Option<u32>),
    Angle(Option<u32>),
    Duration,
    Bit(Option<u32>),
    /// Complex number over a float base type.
    Complex(Box<Type>),
    Port,
    Frame,
    Waveform,
    Qubit(Option<u32>),
}

impl Type {
    /// Keyword used when the type is written without a designator.
    pub fn keyword(&self) -> &'static str {
        match self {
            Type::Bool => "bool",
            Type::Int(_) => "int",
            Type::Uint(_) => "uint",
            Type::Float(_) => "float",
            Type::Angle(_) => "angle",
            Type::Duration => "duration",
            Type::Bit(_) => "bit",
            Type::Complex(_) => "complex",
            Type::Port => "port",
            Type::Frame => "frame",
            Type::Waveform => "waveform",
            Type::Qubit(_) => "qubit",
        }
    }

    /// Returns true for the OpenPulse signal types (port, frame, waveform).
    pub fn is_pulse(&self) -> bool {
        matches!(self, Type::Port | Type::Frame | Type::Waveform)
    }
}
