//! Type names as they appear in declarations and signatures.

use oqforge_ir::Type;

/// Render a type: `int[32]`, `complex[float[64]]`, `duration`, ...
pub fn render_type(ty: &Type) -> String {
    match ty {
        Type::Int(size)
        | Type::Uint(size)
        | Type::Float(size)
        | Type::Angle(size)
        | Type::Bit(size)
        | Type::Qubit(size) => sized(ty.keyword(), *size),
        Type::Complex(base) => format!("complex[{}]", render_type(base)),
        Type::Bool | Type::Duration | Type::Port | Type::Frame | Type::Waveform => {
            ty.keyword().to_string()
        }
    }
}

fn sized(keyword: &str, size: Option<u32>) -> String {
    match size {
        Some(size) => format!("{keyword}[{size}]"),
        None => keyword.to_string(),
    }
}
