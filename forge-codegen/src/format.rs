//! Literal formatting.
//!
//! Floats print in shortest round-trip form with at least one fractional
//! digit, switching to exponent notation (`2e-05`, `1e+16`) outside
//! `1e-4 <= |x| < 1e16`. Integers print in decimal.

use serde::{Deserialize, Serialize};

use crate::builder::Indent;

/// Knobs that change the printed text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatOptions {
    /// Indentation of block bodies.
    pub indent: Indent,
    /// Fractional nanosecond digits a duration may carry and still print in `ns`.
    pub duration_decimals: u32,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            duration_decimals: 3,
        }
    }
}

/// Format a float literal.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs());
    }
    let mut out = format!("{value}");
    if !out.contains('.') {
        out.push_str(".0");
    }
    out
}

/// Format a duration given in seconds.
///
/// Durations that are a whole number of nanoseconds up to
/// `options.duration_decimals` fractional digits print as `{n}ns`; anything
/// finer prints in seconds with an `s` suffix.
pub fn format_duration(seconds: f64, options: &FormatOptions) -> String {
    let nanos = seconds * 1e9;
    let scale = 10f64.powi(options.duration_decimals.min(15) as i32);
    let rounded = (nanos * scale).round() / scale;
    let tolerance = 1e-9 * nanos.abs().max(1.0);
    if nanos.is_finite() && (nanos - rounded).abs() <= tolerance {
        format!("{}ns", format_float(rounded))
    } else {
        format!("{}s", format_float(seconds))
    }
}

/// Format a complex literal as `re ± im im`, dropping zero parts.
pub fn format_complex(re: f64, im: f64) -> String {
    if im == 0.0 {
        return format_float(re);
    }
    if re == 0.0 {
        return format!("{}im", format_float(im));
    }
    let sign = if im.is_sign_negative() { '-' } else { '+' };
    format!("{} {} {}im", format_float(re), sign, format_float(im.abs()))
}
