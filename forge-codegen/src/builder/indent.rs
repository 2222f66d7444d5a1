//! Indentation configuration for rendered programs.

use serde::{Deserialize, Serialize};

/// Indentation style for block bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indent {
    /// Spaces with the specified width (e.g., 2 or 4).
    Spaces(u8),
    /// Tab character.
    Tab,
}

impl Indent {
    /// 4-space indentation, the canonical layout of the dialect's printers.
    pub const CANONICAL: Self = Self::Spaces(4);

    /// Write one indent level into `out`.
    pub fn write_to(&self, out: &mut String) {
        match self {
            Self::Spaces(width) => {
                for _ in 0..*width {
                    out.push(' ');
                }
            }
            Self::Tab => out.push('\t'),
        }
    }
}

impl Default for Indent {
    fn default() -> Self {
        Self::CANONICAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_level(indent: Indent) -> String {
        let mut out = String::new();
        indent.write_to(&mut out);
        out
    }

    #[test]
    fn test_write_to() {
        assert_eq!(one_level(Indent::Spaces(2)), "  ");
        assert_eq!(one_level(Indent::Spaces(4)), "    ");
        assert_eq!(one_level(Indent::Spaces(3)), "   ");
        assert_eq!(one_level(Indent::Tab), "\t");
    }

    #[test]
    fn test_default() {
        assert_eq!(Indent::default(), Indent::Spaces(4));
    }

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            indent: Indent,
        }
        let holder: Holder = toml::from_str("indent = \"tab\"").unwrap();
        assert_eq!(holder.indent, Indent::Tab);
        let holder: Holder = toml::from_str("indent = { spaces = 2 }").unwrap();
        assert_eq!(holder.indent, Indent::Spaces(2));
    }
}
