use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type for program construction and rendering.
pub type Result<T> = std::result::Result<T, Error>;

/// The four failure classes a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value was well-typed but not acceptable (bad size, name collision, ...).
    Value,
    /// A value of the wrong kind was supplied, or a call did not bind.
    Type,
    /// The builder was driven out of order (unbalanced scopes, bad version, ...).
    Runtime,
    /// A container was indexed out of range or with a non-integer.
    Index,
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("invalid size {size} for `{kind}`")]
    #[diagnostic(
        code(oqforge::invalid_size),
        help("sizes must be positive integers")
    )]
    InvalidSize { kind: &'static str, size: String },

    #[error("complex numbers need a float base type, got `{found}`")]
    #[diagnostic(
        code(oqforge::invalid_complex_base),
        help("use `VarType::float(n)` as the base")
    )]
    InvalidComplexBase { found: String },

    #[error("frame `{name}` was given a port without a frequency or a frequency without a port")]
    #[diagnostic(
        code(oqforge::incomplete_frame),
        help("pass both a port and a frequency, or neither for an undefined frame")
    )]
    IncompleteFrame { name: String },

    #[error("name `{name}` is already bound to a different {existing}")]
    #[diagnostic(code(oqforge::name_collision))]
    NameCollision { name: String, existing: String },

    #[error("parameter `{param}` of subroutine `{subroutine}` has no variable type")]
    #[diagnostic(
        code(oqforge::untyped_parameter),
        help("annotate every parameter with a `VarType`")
    )]
    UntypedParameter { subroutine: String, param: String },

    #[error("subroutine `{subroutine}` declares return type `{found}`, which is not a variable type")]
    #[diagnostic(code(oqforge::invalid_return_type))]
    InvalidReturnType { subroutine: String, found: String },

    #[error("invalid render options")]
    #[diagnostic(code(oqforge::config))]
    Config {
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read render options from '{}'", path.display())]
    #[diagnostic(code(oqforge::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} cannot be used as an expression")]
    #[diagnostic(code(oqforge::unsupported_literal))]
    UnsupportedLiteral { what: String },

    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(oqforge::type_mismatch))]
    TypeMismatch { expected: String, found: String },

    #[error("`{expr}` cannot be assigned to")]
    #[diagnostic(
        code(oqforge::not_assignable),
        help("assign to a variable or an indexed bit")
    )]
    NotAssignable { expr: String },

    #[error("`{name}` of type `{ty}` cannot be indexed")]
    #[diagnostic(
        code(oqforge::not_indexable),
        help("only bit arrays with a declared length can be indexed")
    )]
    NotIndexable { name: String, ty: String },

    #[error("`{callee}` takes {expected} argument(s) but {found} were given")]
    #[diagnostic(code(oqforge::argument_count))]
    ArgumentCount {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("`{callee}` has no parameter named `{keyword}`")]
    #[diagnostic(code(oqforge::unknown_keyword))]
    UnknownKeyword { callee: String, keyword: String },

    #[error("parameter `{param}` of `{callee}` was bound more than once")]
    #[diagnostic(code(oqforge::duplicate_argument))]
    DuplicateArgument { callee: String, param: String },

    #[error("parameter `{param}` of `{callee}` was not bound")]
    #[diagnostic(code(oqforge::missing_argument))]
    MissingArgument { callee: String, param: String },

    #[error("`else` must directly follow an `if` block")]
    #[diagnostic(code(oqforge::else_without_if))]
    ElseWithoutIf,

    #[error("condition `{condition}` combines comparisons with a logical operator")]
    #[diagnostic(
        code(oqforge::compound_condition),
        help("wrap each comparison in `.paren()` to spell the grouping out")
    )]
    CompoundCondition { condition: String },

    #[error("{depth} scope(s) are still open")]
    #[diagnostic(code(oqforge::open_scope), help("close every block before this call"))]
    OpenScope { depth: usize },

    #[error("there is no open scope to close")]
    #[diagnostic(code(oqforge::no_open_scope))]
    NoOpenScope,

    #[error("expected the innermost scope to be `{expected}`, found `{found}`")]
    #[diagnostic(code(oqforge::scope_mismatch))]
    ScopeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid version '{version}': {reason}")]
    #[diagnostic(code(oqforge::invalid_version), help("use 'MAJOR' or 'MAJOR.MINOR'"))]
    InvalidVersion { version: String, reason: String },

    #[error("index {index} is out of range for `{name}` of length {len}")]
    #[diagnostic(code(oqforge::index_out_of_range))]
    IndexOutOfRange { name: String, index: i64, len: u32 },

    #[error("`{name}` must be indexed with an integer, got `{index}`")]
    #[diagnostic(code(oqforge::non_integer_index))]
    NonIntegerIndex { name: String, index: String },
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidSize { .. }
            | Error::InvalidComplexBase { .. }
            | Error::IncompleteFrame { .. }
            | Error::NameCollision { .. }
            | Error::UntypedParameter { .. }
            | Error::InvalidReturnType { .. }
            | Error::Config { .. } => ErrorKind::Value,
            Error::Io { .. } => ErrorKind::Runtime,
            Error::UnsupportedLiteral { .. }
            | Error::TypeMismatch { .. }
            | Error::NotAssignable { .. }
            | Error::NotIndexable { .. }
            | Error::ArgumentCount { .. }
            | Error::UnknownKeyword { .. }
            | Error::DuplicateArgument { .. }
            | Error::MissingArgument { .. } => ErrorKind::Type,
            Error::ElseWithoutIf
            | Error::CompoundCondition { .. }
            | Error::OpenScope { .. }
            | Error::NoOpenScope
            | Error::ScopeMismatch { .. }
            | Error::InvalidVersion { .. } => ErrorKind::Runtime,
            Error::IndexOutOfRange { .. } | Error::NonIntegerIndex { .. } => ErrorKind::Index,
        }
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::ElseWithoutIf.kind(), ErrorKind::Runtime);
        assert_eq!(
            Error::IndexOutOfRange {
                name: "arr".into(),
                index: 40,
                len: 20
            }
            .kind(),
            ErrorKind::Index
        );
        assert_eq!(
            Error::ArgumentCount {
                callee: "constant".into(),
                expected: 2,
                found: 3
            }
            .kind(),
            ErrorKind::Type
        );
        assert_eq!(
            Error::NameCollision {
                name: "i".into(),
                existing: "int[32]".into()
            }
            .kind(),
            ErrorKind::Value
        );
    }

    #[test]
    fn test_display() {
        let err = Error::UnknownKeyword {
            callee: "constant".into(),
            keyword: "blah".into(),
        };
        assert_eq!(err.to_string(), "`constant` has no parameter named `blah`");
    }

    #[test]
    fn test_diagnostic_code() {
        let err = Error::OpenScope { depth: 1 };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("oqforge::open_scope"));
    }
}
