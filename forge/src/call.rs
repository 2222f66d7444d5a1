//! Callable things: built-in pulse functions, externs, subroutines and
//! the argument binding they share.

use oqforge_ir as ir;

use crate::error::{Error, Result};
use crate::expr::{Expr, IntoExpr, make_duration};
use crate::types::{NativeType, VarType};
use crate::var::Var;

/// A call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Callee,
    pub args: Vec<Expr>,
}

/// What a call refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A function the dialect provides (`play`, `newframe`, ...).
    Builtin {
        name: String,
        returns: Option<VarType>,
    },
    Extern(Extern),
    Subroutine(Subroutine),
}

impl Callee {
    pub(crate) fn builtin(name: &str, returns: Option<VarType>) -> Self {
        Callee::Builtin {
            name: name.to_string(),
            returns,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callee::Builtin { name, .. } => name,
            Callee::Extern(ext) => &ext.name,
            Callee::Subroutine(sub) => &sub.name,
        }
    }

    pub fn returns(&self) -> Option<VarType> {
        match self {
            Callee::Builtin { returns, .. } => *returns,
            Callee::Extern(ext) => ext.returns,
            Callee::Subroutine(sub) => sub.returns,
        }
    }
}

/// Arguments for a call, positional first.
///
/// Usually built with [`args!`](crate::args).
#[derive(Debug, Default)]
pub struct Args {
    positional: Vec<Expr>,
    keywords: Vec<(String, Expr)>,
    error: Option<Error>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl IntoExpr) -> Self {
        match value.into_expr() {
            Ok(expr) => self.positional.push(expr),
            Err(err) => self.fail(err),
        }
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl IntoExpr) -> Self {
        match value.into_expr() {
            Ok(expr) => self.keywords.push((name.into(), expr)),
            Err(err) => self.fail(err),
        }
        self
    }

    fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn len(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    /// Match the arguments against `params`, in declaration order.
    fn bind(self, callee: &str, params: &[(String, VarType)]) -> Result<Vec<Expr>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.positional.len() > params.len() {
            return Err(Error::ArgumentCount {
                callee: callee.to_string(),
                expected: params.len(),
                found: self.len(),
            });
        }
        let mut slots: Vec<Option<Expr>> = vec![None; params.len()];
        for (slot, value) in slots.iter_mut().zip(self.positional) {
            *slot = Some(value);
        }
        for (keyword, value) in self.keywords {
            let Some(position) = params.iter().position(|(name, _)| *name == keyword) else {
                return Err(Error::UnknownKeyword {
                    callee: callee.to_string(),
                    keyword,
                });
            };
            if slots[position].is_some() {
                return Err(Error::DuplicateArgument {
                    callee: callee.to_string(),
                    param: keyword,
                });
            }
            slots[position] = Some(value);
        }
        slots
            .into_iter()
            .zip(params)
            .map(|(slot, (name, ty))| match slot {
                Some(value) if *ty == VarType::Duration => make_duration(value),
                Some(value) => Ok(value),
                None => Err(Error::MissingArgument {
                    callee: callee.to_string(),
                    param: name.clone(),
                }),
            })
            .collect()
    }
}

/// Build [`Args`] from positional values and trailing `name = value` pairs.
///
/// ```
/// use oqforge::{Extern, VarType, args};
///
/// let constant = Extern::waveform_generator(
///     "constant",
///     [("length", VarType::Duration), ("iq", VarType::COMPLEX128)],
/// );
/// let call = constant.call(args![20e-9, iq = 0.2]).unwrap();
/// assert_eq!(call.to_string(), "constant(20.0ns, 0.2)");
/// ```
#[macro_export]
macro_rules! args {
    (@acc $acc:expr;) => { $acc };
    (@acc $acc:expr; $key:ident = $value:expr $(, $($rest:tt)*)?) => {
        $crate::args!(@acc $acc.kwarg(stringify!($key), $value); $($($rest)*)?)
    };
    (@acc $acc:expr; $value:expr $(, $($rest:tt)*)?) => {
        $crate::args!(@acc $acc.arg($value); $($($rest)*)?)
    };
    ($($tt:tt)*) => { $crate::args!(@acc $crate::Args::new(); $($tt)*) };
}

/// An external function signature, resolved by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Extern {
    name: String,
    params: Vec<(String, VarType)>,
    returns: Option<VarType>,
}

impl Extern {
    pub fn new<N: Into<String>>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = (N, VarType)>,
        returns: Option<VarType>,
    ) -> Self {
        Self {
            name: name.into(),
            params: params
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
            returns,
        }
    }

    /// An extern returning a `waveform`.
    pub fn waveform_generator<N: Into<String>>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = (N, VarType)>,
    ) -> Self {
        Self::new(name, params, Some(VarType::Waveform))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[(String, VarType)] {
        &self.params
    }

    pub fn returns(&self) -> Option<VarType> {
        self.returns
    }

    pub fn call(&self, args: Args) -> Result<Expr> {
        let args = args.bind(&self.name, &self.params)?;
        Ok(Expr::Call(Box::new(Call {
            callee: Callee::Extern(self.clone()),
            args,
        })))
    }

    /// `extern name(types...) -> ret;`
    pub fn declaration(&self) -> ir::Statement {
        ir::Statement::Extern {
            name: self.name.clone(),
            params: self.params.iter().map(|(_, ty)| ty.to_ir()).collect(),
            returns: self.returns.as_ref().map(VarType::to_ir),
        }
    }
}

/// A parameter or return annotation on a subroutine signature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Annotation {
    Var(VarType),
    /// No annotation at all.
    Missing,
    /// A plain scalar type with no variable kind.
    Native(NativeType),
}

impl From<VarType> for Annotation {
    fn from(ty: VarType) -> Self {
        Annotation::Var(ty)
    }
}

impl From<NativeType> for Annotation {
    fn from(ty: NativeType) -> Self {
        Annotation::Native(ty)
    }
}

/// The declared shape of a subroutine.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    params: Vec<(String, Annotation)>,
    returns: Annotation,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: Annotation::Missing,
        }
    }

    pub fn param(mut self, name: impl Into<String>, annotation: impl Into<Annotation>) -> Self {
        self.params.push((name.into(), annotation.into()));
        self
    }

    pub fn returns(mut self, annotation: impl Into<Annotation>) -> Self {
        self.returns = annotation.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check every annotation names a variable type; yields the parameter
    /// variables and the return type.
    pub(crate) fn resolve(&self) -> Result<(Vec<Var>, Option<VarType>)> {
        let params = self
            .params
            .iter()
            .map(|(param, annotation)| match annotation {
                Annotation::Var(ty) => Ok(Var::new(param.clone(), *ty)),
                Annotation::Missing | Annotation::Native(_) => Err(Error::UntypedParameter {
                    subroutine: self.name.clone(),
                    param: param.clone(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        let returns = match self.returns {
            Annotation::Var(ty) => Some(ty),
            Annotation::Missing => None,
            Annotation::Native(native) => {
                return Err(Error::InvalidReturnType {
                    subroutine: self.name.clone(),
                    found: native.to_string(),
                });
            }
        };
        Ok((params, returns))
    }
}

/// A defined subroutine. Its definition is emitted by the first program
/// that uses one of its calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Subroutine {
    name: String,
    params: Vec<(String, VarType)>,
    returns: Option<VarType>,
    definition: ir::Statement,
}

impl Subroutine {
    pub(crate) fn new(
        name: String,
        params: &[Var],
        returns: Option<VarType>,
        body: Vec<ir::Statement>,
    ) -> Self {
        let definition = ir::Statement::Subroutine {
            name: name.clone(),
            params: params
                .iter()
                .map(|param| ir::Param::new(param.ty().to_ir(), param.name()))
                .collect(),
            returns: returns.as_ref().map(VarType::to_ir),
            body,
        };
        Self {
            name,
            params: params
                .iter()
                .map(|param| (param.name().to_string(), param.ty()))
                .collect(),
            returns,
            definition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn returns(&self) -> Option<VarType> {
        self.returns
    }

    /// `def name(type p, ...) -> ret { ... }`
    pub fn definition(&self) -> &ir::Statement {
        &self.definition
    }

    pub fn call(&self, args: Args) -> Result<Expr> {
        let args = args.bind(&self.name, &self.params)?;
        Ok(Expr::Call(Box::new(Call {
            callee: Callee::Subroutine(self.clone()),
            args,
        })))
    }
}

/// The head of a `defcal` block: gate name, target qubits, typed
/// parameters and an optional return type.
#[derive(Debug, Clone, PartialEq)]
pub struct Defcal {
    pub(crate) name: String,
    pub(crate) qubits: Vec<Expr>,
    pub(crate) params: Vec<Var>,
    pub(crate) returns: Option<VarType>,
}

impl Defcal {
    pub fn new(name: impl Into<String>, qubits: impl crate::program::IntoTargets) -> Self {
        Self {
            name: name.into(),
            qubits: qubits.into_targets(),
            params: Vec::new(),
            returns: None,
        }
    }

    /// Add a parameter; the variable is in scope inside the body.
    pub fn param(mut self, var: &Var) -> Self {
        self.params.push(var.clone());
        self
    }

    pub fn returns(mut self, ty: VarType) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Space-separated target qubits, the first half of the lookup key.
    pub(crate) fn target(&self) -> String {
        self.qubits
            .iter()
            .map(|qubit| qubit.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn constant() -> Extern {
        Extern::waveform_generator(
            "constant",
            [("length", VarType::Duration), ("iq", VarType::COMPLEX128)],
        )
    }

    #[test]
    fn test_positional_and_keyword_binding() {
        let constant = constant();
        let call = constant.call(crate::args![10e-9, 0.1]).unwrap();
        assert_eq!(call.to_string(), "constant(10.0ns, 0.1)");
        let call = constant.call(crate::args![20e-9, iq = 0.2]).unwrap();
        assert_eq!(call.to_string(), "constant(20.0ns, 0.2)");
        let call = constant.call(crate::args![length = 40e-9, iq = 0.4]).unwrap();
        assert_eq!(call.to_string(), "constant(40.0ns, 0.4)");
        let call = constant.call(crate::args![iq = 0.5, length = 50e-9]).unwrap();
        assert_eq!(call.to_string(), "constant(50.0ns, 0.5)");
        assert_eq!(call.ty(), Some(VarType::Waveform));
    }

    #[test]
    fn test_binding_errors() {
        let constant = constant();
        let err = constant.call(crate::args![10e-9, length = 10e-9]).unwrap_err();
        assert!(matches!(err, Error::DuplicateArgument { .. }));
        let err = constant.call(crate::args![10e-9, blah = 10e-9]).unwrap_err();
        assert!(matches!(err, Error::UnknownKeyword { .. }));
        let err = constant.call(crate::args![10e-9, 0.1, 0.1]).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentCount {
                expected: 2,
                found: 3,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Type);
        let err = constant.call(crate::args![10e-9]).unwrap_err();
        assert!(matches!(err, Error::MissingArgument { .. }));
        let err = constant.call(crate::args![10e-9, None::<f64>]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLiteral { .. }));
    }

    #[test]
    fn test_complex_parameter_keeps_literal() {
        let call = constant().call(crate::args![1.6e-6, 1]).unwrap();
        assert_eq!(call.to_string(), "constant(1600.0ns, 1)");
    }

    #[test]
    fn test_args_builder() {
        let args = Args::new().arg(1).kwarg("iq", 2);
        assert_eq!(args.len(), 2);
        assert_eq!(crate::args![].len(), 0);
    }

    #[test]
    fn test_extern_declaration() {
        let decl = constant().declaration();
        assert_eq!(
            oqforge_codegen::render_statement(&decl, &Default::default()),
            "extern constant(duration, complex[float[64]]) -> waveform;"
        );
    }

    #[test]
    fn test_signature_resolution() {
        let sig = Signature::new("multiply")
            .param("x", VarType::INT32)
            .param("y", VarType::INT32)
            .returns(VarType::INT32);
        let (params, returns) = sig.resolve().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(returns, Some(VarType::INT32));

        let untyped = Signature::new("add")
            .param("x", VarType::INT32)
            .param("y", Annotation::Missing);
        let err = untyped.resolve().unwrap_err();
        assert!(matches!(err, Error::UntypedParameter { ref param, .. } if param == "y"));
        assert_eq!(err.kind(), ErrorKind::Value);

        let native = Signature::new("return1").returns(NativeType::Float);
        let err = native.resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidReturnType { .. }));
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_defcal_target() {
        let defcal = Defcal::new("cx", [&Var::physical_qubit(0), &Var::physical_qubit(1)]);
        assert_eq!(defcal.target(), "$0 $1");
    }
}
