//! Combining independently built programs.

use std::ops::Add;

use log::debug;

use super::Program;
use crate::error::{Error, Result};

impl Program {
    /// A new program running `left` then `right`.
    ///
    /// Declarations, tracked frames and waveforms, externs, subroutines
    /// and defcals are merged; a name bound to different things on the two
    /// sides fails with [`Error::NameCollision`]. The version header of
    /// `left` wins when both have one.
    pub fn compose(left: &Program, right: &Program) -> Result<Program> {
        let mut composed = left.clone();
        composed.extend(right)?;
        Ok(composed)
    }

    /// Append the statements of `other` to this program, merging its
    /// declarations. Both programs must have every block closed.
    pub fn extend(&mut self, other: &Program) -> Result<&mut Self> {
        for depth in [self.open_scopes(), other.open_scopes()] {
            if depth > 0 {
                return Err(Error::OpenScope { depth });
            }
        }
        let mut registry = self.registry.clone();
        registry.merge(&other.registry)?;

        debug!(
            "compose {} + {} top-level statement(s)",
            self.stack.first().map_or(0, |scope| scope.body.len()),
            other.stack.first().map_or(0, |scope| scope.body.len())
        );
        self.registry = registry;
        self.version = self.version.or(other.version);
        if let Some(tail) = other.stack.first().filter(|scope| !scope.body.is_empty()) {
            let top = self.scope();
            top.body.extend(tail.body.iter().cloned());
            top.accepts_else = tail.accepts_else;
        }
        Ok(self)
    }
}

impl Add<&Program> for &Program {
    type Output = Result<Program>;

    fn add(self, rhs: &Program) -> Self::Output {
        Program::compose(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::expr::Operand;
    use crate::var::Var;

    #[test]
    fn test_concatenates_left_then_right() {
        let mut left = Program::new();
        left.delay(1e-6, ()).unwrap();
        let mut right = Program::new();
        right.declare(&Var::int("i")).unwrap();
        let composed = (&left + &right).unwrap();
        assert_eq!(composed.render().unwrap(), "delay[1000.0ns];\nint[32] i;");
        // operands are untouched
        assert_eq!(left.render().unwrap(), "delay[1000.0ns];");
    }

    #[test]
    fn test_open_scope_on_either_side() {
        let i = Var::int("i");
        let left = Program::new();
        let mut right = Program::new();
        right.open_if(i.equals(0)).unwrap();
        let err = (&left + &right).unwrap_err();
        assert!(matches!(err, Error::OpenScope { depth: 1 }));
        assert_eq!(err.kind(), ErrorKind::Runtime);
        let err = (&right + &left).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn test_collision_leaves_program_untouched() {
        let mut left = Program::new();
        left.set(&Var::int("x"), 1).unwrap();
        let mut right = Program::new();
        right.set(&Var::float("x"), 1.5).unwrap();
        let before = left.render().unwrap();
        let err = left.extend(&right).unwrap_err();
        assert!(matches!(err, Error::NameCollision { .. }));
        assert_eq!(left.render().unwrap(), before);
    }

    #[test]
    fn test_version_and_else_chain_carry_over() {
        let i = Var::int("i");
        let left = Program::new();
        let mut right = Program::with_version("3.0").unwrap();
        right.if_(i.equals(0), |_| Ok(())).unwrap();
        let mut composed = Program::compose(&left, &right).unwrap();
        composed.else_(|prog| prog.set(&i, 1).map(drop)).unwrap();
        assert_eq!(
            composed.render().unwrap(),
            "OPENQASM 3.0;\nint[32] i;\nif (i == 0) {\n} else {\n    i = 1;\n}"
        );
    }
}
