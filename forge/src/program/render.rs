//! Turning a finished program into a syntax tree and text.

use log::debug;
use oqforge_codegen::render_program;
use oqforge_ir as ir;

use super::Program;
use crate::call::{Extern, Subroutine};
use crate::config::RenderOptions;
use crate::error::{Error, Result};
use crate::registry::{Lowerer, Registry};
use crate::types::VarType;

impl Program {
    /// Render with the default options.
    pub fn render(&self) -> Result<String> {
        self.render_with(&RenderOptions::default())
    }

    /// Render to text. Rendering never changes the program, so repeated
    /// calls return the same text.
    pub fn render_with(&self, options: &RenderOptions) -> Result<String> {
        let ast = self.to_ast(options)?;
        Ok(render_program(&ast, &options.format))
    }

    /// Build the complete syntax tree: header, externs, subroutine
    /// definitions, auto-declarations and the body.
    pub fn to_ast(&self, options: &RenderOptions) -> Result<ir::Program> {
        let depth = self.open_scopes();
        if depth > 0 {
            return Err(Error::OpenScope { depth });
        }
        let mut body = self
            .stack
            .first()
            .map(|scope| scope.body.clone())
            .unwrap_or_default();
        let hoist = options.hoist_calibration_preamble;

        let mut registry = self.registry.clone();
        let declarations = if options.ignore_needs_declaration {
            Vec::new()
        } else {
            autodeclare(&mut registry, hoist)?
        };
        let externs: Vec<ir::Statement> = if options.include_externs {
            registry.externs().map(Extern::declaration).collect()
        } else {
            Vec::new()
        };
        let subroutines = registry
            .subroutines()
            .map(Subroutine::definition)
            .cloned();

        let mut statements = Vec::new();
        if hoist {
            let (pulse, other): (Vec<_>, Vec<_>) = declarations
                .into_iter()
                .partition(ir::Statement::is_pulse_declaration);
            let leading = body
                .iter()
                .take_while(|statement| statement.is_pulse_declaration())
                .count();
            let mut preamble = externs;
            preamble.extend(pulse);
            preamble.extend(body.drain(..leading));

            statements.push(ir::Statement::CalGrammar("openpulse".to_string()));
            if !preamble.is_empty() {
                statements.push(ir::Statement::Cal(preamble));
            }
            statements.extend(subroutines);
            statements.extend(other);
            statements.extend(body);
            statements = merge_adjacent_cals(statements);
        } else {
            statements.extend(externs);
            statements.extend(subroutines);
            statements.extend(declarations);
            statements.extend(body);
        }

        if options.wrap_in_cal {
            statements = vec![ir::Statement::Cal(statements)];
        }
        Ok(ir::Program::new(self.version, statements))
    }
}

/// Declare every used variable that still needs a declaration.
///
/// Each pass can surface new variables through the initializers it
/// declares (a frame's port); those are declared by the next pass and
/// placed before it.
fn autodeclare(registry: &mut Registry, hoist: bool) -> Result<Vec<ir::Statement>> {
    let mut passes: Vec<Vec<ir::Statement>> = Vec::new();
    loop {
        let pending = registry.pending_declarations();
        if pending.is_empty() {
            break;
        }
        let pending = if hoist {
            pending
        } else {
            let (mut ports, others): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|var| var.ty() == VarType::Port);
            ports.sort_by(|a, b| a.name().cmp(b.name()));
            ports.into_iter().chain(others).collect()
        };

        let mut lowerer = Lowerer::new(registry);
        let mut statements = Vec::with_capacity(pending.len());
        for var in &pending {
            if let Some(statement) = lowerer.declare(var)? {
                statements.push(statement);
            }
        }
        let registered = lowerer.finish();
        registry.commit(registered);
        if statements.is_empty() {
            break;
        }
        debug!(
            "auto-declaration pass {} declared {} variable(s)",
            passes.len() + 1,
            statements.len()
        );
        passes.push(statements);
    }
    Ok(passes.into_iter().rev().flatten().collect())
}

/// Fold runs of consecutive top-level `cal` blocks into one.
fn merge_adjacent_cals(statements: Vec<ir::Statement>) -> Vec<ir::Statement> {
    let mut merged: Vec<ir::Statement> = Vec::with_capacity(statements.len());
    for statement in statements {
        if let ir::Statement::Cal(body) = statement {
            if let Some(ir::Statement::Cal(previous)) = merged.last_mut() {
                previous.extend(body);
            } else {
                merged.push(ir::Statement::Cal(body));
            }
        } else {
            merged.push(statement);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::var::Var;

    #[test]
    fn test_render_with_open_scope() {
        let mut prog = Program::new();
        prog.open_box().unwrap();
        let err = prog.render().unwrap_err();
        assert!(matches!(err, Error::OpenScope { depth: 1 }));
        assert_eq!(err.kind(), ErrorKind::Runtime);
        prog.close().unwrap();
        assert_eq!(prog.render().unwrap(), "box {\n}");
    }

    #[test]
    fn test_render_is_repeatable() {
        let port = Var::port("p");
        let frame = Var::new_frame("f", &port, 5e9).unwrap();
        let mut prog = Program::new();
        prog.set_phase(&frame, 0).unwrap();
        let first = prog.render().unwrap();
        assert_eq!(prog.render().unwrap(), first);
        assert_eq!(
            first,
            "port p;\nframe f = newframe(p, 5000000000.0, 0);\nset_phase(f, 0);"
        );
    }

    #[test]
    fn test_ports_sorted_within_a_pass() {
        let a = Var::port("b_port");
        let b = Var::port("a_port");
        let mut prog = Program::new();
        prog.barrier([&a, &b]).unwrap();
        assert_eq!(
            prog.render().unwrap(),
            "port a_port;\nport b_port;\nbarrier b_port, a_port;"
        );
        let hoisted = prog
            .render_with(&RenderOptions::default().with_hoisted_preamble())
            .unwrap();
        assert_eq!(
            hoisted,
            "defcalgrammar \"openpulse\";\ncal {\n    port b_port;\n    port a_port;\n}\nbarrier b_port, a_port;"
        );
    }

    #[test]
    fn test_ignore_needs_declaration() {
        let mut prog = Program::new();
        prog.set(&Var::int("i"), 1).unwrap();
        let text = prog
            .render_with(&RenderOptions::default().ignoring_needs_declaration())
            .unwrap();
        assert_eq!(text, "i = 1;");
    }

    #[test]
    fn test_merge_adjacent_cals() {
        let merged = merge_adjacent_cals(vec![
            ir::Statement::Cal(vec![ir::Statement::Pragma("a".into())]),
            ir::Statement::Cal(vec![ir::Statement::Pragma("b".into())]),
            ir::Statement::Pragma("c".into()),
            ir::Statement::Cal(Vec::new()),
        ]);
        assert_eq!(
            merged,
            vec![
                ir::Statement::Cal(vec![
                    ir::Statement::Pragma("a".into()),
                    ir::Statement::Pragma("b".into()),
                ]),
                ir::Statement::Pragma("c".into()),
                ir::Statement::Cal(Vec::new()),
            ]
        );
    }
}
