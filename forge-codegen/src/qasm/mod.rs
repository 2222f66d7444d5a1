//! Printer from `oqforge-ir` nodes to OpenQASM 3 / OpenPulse text.
//!
//! Output uses the canonical layout: one statement per line, block bodies
//! indented one level, `;`-terminated simple statements and no trailing
//! newline.

mod expr;
mod stmt;
mod types;

use oqforge_ir::{Expression, Program, Statement};

use crate::builder::CodeBuilder;
use crate::format::FormatOptions;

pub use types::render_type;

/// Render a whole program, version header first when present.
pub fn render_program(program: &Program, options: &FormatOptions) -> String {
    let mut builder = CodeBuilder::new(options.indent);
    builder.emit(program, options);
    builder.finish()
}

/// Render a single statement, blocks included.
pub fn render_statement(statement: &Statement, options: &FormatOptions) -> String {
    let mut builder = CodeBuilder::new(options.indent);
    builder.emit(statement, options);
    builder.finish()
}

/// Render a single expression.
pub fn render_expression(expr: &Expression, options: &FormatOptions) -> String {
    expr::ExprPrinter::new(options).print(expr)
}

#[cfg(test)]
mod tests {
    use oqforge_ir::{AssignOp, BinaryOp, Param, Type, Version};

    use super::*;
    use crate::builder::Indent;

    fn id(name: &str) -> Expression {
        Expression::ident(name)
    }

    fn render(statement: &Statement) -> String {
        render_statement(statement, &FormatOptions::default())
    }

    fn decl(ty: Type, name: &str, init: Option<Expression>) -> Statement {
        Statement::Declaration {
            ty,
            name: name.to_string(),
            init,
        }
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            render(&decl(Type::Bool, "b", Some(Expression::Bool(true)))),
            "bool b = true;"
        );
        assert_eq!(
            render(&decl(Type::Int(Some(32)), "i", Some(Expression::Int(-4)))),
            "int[32] i = -4;"
        );
        assert_eq!(
            render(&decl(Type::Duration, "blah", Some(Expression::Duration(100e-9)))),
            "duration blah = 100.0ns;"
        );
        assert_eq!(render(&decl(Type::Angle(Some(32)), "ang", None)), "angle[32] ang;");
        assert_eq!(
            render(&decl(
                Type::Complex(Box::new(Type::Float(Some(64)))),
                "z",
                Some(Expression::Complex { re: -1.0, im: 2.0 })
            )),
            "complex[float[64]] z = -1.0 + 2.0im;"
        );
    }

    #[test]
    fn test_simple_statements() {
        let assign = Statement::Assignment {
            target: id("i"),
            op: AssignOp::Mod,
            value: Expression::Int(2),
        };
        assert_eq!(render(&assign), "i %= 2;");
        assert_eq!(render(&Statement::Reset(id("$0"))), "reset $0;");
        let measure = Statement::Measure {
            qubit: id("$0"),
            target: Some(id("c")),
        };
        assert_eq!(render(&measure), "c = measure $0;");
        let delay = Statement::Delay {
            duration: Expression::Duration(200e-6),
            targets: vec![id("a"), id("b"), id("c")],
        };
        assert_eq!(render(&delay), "delay[200000.0ns] a, b, c;");
        let bare_delay = Statement::Delay {
            duration: Expression::Float(2e-5),
            targets: vec![id("framename")],
        };
        assert_eq!(render(&bare_delay), "delay[2e-05] framename;");
        assert_eq!(render(&Statement::Barrier(vec![])), "barrier;");
        let gate = Statement::Gate {
            name: "rz".into(),
            args: vec![Expression::Float(0.5)],
            qubits: vec![id("$0")],
        };
        assert_eq!(render(&gate), "rz(0.5) $0;");
        let ext = Statement::Extern {
            name: "constant".into(),
            params: vec![Type::Duration, Type::Complex(Box::new(Type::Float(Some(64))))],
            returns: Some(Type::Waveform),
        };
        assert_eq!(
            render(&ext),
            "extern constant(duration, complex[float[64]]) -> waveform;"
        );
        assert_eq!(
            render(&Statement::CalGrammar("openpulse".into())),
            "defcalgrammar \"openpulse\";"
        );
    }

    #[test]
    fn test_if_else_chain() {
        let inner = Statement::If {
            condition: Expression::binary(BinaryOp::Eq, id("i"), Expression::Int(1)),
            then_body: vec![Statement::Return(Some(Expression::Int(1)))],
            else_body: vec![Statement::Return(None)],
        };
        let outer = Statement::If {
            condition: Expression::binary(BinaryOp::Le, id("i"), Expression::Int(0)),
            then_body: vec![Statement::Assignment {
                target: id("i"),
                op: AssignOp::Add,
                value: Expression::Int(1),
            }],
            else_body: vec![inner],
        };
        assert_eq!(
            render(&outer),
            "if (i <= 0) {\n    i += 1;\n} else if (i == 1) {\n    return 1;\n} else {\n    return;\n}"
        );
    }

    #[test]
    fn test_blocks() {
        let for_loop = Statement::For {
            var_type: Type::Int(None),
            var: "k".into(),
            iterable: Expression::Set(vec![Expression::Int(-1), Expression::Int(1)]),
            body: vec![],
        };
        assert_eq!(render(&for_loop), "for int k in {-1, 1} {\n}");
        let boxed = Statement::Box {
            duration: Some(Expression::Duration(500e-9)),
            body: vec![Statement::Cal(vec![Statement::Delay {
                duration: Expression::Duration(100e-9),
                targets: vec![],
            }])],
        };
        assert_eq!(
            render(&boxed),
            "box[500.0ns] {\n    cal {\n        delay[100.0ns];\n    }\n}"
        );
        let defcal = Statement::Defcal {
            name: "readout".into(),
            params: vec![],
            qubits: vec![id("$2")],
            returns: Some(Type::Bit(None)),
            body: vec![],
        };
        assert_eq!(render(&defcal), "defcal readout $2 -> bit {\n}");
        let def = Statement::Subroutine {
            name: "multiply".into(),
            params: vec![
                Param::new(Type::Int(Some(32)), "x"),
                Param::new(Type::Int(Some(32)), "y"),
            ],
            returns: Some(Type::Int(Some(32))),
            body: vec![Statement::Return(Some(Expression::binary(
                BinaryOp::Mul,
                id("x"),
                id("y"),
            )))],
        };
        assert_eq!(
            render(&def),
            "def multiply(int[32] x, int[32] y) -> int[32] {\n    return x * y;\n}"
        );
    }

    #[test]
    fn test_render_program() {
        let program = Program::new(
            Some(Version::default()),
            vec![decl(Type::Int(Some(32)), "i", Some(Expression::Int(5)))],
        );
        let options = FormatOptions::default();
        assert_eq!(render_program(&program, &options), "OPENQASM 3.0;\nint[32] i = 5;");
        assert_eq!(render_program(&Program::default(), &options), "");
    }

    #[test]
    fn test_render_with_tab_indent() {
        let options = FormatOptions {
            indent: Indent::Tab,
            ..FormatOptions::default()
        };
        let statement = Statement::While {
            condition: Expression::binary(BinaryOp::Lt, id("j"), Expression::Int(5)),
            body: vec![Statement::Expression(Expression::call("f", vec![]))],
        };
        assert_eq!(
            render_statement(&statement, &options),
            "while (j < 5) {\n\tf();\n}"
        );
    }
}
