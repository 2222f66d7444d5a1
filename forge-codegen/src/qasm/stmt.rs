//! Statement layout.

use oqforge_ir::{Expression, Param, Program, Statement, Type};

use super::expr::ExprPrinter;
use super::types::render_type;
use crate::builder::{CodeFragment, Renderable};
use crate::format::FormatOptions;

impl Renderable for Program {
    fn to_fragments(&self, options: &FormatOptions) -> Vec<CodeFragment> {
        let mut fragments = Vec::with_capacity(self.statements.len() + 1);
        if let Some(version) = &self.version {
            fragments.push(CodeFragment::line(format!("OPENQASM {version};")));
        }
        fragments.extend(self.statements.to_fragments(options));
        fragments
    }
}

impl Renderable for Statement {
    fn to_fragments(&self, options: &FormatOptions) -> Vec<CodeFragment> {
        let p = Printer { options };
        vec![p.statement(self)]
    }
}

struct Printer<'a> {
    options: &'a FormatOptions,
}

impl Printer<'_> {
    fn expr(&self, expr: &Expression) -> String {
        ExprPrinter::new(self.options).print(expr)
    }

    fn list(&self, exprs: &[Expression]) -> String {
        ExprPrinter::new(self.options).print_list(exprs)
    }

    fn body(&self, statements: &[Statement]) -> Vec<CodeFragment> {
        statements.iter().map(|s| self.statement(s)).collect()
    }

    fn statement(&self, statement: &Statement) -> CodeFragment {
        match statement {
            Statement::Include(path) => CodeFragment::line(format!("include \"{path}\";")),
            Statement::Pragma(text) => CodeFragment::line(format!("pragma {text}")),
            Statement::CalGrammar(grammar) => {
                CodeFragment::line(format!("defcalgrammar \"{grammar}\";"))
            }
            Statement::Declaration { ty, name, init } => {
                let ty = render_type(ty);
                match init {
                    Some(init) => CodeFragment::line(format!("{ty} {name} = {};", self.expr(init))),
                    None => CodeFragment::line(format!("{ty} {name};")),
                }
            }
            Statement::Extern {
                name,
                params,
                returns,
            } => {
                let params = params.iter().map(render_type).collect::<Vec<_>>().join(", ");
                CodeFragment::line(format!("extern {name}({params}){};", self.returns(returns)))
            }
            Statement::Assignment { target, op, value } => CodeFragment::line(format!(
                "{} {} {};",
                self.expr(target),
                op.as_str(),
                self.expr(value)
            )),
            Statement::Expression(expr) => CodeFragment::line(format!("{};", self.expr(expr))),
            Statement::Reset(qubit) => CodeFragment::line(format!("reset {};", self.expr(qubit))),
            Statement::Measure { qubit, target } => match target {
                Some(target) => CodeFragment::line(format!(
                    "{} = measure {};",
                    self.expr(target),
                    self.expr(qubit)
                )),
                None => CodeFragment::line(format!("measure {};", self.expr(qubit))),
            },
            Statement::Delay { duration, targets } => {
                let duration = self.expr(duration);
                if targets.is_empty() {
                    CodeFragment::line(format!("delay[{duration}];"))
                } else {
                    CodeFragment::line(format!("delay[{duration}] {};", self.list(targets)))
                }
            }
            Statement::Barrier(targets) => {
                if targets.is_empty() {
                    CodeFragment::line("barrier;")
                } else {
                    CodeFragment::line(format!("barrier {};", self.list(targets)))
                }
            }
            Statement::Gate { name, args, qubits } => {
                let mut line = name.clone();
                if !args.is_empty() {
                    line.push_str(&format!("({})", self.list(args)));
                }
                if !qubits.is_empty() {
                    line.push(' ');
                    line.push_str(&self.list(qubits));
                }
                line.push(';');
                CodeFragment::line(line)
            }
            Statement::Return(value) => match value {
                Some(value) => CodeFragment::line(format!("return {};", self.expr(value))),
                None => CodeFragment::line("return;"),
            },
            Statement::If { .. } => CodeFragment::sequence(self.if_chain(statement, "")),
            Statement::For {
                var_type,
                var,
                iterable,
                body,
            } => CodeFragment::block(
                format!(
                    "for {} {var} in {} {{",
                    render_type(var_type),
                    self.expr(iterable)
                ),
                self.body(body),
            ),
            Statement::While { condition, body } => CodeFragment::block(
                format!("while ({}) {{", self.expr(condition)),
                self.body(body),
            ),
            Statement::Box { duration, body } => {
                let header = match duration {
                    Some(duration) => format!("box[{}] {{", self.expr(duration)),
                    None => "box {".to_string(),
                };
                CodeFragment::block(header, self.body(body))
            }
            Statement::Cal(body) => CodeFragment::block("cal {", self.body(body)),
            Statement::Defcal {
                name,
                params,
                qubits,
                returns,
                body,
            } => {
                let mut header = format!("defcal {name}");
                if !params.is_empty() {
                    header.push_str(&format!("({})", self.params(params)));
                }
                if !qubits.is_empty() {
                    header.push(' ');
                    header.push_str(&self.list(qubits));
                }
                header.push_str(&self.returns(returns));
                header.push_str(" {");
                CodeFragment::block(header, self.body(body))
            }
            Statement::Subroutine {
                name,
                params,
                returns,
                body,
            } => CodeFragment::block(
                format!(
                    "def {name}({}){} {{",
                    self.params(params),
                    self.returns(returns)
                ),
                self.body(body),
            ),
        }
    }

    /// Lay out an if statement, folding a lone nested `if` in the else branch
    /// into `} else if (...) {`.
    fn if_chain(&self, statement: &Statement, prefix: &str) -> Vec<CodeFragment> {
        let Statement::If {
            condition,
            then_body,
            else_body,
        } = statement
        else {
            return vec![self.statement(statement)];
        };
        let header = format!("{prefix}if ({}) {{", self.expr(condition));
        if else_body.is_empty() {
            return vec![CodeFragment::block(header, self.body(then_body))];
        }
        let mut fragments = vec![CodeFragment::open_block(header, self.body(then_body))];
        match else_body.as_slice() {
            [nested @ Statement::If { .. }] => {
                fragments.extend(self.if_chain(nested, "} else "));
            }
            _ => fragments.push(CodeFragment::block("} else {", self.body(else_body))),
        }
        fragments
    }

    fn params(&self, params: &[Param]) -> String {
        params
            .iter()
            .map(|param| format!("{} {}", render_type(&param.ty), param.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn returns(&self, returns: &Option<Type>) -> String {
        match returns {
            Some(ty) => format!(" -> {}", render_type(ty)),
            None => String::new(),
        }
    }
}
