//! Expression printing with minimal parenthesization.
//!
//! Binding strength, loosest first:
//!
//! ```text
//! ||  &&  |  ^  &  == !=  < <= > >=  << >>  + -  * / %  unary  **  atom
//! ```
//!
//! Binary operators are left-associative except `**`, which also binds
//! tighter than a prefix operator: `-x ** 2` is `-(x ** 2)`. Negative
//! literals print with their sign and so rank as unary. A child is wrapped
//! in parentheses only when it binds looser than its position requires.

use oqforge_ir::{BinaryOp, Expression};

use crate::format::{FormatOptions, format_complex, format_duration, format_float};

const PREC_ADDITIVE: u8 = 9;
const PREC_UNARY: u8 = 11;
const PREC_POWER: u8 = 12;
const PREC_ATOM: u8 = 13;

fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::BitOr => 3,
        BinaryOp::BitXor => 4,
        BinaryOp::BitAnd => 5,
        BinaryOp::Eq | BinaryOp::Ne => 6,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 7,
        BinaryOp::Shl | BinaryOp::Shr => 8,
        BinaryOp::Add | BinaryOp::Sub => PREC_ADDITIVE,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
        BinaryOp::Pow => PREC_POWER,
    }
}

/// How tightly the printed form of `expr` binds.
fn precedence(expr: &Expression) -> u8 {
    match expr {
        Expression::Binary { op, .. } => binary_precedence(*op),
        Expression::Unary { .. } => PREC_UNARY,
        Expression::Int(value) if *value < 0 => PREC_UNARY,
        Expression::Float(value) | Expression::Duration(value) if value.is_sign_negative() => {
            PREC_UNARY
        }
        Expression::Complex { re, im } => {
            if *re != 0.0 && *im != 0.0 {
                PREC_ADDITIVE
            } else if (*im == 0.0 && re.is_sign_negative()) || (*re == 0.0 && *im < 0.0) {
                PREC_UNARY
            } else {
                PREC_ATOM
            }
        }
        _ => PREC_ATOM,
    }
}

pub(crate) struct ExprPrinter<'a> {
    options: &'a FormatOptions,
    out: String,
}

impl<'a> ExprPrinter<'a> {
    pub(crate) fn new(options: &'a FormatOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    pub(crate) fn print(mut self, expr: &Expression) -> String {
        self.expr(expr, 0);
        self.out
    }

    pub(crate) fn print_list(self, exprs: &[Expression]) -> String {
        let options = self.options;
        exprs
            .iter()
            .map(|expr| ExprPrinter::new(options).print(expr))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn expr(&mut self, expr: &Expression, min: u8) {
        if precedence(expr) < min {
            self.out.push('(');
            self.bare(expr);
            self.out.push(')');
        } else {
            self.bare(expr);
        }
    }

    fn bare(&mut self, expr: &Expression) {
        match expr {
            Expression::Identifier(name) => self.out.push_str(name),
            Expression::Bool(value) => self.out.push_str(if *value { "true" } else { "false" }),
            Expression::Int(value) => self.out.push_str(&value.to_string()),
            Expression::Float(value) => self.out.push_str(&format_float(*value)),
            Expression::Complex { re, im } => self.out.push_str(&format_complex(*re, *im)),
            Expression::Duration(seconds) => {
                self.out.push_str(&format_duration(*seconds, self.options))
            }
            Expression::Unary { op, operand } => {
                self.out.push_str(op.as_str());
                self.expr(operand, PREC_POWER);
            }
            Expression::Binary { op, lhs, rhs } => {
                let prec = binary_precedence(*op);
                let (lhs_min, rhs_min) = if *op == BinaryOp::Pow {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                self.expr(lhs, lhs_min);
                self.out.push(' ');
                self.out.push_str(op.as_str());
                self.out.push(' ');
                self.expr(rhs, rhs_min);
            }
            Expression::Paren(inner) => {
                self.out.push('(');
                self.expr(inner, 0);
                self.out.push(')');
            }
            Expression::Call { name, args } => {
                self.out.push_str(name);
                self.out.push('(');
                self.list(args);
                self.out.push(')');
            }
            Expression::Index { target, index } => {
                self.expr(target, PREC_ATOM);
                self.out.push('[');
                self.list(index);
                self.out.push(']');
            }
            Expression::Range { start, step, end } => {
                self.out.push('[');
                self.optional(start.as_deref());
                self.out.push(':');
                if let Some(step) = step {
                    self.expr(step, 0);
                    self.out.push(':');
                }
                self.optional(end.as_deref());
                self.out.push(']');
            }
            Expression::Set(items) => {
                self.out.push('{');
                self.list(items);
                self.out.push('}');
            }
        }
    }

    fn optional(&mut self, expr: Option<&Expression>) {
        if let Some(expr) = expr {
            self.expr(expr, 0);
        }
    }

    fn list(&mut self, items: &[Expression]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(item, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oqforge_ir::UnaryOp;

    fn print(expr: &Expression) -> String {
        ExprPrinter::new(&FormatOptions::default()).print(expr)
    }

    fn id(name: &str) -> Expression {
        Expression::ident(name)
    }

    fn bin(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::binary(op, lhs, rhs)
    }

    #[test]
    fn test_parenthesizes_looser_child() {
        let expr = bin(
            BinaryOp::Mul,
            Expression::Int(2),
            bin(BinaryOp::Add, id("i"), id("j")),
        );
        assert_eq!(print(&expr), "2 * (i + j)");
    }

    #[test]
    fn test_left_associative_chain() {
        let expr = bin(
            BinaryOp::Mod,
            bin(
                BinaryOp::Mod,
                Expression::Int(2),
                bin(BinaryOp::Add, Expression::Int(2), id("i")),
            ),
            Expression::Int(2),
        );
        assert_eq!(print(&expr), "2 % (2 + i) % 2");

        let expr = bin(BinaryOp::Sub, id("a"), bin(BinaryOp::Sub, id("b"), id("c")));
        assert_eq!(print(&expr), "a - (b - c)");
    }

    #[test]
    fn test_power_is_right_associative() {
        let right = bin(BinaryOp::Pow, id("a"), bin(BinaryOp::Pow, id("b"), id("c")));
        assert_eq!(print(&right), "a ** b ** c");
        let left = bin(BinaryOp::Pow, bin(BinaryOp::Pow, id("a"), id("b")), id("c"));
        assert_eq!(print(&left), "(a ** b) ** c");
    }

    #[test]
    fn test_power_binds_tighter_than_unary() {
        let neg = |operand| Expression::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        };
        let squared = |base| bin(BinaryOp::Pow, base, Expression::Int(2));

        assert_eq!(print(&squared(neg(id("x")))), "(-x) ** 2");
        assert_eq!(print(&neg(squared(id("x")))), "-x ** 2");
        assert_eq!(print(&squared(Expression::Int(-2))), "(-2) ** 2");
        assert_eq!(print(&squared(Expression::Float(-0.5))), "(-0.5) ** 2");
        assert_eq!(
            print(&squared(Expression::Complex { re: 0.0, im: -1.0 })),
            "(-1.0im) ** 2"
        );
        assert_eq!(print(&squared(Expression::Int(2))), "2 ** 2");
        assert_eq!(
            print(&bin(BinaryOp::Mul, Expression::Int(2), neg(id("x")))),
            "2 * -x"
        );
    }

    #[test]
    fn test_logical_and_comparison() {
        let expr = bin(
            BinaryOp::And,
            bin(BinaryOp::Lt, id("i"), Expression::Int(3)),
            bin(BinaryOp::Or, id("a"), id("b")),
        );
        assert_eq!(print(&expr), "i < 3 && (a || b)");
    }

    #[test]
    fn test_unary() {
        let neg = Expression::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(bin(BinaryOp::Add, id("i"), Expression::Int(1))),
        };
        assert_eq!(print(&neg), "-(i + 1)");
        let not = Expression::Unary {
            op: UnaryOp::Not,
            operand: Box::new(id("b")),
        };
        assert_eq!(print(&not), "!b");
        let double = Expression::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expression::Int(-1)),
        };
        assert_eq!(print(&double), "-(-1)");
    }

    #[test]
    fn test_complex_operand() {
        let expr = bin(
            BinaryOp::Mul,
            Expression::Int(2),
            Expression::Complex { re: 1.0, im: 2.0 },
        );
        assert_eq!(print(&expr), "2 * (1.0 + 2.0im)");
        let expr = bin(
            BinaryOp::Add,
            id("z2"),
            Expression::Complex { re: 0.0, im: 2.0 },
        );
        assert_eq!(print(&expr), "z2 + 2.0im");
    }

    #[test]
    fn test_call_index_range_set() {
        let call = Expression::call(
            "constant",
            vec![Expression::Duration(100e-9), Expression::Float(0.5)],
        );
        assert_eq!(print(&call), "constant(100.0ns, 0.5)");
        let index = Expression::Index {
            target: Box::new(id("arr")),
            index: vec![Expression::Int(1)],
        };
        assert_eq!(print(&index), "arr[1]");
        let range = Expression::Range {
            start: Some(Box::new(Expression::Int(0))),
            step: None,
            end: Some(Box::new(Expression::Int(4))),
        };
        assert_eq!(print(&range), "[0:4]");
        let stepped = Expression::Range {
            start: Some(Box::new(Expression::Int(0))),
            step: Some(Box::new(Expression::Int(2))),
            end: Some(Box::new(Expression::Int(10))),
        };
        assert_eq!(print(&stepped), "[0:2:10]");
        let set = Expression::Set(vec![
            Expression::Int(-1),
            Expression::Int(1),
            Expression::Complex { re: 0.0, im: -2.1 },
        ]);
        assert_eq!(print(&set), "{-1, 1, -2.1im}");
    }

    #[test]
    fn test_explicit_paren() {
        let expr = Expression::Paren(Box::new(id("x")));
        assert_eq!(print(&expr), "(x)");
    }
}
