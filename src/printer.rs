//! Diagnostic rendering of expression trees.
//!
//! Output is an s-expression in which every field of a node appears exactly
//! once, labelled with its role, e.g. `(binary left=1 op=+ right=2)`. It is
//! meant for debugging and tests; two trees that render the same are not
//! necessarily the same tree.

use std::fmt::{self, Write};

use crate::{
    expr::{
        AssignExpr, BinaryExpr, CallExpr, Expr, GetExpr, GroupingExpr, LiteralExpr, LogicalExpr,
        SetExpr, SuperExpr, ThisExpr, UnaryExpr, VariableExpr, Visitor,
    },
    value::Value,
};

/// Writes the rendering of a tree straight into `out`, one node at a time.
///
/// Fails only if the writer does; rendering into a `String` cannot fail.
#[derive(Debug, Default, Clone)]
pub struct AstPrinter<W> {
    out: W,
}

impl<W: Write> AstPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn print(expr: &Expr) -> String {
    expr.to_string()
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.accept(&mut AstPrinter::new(f))
    }
}

impl<W: Write> Visitor for AstPrinter<W> {
    type Output = ();
    type Error = fmt::Error;

    fn visit_assign(&mut self, expr: &AssignExpr) -> fmt::Result {
        write!(self.out, "(assign name={} value=", expr.name().lexeme)?;
        expr.value().accept(self)?;
        self.out.write_char(')')
    }

    fn visit_binary(&mut self, expr: &BinaryExpr) -> fmt::Result {
        self.out.write_str("(binary left=")?;
        expr.left().accept(self)?;
        write!(self.out, " op={} right=", expr.operator().lexeme)?;
        expr.right().accept(self)?;
        self.out.write_char(')')
    }

    fn visit_call(&mut self, expr: &CallExpr) -> fmt::Result {
        self.out.write_str("(call callee=")?;
        expr.callee().accept(self)?;
        write!(self.out, " paren={} args=[", expr.paren().lexeme)?;
        for (i, argument) in expr.arguments().iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            argument.accept(self)?;
        }
        self.out.write_str("])")
    }

    fn visit_get(&mut self, expr: &GetExpr) -> fmt::Result {
        write!(self.out, "(get name={} object=", expr.name().lexeme)?;
        expr.object().accept(self)?;
        self.out.write_char(')')
    }

    fn visit_grouping(&mut self, expr: &GroupingExpr) -> fmt::Result {
        self.out.write_str("(group ")?;
        expr.expression().accept(self)?;
        self.out.write_char(')')
    }

    fn visit_literal(&mut self, expr: &LiteralExpr) -> fmt::Result {
        match expr.value() {
            Value::String(s) => write!(self.out, "{s:?}"),
            other => write!(self.out, "{other}"),
        }
    }

    fn visit_logical(&mut self, expr: &LogicalExpr) -> fmt::Result {
        self.out.write_str("(logical left=")?;
        expr.left().accept(self)?;
        write!(self.out, " op={} right=", expr.operator().lexeme)?;
        expr.right().accept(self)?;
        self.out.write_char(')')
    }

    fn visit_set(&mut self, expr: &SetExpr) -> fmt::Result {
        write!(self.out, "(set name={} object=", expr.name().lexeme)?;
        expr.object().accept(self)?;
        self.out.write_str(" value=")?;
        expr.value().accept(self)?;
        self.out.write_char(')')
    }

    fn visit_super(&mut self, expr: &SuperExpr) -> fmt::Result {
        write!(
            self.out,
            "(super keyword={} method={})",
            expr.keyword().lexeme,
            expr.method().lexeme
        )
    }

    fn visit_this(&mut self, expr: &ThisExpr) -> fmt::Result {
        write!(self.out, "(this keyword={})", expr.keyword().lexeme)
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) -> fmt::Result {
        write!(self.out, "(unary op={} right=", expr.operator().lexeme)?;
        expr.right().accept(self)?;
        self.out.write_char(')')
    }

    fn visit_variable(&mut self, expr: &VariableExpr) -> fmt::Result {
        write!(self.out, "(variable name={})", expr.name().lexeme)
    }
}
