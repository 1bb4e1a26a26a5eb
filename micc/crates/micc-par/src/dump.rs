//! Indented tree dump of the AST, used by the driver's `--emit ast`.

use std::fmt::Write;

use micc_util::Span;

use crate::ast::{Block, Decl, Expr, Program, Stmt};

/// Render `program` as an indented tag tree.
pub fn dump(program: &Program) -> String {
    let mut out = String::new();
    let mut printer = Printer { out: &mut out };
    printer.line(0, "program", None, Span::DUMMY);
    printer.line(1, "declaration_list", None, Span::DUMMY);
    for decl in &program.decls {
        printer.decl(2, decl);
    }
    out
}

struct Printer<'a> {
    out: &'a mut String,
}

impl<'a> Printer<'a> {
    fn line(&mut self, depth: usize, tag: &str, value: Option<&str>, span: Span) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(tag);
        if let Some(value) = value {
            let _ = write!(self.out, " '{}'", value);
        }
        if span.line != 0 {
            let _ = write!(self.out, " (line {}, column {})", span.line, span.column);
        }
        self.out.push('\n');
    }

    fn decl(&mut self, depth: usize, decl: &Decl) {
        match decl {
            Decl::Var(var) => {
                self.line(depth, "variable_declaration", None, var.ty_span);
                self.line(depth + 1, "type", Some(&var.ty.to_string()), var.ty_span);
                self.line(depth + 1, "identifiers", None, Span::DUMMY);
                for name in &var.names {
                    self.line(depth + 2, "id", Some(&name.name), name.span);
                }
            }
            Decl::Stmt(stmt) => self.stmt(depth, stmt),
        }
    }

    fn stmt(&mut self, depth: usize, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(assign) => {
                self.line(depth, "assignment", None, assign.span);
                self.line(depth + 1, "id", Some(&assign.target.name), assign.target.span);
                self.expr(depth + 1, &assign.value);
            }
            Stmt::Incr(incr) => {
                self.line(depth, "unary_statement", None, incr.span);
                self.line(depth + 1, "id", Some(&incr.target.name), incr.target.span);
                let op = if incr.delta > 0 { "+1" } else { "-1" };
                self.line(depth + 1, "unary_op", Some(op), incr.span);
            }
            Stmt::Expr(es) => {
                self.line(depth, "expression_statement", None, es.span);
                self.expr(depth + 1, &es.expr);
            }
            Stmt::Output(out) => {
                self.line(depth, "output_statement", None, out.span);
                for item in &out.items {
                    self.expr(depth + 1, item);
                }
            }
            Stmt::Input(input) => {
                self.line(depth, "input_statement", None, input.span);
                self.line(depth + 1, "id", Some(&input.target.name), input.target.span);
            }
            Stmt::If(sel) => {
                self.line(depth, "selection", None, sel.span);
                self.expr(depth + 1, &sel.cond);
                self.block(depth + 1, &sel.then_block);
                if let Some(else_block) = &sel.else_block {
                    self.block(depth + 1, else_block);
                }
            }
            Stmt::While(w) => {
                self.line(depth, "while", None, w.span);
                self.expr(depth + 1, &w.cond);
                self.block(depth + 1, &w.body);
            }
            Stmt::DoWhile(dw) => {
                self.line(depth, "do_while", None, dw.span);
                self.block(depth + 1, &dw.body);
                self.expr(depth + 1, &dw.cond);
            }
            Stmt::Block(block) => self.block(depth, block),
        }
    }

    fn block(&mut self, depth: usize, block: &Block) {
        self.line(depth, "block", None, block.span);
        for stmt in &block.stmts {
            self.stmt(depth + 1, stmt);
        }
    }

    fn expr(&mut self, depth: usize, expr: &Expr) {
        match expr {
            Expr::Int { value, span } => {
                self.line(depth, "INT_LITERAL", Some(&value.to_string()), *span)
            }
            Expr::Real { value, span } => {
                self.line(depth, "REAL_LITERAL", Some(&format!("{:?}", value)), *span)
            }
            Expr::Bool { value, span } => self.line(depth, "bool", Some(&value.to_string()), *span),
            Expr::Str { value, span } => {
                self.line(depth, "STRING_LITERAL", Some(value), *span)
            }
            Expr::Ident(ident) => self.line(depth, "id", Some(&ident.name), ident.span),
            Expr::Binary(b) => {
                self.line(depth, b.op.tag(), Some(b.op.symbol()), b.span);
                self.expr(depth + 1, &b.lhs);
                self.expr(depth + 1, &b.rhs);
            }
            Expr::Neg(n) => {
                self.line(depth, "unary_op", Some("-"), n.span);
                self.expr(depth + 1, &n.operand);
            }
            Expr::Not(n) => {
                self.line(depth, "log_op", Some("!"), n.span);
                self.expr(depth + 1, &n.operand);
            }
            Expr::Incr(i) => {
                let op = if i.delta > 0 { "+1" } else { "-1" };
                self.line(depth, "unary_op", Some(op), i.span);
                self.expr(depth + 1, &i.operand);
            }
        }
    }
}
