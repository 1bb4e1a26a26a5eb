//! The tree walker: checks, folds, and emits TAC.

use micc_par::{
    AssignStmt, BinOp, BinaryExpr, Block, Decl, DoWhileStmt, Expr, Ident, IfStmt, IncrExpr,
    IncrStmt, InputStmt, NegExpr, NotExpr, OutputStmt, Program, Stmt, TypeName, VarDecl,
    WhileStmt,
};
use micc_tac::{Operand, TacBuilder, TacInstr};
use micc_util::{floor_mod_int, floor_mod_real, Handler, Span, Value};

use crate::symbols::{SymbolTable, SymbolValue};

/// Everything the semantic pass produces besides diagnostics.
pub struct Analysis {
    /// The populated symbol table.
    pub symbols: SymbolTable,
    /// Three-address code for the whole program.
    pub tac: Vec<TacInstr>,
    /// Per-node type/value annotations, in visit order.
    pub annotations: Vec<NodeAnnotation>,
}

/// Type and folded value attached to a visited node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeAnnotation {
    /// Node tag (`assignment`, `sum_op`, `id`, ...).
    pub node: &'static str,
    /// Folded value, when the node evaluated to a constant.
    pub value: Option<String>,
    /// Inferred type, when one could be determined.
    pub ty: Option<TypeName>,
    /// Source line.
    pub line: u32,
    /// Source column.
    pub column: u32,
}

/// Run semantic analysis over a parsed program.
///
/// Errors and warnings are reported into `handler`; the returned
/// [`Analysis`] is produced on a best-effort basis even when the
/// program has faults.
pub fn analyse(program: &Program, handler: &Handler) -> Analysis {
    let mut analyzer = Analyzer {
        table: SymbolTable::new(),
        builder: TacBuilder::new(),
        handler,
        annotations: Vec::new(),
    };
    analyzer.run(program)
}

/// Result of evaluating an expression: its type plus the operand later
/// instructions should consume.
struct ExprResult {
    ty: TypeName,
    operand: Operand,
}

struct Analyzer<'a> {
    table: SymbolTable,
    builder: TacBuilder,
    handler: &'a Handler,
    annotations: Vec<NodeAnnotation>,
}

impl<'a> Analyzer<'a> {
    fn run(mut self, program: &Program) -> Analysis {
        self.builder.emit(TacInstr::Comment("begin program".into()));
        for decl in &program.decls {
            self.visit_decl(decl);
        }
        self.builder.emit(TacInstr::Comment("end program".into()));

        for symbol in self.table.symbols() {
            if !symbol.used {
                self.handler.warning(
                    Span::point(symbol.line, symbol.column),
                    format!("variable '{}' declared but never used", symbol.name),
                );
            }
        }

        Analysis {
            symbols: self.table,
            tac: self.builder.finish(),
            annotations: self.annotations,
        }
    }

    fn visit_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(var) => self.visit_var_decl(var),
            Decl::Stmt(stmt) => self.visit_stmt(stmt),
        }
    }

    fn visit_var_decl(&mut self, var: &VarDecl) {
        for name in &var.names {
            match self
                .table
                .insert(&name.name, var.ty, name.span.line, name.span.column)
            {
                Ok(()) => {
                    self.builder.emit(TacInstr::Declare {
                        name: name.name.clone(),
                        ty: var.ty,
                    });
                }
                Err((line, column)) => {
                    self.handler.error(
                        name.span,
                        format!(
                            "variable '{}' already declared at line {} column {}",
                            name.name, line, column
                        ),
                    );
                }
            }
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(assign) => self.visit_assign(assign),
            Stmt::Incr(incr) => self.visit_incr(incr),
            Stmt::Expr(es) => {
                self.eval_expr(&es.expr);
            }
            Stmt::Output(out) => self.visit_output(out),
            Stmt::Input(input) => self.visit_input(input),
            Stmt::If(sel) => self.visit_if(sel),
            Stmt::While(w) => self.visit_while(w),
            Stmt::DoWhile(dw) => self.visit_do_while(dw),
            Stmt::Block(block) => self.visit_block(block),
        }
    }

    fn visit_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_assign(&mut self, assign: &AssignStmt) {
        // The right-hand side is evaluated first so folded values
        // surface even when the target is undeclared.
        let result = self.eval_expr(&assign.value);

        let folded = match &result {
            Some(r) => match &r.operand {
                Operand::Literal(value) => Some(value.to_string()),
                _ => None,
            },
            None => None,
        };

        let declared_ty = self.table.lookup(&assign.target.name).map(|s| s.ty);
        self.annotations.push(NodeAnnotation {
            node: "assignment",
            value: folded,
            ty: declared_ty.or(result.as_ref().map(|r| r.ty)),
            line: assign.span.line,
            column: assign.span.column,
        });

        let Some(declared_ty) = declared_ty else {
            self.handler.error(
                assign.target.span,
                format!("variable '{}' not declared", assign.target.name),
            );
            return;
        };

        self.table
            .mark_used(&assign.target.name, assign.target.span.line);

        let Some(result) = result else { return };

        if !assignable(declared_ty, result.ty) {
            self.handler.error(
                assign.target.span,
                format!(
                    "type mismatch: cannot assign '{}' to '{}'",
                    result.ty, declared_ty
                ),
            );
        }

        let known = match &result.operand {
            Operand::Literal(value) => Some(SymbolValue::Literal(value.clone())),
            _ => None,
        };
        self.table.mark_initialised(&assign.target.name, known);

        self.builder.emit(TacInstr::Copy {
            dest: assign.target.name.clone(),
            src: result.operand,
        });
    }

    fn visit_incr(&mut self, incr: &IncrStmt) {
        self.incr_variable(&incr.target, incr.delta);
    }

    fn visit_output(&mut self, out: &OutputStmt) {
        for item in &out.items {
            if let Expr::Str { value, span } = item {
                self.annotations.push(NodeAnnotation {
                    node: "STRING_LITERAL",
                    value: Some(value.clone()),
                    ty: None,
                    line: span.line,
                    column: span.column,
                });
                self.builder.emit(TacInstr::Write {
                    value: Operand::Literal(Value::Str(value.clone())),
                });
                continue;
            }
            if let Some(result) = self.eval_expr(item) {
                self.builder.emit(TacInstr::Write {
                    value: result.operand,
                });
            }
        }
    }

    fn visit_input(&mut self, input: &InputStmt) {
        let name = &input.target.name;
        if self.table.lookup(name).is_none() {
            self.handler.error(
                input.target.span,
                format!("variable '{}' not declared", name),
            );
            return;
        }
        self.table.mark_used(name, input.target.span.line);
        self.table
            .mark_initialised(name, Some(SymbolValue::Input));
        self.builder.emit(TacInstr::Read { name: name.clone() });
    }

    fn visit_if(&mut self, sel: &IfStmt) {
        let cond = self.check_condition(&sel.cond, "if");

        let Some(cond) = cond else {
            // Condition did not evaluate; still walk the branches for
            // their diagnostics.
            self.visit_block(&sel.then_block);
            if let Some(else_block) = &sel.else_block {
                self.visit_block(else_block);
            }
            return;
        };

        if let Some(else_block) = &sel.else_block {
            let label_else = self.builder.new_label();
            let label_end = self.builder.new_label();
            self.builder.emit(TacInstr::IfFalse {
                cond,
                target: label_else,
            });
            self.visit_block(&sel.then_block);
            self.builder.emit(TacInstr::Goto { target: label_end });
            self.builder.emit(TacInstr::Label(label_else));
            self.visit_block(else_block);
            self.builder.emit(TacInstr::Label(label_end));
        } else {
            let label_end = self.builder.new_label();
            self.builder.emit(TacInstr::IfFalse {
                cond,
                target: label_end,
            });
            self.visit_block(&sel.then_block);
            self.builder.emit(TacInstr::Label(label_end));
        }
    }

    fn visit_while(&mut self, w: &WhileStmt) {
        let label_start = self.builder.new_label();
        let label_end = self.builder.new_label();

        self.builder.emit(TacInstr::Label(label_start));
        if let Some(cond) = self.check_condition(&w.cond, "while") {
            self.builder.emit(TacInstr::IfFalse {
                cond,
                target: label_end,
            });
        }
        self.visit_block(&w.body);
        self.builder.emit(TacInstr::Goto {
            target: label_start,
        });
        self.builder.emit(TacInstr::Label(label_end));
    }

    fn visit_do_while(&mut self, dw: &DoWhileStmt) {
        let label_start = self.builder.new_label();
        self.builder.emit(TacInstr::Label(label_start));
        self.visit_block(&dw.body);
        if let Some(cond) = self.check_condition(&dw.cond, "do-while") {
            self.builder.emit(TacInstr::IfTrue {
                cond,
                target: label_start,
            });
        }
    }

    /// Evaluate a condition and warn when it is not boolean.
    fn check_condition(&mut self, cond: &Expr, construct: &str) -> Option<Operand> {
        let result = self.eval_expr(cond)?;
        if result.ty != TypeName::Bool {
            self.handler.warning(
                cond.span(),
                format!(
                    "the '{}' condition should be 'bool', got '{}'",
                    construct, result.ty
                ),
            );
        }
        Some(result.operand)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn eval_expr(&mut self, expr: &Expr) -> Option<ExprResult> {
        match expr {
            Expr::Int { value, span } => {
                self.annotate_literal("INT_LITERAL", TypeName::Int, &value.to_string(), *span);
                Some(ExprResult {
                    ty: TypeName::Int,
                    operand: Operand::Literal(Value::Int(*value)),
                })
            }
            Expr::Real { value, span } => {
                self.annotate_literal("REAL_LITERAL", TypeName::Float, &format!("{:?}", value), *span);
                Some(ExprResult {
                    ty: TypeName::Float,
                    operand: Operand::Literal(Value::Real(*value)),
                })
            }
            Expr::Bool { value, span } => {
                self.annotate_literal("bool", TypeName::Bool, &value.to_string(), *span);
                Some(ExprResult {
                    ty: TypeName::Bool,
                    operand: Operand::Literal(Value::Bool(*value)),
                })
            }
            Expr::Str { span, .. } => {
                self.handler.error(
                    *span,
                    "string literals are only allowed in output statements",
                );
                None
            }
            Expr::Ident(ident) => self.eval_ident(ident),
            Expr::Binary(b) => self.eval_binary(b),
            Expr::Neg(n) => self.eval_neg(n),
            Expr::Not(n) => self.eval_not(n),
            Expr::Incr(i) => self.eval_incr_expr(i),
        }
    }

    fn eval_ident(&mut self, ident: &Ident) -> Option<ExprResult> {
        let Some(symbol) = self.table.lookup(&ident.name) else {
            self.handler.error(
                ident.span,
                format!("variable '{}' not declared", ident.name),
            );
            return None;
        };
        let ty = symbol.ty;
        if !symbol.initialised {
            self.handler.warning(
                ident.span,
                format!("variable '{}' may be uninitialised", ident.name),
            );
        }
        self.table.mark_used(&ident.name, ident.span.line);

        self.annotations.push(NodeAnnotation {
            node: "id",
            value: None,
            ty: Some(ty),
            line: ident.span.line,
            column: ident.span.column,
        });

        // The variable may change at run time, so its name travels in
        // the operand channel even when a value is currently known.
        Some(ExprResult {
            ty,
            operand: Operand::Var(ident.name.clone()),
        })
    }

    fn eval_binary(&mut self, b: &BinaryExpr) -> Option<ExprResult> {
        let lhs = self.eval_expr(&b.lhs);
        let rhs = self.eval_expr(&b.rhs);
        let (lhs, rhs) = (lhs?, rhs?);

        let folded = match (&lhs.operand, &rhs.operand) {
            (Operand::Literal(lv), Operand::Literal(rv)) => fold(b.op, lv, rv),
            _ => None,
        };

        let ty = if b.op.is_relational() || b.op.is_logical() {
            TypeName::Bool
        } else if lhs.ty == TypeName::Bool || rhs.ty == TypeName::Bool {
            self.handler.error(
                b.span,
                format!(
                    "operator '{}' applied to incompatible types '{}' and '{}'",
                    b.op, lhs.ty, rhs.ty
                ),
            );
            return None;
        } else if lhs.ty == TypeName::Float || rhs.ty == TypeName::Float {
            TypeName::Float
        } else {
            // int op int, unless the folded result came out fractional.
            match &folded {
                Some(Value::Real(r)) if r.fract() != 0.0 => TypeName::Float,
                _ => TypeName::Int,
            }
        };

        self.annotations.push(NodeAnnotation {
            node: b.op.tag(),
            value: folded.as_ref().map(|v| v.to_string()),
            ty: Some(ty),
            line: b.span.line,
            column: b.span.column,
        });

        if let Some(value) = folded {
            // The fold replaces the temporary: nothing to compute at
            // run time, so nothing is emitted.
            return Some(ExprResult {
                ty,
                operand: Operand::Literal(value),
            });
        }

        let dest = self.builder.new_temp();
        self.builder.emit(TacInstr::Binary {
            dest,
            lhs: lhs.operand,
            op: b.op,
            rhs: rhs.operand,
        });
        Some(ExprResult {
            ty,
            operand: Operand::Temp(dest),
        })
    }

    /// Unary minus: folds literals, otherwise emits `t = 0 - x`.
    fn eval_neg(&mut self, n: &NegExpr) -> Option<ExprResult> {
        let operand = self.eval_expr(&n.operand)?;
        if operand.ty == TypeName::Bool {
            self.handler.error(
                n.span,
                "unary '-' requires a numeric operand, got 'bool'",
            );
            return None;
        }

        if let Operand::Literal(value) = &operand.operand {
            let folded = match value {
                Value::Int(v) => Value::Int(-v),
                Value::Real(r) => Value::Real(-r),
                _ => unreachable!("numeric literal"),
            };
            self.annotations.push(NodeAnnotation {
                node: "unary_op",
                value: Some(folded.to_string()),
                ty: Some(operand.ty),
                line: n.span.line,
                column: n.span.column,
            });
            return Some(ExprResult {
                ty: operand.ty,
                operand: Operand::Literal(folded),
            });
        }

        self.annotations.push(NodeAnnotation {
            node: "unary_op",
            value: None,
            ty: Some(operand.ty),
            line: n.span.line,
            column: n.span.column,
        });
        let dest = self.builder.new_temp();
        self.builder.emit(TacInstr::Binary {
            dest,
            lhs: Operand::Literal(Value::Int(0)),
            op: BinOp::Sub,
            rhs: operand.operand,
        });
        Some(ExprResult {
            ty: operand.ty,
            operand: Operand::Temp(dest),
        })
    }

    fn eval_not(&mut self, n: &NotExpr) -> Option<ExprResult> {
        let operand = self.eval_expr(&n.operand)?;
        if operand.ty != TypeName::Bool {
            self.handler.error(
                n.span,
                format!("operator '!' requires a 'bool' operand, got '{}'", operand.ty),
            );
            return None;
        }

        if let Operand::Literal(value) = &operand.operand {
            let folded = Value::Bool(!value.is_truthy());
            self.annotations.push(NodeAnnotation {
                node: "log_op",
                value: Some(folded.to_string()),
                ty: Some(TypeName::Bool),
                line: n.span.line,
                column: n.span.column,
            });
            return Some(ExprResult {
                ty: TypeName::Bool,
                operand: Operand::Literal(folded),
            });
        }

        self.annotations.push(NodeAnnotation {
            node: "log_op",
            value: None,
            ty: Some(TypeName::Bool),
            line: n.span.line,
            column: n.span.column,
        });
        let dest = self.builder.new_temp();
        self.builder.emit(TacInstr::Not {
            dest,
            operand: operand.operand,
        });
        Some(ExprResult {
            ty: TypeName::Bool,
            operand: Operand::Temp(dest),
        })
    }

    fn eval_incr_expr(&mut self, incr: &IncrExpr) -> Option<ExprResult> {
        match incr.operand.as_ref() {
            Expr::Ident(ident) => self.incr_variable(ident, incr.delta),
            other => {
                self.handler.error(
                    other.span(),
                    "'++' and '--' apply only to variables",
                );
                None
            }
        }
    }

    /// Shared body of the unary statement and the postfix expression:
    /// `t = x + ±1; x = t`.
    fn incr_variable(&mut self, ident: &Ident, delta: i32) -> Option<ExprResult> {
        let Some(symbol) = self.table.lookup(&ident.name) else {
            self.handler.error(
                ident.span,
                format!("variable '{}' not declared", ident.name),
            );
            return None;
        };
        let ty = symbol.ty;
        if ty == TypeName::Bool {
            self.handler.error(
                ident.span,
                format!(
                    "'++' and '--' apply only to numeric variables, not '{}'",
                    ty
                ),
            );
            return None;
        }

        // One read plus one write: the variable is used twice on this
        // line, mirroring `x = x + 1`.
        self.table.mark_used(&ident.name, ident.span.line);
        self.table.mark_used(&ident.name, ident.span.line);

        self.annotations.push(NodeAnnotation {
            node: "unary_op",
            value: Some(if delta > 0 { "+1".into() } else { "-1".into() }),
            ty: Some(ty),
            line: ident.span.line,
            column: ident.span.column,
        });

        let dest = self.builder.new_temp();
        self.builder.emit(TacInstr::Binary {
            dest,
            lhs: Operand::Var(ident.name.clone()),
            op: BinOp::Add,
            rhs: Operand::Literal(Value::Int(delta as i64)),
        });
        self.builder.emit(TacInstr::Copy {
            dest: ident.name.clone(),
            src: Operand::Temp(dest),
        });

        Some(ExprResult {
            ty,
            operand: Operand::Var(ident.name.clone()),
        })
    }

    fn annotate_literal(&mut self, node: &'static str, ty: TypeName, value: &str, span: Span) {
        self.annotations.push(NodeAnnotation {
            node,
            value: Some(value.to_string()),
            ty: Some(ty),
            line: span.line,
            column: span.column,
        });
    }
}

/// Assignment compatibility: identical types, or `float := int`.
fn assignable(dest: TypeName, src: TypeName) -> bool {
    dest == src || (dest == TypeName::Float && src == TypeName::Int)
}

/// Round a folded real result to two decimals.
fn round_real(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Fold `lv op rv` when both operands are compile-time values.
/// Returns `None` when the operation cannot be evaluated (division by
/// zero, non-numeric operands, overflow); the caller then emits the
/// run-time instruction instead.
fn fold(op: BinOp, lv: &Value, rv: &Value) -> Option<Value> {
    use BinOp::*;

    match op {
        And => return Some(Value::Bool(lv.is_truthy() && rv.is_truthy())),
        Or => return Some(Value::Bool(lv.is_truthy() || rv.is_truthy())),
        _ => {}
    }

    let (a, b) = (lv.as_real()?, rv.as_real()?);

    if op.is_relational() {
        let result = match op {
            Lt => a < b,
            Gt => a > b,
            Le => a <= b,
            Ge => a >= b,
            Eq => a == b,
            Ne => a != b,
            _ => unreachable!(),
        };
        return Some(Value::Bool(result));
    }

    let both_int = matches!((lv, rv), (Value::Int(_), Value::Int(_)));
    if both_int {
        let (x, y) = match (lv, rv) {
            (Value::Int(x), Value::Int(y)) => (*x, *y),
            _ => unreachable!(),
        };
        let result = match op {
            Add => x.checked_add(y)?,
            Sub => x.checked_sub(y)?,
            Mul => x.checked_mul(y)?,
            // Integer semantics: truncating division.
            Div => {
                if y == 0 {
                    return None;
                }
                x.checked_div(y)?
            }
            Mod => {
                if y == 0 {
                    return None;
                }
                floor_mod_int(x, y)
            }
            Pow => {
                if y >= 0 {
                    x.checked_pow(u32::try_from(y).ok()?)?
                } else {
                    // Negative exponent leaves the integers.
                    return Some(Value::Real(round_real((x as f64).powf(y as f64))));
                }
            }
            _ => unreachable!(),
        };
        return Some(Value::Int(result));
    }

    let result = match op {
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div => {
            if b == 0.0 {
                return None;
            }
            a / b
        }
        Mod => {
            if b == 0.0 {
                return None;
            }
            floor_mod_real(a, b)
        }
        Pow => a.powf(b),
        _ => unreachable!(),
    };
    Some(Value::Real(round_real(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use micc_tac::listing;

    fn analyse_source(source: &str) -> (Analysis, Handler) {
        let handler = Handler::new();
        let tokens = micc_lex::scan(source, &handler);
        let program = micc_par::parse(tokens, &handler);
        let analysis = analyse(&program, &handler);
        (analysis, handler)
    }

    #[test]
    fn test_declaration_assignment_output() {
        let source = "main {\n    int x;\n    x = 7;\n    cout << x;\n}";
        let (analysis, handler) = analyse_source(source);
        assert!(!handler.has_errors(), "{:?}", handler.errors());

        let tac = listing(&analysis.tac);
        assert_eq!(
            tac,
            "# begin program\nDECLARE x int\nx = 7\nWRITE x\n# end program\n"
        );

        let rows = analysis.symbols.report();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "7");
        assert_eq!(rows[0].data_type, "int");
        assert_eq!(rows[0].use_lines, vec![2, 3, 4]);
    }

    #[test]
    fn test_redeclaration_keeps_one_symbol() {
        let (analysis, handler) = analyse_source("main { int x; int x; }");
        assert_eq!(handler.error_count(), 1);
        assert!(handler.errors()[0].message.contains("already declared"));
        assert_eq!(analysis.symbols.len(), 1);
    }

    #[test]
    fn test_undeclared_assignment_still_folds() {
        let (analysis, handler) = analyse_source("main { y = 3 + 4; }");
        assert_eq!(handler.error_count(), 1);
        assert!(handler.errors()[0].message.contains("not declared"));

        // The assignment node still carries the folded value 7.
        let annotation = analysis
            .annotations
            .iter()
            .find(|a| a.node == "assignment")
            .expect("assignment annotation");
        assert_eq!(annotation.value.as_deref(), Some("7"));

        // No copy was emitted for the undeclared target.
        assert!(!listing(&analysis.tac).contains("y ="));
    }

    #[test]
    fn test_constant_fold_replaces_temporaries() {
        let (analysis, handler) = analyse_source("main { int x; x = 2 * 3 + 1; }");
        assert!(!handler.has_errors());
        let tac = listing(&analysis.tac);
        assert!(tac.contains("x = 7"), "{}", tac);
        assert!(!tac.contains("t0"), "no temporary expected: {}", tac);
    }

    #[test]
    fn test_int_division_truncates_in_fold() {
        let (analysis, _) = analyse_source("main { int x; x = 7 / 2; }");
        assert!(listing(&analysis.tac).contains("x = 3"));
    }

    #[test]
    fn test_mod_fold_sign_follows_divisor() {
        // (3 - 8) % 3: the remainder of a negative dividend carries
        // the divisor's sign, so -5 % 3 is 1.
        let (analysis, handler) = analyse_source("main { int y; y = (3 - 8) % 3; }");
        assert!(!handler.has_errors());
        assert!(listing(&analysis.tac).contains("y = 1"));

        let (analysis, _) = analyse_source("main { int y; y = 5 % (0 - 3); }");
        assert!(listing(&analysis.tac).contains("y = -1"));
    }

    #[test]
    fn test_real_fold_rounds_to_two_decimals() {
        let (analysis, _) = analyse_source("main { float f; f = 1.0 / 3.0; }");
        assert!(listing(&analysis.tac).contains("f = 0.33"));
    }

    #[test]
    fn test_division_by_zero_not_folded() {
        let (analysis, handler) = analyse_source("main { int x; x = 1 / 0; }");
        assert!(!handler.has_errors());
        let tac = listing(&analysis.tac);
        assert!(tac.contains("t0 = 1 / 0"), "{}", tac);
        assert!(tac.contains("x = t0"), "{}", tac);
    }

    #[test]
    fn test_float_accepts_int() {
        let (_, handler) = analyse_source("main { float f; int i; i = 2; f = i; cout << f; }");
        assert!(!handler.has_errors(), "{:?}", handler.errors());
    }

    #[test]
    fn test_int_rejects_float() {
        let (_, handler) = analyse_source("main { int i; i = 2.5; }");
        assert_eq!(handler.error_count(), 1);
        assert!(handler.errors()[0]
            .message
            .contains("cannot assign 'float' to 'int'"));
    }

    #[test]
    fn test_arithmetic_on_bool_rejected() {
        let (_, handler) = analyse_source("main { int x; x = true + 1; }");
        assert!(handler
            .errors()
            .iter()
            .any(|d| d.message.contains("incompatible types")));
    }

    #[test]
    fn test_not_requires_bool() {
        let (_, handler) = analyse_source("main { int x; x = 1; bool b; b = !x; }");
        assert!(handler
            .errors()
            .iter()
            .any(|d| d.message.contains("'!' requires a 'bool'")));
    }

    #[test]
    fn test_incr_statement_emits_pair() {
        let (analysis, handler) = analyse_source("main { int x; x = 1; x++; }");
        assert!(!handler.has_errors());
        let tac = listing(&analysis.tac);
        assert!(tac.contains("t0 = x + 1"), "{}", tac);
        assert!(tac.contains("x = t0"), "{}", tac);
        // Read + write: the line of `x++` appears twice.
        let symbol = analysis.symbols.lookup("x").unwrap();
        let count = symbol.use_lines.iter().filter(|&&l| l == 1).count();
        assert!(count >= 3, "use_lines: {:?}", symbol.use_lines);
    }

    #[test]
    fn test_decrement_emits_plus_minus_one() {
        let (analysis, _) = analyse_source("main { int x; x = 1; x--; }");
        assert!(listing(&analysis.tac).contains("t0 = x + -1"));
    }

    #[test]
    fn test_incr_on_bool_rejected() {
        let (_, handler) = analyse_source("main { bool b; b = true; b++; }");
        assert!(handler
            .errors()
            .iter()
            .any(|d| d.message.contains("numeric variables")));
    }

    #[test]
    fn test_unary_minus_folds_literal() {
        let (analysis, handler) = analyse_source("main { int x; x = -5; }");
        assert!(!handler.has_errors());
        assert!(listing(&analysis.tac).contains("x = -5"));
    }

    #[test]
    fn test_unary_minus_on_variable_emits_zero_sub() {
        let (analysis, handler) = analyse_source("main { int a; int b; a = 1; b = -a; }");
        assert!(!handler.has_errors());
        let tac = listing(&analysis.tac);
        assert!(tac.contains("t0 = 0 - a"), "{}", tac);
        assert!(tac.contains("b = t0"), "{}", tac);
    }

    #[test]
    fn test_unary_minus_on_bool_rejected() {
        let (_, handler) = analyse_source("main { bool b; b = true; int x; x = -b; }");
        assert!(handler
            .errors()
            .iter()
            .any(|d| d.message.contains("unary '-'")));
    }

    #[test]
    fn test_if_else_label_shape() {
        let source = "main { int x; x = 1; if (x > 0) { x = 2; } else { x = 3; } end }";
        let (analysis, handler) = analyse_source(source);
        assert!(!handler.has_errors());
        let tac = listing(&analysis.tac);
        assert!(tac.contains("t0 = x > 0"), "{}", tac);
        assert!(tac.contains("if not t0 goto L0"), "{}", tac);
        assert!(tac.contains("goto L1"), "{}", tac);
        assert!(tac.contains("L0:"), "{}", tac);
        assert!(tac.contains("L1:"), "{}", tac);
    }

    #[test]
    fn test_while_label_shape() {
        let source = "main { int i; i = 0; while (i < 3) { i++; } }";
        let (analysis, handler) = analyse_source(source);
        assert!(!handler.has_errors());
        let tac = listing(&analysis.tac);
        let expected = [
            "L0:",
            "t0 = i < 3",
            "if not t0 goto L1",
            "t1 = i + 1",
            "i = t1",
            "goto L0",
            "L1:",
        ];
        let mut last = 0;
        for needle in expected {
            let found = tac[last..].find(needle).unwrap_or_else(|| {
                panic!("'{}' missing or out of order in:\n{}", needle, tac)
            });
            last += found;
        }
    }

    #[test]
    fn test_do_while_emits_if_true() {
        let source = "main { int n; do { cin >> n; cout << n; } while (n > 0); }";
        let (analysis, handler) = analyse_source(source);
        assert!(!handler.has_errors());
        let tac = listing(&analysis.tac);
        assert!(tac.contains("L0:"), "{}", tac);
        assert!(tac.contains("READ n"), "{}", tac);
        assert!(tac.contains("if t0 goto L0"), "{}", tac);
    }

    #[test]
    fn test_input_marks_initialised() {
        let (analysis, _) = analyse_source("main { int n; cin >> n; }");
        let symbol = analysis.symbols.lookup("n").unwrap();
        assert!(symbol.initialised);
        assert_eq!(symbol.value, Some(SymbolValue::Input));
        assert_eq!(analysis.symbols.report()[0].value, "<input>");
    }

    #[test]
    fn test_condition_not_bool_warns() {
        let (_, handler) = analyse_source("main { int x; x = 1; if (x) { x = 2; } end }");
        assert!(!handler.has_errors());
        assert!(handler
            .warnings()
            .iter()
            .any(|d| d.message.contains("should be 'bool'")));
    }

    #[test]
    fn test_uninitialised_use_warns() {
        let (_, handler) = analyse_source("main { int x; int y; y = x; }");
        assert!(handler
            .warnings()
            .iter()
            .any(|d| d.message.contains("may be uninitialised")));
    }

    #[test]
    fn test_unused_variable_warns() {
        let (_, handler) = analyse_source("main { int x; }");
        assert!(handler
            .warnings()
            .iter()
            .any(|d| d.message.contains("never used")));
    }

    #[test]
    fn test_output_string_passes_verbatim() {
        let (analysis, handler) = analyse_source("main { cout << \"total:\\n\"; }");
        assert!(!handler.has_errors());
        assert!(listing(&analysis.tac).contains("WRITE \"total:\\n\""));
    }

    #[test]
    fn test_logical_fold_uses_truthiness() {
        let (analysis, handler) = analyse_source("main { bool b; b = true && false; }");
        assert!(!handler.has_errors());
        assert!(listing(&analysis.tac).contains("b = false"));
    }

    #[test]
    fn test_sum_of_evens_shape() {
        let source = "main {\n    int i;\n    int suma;\n\n    i = 1;\n    suma = 0;\n\n    while ( i <= 10 ) {\n        if ( i % 2 == 0 ) then {\n            suma = suma + i;\n        } end\n        i = i + 1;\n    }\n\n    cout << suma;\n}";
        let (analysis, handler) = analyse_source(source);
        assert!(!handler.has_errors(), "{:?}", handler.errors());
        let tac = listing(&analysis.tac);
        for needle in ["L0:", "L1:", "L2:", "if not t0 goto L1", "WRITE suma"] {
            assert!(tac.contains(needle), "'{}' missing in:\n{}", needle, tac);
        }
    }
}
