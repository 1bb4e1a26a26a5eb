//! Statement productions.

use micc_lex::TokenKind;

use crate::ast::{
    AssignStmt, Block, DoWhileStmt, ExprStmt, IfStmt, IncrStmt, InputStmt, OutputStmt, Stmt,
    WhileStmt,
};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse one statement; on failure a diagnostic has been recorded
    /// and the caller should run recovery.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        let token = self.current()?.clone();

        let stmt = match token.kind {
            TokenKind::Identifier => {
                let next = self.peek(1);
                if next.is_some_and(|t| {
                    t.kind == TokenKind::ArithOp && (t.lexeme == "++" || t.lexeme == "--")
                }) {
                    self.parse_incr_statement()
                } else if next.is_some_and(|t| t.kind == TokenKind::Assign) {
                    self.parse_assignment()
                } else {
                    self.parse_expression_statement()
                }
            }
            TokenKind::Reserved => match token.lexeme.as_str() {
                "cout" => self.parse_output(),
                "cin" => self.parse_input(),
                "if" => self.parse_selection(),
                "while" => self.parse_while(),
                "do" => self.parse_do_while(),
                _ => {
                    self.expected("statement");
                    None
                }
            },
            _ if token.is_symbol("{") => self.parse_block().map(Stmt::Block),
            _ => {
                self.expected("statement");
                None
            }
        };

        if stmt.is_none() {
            self.recover_statement();
        }
        stmt
    }

    fn parse_assignment(&mut self) -> Option<Stmt> {
        let target = self.expect_identifier()?;
        if !self.current().is_some_and(|t| t.kind == TokenKind::Assign) {
            self.error_here(format!("expected '=' after identifier '{}'", target.name));
            return None;
        }
        self.advance();

        let value = match self.parse_expression() {
            Some(expr) => expr,
            None => {
                self.error_here(format!("invalid expression in assignment of '{}'", target.name));
                return None;
            }
        };

        if !self.eat_symbol(";") {
            self.error_here("missing ';' at end of statement");
        }

        let span = target.span;
        Some(Stmt::Assign(AssignStmt {
            target,
            value,
            span,
        }))
    }

    fn parse_incr_statement(&mut self) -> Option<Stmt> {
        let target = self.expect_identifier()?;
        let op = self.advance_token()?;
        let delta = if op.lexeme == "++" { 1 } else { -1 };
        self.eat_symbol(";");
        let span = target.span;
        Some(Stmt::Incr(IncrStmt {
            target,
            delta,
            span,
        }))
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        self.eat_symbol(";");
        let span = expr.span();
        Some(Stmt::Expr(ExprStmt { expr, span }))
    }

    fn parse_output(&mut self) -> Option<Stmt> {
        let cout = self.advance_token()?; // 'cout'
        let mut items = Vec::new();

        if self.eat_op(TokenKind::RelOp, "<<").is_none() {
            self.error_here("expected '<<' after 'cout'");
            return None;
        }
        loop {
            match self.parse_expression() {
                Some(expr) => items.push(expr),
                None => {
                    self.error_here("invalid value in cout after '<<'");
                    break;
                }
            }
            if self.eat_op(TokenKind::RelOp, "<<").is_none() {
                break;
            }
        }
        self.eat_symbol(";");

        Some(Stmt::Output(OutputStmt {
            items,
            span: cout.span,
        }))
    }

    fn parse_input(&mut self) -> Option<Stmt> {
        let cin = self.advance_token()?; // 'cin'
        if self.eat_op(TokenKind::RelOp, ">>").is_none() {
            self.error_here("expected '>>' after 'cin'");
            return None;
        }
        let target = match self.expect_identifier() {
            Some(ident) => ident,
            None => {
                self.error_here("expected an identifier after 'cin >>'");
                return None;
            }
        };
        self.eat_symbol(";");

        Some(Stmt::Input(InputStmt {
            target,
            span: cin.span,
        }))
    }

    fn parse_selection(&mut self) -> Option<Stmt> {
        let if_token = self.advance_token()?; // 'if'
        if !self.expect_symbol("(") {
            return None;
        }
        let cond = match self.parse_expression() {
            Some(expr) => expr,
            None => {
                self.error_here("invalid condition in 'if'");
                return None;
            }
        };
        if !self.expect_symbol(")") {
            return None;
        }

        // Historical spelling: `if (cond) then { ... } end`.
        self.eat_reserved("then");

        let then_block = match self.parse_block() {
            Some(block) => block,
            None => {
                self.error_here("expected a block after 'if'");
                return None;
            }
        };

        let else_block = if self.eat_reserved("else") {
            match self.parse_block() {
                Some(block) => Some(block),
                None => {
                    self.error_here("expected a block after 'else'");
                    None
                }
            }
        } else {
            None
        };

        if !self.eat_reserved("end") {
            self.warn_here(if_token.span, "missing 'end' after 'if'");
        }

        Some(Stmt::If(IfStmt {
            cond,
            then_block,
            else_block,
            span: if_token.span,
        }))
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let while_token = self.advance_token()?; // 'while'
        if !self.expect_symbol("(") {
            return None;
        }
        let cond = match self.parse_expression() {
            Some(expr) => expr,
            None => {
                self.error_here("invalid condition in 'while'");
                return None;
            }
        };
        if !self.eat_symbol(")") {
            self.error_here("expected ')' after the 'while' condition");
        }
        let body = match self.parse_block() {
            Some(block) => block,
            None => {
                self.error_here("expected a block after 'while'");
                return None;
            }
        };

        Some(Stmt::While(WhileStmt {
            cond,
            body,
            span: while_token.span,
        }))
    }

    fn parse_do_while(&mut self) -> Option<Stmt> {
        let do_token = self.advance_token()?; // 'do'
        let body = match self.parse_block() {
            Some(block) => block,
            None => {
                self.error_here("expected a block after 'do'");
                return None;
            }
        };
        if !self.eat_reserved("while") {
            self.error_here("expected 'while' after the 'do' block");
            return None;
        }
        if !self.expect_symbol("(") {
            return None;
        }
        let cond = match self.parse_expression() {
            Some(expr) => expr,
            None => {
                self.error_here("invalid condition in 'do-while'");
                return None;
            }
        };
        if !self.eat_symbol(")") {
            self.error_here("expected ')' after the 'do-while' condition");
        }
        if !self.eat_symbol(";") {
            self.error_here("expected ';' at end of 'do-while'");
        }

        Some(Stmt::DoWhile(DoWhileStmt {
            body,
            cond,
            span: do_token.span,
        }))
    }

    /// A braced statement list, or a single statement promoted to a
    /// one-entry block.
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        if self.current().is_some_and(|t| t.is_symbol("{")) {
            let open = self.advance_token()?;
            let mut stmts = Vec::new();
            while let Some(token) = self.current() {
                if token.is_symbol("}") {
                    break;
                }
                match self.parse_statement() {
                    Some(stmt) => stmts.push(stmt),
                    // recover_statement already ran; skip one token if it
                    // parked us on something unusable.
                    None => {
                        if self
                            .current()
                            .is_some_and(|t| !t.is_symbol("}") && !t.is_symbol(";"))
                        {
                            self.advance();
                        } else {
                            self.eat_symbol(";");
                        }
                    }
                }
            }
            if !self.eat_symbol("}") {
                self.error_here("missing '}' at end of block");
            }
            Some(Block {
                stmts,
                span: open.span,
            })
        } else {
            let stmt = self.parse_statement()?;
            let span = match &stmt {
                Stmt::Assign(s) => s.span,
                Stmt::Incr(s) => s.span,
                Stmt::Expr(s) => s.span,
                Stmt::Output(s) => s.span,
                Stmt::Input(s) => s.span,
                Stmt::If(s) => s.span,
                Stmt::While(s) => s.span,
                Stmt::DoWhile(s) => s.span,
                Stmt::Block(b) => b.span,
            };
            Some(Block {
                stmts: vec![stmt],
                span,
            })
        }
    }
}
