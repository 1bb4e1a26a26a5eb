//! Expression productions.
//!
//! Precedence, lowest to highest: relational/logical, `+ -`, `* / %`,
//! `^` (right associative), unary `!`, primary. `<<` and `>>` are not
//! expression operators.

use micc_lex::TokenKind;

use crate::ast::{BinOp, BinaryExpr, Expr, Ident, IncrExpr, NegExpr, NotExpr};
use crate::Parser;

/// Relational lexemes usable inside expressions (the stream operators
/// `<<`/`>>` are deliberately absent).
const REL_OPS: &[&str] = &["<", ">", "<=", ">=", "==", "!="];
const LOG_OPS: &[&str] = &["&&", "||", "&"];

impl<'a> Parser<'a> {
    /// `expression = simple_expr { (rel_op|log_op) simple_expr }`
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_simple_expr()?;

        loop {
            let Some(token) = self.current() else { break };
            let is_op = (token.kind == TokenKind::RelOp && REL_OPS.contains(&token.lexeme.as_str()))
                || (token.kind == TokenKind::LogOp && LOG_OPS.contains(&token.lexeme.as_str()));
            if !is_op {
                break;
            }
            let op_token = self.advance_token()?;
            let op = BinOp::from_lexeme(&op_token.lexeme)?;
            let rhs = match self.parse_simple_expr() {
                Some(expr) => expr,
                None => {
                    self.error_here(format!(
                        "missing expression after operator '{}'",
                        op_token.lexeme
                    ));
                    break;
                }
            };
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            });
        }
        Some(lhs)
    }

    /// `simple_expr = term { ("+"|"-") term } { ("++"|"--") }`
    fn parse_simple_expr(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_term()?;

        loop {
            let Some(token) = self.current() else { break };
            if token.kind != TokenKind::ArithOp {
                break;
            }
            let lexeme = token.lexeme.clone();
            match lexeme.as_str() {
                "+" | "-" => {
                    let op_token = self.advance_token()?;
                    let op = BinOp::from_lexeme(&op_token.lexeme)?;
                    let rhs = match self.parse_term() {
                        Some(expr) => expr,
                        None => {
                            self.error_here(format!(
                                "operator '{}' is missing its right operand",
                                op_token.lexeme
                            ));
                            break;
                        }
                    };
                    let span = lhs.span().merge(rhs.span());
                    lhs = Expr::Binary(BinaryExpr {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        span,
                    });
                }
                "++" | "--" => {
                    let op_token = self.advance_token()?;
                    let delta = if op_token.lexeme == "++" { 1 } else { -1 };
                    let span = lhs.span().merge(op_token.span);
                    lhs = Expr::Incr(IncrExpr {
                        operand: Box::new(lhs),
                        delta,
                        span,
                    });
                }
                _ => break,
            }
        }
        Some(lhs)
    }

    /// `term = factor { ("*"|"/"|"%") factor }`
    fn parse_term(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_factor()?;

        while let Some(token) = self.current() {
            if token.kind != TokenKind::ArithOp
                || !matches!(token.lexeme.as_str(), "*" | "/" | "%")
            {
                break;
            }
            let op_token = self.advance_token()?;
            let op = BinOp::from_lexeme(&op_token.lexeme)?;
            let rhs = match self.parse_factor() {
                Some(expr) => expr,
                None => {
                    self.error_here(format!(
                        "operator '{}' is missing its right operand",
                        op_token.lexeme
                    ));
                    break;
                }
            };
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            });
        }
        Some(lhs)
    }

    /// `factor = component [ "^" factor ]` — right associative.
    fn parse_factor(&mut self) -> Option<Expr> {
        let lhs = self.parse_component()?;

        if self
            .current()
            .is_some_and(|t| t.kind == TokenKind::ArithOp && t.lexeme == "^")
        {
            self.advance();
            let rhs = match self.parse_factor() {
                Some(expr) => expr,
                None => {
                    self.error_here("expected an exponent after '^'");
                    return Some(lhs);
                }
            };
            let span = lhs.span().merge(rhs.span());
            return Some(Expr::Binary(BinaryExpr {
                op: BinOp::Pow,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            }));
        }
        Some(lhs)
    }

    /// Primary expressions.
    fn parse_component(&mut self) -> Option<Expr> {
        let token = self.current()?.clone();

        if token.is_symbol("(") {
            self.advance();
            let inner = self.parse_expression();
            if !self.eat_symbol(")") {
                self.error_here("missing ')' after expression");
            }
            return inner;
        }

        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = match token.lexeme.parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => {
                        self.handler
                            .error(token.span, format!("integer literal '{}' is too large", token.lexeme));
                        0
                    }
                };
                Some(Expr::Int {
                    value,
                    span: token.span,
                })
            }
            TokenKind::RealLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().unwrap_or(0.0);
                Some(Expr::Real {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Identifier => {
                self.advance();
                Some(Expr::Ident(Ident {
                    name: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::StringLiteral => {
                self.advance();
                let value = token
                    .lexeme
                    .trim_matches('"')
                    .to_string();
                Some(Expr::Str {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Reserved if token.lexeme == "true" || token.lexeme == "false" => {
                self.advance();
                Some(Expr::Bool {
                    value: token.lexeme == "true",
                    span: token.span,
                })
            }
            TokenKind::ArithOp if token.lexeme == "-" => {
                self.advance();
                let operand = match self.parse_component() {
                    Some(expr) => expr,
                    None => {
                        self.error_here("missing operand after unary '-'");
                        return None;
                    }
                };
                let span = token.span.merge(operand.span());
                Some(Expr::Neg(NegExpr {
                    operand: Box::new(operand),
                    span,
                }))
            }
            TokenKind::LogOp if token.lexeme == "!" => {
                self.advance();
                let operand = match self.parse_component() {
                    Some(expr) => expr,
                    None => {
                        self.error_here("missing operand after '!'");
                        return None;
                    }
                };
                let span = token.span.merge(operand.span());
                Some(Expr::Not(NotExpr {
                    operand: Box::new(operand),
                    span,
                }))
            }
            _ => None,
        }
    }
}
