//! micc-par - Syntactic analyser for Minic
//!
//! ============================================================================
//! PARSING MODEL
//! ============================================================================
//!
//! Recursive descent over the token stream, one function per
//! production:
//!
//! ```ebnf
//! program          = "main" "{" declaration_list "}" .
//! declaration_list = { declaration } .
//! declaration      = variable_declaration | statement .
//! variable_declaration = ("int"|"float"|"bool") identifier { "," identifier } ";" .
//! statement        = assignment | unary_statement | expression_statement
//!                  | output | input | selection | while | do_while | block .
//! expression       = simple_expr { (rel_op | log_op) simple_expr } .
//! simple_expr      = term { ("+"|"-") term } { ("++"|"--") } .
//! term             = factor { ("*"|"/"|"%") factor } .
//! factor           = component [ "^" factor ] .          (right associative)
//! component        = "(" expression ")" | literal | identifier
//!                  | "true" | "false" | "!" component .
//! ```
//!
//! `<<` and `>>` are stream operators only; they never parse as binary
//! expression operators. The `if` construct accepts an optional `then`
//! after the condition and an optional `end` closer; a missing `end` is
//! reported as a warning, never an error.
//!
//! ERROR RECOVERY (panic mode): when a statement cannot be parsed, the
//! parser records a diagnostic and skips tokens until one of
//! `; if while do cin cout } else` comes up, consuming a trailing `;`
//! so the next statement starts clean. A `}` is never consumed during
//! recovery, so block nesting stays balanced. The parser never panics
//! and always returns a (possibly partial) tree.

mod ast;
mod dump;
mod expr;
mod stmt;

pub use ast::{
    AssignStmt, BinOp, BinaryExpr, Block, Decl, DoWhileStmt, Expr, ExprStmt, Ident, IfStmt,
    IncrExpr, IncrStmt, InputStmt, NegExpr, NotExpr, OutputStmt, Program, Stmt, TypeName,
    VarDecl, WhileStmt,
};
pub use dump::dump;

use micc_lex::{Token, TokenKind};
use micc_util::{Handler, Span};

/// Parse a token stream into a [`Program`], reporting syntax problems
/// into `handler`.
pub fn parse(tokens: Vec<Token>, handler: &Handler) -> Program {
    Parser::new(tokens, handler).parse()
}

/// Tokens that may begin a statement; recovery stops at any of these.
const STMT_SYNC: &[&str] = &[";", "if", "while", "do", "cin", "cout", "}", "else"];

/// Recursive-descent parser with panic-mode recovery.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    /// Create a parser over `tokens`.
    pub fn new(tokens: Vec<Token>, handler: &'a Handler) -> Self {
        Self {
            tokens,
            position: 0,
            handler,
        }
    }

    /// Parse the whole program.
    pub fn parse(&mut self) -> Program {
        self.parse_program()
    }

    fn parse_program(&mut self) -> Program {
        let span = self.current().map(|t| t.span).unwrap_or(Span::DUMMY);

        if !self.eat_reserved("main") {
            self.expected("main");
            self.skip_until(&["main"]);
            self.eat_reserved("main");
        }
        if !self.eat_symbol("{") {
            self.expected("{");
            self.skip_until(&["{"]);
            self.eat_symbol("{");
        }

        let decls = self.parse_declaration_list();

        // Tolerate a missing closing brace at end of input.
        self.eat_symbol("}");

        Program { decls, span }
    }

    fn parse_declaration_list(&mut self) -> Vec<Decl> {
        let mut decls = Vec::new();
        while let Some(token) = self.current() {
            if token.is_symbol("}") {
                break;
            }
            match self.parse_declaration() {
                Some(decl) => decls.push(decl),
                None => {
                    // Keep the cursor moving so a junk token cannot stall
                    // the loop.
                    if let Some(token) = self.current() {
                        if !token.is_symbol("}") {
                            let message = format!("unexpected token '{}'", token.lexeme);
                            let span = token.span;
                            self.handler.error(span, message);
                        }
                        self.advance();
                    }
                }
            }
        }
        decls
    }

    fn parse_declaration(&mut self) -> Option<Decl> {
        let token = self.current()?;
        if token.kind == TokenKind::Reserved {
            if TypeName::from_keyword(&token.lexeme).is_some() {
                return self.parse_var_decl().map(Decl::Var);
            }
            if matches!(token.lexeme.as_str(), "if" | "while" | "do" | "cin" | "cout") {
                return self.parse_statement().map(Decl::Stmt);
            }
            return None;
        }
        if token.kind == TokenKind::Identifier || token.is_symbol("{") {
            return self.parse_statement().map(Decl::Stmt);
        }
        None
    }

    fn parse_var_decl(&mut self) -> Option<VarDecl> {
        let ty_token = self.advance_token()?;
        let ty = TypeName::from_keyword(&ty_token.lexeme)?;
        let ty_span = ty_token.span;

        let mut names = Vec::new();
        match self.expect_identifier() {
            Some(ident) => names.push(ident),
            None => {
                self.handler.error(
                    ty_span,
                    format!("expected an identifier after '{}'", ty_token.lexeme),
                );
            }
        }
        while self.eat_symbol(",") {
            match self.expect_identifier() {
                Some(ident) => names.push(ident),
                None => {
                    self.error_here("expected an identifier after ','");
                    break;
                }
            }
        }

        if !self.eat_symbol(";") {
            self.error_here("missing ';' at end of variable declaration");
        }

        Some(VarDecl { ty, ty_span, names })
    }

    // =========================================================================
    // Token stream helpers
    // =========================================================================

    pub(crate) fn current(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub(crate) fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    pub(crate) fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Consume and return the current token.
    pub(crate) fn advance_token(&mut self) -> Option<Token> {
        let token = self.current().cloned();
        self.advance();
        token
    }

    pub(crate) fn eat_symbol(&mut self, symbol: &str) -> bool {
        if self.current().is_some_and(|t| t.is_symbol(symbol)) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_reserved(&mut self, word: &str) -> bool {
        if self.current().is_some_and(|t| t.is_reserved(word)) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the operator token if its kind/lexeme match.
    pub(crate) fn eat_op(&mut self, kind: TokenKind, lexeme: &str) -> Option<Token> {
        if self
            .current()
            .is_some_and(|t| t.kind == kind && t.lexeme == lexeme)
        {
            self.advance_token()
        } else {
            None
        }
    }

    /// Consume `symbol` or report `expected 'symbol', got '...'`.
    pub(crate) fn expect_symbol(&mut self, symbol: &str) -> bool {
        if self.eat_symbol(symbol) {
            true
        } else {
            self.expected(symbol);
            false
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        if self.current().map(|t| t.kind) == Some(TokenKind::Identifier) {
            let token = self.advance_token()?;
            Some(Ident {
                name: token.lexeme,
                span: token.span,
            })
        } else {
            None
        }
    }

    /// `expected 'X', got 'Y'` at the current token.
    pub(crate) fn expected(&mut self, what: &str) {
        match self.current() {
            Some(token) => {
                let message = format!("expected '{}', got '{}'", what, token.lexeme);
                let span = token.span;
                self.handler.error(span, message);
            }
            None => {
                let span = self.last_span();
                self.handler
                    .error(span, format!("expected '{}', but reached end of file", what));
            }
        }
    }

    /// Report `message` at the current token (or end of file).
    pub(crate) fn error_here(&mut self, message: impl Into<String>) {
        let span = self
            .current()
            .map(|t| t.span)
            .unwrap_or_else(|| self.last_span());
        self.handler.error(span, message.into());
    }

    pub(crate) fn warn_here(&mut self, span: Span, message: impl Into<String>) {
        self.handler.warning(span, message.into());
    }

    fn last_span(&self) -> Span {
        self.tokens.last().map(|t| t.span).unwrap_or(Span::DUMMY)
    }

    /// Skip tokens until one whose lexeme is in `set` (or end of input).
    pub(crate) fn skip_until(&mut self, set: &[&str]) {
        while let Some(token) = self.current() {
            if set.contains(&token.lexeme.as_str()) {
                return;
            }
            self.advance();
        }
    }

    /// Panic-mode recovery after a failed statement: advance to a
    /// statement boundary and consume a trailing `;`. A `}` is left in
    /// place for the enclosing block.
    pub(crate) fn recover_statement(&mut self) {
        self.skip_until(STMT_SYNC);
        self.eat_symbol(";");
    }
}
