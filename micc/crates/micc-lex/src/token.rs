//! Token definitions.

use std::fmt;

use micc_util::Span;

/// Classification of a lexeme.
///
/// The set is closed; `MultilineComment`, `LineComment`, and
/// `Whitespace` exist for completeness but never appear in the stream
/// handed to the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `/* ... */`
    MultilineComment,
    /// `// ...`
    LineComment,
    /// Reserved word (`main`, `if`, `int`, `cout`, ...).
    Reserved,
    /// `++ -- + - * / % ^`
    ArithOp,
    /// `<< >> <= >= == != < >`
    RelOp,
    /// `&& || ! &`
    LogOp,
    /// `=`
    Assign,
    /// `( ) { } . , ; :`
    Symbol,
    /// `digits.digits`
    RealLiteral,
    /// `digits`
    IntLiteral,
    /// `"..."` (lexeme keeps the quotes)
    StringLiteral,
    /// `[A-Za-z_][A-Za-z0-9_]*`
    Identifier,
    /// Spaces, tabs, newlines.
    Whitespace,
    /// Anything the rules above reject.
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::MultilineComment => "MULTILINE_COMMENT",
            TokenKind::LineComment => "LINE_COMMENT",
            TokenKind::Reserved => "RESERVED",
            TokenKind::ArithOp => "ARITH_OP",
            TokenKind::RelOp => "REL_OP",
            TokenKind::LogOp => "LOG_OP",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Symbol => "SYMBOL",
            TokenKind::RealLiteral => "REAL_LITERAL",
            TokenKind::IntLiteral => "INT_LITERAL",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// A classified lexeme with its source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// Classification.
    pub kind: TokenKind,
    /// The matched text. For the split `++`/`--` form this is the
    /// synthesised two-character operator, not a contiguous slice.
    pub lexeme: String,
    /// Where the token starts.
    pub span: Span,
}

impl Token {
    /// Build a token.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    /// Line where the token starts (1-based).
    pub fn line(&self) -> u32 {
        self.span.line
    }

    /// Column where the token starts (1-based).
    pub fn column(&self) -> u32 {
        self.span.column
    }

    /// True when the token is this exact symbol (`;`, `{`, ...).
    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.lexeme == symbol
    }

    /// True when the token is this exact reserved word.
    pub fn is_reserved(&self, word: &str) -> bool {
        self.kind == TokenKind::Reserved && self.lexeme == word
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] '{}' (Line {}, Column {})",
            self.kind,
            self.lexeme,
            self.line(),
            self.column()
        )
    }
}
