//! The scanner itself.

use micc_util::{Handler, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Words the language reserves; they never scan as identifiers.
const RESERVED: &[&str] = &[
    "if", "else", "end", "do", "while", "switch", "case", "int", "float", "bool", "main", "cin",
    "cout", "then", "repeat", "read", "write", "until", "true", "false",
];

/// Streaming tokenizer over a source text.
///
/// Trivia (whitespace and comments) is consumed between tokens, so each
/// call to [`next_token`](Self::next_token) yields a significant token
/// or `None` at end of input.
pub struct Scanner<'a> {
    cursor: Cursor<'a>,
    handler: &'a Handler,
}

impl<'a> Scanner<'a> {
    /// Create a scanner reporting into `handler`.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
        }
    }

    /// Produce the next significant token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            if self.cursor.is_at_end() {
                return None;
            }
            let c = self.cursor.current_char();
            if c.is_whitespace() {
                self.cursor.eat_while(|c| c.is_whitespace());
                continue;
            }
            if c == '/' && self.cursor.peek_char(1) == '*' {
                self.skip_block_comment();
                continue;
            }
            if c == '/' && self.cursor.peek_char(1) == '/' {
                self.cursor.eat_while(|c| c != '\n');
                continue;
            }
            return Some(self.scan_token());
        }
    }

    fn scan_token(&mut self) -> Token {
        let start = self.mark();
        let c = self.cursor.current_char();

        match c {
            '+' | '-' => self.scan_plus_minus(c, start),
            '*' | '/' | '%' | '^' => self.single(TokenKind::ArithOp, start),
            '<' => self.scan_angle('<', start),
            '>' => self.scan_angle('>', start),
            '=' => {
                if self.cursor.peek_char(1) == '=' {
                    self.double(TokenKind::RelOp, start)
                } else {
                    self.single(TokenKind::Assign, start)
                }
            }
            '!' => {
                if self.cursor.peek_char(1) == '=' {
                    self.double(TokenKind::RelOp, start)
                } else {
                    self.single(TokenKind::LogOp, start)
                }
            }
            '&' => {
                if self.cursor.peek_char(1) == '&' {
                    self.double(TokenKind::LogOp, start)
                } else {
                    self.single(TokenKind::LogOp, start)
                }
            }
            '|' => {
                if self.cursor.peek_char(1) == '|' {
                    self.double(TokenKind::LogOp, start)
                } else {
                    // A lone '|' is not an operator in this language.
                    self.handler
                        .error(start.span_for(1), "invalid character '|'");
                    self.single(TokenKind::Unknown, start)
                }
            }
            '(' | ')' | '{' | '}' | '.' | ',' | ';' | ':' => self.single(TokenKind::Symbol, start),
            '"' => self.scan_string(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(start),
            c => {
                self.handler
                    .error(start.span_for(c.len_utf8()), format!("invalid character '{}'", c));
                self.single(TokenKind::Unknown, start)
            }
        }
    }

    /// `+`/`-`, merging a whitespace-separated second operator into one
    /// `++`/`--` token. Any non-whitespace character in the gap aborts
    /// the merge.
    fn scan_plus_minus(&mut self, symbol: char, start: Mark) -> Token {
        self.cursor.advance();
        let saved = self.cursor.snapshot();
        self.cursor
            .eat_while(|c| c == ' ' || c == '\t' || c == '\r' || c == '\n');
        if !self.cursor.is_at_end() && self.cursor.current_char() == symbol {
            self.cursor.advance();
            let lexeme: String = [symbol, symbol].iter().collect();
            return Token::new(TokenKind::ArithOp, lexeme, start.span(&self.cursor));
        }
        self.cursor.restore(saved);
        Token::new(TokenKind::ArithOp, symbol.to_string(), start.span(&self.cursor))
    }

    /// `<`/`>` and their two-character forms, longest match first.
    fn scan_angle(&mut self, symbol: char, start: Mark) -> Token {
        let next = self.cursor.peek_char(1);
        if next == symbol || next == '=' {
            self.double(TokenKind::RelOp, start)
        } else {
            self.single(TokenKind::RelOp, start)
        }
    }

    fn scan_string(&mut self, start: Mark) -> Token {
        self.cursor.advance(); // opening quote
        self.cursor.eat_while(|c| c != '"' && c != '\n');
        if self.cursor.is_at_end() || self.cursor.current_char() != '"' {
            self.handler
                .error(start.span_for(1), "unterminated string literal");
            return self.finish(TokenKind::Unknown, start);
        }
        self.cursor.advance(); // closing quote
        self.finish(TokenKind::StringLiteral, start)
    }

    /// Integer and real literals, plus the one-character lookahead that
    /// diagnoses malformed numbers. The literal token survives every
    /// error case.
    fn scan_number(&mut self, start: Mark) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.current_char() != '.' {
            return self.finish(TokenKind::IntLiteral, start);
        }

        if !self.cursor.peek_char(1).is_ascii_digit() {
            // `12.` — keep the integer, flag the point, consume it.
            let token = self.finish(TokenKind::IntLiteral, start);
            self.handler
                .error(self.here(1), "expected a digit after '.'");
            self.cursor.advance();
            return token;
        }

        self.cursor.advance(); // '.'
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let token = self.finish(TokenKind::RealLiteral, start);

        let next = self.cursor.current_char();
        if next.is_ascii_alphabetic() {
            self.handler.error(
                self.here(next.len_utf8()),
                format!("unexpected character '{}' after real number", next),
            );
            self.cursor.advance();
        } else if next == '.' {
            self.handler
                .error(self.here(1), "invalid character '.' after real number");
            self.cursor.advance();
        }
        token
    }

    fn scan_identifier(&mut self, start: Mark) -> Token {
        self.cursor
            .eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let lexeme = self.cursor.slice_from(start.position);
        let kind = if RESERVED.contains(&lexeme) {
            TokenKind::Reserved
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, lexeme, start.span(&self.cursor))
    }

    fn skip_block_comment(&mut self) {
        let start = self.mark();
        self.cursor.advance(); // '/'
        self.cursor.advance(); // '*'
        loop {
            if self.cursor.is_at_end() {
                self.handler
                    .error(start.span_for(2), "unterminated block comment");
                return;
            }
            if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                self.cursor.advance();
                self.cursor.advance();
                return;
            }
            self.cursor.advance();
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            position: self.cursor.position(),
            line: self.cursor.line(),
            column: self.cursor.column(),
        }
    }

    /// Span for a character at the current cursor position.
    fn here(&self, len: usize) -> Span {
        Span::new(
            self.cursor.position(),
            self.cursor.position() + len,
            self.cursor.line(),
            self.cursor.column(),
        )
    }

    fn single(&mut self, kind: TokenKind, start: Mark) -> Token {
        self.cursor.advance();
        self.finish(kind, start)
    }

    fn double(&mut self, kind: TokenKind, start: Mark) -> Token {
        self.cursor.advance();
        self.cursor.advance();
        self.finish(kind, start)
    }

    fn finish(&self, kind: TokenKind, start: Mark) -> Token {
        Token::new(
            kind,
            self.cursor.slice_from(start.position),
            start.span(&self.cursor),
        )
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Start position of the token being scanned.
#[derive(Clone, Copy)]
struct Mark {
    position: usize,
    line: u32,
    column: u32,
}

impl Mark {
    fn span(&self, cursor: &Cursor<'_>) -> Span {
        Span::new(self.position, cursor.position(), self.line, self.column)
    }

    fn span_for(&self, len: usize) -> Span {
        Span::new(self.position, self.position + len, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(source: &str) -> (Vec<Token>, Handler) {
        let handler = Handler::new();
        let tokens = {
            let scanner = Scanner::new(source, &handler);
            scanner.collect()
        };
        (tokens, handler)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn lexemes(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.lexeme.as_str()).collect()
    }

    #[test]
    fn test_reserved_vs_identifier() {
        let (tokens, handler) = tokens_of("main whilex while iffy if");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Reserved,
                TokenKind::Identifier,
                TokenKind::Reserved,
                TokenKind::Identifier,
                TokenKind::Reserved,
            ]
        );
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_operator_longest_match() {
        let (tokens, _) = tokens_of("<< <= < == = != ! && & >> >= >");
        assert_eq!(
            lexemes(&tokens),
            vec!["<<", "<=", "<", "==", "=", "!=", "!", "&&", "&", ">>", ">=", ">"]
        );
        assert_eq!(tokens[4].kind, TokenKind::Assign);
        assert_eq!(tokens[6].kind, TokenKind::LogOp);
    }

    #[test]
    fn test_split_increment_merges() {
        let (tokens, handler) = tokens_of("x +\n+ ;");
        assert_eq!(lexemes(&tokens), vec!["x", "++", ";"]);
        assert_eq!(tokens[1].kind, TokenKind::ArithOp);
        // The merged token is anchored at the first '+'.
        assert_eq!((tokens[1].line(), tokens[1].column()), (1, 3));
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_split_increment_aborted_by_semicolon() {
        let (tokens, _) = tokens_of("x + ; +");
        assert_eq!(lexemes(&tokens), vec!["x", "+", ";", "+"]);
    }

    #[test]
    fn test_split_decrement() {
        let (tokens, _) = tokens_of("y --");
        assert_eq!(lexemes(&tokens), vec!["y", "--"]);
    }

    #[test]
    fn test_mixed_plus_minus_do_not_merge() {
        let (tokens, _) = tokens_of("+ -");
        assert_eq!(lexemes(&tokens), vec!["+", "-"]);
    }

    #[test]
    fn test_numbers() {
        let (tokens, handler) = tokens_of("42 3.14 0.5");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::IntLiteral,
                TokenKind::RealLiteral,
                TokenKind::RealLiteral,
            ]
        );
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_int_then_bare_dot() {
        let (tokens, handler) = tokens_of("12. x");
        assert_eq!(lexemes(&tokens), vec!["12", "x"]);
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(handler.error_count(), 1);
        assert!(handler.errors()[0].message.contains("digit after '.'"));
    }

    #[test]
    fn test_real_then_letter() {
        let (tokens, handler) = tokens_of("1.5x");
        assert_eq!(lexemes(&tokens), vec!["1.5"]);
        assert_eq!(handler.error_count(), 1);
        assert!(handler.errors()[0].message.contains("after real number"));
    }

    #[test]
    fn test_real_then_extra_dot() {
        let (tokens, handler) = tokens_of("1.5.");
        assert_eq!(lexemes(&tokens), vec!["1.5"]);
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_string_literal_keeps_quotes() {
        let (tokens, handler) = tokens_of("cout << \"hola\\n\";");
        assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[2].lexeme, "\"hola\\n\"");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_unterminated_string() {
        let (_, handler) = tokens_of("\"abc");
        assert_eq!(handler.error_count(), 1);
        assert!(handler.errors()[0].message.contains("unterminated string"));
    }

    #[test]
    fn test_unknown_character() {
        let (tokens, handler) = tokens_of("x @ y");
        assert_eq!(kinds(&tokens)[1], TokenKind::Unknown);
        assert_eq!(handler.error_count(), 1);
        assert!(handler.errors()[0].message.contains("invalid character '@'"));
    }

    #[test]
    fn test_single_pipe_rejected() {
        let (tokens, handler) = tokens_of("a | b");
        assert_eq!(kinds(&tokens)[1], TokenKind::Unknown);
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (tokens, handler) = tokens_of("x /* never closed");
        assert_eq!(lexemes(&tokens), vec!["x"]);
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_positions_across_lines() {
        let (tokens, _) = tokens_of("int x;\nx = 1;");
        let x_assign = &tokens[3];
        assert_eq!(x_assign.lexeme, "x");
        assert_eq!((x_assign.line(), x_assign.column()), (2, 1));
    }

    #[test]
    fn test_lexemes_match_source_slices() {
        let source = "main { int abc; abc = 4 + 2.5; }";
        let (tokens, _) = tokens_of(source);
        for token in &tokens {
            assert_eq!(
                &source[token.span.start..token.span.end],
                token.lexeme,
                "lexeme must be the literal source slice"
            );
        }
    }
}
