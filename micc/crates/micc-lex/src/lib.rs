//! micc-lex - Lexical analyser for Minic
//!
//! ============================================================================
//! SCANNING MODEL
//! ============================================================================
//!
//! The scanner makes a single pass over the source text with one cursor
//! and at most one character of committed lookahead. At each position it
//! tries a fixed rule order (first match wins, longest match within a
//! rule):
//!
//! 1. `/* ... */` block comment          discarded
//! 2. `// ...` line comment              discarded
//! 3. reserved word                      `if else end do while ... true false`
//! 4. arithmetic operator                `++ -- + - * / % ^`
//! 5. relational operator                `<< >> <= >= == != < >`
//! 6. logical operator                   `&& || ! &`
//! 7. assignment                         `=` (only when not `==`)
//! 8. symbol                             `( ) { } . , ; :`
//! 9. real literal                       `digits.digits`
//! 10. integer literal                   `digits`
//! 11. identifier                        `[A-Za-z_][A-Za-z0-9_]*`
//! 12. whitespace                        skipped
//! 13. anything else                     UNKNOWN + diagnostic
//!
//! Numbers are unsigned in the source; a leading `+`/`-` is always an
//! arithmetic operator resolved at the expression level.
//!
//! Two places deviate from plain longest-match:
//!
//! - `+` (or `-`) separated from a second `+` (or `-`) by nothing but
//!   spaces, tabs, and newlines still forms one `++`/`--` token. The
//!   sources this language grew up with put the postfix operator on the
//!   next line. Any other character in the gap (a `;` in particular)
//!   aborts the merge and a single operator is emitted.
//! - After a numeric literal the scanner looks one character ahead to
//!   diagnose `12.` (digit expected after the point), `1.5x`
//!   (unexpected letter), and `1.5.` (stray second point). The literal
//!   token is kept in all three cases.
//!
//! Scanning never aborts: every problem becomes a diagnostic and the
//! cursor moves on. Comments and whitespace advance the position
//! bookkeeping but never reach the parser.

mod cursor;
mod scanner;
mod token;

pub use cursor::{Cursor, CursorSnapshot};
pub use scanner::Scanner;
pub use token::{Token, TokenKind};

use micc_util::Handler;

/// Tokenize `source`, reporting lexical problems into `handler`.
///
/// The returned stream contains only significant tokens; comments and
/// whitespace are consumed for position tracking and dropped.
pub fn scan(source: &str, handler: &Handler) -> Vec<Token> {
    Scanner::new(source, handler).collect()
}
