//! Character cursor over the source text.
//!
//! Keeps the byte position together with 1-based line/column tracking
//! so every token can report where it starts. Columns count characters,
//! not bytes.

/// A cursor walking the source one character at a time.
pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// The character under the cursor, or `'\0'` at end of input.
    pub fn current_char(&self) -> char {
        self.peek_char(0)
    }

    /// The character `offset` characters ahead, or `'\0'` past the end.
    pub fn peek_char(&self, offset: usize) -> char {
        self.source[self.position..]
            .chars()
            .nth(offset)
            .unwrap_or('\0')
    }

    /// Advance one character, updating line/column bookkeeping.
    pub fn advance(&mut self) {
        if let Some(c) = self.source[self.position..].chars().next() {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Advance while `pred` holds for the current character.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while !self.is_at_end() && pred(self.current_char()) {
            self.advance();
        }
    }

    /// True once the whole source has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current line (1-based).
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current column (1-based).
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Source slice from `start` to the current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }

    /// Capture the cursor state for later [`restore`](Self::restore).
    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    /// Rewind to a previously captured state.
    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.position = snapshot.position;
        self.line = snapshot.line;
        self.column = snapshot.column;
    }
}

/// Saved cursor state.
#[derive(Clone, Copy, Debug)]
pub struct CursorSnapshot {
    position: usize,
    line: u32,
    column: u32,
}
