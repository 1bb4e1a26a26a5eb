//! Diagnostic reporting infrastructure.
//!
//! Every compilation phase reports problems into a shared [`Handler`]
//! and continues on a best-effort basis; no phase aborts the pipeline.
//! The handler keeps errors and warnings on separate channels so the
//! driver can decide the exit code from errors alone while still
//! printing both.
//!
//! # Examples
//!
//! ```
//! use micc_util::{Handler, Span};
//!
//! let handler = Handler::new();
//! handler.error(Span::point(3, 7), "unexpected character '@'");
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::Span;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// A problem that makes the compilation fail.
    Error,
    /// A problem worth reporting that does not fail the compilation.
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A single diagnostic message with severity and source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Severity level.
    pub level: Level,
    /// Human-readable message.
    pub message: String,
    /// Where in the source the problem was detected.
    pub span: Span,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            span,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.line == 0 {
            write!(f, "{}: {}", self.level, self.message)
        } else {
            write!(
                f,
                "{} (line {}, column {}): {}",
                self.level, self.span.line, self.span.column, self.message
            )
        }
    }
}

/// Collector for diagnostics, threaded by shared reference through all
/// compilation phases.
///
/// Interior mutability lets deeply nested visitors report without the
/// pipeline threading `&mut` through every call site.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an error at a source position.
    pub fn error(&self, span: Span, message: impl Into<String>) {
        self.emit(Diagnostic::error(span, message));
    }

    /// Report a warning at a source position.
    pub fn warning(&self, span: Span, message: impl Into<String>) {
        self.emit(Diagnostic::warning(span, message));
    }

    /// Record a pre-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// True when at least one error has been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of reported errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Number of reported warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// All errors, ordered by source position.
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.sorted_level(Level::Error)
    }

    /// All warnings, ordered by source position.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.sorted_level(Level::Warning)
    }

    /// Every diagnostic in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drop all recorded diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }

    fn sorted_level(&self, level: Level) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = self
            .diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == level)
            .cloned()
            .collect();
        // Stable sort: diagnostics at the same position keep emission order.
        out.sort_by_key(|d| (d.span.line, d.span.column));
        out
    }
}
