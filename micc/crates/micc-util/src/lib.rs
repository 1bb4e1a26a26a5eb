//! micc-util - Shared infrastructure for the Minic compiler
//!
//! This crate holds the leaf types every phase depends on:
//!
//! - [`Span`]: source locations (byte range plus 1-based line/column).
//! - [`Diagnostic`], [`Handler`], [`Level`]: the diagnostics sink that is
//!   threaded by reference through the whole pipeline. Phases never
//!   return error lists themselves; they report into the handler and
//!   keep going, so a single compile surfaces as many problems as
//!   possible. Errors and warnings travel on separate channels.
//! - [`Value`]: the literal value domain (`int`, `float`, `bool`, plus
//!   strings inside output statements). The semantic analyser folds
//!   constants into `Value`s, the lowerer serialises them into `ldc`
//!   operands, and the virtual machine computes with them.
//!
//! Nothing in here knows about tokens, AST nodes, or instructions.

mod diagnostic;
mod span;
mod value;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use span::Span;
pub use value::{floor_mod_int, floor_mod_real, ParseValueError, Value};
