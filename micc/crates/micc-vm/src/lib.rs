//! micc-vm - The P-code virtual machine
//!
//! A stack machine with a flat cell memory (1000 cells by default,
//! configurable), an operand stack, and one input/output pair. Loading
//! strips comments and blank lines and hoists `lab` definitions into a
//! label table; jumps stay symbolic until then, so no offsets are ever
//! patched into instructions.
//!
//! Failure semantics are deliberately forgiving where the language's
//! programs can recover and strict where they cannot:
//!
//! - division or modulo by zero: records a diagnostic, pushes `0`,
//!   execution continues;
//! - malformed input for `rd`: diagnostic, pushes `0`;
//! - unknown mnemonic in textual P-code: diagnostic at load time, the
//!   line is skipped;
//! - stack underflow, undefined labels, out-of-range memory: hard
//!   [`RuntimeError`]s.
//!
//! Arithmetic follows the front end's folding rules so that folded and
//! unfolded programs print the same thing: `int op int` stays integral
//! (division truncates), anything touching a real is real. `wr` prints
//! without a trailing newline, collapses whole reals to integer form,
//! and interprets `\n`/`\t` escapes in strings.

mod loader;
mod vm;

pub use loader::parse_text;
pub use vm::{Vm, RuntimeError, DEFAULT_MEMORY_CELLS};
