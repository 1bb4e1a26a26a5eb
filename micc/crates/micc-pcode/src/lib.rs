//! micc-pcode - Stack-machine code and the TAC lowerer
//!
//! ============================================================================
//! TARGET SHAPE
//! ============================================================================
//!
//! P-code is a small stack-machine instruction set: operands are pushed
//! with `ldc` (constant) and `lod` (memory cell), consumed by
//! arithmetic/relational/logical mnemonics that push their result, and
//! stored with `sto`. Control flow uses symbolic labels (`lab L`)
//! resolved by the virtual machine at load time; `ujp` jumps always,
//! `fjp` jumps when the popped value is false.
//!
//! Lowering walks the TAC once:
//!
//! - `DECLARE` reserves the next free memory cell for the name; no
//!   instruction is emitted. Temporaries get cells the same way on
//!   first reference.
//! - `x = a op b` loads both operands, applies the mnemonic, stores.
//!   `!=` is materialised as `equ; ldc 0; equ` to keep the machine's
//!   required surface minimal (a native `neq` is still accepted).
//! - `x = ! a` loads the operand and compares it with zero.
//! - `if not c goto L` loads `c` and emits `fjp L`; `if c goto L`
//!   (the do-while back edge) loads `c`, compares with zero, and `fjp`s
//!   on the inverted result.
//! - Boolean literals load as `ldc 1` / `ldc 0`.
//!
//! UNSTORED-CONDITION PEEPHOLE: a prescan of the whole TAC finds
//! temporaries that are (a) defined right before a branch that tests
//! them and (b) never read anywhere else. For those the `sto`/`lod`
//! pair is elided and the branch consumes the condition straight from
//! the stack. This is the only optimisation in the back end; the
//! reference lowering without it is kept available for differential
//! testing.

mod instr;
mod lower;

pub use instr::{listing, PInstr};
pub use lower::{lower, lower_unoptimized};
