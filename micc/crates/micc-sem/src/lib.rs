//! micc-sem - Semantic analysis for Minic
//!
//! ============================================================================
//! WHAT THE WALK DOES
//! ============================================================================
//!
//! A single pre-order pass over the AST that performs, per node:
//!
//! 1. NAME RESOLUTION — declarations populate the bucketed symbol
//!    table; every identifier use either resolves or produces an
//!    `undeclared` error. The language has one global scope.
//!
//! 2. TYPE CHECKING — expression types are inferred bottom-up
//!    (`int`/`float`/`bool`); assignments accept identical types or
//!    `float := int`; `++`/`--` require numeric variables; `!` requires
//!    `bool`; conditions that are not `bool` are warnings, not errors.
//!
//! 3. CONSTANT FOLDING — an expression whose operands are all literals
//!    is evaluated at compile time. `int op int` truncates even when
//!    the raw result is fractional; real results round to two decimals;
//!    `&&`/`||` fold by truthiness. A successful fold replaces the
//!    temporary entirely, so every temporary that reaches the TAC is
//!    read at least once.
//!
//! 4. TAC EMISSION — three-address instructions are emitted as a side
//!    effect of the walk, using the mixed operand channel
//!    (`Literal | Temp | Var`) so folded values flow straight into
//!    later instructions.
//!
//! 5. BOOKKEEPING — every occurrence appends to the symbol's use-line
//!    list, `cin >>` marks variables initialised with `<input>`, and a
//!    final pass warns about declared-but-never-used variables.
//!
//! The walk never aborts: each check reports into the shared handler
//! and analysis continues on a best-effort basis.

mod analyzer;
mod symbols;

pub use analyzer::{analyse, Analysis, NodeAnnotation};
pub use symbols::{ReportRow, Symbol, SymbolTable, SymbolValue, DEFAULT_BUCKETS};
