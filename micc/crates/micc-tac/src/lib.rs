//! micc-tac - Three-address intermediate representation
//!
//! Each instruction has at most three operands; temporaries `t0, t1, …`
//! and labels `L0, L1, …` are allocated by a [`TacBuilder`] during the
//! semantic walk. The textual form (one instruction per line) is the
//! exchange format the lowerer consumes and the driver prints:
//!
//! ```text
//! # begin program
//! DECLARE x int
//! x = 7
//! t0 = x % 2
//! if not t0 goto L0
//! goto L1
//! L0:
//! WRITE x
//! L1:
//! READ x
//! ```
//!
//! Expression results travel as an [`Operand`]: a compile-time
//! [`Value`], a temporary, or a variable name. Callers pattern-match to
//! decide whether anything needs to be loaded at run time.

use std::fmt;

use micc_par::{BinOp, TypeName};
use micc_util::Value;

/// A temporary, rendered `t0, t1, …`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Temp(pub u32);

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A jump target, rendered `L0, L1, …`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// The value channel of an expression: either known at compile time or
/// a run-time location.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A folded compile-time value.
    Literal(Value),
    /// A temporary produced by an earlier instruction.
    Temp(Temp),
    /// A named variable.
    Var(String),
}

impl Operand {
    /// The temporary inside, if this operand is one.
    pub fn as_temp(&self) -> Option<Temp> {
        match self {
            Operand::Temp(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Temp(temp) => write!(f, "{}", temp),
            Operand::Var(name) => write!(f, "{}", name),
        }
    }
}

/// One three-address instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum TacInstr {
    /// `# text`
    Comment(String),
    /// `DECLARE name type`
    Declare { name: String, ty: TypeName },
    /// `READ name`
    Read { name: String },
    /// `WRITE operand`
    Write { value: Operand },
    /// `name = operand`
    Copy { dest: String, src: Operand },
    /// `tN = lhs op rhs` (unary minus is `tN = 0 - x`)
    Binary {
        dest: Temp,
        lhs: Operand,
        op: BinOp,
        rhs: Operand,
    },
    /// `tN = ! operand`
    Not { dest: Temp, operand: Operand },
    /// `if not cond goto L`
    IfFalse { cond: Operand, target: Label },
    /// `if cond goto L`
    IfTrue { cond: Operand, target: Label },
    /// `goto L`
    Goto { target: Label },
    /// `L:`
    Label(Label),
}

impl fmt::Display for TacInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TacInstr::Comment(text) => write!(f, "# {}", text),
            TacInstr::Declare { name, ty } => write!(f, "DECLARE {} {}", name, ty),
            TacInstr::Read { name } => write!(f, "READ {}", name),
            TacInstr::Write { value } => write!(f, "WRITE {}", value),
            TacInstr::Copy { dest, src } => write!(f, "{} = {}", dest, src),
            TacInstr::Binary { dest, lhs, op, rhs } => {
                write!(f, "{} = {} {} {}", dest, lhs, op, rhs)
            }
            TacInstr::Not { dest, operand } => write!(f, "{} = ! {}", dest, operand),
            TacInstr::IfFalse { cond, target } => write!(f, "if not {} goto {}", cond, target),
            TacInstr::IfTrue { cond, target } => write!(f, "if {} goto {}", cond, target),
            TacInstr::Goto { target } => write!(f, "goto {}", target),
            TacInstr::Label(label) => write!(f, "{}:", label),
        }
    }
}

/// Render a TAC sequence one instruction per line.
pub fn listing(instrs: &[TacInstr]) -> String {
    let mut out = String::new();
    for instr in instrs {
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}

/// Allocator and sink for TAC emission.
#[derive(Default)]
pub struct TacBuilder {
    instrs: Vec<TacInstr>,
    next_temp: u32,
    next_label: u32,
}

impl TacBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh temporary.
    pub fn new_temp(&mut self) -> Temp {
        let temp = Temp(self.next_temp);
        self.next_temp += 1;
        temp
    }

    /// Allocate a fresh label.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Append an instruction.
    pub fn emit(&mut self, instr: TacInstr) {
        self.instrs.push(instr);
    }

    /// Instructions emitted so far.
    pub fn instrs(&self) -> &[TacInstr] {
        &self.instrs
    }

    /// Consume the builder, yielding the instruction sequence.
    pub fn finish(self) -> Vec<TacInstr> {
        self.instrs
    }
}
