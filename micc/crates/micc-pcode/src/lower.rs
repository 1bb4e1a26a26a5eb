//! TAC to P-code translation.

use indexmap::IndexMap;
use micc_par::BinOp;
use micc_tac::{Operand, TacInstr, Temp};
use micc_util::Value;
use rustc_hash::FxHashSet;

use crate::instr::PInstr;

/// Lower TAC to P-code with the unstored-condition peephole applied.
pub fn lower(tac: &[TacInstr]) -> Vec<PInstr> {
    Lowerer::new(branch_only_temps(tac)).run(tac)
}

/// Reference lowering with the peephole disabled; every temporary is
/// stored and reloaded. Used to cross-check the optimised output.
pub fn lower_unoptimized(tac: &[TacInstr]) -> Vec<PInstr> {
    Lowerer::new(FxHashSet::default()).run(tac)
}

/// Temporaries consumed only as the condition of the branch that
/// immediately follows their definition. For these, the store/load
/// round trip through memory is unnecessary.
fn branch_only_temps(tac: &[TacInstr]) -> FxHashSet<u32> {
    let mut read_elsewhere: FxHashSet<u32> = FxHashSet::default();
    let mut note = |operand: &Operand| {
        if let Operand::Temp(t) = operand {
            read_elsewhere.insert(t.0);
        }
    };
    for instr in tac {
        match instr {
            TacInstr::Binary { lhs, rhs, .. } => {
                note(lhs);
                note(rhs);
            }
            TacInstr::Not { operand, .. } => note(operand),
            TacInstr::Copy { src, .. } => note(src),
            TacInstr::Write { value } => note(value),
            _ => {}
        }
    }

    let mut elided = FxHashSet::default();
    for pair in tac.windows(2) {
        let dest = match &pair[0] {
            TacInstr::Binary { dest, .. } | TacInstr::Not { dest, .. } => *dest,
            _ => continue,
        };
        let cond = match &pair[1] {
            TacInstr::IfFalse { cond, .. } | TacInstr::IfTrue { cond, .. } => cond,
            _ => continue,
        };
        if cond.as_temp() == Some(dest) && !read_elsewhere.contains(&dest.0) {
            elided.insert(dest.0);
        }
    }
    elided
}

struct Lowerer {
    addrs: IndexMap<String, usize>,
    elided: FxHashSet<u32>,
    out: Vec<PInstr>,
}

impl Lowerer {
    fn new(elided: FxHashSet<u32>) -> Self {
        Self {
            addrs: IndexMap::new(),
            elided,
            out: Vec::new(),
        }
    }

    fn run(mut self, tac: &[TacInstr]) -> Vec<PInstr> {
        for instr in tac {
            self.lower_instr(instr);
        }
        self.out.push(PInstr::Hlt);
        self.out
    }

    fn lower_instr(&mut self, instr: &TacInstr) {
        match instr {
            TacInstr::Comment(text) => self.out.push(PInstr::Comment(text.clone())),
            TacInstr::Declare { name, .. } => {
                // Reserve the cell; declarations cost nothing at run time.
                self.addr_of(name);
            }
            TacInstr::Read { name } => {
                let addr = self.addr_of(name);
                self.out.push(PInstr::Rd);
                self.out.push(PInstr::Sto(addr));
            }
            TacInstr::Write { value } => {
                self.load(value);
                self.out.push(PInstr::Wr);
            }
            TacInstr::Copy { dest, src } => {
                self.load(src);
                let addr = self.addr_of(dest);
                self.out.push(PInstr::Sto(addr));
            }
            TacInstr::Binary { dest, lhs, op, rhs } => {
                self.load(lhs);
                self.load(rhs);
                self.emit_op(*op);
                self.store_temp(*dest);
            }
            TacInstr::Not { dest, operand } => {
                self.load(operand);
                self.out.push(PInstr::Ldc(Value::Int(0)));
                self.out.push(PInstr::Equ);
                self.store_temp(*dest);
            }
            TacInstr::IfFalse { cond, target } => {
                self.load_condition(cond);
                self.out.push(PInstr::Fjp(*target));
            }
            TacInstr::IfTrue { cond, target } => {
                // Branch when the condition holds: compare with zero and
                // jump on the inverted result.
                self.load_condition(cond);
                self.out.push(PInstr::Ldc(Value::Int(0)));
                self.out.push(PInstr::Equ);
                self.out.push(PInstr::Fjp(*target));
            }
            TacInstr::Goto { target } => self.out.push(PInstr::Ujp(*target)),
            TacInstr::Label(label) => self.out.push(PInstr::Lab(*label)),
        }
    }

    /// Push an operand onto the stack.
    fn load(&mut self, operand: &Operand) {
        match operand {
            // Booleans live as 1/0 in the machine.
            Operand::Literal(Value::Bool(b)) => {
                self.out.push(PInstr::Ldc(Value::Int(i64::from(*b))))
            }
            Operand::Literal(value) => self.out.push(PInstr::Ldc(value.clone())),
            Operand::Temp(temp) => {
                let addr = self.addr_of(&temp.to_string());
                self.out.push(PInstr::Lod(addr));
            }
            Operand::Var(name) => {
                let addr = self.addr_of(name);
                self.out.push(PInstr::Lod(addr));
            }
        }
    }

    /// Push a branch condition, unless the peephole left it on the
    /// stack already.
    fn load_condition(&mut self, cond: &Operand) {
        if let Operand::Temp(t) = cond {
            if self.elided.contains(&t.0) {
                return;
            }
        }
        self.load(cond);
    }

    fn store_temp(&mut self, dest: Temp) {
        if self.elided.contains(&dest.0) {
            return;
        }
        let addr = self.addr_of(&dest.to_string());
        self.out.push(PInstr::Sto(addr));
    }

    fn emit_op(&mut self, op: BinOp) {
        let instr = match op {
            BinOp::Add => PInstr::Adi,
            BinOp::Sub => PInstr::Sbi,
            BinOp::Mul => PInstr::Mpi,
            BinOp::Div => PInstr::Dvi,
            BinOp::Mod => PInstr::Mod,
            BinOp::Pow => PInstr::Pot,
            BinOp::Lt => PInstr::Les,
            BinOp::Le => PInstr::Leq,
            BinOp::Gt => PInstr::Grt,
            BinOp::Ge => PInstr::Geq,
            BinOp::Eq => PInstr::Equ,
            BinOp::And => PInstr::And,
            BinOp::Or => PInstr::Or,
            // No native neq in the generated code: equal, then compare
            // the 0/1 result with zero.
            BinOp::Ne => {
                self.out.push(PInstr::Equ);
                self.out.push(PInstr::Ldc(Value::Int(0)));
                self.out.push(PInstr::Equ);
                return;
            }
        };
        self.out.push(instr);
    }

    /// Memory cell for a name, allocating the next free one on first
    /// reference.
    fn addr_of(&mut self, name: &str) -> usize {
        let next = self.addrs.len();
        *self.addrs.entry(name.to_string()).or_insert(next)
    }
}
