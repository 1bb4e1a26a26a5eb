//! The interpreter.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use micc_pcode::PInstr;
use micc_util::{floor_mod_int, floor_mod_real, Value};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Default size of the flat memory.
pub const DEFAULT_MEMORY_CELLS: usize = 1000;

/// Unrecoverable execution failures.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A binary operation found fewer than two stack entries, or a pop
    /// found none.
    #[error("stack underflow at instruction {pc} ('{mnemonic}')")]
    StackUnderflow { pc: usize, mnemonic: String },

    /// A jump targeted a label with no `lab` definition.
    #[error("undefined label 'L{0}'")]
    UndefinedLabel(u32),

    /// `lod`/`sto` outside the configured memory.
    #[error("memory address {addr} out of range (memory has {cells} cells)")]
    MemoryOutOfBounds { addr: usize, cells: usize },

    /// Writing to the output stream failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// The P-code interpreter.
///
/// Owns the transient execution state (memory, operand stack, run-time
/// diagnostics) for one execution. Soft failures (division by zero,
/// malformed input) are recorded in [`diagnostics`](Self::diagnostics)
/// and execution continues with a `0`.
pub struct Vm {
    memory: Vec<Value>,
    stack: Vec<Value>,
    diagnostics: Vec<String>,
}

impl Vm {
    /// Machine with the default memory size.
    pub fn new() -> Self {
        Self::with_memory(DEFAULT_MEMORY_CELLS)
    }

    /// Machine with `cells` memory cells.
    pub fn with_memory(cells: usize) -> Self {
        Self {
            memory: vec![Value::Int(0); cells],
            stack: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Run-time diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Execute a program, reading from `input` and writing to `output`.
    ///
    /// Labels are resolved up front; `lab` and comment entries take no
    /// execution slot. Returns when `hlt` executes or the program runs
    /// off its end.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        program: &[PInstr],
        mut input: R,
        mut output: W,
    ) -> Result<(), RuntimeError> {
        // Load: strip non-executable entries, hoist labels.
        let mut code: Vec<&PInstr> = Vec::with_capacity(program.len());
        let mut labels: FxHashMap<u32, usize> = FxHashMap::default();
        for instr in program {
            match instr {
                PInstr::Comment(_) => {}
                PInstr::Lab(label) => {
                    labels.insert(label.0, code.len());
                }
                other => code.push(other),
            }
        }

        let mut pending_input: VecDeque<String> = VecDeque::new();
        let mut pc = 0usize;

        while pc < code.len() {
            match code[pc] {
                PInstr::Comment(_) | PInstr::Lab(_) => unreachable!("stripped at load"),
                PInstr::Ldc(value) => self.stack.push(value.clone()),
                PInstr::Lod(addr) => {
                    let value = self.cell(*addr)?.clone();
                    self.stack.push(value);
                }
                PInstr::Sto(addr) => {
                    let value = self.pop(pc, "sto")?;
                    *self.cell_mut(*addr)? = value;
                }
                PInstr::Adi => self.arithmetic(pc, "adi")?,
                PInstr::Sbi => self.arithmetic(pc, "sbi")?,
                PInstr::Mpi => self.arithmetic(pc, "mpi")?,
                PInstr::Dvi => self.arithmetic(pc, "dvi")?,
                PInstr::Mod => self.arithmetic(pc, "mod")?,
                PInstr::Pot => self.arithmetic(pc, "pot")?,
                PInstr::Les => self.relational(pc, "les")?,
                PInstr::Leq => self.relational(pc, "leq")?,
                PInstr::Grt => self.relational(pc, "grt")?,
                PInstr::Geq => self.relational(pc, "geq")?,
                PInstr::Equ => self.relational(pc, "equ")?,
                PInstr::Neq => self.relational(pc, "neq")?,
                PInstr::And => self.logical(pc, "and")?,
                PInstr::Or => self.logical(pc, "or")?,
                PInstr::Ujp(label) => {
                    pc = *labels
                        .get(&label.0)
                        .ok_or(RuntimeError::UndefinedLabel(label.0))?;
                    continue;
                }
                PInstr::Fjp(label) => {
                    let condition = self.pop(pc, "fjp")?;
                    if !condition.is_truthy() {
                        pc = *labels
                            .get(&label.0)
                            .ok_or(RuntimeError::UndefinedLabel(label.0))?;
                        continue;
                    }
                }
                PInstr::Rd => {
                    let value = self.read_value(&mut input, &mut pending_input);
                    self.stack.push(value);
                }
                PInstr::Wr => {
                    let value = self.pop(pc, "wr")?;
                    write!(output, "{}", value.output())?;
                }
                PInstr::Hlt => break,
            }
            pc += 1;
        }

        output.flush()?;
        Ok(())
    }

    fn cell(&self, addr: usize) -> Result<&Value, RuntimeError> {
        self.memory.get(addr).ok_or(RuntimeError::MemoryOutOfBounds {
            addr,
            cells: self.memory.len(),
        })
    }

    fn cell_mut(&mut self, addr: usize) -> Result<&mut Value, RuntimeError> {
        let cells = self.memory.len();
        self.memory
            .get_mut(addr)
            .ok_or(RuntimeError::MemoryOutOfBounds { addr, cells })
    }

    fn pop(&mut self, pc: usize, mnemonic: &str) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(|| RuntimeError::StackUnderflow {
            pc,
            mnemonic: mnemonic.to_string(),
        })
    }

    fn pop_pair(&mut self, pc: usize, mnemonic: &str) -> Result<(Value, Value), RuntimeError> {
        let b = self.pop(pc, mnemonic)?;
        let a = self.pop(pc, mnemonic)?;
        Ok((a, b))
    }

    /// `adi sbi mpi dvi mod pot`: int op int stays int (division
    /// truncates), anything real is real.
    fn arithmetic(&mut self, pc: usize, mnemonic: &str) -> Result<(), RuntimeError> {
        let (a, b) = self.pop_pair(pc, mnemonic)?;

        let result = match (&a, &b) {
            (Value::Int(x), Value::Int(y)) => self.int_arithmetic(mnemonic, *x, *y),
            _ => match (a.as_real(), b.as_real()) {
                (Some(x), Some(y)) => self.real_arithmetic(mnemonic, x, y),
                _ => {
                    self.diagnostics
                        .push(format!("non-numeric operand for '{}'", mnemonic));
                    Value::Int(0)
                }
            },
        };
        self.stack.push(result);
        Ok(())
    }

    fn int_arithmetic(&mut self, mnemonic: &str, x: i64, y: i64) -> Value {
        match mnemonic {
            "adi" => Value::Int(x.wrapping_add(y)),
            "sbi" => Value::Int(x.wrapping_sub(y)),
            "mpi" => Value::Int(x.wrapping_mul(y)),
            "dvi" => {
                if y == 0 {
                    self.diagnostics.push("division by zero".to_string());
                    Value::Int(0)
                } else {
                    Value::Int(x.wrapping_div(y))
                }
            }
            "mod" => {
                if y == 0 {
                    self.diagnostics.push("modulo by zero".to_string());
                    Value::Int(0)
                } else {
                    // Floor modulo, same as the constant folder.
                    Value::Int(floor_mod_int(x, y))
                }
            }
            "pot" => {
                if y >= 0 {
                    match u32::try_from(y).ok().and_then(|e| x.checked_pow(e)) {
                        Some(n) => Value::Int(n),
                        None => Value::Real((x as f64).powf(y as f64)),
                    }
                } else {
                    Value::Real((x as f64).powf(y as f64))
                }
            }
            _ => unreachable!("arithmetic mnemonic"),
        }
    }

    fn real_arithmetic(&mut self, mnemonic: &str, x: f64, y: f64) -> Value {
        match mnemonic {
            "adi" => Value::Real(x + y),
            "sbi" => Value::Real(x - y),
            "mpi" => Value::Real(x * y),
            "dvi" => {
                if y == 0.0 {
                    self.diagnostics.push("division by zero".to_string());
                    Value::Int(0)
                } else {
                    Value::Real(x / y)
                }
            }
            "mod" => {
                if y == 0.0 {
                    self.diagnostics.push("modulo by zero".to_string());
                    Value::Int(0)
                } else {
                    Value::Real(floor_mod_real(x, y))
                }
            }
            "pot" => Value::Real(x.powf(y)),
            _ => unreachable!("arithmetic mnemonic"),
        }
    }

    /// `les leq grt geq equ neq`: numeric comparison pushing 0/1.
    fn relational(&mut self, pc: usize, mnemonic: &str) -> Result<(), RuntimeError> {
        let (a, b) = self.pop_pair(pc, mnemonic)?;
        let result = match (a.as_real(), b.as_real()) {
            (Some(x), Some(y)) => {
                let holds = match mnemonic {
                    "les" => x < y,
                    "leq" => x <= y,
                    "grt" => x > y,
                    "geq" => x >= y,
                    "equ" => x == y,
                    "neq" => x != y,
                    _ => unreachable!("relational mnemonic"),
                };
                Value::Int(i64::from(holds))
            }
            _ => {
                self.diagnostics
                    .push(format!("non-numeric operand for '{}'", mnemonic));
                Value::Int(0)
            }
        };
        self.stack.push(result);
        Ok(())
    }

    /// `and or`: truthiness of both operands, pushing 0/1.
    fn logical(&mut self, pc: usize, mnemonic: &str) -> Result<(), RuntimeError> {
        let (a, b) = self.pop_pair(pc, mnemonic)?;
        let holds = match mnemonic {
            "and" => a.is_truthy() && b.is_truthy(),
            "or" => a.is_truthy() || b.is_truthy(),
            _ => unreachable!("logical mnemonic"),
        };
        self.stack.push(Value::Int(i64::from(holds)));
        Ok(())
    }

    /// One whitespace-delimited token from input; whole reals collapse
    /// to integers so `cin >> n` into an `int` behaves.
    fn read_value<R: BufRead>(&mut self, input: &mut R, pending: &mut VecDeque<String>) -> Value {
        while pending.is_empty() {
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    self.diagnostics
                        .push("invalid input: end of input".to_string());
                    return Value::Int(0);
                }
                Ok(_) => {
                    pending.extend(line.split_whitespace().map(str::to_string));
                }
                Err(e) => {
                    self.diagnostics.push(format!("invalid input: {}", e));
                    return Value::Int(0);
                }
            }
        }

        let Some(token) = pending.pop_front() else {
            return Value::Int(0);
        };
        match token.parse::<f64>() {
            Ok(r) if r.fract() == 0.0 && r.is_finite() => Value::Int(r as i64),
            Ok(r) => Value::Real(r),
            Err(_) => {
                self.diagnostics
                    .push(format!("invalid input '{}'", token));
                Value::Int(0)
            }
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
