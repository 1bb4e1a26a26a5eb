//! Textual P-code parsing.
//!
//! P-code round-trips through text (`mnemonic [operand]`, one per
//! line); this module reads it back. Comments (`;` prefix) and blank
//! lines disappear here; unknown or malformed lines produce a warning
//! and are skipped, never an abort.

use micc_pcode::PInstr;
use micc_tac::Label;
use micc_util::Value;

/// Parse textual P-code into instructions plus load-time warnings.
pub fn parse_text(text: &str) -> (Vec<PInstr>, Vec<String>) {
    let mut instrs = Vec::new();
    let mut warnings = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let (mnemonic, operand) = match line.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, Some(rest.trim())),
            None => (line, None),
        };
        match parse_instr(mnemonic, operand) {
            Ok(instr) => instrs.push(instr),
            Err(problem) => warnings.push(format!("line {}: {}", number + 1, problem)),
        }
    }

    (instrs, warnings)
}

fn parse_instr(mnemonic: &str, operand: Option<&str>) -> Result<PInstr, String> {
    let instr = match mnemonic {
        "ldc" => PInstr::Ldc(parse_value(required(mnemonic, operand)?)?),
        "lod" => PInstr::Lod(parse_addr(required(mnemonic, operand)?)?),
        "sto" => PInstr::Sto(parse_addr(required(mnemonic, operand)?)?),
        "adi" => PInstr::Adi,
        "sbi" => PInstr::Sbi,
        "mpi" => PInstr::Mpi,
        "dvi" => PInstr::Dvi,
        "mod" => PInstr::Mod,
        "pot" => PInstr::Pot,
        "les" => PInstr::Les,
        "leq" => PInstr::Leq,
        "grt" => PInstr::Grt,
        "geq" => PInstr::Geq,
        "equ" => PInstr::Equ,
        "neq" => PInstr::Neq,
        "and" => PInstr::And,
        "or" => PInstr::Or,
        "ujp" => PInstr::Ujp(parse_label(required(mnemonic, operand)?)?),
        "fjp" => PInstr::Fjp(parse_label(required(mnemonic, operand)?)?),
        "lab" => PInstr::Lab(parse_label(required(mnemonic, operand)?)?),
        "rd" => PInstr::Rd,
        "wr" => PInstr::Wr,
        "hlt" => PInstr::Hlt,
        other => return Err(format!("unknown instruction '{}'", other)),
    };
    Ok(instr)
}

fn required<'a>(mnemonic: &str, operand: Option<&'a str>) -> Result<&'a str, String> {
    operand.ok_or_else(|| format!("'{}' requires an operand", mnemonic))
}

fn parse_value(text: &str) -> Result<Value, String> {
    text.parse::<Value>().map_err(|e| e.to_string())
}

fn parse_addr(text: &str) -> Result<usize, String> {
    text.parse::<usize>()
        .map_err(|_| format!("malformed address '{}'", text))
}

fn parse_label(text: &str) -> Result<Label, String> {
    text.strip_prefix('L')
        .and_then(|n| n.parse::<u32>().ok())
        .map(Label)
        .ok_or_else(|| format!("malformed label '{}'", text))
}
