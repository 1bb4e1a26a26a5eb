//! micc-drv - Pipeline driver
//!
//! ============================================================================
//! THE PIPELINE
//! ============================================================================
//!
//! ```text
//! source text
//!      │
//!      ▼
//!  [scan]    ──▶ tokens            (micc-lex)
//!      │
//!      ▼
//!  [parse]   ──▶ AST               (micc-par)
//!      │
//!      ▼
//!  [analyse] ──▶ symbols, TAC,     (micc-sem)
//!      │         annotations
//!      ▼
//!  [lower]   ──▶ P-code            (micc-pcode)
//!      │
//!      ▼
//!  [execute] ──▶ stdout            (micc-vm, optional)
//! ```
//!
//! Strictly single-threaded and synchronous: each stage runs to
//! completion before the next begins, and a compile is a pure function
//! of the source text. All stages report into one shared [`Handler`]
//! and every stage runs even when an earlier one produced errors, so a
//! single invocation surfaces as much signal as possible. The driver
//! decides the exit code from the error channel alone.
//!
//! The [`Session`] orchestrates the phases; the `fmt` helpers render
//! the textual artifacts the `micc` binary prints.

use std::path::PathBuf;

use anyhow::Context;
use micc_lex::Token;
use micc_par::Program;
use micc_pcode::PInstr;
use micc_sem::Analysis;
use micc_util::Handler;
use micc_vm::{RuntimeError, Vm, DEFAULT_MEMORY_CELLS};

/// Which artifact the CLI prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitKind {
    /// Token listing.
    Tokens,
    /// Indented AST dump.
    Ast,
    /// Symbol report table.
    Symbols,
    /// Three-address code.
    Tac,
    /// P-code.
    Pcode,
    /// Every artifact in pipeline order.
    #[default]
    All,
}

impl EmitKind {
    /// Parse a `--emit` argument.
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "tokens" => Some(EmitKind::Tokens),
            "ast" => Some(EmitKind::Ast),
            "symbols" => Some(EmitKind::Symbols),
            "tac" => Some(EmitKind::Tac),
            "pcode" => Some(EmitKind::Pcode),
            "all" => Some(EmitKind::All),
            _ => None,
        }
    }
}

/// One compiler invocation's configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file to compile.
    pub input: PathBuf,
    /// Artifact selection.
    pub emit: EmitKind,
    /// Execute the produced P-code after compiling.
    pub run: bool,
    /// VM memory size in cells.
    pub memory_cells: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: PathBuf::new(),
            emit: EmitKind::All,
            run: false,
            memory_cells: DEFAULT_MEMORY_CELLS,
        }
    }
}

/// Everything one compilation produces.
pub struct Artifacts {
    /// Token stream.
    pub tokens: Vec<Token>,
    /// Parse tree.
    pub program: Program,
    /// Symbols, TAC, annotations.
    pub analysis: Analysis,
    /// Lowered stack-machine program.
    pub pcode: Vec<PInstr>,
}

/// State for one compiler invocation.
pub struct Session {
    /// Configuration.
    pub config: Config,
    /// Shared diagnostics sink for every phase.
    pub handler: Handler,
}

impl Session {
    /// Create a session.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handler: Handler::new(),
        }
    }

    /// Read the configured input file and compile it.
    pub fn compile(&self) -> anyhow::Result<Artifacts> {
        let source = std::fs::read_to_string(&self.config.input)
            .with_context(|| format!("cannot read '{}'", self.config.input.display()))?;
        Ok(self.compile_source(&source))
    }

    /// Run the full pipeline over `source`. Every stage runs
    /// best-effort; check the handler for diagnostics afterwards.
    pub fn compile_source(&self, source: &str) -> Artifacts {
        let tokens = micc_lex::scan(source, &self.handler);
        let program = micc_par::parse(tokens.clone(), &self.handler);
        let analysis = micc_sem::analyse(&program, &self.handler);
        let pcode = micc_pcode::lower(&analysis.tac);
        Artifacts {
            tokens,
            program,
            analysis,
            pcode,
        }
    }

    /// Execute compiled P-code against the given streams.
    pub fn execute<R, W>(
        &self,
        artifacts: &Artifacts,
        input: R,
        output: W,
    ) -> Result<Vm, RuntimeError>
    where
        R: std::io::BufRead,
        W: std::io::Write,
    {
        let mut vm = Vm::with_memory(self.config.memory_cells);
        vm.run(&artifacts.pcode, input, output)?;
        Ok(vm)
    }
}

/// Artifact formatting for the CLI and tests.
pub mod fmt {
    use super::*;
    use micc_sem::SymbolTable;

    /// `[KIND] 'lexeme' (Line L, Column C)`, one token per line.
    pub fn token_listing(tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            out.push_str(&token.to_string());
            out.push('\n');
        }
        out
    }

    /// The symbol report table in declaration order.
    pub fn symbol_report(table: &SymbolTable) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<16} {:>8}  {:<12} {:<10} {:<8} {}\n",
            "identifier", "register", "value", "data_type", "scope", "use_lines"
        ));
        for row in table.report() {
            let lines = row
                .use_lines
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&format!(
                "{:<16} {:>8}  {:<12} {:<10} {:<8} {}\n",
                row.identifier, row.register, row.value, row.data_type, row.scope, lines
            ));
        }
        out
    }

    /// Errors then warnings, each ordered by source position.
    pub fn diagnostics_report(handler: &Handler) -> String {
        let mut out = String::new();
        for diag in handler.errors() {
            out.push_str(&diag.to_string());
            out.push('\n');
        }
        for diag in handler.warnings() {
            out.push_str(&diag.to_string());
            out.push('\n');
        }
        out
    }

    /// Render every artifact `emit` selects, in pipeline order.
    pub fn artifacts(artifacts: &Artifacts, emit: EmitKind) -> String {
        let mut out = String::new();
        let all = emit == EmitKind::All;

        if all || emit == EmitKind::Tokens {
            if all {
                out.push_str("--- tokens ---\n");
            }
            out.push_str(&token_listing(&artifacts.tokens));
        }
        if all || emit == EmitKind::Ast {
            if all {
                out.push_str("--- ast ---\n");
            }
            out.push_str(&micc_par::dump(&artifacts.program));
        }
        if all || emit == EmitKind::Symbols {
            if all {
                out.push_str("--- symbols ---\n");
            }
            out.push_str(&symbol_report(&artifacts.analysis.symbols));
        }
        if all || emit == EmitKind::Tac {
            if all {
                out.push_str("--- tac ---\n");
            }
            out.push_str(&micc_tac::listing(&artifacts.analysis.tac));
        }
        if all || emit == EmitKind::Pcode {
            if all {
                out.push_str("--- pcode ---\n");
            }
            out.push_str(&micc_pcode::listing(&artifacts.pcode));
        }
        out
    }
}

/// True when the handler holds at least one error-level diagnostic.
pub fn failed(handler: &Handler) -> bool {
    handler.has_errors()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_kind_from_arg() {
        assert_eq!(EmitKind::from_arg("tac"), Some(EmitKind::Tac));
        assert_eq!(EmitKind::from_arg("pcode"), Some(EmitKind::Pcode));
        assert_eq!(EmitKind::from_arg("object"), None);
    }

    #[test]
    fn test_compile_source_produces_all_artifacts() {
        let session = Session::new(Config::default());
        let artifacts = session.compile_source("main { int x; x = 7; cout << x; }");
        assert!(!artifacts.tokens.is_empty());
        assert_eq!(artifacts.analysis.symbols.len(), 1);
        assert!(!artifacts.pcode.is_empty());
        assert!(!failed(&session.handler));
    }

    #[test]
    fn test_symbol_report_columns() {
        let session = Session::new(Config::default());
        let artifacts = session.compile_source("main {\n int x;\n x = 7;\n}");
        let report = fmt::symbol_report(&artifacts.analysis.symbols);
        let header = report.lines().next().unwrap();
        for column in ["identifier", "register", "value", "data_type", "scope", "use_lines"] {
            assert!(header.contains(column), "{}", header);
        }
        assert!(report.contains("Global"));
        assert!(report.contains("2,3"));
    }

    #[test]
    fn test_diagnostics_report_orders_errors_first() {
        let session = Session::new(Config::default());
        session.compile_source("main { int x; y = 1; }");
        let report = fmt::diagnostics_report(&session.handler);
        let first = report.lines().next().unwrap();
        assert!(first.starts_with("error"), "{}", report);
        assert!(report.contains("warning"), "{}", report);
    }
}
