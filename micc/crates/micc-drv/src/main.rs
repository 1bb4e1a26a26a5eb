use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{anyhow, bail};
use micc_drv::{fmt, Config, EmitKind, Session};

const USAGE: &str = "usage: micc [--emit tokens|ast|symbols|tac|pcode|all] [--run] [--memory N] <file>";

fn main() -> ExitCode {
    match run() {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(true)` on an error-free compile.
fn run() -> anyhow::Result<bool> {
    let (config, emit_requested) = parse_args(std::env::args().skip(1))?;
    let run_after = config.run;
    let emit = config.emit;

    let session = Session::new(config);
    let artifacts = session.compile()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    // `--run` without an explicit `--emit` executes quietly, so program
    // output is not buried under listings.
    if emit_requested || !run_after {
        write!(out, "{}", fmt::artifacts(&artifacts, emit))?;
    }

    eprint!("{}", fmt::diagnostics_report(&session.handler));

    if session.handler.has_errors() {
        return Ok(false);
    }

    if run_after {
        let stdin = io::stdin();
        let vm = session
            .execute(&artifacts, stdin.lock(), &mut out)
            .map_err(|e| anyhow!("runtime error: {}", e))?;
        for diagnostic in vm.diagnostics() {
            eprintln!("runtime: {}", diagnostic);
        }
    }

    Ok(true)
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<(Config, bool)> {
    let mut config = Config::default();
    let mut input = None;
    let mut emit_requested = false;

    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--emit" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--emit requires a value\n{}", USAGE))?;
                config.emit = EmitKind::from_arg(&value)
                    .ok_or_else(|| anyhow!("unknown emit kind '{}'\n{}", value, USAGE))?;
                emit_requested = true;
            }
            "--run" => config.run = true,
            "--memory" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--memory requires a value\n{}", USAGE))?;
                config.memory_cells = value
                    .parse()
                    .map_err(|_| anyhow!("malformed memory size '{}'", value))?;
            }
            "--help" | "-h" => bail!("{}", USAGE),
            other if other.starts_with('-') => {
                bail!("unknown option '{}'\n{}", other, USAGE);
            }
            other => {
                if input.replace(other.to_string()).is_some() {
                    bail!("more than one input file\n{}", USAGE);
                }
            }
        }
    }

    config.input = input
        .ok_or_else(|| anyhow!("missing input file\n{}", USAGE))?
        .into();
    Ok((config, emit_requested))
}
