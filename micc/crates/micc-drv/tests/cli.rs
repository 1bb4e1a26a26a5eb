//! CLI surface tests for the `micc` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn source_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write source");
    file
}

#[test]
fn test_emit_tokens() {
    let file = source_file("main { int x; }");
    Command::cargo_bin("micc")
        .unwrap()
        .args(["--emit", "tokens"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[RESERVED] 'main' (Line 1, Column 1)"))
        .stdout(predicate::str::contains("[IDENTIFIER] 'x'"));
}

#[test]
fn test_emit_tac() {
    let file = source_file("main { int x; x = 7; cout << x; }");
    Command::cargo_bin("micc")
        .unwrap()
        .args(["--emit", "tac"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("DECLARE x int"))
        .stdout(predicate::str::contains("x = 7"))
        .stdout(predicate::str::contains("WRITE x"));
}

#[test]
fn test_emit_pcode() {
    let file = source_file("main { int x; x = 7; cout << x; }");
    Command::cargo_bin("micc")
        .unwrap()
        .args(["--emit", "pcode"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ldc 7"))
        .stdout(predicate::str::contains("hlt"));
}

#[test]
fn test_run_executes_program() {
    let file = source_file("main { int x; x = 7; cout << x; }");
    Command::cargo_bin("micc")
        .unwrap()
        .arg("--run")
        .arg(file.path())
        .assert()
        .success()
        .stdout("7");
}

#[test]
fn test_run_with_stdin() {
    let file = source_file("main { int n; do { cin >> n; cout << n; } while (n > 0); }");
    Command::cargo_bin("micc")
        .unwrap()
        .arg("--run")
        .arg(file.path())
        .write_stdin("3 0\n")
        .assert()
        .success()
        .stdout("30");
}

#[test]
fn test_semantic_error_fails_with_diagnostic() {
    let file = source_file("main { y = 3 + 4; }");
    Command::cargo_bin("micc")
        .unwrap()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("'y' not declared"));
}

#[test]
fn test_warnings_do_not_fail_the_compile() {
    let file = source_file("main { int x; }");
    Command::cargo_bin("micc")
        .unwrap()
        .args(["--emit", "symbols"])
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("never used"));
}

#[test]
fn test_missing_file_reports_io_error() {
    Command::cargo_bin("micc")
        .unwrap()
        .arg("does-not-exist.mc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_unknown_emit_kind_rejected() {
    let file = source_file("main { }");
    Command::cargo_bin("micc")
        .unwrap()
        .args(["--emit", "object"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown emit kind"));
}

#[test]
fn test_default_emits_all_sections() {
    let file = source_file("main { int x; x = 1; }");
    Command::cargo_bin("micc")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("--- tokens ---"))
        .stdout(predicate::str::contains("--- ast ---"))
        .stdout(predicate::str::contains("--- symbols ---"))
        .stdout(predicate::str::contains("--- tac ---"))
        .stdout(predicate::str::contains("--- pcode ---"));
}
