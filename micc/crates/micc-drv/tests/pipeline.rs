//! End-to-end pipeline tests: source text in, program output out.

use micc_drv::{Config, Session};
use micc_vm::Vm;

/// Compile and execute, returning (stdout, session).
fn compile_and_run(source: &str, input: &str) -> (String, Session) {
    let session = Session::new(Config::default());
    let artifacts = session.compile_source(source);
    assert!(
        !session.handler.has_errors(),
        "compile errors: {:?}",
        session.handler.errors()
    );
    let mut output = Vec::new();
    session
        .execute(&artifacts, input.as_bytes(), &mut output)
        .expect("execution failed");
    (String::from_utf8(output).unwrap(), session)
}

#[test]
fn test_declare_assign_output() {
    let source = "main {\n    int x;\n    x = 7;\n    cout << x;\n}";
    let (stdout, session) = compile_and_run(source, "");
    assert_eq!(stdout, "7");

    let artifacts = session.compile_source(source);
    let rows = artifacts.analysis.symbols.report();
    assert_eq!(rows[0].identifier, "x");
    assert_eq!(rows[0].value, "7");
    assert_eq!(rows[0].data_type, "int");
    assert_eq!(rows[0].use_lines, vec![2, 3, 4]);
}

#[test]
fn test_sum_of_evens() {
    let source = r#"
main {
    int i;
    int suma;

    i = 1;
    suma = 0;

    while ( i <= 10 ) {
        if ( i % 2 == 0 ) then {
            suma = suma + i;
        } end
        i = i + 1;
    }

    cout << suma;
}
"#;
    let (stdout, session) = compile_and_run(source, "");
    assert_eq!(stdout, "30");

    // The listing carries symbolic labels and a forward fjp.
    let artifacts = session.compile_source(source);
    let tac = micc_tac::listing(&artifacts.analysis.tac);
    assert!(tac.contains("L0:") && tac.contains("L1:") && tac.contains("L2:"), "{}", tac);
    let pcode = micc_pcode::listing(&artifacts.pcode);
    assert!(pcode.contains("fjp"), "{}", pcode);
}

#[test]
fn test_type_coercion_int_to_float() {
    let source = "main { float f; int i; i = 2; f = i; cout << f; }";
    let (stdout, session) = compile_and_run(source, "");
    assert_eq!(stdout, "2");
    assert_eq!(session.handler.error_count(), 0);
}

#[test]
fn test_redeclaration_reports_and_continues() {
    let session = Session::new(Config::default());
    let artifacts = session.compile_source("main { int x; int x; }");
    assert_eq!(session.handler.error_count(), 1);
    assert!(session.handler.errors()[0].message.contains("already declared"));
    assert_eq!(artifacts.analysis.symbols.len(), 1);
}

#[test]
fn test_undeclared_use_keeps_folded_value() {
    let session = Session::new(Config::default());
    let artifacts = session.compile_source("main { y = 3 + 4; }");
    assert_eq!(session.handler.error_count(), 1);
    assert!(session.handler.errors()[0].message.contains("'y' not declared"));

    let annotation = artifacts
        .analysis
        .annotations
        .iter()
        .find(|a| a.node == "assignment")
        .expect("assignment annotation");
    assert_eq!(annotation.value.as_deref(), Some("7"));
}

#[test]
fn test_do_while_with_input() {
    let source = "main { int n; do { cin >> n; cout << n; } while (n > 0); }";
    let (stdout, _) = compile_and_run(source, "3 0\n");
    assert_eq!(stdout, "30");
}

#[test]
fn test_if_else_branches() {
    let source = "main { int x; x = 5; if (x > 3) { cout << \"big\"; } else { cout << \"small\"; } end }";
    let (stdout, _) = compile_and_run(source, "");
    assert_eq!(stdout, "big");

    let source = "main { int x; x = 1; if (x > 3) { cout << \"big\"; } else { cout << \"small\"; } end }";
    let (stdout, _) = compile_and_run(source, "");
    assert_eq!(stdout, "small");
}

#[test]
fn test_string_escapes_in_output() {
    let source = "main { int x; x = 7; cout << \"x=\" << x << \"\\n\"; }";
    let (stdout, _) = compile_and_run(source, "");
    assert_eq!(stdout, "x=7\n");
}

#[test]
fn test_split_increment_program() {
    // The postfix operator lands on its own line.
    let source = "main { int x; x = 4; x +\n+ ; cout << x; }";
    let (stdout, _) = compile_and_run(source, "");
    assert_eq!(stdout, "5");
}

#[test]
fn test_division_by_zero_at_runtime() {
    let source = "main { int a; int b; a = 1; b = 0; cout << a / b; }";
    let session = Session::new(Config::default());
    let artifacts = session.compile_source(source);
    assert!(!session.handler.has_errors());

    let mut output = Vec::new();
    let vm = session
        .execute(&artifacts, "".as_bytes(), &mut output)
        .expect("executes past the fault");
    assert_eq!(String::from_utf8(output).unwrap(), "0");
    assert!(vm.diagnostics().iter().any(|d| d.contains("division by zero")));
}

#[test]
fn test_folding_is_observationally_sound() {
    // The folded program and the equivalent run-time computation must
    // print the same thing.
    let folded = "main { int x; x = 2 * 3 + 1; cout << x; }";
    let unfolded = "main { int a; int b; int x; a = 2; b = 3; x = a * b + 1; cout << x; }";
    let (out_folded, _) = compile_and_run(folded, "");
    let (out_unfolded, _) = compile_and_run(unfolded, "");
    assert_eq!(out_folded, out_unfolded);
    assert_eq!(out_folded, "7");
}

#[test]
fn test_peephole_is_observationally_sound() {
    let source = r#"
main {
    int i;
    int total;
    i = 0;
    total = 0;
    while ( i < 7 ) {
        if ( (i % 2 == 0) && (i > 0) ) then {
            total = total + i;
        } end
        i = i + 1;
    }
    do { total = total - 1; } while (total > 4);
    cout << total;
}
"#;
    let session = Session::new(Config::default());
    let artifacts = session.compile_source(source);
    assert!(!session.handler.has_errors());

    let optimized = &artifacts.pcode;
    let reference = micc_pcode::lower_unoptimized(&artifacts.analysis.tac);
    assert!(optimized.len() < reference.len(), "peephole removed nothing");

    let mut out_opt = Vec::new();
    Vm::new()
        .run(optimized, "".as_bytes(), &mut out_opt)
        .unwrap();
    let mut out_ref = Vec::new();
    Vm::new()
        .run(&reference, "".as_bytes(), &mut out_ref)
        .unwrap();
    assert_eq!(out_opt, out_ref);
}

#[test]
fn test_pcode_round_trips_through_text() {
    let source = "main { int i; i = 3; while (i > 0) { cout << i; i--; } }";
    let session = Session::new(Config::default());
    let artifacts = session.compile_source(source);
    assert!(!session.handler.has_errors());

    let text = micc_pcode::listing(&artifacts.pcode);
    let (reparsed, warnings) = micc_vm::parse_text(&text);
    assert!(warnings.is_empty(), "{:?}", warnings);

    let mut from_instrs = Vec::new();
    Vm::new()
        .run(&artifacts.pcode, "".as_bytes(), &mut from_instrs)
        .unwrap();
    let mut from_text = Vec::new();
    Vm::new()
        .run(&reparsed, "".as_bytes(), &mut from_text)
        .unwrap();
    assert_eq!(from_instrs, from_text);
    assert_eq!(String::from_utf8(from_instrs).unwrap(), "321");
}

#[test]
fn test_errors_do_not_stop_later_stages() {
    // Undeclared variable: analysis errors, but TAC and P-code still
    // come out for the rest of the program.
    let session = Session::new(Config::default());
    let artifacts = session.compile_source("main { int x; x = 1; y = 2; cout << x; }");
    assert!(session.handler.has_errors());
    let tac = micc_tac::listing(&artifacts.analysis.tac);
    assert!(tac.contains("WRITE x"), "{}", tac);
    assert!(!artifacts.pcode.is_empty());
}

#[test]
fn test_mod_with_negative_dividend() {
    // Subtraction makes negatives reachable even though literals are
    // unsigned; the remainder follows the divisor's sign: -5 % 3 = 1.
    let source = "main { int x; x = 3 - 8; int y; y = x % 3; cout << y; }";
    let (stdout, _) = compile_and_run(source, "");
    assert_eq!(stdout, "1");
}

#[test]
fn test_pow_end_to_end() {
    let source = "main { int b; int p; b = 2; p = b ^ 10; cout << p; }";
    let (stdout, _) = compile_and_run(source, "");
    assert_eq!(stdout, "1024");
}

#[test]
fn test_nested_loops() {
    let source = r#"
main {
    int i;
    int j;
    i = 0;
    while (i < 3) {
        j = 0;
        while (j < 2) {
            cout << i * 2 + j;
            j = j + 1;
        }
        i = i + 1;
    }
}
"#;
    let (stdout, _) = compile_and_run(source, "");
    assert_eq!(stdout, "012345");
}
