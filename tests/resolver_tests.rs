//! Integration tests for the resolver: end-to-end from source text.
//!
//! These drive the full front end (lexer + parser) and assert on the
//! exact diagnostic messages callers are allowed to match on.

use bumpalo::Bump;
use sprig::{Diagnostic, Parser, Resolver};

fn check(source: &str) -> Vec<Diagnostic> {
    let arena = Bump::new();
    let program = Parser::parse(source, &arena).expect("program should parse");
    Resolver::new().resolve(&program)
}

fn messages(diags: &[Diagnostic]) -> Vec<&str> {
    diags.iter().map(|d| d.message.as_str()).collect()
}

#[test]
fn ok_program_has_no_diagnostics() {
    let diags = check(
        "let x = 3;\n\
         fn add(a, b) { return a + b; }\n\
         if (x < 10) { print(add(x, 5)); }\n",
    );
    assert!(diags.is_empty(), "expected no diagnostics, got: {diags:?}");
}

#[test]
fn duplicate_parameter_scenario() {
    let diags = check("fn f(a, a) { return 0; }");
    assert!(
        messages(&diags).contains(&"Duplicate parameter: 'a'"),
        "missing duplicate-parameter diagnostic in {diags:?}"
    );
}

#[test]
fn arity_mismatch_scenario() {
    let diags = check("fn add(a, b) { return a + b; } print(add(1));");
    assert!(
        messages(&diags).contains(&"Arity mismatch for function 'add': expected 2 got 1"),
        "missing arity-mismatch diagnostic in {diags:?}"
    );
}

#[test]
fn undefined_identifier_with_location() {
    let diags = check("print(x);");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "Undefined identifier: 'x'");
    assert_eq!(diags[0].line, 1);
    assert_eq!(diags[0].col, 7);
}

#[test]
fn forward_reference_to_later_function() {
    let diags = check("fn caller() { return callee(1); } fn callee(n) { return n; }");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
}

#[test]
fn mutual_recursion_between_functions() {
    let diags = check(
        "fn even(n) { if (n == 0) { return true; } return odd(n - 1); }\n\
         fn odd(n) { if (n == 0) { return false; } return even(n - 1); }\n",
    );
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
}

#[test]
fn diagnostics_accumulate_in_traversal_order() {
    let diags = check("print(true + 1); print(1 < false); if (1) { print(1); }");
    assert_eq!(
        messages(&diags),
        vec![
            "Arithmetic '+' expects int operands",
            "Comparison '<' expects int operands",
            "if condition should be boolean",
        ]
    );
}

#[test]
fn never_aborts_on_cascading_problems() {
    // Every statement is broken; each one still gets its own finding.
    let diags = check("print(a); print(b + true); while (2) { print(c); }");
    assert_eq!(
        messages(&diags),
        vec![
            "Undefined identifier: 'a'",
            "Undefined identifier: 'b'",
            "while condition should be boolean",
            "Undefined identifier: 'c'",
        ]
    );
}

#[test]
fn resolving_twice_yields_identical_diagnostics() {
    let arena = Bump::new();
    let source = "let x = true + 1; print(y);";
    let program = Parser::parse(source, &arena).unwrap();
    let first = Resolver::new().resolve(&program);
    let second = Resolver::new().resolve(&program);
    assert_eq!(first, second);
}

#[test]
fn duplicate_function_declarations_clash_at_predeclare() {
    let diags = check("fn f() { return 1; } fn f(a) { return a; }");
    assert!(
        messages(&diags).contains(&"Duplicate declaration: 'f'"),
        "missing duplicate-declaration diagnostic in {diags:?}"
    );
}

#[test]
fn let_shadowing_function_name_is_a_clash() {
    // Functions are pre-declared, so the later `let` collides.
    let diags = check("fn f() { return 1; } let f = 2;");
    assert_eq!(messages(&diags), vec!["Duplicate declaration: 'f'"]);
}

#[test]
fn block_scope_closes_on_exit() {
    let diags = check("{ let inner = 1; print(inner); } print(inner);");
    assert_eq!(messages(&diags), vec!["Undefined identifier: 'inner'"]);
}

#[test]
fn diagnostics_collection_renders_findings() {
    let diags = check("print(x);");
    let collection = sprig::Diagnostics::from(diags);
    assert!(!collection.is_empty());
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.to_string(), "1:7: Undefined identifier: 'x'\n");
}

#[test]
fn equality_on_nil_operands_is_rejected() {
    // Only int==int, bool==bool, or an Unknown side are accepted.
    let diags = check("fn f() { return; } let x = f() == f();");
    // Calls type as Unknown, so this one passes...
    assert!(diags.is_empty());

    // ...while a concrete nil comparison does not exist in source form;
    // mixed int/bool is the observable rejection.
    let diags = check("print(true == 1);");
    assert_eq!(
        messages(&diags),
        vec!["Equality expects operands of same basic type"]
    );
}
