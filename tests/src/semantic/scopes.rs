//! Scope-discipline behavior across blocks, functions and loop headers.

use crate::utils::analyze;
use tiza_semantic::{SemanticError, SemanticWarning};

#[test]
fn inner_scopes_see_outer_variables() {
    let analysis = analyze(
        "programa P inicio entero x = 1; { x = 2; { pintar(x); } } fin",
    );
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn inner_declarations_do_not_leak_outward() {
    let analysis = analyze(
        "programa P inicio { entero x = 1; pintar(x); } x = 2; fin",
    );
    assert!(matches!(
        analysis.errors[0],
        SemanticError::UndeclaredVariable { .. }
    ));
}

#[test]
fn sibling_blocks_may_reuse_names_without_shadowing() {
    let analysis = analyze(
        "programa P inicio { entero x = 1; pintar(x); } { entero x = 2; pintar(x); } fin",
    );
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
    assert!(analysis.warnings.is_empty(), "{:?}", analysis.warnings);
}

#[test]
fn parameters_live_in_the_function_scope() {
    let analysis = analyze(
        "programa P funciones entero f(entero a) { entero b = a + 1; ret b; } inicio pintar(f(1)); fin",
    );
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn duplicate_parameters_are_a_redeclaration() {
    let analysis = analyze(
        "programa P funciones entero f(entero a, entero a) { ret a; } inicio pintar(f(1, 2)); fin",
    );
    assert!(analysis
        .errors
        .iter()
        .any(|e| matches!(e, SemanticError::Redeclaration { .. })));
}

#[test]
fn parameter_shadowing_a_global_warns() {
    let analysis = analyze(
        "programa P entero g = 1; funciones entero f(entero g) { ret g; } inicio pintar(f(1) + g); fin",
    );
    assert!(analysis
        .warnings
        .iter()
        .any(|w| matches!(w, SemanticWarning::Shadowing { .. })));
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn unused_parameter_warns_on_function_exit() {
    let analysis = analyze(
        "programa P funciones entero f(entero a) { ret 1; } inicio pintar(f(1)); fin",
    );
    assert!(analysis
        .warnings
        .iter()
        .any(|w| matches!(w, SemanticWarning::UnusedVariable { .. })));
}

#[test]
fn for_header_declaration_lives_in_the_enclosing_scope() {
    // The loop header has no scope of its own, so a second `para` reusing
    // the name collides.
    let analysis = analyze(
        "programa P inicio para (entero i = 0; i < 2; i = i + 1) { pintar(i); } para (entero i = 0; i < 2; i = i + 1) { pintar(i); } fin",
    );
    assert!(analysis
        .errors
        .iter()
        .any(|e| matches!(e, SemanticError::Redeclaration { .. })));
}

#[test]
fn functions_cannot_be_called_before_their_definition() {
    let analysis = analyze(
        "programa P funciones entero f() { ret g(); } entero g() { ret 1; } inicio pintar(f()); fin",
    );
    assert!(analysis
        .errors
        .iter()
        .any(|e| matches!(e, SemanticError::UndefinedFunction { .. })));
}

#[test]
fn later_functions_may_call_earlier_ones() {
    let analysis = analyze(
        "programa P funciones entero f() { ret 1; } entero g() { ret f() + 1; } inicio pintar(g()); fin",
    );
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn main_block_resolves_globals() {
    let analysis = analyze("programa P entero g = 5; inicio pintar(g); fin");
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}
