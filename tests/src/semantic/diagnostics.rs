//! Diagnostic coverage: one suite entry per diagnostic kind, asserting the
//! exact user-visible message format.

use crate::utils::analyze;
use tiza_semantic::{SemanticError, SemanticWarning};

fn error_messages(source: &str) -> Vec<String> {
    analyze(source).errors.iter().map(ToString::to_string).collect()
}

fn warning_messages(source: &str) -> Vec<String> {
    analyze(source)
        .warnings
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn redeclaration_in_same_scope() {
    let messages = error_messages(
        "programa P inicio\nentero x = 1;\nentero x = 2;\npintar(x);\nfin",
    );
    assert_eq!(
        messages,
        vec!["[Línea 3] Error semántico: Variable 'x' ya fue declarada en este ámbito."]
    );
}

#[test]
fn undeclared_variable() {
    let messages = error_messages("programa P inicio\npintar(y);\nfin");
    assert_eq!(
        messages,
        vec!["[Línea 2] Error semántico: Variable 'y' no declarada."]
    );
}

#[test]
fn undefined_function() {
    let messages = error_messages("programa P inicio\npintar(f(1));\nfin");
    assert_eq!(
        messages,
        vec!["[Línea 2] Error semántico: Función 'f' no definida."]
    );
}

#[test]
fn function_redefinition() {
    let messages = error_messages(
        "programa P funciones\nentero f() { ret 1; }\nentero f() { ret 2; }\ninicio pintar(f()); fin",
    );
    assert_eq!(
        messages,
        vec!["[Línea 3] Error semántico: Función 'f' ya fue definida."]
    );
}

#[test]
fn initialization_type_mismatch() {
    let messages = error_messages("programa P inicio entero x = 3.5; fin");
    assert_eq!(
        messages,
        vec![
            "[Línea 1] Error semántico: Tipo incompatible en inicialización de 'x': declarado 'entero', pero la expresión es 'decimal'."
        ]
    );
}

#[test]
fn assignment_type_mismatch() {
    let messages = error_messages(
        "programa P inicio\nentero x = 1;\nx = \"hola\";\npintar(x);\nfin",
    );
    assert_eq!(
        messages,
        vec![
            "[Línea 3] Error semántico: Tipo incompatible en asignación a 'x': esperado 'entero', encontrado 'cadena'."
        ]
    );
}

#[test]
fn arity_mismatch() {
    let messages = error_messages(
        "programa P funciones entero f(entero a) { ret a; }\ninicio\npintar(f(1, 2));\nfin",
    );
    assert_eq!(
        messages,
        vec![
            "[Línea 3] Error semántico: La función 'f' espera 1 argumento(s), pero se proporcionaron 2."
        ]
    );
}

#[test]
fn argument_type_mismatch_positions_are_one_based() {
    let messages = error_messages(
        "programa P funciones entero f(entero a, bool b) { ret a; }\ninicio\npintar(f(verdad, 1));\nfin",
    );
    assert_eq!(
        messages,
        vec![
            "[Línea 3] Error semántico: Tipo incorrecto para el argumento 1 en llamada a 'f': se esperaba 'entero', pero se recibió 'bool'.",
            "[Línea 3] Error semántico: Tipo incorrecto para el argumento 2 en llamada a 'f': se esperaba 'bool', pero se recibió 'entero'."
        ]
    );
}

#[test]
fn return_outside_function() {
    let messages = error_messages("programa P inicio\nret 5;\nfin");
    assert_eq!(
        messages,
        vec!["[Línea 2] Error semántico: Sentencia 'ret' fuera de una función."]
    );
}

#[test]
fn return_type_mismatch() {
    let messages = error_messages(
        "programa P funciones decimal f() {\nret \"x\";\n}\ninicio pintar(f()); fin",
    );
    assert_eq!(
        messages,
        vec![
            "[Línea 2] Error semántico: Tipo de retorno incorrecto: se esperaba 'decimal', pero se retornó 'cadena'."
        ]
    );
}

#[test]
fn shadowing_warning() {
    let messages = warning_messages(
        "programa P inicio\nentero x = 1;\n{\nentero x = 2;\npintar(x);\n}\npintar(x);\nfin",
    );
    assert_eq!(
        messages,
        vec![
            "[Línea 4] Advertencia: Variable 'x' en este bloque oculta una declaración anterior en un ámbito externo."
        ]
    );
}

#[test]
fn unused_and_assigned_never_read_warnings() {
    let messages = warning_messages("programa P inicio\nentero a;\nentero b = 1;\nfin");
    assert_eq!(
        messages,
        vec![
            "[Línea 2] Advertencia: Variable 'a' fue declarada pero nunca utilizada.",
            "[Línea 3] Advertencia: Variable 'b' fue asignada pero nunca leída."
        ]
    );
}

#[test]
fn uncalled_function_warning() {
    let messages = warning_messages(
        "programa P funciones\nentero f() { ret 1; }\ninicio pintar(1); fin",
    );
    assert_eq!(
        messages,
        vec!["[Línea 2] Advertencia: Función 'f' fue definida pero nunca llamada."]
    );
}

#[test]
fn all_diagnostics_are_collected_in_one_pass() {
    let analysis = analyze(
        "programa P inicio\nentero x = 3.5;\npintar(y);\nret 1;\nfin",
    );
    assert_eq!(analysis.errors.len(), 3);
    assert!(matches!(analysis.errors[0], SemanticError::InitTypeMismatch { .. }));
    assert!(matches!(analysis.errors[1], SemanticError::UndeclaredVariable { .. }));
    assert!(matches!(analysis.errors[2], SemanticError::ReturnOutsideFunction { .. }));
}

#[test]
fn warnings_and_errors_are_kept_apart() {
    let analysis = analyze("programa P inicio\nentero x;\npintar(y);\nfin");
    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(analysis.warnings.len(), 1);
    assert!(matches!(
        analysis.warnings[0],
        SemanticWarning::UnusedVariable { .. }
    ));
}
