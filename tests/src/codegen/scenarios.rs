//! End-to-end scenarios: source in, diagnostics and generated module out.

use crate::utils::{analyze, lower};
use tiza::CodegenOptions;

#[test]
fn prints_an_integer_and_returns_zero() {
    let ir = lower("programa P inicio entero x = 3; pintar(x); fin");
    assert!(ir.contains("c\"%d\\0A\\00\""));
    assert!(ir.contains("call i32 (i8*, ...) @printf(i8* "));
    assert!(ir.contains("ret i32 0"));
}

#[test]
fn string_concatenation_references_the_runtime_helper() {
    let ir = lower("programa P inicio cadena s = \"a\" + \"b\"; pintar(s); fin");
    assert!(ir.contains("define i8* @concat(i8* %a, i8* %b) {"));
    assert!(ir.contains("call i8* @concat(i8* "));
    assert!(ir.contains("c\"a\\00\""));
    assert!(ir.contains("c\"b\\00\""));
}

#[test]
fn initialization_mismatch_halts_before_codegen() {
    let err = tiza::compile(
        "programa P inicio entero x = 3.5; fin",
        &CodegenOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "[Línea 1] Error semántico: Tipo incompatible en inicialización de 'x': declarado 'entero', pero la expresión es 'decimal'."
    );
}

#[test]
fn user_function_is_defined_and_called() {
    let ir = lower(
        "programa P funciones entero f(entero a) { ret a + 1; } inicio pintar(f(2)); fin",
    );
    assert!(ir.contains("define i32 @f(i32 %a) {"));
    assert!(ir.contains("call i32 @f(i32 2)"));
    assert!(ir.contains("add i32 "));
}

#[test]
fn uncalled_function_still_generates_a_module() {
    let compilation = tiza::compile(
        "programa P funciones entero f() { ret 1; } inicio pintar(1); fin",
        &CodegenOptions::default(),
    )
    .unwrap();
    assert_eq!(
        compilation.analysis.warnings[0].to_string(),
        "[Línea 1] Advertencia: Función 'f' fue definida pero nunca llamada."
    );
    assert!(compilation.ir.contains("define i32 @f() {"));
}

#[test]
fn if_else_emits_both_string_arms() {
    let ir = lower(
        "programa P inicio entero x = 0; si (x == 0) { pintar(\"yes\"); } sino { pintar(\"no\"); } fin",
    );
    assert!(ir.contains("c\"yes\\00\""));
    assert!(ir.contains("c\"no\\00\""));
    assert!(ir.contains("if.then:"));
    assert!(ir.contains("if.else:"));
    assert!(ir.contains("if.merge:"));
    assert!(ir.contains("icmp eq i32 "));
}

#[test]
fn clean_analysis_and_successful_codegen_go_together() {
    let accepted = [
        "programa P inicio fin",
        "programa P inicio entero x = 3; pintar(x); fin",
        "programa P entero g = 1; inicio pintar(g); fin",
        "programa P funciones entero f(entero a) { ret a + 1; } inicio pintar(f(2)); fin",
        "programa P inicio entero i = 0; mientras (i < 3) { i = i + 1; } pintar(i); fin",
        "programa P inicio hacer { pintar(1); } mientras (falso); fin",
        "programa P inicio para (entero i = 0; i < 2; i = i + 1) { pintar(i); } fin",
        "programa P inicio pintar(2 ^ 10, 7 % 2, 1.5 % 0.5); fin",
    ];
    for source in accepted {
        let compilation = tiza::compile(source, &CodegenOptions::default());
        assert!(compilation.is_ok(), "expected IR for: {source}");
    }

    let rejected = [
        "programa P inicio entero x = 3.5; fin",
        "programa P inicio pintar(y); fin",
        "programa P inicio pintar(f(1)); fin",
        "programa P inicio ret 1; fin",
    ];
    for source in rejected {
        let analysis = analyze(source);
        assert!(!analysis.is_clean(), "expected errors for: {source}");
        let compilation = tiza::compile(source, &CodegenOptions::default());
        assert!(compilation.is_err(), "expected no IR for: {source}");
    }
}

#[test]
fn block_order_is_stable_across_runs() {
    let source =
        "programa P inicio entero i = 0; mientras (i < 3) { si (i == 1) { pintar(i); } i = i + 1; } fin";
    assert_eq!(lower(source), lower(source));
}

#[test]
fn nested_control_flow_uniquifies_labels() {
    let ir = lower(
        "programa P inicio entero x = 1; si (x == 0) { pintar(1); } si (x == 1) { pintar(2); } fin",
    );
    assert!(ir.contains("if.then:"));
    assert!(ir.contains("if.then.1:"));
    assert!(ir.contains("if.merge:"));
    assert!(ir.contains("if.merge.1:"));
}

#[test]
fn global_strings_are_constant_bitcasts() {
    let ir = lower("programa P cadena saludo = \"hola\"; inicio pintar(saludo); fin");
    assert!(ir.contains("c\"hola\\00\""));
    assert!(ir.contains("@saludo = global i8* bitcast ("));
}

#[test]
fn recursion_lowers_to_a_self_call() {
    let ir = lower(
        "programa P funciones entero fact(entero n) { si (n <= 1) { ret 1; } ret n * fact(n - 1); } inicio pintar(fact(5)); fin",
    );
    assert!(ir.contains("define i32 @fact(i32 %n) {"));
    assert!(ir.contains("call i32 @fact(i32 "));
    assert!(ir.contains("mul i32 "));
}
