//! Cross-crate tests for the parse-tree to AST transformation.

use crate::utils::{build_ast, get_test_data_path, lower};
use tiza_ast::Builder;
use tiza_ast::nodes::{Statement, Ty};

#[test]
fn building_twice_from_one_tree_yields_structurally_equal_programs() {
    let source = std::fs::read_to_string(get_test_data_path().join("tza").join("example.tza"))
        .expect("fixture exists");
    let tree = tiza::parse(&source).unwrap();
    let first = Builder::new().build(&tree).unwrap();
    let second = Builder::new().build(&tree).unwrap();
    assert_eq!(first, second);
}

#[test]
fn fixture_program_exposes_all_top_level_sections() {
    let source = std::fs::read_to_string(get_test_data_path().join("tza").join("example.tza"))
        .expect("fixture exists");
    let program = build_ast(&source);
    assert!(!program.globals.is_empty());
    assert!(!program.functions.is_empty());
    assert!(!program.block.statements.is_empty());
}

#[test]
fn ast_serializes_to_json() {
    let program = build_ast("programa P inicio entero x = 1; pintar(x); fin");
    let json = serde_json::to_string_pretty(&program).unwrap();
    assert!(json.contains("\"name\": \"P\""));
    assert!(json.contains("\"Int32\""));
}

#[test]
fn inferred_declaration_is_equivalent_to_its_typed_form() {
    // `var x = E;` must behave exactly like `T x = E;` with T inferred
    // from E, all the way down to the generated module.
    let inferred = lower("programa P inicio var x = 3; pintar(x); fin");
    let typed = lower("programa P inicio entero x = 3; pintar(x); fin");
    assert_eq!(inferred, typed);

    let inferred = lower("programa P inicio var s = \"ab\"; pintar(s); fin");
    let typed = lower("programa P inicio cadena s = \"ab\"; pintar(s); fin");
    assert_eq!(inferred, typed);
}

#[test]
fn declaration_statements_carry_their_declared_types() {
    let program = build_ast(
        "programa P inicio entero a = 1; decimal b = 2.5; bool c = verdad; cadena d = \"x\"; var e = 1; pintar(a, b, c, d, e); fin",
    );
    let types: Vec<Ty> = program
        .block
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::Declaration(d) => Some(d.ty),
            _ => None,
        })
        .collect();
    assert_eq!(
        types,
        vec![Ty::Int32, Ty::Float64, Ty::Bool, Ty::String, Ty::Inferred]
    );
}
