use tiza::CodegenOptions;
use tiza_ast::nodes::Program;
use tiza_semantic::Analysis;

pub(crate) fn get_test_data_path() -> std::path::PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::env::current_dir().unwrap());
    manifest_dir.join("test_data")
}

pub(crate) fn build_ast(source: &str) -> Program {
    let tree = tiza::parse(source).expect("source parses");
    tiza::build_ast(&tree).expect("tree builds")
}

pub(crate) fn analyze(source: &str) -> Analysis {
    tiza::analyze(&build_ast(source))
}

/// Analyzes, asserts the program is clean, and lowers it.
pub(crate) fn lower(source: &str) -> String {
    let program = build_ast(source);
    let analysis = tiza::analyze(&program);
    assert!(
        analysis.is_clean(),
        "expected a clean program, got: {:?}",
        analysis.errors
    );
    tiza::codegen(&program, &CodegenOptions::default()).expect("codegen succeeds")
}
