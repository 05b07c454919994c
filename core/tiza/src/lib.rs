#![warn(clippy::pedantic)]
//! Core orchestration crate for the tiza compiler.
//!
//! tiza is a small imperative teaching language with Spanish keywords
//! (`programa`, `inicio`, `fin`, `si`, `sino`, `mientras`, `hacer`, `para`,
//! `ret`, `pintar`, `funciones`). This crate wires the pipeline together and
//! exposes one entry point per phase:
//!
//! ```text
//! .tza source → parse → concrete tree → build_ast → typed AST
//!                → analyze → {errores, advertencias}
//!                → codegen → textual LLVM IR module
//! ```
//!
//! The phases are deliberately independent: the analyzer and the IR
//! generator both consume the typed AST, and IR generation requires that the
//! analysis reported no errors. Warnings never block compilation.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tiza::{CodegenOptions, compile};
//!
//! let source = r#"programa Demo inicio pintar("hola"); fin"#;
//! let compilation = compile(source, &CodegenOptions::default())?;
//! for warning in &compilation.analysis.warnings {
//!     eprintln!("{warning}");
//! }
//! println!("{}", compilation.ir);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Phase functions
//!
//! - [`parse`] lexes and parses source text into the concrete parse tree.
//! - [`build_ast`] transforms the parse tree into the typed AST.
//! - [`analyze`] runs the semantic pass and returns ordered diagnostics.
//! - [`codegen`] lowers a validated AST into a textual LLVM IR module.
//! - [`compile`] chains all of the above and refuses to lower when the
//!   analysis found errors.
//!
//! External collaborators (an LLVM optimizer, the `lli` interpreter, a
//! static-compilation chain) consume the textual module; none of them are
//! invoked from this crate.

use anyhow::bail;

use tiza_ast::Builder;
use tiza_ast::nodes::Program;
use tiza_parser::{ParseNode, Parser};
use tiza_semantic::{Analysis, SemanticAnalyzer};

pub use tiza_llvm_codegen::CodegenOptions;

/// Lexes and parses source text into the concrete parse tree.
///
/// # Errors
///
/// Returns the first lexical or syntax error.
pub fn parse(source: &str) -> anyhow::Result<ParseNode> {
    Parser::parse_source(source)
}

/// Transforms a concrete parse tree into the typed AST.
///
/// # Errors
///
/// Returns an error when the tree is malformed; the builder reports every
/// collected problem before failing.
pub fn build_ast(tree: &ParseNode) -> anyhow::Result<Program> {
    Builder::new().build(tree)
}

/// Runs the semantic pass. The analyzer never aborts: it returns every
/// error and warning it found, in source order.
#[must_use]
pub fn analyze(program: &Program) -> Analysis {
    SemanticAnalyzer::analyze(program)
}

/// Lowers a validated AST into a textual LLVM IR module.
///
/// The caller is responsible for only invoking this on a program whose
/// analysis reported no errors; [`compile`] enforces that.
///
/// # Errors
///
/// Fails on generator invariant violations (undefined names, unsupported
/// casts, non-constant global initializers).
pub fn codegen(program: &Program, options: &CodegenOptions) -> anyhow::Result<String> {
    tiza_llvm_codegen::generator::codegen(program, options)
}

/// Result of a full [`compile`] run: the diagnostics (warnings may be
/// non-empty) and the generated module.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub analysis: Analysis,
    pub ir: String,
}

/// Runs the whole pipeline. Compilation halts after analysis when any
/// semantic error was found; the error message carries the full diagnostic
/// list, one per line.
///
/// # Errors
///
/// Fails on parse errors, AST building errors, semantic errors, or
/// generator invariant violations.
pub fn compile(source: &str, options: &CodegenOptions) -> anyhow::Result<Compilation> {
    let tree = parse(source)?;
    let program = build_ast(&tree)?;
    let analysis = analyze(&program);
    if !analysis.is_clean() {
        let messages: Vec<String> = analysis.errors.iter().map(ToString::to_string).collect();
        bail!(messages.join("\n"));
    }
    let ir = codegen(&program, options)?;
    Ok(Compilation { analysis, ir })
}
