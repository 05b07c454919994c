#![warn(clippy::pedantic)]

//! # tiza compiler CLI
//!
//! Command line interface for the tiza toolchain.
//!
//! 1. Parse  (`--parse`)   – build the typed AST.
//! 2. Analyze (`--analyze`) – run the semantic pass and print diagnostics.
//! 3. Codegen (`--codegen`) – emit the textual LLVM IR module, optionally to
//!    `out/<source_name>.ll` (`-o`).
//!
//! At least one of the phase flags must be supplied; the phases that are
//! requested will be executed in the canonical order even if specified out of
//! order on the command line.
//!
//! ## Exit codes
//! * 0 – success.
//! * 1 – usage / IO / phase failure (including any semantic error).
//!
//! ## Example
//! ```bash
//! tizac programa.tza --codegen -o
//! ```

mod parser;

use clap::Parser;
use parser::Cli;
use serde::Serialize;
use std::{
    fs,
    path::PathBuf,
    process::{self},
};
use tiza::CodegenOptions;
use tiza_semantic::{SemanticError, SemanticWarning};

#[derive(Serialize)]
struct DiagnosticsJson<'a> {
    errors: &'a [SemanticError],
    warnings: &'a [SemanticWarning],
}

/// Entry point for the CLI executable.
///
/// Responsibilities:
/// * Parse flags.
/// * Validate that the input path exists and at least one phase is selected.
/// * Run requested phases (parse -> analyze -> codegen).
/// * Print diagnostics (plain text or `--json`) and write the `.ll` output
///   when `-o` is set.
///
/// On any failure a diagnostic is printed to stderr and the process exits
/// with code `1`.
fn main() {
    let args = Cli::parse();
    if !args.path.exists() {
        eprintln!("Error: path not found");
        process::exit(1);
    }

    let need_parse = args.parse;
    let need_analyze = args.analyze;
    let need_codegen = args.codegen;

    if !(need_parse || need_analyze || need_codegen) {
        eprintln!("Error: at least one of --parse, --analyze, or --codegen must be specified");
        process::exit(1);
    }

    let source_code = fs::read_to_string(&args.path).expect("Error reading source file");

    let tree = match tiza::parse(&source_code) {
        Ok(tree) => {
            println!("Parsed: {}", args.path.display());
            tree
        }
        Err(e) => {
            eprintln!("Parse error: {e}");
            process::exit(1);
        }
    };

    if !(need_analyze || need_codegen) {
        // --parse alone still exercises the AST builder.
        if let Err(e) = tiza::build_ast(&tree) {
            eprintln!("Parse error: {e}");
            process::exit(1);
        }
        process::exit(0);
    }

    let program = match tiza::build_ast(&tree) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Parse error: {e}");
            process::exit(1);
        }
    };

    let analysis = tiza::analyze(&program);
    if args.json {
        let rendered = serde_json::to_string_pretty(&DiagnosticsJson {
            errors: &analysis.errors,
            warnings: &analysis.warnings,
        })
        .expect("diagnostics serialize to JSON");
        println!("{rendered}");
    } else {
        for warning in &analysis.warnings {
            eprintln!("{warning}");
        }
        for error in &analysis.errors {
            eprintln!("{error}");
        }
    }
    if !analysis.is_clean() {
        process::exit(1);
    }
    println!("Analyzed: {}", args.path.display());

    if need_codegen {
        let options = CodegenOptions {
            windows_exe: args.windows_exe,
        };
        let ir = match tiza::codegen(&program, &options) {
            Ok(ir) => ir,
            Err(e) => {
                eprintln!("Codegen failed: {e}");
                process::exit(1);
            }
        };
        if args.generate_ll_output {
            let output_path = PathBuf::from("out");
            let source_fname = args
                .path
                .file_stem()
                .unwrap_or_else(|| std::ffi::OsStr::new("module"))
                .to_str()
                .unwrap();
            let ll_file_path = output_path.join(format!("{source_fname}.ll"));
            if let Err(e) = fs::create_dir_all(&output_path) {
                eprintln!("Failed to create output directory: {e}");
                process::exit(1);
            }
            if let Err(e) = fs::write(&ll_file_path, &ir) {
                eprintln!("Failed to write IR file: {e}");
                process::exit(1);
            }
            println!("IR generated at: {}", ll_file_path.to_string_lossy());
        } else {
            print!("{ir}");
        }
    }
    process::exit(0);
}
