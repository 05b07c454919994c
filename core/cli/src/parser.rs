//! Command line argument parsing for the tiza compiler.
//!
//! This module defines the CLI interface using `clap`. The `Cli` struct
//! captures all command line flags and arguments passed to the `tizac`
//! binary.

use clap::Parser;

/// Command line interface definition for the tiza compiler.
///
/// `tizac` operates in phases, and users must explicitly request which
/// phases to run. Phases execute in canonical order
/// (parse → analyze → codegen) regardless of flag order.
///
/// ## Phase dependencies
///
/// - `--parse`: standalone, builds the concrete tree and typed AST
/// - `--analyze`: requires parsing (automatically runs the parse phase)
/// - `--codegen`: requires analysis (automatically runs parse and analyze)
///
/// ## Examples
///
/// Analyze only:
/// ```bash
/// tizac programa.tza --analyze
/// ```
///
/// Full compilation with a `.ll` file in `out/`:
/// ```bash
/// tizac programa.tza --codegen -o
/// ```
#[derive(Parser)]
#[command(
    name = "tizac",
    author,
    version,
    about = "tiza compiler CLI (tizac)",
    long_about = "The 'tizac' command runs one or more compilation phases over a single .tza source file. \
Parse builds the typed AST; analyze runs the semantic pass and prints its diagnostics; codegen emits a textual LLVM IR module."
)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct Cli {
    /// Path to the source file to compile.
    pub(crate) path: std::path::PathBuf,

    /// Run the parse phase: lex, parse, and build the typed AST.
    ///
    /// Prints "Parsed: <filepath>" on success. Syntax errors are reported to
    /// stderr and the process exits with code 1.
    #[clap(long = "parse", action = clap::ArgAction::SetTrue)]
    pub(crate) parse: bool,

    /// Run the semantic analysis phase.
    ///
    /// Errors and warnings are printed with their source lines
    /// (`[Línea N] …`). Any semantic error halts compilation with exit code
    /// 1; warnings never halt.
    #[clap(long = "analyze", action = clap::ArgAction::SetTrue)]
    pub(crate) analyze: bool,

    /// Run the codegen phase and emit the textual LLVM IR module.
    ///
    /// The module is printed to stdout unless `-o` is given. The emitted IR
    /// is ready for an external optimizer (`opt`), interpreter (`lli`) or
    /// static compiler (`llc`).
    #[clap(long = "codegen", action = clap::ArgAction::SetTrue)]
    pub(crate) codegen: bool,

    /// Write the generated module to `out/<source_name>.ll` instead of
    /// stdout. Only takes effect with `--codegen`.
    #[clap(short = 'o', action = clap::ArgAction::SetTrue)]
    pub(crate) generate_ll_output: bool,

    /// Build for a Windows EXE target: `main` pauses on `getchar` before
    /// returning 0. All other lowering is identical.
    #[clap(long = "windows-exe", action = clap::ArgAction::SetTrue)]
    pub(crate) windows_exe: bool,

    /// Print analysis diagnostics as JSON instead of plain text.
    #[clap(long = "json", action = clap::ArgAction::SetTrue)]
    pub(crate) json: bool,
}
