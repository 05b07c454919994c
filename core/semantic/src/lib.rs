#![warn(clippy::pedantic)]
pub mod analyzer;
pub mod diagnostics;
pub mod symbol_table;

pub use analyzer::{Analysis, SemanticAnalyzer};
pub use diagnostics::{Line, SemanticError, SemanticWarning};
