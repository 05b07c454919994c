//! Semantic diagnostics.
//!
//! Errors are fatal for the pipeline (IR generation only runs on an empty
//! error list); warnings never halt. Every diagnostic renders as
//! `[Línea N] Error semántico: …` or `[Línea N] Advertencia: …`, with the
//! literal `desconocida` when no line is known.

use core::fmt;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use tiza_ast::nodes::{Location, Ty};

/// Source line reference for a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Line(pub Option<u32>);

impl Line {
    #[must_use]
    pub const fn unknown() -> Self {
        Self(None)
    }
}

impl From<Location> for Line {
    fn from(location: Location) -> Self {
        Self(Some(location.line))
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.0 {
            Some(line) => write!(f, "{line}"),
            None => write!(f, "desconocida"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SemanticError {
    #[error("[Línea {line}] Error semántico: Variable '{name}' ya fue declarada en este ámbito.")]
    Redeclaration { name: String, line: Line },

    #[error("[Línea {line}] Error semántico: Variable '{name}' no declarada.")]
    UndeclaredVariable { name: String, line: Line },

    #[error("[Línea {line}] Error semántico: Función '{name}' no definida.")]
    UndefinedFunction { name: String, line: Line },

    #[error("[Línea {line}] Error semántico: Función '{name}' ya fue definida.")]
    FunctionRedefinition { name: String, line: Line },

    #[error(
        "[Línea {line}] Error semántico: Tipo incompatible en inicialización de '{name}': declarado '{declared}', pero la expresión es '{found}'."
    )]
    InitTypeMismatch {
        name: String,
        declared: Ty,
        found: Ty,
        line: Line,
    },

    #[error(
        "[Línea {line}] Error semántico: Tipo incompatible en asignación a '{name}': esperado '{expected}', encontrado '{found}'."
    )]
    AssignTypeMismatch {
        name: String,
        expected: Ty,
        found: Ty,
        line: Line,
    },

    #[error(
        "[Línea {line}] Error semántico: La función '{name}' espera {expected} argumento(s), pero se proporcionaron {found}."
    )]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        line: Line,
    },

    #[error(
        "[Línea {line}] Error semántico: Tipo incorrecto para el argumento {index} en llamada a '{name}': se esperaba '{expected}', pero se recibió '{found}'."
    )]
    ArgumentTypeMismatch {
        name: String,
        /// 1-based argument position.
        index: usize,
        expected: Ty,
        found: Ty,
        line: Line,
    },

    #[error("[Línea {line}] Error semántico: Sentencia 'ret' fuera de una función.")]
    ReturnOutsideFunction { line: Line },

    #[error(
        "[Línea {line}] Error semántico: Tipo de retorno incorrecto: se esperaba '{expected}', pero se retornó '{found}'."
    )]
    ReturnTypeMismatch {
        expected: Ty,
        found: Ty,
        line: Line,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SemanticWarning {
    #[error(
        "[Línea {line}] Advertencia: Variable '{name}' en este bloque oculta una declaración anterior en un ámbito externo."
    )]
    Shadowing { name: String, line: Line },

    #[error("[Línea {line}] Advertencia: Variable '{name}' fue declarada pero nunca utilizada.")]
    UnusedVariable { name: String, line: Line },

    #[error("[Línea {line}] Advertencia: Variable '{name}' fue asignada pero nunca leída.")]
    AssignedNeverRead { name: String, line: Line },

    #[error("[Línea {line}] Advertencia: Función '{name}' fue definida pero nunca llamada.")]
    UncalledFunction { name: String, line: Line },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: u32) -> Line {
        Line(Some(n))
    }

    #[test]
    fn unknown_line_prints_desconocida() {
        let err = SemanticError::ReturnOutsideFunction {
            line: Line::unknown(),
        };
        assert_eq!(
            err.to_string(),
            "[Línea desconocida] Error semántico: Sentencia 'ret' fuera de una función."
        );
    }

    #[test]
    fn display_redeclaration() {
        let err = SemanticError::Redeclaration {
            name: "x".to_string(),
            line: line(3),
        };
        assert_eq!(
            err.to_string(),
            "[Línea 3] Error semántico: Variable 'x' ya fue declarada en este ámbito."
        );
    }

    #[test]
    fn display_init_type_mismatch_uses_source_keywords() {
        let err = SemanticError::InitTypeMismatch {
            name: "x".to_string(),
            declared: Ty::Int32,
            found: Ty::Float64,
            line: line(1),
        };
        assert_eq!(
            err.to_string(),
            "[Línea 1] Error semántico: Tipo incompatible en inicialización de 'x': declarado 'entero', pero la expresión es 'decimal'."
        );
    }

    #[test]
    fn display_assign_type_mismatch() {
        let err = SemanticError::AssignTypeMismatch {
            name: "s".to_string(),
            expected: Ty::String,
            found: Ty::Bool,
            line: line(7),
        };
        assert_eq!(
            err.to_string(),
            "[Línea 7] Error semántico: Tipo incompatible en asignación a 's': esperado 'cadena', encontrado 'bool'."
        );
    }

    #[test]
    fn display_arity_mismatch() {
        let err = SemanticError::ArityMismatch {
            name: "f".to_string(),
            expected: 2,
            found: 3,
            line: line(5),
        };
        assert_eq!(
            err.to_string(),
            "[Línea 5] Error semántico: La función 'f' espera 2 argumento(s), pero se proporcionaron 3."
        );
    }

    #[test]
    fn display_argument_type_mismatch_is_one_based() {
        let err = SemanticError::ArgumentTypeMismatch {
            name: "f".to_string(),
            index: 1,
            expected: Ty::Int32,
            found: Ty::String,
            line: line(2),
        };
        assert_eq!(
            err.to_string(),
            "[Línea 2] Error semántico: Tipo incorrecto para el argumento 1 en llamada a 'f': se esperaba 'entero', pero se recibió 'cadena'."
        );
    }

    #[test]
    fn display_return_type_mismatch() {
        let err = SemanticError::ReturnTypeMismatch {
            expected: Ty::Int32,
            found: Ty::Void,
            line: line(9),
        };
        assert_eq!(
            err.to_string(),
            "[Línea 9] Error semántico: Tipo de retorno incorrecto: se esperaba 'entero', pero se retornó 'void'."
        );
    }

    #[test]
    fn display_warnings() {
        let warning = SemanticWarning::Shadowing {
            name: "x".to_string(),
            line: line(4),
        };
        assert_eq!(
            warning.to_string(),
            "[Línea 4] Advertencia: Variable 'x' en este bloque oculta una declaración anterior en un ámbito externo."
        );
        let warning = SemanticWarning::UncalledFunction {
            name: "f".to_string(),
            line: line(2),
        };
        assert_eq!(
            warning.to_string(),
            "[Línea 2] Advertencia: Función 'f' fue definida pero nunca llamada."
        );
    }
}
