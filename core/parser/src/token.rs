use core::fmt;
use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Position of a token inside the source text. Lines and columns are 1-based.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    // Keywords
    Programa,
    Inicio,
    Fin,
    Si,
    Sino,
    Mientras,
    Hacer,
    Para,
    Ret,
    Pintar,
    Funciones,
    /// `entero`, `decimal`, `bool`, `cadena` or `void`.
    TypeName,
    Var,

    // Literals and identifiers
    /// `verdad` or `falso`.
    BoolLit,
    Number,
    /// A quoted string; the token text keeps the surrounding quotes.
    Text,
    Ident,

    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Bang,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
}

impl TokenKind {
    /// Maps a keyword spelling to its token kind. Identifiers return `None`.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "programa" => TokenKind::Programa,
            "inicio" => TokenKind::Inicio,
            "fin" => TokenKind::Fin,
            "si" => TokenKind::Si,
            "sino" => TokenKind::Sino,
            "mientras" => TokenKind::Mientras,
            "hacer" => TokenKind::Hacer,
            "para" => TokenKind::Para,
            "ret" => TokenKind::Ret,
            "pintar" => TokenKind::Pintar,
            "funciones" => TokenKind::Funciones,
            "entero" | "decimal" | "bool" | "cadena" | "void" => TokenKind::TypeName,
            "var" => TokenKind::Var,
            "verdad" | "falso" => TokenKind::BoolLit,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: Location,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
        }
    }
}
