//! Hand-written lexer for tiza source text.
//!
//! The lexer walks the input character by character, tracking 1-based line and
//! column positions, and produces the token stream consumed by the parser.
//! String literals keep their surrounding quotes and are passed through
//! byte-for-byte; escape sequences are not interpreted.

use std::{iter::Peekable, str::Chars};

use thiserror::Error;

use crate::token::{Location, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("{location}: unexpected character `{ch}`")]
    UnexpectedCharacter { ch: char, location: Location },

    #[error("{location}: unterminated string literal")]
    UnterminatedString { location: Location },
}

pub type LexResult<T> = Result<T, LexError>;

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    tokens: Vec<Token>,
    iterator: Peekable<Chars<'a>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: vec![],
            iterator: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Consumes the lexer and returns the full token stream.
    ///
    /// # Errors
    ///
    /// Returns a [`LexError`] on the first character that cannot start a token
    /// or on a string literal without a closing quote.
    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        loop {
            self.eat_trivia();
            let location = self.location();
            let Some(&next) = self.iterator.peek() else {
                return Ok(self.tokens);
            };
            match next {
                c if c.is_alphabetic() || c == '_' => self.lex_word(location),
                c if c.is_ascii_digit() => self.lex_number(location),
                '"' => self.lex_string(location)?,
                _ => self.lex_operator(location)?,
            }
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.iterator.next();
        match next {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }
        next
    }

    /// Skips whitespace and `//` line comments.
    fn eat_trivia(&mut self) {
        loop {
            while self
                .iterator
                .peek()
                .is_some_and(|item| item.is_whitespace())
            {
                self.bump();
            }
            let mut lookahead = self.iterator.clone();
            if lookahead.next() == Some('/') && lookahead.next() == Some('/') {
                while self.iterator.peek().is_some_and(|&c| c != '\n') {
                    self.bump();
                }
                continue;
            }
            return;
        }
    }

    fn lex_word(&mut self, location: Location) {
        let mut word = String::new();
        while let Some(&c) = self.iterator.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = TokenKind::from_keyword(&word).unwrap_or(TokenKind::Ident);
        self.tokens.push(Token::new(kind, word, location));
    }

    fn lex_number(&mut self, location: Location) {
        let mut text = String::new();
        while self.iterator.peek().is_some_and(char::is_ascii_digit) {
            text.push(self.bump().unwrap());
        }
        // A dot only belongs to the number when a digit follows it.
        let mut lookahead = self.iterator.clone();
        if lookahead.next() == Some('.') && lookahead.next().is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.bump().unwrap());
            while self.iterator.peek().is_some_and(char::is_ascii_digit) {
                text.push(self.bump().unwrap());
            }
        }
        self.tokens.push(Token::new(TokenKind::Number, text, location));
    }

    fn lex_string(&mut self, location: Location) -> LexResult<()> {
        let mut text = String::new();
        text.push(self.bump().expect("peeked opening quote"));
        loop {
            match self.bump() {
                Some('"') => {
                    text.push('"');
                    self.tokens.push(Token::new(TokenKind::Text, text, location));
                    return Ok(());
                }
                Some(c) => text.push(c),
                None => return Err(LexError::UnterminatedString { location }),
            }
        }
    }

    fn lex_operator(&mut self, location: Location) -> LexResult<()> {
        let ch = self.bump().expect("peeked operator character");
        let two = |second: char, lexer: &mut Self| -> bool {
            if lexer.iterator.peek() == Some(&second) {
                lexer.bump();
                true
            } else {
                false
            }
        };
        let (kind, text) = match ch {
            '=' if two('=', self) => (TokenKind::EqEq, "=="),
            '=' => (TokenKind::Assign, "="),
            '!' if two('=', self) => (TokenKind::NotEq, "!="),
            '!' => (TokenKind::Bang, "!"),
            '<' if two('=', self) => (TokenKind::LtEq, "<="),
            '<' => (TokenKind::Lt, "<"),
            '>' if two('=', self) => (TokenKind::GtEq, ">="),
            '>' => (TokenKind::Gt, ">"),
            '&' if two('&', self) => (TokenKind::AndAnd, "&&"),
            '|' if two('|', self) => (TokenKind::OrOr, "||"),
            '+' => (TokenKind::Plus, "+"),
            '-' => (TokenKind::Minus, "-"),
            '*' => (TokenKind::Star, "*"),
            '/' => (TokenKind::Slash, "/"),
            '%' => (TokenKind::Percent, "%"),
            '^' => (TokenKind::Caret, "^"),
            '(' => (TokenKind::LParen, "("),
            ')' => (TokenKind::RParen, ")"),
            '{' => (TokenKind::LBrace, "{"),
            '}' => (TokenKind::RBrace, "}"),
            ';' => (TokenKind::Semicolon, ";"),
            ',' => (TokenKind::Comma, ","),
            _ => return Err(LexError::UnexpectedCharacter { ch, location }),
        };
        self.tokens.push(Token::new(kind, text, location));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_program_skeleton() {
        assert_eq!(
            kinds("programa Demo inicio fin"),
            vec![
                TokenKind::Programa,
                TokenKind::Ident,
                TokenKind::Inicio,
                TokenKind::Fin
            ]
        );
    }

    #[test]
    fn lexes_declaration_with_operators() {
        assert_eq!(
            kinds("entero x = 3 + 4;"),
            vec![
                TokenKind::TypeName,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn distinguishes_assign_from_equality() {
        assert_eq!(
            kinds("x = y == z"),
            vec![
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Ident,
                TokenKind::EqEq,
                TokenKind::Ident
            ]
        );
    }

    #[test]
    fn number_with_fraction_is_one_token() {
        let tokens = Lexer::new("3.5").lex().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "3.5");
    }

    #[test]
    fn string_keeps_quotes_and_raw_bytes() {
        let tokens = Lexer::new(r#""hola\n""#).lex().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].text, r#""hola\n""#);
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(
            kinds("entero x; // comentario\nret"),
            vec![
                TokenKind::TypeName,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ret
            ]
        );
    }

    #[test]
    fn tracks_lines_and_columns() {
        let tokens = Lexer::new("si\n  sino").lex().unwrap();
        assert_eq!(tokens[0].location, Location::new(1, 1));
        assert_eq!(tokens[1].location, Location::new(2, 3));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new("\"abierta").lex().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn rejects_stray_characters() {
        let err = Lexer::new("entero ñ@").lex().unwrap_err();
        assert!(matches!(err, LexError::UnexpectedCharacter { ch: '@', .. }));
    }
}
