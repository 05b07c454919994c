//! Recursive-descent parser producing the concrete parse tree.
//!
//! Grammar, precedence low to high: assignment, `||`, `&&`, equality,
//! comparison, additive, multiplicative, `^` (right-assoc), unary, call.
//! A call production always wraps its primary expression; each parenthesized
//! argument group contributes one `Args` child, so a `Call` node with a lone
//! child is a plain primary and not a call.

use thiserror::Error;

use crate::cst::{ParseNode, Rule};
use crate::lexer::Lexer;
use crate::token::{Location, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{location}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Lexes and parses a whole source file into a `Program` parse node.
    ///
    /// # Errors
    ///
    /// Returns the lexer error or the first syntax error encountered.
    pub fn parse_source(source: &str) -> anyhow::Result<ParseNode> {
        let tokens = Lexer::new(source).lex()?;
        let program = Parser::new(tokens).parse_program()?;
        Ok(program)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.position + offset).map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.advance().unwrap()),
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.text.clone(),
                location: token.location,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }),
        }
    }

    fn current_location(&self) -> Location {
        self.peek()
            .map(|t| t.location)
            .or_else(|| self.tokens.last().map(|t| t.location))
            .unwrap_or_default()
    }

    /// `programa ID declaracion_global* funciones? bloque_programa`
    ///
    /// # Errors
    ///
    /// Returns an error on any syntax violation.
    pub fn parse_program(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Programa, "`programa`")?;
        let name = self.ident()?;

        let mut children = vec![name];
        while self.at(TokenKind::TypeName) {
            children.push(self.declaration(Rule::GlobalDecl)?);
        }
        if self.at(TokenKind::Funciones) {
            children.push(self.functions()?);
        }
        children.push(self.program_block()?);
        Ok(ParseNode::new(Rule::Program, start.location, children))
    }

    fn ident(&mut self) -> ParseResult<ParseNode> {
        let token = self.expect(TokenKind::Ident, "an identifier")?;
        Ok(ParseNode::terminal(Rule::Ident, token.location, token.text))
    }

    fn type_name(&mut self) -> ParseResult<ParseNode> {
        let token = self.expect(TokenKind::TypeName, "a type name")?;
        Ok(ParseNode::terminal(
            Rule::TypeName,
            token.location,
            token.text,
        ))
    }

    /// `tipo ID ('=' expr)? ';'`, shared by global and local typed forms.
    fn declaration(&mut self, rule: Rule) -> ParseResult<ParseNode> {
        let ty = self.type_name()?;
        let location = ty.location;
        let name = self.ident()?;
        let mut children = vec![ty, name];
        if self.eat(TokenKind::Assign) {
            children.push(self.expression()?);
        }
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(ParseNode::new(rule, location, children))
    }

    /// `var ID '=' expr ';'`
    fn inferred_declaration(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Var, "`var`")?;
        let name = self.ident()?;
        self.expect(TokenKind::Assign, "`=`")?;
        let value = self.expression()?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(ParseNode::new(
            Rule::InferredDecl,
            start.location,
            vec![name, value],
        ))
    }

    /// `funciones funcion+`
    fn functions(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Funciones, "`funciones`")?;
        let mut children = vec![];
        while self.at(TokenKind::TypeName) {
            children.push(self.function_def()?);
        }
        Ok(ParseNode::new(Rule::Functions, start.location, children))
    }

    /// `tipo ID '(' params? ')' bloque`
    fn function_def(&mut self) -> ParseResult<ParseNode> {
        let ty = self.type_name()?;
        let location = ty.location;
        let name = self.ident()?;
        self.expect(TokenKind::LParen, "`(`")?;
        let mut children = vec![ty, name];
        if !self.at(TokenKind::RParen) {
            children.push(self.params()?);
        }
        self.expect(TokenKind::RParen, "`)`")?;
        children.push(self.block()?);
        Ok(ParseNode::new(Rule::FunctionDef, location, children))
    }

    fn params(&mut self) -> ParseResult<ParseNode> {
        let location = self.current_location();
        let mut children = vec![self.param()?];
        while self.eat(TokenKind::Comma) {
            children.push(self.param()?);
        }
        Ok(ParseNode::new(Rule::Params, location, children))
    }

    fn param(&mut self) -> ParseResult<ParseNode> {
        let ty = self.type_name()?;
        let location = ty.location;
        let name = self.ident()?;
        Ok(ParseNode::new(Rule::Param, location, vec![ty, name]))
    }

    /// `inicio sentencia* fin`
    fn program_block(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Inicio, "`inicio`")?;
        let mut statements = vec![];
        while !self.at(TokenKind::Fin) {
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof {
                    expected: "`fin`".to_string(),
                });
            }
            statements.push(self.statement()?);
        }
        self.expect(TokenKind::Fin, "`fin`")?;
        let block = ParseNode::new(Rule::Block, start.location, statements);
        Ok(ParseNode::new(
            Rule::ProgramBlock,
            start.location,
            vec![block],
        ))
    }

    /// `'{' sentencia* '}'`
    fn block(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::LBrace, "`{`")?;
        let mut statements = vec![];
        while !self.at(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof {
                    expected: "`}`".to_string(),
                });
            }
            statements.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(ParseNode::new(Rule::Block, start.location, statements))
    }

    fn statement(&mut self) -> ParseResult<ParseNode> {
        match self.peek_kind() {
            Some(TokenKind::TypeName) => self.declaration(Rule::TypedDecl),
            Some(TokenKind::Var) => self.inferred_declaration(),
            Some(TokenKind::Pintar) => self.print_statement(),
            Some(TokenKind::Si) => self.if_statement(),
            Some(TokenKind::Mientras) => self.while_statement(),
            Some(TokenKind::Hacer) => self.do_while_statement(),
            Some(TokenKind::Para) => self.for_statement(),
            Some(TokenKind::Ret) => self.return_statement(),
            Some(TokenKind::LBrace) => self.block(),
            Some(_) => self.expression_statement(),
            None => Err(ParseError::UnexpectedEof {
                expected: "a statement".to_string(),
            }),
        }
    }

    /// `pintar '(' args? ')' ';'`
    fn print_statement(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Pintar, "`pintar`")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let mut children = vec![];
        if !self.at(TokenKind::RParen) {
            children.push(self.args()?);
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(ParseNode::new(Rule::PrintStmt, start.location, children))
    }

    /// `si '(' expr ')' sentencia ('sino' sentencia)?`
    fn if_statement(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Si, "`si`")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "`)`")?;
        let then_stmt = self.statement()?;
        let mut children = vec![condition, then_stmt];
        if self.eat(TokenKind::Sino) {
            children.push(self.statement()?);
        }
        Ok(ParseNode::new(Rule::IfStmt, start.location, children))
    }

    /// `mientras '(' expr ')' sentencia`
    fn while_statement(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Mientras, "`mientras`")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "`)`")?;
        let body = self.statement()?;
        Ok(ParseNode::new(
            Rule::WhileStmt,
            start.location,
            vec![condition, body],
        ))
    }

    /// `hacer sentencia mientras '(' expr ')' ';'`
    fn do_while_statement(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Hacer, "`hacer`")?;
        let body = self.statement()?;
        self.expect(TokenKind::Mientras, "`mientras`")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(ParseNode::new(
            Rule::DoWhileStmt,
            start.location,
            vec![body, condition],
        ))
    }

    /// `para '(' (declaracion | expr? ';') expr? ';' expr? ')' sentencia`
    ///
    /// The node is always 4-ary: init, condition, update, body. Omitted
    /// header parts are `Empty` placeholders.
    fn for_statement(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Para, "`para`")?;
        self.expect(TokenKind::LParen, "`(`")?;

        let init = match self.peek_kind() {
            Some(TokenKind::TypeName) => self.declaration(Rule::TypedDecl)?,
            Some(TokenKind::Var) => self.inferred_declaration()?,
            Some(TokenKind::Semicolon) => {
                let empty = ParseNode::empty(self.current_location());
                self.expect(TokenKind::Semicolon, "`;`")?;
                empty
            }
            _ => {
                let expr = self.expression()?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                expr
            }
        };

        let condition = if self.at(TokenKind::Semicolon) {
            ParseNode::empty(self.current_location())
        } else {
            self.expression()?
        };
        self.expect(TokenKind::Semicolon, "`;`")?;

        let update = if self.at(TokenKind::RParen) {
            ParseNode::empty(self.current_location())
        } else {
            self.expression()?
        };
        self.expect(TokenKind::RParen, "`)`")?;

        let body = self.statement()?;
        Ok(ParseNode::new(
            Rule::ForStmt,
            start.location,
            vec![init, condition, update, body],
        ))
    }

    /// `ret expr? ';'`
    fn return_statement(&mut self) -> ParseResult<ParseNode> {
        let start = self.expect(TokenKind::Ret, "`ret`")?;
        let mut children = vec![];
        if !self.at(TokenKind::Semicolon) {
            children.push(self.expression()?);
        }
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(ParseNode::new(Rule::ReturnStmt, start.location, children))
    }

    fn expression_statement(&mut self) -> ParseResult<ParseNode> {
        let expr = self.expression()?;
        let location = expr.location;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(ParseNode::new(Rule::ExprStmt, location, vec![expr]))
    }

    fn expression(&mut self) -> ParseResult<ParseNode> {
        self.assignment()
    }

    /// `ID '=' asignacion | logicaOr`, right-associative.
    fn assignment(&mut self) -> ParseResult<ParseNode> {
        if self.peek_kind() == Some(TokenKind::Ident)
            && self.peek_kind_at(1) == Some(TokenKind::Assign)
        {
            let name = self.ident()?;
            let location = name.location;
            self.expect(TokenKind::Assign, "`=`")?;
            let value = self.assignment()?;
            return Ok(ParseNode::new(Rule::Assign, location, vec![name, value]));
        }
        self.logic_or()
    }

    fn binary_chain(
        &mut self,
        operators: &[TokenKind],
        next: fn(&mut Self) -> ParseResult<ParseNode>,
    ) -> ParseResult<ParseNode> {
        let mut left = next(self)?;
        while let Some(kind) = self.peek_kind() {
            if !operators.contains(&kind) {
                break;
            }
            let op = self.advance().unwrap();
            let right = next(self)?;
            let location = left.location;
            left = ParseNode::operator(Rule::Binary, location, op.text, vec![left, right]);
        }
        Ok(left)
    }

    fn logic_or(&mut self) -> ParseResult<ParseNode> {
        self.binary_chain(&[TokenKind::OrOr], Self::logic_and)
    }

    fn logic_and(&mut self) -> ParseResult<ParseNode> {
        self.binary_chain(&[TokenKind::AndAnd], Self::equality)
    }

    fn equality(&mut self) -> ParseResult<ParseNode> {
        self.binary_chain(&[TokenKind::EqEq, TokenKind::NotEq], Self::comparison)
    }

    fn comparison(&mut self) -> ParseResult<ParseNode> {
        self.binary_chain(
            &[
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::LtEq,
                TokenKind::GtEq,
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> ParseResult<ParseNode> {
        self.binary_chain(&[TokenKind::Plus, TokenKind::Minus], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> ParseResult<ParseNode> {
        self.binary_chain(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::power,
        )
    }

    /// `unario ('^' potencia)?`, right-associative.
    fn power(&mut self) -> ParseResult<ParseNode> {
        let left = self.unary()?;
        if self.at(TokenKind::Caret) {
            let op = self.advance().unwrap();
            let right = self.power()?;
            let location = left.location;
            return Ok(ParseNode::operator(
                Rule::Binary,
                location,
                op.text,
                vec![left, right],
            ));
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<ParseNode> {
        match self.peek_kind() {
            Some(TokenKind::Plus | TokenKind::Minus | TokenKind::Bang) => {
                let op = self.advance().unwrap();
                let operand = self.unary()?;
                Ok(ParseNode::operator(
                    Rule::Unary,
                    op.location,
                    op.text,
                    vec![operand],
                ))
            }
            _ => self.call(),
        }
    }

    /// `primary ('(' args? ')')*`. The `Call` wrapper is always present;
    /// without a parenthesis group it degenerates to its primary child.
    fn call(&mut self) -> ParseResult<ParseNode> {
        let primary = self.primary()?;
        let location = primary.location;
        let mut children = vec![primary];
        while self.eat(TokenKind::LParen) {
            let args_location = self.current_location();
            let args = if self.at(TokenKind::RParen) {
                ParseNode::new(Rule::Args, args_location, vec![])
            } else {
                self.args()?
            };
            self.expect(TokenKind::RParen, "`)`")?;
            children.push(args);
        }
        Ok(ParseNode::new(Rule::Call, location, children))
    }

    fn args(&mut self) -> ParseResult<ParseNode> {
        let location = self.current_location();
        let mut children = vec![self.expression()?];
        while self.eat(TokenKind::Comma) {
            children.push(self.expression()?);
        }
        Ok(ParseNode::new(Rule::Args, location, children))
    }

    fn primary(&mut self) -> ParseResult<ParseNode> {
        match self.peek_kind() {
            Some(TokenKind::Number) => {
                let token = self.advance().unwrap();
                Ok(ParseNode::terminal(Rule::Number, token.location, token.text))
            }
            Some(TokenKind::BoolLit) => {
                let token = self.advance().unwrap();
                Ok(ParseNode::terminal(
                    Rule::BoolLit,
                    token.location,
                    token.text,
                ))
            }
            Some(TokenKind::Text) => {
                let token = self.advance().unwrap();
                Ok(ParseNode::terminal(Rule::Text, token.location, token.text))
            }
            Some(TokenKind::Ident) => self.ident(),
            Some(TokenKind::LParen) => {
                let start = self.advance().unwrap();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(ParseNode::new(Rule::Paren, start.location, vec![inner]))
            }
            Some(_) => {
                let token = self.peek().unwrap();
                Err(ParseError::UnexpectedToken {
                    expected: "an expression".to_string(),
                    found: token.text.clone(),
                    location: token.location,
                })
            }
            None => Err(ParseError::UnexpectedEof {
                expected: "an expression".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseNode {
        Parser::parse_source(source).unwrap()
    }

    #[test]
    fn parses_minimal_program() {
        let tree = parse("programa Demo inicio fin");
        assert_eq!(tree.rule, Rule::Program);
        assert_eq!(tree.children[0].text, "Demo");
        assert_eq!(tree.children[1].rule, Rule::ProgramBlock);
    }

    #[test]
    fn global_declarations_precede_functions() {
        let tree = parse("programa P entero g = 1; inicio fin");
        assert_eq!(tree.children[1].rule, Rule::GlobalDecl);
        assert_eq!(tree.children[1].children[0].text, "entero");
    }

    #[test]
    fn functions_section_collects_definitions() {
        let tree = parse(
            "programa P funciones entero f(entero a) { ret a; } void g() { } inicio fin",
        );
        let functions = &tree.children[1];
        assert_eq!(functions.rule, Rule::Functions);
        assert_eq!(functions.children.len(), 2);
        assert_eq!(functions.children[0].rule, Rule::FunctionDef);
    }

    #[test]
    fn if_without_else_has_two_children() {
        let tree = parse("programa P inicio si (1) { } fin");
        let block = &tree.children[1].children[0];
        let if_stmt = &block.children[0];
        assert_eq!(if_stmt.rule, Rule::IfStmt);
        assert_eq!(if_stmt.children.len(), 2);
    }

    #[test]
    fn if_with_else_has_three_children() {
        let tree = parse("programa P inicio si (1) { } sino { } fin");
        let block = &tree.children[1].children[0];
        assert_eq!(block.children[0].children.len(), 3);
    }

    #[test]
    fn for_header_is_always_four_children() {
        let tree = parse("programa P inicio para (;;) { } fin");
        let block = &tree.children[1].children[0];
        let for_stmt = &block.children[0];
        assert_eq!(for_stmt.rule, Rule::ForStmt);
        assert_eq!(for_stmt.children.len(), 4);
        assert!(for_stmt.children[0].is_empty_slot());
        assert!(for_stmt.children[1].is_empty_slot());
        assert!(for_stmt.children[2].is_empty_slot());
    }

    #[test]
    fn for_accepts_declaration_initializer() {
        let tree = parse("programa P inicio para (entero i = 0; i < 3; i = i + 1) { } fin");
        let block = &tree.children[1].children[0];
        let for_stmt = &block.children[0];
        assert_eq!(for_stmt.children[0].rule, Rule::TypedDecl);
        assert_eq!(for_stmt.children[1].rule, Rule::Binary);
        assert_eq!(for_stmt.children[2].rule, Rule::Assign);
    }

    #[test]
    fn bare_identifier_becomes_call_with_single_child() {
        let tree = parse("programa P inicio x = y; fin");
        let block = &tree.children[1].children[0];
        let assign = &block.children[0].children[0];
        assert_eq!(assign.rule, Rule::Assign);
        let value = &assign.children[1];
        assert_eq!(value.rule, Rule::Call);
        assert_eq!(value.children.len(), 1);
    }

    #[test]
    fn call_with_empty_parens_keeps_args_group() {
        let tree = parse("programa P inicio x = f(); fin");
        let block = &tree.children[1].children[0];
        let value = &block.children[0].children[0].children[1];
        assert_eq!(value.rule, Rule::Call);
        assert_eq!(value.children.len(), 2);
        assert_eq!(value.children[1].rule, Rule::Args);
        assert!(value.children[1].children.is_empty());
    }

    #[test]
    fn power_is_right_associative() {
        let tree = parse("programa P inicio x = 2 ^ 3 ^ 4; fin");
        let block = &tree.children[1].children[0];
        let assign = &block.children[0].children[0];
        let power = &assign.children[1];
        assert_eq!(power.text, "^");
        // Right operand is itself a power expression.
        assert_eq!(power.children[1].text, "^");
    }

    #[test]
    fn precedence_orders_sum_below_comparison() {
        let tree = parse("programa P inicio x = 1 + 2 < 3; fin");
        let block = &tree.children[1].children[0];
        let assign = &block.children[0].children[0];
        let cmp = &assign.children[1];
        assert_eq!(cmp.text, "<");
        assert_eq!(cmp.children[0].text, "+");
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        let result = Parser::parse_source("programa P inicio entero x = 1 fin");
        assert!(result.is_err());
    }
}
