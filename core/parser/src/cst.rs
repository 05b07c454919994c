//! Concrete parse tree.
//!
//! The parser produces a rule-tagged node tree; every downstream consumer
//! dispatches on [`Rule`] with exhaustive matching. Terminal-bearing nodes
//! (numbers, strings, identifiers, type names, operators) carry the token
//! text; pure rule nodes carry only children. Each node records the location
//! of its starting token.

use crate::token::Location;

/// One variant per grammar production plus the terminal kinds the tree keeps.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rule {
    Program,
    GlobalDecl,
    TypedDecl,
    InferredDecl,
    Functions,
    FunctionDef,
    Params,
    Param,
    ProgramBlock,
    Block,

    PrintStmt,
    IfStmt,
    WhileStmt,
    DoWhileStmt,
    ForStmt,
    ReturnStmt,
    ExprStmt,

    Assign,
    Binary,
    Unary,
    Call,
    Args,
    Paren,

    Number,
    BoolLit,
    Text,
    Ident,
    TypeName,

    /// Placeholder for an omitted optional slot (e.g. a `para` header part).
    Empty,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseNode {
    pub rule: Rule,
    pub location: Location,
    /// Token text for terminal nodes and the operator spelling for
    /// `Binary`/`Unary`; empty otherwise.
    pub text: String,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    #[must_use]
    pub fn new(rule: Rule, location: Location, children: Vec<ParseNode>) -> Self {
        Self {
            rule,
            location,
            text: String::new(),
            children,
        }
    }

    #[must_use]
    pub fn terminal(rule: Rule, location: Location, text: impl Into<String>) -> Self {
        Self {
            rule,
            location,
            text: text.into(),
            children: vec![],
        }
    }

    #[must_use]
    pub fn operator(
        rule: Rule,
        location: Location,
        text: impl Into<String>,
        children: Vec<ParseNode>,
    ) -> Self {
        Self {
            rule,
            location,
            text: text.into(),
            children,
        }
    }

    #[must_use]
    pub fn empty(location: Location) -> Self {
        Self::new(Rule::Empty, location, vec![])
    }

    #[must_use]
    pub fn is_empty_slot(&self) -> bool {
        self.rule == Rule::Empty
    }
}
