//! AST builder that converts the concrete parse tree into typed AST nodes.
//!
//! Each parse rule has exactly one transformer. The builder collects errors
//! instead of stopping at the first one; if any were found, `build` reports
//! them and fails. Numeric literals are classified by their textual form (a
//! `.` makes the literal floating), `verdad` is the only true spelling, and
//! string literals lose their surrounding quotes but keep their bytes.

use std::rc::Rc;

use tiza_parser::{ParseNode, Rule};

use crate::nodes::{
    Assignment, BinaryExpression, BinaryOperator, Block, BoolLiteral, CallExpression, Declaration,
    DoWhileStatement, Expression, ForInit, ForStatement, Function, Identifier, IfStatement,
    Location, NumberLiteral, NumberValue, Parameter, PrintStatement, Program, ReturnStatement,
    Statement, StringLiteral, Ty, UnaryExpression, UnaryOperator, WhileStatement,
};

#[derive(Default)]
pub struct Builder {
    errors: Vec<anyhow::Error>,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self { errors: vec![] }
    }

    /// Builds the typed AST from a `Program` parse node.
    ///
    /// # Errors
    ///
    /// Returns an error when the tree is malformed; all collected problems
    /// are reported before failing.
    pub fn build(mut self, root: &ParseNode) -> anyhow::Result<Program> {
        let program = self.build_program(root);
        if !self.errors.is_empty() {
            for err in &self.errors {
                eprintln!("AST Builder Error: {err}");
            }
            return Err(anyhow::anyhow!("AST building failed due to errors"));
        }
        Ok(program)
    }

    fn error(&mut self, location: Location, message: impl Into<String>) {
        self.errors
            .push(anyhow::anyhow!("{location}: {}", message.into()));
    }

    fn fallback_expression(location: Location) -> Expression {
        Expression::Number(Rc::new(NumberLiteral {
            location,
            value: NumberValue::Int(0),
        }))
    }

    fn build_program(&mut self, node: &ParseNode) -> Program {
        let mut name = String::new();
        let mut globals = vec![];
        let mut functions = vec![];
        let mut block = Rc::new(Block {
            location: node.location,
            statements: vec![],
        });

        for child in &node.children {
            match child.rule {
                Rule::Ident => name = child.text.clone(),
                Rule::GlobalDecl => globals.push(Rc::new(self.build_declaration(child))),
                Rule::Functions => functions = self.build_functions(child),
                Rule::ProgramBlock => block = Rc::new(self.build_program_block(child)),
                _ => self.error(child.location, format!("unexpected {:?} in program", child.rule)),
            }
        }

        Program {
            location: node.location,
            name,
            globals,
            functions,
            block,
        }
    }

    /// `GlobalDecl` and `TypedDecl` share one shape: type, name, optional
    /// initializer. `InferredDecl` has no type child and always initializes.
    fn build_declaration(&mut self, node: &ParseNode) -> Declaration {
        if node.rule == Rule::InferredDecl {
            let name = node.children[0].text.clone();
            let init = node.children.get(1).map(|c| self.build_expression(c));
            return Declaration {
                location: node.location,
                ty: Ty::Inferred,
                name,
                init,
            };
        }
        let ty = self.build_type(&node.children[0]);
        let name = node.children[1].text.clone();
        let init = node.children.get(2).map(|c| self.build_expression(c));
        Declaration {
            location: node.location,
            ty,
            name,
            init,
        }
    }

    fn build_type(&mut self, node: &ParseNode) -> Ty {
        match Ty::from_keyword(&node.text) {
            Some(ty) => ty,
            None => {
                self.error(node.location, format!("unknown type `{}`", node.text));
                Ty::Int32
            }
        }
    }

    fn build_functions(&mut self, node: &ParseNode) -> Vec<Rc<Function>> {
        node.children
            .iter()
            .map(|child| Rc::new(self.build_function_def(child)))
            .collect()
    }

    fn build_function_def(&mut self, node: &ParseNode) -> Function {
        let return_type = self.build_type(&node.children[0]);
        let name = node.children[1].text.clone();
        let mut parameters = vec![];
        let mut body = Rc::new(Block {
            location: node.location,
            statements: vec![],
        });
        for child in &node.children[2..] {
            match child.rule {
                Rule::Params => {
                    parameters = child
                        .children
                        .iter()
                        .map(|p| Rc::new(self.build_param(p)))
                        .collect();
                }
                Rule::Block => body = Rc::new(self.build_block(child)),
                _ => self.error(
                    child.location,
                    format!("unexpected {:?} in function definition", child.rule),
                ),
            }
        }
        Function {
            location: node.location,
            return_type,
            name,
            parameters,
            body,
        }
    }

    fn build_param(&mut self, node: &ParseNode) -> Parameter {
        Parameter {
            location: node.location,
            ty: self.build_type(&node.children[0]),
            name: node.children[1].text.clone(),
        }
    }

    fn build_program_block(&mut self, node: &ParseNode) -> Block {
        self.build_block(&node.children[0])
    }

    fn build_block(&mut self, node: &ParseNode) -> Block {
        let statements = node
            .children
            .iter()
            .map(|child| self.build_statement(child))
            .collect();
        Block {
            location: node.location,
            statements,
        }
    }

    fn build_statement(&mut self, node: &ParseNode) -> Statement {
        match node.rule {
            Rule::TypedDecl | Rule::InferredDecl | Rule::GlobalDecl => {
                Statement::Declaration(Rc::new(self.build_declaration(node)))
            }
            Rule::PrintStmt => Statement::Print(Rc::new(self.build_print(node))),
            Rule::IfStmt => Statement::If(Rc::new(self.build_if(node))),
            Rule::WhileStmt => Statement::While(Rc::new(self.build_while(node))),
            Rule::DoWhileStmt => Statement::DoWhile(Rc::new(self.build_do_while(node))),
            Rule::ForStmt => Statement::For(Rc::new(self.build_for(node))),
            Rule::ReturnStmt => Statement::Return(Rc::new(self.build_return(node))),
            Rule::Block => Statement::Block(Rc::new(self.build_block(node))),
            Rule::ExprStmt => self.build_expression_statement(node),
            _ => {
                self.error(
                    node.location,
                    format!("unexpected {:?} in statement position", node.rule),
                );
                Statement::Block(Rc::new(Block {
                    location: node.location,
                    statements: vec![],
                }))
            }
        }
    }

    fn build_print(&mut self, node: &ParseNode) -> PrintStatement {
        let arguments = node
            .children
            .first()
            .map(|args| self.build_args(args))
            .unwrap_or_default();
        PrintStatement {
            location: node.location,
            arguments,
        }
    }

    fn build_if(&mut self, node: &ParseNode) -> IfStatement {
        IfStatement {
            location: node.location,
            condition: self.build_expression(&node.children[0]),
            then_branch: self.build_statement(&node.children[1]),
            else_branch: node.children.get(2).map(|c| self.build_statement(c)),
        }
    }

    fn build_while(&mut self, node: &ParseNode) -> WhileStatement {
        WhileStatement {
            location: node.location,
            condition: self.build_expression(&node.children[0]),
            body: self.build_statement(&node.children[1]),
        }
    }

    fn build_do_while(&mut self, node: &ParseNode) -> DoWhileStatement {
        DoWhileStatement {
            location: node.location,
            body: self.build_statement(&node.children[0]),
            condition: self.build_expression(&node.children[1]),
        }
    }

    fn build_for(&mut self, node: &ParseNode) -> ForStatement {
        let init_node = &node.children[0];
        let init = match init_node.rule {
            Rule::Empty => None,
            Rule::TypedDecl | Rule::InferredDecl => Some(ForInit::Declaration(Rc::new(
                self.build_declaration(init_node),
            ))),
            _ => Some(ForInit::Expression(self.build_expression(init_node))),
        };
        let condition = (!node.children[1].is_empty_slot())
            .then(|| self.build_expression(&node.children[1]));
        let update = (!node.children[2].is_empty_slot())
            .then(|| self.build_expression(&node.children[2]));
        ForStatement {
            location: node.location,
            init,
            condition,
            update,
            body: self.build_statement(&node.children[3]),
        }
    }

    fn build_return(&mut self, node: &ParseNode) -> ReturnStatement {
        ReturnStatement {
            location: node.location,
            value: node.children.first().map(|c| self.build_expression(c)),
        }
    }

    /// Only assignments and function calls stand alone as statements.
    fn build_expression_statement(&mut self, node: &ParseNode) -> Statement {
        let expression = self.build_expression(&node.children[0]);
        match expression {
            Expression::Assign(assignment) => Statement::Assignment(assignment),
            Expression::Call(call) => Statement::Call(call),
            other => {
                self.error(
                    other.location(),
                    "only assignments and function calls can be used as statements",
                );
                Statement::Block(Rc::new(Block {
                    location: node.location,
                    statements: vec![],
                }))
            }
        }
    }

    fn build_args(&mut self, node: &ParseNode) -> Vec<Expression> {
        node.children
            .iter()
            .map(|child| self.build_expression(child))
            .collect()
    }

    fn build_expression(&mut self, node: &ParseNode) -> Expression {
        match node.rule {
            Rule::Number => self.build_number(node),
            Rule::BoolLit => Expression::Bool(Rc::new(BoolLiteral {
                location: node.location,
                value: node.text == "verdad",
            })),
            Rule::Text => Expression::Str(Rc::new(self.build_string(node))),
            Rule::Ident => Expression::Variable(Rc::new(Identifier {
                location: node.location,
                name: node.text.clone(),
            })),
            Rule::Binary => self.build_binary(node),
            Rule::Unary => self.build_unary(node),
            Rule::Assign => Expression::Assign(Rc::new(self.build_assignment(node))),
            Rule::Call => self.build_call(node),
            Rule::Paren => self.build_expression(&node.children[0]),
            _ => {
                self.error(
                    node.location,
                    format!("unexpected {:?} in expression position", node.rule),
                );
                Self::fallback_expression(node.location)
            }
        }
    }

    fn build_number(&mut self, node: &ParseNode) -> Expression {
        let value = if node.text.contains('.') {
            node.text.parse::<f64>().map(NumberValue::Float).ok()
        } else {
            node.text.parse::<i64>().map(NumberValue::Int).ok()
        };
        match value {
            Some(value) => Expression::Number(Rc::new(NumberLiteral {
                location: node.location,
                value,
            })),
            None => {
                self.error(
                    node.location,
                    format!("invalid numeric literal `{}`", node.text),
                );
                Self::fallback_expression(node.location)
            }
        }
    }

    /// Strips the surrounding quotes; no escape processing, the bytes pass
    /// through to the IR untouched.
    fn build_string(&mut self, node: &ParseNode) -> StringLiteral {
        let mut value = node.text.clone();
        if value.len() >= 2 {
            value.remove(0);
            value.pop();
        } else {
            self.error(node.location, "malformed string literal");
            value.clear();
        }
        StringLiteral {
            location: node.location,
            value,
        }
    }

    fn build_binary(&mut self, node: &ParseNode) -> Expression {
        let left = self.build_expression(&node.children[0]);
        let right = self.build_expression(&node.children[1]);
        let Some(op) = BinaryOperator::from_symbol(&node.text) else {
            self.error(
                node.location,
                format!("unsupported binary operator `{}`", node.text),
            );
            return Self::fallback_expression(node.location);
        };
        Expression::Binary(Rc::new(BinaryExpression {
            location: node.location,
            left,
            op,
            right,
        }))
    }

    fn build_unary(&mut self, node: &ParseNode) -> Expression {
        let operand = self.build_expression(&node.children[0]);
        let Some(op) = UnaryOperator::from_symbol(&node.text) else {
            self.error(
                node.location,
                format!("unsupported unary operator `{}`", node.text),
            );
            return Self::fallback_expression(node.location);
        };
        Expression::Unary(Rc::new(UnaryExpression {
            location: node.location,
            op,
            operand,
        }))
    }

    fn build_assignment(&mut self, node: &ParseNode) -> Assignment {
        Assignment {
            location: node.location,
            name: node.children[0].text.clone(),
            value: self.build_expression(&node.children[1]),
        }
    }

    /// A `Call` node with a lone child carries no parenthesis group and is a
    /// plain primary: an identifier there is a variable reference. Argument
    /// lists are flattened across repeated groups.
    fn build_call(&mut self, node: &ParseNode) -> Expression {
        if node.children.len() == 1 {
            return self.build_expression(&node.children[0]);
        }
        let primary = &node.children[0];
        if primary.rule != Rule::Ident {
            self.error(
                primary.location,
                "called expression must be a function name",
            );
            return Self::fallback_expression(node.location);
        }
        let mut arguments = vec![];
        for group in &node.children[1..] {
            arguments.extend(self.build_args(group));
        }
        Expression::Call(Rc::new(CallExpression {
            location: node.location,
            name: primary.text.clone(),
            arguments,
        }))
    }
}
