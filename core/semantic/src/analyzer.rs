//! Semantic analyzer.
//!
//! One depth-first pass over the AST in source order, maintaining the scope
//! stack and accumulating diagnostics. The analyzer never aborts: recoverable
//! conditions emit a diagnostic and analysis continues with a fallback
//! (`entero` for unresolved variables and functions).
//!
//! Scope discipline: every block pushes a scope; a function definition first
//! registers itself in the enclosing scope (recursion works), then pushes a
//! scope for its parameters, with the body block nested inside. Popping a
//! scope inspects its variables for unused / assigned-never-read warnings;
//! when the whole program has been walked, functions never present in the
//! called-function set are reported as defined-but-never-called.

use rustc_hash::FxHashSet;

use tiza_ast::nodes::{
    Assignment, BinaryOperator, Block, CallExpression, Declaration, Expression, ForInit, Program,
    ReturnStatement, Statement, Ty,
};

use crate::diagnostics::{Line, SemanticError, SemanticWarning};
use crate::symbol_table::{FuncInfo, Scope, SymbolTable, VarInfo};

/// Ordered diagnostics of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<SemanticWarning>,
}

impl Analysis {
    /// IR generation only proceeds when this holds.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct SemanticAnalyzer {
    table: SymbolTable,
    current_function_return: Option<Ty>,
    called_functions: FxHashSet<String>,
    has_return: bool,
    errors: Vec<SemanticError>,
    warnings: Vec<SemanticWarning>,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            current_function_return: None,
            called_functions: FxHashSet::default(),
            has_return: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Runs a full analysis and returns the collected diagnostics.
    #[must_use]
    pub fn analyze(program: &Program) -> Analysis {
        let mut analyzer = Self::new();
        analyzer.run(program);
        analyzer.into_analysis()
    }

    pub fn run(&mut self, program: &Program) {
        for global in &program.globals {
            self.analyze_declaration(global);
        }
        for function in &program.functions {
            self.analyze_function(function);
        }
        self.analyze_block(&program.block);
        self.report_uncalled_functions();
    }

    #[must_use]
    pub fn into_analysis(self) -> Analysis {
        Analysis {
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    /// Whether the most recently analyzed function contained a `ret`.
    ///
    /// Tracked but deliberately not reported as an error.
    #[must_use]
    pub fn last_function_returned(&self) -> bool {
        self.has_return
    }

    /// A statement guarantees return iff it is a `ret`, an `si` whose both
    /// branches guarantee return, or a block containing a guaranteeing
    /// statement. Loops never contribute.
    #[must_use]
    pub fn guaranteed_return(statement: &Statement) -> bool {
        match statement {
            Statement::Return(_) => true,
            Statement::If(if_stmt) => {
                Self::guaranteed_return(&if_stmt.then_branch)
                    && if_stmt
                        .else_branch
                        .as_ref()
                        .is_some_and(Self::guaranteed_return)
            }
            Statement::Block(block) => block.statements.iter().any(Self::guaranteed_return),
            Statement::Declaration(_)
            | Statement::Assignment(_)
            | Statement::Print(_)
            | Statement::While(_)
            | Statement::DoWhile(_)
            | Statement::For(_)
            | Statement::Call(_) => false,
        }
    }

    fn analyze_function(&mut self, function: &tiza_ast::nodes::Function) {
        self.has_return = false;
        let line = function.location.line;
        if self.table.current_scope_mut().has_function(&function.name) {
            self.errors.push(SemanticError::FunctionRedefinition {
                name: function.name.clone(),
                line: Line::from(function.location),
            });
        }
        let params: Vec<(String, Ty)> = function
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.ty))
            .collect();
        self.table.current_scope_mut().insert_function(
            &function.name,
            FuncInfo {
                return_type: function.return_type,
                params,
                line,
            },
        );

        self.current_function_return = Some(function.return_type);
        self.table.push_scope();
        for parameter in &function.parameters {
            self.declare_variable(&parameter.name, parameter.ty, parameter.location.line);
        }
        self.analyze_block(&function.body);
        let scope = self.table.pop_scope();
        self.report_scope_warnings(&scope);
        self.current_function_return = None;
    }

    fn analyze_block(&mut self, block: &Block) {
        self.table.push_scope();
        for statement in &block.statements {
            self.analyze_statement(statement);
        }
        let scope = self.table.pop_scope();
        self.report_scope_warnings(&scope);
    }

    fn analyze_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Declaration(declaration) => self.analyze_declaration(declaration),
            Statement::Assignment(assignment) => {
                self.analyze_assignment(assignment);
            }
            Statement::Print(print) => {
                for argument in &print.arguments {
                    self.infer_expression(argument);
                }
            }
            Statement::If(if_stmt) => {
                self.infer_expression(&if_stmt.condition);
                self.analyze_statement(&if_stmt.then_branch);
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.analyze_statement(else_branch);
                }
            }
            Statement::While(while_stmt) => {
                self.infer_expression(&while_stmt.condition);
                self.analyze_statement(&while_stmt.body);
            }
            Statement::DoWhile(do_while) => {
                self.analyze_statement(&do_while.body);
                self.infer_expression(&do_while.condition);
            }
            Statement::For(for_stmt) => {
                match &for_stmt.init {
                    Some(ForInit::Declaration(declaration)) => {
                        self.analyze_declaration(declaration);
                    }
                    Some(ForInit::Expression(expression)) => {
                        self.infer_expression(expression);
                    }
                    None => {}
                }
                if let Some(condition) = &for_stmt.condition {
                    self.infer_expression(condition);
                }
                if let Some(update) = &for_stmt.update {
                    self.infer_expression(update);
                }
                self.analyze_statement(&for_stmt.body);
            }
            Statement::Return(ret) => self.analyze_return(ret),
            Statement::Call(call) => {
                self.check_call(call);
            }
            Statement::Block(block) => self.analyze_block(block),
        }
    }

    fn analyze_declaration(&mut self, declaration: &Declaration) {
        let init_ty = declaration
            .init
            .as_ref()
            .map(|init| self.infer_expression(init));

        let ty = if declaration.ty == Ty::Inferred {
            // The resolved type is the initializer's; `var` requires one.
            init_ty.unwrap_or(Ty::Int32)
        } else {
            if let Some(found) = init_ty {
                if found != declaration.ty {
                    self.errors.push(SemanticError::InitTypeMismatch {
                        name: declaration.name.clone(),
                        declared: declaration.ty,
                        found,
                        line: Line::from(declaration.location),
                    });
                }
            }
            declaration.ty
        };

        self.declare_variable(&declaration.name, ty, declaration.location.line);
        if declaration.init.is_some() {
            if let Some(info) = self.table.lookup_variable_mut(&declaration.name) {
                info.assigned = true;
            }
        }
    }

    fn declare_variable(&mut self, name: &str, ty: Ty, line: u32) {
        if self.table.declared_in_current(name) {
            self.errors.push(SemanticError::Redeclaration {
                name: name.to_string(),
                line: Line(Some(line)),
            });
        } else if self.table.shadows_outer(name) {
            self.warnings.push(SemanticWarning::Shadowing {
                name: name.to_string(),
                line: Line(Some(line)),
            });
        }
        self.table
            .current_scope_mut()
            .insert_variable(name, VarInfo::new(ty, line));
    }

    /// Checks the value against the target and marks the target assigned.
    /// Target resolution does not mark the variable as read.
    fn analyze_assignment(&mut self, assignment: &Assignment) -> Ty {
        let found = self.infer_expression(&assignment.value);
        let Some(info) = self.table.lookup_variable_mut(&assignment.name) else {
            self.errors.push(SemanticError::UndeclaredVariable {
                name: assignment.name.clone(),
                line: Line::from(assignment.location),
            });
            return Ty::Int32;
        };
        let expected = info.ty;
        info.assigned = true;
        if expected != found {
            self.errors.push(SemanticError::AssignTypeMismatch {
                name: assignment.name.clone(),
                expected,
                found,
                line: Line::from(assignment.location),
            });
        }
        expected
    }

    fn analyze_return(&mut self, ret: &ReturnStatement) {
        self.has_return = true;
        let found = ret
            .value
            .as_ref()
            .map_or(Ty::Void, |value| self.infer_expression(value));
        match self.current_function_return {
            None => self.errors.push(SemanticError::ReturnOutsideFunction {
                line: Line::from(ret.location),
            }),
            Some(expected) => {
                if found != expected {
                    self.errors.push(SemanticError::ReturnTypeMismatch {
                        expected,
                        found,
                        line: Line::from(ret.location),
                    });
                }
            }
        }
    }

    /// Expression type inference; always lands on one of the five primitives.
    fn infer_expression(&mut self, expression: &Expression) -> Ty {
        match expression {
            Expression::Number(number) => match number.value {
                tiza_ast::nodes::NumberValue::Int(_) => Ty::Int32,
                tiza_ast::nodes::NumberValue::Float(_) => Ty::Float64,
            },
            Expression::Bool(_) => Ty::Bool,
            Expression::Str(_) => Ty::String,
            Expression::Variable(identifier) => self.resolve_variable(identifier),
            Expression::Unary(unary) => self.infer_expression(&unary.operand),
            Expression::Binary(binary) => {
                let left = self.infer_expression(&binary.left);
                let right = self.infer_expression(&binary.right);
                if binary.op.is_comparison() {
                    Ty::Bool
                } else if binary.op == BinaryOperator::Add
                    && left == Ty::String
                    && right == Ty::String
                {
                    Ty::String
                } else if left == Ty::Float64 || right == Ty::Float64 {
                    Ty::Float64
                } else {
                    Ty::Int32
                }
            }
            Expression::Call(call) => self.check_call(call),
            Expression::Assign(assignment) => self.analyze_assignment(assignment),
        }
    }

    /// Nearest-enclosing resolution; reading a variable marks it `read`.
    fn resolve_variable(&mut self, identifier: &tiza_ast::nodes::Identifier) -> Ty {
        if let Some(info) = self.table.lookup_variable_mut(&identifier.name) {
            info.read = true;
            return info.ty;
        }
        self.errors.push(SemanticError::UndeclaredVariable {
            name: identifier.name.clone(),
            line: Line::from(identifier.location),
        });
        Ty::Int32
    }

    /// Records the call, then verifies arity and per-argument types.
    fn check_call(&mut self, call: &CallExpression) -> Ty {
        self.called_functions.insert(call.name.clone());
        let Some(info) = self.table.lookup_function(&call.name) else {
            self.errors.push(SemanticError::UndefinedFunction {
                name: call.name.clone(),
                line: Line::from(call.location),
            });
            return Ty::Int32;
        };
        let return_type = info.return_type;
        let params = info.params.clone();

        if call.arguments.len() != params.len() {
            self.errors.push(SemanticError::ArityMismatch {
                name: call.name.clone(),
                expected: params.len(),
                found: call.arguments.len(),
                line: Line::from(call.location),
            });
            return return_type;
        }

        for (index, (argument, (_, expected))) in
            call.arguments.iter().zip(params.iter()).enumerate()
        {
            let found = self.infer_expression(argument);
            if found != *expected {
                self.errors.push(SemanticError::ArgumentTypeMismatch {
                    name: call.name.clone(),
                    index: index + 1,
                    expected: *expected,
                    found,
                    line: Line::from(argument.location()),
                });
            }
        }
        return_type
    }

    fn report_scope_warnings(&mut self, scope: &Scope) {
        for (name, info) in scope.variables_in_order() {
            if !info.read && !info.assigned {
                self.warnings.push(SemanticWarning::UnusedVariable {
                    name: name.to_string(),
                    line: Line(Some(info.line)),
                });
            } else if info.assigned && !info.read {
                self.warnings.push(SemanticWarning::AssignedNeverRead {
                    name: name.to_string(),
                    line: Line(Some(info.line)),
                });
            }
        }
    }

    fn report_uncalled_functions(&mut self) {
        let uncalled: Vec<(String, u32)> = self
            .table
            .global_scope()
            .functions_in_order()
            .filter(|(name, _)| !self.called_functions.contains(*name))
            .map(|(name, info)| (name.to_string(), info.line))
            .collect();
        for (name, line) in uncalled {
            self.warnings.push(SemanticWarning::UncalledFunction {
                name,
                line: Line(Some(line)),
            });
        }
    }
}
