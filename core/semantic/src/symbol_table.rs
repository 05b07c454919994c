//! Symbol table: a growable stack of owned scope records.
//!
//! Each scope holds a variable map and a function map. The current scope is
//! the last element; lookups walk from newest to oldest. Insertion order is
//! tracked separately so scope-pop inspection reports in declaration order.

use rustc_hash::FxHashMap;

use tiza_ast::nodes::Ty;

#[derive(Debug, Clone)]
pub struct VarInfo {
    pub ty: Ty,
    /// Line of the declaration; warnings point here.
    pub line: u32,
    pub assigned: bool,
    pub read: bool,
}

impl VarInfo {
    #[must_use]
    pub fn new(ty: Ty, line: u32) -> Self {
        Self {
            ty,
            line,
            assigned: false,
            read: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FuncInfo {
    pub return_type: Ty,
    pub params: Vec<(String, Ty)>,
    pub line: u32,
}

#[derive(Debug, Default)]
pub struct Scope {
    variables: FxHashMap<String, VarInfo>,
    var_order: Vec<String>,
    functions: FxHashMap<String, FuncInfo>,
    fn_order: Vec<String>,
}

impl Scope {
    #[must_use]
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Inserts or replaces; redeclaration reporting is the analyzer's job.
    pub fn insert_variable(&mut self, name: &str, info: VarInfo) {
        if self.variables.insert(name.to_string(), info).is_none() {
            self.var_order.push(name.to_string());
        }
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut VarInfo> {
        self.variables.get_mut(name)
    }

    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn insert_function(&mut self, name: &str, info: FuncInfo) {
        if self.functions.insert(name.to_string(), info).is_none() {
            self.fn_order.push(name.to_string());
        }
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FuncInfo> {
        self.functions.get(name)
    }

    /// Variables in declaration order, for pop-time inspection.
    pub fn variables_in_order(&self) -> impl Iterator<Item = (&str, &VarInfo)> {
        self.var_order
            .iter()
            .filter_map(|name| self.variables.get(name).map(|info| (name.as_str(), info)))
    }

    /// Functions in definition order.
    pub fn functions_in_order(&self) -> impl Iterator<Item = (&str, &FuncInfo)> {
        self.fn_order
            .iter()
            .filter_map(|name| self.functions.get(name).map(|info| (name.as_str(), info)))
    }
}

/// The scope stack. The bottom is the global scope and exists for the whole
/// compilation; blocks and functions push and pop around it.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pops and returns the current scope so the caller can inspect it.
    ///
    /// # Panics
    ///
    /// Panics if the global scope would be popped.
    pub fn pop_scope(&mut self) -> Scope {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop().unwrap()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_scope_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("global scope always present")
    }

    #[must_use]
    pub fn global_scope(&self) -> &Scope {
        self.scopes.first().expect("global scope always present")
    }

    #[must_use]
    pub fn declared_in_current(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.has_variable(name))
    }

    /// Whether an outer (non-current) scope already declares `name`.
    #[must_use]
    pub fn shadows_outer(&self, name: &str) -> bool {
        self.scopes[..self.scopes.len() - 1]
            .iter()
            .any(|scope| scope.has_variable(name))
    }

    /// Nearest-enclosing lookup, newest scope first.
    pub fn lookup_variable_mut(&mut self, name: &str) -> Option<&mut VarInfo> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.variable_mut(name))
    }

    #[must_use]
    pub fn lookup_function(&self, name: &str) -> Option<&FuncInfo> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.function(name))
    }
}
