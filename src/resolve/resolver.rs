//! Name resolution pass

use std::mem;

use indexmap::IndexMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Resolution;
use crate::ast::*;
use crate::common::NodeId;

/// Resolution error
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Can't read local variable in its own initializer.")]
    #[diagnostic(code(resolve::own_initializer))]
    ReadInOwnInitializer { name: Token },

    #[error("Already a variable with this name in this scope.")]
    #[diagnostic(
        code(resolve::duplicate_local),
        help("assign to the existing variable instead of declaring it again")
    )]
    AlreadyDeclared { name: Token },

    #[error("Can't return from top-level code.")]
    #[diagnostic(code(resolve::top_level_return))]
    TopLevelReturn { keyword: Token },
}

impl ResolveError {
    pub fn token(&self) -> &Token {
        match self {
            ResolveError::ReadInOwnInitializer { name } | ResolveError::AlreadyDeclared { name } => {
                name
            }
            ResolveError::TopLevelReturn { keyword } => keyword,
        }
    }

    pub fn line(&self) -> u32 {
        self.token().line
    }
}

/// Every error found in one resolution pass
#[derive(Error, Debug, Diagnostic)]
#[error("{} resolution error(s)", .errors.len())]
#[diagnostic(code(resolve::failed))]
pub struct ResolveErrors {
    #[related]
    pub errors: Vec<ResolveError>,
}

/// Resolver knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Give local scopes slotted frames. When off, only distances are
    /// recorded and every scope falls back to named storage.
    pub slots: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self { slots: true }
    }
}

/// Resolve a program with default options
pub fn resolve(statements: &[Stmt]) -> Result<Resolution, ResolveErrors> {
    Resolver::new(ResolverOptions::default()).resolve(statements)
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    slot: usize,
    defined: bool,
}

#[derive(Debug, Default)]
struct Scope {
    bindings: IndexMap<String, Binding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
}

/// Name resolver
pub struct Resolver {
    options: ResolverOptions,
    /// Local scopes, innermost last; the global scope is never pushed
    scopes: Vec<Scope>,
    function: FunctionKind,
    resolution: Resolution,
    errors: Vec<ResolveError>,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            scopes: Vec::new(),
            function: FunctionKind::None,
            resolution: Resolution::new(),
            errors: Vec::new(),
        }
    }

    /// Resolve all statements of a program
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Resolution, ResolveErrors> {
        self.resolve_stmts(statements);

        if !self.errors.is_empty() {
            tracing::debug!(errors = self.errors.len(), "resolution failed");
            return Err(ResolveErrors {
                errors: self.errors,
            });
        }
        Ok(self.resolution)
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block { id, statements } => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope(*id);
            }
            Stmt::Var {
                id,
                name,
                initializer,
            } => {
                let slot = self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(name);
                self.record_declaration(*id, slot);
            }
            Stmt::Function { id, decl } => {
                let slot = self.declare(&decl.name);
                self.define(&decl.name);
                self.record_declaration(*id, slot);
                self.resolve_function(*id, decl);
            }
            Stmt::Expression { expr, .. } | Stmt::Print { expr, .. } => self.resolve_expr(expr),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            Stmt::Return { keyword, value, .. } => {
                if self.function == FunctionKind::None {
                    self.errors.push(ResolveError::TopLevelReturn {
                        keyword: keyword.clone(),
                    });
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
        }
    }

    /// Parameters and the body share one scope, matching the single frame
    /// a call creates
    fn resolve_function(&mut self, id: NodeId, decl: &FunctionDecl) {
        let enclosing = mem::replace(&mut self.function, FunctionKind::Function);

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope(id);

        self.function = enclosing;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Grouping { expr, .. } => self.resolve_expr(expr),
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Variable { id, name } => {
                let uninitialized = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.bindings.get(&name.lexeme))
                    .is_some_and(|binding| !binding.defined);
                if uninitialized {
                    self.errors.push(ResolveError::ReadInOwnInitializer { name: name.clone() });
                }
                self.resolve_local(*id, name);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
        }
    }

    fn resolve_local(&mut self, expr: NodeId, name: &Token) {
        let depth = self.scopes.len();
        for (i, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(binding) = scope.bindings.get(&name.lexeme) {
                self.resolution.resolve_local(expr, depth - 1 - i, binding.slot);
                return;
            }
        }
        // Not found locally: global, looked up by name at run time
    }

    fn begin_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn end_scope(&mut self, owner: NodeId) {
        if let Some(scope) = self.scopes.pop() {
            if self.options.slots {
                self.resolution.resolve_frame(owner, scope.bindings.len());
            }
        }
    }

    /// Reserve the next slot of the innermost scope; `None` at global scope
    fn declare(&mut self, name: &Token) -> Option<usize> {
        let scope = self.scopes.last_mut()?;
        if let Some(existing) = scope.bindings.get(&name.lexeme) {
            let slot = existing.slot;
            self.errors.push(ResolveError::AlreadyDeclared { name: name.clone() });
            return Some(slot);
        }
        let slot = scope.bindings.len();
        scope.bindings.insert(
            name.lexeme.clone(),
            Binding {
                slot,
                defined: false,
            },
        );
        Some(slot)
    }

    fn define(&mut self, name: &Token) {
        if let Some(binding) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.bindings.get_mut(&name.lexeme))
        {
            binding.defined = true;
        }
    }

    fn record_declaration(&mut self, stmt: NodeId, slot: Option<usize>) {
        if let (true, Some(slot)) = (self.options.slots, slot) {
            self.resolution.resolve_declaration(stmt, slot);
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::LocalSlot;

    fn local(distance: usize, slot: usize) -> Option<LocalSlot> {
        Some(LocalSlot { distance, slot })
    }

    #[test]
    fn globals_stay_unresolved() {
        let b = Builder::new();
        let read = b.var("a");
        let read_id = read.id();
        let program = vec![b.var_decl("a", Some(b.number(1.0))), b.print(read)];

        let tables = resolve(&program).expect("resolves");
        assert!(tables.local(read_id).is_none());
        assert!(tables.declaration_slot(program[0].id()).is_none());
    }

    #[test]
    fn block_locals_get_sequential_slots() {
        let b = Builder::new();
        let read_b = b.var("b");
        let read_id = read_b.id();
        let block = b.block(vec![
            b.var_decl("a", Some(b.number(1.0))),
            b.var_decl("b", Some(b.number(2.0))),
            b.print(read_b),
        ]);
        let block_id = block.id();
        let Stmt::Block { statements, .. } = &block else {
            unreachable!()
        };
        let (a_id, b_id) = (statements[0].id(), statements[1].id());

        let tables = resolve(std::slice::from_ref(&block)).expect("resolves");
        assert_eq!(tables.frame_size(block_id), Some(2));
        assert_eq!(tables.declaration_slot(a_id), Some(0));
        assert_eq!(tables.declaration_slot(b_id), Some(1));
        assert_eq!(tables.local(read_id), local(0, 1));
    }

    #[test]
    fn distance_counts_enclosing_scopes() {
        let b = Builder::new();
        let read = b.var("outer");
        let read_id = read.id();
        let program = vec![b.block(vec![
            b.var_decl("outer", Some(b.number(1.0))),
            b.block(vec![b.block(vec![b.print(read)])]),
        ])];

        let tables = resolve(&program).expect("resolves");
        assert_eq!(tables.local(read_id), local(2, 0));
    }

    #[test]
    fn params_share_the_body_scope() {
        let b = Builder::new();
        let read_x = b.var("x");
        let read_tmp = b.var("tmp");
        let (x_id, tmp_id) = (read_x.id(), read_tmp.id());
        let fun = b.function(
            "f",
            &["x", "y"],
            vec![
                b.var_decl("tmp", Some(read_x)),
                b.return_stmt(Some(read_tmp)),
            ],
        );
        let fun_id = fun.id();

        let tables = resolve(&[fun]).expect("resolves");
        assert_eq!(tables.frame_size(fun_id), Some(3));
        assert_eq!(tables.local(x_id), local(0, 0));
        assert_eq!(tables.local(tmp_id), local(0, 2));
    }

    #[test]
    fn without_slots_only_distances_are_recorded() {
        let b = Builder::new();
        let read = b.var("a");
        let read_id = read.id();
        let block = b.block(vec![b.var_decl("a", None), b.print(read)]);
        let block_id = block.id();

        let tables = Resolver::new(ResolverOptions { slots: false })
            .resolve(&[block])
            .expect("resolves");
        assert!(tables.frame_size(block_id).is_none());
        assert!(tables.declarations().is_empty());
        assert_eq!(tables.local(read_id), local(0, 0));
    }

    #[test]
    fn reports_every_error() {
        let b = Builder::new();
        let program = vec![
            b.return_stmt(None),
            b.block(vec![
                b.var_decl("a", None),
                b.var_decl("a", None),
                b.var_decl("c", Some(b.var("c"))),
            ]),
        ];

        let err = resolve(&program).unwrap_err();
        let messages: Vec<_> = err.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "Can't return from top-level code.",
                "Already a variable with this name in this scope.",
                "Can't read local variable in its own initializer.",
            ]
        );
    }
}
