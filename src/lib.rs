//! loxwalk: a tree-walking evaluator for Lox
//!
//! Executes already-parsed programs. Before running, a resolver pass
//! computes where each local variable lives, so the interpreter can reach
//! locals by (scope distance, slot index) instead of hashing names. Globals
//! keep name-based lookup.
//!
//! # Architecture
//!
//! ```text
//! AST (Builder / JSON) → Resolver → Resolution tables → Interpreter
//! ```
//!
//! # Example
//!
//! ```
//! use loxwalk::ast::Builder;
//! use loxwalk::interp::Interpreter;
//!
//! let b = Builder::new();
//! let program = vec![
//!     b.var_decl("a", Some(b.number(1.0))),
//!     b.function("f", &[], vec![b.print(b.var("a"))]),
//!     b.expr_stmt(b.assign("a", b.number(2.0))),
//!     b.expr_stmt(b.call(b.var("f"), vec![])),
//! ];
//!
//! let tables = loxwalk::resolve::resolve(&program).unwrap();
//! let mut interpreter = Interpreter::new().capture_output().with_resolution(tables);
//! interpreter.interpret(&program);
//! assert_eq!(interpreter.output(), ["2"]);
//! ```

pub mod ast;
pub mod common;
pub mod config;
pub mod diagnostics;
pub mod interp;
pub mod resolve;
pub mod stack;

// Re-exports for convenience
pub use ast::{Builder, Expr, Stmt};
pub use config::Config;
pub use diagnostics::{Reporter, RuntimeError};
pub use interp::{Interpreter, Value};
pub use resolve::{Resolution, Resolver, ResolverOptions};

/// Version of the evaluator
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve and run `statements` on a fresh interpreter built from `config`.
///
/// Runtime errors land in the returned interpreter's reporter.
pub fn run(statements: &[Stmt], config: &Config) -> Result<Interpreter, resolve::ResolveErrors> {
    let tables = Resolver::new(config.resolver).resolve(statements)?;
    let mut interpreter = Interpreter::with_config(&config.interpreter).with_resolution(tables);
    interpreter.interpret(statements);
    Ok(interpreter)
}

/// Load a JSON program, then resolve and run it
pub fn run_json(source: &str, config: &Config) -> miette::Result<Interpreter> {
    let mut ids = common::NodeIdGen::new();
    let statements = ast::load_json(source, &mut ids)
        .map_err(|e| miette::miette!("Invalid program: {}", e))?;
    Ok(run(&statements, config)?)
}
