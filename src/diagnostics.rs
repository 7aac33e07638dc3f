//! Runtime diagnostics
//!
//! Runtime errors carry the offending token so hosts can point at the
//! line that failed. They render through miette like every other
//! diagnostic the crate produces.

use crate::ast::Token;
use miette::Diagnostic;
use thiserror::Error;

/// Error raised while executing a program.
///
/// Raising one aborts the current `interpret` run; the interpreter hands
/// it to its [`Reporter`] instead of propagating it to the host.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined variable '{}'.", .name.lexeme)]
    #[diagnostic(
        code(runtime::undefined_variable),
        help("declare it with `var` before using it")
    )]
    UndefinedVariable { name: Token },

    #[error("Operand must be a number.")]
    #[diagnostic(code(runtime::operand_type))]
    OperandMustBeNumber { operator: Token },

    #[error("Operands must be numbers.")]
    #[diagnostic(code(runtime::operand_types))]
    OperandsMustBeNumbers { operator: Token },

    #[error("Operands must be two numbers or two strings.")]
    #[diagnostic(
        code(runtime::add_operands),
        help("`+` does not convert between numbers and strings")
    )]
    OperandsMustBeNumbersOrStrings { operator: Token },

    #[error("Can only call functions and classes.")]
    #[diagnostic(code(runtime::not_callable))]
    NotCallable { paren: Token },

    #[error("Expected {expected} arguments but got {got}.")]
    #[diagnostic(code(runtime::arity))]
    ArityMismatch {
        paren: Token,
        expected: usize,
        got: usize,
    },

    #[error("Stack overflow.")]
    #[diagnostic(
        code(runtime::stack_overflow),
        help("raise `interpreter.max_call_depth` if the recursion is intended")
    )]
    StackOverflow { paren: Token },
}

impl RuntimeError {
    /// The token the error is reported against
    pub fn token(&self) -> &Token {
        match self {
            RuntimeError::UndefinedVariable { name } => name,
            RuntimeError::OperandMustBeNumber { operator }
            | RuntimeError::OperandsMustBeNumbers { operator }
            | RuntimeError::OperandsMustBeNumbersOrStrings { operator } => operator,
            RuntimeError::NotCallable { paren }
            | RuntimeError::ArityMismatch { paren, .. }
            | RuntimeError::StackOverflow { paren } => paren,
        }
    }

    pub fn line(&self) -> u32 {
        self.token().line
    }
}

/// Host error sink: collects the runtime errors that aborted runs
#[derive(Debug, Default)]
pub struct Reporter {
    errors: Vec<RuntimeError>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runtime_error(&mut self, error: RuntimeError) {
        tracing::debug!(line = error.line(), "{}", error);
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Get errors by reference
    pub fn errors(&self) -> &[RuntimeError] {
        &self.errors
    }

    /// Forget reported errors, e.g. between REPL-style runs
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Print all diagnostics, each followed by the line it came from
    pub fn emit_all(&self) {
        for error in &self.errors {
            eprintln!("{:?}", miette::Report::new(error.clone()));
            eprintln!("[line {}]", error.line());
        }
    }
}
