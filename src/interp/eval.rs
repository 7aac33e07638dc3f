//! Tree-walking interpreter for resolved Lox programs

use std::io::Write;
use std::mem;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::ast::*;
use crate::common::NodeId;
use crate::config::InterpreterConfig;
use crate::diagnostics::{Reporter, RuntimeError};
use crate::resolve::{LocalSlot, Resolution};
use crate::stack::ensure_sufficient_stack;

use super::env::{EnvRef, Environment};
use super::function::{Callable, Closure, NativeFunction};
use super::value::{Flow, Value};

/// Where `print` sends its text
#[derive(Debug)]
pub enum Output {
    /// One line per print on standard output
    Stdout,
    /// Printed lines kept in memory (tests, embedding hosts)
    Buffer(Vec<String>),
}

/// Tree-walking interpreter
#[derive(Debug)]
pub struct Interpreter {
    /// The outermost, named environment
    globals: EnvRef,
    /// Environment of the innermost scope being executed
    environment: EnvRef,
    /// Tables produced by the resolver
    resolution: Resolution,
    output: Output,
    reporter: Reporter,
    call_depth: usize,
    max_call_depth: usize,
}

impl Interpreter {
    /// Create a new interpreter with `clock` defined
    pub fn new() -> Self {
        Self::with_config(&InterpreterConfig::default())
    }

    pub fn with_config(config: &InterpreterConfig) -> Self {
        let globals = Environment::global().into_ref();
        let clock = NativeFunction::clock();
        globals.borrow_mut().define(
            clock.name,
            None,
            Value::Callable(Callable::Native(Rc::new(clock))),
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            resolution: Resolution::new(),
            output: Output::Stdout,
            reporter: Reporter::new(),
            call_depth: 0,
            max_call_depth: config.max_call_depth,
        }
    }

    /// Keep printed lines in memory instead of writing to stdout
    pub fn capture_output(mut self) -> Self {
        self.output = Output::Buffer(Vec::new());
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Add tables for another program; earlier entries stay valid
    pub fn extend_resolution(&mut self, resolution: Resolution) {
        self.resolution.extend(resolution);
    }

    /// For resolvers that record straight into the interpreter
    pub fn resolution_mut(&mut self) -> &mut Resolution {
        &mut self.resolution
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Get captured output (empty when printing to stdout)
    pub fn output(&self) -> &[String] {
        match &self.output {
            Output::Buffer(lines) => lines,
            Output::Stdout => &[],
        }
    }

    /// Clear output buffer
    pub fn clear_output(&mut self) {
        if let Output::Buffer(lines) = &mut self.output {
            lines.clear();
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// Run a program's top-level statements in order.
    ///
    /// The first runtime error stops the run and goes to the reporter;
    /// later statements do not execute. Globals survive for the next call.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        debug!(statements = statements.len(), "interpreting program");
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                // Only reachable for programs the resolver never saw
                Ok(Flow::Return(_)) => {
                    warn!("return outside of a function ended the program");
                    return;
                }
                Err(error) => {
                    self.reporter.runtime_error(error);
                    return;
                }
            }
        }
        debug!("program finished");
    }

    /// Execute `statements` with `environment` as the current scope,
    /// restoring the previous scope on every exit path
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: EnvRef,
    ) -> Result<Flow, RuntimeError> {
        let previous = mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expression { expr, .. } => {
                self.evaluate(expr)?;
            }

            Stmt::Print { expr, .. } => {
                let value = self.evaluate(expr)?;
                self.emit(value.to_string());
            }

            Stmt::Var {
                id,
                name,
                initializer,
            } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                let slot = self.resolution.declaration_slot(*id);
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, slot, value);
            }

            Stmt::Block { id, statements } => {
                let size = self.resolution.frame_size(*id).unwrap_or(0);
                trace!(block = %id, size, "enter block");
                let scope = Environment::child(&self.environment, size);
                return self.execute_block(statements, scope);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While {
                condition, body, ..
            } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function { id, decl } => {
                let frame_size = self.resolution.frame_size(*id).unwrap_or(0);
                let closure = Closure::new(Rc::clone(decl), Rc::clone(&self.environment), frame_size);
                let slot = self.resolution.declaration_slot(*id);
                self.environment.borrow_mut().define(
                    &decl.name.lexeme,
                    slot,
                    Value::Callable(Callable::Function(Rc::new(closure))),
                );
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    /// Evaluate an expression
    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal { value, .. } => Ok(Value::from(value)),

            Expr::Grouping { expr, .. } => self.evaluate(expr),

            Expr::Unary { op, line, right, .. } => {
                let operand = self.evaluate(right)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnaryOp::Neg => match operand {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::OperandMustBeNumber {
                            operator: Token::new(op.symbol(), *line),
                        }),
                    },
                }
            }

            Expr::Binary {
                left,
                op,
                line,
                right,
                ..
            } => {
                let lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;
                eval_binary(*op, *line, lhs, rhs)
            }

            Expr::Logical {
                left, op, right, ..
            } => {
                let lhs = self.evaluate(left)?;
                let short_circuits = match op {
                    LogicalOp::Or => lhs.is_truthy(),
                    LogicalOp::And => !lhs.is_truthy(),
                };
                if short_circuits {
                    Ok(lhs)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.resolution.local(*id) {
                    Some(LocalSlot { distance, slot }) => Environment::assign_at(
                        &self.environment,
                        distance,
                        name,
                        Some(slot),
                        value.clone(),
                    )?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(name, None, value.clone())?,
                }
                Ok(value)
            }

            Expr::Call {
                callee,
                line,
                arguments,
                ..
            } => {
                let callee = self.evaluate(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }
                self.eval_call(callee, *line, args)
            }
        }
    }

    fn look_up_variable(&self, id: NodeId, name: &Token) -> Result<Value, RuntimeError> {
        match self.resolution.local(id) {
            Some(LocalSlot { distance, slot }) => {
                Environment::get_at(&self.environment, distance, name, Some(slot))
            }
            None => self.globals.borrow().get(name, None),
        }
    }

    /// Evaluate a function call
    fn eval_call(&mut self, callee: Value, line: u32, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let paren = || Token::new(")", line);

        let Value::Callable(function) = callee else {
            return Err(RuntimeError::NotCallable { paren: paren() });
        };
        if args.len() != function.arity() {
            return Err(RuntimeError::ArityMismatch {
                paren: paren(),
                expected: function.arity(),
                got: args.len(),
            });
        }
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::StackOverflow { paren: paren() });
        }

        trace!(function = function.name(), depth = self.call_depth, "call");
        self.call_depth += 1;
        let result = function.call(self, args);
        self.call_depth -= 1;
        result
    }

    fn emit(&mut self, text: String) {
        match &mut self.output {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{}", text) {
                    warn!("failed to write program output: {}", e);
                }
            }
            Output::Buffer(lines) => lines.push(text),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate a binary operation on already-evaluated operands
fn eval_binary(op: BinaryOp, line: u32, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    let operator = || Token::new(op.symbol(), line);

    match op {
        BinaryOp::Eq => return Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => return Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Add => {
            return match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => {
                    Ok(Value::String(format!("{}{}", a, b).into()))
                }
                _ => Err(RuntimeError::OperandsMustBeNumbersOrStrings {
                    operator: operator(),
                }),
            };
        }
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (lhs, rhs) else {
        return Err(RuntimeError::OperandsMustBeNumbers {
            operator: operator(),
        });
    };
    Ok(match op {
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Add => unreachable!("handled above"),
    })
}
