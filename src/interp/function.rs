//! Callable values: user functions (closures) and native functions

use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::FunctionDecl;
use crate::diagnostics::RuntimeError;

use super::env::{EnvRef, Environment};
use super::eval::Interpreter;
use super::value::{Flow, Value};

/// Anything a call expression can invoke
#[derive(Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<Closure>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(closure) => closure.arity(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Native(native) => native.name,
            Callable::Function(closure) => closure.name(),
        }
    }

    /// Invoke with arguments whose count already matches `arity()`
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        match self {
            Callable::Native(native) => Ok((native.func)(&arguments)),
            Callable::Function(closure) => closure.call(interpreter, arguments),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(_) => write!(f, "<native fn>"),
            Callable::Function(closure) => write!(f, "<fn {}>", closure.name()),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Function implemented in Rust
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl NativeFunction {
    /// `clock()`: seconds since the Unix epoch, with millisecond precision
    pub fn clock() -> Self {
        NativeFunction {
            name: "clock",
            arity: 0,
            func: |_| {
                let elapsed = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default();
                Value::Number(elapsed.as_millis() as f64 / 1000.0)
            },
        }
    }
}

/// A function declaration bound to the environment it was declared in
pub struct Closure {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    frame_size: usize,
}

impl Closure {
    /// `closure` must be the environment current when the declaration ran
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, frame_size: usize) -> Self {
        Closure {
            declaration,
            closure,
            frame_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Run the body in a fresh frame whose slots 0..n hold the arguments.
    ///
    /// The parameter frame is also the body's top scope; no extra block
    /// frame is pushed.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let frame = Environment::child(&self.closure, self.frame_size);
        {
            let mut frame = frame.borrow_mut();
            for (slot, (param, arg)) in self.declaration.params.iter().zip(arguments).enumerate() {
                frame.define(&param.lexeme, Some(slot), arg);
            }
        }

        match interpreter.execute_block(&self.declaration.body, frame)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}
