//! Runtime values for the interpreter

use std::fmt;
use std::rc::Rc;

use crate::ast::Literal;

use super::function::Callable;

/// Runtime value
#[derive(Clone)]
pub enum Value {
    /// `nil`
    Nil,
    /// Boolean
    Bool(bool),
    /// 64-bit float; the only numeric type
    Number(f64),
    /// Immutable string, shared between copies
    String(Rc<str>),
    /// Function or native function
    Callable(Callable),
}

impl Value {
    /// `nil` and `false` are falsey; everything else, `0` and `""` included, is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Nil => Value::Nil,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::string(s),
        }
    }
}

/// Render a number the way `print` shows it: integral values drop the
/// fractional part, infinities spell out their name.
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        write!(f, "{}Infinity", sign)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => write!(f, "{}", s),
            Value::Callable(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // Boxed-double equality: NaN equals itself, 0 and -0 differ
            (Value::Number(a), Value::Number(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            _ => false,
        }
    }
}

/// How a statement finished.
///
/// `Return` travels up through enclosing statements until the nearest
/// function call consumes it; it never reaches `interpret`.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Ran to completion
    Normal,
    /// Hit `return` with this value
    Return(Value),
}
