//! Tree-walking interpreter for resolved programs
//!
//! Executes the AST directly, using the resolver's tables to address
//! local variables by (distance, slot).

pub mod env;
pub mod eval;
pub mod function;
pub mod value;

pub use env::{EnvRef, Environment};
pub use eval::{Interpreter, Output};
pub use function::{Callable, Closure, NativeFunction};
pub use value::{Flow, Value};
