//! Koda tree-walking evaluator.
//!
//! Runs a parsed [`Program`](koda_types::ast::Program) directly from the AST.
//! Runtime failures are reported as [`ScriptError`](koda_types::ScriptError)s
//! carrying a stack trace in the common `at name (<anonymous>:L:C)` shape.

pub mod builtins;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod value;

pub use builtins::{number_arg, string_arg, MAX_ARRAY_LENGTH};
pub use env::{Assign, Environment};
pub use error::{EvalError, EvalResult};
pub use evaluator::{binary_op, Evaluator, DEFAULT_MAX_CALL_DEPTH, MAX_EVAL_NESTING};
pub use value::{format_number, Closure, Function, NativeFunction, Value};
