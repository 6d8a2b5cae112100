//! Runtime error and control-flow signals for the Koda evaluator.

use koda_types::ScriptError;

use crate::value::Value;

/// Evaluation error: a thrown script error, or a control-flow signal
/// unwinding to the statement that handles it.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A script error on its way out of the program.
    #[error(transparent)]
    Thrown(#[from] ScriptError),
    /// `return` statement (used internally for control flow)
    #[error("return")]
    Return(Value),
    /// `break` statement
    #[error("break")]
    Break,
    /// `continue` statement
    #[error("continue")]
    Continue,
}

impl EvalError {
    /// Convert a signal that escaped to the top level into a script error.
    pub fn into_script_error(self) -> ScriptError {
        match self {
            EvalError::Thrown(err) => err,
            EvalError::Return(_) => ScriptError::syntax("Illegal return statement"),
            EvalError::Break => ScriptError::syntax("Illegal break statement"),
            EvalError::Continue => {
                ScriptError::syntax("Illegal continue statement: no surrounding iteration statement")
            }
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
