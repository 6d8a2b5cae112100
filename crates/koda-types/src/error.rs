use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Script error class, named the way student-facing tooling names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    SyntaxError,
    ReferenceError,
    TypeError,
    RangeError,
    Error,
}

impl ErrorKind {
    /// The class name as it appears in stack traces.
    pub fn name(self) -> &'static str {
        match self {
            Self::SyntaxError => "SyntaxError",
            Self::ReferenceError => "ReferenceError",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
            Self::Error => "Error",
        }
    }

    /// `true` for failures raised while compiling rather than running.
    pub fn is_compile_class(self) -> bool {
        matches!(self, Self::SyntaxError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure thrown by compiling or running a script.
///
/// Location information is optional and comes in two shapes: a diagnostic
/// `stack` text whose frames embed `:LINE:COL` pairs, and explicit
/// `line_number`/`column_number` fields. Both count lines of the text that
/// was compiled, 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

impl ScriptError {
    /// Create an error with no location.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: None,
            line_number: None,
            column_number: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReferenceError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeError, message)
    }

    /// The error raised when nesting or recursion runs too deep.
    pub fn stack_overflow() -> Self {
        Self::range("Maximum call stack size exceeded")
    }

    /// Record the explicit line/column fields from a span's start.
    pub fn at(mut self, span: Span) -> Self {
        self.line_number = Some(span.start_line);
        self.column_number = Some(span.start_col);
        self
    }

    /// Attach a diagnostic stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// `true` if neither a stack nor explicit line fields are present.
    pub fn is_unlocated(&self) -> bool {
        self.stack.is_none() && self.line_number.is_none()
    }
}
