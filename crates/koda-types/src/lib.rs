//! Shared types for the Koda engine.
//!
//! This crate defines the source text model, source spans, the script
//! error type raised by compilation and execution, and the AST produced
//! by the parser.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorKind, ScriptError};
pub use span::{SourceText, Span};

/// Result type used throughout the Koda compiler stages.
pub type Result<T> = std::result::Result<T, ScriptError>;
