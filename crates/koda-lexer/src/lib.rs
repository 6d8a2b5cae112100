//! Koda lexer: converts student source text into a token stream.

pub mod lexer;
pub mod token;

pub use lexer::{LexResult, Lexer, INVALID_TOKEN};
pub use token::{Token, TokenKind, RESERVED_WORDS};
