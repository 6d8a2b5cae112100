//! Koda parser: converts a token stream into an AST.

mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING_DEPTH};

use koda_lexer::Lexer;
use koda_types::ast::Program;
use koda_types::ScriptError;

/// Lex and parse `text` as one program.
///
/// Reports the first syntax error in source order: a lexical error wins
/// unless the parser failed strictly earlier in the text.
pub fn parse_program(text: &str) -> Result<Program, ScriptError> {
    parse_function_body(text, &[])
}

/// Like [`parse_program`], treating `text` as the body of a function with
/// the given formal parameters.
pub fn parse_function_body(text: &str, params: &[&str]) -> Result<Program, ScriptError> {
    let lexed = Lexer::new(text).lex();
    let parsed = Parser::new(lexed.tokens).parse_with_params(params);

    let first_lex = lexed.errors.into_iter().next();
    let first_parse = parsed.errors.into_iter().next();
    let error = match (first_lex, first_parse) {
        (Some(lex), Some(parse)) if position(&parse) < position(&lex) => Some(parse),
        (Some(lex), _) => Some(lex),
        (None, parse) => parse,
    };

    match (error, parsed.program) {
        (Some(err), _) => Err(err),
        (None, Some(program)) => Ok(program),
        (None, None) => Err(ScriptError::syntax("Unexpected end of input")),
    }
}

fn position(err: &ScriptError) -> (u32, u32) {
    (
        err.line_number.unwrap_or(u32::MAX),
        err.column_number.unwrap_or(u32::MAX),
    )
}
