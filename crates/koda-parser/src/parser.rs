//! Core parser infrastructure: token cursor, error reporting, scopes.

use std::collections::HashMap;

use koda_lexer::token::{Token, TokenKind};
use koda_types::ast::{Ident, Program, Stmt};
use koda_types::{ScriptError, Span};

/// Deepest expression or statement nesting the parser accepts.
///
/// Longer operator, member and call chains count as nesting too, since
/// they build equally deep trees.
pub const MAX_NESTING_DEPTH: u32 = 100;

/// How a name entered a declaration scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    /// `let` / `const`
    Lexical,
    /// `var` or a function parameter
    Var,
    /// `function name() {}`
    Function,
}

/// One block or function scope tracked while parsing, used to reject
/// conflicting declarations before anything runs.
#[derive(Debug, Default)]
pub(crate) struct DeclScope {
    names: HashMap<String, Binding>,
    is_function: bool,
}

/// The Koda parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Parsing stops at the first syntax error; only that error is reported.
pub struct Parser {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Collected errors (at most one).
    errors: Vec<ScriptError>,
    /// Declaration scopes, innermost last.
    scopes: Vec<DeclScope>,
    /// Enclosing loops in the current function body.
    pub(crate) loop_depth: u32,
    /// Current nesting of the tree being built.
    nesting: u32,
}

/// Result of parsing.
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Vec<ScriptError>,
}

impl Parser {
    /// Create a new parser from a token stream.
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = if tokens.last().map(|t| &t.kind) == Some(&TokenKind::Eof) {
            tokens
        } else {
            let end = tokens.last().map(|t| t.span).unwrap_or(Span::point(1, 1));
            let mut tokens = tokens;
            tokens.push(Token::new(TokenKind::Eof, end));
            tokens
        };
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            scopes: Vec::new(),
            loop_depth: 0,
            nesting: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// `true` if a line break separates the current token from the previous one.
    pub(crate) fn newline_before(&self) -> bool {
        self.peek().newline_before
    }

    /// `true` if the `(` at the cursor closes into `) =>`.
    pub(crate) fn is_arrow_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::Arrow)
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    // ── Statement Termination ─────────────────────────────────────────────────

    /// Accept `;`, or an implied terminator before `}`, end of input, or a
    /// line break. Reports the current token otherwise.
    pub(crate) fn consume_semicolon(&mut self) -> Option<()> {
        if self.eat(&TokenKind::Semicolon) {
            return Some(());
        }
        if self.at_end() || self.check(&TokenKind::RBrace) || self.newline_before() {
            return Some(());
        }
        self.unexpected()
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            self.unexpected()
        }
    }

    /// Expect an identifier token. Returns the name and span.
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => self.unexpected(),
        }
    }

    /// Expect an identifier or any keyword, as allowed after `.` and as an
    /// object literal key.
    pub(crate) fn expect_property_name(&mut self) -> Option<Ident> {
        let kind = self.peek_kind().clone();
        match &kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ if kind.is_keyword() => {
                let name = kind.to_string();
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => self.unexpected(),
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report the current token as unexpected, worded the way browsers word it.
    pub(crate) fn unexpected<T>(&mut self) -> Option<T> {
        let message = match self.peek_kind() {
            TokenKind::Eof => "Unexpected end of input".to_string(),
            TokenKind::Identifier(name) => format!("Unexpected identifier '{name}'"),
            TokenKind::NumberLit(_) => "Unexpected number".to_string(),
            TokenKind::StringLiteral(_) => "Unexpected string".to_string(),
            TokenKind::TemplateString(_) | TokenKind::TemplateStart(_) => {
                "Unexpected template string".to_string()
            }
            other => format!("Unexpected token '{other}'"),
        };
        self.error_at_current(message);
        None
    }

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(message, span);
    }

    /// Report an error at a specific span. Only the first error is kept.
    pub(crate) fn error_at(&mut self, message: impl Into<String>, span: Span) {
        if self.errors.is_empty() {
            self.errors.push(ScriptError::syntax(message).at(span));
        }
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Run `parse` one nesting level deeper.
    pub(crate) fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        self.deepen()?;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    /// Enter one more nesting level. Past [`MAX_NESTING_DEPTH`] this reports
    /// `RangeError: Maximum call stack size exceeded`, as browsers do.
    pub(crate) fn deepen(&mut self) -> Option<()> {
        if self.nesting >= MAX_NESTING_DEPTH {
            if self.errors.is_empty() {
                let span = self.current_span();
                self.errors.push(ScriptError::stack_overflow().at(span));
            }
            return None;
        }
        self.nesting += 1;
        Some(())
    }

    pub(crate) fn nesting(&self) -> u32 {
        self.nesting
    }

    /// Leave the levels a finished operator chain entered.
    pub(crate) fn restore_nesting(&mut self, depth: u32) {
        self.nesting = depth;
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    // ── Declaration Scopes ────────────────────────────────────────────────────

    pub(crate) fn push_scope(&mut self, is_function: bool) {
        self.scopes.push(DeclScope {
            names: HashMap::new(),
            is_function,
        });
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Register a declared name; reports a redeclaration error on conflict.
    pub(crate) fn declare(&mut self, ident: &Ident, binding: Binding) -> Option<()> {
        let conflict = match binding {
            Binding::Lexical | Binding::Function => self
                .scopes
                .last()
                .and_then(|scope| scope.names.get(&ident.name))
                .is_some_and(|existing| {
                    binding == Binding::Lexical || *existing == Binding::Lexical
                }),
            // `var` is visible in every scope up to the enclosing function
            Binding::Var => self
                .scopes
                .iter()
                .rev()
                .scan(false, |done, scope| {
                    if *done {
                        return None;
                    }
                    *done = scope.is_function;
                    Some(scope)
                })
                .any(|scope| scope.names.get(&ident.name) == Some(&Binding::Lexical)),
        };
        if conflict {
            self.error_at(
                format!("Identifier '{}' has already been declared", ident.name),
                ident.span,
            );
            return None;
        }

        match binding {
            Binding::Var => {
                for scope in self.scopes.iter_mut().rev() {
                    scope.names.entry(ident.name.clone()).or_insert(Binding::Var);
                    if scope.is_function {
                        break;
                    }
                }
            }
            _ => {
                if let Some(scope) = self.scopes.last_mut() {
                    scope.names.insert(ident.name.clone(), binding);
                }
            }
        }
        Some(())
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a `Program` AST.
    pub fn parse(self) -> ParseResult {
        self.parse_with_params(&[])
    }

    /// Parse the token stream as the body of a function whose formal
    /// parameters are `params`. Top-level `let`/`const` declarations may
    /// not reuse a parameter name.
    pub fn parse_with_params(mut self, params: &[&str]) -> ParseResult {
        let program = self.parse_program(params);
        ParseResult {
            program: if self.has_errors() { None } else { program },
            errors: self.errors,
        }
    }

    fn parse_program(&mut self, params: &[&str]) -> Option<Program> {
        let start = self.current_span();
        self.push_scope(true);
        if let Some(scope) = self.scopes.last_mut() {
            for param in params {
                scope.names.insert((*param).to_string(), Binding::Var);
            }
        }
        let mut body = Vec::new();
        while !self.at_end() {
            body.push(self.parse_statement()?);
        }
        self.pop_scope();
        let strict = has_use_strict_directive(&body);
        Some(Program {
            body,
            strict,
            span: start.merge(self.current_span()),
        })
    }
}

/// `true` if the leading string-literal statements include `"use strict"`.
pub(crate) fn has_use_strict_directive(body: &[Stmt]) -> bool {
    use koda_types::ast::ExprKind;
    body.iter()
        .map_while(|stmt| match stmt {
            Stmt::Expr(e) => match &e.expr.kind {
                ExprKind::StringLit(s) => Some(s.as_str()),
                _ => None,
            },
            _ => None,
        })
        .any(|s| s == "use strict")
}
