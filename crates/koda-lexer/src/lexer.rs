//! Core Koda lexer: converts source text to a token stream.
//!
//! Features:
//! - Keywords, operators, punctuation, number and string literals
//! - Template literals with `${expr}` via a mode stack
//! - Line (`//`) and block (`/* */`) comments stripped
//! - Line breaks are not tokens; each token records whether one preceded it
//! - Errors are collected; the stream always ends with [`TokenKind::Eof`]

use koda_types::{ScriptError, Span};

use crate::token::{Token, TokenKind};

/// Message used for characters and literals the lexer cannot make sense of.
pub const INVALID_TOKEN: &str = "Invalid or unexpected token";

/// Lexer mode. Tracks whether we're scanning plain code, template text, or
/// the expression inside a template interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Normal code scanning.
    Normal,
    /// Inside a template literal, scanning text until `` ` `` or `${`.
    Template,
    /// Inside a `${...}` interpolation expression. The `u32` tracks the
    /// brace depth so we know when the interpolation's closing `}` is reached.
    Interpolation { brace_depth: u32 },
}

/// The Koda lexer.
pub struct Lexer<'src> {
    /// The full source text as characters.
    source: Vec<char>,
    /// Kept for the lifetime link to the caller's text.
    _text: &'src str,
    /// Current char offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in chars).
    col: u32,
    /// Collected errors.
    errors: Vec<ScriptError>,
    /// Mode stack for template interpolation.
    mode_stack: Vec<Mode>,
    /// Pending tokens to emit before the next scan (used for interpolation).
    pending: Vec<Token>,
    /// Set when whitespace or a comment containing a line break was skipped.
    saw_newline: bool,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing, in source order.
    pub errors: Vec<ScriptError>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(text: &'src str) -> Self {
        Self {
            source: text.chars().collect(),
            _text: text,
            pos: 0,
            line: 1,
            col: 1,
            errors: Vec::new(),
            mode_stack: vec![Mode::Normal],
            pending: Vec::new(),
            saw_newline: false,
        }
    }

    /// Lex the entire source into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            // Drain any pending tokens first (e.g. InterpolationStart after TemplateStart)
            if let Some(pending) = self.pending.pop() {
                tokens.push(pending);
                continue;
            }

            let newline_before = std::mem::take(&mut self.saw_newline);
            let mut token = match self.current_mode() {
                Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
                Mode::Template => self.scan_template_continuation(),
            };
            token.newline_before = newline_before || std::mem::take(&mut self.saw_newline);

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(ScriptError::syntax(message).at(span));
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace, line breaks and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some('\n') => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    // Consume everything until end-of-line (but not the newline itself)
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                _ => return,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start_line = self.line;
        let start_col = self.col;
        // Consume `/*`
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(INVALID_TOKEN, span);
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(ch) => {
                    if ch == '\n' {
                        self.saw_newline = true;
                    }
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Normal-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in normal (non-template) mode.
    fn scan_normal(&mut self) -> Token {
        self.skip_trivia();

        if self.at_end() {
            if self
                .mode_stack
                .iter()
                .any(|m| matches!(m, Mode::Template | Mode::Interpolation { .. }))
            {
                self.emit_error("Unterminated template literal", self.current_span());
            }
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let start_line = self.line;
        let start_col = self.col;
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };

        let kind = match ch {
            // ── String literals ──
            '"' | '\'' => return self.scan_string(ch, start_line, start_col),
            '`' => return self.scan_template(start_line, start_col),

            // ── Number literals ──
            '0'..='9' => return self.scan_number(ch, start_line, start_col),
            '.' if matches!(self.peek(), Some('0'..='9')) => {
                return self.scan_number(ch, start_line, start_col)
            }

            // ── Identifiers & keywords ──
            c if is_ident_start(c) => return self.scan_identifier(c, start_line, start_col),

            // ── Operators & punctuation ──
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                // `//` and `/*` were handled as trivia, so bare `/` is division
                if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::BangEqEq
                    } else {
                        TokenKind::BangEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            '&' if self.peek() == Some('&') => {
                self.advance();
                TokenKind::AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenKind::OrOr
            }
            '?' => TokenKind::Question,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,

            '{' => {
                // If we're in interpolation mode, track brace depth
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                TokenKind::LBrace
            }

            '}' => {
                // Check if this closes an interpolation
                if let Mode::Interpolation { brace_depth } = self.current_mode() {
                    if brace_depth == 0 {
                        // This `}` ends the interpolation; switch back to template mode
                        self.pop_mode();
                        self.push_mode(Mode::Template);
                        return Token::new(
                            TokenKind::InterpolationEnd,
                            self.span_from(start_line, start_col),
                        );
                    } else if let Some(Mode::Interpolation { brace_depth }) =
                        self.mode_stack.last_mut()
                    {
                        // Just a nested `{}`
                        *brace_depth -= 1;
                    }
                }
                TokenKind::RBrace
            }

            _ => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(INVALID_TOKEN, span);
                // Error recovery: skip the character and try again
                return self.scan_normal();
            }
        };

        Token::new(kind, self.span_from(start_line, start_col))
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, first: char, start_line: u32, start_col: u32) -> Token {
        let mut text = String::from(first);
        let mut seen_dot = first == '.';

        loop {
            match self.peek() {
                Some(c @ '0'..='9') => {
                    text.push(c);
                    self.advance();
                }
                Some('.') if !seen_dot && matches!(self.peek_at(1), Some('0'..='9')) => {
                    seen_dot = true;
                    text.push('.');
                    self.advance();
                }
                _ => break,
            }
        }

        // Exponent: `1e3`, `2.5E-4`
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if matches!(self.peek_at(digit_at), Some('0'..='9')) {
                text.push('e');
                self.advance();
                if sign {
                    if let Some(s) = self.advance() {
                        text.push(s);
                    }
                }
                while let Some(c @ '0'..='9') = self.peek() {
                    text.push(c);
                    self.advance();
                }
            }
        }

        // An identifier character straight after a number (`3px`) is invalid
        if self.peek().is_some_and(is_ident_start) {
            while self.peek().is_some_and(is_ident_part) {
                self.advance();
            }
            let span = self.span_from(start_line, start_col);
            self.emit_error(INVALID_TOKEN, span);
        }

        let value: f64 = text.parse().unwrap_or(f64::NAN);
        Token::new(TokenKind::NumberLit(value), self.span_from(start_line, start_col))
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, first: char, start_line: u32, start_col: u32) -> Token {
        let mut text = String::from(first);
        while let Some(ch) = self.peek() {
            if is_ident_part(ch) {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let span = self.span_from(start_line, start_col);
        let kind = TokenKind::from_keyword(&text).unwrap_or(TokenKind::Identifier(text));
        Token::new(kind, span)
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a quoted string starting after the opening quote.
    fn scan_string(&mut self, quote: char, start_line: u32, start_col: u32) -> Token {
        let mut buf = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(INVALID_TOKEN, span);
                    return Token::new(TokenKind::StringLiteral(buf), span);
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Token::new(
                        TokenKind::StringLiteral(buf),
                        self.span_from(start_line, start_col),
                    );
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Template literals & interpolation
    // ─────────────────────────────────────────────────────────────

    /// Scan a template literal starting after the opening backtick.
    /// Handles two cases:
    /// 1. Plain template (no interpolation) → `TemplateString`
    /// 2. Template with interpolation → `TemplateStart`, then mode switch
    fn scan_template(&mut self, start_line: u32, start_col: u32) -> Token {
        let mut buf = String::new();

        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error("Unterminated template literal", span);
                    return Token::new(TokenKind::TemplateString(buf), span);
                }
                Some('`') => {
                    self.advance();
                    return Token::new(
                        TokenKind::TemplateString(buf),
                        self.span_from(start_line, start_col),
                    );
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    let span = self.span_from(start_line, start_col);
                    self.open_interpolation();
                    return Token::new(TokenKind::TemplateStart(buf), span);
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    /// Continue scanning template text after an interpolation ends.
    /// Called when we're in `Mode::Template`.
    fn scan_template_continuation(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        let mut buf = String::new();

        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error("Unterminated template literal", span);
                    self.pop_mode();
                    return Token::new(TokenKind::TemplateEnd(buf), span);
                }
                Some('`') => {
                    self.advance();
                    self.pop_mode();
                    return Token::new(
                        TokenKind::TemplateEnd(buf),
                        self.span_from(start_line, start_col),
                    );
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    let span = self.span_from(start_line, start_col);
                    // Replace current Template mode with Interpolation
                    self.pop_mode();
                    self.open_interpolation();
                    return Token::new(TokenKind::TemplatePart(buf), span);
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    /// Consume `${`, enter interpolation mode and queue `InterpolationStart`
    /// so it is emitted right after the template text token.
    fn open_interpolation(&mut self) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // consume '$'
        self.advance(); // consume '{'
        let span = self.span_from(start_line, start_col);
        self.push_mode(Mode::Interpolation { brace_depth: 0 });
        self.pending
            .push(Token::new(TokenKind::InterpolationStart, span));
    }

    /// Scan an escape sequence starting at the `\`.
    /// Returns the unescaped character, or `None` for a line continuation.
    fn scan_escape_sequence(&mut self) -> Option<char> {
        self.advance(); // consume the '\'

        match self.advance()? {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '0' => Some('\0'),
            'u' => self.scan_unicode_escape(),
            // Backslash-newline continues the literal on the next line
            '\n' => None,
            // Quotes, backslash, `$`, and any other char escape to themselves
            other => Some(other),
        }
    }

    /// `\uXXXX` after the `u` was consumed.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        let start_line = self.line;
        let start_col = self.col;
        let mut code = 0u32;
        for _ in 0..4 {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    code = code * 16 + d;
                    self.advance();
                }
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(INVALID_TOKEN, span);
                    return None;
                }
            }
        }
        char::from_u32(code)
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

fn is_ident_part(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
