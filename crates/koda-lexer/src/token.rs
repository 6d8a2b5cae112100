//! Token types for the Koda script language.

use koda_types::Span;
use std::fmt;

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// `true` if at least one line break separates this token from the
    /// previous one. Drives automatic statement termination.
    pub newline_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            newline_before: false,
        }
    }
}

/// Words that are reserved by the language but not supported by Koda.
///
/// They lex as [`TokenKind::Reserved`] so the parser reports them as
/// unexpected tokens instead of treating them as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "new", "class", "try", "catch", "finally", "switch", "case", "default", "this", "delete",
    "in", "instanceof", "void", "with", "yield", "async", "await", "import", "export",
    "extends", "super", "debugger", "enum",
];

/// All token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ─────────────────────────────────────────────

    /// Numeric literal
    NumberLit(f64),
    /// `'text'` or `"text"`
    StringLiteral(String),
    /// Template literal without interpolation: `` `text` ``
    TemplateString(String),
    /// Opening text of an interpolated template, up to `${`
    TemplateStart(String),
    /// Text between two interpolations
    TemplatePart(String),
    /// Closing text of an interpolated template, after the last `}`
    TemplateEnd(String),
    /// `${`
    InterpolationStart,
    /// `}` closing an interpolation
    InterpolationEnd,

    /// User identifier
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    Var,
    Let,
    Const,
    Function,
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    Return,
    Throw,
    True,
    False,
    Null,
    Typeof,
    /// Reserved but unsupported word (see [`RESERVED_WORDS`])
    Reserved(String),

    // ── Operators ────────────────────────────────────────────

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    BangEq,
    /// `!==`
    BangEqEq,
    /// `!`
    Bang,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEq,
    /// `>=`
    GreaterEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `?`
    Question,
    /// `=>`
    Arrow,

    // ── Punctuation ──────────────────────────────────────────

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,

    // ── Special ──────────────────────────────────────────────

    /// End of input
    Eof,
}

impl TokenKind {
    /// Look up a keyword. Returns `None` for user identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "for" => TokenKind::For,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "throw" => TokenKind::Throw,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "typeof" => TokenKind::Typeof,
            _ if RESERVED_WORDS.contains(&s) => TokenKind::Reserved(s.to_string()),
            _ => return None,
        })
    }

    /// Returns `true` for keywords, which may still be used as property
    /// names after `.` and as object literal keys.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Var
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Typeof
                | TokenKind::Reserved(_)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Literals
            TokenKind::NumberLit(n) => write!(f, "{n}"),
            TokenKind::StringLiteral(s) => write!(f, "\"{s}\""),
            TokenKind::TemplateString(s) => write!(f, "`{s}`"),
            TokenKind::TemplateStart(s) => write!(f, "`{s}${{"),
            TokenKind::TemplatePart(s) => write!(f, "}}{s}${{"),
            TokenKind::TemplateEnd(s) => write!(f, "}}{s}`"),
            TokenKind::InterpolationStart => f.write_str("${"),
            TokenKind::InterpolationEnd => f.write_str("}"),
            TokenKind::Identifier(name) => f.write_str(name),

            // Keywords
            TokenKind::Var => f.write_str("var"),
            TokenKind::Let => f.write_str("let"),
            TokenKind::Const => f.write_str("const"),
            TokenKind::Function => f.write_str("function"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::While => f.write_str("while"),
            TokenKind::Do => f.write_str("do"),
            TokenKind::For => f.write_str("for"),
            TokenKind::Break => f.write_str("break"),
            TokenKind::Continue => f.write_str("continue"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::Throw => f.write_str("throw"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Null => f.write_str("null"),
            TokenKind::Typeof => f.write_str("typeof"),
            TokenKind::Reserved(word) => f.write_str(word),

            // Operators
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::PlusPlus => f.write_str("++"),
            TokenKind::MinusMinus => f.write_str("--"),
            TokenKind::Eq => f.write_str("="),
            TokenKind::PlusEq => f.write_str("+="),
            TokenKind::MinusEq => f.write_str("-="),
            TokenKind::StarEq => f.write_str("*="),
            TokenKind::SlashEq => f.write_str("/="),
            TokenKind::PercentEq => f.write_str("%="),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::EqEqEq => f.write_str("==="),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::BangEqEq => f.write_str("!=="),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::AndAnd => f.write_str("&&"),
            TokenKind::OrOr => f.write_str("||"),
            TokenKind::Question => f.write_str("?"),
            TokenKind::Arrow => f.write_str("=>"),

            // Punctuation
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Dot => f.write_str("."),

            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::from_keyword("let"), Some(TokenKind::Let));
        assert_eq!(TokenKind::from_keyword("typeof"), Some(TokenKind::Typeof));
        assert_eq!(
            TokenKind::from_keyword("new"),
            Some(TokenKind::Reserved("new".into()))
        );
        assert_eq!(TokenKind::from_keyword("circle"), None);
        assert_eq!(TokenKind::from_keyword("undefined"), None);
    }

    #[test]
    fn test_display_matches_lexeme() {
        assert_eq!(TokenKind::RBrace.to_string(), "}");
        assert_eq!(TokenKind::InterpolationEnd.to_string(), "}");
        assert_eq!(TokenKind::EqEqEq.to_string(), "===");
        assert_eq!(TokenKind::Arrow.to_string(), "=>");
        assert_eq!(TokenKind::Identifier("x".into()).to_string(), "x");
    }

    #[test]
    fn test_is_keyword() {
        assert!(TokenKind::Function.is_keyword());
        assert!(TokenKind::Reserved("class".into()).is_keyword());
        assert!(!TokenKind::Identifier("fill".into()).is_keyword());
        assert!(!TokenKind::RBrace.is_keyword());
    }
}
