//! Lexer tests: keywords, operators, literals, templates, comments,
//! line-break tracking, error messages and positions.

use koda_lexer::{Lexer, Token, TokenKind, INVALID_TOKEN};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

fn tokens(source: &str) -> Vec<Token> {
    Lexer::new(source).lex().tokens
}

/// Lex and return the error messages.
fn errors(source: &str) -> Vec<String> {
    Lexer::new(source)
        .lex()
        .errors
        .into_iter()
        .map(|e| e.message)
        .collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Keywords & identifiers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_declaration_keywords() {
    let pairs = [
        ("var", TokenKind::Var),
        ("let", TokenKind::Let),
        ("const", TokenKind::Const),
        ("function", TokenKind::Function),
    ];
    for (src, expected) in &pairs {
        assert_eq!(kinds(src), vec![expected.clone()], "keyword '{src}'");
    }
}

#[test]
fn test_control_keywords() {
    let pairs = [
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("while", TokenKind::While),
        ("do", TokenKind::Do),
        ("for", TokenKind::For),
        ("break", TokenKind::Break),
        ("continue", TokenKind::Continue),
        ("return", TokenKind::Return),
        ("throw", TokenKind::Throw),
    ];
    for (src, expected) in &pairs {
        assert_eq!(kinds(src), vec![expected.clone()], "keyword '{src}'");
    }
}

#[test]
fn test_reserved_words_are_not_identifiers() {
    for word in ["new", "class", "try", "this"] {
        assert_eq!(kinds(word), vec![TokenKind::Reserved(word.to_string())]);
    }
}

#[test]
fn test_identifiers() {
    assert_eq!(
        kinds("circle _x $y färg x1"),
        vec![ident("circle"), ident("_x"), ident("$y"), ident("färg"), ident("x1")]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(kinds("letter format iffy"), vec![ident("letter"), ident("format"), ident("iffy")]);
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_numbers() {
    assert_eq!(
        kinds("0 42 3.5 .25 1e3 2E-2"),
        vec![
            TokenKind::NumberLit(0.0),
            TokenKind::NumberLit(42.0),
            TokenKind::NumberLit(3.5),
            TokenKind::NumberLit(0.25),
            TokenKind::NumberLit(1000.0),
            TokenKind::NumberLit(0.02),
        ]
    );
}

#[test]
fn test_member_access_on_number_is_not_a_fraction() {
    assert_eq!(
        kinds("1.toFixed"),
        vec![TokenKind::NumberLit(1.0), TokenKind::Dot, ident("toFixed")]
    );
}

#[test]
fn test_strings_both_quotes() {
    assert_eq!(
        kinds(r##""#ff0000" 'röd'"##),
        vec![
            TokenKind::StringLiteral("#ff0000".into()),
            TokenKind::StringLiteral("röd".into()),
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        kinds(r#""a\nb\t\"q\" A \\""#),
        vec![TokenKind::StringLiteral("a\nb\t\"q\" A \\".into())]
    );
}

#[test]
fn test_plain_template() {
    assert_eq!(kinds("`hello`"), vec![TokenKind::TemplateString("hello".into())]);
}

#[test]
fn test_template_with_interpolations() {
    assert_eq!(
        kinds("`x=${x}, y=${ {a: 1}.a }!`"),
        vec![
            TokenKind::TemplateStart("x=".into()),
            TokenKind::InterpolationStart,
            ident("x"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplatePart(", y=".into()),
            TokenKind::InterpolationStart,
            TokenKind::LBrace,
            ident("a"),
            TokenKind::Colon,
            TokenKind::NumberLit(1.0),
            TokenKind::RBrace,
            TokenKind::Dot,
            ident("a"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("!".into()),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Operators & punctuation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_operators_longest_match() {
    assert_eq!(
        kinds("= == === != !== ! => += -= *= /= %= ++ -- && || ? : <= >="),
        vec![
            TokenKind::Eq,
            TokenKind::EqEq,
            TokenKind::EqEqEq,
            TokenKind::BangEq,
            TokenKind::BangEqEq,
            TokenKind::Bang,
            TokenKind::Arrow,
            TokenKind::PlusEq,
            TokenKind::MinusEq,
            TokenKind::StarEq,
            TokenKind::SlashEq,
            TokenKind::PercentEq,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::Question,
            TokenKind::Colon,
            TokenKind::LessEq,
            TokenKind::GreaterEq,
        ]
    );
}

#[test]
fn test_call_statement() {
    assert_eq!(
        kinds(r#"circle(250, 250, 30, "red");"#),
        vec![
            ident("circle"),
            TokenKind::LParen,
            TokenKind::NumberLit(250.0),
            TokenKind::Comma,
            TokenKind::NumberLit(250.0),
            TokenKind::Comma,
            TokenKind::NumberLit(30.0),
            TokenKind::Comma,
            TokenKind::StringLiteral("red".into()),
            TokenKind::RParen,
            TokenKind::Semicolon,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Comments & line breaks
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("a // line comment\n/* block\ncomment */ b / c"),
        vec![ident("a"), ident("b"), TokenKind::Slash, ident("c")]
    );
}

#[test]
fn test_newline_before_flag() {
    let toks = tokens("a\nb c /* x\n */ d");
    let flags: Vec<bool> = toks.iter().map(|t| t.newline_before).collect();
    // a, b, c, d, Eof
    assert_eq!(flags, vec![false, true, false, true, false]);
}

#[test]
fn test_eof_after_trailing_newline_has_flag() {
    let toks = tokens("a\n");
    assert_eq!(toks.last().map(|t| t.newline_before), Some(true));
}

#[test]
fn test_spans_are_one_based_lines_and_columns() {
    let toks = tokens("\"use strict\";\n  circle(1)");
    let circle = toks
        .iter()
        .find(|t| t.kind == ident("circle"))
        .expect("circle token");
    assert_eq!(circle.span.start_line, 2);
    assert_eq!(circle.span.start_col, 3);
}

#[test]
fn test_columns_count_chars_not_bytes() {
    let toks = tokens("'åäö' x");
    assert_eq!(toks[1].kind, ident("x"));
    assert_eq!(toks[1].span.start_col, 7);
}

#[test]
fn test_stream_always_ends_with_eof() {
    for src in ["", "   ", "// only a comment", "\"unterminated"] {
        let toks = tokens(src);
        assert_eq!(toks.last().map(|t| &t.kind), Some(&TokenKind::Eof), "source {src:?}");
    }
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unterminated_string_is_invalid_token() {
    assert_eq!(errors("fill(\"red);"), vec![INVALID_TOKEN.to_string()]);
}

#[test]
fn test_string_cannot_span_lines() {
    let result = Lexer::new("x = 'abc\ndef'").lex();
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].message, INVALID_TOKEN);
    assert_eq!(result.errors[0].line_number, Some(1));
    assert_eq!(result.errors[0].column_number, Some(5));
}

#[test]
fn test_unexpected_character() {
    let result = Lexer::new("a\n  # b").lex();
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message, INVALID_TOKEN);
    assert_eq!(result.errors[0].line_number, Some(2));
    assert_eq!(result.errors[0].column_number, Some(3));
    // Recovery keeps lexing after the bad character
    assert_eq!(kinds("a\n  # b"), vec![ident("a"), ident("b")]);
}

#[test]
fn test_number_followed_by_identifier() {
    assert_eq!(errors("circle(3px)"), vec![INVALID_TOKEN.to_string()]);
}

#[test]
fn test_unterminated_template() {
    assert_eq!(errors("`abc"), vec!["Unterminated template literal".to_string()]);
    assert_eq!(errors("`a${b"), vec!["Unterminated template literal".to_string()]);
}

#[test]
fn test_unterminated_block_comment() {
    assert_eq!(errors("a /* never closed"), vec![INVALID_TOKEN.to_string()]);
}

#[test]
fn test_error_kind_is_syntax() {
    let result = Lexer::new("@").lex();
    assert_eq!(result.errors[0].kind, koda_types::ErrorKind::SyntaxError);
}

#[test]
fn test_lexing_is_deterministic() {
    let src = "const r = 10;\nfor (let i = 0; i < 5; i++) {\n  circle(i * r, 20, r, `hsl(${i * 60}, 50%, 50%)`);\n}";
    let first = tokens(src);
    for _ in 0..50 {
        assert_eq!(tokens(src), first);
    }
}
