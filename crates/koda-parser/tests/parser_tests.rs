//! Parser tests: statements, expressions, automatic statement termination,
//! declaration conflicts, and the wording/position of syntax errors.

use koda_lexer::Lexer;
use koda_parser::{parse_program, Parser};
use koda_types::ast::*;
use koda_types::{ErrorKind, ScriptError};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> Program {
    match parse_program(source) {
        Ok(program) => program,
        Err(err) => panic!("unexpected parse error in {source:?}: {err}"),
    }
}

fn parse_err(source: &str) -> ScriptError {
    match parse_program(source) {
        Ok(_) => panic!("expected a syntax error in {source:?}"),
        Err(err) => err,
    }
}

fn first_expr(source: &str) -> Expr {
    match parse(source).body.into_iter().next() {
        Some(Stmt::Expr(stmt)) => stmt.expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_call_statements() {
    let program = parse("clear();\ncircle(250, 250, 30, \"red\");");
    assert_eq!(program.body.len(), 2);
    let Stmt::Expr(stmt) = &program.body[1] else {
        panic!("expected expression statement");
    };
    let ExprKind::Call { callee, args } = &stmt.expr.kind else {
        panic!("expected call");
    };
    assert_eq!(callee.kind, ExprKind::Identifier("circle".into()));
    assert_eq!(args.len(), 4);
    assert_eq!(args[3].kind, ExprKind::StringLit("red".into()));
}

#[test]
fn test_statements_without_semicolons() {
    let program = parse("let x = 1\nlet y = x + 2\ncircle(x, y, 3, 'blue')");
    assert_eq!(program.body.len(), 3);
}

#[test]
fn test_two_statements_on_one_line_need_semicolon() {
    let err = parse_err("let x = 1 let y = 2");
    assert_eq!(err.message, "Unexpected token 'let'");
    assert_eq!(err.line_number, Some(1));
    assert_eq!(err.column_number, Some(11));
}

#[test]
fn test_var_let_const() {
    let program = parse("var a = 1; let b; const c = 3, d = 4;");
    let kinds: Vec<VarKind> = program
        .body
        .iter()
        .filter_map(|s| match s {
            Stmt::VarDecl(d) => Some(d.kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![VarKind::Var, VarKind::Let, VarKind::Const]);
    let Stmt::VarDecl(last) = &program.body[2] else {
        panic!("expected declaration");
    };
    assert_eq!(last.declarators.len(), 2);
}

#[test]
fn test_function_declaration() {
    let program = parse("function sol(x, y) {\n  circle(x, y, 40, 'yellow');\n  return x;\n}");
    let Stmt::Function(decl) = &program.body[0] else {
        panic!("expected function declaration");
    };
    assert_eq!(decl.name.name, "sol");
    let names: Vec<&str> = decl.function.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
    let FunctionBody::Block(body) = &decl.function.body else {
        panic!("expected block body");
    };
    assert_eq!(body.stmts.len(), 2);
}

#[test]
fn test_control_flow() {
    let program = parse(
        "for (let i = 0; i < 10; i++) {\n  if (i % 2 === 0) continue;\n  else if (i > 7) break;\n}\nwhile (false) {}\ndo { } while (false)\n",
    );
    assert!(matches!(program.body[0], Stmt::For(_)));
    assert!(matches!(program.body[1], Stmt::While(_)));
    assert!(matches!(program.body[2], Stmt::DoWhile(_)));
}

#[test]
fn test_for_with_empty_header() {
    let program = parse("for (;;) { break }");
    let Stmt::For(stmt) = &program.body[0] else {
        panic!("expected for");
    };
    assert!(stmt.init.is_none());
    assert!(stmt.condition.is_none());
    assert!(stmt.update.is_none());
}

#[test]
fn test_return_followed_by_newline_returns_nothing() {
    let program = parse("function f() {\n  return\n  42\n}");
    let Stmt::Function(decl) = &program.body[0] else {
        panic!("expected function");
    };
    let FunctionBody::Block(body) = &decl.function.body else {
        panic!("expected block body");
    };
    assert_eq!(body.stmts.len(), 2);
    assert!(matches!(&body.stmts[0], Stmt::Return(r) if r.value.is_none()));
}

#[test]
fn test_use_strict_directive() {
    assert!(parse("\"use strict\";\nclear();").strict);
    assert!(parse("'use strict'\nclear()").strict);
    assert!(!parse("clear();\n\"use strict\";").strict);
    assert!(!parse("(\"use strict\");").strict);
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_precedence() {
    let expr = first_expr("1 + 2 * 3;");
    let ExprKind::Binary { op, right, .. } = expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(op, BinOp::Add);
    assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
}

#[test]
fn test_assignment_is_right_associative() {
    let expr = first_expr("a = b = 3;");
    let ExprKind::Assign { value, .. } = expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(value.kind, ExprKind::Assign { .. }));
}

#[test]
fn test_arrow_functions() {
    let program = parse("const f = (a, b) => a + b;\nconst g = x => { return x * 2 };\nconst h = () => 1;");
    for stmt in &program.body {
        let Stmt::VarDecl(decl) = stmt else {
            panic!("expected declaration");
        };
        let init = decl.declarators[0].init.as_ref().map(|e| &e.kind);
        assert!(matches!(init, Some(ExprKind::Function(_))));
    }
}

#[test]
fn test_parenthesised_expression_is_not_an_arrow() {
    let expr = first_expr("(a + b) * 2;");
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
}

#[test]
fn test_member_and_computed_access() {
    let expr = first_expr("Math.floor(xs[i]).toFixed(2);");
    let ExprKind::Call { callee, .. } = expr.kind else {
        panic!("expected call");
    };
    let ExprKind::Member { property, .. } = callee.kind else {
        panic!("expected member");
    };
    assert!(matches!(*property, PropertyKey::Named(ref id) if id.name == "toFixed"));
}

#[test]
fn test_template_literal() {
    let expr = first_expr("`x = ${x}, y = ${y + 1}`;");
    let ExprKind::Template(parts) = expr.kind else {
        panic!("expected template");
    };
    assert_eq!(parts.len(), 5);
    assert_eq!(parts[0], TemplatePart::Literal("x = ".into()));
    assert_eq!(parts[4], TemplatePart::Literal(String::new()));
}

#[test]
fn test_object_and_array_literals() {
    let program = parse("const p = { x: 1, 'y': 2, z, };\nconst xs = [1, 2, 3,];");
    let Stmt::VarDecl(decl) = &program.body[0] else {
        panic!("expected declaration");
    };
    let Some(ExprKind::ObjectLit(fields)) = decl.declarators[0].init.as_ref().map(|e| &e.kind)
    else {
        panic!("expected object literal");
    };
    let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["x", "y", "z"]);
}

#[test]
fn test_postfix_increment_does_not_cross_lines() {
    let program = parse("let i = 0\ni\n++i");
    assert_eq!(program.body.len(), 3);
}

// ─────────────────────────────────────────────────────────────────────
// Syntax errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_paren_reports_end_of_input() {
    let err = parse_err("\"use strict\";\nclear();\n\ncircle(250,250,30,\"#ff0000\"");
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert_eq!(err.message, "Unexpected end of input");
    assert_eq!(err.line_number, Some(4));
    assert!(err.stack.is_none());
}

#[test]
fn test_unclosed_block_reports_end_of_input() {
    let err = parse_err("if (true) {\n  clear()\n");
    assert_eq!(err.message, "Unexpected end of input");
}

#[test]
fn test_stray_closing_brace() {
    let err = parse_err("clear();\n}\n");
    assert_eq!(err.message, "Unexpected token '}'");
    assert_eq!(err.line_number, Some(2));
    assert_eq!(err.column_number, Some(1));
}

#[test]
fn test_missing_comma_between_arguments() {
    let err = parse_err("circle(10 20, 5, 'red')");
    assert_eq!(err.message, "Unexpected number");
}

#[test]
fn test_unexpected_identifier() {
    let err = parse_err("let a = b c");
    assert_eq!(err.message, "Unexpected identifier 'c'");
}

#[test]
fn test_unexpected_string() {
    let err = parse_err("fill('red' 'blue')");
    assert_eq!(err.message, "Unexpected string");
}

#[test]
fn test_invalid_assignment_target() {
    let err = parse_err("1 = x;");
    assert_eq!(err.message, "Invalid left-hand side in assignment");
    let err = parse_err("f() = 3;");
    assert_eq!(err.message, "Invalid left-hand side in assignment");
}

#[test]
fn test_const_requires_initializer() {
    let err = parse_err("const r;");
    assert_eq!(err.message, "Missing initializer in const declaration");
}

#[test]
fn test_redeclared_lexical_binding() {
    let err = parse_err("let x = 1;\nlet x = 2;");
    assert_eq!(err.message, "Identifier 'x' has already been declared");
    assert_eq!(err.line_number, Some(2));
    assert_eq!(err.column_number, Some(5));
}

#[test]
fn test_var_conflicts_with_enclosing_let() {
    let err = parse_err("let x = 1;\n{ var x = 2; }");
    assert_eq!(err.message, "Identifier 'x' has already been declared");
}

#[test]
fn test_shadowing_in_inner_block_is_allowed() {
    parse("let x = 1;\n{ let x = 2; }\nfunction f(x) { { let x = 3; } }");
    parse("var y = 1; var y = 2;");
}

#[test]
fn test_reserved_word_is_unexpected() {
    let err = parse_err("let c = new Thing();");
    assert_eq!(err.message, "Unexpected token 'new'");
}

#[test]
fn test_illegal_newline_after_throw() {
    let err = parse_err("throw\n'oops'");
    assert_eq!(err.message, "Illegal newline after throw");
}

#[test]
fn test_earlier_parse_error_wins_over_later_lexical_error() {
    let err = parse_err("circle(1 2)\nlet s = 'unterminated");
    assert_eq!(err.message, "Unexpected number");
    assert_eq!(err.line_number, Some(1));
}

#[test]
fn test_lexical_error_reported_first_when_earlier() {
    let err = parse_err("let s = 'oops\ncircle(1 2)");
    assert_eq!(err.message, "Invalid or unexpected token");
    assert_eq!(err.line_number, Some(1));
}

#[test]
fn test_only_one_error_is_collected() {
    let lexed = Lexer::new("circle(1 2)\nfill(3 4)").lex();
    let result = Parser::new(lexed.tokens).parse();
    assert!(result.program.is_none());
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn test_empty_program() {
    let program = parse("");
    assert!(program.body.is_empty());
    let program = parse("   \n// just a comment\n");
    assert!(program.body.is_empty());
}

#[test]
fn test_let_cannot_shadow_parameter_at_top_level() {
    let err = koda_parser::parse_function_body("let circle = 5;", &["clear", "circle"])
        .expect_err("parameter redeclared");
    assert_eq!(err.message, "Identifier 'circle' has already been declared");
    koda_parser::parse_function_body("var circle = 5;\n{ let clear = 1; }", &["clear", "circle"])
        .expect("var and nested let are allowed");
}

#[test]
fn test_break_outside_loop() {
    let err = parse_err("clear();\nbreak;");
    assert_eq!(err.message, "Illegal break statement");
    assert_eq!(err.line_number, Some(2));
    let err = parse_err("while (true) { function f() { continue; } }");
    assert_eq!(
        err.message,
        "Illegal continue statement: no surrounding iteration statement"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Nesting limit
// ─────────────────────────────────────────────────────────────────────

fn nested_arrays(depth: usize) -> String {
    format!("let x = {}1{};", "[".repeat(depth), "]".repeat(depth))
}

fn assert_too_deep(err: &ScriptError) {
    assert_eq!(err.kind, ErrorKind::RangeError);
    assert_eq!(err.message, "Maximum call stack size exceeded");
    assert_eq!(err.line_number, Some(1));
}

#[test]
fn test_moderate_nesting_parses() {
    parse(&nested_arrays(40));
    parse(&format!("let b = {}true;", "!".repeat(50)));
    parse(&format!("let n = {};", vec!["1"; 50].join(" + ")));
    parse(&format!("let s = a{};", ".b".repeat(50)));
}

#[test]
fn test_deep_nesting_is_a_range_error() {
    // Deeper than any host stack should be asked to recurse
    let source = nested_arrays(3000);
    let err = std::thread::Builder::new()
        .stack_size(32 << 20)
        .spawn(move || parse_program(&source).unwrap_err())
        .unwrap()
        .join()
        .unwrap();
    assert_too_deep(&err);
}

#[test]
fn test_long_chains_count_as_nesting() {
    assert_too_deep(&parse_err(&format!("!{}x;", "!".repeat(200))));
    assert_too_deep(&parse_err(&format!("let n = {};", vec!["1"; 500].join(" + "))));
    assert_too_deep(&parse_err(&format!("f{};", "()".repeat(500))));
}

#[test]
fn test_nesting_limit_error_keeps_its_line() {
    let source = format!("clear();\n\nlet n = {};", vec!["1"; 500].join(" * "));
    let err = parse_err(&source);
    assert_eq!(err.kind, ErrorKind::RangeError);
    assert_eq!(err.line_number, Some(3));
}
