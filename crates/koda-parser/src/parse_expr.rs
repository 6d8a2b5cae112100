//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 10. `=`, `+=`, `-=`, `*=`, `/=`, `%=`, arrow functions (right-assoc)
//! 9. `? :`
//! 8. `||`
//! 7. `&&`
//! 6. `==`, `!=`, `===`, `!==`
//! 5. `<`, `>`, `<=`, `>=`
//! 4. `+`, `-`
//! 3. `*`, `/`, `%`
//! 2. unary `!`, `-`, `+`, `typeof`, prefix `++`/`--`
//! 1. postfix `++`/`--`, `.` / `[]` (member), `()` (call)

use std::rc::Rc;

use koda_lexer::token::TokenKind;
use koda_types::ast::*;
use koda_types::Span;

use crate::parser::Parser;

impl Parser {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Assignment & Arrows
    // ══════════════════════════════════════════════════════════════════════════

    /// `Assign = Arrow | Conditional [ AssignOp Assign ]`
    pub(crate) fn parse_assignment(&mut self) -> Option<Expr> {
        self.nested(Self::parse_assignment_inner)
    }

    fn parse_assignment_inner(&mut self) -> Option<Expr> {
        // `x => ...`
        if matches!(self.peek_kind(), TokenKind::Identifier(_))
            && self.look_ahead(1) == &TokenKind::Arrow
        {
            let start = self.current_span();
            let param = self.expect_identifier()?;
            self.advance(); // eat `=>`
            return self.parse_arrow_body(start, vec![param]);
        }
        // `(a, b) => ...`
        if self.check(&TokenKind::LParen) && self.is_arrow_ahead() {
            return self.parse_paren_arrow();
        }

        let target = self.parse_conditional()?;
        let Some(op) = self.match_assign_op() else {
            return Some(target);
        };
        if !is_assignable(&target) {
            self.error_at("Invalid left-hand side in assignment", target.span);
            return None;
        }
        self.advance(); // consume operator
        let value = self.parse_assignment()?;
        let span = target.span.merge(value.span);
        Some(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                op,
                value: Box::new(value),
            },
            span,
        ))
    }

    fn match_assign_op(&self) -> Option<AssignOp> {
        match self.peek_kind() {
            TokenKind::Eq => Some(AssignOp::Assign),
            TokenKind::PlusEq => Some(AssignOp::Add),
            TokenKind::MinusEq => Some(AssignOp::Sub),
            TokenKind::StarEq => Some(AssignOp::Mul),
            TokenKind::SlashEq => Some(AssignOp::Div),
            TokenKind::PercentEq => Some(AssignOp::Mod),
            _ => None,
        }
    }

    /// `(a, b) => body` with the cursor on `(`.
    fn parse_paren_arrow(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `(`
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.expect_identifier()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Arrow)?;
        self.parse_arrow_body(start, params)
    }

    /// Block or concise body after `=>`.
    fn parse_arrow_body(&mut self, start: Span, params: Vec<Ident>) -> Option<Expr> {
        let body = if self.check(&TokenKind::LBrace) {
            FunctionBody::Block(self.parse_function_body(&params)?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_assignment()?))
        };
        let span = start.merge(self.previous_span());
        let function = Rc::new(FunctionExpr {
            name: None,
            params,
            body,
            span,
        });
        Some(Expr::new(ExprKind::Function(function), span))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Conditional = Or [ "?" Assign ":" Assign ]`
    fn parse_conditional(&mut self) -> Option<Expr> {
        let condition = self.parse_or()?;
        if !self.eat(&TokenKind::Question) {
            return Some(condition);
        }
        let then_expr = self.parse_assignment()?;
        self.expect(&TokenKind::Colon)?;
        let else_expr = self.parse_assignment()?;
        let span = condition.span.merge(else_expr.span);
        Some(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    /// `Or = And { "||" And }`
    fn parse_or(&mut self) -> Option<Expr> {
        let depth = self.nesting();
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::OrOr) {
            self.deepen()?;
            let right = self.parse_and()?;
            left = logical(left, LogicalOp::Or, right);
        }
        self.restore_nesting(depth);
        Some(left)
    }

    /// `And = Equality { "&&" Equality }`
    fn parse_and(&mut self) -> Option<Expr> {
        let depth = self.nesting();
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AndAnd) {
            self.deepen()?;
            let right = self.parse_equality()?;
            left = logical(left, LogicalOp::And, right);
        }
        self.restore_nesting(depth);
        Some(left)
    }

    /// `Equality = Relational { EqOp Relational }`
    fn parse_equality(&mut self) -> Option<Expr> {
        let depth = self.nesting();
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                TokenKind::EqEqEq => BinOp::StrictEq,
                TokenKind::BangEqEq => BinOp::StrictNotEq,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            let right = self.parse_relational()?;
            left = binary(left, op, right);
        }
        self.restore_nesting(depth);
        Some(left)
    }

    /// `Relational = Additive { RelOp Additive }`
    fn parse_relational(&mut self) -> Option<Expr> {
        let depth = self.nesting();
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinOp::Less,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
        self.restore_nesting(depth);
        Some(left)
    }

    /// `Additive = Multiplicative { ("+" | "-") Multiplicative }`
    fn parse_additive(&mut self) -> Option<Expr> {
        let depth = self.nesting();
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        self.restore_nesting(depth);
        Some(left)
    }

    /// `Multiplicative = Unary { ("*" | "/" | "%") Unary }`
    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let depth = self.nesting();
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        self.restore_nesting(depth);
        Some(left)
    }

    /// `Unary = ("!" | "-" | "+" | "typeof") Unary | ("++" | "--") Unary | Postfix`
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Typeof => UnaryOp::TypeOf,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = self.advance().kind == TokenKind::PlusPlus;
                let target = self.nested(Self::parse_unary)?;
                if !is_assignable(&target) {
                    self.error_at(
                        "Invalid left-hand side expression in prefix operation",
                        target.span,
                    );
                    return None;
                }
                let span = start.merge(target.span);
                return Some(Expr::new(
                    ExprKind::Update {
                        target: Box::new(target),
                        increment,
                        prefix: true,
                    },
                    span,
                ));
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `Postfix = Call [ "++" | "--" ]`, with no line break before the operator.
    fn parse_postfix(&mut self) -> Option<Expr> {
        let expr = self.parse_call()?;
        let increment = match self.peek_kind() {
            TokenKind::PlusPlus if !self.newline_before() => true,
            TokenKind::MinusMinus if !self.newline_before() => false,
            _ => return Some(expr),
        };
        if !is_assignable(&expr) {
            self.error_at(
                "Invalid left-hand side expression in postfix operation",
                expr.span,
            );
            return None;
        }
        self.advance();
        let span = expr.span.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Update {
                target: Box::new(expr),
                increment,
                prefix: false,
            },
            span,
        ))
    }

    /// `Call = Primary { "." Name | "[" Expr "]" | "(" Args ")" }`
    fn parse_call(&mut self) -> Option<Expr> {
        let depth = self.nesting();
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(
                self.peek_kind(),
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.deepen()?;
            }
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    let span = expr.span.merge(name.span);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property: Box::new(PropertyKey::Named(name)),
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property: Box::new(PropertyKey::Computed(index)),
                        },
                        span,
                    );
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_arguments()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        self.restore_nesting(depth);
        Some(expr)
    }

    /// Comma-separated arguments after `(`, through the closing `)`.
    fn parse_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_assignment()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::NumberLit(n) => {
                self.advance();
                Some(Expr::new(ExprKind::NumberLit(n), span))
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Some(Expr::new(ExprKind::StringLit(s), span))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(true), span))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(false), span))
            }
            TokenKind::Null => {
                self.advance();
                Some(Expr::new(ExprKind::NullLit, span))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Some(Expr::new(ExprKind::Identifier(name), span))
            }
            TokenKind::TemplateString(s) => {
                self.advance();
                Some(Expr::new(
                    ExprKind::Template(vec![TemplatePart::Literal(s)]),
                    span,
                ))
            }
            TokenKind::TemplateStart(s) => self.parse_template(s),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                let span = span.merge(self.previous_span());
                Some(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::Function => self.parse_function_expr(),
            _ => self.unexpected(),
        }
    }

    /// Interpolated template, with the cursor on `TemplateStart`.
    fn parse_template(&mut self, head: String) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat TemplateStart
        let mut parts = vec![TemplatePart::Literal(head)];
        loop {
            self.expect(&TokenKind::InterpolationStart)?;
            parts.push(TemplatePart::Expr(self.parse_expression()?));
            self.expect(&TokenKind::InterpolationEnd)?;
            match self.peek_kind().clone() {
                TokenKind::TemplatePart(text) => {
                    self.advance();
                    parts.push(TemplatePart::Literal(text));
                }
                TokenKind::TemplateEnd(text) => {
                    self.advance();
                    parts.push(TemplatePart::Literal(text));
                    break;
                }
                _ => return self.unexpected(),
            }
        }
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Template(parts), span))
    }

    /// `[a, b, c]`, trailing comma allowed.
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `[`
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            items.push(self.parse_assignment()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ArrayLit(items), span))
    }

    /// `{ key: value, shorthand }`, trailing comma allowed.
    fn parse_object_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `{`
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let key_span = self.current_span();
            let (key, shorthand) = match self.peek_kind().clone() {
                TokenKind::StringLiteral(s) => {
                    self.advance();
                    (s, false)
                }
                TokenKind::NumberLit(n) => {
                    self.advance();
                    (number_key(n), false)
                }
                TokenKind::Identifier(_) => (self.expect_property_name()?.name, true),
                _ => (self.expect_property_name()?.name, false),
            };
            let value = if self.eat(&TokenKind::Colon) {
                self.parse_assignment()?
            } else if shorthand {
                Expr::new(ExprKind::Identifier(key.clone()), key_span)
            } else {
                return self.unexpected();
            };
            fields.push((key, value));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ObjectLit(fields), span))
    }

    /// `function [name](params) { body }` in expression position.
    fn parse_function_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `function`
        let name = match self.peek_kind() {
            TokenKind::Identifier(_) => Some(self.expect_identifier()?.name),
            _ => None,
        };
        let (params, body) = self.parse_function_rest()?;
        let span = start.merge(self.previous_span());
        let function = Rc::new(FunctionExpr {
            name,
            params,
            body: FunctionBody::Block(body),
            span,
        });
        Some(Expr::new(ExprKind::Function(function), span))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

/// Identifiers and member accesses, possibly parenthesised.
fn is_assignable(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Identifier(_) | ExprKind::Member { .. } => true,
        ExprKind::Paren(inner) => is_assignable(inner),
        _ => false,
    }
}

/// Numeric object keys are stored under their canonical string form.
fn number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
