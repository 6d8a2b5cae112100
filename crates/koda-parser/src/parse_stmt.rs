//! Statement parsing.

use std::rc::Rc;

use crate::parser::{Binding, Parser};
use koda_lexer::token::TokenKind;
use koda_types::ast::*;

impl Parser {
    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        self.push_scope(false);
        let stmts = self.parse_statements_until_rbrace()?;
        self.pop_scope();
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Block { stmts, span })
    }

    /// Statements up to (not including) the closing `}`.
    pub(crate) fn parse_statements_until_rbrace(&mut self) -> Option<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            stmts.push(self.parse_statement()?);
        }
        Some(stmts)
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            TokenKind::Semicolon => {
                let span = self.advance().span;
                Some(Stmt::Empty(span))
            }
            TokenKind::Var => self.parse_var_statement(VarKind::Var),
            TokenKind::Let => self.parse_var_statement(VarKind::Let),
            TokenKind::Const => self.parse_var_statement(VarKind::Const),
            TokenKind::Function => self.parse_function_decl(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Break => {
                let span = self.advance().span;
                if self.loop_depth == 0 {
                    self.error_at("Illegal break statement", span);
                    return None;
                }
                self.consume_semicolon()?;
                Some(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                if self.loop_depth == 0 {
                    self.error_at(
                        "Illegal continue statement: no surrounding iteration statement",
                        span,
                    );
                    return None;
                }
                self.consume_semicolon()?;
                Some(Stmt::Continue(span))
            }
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Throw => self.parse_throw_stmt(),
            _ => {
                // Expression statement
                let expr = self.parse_expression()?;
                let span = expr.span;
                self.consume_semicolon()?;
                Some(Stmt::Expr(ExprStmt { expr, span }))
            }
        }
    }

    /// `var|let|const` declaration followed by a terminator.
    fn parse_var_statement(&mut self, kind: VarKind) -> Option<Stmt> {
        let decl = self.parse_var_decl(kind)?;
        self.consume_semicolon()?;
        Some(Stmt::VarDecl(decl))
    }

    /// `let a = 1, b` (without the terminator, so `for` headers can reuse it).
    pub(crate) fn parse_var_decl(&mut self, kind: VarKind) -> Option<VarDecl> {
        let start = self.current_span();
        self.advance(); // eat keyword
        let mut declarators = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let binding = if kind.is_lexical() {
                Binding::Lexical
            } else {
                Binding::Var
            };
            self.declare(&name, binding)?;
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                if kind == VarKind::Const {
                    self.error_at_current("Missing initializer in const declaration");
                    return None;
                }
                None
            };
            declarators.push(Declarator { name, init });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let span = start.merge(self.previous_span());
        Some(VarDecl {
            kind,
            declarators,
            span,
        })
    }

    /// `function name(params) { body }`
    fn parse_function_decl(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `function`
        let name = self.expect_identifier()?;
        self.declare(&name, Binding::Function)?;
        let (params, body) = self.parse_function_rest()?;
        let span = start.merge(self.previous_span());
        let function = Rc::new(FunctionExpr {
            name: Some(name.name.clone()),
            params,
            body: FunctionBody::Block(body),
            span,
        });
        Some(Stmt::Function(FunctionDecl {
            name,
            function,
            span,
        }))
    }

    /// `(params) { body }` shared by declarations and function expressions.
    pub(crate) fn parse_function_rest(&mut self) -> Option<(Vec<Ident>, Block)> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.expect_identifier()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_function_body(&params)?;
        Some((params, body))
    }

    /// `{ body }` in a fresh function scope with `params` already declared.
    pub(crate) fn parse_function_body(&mut self, params: &[Ident]) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        self.push_scope(true);
        for param in params {
            self.declare(param, Binding::Var)?;
        }
        let outer_loops = std::mem::take(&mut self.loop_depth);
        let stmts = self.parse_statements_until_rbrace()?;
        self.loop_depth = outer_loops;
        self.pop_scope();
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Block { stmts, span })
    }

    /// `if (cond) stmt [else stmt]`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `if`
        let condition = self.parse_paren_condition()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    /// `while (cond) body`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `while`
        let condition = self.parse_paren_condition()?;
        let body = Box::new(self.parse_loop_body()?);
        let span = start.merge(self.previous_span());
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `do body while (cond)`; the trailing `;` is always optional.
    fn parse_do_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `do`
        let body = Box::new(self.parse_loop_body()?);
        self.expect(&TokenKind::While)?;
        let condition = self.parse_paren_condition()?;
        self.eat(&TokenKind::Semicolon);
        let span = start.merge(self.previous_span());
        Some(Stmt::DoWhile(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `for (init; cond; update) body`
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `for`
        self.expect(&TokenKind::LParen)?;
        // The header's `let` bindings live in their own scope
        self.push_scope(false);

        let init = match self.peek_kind() {
            TokenKind::Semicolon => None,
            TokenKind::Var => Some(ForInit::VarDecl(self.parse_var_decl(VarKind::Var)?)),
            TokenKind::Let => Some(ForInit::VarDecl(self.parse_var_decl(VarKind::Let)?)),
            TokenKind::Const => Some(ForInit::VarDecl(self.parse_var_decl(VarKind::Const)?)),
            _ => Some(ForInit::Expr(self.parse_expression()?)),
        };
        self.expect(&TokenKind::Semicolon)?;

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;

        let body = Box::new(self.parse_loop_body()?);
        self.pop_scope();
        let span = start.merge(self.previous_span());
        Some(Stmt::For(ForStmt {
            init,
            condition,
            update,
            body,
            span,
        }))
    }

    /// `return [expr]`; a line break right after `return` ends the statement.
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `return`
        let value = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.at_end()
            || self.newline_before()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `throw expr`
    fn parse_throw_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `throw`
        if self.newline_before() && !self.at_end() {
            self.error_at_current("Illegal newline after throw");
            return None;
        }
        let value = self.parse_expression()?;
        self.consume_semicolon()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::Throw(ThrowStmt { value, span }))
    }

    fn parse_loop_body(&mut self) -> Option<Stmt> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body
    }

    /// `( expr )` around `if`/`while` conditions.
    fn parse_paren_condition(&mut self) -> Option<Expr> {
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        Some(condition)
    }
}
