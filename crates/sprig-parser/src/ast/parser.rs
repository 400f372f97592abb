//! Recursive-descent parser for Sprig.
//!
//! The parser consumes the token stream produced by the lexer and builds
//! the arena-allocated AST. Errors use panic-mode recovery: the offending
//! statement is replaced by a placeholder, the parser synchronizes on the
//! next statement boundary, and parsing continues so one mistake does not
//! hide the rest of the file.

use std::fmt;

use bumpalo::Bump;

use sprig_core::{LexError, ParseError, ParseErrorKind, Span};

use crate::ast::expr::{
    BinaryExpr, CallExpr, Expr, GroupingExpr, LiteralExpr, LiteralKind, UnaryExpr, VariableExpr,
};
use crate::ast::ops::{BinaryOp, UnaryOp};
use crate::ast::stmt::{
    Block, ExprStmt, FunDecl, IfStmt, LetStmt, PrintStmt, ReturnStmt, Stmt, WhileStmt,
};
use crate::ast::{Ident, Program};
use crate::lexer::{Lexer, Token, TokenKind};

/// All errors from one front-end run, lexing and parsing combined.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseErrors {
    /// Tokenization errors.
    pub lex: Vec<LexError>,
    /// Parser errors.
    pub parse: Vec<ParseError>,
}

impl ParseErrors {
    /// Whether any error was recorded.
    pub fn is_empty(&self) -> bool {
        self.lex.is_empty() && self.parse.is_empty()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for err in &self.lex {
            writeln!(f, "{err}")?;
        }
        for err in &self.parse {
            writeln!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

/// Recursive-descent parser for Sprig source code.
pub struct Parser<'ast> {
    tokens: Vec<Token<'ast>>,
    current: usize,
    arena: &'ast Bump,
    errors: Vec<ParseError>,
}

impl<'ast> Parser<'ast> {
    /// Parse source text into a program tree.
    ///
    /// Returns the program on success, or every lex and parse error found
    /// when the source is malformed.
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<Program<'ast>, ParseErrors> {
        let (tokens, lex_errors) = Lexer::new(source, arena).scan_tokens();
        let mut parser = Self {
            tokens,
            current: 0,
            arena,
            errors: Vec::new(),
        };
        let program = parser.parse_program();
        if lex_errors.is_empty() && parser.errors.is_empty() {
            Ok(program)
        } else {
            Err(ParseErrors {
                lex: lex_errors,
                parse: parser.errors,
            })
        }
    }

    fn parse_program(&mut self) -> Program<'ast> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            stmts.push(self.declaration());
        }
        Program::new(self.arena.alloc_slice_copy(&stmts))
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    /// Parse one declaration or statement, recovering on error.
    fn declaration(&mut self) -> Stmt<'ast> {
        let result = if self.matches(TokenKind::Fn) {
            let kw = self.previous();
            self.fun_decl(kw.span)
        } else if self.matches(TokenKind::Let) {
            let kw = self.previous();
            self.var_decl(kw.span)
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => stmt,
            Err(err) => {
                let span = err.span;
                self.errors.push(err);
                self.synchronize();
                // Placeholder so the surrounding program shape survives.
                Stmt::Expr(ExprStmt {
                    expr: Expr::Literal(LiteralExpr {
                        kind: LiteralKind::Nil,
                        span,
                    }),
                    span,
                })
            }
        }
    }

    fn fun_decl(&mut self, kw_span: Span) -> Result<Stmt<'ast>, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expect function name.")?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param = self.consume(TokenKind::Identifier, "Expect parameter name.")?;
                params.push(Ident::new(param.lexeme, param.span));
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block_items()?;

        let decl = self.arena.alloc(FunDecl {
            name: Ident::new(name.lexeme, name.span),
            params: self.arena.alloc_slice_copy(&params),
            body,
            span: kw_span,
        });
        Ok(Stmt::Fun(decl))
    }

    fn var_decl(&mut self, kw_span: Span) -> Result<Stmt<'ast>, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let init = if self.matches(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Let(LetStmt {
            name: Ident::new(name.lexeme, name.span),
            init,
            span: kw_span,
        }))
    }

    fn statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        if self.matches(TokenKind::If) {
            let kw = self.previous();
            return self.if_stmt(kw.span);
        }
        if self.matches(TokenKind::While) {
            let kw = self.previous();
            return self.while_stmt(kw.span);
        }
        if self.matches(TokenKind::Return) {
            let kw = self.previous();
            return self.return_stmt(kw.span);
        }
        if self.matches(TokenKind::Print) {
            let kw = self.previous();
            return self.print_stmt(kw.span);
        }
        if self.matches(TokenKind::LeftBrace) {
            let brace = self.previous();
            let stmts = self.block_items()?;
            return Ok(Stmt::Block(Block {
                stmts,
                span: brace.span,
            }));
        }
        self.expr_stmt()
    }

    fn if_stmt(&mut self, kw_span: Span) -> Result<Stmt<'ast>, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let then_branch = self.statement()?;
        let else_branch = if self.matches(TokenKind::Else) {
            Some(self.statement()?)
        } else {
            None
        };
        let stmt = self.arena.alloc(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: kw_span,
        });
        Ok(Stmt::If(stmt))
    }

    fn while_stmt(&mut self, kw_span: Span) -> Result<Stmt<'ast>, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = self.statement()?;
        let stmt = self.arena.alloc(WhileStmt {
            condition,
            body,
            span: kw_span,
        });
        Ok(Stmt::While(stmt))
    }

    fn return_stmt(&mut self, kw_span: Span) -> Result<Stmt<'ast>, ParseError> {
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: kw_span,
        }))
    }

    fn print_stmt(&mut self, kw_span: Span) -> Result<Stmt<'ast>, ParseError> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(PrintStmt {
            value,
            span: kw_span,
        }))
    }

    fn expr_stmt(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expr(ExprStmt {
            expr,
            span: expr.span(),
        }))
    }

    /// Parse statements up to and including the closing `}`.
    fn block_items(&mut self) -> Result<&'ast [Stmt<'ast>], ParseError> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration());
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(self.arena.alloc_slice_copy(&stmts))
    }

    // ==========================================================================
    // Expressions (precedence climbing, lowest first)
    // ==========================================================================

    fn expression(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr<'ast>, ParseError> {
        let mut expr = self.and()?;
        while let Some(op_tok) = self.match_op(&[TokenKind::PipePipe]) {
            let right = self.and()?;
            expr = self.binary(expr, BinaryOp::Or, right, op_tok.span);
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr<'ast>, ParseError> {
        let mut expr = self.equality()?;
        while let Some(op_tok) = self.match_op(&[TokenKind::AmpAmp]) {
            let right = self.equality()?;
            expr = self.binary(expr, BinaryOp::And, right, op_tok.span);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr<'ast>, ParseError> {
        let mut expr = self.comparison()?;
        while let Some(op_tok) = self.match_op(&[TokenKind::EqualEqual, TokenKind::BangEqual]) {
            let op = match op_tok.kind {
                TokenKind::EqualEqual => BinaryOp::Equal,
                _ => BinaryOp::NotEqual,
            };
            let right = self.comparison()?;
            expr = self.binary(expr, op, right, op_tok.span);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr<'ast>, ParseError> {
        let mut expr = self.term()?;
        while let Some(op_tok) = self.match_op(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let op = match op_tok.kind {
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                TokenKind::Less => BinaryOp::Less,
                _ => BinaryOp::LessEqual,
            };
            let right = self.term()?;
            expr = self.binary(expr, op, right, op_tok.span);
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr<'ast>, ParseError> {
        let mut expr = self.factor()?;
        while let Some(op_tok) = self.match_op(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = match op_tok.kind {
                TokenKind::Plus => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            let right = self.factor()?;
            expr = self.binary(expr, op, right, op_tok.span);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr<'ast>, ParseError> {
        let mut expr = self.unary()?;
        while let Some(op_tok) = self.match_op(&[TokenKind::Star, TokenKind::Slash]) {
            let op = match op_tok.kind {
                TokenKind::Star => BinaryOp::Mul,
                _ => BinaryOp::Div,
            };
            let right = self.unary()?;
            expr = self.binary(expr, op, right, op_tok.span);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'ast>, ParseError> {
        if let Some(op_tok) = self.match_op(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = match op_tok.kind {
                TokenKind::Bang => UnaryOp::Not,
                _ => UnaryOp::Neg,
            };
            let right = self.unary()?;
            let node = self.arena.alloc(UnaryExpr {
                op,
                right,
                span: op_tok.span,
            });
            return Ok(Expr::Unary(node));
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr<'ast>, ParseError> {
        let mut expr = self.primary()?;
        while self.matches(TokenKind::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr<'ast>) -> Result<Expr<'ast>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        let node = self.arena.alloc(CallExpr {
            callee,
            args: self.arena.alloc_slice_copy(&args),
            span: callee.span(),
        });
        Ok(Expr::Call(node))
    }

    fn primary(&mut self) -> Result<Expr<'ast>, ParseError> {
        if self.matches(TokenKind::Int) {
            let tok = self.previous();
            let value = tok.lexeme.parse::<i64>().map_err(|_| {
                ParseError::new(
                    ParseErrorKind::ExpectedExpression,
                    "Integer literal out of range.",
                    tok.span,
                )
            })?;
            return Ok(Expr::Literal(LiteralExpr {
                kind: LiteralKind::Int(value),
                span: tok.span,
            }));
        }
        if self.matches(TokenKind::True) {
            return Ok(Expr::Literal(LiteralExpr {
                kind: LiteralKind::Bool(true),
                span: self.previous().span,
            }));
        }
        if self.matches(TokenKind::False) {
            return Ok(Expr::Literal(LiteralExpr {
                kind: LiteralKind::Bool(false),
                span: self.previous().span,
            }));
        }
        if self.matches(TokenKind::Identifier) {
            let tok = self.previous();
            return Ok(Expr::Variable(VariableExpr {
                name: Ident::new(tok.lexeme, tok.span),
            }));
        }
        if self.matches(TokenKind::LeftParen) {
            let paren = self.previous();
            let expr = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            let node = self.arena.alloc(GroupingExpr {
                expr,
                span: paren.span,
            });
            return Ok(Expr::Grouping(node));
        }
        Err(self.error_at_peek(ParseErrorKind::ExpectedExpression, "Expect expression."))
    }

    fn binary(
        &mut self,
        left: Expr<'ast>,
        op: BinaryOp,
        right: Expr<'ast>,
        op_span: Span,
    ) -> Expr<'ast> {
        let node = self.arena.alloc(BinaryExpr {
            left,
            op,
            right,
            op_span,
            span: left.span(),
        });
        Expr::Binary(node)
    }

    // ==========================================================================
    // Token helpers
    // ==========================================================================

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_op(&mut self, kinds: &[TokenKind]) -> Option<Token<'ast>> {
        for &kind in kinds {
            if self.check(kind) {
                return Some(self.advance());
            }
        }
        None
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_peek(ParseErrorKind::ExpectedToken, message))
        }
    }

    fn error_at_peek(&self, kind: ParseErrorKind, message: &str) -> ParseError {
        ParseError::new(kind, message, self.peek().span)
    }

    /// Skip forward to the next likely statement boundary.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Let
                | TokenKind::Fn
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> Token<'ast> {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> Token<'ast> {
        self.tokens[self.current]
    }

    fn previous(&self) -> Token<'ast> {
        self.tokens[self.current - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<'ast>(source: &str, arena: &'ast Bump) -> Program<'ast> {
        Parser::parse(source, arena).expect("program should parse")
    }

    #[test]
    fn parses_let_with_initializer() {
        let arena = Bump::new();
        let program = parse("let x = 3;", &arena);
        assert_eq!(program.stmts().len(), 1);
        let Stmt::Let(decl) = &program.stmts()[0] else {
            panic!("expected let statement");
        };
        assert_eq!(decl.name.name, "x");
        assert!(decl.init.is_some());
    }

    #[test]
    fn parses_let_without_initializer() {
        let arena = Bump::new();
        let program = parse("let x;", &arena);
        let Stmt::Let(decl) = &program.stmts()[0] else {
            panic!("expected let statement");
        };
        assert!(decl.init.is_none());
    }

    #[test]
    fn parses_function_declaration() {
        let arena = Bump::new();
        let program = parse("fn add(a, b) { return a + b; }", &arena);
        let Stmt::Fun(decl) = &program.stmts()[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(decl.name.name, "add");
        assert_eq!(decl.params.len(), 2);
        assert_eq!(decl.body.len(), 1);
        assert!(matches!(decl.body[0], Stmt::Return(_)));
    }

    #[test]
    fn parses_if_else() {
        let arena = Bump::new();
        let program = parse("if (true) { print(1); } else { print(2); }", &arena);
        let Stmt::If(stmt) = &program.stmts()[0] else {
            panic!("expected if statement");
        };
        assert!(stmt.else_branch.is_some());
    }

    #[test]
    fn parses_while_loop() {
        let arena = Bump::new();
        let program = parse("while (x < 10) { x; }", &arena);
        let Stmt::While(stmt) = &program.stmts()[0] else {
            panic!("expected while statement");
        };
        assert!(matches!(stmt.body, Stmt::Block(_)));
    }

    #[test]
    fn precedence_mul_binds_tighter_than_add() {
        let arena = Bump::new();
        let program = parse("1 + 2 * 3;", &arena);
        let Stmt::Expr(stmt) = &program.stmts()[0] else {
            panic!("expected expression statement");
        };
        let Expr::Binary(add) = stmt.expr else {
            panic!("expected binary expression");
        };
        assert_eq!(add.op, BinaryOp::Add);
        let Expr::Binary(mul) = add.right else {
            panic!("expected nested multiplication");
        };
        assert_eq!(mul.op, BinaryOp::Mul);
    }

    #[test]
    fn call_binds_tighter_than_unary() {
        let arena = Bump::new();
        let program = parse("-f(1);", &arena);
        let Stmt::Expr(stmt) = &program.stmts()[0] else {
            panic!("expected expression statement");
        };
        let Expr::Unary(neg) = stmt.expr else {
            panic!("expected unary expression");
        };
        assert!(matches!(neg.right, Expr::Call(_)));
    }

    #[test]
    fn missing_semicolon_is_reported_and_recovered() {
        let arena = Bump::new();
        let err = Parser::parse("let x = 1\nprint(x);", &arena).unwrap_err();
        assert_eq!(err.parse.len(), 1);
        assert!(err.parse[0].message.contains("';'"));
    }

    #[test]
    fn error_recovery_continues_past_bad_statement() {
        let arena = Bump::new();
        // Two independent mistakes should both be reported.
        let err = Parser::parse("let = 1;\nlet y 2;", &arena).unwrap_err();
        assert_eq!(err.parse.len(), 2);
    }
}
