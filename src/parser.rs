//! Parser for the mini-C front end
//!
//! A recursive descent parser that converts tokens into an AST, with one
//! function per precedence level for expressions.
//!
//! Error recovery is panic-mode: a failed statement is reported, the parser
//! resynchronizes at a statement boundary and keeps going, so several syntax
//! errors inside one declaration can surface in a single run. The top-level
//! declaration loop stops after the first declaration that produced errors,
//! so a broken token stream yields a bounded prefix of diagnostics.

use crate::ast::*;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("expected {expected}, found {found} on line {line}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        line: usize,
        span: Span,
    },

    #[error("unexpected end of file")]
    UnexpectedEof { span: Span },

    #[error("{message} on line {line}")]
    Custom {
        message: String,
        line: usize,
        span: Span,
    },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span } => *span,
            ParseError::Custom { span, .. } => *span,
        }
    }
}

/// Parse result
pub type ParseResult<T> = Result<T, ParseError>;

/// The mini-C parser
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    previous: Token,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    /// Create a new parser
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let previous = current.clone();

        Self {
            lexer,
            current,
            previous,
            errors: Vec::new(),
        }
    }

    /// Get the source code
    pub fn source(&self) -> &'src str {
        self.lexer.source()
    }

    /// Get parse errors
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Advance to the next token; idempotent at `Eof`
    fn advance(&mut self) -> Token {
        self.previous = self.current.clone();
        if self.current.kind != TokenKind::Eof {
            self.current = self.lexer.next_token();
        }
        self.previous.clone()
    }

    /// Check if the current token matches
    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Check if at end of file
    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the current token if it matches, otherwise error
    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("{}", kind)))
        }
    }

    /// Consume the current token if it matches
    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Get the text of a token
    fn text(&self, token: &Token) -> &'src str {
        token.text(self.source())
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current.kind.clone(),
            line: self.current.span.line(self.source()),
            span: self.current.span,
        }
    }

    fn custom(&self, message: impl Into<String>, span: Span) -> ParseError {
        ParseError::Custom {
            message: message.into(),
            line: span.line(self.source()),
            span,
        }
    }

    // ============ Top-level parsing ============

    /// Parse a complete translation unit
    pub fn parse_program(&mut self) -> Program {
        let start = self.current.span.start;
        let mut decls = Vec::new();

        while !self.is_at_end() {
            match self.parse_function() {
                Ok(decl) => decls.push(decl),
                Err(e) => self.errors.push(e),
            }
            // A failed declaration halts the top-level loop; statement-level
            // recovery inside parse_block may already have recorded errors.
            if !self.errors.is_empty() {
                break;
            }
        }

        let end = self.previous.span.end;
        Program {
            decls,
            span: Span::new(start, end),
        }
    }

    /// Resynchronize at a statement boundary after an error
    fn synchronize(&mut self) {
        if self.check(TokenKind::RBrace) || self.is_at_end() {
            return;
        }
        self.advance();
        while !self.is_at_end() {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::RBrace
                | TokenKind::LBrace
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Int
                | TokenKind::Char
                | TokenKind::Void
                | TokenKind::Struct => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ============ Declarations ============

    fn parse_function(&mut self) -> ParseResult<FunctionDecl> {
        let start = self.current.span.start;
        let return_type = self.parse_type_name()?;
        let name = self.parse_ident()?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;

        Ok(FunctionDecl {
            name,
            return_type,
            params,
            body,
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();

        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(params)
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        let start = self.current.span.start;
        let ty = self.parse_type_name()?;
        let name = self.parse_ident()?;
        Ok(Param {
            ty,
            name,
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_type_name(&mut self) -> ParseResult<TypeName> {
        let start = self.current.span.start;
        let kind = match self.current.kind {
            TokenKind::Int => {
                self.advance();
                TypeNameKind::Int
            }
            TokenKind::Char => {
                self.advance();
                TypeNameKind::Char
            }
            TokenKind::Void => {
                self.advance();
                TypeNameKind::Void
            }
            TokenKind::Struct => {
                self.advance();
                let name = self.parse_ident()?;
                TypeNameKind::Struct(name.name)
            }
            _ => return Err(self.unexpected("type name")),
        };
        Ok(TypeName {
            kind,
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        let token = self.expect(TokenKind::Ident)?;
        let name = self.text(&token).to_string();
        Ok(Ident::new(name, token.span))
    }

    // ============ Statements ============

    fn parse_block(&mut self) -> ParseResult<Block> {
        let start = self.current.span.start;
        self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        if self.current.kind.starts_type() {
            return self.parse_var_decl();
        }

        match self.current.kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Stmt {
                    kind: StmtKind::Block(block),
                    span,
                })
            }
            TokenKind::Ident if self.text(&self.current) == "printf" => self.parse_print(),
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_var_decl(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span.start;
        let ty = self.parse_type_name()?;
        let name = self.parse_ident()?;
        self.expect(TokenKind::Eq)?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt {
            kind: StmtKind::VarDecl { ty, name, init },
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span.start;
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.consume(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span.start;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);

        Ok(Stmt {
            kind: StmtKind::While { cond, body },
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span.start;
        self.expect(TokenKind::Return)?;

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt {
            kind: StmtKind::Return(value),
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_print(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span.start;
        self.advance(); // the `printf` identifier
        self.expect(TokenKind::LParen)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt {
            kind: StmtKind::Print(value),
            span: Span::new(start, self.previous.span.end),
        })
    }

    fn parse_expr_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span.start;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt {
            kind: StmtKind::Expr(expr),
            span: Span::new(start, self.previous.span.end),
        })
    }

    // ============ Expression parsing ============

    /// Parse a single expression
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_or()?;

        if self.check(TokenKind::Eq) {
            let start = expr.span.start;
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(Expr {
                kind: ExprKind::Assign {
                    target: Box::new(expr),
                    value: Box::new(value),
                },
                span: Span::new(start, self.previous.span.end),
            });
        }

        // Compound assignments desugar into a plain assignment with a
        // binary right side: `a += b` becomes `a = a + b`.
        let op = match self.current.kind {
            TokenKind::PlusEq => Some(BinaryOp::Add),
            TokenKind::MinusEq => Some(BinaryOp::Sub),
            TokenKind::StarEq => Some(BinaryOp::Mul),
            TokenKind::SlashEq => Some(BinaryOp::Div),
            _ => None,
        };

        if let Some(op) = op {
            let start = expr.span.start;
            let op_span = self.current.span;
            self.advance();
            let value = self.parse_assignment()?;
            let value_span = Span::new(expr.span.start, value.span.end);
            return Ok(Expr {
                kind: ExprKind::Assign {
                    target: Box::new(expr.clone()),
                    value: Box::new(Expr {
                        kind: ExprKind::Binary {
                            op,
                            left: Box::new(expr),
                            right: Box::new(value),
                        },
                        span: op_span.merge(value_span),
                    }),
                },
                span: Span::new(start, self.previous.span.end),
            });
        }

        Ok(expr)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_and()?;

        while self.check(TokenKind::Ident) && self.text(&self.current) == "or" {
            let start = expr.span.start;
            self.advance();
            let right = self.parse_and()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op: BinaryOp::Or,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span: Span::new(start, self.previous.span.end),
            };
        }

        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_equality()?;

        while self.check(TokenKind::Ident) && self.text(&self.current) == "and" {
            let start = expr.span.start;
            self.advance();
            let right = self.parse_equality()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op: BinaryOp::And,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span: Span::new(start, self.previous.span.end),
            };
        }

        Ok(expr)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_comparison()?;

        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let start = expr.span.start;
            let right = self.parse_comparison()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span: Span::new(start, self.previous.span.end),
            };
        }

        Ok(expr)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_term()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let start = expr.span.start;
            let right = self.parse_term()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span: Span::new(start, self.previous.span.end),
            };
        }

        Ok(expr)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_factor()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let start = expr.span.start;
            let right = self.parse_factor()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span: Span::new(start, self.previous.span.end),
            };
        }

        Ok(expr)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_unary()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let start = expr.span.start;
            let right = self.parse_unary()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span: Span::new(start, self.previous.span.end),
            };
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current.span.start;

        let op = match self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Star => Some(UnaryOp::Deref),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span: Span::new(start, self.previous.span.end),
            });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(TokenKind::LParen) {
                // One-token lookahead: an identifier followed by `(` is a call
                let callee = match expr.kind {
                    ExprKind::Variable(ident) => ident,
                    _ => {
                        return Err(self.custom("only named functions can be called", expr.span))
                    }
                };
                let start = expr.span.start;
                self.advance();
                let args = self.parse_args()?;
                self.expect(TokenKind::RParen)?;
                expr = Expr {
                    kind: ExprKind::Call { callee, args },
                    span: Span::new(start, self.previous.span.end),
                };
            } else if self.consume(TokenKind::Dot) {
                let start = expr.span.start;
                let field = self.parse_ident()?;
                expr = Expr {
                    kind: ExprKind::Member {
                        base: Box::new(expr),
                        field,
                    },
                    span: Span::new(start, self.previous.span.end),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();

        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.current.kind {
            TokenKind::Number => {
                let token = self.advance();
                let value: i32 = self
                    .text(&token)
                    .parse()
                    .map_err(|_| self.custom("integer literal out of range", token.span))?;
                Ok(Expr {
                    kind: ExprKind::Literal(Literal::Int(value)),
                    span: token.span,
                })
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                let text = self.text(&token);
                // Strip the surrounding quotes; no escape processing
                let value = text[1..text.len() - 1].to_string();
                Ok(Expr {
                    kind: ExprKind::Literal(Literal::Str(value)),
                    span: token.span,
                })
            }
            TokenKind::Ident => {
                if self.text(&self.current) == "printf" {
                    let span = self.current.span;
                    return Err(self.custom("`printf` is a statement, not an expression", span));
                }
                let ident = self.parse_ident()?;
                let span = ident.span;
                Ok(Expr {
                    kind: ExprKind::Variable(ident),
                    span,
                })
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof {
                span: self.current.span,
            }),
            _ => Err(self.unexpected("expression")),
        }
    }
}

/// Helper function to parse source code
pub fn parse(source: &str) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    (program, parser.errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        program
    }

    fn parse_err(source: &str) -> Vec<ParseError> {
        let (_, errors) = parse(source);
        assert!(!errors.is_empty(), "expected parse errors");
        errors
    }

    #[test]
    fn test_empty_function() {
        let program = parse_ok("void main() { }");
        assert_eq!(program.decls.len(), 1);
        assert_eq!(program.decls[0].name.name, "main");
        assert_eq!(program.decls[0].return_type.kind, TypeNameKind::Void);
        assert!(program.decls[0].body.stmts.is_empty());
    }

    #[test]
    fn test_params() {
        let program = parse_ok("int add(int a, char b) { return a; }");
        let decl = &program.decls[0];
        assert_eq!(decl.params.len(), 2);
        assert_eq!(decl.params[0].name.name, "a");
        assert_eq!(decl.params[0].ty.kind, TypeNameKind::Int);
        assert_eq!(decl.params[1].ty.kind, TypeNameKind::Char);
    }

    #[test]
    fn test_struct_param() {
        let program = parse_ok("void f(struct Point p) { }");
        assert_eq!(
            program.decls[0].params[0].ty.kind,
            TypeNameKind::Struct("Point".to_string())
        );
    }

    #[test]
    fn test_var_decl() {
        let program = parse_ok("void main() { int x = 1 + 2; }");
        let stmt = &program.decls[0].body.stmts[0];
        match &stmt.kind {
            StmtKind::VarDecl { ty, name, init } => {
                assert_eq!(ty.kind, TypeNameKind::Int);
                assert_eq!(name.name, "x");
                assert!(matches!(init.kind, ExprKind::Binary { .. }));
            }
            other => panic!("expected var decl, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let program = parse_ok("void main() { int x = 1 + 2 * 3; }");
        let init = match &program.decls[0].body.stmts[0].kind {
            StmtKind::VarDecl { init, .. } => init,
            _ => unreachable!(),
        };
        match &init.kind {
            ExprKind::Binary { op, right, .. } => {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(
                    right.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_right_assoc() {
        // a = b = 1 parses as a = (b = 1)
        let program = parse_ok("void main() { a = b = 1; }");
        let expr = match &program.decls[0].body.stmts[0].kind {
            StmtKind::Expr(expr) => expr,
            _ => unreachable!(),
        };
        match &expr.kind {
            ExprKind::Assign { value, .. } => {
                assert!(matches!(value.kind, ExprKind::Assign { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_compound_assignment_desugars() {
        let program = parse_ok("void main() { x += 2; }");
        let expr = match &program.decls[0].body.stmts[0].kind {
            StmtKind::Expr(expr) => expr,
            _ => unreachable!(),
        };
        match &expr.kind {
            ExprKind::Assign { target, value } => {
                assert!(matches!(target.kind, ExprKind::Variable(_)));
                assert!(matches!(
                    value.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_logic_operators() {
        // `and` binds tighter than `or`
        let program = parse_ok("void main() { int x = a or b and c; }");
        let init = match &program.decls[0].body.stmts[0].kind {
            StmtKind::VarDecl { init, .. } => init,
            _ => unreachable!(),
        };
        match &init.kind {
            ExprKind::Binary { op, right, .. } => {
                assert_eq!(*op, BinaryOp::Or);
                assert!(matches!(
                    right.kind,
                    ExprKind::Binary {
                        op: BinaryOp::And,
                        ..
                    }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else() {
        let program = parse_ok("void main() { if (x) { } else { } }");
        match &program.decls[0].body.stmts[0].kind {
            StmtKind::If { else_branch, .. } => assert!(else_branch.is_some()),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_if_without_else() {
        let program = parse_ok("void main() { if (x) { } }");
        match &program.decls[0].body.stmts[0].kind {
            StmtKind::If { else_branch, .. } => assert!(else_branch.is_none()),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_while() {
        let program = parse_ok("void main() { while (x) { x = x - 1; } }");
        assert!(matches!(
            program.decls[0].body.stmts[0].kind,
            StmtKind::While { .. }
        ));
    }

    #[test]
    fn test_print_stmt() {
        let program = parse_ok(r#"void main() { printf("hi"); }"#);
        match &program.decls[0].body.stmts[0].kind {
            StmtKind::Print(expr) => {
                assert!(matches!(
                    &expr.kind,
                    ExprKind::Literal(Literal::Str(s)) if s == "hi"
                ));
            }
            other => panic!("expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_call_vs_variable() {
        let program = parse_ok("void main() { f(1, 2); x; }");
        let stmts = &program.decls[0].body.stmts;
        match &stmts[0].kind {
            StmtKind::Expr(e) => match &e.kind {
                ExprKind::Call { callee, args } => {
                    assert_eq!(callee.name, "f");
                    assert_eq!(args.len(), 2);
                }
                other => panic!("expected call, got {:?}", other),
            },
            _ => unreachable!(),
        }
        match &stmts[1].kind {
            StmtKind::Expr(e) => assert!(matches!(e.kind, ExprKind::Variable(_))),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_member_access() {
        let program = parse_ok("void main() { p.x; }");
        match &program.decls[0].body.stmts[0].kind {
            StmtKind::Expr(e) => assert!(matches!(e.kind, ExprKind::Member { .. })),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_return_forms() {
        let program = parse_ok("int f() { return 1; } ");
        match &program.decls[0].body.stmts[0].kind {
            StmtKind::Return(value) => assert!(value.is_some()),
            _ => unreachable!(),
        }
        let program = parse_ok("void g() { return; }");
        match &program.decls[0].body.stmts[0].kind {
            StmtKind::Return(value) => assert!(value.is_none()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_error_reports_line() {
        let errors = parse_err("void main() {\n  int x 1;\n}");
        match &errors[0] {
            ParseError::UnexpectedToken { line, .. } => assert_eq!(*line, 2),
            other => panic!("expected unexpected-token error, got {:?}", other),
        }
    }

    #[test]
    fn test_recovery_surfaces_multiple_errors() {
        // Two broken statements in one declaration both get diagnostics
        let errors = parse_err("void main() { int x 1; int y 2; }");
        assert!(errors.len() >= 2, "got {:?}", errors);
    }

    #[test]
    fn test_halts_after_failed_declaration() {
        // The second declaration is not attempted once the first fails
        let (program, errors) = parse("void broken( { } void later() { }");
        assert!(!errors.is_empty());
        assert!(program.decls.is_empty());
    }

    #[test]
    fn test_terminates_on_garbage() {
        // Panic-mode recovery must always make progress
        let (_, errors) = parse("void main() { ; ; } )))) int");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_printf_not_an_expression() {
        let errors = parse_err("void main() { int x = printf; }");
        assert!(!errors.is_empty());
    }
}
