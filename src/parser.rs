//! Parser for VibeScript
//!
//! Converts tokens into an Abstract Syntax Tree.
//!
//! ```text
//! program     → declaration* EOF
//! declaration → holdDecl | lockDecl | skillDecl | statement
//! statement   → say | if | keep | each | give | stop | skip | try | block | exprStmt
//! expression  → assignment
//! assignment  → IDENT "=" assignment | or
//! or          → and ("or" and)*
//! and         → equality ("and" equality)*
//! equality    → comparison (("==" | "!=") comparison)*
//! comparison  → term (("<" | "<=" | ">" | ">=") term)*
//! term        → factor (("+" | "-") factor)*
//! factor      → unary (("*" | "/" | "%") unary)*
//! unary       → ("not" | "-") unary | call
//! call        → primary ("(" arguments? ")" | "[" expression "]")*
//! primary     → NUMBER | STRING | "bet" | "cap" | "null" | IDENT
//!             | "(" expression ")" | "[" elements? "]" | "ask" expression
//! ```
//!
//! Semicolons are optional. A syntax error inside a statement list is
//! recorded and the parser skips ahead to the next statement boundary, so
//! one pass reports every error it can find.

use std::rc::Rc;

use crate::ast::{
    BinaryOp, EachSource, Expr, Literal, LogicalOp, Program, SkillDecl, Stmt, UnaryOp,
};
use crate::error::{ErrorKind, Result, VibeError};
use crate::stack::ensure_sufficient_stack;
use crate::token::{starts_statement, Token, TokenKind};

/// Upper bound on parameters and call arguments
const MAX_ARGS: usize = 255;

/// Deepest nesting of statements or expressions accepted
pub const MAX_NESTING: usize = 512;

/// The parser state
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<VibeError>,
    depth: usize,
}

impl Parser {
    /// Create a new parser from tokens
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let span = tokens.last().map(|t| t.span).unwrap_or_else(|| crate::token::Span::new(0, 0, 1, 1));
            tokens.push(Token::new(TokenKind::Eof, span, String::new()));
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Parse the tokens into a program, failing with the first syntax error
    pub fn parse(&mut self) -> Result<Program> {
        let (program, mut errors) = self.parse_recovering();
        if errors.is_empty() {
            Ok(program)
        } else {
            Err(errors.swap_remove(0))
        }
    }

    /// Parse everything, returning the program and every syntax error found
    pub fn parse_recovering(&mut self) -> (Program, Vec<VibeError>) {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration_or_recover() {
                statements.push(stmt);
            }
        }

        tracing::debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        (Program::new(statements), std::mem::take(&mut self.errors))
    }

    fn declaration_or_recover(&mut self) -> Option<Stmt> {
        match self.declaration() {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                tracing::trace!(error = %err, "recovering from syntax error");
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }

    /// Skip to the next statement boundary after a syntax error
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }
            if starts_statement(&self.peek().kind) {
                return;
            }
            self.advance();
        }
    }

    // ==================== Declarations ====================

    fn declaration(&mut self) -> Result<Stmt> {
        match self.peek().kind {
            TokenKind::Hold => self.binding_declaration(false),
            TokenKind::Lock => self.binding_declaration(true),
            TokenKind::Skill => self.skill_declaration(),
            _ => self.statement(),
        }
    }

    fn binding_declaration(&mut self, constant: bool) -> Result<Stmt> {
        let keyword = self.advance().kind.clone(); // consume 'hold' / 'lock'

        let span = self.peek().span;
        let name = self.expect_ident(&format!("expected variable name after '{}'", keyword))?;

        self.expect(&TokenKind::Equal, "expected '=' after variable name")?;

        let value = self.expression()?;
        self.consume_terminator();

        if constant {
            Ok(Stmt::Lock { name, value, span })
        } else {
            Ok(Stmt::Hold { name, value, span })
        }
    }

    fn skill_declaration(&mut self) -> Result<Stmt> {
        self.advance(); // consume 'skill'

        let span = self.peek().span;
        let name = self.expect_ident("expected skill name")?;

        self.expect(&TokenKind::LeftParen, "expected '(' after skill name")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(VibeError::new(
                        ErrorKind::TooManyItems("parameters"),
                        Some(self.peek().span),
                    ));
                }
                params.push(self.expect_ident("expected parameter name")?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(&TokenKind::RightParen, "expected ')' after parameters")?;
        self.expect(&TokenKind::LeftBrace, "expected '{' before skill body")?;

        let body = self.block_statements()?;

        Ok(Stmt::Skill(Rc::new(SkillDecl { name, params, body, span })))
    }

    // ==================== Statements ====================

    fn statement(&mut self) -> Result<Stmt> {
        self.nested(Self::statement_kind)
    }

    fn statement_kind(&mut self) -> Result<Stmt> {
        match self.peek().kind {
            TokenKind::Say => self.say_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::Keep => self.keep_statement(),
            TokenKind::Each => self.each_statement(),
            TokenKind::Give => self.give_statement(),
            TokenKind::Stop => {
                let span = self.advance().span;
                self.consume_terminator();
                Ok(Stmt::Stop { span })
            }
            TokenKind::Skip => {
                let span = self.advance().span;
                self.consume_terminator();
                Ok(Stmt::Skip { span })
            }
            TokenKind::Try => self.try_statement(),
            TokenKind::LeftBrace => {
                let span = self.advance().span;
                let stmts = self.block_statements()?;
                Ok(Stmt::Block { stmts, span })
            }
            _ => {
                let expr = self.expression()?;
                self.consume_terminator();
                Ok(Stmt::Expr { expr })
            }
        }
    }

    fn say_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'say'
        let value = self.expression()?;
        self.consume_terminator();
        Ok(Stmt::Say { value, span })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'if'

        self.expect(&TokenKind::LeftParen, "expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RightParen, "expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);

        let else_branch = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If { condition, then_branch, else_branch, span })
    }

    fn keep_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'keep'

        self.expect(&TokenKind::LeftParen, "expected '(' after 'keep'")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RightParen, "expected ')' after keep condition")?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::Keep { condition, body, span })
    }

    fn each_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'each'

        self.expect(&TokenKind::LeftParen, "expected '(' after 'each'")?;
        let var = self.expect_ident("expected loop variable name")?;

        let source = if self.match_token(&TokenKind::From) {
            let start = self.expression()?;
            self.expect(&TokenKind::To, "expected 'to' after range start")?;
            let end = self.expression()?;
            self.expect(&TokenKind::RightParen, "expected ')' after range")?;
            EachSource::Range { start, end }
        } else if self.match_token(&TokenKind::In) {
            let iterable = self.expression()?;
            self.expect(&TokenKind::RightParen, "expected ')' after iterable")?;
            EachSource::Collection(iterable)
        } else {
            return Err(self.error_at_peek("expected 'from' or 'in' in each loop"));
        };

        let body = Box::new(self.statement()?);

        Ok(Stmt::Each { var, source, body, span })
    }

    fn give_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'give'

        let value = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume_terminator();
        Ok(Stmt::Give { value, span })
    }

    fn try_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'try'

        self.expect(&TokenKind::LeftBrace, "expected '{' after 'try'")?;
        let body = self.block_statements()?;

        self.expect(&TokenKind::Caught, "expected 'caught' after try block")?;

        let error_var = if self.match_token(&TokenKind::LeftParen) {
            let name = self.expect_ident("expected error variable name")?;
            self.expect(&TokenKind::RightParen, "expected ')' after error variable")?;
            Some(name)
        } else {
            None
        };

        self.expect(&TokenKind::LeftBrace, "expected '{' after 'caught'")?;
        let handler = self.block_statements()?;

        Ok(Stmt::Try { body, error_var, handler, span })
    }

    /// Statements up to and including the closing brace
    fn block_statements(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration_or_recover() {
                stmts.push(stmt);
            }
        }

        self.expect(&TokenKind::RightBrace, "expected '}' after block")?;

        Ok(stmts)
    }

    // ==================== Expressions ====================

    fn expression(&mut self) -> Result<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.or_expr()?;

        if self.match_token(&TokenKind::Equal) {
            let equals = self.previous().span;
            let value = self.expression()?;

            if let Expr::Ident { name, span } = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    span,
                });
            }

            return Err(VibeError::new(ErrorKind::InvalidAssignmentTarget, Some(equals)));
        }

        Ok(expr)
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut left = self.and_expr()?;

        while self.match_token(&TokenKind::Or) {
            let span = self.previous().span;
            let right = self.and_expr()?;
            left = Expr::Logical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut left = self.equality()?;

        while self.match_token(&TokenKind::And) {
            let span = self.previous().span;
            let right = self.equality()?;
            left = Expr::Logical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    /// One left-associative binary precedence level
    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr> {
        let mut left = operand(self)?;

        while let Some(op) = operator(&self.peek().kind) {
            let span = self.advance().span;
            let right = operand(self)?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(Self::comparison, |kind| match kind {
            TokenKind::EqualEqual => Some(BinaryOp::Eq),
            TokenKind::BangEqual => Some(BinaryOp::Ne),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(Self::term, |kind| match kind {
            TokenKind::Less => Some(BinaryOp::Lt),
            TokenKind::LessEqual => Some(BinaryOp::Le),
            TokenKind::Greater => Some(BinaryOp::Gt),
            TokenKind::GreaterEqual => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(Self::factor, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(Self::unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.call(),
        };

        let span = self.advance().span;
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(&TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(&TokenKind::LeftBracket) {
                let span = self.previous().span;
                let index = self.expression()?;
                self.expect(&TokenKind::RightBracket, "expected ']' after index")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let span = self.previous().span;
        let args = self.comma_separated(&TokenKind::RightParen, "arguments")?;
        self.expect(&TokenKind::RightParen, "expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            span,
        })
    }

    /// Expressions separated by commas, stopping before `close`
    fn comma_separated(&mut self, close: &TokenKind, what: &'static str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();

        if !self.check(close) {
            loop {
                if items.len() >= MAX_ARGS {
                    return Err(VibeError::new(
                        ErrorKind::TooManyItems(what),
                        Some(self.peek().span),
                    ));
                }
                items.push(self.expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();

        if let Some(value) = token.literal() {
            self.advance();
            return Ok(Expr::Literal { value, span: token.span });
        }

        match &token.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expr::Ident { name, span: token.span })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::RightParen, "expected ')' after expression")?;
                Ok(Expr::Grouping {
                    expr: Box::new(expr),
                    span: token.span,
                })
            }
            TokenKind::LeftBracket => {
                self.advance();
                let elements = self.comma_separated(&TokenKind::RightBracket, "array elements")?;
                self.expect(&TokenKind::RightBracket, "expected ']' after array elements")?;
                Ok(Expr::Array { elements, span: token.span })
            }
            TokenKind::Ask => {
                self.advance();
                let prompt = self.expression()?;
                Ok(Expr::Ask {
                    prompt: Box::new(prompt),
                    span: token.span,
                })
            }
            _ => Err(VibeError::new(
                ErrorKind::ExpectedExpression(token.kind.to_string()),
                Some(token.span),
            )),
        }
    }

    // ==================== Helpers ====================

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse one nesting level deeper, refusing to go past `MAX_NESTING`
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(VibeError::new(
                ErrorKind::NestingTooDeep(MAX_NESTING),
                Some(self.peek().span),
            ));
        }

        self.depth += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.depth -= 1;
        result
    }

    fn error_at_peek(&self, message: &str) -> VibeError {
        VibeError::new(
            ErrorKind::ExpectedToken(message.to_string(), self.peek().kind.to_string()),
            Some(self.peek().span),
        )
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_peek(message))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_at_peek(message))
        }
    }

    fn consume_terminator(&mut self) {
        self.match_token(&TokenKind::Semicolon);
    }
}
