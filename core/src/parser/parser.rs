//! Recursive-descent statement parser with precedence climbing for binary
//! expressions.
//!
//! The parser works over a complete token slice (see [`crate::lexer::tokenize`])
//! and stops at the first grammar violation.

use std::rc::Rc;

use tracing::debug;

use super::error::{ParseError, ParseErrorKind};
use crate::api::Diagnostic;
use crate::ast::{
    ElseBranch, Expr, ExprKind, ForStmt, FunctionDef, Ident, IfStmt, Literal, Program, Stmt,
};
use crate::diagnostics::context::Context;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::syntax::{BinaryOp, Span, UnaryOp};

/// Maximum nesting of blocks and sub-expressions accepted by [`parse`].
///
/// Parsing at this depth fits in the 2 MiB stack of a spawned thread.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Parse a token stream into a program.
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    parse_with_max_depth(tokens, DEFAULT_MAX_DEPTH)
}

/// Parse with a custom maximum nesting depth.
pub fn parse_with_max_depth(tokens: &[Token], max_depth: usize) -> Result<Program, ParseError> {
    let program = Parser::new(tokens, max_depth).program()?;
    debug!(statements = program.statements.len(), "parsed program");
    Ok(program)
}

/// Lex and parse `source`, reporting the first failure of either phase.
pub fn parse_program(source: &str) -> Result<Program, Diagnostic> {
    let tokens = tokenize(source)?;
    Ok(parse(&tokens)?)
}

pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    // Returned by `peek` once the slice runs out, so a stream that lacks its
    // trailing `EndOfInput` still terminates cleanly.
    eof: Token,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token], max_depth: usize) -> Self {
        let eof = match tokens.last() {
            Some(last) if last.kind == TokenKind::EndOfInput => last.clone(),
            Some(last) => Token {
                kind: TokenKind::EndOfInput,
                text: String::new(),
                span: Span::new(
                    last.span.end,
                    last.span.end,
                    last.span.line,
                    last.span.column + last.text.chars().count(),
                ),
            },
            None => Token {
                kind: TokenKind::EndOfInput,
                text: String::new(),
                span: Span::new(0, 0, 1, 1),
            },
        };
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
            eof,
        }
    }

    /// Parse statements until end of input.
    pub fn program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::EndOfInput) {
            statements.push(self.statement()?);
        }
        Ok(Program::new(statements))
    }

    // --- token cursor -----------------------------------------------------

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::EndOfInput {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        match self.eat(kind) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(expected)),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<Ident, ParseError> {
        let token = self.expect(TokenKind::Identifier, expected)?;
        Ok(Ident::new(token.text, token.span))
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let found = self.peek();
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: expected.into(),
                found: found.describe(),
            },
            found.span,
        )
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::new(
                ParseErrorKind::MaxDepthExceeded {
                    max_depth: self.max_depth,
                },
                self.peek().span,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // --- statements -------------------------------------------------------

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::Let => self.var_decl(),
            TokenKind::Set => self.assignment(),
            TokenKind::If => {
                let keyword = self.advance();
                Ok(Stmt::If(self.if_stmt(keyword.span)?))
            }
            TokenKind::While => self.while_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Define => self.function_def(),
            TokenKind::Return => self.return_stmt(),
            kind if kind.starts_expression() => Ok(Stmt::Expr(self.expression()?)),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn var_decl(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let name = self.expect_ident("variable name after 'let'")?;
        self.expect(TokenKind::Be, "'be'")?;
        let init = self.expression()?;
        Ok(Stmt::VarDecl { name, init })
    }

    fn assignment(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let name = self.expect_ident("variable name after 'set'")?;
        self.expect(TokenKind::To, "'to'")?;
        let value = self.expression()?;
        Ok(Stmt::Assign { name, value })
    }

    /// Everything after the `if` keyword. An `else if` continues the same
    /// statement, so the whole chain is closed by a single `end`. Chain links
    /// are parsed in a loop and do not count as nesting.
    fn if_stmt(&mut self, opener: Span) -> Result<IfStmt, ParseError> {
        let mut arm_opener = opener;
        let condition = self.expression()?;
        self.expect(TokenKind::Then, "'then' after if condition")?;
        let then_branch = self.block("'if' block", arm_opener)?;

        let mut else_ifs = Vec::new();
        let mut else_block = None;
        while let Some(else_token) = self.eat(TokenKind::Else) {
            match self.eat(TokenKind::If) {
                Some(keyword) => {
                    arm_opener = keyword.span;
                    let condition = self.expression()?;
                    self.expect(TokenKind::Then, "'then' after if condition")?;
                    let then_branch = self.block("'if' block", arm_opener)?;
                    else_ifs.push((condition, then_branch));
                }
                None => {
                    else_block = Some(self.block("'else' block", else_token.span)?);
                    break;
                }
            }
        }
        self.close_block("'if' block", arm_opener)?;

        // Fold the chain from its last link back to the first.
        let mut else_branch = else_block.map(ElseBranch::Block);
        for (condition, then_branch) in else_ifs.into_iter().rev() {
            else_branch = Some(ElseBranch::If(Box::new(IfStmt {
                condition,
                then_branch,
                else_branch,
            })));
        }
        Ok(IfStmt {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let condition = self.expression()?;
        let body = self.block("'while' loop", keyword.span)?;
        self.close_block("'while' loop", keyword.span)?;
        Ok(Stmt::While { condition, body })
    }

    fn for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let variable = self.expect_ident("loop variable name after 'for'")?;
        self.expect(TokenKind::From, "'from'")?;
        let start = self.expression()?;
        self.expect(TokenKind::To, "'to'")?;
        let end = self.expression()?;
        let step = match self.eat(TokenKind::Step) {
            Some(_) => Some(self.expression()?),
            None => None,
        };
        let body = self.block("'for' loop", keyword.span)?;
        self.close_block("'for' loop", keyword.span)?;
        Ok(Stmt::For(ForStmt {
            variable,
            start,
            end,
            step,
            body,
        }))
    }

    fn function_def(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        self.expect(TokenKind::Function, "'function' after 'define'")?;
        let name = self.expect_ident("function name")?;

        let mut params: Vec<Ident> = Vec::new();
        if self.eat(TokenKind::With).is_some() {
            loop {
                let param = self.expect_ident("parameter name")?;
                if let Some(first) = params.iter().find(|p| p.name == param.name) {
                    return Err(ParseError::new(
                        ParseErrorKind::DuplicateParameter {
                            name: param.name.clone(),
                            function: name.name.clone(),
                        },
                        param.span,
                    )
                    .with_context(Context::DeclaredHere {
                        name: first.name.clone(),
                        span: first.span,
                    }));
                }
                params.push(param);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(TokenKind::As, "'as' before function body")?;
        let what = format!("function '{}'", name.name);
        let body = self.block(&what, keyword.span)?;
        self.close_block(&what, keyword.span)?;
        Ok(Stmt::FuncDef(Rc::new(FunctionDef { name, params, body })))
    }

    /// `return` takes a value only when one starts on the same line.
    fn return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let next = self.peek();
        let value = if next.kind.starts_expression() && next.span.line == keyword.span.line {
            Some(self.expression()?)
        } else {
            None
        };
        Ok(Stmt::Return {
            span: keyword.span,
            value,
        })
    }

    /// Statements up to, not including, the next `end` or `else`.
    fn block(&mut self, what: &str, opener: Span) -> Result<Vec<Stmt>, ParseError> {
        self.nested(|p| {
            let mut body = Vec::new();
            loop {
                match p.peek_kind() {
                    TokenKind::End | TokenKind::Else => return Ok(body),
                    TokenKind::EndOfInput => return Err(p.unclosed(what, opener)),
                    _ => body.push(p.statement()?),
                }
            }
        })
    }

    fn close_block(&mut self, what: &str, opener: Span) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::End => {
                self.advance();
                Ok(())
            }
            TokenKind::EndOfInput => Err(self.unclosed(what, opener)),
            _ => Err(self.unexpected(format!("'end' to close {}", what))),
        }
    }

    fn unclosed(&self, what: &str, opener: Span) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnclosedBlock {
                opener: what.to_string(),
            },
            self.peek().span,
        )
        .with_context(Context::OpenedHere {
            what: what.to_string(),
            span: opener,
        })
    }

    // --- expressions ------------------------------------------------------

    /// A full expression at the lowest precedence level.
    pub fn expression(&mut self) -> Result<Expr, ParseError> {
        self.nested(|p| p.binary(1))
    }

    /// Precedence climbing: fold operators binding at least as tightly as
    /// `min_precedence`. The right operand is parsed one level higher, which
    /// makes every binary operator left-associative.
    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;

        while let Some(op) = binary_op(self.peek_kind()) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.binary(precedence + 1)?;
            let span = left.span.to(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.primary(),
        };
        let operator = self.advance();
        let operand = self.nested(|p| p.unary())?;
        let span = operator.span.to(&operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::Integer => {
                let value = token.text.parse::<i64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidNumber {
                            text: token.text.clone(),
                        },
                        token.span,
                    )
                })?;
                ExprKind::Literal(Literal::Int(value))
            }
            TokenKind::Float => {
                let value = token.text.parse::<f64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidNumber {
                            text: token.text.clone(),
                        },
                        token.span,
                    )
                })?;
                ExprKind::Literal(Literal::Float(value))
            }
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Identifier => {
                self.advance();
                if self.check(TokenKind::LeftParen) {
                    return self.call(token);
                }
                return Ok(Expr::new(ExprKind::Identifier(token.text), token.span));
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.expression()?;
                let close = self.expect(TokenKind::RightParen, "')' to close '('")?;
                let span = token.span.to(&close.span);
                return Ok(Expr::new(ExprKind::Grouping(Box::new(inner)), span));
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(Expr::new(kind, token.span))
    }

    fn call(&mut self, name: Token) -> Result<Expr, ParseError> {
        self.advance();
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RightParen, "')' after arguments")?;
        let span = name.span.to(&close.span);
        Ok(Expr::new(
            ExprKind::Call {
                callee: Ident::new(name.text, name.span),
                args,
            },
            span,
        ))
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Or => BinaryOp::Or,
        TokenKind::And => BinaryOp::And,
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::NotEqual => BinaryOp::Neq,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::LessEqual => BinaryOp::Le,
        TokenKind::GreaterEqual => BinaryOp::Ge,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        _ => return None,
    };
    Some(op)
}
