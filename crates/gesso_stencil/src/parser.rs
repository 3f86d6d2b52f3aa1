//! Parser for compiled render-function source.
//!
//! Accepts either a full `function name(args) { ... }` wrapper or a bare
//! expression; a bare expression is wrapped into a single-return function so
//! downstream code always sees the same shape.

use gesso_maquette::ast::{AstArena, BinOp, ExprId, ExprKind, RenderAst, UnOp};
use thiserror::Error;

use crate::tokenizer::{tokenize, Token};

/// Errors from tokenizing or parsing render-function source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character `{0}` at byte {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),
    #[error("invalid number literal at byte {0}")]
    InvalidNumber(usize),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected token at index {0}, expected {1}")]
    UnexpectedToken(usize, &'static str),
}

/// Parse a render function's source into an arena-indexed syntax tree
pub fn parse_render_fn(source: &str) -> Result<RenderAst, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        arena: AstArena::new(),
    };

    let root = if parser.peek_ident("function") {
        parser.parse_function()?
    } else {
        let expr = parser.parse_expr()?;
        let ret = parser.arena.alloc(ExprKind::Return(expr));
        parser.arena.alloc(ExprKind::Function {
            name: None,
            params: Vec::new(),
            body: vec![ret],
        })
    };

    if parser.pos != parser.tokens.len() {
        return Err(ParseError::UnexpectedToken(parser.pos, "end of input"));
    }

    Ok(RenderAst {
        arena: parser.arena,
        root,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    arena: AstArena,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(id)) if id == name)
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ParseError::UnexpectedEof)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &'static str) -> Result<(), ParseError> {
        if self.eat(&token) {
            Ok(())
        } else if self.pos >= self.tokens.len() {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::UnexpectedToken(self.pos, what))
        }
    }

    fn parse_function(&mut self) -> Result<ExprId, ParseError> {
        // `function` keyword
        self.pos += 1;

        let name = match self.peek() {
            Some(Token::Ident(id)) => {
                let name = id.clone();
                self.pos += 1;
                Some(name)
            }
            _ => None,
        };

        self.expect(Token::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.eat(&Token::RParen) {
            match self.advance()? {
                Token::Ident(id) => params.push(id),
                _ => return Err(ParseError::UnexpectedToken(self.pos - 1, "parameter name")),
            }
            if !self.eat(&Token::Comma) {
                self.expect(Token::RParen, "`)`")?;
                break;
            }
        }

        self.expect(Token::LBrace, "`{`")?;
        let mut body = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof);
            }
            let stmt = if self.peek_ident("return") {
                self.pos += 1;
                let expr = self.parse_expr()?;
                self.arena.alloc(ExprKind::Return(expr))
            } else {
                self.parse_expr()?
            };
            self.eat(&Token::Semi);
            body.push(stmt);
        }

        Ok(self.arena.alloc(ExprKind::Function { name, params, body }))
    }

    fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        let test = self.parse_binary(1)?;
        if self.eat(&Token::Question) {
            let consequent = self.parse_expr()?;
            self.expect(Token::Colon, "`:`")?;
            let alternate = self.parse_expr()?;
            return Ok(self.arena.alloc(ExprKind::Conditional {
                test,
                consequent,
                alternate,
            }));
        }
        Ok(test)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<ExprId, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some((op, prec)) = self.peek().and_then(binop_of) {
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let right = self.parse_binary(prec + 1)?;
            left = self.arena.alloc(ExprKind::Binary { op, left, right });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ExprId, ParseError> {
        if self.eat(&Token::Bang) {
            let expr = self.parse_unary()?;
            return Ok(self.arena.alloc(ExprKind::Unary {
                op: UnOp::Not,
                expr,
            }));
        }
        if self.eat(&Token::Minus) {
            let expr = self.parse_unary()?;
            return Ok(self.arena.alloc(ExprKind::Unary {
                op: UnOp::Neg,
                expr,
            }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Token::Dot) {
                match self.advance()? {
                    Token::Ident(property) => {
                        expr = self.arena.alloc(ExprKind::Member {
                            object: expr,
                            property,
                        });
                    }
                    _ => return Err(ParseError::UnexpectedToken(self.pos - 1, "property name")),
                }
            } else if self.eat(&Token::LParen) {
                let mut args = Vec::new();
                while !self.eat(&Token::RParen) {
                    args.push(self.parse_expr()?);
                    if !self.eat(&Token::Comma) {
                        self.expect(Token::RParen, "`)`")?;
                        break;
                    }
                }
                expr = self.arena.alloc(ExprKind::Call { callee: expr, args });
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<ExprId, ParseError> {
        match self.advance()? {
            Token::Str(s) => Ok(self.arena.alloc(ExprKind::Str(s))),
            Token::Num(n) => Ok(self.arena.alloc(ExprKind::Num(n))),
            Token::Ident(id) => match id.as_str() {
                "true" => Ok(self.arena.alloc(ExprKind::Bool(true))),
                "false" => Ok(self.arena.alloc(ExprKind::Bool(false))),
                "null" => Ok(self.arena.alloc(ExprKind::Null)),
                _ => Ok(self.arena.alloc(ExprKind::Ident(id))),
            },
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(expr)
            }
            Token::LBracket => {
                let mut elements = Vec::new();
                while !self.eat(&Token::RBracket) {
                    elements.push(self.parse_expr()?);
                    if !self.eat(&Token::Comma) {
                        self.expect(Token::RBracket, "`]`")?;
                        break;
                    }
                }
                Ok(self.arena.alloc(ExprKind::Array(elements)))
            }
            Token::LBrace => {
                let mut properties = Vec::new();
                while !self.eat(&Token::RBrace) {
                    let key = match self.advance()? {
                        Token::Ident(id) => id,
                        Token::Str(s) => s.into(),
                        _ => return Err(ParseError::UnexpectedToken(self.pos - 1, "property key")),
                    };
                    self.expect(Token::Colon, "`:`")?;
                    let value = self.parse_expr()?;
                    properties.push((key, value));
                    if !self.eat(&Token::Comma) {
                        self.expect(Token::RBrace, "`}`")?;
                        break;
                    }
                }
                Ok(self.arena.alloc(ExprKind::Object(properties)))
            }
            _ => Err(ParseError::UnexpectedToken(self.pos - 1, "expression")),
        }
    }
}

fn binop_of(token: &Token) -> Option<(BinOp, u8)> {
    let pair = match token {
        Token::OrOr => (BinOp::Or, 1),
        Token::AndAnd => (BinOp::And, 2),
        Token::EqEq => (BinOp::Eq, 3),
        Token::NotEq => (BinOp::NotEq, 3),
        Token::EqEqEq => (BinOp::StrictEq, 3),
        Token::NotEqEq => (BinOp::StrictNotEq, 3),
        Token::Lt => (BinOp::Lt, 4),
        Token::Gt => (BinOp::Gt, 4),
        Token::Le => (BinOp::Le, 4),
        Token::Ge => (BinOp::Ge, 4),
        Token::Plus => (BinOp::Add, 5),
        Token::Minus => (BinOp::Sub, 5),
        _ => return None,
    };
    Some(pair)
}
