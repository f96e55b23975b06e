// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the sdb project.

//! Integer expressions over the state of a [`Target`].
//!
//! Values are 64-bit unsigned integers with wrapping arithmetic. Supported
//! syntax, from lowest to highest precedence:
//!
//! | syntax           | meaning                                   |
//! |------------------|-------------------------------------------|
//! | `a \|\| b`       | logical or, yields `0` or `1`             |
//! | `a && b`         | logical and, yields `0` or `1`            |
//! | `a == b`, `a != b` | comparison, yields `0` or `1`           |
//! | `a + b`, `a - b` | addition, subtraction                     |
//! | `a * b`, `a / b` | multiplication, unsigned division         |
//! | `-a`, `!a`, `*a` | negation, logical not, 32-bit memory read |
//!
//! Operands are decimal or `0x` hexadecimal literals, `$name` registers and
//! parenthesized expressions.

use crate::{
    memory::{Address, MemoryError, Width},
    target::Target,
};


/// Maximum nesting of operators and parentheses in one expression.
pub const MAX_DEPTH: usize = 256;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExprError {
    /// Nothing to evaluate.
    Empty,
    /// A character that cannot start any token.
    UnexpectedCharacter { position: usize, character: char },
    /// A literal that does not fit in 64 bits or has no digits.
    InvalidNumber { position: usize, literal: String },
    /// A token that does not fit the grammar at this point.
    UnexpectedToken { position: usize, token: String },
    /// Input ended in the middle of an expression.
    UnexpectedEnd,
    /// Operators or parentheses nest deeper than [`MAX_DEPTH`].
    TooDeep,
    UnknownRegister(String),
    DivisionByZero,
    Memory(MemoryError),
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Empty => write!(fmt, "empty expression"),
            Self::UnexpectedCharacter {
                position,
                character,
            } => write!(
                fmt,
                "unexpected character {:?} at position {}",
                character, position
            ),
            Self::InvalidNumber { position, literal } => {
                write!(fmt, "invalid number {:?} at position {}", literal, position)
            }
            Self::UnexpectedToken { position, token } => {
                write!(fmt, "unexpected {:?} at position {}", token, position)
            }
            Self::UnexpectedEnd => write!(fmt, "unexpected end of expression"),
            Self::TooDeep => write!(fmt, "expression nests deeper than {} levels", MAX_DEPTH),
            Self::UnknownRegister(name) => write!(fmt, "unknown register ${}", name),
            Self::DivisionByZero => write!(fmt, "division by zero"),
            Self::Memory(err) => write!(fmt, "{}", err),
        }
    }
}

impl std::error::Error for ExprError {}

impl From<MemoryError> for ExprError {
    fn from(err: MemoryError) -> Self {
        Self::Memory(err)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum TokenKind {
    Number(u64),
    Register(String),
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    NotEqual,
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Token {
    kind: TokenKind,
    position: usize,
    text: String,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = input.as_bytes();
    let mut tokens = vec![];
    let mut position = 0;
    while let Some(&b) = bytes.get(position) {
        let start = position;
        let kind = match b {
            b if b.is_ascii_whitespace() => {
                position += 1;
                continue;
            }
            b'0'..=b'9' => {
                let (hex, digits_start) = if bytes[start..].starts_with(b"0x")
                    || bytes[start..].starts_with(b"0X")
                {
                    (true, start + 2)
                } else {
                    (false, start)
                };
                position = digits_start;
                while bytes
                    .get(position)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
                {
                    position += 1;
                }
                let digits = &input[digits_start..position];
                let radix = if hex { 16 } else { 10 };
                let value = u64::from_str_radix(digits, radix).map_err(|_| {
                    ExprError::InvalidNumber {
                        position: start,
                        literal: input[start..position].to_string(),
                    }
                })?;
                TokenKind::Number(value)
            }
            b'$' => {
                position += 1;
                while bytes
                    .get(position)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
                {
                    position += 1;
                }
                if position == start + 1 {
                    return Err(ExprError::UnexpectedCharacter {
                        position: start,
                        character: '$',
                    });
                }
                TokenKind::Register(input[start + 1..position].to_string())
            }
            b'=' if bytes.get(start + 1) == Some(&b'=') => {
                position += 2;
                TokenKind::Equal
            }
            b'!' if bytes.get(start + 1) == Some(&b'=') => {
                position += 2;
                TokenKind::NotEqual
            }
            b'&' if bytes.get(start + 1) == Some(&b'&') => {
                position += 2;
                TokenKind::And
            }
            b'|' if bytes.get(start + 1) == Some(&b'|') => {
                position += 2;
                TokenKind::Or
            }
            b'!' => {
                position += 1;
                TokenKind::Not
            }
            b'+' => {
                position += 1;
                TokenKind::Plus
            }
            b'-' => {
                position += 1;
                TokenKind::Minus
            }
            b'*' => {
                position += 1;
                TokenKind::Star
            }
            b'/' => {
                position += 1;
                TokenKind::Slash
            }
            b'(' => {
                position += 1;
                TokenKind::LeftParen
            }
            b')' => {
                position += 1;
                TokenKind::RightParen
            }
            _ => {
                return Err(ExprError::UnexpectedCharacter {
                    position: start,
                    character: input[start..].chars().next().unwrap_or_default(),
                })
            }
        };
        tokens.push(Token {
            kind,
            position: start,
            text: input[start..position].to_string(),
        });
    }
    Ok(tokens)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
    Negate,
    Not,
    Deref,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Binding power; higher binds tighter.
    const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Equal | Self::NotEqual => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div => 5,
        }
    }

    fn from_token(kind: &TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Or => Self::Or,
            TokenKind::And => Self::And,
            TokenKind::Equal => Self::Equal,
            TokenKind::NotEqual => Self::NotEqual,
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Sub,
            TokenKind::Star => Self::Mul,
            TokenKind::Slash => Self::Div,
            _ => return None,
        })
    }
}

/// A parsed expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Literal(u64),
    Register(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

struct Parser {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token>>,
    /// Current recursion depth of [`Parser::unary`].
    depth: usize,
}

impl Parser {
    fn unexpected(token: Token) -> ExprError {
        ExprError::UnexpectedToken {
            position: token.position,
            token: token.text,
        }
    }

    /// Checks the height of a tree being built.
    fn height(height: usize) -> Result<usize, ExprError> {
        if height > MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        Ok(height)
    }

    /// Precedence climbing: parses operators binding at least as tightly as
    /// `min_precedence`. All binary operators are left-associative.
    ///
    /// Returns the parsed tree and its height.
    fn binary(&mut self, min_precedence: u8) -> Result<(Expr, usize), ExprError> {
        let (mut lhs, mut height) = self.unary()?;
        while let Some(op) = self
            .tokens
            .peek()
            .and_then(|token| BinaryOp::from_token(&token.kind))
            .filter(|op| op.precedence() >= min_precedence)
        {
            self.tokens.next();
            let (rhs, rhs_height) = self.binary(op.precedence() + 1)?;
            height = Self::height(height.max(rhs_height) + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, height))
    }

    fn unary(&mut self) -> Result<(Expr, usize), ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        self.depth += 1;
        let result = self.operand();
        self.depth -= 1;
        result
    }

    fn operand(&mut self) -> Result<(Expr, usize), ExprError> {
        let token = self.tokens.next().ok_or(ExprError::UnexpectedEnd)?;
        let op = match token.kind {
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Star => UnaryOp::Deref,
            TokenKind::Number(value) => return Ok((Expr::Literal(value), 1)),
            TokenKind::Register(name) => return Ok((Expr::Register(name), 1)),
            TokenKind::LeftParen => {
                let inner = self.binary(0)?;
                return match self.tokens.next() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(Self::unexpected(other)),
                    None => Err(ExprError::UnexpectedEnd),
                };
            }
            _ => return Err(Self::unexpected(token)),
        };
        let (operand, height) = self.unary()?;
        Ok((Expr::Unary(op, Box::new(operand)), Self::height(height + 1)?))
    }
}

impl std::str::FromStr for Expr {
    type Err = ExprError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        let mut parser = Parser {
            tokens: tokens.into_iter().peekable(),
            depth: 0,
        };
        let (expr, _) = parser.binary(0)?;
        match parser.tokens.next() {
            None => Ok(expr),
            Some(trailing) => Err(Parser::unexpected(trailing)),
        }
    }
}

impl Expr {
    /// Evaluates the expression against the current state of `target`.
    pub fn eval<T: Target + ?Sized>(&self, target: &T) -> Result<u64, ExprError> {
        Ok(match self {
            Self::Literal(value) => *value,
            Self::Register(name) => target
                .register(name)
                .ok_or_else(|| ExprError::UnknownRegister(name.clone()))?,
            Self::Unary(UnaryOp::Negate, operand) => operand.eval(target)?.wrapping_neg(),
            Self::Unary(UnaryOp::Not, operand) => u64::from(operand.eval(target)? == 0),
            Self::Unary(UnaryOp::Deref, operand) => {
                target.read_memory(Address(operand.eval(target)?), Width::_32)?
            }
            Self::Binary(op, lhs, rhs) => {
                let operands = || -> Result<(u64, u64), ExprError> {
                    Ok((lhs.eval(target)?, rhs.eval(target)?))
                };
                match op {
                    BinaryOp::And => u64::from(lhs.eval(target)? != 0 && rhs.eval(target)? != 0),
                    BinaryOp::Or => u64::from(lhs.eval(target)? != 0 || rhs.eval(target)? != 0),
                    BinaryOp::Equal => {
                        let (lhs, rhs) = operands()?;
                        u64::from(lhs == rhs)
                    }
                    BinaryOp::NotEqual => {
                        let (lhs, rhs) = operands()?;
                        u64::from(lhs != rhs)
                    }
                    BinaryOp::Add => {
                        let (lhs, rhs) = operands()?;
                        lhs.wrapping_add(rhs)
                    }
                    BinaryOp::Sub => {
                        let (lhs, rhs) = operands()?;
                        lhs.wrapping_sub(rhs)
                    }
                    BinaryOp::Mul => {
                        let (lhs, rhs) = operands()?;
                        lhs.wrapping_mul(rhs)
                    }
                    BinaryOp::Div => {
                        let (lhs, rhs) = operands()?;
                        lhs.checked_div(rhs).ok_or(ExprError::DivisionByZero)?
                    }
                }
            }
        })
    }
}

/// Parses and evaluates `input` against `target`.
pub fn evaluate<T: Target + ?Sized>(input: &str, target: &T) -> Result<u64, ExprError> {
    input.parse::<Expr>()?.eval(target)
}
