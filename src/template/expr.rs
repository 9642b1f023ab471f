//! Restricted arithmetic evaluator.
//!
//! Grammar (whitespace between tokens is ignored):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | '(' expr ')'
//! number  := digits ['.' digits] | '.' digits | digits '.'
//! ```
//!
//! Nothing else is accepted: no names, calls, exponents or other operators.

use thiserror::Error;

/// Maximum nesting of parentheses and unary signs.
const MAX_DEPTH: usize = 64;

/// Why an expression could not be evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The expression has no tokens.
    #[error("empty expression")]
    Empty,

    /// A character outside the arithmetic alphabet.
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),

    /// A numeric literal that does not parse.
    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    /// A token in a position the grammar does not allow.
    #[error("unexpected {0}")]
    UnexpectedToken(String),

    /// The expression ended early.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The result overflowed to infinity or is not a number.
    #[error("result is not finite")]
    NotFinite,

    /// Nesting deeper than the evaluator allows.
    #[error("expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(EvalError::UnexpectedChar(other, offset)),
        };
        tokens.push(token);
        chars.next();
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.parse_term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.advance();
            let rhs = self.parse_term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.parse_unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.advance();
            let rhs = self.parse_unary()?;
            value = if op == Token::Star {
                value * rhs
            } else if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            } else {
                value / rhs
            };
        }
        Ok(value)
    }

    fn parse_unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(sign @ (Token::Plus | Token::Minus)) => {
                self.advance();
                self.descend()?;
                let value = self.parse_unary()?;
                self.depth -= 1;
                Ok(if sign == Token::Minus { -value } else { value })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<f64, EvalError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                self.descend()?;
                let value = self.parse_expr()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(EvalError::UnexpectedToken(other.describe())),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(other) => Err(EvalError::UnexpectedToken(other.describe())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

/// Evaluate an arithmetic expression.
///
/// # Example
///
/// ```
/// use docfill::template::{evaluate, EvalError};
///
/// assert_eq!(evaluate("(1000 + 500) * 2"), Ok(3000.0));
/// assert_eq!(evaluate("10/0"), Err(EvalError::DivisionByZero));
/// assert!(evaluate("__import__('os')").is_err());
/// ```
pub fn evaluate(input: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_expr()?;

    if let Some(extra) = parser.peek() {
        return Err(EvalError::UnexpectedToken(extra.describe()));
    }
    if !value.is_finite() {
        return Err(EvalError::NotFinite);
    }
    Ok(value)
}
