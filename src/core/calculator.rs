//! Restricted arithmetic evaluator.
//!
//! Input is first screened against a character whitelist, then parsed by a
//! small recursive-descent parser into an expression tree that can only
//! hold numeric literals, unary minus and the four binary operators.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := number | '(' expr ')'
//! ```

use thiserror::Error;

/// Nesting limit for parentheses and unary minus.
const MAX_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Only basic math operations allowed")]
    Disallowed,

    #[error("empty expression")]
    Empty,

    #[error("invalid syntax: {0}")]
    Syntax(String),

    #[error("expression nested too deeply")]
    TooDeep,

    #[error("division by zero")]
    DivisionByZero,

    #[error("result out of range")]
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eval(&self) -> Result<f64, CalcError> {
        let value = match self {
            Expr::Number(n) => *n,
            Expr::Neg(inner) => -inner.eval()?,
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval()?, rhs.eval()?);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => {
                        if b == 0.0 {
                            return Err(CalcError::DivisionByZero);
                        }
                        a / b
                    }
                }
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(CalcError::OutOfRange)
        }
    }
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

fn is_allowed(c: char) -> bool {
    c.is_ascii_digit() || "+-*/().".contains(c) || c.is_whitespace()
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::Syntax(format!("bad number '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            _ => return Err(CalcError::Disallowed),
        }
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

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, CalcError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, CalcError> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinaryOp::Mul),
            Some(Token::Slash) => Some(BinaryOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, CalcError> {
        if self.peek() == Some(Token::Minus) {
            self.pos += 1;
            self.descend()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, CalcError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(CalcError::Syntax("missing ')'".to_string())),
                }
            }
            Some(token) => Err(CalcError::Syntax(format!("unexpected {:?}", token))),
            None => Err(CalcError::Syntax("unexpected end of expression".to_string())),
        }
    }
}

/// Parse an expression into a tree.
pub fn parse(input: &str) -> Result<Expr, CalcError> {
    if !input.chars().all(is_allowed) {
        return Err(CalcError::Disallowed);
    }

    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(CalcError::Syntax(format!("unexpected {:?}", token)));
    }
    Ok(expr)
}

/// Parse and evaluate an expression.
pub fn evaluate(input: &str) -> Result<f64, CalcError> {
    parse(input)?.eval()
}

/// Render a result, dropping the fraction for whole numbers.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
