//! Tiny expression language for `graph_plot`: one variable `x`, the four
//! arithmetic operators, `^`, implicit multiplication (`2x`, `3(x+1)`) and a
//! handful of functions.

use crate::errors::ExpressionError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Log,
    Sqrt,
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "exp" => Some(Self::Exp),
            "ln" => Some(Self::Ln),
            "log" => Some(Self::Log),
            "sqrt" => Some(Self::Sqrt),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Self::Sin => v.sin(),
            Self::Cos => v.cos(),
            Self::Tan => v.tan(),
            Self::Exp => v.exp(),
            Self::Ln => v.ln(),
            Self::Log => v.log10(),
            Self::Sqrt => v.sqrt(),
            Self::Abs => v.abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    X,
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    /// Parse `y = <expr>`, `f(x) = <expr>` or a bare expression
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        let (offset, body) = match input.rfind('=') {
            Some(idx) => (idx + 1, &input[idx + 1..]),
            None => (0, input),
        };

        let tokens = tokenize(body, offset)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression()?;

        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(ExpressionError::UnexpectedToken(token.pos)),
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::X => x,
            Expr::Neg(inner) => -inner.eval(x),
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(x), rhs.eval(x));
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, arg) => func.apply(arg.eval(x)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(input: &str, offset: usize) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(idx, c)) = chars.peek() {
        let pos = offset + idx;
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
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
                .map_err(|_| ExpressionError::UnexpectedChar(c, pos))?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                pos,
            });
        } else if c.is_alphabetic() {
            let mut name = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_alphabetic() {
                    name.push(d.to_ascii_lowercase());
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Ident(name),
                pos,
            });
        } else {
            let kind = match c {
                '+' | '-' | '/' | '^' => TokenKind::Op(c),
                '*' | '×' | '·' => TokenKind::Op('*'),
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                _ => return Err(ExpressionError::UnexpectedChar(c, pos)),
            };
            tokens.push(Token { kind, pos });
            chars.next();
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, ExpressionError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ExpressionError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_op(&self) -> Option<char> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) => Some(*op),
            _ => None,
        }
    }

    fn expression(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek_op() {
            self.pos += 1;
            let rhs = self.term()?;
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Op(op @ ('*' | '/'))) => {
                    let op = if *op == '*' { BinaryOp::Mul } else { BinaryOp::Div };
                    self.pos += 1;
                    let rhs = self.unary()?;
                    lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
                }
                // implicit multiplication: 2x, 3(x + 1), x sin(x)
                Some(TokenKind::Number(_) | TokenKind::Ident(_) | TokenKind::LParen) => {
                    let rhs = self.power()?;
                    lhs = Expr::Binary(BinaryOp::Mul, Box::new(lhs), Box::new(rhs));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        match self.peek_op() {
            Some('-') => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some('+') => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.primary()?;
        if self.peek_op() == Some('^') {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary(
                BinaryOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            TokenKind::Ident(name) => match name.as_str() {
                "x" => Ok(Expr::X),
                "pi" => Ok(Expr::Number(std::f64::consts::PI)),
                "e" => Ok(Expr::Number(std::f64::consts::E)),
                _ => {
                    let func = Function::from_name(&name)
                        .ok_or_else(|| ExpressionError::UnknownIdentifier(name.clone()))?;
                    match self.next()? {
                        Token {
                            kind: TokenKind::LParen,
                            ..
                        } => {}
                        other => return Err(ExpressionError::UnexpectedToken(other.pos)),
                    }
                    let arg = self.expression()?;
                    self.expect_rparen()?;
                    Ok(Expr::Call(func, Box::new(arg)))
                }
            },
            TokenKind::Op(_) | TokenKind::RParen => Err(ExpressionError::UnexpectedToken(token.pos)),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ExpressionError> {
        match self.next()? {
            Token {
                kind: TokenKind::RParen,
                ..
            } => Ok(()),
            other => Err(ExpressionError::UnexpectedToken(other.pos)),
        }
    }
}
