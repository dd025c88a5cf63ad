//! The capture expression language.
//!
//! Mark conditions and replacement magnitudes are arithmetic/logical
//! expressions over the captures bound by a trigger pattern, written
//! `m[0]`, `m[1]`, ... This is deliberately not a general evaluator:
//! integers, captures, `+ - * /`, comparisons, `! && ||`, and
//! parentheses are the whole language.
//!
//! All values are `i64`; booleans are 0/1, so a comparison can feed
//! arithmetic and vice versa.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value bound by a capture slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureValue {
    /// Bound by `{:d}` or a numeric position.
    Int(i64),
    /// Bound by `{}` in verb position.
    Text(String),
}

/// Errors from parsing or evaluating a capture expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("unexpected `{0}`")]
    UnexpectedToken(String),

    #[error("expression ended unexpectedly")]
    UnexpectedEnd,

    #[error("capture m[{0}] is not bound")]
    CaptureUnbound(usize),

    #[error("capture m[{0}] is text, not a number")]
    CaptureNotNumeric(usize),

    #[error("division by zero")]
    DivisionByZero,
}

/// Binary operators, in the surface syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// A parsed capture expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal.
    Int(i64),
    /// Capture reference `m[i]`.
    Capture(usize),
    /// Arithmetic negation.
    Neg(Box<Expr>),
    /// Logical negation (0 becomes 1, anything else 0).
    Not(Box<Expr>),
    /// Binary operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse an expression such as `m[0] <= 2` or `m[0] * 2 + 1`.
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let tokens = lex(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.or_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(ExprError::UnexpectedToken(tok.describe())),
        }
    }

    /// Evaluate against bound captures. Booleans evaluate to 0/1.
    pub fn eval(&self, captures: &[CaptureValue]) -> Result<i64, ExprError> {
        match self {
            Expr::Int(n) => Ok(*n),
            Expr::Capture(i) => match captures.get(*i) {
                Some(CaptureValue::Int(n)) => Ok(*n),
                Some(CaptureValue::Text(_)) => Err(ExprError::CaptureNotNumeric(*i)),
                None => Err(ExprError::CaptureUnbound(*i)),
            },
            Expr::Neg(inner) => Ok(-inner.eval(captures)?),
            Expr::Not(inner) => Ok(i64::from(inner.eval(captures)? == 0)),
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.eval(captures)?;
                // Short-circuit the logical operators.
                match op {
                    BinOp::And if l == 0 => return Ok(0),
                    BinOp::Or if l != 0 => return Ok(1),
                    _ => {}
                }
                let r = rhs.eval(captures)?;
                Ok(match op {
                    BinOp::Add => l.wrapping_add(r),
                    BinOp::Sub => l.wrapping_sub(r),
                    BinOp::Mul => l.wrapping_mul(r),
                    BinOp::Div => {
                        if r == 0 {
                            return Err(ExprError::DivisionByZero);
                        }
                        l.wrapping_div(r)
                    }
                    BinOp::Lt => i64::from(l < r),
                    BinOp::Le => i64::from(l <= r),
                    BinOp::Gt => i64::from(l > r),
                    BinOp::Ge => i64::from(l >= r),
                    BinOp::Eq => i64::from(l == r),
                    BinOp::Ne => i64::from(l != r),
                    BinOp::And => i64::from(r != 0),
                    BinOp::Or => i64::from(r != 0),
                })
            }
        }
    }

    /// Evaluate as a condition: nonzero is true.
    pub fn eval_bool(&self, captures: &[CaptureValue]) -> Result<bool, ExprError> {
        Ok(self.eval(captures)? != 0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Int(i64),
    Capture(usize),
    Op(BinOp),
    Bang,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Int(n) => n.to_string(),
            Token::Capture(i) => format!("m[{i}]"),
            Token::Op(op) => format!("{op:?}"),
            Token::Bang => "!".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn lex(src: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < src.len() {
        let Some(c) = src[i..].chars().next() else {
            break;
        };
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Op(BinOp::Add));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Op(BinOp::Sub));
                i += 1;
            }
            '*' => {
                tokens.push(Token::Op(BinOp::Mul));
                i += 1;
            }
            '/' => {
                tokens.push(Token::Op(BinOp::Div));
                i += 1;
            }
            // Two-character operators are matched with `starts_with`
            // so the lookahead never slices mid-character.
            '<' | '>' | '=' | '!' => {
                let rest = &src[i..];
                if rest.starts_with("<=") {
                    tokens.push(Token::Op(BinOp::Le));
                    i += 2;
                } else if rest.starts_with(">=") {
                    tokens.push(Token::Op(BinOp::Ge));
                    i += 2;
                } else if rest.starts_with("==") {
                    tokens.push(Token::Op(BinOp::Eq));
                    i += 2;
                } else if rest.starts_with("!=") {
                    tokens.push(Token::Op(BinOp::Ne));
                    i += 2;
                } else {
                    match c {
                        '<' => tokens.push(Token::Op(BinOp::Lt)),
                        '>' => tokens.push(Token::Op(BinOp::Gt)),
                        '!' => tokens.push(Token::Bang),
                        _ => return Err(ExprError::UnexpectedToken(c.to_string())),
                    }
                    i += 1;
                }
            }
            '&' | '|' => {
                let rest = &src[i..];
                if rest.starts_with("&&") {
                    tokens.push(Token::Op(BinOp::And));
                } else if rest.starts_with("||") {
                    tokens.push(Token::Op(BinOp::Or));
                } else {
                    return Err(ExprError::UnexpectedToken(c.to_string()));
                }
                i += 2;
            }
            '0'..='9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let n = src[start..i]
                    .parse()
                    .map_err(|_| ExprError::UnexpectedToken(src[start..i].to_string()))?;
                tokens.push(Token::Int(n));
            }
            'm' => {
                // m[<index>]
                let rest = &src[i + 1..];
                let Some(stripped) = rest.strip_prefix('[') else {
                    return Err(ExprError::UnexpectedToken("m".to_string()));
                };
                let Some(close) = stripped.find(']') else {
                    return Err(ExprError::UnexpectedEnd);
                };
                let index = stripped[..close]
                    .trim()
                    .parse()
                    .map_err(|_| ExprError::UnexpectedToken(stripped[..close].to_string()))?;
                tokens.push(Token::Capture(index));
                i += 1 + close + 2;
            }
            other => return Err(ExprError::UnexpectedToken(other.to_string())),
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser over the token list.
///
/// Precedence, loosest first: `||`, `&&`, comparisons, `+ -`, `* /`,
/// unary `- !`.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat_op(&mut self, ops: &[BinOp]) -> Option<BinOp> {
        if let Some(Token::Op(op)) = self.peek() {
            if ops.contains(op) {
                let op = *op;
                self.pos += 1;
                return Some(op);
            }
        }
        None
    }

    fn or_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.and_expr()?;
        while self.eat_op(&[BinOp::Or]).is_some() {
            let rhs = self.and_expr()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.cmp_expr()?;
        while self.eat_op(&[BinOp::And]).is_some() {
            let rhs = self.cmp_expr()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn cmp_expr(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.add_expr()?;
        if let Some(op) = self.eat_op(&[
            BinOp::Le,
            BinOp::Ge,
            BinOp::Lt,
            BinOp::Gt,
            BinOp::Eq,
            BinOp::Ne,
        ]) {
            let rhs = self.add_expr()?;
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn add_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.mul_expr()?;
        while let Some(op) = self.eat_op(&[BinOp::Add, BinOp::Sub]) {
            let rhs = self.mul_expr()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn mul_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary_expr()?;
        while let Some(op) = self.eat_op(&[BinOp::Mul, BinOp::Div]) {
            let rhs = self.unary_expr()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Op(BinOp::Sub)) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary_expr()?)))
            }
            Some(Token::Bang) => {
                self.pos += 1;
                Ok(Expr::Not(Box::new(self.unary_expr()?)))
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Expr, ExprError> {
        match self.bump() {
            Some(Token::Int(n)) => Ok(Expr::Int(n)),
            Some(Token::Capture(i)) => Ok(Expr::Capture(i)),
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    Some(tok) => Err(ExprError::UnexpectedToken(tok.describe())),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(tok) => Err(ExprError::UnexpectedToken(tok.describe())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<CaptureValue> {
        values.iter().map(|&n| CaptureValue::Int(n)).collect()
    }

    #[test]
    fn test_literal() {
        assert_eq!(Expr::parse("42").unwrap().eval(&[]).unwrap(), 42);
    }

    #[test]
    fn test_capture() {
        let expr = Expr::parse("m[0] + 2").unwrap();
        assert_eq!(expr.eval(&ints(&[5])).unwrap(), 7);
    }

    #[test]
    fn test_precedence() {
        let expr = Expr::parse("1 + 2 * 3").unwrap();
        assert_eq!(expr.eval(&[]).unwrap(), 7);

        let expr = Expr::parse("(1 + 2) * 3").unwrap();
        assert_eq!(expr.eval(&[]).unwrap(), 9);
    }

    #[test]
    fn test_comparison() {
        let expr = Expr::parse("m[0] <= 2").unwrap();
        assert_eq!(expr.eval(&ints(&[2])).unwrap(), 1);
        assert_eq!(expr.eval(&ints(&[5])).unwrap(), 0);
    }

    #[test]
    fn test_logical() {
        let expr = Expr::parse("m[0] > 0 && m[0] < 10").unwrap();
        assert!(expr.eval_bool(&ints(&[5])).unwrap());
        assert!(!expr.eval_bool(&ints(&[12])).unwrap());

        let expr = Expr::parse("m[0] == 1 || m[0] == 3").unwrap();
        assert!(expr.eval_bool(&ints(&[3])).unwrap());
        assert!(!expr.eval_bool(&ints(&[2])).unwrap());
    }

    #[test]
    fn test_short_circuit_guards_division() {
        let expr = Expr::parse("m[0] != 0 && 10 / m[0] > 1").unwrap();
        assert!(!expr.eval_bool(&ints(&[0])).unwrap());
    }

    #[test]
    fn test_unary() {
        assert_eq!(Expr::parse("-m[0]").unwrap().eval(&ints(&[4])).unwrap(), -4);
        assert_eq!(Expr::parse("!0").unwrap().eval(&[]).unwrap(), 1);
        assert_eq!(Expr::parse("!7").unwrap().eval(&[]).unwrap(), 0);
    }

    #[test]
    fn test_division_by_zero() {
        let expr = Expr::parse("1 / m[0]").unwrap();
        assert_eq!(expr.eval(&ints(&[0])), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn test_unbound_capture() {
        let expr = Expr::parse("m[3]").unwrap();
        assert_eq!(expr.eval(&ints(&[1])), Err(ExprError::CaptureUnbound(3)));
    }

    #[test]
    fn test_text_capture_rejected_in_arithmetic() {
        let expr = Expr::parse("m[0] + 1").unwrap();
        let captures = vec![CaptureValue::Text("healed".to_string())];
        assert_eq!(expr.eval(&captures), Err(ExprError::CaptureNotNumeric(0)));
    }

    /// Non-ASCII operator glyphs next to the ASCII ones are a parse
    /// error, not a panic, even when the lookahead would land inside
    /// the multibyte sequence.
    #[test]
    fn test_multibyte_operator_rejected() {
        assert!(Expr::parse("m[0] <\u{2264} 2").is_err());
        assert!(Expr::parse("m[0] \u{2264} 2").is_err());
        assert!(Expr::parse("m[0] =\u{2260} 2").is_err());
        assert!(Expr::parse("m[0] |\u{2016} 2").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(Expr::parse("").is_err());
        assert!(Expr::parse("1 +").is_err());
        assert!(Expr::parse("(1").is_err());
        assert!(Expr::parse("m[x]").is_err());
        assert!(Expr::parse("1 2").is_err());
    }
}
