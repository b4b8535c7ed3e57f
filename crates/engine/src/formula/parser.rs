// Formula parser - converts infix arithmetic text into an AST
// Supports: decimal numbers, + - * / ^, unary minus/plus, parentheses,
// and implicit multiplication before an opening parenthesis: 2 (3 + 4)

use super::error::InvalidExpression;

/// Deepest nesting of parentheses and `^` exponents accepted.
pub const MAX_DEPTH: usize = 256;

/// Longest expression accepted, in lexemes.
pub const MAX_LEXEMES: usize = 4096;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Unary minus
    Neg(Box<Expr>),
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parse an infix arithmetic expression.
///
/// Precedence, loosest to tightest: `+ -`, `* /` (and implicit `*`), unary
/// sign, `^`. Binary operators are left-associative except `^`, which is
/// right-associative, so `2 ^ 3 ^ 2` is `2 ^ 9` and `-2 ^ 2` is `-(2 ^ 2)`.
pub fn parse(input: &str) -> Result<Expr, InvalidExpression> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(InvalidExpression::Empty);
    }
    if tokens.len() > MAX_LEXEMES {
        return Err(InvalidExpression::TooLong);
    }

    let (expr, pos) = parse_add_sub(&tokens, 0, 0)?;
    match tokens.get(pos) {
        None => Ok(expr),
        Some(Lexeme::RParen) => Err(InvalidExpression::UnmatchedClosingParen { position: pos }),
        Some(other) => Err(InvalidExpression::UnexpectedToken {
            position: pos,
            found: other.to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl std::fmt::Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lexeme::Number(n) => write!(f, "{}", n),
            Lexeme::Plus => write!(f, "+"),
            Lexeme::Minus => write!(f, "-"),
            Lexeme::Star => write!(f, "*"),
            Lexeme::Slash => write!(f, "/"),
            Lexeme::Caret => write!(f, "^"),
            Lexeme::LParen => write!(f, "("),
            Lexeme::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Lexeme>, InvalidExpression> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => { chars.next(); }
            '+' => { tokens.push(Lexeme::Plus); chars.next(); }
            '-' => { tokens.push(Lexeme::Minus); chars.next(); }
            '*' => { tokens.push(Lexeme::Star); chars.next(); }
            '/' => { tokens.push(Lexeme::Slash); chars.next(); }
            '^' => { tokens.push(Lexeme::Caret); chars.next(); }
            '(' => { tokens.push(Lexeme::LParen); chars.next(); }
            ')' => { tokens.push(Lexeme::RParen); chars.next(); }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }

                // Exponent suffix (1e5, 2.5E-3), only when digits follow
                if matches!(chars.peek(), Some('e' | 'E')) {
                    let mut lookahead = chars.clone();
                    let mut suffix = String::new();
                    if let Some(e) = lookahead.next() {
                        suffix.push(e);
                    }
                    if let Some(&sign) = lookahead.peek() {
                        if sign == '+' || sign == '-' {
                            suffix.push(sign);
                            lookahead.next();
                        }
                    }
                    if lookahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                        while let Some(&d) = lookahead.peek() {
                            if d.is_ascii_digit() {
                                suffix.push(d);
                                lookahead.next();
                            } else {
                                break;
                            }
                        }
                        num_str.push_str(&suffix);
                        chars = lookahead;
                    }
                }

                let num: f64 = num_str
                    .parse()
                    .map_err(|_| InvalidExpression::InvalidNumber(num_str.clone()))?;
                tokens.push(Lexeme::Number(num));
            }
            _ => return Err(InvalidExpression::UnexpectedCharacter(c)),
        }
    }

    Ok(tokens)
}

fn binary(op: Op, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

// One level deeper, or TooDeep past MAX_DEPTH
fn descend(depth: usize) -> Result<usize, InvalidExpression> {
    if depth >= MAX_DEPTH {
        return Err(InvalidExpression::TooDeep);
    }
    Ok(depth + 1)
}

// Lowest precedence: addition and subtraction
fn parse_add_sub(tokens: &[Lexeme], pos: usize, depth: usize) -> Result<(Expr, usize), InvalidExpression> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos, depth)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Lexeme::Plus => Op::Add,
            Lexeme::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1, depth)?;
        left = binary(op, left, right);
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Lexeme], pos: usize, depth: usize) -> Result<(Expr, usize), InvalidExpression> {
    let (mut left, mut pos) = parse_unary(tokens, pos, depth)?;

    while pos < tokens.len() {
        match &tokens[pos] {
            Lexeme::Star => {
                let (right, new_pos) = parse_unary(tokens, pos + 1, depth)?;
                left = binary(Op::Mul, left, right);
                pos = new_pos;
            }
            Lexeme::Slash => {
                let (right, new_pos) = parse_unary(tokens, pos + 1, depth)?;
                left = binary(Op::Div, left, right);
                pos = new_pos;
            }
            // Implicit multiplication: an operand directly followed by "("
            Lexeme::LParen => {
                let (right, new_pos) = parse_unary(tokens, pos, depth)?;
                left = binary(Op::Mul, left, right);
                pos = new_pos;
            }
            _ => break,
        }
    }

    Ok((left, pos))
}

// Unary sign binds looser than ^ so that -2 ^ 2 = -4.
// A run of signs folds into at most one Neg.
fn parse_unary(tokens: &[Lexeme], pos: usize, depth: usize) -> Result<(Expr, usize), InvalidExpression> {
    let mut pos = pos;
    let mut negate = false;
    loop {
        match tokens.get(pos) {
            Some(Lexeme::Minus) => negate = !negate,
            Some(Lexeme::Plus) => {}
            _ => break,
        }
        pos += 1;
    }

    let (expr, pos) = parse_power(tokens, pos, depth)?;
    if negate {
        Ok((Expr::Neg(Box::new(expr)), pos))
    } else {
        Ok((expr, pos))
    }
}

// Exponentiation (^) - right-associative; the exponent may carry a sign (2 ^ -1)
fn parse_power(tokens: &[Lexeme], pos: usize, depth: usize) -> Result<(Expr, usize), InvalidExpression> {
    let (base, pos) = parse_primary(tokens, pos, depth)?;

    if let Some(Lexeme::Caret) = tokens.get(pos) {
        let (exponent, new_pos) = parse_unary(tokens, pos + 1, descend(depth)?)?;
        return Ok((binary(Op::Pow, base, exponent), new_pos));
    }

    Ok((base, pos))
}

fn parse_primary(tokens: &[Lexeme], pos: usize, depth: usize) -> Result<(Expr, usize), InvalidExpression> {
    let Some(token) = tokens.get(pos) else {
        return Err(InvalidExpression::UnexpectedEnd);
    };

    match token {
        Lexeme::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Lexeme::LParen => {
            let (expr, pos) = parse_add_sub(tokens, pos + 1, descend(depth)?)?;
            match tokens.get(pos) {
                None => Err(InvalidExpression::MissingClosingParen),
                Some(Lexeme::RParen) => Ok((expr, pos + 1)),
                Some(other) => Err(InvalidExpression::UnexpectedToken {
                    position: pos,
                    found: other.to_string(),
                }),
            }
        }
        other => Err(InvalidExpression::UnexpectedToken {
            position: pos,
            found: other.to_string(),
        }),
    }
}
