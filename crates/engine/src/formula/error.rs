//! Evaluation failure taxonomy.
//!
//! Every way a formula can fail to produce a number. None of these are fatal:
//! the editor stores them as `Evaluation::Invalid` and keeps going.

/// Why a formula could not be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidExpression {
    /// Nothing but whitespace to evaluate
    Empty,
    /// A character the expression language doesn't know
    UnexpectedCharacter(char),
    /// Digits that don't form a number (e.g. "1.2.3")
    InvalidNumber(String),
    /// Input ended where an operand was required
    UnexpectedEnd,
    /// A token in a position where it can't appear
    UnexpectedToken { position: usize, found: String },
    /// `(` without a matching `)`
    MissingClosingParen,
    /// `)` without a matching `(`
    UnmatchedClosingParen { position: usize },
    DivisionByZero,
    /// Overflow or an undefined power such as `0 ^ -1`
    NonFinite,
    /// Parentheses or exponents nested past the parser's limit
    TooDeep,
    /// More lexemes than the parser accepts
    TooLong,
}

impl std::fmt::Display for InvalidExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidExpression::Empty => write!(f, "Empty expression"),
            InvalidExpression::UnexpectedCharacter(c) => write!(f, "Unexpected character: {}", c),
            InvalidExpression::InvalidNumber(s) => write!(f, "Invalid number: {}", s),
            InvalidExpression::UnexpectedEnd => write!(f, "Unexpected end of expression"),
            InvalidExpression::UnexpectedToken { position, found } => {
                write!(f, "Unexpected '{}' at position {}", found, position)
            }
            InvalidExpression::MissingClosingParen => write!(f, "Missing closing parenthesis"),
            InvalidExpression::UnmatchedClosingParen { position } => {
                write!(f, "Unmatched closing parenthesis at position {}", position)
            }
            InvalidExpression::DivisionByZero => write!(f, "Division by zero"),
            InvalidExpression::NonFinite => write!(f, "Result is not a finite number"),
            InvalidExpression::TooDeep => write!(f, "Expression is nested too deeply"),
            InvalidExpression::TooLong => write!(f, "Expression is too long"),
        }
    }
}

impl std::error::Error for InvalidExpression {}
