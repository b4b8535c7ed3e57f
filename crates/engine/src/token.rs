// Formula tokens - the discrete elements a user assembles into a formula

use serde::Serialize;

use crate::suggest::Candidate;
use crate::token_id::TokenId;

/// Glyphs that commit an operator token instead of going into the text buffer.
pub const OPERATOR_GLYPHS: [char; 7] = ['+', '-', '*', '/', '(', ')', '^'];

/// Kind discriminator, as exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Variable,
    Operator,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,    // +
    Sub,    // -
    Mul,    // *
    Div,    // /
    Pow,    // ^
    LParen, // (
    RParen, // )
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '^' => Some(Operator::Pow),
            '(' => Some(Operator::LParen),
            ')' => Some(Operator::RParen),
            _ => None,
        }
    }

    /// Parse a whole string as a single operator glyph ("+" yes, "++" or " +" no).
    pub fn from_glyph(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Pow => '^',
            Operator::LParen => '(',
            Operator::RParen => ')',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "^",
            Operator::LParen => "(",
            Operator::RParen => ")",
        }
    }
}

/// One element of the formula stream.
///
/// Each variant carries only the fields that mean something for its kind.
/// `id` is fixed for the token's lifetime; replacing a token through the
/// editor keeps the slot's id.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A literal typed by the user. `text` is what was typed, `value` its parse.
    Number { id: TokenId, text: String, value: f64 },
    Operator { id: TokenId, op: Operator },
    /// A named value bound from a lookup candidate.
    /// `source_id` is the candidate id the binding came from.
    Variable {
        id: TokenId,
        name: String,
        category: String,
        value: f64,
        source_id: String,
    },
}

impl Token {
    pub fn number(text: impl Into<String>, value: f64) -> Self {
        Token::Number { id: TokenId::fresh(), text: text.into(), value }
    }

    /// Number token whose display text is the value's own decimal rendering.
    pub fn from_value(value: f64) -> Self {
        Self::number(value.to_string(), value)
    }

    pub fn operator(op: Operator) -> Self {
        Token::Operator { id: TokenId::fresh(), op }
    }

    /// Mint a variable from a candidate. The candidate may be picked again
    /// later, so the token gets its own id rather than reusing the candidate's.
    pub fn variable(candidate: &Candidate) -> Self {
        Token::Variable {
            id: TokenId::fresh(),
            name: candidate.name.clone(),
            category: candidate.category.clone(),
            value: candidate.value,
            source_id: candidate.id.clone(),
        }
    }

    pub fn id(&self) -> TokenId {
        match self {
            Token::Number { id, .. } | Token::Operator { id, .. } | Token::Variable { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Number { .. } => TokenKind::Number,
            Token::Operator { .. } => TokenKind::Operator,
            Token::Variable { .. } => TokenKind::Variable,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Token::Number { text, .. } => text,
            Token::Operator { op, .. } => op.as_str(),
            Token::Variable { name, .. } => name,
        }
    }

    /// Empty for operators and numbers.
    pub fn category(&self) -> &str {
        match self {
            Token::Variable { category, .. } => category,
            Token::Number { .. } | Token::Operator { .. } => "",
        }
    }

    /// `0.0` for operators.
    pub fn numeric_value(&self) -> f64 {
        match self {
            Token::Number { value, .. } | Token::Variable { value, .. } => *value,
            Token::Operator { .. } => 0.0,
        }
    }

    pub fn as_operator(&self) -> Option<Operator> {
        match self {
            Token::Operator { op, .. } => Some(*op),
            _ => None,
        }
    }

    /// Same token under a different id.
    pub(crate) fn with_id(self, new_id: TokenId) -> Self {
        match self {
            Token::Number { text, value, .. } => Token::Number { id: new_id, text, value },
            Token::Operator { op, .. } => Token::Operator { id: new_id, op },
            Token::Variable { name, category, value, source_id, .. } => Token::Variable {
                id: new_id,
                name,
                category,
                value,
                source_id,
            },
        }
    }

    /// Rebind a variable to a different candidate, keeping its id and category.
    /// Other kinds are returned unchanged.
    pub(crate) fn rebound(self, candidate: &Candidate) -> Self {
        match self {
            Token::Variable { id, category, .. } => Token::Variable {
                id,
                name: candidate.name.clone(),
                category,
                value: candidate.value,
                source_id: candidate.id.clone(),
            },
            other => other,
        }
    }
}

/// Classify free-typed text as a number.
///
/// Surrounding whitespace is ignored; the rest must parse as a finite `f64`.
/// `"inf"` and `"NaN"` parse in Rust but are not numbers a user can commit.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
