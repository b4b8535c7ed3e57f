// Formula evaluator - turns the token stream into a number

use super::error::InvalidExpression;
use super::parser::{self, Expr, Op};
use crate::token::Token;

/// Outcome of evaluating the current token stream.
///
/// `NoResult` (nothing entered yet) is kept apart from `Invalid` (something
/// was entered but doesn't evaluate) so a blank editor shows no error.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Evaluation {
    #[default]
    NoResult,
    Value(f64),
    Invalid(InvalidExpression),
}

impl Evaluation {
    pub fn value(&self) -> Option<f64> {
        match self {
            Evaluation::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&InvalidExpression> {
        match self {
            Evaluation::Invalid(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Evaluation::Invalid(_))
    }

    /// Text for the result line: blank, the number, or "Invalid formula".
    pub fn display_text(&self) -> String {
        match self {
            Evaluation::NoResult => String::new(),
            Evaluation::Value(v) => v.to_string(),
            Evaluation::Invalid(_) => "Invalid formula".to_string(),
        }
    }
}

impl From<Result<f64, InvalidExpression>> for Evaluation {
    fn from(result: Result<f64, InvalidExpression>) -> Self {
        match result {
            Ok(v) => Evaluation::Value(v),
            Err(e) => Evaluation::Invalid(e),
        }
    }
}

/// Evaluate a token stream.
///
/// The stream is projected to infix text (see `render_infix`) and that text
/// is parsed and evaluated with standard precedence in `f64`.
pub fn evaluate(tokens: &[Token]) -> Evaluation {
    if tokens.is_empty() {
        return Evaluation::NoResult;
    }
    evaluate_expression(&render_infix(tokens)).into()
}

/// Project tokens to infix text: operators as their glyph, everything else as
/// the decimal rendering of its value, joined by single spaces.
pub fn render_infix(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            Token::Operator { op, .. } => op.as_str().to_string(),
            other => other.numeric_value().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse and evaluate an infix arithmetic expression.
pub fn evaluate_expression(text: &str) -> Result<f64, InvalidExpression> {
    let expr = parser::parse(text)?;
    eval_expr(&expr)
}

fn eval_expr(expr: &Expr) -> Result<f64, InvalidExpression> {
    match expr {
        Expr::Number(n) => finite(*n),
        Expr::Neg(inner) => Ok(-eval_expr(inner)?),
        Expr::BinaryOp { op, left, right } => {
            let left_val = eval_expr(left)?;
            let right_val = eval_expr(right)?;

            let result = match op {
                Op::Add => left_val + right_val,
                Op::Sub => left_val - right_val,
                Op::Mul => left_val * right_val,
                Op::Div => {
                    if right_val == 0.0 {
                        return Err(InvalidExpression::DivisionByZero);
                    }
                    left_val / right_val
                }
                Op::Pow => left_val.powf(right_val),
            };
            finite(result)
        }
    }
}

fn finite(n: f64) -> Result<f64, InvalidExpression> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(InvalidExpression::NonFinite)
    }
}
