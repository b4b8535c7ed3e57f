// Formula parsing and evaluation

pub mod error;
pub mod parser;
pub mod eval;

pub use error::InvalidExpression;
pub use eval::{evaluate, evaluate_expression, render_infix, Evaluation};
