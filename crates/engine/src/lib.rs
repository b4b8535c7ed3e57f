pub mod editor;
pub mod formula;
pub mod input;
pub mod suggest;
pub mod token;
pub mod token_id;
pub mod view;

#[cfg(test)]
pub mod harness;

pub use editor::{Editor, EditorOptions, TokenEdit};
pub use formula::{evaluate, evaluate_expression, render_infix, Evaluation, InvalidExpression};
pub use input::{InputEvent, Key};
pub use suggest::{
    filter_candidates, Candidate, LookupRequest, LookupResponse, LookupTarget, StaticCatalog,
    SuggestionSource,
};
pub use token::{parse_numeric_text, Operator, Token, TokenKind, OPERATOR_GLYPHS};
pub use token_id::TokenId;
pub use view::{EditorSnapshot, EditorView, ResultSnapshot, TokenSnapshot};
