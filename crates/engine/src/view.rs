//! Read-only editor state for renderers.
//!
//! `EditorView` borrows straight from the editor. `EditorSnapshot` is an owned,
//! serializable copy for renderers that live across a process or thread
//! boundary.

use serde::Serialize;

use crate::editor::TokenEdit;
use crate::formula::Evaluation;
use crate::suggest::Candidate;
use crate::token::{Token, TokenKind};
use crate::token_id::TokenId;

#[derive(Debug, Clone, Copy)]
pub struct EditorView<'a> {
    pub tokens: &'a [Token],
    pub cursor: usize,
    pub buffer: &'a str,
    pub candidates: &'a [Candidate],
    pub autocomplete_visible: bool,
    pub evaluation: &'a Evaluation,
    pub token_edit: Option<&'a TokenEdit>,
}

impl EditorView<'_> {
    /// The result line is only shown once something has been entered.
    pub fn show_result(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Placeholder text for the input when the stream is empty.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.tokens.is_empty().then_some("Enter formula...")
    }

    pub fn to_snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            tokens: self.tokens.iter().map(TokenSnapshot::from).collect(),
            cursor: self.cursor,
            buffer: self.buffer.to_string(),
            candidates: if self.autocomplete_visible { self.candidates.to_vec() } else { Vec::new() },
            result: ResultSnapshot::from(self.evaluation),
            editing: self.token_edit.map(|e| e.id),
        }
    }
}

/// One token as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenSnapshot {
    pub id: TokenId,
    pub kind: TokenKind,
    pub display_name: String,
    pub category: String,
    pub value: f64,
}

impl From<&Token> for TokenSnapshot {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id(),
            kind: token.kind(),
            display_name: token.display_name().to_string(),
            category: token.category().to_string(),
            value: token.numeric_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ResultSnapshot {
    Empty,
    Value { value: f64 },
    Invalid { message: String },
}

impl From<&Evaluation> for ResultSnapshot {
    fn from(evaluation: &Evaluation) -> Self {
        match evaluation {
            Evaluation::NoResult => ResultSnapshot::Empty,
            Evaluation::Value(value) => ResultSnapshot::Value { value: *value },
            Evaluation::Invalid(e) => ResultSnapshot::Invalid { message: e.to_string() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSnapshot {
    pub tokens: Vec<TokenSnapshot>,
    pub cursor: usize,
    pub buffer: String,
    /// Only the candidates currently on screen.
    pub candidates: Vec<Candidate>,
    pub result: ResultSnapshot,
    /// Token whose edit box is open.
    pub editing: Option<TokenId>,
}

impl EditorSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
