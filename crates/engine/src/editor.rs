//! Token stream editor.
//!
//! Owns the formula being built: the ordered tokens, the cursor between them,
//! the raw text the user is typing at the cursor, and the autocomplete state
//! for that text. Every operation that changes the token sequence re-evaluates
//! the formula before returning, so `evaluation()` is never stale.
//!
//! Lookups are not performed here. The editor queues a `LookupRequest`
//! (see `take_lookup_request`) and accepts the answer through
//! `apply_lookup_response`, dropping answers that no longer match.

use log::{debug, trace};

use crate::formula::{evaluate, Evaluation};
use crate::input::{InputEvent, Key};
use crate::suggest::{Candidate, LookupRequest, LookupResponse, LookupTarget};
use crate::token::{parse_numeric_text, Operator, Token};
use crate::token_id::TokenId;
use crate::view::{EditorSnapshot, EditorView};

/// Behaviour switches for an editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    /// Query the lookup service while the user types names.
    pub autocomplete: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self { autocomplete: true }
    }
}

/// An open in-place edit of an existing token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEdit {
    pub id: TokenId,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Editor {
    tokens: Vec<Token>,
    /// Insertion point, always within 0..=tokens.len()
    cursor: usize,
    buffer: String,
    autocomplete_active: bool,
    /// Candidates for the buffer, or for `token_edit` while one is open
    candidates: Vec<Candidate>,
    /// Sequence number of the most recently issued lookup
    lookup_seq: u64,
    pending_lookup: Option<LookupRequest>,
    token_edit: Option<TokenEdit>,
    evaluation: Evaluation,
    options: EditorOptions,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EditorOptions) -> Self {
        Self { options, ..Self::default() }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn is_autocomplete_active(&self) -> bool {
        self.autocomplete_active
    }

    /// Whether a candidate list should be on screen.
    pub fn autocomplete_visible(&self) -> bool {
        (self.autocomplete_active || self.token_edit.is_some()) && !self.candidates.is_empty()
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn token_edit(&self) -> Option<&TokenEdit> {
        self.token_edit.as_ref()
    }

    pub fn options(&self) -> EditorOptions {
        self.options
    }

    pub fn set_options(&mut self, options: EditorOptions) {
        self.options = options;
        if !options.autocomplete {
            self.rescind_autocomplete();
        }
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id() == id)
    }

    fn position_of(&self, id: TokenId) -> Option<usize> {
        self.tokens.iter().position(|t| t.id() == id)
    }

    /// Read-only view for rendering.
    pub fn view(&self) -> EditorView<'_> {
        EditorView {
            tokens: &self.tokens,
            cursor: self.cursor,
            buffer: &self.buffer,
            candidates: &self.candidates,
            autocomplete_visible: self.autocomplete_visible(),
            evaluation: &self.evaluation,
            token_edit: self.token_edit.as_ref(),
        }
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        self.view().to_snapshot()
    }

    // ========================================================================
    // Stream operations
    // ========================================================================

    /// Insert `token` before the token at `index` (append when `index == len`).
    ///
    /// The cursor lands just after the new token, the text buffer is cleared
    /// and autocomplete is rescinded. A token whose id is already in the
    /// stream is re-issued under a fresh id.
    pub fn insert_at(&mut self, index: usize, token: Token) {
        let index = index.min(self.tokens.len());
        let token = if self.position_of(token.id()).is_some() {
            debug!("token {} already in stream, re-issuing", token.id());
            token.with_id(TokenId::fresh())
        } else {
            token
        };

        trace!("insert {:?} at {}", token, index);
        self.tokens.insert(index, token);
        self.cursor = index + 1;
        self.buffer.clear();
        self.rescind_autocomplete();
        self.recalc();
    }

    /// Remove the token with `id`. Absent ids are a no-op (returns false).
    ///
    /// The cursor is only clamped to the new length; callers that want it to
    /// follow the removal use `delete_token`.
    pub fn remove_by_id(&mut self, id: TokenId) -> bool {
        let Some(index) = self.position_of(id) else {
            debug!("remove_by_id: {} not in stream", id);
            return false;
        };
        self.remove_index(index);
        self.cursor = self.cursor.min(self.tokens.len());
        self.recalc();
        true
    }

    /// Explicit delete of one token (the tag's remove button). Unlike
    /// `remove_by_id`, a cursor after the removed token moves left with it.
    pub fn delete_token(&mut self, id: TokenId) -> bool {
        let Some(index) = self.position_of(id) else {
            debug!("delete_token: {} not in stream", id);
            return false;
        };
        let cursor = self.cursor;
        self.remove_index(index);
        self.cursor = if index < cursor { cursor - 1 } else { cursor.min(self.tokens.len()) };
        self.recalc();
        true
    }

    /// Replace the token with `id` in place. The replacement adopts `id`.
    /// Absent ids are a no-op (returns false).
    pub fn update_by_id(&mut self, id: TokenId, new_token: Token) -> bool {
        let Some(index) = self.position_of(id) else {
            debug!("update_by_id: {} not in stream", id);
            return false;
        };
        self.tokens[index] = new_token.with_id(id);
        self.recalc();
        true
    }

    /// Move the cursor by `delta`, clamped to the stream bounds.
    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor = self.cursor.saturating_add_signed(delta).min(self.tokens.len());
    }

    /// Put the cursor at `index` (clamped). The text buffer travels with it.
    pub fn click_at(&mut self, index: usize) {
        self.cursor = index.min(self.tokens.len());
    }

    /// Empty the session. Sequence numbers keep counting so that responses to
    /// lookups issued before the reset are still recognised as stale.
    pub fn reset(&mut self) {
        let lookup_seq = self.lookup_seq;
        let options = self.options;
        *self = Self { lookup_seq, options, ..Self::default() };
    }

    fn remove_index(&mut self, index: usize) {
        let removed = self.tokens.remove(index);
        trace!("removed {:?}", removed);
        if self.token_edit.as_ref().is_some_and(|e| e.id == removed.id()) {
            self.close_token_edit();
        }
    }

    fn recalc(&mut self) {
        self.evaluation = evaluate(&self.tokens);
        trace!("evaluation: {:?}", self.evaluation);
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::ClickAt(index) => self.click_at(index),
            InputEvent::SelectCandidate(candidate_id) => {
                if self.token_edit.is_some() {
                    self.select_token_edit_candidate(&candidate_id);
                } else {
                    self.select_candidate(&candidate_id);
                }
            }
        }
    }

    /// Apply one keystroke to the text buffer / token stream.
    pub fn handle_key(&mut self, key: Key) {
        match key {
            Key::Backspace => self.backspace(),
            Key::Char(c) => match Operator::from_char(c) {
                Some(op) => self.commit_operator(op),
                None if c.is_control() => {}
                None => {
                    self.buffer.push(c);
                    self.refresh_autocomplete();
                }
            },
            Key::Enter => self.commit_buffer(),
            Key::Left => self.move_cursor(-1),
            Key::Right => self.move_cursor(1),
            Key::Escape => self.rescind_autocomplete(),
        }
    }

    /// Replace the whole text buffer (typing through a native input, paste).
    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.refresh_autocomplete();
    }

    fn backspace(&mut self) {
        if !self.buffer.is_empty() {
            self.buffer.pop();
            self.refresh_autocomplete();
            return;
        }
        if self.cursor == 0 {
            return;
        }

        // Removal and cursor step happen together; the cursor never points
        // past the end in between.
        let index = self.cursor - 1;
        self.remove_index(index);
        self.cursor = index;
        self.recalc();
    }

    /// Commit pending numeric text (if any), then the operator itself.
    fn commit_operator(&mut self, op: Operator) {
        if let Some(value) = parse_numeric_text(&self.buffer) {
            let text = self.buffer.trim().to_string();
            self.insert_at(self.cursor, Token::number(text, value));
        }
        self.insert_at(self.cursor, Token::operator(op));
    }

    /// Enter: numeric text becomes a number, otherwise the first candidate
    /// (when autocomplete is up) becomes a variable.
    fn commit_buffer(&mut self) {
        if self.buffer.trim().is_empty() {
            return;
        }
        if let Some(value) = parse_numeric_text(&self.buffer) {
            let text = self.buffer.trim().to_string();
            self.insert_at(self.cursor, Token::number(text, value));
        } else if self.autocomplete_active {
            if let Some(first) = self.candidates.first().cloned() {
                self.insert_at(self.cursor, Token::variable(&first));
            }
        }
    }

    /// Commit a candidate from the current list as a variable at the cursor.
    pub fn select_candidate(&mut self, candidate_id: &str) -> bool {
        let Some(candidate) = self.candidates.iter().find(|c| c.id == candidate_id).cloned() else {
            debug!("select_candidate: {} not in candidate list", candidate_id);
            return false;
        };
        self.insert_at(self.cursor, Token::variable(&candidate));
        true
    }

    // ========================================================================
    // Autocomplete
    // ========================================================================

    fn refresh_autocomplete(&mut self) {
        let active = self.options.autocomplete
            && !self.buffer.is_empty()
            && Operator::from_glyph(&self.buffer).is_none();

        if !active {
            self.rescind_autocomplete();
            return;
        }

        // Typing in the main buffer moves focus away from any token edit
        if self.token_edit.is_some() {
            self.close_token_edit();
        }
        self.autocomplete_active = true;
        self.issue_lookup(LookupTarget::Buffer, self.buffer.clone());
    }

    fn rescind_autocomplete(&mut self) {
        self.autocomplete_active = false;
        if self.token_edit.is_none() {
            self.candidates.clear();
        }
        if self.pending_lookup.as_ref().is_some_and(|r| r.target == LookupTarget::Buffer) {
            self.pending_lookup = None;
        }
    }

    /// Candidates shown so far belong to the previous query; they are cleared
    /// until the new answer arrives.
    fn issue_lookup(&mut self, target: LookupTarget, query: String) {
        self.lookup_seq += 1;
        self.candidates.clear();
        trace!("lookup #{} {:?} for {:?}", self.lookup_seq, query, target);
        self.pending_lookup = Some(LookupRequest { seq: self.lookup_seq, query, target });
    }

    /// Take the lookup the host should run next, if any. Only the newest
    /// request is kept; older untaken ones were superseded.
    pub fn take_lookup_request(&mut self) -> Option<LookupRequest> {
        self.pending_lookup.take()
    }

    pub fn latest_lookup_seq(&self) -> u64 {
        self.lookup_seq
    }

    /// Apply a lookup answer. Returns false (and changes nothing) when the
    /// answer is for a superseded query or an input that is no longer active.
    pub fn apply_lookup_response(&mut self, response: LookupResponse) -> bool {
        if response.seq != self.lookup_seq {
            debug!(
                "discarding stale lookup #{} ({:?}), latest is #{}",
                response.seq, response.query, self.lookup_seq
            );
            return false;
        }

        let current = match response.target {
            LookupTarget::Buffer => self.autocomplete_active && response.query == self.buffer,
            LookupTarget::TokenEdit(id) => self
                .token_edit
                .as_ref()
                .is_some_and(|e| e.id == id && e.text == response.query),
        };
        if !current {
            debug!("discarding lookup #{} for inactive input", response.seq);
            return false;
        }

        self.candidates = response.candidates;
        true
    }

    // ========================================================================
    // In-place token edit
    // ========================================================================

    /// Open the edit box for a token, seeded with its display name.
    pub fn begin_token_edit(&mut self, id: TokenId) -> bool {
        let Some(token) = self.token(id) else {
            debug!("begin_token_edit: {} not in stream", id);
            return false;
        };
        let text = token.display_name().to_string();

        self.rescind_autocomplete();
        self.close_token_edit();
        self.token_edit = Some(TokenEdit { id, text });
        self.refresh_token_edit_lookup();
        true
    }

    pub fn set_token_edit_text(&mut self, text: impl Into<String>) {
        let Some(edit) = self.token_edit.as_mut() else {
            return;
        };
        edit.text = text.into();
        self.refresh_token_edit_lookup();
    }

    /// Only variables search the lookup service while being edited.
    fn refresh_token_edit_lookup(&mut self) {
        let Some(edit) = &self.token_edit else {
            return;
        };
        let is_variable = matches!(self.token(edit.id), Some(Token::Variable { .. }));
        if self.options.autocomplete && is_variable && !edit.text.is_empty() {
            let (id, text) = (edit.id, edit.text.clone());
            self.issue_lookup(LookupTarget::TokenEdit(id), text);
        } else {
            self.candidates.clear();
            self.pending_lookup = None;
        }
    }

    /// Finish the open edit.
    ///
    /// Variables rebind to the first candidate (if any), numbers take the new
    /// text when it is numeric, operators take it when it is an operator
    /// glyph. Anything else leaves the token unchanged. Returns whether the
    /// token was replaced.
    pub fn commit_token_edit(&mut self) -> bool {
        let Some(edit) = self.token_edit.clone() else {
            return false;
        };
        let first = self.candidates.first().cloned();
        self.close_token_edit();

        let Some(token) = self.token(edit.id).cloned() else {
            return false;
        };
        let replacement = match token {
            Token::Variable { .. } => first.map(|c| token.rebound(&c)),
            Token::Number { .. } => parse_numeric_text(&edit.text)
                .map(|value| Token::number(edit.text.trim(), value)),
            Token::Operator { .. } => Operator::from_glyph(edit.text.trim()).map(Token::operator),
        };

        match replacement {
            Some(new_token) => self.update_by_id(edit.id, new_token),
            None => {
                debug!("token edit of {} left it unchanged", edit.id);
                false
            }
        }
    }

    /// Rebind the variable being edited to a specific candidate.
    pub fn select_token_edit_candidate(&mut self, candidate_id: &str) -> bool {
        let Some(edit) = self.token_edit.clone() else {
            return false;
        };
        let Some(candidate) = self.candidates.iter().find(|c| c.id == candidate_id).cloned() else {
            debug!("select_token_edit_candidate: {} not in candidate list", candidate_id);
            return false;
        };
        self.close_token_edit();

        match self.token(edit.id).cloned() {
            Some(token @ Token::Variable { .. }) => {
                let rebound = token.rebound(&candidate);
                self.update_by_id(edit.id, rebound)
            }
            _ => false,
        }
    }

    pub fn cancel_token_edit(&mut self) {
        self.close_token_edit();
    }

    fn close_token_edit(&mut self) {
        if self.token_edit.take().is_some() {
            self.candidates.clear();
            if self
                .pending_lookup
                .as_ref()
                .is_some_and(|r| matches!(r.target, LookupTarget::TokenEdit(_)))
            {
                self.pending_lookup = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::InvalidExpression;
    use crate::harness::{answer_lookup, catalog, type_text};
    use crate::token::TokenKind;

    fn kinds(editor: &Editor) -> Vec<TokenKind> {
        editor.tokens().iter().map(Token::kind).collect()
    }

    fn names(editor: &Editor) -> Vec<String> {
        editor.tokens().iter().map(|t| t.display_name().to_string()).collect()
    }

    // ------------------------------------------------------------------------
    // insert / remove / update
    // ------------------------------------------------------------------------

    #[test]
    fn test_insert_at_places_token_and_advances_cursor() {
        let mut editor = Editor::new();
        editor.insert_at(0, Token::from_value(1.0));
        editor.insert_at(1, Token::from_value(3.0));

        let t = Token::operator(Operator::Add);
        let id = t.id();
        editor.insert_at(1, t);

        assert_eq!(editor.tokens()[1].id(), id);
        assert_eq!(editor.cursor(), 2);
        assert_eq!(names(&editor), vec!["1", "+", "3"]);
        assert_eq!(editor.evaluation(), &Evaluation::Value(4.0));
    }

    #[test]
    fn test_insert_at_clamps_index_and_clears_buffer() {
        let mut editor = Editor::new();
        editor.set_buffer("rev");
        editor.insert_at(42, Token::from_value(7.0));
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.cursor(), 1);
        assert_eq!(editor.buffer(), "");
        assert!(!editor.is_autocomplete_active());
    }

    #[test]
    fn test_insert_duplicate_id_is_reissued() {
        let mut editor = Editor::new();
        let t = Token::from_value(1.0);
        editor.insert_at(0, t.clone());
        editor.insert_at(1, t.clone());
        assert_eq!(editor.len(), 2);
        assert_ne!(editor.tokens()[0].id(), editor.tokens()[1].id());
    }

    #[test]
    fn test_remove_by_id_twice_is_noop() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+2");
        editor.handle_key(Key::Enter);
        let id = editor.tokens()[1].id();

        assert!(editor.remove_by_id(id));
        let after_first: Vec<_> = editor.tokens().to_vec();
        assert!(!editor.remove_by_id(id));
        assert_eq!(editor.tokens(), after_first.as_slice());
    }

    #[test]
    fn test_remove_by_id_clamps_cursor() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+");
        assert_eq!(editor.cursor(), 2);
        let last = editor.tokens()[1].id();
        editor.remove_by_id(last);
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_remove_by_id_leaves_cursor_when_in_bounds() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+2*");
        editor.click_at(3);
        let first = editor.tokens()[0].id();
        editor.remove_by_id(first);
        assert_eq!(editor.cursor(), 3);
    }

    #[test]
    fn test_delete_token_moves_cursor_with_removal() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+2*");
        editor.click_at(3);
        let first = editor.tokens()[0].id();
        assert!(editor.delete_token(first));
        assert_eq!(editor.cursor(), 2);
        assert_eq!(names(&editor), vec!["+", "2", "*"]);

        // Removing after the cursor leaves it alone
        let last = editor.tokens()[2].id();
        editor.delete_token(last);
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn test_update_by_id_replaces_in_place_and_keeps_id() {
        let mut editor = Editor::new();
        type_text(&mut editor, "2*3");
        editor.handle_key(Key::Enter);
        let id = editor.tokens()[2].id();

        assert!(editor.update_by_id(id, Token::number("5", 5.0)));
        assert_eq!(editor.tokens()[2].id(), id);
        assert_eq!(names(&editor), vec!["2", "*", "5"]);
        assert_eq!(editor.evaluation(), &Evaluation::Value(10.0));
    }

    #[test]
    fn test_update_by_id_absent_is_noop() {
        let mut editor = Editor::new();
        type_text(&mut editor, "2*");
        let stale = TokenId::fresh();
        assert!(!editor.update_by_id(stale, Token::from_value(9.0)));
        assert_eq!(names(&editor), vec!["2", "*"]);
    }

    // ------------------------------------------------------------------------
    // Keystroke rules
    // ------------------------------------------------------------------------

    #[test]
    fn test_number_then_operator_commits_two_tokens() {
        let mut editor = Editor::new();
        type_text(&mut editor, "12+");
        assert_eq!(kinds(&editor), vec![TokenKind::Number, TokenKind::Operator]);
        assert_eq!(editor.tokens()[0].numeric_value(), 12.0);
        assert_eq!(editor.tokens()[1].as_operator(), Some(Operator::Add));
        assert_eq!(editor.cursor(), 2);
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_operator_with_empty_buffer_commits_only_operator() {
        let mut editor = Editor::new();
        editor.handle_key(Key::Char('('));
        assert_eq!(kinds(&editor), vec![TokenKind::Operator]);
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_operator_discards_non_numeric_buffer() {
        let mut editor = Editor::new();
        type_text(&mut editor, "ab*");
        assert_eq!(names(&editor), vec!["*"]);
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_enter_commits_number() {
        let mut editor = Editor::new();
        type_text(&mut editor, "2*3+4");
        editor.handle_key(Key::Enter);
        assert_eq!(names(&editor), vec!["2", "*", "3", "+", "4"]);
        assert_eq!(editor.evaluation(), &Evaluation::Value(10.0));
    }

    #[test]
    fn test_enter_with_blank_buffer_is_noop() {
        let mut editor = Editor::new();
        editor.handle_key(Key::Enter);
        editor.set_buffer("   ");
        editor.handle_key(Key::Enter);
        assert!(editor.is_empty());
    }

    #[test]
    fn test_enter_commits_first_candidate() {
        let mut editor = Editor::new();
        type_text(&mut editor, "fin");
        assert!(answer_lookup(&mut editor, &catalog()));
        assert_eq!(editor.candidates().len(), 2);

        editor.handle_key(Key::Enter);
        assert_eq!(kinds(&editor), vec![TokenKind::Variable]);
        assert_eq!(editor.tokens()[0].display_name(), "Revenue");
        assert_eq!(editor.cursor(), 1);
        assert!(editor.candidates().is_empty());
        assert!(!editor.is_autocomplete_active());
    }

    #[test]
    fn test_enter_without_candidates_keeps_buffer() {
        let mut editor = Editor::new();
        type_text(&mut editor, "zzz");
        answer_lookup(&mut editor, &catalog());
        editor.handle_key(Key::Enter);
        assert!(editor.is_empty());
        assert_eq!(editor.buffer(), "zzz");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut editor = Editor::new();
        editor.handle_key(Key::Backspace);
        assert!(editor.is_empty());
        assert_eq!(editor.cursor(), 0);
        assert_eq!(editor.evaluation(), &Evaluation::NoResult);

        type_text(&mut editor, "1+");
        editor.click_at(0);
        editor.handle_key(Key::Backspace);
        assert_eq!(editor.len(), 2);
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn test_backspace_removes_token_before_cursor() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+2*");
        editor.click_at(2);
        editor.handle_key(Key::Backspace);
        assert_eq!(names(&editor), vec!["1", "2", "*"]);
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_backspace_edits_buffer_first() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+");
        type_text(&mut editor, "ab");
        editor.handle_key(Key::Backspace);
        assert_eq!(editor.buffer(), "a");
        assert_eq!(editor.len(), 2);
        editor.handle_key(Key::Backspace);
        assert_eq!(editor.buffer(), "");
        assert!(!editor.is_autocomplete_active());
        editor.handle_key(Key::Backspace);
        assert_eq!(editor.len(), 1);
    }

    #[test]
    fn test_arrows_clamp_at_boundaries() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+");
        editor.handle_key(Key::Right);
        assert_eq!(editor.cursor(), 2);
        editor.handle_key(Key::Left);
        editor.handle_key(Key::Left);
        editor.handle_key(Key::Left);
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn test_insert_mid_stream_via_cursor() {
        let mut editor = Editor::new();
        type_text(&mut editor, "2*4");
        editor.handle_key(Key::Enter);
        // 2 * 4  ->  2 + 3 * 4
        editor.click_at(1);
        type_text(&mut editor, "+3");
        editor.handle_key(Key::Enter);
        assert_eq!(names(&editor), vec!["2", "+", "3", "*", "4"]);
        assert_eq!(editor.evaluation(), &Evaluation::Value(14.0));
        assert_eq!(editor.cursor(), 3);
    }

    #[test]
    fn test_invalid_then_fixed() {
        let mut editor = Editor::new();
        type_text(&mut editor, "(2+3");
        editor.handle_key(Key::Enter);
        assert_eq!(
            editor.evaluation(),
            &Evaluation::Invalid(InvalidExpression::MissingClosingParen)
        );
        editor.handle_key(Key::Char(')'));
        assert_eq!(editor.evaluation(), &Evaluation::Value(5.0));
    }

    #[test]
    fn test_held_paren_key_stays_invalid() {
        let mut editor = Editor::new();
        type_text(&mut editor, &"(".repeat(600));
        assert_eq!(editor.len(), 600);
        assert_eq!(editor.evaluation(), &Evaluation::Invalid(InvalidExpression::TooDeep));

        // Still editable afterwards
        editor.reset();
        type_text(&mut editor, "6*7");
        editor.handle_key(Key::Enter);
        assert_eq!(editor.evaluation(), &Evaluation::Value(42.0));
    }

    #[test]
    fn test_click_keeps_buffer() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+");
        type_text(&mut editor, "4");
        editor.click_at(0);
        assert_eq!(editor.buffer(), "4");
        assert_eq!(editor.cursor(), 0);
        editor.click_at(99);
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn test_reset() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1+2");
        let seq = editor.latest_lookup_seq();
        editor.reset();
        assert!(editor.is_empty());
        assert_eq!(editor.cursor(), 0);
        assert_eq!(editor.buffer(), "");
        assert_eq!(editor.evaluation(), &Evaluation::NoResult);
        assert_eq!(editor.latest_lookup_seq(), seq);
    }

    // ------------------------------------------------------------------------
    // Autocomplete
    // ------------------------------------------------------------------------

    #[test]
    fn test_typing_issues_lookup_per_keystroke() {
        let mut editor = Editor::new();
        editor.handle_key(Key::Char('r'));
        let first = editor.take_lookup_request().unwrap();
        assert_eq!(first.query, "r");
        assert_eq!(first.target, LookupTarget::Buffer);

        editor.handle_key(Key::Char('e'));
        let second = editor.take_lookup_request().unwrap();
        assert_eq!(second.query, "re");
        assert!(second.seq > first.seq);
        assert!(editor.take_lookup_request().is_none());
    }

    #[test]
    fn test_untaken_request_is_superseded() {
        let mut editor = Editor::new();
        type_text(&mut editor, "abc");
        let request = editor.take_lookup_request().unwrap();
        assert_eq!(request.query, "abc");
    }

    #[test]
    fn test_stale_lookup_response_is_discarded() {
        let mut editor = Editor::new();
        editor.handle_key(Key::Char('a'));
        let for_a = editor.take_lookup_request().unwrap();
        editor.handle_key(Key::Char('b'));
        let for_ab = editor.take_lookup_request().unwrap();

        let stale = for_a.respond(vec![Candidate::new("1", "alpha", "", 1.0)]);
        assert!(!editor.apply_lookup_response(stale));
        assert!(editor.candidates().is_empty());

        let fresh = for_ab.respond(vec![Candidate::new("2", "abacus", "", 2.0)]);
        assert!(editor.apply_lookup_response(fresh));
        assert_eq!(editor.candidates()[0].name, "abacus");
    }

    #[test]
    fn test_response_after_deactivation_is_discarded() {
        let mut editor = Editor::new();
        editor.handle_key(Key::Char('r'));
        let request = editor.take_lookup_request().unwrap();
        editor.handle_key(Key::Backspace);
        assert!(!editor.is_autocomplete_active());
        let response = request.respond(vec![Candidate::new("1", "Revenue", "", 1.0)]);
        assert!(!editor.apply_lookup_response(response));
        assert!(editor.candidates().is_empty());
    }

    #[test]
    fn test_escape_hides_candidates_and_drops_answer() {
        let mut editor = Editor::new();
        type_text(&mut editor, "rev");
        let request = editor.take_lookup_request().unwrap();
        editor.handle_key(Key::Escape);
        assert!(!editor.apply_lookup_response(request.run(&catalog())));
        assert_eq!(editor.buffer(), "rev");
        assert!(!editor.autocomplete_visible());
    }

    #[test]
    fn test_operator_glyph_buffer_does_not_activate() {
        let mut editor = Editor::new();
        editor.set_buffer("+");
        assert!(!editor.is_autocomplete_active());
        assert!(editor.take_lookup_request().is_none());

        editor.set_buffer("+x");
        assert!(editor.is_autocomplete_active());
    }

    #[test]
    fn test_autocomplete_disabled() {
        let mut editor = Editor::with_options(EditorOptions { autocomplete: false });
        type_text(&mut editor, "rev");
        assert!(!editor.is_autocomplete_active());
        assert!(editor.take_lookup_request().is_none());
        editor.handle_key(Key::Enter);
        assert!(editor.is_empty());
    }

    #[test]
    fn test_numeric_typing_also_queries() {
        // Activation only excludes lone operator glyphs, digits still query
        let mut editor = Editor::new();
        editor.handle_key(Key::Char('1'));
        assert!(editor.is_autocomplete_active());
        editor.handle_key(Key::Enter);
        assert_eq!(kinds(&editor), vec![TokenKind::Number]);
    }

    #[test]
    fn test_select_candidate_by_id() {
        let mut editor = Editor::new();
        type_text(&mut editor, "1*");
        type_text(&mut editor, "fin");
        answer_lookup(&mut editor, &catalog());
        assert!(editor.autocomplete_visible());

        assert!(editor.select_candidate("2"));
        assert_eq!(names(&editor), vec!["1", "*", "Cost of goods"]);
        assert_eq!(editor.evaluation(), &Evaluation::Value(400.0));
        assert!(!editor.select_candidate("2"));
    }

    #[test]
    fn test_same_candidate_twice_keeps_ids_unique() {
        let mut editor = Editor::new();
        for c in ["h", "e", "a", "d"] {
            editor.dispatch(InputEvent::Key(Key::Char(c.chars().next().unwrap())));
        }
        answer_lookup(&mut editor, &catalog());
        editor.dispatch(InputEvent::SelectCandidate("3".into()));
        editor.dispatch(Key::Char('+').into());
        type_text(&mut editor, "head");
        answer_lookup(&mut editor, &catalog());
        editor.dispatch(InputEvent::SelectCandidate("3".into()));

        assert_eq!(names(&editor), vec!["Headcount", "+", "Headcount"]);
        assert_ne!(editor.tokens()[0].id(), editor.tokens()[2].id());
        assert_eq!(editor.evaluation(), &Evaluation::Value(24.0));
    }

    // ------------------------------------------------------------------------
    // In-place token edit
    // ------------------------------------------------------------------------

    #[test]
    fn test_token_edit_rebinds_variable_to_first_candidate() {
        let mut editor = Editor::new();
        type_text(&mut editor, "rev");
        answer_lookup(&mut editor, &catalog());
        editor.handle_key(Key::Enter);
        let id = editor.tokens()[0].id();

        assert!(editor.begin_token_edit(id));
        // Seeded with the current name, which already issues a lookup
        assert_eq!(editor.token_edit().unwrap().text, "Revenue");
        editor.set_token_edit_text("head");
        let request = editor.take_lookup_request().unwrap();
        assert_eq!(request.target, LookupTarget::TokenEdit(id));
        assert!(editor.apply_lookup_response(request.run(&catalog())));
        assert!(editor.autocomplete_visible());

        assert!(editor.commit_token_edit());
        let token = &editor.tokens()[0];
        assert_eq!(token.id(), id);
        assert_eq!(token.display_name(), "Headcount");
        assert_eq!(token.category(), "Finance");
        assert_eq!(editor.evaluation(), &Evaluation::Value(12.0));
        assert!(editor.token_edit().is_none());
        assert!(editor.candidates().is_empty());
    }

    #[test]
    fn test_token_edit_select_specific_candidate() {
        let mut editor = Editor::new();
        type_text(&mut editor, "rev");
        answer_lookup(&mut editor, &catalog());
        editor.handle_key(Key::Enter);
        let id = editor.tokens()[0].id();

        editor.begin_token_edit(id);
        editor.set_token_edit_text("fin");
        answer_lookup(&mut editor, &catalog());
        editor.dispatch(InputEvent::SelectCandidate("2".into()));
        assert_eq!(editor.tokens()[0].display_name(), "Cost of goods");
        assert_eq!(editor.len(), 1);
    }

    #[test]
    fn test_token_edit_number_and_operator() {
        let mut editor = Editor::new();
        type_text(&mut editor, "6*2");
        editor.handle_key(Key::Enter);
        let op_id = editor.tokens()[1].id();
        let num_id = editor.tokens()[2].id();

        editor.begin_token_edit(num_id);
        assert!(editor.take_lookup_request().is_none());
        editor.set_token_edit_text("3");
        assert!(editor.commit_token_edit());
        assert_eq!(editor.evaluation(), &Evaluation::Value(18.0));

        editor.begin_token_edit(op_id);
        editor.set_token_edit_text("/");
        assert!(editor.commit_token_edit());
        assert_eq!(editor.evaluation(), &Evaluation::Value(2.0));

        editor.begin_token_edit(num_id);
        editor.set_token_edit_text("three");
        assert!(!editor.commit_token_edit());
        assert_eq!(editor.tokens()[2].display_name(), "3");
    }

    #[test]
    fn test_token_edit_cancel_and_stale_answer() {
        let mut editor = Editor::new();
        type_text(&mut editor, "rev");
        answer_lookup(&mut editor, &catalog());
        editor.handle_key(Key::Enter);
        let id = editor.tokens()[0].id();

        editor.begin_token_edit(id);
        editor.set_token_edit_text("head");
        let request = editor.take_lookup_request().unwrap();
        editor.cancel_token_edit();
        assert!(!editor.apply_lookup_response(request.run(&catalog())));
        assert_eq!(editor.tokens()[0].display_name(), "Revenue");
    }

    #[test]
    fn test_removing_edited_token_closes_edit() {
        let mut editor = Editor::new();
        type_text(&mut editor, "5+");
        let id = editor.tokens()[0].id();
        editor.begin_token_edit(id);
        editor.remove_by_id(id);
        assert!(editor.token_edit().is_none());
        assert!(!editor.commit_token_edit());
    }

    #[test]
    fn test_typing_in_buffer_closes_token_edit() {
        let mut editor = Editor::new();
        type_text(&mut editor, "5+");
        let id = editor.tokens()[0].id();
        editor.begin_token_edit(id);
        type_text(&mut editor, "x");
        assert!(editor.token_edit().is_none());
        assert!(editor.is_autocomplete_active());
    }
}
