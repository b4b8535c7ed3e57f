//! Test helpers for driving an `Editor` the way a host surface would.
//!
//! The host loop is: deliver keystrokes, take the editor's pending lookup,
//! run it against a source, and hand the answer back.

use crate::editor::Editor;
use crate::input::Key;
use crate::suggest::{Candidate, StaticCatalog, SuggestionSource};

/// Deliver each character of `text` as a keystroke.
pub fn type_text(editor: &mut Editor, text: &str) {
    for c in text.chars() {
        editor.handle_key(Key::Char(c));
    }
}

/// Run the editor's pending lookup (if any) synchronously and apply the answer.
/// Returns whether the answer was applied.
pub fn answer_lookup<S: SuggestionSource>(editor: &mut Editor, source: &S) -> bool {
    match editor.take_lookup_request() {
        Some(request) => editor.apply_lookup_response(request.run(source)),
        None => false,
    }
}

/// Small catalog shared by the editor tests.
pub fn catalog() -> StaticCatalog {
    StaticCatalog::new(vec![
        Candidate::new("1", "Revenue", "Finance", 1200.0),
        Candidate::new("2", "Cost of goods", "Finance", 400.0),
        Candidate::new("3", "Headcount", "People", 12.0),
        Candidate::new("4", "Tax rate", "", 0.21),
    ])
}
