//! An editor wired to a background lookup worker.
//!
//! The host calls `dispatch` for input and `pump` from its event loop; the
//! session forwards each lookup the editor queues to the worker and applies
//! answers as they arrive. Stale answers are dropped by the editor itself.

use std::time::{Duration, Instant};

use formulatag_config::Settings;
use formulatag_engine::{Editor, EditorOptions, InputEvent};

use crate::client::{LookupClient, LookupError};
use crate::worker::LookupWorker;

pub struct EditorSession {
    editor: Editor,
    worker: LookupWorker,
    /// Sequence number of the newest lookup handed to the worker and not yet answered
    in_flight: Option<u64>,
}

impl EditorSession {
    pub fn new(editor: Editor, worker: LookupWorker) -> Self {
        Self { editor, worker, in_flight: None }
    }

    /// Editor and HTTP-backed worker configured from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, LookupError> {
        let editor = Editor::with_options(EditorOptions { autocomplete: settings.autocomplete });
        let client = LookupClient::from_settings(settings)?;
        let worker = LookupWorker::spawn(client).map_err(|e| LookupError::Worker(e.to_string()))?;
        log::debug!("editor session started (autocomplete: {})", settings.autocomplete);
        Ok(Self::new(editor, worker))
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn into_editor(self) -> Editor {
        self.editor
    }

    pub fn dispatch(&mut self, event: InputEvent) {
        self.editor.dispatch(event);
        self.flush();
    }

    /// Run an arbitrary editor operation, then forward any lookup it queued.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut Editor) -> R) -> R {
        let result = f(&mut self.editor);
        self.flush();
        result
    }

    /// Hand the editor's pending lookup (if any) to the worker.
    pub fn flush(&mut self) {
        if let Some(request) = self.editor.take_lookup_request() {
            let seq = request.seq;
            if self.worker.submit(request) {
                self.in_flight = Some(seq);
            } else {
                log::warn!("lookup worker is gone; dropping lookup #{}", seq);
            }
        }
    }

    /// Apply every answer that has arrived. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(response) = self.worker.try_recv() {
            self.note_answered(response.seq);
            if self.editor.apply_lookup_response(response) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until the newest outstanding lookup is answered or `timeout`
    /// passes. Returns whether that answer was applied.
    pub fn wait_for_lookup(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while let Some(target) = self.in_flight {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let Some(response) = self.worker.recv_timeout(remaining) else {
                return false;
            };
            let seq = response.seq;
            self.note_answered(seq);
            let applied = self.editor.apply_lookup_response(response);
            if seq >= target {
                return applied;
            }
        }
        false
    }

    fn note_answered(&mut self, seq: u64) {
        if self.in_flight.is_some_and(|pending| seq >= pending) {
            self.in_flight = None;
        }
    }
}
