//! Suggestion lookup client.
//!
//! Fetches variable candidates from the suggestion service and feeds them to
//! the formula editor without blocking it:
//! - `LookupClient`: blocking HTTP source with a per-query cache
//! - `LookupWorker`: runs lookups on a background thread
//! - `EditorSession`: an `Editor` wired to a worker
//!
//! Lookup failures never reach the editor; they degrade to "no suggestions".

mod client;
mod session;
mod worker;

pub use client::{LookupClient, LookupConfig, LookupError};
pub use session::EditorSession;
pub use worker::LookupWorker;
