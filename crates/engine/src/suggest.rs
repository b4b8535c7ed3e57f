//! Suggestion lookup boundary.
//!
//! The editor never calls the lookup service itself. When autocomplete needs
//! candidates it queues a `LookupRequest` tagged with a sequence number; the
//! host runs it against a `SuggestionSource` (usually off-thread) and hands the
//! `LookupResponse` back. The editor applies a response only if its sequence
//! number is still the latest one issued, so answers to superseded queries are
//! dropped rather than shown.

use serde::{Deserialize, Deserializer, Serialize};

use crate::token_id::TokenId;

/// A suggested variable returned by the lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    /// Missing or null in the service payload becomes empty.
    #[serde(default, deserialize_with = "deserialize_category")]
    pub category: String,
    #[serde(default)]
    pub value: f64,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            value,
        }
    }

    /// Case-insensitive substring match on name or category.
    /// `query_lower` must already be lowercase.
    fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.category.to_lowercase().contains(query_lower)
    }
}

// Services hand out ids as either strings or numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Filter a catalog down to the candidates matching `query`, preserving the
/// catalog's order. A blank query matches nothing.
pub fn filter_candidates(catalog: &[Candidate], query: &str) -> Vec<Candidate> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let query_lower = query.to_lowercase();
    catalog
        .iter()
        .filter(|c| c.matches(&query_lower))
        .cloned()
        .collect()
}

/// Anything that can answer a suggestion query.
///
/// Implementations must not fail: transport or server errors resolve to an
/// empty list so a broken service only means "no suggestions".
pub trait SuggestionSource {
    fn lookup(&self, query: &str) -> Vec<Candidate>;
}

/// Fixed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<Candidate>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<Candidate>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Candidate] {
        &self.entries
    }
}

impl SuggestionSource for StaticCatalog {
    fn lookup(&self, query: &str) -> Vec<Candidate> {
        filter_candidates(&self.entries, query)
    }
}

/// Which text input a lookup belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget {
    /// The main raw-text buffer at the cursor.
    Buffer,
    /// The in-place edit box of an existing token.
    TokenEdit(TokenId),
}

/// A lookup the editor wants run.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRequest {
    /// Strictly increasing per editor; the latest one wins.
    pub seq: u64,
    pub query: String,
    pub target: LookupTarget,
}

impl LookupRequest {
    /// Answer this request with the given candidates.
    pub fn respond(self, candidates: Vec<Candidate>) -> LookupResponse {
        LookupResponse {
            seq: self.seq,
            query: self.query,
            target: self.target,
            candidates,
        }
    }

    /// Run this request against a source, synchronously.
    pub fn run<S: SuggestionSource + ?Sized>(self, source: &S) -> LookupResponse {
        let candidates = source.lookup(&self.query);
        self.respond(candidates)
    }
}

/// The answer to a `LookupRequest`, echoing its sequence number and query.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResponse {
    pub seq: u64,
    pub query: String,
    pub target: LookupTarget,
    pub candidates: Vec<Candidate>,
}
