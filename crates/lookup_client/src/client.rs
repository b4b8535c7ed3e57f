//! Suggestion service HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). The service serves its
//! whole candidate catalog from a single endpoint as a JSON array of
//! `{id, name, category?, value}` records; narrowing by query happens here.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use formulatag_config::Settings;
use formulatag_engine::{filter_candidates, Candidate, SuggestionSource};
use parking_lot::Mutex;

/// Where and how to reach the suggestion service.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupConfig {
    pub base_url: String,
    pub path: String,
    pub timeout: Duration,
    /// Answers for a query are reused for this long. Zero disables the cache.
    pub cache_ttl: Duration,
}

impl LookupConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.lookup_base_url.clone(),
            path: settings.lookup_path.clone(),
            timeout: settings.lookup_timeout(),
            cache_ttl: settings.lookup_cache_ttl(),
        }
    }

    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{}{}", base, self.path)
        } else {
            format!("{}/{}", base, self.path)
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Error type for lookup operations.
#[derive(Debug)]
pub enum LookupError {
    /// HTTP client could not be constructed
    Client(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// Response body was not a candidate list
    Parse(String),
    /// Background worker could not be started
    Worker(String),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::Client(msg) => write!(f, "HTTP client error: {}", msg),
            LookupError::Network(msg) => write!(f, "Network error: {}", msg),
            LookupError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            LookupError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LookupError::Worker(msg) => write!(f, "Lookup worker error: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {}

struct CachedAnswer {
    fetched_at: Instant,
    candidates: Vec<Candidate>,
}

/// Suggestion service client (blocking).
pub struct LookupClient {
    http: reqwest::blocking::Client,
    url: String,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, CachedAnswer>>,
}

impl LookupClient {
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("formulatag/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            http,
            url: config.url(),
            cache_ttl: config.cache_ttl,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, LookupError> {
        Self::new(LookupConfig::from_settings(settings))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the service's full candidate catalog.
    pub fn fetch_catalog(&self) -> Result<Vec<Candidate>, LookupError> {
        let response = self.http.get(&self.url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LookupError::Http(status, body));
        }

        let body = response.text().map_err(|e| LookupError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| LookupError::Parse(e.to_string()))
    }

    /// Candidates matching `query`, or the error that prevented finding them.
    /// Successful answers are cached per query; failures are not.
    pub fn try_lookup(&self, query: &str) -> Result<Vec<Candidate>, LookupError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        if let Some(hit) = self.cached(query) {
            log::debug!("lookup cache hit for {:?}", query);
            return Ok(hit);
        }

        let catalog = self.fetch_catalog()?;
        let candidates = filter_candidates(&catalog, query);

        if !self.cache_ttl.is_zero() {
            let mut cache = self.cache.lock();
            // Each keystroke is a new key; drop what has expired before adding
            cache.retain(|_, entry| entry.fetched_at.elapsed() < self.cache_ttl);
            cache.insert(
                query.to_string(),
                CachedAnswer { fetched_at: Instant::now(), candidates: candidates.clone() },
            );
        }
        Ok(candidates)
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    #[cfg(test)]
    fn cached_queries(&self) -> usize {
        self.cache.lock().len()
    }

    fn cached(&self, query: &str) -> Option<Vec<Candidate>> {
        let mut cache = self.cache.lock();
        let fresh = cache
            .get(query)
            .map(|entry| entry.fetched_at.elapsed() < self.cache_ttl)?;
        if fresh {
            cache.get(query).map(|entry| entry.candidates.clone())
        } else {
            cache.remove(query);
            None
        }
    }
}

impl SuggestionSource for LookupClient {
    /// Failures are logged and answered with no candidates.
    fn lookup(&self, query: &str) -> Vec<Candidate> {
        match self.try_lookup(query) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("suggestion lookup for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }
}
