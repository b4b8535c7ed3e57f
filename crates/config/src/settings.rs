// Application settings
// Loaded from ~/.config/formulatag/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default suggestion service.
pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://652f91320b8d8ddac0b2b62b.mockapi.io";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Suggestion lookup
    #[serde(rename = "lookup.baseUrl")]
    pub lookup_base_url: String,

    #[serde(rename = "lookup.path")]
    pub lookup_path: String,

    #[serde(rename = "lookup.timeoutSecs")]
    pub lookup_timeout_secs: u64,

    /// How long an answer for the same query is reused. 0 disables caching.
    #[serde(rename = "lookup.cacheTtlSecs")]
    pub lookup_cache_ttl_secs: u64,

    // Editor
    #[serde(rename = "editor.autocomplete")]
    pub autocomplete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Lookup
            lookup_base_url: DEFAULT_LOOKUP_BASE_URL.to_string(),
            lookup_path: "/autocomplete".to_string(),
            lookup_timeout_secs: 10,
            lookup_cache_ttl_secs: 60,
            // Editor
            autocomplete: true,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("formulatag");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    /// Writes a commented default file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific file, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn lookup_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.lookup_cache_ttl_secs)
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = format!(
            r#"{{
    // Suggestion lookup service
    "lookup.baseUrl": "{}",
    "lookup.path": "/autocomplete",
    "lookup.timeoutSecs": 10,

    // Reuse answers for the same query for this many seconds (0 = off)
    "lookup.cacheTtlSecs": 60,

    // Query the lookup service while typing names
    "editor.autocomplete": true
}}
"#,
            DEFAULT_LOOKUP_BASE_URL
        );

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
