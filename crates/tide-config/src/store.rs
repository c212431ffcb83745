//! Briefing store (libSQL) configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".tidings/tidings.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Local database file. Ignored when a remote URL and token are configured.
    #[serde(default = "default_path")]
    pub path: String,

    /// Remote database URL (e.g., `libsql://briefings-acme.turso.io`).
    #[serde(default)]
    pub url: String,

    /// Remote database auth token.
    #[serde(default)]
    pub auth_token: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            url: String::new(),
            auth_token: String::new(),
        }
    }
}

impl StoreConfig {
    /// Whether the store should connect to a remote libSQL server.
    pub fn is_remote(&self) -> bool {
        !self.url.is_empty() && !self.auth_token.is_empty()
    }
}
