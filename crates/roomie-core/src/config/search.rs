//! Profile search client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the client-side search controller and its HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the profile API (the `/api/profile/search` path is appended).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Number of profiles requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Quiet interval after the last filter edit before a fetch is issued.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl SearchConfig {
    /// Debounce quiet interval.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_api_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_page_size() -> usize {
    9
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    15
}
