//! Client-side search cache configuration.

use serde::{Deserialize, Serialize};

/// Search result page cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Freshness window for a cached page, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached pages before least-recently-used eviction.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Directory holding the persisted cache documents.
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            capacity: default_capacity(),
            directory: default_directory(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_capacity() -> usize {
    200
}

fn default_directory() -> String {
    ".roomie/cache".to_string()
}
