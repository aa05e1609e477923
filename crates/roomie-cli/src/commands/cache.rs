//! Persisted search cache maintenance.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use roomie_core::config::AppConfig;
use roomie_core::error::AppError;
use roomie_search::{FileStore, PageCache};

use crate::output::{self, OutputFormat};

/// Arguments for cache commands
#[derive(Debug, Args)]
pub struct CacheArgs {
    /// Cache subcommand
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cache subcommands
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show how many pages are cached and how many are still fresh
    Stats,
    /// Delete every cached page
    Clear,
}

#[derive(Debug, Serialize, Tabled)]
struct CacheStatsRow {
    /// Directory
    directory: String,
    /// Entries
    entries: usize,
    /// Fresh
    fresh: usize,
    /// Capacity
    capacity: usize,
    /// TTL (s)
    ttl_seconds: u64,
}

/// Execute cache commands
pub async fn execute(
    args: &CacheArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store = FileStore::new(&config.cache.directory).await?;
    let mut cache = PageCache::from_config(&config.cache);
    cache.load(&store).await;

    match args.command {
        CacheCommand::Stats => {
            let stats = cache.stats();
            let row = CacheStatsRow {
                directory: config.cache.directory.clone(),
                entries: stats.entries,
                fresh: stats.fresh,
                capacity: stats.capacity,
                ttl_seconds: config.cache.ttl_seconds,
            };
            output::print_item(&row, format);
        }
        CacheCommand::Clear => {
            let removed = cache.len();
            cache.clear();
            cache.persist(&store).await?;
            output::print_success(&format!("Cleared {removed} cached page(s)"));
        }
    }
    Ok(())
}
