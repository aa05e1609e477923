//! CLI command definitions and dispatch.

pub mod cache;
pub mod chat;
pub mod config;
pub mod search;

use clap::{Parser, Subcommand};

use roomie_core::config::AppConfig;
use roomie_core::error::AppError;

use crate::output::OutputFormat;

/// Roomie: find roommates, keep the search cache warm, chat in real time
#[derive(Debug, Parser)]
#[command(name = "roomie", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file; defaults to `config/` plus `ROOMIE_ENV`
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search roommate profiles
    Search(search::SearchArgs),
    /// Inspect or clear the persisted search cache
    Cache(cache::CacheArgs),
    /// Talk to the real-time server
    Chat(chat::ChatArgs),
    /// Show the effective configuration
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(self.config.as_deref())?;
        match &self.command {
            Commands::Search(args) => search::execute(args, &config, self.format).await,
            Commands::Cache(args) => cache::execute(args, &config, self.format).await,
            Commands::Chat(args) => chat::execute(args, &config).await,
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }
}

/// Helper: load configuration from an explicit file or the environment
pub fn load_config(path: Option<&str>) -> Result<AppConfig, AppError> {
    match path {
        Some(path) => AppConfig::from_file(path),
        None => {
            let env = std::env::var("ROOMIE_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_search_with_filters() {
        let cli = Cli::try_parse_from([
            "roomie", "--format", "json", "search", "--location", "Pune", "--year", "2",
            "--pages", "3",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.pages, 3);
        assert_eq!(args.filters.location.as_deref(), Some("Pune"));
    }
}
