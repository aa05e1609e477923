//! Configuration inspection.

use clap::{Args, Subcommand};

use roomie_core::config::AppConfig;
use roomie_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the merged configuration
    Show,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match args.command {
        ConfigCommand::Show => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Table => {
                println!("Server");
                output::print_kv("bind", &config.server.bind_address());
                output::print_kv("cors origins", &config.server.cors.allowed_origins.join(", "));
                println!("Realtime");
                output::print_kv("announce policy", &format!("{:?}", config.realtime.announce_policy));
                output::print_kv("ping interval (s)", &config.realtime.ping_interval_seconds.to_string());
                output::print_kv("ping timeout (s)", &config.realtime.ping_timeout_seconds.to_string());
                println!("Search");
                output::print_kv("api url", &config.search.api_url);
                output::print_kv("page size", &config.search.page_size.to_string());
                output::print_kv("debounce (ms)", &config.search.debounce_ms.to_string());
                println!("Cache");
                output::print_kv("directory", &config.cache.directory);
                output::print_kv("capacity", &config.cache.capacity.to_string());
                output::print_kv("ttl (s)", &config.cache.ttl_seconds.to_string());
                println!("Logging");
                output::print_kv("level", &config.logging.level);
                output::print_kv("format", &config.logging.format);
            }
        },
    }
    Ok(())
}
