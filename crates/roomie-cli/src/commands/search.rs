//! Profile search from the command line.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use roomie_core::config::AppConfig;
use roomie_core::error::AppError;
use roomie_core::types::{FilterKey, ProfileSummary, SearchFilters};
use roomie_search::{FetchOutcome, FileStore, HttpProfileSearch, PageCache, SearchController};

use crate::output::{self, OutputFormat};

/// Filter flags, one per searchable field
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// City or area
    #[arg(long)]
    pub location: Option<String>,
    /// College name
    #[arg(long)]
    pub college: Option<String>,
    /// Year of study (1-4)
    #[arg(long)]
    pub year: Option<String>,
    /// Branch of study
    #[arg(long)]
    pub branch: Option<String>,
    /// Gender (male, female, other)
    #[arg(long)]
    pub gender: Option<String>,
    /// Course
    #[arg(long)]
    pub course: Option<String>,
    /// Paying-guest accommodation name
    #[arg(long)]
    pub pg_name: Option<String>,
}

impl FilterArgs {
    /// Build validated filters from the provided flags.
    pub fn to_filters(&self) -> Result<SearchFilters, AppError> {
        let mut filters = SearchFilters::default();
        let fields = [
            (FilterKey::Location, &self.location),
            (FilterKey::CollegeName, &self.college),
            (FilterKey::Year, &self.year),
            (FilterKey::Branch, &self.branch),
            (FilterKey::Gender, &self.gender),
            (FilterKey::Course, &self.course),
            (FilterKey::PgName, &self.pg_name),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                filters.set(key, value)?;
            }
        }
        Ok(filters)
    }
}

/// Arguments for the search command
#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Ignore cached pages for these filters
    #[arg(long)]
    pub refresh: bool,

    /// Bearer token for the search API
    #[arg(long, env = "ROOMIE_TOKEN")]
    pub token: Option<String>,
}

/// Profile display row
#[derive(Debug, Serialize, Tabled)]
struct ProfileRow {
    /// Profile ID
    id: String,
    /// Name
    name: String,
    /// College
    college: String,
    /// Location
    location: String,
    /// Year
    year: String,
    /// Branch
    branch: String,
    /// PG
    pg: String,
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

impl From<&ProfileSummary> for ProfileRow {
    fn from(p: &ProfileSummary) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            college: or_dash(p.college_name.as_deref()),
            location: or_dash(p.address()),
            year: or_dash(p.year.as_deref()),
            branch: or_dash(p.branch.as_deref()),
            pg: or_dash(p.pg_name.as_deref()),
        }
    }
}

/// Open a controller backed by the HTTP API and the on-disk cache.
pub async fn open_controller(
    config: &AppConfig,
    token: Option<String>,
) -> Result<SearchController, AppError> {
    let api = Arc::new(HttpProfileSearch::new(&config.search, token)?);
    let store = Arc::new(FileStore::new(&config.cache.directory).await?);
    let cache = PageCache::from_config(&config.cache);
    Ok(SearchController::open(&config.search, api, store, cache).await)
}

/// Execute the search command
pub async fn execute(
    args: &SearchArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let filters = args.filters.to_filters()?;
    let controller = open_controller(config, args.token.clone()).await?;

    controller.set_filters(filters);
    let mut outcome = if args.refresh {
        controller.apply_and_refresh().await
    } else {
        controller.apply_filters_now().await
    };

    let mut from_cache = 0usize;
    for page in 1..=args.pages.max(1) {
        if page > 1 {
            outcome = controller.load_more().await;
        }
        match &outcome {
            FetchOutcome::Cache(_) => from_cache += 1,
            FetchOutcome::Network(_) => {}
            FetchOutcome::Failed(message) => {
                return Err(AppError::external_service(message.clone()));
            }
            FetchOutcome::Exhausted | FetchOutcome::InFlight | FetchOutcome::Stale => break,
        }
    }

    let snapshot = controller.snapshot();
    let rows: Vec<ProfileRow> = snapshot.posts.iter().map(ProfileRow::from).collect();
    output::print_list(&rows, format);

    if format == OutputFormat::Table {
        output::print_kv("pages loaded", &snapshot.page.to_string());
        output::print_kv("served from cache", &from_cache.to_string());
        output::print_kv("more available", &snapshot.has_more.to_string());
    }
    Ok(())
}
