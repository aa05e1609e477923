//! HTTP client for the external profile search endpoint.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use roomie_core::config::SearchConfig;
use roomie_core::error::{AppError, ErrorKind};
use roomie_core::result::AppResult;
use roomie_core::types::{PageRequest, ProfileSummary, SearchFilters};

/// Path of the search endpoint relative to the API base URL.
pub const SEARCH_PATH: &str = "/api/profile/search";

/// Anything that can return one page of profile search results.
#[async_trait]
pub trait ProfileSearchApi: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch one page for `filters`.
    async fn search(
        &self,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> AppResult<Vec<ProfileSummary>>;
}

/// Normalize either response shape into a list of profiles.
///
/// The endpoint answers with a bare array or with `{ "posts": [...] }`.
/// Anything else is a [`ErrorKind::Serialization`] error.
pub fn normalize_response(body: Value) -> AppResult<Vec<ProfileSummary>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("posts") {
            Some(Value::Array(items)) => items,
            _ => return Err(AppError::serialization("Expected an array of posts")),
        },
        _ => return Err(AppError::serialization("Expected an array of posts")),
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(AppError::from))
        .collect()
}

/// [`ProfileSearchApi`] over HTTP with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpProfileSearch {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpProfileSearch {
    /// Build a client for `config.api_url`.
    pub fn new(config: &SearchConfig, token: Option<String>) -> AppResult<Self> {
        let base = Url::parse(&config.api_url).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid search API URL '{}'", config.api_url),
                e,
            )
        })?;
        let endpoint = base.join(SEARCH_PATH).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid search endpoint", e)
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    /// Full request URL for one page.
    pub fn request_url(&self, filters: &SearchFilters, page: PageRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in filters.query_pairs() {
                query.append_pair(name, &value);
            }
            query.append_pair("page", &page.page.to_string());
            query.append_pair("limit", &page.limit.to_string());
        }
        url
    }
}

#[async_trait]
impl ProfileSearchApi for HttpProfileSearch {
    async fn search(
        &self,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> AppResult<Vec<ProfileSummary>> {
        let url = self.request_url(filters, page);
        debug!(url = %url, "Requesting profile search page");

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Profile search request failed", e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "Profile search returned {status}"
            )));
        }

        let text = response.text().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                "Failed to read profile search response",
                e,
            )
        })?;

        let body: Value = serde_json::from_str(&text).map_err(|e| {
            warn!(payload = %text, "Profile search returned non-JSON body");
            AppError::from(e)
        })?;

        normalize_response(body.clone()).inspect_err(|e| {
            warn!(payload = %body, error = %e, "Unexpected profile search response");
        })
    }
}
