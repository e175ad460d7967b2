//! Semantic Scholar search backend.

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::models::SearchPage;
use crate::search::{SearchBackend, SearchError, SearchRequest};

/// Fixed base search endpoint.
pub const SEARCH_ENDPOINT: &str = "https://api.semanticscholar.org/graph/v1/paper/search";

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Search backend talking to the Semantic Scholar Graph API.
///
/// Requests are throttled client-side before they are sent; the service's
/// own throttle (HTTP 429) is still classified as [`SearchError::RateLimited`]
/// when it hits.
#[derive(Clone)]
pub struct SemanticScholarBackend {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
    limiter: Arc<DirectLimiter>,
}

impl std::fmt::Debug for SemanticScholarBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticScholarBackend")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl SemanticScholarBackend {
    /// Create a backend with default settings.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create a backend from application configuration.
    pub fn from_config(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(1u32));

        Self {
            client: Arc::new(client),
            base_url: SEARCH_ENDPOINT.to_string(),
            api_key: config.api_key.clone(),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        }
    }

    /// Point the backend at a different endpoint (tests use a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set an API key for higher rate limits.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for SemanticScholarBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SearchBackend for SemanticScholarBackend {
    async fn fetch(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        let url = request.to_url(&self.base_url)?;

        self.limiter.until_ready().await;
        tracing::debug!(url = %url, "issuing search request");

        let mut builder = self.client.get(url);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SearchError::Network(format!("search request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("search service throttled the request");
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SearchError::Network(format!(
                "search service returned status {status}"
            )));
        }

        let page: SearchPage = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "search response did not match the expected shape");
            SearchError::Decoding(e.to_string())
        })?;

        tracing::debug!(total = page.total, returned = page.len(), "search succeeded");
        Ok(page)
    }
}
