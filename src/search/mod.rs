//! Search query construction, the backend seam, and the session orchestrator.
//!
//! A search attempt flows through three stages: a [`SearchRequest`] is built
//! from user input (pure, no I/O), a [`SearchBackend`] turns it into an HTTP
//! call and classifies the outcome, and a [`SearchSession`] arbitrates
//! between overlapping attempts so only the newest one lands.

mod backend;
pub mod mock;
mod query;
mod session;

pub use backend::{SemanticScholarBackend, SEARCH_ENDPOINT};
pub use query::{
    format_date, SearchFilters, SearchRequest, PAPER_FIELDS, RESULT_LIMIT, SUGGESTED_TAGS,
};
pub use session::{SearchOutcome, SearchSession};

use crate::models::SearchPage;
use async_trait::async_trait;

/// Errors that can occur during a search attempt.
///
/// `RateLimited` is deliberately distinct from `Network`: an empty result
/// and a throttled request call for different user actions (broaden the
/// search vs. retry later), so callers must be able to tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request could not be formed; fatal to this attempt, the user
    /// must adjust their input
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The service imposed a throttle; recoverable, retry later
    #[error("rate limited by the search service")]
    RateLimited,

    /// Transport or HTTP-level failure; recoverable, retry
    #[error("network failure: {0}")]
    Network(String),

    /// The response body did not match the expected shape
    #[error("failed to decode search response: {0}")]
    Decoding(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Network(err.to_string())
    }
}

/// The seam between the session and the remote search service.
///
/// The production implementation is [`SemanticScholarBackend`]; tests
/// substitute [`mock::MockBackend`].
#[async_trait]
pub trait SearchBackend: Send + Sync + std::fmt::Debug {
    /// Execute one search request and classify its outcome.
    async fn fetch(&self, request: &SearchRequest) -> Result<SearchPage, SearchError>;
}
