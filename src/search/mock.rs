//! Mock search backend for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::models::SearchPage;
use crate::search::{SearchBackend, SearchError, SearchRequest};

/// A mock backend that replays queued responses.
///
/// Responses are consumed front-to-back; with nothing queued, `fetch`
/// returns an empty page.
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: Mutex<VecDeque<Result<SearchPage, SearchError>>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl MockBackend {
    /// Create a mock backend with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page.
    pub fn push_page(&self, page: SearchPage) {
        self.responses.lock().unwrap().push_back(Ok(page));
    }

    /// Queue an error.
    pub fn push_error(&self, error: SearchError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn fetch(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(SearchPage { total: 0, data: None }),
        }
    }
}
