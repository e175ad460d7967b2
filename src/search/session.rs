//! Search session orchestration.
//!
//! One session serves one user; at most one search matters at a time. A new
//! search invalidates any still-in-flight predecessor: whichever attempt is
//! newest when it completes wins, everything older reports
//! [`SearchOutcome::Superseded`] and is discarded, stale errors included.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::Paper;
use crate::search::{SearchBackend, SearchError, SearchRequest};

/// What became of a search attempt.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Papers in service order. An empty list is a valid "no matches"
    /// result, distinct from any error.
    Results(Vec<Paper>),

    /// A newer search started while this one was in flight; its outcome
    /// was discarded.
    Superseded,
}

/// Coordinates search attempts against a backend.
#[derive(Debug)]
pub struct SearchSession {
    backend: Arc<dyn SearchBackend>,
    generation: AtomicU64,
}

impl SearchSession {
    /// Create a session over the given backend.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            generation: AtomicU64::new(0),
        }
    }

    /// Run one search attempt.
    ///
    /// Results come back in service order, never re-sorted. If another
    /// `run` starts before this one completes, this one resolves to
    /// `Superseded` regardless of what the backend returned.
    pub async fn run(&self, request: SearchRequest) -> Result<SearchOutcome, SearchError> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation = token, query = %request.query, "starting search");

        let result = self.backend.fetch(&request).await;

        if self.generation.load(Ordering::SeqCst) != token {
            tracing::debug!(generation = token, "search superseded, dropping outcome");
            return Ok(SearchOutcome::Superseded);
        }

        Ok(SearchOutcome::Results(result?.into_papers()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchPage;
    use crate::search::mock::MockBackend;
    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    fn request() -> SearchRequest {
        SearchRequest::casual(&["graphs"])
    }

    fn page_with_titles(titles: &[&str]) -> SearchPage {
        SearchPage {
            total: titles.len() as u64,
            data: Some(
                titles
                    .iter()
                    .map(|t| {
                        serde_json::from_value(serde_json::json!({
                            "paperId": format!("id-{t}"),
                            "title": t,
                        }))
                        .unwrap()
                    })
                    .collect(),
            ),
        }
    }

    #[tokio::test]
    async fn test_results_keep_service_order() {
        let backend = Arc::new(MockBackend::new());
        backend.push_page(page_with_titles(&["b", "a", "c"]));

        let session = SearchSession::new(backend);
        match session.run(request()).await.unwrap() {
            SearchOutcome::Results(papers) => {
                let titles: Vec<_> = papers.iter().map(|p| p.title.as_deref().unwrap()).collect();
                assert_eq!(titles, vec!["b", "a", "c"]);
            }
            SearchOutcome::Superseded => panic!("nothing superseded this search"),
        }
    }

    #[tokio::test]
    async fn test_empty_page_is_a_result_not_an_error() {
        let backend = Arc::new(MockBackend::new());
        backend.push_page(SearchPage { total: 0, data: None });

        let session = SearchSession::new(backend);
        match session.run(request()).await.unwrap() {
            SearchOutcome::Results(papers) => assert!(papers.is_empty()),
            SearchOutcome::Superseded => panic!("nothing superseded this search"),
        }
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let backend = Arc::new(MockBackend::new());
        backend.push_error(SearchError::RateLimited);

        let session = SearchSession::new(backend);
        assert!(matches!(
            session.run(request()).await,
            Err(SearchError::RateLimited)
        ));
    }

    /// Backend whose first fetch blocks until released, so a second search
    /// can overtake it.
    #[derive(Debug)]
    struct GatedBackend {
        entered: Semaphore,
        release: Semaphore,
        calls: AtomicU64,
    }

    #[async_trait]
    impl SearchBackend for GatedBackend {
        async fn fetch(&self, _request: &SearchRequest) -> Result<SearchPage, SearchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                self.entered.add_permits(1);
                self.release.acquire().await.unwrap().forget();
                Ok(page_with_titles(&["stale"]))
            } else {
                Ok(page_with_titles(&["fresh"]))
            }
        }
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let backend = Arc::new(GatedBackend {
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
            calls: AtomicU64::new(0),
        });
        let session = Arc::new(SearchSession::new(backend.clone() as Arc<dyn SearchBackend>));

        let stale_session = session.clone();
        let stale = tokio::spawn(async move { stale_session.run(request()).await });

        // Wait until the first search is actually in flight.
        backend.entered.acquire().await.unwrap().forget();

        match session.run(request()).await.unwrap() {
            SearchOutcome::Results(papers) => {
                assert_eq!(papers[0].title.as_deref(), Some("fresh"));
            }
            SearchOutcome::Superseded => panic!("the newest search must land"),
        }

        backend.release.add_permits(1);
        match stale.await.unwrap().unwrap() {
            SearchOutcome::Superseded => {}
            SearchOutcome::Results(_) => panic!("stale search must not land"),
        }
    }
}
