//! Mock search index for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::search_api::{
    SearchApiError, SourceKind, SourceQuery, SourceSearchResult, SourceSearcher,
};

/// Mock implementation of the SourceSearcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable results per source kind
/// - Track queries for assertions
/// - Simulate failures and slow responses
#[derive(Default)]
pub struct MockSearcher {
    /// Configured results per kind. Missing kinds return nothing.
    results: Arc<RwLock<HashMap<SourceKind, SourceSearchResult>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<SourceQuery>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<SearchApiError>>>,
    /// Artificial latency per fetch.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl std::fmt::Debug for MockSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSearcher")
            .field("results", &"<results>")
            .field("queries", &"<queries>")
            .finish()
    }
}

impl MockSearcher {
    /// Create a new mock searcher with empty results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full result (sources and metadata) for a kind.
    pub async fn set_result(&self, kind: SourceKind, result: SourceSearchResult) {
        self.results.write().await.insert(kind, result);
    }

    /// Set the sources for a kind, without metadata.
    pub async fn set_sources(
        &self,
        kind: SourceKind,
        sources: Vec<crate::search_api::CandidateSource>,
    ) {
        self.set_result(
            kind,
            SourceSearchResult {
                sources,
                metadata: None,
            },
        )
        .await;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: SearchApiError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every fetch by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get recorded queries.
    pub async fn recorded_queries(&self) -> Vec<SourceQuery> {
        self.queries.read().await.clone()
    }

    /// Number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.queries.read().await.len()
    }

    /// Number of fetches for one kind.
    pub async fn fetch_count_for(&self, kind: SourceKind) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| q.kind == kind)
            .count()
    }
}

#[async_trait]
impl SourceSearcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_sources(
        &self,
        query: &SourceQuery,
    ) -> Result<SourceSearchResult, SearchApiError> {
        self.queries.write().await.push(query.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self
            .results
            .read()
            .await
            .get(&query.kind)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;
    use crate::search_api::{IdType, ParsedId};
    use crate::testing::fixtures;

    fn query(kind: SourceKind) -> SourceQuery {
        SourceQuery {
            kind,
            id: ParsedId::new(IdType::Imdb, "tt1"),
            search_user_engines: false,
            api_key: Credential::new("k"),
        }
    }

    #[tokio::test]
    async fn test_results_per_kind() {
        let searcher = MockSearcher::new();
        searcher
            .set_sources(SourceKind::Torrent, vec![fixtures::torrent("a", "Movie")])
            .await;

        let torrents = searcher.fetch_sources(&query(SourceKind::Torrent)).await.unwrap();
        let nzbs = searcher.fetch_sources(&query(SourceKind::Usenet)).await.unwrap();

        assert_eq!(torrents.sources.len(), 1);
        assert!(nzbs.sources.is_empty());
        assert_eq!(searcher.fetch_count().await, 2);
        assert_eq!(searcher.fetch_count_for(SourceKind::Usenet).await, 1);
    }

    #[tokio::test]
    async fn test_next_error_is_one_shot() {
        let searcher = MockSearcher::new();
        searcher
            .set_next_error(SearchApiError::Auth("bad".into()))
            .await;

        assert!(searcher
            .fetch_sources(&query(SourceKind::Torrent))
            .await
            .unwrap_err()
            .is_auth());
        assert!(searcher.fetch_sources(&query(SourceKind::Torrent)).await.is_ok());
    }
}
