//! Testing utilities and mock implementations.
//!
//! Mocks for every external collaborator (search index, storage accounts,
//! season metadata) so orchestration can be exercised without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use streamscout_core::testing::{fixtures, MockSearcher, MockStoreClient, MockStoreFactory};
//!
//! let searcher = MockSearcher::new();
//! searcher
//!     .set_sources(SourceKind::Torrent, vec![fixtures::torrent("abc", "Movie 1080p")])
//!     .await;
//!
//! let torbox = Arc::new(MockStoreClient::new(ServiceId::Torbox));
//! torbox.add_cached("abc", vec![fixtures::store_file(0, "Movie.mkv", 1_000)]).await;
//! let stores = MockStoreFactory::new().with_client("tb-token", torbox.clone());
//! ```

mod mock_metadata;
mod mock_searcher;
mod mock_store;

pub use mock_metadata::MockMetadataProvider;
pub use mock_searcher::MockSearcher;
pub use mock_store::{MockStoreClient, MockStoreFactory};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::debrid::{AccountCredential, ServiceId, StoreFile};
    use crate::metadata::SeasonInfo;
    use crate::orchestrator::UserConfig;
    use crate::search_api::{CandidateSource, ProviderMetadata, SourceKind, SourceSearchResult};

    /// Create a torrent candidate with reasonable defaults.
    pub fn torrent(content_id: &str, title: &str) -> CandidateSource {
        CandidateSource {
            content_id: content_id.to_string(),
            title: title.to_string(),
            kind: SourceKind::Torrent,
            nzb_url: None,
            size_bytes: Some(1024 * 1024 * 1024), // 1 GB
            seeders: None,
            age: None,
            indexer: None,
            cached: None,
            user_submitted: false,
        }
    }

    /// Create a usenet candidate the index reports as cached.
    pub fn usenet(content_id: &str, title: &str) -> CandidateSource {
        CandidateSource {
            content_id: content_id.to_string(),
            title: title.to_string(),
            kind: SourceKind::Usenet,
            nzb_url: Some(format!("https://nzb.example/get/{}", content_id)),
            size_bytes: Some(1024 * 1024 * 1024 * 2), // 2 GB
            seeders: None,
            age: Some("12d".to_string()),
            indexer: Some("mock-indexer".to_string()),
            cached: Some(true),
            user_submitted: false,
        }
    }

    /// Create a file inside a cached item.
    pub fn store_file(index: u32, name: &str, size: u64) -> StoreFile {
        StoreFile {
            index: Some(index),
            name: name.to_string(),
            size,
        }
    }

    /// One file per episode, named `Show.SxxEyy.1080p.mkv`.
    pub fn season_pack(season: u32, episodes: u32) -> Vec<StoreFile> {
        (1..=episodes)
            .map(|e| {
                store_file(
                    e - 1,
                    &format!("Show.S{:02}/Show.S{:02}E{:02}.1080p.mkv", season, season, e),
                    1024 * 1024 * 500,
                )
            })
            .collect()
    }

    /// Seasons from `(number, episode_count)` pairs.
    pub fn seasons(counts: &[(u32, u32)]) -> Vec<SeasonInfo> {
        counts
            .iter()
            .map(|&(number, episode_count)| SeasonInfo {
                number,
                episode_count,
            })
            .collect()
    }

    /// Search result without inline metadata.
    pub fn search_result(sources: Vec<CandidateSource>) -> SourceSearchResult {
        SourceSearchResult {
            sources,
            metadata: None,
        }
    }

    /// Search result carrying a TMDB id and titles.
    pub fn search_result_with_metadata(
        sources: Vec<CandidateSource>,
        tmdb_id: u32,
        titles: &[&str],
    ) -> SourceSearchResult {
        SourceSearchResult {
            sources,
            metadata: Some(ProviderMetadata {
                tmdb_id: Some(tmdb_id),
                titles: titles.iter().map(|t| t.to_string()).collect(),
            }),
        }
    }

    /// User config with a search key and the given accounts.
    pub fn user_config(accounts: &[(ServiceId, &str)]) -> UserConfig {
        let mut config = UserConfig::new("search-key");
        config.accounts = accounts
            .iter()
            .map(|(service, credential)| AccountCredential::new(*service, *credential))
            .collect();
        config
    }
}
