//! Process-wide caches shared across requests.
//!
//! Two independent namespaces:
//! - candidate-source lists keyed by `(kind, id type, id, season, episode)`
//! - title metadata keyed by `(id type, id)`
//!
//! Availability is never cached; only what the search index returned.

mod ttl;

pub use ttl::TtlCache;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::CacheConfig;
use crate::metadata::TitleMetadata;
use crate::metrics::CACHE_LOOKUPS;
use crate::search_api::{CandidateSource, IdType, ParsedId, SourceKind};

/// Key for a cached candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcesKey {
    pub kind: SourceKind,
    pub id_type: IdType,
    pub id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl SourcesKey {
    pub fn new(kind: SourceKind, id: &ParsedId) -> Self {
        Self {
            kind,
            id_type: id.id_type,
            id: id.id.clone(),
            season: id.season,
            episode: id.episode,
        }
    }
}

/// Key for cached title metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataKey {
    pub id_type: IdType,
    pub id: String,
}

impl MetadataKey {
    pub fn new(id: &ParsedId) -> Self {
        Self {
            id_type: id.id_type,
            id: id.id.clone(),
        }
    }
}

pub type SourceList = Arc<Vec<CandidateSource>>;

/// Both cache namespaces with their configured TTLs. Cheap to clone.
#[derive(Clone)]
pub struct SearchCaches {
    sources: Arc<TtlCache<SourcesKey, SourceList>>,
    metadata: Arc<TtlCache<MetadataKey, TitleMetadata>>,
    search_ttl: Duration,
    metadata_ttl: Duration,
}

impl SearchCaches {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_ttls(config.search_ttl(), config.metadata_ttl())
    }

    pub fn with_ttls(search_ttl: Duration, metadata_ttl: Duration) -> Self {
        Self {
            sources: Arc::new(TtlCache::new("sources")),
            metadata: Arc::new(TtlCache::new("metadata")),
            search_ttl,
            metadata_ttl,
        }
    }

    pub async fn get_sources(&self, key: &SourcesKey) -> Option<SourceList> {
        let hit = self.sources.get(key).await;
        record_lookup(self.sources.name(), hit.is_some());
        hit
    }

    /// Cache a candidate list. User-submitted results are stripped first;
    /// they belong to the request that produced them.
    pub async fn put_sources(&self, key: SourcesKey, sources: &[CandidateSource]) {
        let shareable: Vec<CandidateSource> = sources
            .iter()
            .filter(|s| !s.user_submitted)
            .cloned()
            .collect();
        self.sources
            .set(key, Arc::new(shareable), self.search_ttl)
            .await;
    }

    pub async fn get_metadata(&self, key: &MetadataKey) -> Option<TitleMetadata> {
        let hit = self.metadata.get(key).await;
        record_lookup(self.metadata.name(), hit.is_some());
        hit
    }

    pub async fn put_metadata(&self, key: MetadataKey, metadata: TitleMetadata) {
        self.metadata.set(key, metadata, self.metadata_ttl).await;
    }

    /// Drop expired entries from both namespaces.
    pub async fn purge_expired(&self) -> usize {
        self.sources.purge_expired().await + self.metadata.purge_expired().await
    }

    /// Run `purge_expired` every `interval` until the handle is aborted.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let caches = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = caches.purge_expired().await;
                if removed > 0 {
                    debug!(removed, "Purged expired cache entries");
                }
            }
        })
    }
}

fn record_lookup(namespace: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    CACHE_LOOKUPS.with_label_values(&[namespace, result]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn key(id: &str) -> SourcesKey {
        SourcesKey::new(SourceKind::Torrent, &ParsedId::new(IdType::Imdb, id))
    }

    #[tokio::test]
    async fn test_sources_round_trip() {
        let caches = SearchCaches::with_ttls(Duration::from_secs(60), Duration::from_secs(60));
        let sources = vec![
            fixtures::torrent("aaa", "Movie 1080p"),
            fixtures::torrent("bbb", "Movie 720p"),
        ];
        caches.put_sources(key("tt1"), &sources).await;

        let cached = caches.get_sources(&key("tt1")).await.unwrap();
        assert_eq!(cached.as_slice(), sources.as_slice());
        assert!(caches.get_sources(&key("tt2")).await.is_none());
    }

    #[tokio::test]
    async fn test_user_submitted_sources_are_not_cached() {
        let caches = SearchCaches::with_ttls(Duration::from_secs(60), Duration::from_secs(60));
        let mut personal = fixtures::torrent("ccc", "Personal upload");
        personal.user_submitted = true;
        let sources = vec![fixtures::torrent("aaa", "Public"), personal];

        caches.put_sources(key("tt1"), &sources).await;

        let cached = caches.get_sources(&key("tt1")).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].content_id, "aaa");
    }

    #[tokio::test]
    async fn test_keys_distinguish_kind_and_episode() {
        let caches = SearchCaches::with_ttls(Duration::from_secs(60), Duration::from_secs(60));
        let id = ParsedId::new(IdType::Imdb, "tt0903747").with_episode(Some(1), 1);
        caches
            .put_sources(
                SourcesKey::new(SourceKind::Torrent, &id),
                &[fixtures::torrent("aaa", "Show S01E01")],
            )
            .await;

        assert!(caches
            .get_sources(&SourcesKey::new(SourceKind::Usenet, &id))
            .await
            .is_none());
        let other_episode = ParsedId::new(IdType::Imdb, "tt0903747").with_episode(Some(1), 2);
        assert!(caches
            .get_sources(&SourcesKey::new(SourceKind::Torrent, &other_episode))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_metadata_namespace_expires_independently() {
        let caches =
            SearchCaches::with_ttls(Duration::from_secs(60), Duration::from_millis(20));
        let id = ParsedId::new(IdType::Kitsu, "7442");
        caches
            .put_metadata(
                MetadataKey::new(&id),
                TitleMetadata {
                    titles: vec!["Attack on Titan".to_string()],
                    seasons: None,
                },
            )
            .await;
        caches
            .put_sources(SourcesKey::new(SourceKind::Torrent, &id), &[])
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(caches.get_metadata(&MetadataKey::new(&id)).await.is_none());
        assert!(caches
            .get_sources(&SourcesKey::new(SourceKind::Torrent, &id))
            .await
            .is_some());
        assert_eq!(caches.purge_expired().await, 1);
    }
}
