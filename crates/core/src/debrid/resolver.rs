//! Per-account availability resolution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::search_api::{CandidateSource, SourceKind};

use super::matcher::{EpisodeTarget, FileMatcher};
use super::types::{
    AccountCredential, AccountRef, AvailabilityOutcome, ResolveContext, ResolvedFile, StoreClient,
    StoreFile,
};

/// Knobs shared by every account in a request.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Hashes per `check_cached` call.
    pub batch_size: usize,
    /// Emit uncached entries for sources whose title matches.
    pub include_uncached: bool,
    pub min_match_confidence: f32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            include_uncached: false,
            min_match_confidence: 0.5,
        }
    }
}

/// Resolves candidate sources against one storage account.
pub struct AccountResolver {
    account: AccountCredential,
    client: Arc<dyn StoreClient>,
    matcher: FileMatcher,
    settings: ResolverSettings,
}

impl AccountResolver {
    pub fn new(
        account: AccountCredential,
        client: Arc<dyn StoreClient>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            account,
            client,
            matcher: FileMatcher::with_min_confidence(settings.min_match_confidence),
            settings,
        }
    }

    pub fn account(&self) -> &AccountCredential {
        &self.account
    }

    /// Check every torrent source on this account.
    ///
    /// Batch errors that only concern the request itself are logged and the
    /// batch skipped. Account-level faults abort with a single failure.
    pub async fn resolve(
        &self,
        sources: &[CandidateSource],
        ctx: &ResolveContext,
    ) -> AvailabilityOutcome {
        let service = self.account.service;
        let fingerprint = self.account.credential.fingerprint();

        let mut seen = HashSet::new();
        let hashes: Vec<String> = sources
            .iter()
            .filter(|s| s.kind == SourceKind::Torrent)
            .filter(|s| seen.insert(s.content_id.as_str()))
            .map(|s| s.content_id.clone())
            .collect();

        let mut cached: HashMap<String, Vec<StoreFile>> = HashMap::new();
        let mut answered = false;
        let mut last_error = None;
        for batch in hashes.chunks(self.settings.batch_size.max(1)) {
            match self.client.check_cached(batch).await {
                Ok(found) => {
                    answered = true;
                    cached.extend(found);
                }
                Err(e) if e.is_account_level() => {
                    warn!(
                        service = %service,
                        account = %fingerprint,
                        error = %e,
                        "Account lookup failed"
                    );
                    return AvailabilityOutcome::Failure(e.to_failure(service));
                }
                Err(e) => {
                    warn!(
                        service = %service,
                        account = %fingerprint,
                        batch = batch.len(),
                        error = %e,
                        "Skipping availability batch"
                    );
                    last_error = Some(e);
                }
            }
        }

        // An account that answered no batch at all must still be reported.
        if let (false, Some(e)) = (answered, last_error) {
            warn!(service = %service, account = %fingerprint, error = %e, "Every batch failed");
            return AvailabilityOutcome::Failure(e.to_failure(service));
        }

        let target = EpisodeTarget::from_context(ctx);
        let known_titles: &[String] = ctx
            .metadata
            .as_ref()
            .map(|m| m.titles.as_slice())
            .unwrap_or(&[]);

        let mut files = Vec::new();
        for source in sources.iter().filter(|s| s.kind == SourceKind::Torrent) {
            if let Some(store_files) = cached.get(&source.content_id) {
                for m in self.matcher.select(store_files, &target) {
                    files.push(ResolvedFile {
                        source_id: source.content_id.clone(),
                        filename: display_name(&m.file.name),
                        size_bytes: m.file.size,
                        file_index: m.file.index,
                        account: AccountRef {
                            service,
                            cached: true,
                        },
                    });
                }
            } else if self.settings.include_uncached
                && self
                    .matcher
                    .title_matches(&source.title, &target, known_titles)
            {
                files.push(ResolvedFile {
                    source_id: source.content_id.clone(),
                    filename: source.title.clone(),
                    size_bytes: source.size_bytes.unwrap_or(0),
                    file_index: None,
                    account: AccountRef {
                        service,
                        cached: false,
                    },
                });
            }
        }

        debug!(
            service = %service,
            account = %fingerprint,
            checked = hashes.len(),
            cached = cached.len(),
            files = files.len(),
            "Account lookup complete"
        );

        AvailabilityOutcome::Files(files)
    }
}

fn display_name(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debrid::{ServiceId, StoreError};
    use crate::metadata::TitleMetadata;
    use crate::search_api::{IdType, ParsedId};
    use crate::testing::{fixtures, MockStoreClient};

    fn resolver(client: Arc<MockStoreClient>, settings: ResolverSettings) -> AccountResolver {
        AccountResolver::new(
            AccountCredential::new(ServiceId::Torbox, "token"),
            client,
            settings,
        )
    }

    fn episode_ctx(season: u32, episode: u32) -> ResolveContext {
        ResolveContext::new(
            ParsedId::new(IdType::Imdb, "tt0903747").with_episode(Some(season), episode),
        )
    }

    #[tokio::test]
    async fn test_resolves_matching_episode_file() {
        let client = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        client
            .add_cached(
                "aaa",
                vec![
                    fixtures::store_file(0, "Show/Show.S01E01.mkv", 100),
                    fixtures::store_file(1, "Show/Show.S01E02.mkv", 100),
                ],
            )
            .await;
        let sources = vec![
            fixtures::torrent("aaa", "Show S01 Complete"),
            fixtures::torrent("bbb", "Show S01E02"),
        ];

        let outcome = resolver(client.clone(), ResolverSettings::default())
            .resolve(&sources, &episode_ctx(1, 2))
            .await;

        let AvailabilityOutcome::Files(files) = outcome else {
            panic!("expected files");
        };
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].source_id, "aaa");
        assert_eq!(files[0].filename, "Show.S01E02.mkv");
        assert_eq!(files[0].file_index, Some(1));
        assert!(files[0].account.cached);
        assert_eq!(client.check_count().await, 1);
    }

    #[tokio::test]
    async fn test_hashes_are_batched() {
        let client = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        let sources: Vec<_> = (0..5)
            .map(|i| fixtures::torrent(&format!("hash{}", i), "Movie"))
            .collect();
        let settings = ResolverSettings {
            batch_size: 2,
            ..ResolverSettings::default()
        };

        resolver(client.clone(), settings)
            .resolve(&sources, &ResolveContext::new(ParsedId::new(IdType::Imdb, "tt1")))
            .await;

        let batches = client.recorded_batches().await;
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_account_level_error_fails_outcome() {
        let client = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        client.set_next_error(StoreError::InvalidCredentials).await;

        let outcome = resolver(client, ResolverSettings::default())
            .resolve(
                &[fixtures::torrent("aaa", "Movie")],
                &ResolveContext::new(ParsedId::new(IdType::Imdb, "tt1")),
            )
            .await;

        let AvailabilityOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.title, "TB");
        assert_eq!(failure.description, "Invalid/expired credentials");
    }

    #[tokio::test]
    async fn test_batch_error_is_skipped() {
        let client = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        client
            .add_cached("bbb", vec![fixtures::store_file(0, "Movie.mkv", 100)])
            .await;
        client
            .set_next_error(StoreError::Api {
                status: 400,
                message: "invalid hash".into(),
            })
            .await;
        let settings = ResolverSettings {
            batch_size: 1,
            ..ResolverSettings::default()
        };
        let sources = vec![fixtures::torrent("aaa", "Movie"), fixtures::torrent("bbb", "Movie")];

        let outcome = resolver(client, settings)
            .resolve(&sources, &ResolveContext::new(ParsedId::new(IdType::Imdb, "tt1")))
            .await;

        let AvailabilityOutcome::Files(files) = outcome else {
            panic!("expected files");
        };
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].source_id, "bbb");
    }

    #[tokio::test]
    async fn test_service_outage_fails_outcome() {
        let client = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        client.set_error(StoreError::Unavailable(503)).await;

        let outcome = resolver(client, ResolverSettings::default())
            .resolve(
                &[fixtures::torrent("aaa", "Movie")],
                &ResolveContext::new(ParsedId::new(IdType::Imdb, "tt1")),
            )
            .await;

        let AvailabilityOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.title, "TB");
        assert_eq!(failure.description, "Service unavailable (HTTP 503)");
    }

    #[tokio::test]
    async fn test_every_batch_failing_is_reported() {
        let client = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        client
            .set_error(StoreError::Api {
                status: 400,
                message: "invalid hash".into(),
            })
            .await;
        let settings = ResolverSettings {
            batch_size: 1,
            ..ResolverSettings::default()
        };
        let sources = vec![fixtures::torrent("aaa", "Movie"), fixtures::torrent("bbb", "Movie")];

        let outcome = resolver(client.clone(), settings)
            .resolve(&sources, &ResolveContext::new(ParsedId::new(IdType::Imdb, "tt1")))
            .await;

        assert!(matches!(outcome, AvailabilityOutcome::Failure(_)));
        assert_eq!(client.check_count().await, 2);
    }

    #[tokio::test]
    async fn test_include_uncached_uses_title() {
        let client = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        let mut ctx = episode_ctx(1, 2);
        ctx.metadata = Some(TitleMetadata::new(vec!["Show".to_string()], None));
        let sources = vec![
            fixtures::torrent("aaa", "Show S01E02 1080p"),
            fixtures::torrent("bbb", "Show S01E05 1080p"),
            fixtures::torrent("ccc", "Other S01E02"),
        ];
        let settings = ResolverSettings {
            include_uncached: true,
            ..ResolverSettings::default()
        };

        let outcome = resolver(client, settings).resolve(&sources, &ctx).await;

        let AvailabilityOutcome::Files(files) = outcome else {
            panic!("expected files");
        };
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].source_id, "aaa");
        assert!(!files[0].account.cached);
        assert_eq!(files[0].file_index, None);
    }

    #[tokio::test]
    async fn test_usenet_sources_are_ignored() {
        let client = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        let outcome = resolver(client.clone(), ResolverSettings::default())
            .resolve(
                &[fixtures::usenet("nzb1", "Movie")],
                &ResolveContext::new(ParsedId::new(IdType::Imdb, "tt1")),
            )
            .await;

        assert_eq!(outcome, AvailabilityOutcome::Files(vec![]));
        assert_eq!(client.check_count().await, 0);
    }
}
