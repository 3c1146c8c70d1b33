//! Request handling for the search orchestrator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::cache::{MetadataKey, SearchCaches, SourceList, SourcesKey};
use crate::debrid::{
    AccountCredential, AccountFailure, AccountRef, AccountResolver, AvailabilityOutcome,
    ResolveContext, ResolvedFile, ServiceId, StoreClientFactory, StoreError,
};
use crate::metadata::{absolute_episode, SeasonMetadataProvider, TitleMetadata};
use crate::metrics::{
    ACCOUNT_LOOKUPS, ACCOUNT_LOOKUP_DURATION, METADATA_ENRICHMENTS, PROVIDER_FETCHES,
    PROVIDER_FETCH_DURATION, STREAMS_RETURNED,
};
use crate::search_api::{
    CandidateSource, ParsedId, ProviderMetadata, SearchApiError, SourceKind, SourceQuery,
    SourceSearcher,
};
use crate::stream::{StreamAssembler, StreamDescriptor};

use super::config::OrchestratorConfig;
use super::types::{AvailabilityStrategy, OrchestratorError, UserConfig};

/// Description shown when the search index rejects the user's key.
const INVALID_CREDENTIALS: &str = "Invalid/expired credentials";

/// Coordinates search, enrichment, availability and assembly.
pub struct SearchOrchestrator {
    searcher: Arc<dyn SourceSearcher>,
    stores: Arc<dyn StoreClientFactory>,
    metadata: Option<Arc<dyn SeasonMetadataProvider>>,
    caches: SearchCaches,
    assembler: StreamAssembler,
    config: OrchestratorConfig,
}

impl SearchOrchestrator {
    pub fn new(
        searcher: Arc<dyn SourceSearcher>,
        stores: Arc<dyn StoreClientFactory>,
        caches: SearchCaches,
        assembler: StreamAssembler,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            searcher,
            stores,
            metadata: None,
            caches,
            assembler,
            config,
        }
    }

    /// Attach the season metadata collaborator.
    pub fn with_metadata(mut self, provider: Arc<dyn SeasonMetadataProvider>) -> Self {
        self.metadata = Some(provider);
        self
    }

    pub fn caches(&self) -> &SearchCaches {
        &self.caches
    }

    pub fn assembler(&self) -> &StreamAssembler {
        &self.assembler
    }

    /// Streams for `id` across every source kind the user enabled.
    ///
    /// Kinds are searched concurrently; torrent streams come first.
    /// Fails only when the search index itself fails.
    pub async fn get_streams(
        &self,
        id: &ParsedId,
        user: &UserConfig,
    ) -> Result<Vec<StreamDescriptor>, OrchestratorError> {
        let kinds = user.source_kinds();
        let results =
            join_all(kinds.iter().map(|kind| self.streams_for_kind(*kind, id, user))).await;

        let mut streams = Vec::new();
        for result in results {
            streams.extend(result?);
        }
        Ok(streams)
    }

    async fn streams_for_kind(
        &self,
        kind: SourceKind,
        id: &ParsedId,
        user: &UserConfig,
    ) -> Result<Vec<StreamDescriptor>, OrchestratorError> {
        let sources = match self.fetch_candidates(kind, id, user).await {
            Ok(sources) => sources,
            Err(SearchApiError::Auth(detail)) => {
                warn!(kind = %kind, id = %id, detail = %detail, "Search API rejected credentials");
                STREAMS_RETURNED.with_label_values(&["error"]).inc();
                return Ok(vec![self.assembler.error_stream(&AccountFailure {
                    title: String::new(),
                    description: INVALID_CREDENTIALS.to_string(),
                })]);
            }
            Err(source) => {
                error!(kind = %kind, id = %id, error = %source, "Search API request failed");
                return Err(OrchestratorError::Provider { kind, source });
            }
        };

        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let streams = match AvailabilityStrategy::for_kind(kind) {
            AvailabilityStrategy::AccountFanOut => self.fan_out(&sources, id, user).await?,
            AvailabilityStrategy::ProviderReported(service) => {
                self.provider_reported(&sources, id, user, service)?
            }
        };

        let errors = streams.iter().filter(|s| s.is_error()).count();
        STREAMS_RETURNED
            .with_label_values(&[kind.as_str()])
            .inc_by((streams.len() - errors) as u64);
        STREAMS_RETURNED
            .with_label_values(&["error"])
            .inc_by(errors as u64);

        Ok(streams)
    }

    /// Cache-first candidate fetch. A live fetch also refreshes title
    /// metadata for torrents.
    async fn fetch_candidates(
        &self,
        kind: SourceKind,
        id: &ParsedId,
        user: &UserConfig,
    ) -> Result<SourceList, SearchApiError> {
        let key = SourcesKey::new(kind, id);

        if !user.search_user_engines {
            if let Some(cached) = self.caches.get_sources(&key).await {
                info!(kind = %kind, id = %id, count = cached.len(), "Found cached sources");
                return Ok(cached);
            }
        }

        let query = SourceQuery {
            kind,
            id: id.clone(),
            search_user_engines: user.search_user_engines,
            api_key: user.search_api_key.clone(),
        };

        let start = Instant::now();
        let result = self.searcher.fetch_sources(&query).await;
        PROVIDER_FETCH_DURATION
            .with_label_values(&[kind.as_str()])
            .observe(start.elapsed().as_secs_f64());

        let result = match result {
            Ok(result) => {
                PROVIDER_FETCHES
                    .with_label_values(&[kind.as_str(), "success"])
                    .inc();
                result
            }
            Err(e) => {
                let status = if e.is_auth() { "auth_error" } else { "error" };
                PROVIDER_FETCHES
                    .with_label_values(&[kind.as_str(), status])
                    .inc();
                return Err(e);
            }
        };

        info!(
            kind = %kind,
            id = %id,
            count = result.sources.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Found sources"
        );

        if kind == SourceKind::Torrent {
            if let Some(metadata) = result.metadata {
                self.store_metadata(id, metadata, user).await;
            }
        }

        self.caches.put_sources(key, &result.sources).await;
        Ok(Arc::new(result.sources))
    }

    /// Cache title metadata, adding season counts where numbering needs them.
    /// Enrichment failures are logged and otherwise ignored.
    async fn store_metadata(&self, id: &ParsedId, provider: ProviderMetadata, user: &UserConfig) {
        let mut seasons = None;

        if self.config.enrich_id_types.contains(&id.id_type) {
            match (provider.tmdb_id, &self.metadata) {
                (Some(tmdb_id), Some(metadata)) => {
                    let start = Instant::now();
                    match metadata
                        .series_seasons(tmdb_id, user.tmdb_access_token.as_ref())
                        .await
                    {
                        Ok(found) => {
                            debug!(
                                id = %id,
                                tmdb_id,
                                seasons = found.len(),
                                duration_ms = start.elapsed().as_millis() as u64,
                                "Fetched season info"
                            );
                            METADATA_ENRICHMENTS.with_label_values(&["success"]).inc();
                            seasons = Some(found);
                        }
                        Err(e) => {
                            error!(id = %id, tmdb_id, error = %e, "Failed to fetch season info");
                            METADATA_ENRICHMENTS.with_label_values(&["error"]).inc();
                        }
                    }
                }
                _ => {
                    METADATA_ENRICHMENTS.with_label_values(&["skipped"]).inc();
                }
            }
        }

        self.caches
            .put_metadata(
                MetadataKey::new(id),
                TitleMetadata::new(provider.titles, seasons),
            )
            .await;
    }

    /// Torrent path: every account checks every candidate concurrently.
    async fn fan_out(
        &self,
        sources: &[CandidateSource],
        id: &ParsedId,
        user: &UserConfig,
    ) -> Result<Vec<StreamDescriptor>, OrchestratorError> {
        if user.accounts.is_empty() {
            debug!(id = %id, "No storage accounts configured");
            return Ok(Vec::new());
        }

        let metadata = self.caches.get_metadata(&MetadataKey::new(id)).await;
        let absolute = match (
            id.season,
            id.episode,
            metadata.as_ref().and_then(|m| m.seasons.as_deref()),
        ) {
            (Some(season), Some(episode), Some(seasons)) => {
                absolute_episode(season, episode, seasons)
            }
            _ => None,
        };
        let ctx = ResolveContext {
            parsed_id: id.clone(),
            absolute_episode: absolute,
            metadata,
        };

        let outcomes = join_all(
            user.accounts
                .iter()
                .map(|account| self.lookup_account(account, sources, &ctx)),
        )
        .await;

        let (files_by_source, failures) = merge_outcomes(outcomes);

        let mut streams = Vec::new();
        let mut emitted = HashSet::new();
        for source in sources {
            if !emitted.insert(source.content_id.as_str()) {
                continue;
            }
            let Some(files) = files_by_source.get(&source.content_id) else {
                continue;
            };
            for file in files {
                streams.push(self.assembler.assemble(
                    source,
                    file,
                    user.credential_for(file.account.service),
                    id,
                    absolute,
                )?);
            }
        }

        streams.extend(failures.iter().map(|f| self.assembler.error_stream(f)));
        Ok(streams)
    }

    /// One account's lookup, bounded by the configured timeout.
    async fn lookup_account(
        &self,
        account: &AccountCredential,
        sources: &[CandidateSource],
        ctx: &ResolveContext,
    ) -> AvailabilityOutcome {
        let service = account.service;
        let start = Instant::now();

        let (outcome, label) = match self.stores.create(account) {
            Ok(client) => {
                let resolver =
                    AccountResolver::new(account.clone(), client, self.config.resolver.clone());
                match tokio::time::timeout(
                    self.config.account_lookup_timeout,
                    resolver.resolve(sources, ctx),
                )
                .await
                {
                    Ok(outcome) => {
                        let label = match &outcome {
                            AvailabilityOutcome::Files(_) => "files",
                            AvailabilityOutcome::Failure(_) => "failure",
                        };
                        (outcome, label)
                    }
                    Err(_) => {
                        warn!(
                            service = %service,
                            account = %account.credential.fingerprint(),
                            timeout_ms = self.config.account_lookup_timeout.as_millis() as u64,
                            "Account lookup timed out"
                        );
                        let failure = StoreError::Timeout.to_failure(service);
                        (AvailabilityOutcome::Failure(failure), "timeout")
                    }
                }
            }
            Err(e) => {
                warn!(service = %service, error = %e, "Cannot check account");
                (AvailabilityOutcome::Failure(e.to_failure(service)), "failure")
            }
        };

        ACCOUNT_LOOKUP_DURATION
            .with_label_values(&[service.as_str()])
            .observe(start.elapsed().as_secs_f64());
        ACCOUNT_LOOKUPS
            .with_label_values(&[service.as_str(), label])
            .inc();

        outcome
    }

    /// Usenet path: the index already reports cache state; one descriptor
    /// per NZB on the implicit account.
    fn provider_reported(
        &self,
        sources: &[CandidateSource],
        id: &ParsedId,
        user: &UserConfig,
        service: ServiceId,
    ) -> Result<Vec<StreamDescriptor>, OrchestratorError> {
        let credential = user.credential_for(service);
        let mut emitted = HashSet::new();
        let mut streams = Vec::new();

        for source in sources {
            if !emitted.insert(source.content_id.as_str()) {
                continue;
            }
            let file = ResolvedFile {
                source_id: source.content_id.clone(),
                filename: source.title.clone(),
                size_bytes: source.size_bytes.unwrap_or(0),
                file_index: None,
                account: AccountRef {
                    service,
                    cached: source.cached.unwrap_or(false),
                },
            };
            streams.push(self.assembler.assemble(source, &file, credential, id, None)?);
        }

        Ok(streams)
    }
}

/// Group files by source id, keeping account order; collect failures once each.
fn merge_outcomes(
    outcomes: Vec<AvailabilityOutcome>,
) -> (HashMap<String, Vec<ResolvedFile>>, Vec<AccountFailure>) {
    let mut files_by_source: HashMap<String, Vec<ResolvedFile>> = HashMap::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            AvailabilityOutcome::Files(files) => {
                for file in files {
                    files_by_source
                        .entry(file.source_id.clone())
                        .or_default()
                        .push(file);
                }
            }
            AvailabilityOutcome::Failure(failure) => failures.push(failure),
        }
    }

    (files_by_source, failures)
}
