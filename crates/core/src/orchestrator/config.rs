//! Orchestrator configuration.

use std::time::Duration;

use crate::config::ResolverConfig;
use crate::debrid::ResolverSettings;
use crate::search_api::IdType;

/// Configuration for the search orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound for one account's availability lookup.
    /// An account that exceeds it is reported as a failure.
    pub account_lookup_timeout: Duration,

    /// Id types whose episodes are numbered without TMDB seasons.
    /// Season metadata is fetched for these when the index supplies a TMDB id.
    pub enrich_id_types: Vec<IdType>,

    /// Settings handed to every account resolver.
    pub resolver: ResolverSettings,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for OrchestratorConfig {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            account_lookup_timeout: config.lookup_timeout(),
            enrich_id_types: IdType::ANIME.to_vec(),
            resolver: ResolverSettings {
                batch_size: config.batch_size,
                include_uncached: config.include_uncached,
                min_match_confidence: config.min_match_confidence,
            },
        }
    }
}
