//! Types for the search orchestrator.

use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine,
};
use serde::Deserialize;
use thiserror::Error;

use crate::credential::Credential;
use crate::debrid::{AccountCredential, ServiceId};
use crate::search_api::{SearchApiError, SourceKind};
use crate::stream::TokenError;

/// Errors that fail a whole stream request.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The search index failed for a reason other than credentials.
    #[error("{kind} search failed: {source}")]
    Provider {
        kind: SourceKind,
        #[source]
        source: SearchApiError,
    },

    /// A resolution token could not be encoded.
    #[error("token encoding failed: {0}")]
    Token(#[from] TokenError),
}

/// Errors decoding the user config path segment.
#[derive(Debug, Error)]
pub enum UserConfigError {
    #[error("user config is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("user config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("user config has no search API key")]
    MissingApiKey,
}

/// Per-user settings carried in every request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub search_api_key: Credential,
    #[serde(default)]
    pub accounts: Vec<AccountCredential>,
    #[serde(default)]
    pub search_user_engines: bool,
    #[serde(default)]
    pub tmdb_access_token: Option<Credential>,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceKind>,
}

fn default_sources() -> Vec<SourceKind> {
    vec![SourceKind::Torrent]
}

impl UserConfig {
    pub fn new(search_api_key: impl Into<Credential>) -> Self {
        Self {
            search_api_key: search_api_key.into(),
            accounts: Vec::new(),
            search_user_engines: false,
            tmdb_access_token: None,
            sources: default_sources(),
        }
    }

    /// Decode the base64 JSON path segment. Accepts URL-safe or standard
    /// alphabets, padded or not.
    pub fn from_encoded(encoded: &str) -> Result<Self, UserConfigError> {
        let trimmed = encoded.trim().trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(trimmed)
            .or_else(|_| STANDARD_NO_PAD.decode(trimmed))?;
        let config: UserConfig = serde_json::from_slice(&bytes)?;
        if config.search_api_key.is_empty() {
            return Err(UserConfigError::MissingApiKey);
        }
        Ok(config)
    }

    /// Requested kinds, de-duplicated, torrents first.
    pub fn source_kinds(&self) -> Vec<SourceKind> {
        [SourceKind::Torrent, SourceKind::Usenet]
            .into_iter()
            .filter(|k| self.sources.contains(k))
            .collect()
    }

    /// First configured credential for `service`.
    pub fn credential_for(&self, service: ServiceId) -> Option<&Credential> {
        self.accounts
            .iter()
            .find(|a| a.service == service)
            .map(|a| &a.credential)
    }
}

/// How availability is established for a source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityStrategy {
    /// Ask every configured account, concurrently.
    AccountFanOut,
    /// Trust the index's own cache flag, attributed to one implicit account.
    ProviderReported(ServiceId),
}

impl AvailabilityStrategy {
    pub fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Torrent => AvailabilityStrategy::AccountFanOut,
            SourceKind::Usenet => AvailabilityStrategy::ProviderReported(ServiceId::Torbox),
        }
    }
}
