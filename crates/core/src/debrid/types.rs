//! Types shared by store clients and the availability resolver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::Credential;
use crate::metadata::TitleMetadata;
use crate::search_api::ParsedId;

/// Storage/debrid services a user can attach.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    Torbox,
    Realdebrid,
    Alldebrid,
    Premiumize,
    Debridlink,
    Offcloud,
    Putio,
    Easydebrid,
    Pikpak,
    Seedr,
}

impl ServiceId {
    /// Wire id, as stored in user configs and resolution tokens.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Torbox => "torbox",
            ServiceId::Realdebrid => "realdebrid",
            ServiceId::Alldebrid => "alldebrid",
            ServiceId::Premiumize => "premiumize",
            ServiceId::Debridlink => "debridlink",
            ServiceId::Offcloud => "offcloud",
            ServiceId::Putio => "putio",
            ServiceId::Easydebrid => "easydebrid",
            ServiceId::Pikpak => "pikpak",
            ServiceId::Seedr => "seedr",
        }
    }

    /// Label shown in stream names.
    pub fn short_name(&self) -> &'static str {
        match self {
            ServiceId::Torbox => "TB",
            ServiceId::Realdebrid => "RD",
            ServiceId::Alldebrid => "AD",
            ServiceId::Premiumize => "PM",
            ServiceId::Debridlink => "DL",
            ServiceId::Offcloud => "OC",
            ServiceId::Putio => "P.IO",
            ServiceId::Easydebrid => "ED",
            ServiceId::Pikpak => "PKP",
            ServiceId::Seedr => "SDR",
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's credential for one service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountCredential {
    pub service: ServiceId,
    pub credential: Credential,
}

impl AccountCredential {
    pub fn new(service: ServiceId, credential: impl Into<Credential>) -> Self {
        Self {
            service,
            credential: credential.into(),
        }
    }
}

/// A file inside a cached item, as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFile {
    /// Position within the item; `None` for single-file listings.
    pub index: Option<u32>,
    /// Name, possibly with folder components.
    pub name: String,
    pub size: u64,
}

/// Account that resolved a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountRef {
    pub service: ServiceId,
    pub cached: bool,
}

/// A playable file of one candidate source on one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// `CandidateSource::content_id` this file belongs to.
    pub source_id: String,
    pub filename: String,
    pub size_bytes: u64,
    /// `None` for single-file sources and usenet.
    pub file_index: Option<u32>,
    pub account: AccountRef,
}

/// Display pair for an account that could not be checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountFailure {
    pub title: String,
    pub description: String,
}

/// Result of checking one account. Never a partial mix.
#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityOutcome {
    Files(Vec<ResolvedFile>),
    Failure(AccountFailure),
}

/// Request-scoped inputs for file matching.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub parsed_id: ParsedId,
    pub absolute_episode: Option<u32>,
    pub metadata: Option<TitleMetadata>,
}

impl ResolveContext {
    pub fn new(parsed_id: ParsedId) -> Self {
        Self {
            parsed_id,
            absolute_episode: None,
            metadata: None,
        }
    }
}

/// Errors from a store's native API.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Invalid/expired credentials")]
    InvalidCredentials,

    #[error("Rate limited, try again later")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// The service itself is failing (HTTP 5xx).
    #[error("Service unavailable (HTTP {0})")]
    Unavailable(u16),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Unsupported service: {0}")]
    Unsupported(ServiceId),
}

impl StoreError {
    /// Faults that invalidate every lookup on the account, not just one batch.
    pub fn is_account_level(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidCredentials
                | StoreError::RateLimited
                | StoreError::Network(_)
                | StoreError::Timeout
                | StoreError::Unavailable(_)
                | StoreError::Unsupported(_)
        )
    }

    pub fn to_failure(&self, service: ServiceId) -> AccountFailure {
        AccountFailure {
            title: service.short_name().to_string(),
            description: self.to_string(),
        }
    }
}

pub(crate) fn map_transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Network(e.to_string())
    }
}

/// Native API of one storage account.
#[async_trait]
pub trait StoreClient: Send + Sync {
    fn service(&self) -> ServiceId;

    /// Look up which hashes are cached. Uncached hashes are absent from
    /// the returned map.
    async fn check_cached(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<StoreFile>>, StoreError>;
}

/// Builds a client for an account.
pub trait StoreClientFactory: Send + Sync {
    fn create(&self, account: &AccountCredential) -> Result<Arc<dyn StoreClient>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_id_serialization() {
        assert_eq!(serde_json::to_string(&ServiceId::Torbox).unwrap(), "\"torbox\"");
        let parsed: ServiceId = serde_json::from_str("\"realdebrid\"").unwrap();
        assert_eq!(parsed, ServiceId::Realdebrid);
        assert_eq!(ServiceId::Putio.short_name(), "P.IO");
        assert_eq!(ServiceId::Premiumize.to_string(), "premiumize");
    }

    #[test]
    fn test_account_credential_deserialize() {
        let account: AccountCredential =
            serde_json::from_str(r#"{"service": "torbox", "credential": "secret"}"#).unwrap();
        assert_eq!(account.service, ServiceId::Torbox);
        assert_eq!(account.credential.expose(), "secret");
        assert!(!format!("{:?}", account).contains("secret"));
    }

    #[test]
    fn test_account_level_classification() {
        assert!(StoreError::InvalidCredentials.is_account_level());
        assert!(StoreError::Timeout.is_account_level());
        assert!(StoreError::Unavailable(503).is_account_level());
        assert!(StoreError::Unsupported(ServiceId::Seedr).is_account_level());
        assert!(!StoreError::Parse("bad".into()).is_account_level());
        assert!(!StoreError::Api {
            status: 400,
            message: "bad hash".into()
        }
        .is_account_level());
    }

    #[test]
    fn test_failure_uses_short_name() {
        let failure = StoreError::InvalidCredentials.to_failure(ServiceId::Realdebrid);
        assert_eq!(failure.title, "RD");
        assert_eq!(failure.description, "Invalid/expired credentials");
    }
}
