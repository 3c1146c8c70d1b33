//! Types for the external search index.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::Credential;

/// Kind of a playable source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Torrent,
    Usenet,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Torrent => "torrent",
            SourceKind::Usenet => "usenet",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier namespace understood by the search index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IdType {
    #[serde(rename = "imdb_id")]
    Imdb,
    #[serde(rename = "tmdb_id")]
    Tmdb,
    #[serde(rename = "tvdb_id")]
    Tvdb,
    #[serde(rename = "kitsu_id")]
    Kitsu,
    #[serde(rename = "mal_id")]
    Mal,
    #[serde(rename = "anilist_id")]
    Anilist,
    #[serde(rename = "anidb_id")]
    Anidb,
}

impl IdType {
    /// Id families whose episode numbering does not follow TMDB seasons.
    pub const ANIME: [IdType; 4] = [IdType::Kitsu, IdType::Mal, IdType::Anilist, IdType::Anidb];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Imdb => "imdb_id",
            IdType::Tmdb => "tmdb_id",
            IdType::Tvdb => "tvdb_id",
            IdType::Kitsu => "kitsu_id",
            IdType::Mal => "mal_id",
            IdType::Anilist => "anilist_id",
            IdType::Anidb => "anidb_id",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A title identifier with optional episode coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedId {
    pub id_type: IdType,
    pub id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ParsedId {
    pub fn new(id_type: IdType, id: impl Into<String>) -> Self {
        Self {
            id_type,
            id: id.into(),
            season: None,
            episode: None,
        }
    }

    pub fn with_episode(mut self, season: Option<u32>, episode: u32) -> Self {
        self.season = season;
        self.episode = Some(episode);
        self
    }
}

impl fmt::Display for ParsedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_type, self.id)?;
        match (self.season, self.episode) {
            (Some(s), Some(e)) => write!(f, " S{:02}E{:02}", s, e),
            (None, Some(e)) => write!(f, " E{:02}", e),
            _ => Ok(()),
        }
    }
}

/// A torrent or usenet item returned by search, not yet confirmed playable.
///
/// Identity is `content_id`: the lowercase info hash for torrents, the
/// provider's NZB hash for usenet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateSource {
    pub content_id: String,
    pub title: String,
    pub kind: SourceKind,
    /// NZB download link (usenet only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nzb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeders: Option<u32>,
    /// Age as reported by the provider, e.g. "12d".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<String>,
    /// Provider-reported cache state (usenet `check_cache`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    /// Came from the user's own search engines; never shared across requests.
    #[serde(default)]
    pub user_submitted: bool,
}

/// Title metadata returned inline by the search index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderMetadata {
    pub tmdb_id: Option<u32>,
    pub titles: Vec<String>,
}

/// Query for one source kind of one title.
#[derive(Debug, Clone)]
pub struct SourceQuery {
    pub kind: SourceKind,
    pub id: ParsedId,
    pub search_user_engines: bool,
    pub api_key: Credential,
}

/// Candidates plus any inline metadata.
#[derive(Debug, Clone, Default)]
pub struct SourceSearchResult {
    pub sources: Vec<CandidateSource>,
    pub metadata: Option<ProviderMetadata>,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchApiError {
    /// The search index rejected the user's key. Not transient.
    #[error("Search API rejected credentials: {0}")]
    Auth(String),

    #[error("Search API error {code}: {message}")]
    Provider { code: String, message: String },

    #[error("Search API connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search API request timeout")]
    Timeout,

    #[error("Failed to parse search response: {0}")]
    Parse(String),
}

impl SearchApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, SearchApiError::Auth(_))
    }
}

/// Trait for the external search index.
#[async_trait]
pub trait SourceSearcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Fetch candidates for a title. Always hits the network.
    async fn fetch_sources(&self, query: &SourceQuery)
        -> Result<SourceSearchResult, SearchApiError>;
}
