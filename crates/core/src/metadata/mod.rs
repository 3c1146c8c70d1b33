//! Title metadata used to number episodes across seasons.
//!
//! The search index supplies title aliases inline; season/episode counts come
//! from TMDB and only matter for id families whose numbering is absolute.

mod episode;
mod tmdb;

pub use episode::absolute_episode;
pub use tmdb::TmdbClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::Credential;

/// Cached per `(id type, id)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleMetadata {
    /// Known titles, de-duplicated, first-seen order.
    pub titles: Vec<String>,
    /// Regular and special seasons in ascending order, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasons: Option<Vec<SeasonInfo>>,
}

impl TitleMetadata {
    pub fn new(titles: impl IntoIterator<Item = String>, seasons: Option<Vec<SeasonInfo>>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for title in titles {
            if !unique.contains(&title) {
                unique.push(title);
            }
        }
        Self {
            titles: unique,
            seasons,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonInfo {
    pub number: u32,
    pub episode_count: u32,
}

/// Errors that can occur when fetching season data.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// No usable access token.
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Source of season/episode counts for a series.
#[async_trait]
pub trait SeasonMetadataProvider: Send + Sync {
    /// Seasons of a TMDB series, ascending by number.
    ///
    /// `access_token` overrides the provider's default token when set.
    async fn series_seasons(
        &self,
        tmdb_id: u32,
        access_token: Option<&Credential>,
    ) -> Result<Vec<SeasonInfo>, MetadataError>;
}
