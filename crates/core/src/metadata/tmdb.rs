//! TMDB season lookup.
//!
//! Only `GET /tv/{id}` is used; the season summaries carry episode counts,
//! which is all absolute numbering needs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::TmdbConfig;
use crate::credential::Credential;

use super::{MetadataError, SeasonInfo, SeasonMetadataProvider};

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    default_token: Option<Credential>,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_token: config
                .access_token
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(Credential::new),
        })
    }
}

#[async_trait]
impl SeasonMetadataProvider for TmdbClient {
    async fn series_seasons(
        &self,
        tmdb_id: u32,
        access_token: Option<&Credential>,
    ) -> Result<Vec<SeasonInfo>, MetadataError> {
        let token = access_token
            .filter(|t| !t.is_empty())
            .or(self.default_token.as_ref())
            .ok_or_else(|| {
                MetadataError::NotConfigured("TMDB access token is required".to_string())
            })?;

        let url = format!("{}/tv/{}", self.base_url, tmdb_id);

        debug!("TMDB get series: id={}", tmdb_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(MetadataError::NotConfigured(
                "Invalid TMDB access token".to_string(),
            ));
        }
        if status == 404 {
            return Err(MetadataError::NotFound(format!("TV series ID {}", tmdb_id)));
        }
        if status == 429 {
            return Err(MetadataError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let details: TmdbTvDetails = response.json().await.map_err(|e| {
            MetadataError::ParseError(format!("Failed to parse TV response: {}", e))
        })?;

        let mut seasons: Vec<SeasonInfo> = details.seasons.into_iter().map(Into::into).collect();
        seasons.sort_by_key(|s| s.number);
        Ok(seasons)
    }
}

// TMDB response types

#[derive(Debug, Deserialize)]
struct TmdbTvDetails {
    #[serde(default)]
    seasons: Vec<TmdbSeasonSummary>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonSummary {
    season_number: u32,
    #[serde(default)]
    episode_count: Option<u32>,
}

impl From<TmdbSeasonSummary> for SeasonInfo {
    fn from(s: TmdbSeasonSummary) -> Self {
        Self {
            number: s.season_number,
            episode_count: s.episode_count.unwrap_or(0),
        }
    }
}
