//! HTTP client for the external search index.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::SearchApiConfig;

use super::types::{
    CandidateSource, ProviderMetadata, SearchApiError, SourceKind, SourceQuery,
    SourceSearchResult, SourceSearcher,
};

/// Error codes the index uses for rejected keys.
const AUTH_ERROR_CODES: [&str; 2] = ["BAD_TOKEN", "AUTH_ERROR"];

/// Search index client.
pub struct SearchApiClient {
    client: Client,
    base_url: String,
}

impl SearchApiClient {
    pub fn new(config: &SearchApiConfig) -> Result<Self, SearchApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchApiError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the lookup URL for a query.
    fn build_url(&self, query: &SourceQuery) -> String {
        let collection = match query.kind {
            SourceKind::Torrent => "torrents",
            SourceKind::Usenet => "usenet",
        };
        format!(
            "{}/{}/{}:{}",
            self.base_url,
            collection,
            query.id.id_type,
            urlencoding::encode(&query.id.id)
        )
    }

    fn build_params(query: &SourceQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![(
            "search_user_engines",
            query.search_user_engines.to_string(),
        )];
        if let Some(season) = query.id.season {
            params.push(("season", season.to_string()));
        }
        if let Some(episode) = query.id.episode {
            params.push(("episode", episode.to_string()));
        }
        match query.kind {
            SourceKind::Torrent => params.push(("metadata", "true".to_string())),
            SourceKind::Usenet => params.push(("check_cache", "true".to_string())),
        }
        params
    }
}

#[async_trait]
impl SourceSearcher for SearchApiClient {
    fn name(&self) -> &str {
        "search-api"
    }

    async fn fetch_sources(
        &self,
        query: &SourceQuery,
    ) -> Result<SourceSearchResult, SearchApiError> {
        let start = Instant::now();
        let url = self.build_url(query);
        debug!(kind = %query.kind, id = %query.id, "Querying search API");

        let response = self
            .client
            .get(&url)
            .query(&Self::build_params(query))
            .bearer_auth(query.api_key.expose())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        let envelope: Option<SearchApiEnvelope> = serde_json::from_str(&body).ok();

        if let Some(error) = classify_failure(status, envelope.as_ref(), &body) {
            return Err(error);
        }

        let envelope = envelope.ok_or_else(|| {
            SearchApiError::Parse(format!(
                "Unexpected body: {}",
                body.chars().take(200).collect::<String>()
            ))
        })?;
        let data = envelope.data.unwrap_or_default();

        let raw = match query.kind {
            SourceKind::Torrent => data.torrents,
            SourceKind::Usenet => data.nzbs,
        };
        let sources: Vec<CandidateSource> = raw
            .into_iter()
            .filter_map(|r| r.into_candidate(query.kind))
            .collect();

        debug!(
            kind = %query.kind,
            id = %query.id,
            results = sources.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search API query complete"
        );

        Ok(SourceSearchResult {
            sources,
            metadata: data.metadata.map(ProviderMetadata::from),
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> SearchApiError {
    if e.is_timeout() {
        SearchApiError::Timeout
    } else if e.is_connect() {
        SearchApiError::ConnectionFailed(e.to_string())
    } else {
        SearchApiError::Provider {
            code: "REQUEST_FAILED".to_string(),
            message: e.to_string(),
        }
    }
}

/// Map a non-success response to the error taxonomy.
fn classify_failure(
    status: StatusCode,
    envelope: Option<&SearchApiEnvelope>,
    body: &str,
) -> Option<SearchApiError> {
    let code = envelope.and_then(|e| e.error.clone());
    let detail = envelope
        .and_then(|e| e.detail.clone())
        .unwrap_or_else(|| body.chars().take(200).collect());

    let is_auth_code = code
        .as_deref()
        .is_some_and(|c| AUTH_ERROR_CODES.contains(&c));
    if is_auth_code || status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Some(SearchApiError::Auth(detail));
    }

    let reported_failure = envelope.is_some_and(|e| e.success == Some(false));
    if !status.is_success() || reported_failure {
        return Some(SearchApiError::Provider {
            code: code.unwrap_or_else(|| format!("HTTP_{}", status.as_u16())),
            message: detail,
        });
    }

    None
}

// Search API response types
#[derive(Debug, Deserialize)]
struct SearchApiEnvelope {
    success: Option<bool>,
    error: Option<String>,
    detail: Option<String>,
    data: Option<SearchApiData>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchApiData {
    #[serde(default)]
    torrents: Vec<RawSource>,
    #[serde(default)]
    nzbs: Vec<RawSource>,
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    hash: Option<String>,
    raw_title: Option<String>,
    title: Option<String>,
    size: Option<u64>,
    last_known_seeders: Option<i64>,
    age: Option<String>,
    tracker: Option<String>,
    cached: Option<bool>,
    #[serde(default)]
    user_search: bool,
    nzb: Option<String>,
}

impl RawSource {
    fn into_candidate(self, kind: SourceKind) -> Option<CandidateSource> {
        let hash = self.hash.filter(|h| !h.is_empty())?;
        let content_id = match kind {
            SourceKind::Torrent => hash.to_lowercase(),
            SourceKind::Usenet => hash,
        };
        let title = self
            .raw_title
            .or(self.title)
            .unwrap_or_else(|| content_id.clone());

        Some(CandidateSource {
            content_id,
            title,
            kind,
            nzb_url: self.nzb,
            size_bytes: self.size,
            seeders: self
                .last_known_seeders
                .filter(|s| *s >= 0)
                .map(|s| s.min(u32::MAX as i64) as u32),
            age: self.age,
            indexer: self.tracker,
            cached: self.cached,
            user_submitted: self.user_search,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    tmdb_id: Option<serde_json::Value>,
    #[serde(default)]
    titles: Vec<String>,
}

impl From<RawMetadata> for ProviderMetadata {
    fn from(raw: RawMetadata) -> Self {
        let tmdb_id = match raw.tmdb_id {
            Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        };
        Self {
            tmdb_id,
            titles: raw.titles,
        }
    }
}
