//! TorBox cache lookups.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::credential::Credential;

use super::types::{map_transport_error, ServiceId, StoreClient, StoreError, StoreFile};

const AUTH_ERROR_CODES: [&str; 3] = ["BAD_TOKEN", "AUTH_ERROR", "NO_AUTH"];

/// TorBox API client bound to one account.
pub struct TorboxClient {
    client: Client,
    base_url: String,
    token: Credential,
}

impl TorboxClient {
    pub fn new(client: Client, base_url: &str, token: Credential) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl StoreClient for TorboxClient {
    fn service(&self) -> ServiceId {
        ServiceId::Torbox
    }

    async fn check_cached(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<StoreFile>>, StoreError> {
        if hashes.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/v1/api/torrents/checkcached", self.base_url);
        debug!(hashes = hashes.len(), "TorBox checkcached");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("hash", hashes.join(",")),
                ("format", "list".to_string()),
                ("list_files", "true".to_string()),
            ])
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        let envelope: Option<TorboxEnvelope> = serde_json::from_str(&body).ok();

        let code = envelope.as_ref().and_then(|e| e.error.clone());
        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || code
                .as_deref()
                .is_some_and(|c| AUTH_ERROR_CODES.contains(&c))
        {
            return Err(StoreError::InvalidCredentials);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(StoreError::RateLimited);
        }
        if status.is_server_error() {
            return Err(StoreError::Unavailable(status.as_u16()));
        }

        let envelope = match envelope {
            Some(e) if status.is_success() && e.success != Some(false) => e,
            Some(e) => {
                return Err(StoreError::Api {
                    status: status.as_u16(),
                    message: e
                        .detail
                        .or(code)
                        .unwrap_or_else(|| "Unknown error".to_string()),
                })
            }
            None if !status.is_success() => {
                return Err(StoreError::Api {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                })
            }
            None => {
                return Err(StoreError::Parse(format!(
                    "Unexpected body: {}",
                    body.chars().take(200).collect::<String>()
                )))
            }
        };

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|item| {
                let files = item
                    .files
                    .into_iter()
                    .enumerate()
                    .map(|(i, f)| StoreFile {
                        index: Some(i as u32),
                        name: f.name,
                        size: f.size,
                    })
                    .collect();
                (item.hash.to_lowercase(), files)
            })
            .collect())
    }
}

// TorBox response types

#[derive(Debug, Deserialize)]
struct TorboxEnvelope {
    success: Option<bool>,
    error: Option<String>,
    detail: Option<String>,
    data: Option<Vec<TorboxCachedItem>>,
}

#[derive(Debug, Deserialize)]
struct TorboxCachedItem {
    hash: String,
    #[serde(default)]
    files: Vec<TorboxFile>,
}

#[derive(Debug, Deserialize)]
struct TorboxFile {
    name: String,
    #[serde(default)]
    size: u64,
}
