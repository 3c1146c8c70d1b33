//! Premiumize cache lookups.
//!
//! `/api/cache/check` answers with parallel arrays indexed like the
//! request's `items[]`; a cached item is reported as one file.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::credential::Credential;

use super::types::{map_transport_error, ServiceId, StoreClient, StoreError, StoreFile};

/// Premiumize API client bound to one account.
pub struct PremiumizeClient {
    client: Client,
    base_url: String,
    api_key: Credential,
}

impl PremiumizeClient {
    pub fn new(client: Client, base_url: &str, api_key: Credential) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl StoreClient for PremiumizeClient {
    fn service(&self) -> ServiceId {
        ServiceId::Premiumize
    }

    async fn check_cached(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<StoreFile>>, StoreError> {
        if hashes.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/api/cache/check", self.base_url);
        debug!(hashes = hashes.len(), "Premiumize cache check");

        let mut params: Vec<(&str, &str)> = vec![("apikey", self.api_key.expose())];
        params.extend(hashes.iter().map(|h| ("items[]", h.as_str())));

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::InvalidCredentials);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(StoreError::RateLimited);
        }
        if status.is_server_error() {
            return Err(StoreError::Unavailable(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let check: CacheCheckResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(format!("Failed to parse cache check: {}", e)))?;

        if check.status != "success" {
            let message = check.message.unwrap_or_else(|| "Unknown error".to_string());
            let lower = message.to_lowercase();
            if lower.contains("logged in") || lower.contains("apikey") || lower.contains("auth") {
                return Err(StoreError::InvalidCredentials);
            }
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut found = HashMap::new();
        for (i, hash) in hashes.iter().enumerate() {
            if !check.response.get(i).copied().unwrap_or(false) {
                continue;
            }
            let name = check
                .filename
                .get(i)
                .cloned()
                .flatten()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| hash.clone());
            let size = check
                .filesize
                .get(i)
                .and_then(|s| s.as_ref())
                .and_then(FileSize::as_u64)
                .unwrap_or(0);
            found.insert(
                hash.to_lowercase(),
                vec![StoreFile {
                    index: None,
                    name,
                    size,
                }],
            );
        }
        Ok(found)
    }
}

// Premiumize response types

#[derive(Debug, Deserialize)]
struct CacheCheckResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    response: Vec<bool>,
    #[serde(default)]
    filename: Vec<Option<String>>,
    #[serde(default)]
    filesize: Vec<Option<FileSize>>,
}

/// Sizes arrive as numbers or numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileSize {
    Number(u64),
    Text(String),
}

impl FileSize {
    fn as_u64(&self) -> Option<u64> {
        match self {
            FileSize::Number(n) => Some(*n),
            FileSize::Text(s) => s.parse().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::RawQuery, routing::get, Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn cache_check(RawQuery(query): RawQuery) -> Json<Value> {
        let query = query.unwrap_or_default();
        if !query.contains("apikey=pm-key") {
            return Json(json!({"status": "error", "message": "Not logged in."}));
        }
        Json(json!({
            "status": "success",
            "response": [true, false],
            "transcoded": [false, false],
            "filename": ["Movie.2160p.mkv", null],
            "filesize": ["4096", null]
        }))
    }

    fn client(base: &str, key: &str) -> PremiumizeClient {
        PremiumizeClient::new(Client::new(), base, Credential::new(key))
    }

    #[tokio::test]
    async fn test_check_cached() {
        let base = serve(Router::new().route("/api/cache/check", get(cache_check))).await;

        let found = client(&base, "pm-key")
            .check_cached(&["AAA".to_string(), "bbb".to_string()])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        let files = &found["aaa"];
        assert_eq!(files[0].name, "Movie.2160p.mkv");
        assert_eq!(files[0].size, 4096);
        assert_eq!(files[0].index, None);
    }

    #[tokio::test]
    async fn test_not_logged_in() {
        let base = serve(Router::new().route("/api/cache/check", get(cache_check))).await;

        let err = client(&base, "wrong")
            .check_cached(&["aaa".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_server_error_is_account_level() {
        let router = Router::new().route(
            "/api/cache/check",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = serve(router).await;

        let err = client(&base, "pm-key")
            .check_cached(&["aaa".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(502)));
        assert!(err.is_account_level());
    }

    #[test]
    fn test_file_size_forms() {
        let sizes: Vec<FileSize> = serde_json::from_str(r#"[12, "34", "x"]"#).unwrap();
        assert_eq!(sizes[0].as_u64(), Some(12));
        assert_eq!(sizes[1].as_u64(), Some(34));
        assert_eq!(sizes[2].as_u64(), None);
    }
}
