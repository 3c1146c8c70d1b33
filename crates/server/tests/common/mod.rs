//! Common test utilities for HTTP-level testing with mocks.
//!
//! This module builds the real router around an orchestrator whose
//! collaborators are all mocks, so requests run in-process without any
//! upstream service.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use streamscout_core::{
    debrid::ServiceId,
    testing::{MockSearcher, MockStoreClient, MockStoreFactory},
    Config, OrchestratorConfig, SearchCaches, SearchOrchestrator, StreamAssembler,
};

/// Re-export fixtures for test convenience
pub use streamscout_core::testing::fixtures;

pub const ADDON_NAME: &str = "StreamScout";

/// Test fixture wrapping the router and its mocks.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_movie_streams() {
///     let fixture = TestFixture::new();
///     fixture.searcher.set_sources(SourceKind::Torrent, vec![..]).await;
///
///     let response = fixture.get(&fixture.stream_path("movie", "tt0111161")).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock search index
    pub searcher: Arc<MockSearcher>,
    /// Mock TorBox account registered under `tb-token`
    pub torbox: Arc<MockStoreClient>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub fn new() -> Self {
        let searcher = Arc::new(MockSearcher::new());
        let torbox = Arc::new(MockStoreClient::new(ServiceId::Torbox));
        let stores = MockStoreFactory::new().with_client("tb-token", Arc::clone(&torbox));

        let config = Config::default();
        let orchestrator = SearchOrchestrator::new(
            Arc::clone(&searcher) as Arc<dyn streamscout_core::search_api::SourceSearcher>,
            Arc::new(stores),
            SearchCaches::with_ttls(Duration::from_secs(60), Duration::from_secs(60)),
            StreamAssembler::new("http://localhost:8080", ADDON_NAME),
            OrchestratorConfig::default(),
        );

        let state = Arc::new(streamscout_server::state::AppState::new(
            config,
            Arc::new(orchestrator),
        ));
        let router = streamscout_server::api::create_router(state);

        Self {
            router,
            searcher,
            torbox,
        }
    }

    /// Stream path for a user holding one TorBox account.
    pub fn stream_path(&self, kind: &str, id: &str) -> String {
        let user = serde_json::json!({
            "searchApiKey": "search-key",
            "accounts": [{ "service": "torbox", "credential": "tb-token" }],
        });
        format!("/{}/stream/{}/{}.json", encode_user_config(&user), kind, id)
    }

    /// Send a GET request to the router.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }
}

/// Encode a user config the way the configuration page does.
pub fn encode_user_config(user: &Value) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(user).unwrap())
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
