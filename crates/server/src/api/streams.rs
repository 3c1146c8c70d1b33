//! Addon stream endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use streamscout_core::debrid::AccountFailure;
use streamscout_core::search_api::ParsedId;
use streamscout_core::{StreamDescriptor, UserConfig};

use crate::metrics::STREAM_REQUEST_REJECTIONS;
use crate::state::AppState;

/// Shown when the path segment does not decode to a usable config.
pub const CONFIGURE_FIRST: &str = "Please configure the addon first";

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamDescriptor>,
}

/// `GET /{user_config}/stream/{type}/{id}.json`
pub async fn get_streams(
    State(state): State<Arc<AppState>>,
    Path((user_config, kind, id)): Path<(String, String, String)>,
) -> Json<StreamsResponse> {
    let span = info_span!("stream_request", request_id = %Uuid::new_v4(), kind = %kind);
    let streams = resolve_streams(&state, &user_config, &id)
        .instrument(span)
        .await;
    Json(StreamsResponse { streams })
}

async fn resolve_streams(
    state: &AppState,
    user_config: &str,
    raw_id: &str,
) -> Vec<StreamDescriptor> {
    let orchestrator = state.orchestrator();

    let user = match UserConfig::from_encoded(user_config) {
        Ok(user) => user,
        Err(e) => {
            debug!(error = %e, "Rejected user config");
            STREAM_REQUEST_REJECTIONS
                .with_label_values(&["config"])
                .inc();
            return vec![orchestrator.assembler().error_stream(&AccountFailure {
                title: String::new(),
                description: CONFIGURE_FIRST.to_string(),
            })];
        }
    };

    let raw_id = raw_id.strip_suffix(".json").unwrap_or(raw_id);
    let id = match ParsedId::parse(raw_id) {
        Ok(id) => id,
        Err(e) => {
            debug!(id = %raw_id, error = %e, "Unsupported id");
            STREAM_REQUEST_REJECTIONS.with_label_values(&["id"]).inc();
            return Vec::new();
        }
    };

    match orchestrator.get_streams(&id, &user).await {
        Ok(streams) => {
            info!(id = %id, count = streams.len(), "Returning streams");
            streams
        }
        Err(e) => {
            warn!(id = %id, error = %e, "Stream search failed");
            vec![orchestrator.assembler().error_stream(&AccountFailure {
                title: String::new(),
                description: e.to_string(),
            })]
        }
    }
}
