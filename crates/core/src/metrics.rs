//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Shared caches (hits and misses per namespace)
//! - Search index fetches
//! - Per-account availability lookups
//! - Title metadata enrichment

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by namespace and result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("streamscout_cache_lookups_total", "Total cache lookups"),
        &["namespace", "result"], // "sources"/"metadata", "hit"/"miss"
    )
    .unwrap()
});

// =============================================================================
// Search Index Metrics
// =============================================================================

/// Search index fetches by source kind and status.
pub static PROVIDER_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "streamscout_provider_fetches_total",
            "Total search index fetches",
        ),
        &["kind", "status"], // "success", "auth_error", "error"
    )
    .unwrap()
});

/// Search index fetch duration in seconds.
pub static PROVIDER_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "streamscout_provider_fetch_duration_seconds",
            "Duration of search index fetches",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Account Lookup Metrics
// =============================================================================

/// Availability lookups by service and outcome.
pub static ACCOUNT_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "streamscout_account_lookups_total",
            "Total per-account availability lookups",
        ),
        &["service", "outcome"], // "files", "failure", "timeout"
    )
    .unwrap()
});

/// Availability lookup duration in seconds.
pub static ACCOUNT_LOOKUP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "streamscout_account_lookup_duration_seconds",
            "Duration of per-account availability lookups",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["service"],
    )
    .unwrap()
});

// =============================================================================
// Enrichment and Output Metrics
// =============================================================================

/// Metadata enrichment attempts by result.
pub static METADATA_ENRICHMENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "streamscout_metadata_enrichments_total",
            "Total season metadata enrichment attempts",
        ),
        &["result"], // "success", "error", "skipped"
    )
    .unwrap()
});

/// Stream descriptors returned by kind.
pub static STREAMS_RETURNED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "streamscout_streams_returned_total",
            "Total stream descriptors returned",
        ),
        &["kind"], // "torrent", "usenet", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(PROVIDER_FETCHES.clone()),
        Box::new(PROVIDER_FETCH_DURATION.clone()),
        Box::new(ACCOUNT_LOOKUPS.clone()),
        Box::new(ACCOUNT_LOOKUP_DURATION.clone()),
        Box::new(METADATA_ENRICHMENTS.clone()),
        Box::new(STREAMS_RETURNED.clone()),
    ]
}
