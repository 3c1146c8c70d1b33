//! Provider client for the external search index.
//!
//! The `SourceSearcher` trait converts a title id into normalized
//! `CandidateSource` records. Credential rejection is reported as
//! `SearchApiError::Auth` so callers can short-circuit to a user-visible
//! message instead of failing the request.

mod client;
mod id;
mod types;

pub use client::SearchApiClient;
pub use id::IdParseError;
pub use types::*;
