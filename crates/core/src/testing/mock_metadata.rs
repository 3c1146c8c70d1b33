//! Mock season metadata provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::credential::Credential;
use crate::metadata::{MetadataError, SeasonInfo, SeasonMetadataProvider};

/// A recorded season lookup.
#[derive(Debug, Clone)]
pub struct RecordedLookup {
    pub tmdb_id: u32,
    pub access_token: Option<Credential>,
}

/// Mock implementation of the SeasonMetadataProvider trait.
///
/// Unknown ids fail with [`MetadataError::NotFound`].
#[derive(Debug, Default)]
pub struct MockMetadataProvider {
    seasons: Arc<RwLock<HashMap<u32, Vec<SeasonInfo>>>>,
    lookups: Arc<RwLock<Vec<RecordedLookup>>>,
    next_error: Arc<RwLock<Option<MetadataError>>>,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seasons returned for a TMDB id.
    pub async fn set_seasons(&self, tmdb_id: u32, seasons: Vec<SeasonInfo>) {
        self.seasons.write().await.insert(tmdb_id, seasons);
    }

    /// Configure the next lookup to fail with the given error.
    pub async fn set_next_error(&self, error: MetadataError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get recorded lookups.
    pub async fn recorded_lookups(&self) -> Vec<RecordedLookup> {
        self.lookups.read().await.clone()
    }

    pub async fn lookup_count(&self) -> usize {
        self.lookups.read().await.len()
    }
}

#[async_trait]
impl SeasonMetadataProvider for MockMetadataProvider {
    async fn series_seasons(
        &self,
        tmdb_id: u32,
        access_token: Option<&Credential>,
    ) -> Result<Vec<SeasonInfo>, MetadataError> {
        self.lookups.write().await.push(RecordedLookup {
            tmdb_id,
            access_token: access_token.cloned(),
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.seasons
            .read()
            .await
            .get(&tmdb_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(format!("TV series ID {}", tmdb_id)))
    }
}
