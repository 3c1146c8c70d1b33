//! Mock storage accounts for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::debrid::{
    AccountCredential, ServiceId, StoreClient, StoreClientFactory, StoreError, StoreFile,
};

/// Mock implementation of the StoreClient trait.
///
/// Provides controllable behavior for testing:
/// - Configure which hashes are cached and their file lists
/// - Record every `check_cached` batch
/// - Simulate one-shot or persistent failures and slow responses
pub struct MockStoreClient {
    service: ServiceId,
    /// Cached items by lowercase hash.
    cached: Arc<RwLock<HashMap<String, Vec<StoreFile>>>>,
    /// Recorded batches.
    batches: Arc<RwLock<Vec<Vec<String>>>>,
    /// If set, the next call fails with this error.
    next_error: Arc<RwLock<Option<StoreError>>>,
    /// If set, every call fails with this error.
    error: Arc<RwLock<Option<StoreError>>>,
    /// Artificial latency per call.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl std::fmt::Debug for MockStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStoreClient")
            .field("service", &self.service)
            .field("cached", &"<cached>")
            .finish()
    }
}

impl MockStoreClient {
    /// Create a mock account with nothing cached.
    pub fn new(service: ServiceId) -> Self {
        Self {
            service,
            cached: Arc::new(RwLock::new(HashMap::new())),
            batches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Mark a hash as cached with the given files.
    pub async fn add_cached(&self, hash: &str, files: Vec<StoreFile>) {
        self.cached.write().await.insert(hash.to_lowercase(), files);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: StoreError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every call with the given error.
    pub async fn set_error(&self, error: StoreError) {
        *self.error.write().await = Some(error);
    }

    /// Delay every call by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get recorded batches.
    pub async fn recorded_batches(&self) -> Vec<Vec<String>> {
        self.batches.read().await.clone()
    }

    /// Number of `check_cached` calls.
    pub async fn check_count(&self) -> usize {
        self.batches.read().await.len()
    }
}

#[async_trait]
impl StoreClient for MockStoreClient {
    fn service(&self) -> ServiceId {
        self.service
    }

    async fn check_cached(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<StoreFile>>, StoreError> {
        self.batches.write().await.push(hashes.to_vec());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(err) = self.error.read().await.clone() {
            return Err(err);
        }

        let cached = self.cached.read().await;
        Ok(hashes
            .iter()
            .filter_map(|h| {
                let key = h.to_lowercase();
                cached.get(&key).map(|files| (key, files.clone()))
            })
            .collect())
    }
}

/// Hands out registered mock clients by credential.
///
/// Credentials without a registered client fail with
/// [`StoreError::Unsupported`], like services without a native client.
#[derive(Default)]
pub struct MockStoreFactory {
    clients: HashMap<String, Arc<MockStoreClient>>,
    created: AtomicUsize,
}

impl MockStoreFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the client returned for `credential`.
    pub fn with_client(mut self, credential: &str, client: Arc<MockStoreClient>) -> Self {
        self.clients.insert(credential.to_string(), client);
        self
    }

    /// Number of clients created.
    pub fn create_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl StoreClientFactory for MockStoreFactory {
    fn create(&self, account: &AccountCredential) -> Result<Arc<dyn StoreClient>, StoreError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        match self.clients.get(account.credential.expose()) {
            Some(client) => Ok(client.clone()),
            None => Err(StoreError::Unsupported(account.service)),
        }
    }
}
