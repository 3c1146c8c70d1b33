//! Builds native store clients for user accounts.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::StoresConfig;

use super::premiumize::PremiumizeClient;
use super::torbox::TorboxClient;
use super::types::{
    AccountCredential, ServiceId, StoreClient, StoreClientFactory, StoreError,
};

/// Creates HTTP clients for supported services, sharing one connection pool.
pub struct HttpStoreFactory {
    client: Client,
    config: StoresConfig,
}

impl HttpStoreFactory {
    pub fn new(config: &StoresConfig, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

impl StoreClientFactory for HttpStoreFactory {
    fn create(&self, account: &AccountCredential) -> Result<Arc<dyn StoreClient>, StoreError> {
        if account.credential.is_empty() {
            return Err(StoreError::InvalidCredentials);
        }
        match account.service {
            ServiceId::Torbox => Ok(Arc::new(TorboxClient::new(
                self.client.clone(),
                &self.config.torbox.base_url,
                account.credential.clone(),
            ))),
            ServiceId::Premiumize => Ok(Arc::new(PremiumizeClient::new(
                self.client.clone(),
                &self.config.premiumize.base_url,
                account.credential.clone(),
            ))),
            other => Err(StoreError::Unsupported(other)),
        }
    }
}
