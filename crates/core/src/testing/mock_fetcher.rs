//! Mock descriptor fetcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::download::{DescriptorFetcher, DownloadError};

/// Mock implementation of the DescriptorFetcher trait.
///
/// Answers every locator with the configured bytes. Without any configured
/// bytes fetches fail, as an unreachable host would.
#[derive(Debug, Default)]
pub struct MockDescriptorFetcher {
    descriptor: Arc<RwLock<Option<Vec<u8>>>>,
    locators: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<DownloadError>>>,
}

impl MockDescriptorFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher that serves `bytes` for every locator.
    pub fn serving(bytes: Vec<u8>) -> Self {
        Self {
            descriptor: Arc::new(RwLock::new(Some(bytes))),
            ..Self::default()
        }
    }

    pub async fn set_descriptor(&self, bytes: Vec<u8>) {
        *self.descriptor.write().await = Some(bytes);
    }

    pub async fn set_next_error(&self, error: DownloadError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn fetched_locators(&self) -> Vec<String> {
        self.locators.read().await.clone()
    }
}

#[async_trait]
impl DescriptorFetcher for MockDescriptorFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, DownloadError> {
        self.locators.write().await.push(locator.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        self.descriptor
            .read()
            .await
            .clone()
            .ok_or_else(|| DownloadError::DescriptorFetch(format!("{}: HTTP 404", locator)))
    }
}
