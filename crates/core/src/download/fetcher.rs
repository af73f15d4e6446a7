use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{DescriptorFetcher, DownloadError};

/// Fetches descriptors over HTTP(S).
pub struct HttpDescriptorFetcher {
    client: Client,
}

impl HttpDescriptorFetcher {
    pub fn new(timeout_secs: u32) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs as u64))
            .build()
            .map_err(|e| DownloadError::DescriptorFetch(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DescriptorFetcher for HttpDescriptorFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, DownloadError> {
        debug!(locator, "Fetching descriptor");
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| DownloadError::DescriptorFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DownloadError::DescriptorFetch(format!(
                "HTTP {} for {}",
                response.status(),
                locator
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::DescriptorFetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
