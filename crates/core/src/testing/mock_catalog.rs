//! Mock catalog source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, CatalogRequest, CatalogSource, RawMovieRecord, RawSearchPage};

/// Mock implementation of the CatalogSource trait.
///
/// Every request is answered with the configured page, whatever its
/// filters, and recorded for later assertions.
///
/// # Example
///
/// ```rust,ignore
/// let source = Arc::new(MockCatalogSource::new());
/// source.set_page(45, vec![fixtures::movie_record("Heat", "1995", &["1080p"])]).await;
///
/// let client = CatalogSearchClient::new(source.clone(), &CatalogConfig::default());
/// client.search(&query).await?;
///
/// assert_eq!(source.recorded_requests().await[0].page, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockCatalogSource {
    total: Arc<RwLock<u64>>,
    records: Arc<RwLock<Vec<RawMovieRecord>>>,
    requests: Arc<RwLock<Vec<CatalogRequest>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page returned for every subsequent request.
    pub async fn set_page(&self, total: u64, records: Vec<RawMovieRecord>) {
        *self.total.write().await = total;
        *self.records.write().await = records;
    }

    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_requests(&self) -> Vec<CatalogRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_search_page(
        &self,
        request: &CatalogRequest,
    ) -> Result<RawSearchPage, CatalogError> {
        self.requests.write().await.push(request.clone());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(RawSearchPage {
            total: *self.total.read().await,
            records: self.records.read().await.clone(),
        })
    }
}
