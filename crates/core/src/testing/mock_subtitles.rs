//! Mock subtitle source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::subtitles::{RawSubtitleRow, SubtitleError, SubtitleSource};

/// Mock implementation of the SubtitleSource trait.
///
/// Detail pages resolve to no download code unless one is configured with
/// [`MockSubtitleSource::set_download_code`].
#[derive(Debug, Default)]
pub struct MockSubtitleSource {
    rows: Arc<RwLock<Vec<RawSubtitleRow>>>,
    download_code: Arc<RwLock<Option<String>>>,
    archive: Arc<RwLock<Vec<u8>>>,
    /// `(language, year, slug)` of every listing request.
    lookups: Arc<RwLock<Vec<(String, String, String)>>>,
    archive_codes: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<SubtitleError>>>,
}

impl MockSubtitleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_rows(&self, rows: Vec<RawSubtitleRow>) {
        *self.rows.write().await = rows;
    }

    pub async fn set_download_code(&self, code: Option<&str>) {
        *self.download_code.write().await = code.map(str::to_string);
    }

    pub async fn set_archive(&self, archive: Vec<u8>) {
        *self.archive.write().await = archive;
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: SubtitleError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_lookups(&self) -> Vec<(String, String, String)> {
        self.lookups.read().await.clone()
    }

    /// Codes passed to archive fetches, in order.
    pub async fn requested_archives(&self) -> Vec<String> {
        self.archive_codes.read().await.clone()
    }

    async fn take_error(&self) -> Option<SubtitleError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl SubtitleSource for MockSubtitleSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_subtitle_list(
        &self,
        language: &str,
        year: &str,
        slug: &str,
    ) -> Result<Vec<RawSubtitleRow>, SubtitleError> {
        self.lookups
            .write()
            .await
            .push((language.to_string(), year.to_string(), slug.to_string()));

        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.rows.read().await.clone())
    }

    async fn resolve_detail_page_to_code(
        &self,
        _detail_link: &str,
        _language: &str,
    ) -> Result<Option<String>, SubtitleError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.download_code.read().await.clone())
    }

    async fn fetch_subtitle_archive(&self, code: &str) -> Result<Vec<u8>, SubtitleError> {
        self.archive_codes.write().await.push(code.to_string());

        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.archive.read().await.clone())
    }
}
