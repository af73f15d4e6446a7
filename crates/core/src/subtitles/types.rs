//! Types for subtitle lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while finding or storing subtitles.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("Subtitles unavailable: {0}")]
    Unavailable(String),

    #[error("Subtitle fetch failed: {0}")]
    Fetch(String),

    #[error("Subtitle archive is unusable: {0}")]
    Archive(String),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

/// One subtitle row as returned by a source, before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubtitleRow {
    pub title: Option<String>,
    pub upload_date: Option<String>,
    /// Download count as displayed, possibly with thousands separators.
    pub download_count: Option<String>,
    pub detail_link: Option<String>,
}

/// A subtitle offered for a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCandidate {
    pub title: String,
    pub upload_date: String,
    pub download_count: u64,
    /// Page that links to the downloadable archive.
    pub detail_link: String,
}

/// Trait for subtitle providers.
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// List subtitles for the movie identified by `year` and `slug`.
    async fn fetch_subtitle_list(
        &self,
        language: &str,
        year: &str,
        slug: &str,
    ) -> Result<Vec<RawSubtitleRow>, SubtitleError>;

    /// Resolve a detail page to the code used to fetch the archive.
    /// `Ok(None)` when the page links no download.
    async fn resolve_detail_page_to_code(
        &self,
        detail_link: &str,
        language: &str,
    ) -> Result<Option<String>, SubtitleError>;

    /// Fetch the compressed subtitle package for `code`.
    async fn fetch_subtitle_archive(&self, code: &str) -> Result<Vec<u8>, SubtitleError>;
}
