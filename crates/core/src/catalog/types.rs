//! Types for catalog search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Results per catalog page. Fixed by the catalog's browse endpoint.
pub const PAGE_SIZE: u32 = 20;

/// Placeholder for tech-spec fields that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// Number of pages for `total_count` results: `max(1, ceil(total / 20))`.
pub fn total_pages(total_count: u64) -> u32 {
    let pages = total_count.div_ceil(PAGE_SIZE as u64);
    pages.clamp(1, u32::MAX as u64) as u32
}

/// Errors that can occur during catalog search.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Could not interpret catalog page: {0}")]
    Parse(String),
}

/// Parameters sent to a catalog source. Filters already hold their
/// "no filter" sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRequest {
    pub host: String,
    pub keyword: String,
    pub genre: String,
    pub min_rating: u8,
    pub year: u16,
    pub order_by: String,
    pub page: u32,
    pub page_size: u32,
}

/// One technical variant row as extracted by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVariantRow {
    pub locator: Option<String>,
    pub size: Option<String>,
    pub resolution: Option<String>,
    pub language: Option<String>,
    pub duration: Option<String>,
}

/// One movie as extracted by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMovieRecord {
    pub title: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub variants: Vec<RawVariantRow>,
}

/// A raw page from a source: the total result count plus this page's records.
#[derive(Debug, Clone, Default)]
pub struct RawSearchPage {
    pub total: u64,
    pub records: Vec<RawMovieRecord>,
}

/// One quality/format option of a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechSpec {
    /// Where the descriptor file can be fetched. `None` for the placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub size: String,
    pub resolution: String,
    pub duration: String,
    pub language: String,
}

impl TechSpec {
    /// Placeholder used when no variant matches the preferred resolution.
    pub fn unknown() -> Self {
        Self {
            locator: None,
            size: UNKNOWN.to_string(),
            resolution: UNKNOWN.to_string(),
            duration: UNKNOWN.to_string(),
            language: UNKNOWN.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.locator.is_none() && self.resolution == UNKNOWN
    }
}

/// A movie in a result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub title: String,
    pub year: String,
    pub genre: String,
    pub rating: String,
    /// Every variant the catalog lists for this movie.
    pub variants: Vec<TechSpec>,
    /// The variant matching the preferred resolution, or the placeholder.
    pub preferred: TechSpec,
}

impl ResultItem {
    /// The resolved tech spec. Never absent.
    pub fn tech_spec(&self) -> &TechSpec {
        &self.preferred
    }
}

/// One page of search results. Replaces the previous page wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub total_count: u64,
    pub items: Vec<ResultItem>,
}

impl SearchPage {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count)
    }
}

/// Trait for catalog backends that fetch and extract browse pages.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch one page of results for `request`.
    async fn fetch_search_page(
        &self,
        request: &CatalogRequest,
    ) -> Result<RawSearchPage, CatalogError>;
}
