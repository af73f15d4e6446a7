//! Catalog search client.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::query::SearchQuery;

use super::types::{
    CatalogError, CatalogRequest, CatalogSource, RawMovieRecord, RawVariantRow, ResultItem,
    SearchPage, TechSpec, PAGE_SIZE, UNKNOWN,
};

/// Builds catalog requests from queries and assembles the source's raw
/// records into result items.
pub struct CatalogSearchClient {
    source: Arc<dyn CatalogSource>,
    host: String,
    quality: u32,
}

impl CatalogSearchClient {
    pub fn new(source: Arc<dyn CatalogSource>, config: &CatalogConfig) -> Self {
        Self {
            source,
            host: config.host.trim_end_matches('/').to_string(),
            quality: config.quality,
        }
    }

    /// Request parameters for `query`, including the fixed page size.
    pub fn build_request(&self, query: &SearchQuery) -> CatalogRequest {
        CatalogRequest {
            host: self.host.clone(),
            keyword: query.keyword.clone(),
            genre: query.genre.clone(),
            min_rating: query.min_rating,
            year: query.year,
            order_by: query.order_by.clone(),
            page: query.page.max(1),
            page_size: PAGE_SIZE,
        }
    }

    /// Run `query` against the catalog source.
    ///
    /// Source failures and records missing a title or year are returned as
    /// errors, never as an empty page.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchPage, CatalogError> {
        let request = self.build_request(query);
        debug!(
            source = self.source.name(),
            keyword = %request.keyword,
            page = request.page,
            "Searching catalog"
        );

        let raw = self.source.fetch_search_page(&request).await?;

        let items = raw
            .records
            .into_iter()
            .map(|record| self.assemble(record))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            source = self.source.name(),
            total = raw.total,
            items = items.len(),
            page = request.page,
            "Catalog search complete"
        );

        Ok(SearchPage {
            total_count: raw.total,
            items,
        })
    }

    fn assemble(&self, record: RawMovieRecord) -> Result<ResultItem, CatalogError> {
        let title = required(record.title, "title")?;
        let year = required(record.year, "year")?;

        let variants: Vec<TechSpec> = record.variants.into_iter().map(tech_spec_from_row).collect();
        let preferred = select_variant(&variants, self.quality);
        if preferred.is_unknown() {
            warn!(title = %title, quality = self.quality, "No variant for preferred resolution");
        }

        Ok(ResultItem {
            title,
            year,
            genre: record.genre.unwrap_or_else(|| UNKNOWN.to_string()),
            rating: record.rating.unwrap_or_else(|| UNKNOWN.to_string()),
            variants,
            preferred,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, CatalogError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CatalogError::Parse(format!("movie record is missing its {}", field)))
}

fn text_or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn tech_spec_from_row(row: RawVariantRow) -> TechSpec {
    TechSpec {
        locator: row.locator.filter(|l| !l.trim().is_empty()),
        size: text_or_unknown(row.size),
        resolution: text_or_unknown(row.resolution),
        duration: text_or_unknown(row.duration),
        language: text_or_unknown(row.language),
    }
}

/// Pick the variant for `quality`: the first whose resolution text or locator
/// contains it (`1080` matches `1080p`). Falls back to the "Unknown"
/// placeholder, never to another resolution.
pub fn select_variant(variants: &[TechSpec], quality: u32) -> TechSpec {
    let wanted = quality.to_string();
    variants
        .iter()
        .find(|v| {
            v.resolution.contains(&wanted)
                || v.locator.as_deref().is_some_and(|l| l.contains(&wanted))
        })
        .cloned()
        .unwrap_or_else(TechSpec::unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockCatalogSource};

    fn client(source: Arc<MockCatalogSource>) -> CatalogSearchClient {
        let config = CatalogConfig {
            host: "https://catalog.example/".to_string(),
            ..CatalogConfig::default()
        };
        CatalogSearchClient::new(source, &config)
    }

    #[test]
    fn test_build_request_uses_fixed_page_size() {
        let client = client(Arc::new(MockCatalogSource::new()));
        let mut query = SearchQuery::new("alien", "year");
        query.genre = "horror".to_string();
        query.page = 4;

        let request = client.build_request(&query);
        assert_eq!(request.host, "https://catalog.example");
        assert_eq!(request.keyword, "alien");
        assert_eq!(request.genre, "horror");
        assert_eq!(request.order_by, "year");
        assert_eq!(request.page, 4);
        assert_eq!(request.page_size, 20);
    }

    #[test]
    fn test_select_variant_matches_resolution() {
        let variants = vec![
            fixtures::tech_spec("720p", "https://t.example/a.720p.torrent"),
            fixtures::tech_spec("1080p", "https://t.example/a.1080p.torrent"),
        ];
        let picked = select_variant(&variants, 1080);
        assert_eq!(picked.resolution, "1080p");
    }

    #[test]
    fn test_select_variant_matches_locator() {
        let mut variant = fixtures::tech_spec("Unknown", "https://t.example/movie-2160p.torrent");
        variant.resolution = "UHD".to_string();
        let picked = select_variant(&[variant], 2160);
        assert_eq!(picked.resolution, "UHD");
    }

    #[test]
    fn test_select_variant_does_not_cascade() {
        let variants = vec![fixtures::tech_spec("720p", "https://t.example/a.720p.torrent")];
        let picked = select_variant(&variants, 1080);
        assert!(picked.is_unknown());
        assert_eq!(picked.size, "Unknown");
        assert!(picked.locator.is_none());
    }

    #[tokio::test]
    async fn test_search_assembles_items() {
        let source = Arc::new(MockCatalogSource::new());
        source
            .set_page(45, vec![fixtures::movie_record("Inception", "2010", &["720p", "1080p"])])
            .await;

        let page = client(source.clone())
            .search(&SearchQuery::new("inception", "rating"))
            .await
            .unwrap();

        assert_eq!(page.total_count, 45);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.items.len(), 1);
        let item = &page.items[0];
        assert_eq!(item.title, "Inception");
        assert_eq!(item.variants.len(), 2);
        assert_eq!(item.tech_spec().resolution, "1080p");

        let requests = source.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].keyword, "inception");
        assert_eq!(requests[0].page, 1);
    }

    #[tokio::test]
    async fn test_search_item_without_matching_variant_gets_placeholder() {
        let source = Arc::new(MockCatalogSource::new());
        source
            .set_page(1, vec![fixtures::movie_record("Heat", "1995", &["720p"])])
            .await;

        let page = client(source).search(&SearchQuery::new("", "rating")).await.unwrap();
        assert!(page.items[0].tech_spec().is_unknown());
    }

    #[tokio::test]
    async fn test_search_missing_title_is_parse_error() {
        let source = Arc::new(MockCatalogSource::new());
        let mut record = fixtures::movie_record("x", "2001", &["1080p"]);
        record.title = None;
        source.set_page(1, vec![record]).await;

        let err = client(source)
            .search(&SearchQuery::new("", "rating"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_propagates_unavailable() {
        let source = Arc::new(MockCatalogSource::new());
        source
            .set_next_error(CatalogError::Unavailable("timeout".to_string()))
            .await;

        let err = client(source)
            .search(&SearchQuery::new("", "rating"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }
}
