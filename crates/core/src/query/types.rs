//! Types for structured catalog queries.

use serde::{Deserialize, Serialize};

/// Sentinel genre meaning "no genre filter".
pub const ALL_GENRES: &str = "all";

/// Resolutions the catalog publishes variants for.
pub const SUPPORTED_QUALITIES: [u32; 3] = [720, 1080, 2160];

/// Genre keys accepted by the catalog's browse endpoint.
pub const GENRES: [&str; 26] = [
    "action",
    "adventure",
    "animation",
    "biography",
    "comedy",
    "crime",
    "documentary",
    "drama",
    "family",
    "fantasy",
    "film-noir",
    "game-show",
    "history",
    "horror",
    "music",
    "musical",
    "mystery",
    "news",
    "reality-tv",
    "romance",
    "sci-fi",
    "sport",
    "talk-show",
    "thriller",
    "war",
    "western",
];

/// Sort orders accepted by the catalog's browse endpoint.
pub const ORDER_KEYS: [&str; 8] = [
    "latest",
    "oldest",
    "featured",
    "seeds",
    "peers",
    "year",
    "rating",
    "alphabetical",
];

/// Check whether `order` is one of [`ORDER_KEYS`] (case-insensitive).
pub fn is_known_order(order: &str) -> bool {
    let order = order.to_ascii_lowercase();
    ORDER_KEYS.contains(&order.as_str())
}

/// Check whether `genre` is one of [`GENRES`] (case-insensitive).
pub fn is_known_genre(genre: &str) -> bool {
    let genre = genre.to_ascii_lowercase();
    GENRES.contains(&genre.as_str())
}

/// A structured catalog search.
///
/// Unset filters hold their "no filter" sentinel: genre `"all"`,
/// rating `0`, year `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Plain keyword text (may be empty).
    pub keyword: String,
    /// Genre key, or `"all"`.
    pub genre: String,
    /// Minimum rating 0-9 (0 = any).
    pub min_rating: u8,
    /// Release year (0 = any).
    pub year: u16,
    /// Sort order key.
    pub order_by: String,
    /// 1-based page number.
    pub page: u32,
}

impl SearchQuery {
    /// Query with no filters for `keyword`, first page.
    pub fn new(keyword: impl Into<String>, order_by: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            genre: ALL_GENRES.to_string(),
            min_rating: 0,
            year: 0,
            order_by: order_by.into(),
            page: 1,
        }
    }

    /// Same query for another page. Pages below 1 are raised to 1.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_query_has_sentinels() {
        let query = SearchQuery::new("alien", "rating");
        assert_eq!(query.genre, "all");
        assert_eq!(query.min_rating, 0);
        assert_eq!(query.year, 0);
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_with_page_never_below_one() {
        let query = SearchQuery::new("alien", "rating");
        assert_eq!(query.with_page(0).page, 1);
        assert_eq!(query.with_page(7).page, 7);
        assert_eq!(query.with_page(7).keyword, "alien");
    }

    #[test]
    fn test_known_vocabulary() {
        assert!(is_known_order("Rating"));
        assert!(!is_known_order("popularity"));
        assert!(is_known_genre("Sci-Fi"));
        assert!(!is_known_genre("space opera"));
    }
}
