//! Inline filter token parser.
//!
//! Recognized tokens are `genre:`, `rating:`, `year:` and `order:`. A label
//! only counts when it starts the input or follows whitespace. Its value runs
//! up to the next recognized label or the end of input, so the plain keyword
//! is whatever precedes the first token. When a label repeats, the last
//! occurrence wins.

use tracing::debug;

use super::types::{is_known_genre, is_known_order, SearchQuery, ALL_GENRES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Genre,
    Rating,
    Year,
    Order,
}

impl Label {
    const ALL: [Label; 4] = [Label::Genre, Label::Rating, Label::Year, Label::Order];

    fn prefix(self) -> &'static str {
        match self {
            Label::Genre => "genre:",
            Label::Rating => "rating:",
            Label::Year => "year:",
            Label::Order => "order:",
        }
    }
}

/// A located token: label plus byte range of the whole token in the input.
#[derive(Debug, Clone, Copy)]
struct Token {
    label: Label,
    start: usize,
    end: usize,
}

/// Parses free text into a [`SearchQuery`].
#[derive(Debug, Clone)]
pub struct FilterParser {
    default_order: String,
}

impl FilterParser {
    /// Create a parser falling back to `default_order` when no valid
    /// `order:` token is present.
    pub fn new(default_order: impl Into<String>) -> Self {
        Self {
            default_order: default_order.into(),
        }
    }

    /// Parse `input`; `page` comes from the caller, never from the text.
    pub fn parse(&self, input: &str, page: u32) -> SearchQuery {
        let tokens = locate_tokens(input);

        let keyword_end = tokens.first().map(|t| t.start).unwrap_or(input.len());
        let keyword = collapse_whitespace(&input[..keyword_end]);

        let mut query = SearchQuery::new(keyword, self.default_order.clone()).with_page(page);

        // Tokens are in input order, so later assignments implement last-wins.
        for token in &tokens {
            let value = input[token.start + token.label.prefix().len()..token.end].trim();
            match token.label {
                Label::Genre => {
                    query.genre = if is_known_genre(value) {
                        value.to_ascii_lowercase()
                    } else {
                        ALL_GENRES.to_string()
                    };
                }
                Label::Rating => {
                    query.min_rating = value.parse::<u8>().ok().filter(|r| *r <= 9).unwrap_or(0);
                }
                Label::Year => {
                    query.year = value
                        .parse::<u16>()
                        .ok()
                        .filter(|y| (1900..=2100).contains(y))
                        .unwrap_or(0);
                }
                Label::Order => {
                    query.order_by = if is_known_order(value) {
                        value.to_ascii_lowercase()
                    } else {
                        self.default_order.clone()
                    };
                }
            }
        }

        debug!(
            keyword = %query.keyword,
            genre = %query.genre,
            rating = query.min_rating,
            year = query.year,
            order = %query.order_by,
            page = query.page,
            "Parsed search input"
        );

        query
    }
}

/// Find every recognized label in `input`, ordered by position, each
/// extending up to the next one.
fn locate_tokens(input: &str) -> Vec<Token> {
    // ASCII lowercasing keeps byte offsets identical to the original.
    let lower = input.to_ascii_lowercase();

    let mut starts: Vec<(usize, Label)> = Vec::new();
    for label in Label::ALL {
        for (idx, _) in lower.match_indices(label.prefix()) {
            let at_boundary = lower[..idx]
                .chars()
                .next_back()
                .map(char::is_whitespace)
                .unwrap_or(true);
            if at_boundary {
                starts.push((idx, label));
            }
        }
    }
    starts.sort_by_key(|(idx, _)| *idx);

    starts
        .iter()
        .enumerate()
        .map(|(i, (start, label))| Token {
            label: *label,
            start: *start,
            end: starts.get(i + 1).map(|(next, _)| *next).unwrap_or(input.len()),
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> FilterParser {
        FilterParser::new("rating")
    }

    #[test]
    fn test_plain_keyword() {
        let query = parser().parse("  the   godfather ", 1);
        assert_eq!(query.keyword, "the godfather");
        assert_eq!(query.genre, "all");
        assert_eq!(query.min_rating, 0);
        assert_eq!(query.year, 0);
        assert_eq!(query.order_by, "rating");
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_year_token() {
        let query = parser().parse("inception year:2010", 1);
        assert_eq!(query.keyword, "inception");
        assert_eq!(query.year, 2010);
        assert_eq!(query.genre, "all");
        assert_eq!(query.min_rating, 0);
        assert_eq!(query.order_by, "rating");
    }

    #[test]
    fn test_genre_value_removed_from_keyword() {
        let query = parser().parse("alien genre:horror", 1);
        assert_eq!(query.genre, "horror");
        assert_eq!(query.keyword, "alien");
        assert!(!query.keyword.contains("horror"));
    }

    #[test]
    fn test_all_tokens_any_order() {
        let query = parser().parse("matrix order:year rating:7 genre:Sci-Fi year:1999", 3);
        assert_eq!(query.keyword, "matrix");
        assert_eq!(query.order_by, "year");
        assert_eq!(query.min_rating, 7);
        assert_eq!(query.genre, "sci-fi");
        assert_eq!(query.year, 1999);
        assert_eq!(query.page, 3);
    }

    #[test]
    fn test_only_tokens_gives_empty_keyword() {
        let query = parser().parse("genre:drama", 1);
        assert_eq!(query.keyword, "");
        assert_eq!(query.genre, "drama");
    }

    #[test]
    fn test_empty_values_fall_back() {
        let query = parser().parse("heat genre: year:", 1);
        assert_eq!(query.keyword, "heat");
        assert_eq!(query.genre, "all");
        assert_eq!(query.year, 0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let query = parser().parse("x rating:11 year:soon order:random genre:space", 1);
        assert_eq!(query.min_rating, 0);
        assert_eq!(query.year, 0);
        assert_eq!(query.order_by, "rating");
        assert_eq!(query.genre, "all");
    }

    #[test]
    fn test_last_occurrence_wins() {
        let query = parser().parse("dune year:1984 year:2021", 1);
        assert_eq!(query.year, 2021);
        assert_eq!(query.keyword, "dune");

        let query = parser().parse("dune year:2021 year:", 1);
        assert_eq!(query.year, 0);
    }

    #[test]
    fn test_label_must_start_a_word() {
        let query = parser().parse("subgenre:horror", 1);
        assert_eq!(query.genre, "all");
        assert_eq!(query.keyword, "subgenre:horror");
    }

    #[test]
    fn test_label_inside_value_is_part_of_value() {
        // "year:" glued to the genre value is not a separate token.
        let query = parser().parse("it genre:horroryear:2017", 1);
        assert_eq!(query.year, 0);
        assert_eq!(query.genre, "all");
        assert_eq!(query.keyword, "it");
    }

    #[test]
    fn test_value_runs_to_next_token() {
        let query = parser().parse("genre:drama extra words year:2001", 1);
        // The value "drama extra words" is not a known genre.
        assert_eq!(query.genre, "all");
        assert_eq!(query.year, 2001);
        assert_eq!(query.keyword, "");
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let query = parser().parse("heat YEAR:1995 Order:Latest", 1);
        assert_eq!(query.year, 1995);
        assert_eq!(query.order_by, "latest");
    }

    #[test]
    fn test_page_zero_is_raised() {
        let query = parser().parse("heat", 0);
        assert_eq!(query.page, 1);
    }
}
