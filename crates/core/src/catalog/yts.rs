//! YTS catalog source.
//!
//! Scrapes the public browse page for the result total and movie links, then
//! fetches every movie page concurrently to read its details and torrent
//! variants.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::CatalogConfig;

use super::types::{
    CatalogError, CatalogRequest, CatalogSource, RawMovieRecord, RawSearchPage, RawVariantRow,
};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126 Safari/537.36";

/// Catalog source backed by a YTS mirror's HTML pages.
pub struct YtsCatalogSource {
    client: Client,
}

impl YtsCatalogSource {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| CatalogError::Unavailable(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Unavailable(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))
    }

    async fn fetch_movie(&self, url: String) -> Result<RawMovieRecord, CatalogError> {
        let body = self.get_text(&url).await?;
        parse_movie_page(&body)
    }
}

/// Browse URL for a request. Filter sentinels are sent as-is.
pub fn browse_url(request: &CatalogRequest) -> String {
    format!(
        "{}/browse-movies?keyword={}&quality=all&genre={}&rating={}&year={}&order_by={}&page={}",
        request.host.trim_end_matches('/'),
        urlencoding::encode(&request.keyword),
        urlencoding::encode(&request.genre),
        request.min_rating,
        request.year,
        urlencoding::encode(&request.order_by),
        request.page
    )
}

#[async_trait]
impl CatalogSource for YtsCatalogSource {
    fn name(&self) -> &str {
        "yts"
    }

    async fn fetch_search_page(
        &self,
        request: &CatalogRequest,
    ) -> Result<RawSearchPage, CatalogError> {
        let url = browse_url(request);
        debug!(url = %url, "Fetching browse page");
        let body = self.get_text(&url).await?;
        let browse = parse_browse_page(&body, &request.host)?;

        let fetches = browse.movie_links.into_iter().map(|link| self.fetch_movie(link));
        let results = join_all(fetches).await;

        let mut records = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(error = %e, "Skipping movie page");
                    first_error.get_or_insert(e);
                }
            }
        }

        // Every detail page failing means the catalog is not usable.
        if records.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        Ok(RawSearchPage {
            total: browse.total,
            records,
        })
    }
}

/// What the browse page yields before movie pages are fetched.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BrowsePage {
    pub total: u64,
    pub movie_links: Vec<String>,
}

fn selector(css: &str) -> Result<Selector, CatalogError> {
    Selector::parse(css).map_err(|e| CatalogError::Parse(format!("bad selector '{}': {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read the result total and the movie links from a browse page.
pub fn parse_browse_page(html: &str, host: &str) -> Result<BrowsePage, CatalogError> {
    let document = Html::parse_document(html);
    let content_sel = selector("div.browse-content")?;
    let total_sel = selector("h2 b")?;
    let link_sel = selector("a.browse-movie-title")?;

    let content = document
        .select(&content_sel)
        .next()
        .ok_or_else(|| CatalogError::Parse("browse page has no result section".to_string()))?;

    let total = match content.select(&total_sel).next() {
        Some(b) => {
            let digits: String = element_text(b).chars().filter(|c| c.is_ascii_digit()).collect();
            digits
                .parse::<u64>()
                .map_err(|_| CatalogError::Parse("result total is not a number".to_string()))?
        }
        // No header means no results.
        None => 0,
    };

    let movie_links = content
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| absolute_url(host, href))
        .collect();

    Ok(BrowsePage { total, movie_links })
}

fn absolute_url(host: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}/{}", host.trim_end_matches('/'), href.trim_start_matches('/'))
    }
}

/// Extract one movie record from its page.
pub fn parse_movie_page(html: &str) -> Result<RawMovieRecord, CatalogError> {
    let document = Html::parse_document(html);
    let root_sel = selector("div#movie-content")?;
    let title_sel = selector("#movie-info h1")?;
    let h2_sel = selector("#movie-info h2")?;
    let rating_sel = selector("[itemprop=\"ratingValue\"]")?;
    let link_sel = selector("#movie-info p a")?;
    let spec_sel = selector("#movie-tech-specs .tech-spec-info")?;
    let cell_sel = selector(".tech-spec-element")?;

    let root = document
        .select(&root_sel)
        .next()
        .ok_or_else(|| CatalogError::Parse("movie page has no content section".to_string()))?;

    let title = root.select(&title_sel).next().map(element_text);
    let mut h2s = root.select(&h2_sel).map(element_text);
    let year = h2s.next();
    let genre = h2s.next();
    let rating = root.select(&rating_sel).next().map(element_text);

    let locators: Vec<String> = root
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains(".torrent"))
        .map(str::to_string)
        .collect();

    let spec_blocks: Vec<Vec<String>> = root
        .select(&spec_sel)
        .map(|block| {
            block
                .select(&cell_sel)
                .map(element_text)
                .filter(|t| !t.is_empty())
                .collect()
        })
        .collect();

    let variants = locators
        .into_iter()
        .enumerate()
        .map(|(i, locator)| {
            let cells = spec_blocks.get(i).map(Vec::as_slice).unwrap_or(&[]);
            variant_row(locator, cells)
        })
        .collect();

    Ok(RawMovieRecord {
        title,
        year,
        genre,
        rating,
        variants,
    })
}

/// Cells are laid out as size, resolution, language, then the remaining
/// specs with the runtime among them.
fn variant_row(locator: String, cells: &[String]) -> RawVariantRow {
    RawVariantRow {
        locator: Some(locator),
        size: cells.first().map(|s| clean_size(s)),
        resolution: cells.get(1).cloned(),
        language: cells.get(2).cloned(),
        duration: cells.iter().skip(3).find(|c| looks_like_duration(c)).cloned(),
    }
}

/// The size cell can carry the peer/seed counts ahead of the size itself.
fn clean_size(cell: &str) -> String {
    if cell.contains("P/S") {
        let words: Vec<&str> = cell.split_whitespace().collect();
        if words.len() >= 2 {
            return words[words.len() - 2..].join(" ");
        }
    }
    cell.trim().to_string()
}

fn looks_like_duration(cell: &str) -> bool {
    static PATTERN: Lazy<Option<Regex>> =
        Lazy::new(|| Regex::new(r"^\d+\s*hr(\s+\d+\s*min)?$|^\d+\s*min$").ok());
    PATTERN.as_ref().is_some_and(|re| re.is_match(cell.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROWSE: &str = r#"
<html><body>
<div class="browse-content">
  <div><h2><b>1,234</b> YIFY Movies found</h2></div>
  <section><div class="row">
    <div class="browse-movie-wrap"><a class="browse-movie-title" href="/movies/inception-2010">Inception</a></div>
    <div class="browse-movie-wrap"><a class="browse-movie-title" href="https://mirror.example/movies/heat-1995">Heat</a></div>
  </div></section>
</div>
</body></html>"#;

    const MOVIE: &str = r#"
<html><body>
<div id="movie-content">
  <div id="movie-info">
    <h1>Inception</h1>
    <h2>2010</h2>
    <h2>Action / Sci-Fi</h2>
    <p>Available in:
      <a href="https://mirror.example/torrent/download/inception.720p.torrent">720p.BluRay</a>
      <a href="https://mirror.example/torrent/download/inception.1080p.torrent">1080p.BluRay</a>
      <a href="https://www.imdb.com/title/tt1375666/">IMDb</a>
    </p>
    <span itemprop="ratingValue">8.8</span>
  </div>
  <div id="movie-tech-specs">
    <div class="tech-spec-info">
      <div class="tech-spec-element">1.09 GB</div>
      <div class="tech-spec-element">1280*720</div>
      <div class="tech-spec-element">English 2.0</div>
      <div class="tech-spec-element">PG-13</div>
      <div class="tech-spec-element">23.976 fps</div>
      <div class="tech-spec-element">2 hr 28 min</div>
    </div>
    <div class="tech-spec-info">
      <div class="tech-spec-element">P/S 100 / 20 2.09 GB</div>
      <div class="tech-spec-element">1920*1080</div>
      <div class="tech-spec-element">English 5.1</div>
      <div class="tech-spec-element">PG-13</div>
      <div class="tech-spec-element">2 hr 28 min</div>
    </div>
  </div>
</div>
</body></html>"#;

    #[test]
    fn test_browse_url() {
        let request = CatalogRequest {
            host: "https://catalog.example/".to_string(),
            keyword: "the matrix".to_string(),
            genre: "all".to_string(),
            min_rating: 0,
            year: 1999,
            order_by: "rating".to_string(),
            page: 2,
            page_size: 20,
        };
        assert_eq!(
            browse_url(&request),
            "https://catalog.example/browse-movies?keyword=the%20matrix&quality=all&genre=all&rating=0&year=1999&order_by=rating&page=2"
        );
    }

    #[test]
    fn test_parse_browse_page() {
        let page = parse_browse_page(BROWSE, "https://catalog.example").unwrap();
        assert_eq!(page.total, 1234);
        assert_eq!(
            page.movie_links,
            vec![
                "https://catalog.example/movies/inception-2010".to_string(),
                "https://mirror.example/movies/heat-1995".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_browse_page_without_results_section() {
        let err = parse_browse_page("<html><body><p>maintenance</p></body></html>", "https://x").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_parse_movie_page() {
        let record = parse_movie_page(MOVIE).unwrap();
        assert_eq!(record.title.as_deref(), Some("Inception"));
        assert_eq!(record.year.as_deref(), Some("2010"));
        assert_eq!(record.genre.as_deref(), Some("Action / Sci-Fi"));
        assert_eq!(record.rating.as_deref(), Some("8.8"));
        assert_eq!(record.variants.len(), 2);

        let hd = &record.variants[1];
        assert!(hd.locator.as_deref().unwrap().ends_with("inception.1080p.torrent"));
        assert_eq!(hd.size.as_deref(), Some("2.09 GB"));
        assert_eq!(hd.resolution.as_deref(), Some("1920*1080"));
        assert_eq!(hd.language.as_deref(), Some("English 5.1"));
        assert_eq!(hd.duration.as_deref(), Some("2 hr 28 min"));
        assert_eq!(record.variants[0].size.as_deref(), Some("1.09 GB"));
    }

    #[test]
    fn test_parse_movie_page_without_content() {
        let err = parse_movie_page("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_clean_size() {
        assert_eq!(clean_size("P/S 12 / 3 800.5 MB"), "800.5 MB");
        assert_eq!(clean_size(" 1.4 GB "), "1.4 GB");
    }
}
