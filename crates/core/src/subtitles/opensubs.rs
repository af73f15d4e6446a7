//! OpenSubtitles source.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

use crate::config::SubtitlesConfig;

use super::types::{RawSubtitleRow, SubtitleError, SubtitleSource};

/// Column positions in the listing's `data` rows.
const TITLE_CELL: usize = 2;
const DATE_CELL: usize = 3;
const DOWNLOADS_CELL: usize = 8;

static ANCHOR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?s)<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).ok());

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    data: Vec<Vec<serde_json::Value>>,
}

/// Subtitle source backed by the OpenSubtitles website.
pub struct OpenSubtitlesSource {
    client: Client,
    host: String,
    download_host: String,
}

impl OpenSubtitlesSource {
    pub fn new(config: &SubtitlesConfig) -> Result<Self, SubtitleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| SubtitleError::Unavailable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            download_host: config.download_host.trim_end_matches('/').to_string(),
        })
    }

    fn listing_url(&self, language: &str, year: &str, slug: &str) -> String {
        format!(
            "{}/{lang}/{lang}/features/{}-{}/subtitles.json",
            self.host,
            year,
            slug,
            lang = language
        )
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, SubtitleError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SubtitleError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SubtitleError::Fetch(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl SubtitleSource for OpenSubtitlesSource {
    fn name(&self) -> &str {
        "opensubtitles"
    }

    async fn fetch_subtitle_list(
        &self,
        language: &str,
        year: &str,
        slug: &str,
    ) -> Result<Vec<RawSubtitleRow>, SubtitleError> {
        let url = self.listing_url(language, year, slug);
        debug!(url = %url, "Fetching subtitle listing");

        let body = self
            .get(&url)
            .await
            .map_err(|e| SubtitleError::Unavailable(e.to_string()))?
            .text()
            .await
            .map_err(|e| SubtitleError::Unavailable(e.to_string()))?;

        parse_listing(&body, &self.host)
    }

    async fn resolve_detail_page_to_code(
        &self,
        detail_link: &str,
        language: &str,
    ) -> Result<Option<String>, SubtitleError> {
        let body = self
            .get(detail_link)
            .await?
            .text()
            .await
            .map_err(|e| SubtitleError::Fetch(e.to_string()))?;
        Ok(find_download_code(&body, language))
    }

    async fn fetch_subtitle_archive(&self, code: &str) -> Result<Vec<u8>, SubtitleError> {
        let url = format!("{}/en/download/sub/{}", self.download_host, code);
        debug!(url = %url, "Fetching subtitle archive");
        let bytes = self
            .get(&url)
            .await?
            .bytes()
            .await
            .map_err(|e| SubtitleError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn cell_text(row: &[serde_json::Value], index: usize) -> Option<String> {
    match row.get(index)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Split an HTML anchor into `(href, text)`.
fn parse_anchor(html: &str) -> Option<(String, String)> {
    let re = ANCHOR.as_ref()?;
    let caps = re.captures(html)?;
    let href = caps.get(1)?.as_str().trim().to_string();
    let text = caps.get(2)?.as_str().trim().to_string();
    Some((href, text))
}

/// Parse the JSON listing into rows. Anchors without a host are made absolute.
pub fn parse_listing(body: &str, host: &str) -> Result<Vec<RawSubtitleRow>, SubtitleError> {
    let listing: ListingResponse = serde_json::from_str(body)
        .map_err(|e| SubtitleError::Unavailable(format!("unexpected listing format: {}", e)))?;

    let rows = listing
        .data
        .iter()
        .map(|row| {
            let anchor = cell_text(row, TITLE_CELL).and_then(|cell| parse_anchor(&cell));
            let downloads = cell_text(row, DOWNLOADS_CELL)
                .map(|cell| parse_anchor(&cell).map(|(_, text)| text).unwrap_or(cell));

            RawSubtitleRow {
                title: anchor.as_ref().map(|(_, text)| text.clone()),
                upload_date: cell_text(row, DATE_CELL),
                download_count: downloads,
                detail_link: anchor.map(|(href, _)| {
                    if href.starts_with("http") {
                        href
                    } else {
                        format!("{}{}", host, href)
                    }
                }),
            }
        })
        .collect();

    Ok(rows)
}

/// The last link to the language's subtitle page holds the code in its
/// final path segment.
pub fn find_download_code(html: &str, language: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").ok()?;
    let needle = format!("opensubtitles.org/{}/subtitles", language);

    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains(&needle))
        .last()
        .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        let source = OpenSubtitlesSource::new(&SubtitlesConfig::default()).unwrap();
        assert_eq!(
            source.listing_url("es", "2010", "inception"),
            "https://www.opensubtitles.com/es/es/features/2010-inception/subtitles.json"
        );
    }

    #[test]
    fn test_parse_listing() {
        let body = r#"{"data": [
            ["x", "y", "<a href=\"/es/subtitles/inception-2010-yify\">Inception.2010.YIFY</a>", "2019-05-01", "", "", "", "", "<a href=\"/es/download\">1,234</a>"],
            ["x", "y", "<a href=\"https://other.example/s/2\">Inception BluRay</a>", "2020-01-01"]
        ]}"#;

        let rows = parse_listing(body, "https://www.opensubtitles.com").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title.as_deref(), Some("Inception.2010.YIFY"));
        assert_eq!(
            rows[0].detail_link.as_deref(),
            Some("https://www.opensubtitles.com/es/subtitles/inception-2010-yify")
        );
        assert_eq!(rows[0].upload_date.as_deref(), Some("2019-05-01"));
        assert_eq!(rows[0].download_count.as_deref(), Some("1,234"));
        assert_eq!(rows[1].detail_link.as_deref(), Some("https://other.example/s/2"));
        assert!(rows[1].download_count.is_none());
    }

    #[test]
    fn test_parse_listing_rejects_garbage() {
        let err = parse_listing("<html>", "https://x").unwrap_err();
        assert!(matches!(err, SubtitleError::Unavailable(_)));
    }

    #[test]
    fn test_find_download_code() {
        let html = r#"<html><body>
            <a href="https://www.opensubtitles.org/en/subtitles/111">english</a>
            <a href="https://www.opensubtitles.org/es/subtitles/222">first</a>
            <a href="https://www.opensubtitles.org/es/subtitles/9183744/">second</a>
        </body></html>"#;
        assert_eq!(find_download_code(html, "es"), Some("9183744".to_string()));
        assert_eq!(find_download_code(html, "fr"), None);
    }
}
