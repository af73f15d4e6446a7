//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every external service
//! trait, so the session and the download lifecycle can be exercised
//! without network access or a real transfer engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use bitsmuggler_core::testing::{fixtures, MockCatalogSource, MockTransferEngine};
//!
//! let catalog = MockCatalogSource::new();
//! catalog.set_page(1, vec![fixtures::movie_record("Heat", "1995", &["1080p"])]).await;
//!
//! let engine = MockTransferEngine::new();
//! engine.handle().set_progress(50, 100);
//! ```

mod mock_catalog;
mod mock_engine;
mod mock_fetcher;
mod mock_subtitles;

pub use mock_catalog::MockCatalogSource;
pub use mock_engine::{MockTransferEngine, MockTransferHandle};
pub use mock_fetcher::MockDescriptorFetcher;
pub use mock_subtitles::MockSubtitleSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use crate::catalog::{RawMovieRecord, RawVariantRow, ResultItem, TechSpec};
    use crate::subtitles::{RawSubtitleRow, SubtitleCandidate};

    fn slugify(title: &str) -> String {
        title.to_lowercase().replace(' ', "-")
    }

    /// Descriptor URL for a title and resolution. Always contains the
    /// resolution so variant selection can match on it.
    pub fn locator(title: &str, resolution: &str) -> String {
        format!(
            "https://catalog.example/torrent/download/{}.{}.torrent",
            slugify(title),
            resolution
        )
    }

    /// A raw movie record with one variant per resolution.
    pub fn movie_record(title: &str, year: &str, resolutions: &[&str]) -> RawMovieRecord {
        RawMovieRecord {
            title: Some(title.to_string()),
            year: Some(year.to_string()),
            genre: Some("Action / Drama".to_string()),
            rating: Some("8.3".to_string()),
            variants: resolutions
                .iter()
                .map(|res| RawVariantRow {
                    locator: Some(locator(title, res)),
                    size: Some("1.85 GB".to_string()),
                    resolution: Some(res.to_string()),
                    language: Some("English 5.1".to_string()),
                    duration: Some("2 hr 28 min".to_string()),
                })
                .collect(),
        }
    }

    pub fn tech_spec(resolution: &str, locator: &str) -> TechSpec {
        TechSpec {
            locator: Some(locator.to_string()),
            size: "1.85 GB".to_string(),
            resolution: resolution.to_string(),
            duration: "2 hr 28 min".to_string(),
            language: "English 5.1".to_string(),
        }
    }

    /// A result item offering 720p and 1080p, with 1080p preferred.
    pub fn result_item(title: &str, year: &str) -> ResultItem {
        let hd = tech_spec("1080p", &locator(title, "1080p"));
        ResultItem {
            title: title.to_string(),
            year: year.to_string(),
            genre: "Action / Drama".to_string(),
            rating: "8.3".to_string(),
            variants: vec![tech_spec("720p", &locator(title, "720p")), hd.clone()],
            preferred: hd,
        }
    }

    /// A subtitle listing row with a detail link derived from the title.
    pub fn subtitle_row(title: &str, downloads: &str) -> RawSubtitleRow {
        RawSubtitleRow {
            title: Some(title.to_string()),
            upload_date: Some("2021-03-14".to_string()),
            download_count: Some(downloads.to_string()),
            detail_link: Some(format!("https://subs.example/es/subtitles/{}", slugify(title))),
        }
    }

    pub fn subtitle_candidate(title: &str, downloads: u64) -> SubtitleCandidate {
        SubtitleCandidate {
            title: title.to_string(),
            upload_date: "2021-03-14".to_string(),
            download_count: downloads,
            detail_link: format!("https://subs.example/es/subtitles/{}", slugify(title)),
        }
    }

    /// An in-memory zip package holding `entries`.
    pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        build_zip(entries).unwrap_or_default()
    }

    fn build_zip(entries: &[(&str, &[u8])]) -> zip::result::ZipResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default())?;
            writer.write_all(content)?;
        }
        Ok(writer.finish()?.into_inner())
    }

    /// A minimal single-file descriptor declaring `name`.
    pub fn descriptor_bytes(name: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"d8:announce30:udp://tracker.example:1337/ann4:infod6:lengthi12e4:name");
        bytes.extend_from_slice(format!("{}:{}", name.len(), name).as_bytes());
        bytes.extend_from_slice(b"12:piece lengthi16384e6:pieces20:");
        bytes.extend_from_slice(&[0xab; 20]);
        bytes.extend_from_slice(b"ee");
        bytes
    }
}
