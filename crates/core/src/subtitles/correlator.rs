use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::config::SubtitlesConfig;

use super::types::{RawSubtitleRow, SubtitleCandidate, SubtitleError, SubtitleSource};

/// Normalize a movie title into the subtitle source's slug form:
/// lower-case, spaces to hyphens, `.`, `,` and `:` removed.
pub fn slug(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ':'))
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

/// Finds, ranks and stores subtitles through a [`SubtitleSource`].
pub struct SubtitleCorrelator {
    source: Arc<dyn SubtitleSource>,
    language: String,
    trusted_marker: String,
}

impl SubtitleCorrelator {
    pub fn new(source: Arc<dyn SubtitleSource>, config: &SubtitlesConfig) -> Self {
        Self {
            source,
            language: config.language.clone(),
            trusted_marker: config.trusted_marker.clone(),
        }
    }

    /// Candidates for a movie, trusted uploads first, then by download count.
    pub async fn find_candidates(
        &self,
        year: &str,
        title: &str,
    ) -> Result<Vec<SubtitleCandidate>, SubtitleError> {
        let slug = slug(title);
        debug!(source = self.source.name(), year, slug = %slug, "Looking up subtitles");

        let rows = self
            .source
            .fetch_subtitle_list(&self.language, year, &slug)
            .await
            .map_err(|e| match e {
                SubtitleError::Unavailable(_) => e,
                other => SubtitleError::Unavailable(other.to_string()),
            })?;

        let mut candidates: Vec<SubtitleCandidate> =
            rows.into_iter().filter_map(candidate_from_row).collect();
        rank_candidates(&mut candidates, &self.trusted_marker);

        info!(title, count = candidates.len(), "Subtitle candidates found");
        Ok(candidates)
    }

    /// Resolve a candidate to a download code. `Ok(None)` is a normal outcome.
    pub async fn resolve_download_code(
        &self,
        candidate: &SubtitleCandidate,
    ) -> Result<Option<String>, SubtitleError> {
        let code = self
            .source
            .resolve_detail_page_to_code(&candidate.detail_link, &self.language)
            .await?;
        if code.is_none() {
            warn!(link = %candidate.detail_link, "No download code on detail page");
        }
        Ok(code)
    }

    /// Fetch the archive for `code` and write its subtitle entry to
    /// `download_folder/destination_name.srt`.
    ///
    /// The destination either ends up complete or does not exist.
    pub async fn fetch_and_store(
        &self,
        code: &str,
        destination_name: &str,
        download_folder: &Path,
    ) -> Result<PathBuf, SubtitleError> {
        let archive = self.source.fetch_subtitle_archive(code).await?;
        let payload = extract_subtitle(&archive)?;

        fs::create_dir_all(download_folder).await?;

        let destination = download_folder.join(format!("{}.srt", destination_name));
        let partial = PartialFile::new(download_folder.join(format!("{}.srt.part", destination_name)));
        fs::write(partial.path(), &payload).await?;
        fs::rename(partial.path(), &destination).await?;
        partial.commit();

        info!(path = %destination.display(), bytes = payload.len(), "Subtitle stored");
        Ok(destination)
    }
}

fn candidate_from_row(row: RawSubtitleRow) -> Option<SubtitleCandidate> {
    let title = row.title.filter(|t| !t.trim().is_empty())?;
    let detail_link = row.detail_link.filter(|l| !l.trim().is_empty())?;
    let download_count = row
        .download_count
        .map(|d| d.chars().filter(char::is_ascii_digit).collect::<String>())
        .and_then(|d| d.parse::<u64>().ok())
        .unwrap_or(0);

    Some(SubtitleCandidate {
        title: title.trim().to_string(),
        upload_date: row.upload_date.unwrap_or_default().trim().to_string(),
        download_count,
        detail_link,
    })
}

/// Stable sort: titles containing `marker` first, then download count descending.
pub(crate) fn rank_candidates(candidates: &mut [SubtitleCandidate], marker: &str) {
    let marker = marker.to_lowercase();
    candidates.sort_by_key(|c| {
        let trusted = !marker.is_empty() && c.title.to_lowercase().contains(&marker);
        (!trusted, std::cmp::Reverse(c.download_count))
    });
}

/// Upper bound on the buffer reserved from a package's declared entry size.
const MAX_PAYLOAD_RESERVE: u64 = 1024 * 1024;

fn payload_capacity(declared: u64) -> usize {
    declared.min(MAX_PAYLOAD_RESERVE) as usize
}

/// Pull the first `.srt` file out of a zip package.
fn extract_subtitle(archive: &[u8]) -> Result<Vec<u8>, SubtitleError> {
    let mut zip =
        ZipArchive::new(Cursor::new(archive)).map_err(|e| SubtitleError::Archive(e.to_string()))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| SubtitleError::Archive(e.to_string()))?;
        if entry.is_dir() || !entry.name().to_lowercase().ends_with(".srt") {
            continue;
        }
        let mut payload = Vec::with_capacity(payload_capacity(entry.size()));
        entry
            .read_to_end(&mut payload)
            .map_err(|e| SubtitleError::Archive(e.to_string()))?;
        return Ok(payload);
    }

    Err(SubtitleError::Archive(
        "package contains no subtitle file".to_string(),
    ))
}

/// Removes the in-progress file on drop unless committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove partial subtitle");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockSubtitleSource};
    use tempfile::TempDir;

    fn correlator(source: Arc<MockSubtitleSource>) -> SubtitleCorrelator {
        SubtitleCorrelator::new(source, &SubtitlesConfig::default())
    }

    fn candidate(title: &str, downloads: u64) -> SubtitleCandidate {
        SubtitleCandidate {
            title: title.to_string(),
            upload_date: "2020-01-01".to_string(),
            download_count: downloads,
            detail_link: format!("https://subs.example/{}", downloads),
        }
    }

    #[test]
    fn test_payload_capacity_ignores_inflated_sizes() {
        assert_eq!(payload_capacity(2_048), 2_048);
        assert_eq!(payload_capacity(u64::MAX), MAX_PAYLOAD_RESERVE as usize);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Star Wars: Episode IV"), "star-wars-episode-iv");
        assert_eq!(slug("Mr. Smith, Goes"), "mr-smith-goes");
        assert_eq!(slug("Inception"), "inception");
    }

    #[test]
    fn test_rank_by_downloads() {
        let mut candidates = vec![candidate("a", 5), candidate("b", 50), candidate("c", 10)];
        rank_candidates(&mut candidates, "YIFY");
        let counts: Vec<u64> = candidates.iter().map(|c| c.download_count).collect();
        assert_eq!(counts, vec![50, 10, 5]);
    }

    #[test]
    fn test_rank_trusted_first() {
        let mut candidates = vec![
            candidate("a", 500),
            candidate("Movie.2010.1080p.BluRay.x264-yify", 3),
            candidate("c", 40),
        ];
        rank_candidates(&mut candidates, "YIFY");
        assert_eq!(candidates[0].download_count, 3);
        assert_eq!(candidates[1].download_count, 500);
        assert_eq!(candidates[2].download_count, 40);
    }

    #[tokio::test]
    async fn test_find_candidates_uses_slug_and_ranks() {
        let source = Arc::new(MockSubtitleSource::new());
        source
            .set_rows(vec![
                fixtures::subtitle_row("first", "1,200"),
                fixtures::subtitle_row("second", "15,000"),
                fixtures::subtitle_row("third", "n/a"),
            ])
            .await;

        let candidates = correlator(source.clone())
            .find_candidates("1977", "Star Wars: A New Hope")
            .await
            .unwrap();

        let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first", "third"]);
        assert_eq!(candidates[1].download_count, 1200);
        assert_eq!(candidates[2].download_count, 0);

        let lookups = source.recorded_lookups().await;
        assert_eq!(
            lookups,
            vec![("es".to_string(), "1977".to_string(), "star-wars-a-new-hope".to_string())]
        );
    }

    #[tokio::test]
    async fn test_find_candidates_failure_is_unavailable() {
        let source = Arc::new(MockSubtitleSource::new());
        source
            .set_next_error(SubtitleError::Fetch("connection reset".to_string()))
            .await;

        let err = correlator(source).find_candidates("2010", "Inception").await.unwrap_err();
        assert!(matches!(err, SubtitleError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_resolve_download_code_absent() {
        let source = Arc::new(MockSubtitleSource::new());
        let code = correlator(source)
            .resolve_download_code(&candidate("x", 1))
            .await
            .unwrap();
        assert!(code.is_none());
    }

    #[tokio::test]
    async fn test_fetch_and_store_writes_srt_and_creates_folder() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("not-yet");
        let source = Arc::new(MockSubtitleSource::new());
        source
            .set_archive(fixtures::zip_archive(&[
                ("readme.txt", b"hello".as_slice()),
                ("Inception.2010.srt", b"1\n00:00:01,000 --> 00:00:02,000\nHi\n".as_slice()),
            ]))
            .await;

        let path = correlator(source)
            .fetch_and_store("42", "Inception (2010) [1080p]", &folder)
            .await
            .unwrap();

        assert_eq!(path, folder.join("Inception (2010) [1080p].srt"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Hi"));
        assert!(!folder.join("Inception (2010) [1080p].srt.part").exists());
    }

    #[tokio::test]
    async fn test_fetch_and_store_corrupt_archive() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(MockSubtitleSource::new());
        source.set_archive(b"not a zip".to_vec()).await;

        let err = correlator(source)
            .fetch_and_store("42", "movie", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SubtitleError::Archive(_)));
        assert!(!dir.path().join("movie.srt").exists());
    }

    #[tokio::test]
    async fn test_fetch_and_store_without_srt_entry() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(MockSubtitleSource::new());
        source
            .set_archive(fixtures::zip_archive(&[("movie.nfo", b"info".as_slice())]))
            .await;

        let err = correlator(source)
            .fetch_and_store("42", "movie", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SubtitleError::Archive(_)));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_fetch_and_store_network_failure() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(MockSubtitleSource::new());
        source
            .set_next_error(SubtitleError::Fetch("HTTP 503".to_string()))
            .await;

        let err = correlator(source)
            .fetch_and_store("42", "movie", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SubtitleError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_fetch_and_store_unwritable_folder() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let source = Arc::new(MockSubtitleSource::new());
        source
            .set_archive(fixtures::zip_archive(&[("a.srt", b"sub".as_slice())]))
            .await;

        // A regular file where the folder should be.
        let err = correlator(source)
            .fetch_and_store("42", "movie", &blocker.join("sub"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubtitleError::Filesystem(_)));
    }

    #[test]
    fn test_partial_file_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.srt.part");
        std::fs::write(&path, b"half").unwrap();
        drop(PartialFile::new(path.clone()));
        assert!(!path.exists());
    }
}
