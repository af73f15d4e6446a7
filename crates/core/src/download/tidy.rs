//! Post-completion tidy-up of a finished transfer's content folder.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

/// What the tidy-up did. Failures are collected rather than returned so a
/// finished transfer is never reported as failed because of them.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TidyReport {
    pub subtitle: Option<PathBuf>,
    pub media: Option<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Organize `folder/content_name` after completion:
/// - move `folder/<content_name>.srt` inside as `<content_name>.srt`
/// - rename the first `*.<media_extension>` file to `<content_name>.<ext>`
/// - delete every other regular file in the content folder
///
/// Single-file content (no folder) is left untouched.
pub async fn tidy_content(folder: &Path, content_name: &str, media_extension: &str) -> TidyReport {
    let mut report = TidyReport::default();
    let content_dir = folder.join(content_name);

    match fs::metadata(&content_dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            debug!(path = %content_dir.display(), "Single-file content, nothing to tidy");
            return report;
        }
        Err(e) => {
            report.errors.push(format!("{}: {}", content_dir.display(), e));
            return report;
        }
    }

    let subtitle_name = format!("{}.srt", content_name);
    let loose_subtitle = folder.join(&subtitle_name);
    let subtitle_dest = content_dir.join(&subtitle_name);
    if fs::try_exists(&loose_subtitle).await.unwrap_or(false) {
        match fs::rename(&loose_subtitle, &subtitle_dest).await {
            Ok(()) => report.subtitle = Some(subtitle_dest.clone()),
            Err(e) => report
                .errors
                .push(format!("moving {}: {}", loose_subtitle.display(), e)),
        }
    }

    let mut entries = match fs::read_dir(&content_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            report.errors.push(format!("{}: {}", content_dir.display(), e));
            return report;
        }
    };

    let mut files = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
                if is_file {
                    files.push(entry.path());
                }
            }
            Ok(None) => break,
            Err(e) => {
                report.errors.push(format!("{}: {}", content_dir.display(), e));
                break;
            }
        }
    }
    // Directory order is platform dependent.
    files.sort();

    let media_dest = content_dir.join(format!("{}.{}", content_name, media_extension));
    for path in files {
        if path == subtitle_dest {
            continue;
        }

        let is_media = report.media.is_none()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(media_extension));

        if is_media {
            match fs::rename(&path, &media_dest).await {
                Ok(()) => report.media = Some(media_dest.clone()),
                Err(e) => report.errors.push(format!("renaming {}: {}", path.display(), e)),
            }
        } else {
            match fs::remove_file(&path).await {
                Ok(()) => report.removed.push(path),
                Err(e) => report.errors.push(format!("removing {}: {}", path.display(), e)),
            }
        }
    }

    for error in &report.errors {
        warn!(content = content_name, error = %error, "Tidy-up step failed");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NAME: &str = "Heat (1995) [1080p] [YTS.MX]";

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join(NAME);
        std::fs::create_dir_all(content.join("Subs")).unwrap();
        std::fs::write(content.join("Heat.1995.1080p.BluRay.x264.mp4"), b"movie").unwrap();
        std::fs::write(content.join("YTSProxies.com.txt"), b"ad").unwrap();
        std::fs::write(content.join("www.YTS.MX.jpg"), b"img").unwrap();
        (dir, content)
    }

    #[tokio::test]
    async fn test_tidy_with_subtitle() {
        let (dir, content) = setup();
        std::fs::write(dir.path().join(format!("{}.srt", NAME)), b"subs").unwrap();

        let report = tidy_content(dir.path(), NAME, "mp4").await;

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(content.join(format!("{}.mp4", NAME)).exists());
        assert!(content.join(format!("{}.srt", NAME)).exists());
        assert!(!dir.path().join(format!("{}.srt", NAME)).exists());
        assert!(!content.join("YTSProxies.com.txt").exists());
        assert!(!content.join("www.YTS.MX.jpg").exists());
        // Directories are left alone.
        assert!(content.join("Subs").is_dir());
        assert_eq!(report.removed.len(), 2);
    }

    #[tokio::test]
    async fn test_tidy_without_subtitle() {
        let (dir, content) = setup();

        let report = tidy_content(dir.path(), NAME, "mp4").await;

        assert!(report.subtitle.is_none());
        assert_eq!(report.media, Some(content.join(format!("{}.mp4", NAME))));
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_tidy_missing_content_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let report = tidy_content(dir.path(), "gone", "mp4").await;
        assert_eq!(report.errors.len(), 1);
        assert!(report.media.is_none());
    }

    #[tokio::test]
    async fn test_tidy_single_file_content_untouched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("movie.mp4"), b"movie").unwrap();
        let report = tidy_content(dir.path(), "movie.mp4", "mp4").await;
        assert_eq!(report, TidyReport::default());
        assert!(dir.path().join("movie.mp4").exists());
    }
}
