//! Single-transfer download orchestrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::fs;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::DownloadsConfig;
use crate::torrent_client::{
    is_descriptor_path, parse_descriptor_name, TransferEngine, TransferHandle, DESCRIPTOR_EXTENSION,
};

use super::cancel::CancelSignal;
use super::status::StatusBoard;
use super::tidy::tidy_content;
use super::types::{
    canceled_line, completed_line, failed_line, progress_line, DescriptorFetcher, DownloadError,
    DownloadStatus, Transfer, TransferPhase,
};

/// The one transfer slot.
#[derive(Default)]
struct Slot {
    transfer: Option<Transfer>,
    cancel: Option<CancelSignal>,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    engine: Arc<dyn TransferEngine>,
    fetcher: Arc<dyn DescriptorFetcher>,
    folder: PathBuf,
    media_extension: String,
    poll_interval: Duration,
    status: StatusBoard,
    slot: Mutex<Slot>,
}

/// Drives at most one transfer at a time from descriptor to tidy content
/// folder, publishing a status line as it goes.
#[derive(Clone)]
pub struct DownloadOrchestrator {
    inner: Arc<Inner>,
}

impl DownloadOrchestrator {
    pub fn new(
        engine: Arc<dyn TransferEngine>,
        fetcher: Arc<dyn DescriptorFetcher>,
        config: &DownloadsConfig,
        status: StatusBoard,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                fetcher,
                folder: config.folder.clone(),
                media_extension: config.media_extension.trim_start_matches('.').to_string(),
                poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
                status,
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    pub fn download_folder(&self) -> &Path {
        &self.inner.folder
    }

    pub fn status_board(&self) -> &StatusBoard {
        &self.inner.status
    }

    /// Snapshot of the current (or most recent) transfer.
    pub async fn current_transfer(&self) -> Option<Transfer> {
        self.inner.slot.lock().await.transfer.clone()
    }

    /// Fetch the descriptor at `locator`, persist it into the download
    /// folder and start the transfer.
    pub async fn start_from_locator(&self, locator: &str) -> Result<Transfer, DownloadError> {
        let file_name = descriptor_file_name(locator);
        let descriptor_path = self.inner.folder.join(&file_name);
        let cancel = self
            .reserve(descriptor_path.clone(), TransferPhase::Fetching)
            .await?;

        info!(locator, path = %descriptor_path.display(), "Starting download");
        self.inner.status.publish(DownloadStatus::new(
            TransferPhase::Fetching,
            format!("Fetching {}", file_name),
        ));

        match self.fetch_and_persist(locator, &descriptor_path).await {
            Ok(name) => self.launch(name, cancel).await,
            Err(e) => {
                self.inner.fail(&e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Start a transfer from a descriptor already in the download folder.
    pub async fn start_from_descriptor_file(&self, path: &Path) -> Result<Transfer, DownloadError> {
        let cancel = self
            .reserve(path.to_path_buf(), TransferPhase::Downloading)
            .await?;

        info!(path = %path.display(), "Resuming download from descriptor");

        let name = async {
            let bytes = fs::read(path).await?;
            parse_descriptor_name(&bytes).map_err(|e| DownloadError::DescriptorParse(e.to_string()))
        }
        .await;

        match name {
            Ok(name) => self.launch(name, cancel).await,
            Err(e) => {
                self.inner.fail(&e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Request cancellation of the running transfer.
    ///
    /// Returns `true` only for the request that was delivered. Repeated
    /// requests, requests while nothing is downloading and requests after
    /// completion are no-ops.
    pub async fn cancel(&self) -> bool {
        let slot = self.inner.slot.lock().await;
        match (&slot.transfer, &slot.cancel) {
            (Some(transfer), Some(signal)) if transfer.phase == TransferPhase::Downloading => {
                let delivered = signal.request();
                if delivered {
                    info!(path = %transfer.descriptor_path.display(), "Cancellation requested");
                } else {
                    debug!("Cancellation already pending");
                }
                delivered
            }
            _ => false,
        }
    }

    /// Declared content name of the descriptor at `locator`, without
    /// starting a transfer.
    pub async fn movie_torrent_name(&self, locator: &str) -> Result<String, DownloadError> {
        let bytes = self.inner.fetcher.fetch(locator).await?;
        parse_descriptor_name(&bytes).map_err(|e| DownloadError::DescriptorParse(e.to_string()))
    }

    /// Leftover descriptor in the download folder, searched recursively.
    pub async fn recover_pending_descriptor(&self) -> Option<PathBuf> {
        let folder = self.inner.folder.clone();
        tokio::task::spawn_blocking(move || find_pending_descriptor(&folder))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Descriptor scan panicked");
                None
            })
    }

    /// Resume a leftover descriptor, if any.
    ///
    /// Descriptors that cannot be parsed are renamed with an `.invalid`
    /// suffix so they stop shadowing valid ones on later scans.
    pub async fn resume_pending(&self) -> Result<Option<Transfer>, DownloadError> {
        while let Some(path) = self.recover_pending_descriptor().await {
            match self.start_from_descriptor_file(&path).await {
                Err(DownloadError::DescriptorParse(reason)) => {
                    let aside = set_aside_path(&path);
                    warn!(
                        path = %path.display(),
                        reason = %reason,
                        "Setting aside unreadable descriptor"
                    );
                    if let Err(e) = fs::rename(&path, &aside).await {
                        warn!(path = %path.display(), error = %e, "Failed to set descriptor aside");
                        return Err(DownloadError::DescriptorParse(reason));
                    }
                }
                other => return other.map(Some),
            }
        }
        Ok(None)
    }

    /// Wait for the running transfer's poll loop to finish.
    pub async fn join_active(&self) {
        let task = self.inner.slot.lock().await.task.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "Transfer task failed");
            }
        }
    }

    async fn reserve(
        &self,
        descriptor_path: PathBuf,
        phase: TransferPhase,
    ) -> Result<CancelSignal, DownloadError> {
        let mut slot = self.inner.slot.lock().await;
        if slot
            .transfer
            .as_ref()
            .is_some_and(|t| !t.phase.is_terminal())
        {
            warn!(path = %descriptor_path.display(), "Rejected download, another is in progress");
            return Err(DownloadError::AlreadyInProgress);
        }

        let cancel = CancelSignal::new();
        slot.transfer = Some(Transfer {
            descriptor_path,
            content_name: None,
            phase,
            started_at: Utc::now(),
        });
        slot.cancel = Some(cancel.clone());
        slot.task = None;
        Ok(cancel)
    }

    async fn fetch_and_persist(&self, locator: &str, path: &Path) -> Result<String, DownloadError> {
        let bytes = self.inner.fetcher.fetch(locator).await?;
        let name =
            parse_descriptor_name(&bytes).map_err(|e| DownloadError::DescriptorParse(e.to_string()))?;

        fs::create_dir_all(&self.inner.folder).await?;
        if let Err(e) = fs::write(path, &bytes).await {
            let _ = fs::remove_file(path).await;
            return Err(e.into());
        }
        debug!(path = %path.display(), name = %name, "Descriptor persisted");
        Ok(name)
    }

    async fn launch(&self, name: String, cancel: CancelSignal) -> Result<Transfer, DownloadError> {
        let mut slot = self.inner.slot.lock().await;
        let transfer = match slot.transfer.as_mut() {
            Some(transfer) => transfer,
            None => return Err(DownloadError::DescriptorParse("transfer vanished".to_string())),
        };
        if transfer.phase.can_transition_to(TransferPhase::Downloading) {
            transfer.phase = TransferPhase::Downloading;
        }
        transfer.content_name = Some(name.clone());
        let snapshot = transfer.clone();

        self.inner.status.publish(DownloadStatus::new(
            TransferPhase::Downloading,
            progress_line(&name, 0.0, 0, 0),
        ));

        let inner = Arc::clone(&self.inner);
        let descriptor = snapshot.descriptor_path.clone();
        slot.task = Some(tokio::spawn(async move {
            inner.run(descriptor, name, cancel).await;
        }));

        Ok(snapshot)
    }
}

impl Inner {
    async fn run(self: Arc<Self>, descriptor: PathBuf, name: String, cancel: CancelSignal) {
        let handle = match self.prepare(&descriptor).await {
            Ok(handle) => handle,
            Err(e) => {
                self.fail(&e.to_string()).await;
                return;
            }
        };

        debug!(name = %name, engine = self.engine.name(), "Transfer poll loop started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.finish_canceled(handle.as_ref(), &descriptor, &name).await;
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let stats = handle.stats();
            if stats.is_complete() || handle.is_seeding() {
                if self.begin_verifying(&cancel).await {
                    self.status.publish(DownloadStatus::new(
                        TransferPhase::Verifying,
                        progress_line(&name, 100.0, stats.active_peers, stats.total_peers),
                    ));
                    self.finish_completed(handle.as_ref(), &descriptor, &name).await;
                } else {
                    self.finish_canceled(handle.as_ref(), &descriptor, &name).await;
                }
                return;
            }

            self.status.publish(DownloadStatus::new(
                TransferPhase::Downloading,
                progress_line(&name, stats.percent(), stats.active_peers, stats.total_peers),
            ));
        }
    }

    async fn prepare(&self, descriptor: &Path) -> Result<Arc<dyn TransferHandle>, DownloadError> {
        let handle = self.engine.add_descriptor(descriptor).await?;
        handle.await_info().await?;
        handle.start_all().await?;
        Ok(handle)
    }

    async fn set_phase(&self, next: TransferPhase) -> bool {
        let mut slot = self.slot.lock().await;
        match slot.transfer.as_mut() {
            Some(transfer) if transfer.phase.can_transition_to(next) => {
                debug!(from = %transfer.phase, to = %next, "Transfer phase change");
                transfer.phase = next;
                true
            }
            Some(transfer) => {
                warn!(from = %transfer.phase, to = %next, "Ignored invalid phase change");
                false
            }
            None => false,
        }
    }

    /// Move to Verifying unless a cancellation got in first.
    async fn begin_verifying(&self, cancel: &CancelSignal) -> bool {
        let mut slot = self.slot.lock().await;
        if cancel.is_requested() {
            return false;
        }
        match slot.transfer.as_mut() {
            Some(transfer) if transfer.phase.can_transition_to(TransferPhase::Verifying) => {
                transfer.phase = TransferPhase::Verifying;
                true
            }
            _ => false,
        }
    }

    async fn fail(&self, reason: &str) {
        error!(reason, "Download failed");
        self.set_phase(TransferPhase::Failed).await;
        self.status
            .publish(DownloadStatus::new(TransferPhase::Failed, failed_line(reason)));
    }

    async fn finish_canceled(&self, handle: &dyn TransferHandle, descriptor: &Path, name: &str) {
        if let Err(e) = handle.stop().await {
            warn!(error = %e, "Failed to stop canceled transfer");
        }

        remove_if_present(descriptor).await;
        if let Some(content) = content_path(&self.folder, name) {
            remove_if_present(&content).await;
        }

        self.set_phase(TransferPhase::Canceled).await;
        self.status
            .publish(DownloadStatus::new(TransferPhase::Canceled, canceled_line(name)));
        let elapsed_secs = self.elapsed_secs().await;
        info!(name, elapsed_secs, "Download canceled");
    }

    async fn finish_completed(&self, handle: &dyn TransferHandle, descriptor: &Path, name: &str) {
        if let Err(e) = handle.stop().await {
            warn!(error = %e, "Failed to stop finished transfer");
        }

        if content_path(&self.folder, name).is_some() {
            let report = tidy_content(&self.folder, name, &self.media_extension).await;
            debug!(removed = report.removed.len(), errors = report.errors.len(), "Tidy-up done");
        }
        remove_if_present(descriptor).await;

        self.set_phase(TransferPhase::Completed).await;
        self.status
            .publish(DownloadStatus::new(TransferPhase::Completed, completed_line(name)));
        let elapsed_secs = self.elapsed_secs().await;
        info!(name, elapsed_secs, "Download completed");
    }

    /// Seconds since the current transfer was reserved.
    async fn elapsed_secs(&self) -> i64 {
        let slot = self.slot.lock().await;
        slot.transfer
            .as_ref()
            .map_or(0, |t| (Utc::now() - t.started_at).num_seconds())
    }
}

/// Remove a file or directory tree, tolerating its absence.
async fn remove_if_present(path: &Path) {
    let result = match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => debug!(path = %path.display(), "Removed"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove"),
    }
}

/// Content location for a declared name, refusing names that would escape
/// the download folder.
fn content_path(folder: &Path, name: &str) -> Option<PathBuf> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(folder.join(name))
}

/// Where an unreadable descriptor is moved: `<name>.torrent.invalid`.
fn set_aside_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".invalid");
    path.with_file_name(name)
}

/// File name a locator's descriptor is persisted under: the last path
/// segment, decoded, with the descriptor extension ensured.
pub fn descriptor_file_name(locator: &str) -> String {
    let without_query = locator.split(['?', '#']).next().unwrap_or(locator);
    let segment = without_query.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let mut name: String = decoded
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();

    if name.trim().is_empty() || name.contains(':') {
        name = "download".to_string();
    }
    if !is_descriptor_path(Path::new(&name)) {
        name = format!("{}.{}", name, DESCRIPTOR_EXTENSION);
    }
    name
}

/// Walk `folder` depth-first in lexical order and return the last
/// descriptor seen.
pub fn find_pending_descriptor(folder: &Path) -> Option<PathBuf> {
    let mut found = None;
    walk(folder, &mut found);
    if let Some(path) = &found {
        info!(path = %path.display(), "Found pending descriptor");
    }
    found
}

fn walk(dir: &Path, found: &mut Option<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %dir.display(), error = %e, "Cannot scan folder");
            }
            return;
        }
    };

    let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        match entry.file_type() {
            Ok(t) if t.is_dir() => walk(&path, found),
            Ok(t) if t.is_file() && is_descriptor_path(&path) => *found = Some(path),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_descriptor_file_name() {
        assert_eq!(
            descriptor_file_name("https://yts.example/torrent/download/ABC123.torrent"),
            "ABC123.torrent"
        );
        assert_eq!(
            descriptor_file_name("https://yts.example/torrent/download/ABC123?x=1"),
            "ABC123.torrent"
        );
        assert_eq!(
            descriptor_file_name("https://yts.example/dl/Heat%20%281995%29.torrent"),
            "Heat (1995).torrent"
        );
        assert_eq!(descriptor_file_name(""), "download.torrent");
    }

    #[test]
    fn test_content_path_rejects_escapes() {
        let folder = Path::new("/downloads");
        assert_eq!(content_path(folder, "Heat"), Some(PathBuf::from("/downloads/Heat")));
        assert!(content_path(folder, "..").is_none());
        assert!(content_path(folder, "a/b").is_none());
        assert!(content_path(folder, "  ").is_none());
    }

    #[test]
    fn test_find_pending_descriptor_recurses() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/nested")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a/nested/one.torrent"), b"x").unwrap();
        std::fs::write(dir.path().join("b/movie.mp4"), b"x").unwrap();

        assert_eq!(
            find_pending_descriptor(dir.path()),
            Some(dir.path().join("a/nested/one.torrent"))
        );
    }

    #[test]
    fn test_find_pending_descriptor_takes_last_in_walk_order() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("z")).unwrap();
        std::fs::write(dir.path().join("a.torrent"), b"x").unwrap();
        std::fs::write(dir.path().join("m.torrent"), b"x").unwrap();
        std::fs::write(dir.path().join("z/y.torrent"), b"x").unwrap();

        assert_eq!(
            find_pending_descriptor(dir.path()),
            Some(dir.path().join("z/y.torrent"))
        );
    }

    #[test]
    fn test_set_aside_path() {
        assert_eq!(
            set_aside_path(Path::new("/downloads/heat.torrent")),
            PathBuf::from("/downloads/heat.torrent.invalid")
        );
        assert!(!is_descriptor_path(&set_aside_path(Path::new("a/b.torrent"))));
    }

    #[test]
    fn test_find_pending_descriptor_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        assert!(find_pending_descriptor(dir.path()).is_none());
        assert!(find_pending_descriptor(&dir.path().join("missing")).is_none());
    }
}
