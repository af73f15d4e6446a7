//! Mock transfer engine for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{TorrentClientError, TransferEngine, TransferHandle, TransferStats};

/// Scripted transfer handed out by [`MockTransferEngine`].
///
/// Progress is whatever the test last set; `stats()` is read on every poll,
/// so changing it drives the orchestrator's loop.
#[derive(Debug, Default)]
pub struct MockTransferHandle {
    bytes_completed: AtomicU64,
    total_size: AtomicU64,
    active_peers: AtomicU32,
    total_peers: AtomicU32,
    seeding: AtomicBool,
    started: AtomicBool,
    stop_calls: AtomicUsize,
    stats_calls: AtomicUsize,
}

impl MockTransferHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_progress(&self, bytes_completed: u64, total_size: u64) {
        self.total_size.store(total_size, Ordering::SeqCst);
        self.bytes_completed.store(bytes_completed, Ordering::SeqCst);
    }

    pub fn set_peers(&self, active: u32, total: u32) {
        self.active_peers.store(active, Ordering::SeqCst);
        self.total_peers.store(total, Ordering::SeqCst);
    }

    pub fn set_seeding(&self, seeding: bool) {
        self.seeding.store(seeding, Ordering::SeqCst);
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransferHandle for MockTransferHandle {
    async fn await_info(&self) -> Result<(), TorrentClientError> {
        Ok(())
    }

    async fn start_all(&self) -> Result<(), TorrentClientError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stats(&self) -> TransferStats {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        TransferStats {
            bytes_completed: self.bytes_completed.load(Ordering::SeqCst),
            total_size: self.total_size.load(Ordering::SeqCst),
            active_peers: self.active_peers.load(Ordering::SeqCst),
            total_peers: self.total_peers.load(Ordering::SeqCst),
            name: None,
        }
    }

    fn is_seeding(&self) -> bool {
        self.seeding.load(Ordering::SeqCst)
    }

    async fn stop(&self) -> Result<(), TorrentClientError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock implementation of the TransferEngine trait.
///
/// Every added descriptor gets the same shared [`MockTransferHandle`].
///
/// # Example
///
/// ```rust,ignore
/// let engine = Arc::new(MockTransferEngine::new());
/// let orchestrator = DownloadOrchestrator::new(engine.clone(), fetcher, &config, StatusBoard::new());
///
/// orchestrator.start_from_locator("https://t.example/a.torrent").await?;
/// engine.handle().set_progress(100, 100);
/// orchestrator.join_active().await;
///
/// assert_eq!(engine.handle().stop_calls(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockTransferEngine {
    handle: Arc<MockTransferHandle>,
    added: Arc<RwLock<Vec<PathBuf>>>,
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
}

impl MockTransferEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Arc<MockTransferHandle> {
        Arc::clone(&self.handle)
    }

    /// Descriptor paths passed to `add_descriptor`.
    pub async fn added_descriptors(&self) -> Vec<PathBuf> {
        self.added.read().await.clone()
    }

    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl TransferEngine for MockTransferEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_descriptor(
        &self,
        path: &Path,
    ) -> Result<Arc<dyn TransferHandle>, TorrentClientError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        self.added.write().await.push(path.to_path_buf());
        Ok(self.handle())
    }
}
