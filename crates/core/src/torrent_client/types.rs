//! Types for transfer engine operations.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during transfer engine operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Engine startup failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("Engine error: {0}")]
    ApiError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Point-in-time progress of a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    pub bytes_completed: u64,
    pub total_size: u64,
    /// Peers currently exchanging data.
    pub active_peers: u32,
    /// Peers known to the engine, connected or not.
    pub total_peers: u32,
    /// Content name, once the engine knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TransferStats {
    /// Percent complete, `bytes_completed / total_size * 100`. Zero while the
    /// size is unknown.
    pub fn percent(&self) -> f64 {
        if self.total_size == 0 {
            return 0.0;
        }
        self.bytes_completed as f64 / self.total_size as f64 * 100.0
    }

    /// All bytes present.
    pub fn is_complete(&self) -> bool {
        self.total_size > 0 && self.bytes_completed >= self.total_size
    }
}

/// A transfer added to an engine.
#[async_trait]
pub trait TransferHandle: Send + Sync {
    /// Wait until the engine has the transfer's metadata.
    async fn await_info(&self) -> Result<(), TorrentClientError>;

    /// Start downloading every file of the transfer.
    async fn start_all(&self) -> Result<(), TorrentClientError>;

    /// Current progress.
    fn stats(&self) -> TransferStats;

    /// Whether all data is present and the engine is only uploading.
    fn is_seeding(&self) -> bool;

    /// Stop the transfer and release it from the engine. Files stay on disk.
    async fn stop(&self) -> Result<(), TorrentClientError>;
}

/// Trait for engines that perform the actual peer-to-peer exchange.
#[async_trait]
pub trait TransferEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Add the descriptor file at `path`. The transfer does not start until
    /// [`TransferHandle::start_all`] is called.
    async fn add_descriptor(&self, path: &Path) -> Result<Arc<dyn TransferHandle>, TorrentClientError>;
}
