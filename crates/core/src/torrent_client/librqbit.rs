//! librqbit embedded transfer engine implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use librqbit::{
    AddTorrent as RqbitAddTorrent, AddTorrentOptions, AddTorrentResponse, ManagedTorrent, Session,
    SessionOptions, TorrentStatsState,
};
use tracing::{debug, info, warn};

use super::{TorrentClientError, TransferEngine, TransferHandle, TransferStats};
use crate::config::DownloadsConfig;

/// Embedded librqbit session writing into the download folder.
pub struct LibrqbitEngine {
    session: Arc<Session>,
}

impl LibrqbitEngine {
    /// Start a session whose output folder is `config.folder`.
    pub async fn new(config: &DownloadsConfig) -> Result<Self, TorrentClientError> {
        let download_path = PathBuf::from(&config.folder);

        if !download_path.exists() {
            std::fs::create_dir_all(&download_path).map_err(|e| {
                TorrentClientError::ConnectionFailed(format!(
                    "Failed to create download directory: {}",
                    e
                ))
            })?;
        }

        let mut opts = SessionOptions::default();
        if !config.enable_dht {
            opts.disable_dht = true;
        }
        if let Some(port) = config.listen_port {
            opts.listen_port_range = Some(listen_range(port)?);
        }

        info!(
            download_path = %download_path.display(),
            dht_enabled = !opts.disable_dht,
            "Initializing librqbit session"
        );

        let session = Session::new_with_opts(download_path, opts)
            .await
            .map_err(|e| {
                TorrentClientError::ConnectionFailed(format!(
                    "Failed to initialize librqbit session: {}",
                    e
                ))
            })?;

        if let Some(port) = session.tcp_listen_port() {
            info!(port = port, "librqbit listening on TCP port");
        }

        Ok(Self { session })
    }
}

#[async_trait]
impl TransferEngine for LibrqbitEngine {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn add_descriptor(&self, path: &Path) -> Result<Arc<dyn TransferHandle>, TorrentClientError> {
        let bytes = tokio::fs::read(path).await?;

        // Added paused so nothing is written before start_all. Existing files
        // from an interrupted run are checked and reused.
        let opts = AddTorrentOptions {
            paused: true,
            overwrite: true,
            ..Default::default()
        };

        let response = self
            .session
            .add_torrent(RqbitAddTorrent::from_bytes(bytes), Some(opts))
            .await
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to add torrent: {}", e)))?;

        let torrent = match response {
            AddTorrentResponse::Added(_, handle) => {
                debug!(path = %path.display(), name = ?handle.name(), "Torrent added");
                handle
            }
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                warn!(path = %path.display(), "Torrent already managed, reusing it");
                handle
            }
            AddTorrentResponse::ListOnly(_) => {
                return Err(TorrentClientError::ApiError(
                    "Torrent was added in list-only mode".to_string(),
                ))
            }
        };

        Ok(Arc::new(LibrqbitTransfer {
            session: self.session.clone(),
            torrent,
        }))
    }
}

/// One torrent managed by the session.
struct LibrqbitTransfer {
    session: Arc<Session>,
    torrent: Arc<ManagedTorrent>,
}

#[async_trait]
impl TransferHandle for LibrqbitTransfer {
    async fn await_info(&self) -> Result<(), TorrentClientError> {
        self.torrent
            .wait_until_initialized()
            .await
            .map_err(|e| TorrentClientError::ApiError(format!("Torrent failed to initialize: {}", e)))
    }

    async fn start_all(&self) -> Result<(), TorrentClientError> {
        if !self.torrent.is_paused() {
            return Ok(());
        }
        self.session
            .unpause(&self.torrent)
            .await
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to start torrent: {}", e)))
    }

    fn stats(&self) -> TransferStats {
        let stats = self.torrent.stats();

        let (active_peers, total_peers) = stats
            .live
            .as_ref()
            .map(|live| {
                let peers = &live.snapshot.peer_stats;
                (peers.live as u32, (peers.queued + peers.connecting + peers.live) as u32)
            })
            .unwrap_or((0, 0));

        TransferStats {
            bytes_completed: stats.progress_bytes,
            total_size: stats.total_bytes,
            active_peers,
            total_peers,
            name: self.torrent.name().map(|s| s.to_string()),
        }
    }

    fn is_seeding(&self) -> bool {
        let stats = self.torrent.stats();
        matches!(stats.state, TorrentStatsState::Live) && stats.finished
    }

    async fn stop(&self) -> Result<(), TorrentClientError> {
        let id = self.torrent.id();
        self.session
            .delete(id.into(), false)
            .await
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to remove torrent: {}", e)))?;
        debug!(id = id, "Torrent removed from session");
        Ok(())
    }
}

/// Single-port listen range (librqbit takes a half-open `Range`).
fn listen_range(port: u16) -> Result<std::ops::Range<u16>, TorrentClientError> {
    let end = port.checked_add(1).ok_or_else(|| {
        TorrentClientError::ConnectionFailed(format!("listen port {} is out of range", port))
    })?;
    Ok(port..end)
}
