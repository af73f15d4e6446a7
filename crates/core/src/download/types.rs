//! Types for the download orchestrator.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::torrent_client::TorrentClientError;

/// Errors that can occur while starting or running a transfer.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The descriptor could not be retrieved from its locator.
    #[error("descriptor fetch failed: {0}")]
    DescriptorFetch(String),

    /// The descriptor bytes are not a usable descriptor.
    #[error("descriptor parse failed: {0}")]
    DescriptorParse(String),

    /// Another transfer is not yet terminal.
    #[error("a download is already in progress")]
    AlreadyInProgress,

    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("transfer engine error: {0}")]
    Engine(#[from] TorrentClientError),
}

/// Lifecycle phase of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPhase {
    Idle,
    Fetching,
    Downloading,
    Verifying,
    Completed,
    Canceled,
    Failed,
}

impl TransferPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPhase::Idle => "idle",
            TransferPhase::Fetching => "fetching",
            TransferPhase::Downloading => "downloading",
            TransferPhase::Verifying => "verifying",
            TransferPhase::Completed => "completed",
            TransferPhase::Canceled => "canceled",
            TransferPhase::Failed => "failed",
        }
    }

    /// Completed, Canceled and Failed are final.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferPhase::Completed | TransferPhase::Canceled | TransferPhase::Failed
        )
    }

    /// Valid phase transitions.
    pub fn can_transition_to(&self, next: TransferPhase) -> bool {
        use TransferPhase::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Idle, Downloading)
                | (Fetching, Downloading)
                | (Fetching, Failed)
                | (Downloading, Verifying)
                | (Downloading, Canceled)
                | (Downloading, Failed)
                | (Verifying, Completed)
        )
    }
}

impl std::fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transfer as seen from outside the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Where the descriptor is persisted in the download folder.
    pub descriptor_path: PathBuf,
    /// Declared content name, known once the descriptor is parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_name: Option<String>,
    pub phase: TransferPhase,
    /// When the start request was accepted.
    pub started_at: DateTime<Utc>,
}

/// The single, last-write-wins download status value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadStatus {
    /// Phase of the most recent transfer; `None` before any transfer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<TransferPhase>,
    /// Human-readable status line; empty before any transfer.
    pub line: String,
}

impl DownloadStatus {
    pub fn new(phase: TransferPhase, line: impl Into<String>) -> Self {
        Self {
            phase: Some(phase),
            line: line.into(),
        }
    }

    /// A transfer is running (fetching through verifying).
    pub fn is_active(&self) -> bool {
        self.phase.is_some_and(|p| !p.is_terminal() && p != TransferPhase::Idle)
    }
}

/// Progress line for a running transfer.
pub fn progress_line(name: &str, percent: f64, active_peers: u32, total_peers: u32) -> String {
    format!(
        "{} | Progress {:.2}% | Peers {}/{}",
        name, percent, active_peers, total_peers
    )
}

pub fn completed_line(name: &str) -> String {
    format!("{} Completed!", name)
}

pub fn canceled_line(name: &str) -> String {
    format!("{} Canceled!", name)
}

pub fn failed_line(reason: &str) -> String {
    format!("Download failed: {}", reason)
}

/// Trait for retrieving descriptor bytes from a locator.
#[async_trait]
pub trait DescriptorFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, DownloadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(TransferPhase::Completed.is_terminal());
        assert!(TransferPhase::Canceled.is_terminal());
        assert!(TransferPhase::Failed.is_terminal());
        assert!(!TransferPhase::Downloading.is_terminal());
        assert!(!TransferPhase::Verifying.is_terminal());
    }

    #[test]
    fn test_transitions() {
        use TransferPhase::*;
        assert!(Idle.can_transition_to(Fetching));
        assert!(Fetching.can_transition_to(Downloading));
        assert!(Downloading.can_transition_to(Verifying));
        assert!(Verifying.can_transition_to(Completed));
        assert!(Downloading.can_transition_to(Canceled));
        assert!(Fetching.can_transition_to(Failed));

        assert!(!Completed.can_transition_to(Canceled));
        assert!(!Verifying.can_transition_to(Canceled));
        assert!(!Fetching.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Downloading));
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            progress_line("Heat (1995)", 12.346, 3, 17),
            "Heat (1995) | Progress 12.35% | Peers 3/17"
        );
        assert_eq!(completed_line("Heat"), "Heat Completed!");
        assert_eq!(canceled_line("Heat"), "Heat Canceled!");
        assert_eq!(failed_line("no peers"), "Download failed: no peers");
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&TransferPhase::Downloading).unwrap();
        assert_eq!(json, "\"downloading\"");
    }
}
