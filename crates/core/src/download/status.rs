use tokio::sync::watch;

use super::types::DownloadStatus;

/// Process-wide download status. Every publish overwrites the previous
/// value; readers only ever see the latest one.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    tx: watch::Sender<DownloadStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(DownloadStatus::default());
        Self { tx }
    }

    pub fn publish(&self, status: DownloadStatus) {
        self.tx.send_replace(status);
    }

    /// The current value.
    pub fn current(&self) -> DownloadStatus {
        self.tx.borrow().clone()
    }

    /// A receiver that is notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<DownloadStatus> {
        self.tx.subscribe()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::TransferPhase;

    #[test]
    fn test_last_write_wins() {
        let board = StatusBoard::new();
        assert_eq!(board.current(), DownloadStatus::default());

        board.publish(DownloadStatus::new(TransferPhase::Downloading, "a | Progress 1.00%"));
        board.publish(DownloadStatus::new(TransferPhase::Completed, "a Completed!"));

        assert_eq!(board.current().line, "a Completed!");
        assert_eq!(board.current().phase, Some(TransferPhase::Completed));
    }

    #[tokio::test]
    async fn test_subscriber_sees_latest() {
        let board = StatusBoard::new();
        let mut rx = board.subscribe();

        board.publish(DownloadStatus::new(TransferPhase::Downloading, "first"));
        board.publish(DownloadStatus::new(TransferPhase::Downloading, "second"));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().line, "second");
    }
}
