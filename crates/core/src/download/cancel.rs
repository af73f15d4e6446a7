use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// One-shot cancellation for a single transfer.
///
/// Only the first [`request`](Self::request) is delivered; later calls are
/// no-ops that return `false`.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    requested: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `true` only for the call that
    /// delivered it.
    pub fn request(&self) -> bool {
        if self.requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_request_is_delivered_once() {
        let signal = CancelSignal::new();
        assert!(!signal.is_requested());
        assert!(signal.request());
        assert!(!signal.request());
        assert!(!signal.clone().request());
        assert!(signal.is_requested());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_for_clones() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        let waiter = tokio::spawn(async move { observer.cancelled().await });

        signal.request();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
