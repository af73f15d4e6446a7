//! Executes session effects against the live services.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::CatalogSearchClient;
use crate::download::DownloadOrchestrator;
use crate::subtitles::{SubtitleCandidate, SubtitleCorrelator};

use super::state::Session;
use super::types::{Command, Effect, SessionMessage};

pub const SUBTITLE_NOT_DOWNLOADED_NOTICE: &str = "Subtitle could not be downloaded";

/// Runs effects as background tasks and reports back over a channel.
///
/// Every task delivers at most one [`SessionMessage`]; the session decides
/// whether that message is still relevant.
#[derive(Clone)]
pub struct SessionRuntime {
    catalog: Arc<CatalogSearchClient>,
    subtitles: Arc<SubtitleCorrelator>,
    downloads: DownloadOrchestrator,
    tx: mpsc::UnboundedSender<SessionMessage>,
}

impl SessionRuntime {
    pub fn new(
        catalog: Arc<CatalogSearchClient>,
        subtitles: Arc<SubtitleCorrelator>,
        downloads: DownloadOrchestrator,
        tx: mpsc::UnboundedSender<SessionMessage>,
    ) -> Self {
        Self {
            catalog,
            subtitles,
            downloads,
            tx,
        }
    }

    pub fn downloads(&self) -> &DownloadOrchestrator {
        &self.downloads
    }

    /// Spawn the task for `effect`.
    pub fn execute(&self, effect: Effect) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run(effect).await })
    }

    /// Run `effect` to completion on the current task.
    pub async fn run(&self, effect: Effect) {
        match effect {
            Effect::Search { request_id, query } => {
                let result = self.catalog.search(&query).await.map_err(|e| {
                    warn!(request_id, error = %e, "Search failed");
                    e.to_string()
                });
                self.send(SessionMessage::SearchCompleted { request_id, result });
            }
            Effect::FindSubtitles {
                request_id,
                year,
                title,
            } => {
                let result = self
                    .subtitles
                    .find_candidates(&year, &title)
                    .await
                    .map_err(|e| {
                        warn!(request_id, error = %e, "Subtitle lookup failed");
                        e.to_string()
                    });
                self.send(SessionMessage::SubtitlesLoaded { request_id, result });
            }
            Effect::StartDownload { locator } => {
                if let Err(e) = self.downloads.start_from_locator(&locator).await {
                    // Failures after reservation already reach the status line.
                    self.send(SessionMessage::Notice(e.to_string()));
                }
            }
            Effect::DownloadSubtitle { locator, candidate } => {
                let notice = self.download_subtitle(&locator, &candidate).await;
                self.send(SessionMessage::Notice(notice));
            }
            Effect::CancelDownload => {
                if !self.downloads.cancel().await {
                    debug!("Cancel had nothing to act on");
                }
            }
        }
    }

    async fn download_subtitle(&self, locator: &str, candidate: &SubtitleCandidate) -> String {
        let name = match self.downloads.movie_torrent_name(locator).await {
            Ok(name) => name,
            Err(e) => return e.to_string(),
        };

        let code = match self.subtitles.resolve_download_code(candidate).await {
            Ok(Some(code)) => code,
            Ok(None) => return SUBTITLE_NOT_DOWNLOADED_NOTICE.to_string(),
            Err(e) => return e.to_string(),
        };

        match self
            .subtitles
            .fetch_and_store(&code, &name, self.downloads.download_folder())
            .await
        {
            Ok(path) => {
                info!(path = %path.display(), "Subtitle downloaded");
                format!("{}.srt Downloaded!", name)
            }
            Err(e) => {
                error!(error = %e, "Subtitle download failed");
                e.to_string()
            }
        }
    }

    fn send(&self, message: SessionMessage) {
        if self.tx.send(message).is_err() {
            debug!("Session receiver dropped");
        }
    }

    /// Forward every download status change into the session channel until
    /// either side goes away.
    pub fn spawn_status_forwarder(&self) -> JoinHandle<()> {
        let mut rx = self.downloads.status_board().subscribe();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let status = rx.borrow_and_update().clone();
                if tx.send(SessionMessage::DownloadStatus(status)).is_err() {
                    break;
                }
            }
        })
    }

    /// Resume a leftover transfer, then issue the initial search when
    /// `init_search` is set.
    pub async fn startup(&self, session: &mut Session, init_search: bool) {
        match self.downloads.resume_pending().await {
            Ok(Some(transfer)) => {
                info!(path = %transfer.descriptor_path.display(), "Resumed pending download")
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Could not resume pending download");
                self.send(SessionMessage::Notice(e.to_string()));
            }
        }

        if init_search {
            for effect in session.handle(Command::Submit(String::new())) {
                self.execute(effect);
            }
        }
    }
}
