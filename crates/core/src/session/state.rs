//! The browsing session state machine.
//!
//! [`Session::handle`] applies a user command and returns the effects to run;
//! [`Session::apply`] folds a delivered result back in. Neither performs I/O,
//! so every mutation happens on the caller's single event loop.

use tracing::debug;

use crate::catalog::{total_pages, ResultItem};
use crate::config::Config;
use crate::download::{DownloadStatus, TransferPhase};
use crate::query::{FilterParser, SearchQuery};
use crate::subtitles::SubtitleCandidate;

use super::types::{Command, Effect, RequestId, SessionMessage, SessionState, ViewMode};

pub const SUBTITLES_DISABLED_NOTICE: &str = "Subtitles are disabled (set subtitles.enabled)";
pub const NO_SUBTITLES_NOTICE: &str = "No subtitles found";
pub const NO_VARIANT_NOTICE: &str = "No torrent for the preferred resolution";

#[derive(Debug, Clone)]
struct PendingSearch {
    request_id: RequestId,
    query: SearchQuery,
}

/// Mutable root of the user-facing state.
#[derive(Debug)]
pub struct Session {
    parser: FilterParser,
    subtitles_enabled: bool,

    query: SearchQuery,
    current_page: u32,
    total_pages: u32,
    total_count: u64,
    items: Vec<ResultItem>,
    subtitles: Vec<SubtitleCandidate>,
    view_mode: ViewMode,
    selected_item: usize,
    selected_subtitle: usize,

    pending_search: Option<PendingSearch>,
    pending_subtitles: Option<RequestId>,
    next_request_id: RequestId,

    download_status: DownloadStatus,
    cancel_pending: bool,
    notice: Option<String>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let parser = FilterParser::new(config.catalog.order_by.clone());
        Self {
            query: parser.parse("", 1),
            parser,
            subtitles_enabled: config.subtitles.enabled,
            current_page: 1,
            total_pages: 1,
            total_count: 0,
            items: Vec::new(),
            subtitles: Vec::new(),
            view_mode: ViewMode::Results,
            selected_item: 0,
            selected_subtitle: 0,
            pending_search: None,
            pending_subtitles: None,
            next_request_id: 1,
            download_status: DownloadStatus::default(),
            cancel_pending: false,
            notice: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.pending_search.is_some() {
            SessionState::Loading
        } else if self.view_mode == ViewMode::Subtitles {
            SessionState::ViewingSubtitles
        } else {
            SessionState::Browsing
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending_search.is_some()
    }

    /// A subtitle lookup is in flight.
    pub fn is_finding_subtitles(&self) -> bool {
        self.pending_subtitles.is_some()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn subtitles(&self) -> &[SubtitleCandidate] {
        &self.subtitles
    }

    pub fn selected_index(&self) -> usize {
        match self.view_mode {
            ViewMode::Results => self.selected_item,
            ViewMode::Subtitles => self.selected_subtitle,
        }
    }

    pub fn selected_item(&self) -> Option<&ResultItem> {
        self.items.get(self.selected_item)
    }

    pub fn selected_subtitle(&self) -> Option<&SubtitleCandidate> {
        self.subtitles.get(self.selected_subtitle)
    }

    pub fn download_status(&self) -> &DownloadStatus {
        &self.download_status
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// `" <total> movie/s - Page <current>/<pages> "`
    pub fn page_header(&self) -> String {
        format!(
            " {} movie/s - Page {}/{} ",
            self.total_count, self.current_page, self.total_pages
        )
    }

    /// Apply a user command.
    pub fn handle(&mut self, command: Command) -> Vec<Effect> {
        debug!(?command, state = ?self.state(), "Session command");
        match command {
            Command::Submit(text) => {
                let query = self.parser.parse(&text, 1);
                vec![self.issue_search(query)]
            }
            Command::NextPage => self.turn_page(1),
            Command::PrevPage => self.turn_page(-1),
            Command::ToggleSubtitles => self.toggle_subtitles(),
            Command::RequestDownload => self.request_download(),
            Command::CancelDownload => {
                // The orchestrator only accepts a cancel while bytes are moving.
                if self.download_status.phase != Some(TransferPhase::Downloading)
                    || self.cancel_pending
                {
                    return Vec::new();
                }
                self.cancel_pending = true;
                vec![Effect::CancelDownload]
            }
            Command::SelectNext => {
                let len = self.visible_len();
                let selected = self.selected_mut();
                if *selected + 1 < len {
                    *selected += 1;
                }
                Vec::new()
            }
            Command::SelectPrevious => {
                let selected = self.selected_mut();
                *selected = selected.saturating_sub(1);
                Vec::new()
            }
        }
    }

    /// Fold a delivered result into the session. Returns `false` when the
    /// message was stale and ignored.
    pub fn apply(&mut self, message: SessionMessage) -> bool {
        match message {
            SessionMessage::SearchCompleted { request_id, result } => {
                let pending = match self.pending_search.take() {
                    Some(p) if p.request_id == request_id => p,
                    other => {
                        debug!(request_id, "Dropping stale search result");
                        self.pending_search = other;
                        return false;
                    }
                };

                match result {
                    Ok(page) => {
                        self.total_count = page.total_count;
                        self.total_pages = total_pages(page.total_count);
                        self.current_page = pending.query.page.clamp(1, self.total_pages);
                        self.query = pending.query;
                        self.items = page.items;
                        self.selected_item = 0;
                        // A lookup for the replaced list no longer matches any item.
                        self.pending_subtitles = None;
                        self.view_mode = ViewMode::Results;
                        self.notice = None;
                    }
                    Err(e) => {
                        self.notice = Some(format!("Search failed: {}", e));
                    }
                }
                true
            }
            SessionMessage::SubtitlesLoaded { request_id, result } => {
                if self.pending_subtitles != Some(request_id) {
                    debug!(request_id, "Dropping stale subtitle list");
                    return false;
                }
                self.pending_subtitles = None;

                match result {
                    Ok(candidates) if candidates.is_empty() => {
                        self.notice = Some(NO_SUBTITLES_NOTICE.to_string());
                    }
                    Ok(candidates) => {
                        self.subtitles = candidates;
                        self.selected_subtitle = 0;
                        self.view_mode = ViewMode::Subtitles;
                        self.notice = None;
                    }
                    Err(e) => {
                        self.notice = Some(e);
                    }
                }
                true
            }
            SessionMessage::Notice(text) => {
                self.notice = Some(text);
                true
            }
            SessionMessage::DownloadStatus(status) => {
                if status.phase != Some(TransferPhase::Downloading) {
                    self.cancel_pending = false;
                }
                self.download_status = status;
                true
            }
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    fn issue_search(&mut self, query: SearchQuery) -> Effect {
        let request_id = self.next_id();
        self.pending_search = Some(PendingSearch {
            request_id,
            query: query.clone(),
        });
        Effect::Search { request_id, query }
    }

    fn turn_page(&mut self, delta: i64) -> Vec<Effect> {
        // Paging follows committed state; wait for the in-flight page first.
        if self.pending_search.is_some() {
            return Vec::new();
        }
        let target = self.current_page as i64 + delta;
        if target < 1 || target > self.total_pages as i64 {
            return Vec::new();
        }
        if self.view_mode == ViewMode::Subtitles {
            self.view_mode = ViewMode::Results;
        }
        let query = self.query.with_page(target as u32);
        vec![self.issue_search(query)]
    }

    fn toggle_subtitles(&mut self) -> Vec<Effect> {
        if self.view_mode == ViewMode::Subtitles {
            self.view_mode = ViewMode::Results;
            return Vec::new();
        }
        if !self.subtitles_enabled {
            self.notice = Some(SUBTITLES_DISABLED_NOTICE.to_string());
            return Vec::new();
        }
        let Some(item) = self.selected_item() else {
            return Vec::new();
        };
        let (year, title) = (item.year.clone(), item.title.clone());

        let request_id = self.next_id();
        self.pending_subtitles = Some(request_id);
        vec![Effect::FindSubtitles {
            request_id,
            year,
            title,
        }]
    }

    fn request_download(&mut self) -> Vec<Effect> {
        let Some(item) = self.selected_item() else {
            return Vec::new();
        };
        let Some(locator) = item.tech_spec().locator.clone() else {
            self.notice = Some(NO_VARIANT_NOTICE.to_string());
            return Vec::new();
        };

        match self.view_mode {
            ViewMode::Results => vec![Effect::StartDownload { locator }],
            ViewMode::Subtitles => match self.selected_subtitle() {
                Some(candidate) => vec![Effect::DownloadSubtitle {
                    locator,
                    candidate: candidate.clone(),
                }],
                None => Vec::new(),
            },
        }
    }

    fn visible_len(&self) -> usize {
        match self.view_mode {
            ViewMode::Results => self.items.len(),
            ViewMode::Subtitles => self.subtitles.len(),
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self.view_mode {
            ViewMode::Results => &mut self.selected_item,
            ViewMode::Subtitles => &mut self.selected_subtitle,
        }
    }
}
