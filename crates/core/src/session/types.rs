//! Types for the browsing session.

use serde::{Deserialize, Serialize};

use crate::catalog::SearchPage;
use crate::download::DownloadStatus;
use crate::query::SearchQuery;
use crate::subtitles::SubtitleCandidate;

/// Identity of an async request issued by the session. Responses carrying
/// an identity other than the one awaited are stale and dropped.
pub type RequestId = u64;

/// Which list is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Results,
    Subtitles,
}

/// Derived session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Browsing,
    /// A search is in flight.
    Loading,
    ViewingSubtitles,
}

/// User input, already mapped from key presses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    NextPage,
    PrevPage,
    ToggleSubtitles,
    RequestDownload,
    CancelDownload,
    SelectNext,
    SelectPrevious,
}

/// Work the session asks to have done off the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Search {
        request_id: RequestId,
        query: SearchQuery,
    },
    FindSubtitles {
        request_id: RequestId,
        year: String,
        title: String,
    },
    StartDownload {
        locator: String,
    },
    /// Store `candidate` under the content name of the descriptor at `locator`.
    DownloadSubtitle {
        locator: String,
        candidate: SubtitleCandidate,
    },
    CancelDownload,
}

/// Results delivered back into the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    SearchCompleted {
        request_id: RequestId,
        result: Result<SearchPage, String>,
    },
    SubtitlesLoaded {
        request_id: RequestId,
        result: Result<Vec<SubtitleCandidate>, String>,
    },
    /// One-line message for the user.
    Notice(String),
    DownloadStatus(DownloadStatus),
}
