//! Subtitle lookup and download.
//!
//! [`SubtitleCorrelator`] ranks candidates for a catalog movie, resolves a
//! chosen candidate to a download code and stores the extracted `.srt` next
//! to the transfer it belongs to.

mod correlator;
mod opensubs;
mod types;

pub use correlator::{slug, SubtitleCorrelator};
pub use opensubs::OpenSubtitlesSource;
pub use types::*;
