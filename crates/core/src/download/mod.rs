//! Download orchestration.
//!
//! The [`DownloadOrchestrator`] owns the single active transfer:
//! - **Start**: from a descriptor locator (fetched and persisted into the
//!   download folder) or from a descriptor file left by a previous run
//! - **Poll**: progress is republished on a [`StatusBoard`] at a fixed interval
//! - **Finish**: completion tidies the content folder, cancellation removes
//!   the descriptor and partial content

mod cancel;
mod fetcher;
mod orchestrator;
mod status;
mod tidy;
mod types;

pub use cancel::CancelSignal;
pub use fetcher::HttpDescriptorFetcher;
pub use orchestrator::{descriptor_file_name, find_pending_descriptor, DownloadOrchestrator};
pub use status::StatusBoard;
pub use tidy::{tidy_content, TidyReport};
pub use types::*;
