//! Browsing session: the state machine behind the terminal UI and the
//! runtime that executes its effects.

mod runner;
mod state;
mod types;

pub use runner::{SessionRuntime, SUBTITLE_NOT_DOWNLOADED_NOTICE};
pub use state::{Session, NO_SUBTITLES_NOTICE, NO_VARIANT_NOTICE, SUBTITLES_DISABLED_NOTICE};
pub use types::*;
