pub mod catalog;
pub mod config;
pub mod download;
pub mod query;
pub mod session;
pub mod subtitles;
pub mod testing;
pub mod torrent_client;

pub use catalog::{
    select_variant, total_pages, CatalogError, CatalogRequest, CatalogSearchClient, CatalogSource,
    ResultItem, SearchPage, TechSpec, YtsCatalogSource, PAGE_SIZE,
};
pub use config::{
    default_config_path, load_config, load_config_from_str, load_config_or_default,
    validate_config, Config, ConfigError,
};
pub use download::{
    DescriptorFetcher, DownloadError, DownloadOrchestrator, DownloadStatus, HttpDescriptorFetcher,
    StatusBoard, Transfer, TransferPhase,
};
pub use query::{FilterParser, SearchQuery};
pub use session::{Command, Effect, Session, SessionMessage, SessionRuntime, SessionState, ViewMode};
pub use subtitles::{
    OpenSubtitlesSource, SubtitleCandidate, SubtitleCorrelator, SubtitleError, SubtitleSource,
};
pub use torrent_client::{
    LibrqbitEngine, TorrentClientError, TransferEngine, TransferHandle, TransferStats,
};
