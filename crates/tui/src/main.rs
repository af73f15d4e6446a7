mod app;
mod input;
mod theme;
mod ui;

use std::fs::{self, File};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bitsmuggler_core::{
    default_config_path, load_config_or_default, validate_config, CatalogSearchClient,
    DownloadOrchestrator, HttpDescriptorFetcher, LibrqbitEngine, OpenSubtitlesSource,
    SessionRuntime, StatusBoard, SubtitleCorrelator, YtsCatalogSource,
};

use app::App;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("bitsmuggler: {:#}", e);
        std::process::exit(1);
    }
}

/// Log to a file: the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

async fn run() -> Result<()> {
    let config_path = default_config_path();
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(&config.log.file)?;
    info!(version = VERSION, config = ?config_path, "Starting bitsmuggler");
    info!(
        catalog = %config.catalog.host,
        folder = %config.downloads.folder.display(),
        subtitles = config.subtitles.enabled,
        "Configuration loaded"
    );

    let catalog_source =
        YtsCatalogSource::new(&config.catalog).context("Failed to create catalog source")?;
    let catalog = Arc::new(CatalogSearchClient::new(
        Arc::new(catalog_source),
        &config.catalog,
    ));

    let subtitle_source =
        OpenSubtitlesSource::new(&config.subtitles).context("Failed to create subtitle source")?;
    let subtitles = Arc::new(SubtitleCorrelator::new(
        Arc::new(subtitle_source),
        &config.subtitles,
    ));

    let engine = LibrqbitEngine::new(&config.downloads)
        .await
        .context("Failed to start transfer engine")?;
    let fetcher = HttpDescriptorFetcher::new(config.catalog.timeout_secs)
        .context("Failed to create descriptor fetcher")?;
    let downloads = DownloadOrchestrator::new(
        Arc::new(engine),
        Arc::new(fetcher),
        &config.downloads,
        StatusBoard::new(),
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let runtime = SessionRuntime::new(catalog, subtitles, downloads, tx);
    let app = App::new(&config, runtime);

    let mut terminal = ratatui::init();
    let result = app::run(&mut terminal, app, rx, config.catalog.init_search).await;
    ratatui::restore();

    result
}
