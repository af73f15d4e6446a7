use super::{types::Config, ConfigError};
use crate::query::{is_known_order, SUPPORTED_QUALITIES};

/// Validate configuration
/// Currently validates:
/// - Catalog and subtitle hosts are http(s) URLs
/// - Preferred quality is one the catalog offers
/// - Default order is a known order key
/// - Subtitle language is set
/// - Poll interval is not 0
/// - Listen port, when set, leaves room for a half-open range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (key, host) in [
        ("catalog.host", &config.catalog.host),
        ("subtitles.host", &config.subtitles.host),
        ("subtitles.download_host", &config.subtitles.download_host),
    ] {
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be an http(s) URL, got '{}'",
                key, host
            )));
        }
    }

    if !SUPPORTED_QUALITIES.contains(&config.catalog.quality) {
        return Err(ConfigError::ValidationError(format!(
            "catalog.quality must be one of {:?}, got {}",
            SUPPORTED_QUALITIES, config.catalog.quality
        )));
    }

    if !is_known_order(&config.catalog.order_by) {
        return Err(ConfigError::ValidationError(format!(
            "catalog.order_by '{}' is not a known order",
            config.catalog.order_by
        )));
    }

    if config.subtitles.language.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "subtitles.language cannot be empty".to_string(),
        ));
    }

    if config.downloads.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "downloads.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.downloads.media_extension.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloads.media_extension cannot be empty".to_string(),
        ));
    }

    if config.downloads.listen_port == Some(u16::MAX) {
        return Err(ConfigError::ValidationError(format!(
            "downloads.listen_port must be below {}",
            u16::MAX
        )));
    }

    Ok(())
}
