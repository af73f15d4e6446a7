use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub subtitles: SubtitlesConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Movie catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Catalog host (e.g., "https://en.yts-official.mx")
    #[serde(default = "default_catalog_host")]
    pub host: String,
    /// Preferred resolution: 720, 1080 or 2160
    #[serde(default = "default_quality")]
    pub quality: u32,
    /// Default sort order when the query has no `order:` token
    #[serde(default = "default_order_by")]
    pub order_by: String,
    /// Run an empty search when the program starts
    #[serde(default = "default_true")]
    pub init_search: bool,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            host: default_catalog_host(),
            quality: default_quality(),
            order_by: default_order_by(),
            init_search: true,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_catalog_host() -> String {
    "https://en.yts-official.mx".to_string()
}

fn default_quality() -> u32 {
    1080
}

fn default_order_by() -> String {
    "rating".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u32 {
    30
}

/// Subtitle source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubtitlesConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Two-letter language code used in subtitle source URLs
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_subtitles_host")]
    pub host: String,
    #[serde(default = "default_subtitles_download_host")]
    pub download_host: String,
    /// Candidates whose title contains this marker are ranked first
    #[serde(default = "default_trusted_marker")]
    pub trusted_marker: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for SubtitlesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            language: default_language(),
            host: default_subtitles_host(),
            download_host: default_subtitles_download_host(),
            trusted_marker: default_trusted_marker(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_language() -> String {
    "es".to_string()
}

fn default_subtitles_host() -> String {
    "https://www.opensubtitles.com".to_string()
}

fn default_subtitles_download_host() -> String {
    "https://dl.opensubtitles.org".to_string()
}

fn default_trusted_marker() -> String {
    "YIFY".to_string()
}

/// Download folder and transfer engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    #[serde(default = "default_download_folder")]
    pub folder: PathBuf,
    /// How often the active transfer is polled (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Extension of the primary media file kept after completion
    #[serde(default = "default_media_extension")]
    pub media_extension: String,
    #[serde(default = "default_true")]
    pub enable_dht: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            folder: default_download_folder(),
            poll_interval_ms: default_poll_interval(),
            media_extension: default_media_extension(),
            enable_dht: true,
            listen_port: None,
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_download_folder() -> PathBuf {
    home_dir().join("Downloads")
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_media_extension() -> String {
    "mp4".to_string()
}

/// Terminal colors, as ANSI 256 palette indices
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThemeConfig {
    #[serde(default = "default_border_color")]
    pub table_border_color: String,
    #[serde(default = "default_selection_fg")]
    pub table_selection_fg_color: String,
    #[serde(default = "default_border_color")]
    pub table_selection_bg_color: String,
    #[serde(default = "default_selection_fg")]
    pub spinner_color: String,
    #[serde(default = "default_download_color")]
    pub download_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            table_border_color: default_border_color(),
            table_selection_fg_color: default_selection_fg(),
            table_selection_bg_color: default_border_color(),
            spinner_color: default_selection_fg(),
            download_color: default_download_color(),
        }
    }
}

fn default_border_color() -> String {
    "240".to_string()
}

fn default_selection_fg() -> String {
    "15".to_string()
}

fn default_download_color() -> String {
    "250".to_string()
}

/// Log file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

fn default_log_file() -> PathBuf {
    home_dir()
        .join(".cache")
        .join("bitsmuggler")
        .join("bitsmuggler.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.catalog.host, "https://en.yts-official.mx");
        assert_eq!(config.catalog.quality, 1080);
        assert_eq!(config.catalog.order_by, "rating");
        assert!(config.catalog.init_search);
        assert!(!config.subtitles.enabled);
        assert_eq!(config.subtitles.language, "es");
        assert_eq!(config.subtitles.trusted_marker, "YIFY");
        assert_eq!(config.downloads.poll_interval_ms, 1000);
        assert_eq!(config.downloads.media_extension, "mp4");
        assert!(config.downloads.listen_port.is_none());
        assert_eq!(config.theme.download_color, "250");
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml = r#"
[catalog]
quality = 720
order_by = "year"

[subtitles]
enabled = true
language = "en"

[downloads]
folder = "/data/movies"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.catalog.quality, 720);
        assert_eq!(config.catalog.order_by, "year");
        assert_eq!(config.catalog.host, "https://en.yts-official.mx");
        assert!(config.subtitles.enabled);
        assert_eq!(config.subtitles.language, "en");
        assert_eq!(config.downloads.folder, PathBuf::from("/data/movies"));
        assert_eq!(config.downloads.poll_interval_ms, 1000);
    }

    #[test]
    fn test_deserialize_theme() {
        let toml = r#"
[theme]
table_border_color = "33"
spinner_color = "208"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.theme.table_border_color, "33");
        assert_eq!(config.theme.spinner_color, "208");
        assert_eq!(config.theme.table_selection_bg_color, "240");
    }

    #[test]
    fn test_deserialize_wrong_type_fails() {
        let toml = r#"
[catalog]
quality = "full hd"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
