use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

/// Environment variable holding an explicit config file path
pub const CONFIG_PATH_ENV: &str = "BITSMUGGLER_CONFIG";

/// Resolve the config file location: `$BITSMUGGLER_CONFIG`, else
/// `$HOME/.config/bitsmuggler/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("bitsmuggler").join("config.toml")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BITSMUGGLER_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration, falling back to defaults (plus environment overrides)
/// when the file does not exist
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    match load_config(path) {
        Err(ConfigError::FileNotFound(_)) => Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("BITSMUGGLER_").split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string())),
        other => other,
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[catalog]
host = "https://catalog.example"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.catalog.host, "https://catalog.example");
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let result = load_config_from_str("[catalog\nhost = 1");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_or_default_missing_file() {
        let config = load_config_or_default(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.catalog.quality, 1080);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[subtitles]
enabled = true
language = "en"

[downloads]
poll_interval_ms = 250
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert!(config.subtitles.enabled);
        assert_eq!(config.subtitles.language, "en");
        assert_eq!(config.downloads.poll_interval_ms, 250);
        assert_eq!(config.catalog.order_by, "rating");
    }
}
