//! Configuration file support for daily-papers.
//!
//! This module provides TOML configuration file parsing with support
//! for environment variable overrides.
//!
//! # Configuration File Format
//!
//! ```toml
//! [paths]
//! download_dir = "downloaded_papers"
//! state_dir = "state"
//!
//! [listing]
//! base_url = "https://huggingface.co"
//! papers_path = "/papers"
//! max_papers = 10
//!
//! [http]
//! request_timeout_secs = 30
//! retry_count = 3
//! request_delay_secs = 1.0
//!
//! [scheduler]
//! daily_run_time = "08:30"
//! run_immediately = true
//!
//! [processor]
//! service_url = "http://localhost:8000/process"
//! process_existing = true
//!
//! [logging]
//! level = "info"
//! directory = "logs"
//! ```
//!
//! Any key can be overridden from the environment with the `DAILY_PAPERS_`
//! prefix and `__` between section and key, e.g.
//! `DAILY_PAPERS_LISTING__MAX_PAPERS=5`.

use std::path::{Path, PathBuf};

use super::Config;

/// File name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "daily-papers.toml";

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "DAILY_PAPERS";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Load configuration from a TOML file, then apply environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Io(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Locate a configuration file in the default locations.
///
/// Checks `./daily-papers.toml` first, then `<config dir>/daily-papers/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("daily-papers").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Save configuration to a TOML file, creating parent directories
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
    }

    std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
}
