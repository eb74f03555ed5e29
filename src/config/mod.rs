//! Configuration management.

mod file_config;

pub use file_config::{find_config_file, load_config, save_config, ConfigError};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Download and state directories
    #[serde(default)]
    pub paths: PathsConfig,

    /// Listing page, API fallbacks and paper cap
    #[serde(default)]
    pub listing: ListingConfig,

    /// Request headers, timeout and retry settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Daily run schedule
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Processing service and directory watcher
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Directory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where PDFs and their metadata sidecars are written
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Where run summaries and the processed-file registry live
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            state_dir: default_state_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloaded_papers")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

/// Listing source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Site root; relative links and endpoints are resolved against it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the daily listing page
    #[serde(default = "default_papers_path")]
    pub papers_path: String,

    /// Alternate JSON endpoints, probed in order when the page yields nothing
    #[serde(default = "default_api_endpoints")]
    pub api_endpoints: Vec<String>,

    /// Maximum papers per run (0 or negative = unlimited)
    #[serde(default = "default_max_papers")]
    pub max_papers: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            papers_path: default_papers_path(),
            api_endpoints: default_api_endpoints(),
            max_papers: default_max_papers(),
        }
    }
}

impl ListingConfig {
    /// Paper cap as an optional limit
    pub fn limit(&self) -> Option<usize> {
        usize::try_from(self.max_papers).ok().filter(|n| *n > 0)
    }
}

fn default_base_url() -> String {
    "https://huggingface.co".to_string()
}

fn default_papers_path() -> String {
    "/papers".to_string()
}

fn default_api_endpoints() -> Vec<String> {
    [
        "/api/papers",
        "/api/daily-papers",
        "/api/papers/daily",
        "/papers/api/list",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_papers() -> i64 {
    10
}

/// Longest accepted request delay
const MAX_REQUEST_DELAY_SECS: f64 = 3600.0;

/// HTTP client configuration, handed to the fetcher at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Attempts per request before giving up
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base retry delay, also the pause between PDF downloads
    #[serde(default = "default_request_delay")]
    pub request_delay_secs: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            request_timeout_secs: default_request_timeout(),
            retry_count: default_retry_count(),
            request_delay_secs: default_request_delay(),
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured delay clamped to `0..=3600` seconds; NaN reads as zero
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_secs.max(0.0).min(MAX_REQUEST_DELAY_SECS))
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_request_delay() -> f64 {
    1.0
}

/// Daily schedule configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Local wall-clock time of the daily run, `HH:MM`
    #[serde(default = "default_daily_run_time")]
    pub daily_run_time: String,

    /// Run once at startup before waiting for the first scheduled time
    #[serde(default)]
    pub run_immediately: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            daily_run_time: default_daily_run_time(),
            run_immediately: false,
        }
    }
}

fn default_daily_run_time() -> String {
    "00:00".to_string()
}

/// Processing service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    #[serde(default = "default_service_url")]
    pub service_url: String,

    #[serde(default = "default_processor_timeout")]
    pub request_timeout_secs: u64,

    /// Send PDFs already in the download directory before watching
    #[serde(default = "default_true")]
    pub process_existing: bool,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            request_timeout_secs: default_processor_timeout(),
            process_existing: true,
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_service_url() -> String {
    "http://localhost:8000/process".to_string()
}

fn default_processor_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, logs are also appended to a dated file in this directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
