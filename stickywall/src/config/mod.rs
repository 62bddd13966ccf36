//! Configuration for the `stickywall` client.
//!
//! Layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/stickywall/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::board::{DUE_DATE_FORMAT, SortOrder};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The backend URL is not a usable WebSocket URL.
    #[error("invalid backend url {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The sort order is not one of the known names.
    #[error("{0}")]
    InvalidSortOrder(String),
}

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    backend: BackendFileConfig,
    ui: UiFileConfig,
}

/// `[backend]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BackendFileConfig {
    url: Option<String>,
    connect_timeout_secs: Option<u64>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    date_format: Option<String>,
    default_sort: Option<String>,
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of a `stickywall-server`. `None` runs fully offline
    /// against in-memory collaborators.
    pub backend_url: Option<Url>,
    /// Timeout for the WebSocket handshake.
    pub connect_timeout: Duration,
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Display format for due dates (chrono format string).
    pub date_format: String,
    /// Ordering of the board when it first opens.
    pub sort_order: SortOrder,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            connect_timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_millis(50),
            date_format: DUE_DATE_FORMAT.to_string(),
            sort_order: SortOrder::Ascending,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if a resolved value is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend_url = cli
            .backend_url
            .as_deref()
            .or(file.backend.url.as_deref())
            .map(parse_backend_url)
            .transpose()?;

        let sort_order = match cli.sort.as_deref().or(file.ui.default_sort.as_deref()) {
            Some(name) => name.parse().map_err(ConfigError::InvalidSortOrder)?,
            None => defaults.sort_order,
        };

        Ok(Self {
            backend_url,
            connect_timeout: file
                .backend
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            date_format: cli
                .date_format
                .clone()
                .or_else(|| file.ui.date_format.clone())
                .unwrap_or(defaults.date_format),
            sort_order,
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Live sticky-note task board")]
pub struct CliArgs {
    /// WebSocket URL of the backend server. Omit to run offline.
    #[arg(long, env = "STICKYWALL_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Path to config file (default: `~/.config/stickywall/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Initial sort order (`asc` or `desc`).
    #[arg(long)]
    pub sort: Option<String>,

    /// Due date display format (chrono format string).
    #[arg(long)]
    pub date_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "STICKYWALL_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/stickywall.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Accepts only `ws://` and `wss://` URLs with a host.
fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist. Otherwise the default
/// path is tried and a missing file is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("stickywall").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
