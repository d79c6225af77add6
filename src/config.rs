//! Server configuration
//!
//! Built from defaults, then an optional YAML file named by
//! `FILESERVE_CONFIG`, then the positional command line arguments.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::http::mime::DEFAULT_CONTENT_TYPE;

/// Environment variable naming an optional YAML config file
pub const CONFIG_ENV: &str = "FILESERVE_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,

    /// Maximum log level: trace, debug, info, warn or error
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory files are served from
    pub root: PathBuf,

    /// File served for requests that resolve to a directory
    pub index_file: String,

    /// Seconds between cache sweeps; 0 disables the sweeper
    pub sweep_interval_secs: u64,

    /// Content type for extensions missing from the built-in table
    pub default_content_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            static_files: StaticFilesConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            index_file: "index.html".to_string(),
            sweep_interval_secs: 60,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StaticFilesConfig {
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Config {
    /// Load the full configuration for a run
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        cli.apply(&mut cfg);
        cfg.static_files.root = canonical_root(&cfg.static_files.root)?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Configured log level, `info` when unrecognised
    pub fn max_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// The configured `log_level` when it names no known level
    pub fn unknown_log_level(&self) -> Option<&str> {
        self.log_level
            .parse::<tracing::Level>()
            .is_err()
            .then_some(self.log_level.as_str())
    }
}

/// Absolute, symlink-free form of the root, which must be a directory
fn canonical_root(root: &Path) -> anyhow::Result<PathBuf> {
    let root = std::fs::canonicalize(root)
        .with_context(|| format!("root directory {} not accessible", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("root {} is not a directory", root.display());
    }
    Ok(root)
}
