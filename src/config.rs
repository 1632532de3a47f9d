//! # Backend configuration
//!
//! Defaults, optionally overlaid by a TOML file, then by `DROPIT_*` environment
//! variables. Command line overrides are applied by `main`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://dropit-backend-three.vercel.app";

pub const ENV_BASE_URL: &str = "DROPIT_API_BASE_URL";
pub const ENV_TIMEOUT: &str = "DROPIT_API_TIMEOUT";
pub const ENV_DOWNLOAD_DIR: &str = "DROPIT_DOWNLOAD_DIR";

/// Path segments of the REST endpoints, relative to the base URL.
pub mod endpoints {
    pub const UPLOAD: &[&str] = &["api", "upload"];
    pub const FILE: &[&str] = &["api", "file"];
    pub const DOWNLOAD: &[&str] = &["api", "download"];
    pub const HEALTH: &[&str] = &["api", "health"];

    pub fn display(segments: &[&str]) -> String {
        format!("/{}", segments.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Applies to upload and code lookup requests.
    pub timeout_ms: u64,
    pub health_timeout_ms: u64,
    /// Pause between files during "download all".
    pub download_all_delay_ms: u64,
    pub download_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
            health_timeout_ms: 5_000,
            download_all_delay_ms: 700,
            download_dir: None,
        }
    }
}

/// Read-only snapshot shown in the connection tooltip and by `--check`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendStatus {
    pub base_url: String,
    pub timeout_ms: u64,
    pub endpoints: Vec<(&'static str, String)>,
}

impl ApiConfig {
    /// Layers the optional TOML file and the process environment over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Unparseable or zero timeouts keep the current value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            match timeout.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.timeout_ms = ms,
                _ => log::warn!(
                    "Ignoring {}={:?}, keeping {} ms",
                    ENV_TIMEOUT,
                    timeout,
                    self.timeout_ms
                ),
            }
        }

        if let Some(dir) = lookup(ENV_DOWNLOAD_DIR).filter(|v| !v.trim().is_empty()) {
            self.download_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn download_all_delay(&self) -> Duration {
        Duration::from_millis(self.download_all_delay_ms)
    }

    /// Configured directory, else the current directory.
    pub fn resolve_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn status(&self) -> BackendStatus {
        BackendStatus {
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout_ms,
            endpoints: vec![
                ("upload", endpoints::display(endpoints::UPLOAD)),
                ("file", endpoints::display(endpoints::FILE)),
                ("download", endpoints::display(endpoints::DOWNLOAD)),
                ("health", endpoints::display(endpoints::HEALTH)),
            ],
        }
    }
}
