//! Persistent settings file (`config.toml`)
//!
//! Settings live in `<config dir>/orgseed/config.toml` unless `ORGSEED_CONFIG`
//! points elsewhere. Every key is optional; missing keys fall back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::plan::OrderStrategyKind;
use crate::plan_tools::DEFAULT_CHUNK_SIZE;

/// Environment variable overriding the settings file location
pub const CONFIG_PATH_ENV: &str = "ORGSEED_CONFIG";

/// Top-level settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub export: ExportDefaults,
}

/// `[api]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// REST API version, e.g. "60.0"
    pub version: String,
    pub retry_enabled: bool,
    pub retry_max_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
    pub retry_jitter: bool,
    pub concurrency_enabled: bool,
    pub max_concurrent_requests: Option<usize>,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            version: "60.0".to_string(),
            retry_enabled: true,
            retry_max_attempts: None,
            retry_base_delay_ms: None,
            retry_max_delay_ms: None,
            retry_jitter: true,
            concurrency_enabled: true,
            max_concurrent_requests: None,
            request_timeout_secs: 120,
        }
    }
}

/// `[export]` section: defaults for flags not given on the command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    pub max_records: usize,
    pub plan_name: String,
    /// Directory holding cached describe results, relative to the working directory
    pub describe_cache_dir: PathBuf,
    pub order_strategy: OrderStrategyKind,
    /// Maximum records per data file when splitting a plan
    pub split_chunk_size: usize,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            max_records: 10,
            plan_name: "new-data-plan".to_string(),
            describe_cache_dir: PathBuf::from("describes"),
            order_strategy: OrderStrategyKind::default(),
            split_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Settings {
    /// Location of the settings file, if one can be determined
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("orgseed").join("config.toml"))
    }

    /// Load settings from the default location; a missing file yields defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                log::debug!("No settings file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
