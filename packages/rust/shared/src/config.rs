//! Application configuration for KnowledgeHarvest.
//!
//! User config lives at `~/.knowledgeharvest/knowledgeharvest.toml`.
//! Caller-supplied overrides take precedence over config file values,
//! which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "knowledgeharvest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".knowledgeharvest";

// ---------------------------------------------------------------------------
// Config structs (matching knowledgeharvest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ingestion run defaults.
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// `[ingest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Worker pool size: maximum sources extracted in parallel.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-source extraction deadline in seconds.
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,

    /// Minimum ms between page requests within one extractor.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Maximum pages an index-style extractor follows per source.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            source_timeout_secs: default_source_timeout_secs(),
            rate_limit_ms: default_rate_limit(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_source_timeout_secs() -> u64 {
    30
}
fn default_rate_limit() -> u64 {
    250
}
fn default_max_pages() -> usize {
    40
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + caller overrides)
// ---------------------------------------------------------------------------

/// Runtime configuration for one ingestion run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Worker pool size.
    pub concurrency: usize,
    /// Per-source extraction deadline.
    pub source_timeout: Duration,
    /// Minimum ms between page requests within one extractor.
    pub rate_limit_ms: u64,
    /// Maximum pages an index-style extractor follows per source.
    pub max_pages: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: config.ingest.concurrency.max(1),
            source_timeout: Duration::from_secs(config.ingest.source_timeout_secs),
            rate_limit_ms: config.ingest.rate_limit_ms,
            max_pages: config.ingest.max_pages,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.knowledgeharvest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HarvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.knowledgeharvest/knowledgeharvest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HarvestError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        HarvestError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HarvestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HarvestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("concurrency"));
        assert!(toml_str.contains("source_timeout_secs"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.ingest.concurrency, 4);
        assert_eq!(parsed.ingest.source_timeout_secs, 30);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[ingest]
concurrency = 8
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.ingest.concurrency, 8);
        assert_eq!(config.ingest.rate_limit_ms, 250);
        assert_eq!(config.ingest.max_pages, 40);
    }

    #[test]
    fn run_config_from_app_config() {
        let app = AppConfig::default();
        let run = RunConfig::from(&app);
        assert_eq!(run.concurrency, 4);
        assert_eq!(run.source_timeout, Duration::from_secs(30));
    }

    #[test]
    fn run_config_clamps_zero_concurrency() {
        let mut app = AppConfig::default();
        app.ingest.concurrency = 0;
        let run = RunConfig::from(&app);
        assert_eq!(run.concurrency, 1);
    }
}
