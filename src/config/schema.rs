//! Configuration schema for onpm
//!
//! Configuration is stored at `~/.config/onpm/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// External installer settings
    pub npm: NpmConfig,

    /// Cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// npm invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpmConfig {
    /// Program run for network installs
    pub program: String,

    /// Extra arguments appended to every install
    pub args: Vec<String>,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            program: "npm".to_string(),
            args: vec![],
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root; `ONPM_CACHE` takes precedence
    pub dir: Option<PathBuf>,
}
