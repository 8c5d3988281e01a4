//! Cache and install path resolution
//!
//! All path math works on an explicit [`PathConfig`]; only
//! [`PathSource::resolve`] looks at the process environment.

use crate::error::{OnpmError, OnpmResult};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache root
pub const CACHE_DIR_ENV: &str = "ONPM_CACHE";

/// Cache directory name under the home directory
pub const DEFAULT_CACHE_DIR_NAME: &str = ".onpm";

/// Directory packages are installed into
pub const MODULES_DIR: &str = "node_modules";

/// Inputs for path resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    /// Working directory installs default to
    pub cwd: PathBuf,
    /// User home directory
    pub home: PathBuf,
    /// Cache root replacing `<home>/.onpm` when set
    pub cache_root_override: Option<PathBuf>,
}

impl PathConfig {
    /// Cache root: the override if non-empty, else `<home>/.onpm`
    pub fn cache_root(&self) -> PathBuf {
        match self.cache_root_override {
            Some(ref root) if !root.as_os_str().is_empty() => root.clone(),
            _ => self.home.join(DEFAULT_CACHE_DIR_NAME),
        }
    }

    /// `node_modules` directory under `base`, or under the cwd
    pub fn install_target_dir(&self, base: Option<&Path>) -> PathBuf {
        base.unwrap_or(&self.cwd).join(MODULES_DIR)
    }

    /// Project directory an install targets
    pub fn project_dir(&self, base: Option<&Path>) -> PathBuf {
        base.unwrap_or(&self.cwd).to_path_buf()
    }
}

/// Directory holding every cached version of a package
pub fn package_root(cache_root: &Path, name: &str) -> PathBuf {
    cache_root.join(name)
}

/// Where a [`PathConfig`] comes from
#[derive(Debug, Clone)]
pub enum PathSource {
    /// Read env, home and cwd from the running process on every call
    Process {
        /// Cache root from the config file, used when the env var is unset
        configured_root: Option<PathBuf>,
    },
    /// Fixed paths, independent of the process
    Fixed(PathConfig),
}

impl PathSource {
    /// Paths from the live process environment
    pub fn process(configured_root: Option<PathBuf>) -> Self {
        Self::Process { configured_root }
    }

    /// Snapshot the paths for one operation
    pub fn resolve(&self) -> OnpmResult<PathConfig> {
        match self {
            Self::Fixed(config) => Ok(config.clone()),
            Self::Process { configured_root } => {
                let env_root = env::var_os(CACHE_DIR_ENV)
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from);
                let home = dirs::home_dir().ok_or(OnpmError::HomeDirUnknown)?;
                let cwd = env::current_dir()
                    .map_err(|e| OnpmError::io("getting current directory", e))?;

                Ok(PathConfig {
                    cwd,
                    home,
                    cache_root_override: env_root.or_else(|| configured_root.clone()),
                })
            }
        }
    }
}
