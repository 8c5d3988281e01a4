//! Error types for onpm
//!
//! All modules use `OnpmResult<T>` as their return type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for onpm operations
pub type OnpmResult<T> = Result<T, OnpmError>;

/// Step of a directory transfer that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPhase {
    /// Creating (or clearing) the destination directory
    Prepare,
    /// Copying the tree itself
    Copy,
    /// Removing a partially written destination after a failed copy
    Rollback,
}

impl fmt::Display for CopyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => write!(f, "prepare"),
            Self::Copy => write!(f, "copy"),
            Self::Rollback => write!(f, "rollback"),
        }
    }
}

/// All errors that can occur in onpm
#[derive(Error, Debug)]
pub enum OnpmError {
    // Cache errors
    #[error("Package {name} not found in cache: {reason}")]
    CacheMiss { name: String, reason: String },

    #[error("Version {requested} not found in cache")]
    VersionNotFound { requested: String },

    #[error("Copy failed during {phase} of {path}: {source}")]
    Copy {
        phase: CopyPhase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Manifest errors
    #[error("package.json not found in {0}")]
    ManifestMissing(PathBuf),

    #[error("Invalid package.json at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    // Package spec errors
    #[error("Invalid package name '{name}': {reason}")]
    InvalidPackageName { name: String, reason: String },

    // Installer errors
    #[error("{installer} failed to install {package}: {reason}")]
    ExternalInstall {
        installer: String,
        package: String,
        reason: String,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine home directory")]
    HomeDirUnknown,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl OnpmError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a copy error for the given phase
    pub fn copy(phase: CopyPhase, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            phase,
            path: path.into(),
            source,
        }
    }

    /// Create an external installer failure
    pub fn external_install(
        installer: impl Into<String>,
        package: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ExternalInstall {
            installer: installer.into(),
            package: package.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error only means the cache could not satisfy a request
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss { .. } | Self::VersionNotFound { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::HomeDirUnknown => Some("Set ONPM_CACHE to choose a cache directory"),
            Self::ManifestMissing(_) => Some("Run: npm init"),
            Self::ExternalInstall { .. } => Some("Re-run with -vv to see installer output"),
            Self::Copy { .. } => Some("Check permissions on the cache and node_modules directories"),
            _ => None,
        }
    }
}
