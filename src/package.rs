//! Package requests
//!
//! Parses `name` / `name@version` specs into validated [`PackageRef`]s and
//! carries the per-install options shared by the cache and the installer.

use crate::error::{OnpmError, OnpmResult};
use std::fmt;
use std::path::PathBuf;

/// Version sentinel meaning "newest available"
pub const LATEST: &str = "latest";

/// Requested version of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// Newest version available
    Latest,
    /// Exact version string, matched verbatim
    Exact(String),
}

impl VersionSpec {
    /// Parse a version string; empty or `latest` means newest
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == LATEST {
            Self::Latest
        } else {
            Self::Exact(trimmed.to_string())
        }
    }

    /// Exact version, if one was requested
    pub fn exact(&self) -> Option<&str> {
        match self {
            Self::Latest => None,
            Self::Exact(v) => Some(v),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "{}", LATEST),
            Self::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// A package name with the version requested for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub name: String,
    pub version: VersionSpec,
}

impl PackageRef {
    /// Create a validated package reference
    pub fn new(name: impl Into<String>, version: VersionSpec) -> OnpmResult<Self> {
        let name = name.into();
        validate_package_name(&name)?;
        Ok(Self { name, version })
    }

    /// Parse `name` or `name@version`.
    ///
    /// The spec is split at the last `@`, so `a@b@1.0.0` names `a@b`.
    pub fn parse(spec: &str) -> OnpmResult<Self> {
        match spec.rsplit_once('@') {
            Some((name, version)) => Self::new(name, VersionSpec::parse(version)),
            None => Self::new(spec, VersionSpec::Latest),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Validate that a package name stays inside the cache root
fn validate_package_name(name: &str) -> OnpmResult<()> {
    let invalid = |reason: &str| OnpmError::InvalidPackageName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name cannot be a relative directory"));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(invalid("must not contain path separators"));
    }
    Ok(())
}

/// Which dependency class a saved package belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// `dependencies`
    Runtime,
    /// `devDependencies`
    Dev,
}

impl SaveMode {
    /// Manifest key holding this dependency class
    pub fn manifest_key(&self) -> &'static str {
        match self {
            Self::Runtime => "dependencies",
            Self::Dev => "devDependencies",
        }
    }

    /// Flag telling npm to record the dependency itself
    pub fn npm_flag(&self) -> &'static str {
        match self {
            Self::Runtime => "--save",
            Self::Dev => "--save-dev",
        }
    }
}

/// Options applying to every package of an install
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Record the package in the project manifest
    pub save: Option<SaveMode>,
    /// Project directory whose `node_modules` receives the package (cwd if unset)
    pub target_dir: Option<PathBuf>,
}

impl InstallOptions {
    /// Flags forwarded to the external installer
    pub fn installer_flags(&self) -> Vec<String> {
        self.save
            .map(|mode| vec![mode.npm_flag().to_string()])
            .unwrap_or_default()
    }
}
