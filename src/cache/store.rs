//! Cache store: install from and populate the package cache
//!
//! Layout: `<cache root>/<name>/<version>/` holds an installed package tree.
//! Entries are written after a successful external install and only ever
//! read afterwards.

use crate::cache::paths::{package_root, PathSource};
use crate::cache::transfer::copy_dir;
use crate::cache::version::{resolve, sort_newest_first};
use crate::error::{OnpmError, OnpmResult};
use crate::manifest;
use crate::package::{InstallOptions, PackageRef};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A package copied out of the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHit {
    /// Version directory that was used
    pub version: String,
    /// Where the package was installed
    pub installed_to: PathBuf,
}

/// A cached package with all of its versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedPackage {
    pub name: String,
    /// Newest first
    pub versions: Vec<String>,
}

/// Cache operations the installer falls back around
pub trait PackageCache: Send + Sync {
    /// Copy a cached version of `package` into the install target
    fn install_from_cache(
        &self,
        package: &PackageRef,
        options: &InstallOptions,
    ) -> OnpmResult<CacheHit>;

    /// Copy an installed package into the cache, returning the entry path.
    ///
    /// `source_dir` defaults to `<cwd>/node_modules/<name>`.
    fn store_into_cache(&self, name: &str, source_dir: Option<&Path>) -> OnpmResult<PathBuf>;
}

/// Filesystem-backed package cache
#[derive(Debug, Clone)]
pub struct CacheStore {
    paths: PathSource,
}

impl CacheStore {
    /// Create a store resolving its paths from `paths`
    pub fn new(paths: PathSource) -> Self {
        Self { paths }
    }

    /// Current cache root
    pub fn cache_root(&self) -> OnpmResult<PathBuf> {
        Ok(self.paths.resolve()?.cache_root())
    }

    /// Every cached package and version, sorted by name
    pub fn list(&self) -> OnpmResult<Vec<CachedPackage>> {
        let root = self.cache_root()?;
        let names = match list_subdirs(&root) {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(OnpmError::io(
                    format!("reading cache directory {}", root.display()),
                    e,
                ))
            }
        };

        let mut packages = Vec::with_capacity(names.len());
        for name in names {
            let mut versions = list_subdirs(&package_root(&root, &name)).map_err(|e| {
                OnpmError::io(format!("reading cached versions of {}", name), e)
            })?;
            sort_newest_first(&mut versions);
            packages.push(CachedPackage { name, versions });
        }
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }
}

impl PackageCache for CacheStore {
    fn install_from_cache(
        &self,
        package: &PackageRef,
        options: &InstallOptions,
    ) -> OnpmResult<CacheHit> {
        let paths = self.paths.resolve()?;
        let pkg_root = package_root(&paths.cache_root(), &package.name);

        // Unreadable package roots count as misses, but only NotFound is expected
        let available = list_subdirs(&pkg_root).map_err(|e| {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Could not read cache for {}: {}", package.name, e);
            }
            OnpmError::CacheMiss {
                name: package.name.clone(),
                reason: e.to_string(),
            }
        })?;

        let version = resolve(&available, &package.version).map_err(|e| OnpmError::CacheMiss {
            name: package.name.clone(),
            reason: e.to_string(),
        })?;
        debug!("Cache hit for {}: {}", package, version);

        let target_base = options.target_dir.as_deref();
        let installed_to = paths
            .install_target_dir(target_base)
            .join(&package.name);
        copy_dir(&pkg_root.join(&version), &installed_to)?;

        if let Some(mode) = options.save {
            let installed_version = manifest::read_version(&installed_to)?;
            manifest::record_dependency(
                &paths.project_dir(target_base),
                mode,
                &package.name,
                &installed_version,
            )?;
        }

        Ok(CacheHit {
            version,
            installed_to,
        })
    }

    fn store_into_cache(&self, name: &str, source_dir: Option<&Path>) -> OnpmResult<PathBuf> {
        let paths = self.paths.resolve()?;
        let source = match source_dir {
            Some(dir) => dir.to_path_buf(),
            None => paths.install_target_dir(None).join(name),
        };

        let version = entry_version(&source)?;
        let entry = package_root(&paths.cache_root(), name).join(&version);
        copy_dir(&source, &entry)?;

        info!("Stored {}@{} in cache at {}", name, version, entry.display());
        Ok(entry)
    }
}

/// Version directory name for the package installed in `source`.
///
/// The name must parse as semver; that admits no separators or `..`, so the
/// entry always sits directly under the package root.
fn entry_version(source: &Path) -> OnpmResult<String> {
    let version = manifest::read_version(source)?;
    semver::Version::parse(&version).map_err(|e| OnpmError::ManifestInvalid {
        path: manifest::manifest_path(source),
        reason: format!("version {:?} is not a valid semver version: {}", version, e),
    })?;
    Ok(version)
}

/// Names of the directories directly inside `dir`
fn list_subdirs(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
