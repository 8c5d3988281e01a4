//! Local package cache
//!
//! Packages installed by npm are copied to `<cache root>/<name>/<version>/`
//! and copied back out on later installs, so a package installed once can be
//! installed again without network access.
//!
//! # Cache Root
//!
//! | Source | Example |
//! |--------|---------|
//! | `ONPM_CACHE` (if non-empty) | `/srv/npm-cache` |
//! | `cache.dir` in config.toml | `~/caches/onpm` |
//! | default | `~/.onpm` |
//!
//! The root is resolved again for every operation, so changing
//! `ONPM_CACHE` takes effect immediately.
//!
//! There is no cross-process locking: two processes storing the same
//! package version race and the last writer wins.

pub mod paths;
pub mod store;
pub mod transfer;
pub mod version;

pub use paths::{PathConfig, PathSource, CACHE_DIR_ENV};
pub use store::{CacheHit, CacheStore, CachedPackage, PackageCache};
pub use transfer::copy_dir;
