//! Orchestrator factory
//!
//! Wires the filesystem cache and the npm installer from configuration.

use crate::cache::{CacheStore, PathSource};
use crate::config::Config;
use crate::orchestration::npm::NpmInstaller;
use crate::orchestration::orchestrator::InstallOrchestrator;
use std::sync::Arc;

/// Cache store reading its paths from the running process
pub fn create_cache_store(config: &Config) -> CacheStore {
    CacheStore::new(PathSource::process(config.cache.dir.clone()))
}

/// Create an orchestrator backed by the local cache and npm
///
/// # Arguments
/// * `config` - The application configuration
pub fn create_orchestrator(config: &Config) -> InstallOrchestrator {
    InstallOrchestrator::new(
        Arc::new(create_cache_store(config)),
        Arc::new(NpmInstaller::new(&config.npm)),
    )
}
