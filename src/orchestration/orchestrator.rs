//! Cache-first install state machine
//!
//! ```text
//! TryCache ──hit──────────────────────────────▶ Done(FromCache)
//!    │ miss
//!    ▼
//! TryExternal ──fail──────────────────────────▶ Done(Failed)
//!    │ ok
//!    ▼
//! Store ──ok──▶ Done(InstalledAndCached)
//!    └──fail──▶ Done(InstalledNotCached)
//! ```
//!
//! Nothing is retried and a failed store never undoes the install.

use crate::cache::paths::MODULES_DIR;
use crate::cache::PackageCache;
use crate::error::OnpmResult;
use crate::orchestration::installer::ExternalInstaller;
use crate::package::{InstallOptions, PackageRef, VersionSpec};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Package name used when upgrading onpm itself
pub const SELF_PACKAGE: &str = "onpm";

/// Where an installed package came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallSource {
    Cache,
    External,
}

/// Terminal result of one package install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Copied out of the cache
    FromCache { version: String },
    /// Installed externally, then stored in the cache
    InstalledAndCached { cache_path: PathBuf },
    /// Installed externally, but storing it in the cache failed
    InstalledNotCached { reason: String },
    /// Not installed
    Failed { reason: String },
}

impl Outcome {
    /// Whether the package ended up installed
    pub fn installed(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Where the installed package came from
    pub fn source(&self) -> Option<InstallSource> {
        match self {
            Self::FromCache { .. } => Some(InstallSource::Cache),
            Self::InstalledAndCached { .. } | Self::InstalledNotCached { .. } => {
                Some(InstallSource::External)
            }
            Self::Failed { .. } => None,
        }
    }

    /// Whether this install added an entry to the cache
    pub fn stored(&self) -> bool {
        matches!(self, Self::InstalledAndCached { .. })
    }
}

/// Step of a single package install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    TryCache,
    TryExternal,
    Store,
    Done(Outcome),
}

/// One requested spec and how it ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// Spec as given, e.g. `left-pad@1.3.0`
    pub spec: String,
    /// Parsed package, if the spec was valid
    pub package: Option<PackageRef>,
    pub outcome: Outcome,
}

/// Installs packages cache-first, falling back to an external installer
pub struct InstallOrchestrator {
    cache: Arc<dyn PackageCache>,
    installer: Arc<dyn ExternalInstaller>,
}

impl InstallOrchestrator {
    /// Create an orchestrator over a cache and an installer
    pub fn new(cache: Arc<dyn PackageCache>, installer: Arc<dyn ExternalInstaller>) -> Self {
        Self { cache, installer }
    }

    /// Install one package, cache first
    pub async fn install(&self, package: &PackageRef, options: &InstallOptions) -> Outcome {
        let mut state = InstallState::TryCache;
        loop {
            state = match state {
                InstallState::Done(outcome) => return outcome,
                other => self.advance(other, package, options).await,
            };
        }
    }

    /// Run one transition of the install state machine
    pub async fn advance(
        &self,
        state: InstallState,
        package: &PackageRef,
        options: &InstallOptions,
    ) -> InstallState {
        match state {
            InstallState::TryCache => match self.cache.install_from_cache(package, options) {
                Ok(hit) => {
                    info!("Installed {} from cache ({})", package, hit.version);
                    InstallState::Done(Outcome::FromCache {
                        version: hit.version,
                    })
                }
                Err(e) if e.is_cache_miss() => {
                    debug!("Cache miss for {}: {}", package, e);
                    InstallState::TryExternal
                }
                Err(e) => {
                    warn!("Cache unusable for {}, falling back: {}", package, e);
                    InstallState::TryExternal
                }
            },
            InstallState::TryExternal => {
                info!(
                    "Installing {} with {}",
                    package,
                    self.installer.installer_name()
                );
                match self
                    .installer
                    .install(
                        &package.name,
                        &package.version,
                        &options.installer_flags(),
                        options.target_dir.as_deref(),
                    )
                    .await
                {
                    Ok(()) => InstallState::Store,
                    Err(e) => InstallState::Done(Outcome::Failed {
                        reason: e.to_string(),
                    }),
                }
            }
            InstallState::Store => {
                let installed_dir = options
                    .target_dir
                    .as_ref()
                    .map(|base| base.join(MODULES_DIR).join(&package.name));
                match self
                    .cache
                    .store_into_cache(&package.name, installed_dir.as_deref())
                {
                    Ok(cache_path) => InstallState::Done(Outcome::InstalledAndCached { cache_path }),
                    Err(e) => {
                        warn!("Installed {} but could not cache it: {}", package, e);
                        InstallState::Done(Outcome::InstalledNotCached {
                            reason: e.to_string(),
                        })
                    }
                }
            }
            done @ InstallState::Done(_) => done,
        }
    }

    /// Install every spec in order; failures never stop the batch
    pub async fn install_many<S: AsRef<str>>(
        &self,
        specs: &[S],
        options: &InstallOptions,
    ) -> Vec<BatchEntry> {
        let mut entries = Vec::with_capacity(specs.len());

        for spec in specs {
            let spec = spec.as_ref();
            let entry = match PackageRef::parse(spec) {
                Ok(package) => {
                    let outcome = self.install(&package, options).await;
                    BatchEntry {
                        spec: spec.to_string(),
                        package: Some(package),
                        outcome,
                    }
                }
                Err(e) => BatchEntry {
                    spec: spec.to_string(),
                    package: None,
                    outcome: Outcome::Failed {
                        reason: e.to_string(),
                    },
                },
            };
            entries.push(entry);
        }

        entries
    }

    /// Upgrade onpm itself through a global install
    pub async fn upgrade_self(&self) -> OnpmResult<()> {
        info!("Upgrading {}", SELF_PACKAGE);
        self.installer
            .install(
                SELF_PACKAGE,
                &VersionSpec::Latest,
                &["--global".to_string()],
                None,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheHit, CacheStore, PathConfig, PathSource};
    use crate::error::OnpmError;
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Installer recording calls and writing a package tree on success
    #[derive(Default)]
    struct FakeInstaller {
        calls: Mutex<Vec<(String, String, Vec<String>)>>,
        fail_for: Vec<String>,
        project: Option<PathBuf>,
    }

    impl FakeInstaller {
        fn calls(&self) -> Vec<(String, String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExternalInstaller for FakeInstaller {
        async fn install(
            &self,
            name: &str,
            version: &VersionSpec,
            flags: &[String],
            working_dir: Option<&Path>,
        ) -> OnpmResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), version.to_string(), flags.to_vec()));
            if self.fail_for.iter().any(|n| n == name) {
                return Err(OnpmError::external_install("fake", name, "registry unreachable"));
            }
            let base = working_dir
                .map(Path::to_path_buf)
                .or_else(|| self.project.clone());
            if let Some(base) = base {
                let dir = base.join(MODULES_DIR).join(name);
                fs::create_dir_all(&dir).unwrap();
                let version = version.exact().unwrap_or("9.9.9");
                fs::write(
                    dir.join("package.json"),
                    format!(r#"{{"name":"{}","version":"{}"}}"#, name, version),
                )
                .unwrap();
            }
            Ok(())
        }

        fn installer_name(&self) -> &'static str {
            "fake"
        }
    }

    /// Cache double counting calls, with scripted results
    struct ScriptedCache {
        hit: bool,
        store_ok: bool,
        stores: Mutex<u32>,
    }

    impl PackageCache for ScriptedCache {
        fn install_from_cache(
            &self,
            package: &PackageRef,
            _options: &InstallOptions,
        ) -> OnpmResult<CacheHit> {
            if self.hit {
                Ok(CacheHit {
                    version: "1.0.0".to_string(),
                    installed_to: PathBuf::from("/nm").join(&package.name),
                })
            } else {
                Err(OnpmError::Copy {
                    phase: crate::error::CopyPhase::Copy,
                    path: PathBuf::from("/cache"),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                })
            }
        }

        fn store_into_cache(&self, name: &str, _source_dir: Option<&Path>) -> OnpmResult<PathBuf> {
            *self.stores.lock().unwrap() += 1;
            if self.store_ok {
                Ok(PathBuf::from("/cache").join(name))
            } else {
                Err(OnpmError::ManifestMissing(PathBuf::from("/nm").join(name)))
            }
        }
    }

    fn scripted(hit: bool, store_ok: bool) -> Arc<ScriptedCache> {
        Arc::new(ScriptedCache {
            hit,
            store_ok,
            stores: Mutex::new(0),
        })
    }

    struct Env {
        _dir: TempDir,
        project: PathBuf,
        cache_root: PathBuf,
        store: Arc<CacheStore>,
    }

    fn env() -> Env {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        let cache_root = dir.path().join("cache");
        fs::create_dir_all(&project).unwrap();
        let store = Arc::new(CacheStore::new(PathSource::Fixed(PathConfig {
            cwd: project.clone(),
            home: dir.path().to_path_buf(),
            cache_root_override: Some(cache_root.clone()),
        })));
        Env {
            _dir: dir,
            project,
            cache_root,
            store,
        }
    }

    fn seed(cache_root: &Path, name: &str, version: &str) {
        let dir = cache_root.join(name).join(version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(r#"{{"name":"{}","version":"{}"}}"#, name, version),
        )
        .unwrap();
    }

    fn pkg(spec: &str) -> PackageRef {
        PackageRef::parse(spec).unwrap()
    }

    #[tokio::test]
    async fn empty_cache_installs_and_caches() {
        let env = env();
        let installer = Arc::new(FakeInstaller {
            project: Some(env.project.clone()),
            ..Default::default()
        });
        let orchestrator = InstallOrchestrator::new(env.store.clone(), installer.clone());

        let outcome = orchestrator
            .install(&pkg("left-pad@1.3.0"), &InstallOptions::default())
            .await;

        assert!(outcome.stored());
        assert_eq!(outcome.source(), Some(InstallSource::External));
        assert!(env.cache_root.join("left-pad/1.3.0/package.json").is_file());
        assert_eq!(installer.calls().len(), 1);
    }

    #[tokio::test]
    async fn cached_latest_skips_installer() {
        let env = env();
        seed(&env.cache_root, "left-pad", "1.3.0");
        let installer = Arc::new(FakeInstaller::default());
        let orchestrator = InstallOrchestrator::new(env.store.clone(), installer.clone());

        let outcome = orchestrator
            .install(&pkg("left-pad"), &InstallOptions::default())
            .await;

        assert_eq!(
            outcome,
            Outcome::FromCache {
                version: "1.3.0".to_string()
            }
        );
        assert!(installer.calls().is_empty());
        assert!(env.project.join("node_modules/left-pad/package.json").is_file());
    }

    #[tokio::test]
    async fn exact_version_mismatch_falls_through() {
        let env = env();
        seed(&env.cache_root, "left-pad", "1.2.0");
        let installer = Arc::new(FakeInstaller {
            project: Some(env.project.clone()),
            ..Default::default()
        });
        let orchestrator = InstallOrchestrator::new(env.store.clone(), installer.clone());

        let outcome = orchestrator
            .install(&pkg("left-pad@1.3.0"), &InstallOptions::default())
            .await;

        assert_eq!(installer.calls()[0].1, "1.3.0");
        assert!(outcome.stored());
        assert!(env.cache_root.join("left-pad/1.2.0").is_dir());
        assert!(env.cache_root.join("left-pad/1.3.0").is_dir());
    }

    #[tokio::test]
    async fn any_cache_error_counts_as_miss() {
        let cache = scripted(false, true);
        let installer = Arc::new(FakeInstaller::default());
        let orchestrator = InstallOrchestrator::new(cache.clone(), installer.clone());

        let state = orchestrator
            .advance(InstallState::TryCache, &pkg("a"), &InstallOptions::default())
            .await;

        assert_eq!(state, InstallState::TryExternal);
    }

    #[tokio::test]
    async fn plain_miss_falls_through_to_installer() {
        let env = env();
        let installer = Arc::new(FakeInstaller::default());
        let orchestrator = InstallOrchestrator::new(env.store.clone(), installer);
        let package = pkg("never-cached");

        let err = env
            .store
            .install_from_cache(&package, &InstallOptions::default())
            .unwrap_err();
        assert!(err.is_cache_miss());

        let state = orchestrator
            .advance(InstallState::TryCache, &package, &InstallOptions::default())
            .await;
        assert_eq!(state, InstallState::TryExternal);
    }

    #[tokio::test]
    async fn installer_failure_is_terminal_and_skips_store() {
        let cache = scripted(false, true);
        let installer = Arc::new(FakeInstaller {
            fail_for: vec!["a".to_string()],
            ..Default::default()
        });
        let orchestrator = InstallOrchestrator::new(cache.clone(), installer.clone());

        let outcome = orchestrator.install(&pkg("a"), &InstallOptions::default()).await;

        assert!(!outcome.installed());
        assert!(matches!(outcome, Outcome::Failed { .. }));
        assert_eq!(*cache.stores.lock().unwrap(), 0);
        assert_eq!(installer.calls().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_is_partial_success() {
        let cache = scripted(false, false);
        let installer = Arc::new(FakeInstaller::default());
        let orchestrator = InstallOrchestrator::new(cache.clone(), installer);

        let outcome = orchestrator.install(&pkg("a"), &InstallOptions::default()).await;

        assert!(outcome.installed());
        assert!(!outcome.stored());
        assert!(matches!(outcome, Outcome::InstalledNotCached { .. }));
        assert_eq!(*cache.stores.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn store_looks_in_target_dir() {
        let env = env();
        let target = env.project.join("nested");
        let installer = Arc::new(FakeInstaller::default());
        let orchestrator = InstallOrchestrator::new(env.store.clone(), installer);
        let options = InstallOptions {
            save: None,
            target_dir: Some(target.clone()),
        };

        let outcome = orchestrator.install(&pkg("a@2.0.0"), &options).await;

        assert!(outcome.stored());
        assert!(target.join("node_modules/a").is_dir());
        assert!(env.cache_root.join("a/2.0.0").is_dir());
    }

    #[tokio::test]
    async fn save_flags_reach_installer() {
        let cache = scripted(false, true);
        let installer = Arc::new(FakeInstaller::default());
        let orchestrator = InstallOrchestrator::new(cache, installer.clone());
        let options = InstallOptions {
            save: Some(crate::package::SaveMode::Runtime),
            target_dir: None,
        };

        orchestrator.install(&pkg("a"), &options).await;

        assert_eq!(installer.calls()[0].2, vec!["--save"]);
    }

    #[tokio::test]
    async fn batch_runs_in_order_and_isolates_failures() {
        let cache = scripted(false, true);
        let installer = Arc::new(FakeInstaller {
            fail_for: vec!["a".to_string()],
            ..Default::default()
        });
        let orchestrator = InstallOrchestrator::new(cache, installer.clone());

        let entries = orchestrator
            .install_many(&["a", "../bad", "b@2.0.0"], &InstallOptions::default())
            .await;

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].package, Some(pkg("a@latest")));
        assert!(!entries[0].outcome.installed());
        assert!(entries[1].package.is_none());
        assert!(!entries[1].outcome.installed());
        assert_eq!(
            entries[2].package,
            Some(PackageRef::new("b", VersionSpec::Exact("2.0.0".to_string())).unwrap())
        );
        assert!(entries[2].outcome.stored());

        let calls = installer.calls();
        assert_eq!(calls[0].0, "a");
        assert_eq!(calls[0].1, "latest");
        assert_eq!(calls[1].0, "b");
        assert_eq!(calls[1].1, "2.0.0");
    }

    #[tokio::test]
    async fn upgrade_self_is_global_install_without_cache() {
        let cache = scripted(true, true);
        let installer = Arc::new(FakeInstaller::default());
        let orchestrator = InstallOrchestrator::new(cache.clone(), installer.clone());

        orchestrator.upgrade_self().await.unwrap();

        let calls = installer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SELF_PACKAGE);
        assert_eq!(calls[0].2, vec!["--global"]);
        assert_eq!(*cache.stores.lock().unwrap(), 0);
    }

    #[test]
    fn outcome_accessors() {
        let hit = Outcome::FromCache {
            version: "1.0.0".to_string(),
        };
        assert!(hit.installed());
        assert!(!hit.stored());
        assert_eq!(hit.source(), Some(InstallSource::Cache));
        assert_eq!(
            Outcome::Failed {
                reason: String::new()
            }
            .source(),
            None
        );
    }
}
