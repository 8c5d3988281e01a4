//! External installer abstraction
//!
//! The network install path is an opaque collaborator: it is asked to
//! install one package and reports success or failure. Implementations
//! run out of process (npm) or, in tests, record what they were asked.

use crate::error::OnpmResult;
use crate::package::VersionSpec;
use async_trait::async_trait;
use std::path::Path;

/// Installs packages from the authoritative source
#[async_trait]
pub trait ExternalInstaller: Send + Sync {
    /// Install `name` at `version` into `working_dir` (cwd if `None`).
    ///
    /// `flags` are passed through verbatim, e.g. `--save-dev` or `--global`.
    async fn install(
        &self,
        name: &str,
        version: &VersionSpec,
        flags: &[String],
        working_dir: Option<&Path>,
    ) -> OnpmResult<()>;

    /// Get the human-readable installer name for display
    fn installer_name(&self) -> &'static str;
}
