//! npm-backed external installer
//!
//! Runs `npm install <name>[@<version>] [flags...]` as a child process.
//! Output is piped and logged at debug level; only the exit status decides
//! success. The tail of the output is attached to failures.

use crate::config::schema::NpmConfig;
use crate::error::{OnpmError, OnpmResult};
use crate::orchestration::installer::ExternalInstaller;
use crate::orchestration::{output_tail, stream_child_output};
use crate::package::VersionSpec;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Installer shelling out to npm
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    program: String,
    extra_args: Vec<String>,
}

impl NpmInstaller {
    /// Create an installer from npm settings
    pub fn new(config: &NpmConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.args.clone(),
        }
    }

    /// Argument list for one install
    fn install_args(&self, name: &str, version: &VersionSpec, flags: &[String]) -> Vec<String> {
        let target = match version.exact() {
            Some(v) => format!("{}@{}", name, v),
            None => name.to_string(),
        };

        let mut args = vec!["install".to_string(), target];
        args.extend(flags.iter().cloned());
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl Default for NpmInstaller {
    fn default() -> Self {
        Self::new(&NpmConfig::default())
    }
}

#[async_trait]
impl ExternalInstaller for NpmInstaller {
    async fn install(
        &self,
        name: &str,
        version: &VersionSpec,
        flags: &[String],
        working_dir: Option<&Path>,
    ) -> OnpmResult<()> {
        let args = self.install_args(name, version, flags);
        debug!("Executing: {} {:?}", self.program, args);

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| OnpmError::io(format!("creating {}", dir.display()), e))?;
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| OnpmError::external_install(&self.program, name, e.to_string()))?;

        let log_line = |line: String| debug!("{}: {}", self.program, line);
        let lines = stream_child_output(&mut child, &log_line).await;
        let status = child
            .wait()
            .await
            .map_err(|e| OnpmError::external_install(&self.program, name, e.to_string()))?;

        if status.success() {
            return Ok(());
        }

        let reason = match status.code() {
            Some(code) => format!("exited with code {}", code),
            None => "terminated by signal".to_string(),
        };
        let tail = output_tail(&lines);
        let reason = if tail.is_empty() {
            reason
        } else {
            format!("{}\n{}", reason, tail)
        };
        Err(OnpmError::external_install(&self.program, name, reason))
    }

    fn installer_name(&self) -> &'static str {
        "npm"
    }
}
