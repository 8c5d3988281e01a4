//! `package.json` access
//!
//! Reads a package's own version and records dependencies in a project
//! manifest. Manifests are handled as untyped JSON so fields onpm does not
//! know about survive a rewrite in their original order.

use crate::error::{OnpmError, OnpmResult};
use crate::package::SaveMode;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest file name inside a package or project directory
pub const MANIFEST_FILE: &str = "package.json";

/// Path of the manifest inside `dir`
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// Read the manifest in `dir` as a JSON object
fn read_manifest(dir: &Path) -> OnpmResult<Map<String, Value>> {
    let path = manifest_path(dir);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(OnpmError::ManifestMissing(dir.to_path_buf()))
        }
        Err(e) => return Err(OnpmError::io(format!("reading {}", path.display()), e)),
    };

    match serde_json::from_str(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(OnpmError::ManifestInvalid {
            path,
            reason: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(OnpmError::ManifestInvalid {
            path,
            reason: e.to_string(),
        }),
    }
}

/// Version declared by the package installed in `package_dir`
pub fn read_version(package_dir: &Path) -> OnpmResult<String> {
    let manifest = read_manifest(package_dir)?;
    match manifest.get("version") {
        Some(Value::String(version)) if !version.is_empty() => Ok(version.clone()),
        _ => Err(OnpmError::ManifestInvalid {
            path: manifest_path(package_dir),
            reason: "missing \"version\" field".to_string(),
        }),
    }
}

/// Record `name` as `^version` in the project manifest at `project_dir`.
///
/// Returns the JSON that was written.
pub fn record_dependency(
    project_dir: &Path,
    mode: SaveMode,
    name: &str,
    version: &str,
) -> OnpmResult<String> {
    let mut manifest = read_manifest(project_dir)?;
    let path = manifest_path(project_dir);

    let deps = manifest
        .entry(mode.manifest_key())
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(deps) = deps else {
        return Err(OnpmError::ManifestInvalid {
            path,
            reason: format!("\"{}\" is not an object", mode.manifest_key()),
        });
    };
    deps.insert(name.to_string(), Value::String(format!("^{}", version)));

    let mut json = serde_json::to_string_pretty(&Value::Object(manifest))?;
    json.push('\n');
    fs::write(&path, &json)
        .map_err(|e| OnpmError::io(format!("writing {}", path.display()), e))?;

    debug!(
        "Recorded {}@^{} in {} of {}",
        name,
        version,
        mode.manifest_key(),
        path.display()
    );
    Ok(json)
}
