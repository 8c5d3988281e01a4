//! Version selection among cached entries
//!
//! Cached versions are directory names. Ordering follows semver precedence;
//! names that do not parse as semver sort below every valid version so a
//! stray directory never breaks selection.

use crate::error::{OnpmError, OnpmResult};
use crate::package::VersionSpec;
use semver::{BuildMetadata, Version};
use std::cmp::Ordering;

/// Compare two version directory names by semver precedence.
///
/// Build metadata is ignored, matching npm. Unparseable names rank lowest
/// and compare lexically among themselves.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_precedence(a), parse_precedence(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Parse a version with build metadata stripped
fn parse_precedence(s: &str) -> Result<Version, semver::Error> {
    let mut version = Version::parse(s)?;
    version.build = BuildMetadata::EMPTY;
    Ok(version)
}

/// Sort version names newest first
pub fn sort_newest_first(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(b, a));
}

/// Pick the version satisfying `requested` from `available`.
///
/// `Latest` picks the semver maximum; `Exact` must match a name verbatim.
pub fn resolve<S: AsRef<str>>(available: &[S], requested: &VersionSpec) -> OnpmResult<String> {
    let found = match requested {
        VersionSpec::Latest => available
            .iter()
            .map(AsRef::<str>::as_ref)
            .max_by(|a, b| compare_versions(a, b)),
        VersionSpec::Exact(wanted) => available
            .iter()
            .map(AsRef::<str>::as_ref)
            .find(|v| *v == wanted.as_str()),
    };

    found
        .map(str::to_string)
        .ok_or_else(|| OnpmError::VersionNotFound {
            requested: requested.to_string(),
        })
}
