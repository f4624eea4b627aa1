use crate::error::{PatchError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Path constants
// ---------------------------------------------------------------------------

pub const STACK_DIR: &str = "cicd_stack";
pub const ARTIFACTORY_CONFIG_FILE: &str = "artifactory/var/etc/system.yaml";
pub const ARTIFACTORY_SCRATCH_FILE: &str = "/tmp/artifactory_system.yaml.tmp";
pub const ARTIFACTORY_DEPLOY_SCRIPT: &str =
    "Documents/FromFirstPrinciples/articles/0009_cicd_part05_artifactory/05-deploy-artifactory.sh";

pub const CONTAINER_RUNTIME: &str = "docker";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Resolve the invoking user's home directory (`HOME` on unix).
pub fn home_dir() -> Result<PathBuf> {
    home::home_dir()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(PatchError::HomeNotFound)
}

/// Join `path` onto `base` unless it is already absolute.
pub fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Report whether `path` is a regular file the current user may execute.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
