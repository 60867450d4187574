// src/launch/platform.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default bound for readiness and exit waits.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where applications are launched from.
///
/// Shared between the launcher and every application it starts
/// (`Arc<Platform>`); applications only read it.
#[derive(Debug, Clone)]
pub struct Platform {
    name: String,
    working_dir: PathBuf,
    build_dir: Option<PathBuf>,
    class_build_dirs: BTreeMap<String, PathBuf>,
    default_timeout: Duration,
}

impl Platform {
    pub fn rooted_at(name: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            working_dir: working_dir.into(),
            build_dir: None,
            class_build_dirs: BTreeMap::new(),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build-output directory used for classes without an explicit mapping.
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    /// Build-output directory for one entry-point class.
    pub fn with_class_build_dir(mut self, class_name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.class_build_dirs.insert(class_name.into(), dir.into());
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Resolve `path` against the platform's working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Locate the build-output directory holding the artifacts of
    /// `class_name`, or `None` if nothing is configured for it.
    pub fn locate_build_folder(&self, class_name: &str) -> Option<PathBuf> {
        self.class_build_dirs
            .get(class_name)
            .or(self.build_dir.as_ref())
            .map(|dir| self.resolve(dir))
    }
}
