// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::app::ClosingBehavior;
use crate::cluster::ClusterOptions;
use crate::config::duration::parse_duration;
use crate::errors::{HarnessError, Result};
use crate::launch::{DEFAULT_LAUNCHER, LaunchMode, LaunchTarget, Platform};

/// Top-level harness description as read from a TOML file.
///
/// ```toml
/// [cluster]
/// name = "native-image-test-2"
/// local_address = "127.0.0.1"
/// wka = ["127.0.0.1"]
/// prefer_ipv4 = true
///
/// [launch]
/// mode = "native"
/// build_dir = "target"
///
/// [app.server-1]
/// class_name = "com.oracle.coherence.graal.Server"
/// ready_on_stderr = ["Started Coherence server"]
///
/// [app.server-2]
/// class_name = "com.oracle.coherence.graal.Server"
/// after = ["server-1"]
/// ```
///
/// All sections except `[app.<name>]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessFile {
    /// Cluster-wide `-D` options from `[cluster]`.
    #[serde(default)]
    pub cluster: ClusterOptions,

    /// Launch strategy and timeouts from `[launch]`.
    #[serde(default)]
    pub launch: LaunchSection,

    /// All applications from `[app.<name>]`, keyed by display name.
    #[serde(default)]
    pub app: BTreeMap<String, AppConfig>,
}

impl HarnessFile {
    /// Platform rooted at `root` (normally the directory holding the file).
    pub fn platform(&self, root: &Path) -> Result<Platform> {
        let mut platform = Platform::rooted_at("local", root)
            .with_default_timeout(self.launch.startup_timeout()?);
        if let Some(ref dir) = self.launch.build_dir {
            platform = platform.with_build_dir(dir);
        }
        for (class_name, dir) in self.launch.class_build_dirs.iter() {
            platform = platform.with_class_build_dir(class_name, dir);
        }
        Ok(platform)
    }
}

/// `"native"` or `"managed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeName {
    Native,
    #[default]
    Managed,
}

/// `[launch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchSection {
    #[serde(default)]
    pub mode: ModeName,

    /// Native image used for every entry point, skipping build-folder lookup.
    #[serde(default)]
    pub native_image: Option<PathBuf>,

    /// Launcher executable for managed mode.
    #[serde(default = "default_launcher")]
    pub launcher: String,

    /// Build-output directory searched for native images.
    #[serde(default)]
    pub build_dir: Option<PathBuf>,

    /// Per-class build-output directories, overriding `build_dir`.
    #[serde(default)]
    pub class_build_dirs: BTreeMap<String, PathBuf>,

    /// How long to wait for readiness markers, e.g. `"60s"`.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout: String,

    /// `"forceful"` (default) or `"graceful"`.
    #[serde(default = "default_close")]
    pub close: String,

    /// Grace period before a graceful close escalates to a kill.
    #[serde(default = "default_close_grace")]
    pub close_grace: String,
}

fn default_launcher() -> String {
    DEFAULT_LAUNCHER.to_string()
}

fn default_startup_timeout() -> String {
    "60s".to_string()
}

fn default_close() -> String {
    "forceful".to_string()
}

fn default_close_grace() -> String {
    "10s".to_string()
}

impl Default for LaunchSection {
    fn default() -> Self {
        Self {
            mode: ModeName::default(),
            native_image: None,
            launcher: default_launcher(),
            build_dir: None,
            class_build_dirs: BTreeMap::new(),
            startup_timeout: default_startup_timeout(),
            close: default_close(),
            close_grace: default_close_grace(),
        }
    }
}

impl LaunchSection {
    pub fn launch_mode(&self) -> LaunchMode {
        match self.mode {
            ModeName::Native => LaunchMode::Native {
                image: self.native_image.clone(),
            },
            ModeName::Managed => LaunchMode::Managed {
                launcher: self.launcher.clone(),
            },
        }
    }

    pub fn startup_timeout(&self) -> Result<Duration> {
        duration_field("[launch].startup_timeout", &self.startup_timeout)
    }

    pub fn closing_behavior(&self) -> Result<ClosingBehavior> {
        let behavior: ClosingBehavior = self
            .close
            .parse()
            .map_err(|e| HarnessError::ConfigError(format!("[launch].close: {e}")))?;

        match behavior {
            ClosingBehavior::Graceful { .. } => Ok(ClosingBehavior::Graceful {
                grace: duration_field("[launch].close_grace", &self.close_grace)?,
            }),
            forceful => Ok(forceful),
        }
    }
}

/// `[app.<name>]` section.
///
/// Exactly one of `class_name` / `executable` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Entry-point class.
    #[serde(default)]
    pub class_name: Option<String>,

    /// Classpath entries for `class_name` (managed mode).
    #[serde(default)]
    pub class_path: Vec<PathBuf>,

    /// Pre-built executable to run instead of an entry point.
    ///
    /// Relative paths resolve against the harness file's directory (or
    /// `working_dir`). A bare name is looked up there first and falls back
    /// to `PATH`.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Extra arguments, appended after the cluster options.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Build-output directory for this application only.
    #[serde(default)]
    pub build_dir: Option<PathBuf>,

    /// Markers that must appear on stderr before the app counts as ready.
    #[serde(default)]
    pub ready_on_stderr: Vec<String>,

    /// Markers that must appear on stdout before the app counts as ready.
    #[serde(default)]
    pub ready_on_stdout: Vec<String>,

    /// Applications that must be ready before this one is launched.
    #[serde(default)]
    pub after: Vec<String>,

    /// Overrides `[launch].startup_timeout`.
    #[serde(default)]
    pub startup_timeout: Option<String>,
}

impl AppConfig {
    pub fn target(&self, name: &str) -> Result<LaunchTarget> {
        match (&self.class_name, &self.executable) {
            (Some(class_name), None) => Ok(LaunchTarget::EntryPoint {
                class_name: class_name.clone(),
                class_path: self.class_path.clone(),
            }),
            (None, Some(exe)) => Ok(LaunchTarget::Executable(exe.clone())),
            (Some(_), Some(_)) => Err(HarnessError::ConfigError(format!(
                "app '{name}' sets both `class_name` and `executable`"
            ))),
            (None, None) => Err(HarnessError::ConfigError(format!(
                "app '{name}' needs one of `class_name` or `executable`"
            ))),
        }
    }

    /// Per-app timeout, or `None` to use the launch default.
    pub fn startup_timeout(&self, name: &str) -> Result<Option<Duration>> {
        self.startup_timeout
            .as_deref()
            .map(|s| duration_field(&format!("[app.{name}].startup_timeout"), s))
            .transpose()
    }
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| HarnessError::ConfigError(format!("{field}: {e}")))
}
