// src/launch/spec.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::cluster::ClusterOptions;
use crate::probe::ReadinessProbe;

/// Launcher used in managed-runtime mode unless configured otherwise.
pub const DEFAULT_LAUNCHER: &str = "java";

/// What to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// A runnable entry-point class plus the classpath it needs.
    EntryPoint {
        class_name: String,
        class_path: Vec<PathBuf>,
    },
    /// An already-resolved executable.
    Executable(PathBuf),
}

impl LaunchTarget {
    pub fn entry_point<I, P>(class_name: impl Into<String>, class_path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        LaunchTarget::EntryPoint {
            class_name: class_name.into(),
            class_path: class_path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn executable(path: impl Into<PathBuf>) -> Self {
        LaunchTarget::Executable(path.into())
    }
}

/// How entry points are turned into processes.
///
/// - `Native`: run an ahead-of-time compiled image, either the explicit
///   `image` or one resolved from the class's build-output directory.
/// - `Managed`: run `launcher [args] -cp <classpath> <class>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    Native { image: Option<PathBuf> },
    Managed { launcher: String },
}

impl Default for LaunchMode {
    fn default() -> Self {
        LaunchMode::Managed {
            launcher: DEFAULT_LAUNCHER.to_string(),
        }
    }
}

/// Everything needed to start one application.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Display name; unique per run by convention only.
    pub name: String,
    pub target: LaunchTarget,
    /// Passed through verbatim, in order.
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Relative paths resolve against the platform working directory.
    pub working_dir: Option<PathBuf>,
    /// Overrides the platform's build-folder lookup in native mode.
    pub build_dir: Option<PathBuf>,
    /// Probe fed with the application's output from the first line on.
    pub console: ReadinessProbe,
    /// Overrides the platform default timeout for this application.
    pub timeout: Option<Duration>,
}

impl LaunchSpec {
    pub fn new(name: impl Into<String>, target: LaunchTarget) -> Self {
        Self {
            name: name.into(),
            target,
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            build_dir: None,
            console: ReadinessProbe::new(),
            timeout: None,
        }
    }

    pub fn entry_point<I, P>(name: impl Into<String>, class_name: impl Into<String>, class_path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(name, LaunchTarget::entry_point(class_name, class_path))
    }

    pub fn executable(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name, LaunchTarget::executable(path))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append the cluster's `-D` arguments.
    pub fn cluster(self, options: &ClusterOptions) -> Self {
        self.args(options.system_properties())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    pub fn console(mut self, probe: ReadinessProbe) -> Self {
        self.console = probe;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
