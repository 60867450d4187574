#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use native_harness::cluster::ClusterOptions;
use native_harness::config::{validate_config, AppConfig, HarnessFile, LaunchSection, ModeName};

/// Builder for `HarnessFile` to simplify test setup.
pub struct HarnessFileBuilder {
    config: HarnessFile,
}

impl HarnessFileBuilder {
    pub fn new() -> Self {
        Self {
            config: HarnessFile {
                cluster: ClusterOptions::default(),
                launch: LaunchSection::default(),
                app: BTreeMap::new(),
            },
        }
    }

    pub fn with_app(mut self, name: &str, app: AppConfig) -> Self {
        self.config.app.insert(name.to_string(), app);
        self
    }

    pub fn with_cluster(mut self, cluster: ClusterOptions) -> Self {
        self.config.cluster = cluster;
        self
    }

    pub fn native(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.config.launch.mode = ModeName::Native;
        self.config.launch.build_dir = Some(build_dir.into());
        self
    }

    pub fn startup_timeout(mut self, timeout: &str) -> Self {
        self.config.launch.startup_timeout = timeout.to_string();
        self
    }

    pub fn close(mut self, behaviour: &str, grace: &str) -> Self {
        self.config.launch.close = behaviour.to_string();
        self.config.launch.close_grace = grace.to_string();
        self
    }

    pub fn build(self) -> HarnessFile {
        validate_config(&self.config).expect("Failed to build valid harness file from builder");
        self.config
    }
}

impl Default for HarnessFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `AppConfig`.
pub struct AppConfigBuilder {
    app: AppConfig,
}

impl AppConfigBuilder {
    pub fn executable(path: impl Into<PathBuf>) -> Self {
        Self {
            app: AppConfig {
                executable: Some(path.into()),
                ..AppConfig::default()
            },
        }
    }

    pub fn entry_point(class_name: &str) -> Self {
        Self {
            app: AppConfig {
                class_name: Some(class_name.to_string()),
                ..AppConfig::default()
            },
        }
    }

    pub fn class_path(mut self, entry: impl Into<PathBuf>) -> Self {
        self.app.class_path.push(entry.into());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.app.args.push(arg.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.app.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.app.after.push(dep.to_string());
        self
    }

    pub fn ready_on_stderr(mut self, marker: &str) -> Self {
        self.app.ready_on_stderr.push(marker.to_string());
        self
    }

    pub fn ready_on_stdout(mut self, marker: &str) -> Self {
        self.app.ready_on_stdout.push(marker.to_string());
        self
    }

    pub fn startup_timeout(mut self, timeout: &str) -> Self {
        self.app.startup_timeout = Some(timeout.to_string());
        self
    }

    pub fn build(self) -> AppConfig {
        self.app
    }
}
