// src/launch/launcher.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, info};

use crate::app::ManagedApplication;
use crate::errors::{HarnessError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::launch::native::resolve_native_image;
use crate::launch::platform::Platform;
use crate::launch::spec::{LaunchMode, LaunchSpec, LaunchTarget};

/// A fully resolved command line, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl fmt::Display for PreparedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Turns [`LaunchSpec`]s into running [`ManagedApplication`]s.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    platform: Arc<Platform>,
    mode: LaunchMode,
    fs: Arc<dyn FileSystem>,
}

impl ProcessLauncher {
    pub fn new(platform: Platform, mode: LaunchMode) -> Self {
        Self {
            platform: Arc::new(platform),
            mode,
            fs: Arc::new(RealFileSystem),
        }
    }

    /// Use a different filesystem for native-image resolution.
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn platform(&self) -> &Arc<Platform> {
        &self.platform
    }

    pub fn mode(&self) -> &LaunchMode {
        &self.mode
    }

    /// Resolve `spec` into a command line without starting anything.
    pub fn prepare(&self, spec: &LaunchSpec) -> Result<PreparedCommand> {
        let working_dir = match spec.working_dir {
            Some(ref dir) => self.platform.resolve(dir),
            None => self.platform.working_dir().to_path_buf(),
        };

        let (program, args) = match (&self.mode, &spec.target) {
            (_, LaunchTarget::Executable(path)) => {
                (self.resolve_program(path, &working_dir), spec.args.clone())
            }

            (LaunchMode::Native { image: Some(image) }, LaunchTarget::EntryPoint { .. }) => {
                (self.resolve_program(image, &working_dir), spec.args.clone())
            }

            (LaunchMode::Native { image: None }, LaunchTarget::EntryPoint { class_name, .. }) => {
                let build_dir = match spec.build_dir {
                    Some(ref dir) => self.platform.resolve(dir),
                    None => self.platform.locate_build_folder(class_name).ok_or_else(|| {
                        HarnessError::Launch(format!("Unable to locate build folder for {class_name}"))
                    })?,
                };
                let image = resolve_native_image(self.fs.as_ref(), class_name, &build_dir)?;
                (image, spec.args.clone())
            }

            (
                LaunchMode::Managed { launcher },
                LaunchTarget::EntryPoint {
                    class_name,
                    class_path,
                },
            ) => {
                let mut args = spec.args.clone();
                let joined = join_class_path(class_path, &working_dir)?;
                if !joined.is_empty() {
                    args.push("-cp".to_string());
                    args.push(joined);
                }
                args.push(class_name.clone());
                (PathBuf::from(launcher), args)
            }
        };

        Ok(PreparedCommand {
            program,
            args,
            working_dir,
            env: spec.env.clone(),
        })
    }

    /// Start the application described by `spec`.
    ///
    /// Must be called from within a Tokio runtime: the application's reaper
    /// and stream-drain tasks are spawned onto it.
    pub fn launch(&self, spec: LaunchSpec) -> Result<ManagedApplication> {
        let prepared = self.prepare(&spec)?;
        info!(app = %spec.name, command = %prepared, "launching application");

        let mut cmd = Command::new(&prepared.program);
        cmd.args(&prepared.args)
            .current_dir(&prepared.working_dir)
            .envs(&prepared.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            HarnessError::Launch(format!(
                "spawning {} for application '{}': {e}",
                prepared.program.display(),
                spec.name
            ))
        })?;
        debug!(app = %spec.name, pid = ?child.id(), "process spawned");

        let timeout = spec.timeout.unwrap_or(self.platform.default_timeout());
        Ok(ManagedApplication::start(
            spec.name,
            Arc::clone(&self.platform),
            child,
            spec.console,
            timeout,
        ))
    }

    /// Anything with a directory component is anchored at the working
    /// directory. A bare name (`server`) is too when such a file exists
    /// there; otherwise (`java`, `sh`) it is left for `PATH` lookup.
    fn resolve_program(&self, program: &Path, working_dir: &Path) -> PathBuf {
        if program.is_absolute() {
            return program.to_path_buf();
        }
        let anchored = working_dir.join(program);
        if program.components().count() > 1 || self.fs.is_file(&anchored) {
            anchored
        } else {
            program.to_path_buf()
        }
    }
}

fn join_class_path(entries: &[PathBuf], working_dir: &Path) -> Result<String> {
    if entries.is_empty() {
        return Ok(String::new());
    }

    let resolved = entries.iter().map(|entry| {
        if entry.is_absolute() {
            entry.clone()
        } else {
            working_dir.join(entry)
        }
    });
    let joined = std::env::join_paths(resolved).map_err(|e| {
        HarnessError::Launch(format!("classpath entry contains a path separator: {e}"))
    })?;

    Ok(joined.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn platform() -> Platform {
        Platform::rooted_at("test", "/work").with_build_dir("target")
    }

    #[cfg(unix)]
    #[test]
    fn managed_mode_appends_classpath_then_class() {
        let launcher = ProcessLauncher::new(platform(), LaunchMode::default());
        let spec = LaunchSpec::entry_point(
            "server",
            "com.oracle.coherence.graal.Server",
            ["target/classes", "/repo/lib/coherence.jar"],
        )
        .arg("-Dcoherence.cluster=test");

        let cmd = launcher.prepare(&spec).unwrap();
        assert_eq!(cmd.program, PathBuf::from("java"));
        assert_eq!(
            cmd.args,
            vec![
                "-Dcoherence.cluster=test".to_string(),
                "-cp".to_string(),
                "/work/target/classes:/repo/lib/coherence.jar".to_string(),
                "com.oracle.coherence.graal.Server".to_string(),
            ]
        );
        assert_eq!(cmd.working_dir, PathBuf::from("/work"));
    }

    #[test]
    fn managed_mode_without_classpath_omits_flag() {
        let launcher = ProcessLauncher::new(
            platform(),
            LaunchMode::Managed {
                launcher: "/opt/jdk/bin/java".into(),
            },
        );
        let spec = LaunchSpec::entry_point("client", "com.example.Client", Vec::<PathBuf>::new());

        let cmd = launcher.prepare(&spec).unwrap();
        assert_eq!(cmd.program, PathBuf::from("/opt/jdk/bin/java"));
        assert_eq!(cmd.args, vec!["com.example.Client".to_string()]);
    }

    #[test]
    fn native_mode_resolves_image_from_build_folder() {
        let fs = MockFileSystem::new();
        fs.add_file("/work/target/coherence-server-25.1.0-SNAPSHOT.jar");
        fs.add_file("/work/target/coherence-server");

        let launcher = ProcessLauncher::new(platform(), LaunchMode::Native { image: None })
            .with_fs(Arc::new(fs));
        let spec = LaunchSpec::entry_point("server", "com.example.Server", ["target/classes"])
            .arg("-Dcoherence.wka=127.0.0.1");

        let cmd = launcher.prepare(&spec).unwrap();
        assert_eq!(cmd.program, PathBuf::from("/work/target/coherence-server"));
        assert_eq!(cmd.args, vec!["-Dcoherence.wka=127.0.0.1".to_string()]);
    }

    #[test]
    fn native_mode_prefers_explicit_image() {
        let launcher = ProcessLauncher::new(
            platform(),
            LaunchMode::Native {
                image: Some("/images/server".into()),
            },
        )
        .with_fs(Arc::new(MockFileSystem::new()));
        let spec = LaunchSpec::entry_point("server", "com.example.Server", ["target/classes"]);

        let cmd = launcher.prepare(&spec).unwrap();
        assert_eq!(cmd.program, PathBuf::from("/images/server"));
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn native_mode_without_archive_names_the_class() {
        let fs = MockFileSystem::new();
        fs.add_file("/work/target/notes.txt");

        let launcher = ProcessLauncher::new(platform(), LaunchMode::Native { image: None })
            .with_fs(Arc::new(fs));
        let spec = LaunchSpec::entry_point("server", "com.example.Server", Vec::<PathBuf>::new());

        let err = launcher.prepare(&spec).unwrap_err();
        assert!(matches!(err, HarnessError::Launch(ref m) if m.contains("com.example.Server")), "{err:?}");
    }

    #[test]
    fn native_mode_without_known_build_folder_fails() {
        let launcher = ProcessLauncher::new(
            Platform::rooted_at("test", "/work"),
            LaunchMode::Native { image: None },
        )
        .with_fs(Arc::new(MockFileSystem::new()));
        let spec = LaunchSpec::entry_point("server", "com.example.Server", Vec::<PathBuf>::new());

        let err = launcher.prepare(&spec).unwrap_err();
        assert!(err.to_string().contains("Unable to locate build folder for com.example.Server"));
    }

    #[test]
    fn spec_build_dir_overrides_platform_lookup() {
        let fs = MockFileSystem::new();
        fs.add_file("/custom/out/client-1.2.3.jar");
        fs.add_file("/custom/out/client");

        let launcher = ProcessLauncher::new(platform(), LaunchMode::Native { image: None })
            .with_fs(Arc::new(fs));
        let spec = LaunchSpec::entry_point("client", "com.example.Client", Vec::<PathBuf>::new())
            .build_dir("/custom/out");

        assert_eq!(
            launcher.prepare(&spec).unwrap().program,
            PathBuf::from("/custom/out/client")
        );
    }

    #[test]
    fn executable_target_is_used_in_either_mode() {
        for mode in [LaunchMode::default(), LaunchMode::Native { image: None }] {
            let launcher = ProcessLauncher::new(platform(), mode);
            let spec = LaunchSpec::executable("tool", "bin/member").arg("--flag");

            let cmd = launcher.prepare(&spec).unwrap();
            assert_eq!(cmd.program, PathBuf::from("/work/bin/member"));
            assert_eq!(cmd.args, vec!["--flag".to_string()]);
        }
    }

    #[test]
    fn bare_executable_prefers_working_dir_over_path() {
        let fs = MockFileSystem::new();
        fs.add_file("/work/server");

        let launcher = ProcessLauncher::new(platform(), LaunchMode::default()).with_fs(Arc::new(fs));

        let local = launcher.prepare(&LaunchSpec::executable("server", "server")).unwrap();
        assert_eq!(local.program, PathBuf::from("/work/server"));

        let on_path = launcher.prepare(&LaunchSpec::executable("shell", "sh")).unwrap();
        assert_eq!(on_path.program, PathBuf::from("sh"));
    }

    #[test]
    fn display_renders_command_line() {
        let cmd = PreparedCommand {
            program: PathBuf::from("java"),
            args: vec!["-cp".into(), "a:b".into(), "Main".into()],
            working_dir: PathBuf::from("/"),
            env: BTreeMap::new(),
        };
        assert_eq!(cmd.to_string(), "java -cp a:b Main");
    }
}
