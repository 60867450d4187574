// src/session.rs

//! Launching a configured set of applications and tracking their readiness.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::app::{ClosingBehavior, ManagedApplication};
use crate::config::model::{AppConfig, HarnessFile};
use crate::errors::{HarnessError, Result};
use crate::launch::{LaunchSpec, ProcessLauncher};
use crate::probe::{Latch, ReadinessProbe, StreamKind};

/// Build the launch spec for app `name`, with one latch per readiness marker.
pub fn spec_for_app(cfg: &HarnessFile, name: &str, app: &AppConfig) -> Result<(LaunchSpec, Vec<Latch>)> {
    let probe = ReadinessProbe::new();
    let mut latches = Vec::new();
    for marker in app.ready_on_stderr.iter() {
        latches.push(probe.await_marker(StreamKind::Stderr, marker));
    }
    for marker in app.ready_on_stdout.iter() {
        latches.push(probe.await_marker(StreamKind::Stdout, marker));
    }

    let mut spec = LaunchSpec::new(name, app.target(name)?)
        .cluster(&cfg.cluster)
        .args(app.args.iter().cloned())
        .console(probe);
    spec.env = app.env.clone();
    spec.working_dir = app.working_dir.clone();
    spec.build_dir = app.build_dir.clone();
    spec.timeout = app.startup_timeout(name)?;

    Ok((spec, latches))
}

/// One launched application and the latches that define "ready" for it.
#[derive(Debug)]
pub struct LaunchedApp {
    pub app: ManagedApplication,
    pub readiness: Vec<Latch>,
}

impl LaunchedApp {
    /// Wait for every readiness latch, sharing one deadline of `timeout`.
    ///
    /// A timeout too large to form a deadline waits on each latch unbounded
    /// by the others.
    pub async fn await_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now().checked_add(timeout);
        for latch in self.readiness.iter() {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            debug!(app = %self.app.name(), latch = latch.label(), ?remaining, "awaiting readiness marker");
            latch.wait(remaining).await.map_err(|e| match e {
                HarnessError::Timeout { what, .. } => HarnessError::timeout(
                    format!("{what} from application '{}'", self.app.name()),
                    timeout,
                ),
                other => other,
            })?;
        }
        Ok(())
    }
}

/// Outcome of waiting for a whole session to become ready.
#[derive(Debug, Default)]
pub struct ReadinessReport {
    pub ready: Vec<String>,
    pub failed: Vec<(String, HarnessError)>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applications launched from one harness file, in launch order.
#[derive(Debug)]
pub struct Session {
    launcher: ProcessLauncher,
    launched: Vec<LaunchedApp>,
}

impl Session {
    pub fn new(launcher: ProcessLauncher) -> Self {
        Self {
            launcher,
            launched: Vec::new(),
        }
    }

    pub fn apps(&self) -> impl Iterator<Item = &ManagedApplication> {
        self.launched.iter().map(|l| &l.app)
    }

    pub fn get(&self, name: &str) -> Option<&LaunchedApp> {
        self.launched.iter().find(|l| l.app.name() == name)
    }

    /// Launch `order` one by one. Before each launch, the apps listed in its
    /// `after` must have become ready.
    pub async fn start(&mut self, cfg: &HarnessFile, order: &[String]) -> Result<()> {
        for name in order {
            let app_cfg = cfg.app.get(name).ok_or_else(|| {
                HarnessError::ConfigError(format!("unknown app '{name}' in launch order"))
            })?;

            for dep in app_cfg.after.iter() {
                let Some(launched) = self.get(dep) else {
                    continue;
                };
                info!(app = %name, dependency = %dep, "waiting for dependency to become ready");
                launched.await_ready(launched.app.default_timeout()).await?;
            }

            let (spec, readiness) = spec_for_app(cfg, name, app_cfg)?;
            let app = self.launcher.launch(spec)?;
            info!(app = %name, pid = app.id(), "application launched");
            self.launched.push(LaunchedApp { app, readiness });
        }
        Ok(())
    }

    /// Wait for all launched applications' readiness markers.
    pub async fn await_ready(&self) -> ReadinessReport {
        let mut report = ReadinessReport::default();
        for launched in self.launched.iter() {
            let name = launched.app.name().to_string();
            match launched.await_ready(launched.app.default_timeout()).await {
                Ok(()) => {
                    info!(app = %name, "application ready");
                    report.ready.push(name);
                }
                Err(e) => {
                    warn!(
                        app = %name,
                        error = %e,
                        pending = ?launched.app.console().pending_labels(),
                        "application not ready"
                    );
                    report.failed.push((name, e));
                }
            }
        }
        report
    }

    /// Close every application, most recently launched first.
    pub async fn close_all(&mut self, behavior: ClosingBehavior) {
        while let Some(launched) = self.launched.pop() {
            launched.app.close_with(behavior).await;
        }
    }
}
