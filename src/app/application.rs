// src/app/application.rs

use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::closing::ClosingBehavior;
use crate::errors::{HarnessError, Result};
use crate::launch::Platform;
use crate::probe::{spawn_drain, ReadinessProbe, StreamKind};

/// Upper bound on waiting for a process to report its exit once it has been
/// killed.
const EXIT_AFTER_KILL_TIMEOUT: Duration = Duration::from_secs(30);

/// Requests sent to the reaper task.
#[derive(Debug, Clone, Copy)]
enum Termination {
    Graceful,
    Forceful,
}

/// A launched process and everything attached to it.
///
/// The OS process is owned by a background reaper task, which publishes the
/// exit code once the process terminates. Stdout and stderr are drained by
/// one task each and fed to the application's console probe.
///
/// Close with [`close`](Self::close) (idempotent). Dropping an application
/// that was never closed kills its process.
pub struct ManagedApplication {
    name: String,
    platform: Arc<Platform>,
    pid: Option<u32>,
    console: ReadinessProbe,
    default_timeout: Duration,
    closed: AtomicBool,
    /// Flipped once the first `close_with` has finished.
    close_done: watch::Sender<bool>,
    exit_rx: watch::Receiver<Option<i32>>,
    control_tx: mpsc::UnboundedSender<Termination>,
    drains: Mutex<Vec<JoinHandle<()>>>,
}

impl ManagedApplication {
    /// Take ownership of a freshly spawned `child`.
    pub(crate) fn start(
        name: String,
        platform: Arc<Platform>,
        mut child: Child,
        console: ReadinessProbe,
        default_timeout: Duration,
    ) -> Self {
        let pid = child.id();

        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(spawn_drain(name.clone(), StreamKind::Stdout, stdout, console.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(spawn_drain(name.clone(), StreamKind::Stderr, stderr, console.clone()));
        }

        let (exit_tx, exit_rx) = watch::channel(None);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        tokio::spawn(reap(name.clone(), child, control_rx, exit_tx));

        Self {
            name,
            platform,
            pid,
            console,
            default_timeout,
            closed: AtomicBool::new(false),
            close_done: watch::Sender::new(false),
            exit_rx,
            control_tx,
            drains: Mutex::new(drains),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> &Arc<Platform> {
        &self.platform
    }

    /// The probe fed with this application's output.
    pub fn console(&self) -> &ReadinessProbe {
        &self.console
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// OS process id, or `-1` when it cannot be determined.
    pub fn id(&self) -> i64 {
        self.pid.map(i64::from).unwrap_or(-1)
    }

    /// True until the application is closed (or closing has started) or the
    /// process has exited on its own.
    pub fn is_operational(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.exit_rx.borrow().is_none()
    }

    /// Exit code of the terminated process.
    pub fn exit_value(&self) -> Result<i32> {
        match *self.exit_rx.borrow() {
            Some(code) => Ok(code),
            None => Err(HarnessError::IllegalState(format!(
                "application '{}' has not terminated",
                self.name
            ))),
        }
    }

    /// Suspend the calling task until the process terminates.
    ///
    /// Returns immediately when it already has, even with a zero timeout.
    pub async fn wait_for(&self, timeout: Duration) -> Result<i32> {
        let mut rx = self.exit_rx.clone();
        match tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await {
            Ok(Ok(code)) => {
                let code = *code;
                Ok(code.unwrap_or(-1))
            }
            Ok(Err(_)) => Err(HarnessError::IllegalState(format!(
                "reaper for application '{}' stopped without an exit code",
                self.name
            ))),
            Err(_) => Err(HarnessError::timeout(
                format!("application '{}' to exit", self.name),
                timeout,
            )),
        }
    }

    /// [`wait_for`](Self::wait_for) with the application's default timeout.
    pub async fn wait(&self) -> Result<i32> {
        self.wait_for(self.default_timeout).await
    }

    /// Close with the default (forceful) behaviour.
    pub async fn close(&self) {
        self.close_with(ClosingBehavior::default()).await;
    }

    /// Terminate the process if it is still running and release its streams.
    ///
    /// Only the first call terminates the process. Later and concurrent calls
    /// wait until that first close has finished, so every caller returns with
    /// the application stopped and its exit code published. Never fails:
    /// termination problems are logged and the streams are released
    /// regardless.
    pub async fn close_with(&self, behavior: ClosingBehavior) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!(app = %self.name, "close already requested; waiting for it to finish");
            let mut done = self.close_done.subscribe();
            // The sender lives in `self`, so the channel stays open.
            let _ = done.wait_for(|finished| *finished).await;
            return;
        }

        let _done = CloseDone(&self.close_done);
        info!(app = %self.name, ?behavior, "closing application");

        if self.exit_rx.borrow().is_none() {
            if let ClosingBehavior::Graceful { grace } = behavior {
                self.request(Termination::Graceful);
                if self.wait_for(grace).await.is_err() {
                    warn!(app = %self.name, ?grace, "application did not stop within grace period; killing");
                    self.request(Termination::Forceful);
                }
            } else {
                self.request(Termination::Forceful);
            }

            match self.wait_for(EXIT_AFTER_KILL_TIMEOUT).await {
                Ok(code) => debug!(app = %self.name, exit_code = code, "application terminated"),
                Err(e) => warn!(app = %self.name, error = %e, "application did not report exit"),
            }
        }

        self.release_streams();
    }

    fn request(&self, termination: Termination) {
        if self.control_tx.send(termination).is_err() {
            debug!(app = %self.name, ?termination, "reaper already finished");
        }
    }

    fn release_streams(&self) {
        let drains = std::mem::take(&mut *self.drains.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in drains {
            handle.abort();
        }
    }
}

/// Releases waiting closers when the first close finishes, including when its
/// future is dropped part-way.
struct CloseDone<'a>(&'a watch::Sender<bool>);

impl Drop for CloseDone<'_> {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

impl std::fmt::Debug for ManagedApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedApplication")
            .field("name", &self.name)
            .field("pid", &self.pid)
            .field("operational", &self.is_operational())
            .finish()
    }
}

impl Drop for ManagedApplication {
    fn drop(&mut self) {
        if *self.closed.get_mut() {
            return;
        }
        let _ = self.control_tx.send(Termination::Forceful);
        let drains = self.drains.get_mut().unwrap_or_else(PoisonError::into_inner);
        for handle in drains.drain(..) {
            handle.abort();
        }
    }
}

/// Own `child` until it exits, applying termination requests as they come.
async fn reap(
    name: String,
    mut child: Child,
    mut control_rx: mpsc::UnboundedReceiver<Termination>,
    exit_tx: watch::Sender<Option<i32>>,
) {
    let mut control_open = true;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status,

            request = control_rx.recv(), if control_open => match request {
                Some(Termination::Graceful) => terminate(&mut child, &name),
                Some(Termination::Forceful) => kill(&mut child, &name),
                None => {
                    // Application handle dropped.
                    control_open = false;
                    kill(&mut child, &name);
                }
            },
        }
    };

    let code = match status {
        Ok(status) => exit_code(status),
        Err(e) => {
            warn!(app = %name, error = %e, "waiting for application process failed");
            -1
        }
    };

    info!(app = %name, exit_code = code, "application exited");
    exit_tx.send_replace(Some(code));
}

fn kill(child: &mut Child, name: &str) {
    if let Err(e) = child.start_kill() {
        warn!(app = %name, error = %e, "failed to kill application process");
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child, name: &str) {
    let Some(pid) = child.id() else {
        return;
    };
    // SAFETY: `pid` belongs to a child we spawned and have not yet reaped.
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret != 0 {
        warn!(app = %name, pid, "SIGTERM failed; killing instead");
        kill(child, name);
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child, name: &str) {
    kill(child, name);
}

/// Exit code, or `128 + signal` for a process killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
