// src/probe/mod.rs

//! Readiness detection by scanning process output.
//!
//! A [`ReadinessProbe`] holds `(stream, predicate, callback)` registrations.
//! The drain tasks in [`reader`] feed it every line a process prints; the
//! first line that satisfies a registration's predicate fires its callback
//! and retires the registration, so later matching lines are ignored.
//!
//! Callbacks run on the drain task and must stay cheap. The usual callback
//! is a [`Latch::count_down`], which the caller waits on with a timeout.

pub mod latch;
pub mod reader;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

pub use latch::Latch;
pub use reader::spawn_drain;

/// Which standard stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

pub type LinePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
pub type LineCallback = Box<dyn FnOnce(&str) + Send>;

struct Registration {
    stream: StreamKind,
    label: String,
    predicate: LinePredicate,
    callback: LineCallback,
}

/// Shared set of pending line listeners.
///
/// Clones share the same registrations, so a probe can be handed to a
/// [`LaunchSpec`](crate::launch::LaunchSpec) before launch and still be used
/// by the caller afterwards.
#[derive(Clone, Default)]
pub struct ReadinessProbe {
    registrations: Arc<Mutex<Vec<Registration>>>,
}

impl ReadinessProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substring predicate for a literal readiness marker.
    pub fn contains(marker: impl Into<String>) -> impl Fn(&str) -> bool + Send + Sync + 'static {
        let marker = marker.into();
        move |line: &str| line.contains(&marker)
    }

    /// Register interest in the first line on `stream` that satisfies
    /// `predicate`. `callback` runs exactly once, with that line.
    pub fn on_line<P, C>(&self, stream: StreamKind, predicate: P, callback: C)
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
        C: FnOnce(&str) + Send + 'static,
    {
        self.register(stream, String::new(), Box::new(predicate), Box::new(callback));
    }

    pub fn on_stdout<P, C>(&self, predicate: P, callback: C)
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
        C: FnOnce(&str) + Send + 'static,
    {
        self.on_line(StreamKind::Stdout, predicate, callback);
    }

    pub fn on_stderr<P, C>(&self, predicate: P, callback: C)
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
        C: FnOnce(&str) + Send + 'static,
    {
        self.on_line(StreamKind::Stderr, predicate, callback);
    }

    /// Register `predicate` and return a latch released by its first match.
    pub fn await_line<P>(&self, stream: StreamKind, label: impl Into<String>, predicate: P) -> Latch
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let label = label.into();
        let latch = Latch::new(format!("{label} on {stream}"));
        let signal = latch.clone();
        self.register(
            stream,
            label,
            Box::new(predicate),
            Box::new(move |_line: &str| signal.count_down()),
        );
        latch
    }

    /// Latch released by the first line on `stream` containing `marker`.
    pub fn await_marker(&self, stream: StreamKind, marker: &str) -> Latch {
        self.await_line(stream, marker, Self::contains(marker))
    }

    /// Evaluate every pending registration for `stream` against `line`.
    ///
    /// Returns how many registrations fired.
    pub fn feed(&self, stream: StreamKind, line: &str) -> usize {
        let fired = {
            let mut regs = self.lock();
            let mut fired = Vec::new();
            let mut i = 0;
            while i < regs.len() {
                if regs[i].stream == stream && (regs[i].predicate)(line) {
                    fired.push(regs.remove(i));
                } else {
                    i += 1;
                }
            }
            fired
        };

        // Callbacks run outside the lock so they may register new listeners.
        let count = fired.len();
        for reg in fired {
            (reg.callback)(line);
        }
        count
    }

    /// Number of registrations that have not fired yet.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Labels of the still-pending `await_*` registrations.
    pub fn pending_labels(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|r| !r.label.is_empty())
            .map(|r| format!("{} on {}", r.label, r.stream))
            .collect()
    }

    fn register(
        &self,
        stream: StreamKind,
        label: String,
        predicate: LinePredicate,
        callback: LineCallback,
    ) {
        self.lock().push(Registration {
            stream,
            label,
            predicate,
            callback,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ReadinessProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessProbe")
            .field("pending", &self.pending())
            .finish()
    }
}
