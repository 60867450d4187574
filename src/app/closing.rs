// src/app/closing.rs

use std::str::FromStr;
use std::time::Duration;

/// Grace period used when graceful closing is requested without one.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// How [`ManagedApplication::close_with`](super::ManagedApplication::close_with)
/// terminates a process that is still running.
///
/// - `Forceful` (default): kill immediately.
/// - `Graceful`: ask the process to stop (SIGTERM on Unix) and kill it if it
///   has not exited after `grace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosingBehavior {
    #[default]
    Forceful,
    Graceful {
        grace: Duration,
    },
}

impl ClosingBehavior {
    pub fn graceful() -> Self {
        ClosingBehavior::Graceful {
            grace: DEFAULT_GRACE,
        }
    }
}

impl FromStr for ClosingBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forceful" | "kill" => Ok(ClosingBehavior::Forceful),
            "graceful" => Ok(ClosingBehavior::graceful()),
            other => Err(format!(
                "invalid close behaviour: {other} (expected \"forceful\" or \"graceful\")"
            )),
        }
    }
}
