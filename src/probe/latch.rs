// src/probe/latch.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::errors::{HarnessError, Result};

/// One-shot countdown signal.
///
/// Cloning shares the same signal: any clone may `count_down`, and every
/// waiter observes the release. Once released a latch stays released.
#[derive(Debug, Clone)]
pub struct Latch {
    label: Arc<str>,
    tx: Arc<watch::Sender<bool>>,
}

impl Latch {
    pub fn new(label: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            label: Arc::from(label.into()),
            tx: Arc::new(tx),
        }
    }

    /// What this latch is waiting for (used in timeout errors).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn count_down(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_released(&self) -> bool {
        *self.tx.borrow()
    }

    /// Suspend the calling task until released, or fail with
    /// [`HarnessError::Timeout`] once `timeout` elapses.
    pub async fn wait(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.tx.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(|released| *released)).await {
            Ok(Ok(_)) => Ok(()),
            // The sender lives as long as `self`, so the channel cannot close
            // while we wait.
            Ok(Err(_)) => Err(HarnessError::IllegalState(format!(
                "latch '{}' closed while waiting",
                self.label
            ))),
            Err(_) => Err(HarnessError::timeout(format!("'{}'", self.label), timeout)),
        }
    }
}
