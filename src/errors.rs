// src/errors.rs

//! Crate-wide error type.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// Target could not be resolved or the OS refused to start it.
    #[error("Launch error: {0}")]
    Launch(String),

    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    /// Query on an application in the wrong lifecycle phase.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in launch order: {0}")]
    LaunchCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HarnessError {
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        HarnessError::Timeout {
            what: what.into(),
            after,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
