// src/config/mod.rs

//! Harness file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a harness file from disk (`loader.rs`).
//! - Validate launch targets, durations and the `after` graph (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{config_root_dir, default_config_path, load_and_validate, load_from_path};
pub use model::{AppConfig, HarnessFile, LaunchSection, ModeName};
pub use validate::validate_config;
