// src/launch/mod.rs

//! Resolving and starting applications.
//!
//! - [`spec`] describes what to launch ([`LaunchSpec`], [`LaunchTarget`])
//!   and how ([`LaunchMode`]).
//! - [`platform`] holds the working directory, build-folder locations and
//!   default timeout shared by everything launched from it.
//! - [`native`] finds native images next to their packaged archives.
//! - [`launcher`] builds the command line and spawns the process.

pub mod launcher;
pub mod native;
pub mod platform;
pub mod spec;

pub use launcher::{PreparedCommand, ProcessLauncher};
pub use native::{resolve_native_image, strip_version};
pub use platform::{DEFAULT_TIMEOUT, Platform};
pub use spec::{DEFAULT_LAUNCHER, LaunchMode, LaunchSpec, LaunchTarget};
