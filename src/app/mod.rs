// src/app/mod.rs

//! Running applications.
//!
//! - [`application`] holds [`ManagedApplication`]: lifecycle queries, exit
//!   codes and idempotent close.
//! - [`closing`] describes how a still-running process is terminated.
//! - [`filter`] selects applications by name.

pub mod application;
pub mod closing;
pub mod filter;

pub use application::ManagedApplication;
pub use closing::{ClosingBehavior, DEFAULT_GRACE};
pub use filter::NameFilter;
