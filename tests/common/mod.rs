#![allow(dead_code)]
#![allow(unused_imports)]

pub use native_harness_test_utils::builders::{AppConfigBuilder, HarnessFileBuilder};
pub use native_harness_test_utils::scripts::ScriptBuilder;
pub use native_harness_test_utils::{init_tracing, with_timeout};

use native_harness::launch::{LaunchMode, Platform, ProcessLauncher};
use std::path::Path;

/// Launcher for scripts written into `dir`, in managed mode.
pub fn script_launcher(dir: &Path) -> ProcessLauncher {
    ProcessLauncher::new(Platform::rooted_at("test", dir), LaunchMode::default())
}
