// src/launch/native.rs

//! Locating a native image next to the packaged archive it was built from.
//!
//! A build folder containing `coherence-server-25.1.0.jar` is expected to
//! also contain the native image `coherence-server`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::errors::{HarnessError, Result};
use crate::fs::FileSystem;

pub const ARCHIVE_SUFFIX: &str = ".jar";

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)-[0-9]+\.[0-9]+\.[0-9]+(-SNAPSHOT)?(\.jar)$").expect("version pattern is valid")
});

/// Strip `-<major>.<minor>.<patch>[-SNAPSHOT].jar` from an archive name.
///
/// An archive name without that suffix is rejected rather than guessed at,
/// so a stale or unrelated binary is never picked up.
pub fn strip_version(archive_name: &str) -> Result<String> {
    VERSION_PATTERN
        .captures(archive_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            HarnessError::IllegalArgument(format!(
                "Cannot strip version from jar name {archive_name}"
            ))
        })
}

/// Find the native image for `class_name` in `build_dir`.
///
/// Immediate entries are scanned in sorted order; the first archive whose
/// version-stripped name exists as a regular file wins.
pub fn resolve_native_image(
    fs: &dyn FileSystem,
    class_name: &str,
    build_dir: &Path,
) -> Result<PathBuf> {
    if !fs.exists(build_dir) {
        return Err(HarnessError::Launch(format!(
            "Non-existent build folder {} for {class_name}",
            build_dir.display()
        )));
    }
    if !fs.is_dir(build_dir) {
        return Err(HarnessError::Launch(format!(
            "Build folder {} is not a directory",
            build_dir.display()
        )));
    }

    let mut entries = fs.read_dir(build_dir).map_err(|e| {
        HarnessError::Launch(format!(
            "reading build folder {} for {class_name}: {e:#}",
            build_dir.display()
        ))
    })?;
    entries.sort();

    for entry in entries {
        let Some(file_name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(ARCHIVE_SUFFIX) {
            continue;
        }

        let candidate = build_dir.join(strip_version(file_name)?);
        debug!(archive = %file_name, candidate = %candidate.display(), "checking native image candidate");
        if fs.is_file(&candidate) {
            return Ok(candidate);
        }
    }

    Err(HarnessError::Launch(format!(
        "Could not find native image for {class_name} in {}",
        build_dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn strips_release_and_snapshot_versions() {
        assert_eq!(strip_version("coherence-server-25.1.0.jar").unwrap(), "coherence-server");
        assert_eq!(
            strip_version("coherence-server-25.1.0-SNAPSHOT.jar").unwrap(),
            "coherence-server"
        );
    }

    #[test]
    fn non_ascii_digits_are_not_a_version() {
        let err = strip_version("server-\u{663}.\u{661}.\u{660}.jar").unwrap_err();
        assert!(matches!(err, HarnessError::IllegalArgument(_)), "got {err:?}");
    }

    #[test]
    fn unversioned_archive_is_rejected() {
        let err = strip_version("coherence-server.jar").unwrap_err();
        assert!(matches!(err, HarnessError::IllegalArgument(_)), "got {err:?}");
    }

    #[test]
    fn resolves_image_next_to_archive() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/target/coherence-server-25.1.0.jar");
        fs.add_file("/proj/target/coherence-server");

        let image = resolve_native_image(&fs, "com.example.Server", Path::new("/proj/target")).unwrap();
        assert_eq!(image, PathBuf::from("/proj/target/coherence-server"));
    }

    #[test]
    fn archive_without_image_reports_missing_image() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/target/coherence-server-25.1.0.jar");

        let err = resolve_native_image(&fs, "com.example.Server", Path::new("/proj/target")).unwrap_err();
        match err {
            HarnessError::Launch(msg) => {
                assert!(msg.contains("Could not find native image"), "{msg}");
                assert!(msg.contains("com.example.Server"), "{msg}");
            }
            other => panic!("expected launch error, got {other:?}"),
        }
    }

    #[test]
    fn directory_named_like_image_is_not_adopted() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/target/server-1.0.0.jar");
        fs.add_dir("/proj/target/server");

        assert!(resolve_native_image(&fs, "Server", Path::new("/proj/target")).is_err());
    }

    #[test]
    fn build_folder_must_exist_and_be_a_directory() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/target");

        let missing = resolve_native_image(&fs, "Server", Path::new("/nope")).unwrap_err();
        assert!(missing.to_string().contains("Non-existent build folder"));

        let not_dir = resolve_native_image(&fs, "Server", Path::new("/proj/target")).unwrap_err();
        assert!(not_dir.to_string().contains("is not a directory"));
    }

    #[test]
    fn scan_order_is_sorted() {
        let fs = MockFileSystem::new();
        fs.add_file("/t/zeta-1.0.0.jar");
        fs.add_file("/t/zeta");
        fs.add_file("/t/alpha-1.0.0.jar");
        fs.add_file("/t/alpha");

        let image = resolve_native_image(&fs, "Server", Path::new("/t")).unwrap();
        assert_eq!(image, PathBuf::from("/t/alpha"));
    }
}
