mod common;

use std::error::Error;
use std::path::Path;

use native_harness::errors::HarnessError;
use native_harness::fs::RealFileSystem;
use native_harness::launch::{resolve_native_image, LaunchMode, LaunchSpec, Platform, ProcessLauncher};

use common::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const SERVER_CLASS: &str = "com.tangosol.net.Coherence";

fn touch(dir: &Path, name: &str) -> std::io::Result<()> {
    std::fs::write(dir.join(name), b"")
}

#[test]
fn finds_image_beside_versioned_archive() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "coherence-server-25.1.0-SNAPSHOT.jar")?;
    touch(dir.path(), "coherence-server")?;
    touch(dir.path(), "README.txt")?;

    let image = resolve_native_image(&RealFileSystem, SERVER_CLASS, dir.path())?;
    assert_eq!(image, dir.path().join("coherence-server"));
    Ok(())
}

#[test]
fn missing_image_names_the_class() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "coherence-server-25.1.0.jar")?;

    match resolve_native_image(&RealFileSystem, SERVER_CLASS, dir.path()) {
        Err(HarnessError::Launch(msg)) => {
            assert!(msg.contains("Could not find native image"), "{msg}");
            assert!(msg.contains(SERVER_CLASS), "{msg}");
        }
        other => panic!("expected launch error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn empty_build_folder_has_no_image() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let err = resolve_native_image(&RealFileSystem, SERVER_CLASS, dir.path()).unwrap_err();
    assert!(matches!(err, HarnessError::Launch(_)), "got {err:?}");
    Ok(())
}

#[test]
fn unversioned_archive_is_an_illegal_argument() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "coherence-server.jar")?;
    touch(dir.path(), "coherence-server")?;

    let err = resolve_native_image(&RealFileSystem, SERVER_CLASS, dir.path()).unwrap_err();
    assert!(matches!(err, HarnessError::IllegalArgument(_)), "got {err:?}");
    Ok(())
}

#[test]
fn missing_build_folder_is_a_launch_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("target");

    match resolve_native_image(&RealFileSystem, SERVER_CLASS, &missing) {
        Err(HarnessError::Launch(msg)) => assert!(msg.contains("Non-existent build folder"), "{msg}"),
        other => panic!("expected launch error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn file_as_build_folder_is_a_launch_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "target")?;

    match resolve_native_image(&RealFileSystem, SERVER_CLASS, &dir.path().join("target")) {
        Err(HarnessError::Launch(msg)) => assert!(msg.contains("not a directory"), "{msg}"),
        other => panic!("expected launch error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn native_launch_without_build_folder_fails_before_spawning() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let launcher = ProcessLauncher::new(
        Platform::rooted_at("test", dir.path()),
        LaunchMode::Native { image: None },
    );

    let spec = LaunchSpec::entry_point("server", SERVER_CLASS, Vec::<&str>::new());
    match launcher.prepare(&spec) {
        Err(HarnessError::Launch(msg)) => {
            assert!(msg.contains("Unable to locate build folder"), "{msg}");
            assert!(msg.contains(SERVER_CLASS), "{msg}");
        }
        other => panic!("expected launch error, got {other:?}"),
    }
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn native_mode_runs_resolved_image() -> TestResult {
    use std::time::Duration;

    use common::{with_timeout, ScriptBuilder};

    init_tracing();
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("target");
    std::fs::create_dir(&target)?;
    touch(&target, "coherence-server-25.1.0.jar")?;
    ScriptBuilder::new("coherence-server").echo_args().exit(7).write(&target)?;

    let launcher = ProcessLauncher::new(
        Platform::rooted_at("test", dir.path()).with_build_dir("target"),
        LaunchMode::Native { image: None },
    );
    let spec = LaunchSpec::entry_point("server", SERVER_CLASS, ["ignored/classes"]).arg("-Dcoherence.role=storage");

    let prepared = launcher.prepare(&spec)?;
    assert_eq!(prepared.program, target.join("coherence-server"));
    assert_eq!(prepared.args, vec!["-Dcoherence.role=storage".to_string()]);

    let app = launcher.launch(spec)?;
    assert_eq!(with_timeout(app.wait_for(Duration::from_secs(5))).await?, 7);
    app.close().await;
    Ok(())
}
