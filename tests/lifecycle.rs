#![cfg(unix)]

mod common;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use native_harness::app::ClosingBehavior;
use native_harness::errors::HarnessError;
use native_harness::launch::LaunchSpec;

use common::{init_tracing, script_launcher, with_timeout, ScriptBuilder};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn natural_exit_code_is_reported() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = ScriptBuilder::new("exits-3").stdout("bye").exit(3).write(dir.path())?;

    let app = script_launcher(dir.path()).launch(LaunchSpec::executable("exits-3", script))?;
    assert!(app.id() > 0);

    let code = with_timeout(app.wait_for(Duration::from_secs(5))).await?;
    assert_eq!(code, 3);
    assert_eq!(app.exit_value()?, 3);
    assert!(!app.is_operational());

    app.close().await;
    Ok(())
}

#[tokio::test]
async fn exit_value_while_running_is_illegal_state() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = ScriptBuilder::new("sleeper").run_forever().write(dir.path())?;

    let app = script_launcher(dir.path()).launch(LaunchSpec::executable("sleeper", script))?;
    assert!(app.is_operational());

    match app.exit_value() {
        Err(HarnessError::IllegalState(_)) => {}
        other => panic!("expected IllegalState, got {other:?}"),
    }

    match app.wait_for(Duration::from_millis(100)).await {
        Err(HarnessError::Timeout { .. }) => {}
        other => panic!("expected Timeout, got {other:?}"),
    }

    app.close().await;
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent_and_leaves_an_exit_code() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = ScriptBuilder::new("sleeper").run_forever().write(dir.path())?;

    let app = script_launcher(dir.path()).launch(LaunchSpec::executable("sleeper", script))?;

    with_timeout(app.close()).await;
    assert!(!app.is_operational());

    // Already terminated: a zero timeout must still succeed.
    let code = app.wait_for(Duration::ZERO).await?;
    assert_eq!(code, 128 + libc::SIGKILL);
    assert_eq!(app.exit_value()?, code);

    with_timeout(app.close()).await;
    with_timeout(app.close_with(ClosingBehavior::graceful())).await;
    assert_eq!(app.exit_value()?, code);
    Ok(())
}

#[tokio::test]
async fn concurrent_close_terminates_once() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = ScriptBuilder::new("sleeper").run_forever().write(dir.path())?;

    let app = Arc::new(
        script_launcher(dir.path()).launch(LaunchSpec::executable("sleeper", script))?,
    );

    let mut handles = Vec::new();
    for _ in 0..4 {
        let app = Arc::clone(&app);
        handles.push(tokio::spawn(async move {
            app.close().await;
            app.exit_value()
        }));
    }
    for h in handles {
        // Every closer returns only once the process is gone.
        let code = with_timeout(h).await??;
        assert_eq!(code, 128 + libc::SIGKILL);
    }
    assert!(!app.is_operational());
    Ok(())
}

#[tokio::test]
async fn second_close_waits_for_graceful_close_in_progress() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = ScriptBuilder::new("stubborn")
        .ignore_sigterm()
        .sleep_ms(30_000)
        .write(dir.path())?;

    let app = Arc::new(
        script_launcher(dir.path()).launch(LaunchSpec::executable("stubborn", script))?,
    );

    let graceful = {
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            app.close_with(ClosingBehavior::Graceful {
                grace: Duration::from_millis(500),
            })
            .await
        })
    };
    // Let the graceful close claim the application first.
    while app.is_operational() {
        tokio::task::yield_now().await;
    }

    with_timeout(app.close()).await;
    assert_eq!(app.exit_value()?, 128 + libc::SIGKILL);

    with_timeout(graceful).await?;
    Ok(())
}

#[tokio::test]
async fn graceful_close_sends_sigterm() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = ScriptBuilder::new("polite").run_forever().write(dir.path())?;

    let app = script_launcher(dir.path()).launch(LaunchSpec::executable("polite", script))?;

    with_timeout(app.close_with(ClosingBehavior::Graceful {
        grace: Duration::from_secs(5),
    }))
    .await;
    assert_eq!(app.exit_value()?, 128 + libc::SIGTERM);
    Ok(())
}

#[tokio::test]
async fn graceful_close_escalates_to_kill() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    // The shell ignores TERM and loops instead of exec'ing, so only KILL ends it.
    let script = ScriptBuilder::new("stubborn")
        .ignore_sigterm()
        .stdout("ready")
        .sleep_ms(30_000)
        .write(dir.path())?;

    let app = script_launcher(dir.path()).launch(LaunchSpec::executable("stubborn", script))?;

    let started = std::time::Instant::now();
    with_timeout(app.close_with(ClosingBehavior::Graceful {
        grace: Duration::from_millis(300),
    }))
    .await;

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(app.exit_value()?, 128 + libc::SIGKILL);
    Ok(())
}

#[tokio::test]
async fn dropping_an_application_kills_it() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = ScriptBuilder::new("sleeper").run_forever().write(dir.path())?;

    let app = script_launcher(dir.path()).launch(LaunchSpec::executable("sleeper", script))?;
    let pid = app.id();
    assert!(pid > 0);
    drop(app);

    // Poll until the pid is gone (signal 0 only checks for existence).
    with_timeout(async {
        loop {
            let alive = unsafe { libc::kill(pid as libc::pid_t, 0) } == 0;
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    Ok(())
}
