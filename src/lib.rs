// src/lib.rs

pub mod app;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod errors;
pub mod fs;
pub mod launch;
pub mod logging;
pub mod plan;
pub mod probe;
pub mod session;

use anyhow::{bail, Result};
use tracing::{debug, error, info};

use crate::app::NameFilter;
use crate::cli::CliArgs;
use crate::config::{config_root_dir, load_and_validate, HarnessFile};
use crate::launch::ProcessLauncher;
use crate::plan::LaunchPlan;
use crate::session::{spec_for_app, Session};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - harness file loading
/// - launch ordering
/// - launcher / session
/// - readiness waiting
/// - Ctrl-C handling (with `--hold`)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)?;

    let plan = LaunchPlan::from_config(&cfg);
    let order = match args.only {
        Some(ref prefix) => {
            let filter = NameFilter::prefix(prefix.as_str());
            let selected: Vec<&str> = plan.apps().filter(|name| filter.matches(name)).collect();
            if selected.is_empty() {
                bail!("no application name starts with '{prefix}'");
            }
            plan.order_of(&plan.with_dependencies(selected))
        }
        None => plan.launch_order(),
    };
    info!(?order, "launch order");

    let root = config_root_dir(&config_path);
    let launcher = ProcessLauncher::new(cfg.platform(&root)?, cfg.launch.launch_mode());

    if args.dry_run {
        print_dry_run(&cfg, &launcher, &order)?;
        return Ok(());
    }

    let closing = cfg.launch.closing_behavior()?;
    let mut session = Session::new(launcher);

    let outcome = match session.start(&cfg, &order).await {
        Ok(()) => {
            let report = session.await_ready().await;
            print_report(&report);
            if report.is_ready() {
                if args.hold {
                    hold().await;
                }
                Ok(())
            } else {
                Err(anyhow::anyhow!(
                    "{} of {} applications did not become ready",
                    report.failed.len(),
                    report.failed.len() + report.ready.len()
                ))
            }
        }
        Err(e) => {
            error!(error = %e, "launch aborted");
            Err(e.into())
        }
    };

    session.close_all(closing).await;
    outcome
}

async fn hold() {
    info!("applications ready; press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
    }
}

fn print_report(report: &session::ReadinessReport) {
    for name in report.ready.iter() {
        println!("ready     {name}");
    }
    for (name, err) in report.failed.iter() {
        println!("not ready {name}: {err}");
    }
}

/// Print resolved command lines and readiness markers, launching nothing.
fn print_dry_run(cfg: &HarnessFile, launcher: &ProcessLauncher, order: &[String]) -> Result<()> {
    println!("native-harness dry-run");
    println!("  launch.mode = {:?}", launcher.mode());
    println!("  launch.startup_timeout = {}", cfg.launch.startup_timeout);
    println!();

    println!("apps ({}):", order.len());
    for name in order {
        let Some(app) = cfg.app.get(name) else {
            continue;
        };
        let (spec, _latches) = spec_for_app(cfg, name, app)?;
        println!("  - {name}");
        match launcher.prepare(&spec) {
            Ok(cmd) => {
                println!("      cmd: {cmd}");
                println!("      cwd: {}", cmd.working_dir.display());
            }
            Err(e) => println!("      cmd: <unresolved: {e}>"),
        }
        if !app.after.is_empty() {
            println!("      after: {:?}", app.after);
        }
        if !app.ready_on_stderr.is_empty() {
            println!("      ready_on_stderr: {:?}", app.ready_on_stderr);
        }
        if !app.ready_on_stdout.is_empty() {
            println!("      ready_on_stdout: {:?}", app.ready_on_stdout);
        }
    }

    debug!("dry-run complete (nothing launched)");
    Ok(())
}
