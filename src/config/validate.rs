// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::HarnessFile;
use crate::errors::{HarnessError, Result};

/// Run semantic validation against a loaded harness file.
///
/// This checks:
/// - there is at least one app
/// - every app has exactly one launch target, and `class_path` only
///   alongside `class_name`
/// - all durations and the close behaviour parse
/// - all `after` dependencies refer to existing apps
/// - the `after` graph has no cycles
///
/// It does **not** check that executables or build folders exist; that is
/// only known at launch time.
pub fn validate_config(cfg: &HarnessFile) -> Result<()> {
    ensure_has_apps(cfg)?;
    validate_launch_section(cfg)?;
    validate_apps(cfg)?;
    validate_dependencies(cfg)?;
    validate_order(cfg)?;
    Ok(())
}

fn ensure_has_apps(cfg: &HarnessFile) -> Result<()> {
    if cfg.app.is_empty() {
        return Err(HarnessError::ConfigError(
            "harness file must contain at least one [app.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_launch_section(cfg: &HarnessFile) -> Result<()> {
    cfg.launch.startup_timeout()?;
    cfg.launch.closing_behavior()?;

    if cfg.launch.launcher.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[launch].launcher must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_apps(cfg: &HarnessFile) -> Result<()> {
    for (name, app) in cfg.app.iter() {
        app.target(name)?;
        app.startup_timeout(name)?;

        if app.class_name.is_none() && !app.class_path.is_empty() {
            return Err(HarnessError::ConfigError(format!(
                "app '{name}' sets `class_path` without `class_name`"
            )));
        }
    }
    Ok(())
}

fn validate_dependencies(cfg: &HarnessFile) -> Result<()> {
    for (name, app) in cfg.app.iter() {
        for dep in app.after.iter() {
            if !cfg.app.contains_key(dep) {
                return Err(HarnessError::ConfigError(format!(
                    "app '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(HarnessError::ConfigError(format!(
                    "app '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_order(cfg: &HarnessFile) -> Result<()> {
    // Edge direction: dep -> app. For
    //   [app.B]
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.app.keys() {
        graph.add_node(name.as_str());
    }

    for (name, app) in cfg.app.iter() {
        for dep in app.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(HarnessError::LaunchCycle(format!(
            "cycle in `after` involving app '{}'",
            cycle.node_id()
        ))),
    }
}
