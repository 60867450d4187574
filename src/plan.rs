// src/plan.rs

//! Launch ordering derived from the `after` lists in a harness file.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::model::HarnessFile;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct PlanNode {
    /// Apps that must be ready before this one launches.
    deps: Vec<String>,
    /// Apps waiting on this one.
    dependents: Vec<String>,
}

/// Dependency graph of applications keyed by name.
///
/// Acyclicity is checked in `config::validate`; this type only keeps
/// adjacency information and derives orders from it.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    nodes: BTreeMap<String, PlanNode>,
}

impl LaunchPlan {
    /// Build from a validated [`HarnessFile`].
    pub fn from_config(cfg: &HarnessFile) -> Self {
        let mut nodes: BTreeMap<String, PlanNode> = cfg
            .app
            .iter()
            .map(|(name, app)| {
                (
                    name.clone(),
                    PlanNode {
                        deps: app.after.clone(),
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        for (name, app) in cfg.app.iter() {
            for dep in app.after.iter() {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes }
    }

    pub fn apps(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// `selected` plus everything they (transitively) depend on.
    pub fn with_dependencies<'a, I>(&self, selected: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = BTreeSet::new();
        let mut stack: Vec<String> = selected.into_iter().map(str::to_string).collect();

        while let Some(name) = stack.pop() {
            if !self.nodes.contains_key(&name) || !out.insert(name.clone()) {
                continue;
            }
            stack.extend(self.dependencies_of(&name).iter().cloned());
        }

        out
    }

    /// Launch order over all apps.
    pub fn launch_order(&self) -> Vec<String> {
        self.order_of(&self.nodes.keys().cloned().collect())
    }

    /// Dependencies first; ties broken by name. Dependencies outside
    /// `subset` are ignored.
    pub fn order_of(&self, subset: &BTreeSet<String>) -> Vec<String> {
        let mut remaining: BTreeMap<&str, usize> = subset
            .iter()
            .filter(|name| self.nodes.contains_key(name.as_str()))
            .map(|name| {
                let pending = self
                    .dependencies_of(name)
                    .iter()
                    .filter(|dep| subset.contains(*dep))
                    .count();
                (name.as_str(), pending)
            })
            .collect();

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, pending)| **pending == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(remaining.len());

        while let Some(name) = ready.pop_first() {
            remaining.remove(name);
            order.push(name.to_string());

            for dependent in self.dependents_of(name) {
                if let Some(pending) = remaining.get_mut(dependent.as_str()) {
                    *pending -= 1;
                    if *pending == 0 {
                        ready.insert(dependent.as_str());
                    }
                }
            }
        }

        order
    }
}
