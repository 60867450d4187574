// src/cluster.rs

//! Cluster-wide launch options and the readiness markers cluster members
//! print.
//!
//! Members are configured purely through `-D<key>=<value>` arguments. The
//! options are an explicit value that is rendered into each launch spec, so
//! two harnesses in the same test process can target different clusters.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Logged on stderr once a member has finished starting.
pub const SERVER_STARTED: &str = "Started Coherence server";

/// Logged on stderr once partition ownership has settled across `nodes`
/// members.
pub fn partition_stabilized(nodes: usize) -> String {
    format!("Partition ownership has stabilized with {nodes} nodes")
}

/// `[cluster]` section.
///
/// ```toml
/// [cluster]
/// name = "native-image-test-2"
/// local_address = "127.0.0.1"
/// wka = ["127.0.0.1"]
/// prefer_ipv4 = true
/// properties = { "coherence.log.level" = "9" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClusterOptions {
    /// `coherence.cluster`
    #[serde(default)]
    pub name: Option<String>,

    /// `coherence.localhost`
    #[serde(default)]
    pub local_address: Option<String>,

    /// `coherence.wka`, comma-joined.
    #[serde(default)]
    pub wka: Vec<String>,

    /// `java.net.preferIPv4Stack`
    #[serde(default)]
    pub prefer_ipv4: bool,

    /// Any further system properties, emitted in key order.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ClusterOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Loopback-only cluster, the usual shape for local test runs.
    pub fn loopback(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            local_address: Some("127.0.0.1".to_string()),
            wka: vec!["127.0.0.1".to_string()],
            prefer_ipv4: true,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Render as `-D` arguments, in a stable order.
    pub fn system_properties(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.prefer_ipv4 {
            args.push(system_property("java.net.preferIPv4Stack", "true"));
        }
        if let Some(ref name) = self.name {
            args.push(system_property("coherence.cluster", name));
        }
        if let Some(ref addr) = self.local_address {
            args.push(system_property("coherence.localhost", addr));
        }
        if !self.wka.is_empty() {
            args.push(system_property("coherence.wka", &self.wka.join(",")));
        }
        for (key, value) in self.properties.iter() {
            args.push(system_property(key, value));
        }

        args
    }
}

pub fn system_property(key: &str, value: &str) -> String {
    format!("-D{key}={value}")
}
