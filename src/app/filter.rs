// src/app/filter.rs

use regex::Regex;

use crate::errors::{HarnessError, Result};

/// Selects applications by display name.
#[derive(Debug, Clone)]
pub enum NameFilter {
    Exact(String),
    /// Regex that must match the whole name.
    Matching(Regex),
    Prefix(String),
    Containing(String),
}

impl NameFilter {
    pub fn exact(name: impl Into<String>) -> Self {
        NameFilter::Exact(name.into())
    }

    pub fn matching(pattern: &str) -> Result<Self> {
        Regex::new(&format!("^(?:{pattern})$"))
            .map(NameFilter::Matching)
            .map_err(|e| HarnessError::IllegalArgument(format!("invalid name pattern '{pattern}': {e}")))
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        NameFilter::Prefix(prefix.into())
    }

    pub fn containing(fragment: impl Into<String>) -> Self {
        NameFilter::Containing(fragment.into())
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::Exact(expected) => name == expected,
            NameFilter::Matching(re) => re.is_match(name),
            NameFilter::Prefix(prefix) => name.starts_with(prefix.as_str()),
            NameFilter::Containing(fragment) => name.contains(fragment.as_str()),
        }
    }
}
