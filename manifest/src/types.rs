//! Dependency snapshot types
//!
//! A [`ManifestSnapshot`] is the parse result for one manifest at one point
//! in time. It is constructed by the parser and never mutated afterwards;
//! downstream comparison code only reads from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a dependency is needed in production or only for development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Declared in the primary dependencies table
    Runtime,
    /// Declared under `dev-dependencies` or any `group.<name>.dependencies`
    Development,
}

/// A single declared package requirement
///
/// The constraint is kept as authored (`"^2.26.0"`, `"1.2.3"`, ...) and is
/// never interpreted as a semantic version range here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub constraint: String,
    pub kind: DependencyKind,
}

/// Normalized dependency declarations from one manifest
///
/// Runtime and development entries are separate mappings keyed by package
/// name, so a name may legitimately appear in both. Ordered maps keep diff
/// output deterministic.
///
/// # Examples
///
/// ```
/// use manifest::parse_manifest;
///
/// let snapshot = parse_manifest(
///     "[tool.poetry.dependencies]\nrequests = \"^2.26.0\"\n",
/// ).unwrap();
/// assert_eq!(snapshot.runtime()["requests"], "^2.26.0");
/// assert!(snapshot.development().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestSnapshot {
    runtime: BTreeMap<String, String>,
    development: BTreeMap<String, String>,
}

impl ManifestSnapshot {
    pub(crate) fn new(
        runtime: BTreeMap<String, String>,
        development: BTreeMap<String, String>,
    ) -> Self {
        Self {
            runtime,
            development,
        }
    }

    /// Dependencies required for the project to run in production
    pub fn runtime(&self) -> &BTreeMap<String, String> {
        &self.runtime
    }

    /// Dependencies required only for development and testing
    pub fn development(&self) -> &BTreeMap<String, String> {
        &self.development
    }

    /// The mapping for one dependency kind
    pub fn of_kind(&self, kind: DependencyKind) -> &BTreeMap<String, String> {
        match kind {
            DependencyKind::Runtime => &self.runtime,
            DependencyKind::Development => &self.development,
        }
    }

    /// True when the manifest declares no managed dependencies at all
    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty() && self.development.is_empty()
    }

    /// All declared dependencies, runtime entries first
    pub fn dependencies(&self) -> impl Iterator<Item = Dependency> + '_ {
        let runtime = self.runtime.iter().map(|(name, constraint)| Dependency {
            name: name.clone(),
            constraint: constraint.clone(),
            kind: DependencyKind::Runtime,
        });
        let development = self.development.iter().map(|(name, constraint)| Dependency {
            name: name.clone(),
            constraint: constraint.clone(),
            kind: DependencyKind::Development,
        });
        runtime.chain(development)
    }
}
