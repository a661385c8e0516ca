//! Drift comparison and reporting
//!
//! Two comparisons consume the parser's and inspector's outputs: a
//! [`DriftReport`] holds declared-vs-installed drift at one reference, and
//! a [`SnapshotDiff`] holds declared-vs-declared drift between two
//! references. Both serialize to JSON and render as text.

use crate::dockerfile::{normalize_name, InstalledPackage};
use manifest::ManifestSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;

/// A declared constraint and the installed pin that disagrees with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionMismatch {
    pub declared: String,
    pub installed: String,
}

/// Declared-vs-installed drift for one reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub reference: String,

    /// Runtime dependencies the build file never installs
    pub missing_from_build: BTreeMap<String, String>,

    /// Installed packages declared nowhere in the manifest
    pub not_declared: BTreeMap<String, Option<String>>,

    /// Packages pinned on both sides to different versions
    pub version_mismatches: BTreeMap<String, VersionMismatch>,
}

impl DriftReport {
    /// Compare declared dependencies against scanned installs
    ///
    /// Runtime dependencies must appear among the installs; development
    /// dependencies are never expected in the image, but an install that
    /// matches one is not flagged as undeclared either.
    pub fn compare(
        reference: impl Into<String>,
        snapshot: &ManifestSnapshot,
        installs: &[InstalledPackage],
    ) -> Self {
        let mut installed: BTreeMap<String, Option<String>> = BTreeMap::new();
        for package in installs {
            installed.insert(package.name.clone(), package.version.clone());
        }

        let mut missing_from_build = BTreeMap::new();
        let mut version_mismatches = BTreeMap::new();
        for (name, constraint) in snapshot.runtime() {
            let normalized = normalize_name(name);
            match installed.get(&normalized) {
                None => {
                    missing_from_build.insert(name.clone(), constraint.clone());
                }
                Some(Some(installed_version)) => {
                    if let Some(declared_version) = pinned_version(constraint) {
                        if declared_version != installed_version {
                            version_mismatches.insert(
                                name.clone(),
                                VersionMismatch {
                                    declared: constraint.clone(),
                                    installed: installed_version.clone(),
                                },
                            );
                        }
                    }
                }
                Some(None) => {}
            }
        }

        let declared: Vec<String> = snapshot
            .dependencies()
            .map(|dependency| normalize_name(&dependency.name))
            .collect();
        let not_declared = installed
            .into_iter()
            .filter(|(name, _)| !declared.contains(name))
            .collect();

        Self {
            reference: reference.into(),
            missing_from_build,
            not_declared,
            version_mismatches,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.missing_from_build.is_empty()
            && self.not_declared.is_empty()
            && self.version_mismatches.is_empty()
    }

    /// Human-readable report
    pub fn render(&self) -> String {
        if self.is_clean() {
            return format!("{}: manifest and build file agree", self.reference);
        }

        let mut lines = vec![format!("{}: drift detected", self.reference)];
        for (name, constraint) in &self.missing_from_build {
            lines.push(format!(
                "  missing from build: {} (declared {})",
                name, constraint
            ));
        }
        for (name, version) in &self.not_declared {
            match version {
                Some(version) => {
                    lines.push(format!("  not declared: {}=={}", name, version))
                }
                None => lines.push(format!("  not declared: {}", name)),
            }
        }
        for (name, mismatch) in &self.version_mismatches {
            lines.push(format!(
                "  version mismatch: {} declared {} but installs {}",
                name, mismatch.declared, mismatch.installed
            ));
        }
        lines.join("\n")
    }
}

/// A constraint that changed between two references
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintChange {
    pub from: String,
    pub to: String,
}

/// Added/removed/changed entries for one dependency kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindDiff {
    pub added: BTreeMap<String, String>,
    pub removed: BTreeMap<String, String>,
    pub changed: BTreeMap<String, ConstraintChange>,
}

impl KindDiff {
    fn between(old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> Self {
        let mut diff = Self::default();

        for (name, constraint) in new {
            match old.get(name) {
                None => {
                    diff.added.insert(name.clone(), constraint.clone());
                }
                Some(previous) if previous != constraint => {
                    diff.changed.insert(
                        name.clone(),
                        ConstraintChange {
                            from: previous.clone(),
                            to: constraint.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }

        for (name, constraint) in old {
            if !new.contains_key(name) {
                diff.removed.insert(name.clone(), constraint.clone());
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Declared-dependency drift between two references
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub from: String,
    pub to: String,
    pub runtime: KindDiff,
    pub development: KindDiff,
}

impl SnapshotDiff {
    pub fn between(
        from: impl Into<String>,
        to: impl Into<String>,
        old: &ManifestSnapshot,
        new: &ManifestSnapshot,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            runtime: KindDiff::between(old.runtime(), new.runtime()),
            development: KindDiff::between(old.development(), new.development()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty() && self.development.is_empty()
    }

    /// Human-readable report
    pub fn render(&self) -> String {
        if self.is_empty() {
            return format!("{} -> {}: no dependency changes", self.from, self.to);
        }

        let mut lines = vec![format!("{} -> {}:", self.from, self.to)];
        for (kind, diff) in [("runtime", &self.runtime), ("development", &self.development)] {
            for (name, constraint) in &diff.added {
                lines.push(format!("  {} added: {} {}", kind, name, constraint));
            }
            for (name, constraint) in &diff.removed {
                lines.push(format!("  {} removed: {} {}", kind, name, constraint));
            }
            for (name, change) in &diff.changed {
                lines.push(format!(
                    "  {} changed: {} {} -> {}",
                    kind, name, change.from, change.to
                ));
            }
        }
        lines.join("\n")
    }
}

/// Extract the concrete version from an exact constraint
///
/// Poetry writes exact pins as `1.2.3`, `=1.2.3`, or `==1.2.3`; caret,
/// tilde, and wildcard constraints pin nothing.
fn pinned_version(constraint: &str) -> Option<&str> {
    let stripped = constraint
        .strip_prefix("==")
        .or_else(|| constraint.strip_prefix('='))
        .unwrap_or(constraint)
        .trim();

    let is_concrete = !stripped.is_empty()
        && stripped
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
        && !stripped.ends_with('.');
    is_concrete.then_some(stripped)
}
