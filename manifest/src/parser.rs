//! Manifest extraction
//!
//! Reads the dependency-bearing sections of a Poetry `pyproject.toml` under
//! every schema generation in use. Malformed TOML is the only hard failure;
//! a syntactically valid document with missing or oddly shaped sections
//! degrades to empty mappings or skipped entries.

use crate::types::ManifestSnapshot;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use toml::value::Table;
use toml::Value;

/// Errors that can occur while parsing a manifest
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed manifest TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Key path of the dependency manager's namespace table
const NAMESPACE: [&str; 2] = ["tool", "poetry"];

/// Entries inside the dependency tables that pin the toolchain itself
/// rather than declare a project dependency
const NON_PACKAGE_KEYS: &[&str] = &["python"];

/// Development-section extractors, evaluated in order. Entries from a later
/// extractor overwrite same-named entries from an earlier one.
const DEV_EXTRACTORS: &[fn(&Table) -> Vec<(String, String)>] =
    &[legacy_dev_entries, grouped_dev_entries];

/// Parse manifest text into a [`ManifestSnapshot`]
///
/// A manifest without a `tool.poetry` namespace is a valid "no managed
/// dependencies" state and yields an empty snapshot.
pub fn parse_manifest(text: &str) -> ParseResult<ManifestSnapshot> {
    let document: Value = toml::from_str(text)?;

    let Some(poetry) = namespace_table(&document) else {
        return Ok(ManifestSnapshot::default());
    };

    let runtime: BTreeMap<String, String> = poetry
        .get("dependencies")
        .and_then(Value::as_table)
        .map(dependency_entries)
        .unwrap_or_default()
        .into_iter()
        .collect();

    let mut development = BTreeMap::new();
    for extract in DEV_EXTRACTORS {
        development.extend(extract(poetry));
    }

    Ok(ManifestSnapshot::new(runtime, development))
}

impl ManifestSnapshot {
    /// Read and parse a manifest file
    pub fn from_path(path: impl AsRef<Path>) -> ParseResult<Self> {
        let text = std::fs::read_to_string(path)?;
        parse_manifest(&text)
    }
}

impl FromStr for ManifestSnapshot {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_manifest(s)
    }
}

/// Walk the fixed namespace key path down the document
fn namespace_table(document: &Value) -> Option<&Table> {
    let mut current = document.as_table()?;
    for key in NAMESPACE {
        current = current.get(key)?.as_table()?;
    }
    Some(current)
}

/// Resolve a dependency value to its constraint string
///
/// Accepted forms are a plain string and a table carrying a `version`
/// string. Anything else (arrays of markers, path/git tables without a
/// version) is not a constraint and the entry is skipped.
fn constraint_of(value: &Value) -> Option<String> {
    match value {
        Value::String(constraint) => Some(constraint.clone()),
        Value::Table(table) => table
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn dependency_entries(table: &Table) -> Vec<(String, String)> {
    table
        .iter()
        .filter(|(name, _)| !NON_PACKAGE_KEYS.contains(&name.as_str()))
        .filter_map(|(name, value)| constraint_of(value).map(|constraint| (name.clone(), constraint)))
        .collect()
}

/// Legacy flat `dev-dependencies` table directly under the namespace
fn legacy_dev_entries(poetry: &Table) -> Vec<(String, String)> {
    poetry
        .get("dev-dependencies")
        .and_then(Value::as_table)
        .map(dependency_entries)
        .unwrap_or_default()
}

/// Modern `group.<name>.dependencies` tables; every group folds into the
/// single development mapping
fn grouped_dev_entries(poetry: &Table) -> Vec<(String, String)> {
    let Some(groups) = poetry.get("group").and_then(Value::as_table) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for group in groups.values() {
        if let Some(dependencies) = group
            .as_table()
            .and_then(|group| group.get("dependencies"))
            .and_then(Value::as_table)
        {
            entries.extend(dependency_entries(dependencies));
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODERN_MANIFEST: &str = r#"
[tool.poetry]
name = "example"
version = "0.1.0"

[tool.poetry.dependencies]
python = "^3.9"
requests = "^2.26.0"
numpy = "^1.21.2"

[tool.poetry.group.dev.dependencies]
pytest = "^6.2.4"
"#;

    const LEGACY_MANIFEST: &str = r#"
[tool.poetry]
name = "example"
version = "0.1.0"

[tool.poetry.dependencies]
python = "^3.9"
requests = "^2.26.0"
numpy = "^1.21.2"

[tool.poetry.dev-dependencies]
pytest = "^6.2.4"
"#;

    #[test]
    fn test_modern_grouped_manifest() {
        let snapshot = parse_manifest(MODERN_MANIFEST).unwrap();
        assert_eq!(snapshot.runtime()["requests"], "^2.26.0");
        assert_eq!(snapshot.runtime()["numpy"], "^1.21.2");
        assert_eq!(snapshot.runtime().len(), 2);
        assert_eq!(snapshot.development()["pytest"], "^6.2.4");
        assert_eq!(snapshot.development().len(), 1);
    }

    #[test]
    fn test_legacy_dev_dependencies_manifest() {
        let snapshot = parse_manifest(LEGACY_MANIFEST).unwrap();
        assert_eq!(snapshot.runtime()["requests"], "^2.26.0");
        assert_eq!(snapshot.runtime()["numpy"], "^1.21.2");
        assert_eq!(snapshot.development()["pytest"], "^6.2.4");
    }

    #[test]
    fn test_both_dev_forms_classify_identically() {
        let modern = parse_manifest(MODERN_MANIFEST).unwrap();
        let legacy = parse_manifest(LEGACY_MANIFEST).unwrap();
        assert_eq!(modern, legacy);
    }

    #[test]
    fn test_manifest_without_dependency_tables() {
        let snapshot = parse_manifest(
            "[tool.poetry]\nname = \"example\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        assert!(snapshot.runtime().is_empty());
        assert!(snapshot.development().is_empty());
    }

    #[test]
    fn test_manifest_without_poetry_namespace() {
        let snapshot = parse_manifest(
            "[build-system]\nrequires = [\"setuptools\"]\n",
        )
        .unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_empty_document() {
        let snapshot = parse_manifest("").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_malformed_toml_is_the_only_hard_failure() {
        let result = parse_manifest("[tool.poetry\nname = ");
        assert!(matches!(result, Err(ParseError::Toml(_))));
    }

    #[test]
    fn test_interpreter_pin_is_not_a_dependency() {
        let snapshot = parse_manifest(MODERN_MANIFEST).unwrap();
        assert!(!snapshot.runtime().contains_key("python"));
        assert!(!snapshot.development().contains_key("python"));
    }

    #[test]
    fn test_table_valued_constraint_resolves_to_version() {
        let snapshot = parse_manifest(
            r#"
[tool.poetry.dependencies]
uvicorn = { version = "^0.15.0", extras = ["standard"] }
"#,
        )
        .unwrap();
        assert_eq!(snapshot.runtime()["uvicorn"], "^0.15.0");
    }

    #[test]
    fn test_malformed_entries_are_skipped_not_fatal() {
        let snapshot = parse_manifest(
            r#"
[tool.poetry.dependencies]
requests = "^2.26.0"
local-pkg = { path = "../local-pkg" }
odd = 3
"#,
        )
        .unwrap();
        assert_eq!(snapshot.runtime().len(), 1);
        assert_eq!(snapshot.runtime()["requests"], "^2.26.0");
    }

    #[test]
    fn grouped_entry_overrides_legacy() {
        // Pins the precedence between the two dev-section forms: the
        // grouped extractor runs after the legacy one and wins.
        let snapshot = parse_manifest(
            r#"
[tool.poetry.dev-dependencies]
pytest = "^6.2.4"

[tool.poetry.group.dev.dependencies]
pytest = "^7.0.0"
"#,
        )
        .unwrap();
        assert_eq!(snapshot.development()["pytest"], "^7.0.0");
    }

    #[test]
    fn test_all_groups_fold_into_development() {
        let snapshot = parse_manifest(
            r#"
[tool.poetry.group.dev.dependencies]
pytest = "^6.2.4"

[tool.poetry.group.lint.dependencies]
flake8 = "^4.0.1"
"#,
        )
        .unwrap();
        assert_eq!(snapshot.development()["pytest"], "^6.2.4");
        assert_eq!(snapshot.development()["flake8"], "^4.0.1");
        assert_eq!(snapshot.development().len(), 2);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse_manifest(MODERN_MANIFEST).unwrap();
        let second = parse_manifest(MODERN_MANIFEST).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_str_round_trip() {
        let snapshot: ManifestSnapshot = MODERN_MANIFEST.parse().unwrap();
        assert_eq!(snapshot.runtime().len(), 2);
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = ManifestSnapshot::from_path("/nonexistent/pyproject.toml");
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}
