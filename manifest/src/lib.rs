//! Poetry manifest parsing for depdrift
//!
//! This crate turns raw `pyproject.toml` text into a normalized
//! [`ManifestSnapshot`]: one mapping of runtime dependencies and one of
//! development dependencies, regardless of which schema generation the
//! manifest uses (the legacy flat `dev-dependencies` table or the grouped
//! `group.<name>.dependencies` form).

pub mod parser;
pub mod types;

pub use parser::{parse_manifest, ParseError, ParseResult};
pub use types::{Dependency, DependencyKind, ManifestSnapshot};
