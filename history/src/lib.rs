//! Read-only git history inspection
//!
//! Retrieves the content of named files as they existed at arbitrary
//! references, and enumerates references, without ever touching the
//! caller's checked-out state. File content is read straight from the
//! object store (`commit -> tree -> blob`), so no checkout happens at any
//! point.
//!
//! # Reading a file at a reference
//!
//! ```no_run
//! use history::HistoryInspector;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inspector = HistoryInspector::open(".", "Dockerfile")?;
//! let file = inspector.file_at("main", "pyproject.toml")?;
//! match file.text() {
//!     Some(text) => println!("{}", text),
//!     None => println!("pyproject.toml not present at main"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! All operations are **read-only** (no git state modification).

pub mod backend;
pub mod inspector;
pub mod types;

pub use backend::{CommitId, Git2Backend, GitBackend, HistoryError, HistoryResult};
pub use inspector::HistoryInspector;
pub use types::{HistoricalFile, RefInfo, RefKind, RepositoryLocation};
