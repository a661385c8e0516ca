//! History inspection types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;

/// Where a repository lives: a local working copy or a clonable URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLocation {
    Local(PathBuf),
    Remote(String),
}

const REMOTE_SCHEMES: [&str; 4] = ["http://", "https://", "git://", "ssh://"];

impl RepositoryLocation {
    /// Classify a user-supplied location string
    ///
    /// URL schemes and scp-style `git@host:` addresses are remote;
    /// everything else is treated as a local path.
    pub fn parse(location: &str) -> Self {
        let is_remote = REMOTE_SCHEMES
            .iter()
            .any(|scheme| location.starts_with(scheme))
            || location.starts_with("git@");
        if is_remote {
            Self::Remote(location.to_string())
        } else {
            Self::Local(PathBuf::from(location))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// The content of a single named file at a single reference
///
/// A file that did not exist at the reference is a real outcome, not an
/// error: `content` is `None` and the caller decides what missing history
/// means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalFile {
    /// The reference the file was read at, as given by the caller
    pub reference: String,

    /// Repository-relative file path
    pub path: String,

    /// Raw bytes, or `None` if the file was absent at the reference
    pub content: Option<Vec<u8>>,
}

impl HistoricalFile {
    /// Whether the file existed at the reference
    pub fn exists(&self) -> bool {
        self.content.is_some()
    }

    /// Content as text, replacing invalid UTF-8
    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.content.as_deref().map(String::from_utf8_lossy)
    }
}

/// Kind of a listed reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Branch,
    Tag,
}

/// One known branch or tag
///
/// Returned by reference listing in no guaranteed order; callers sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefInfo {
    /// Short name (`main`, `origin/feature`, `v1.2.0`)
    pub name: String,

    pub kind: RefKind,

    /// Commit id the reference points at, hex-encoded
    pub target: String,

    /// Commit time of the target, when resolvable
    pub committed_at: Option<DateTime<Utc>>,
}
