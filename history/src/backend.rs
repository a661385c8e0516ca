//! Version-control backend
//!
//! The inspector talks to git through the [`GitBackend`] trait so tests can
//! substitute an in-memory fake. The production implementation,
//! [`Git2Backend`], reads blobs from the object store via git2 and never
//! checks anything out: the caller's HEAD, index, and working tree are
//! untouched by construction.

use crate::types::{RefInfo, RefKind, RepositoryLocation};
use chrono::{DateTime, Utc};
use git2::{ErrorCode, ObjectType, Repository};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Errors that can occur during history inspection
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Repository unreachable, invalid, or a remote fetch failed
    #[error("Repository unavailable: {message}")]
    Repository { message: String },

    /// The given reference does not resolve to a commit
    #[error("Reference does not resolve: {reference}")]
    Reference { reference: String },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Invalid UTF-8 in git data: {0}")]
    InvalidUtf8(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Hex-encoded commit identifier
///
/// Kept as a string so backends other than git2 (including test fakes) can
/// mint them freely.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-capable version-control backend
///
/// The sole environmental dependency of the inspector. Every operation is
/// read-only against the repository's object store.
pub trait GitBackend: Send {
    /// Resolve a branch, tag, or commit string to a commit id
    fn resolve(&self, reference: &str) -> HistoryResult<CommitId>;

    /// Read a file's bytes at a commit; `None` when the path is absent there
    fn read_file_at(&self, commit: &CommitId, path: &str) -> HistoryResult<Option<Vec<u8>>>;

    /// Enumerate known branches and tags, in no guaranteed order
    fn list_refs(&self) -> HistoryResult<Vec<RefInfo>>;
}

/// git2-based backend reading straight from the object store
///
/// For a remote location, construction performs a single clone attempt into
/// a scratch directory this backend exclusively owns; the scratch clone is
/// removed on drop. Clone failure surfaces as
/// [`HistoryError::Repository`] and is never retried.
pub struct Git2Backend {
    repo: Repository,
    scratch: Option<PathBuf>,
}

impl Git2Backend {
    pub fn open(location: &RepositoryLocation) -> HistoryResult<Self> {
        match location {
            RepositoryLocation::Local(path) => {
                let repo = Repository::open(path).map_err(|e| HistoryError::Repository {
                    message: format!("{}: {}", path.display(), e.message()),
                })?;
                debug!(path = %path.display(), "opened local repository");
                Ok(Self {
                    repo,
                    scratch: None,
                })
            }
            RepositoryLocation::Remote(url) => {
                let scratch = std::env::temp_dir().join(format!("depdrift-{}", Uuid::new_v4()));
                info!(url = %url, scratch = %scratch.display(), "cloning remote repository");
                let repo = Repository::clone(url, &scratch).map_err(|e| {
                    let _ = std::fs::remove_dir_all(&scratch);
                    HistoryError::Repository {
                        message: format!("clone of {} failed: {}", url, e.message()),
                    }
                })?;
                Ok(Self {
                    repo,
                    scratch: Some(scratch),
                })
            }
        }
    }

    /// Path of the repository's git directory (scratch clone for remotes)
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }
}

impl Drop for Git2Backend {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            let _ = std::fs::remove_dir_all(&scratch);
        }
    }
}

impl GitBackend for Git2Backend {
    fn resolve(&self, reference: &str) -> HistoryResult<CommitId> {
        let object = self
            .repo
            .revparse_single(reference)
            .map_err(|_| HistoryError::Reference {
                reference: reference.to_string(),
            })?;
        // Peels annotated tags and branch tips alike down to a commit.
        let commit = object
            .peel(ObjectType::Commit)
            .map_err(|_| HistoryError::Reference {
                reference: reference.to_string(),
            })?;
        Ok(CommitId::new(commit.id().to_string()))
    }

    fn read_file_at(&self, commit: &CommitId, path: &str) -> HistoryResult<Option<Vec<u8>>> {
        let oid = git2::Oid::from_str(commit.as_str())?;
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let object = entry.to_object(&self.repo)?;
        match object.as_blob() {
            Some(blob) => Ok(Some(blob.content().to_vec())),
            // The path names a tree or submodule, not a readable file
            None => Ok(None),
        }
    }

    fn list_refs(&self) -> HistoryResult<Vec<RefInfo>> {
        let mut refs = Vec::new();

        for reference in self.repo.references()? {
            let reference = reference?;
            let kind = if reference.is_branch() || reference.is_remote() {
                RefKind::Branch
            } else if reference.is_tag() {
                RefKind::Tag
            } else {
                continue;
            };

            let name = reference
                .shorthand()
                .ok_or_else(|| HistoryError::InvalidUtf8("reference name".to_string()))?
                .to_string();

            // Annotated tags peel to their tagged commit; lightweight tags
            // and branches already point at one.
            let commit = reference.peel_to_commit().ok();
            let target = commit
                .as_ref()
                .map(|c| c.id().to_string())
                .or_else(|| reference.target().map(|oid| oid.to_string()))
                .unwrap_or_default();
            let committed_at = commit.and_then(commit_time);

            refs.push(RefInfo {
                name,
                kind,
                target,
                committed_at,
            });
        }

        Ok(refs)
    }
}

fn commit_time(commit: git2::Commit<'_>) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(commit.time().seconds(), 0)
}
