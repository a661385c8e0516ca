//! History inspector
//!
//! One [`HistoryInspector`] owns one backend behind a mutex: every lookup
//! holds the lock for its full duration, so concurrent calls against the
//! same handle serialize instead of interleaving. Callers wanting parallel
//! comparisons open independent handles.

use crate::backend::{Git2Backend, GitBackend, HistoryResult};
use crate::types::{HistoricalFile, RefInfo, RepositoryLocation};
use std::sync::Mutex;
use tracing::debug;

/// Handle for read-only historical lookups against one repository
///
/// Bound at construction to a repository location and a designated
/// build-file name used by [`HistoryInspector::build_file_at`].
pub struct HistoryInspector<B: GitBackend = Git2Backend> {
    backend: Mutex<B>,
    build_file: String,
}

impl HistoryInspector<Git2Backend> {
    /// Open a repository at a local path or clonable URL
    ///
    /// Fails with [`crate::HistoryError::Repository`] when the location is
    /// not a usable repository. For remote URLs a single clone attempt is
    /// made here; there are no retries.
    pub fn open(location: &str, build_file: impl Into<String>) -> HistoryResult<Self> {
        let location = RepositoryLocation::parse(location);
        let backend = Git2Backend::open(&location)?;
        Ok(Self::with_backend(backend, build_file))
    }
}

impl<B: GitBackend> HistoryInspector<B> {
    /// Wrap an existing backend (test seam for fake backends)
    pub fn with_backend(backend: B, build_file: impl Into<String>) -> Self {
        Self {
            backend: Mutex::new(backend),
            build_file: build_file.into(),
        }
    }

    /// The designated build-file name
    pub fn build_file_name(&self) -> &str {
        &self.build_file
    }

    /// Read `file_name` as it existed at `reference`
    ///
    /// Fails with [`crate::HistoryError::Reference`] when the reference
    /// does not resolve. A resolvable reference where the file is absent is
    /// not an error: the returned [`HistoricalFile`] has no content, which
    /// callers must treat as meaningful history.
    pub fn file_at(&self, reference: &str, file_name: &str) -> HistoryResult<HistoricalFile> {
        let backend = self.backend.lock().unwrap();
        debug!(reference, file_name, "reading file from history");
        let commit = backend.resolve(reference)?;
        let content = backend.read_file_at(&commit, file_name)?;
        Ok(HistoricalFile {
            reference: reference.to_string(),
            path: file_name.to_string(),
            content,
        })
    }

    /// Read the designated build file at `reference`
    pub fn build_file_at(&self, reference: &str) -> HistoryResult<HistoricalFile> {
        let build_file = self.build_file.clone();
        self.file_at(reference, &build_file)
    }

    /// Enumerate known branches and tags, in no guaranteed order
    pub fn list_references(&self) -> HistoryResult<Vec<RefInfo>> {
        let backend = self.backend.lock().unwrap();
        backend.list_refs()
    }

    /// Read one file at two references for downstream comparison
    ///
    /// Comparison itself is the caller's responsibility; this only
    /// materializes both sides.
    pub fn diff_references(
        &self,
        a: &str,
        b: &str,
        file_name: &str,
    ) -> HistoryResult<(HistoricalFile, HistoricalFile)> {
        Ok((self.file_at(a, file_name)?, self.file_at(b, file_name)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CommitId, HistoryError};
    use crate::types::RefKind;
    use std::collections::HashMap;

    /// In-memory backend: reference name -> commit id, commit id -> files
    struct FakeBackend {
        refs: HashMap<String, String>,
        commits: HashMap<String, HashMap<String, Vec<u8>>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            let mut refs = HashMap::new();
            refs.insert("master".to_string(), "c2".to_string());
            refs.insert("test".to_string(), "c1".to_string());

            let mut first = HashMap::new();
            first.insert(
                "pyproject.toml".to_string(),
                b"[tool.poetry]\n".to_vec(),
            );

            let mut second = first.clone();
            second.insert("Dockerfile".to_string(), b"FROM python:3.9\n".to_vec());

            let mut commits = HashMap::new();
            commits.insert("c1".to_string(), first);
            commits.insert("c2".to_string(), second);

            Self { refs, commits }
        }
    }

    impl GitBackend for FakeBackend {
        fn resolve(&self, reference: &str) -> HistoryResult<CommitId> {
            self.refs
                .get(reference)
                .map(|id| CommitId::new(id.clone()))
                .ok_or_else(|| HistoryError::Reference {
                    reference: reference.to_string(),
                })
        }

        fn read_file_at(
            &self,
            commit: &CommitId,
            path: &str,
        ) -> HistoryResult<Option<Vec<u8>>> {
            Ok(self
                .commits
                .get(commit.as_str())
                .and_then(|files| files.get(path))
                .cloned())
        }

        fn list_refs(&self) -> HistoryResult<Vec<RefInfo>> {
            Ok(self
                .refs
                .iter()
                .map(|(name, target)| RefInfo {
                    name: name.clone(),
                    kind: RefKind::Branch,
                    target: target.clone(),
                    committed_at: None,
                })
                .collect())
        }
    }

    fn inspector() -> HistoryInspector<FakeBackend> {
        HistoryInspector::with_backend(FakeBackend::new(), "Dockerfile")
    }

    #[test]
    fn test_file_at_existing_reference() {
        let file = inspector().file_at("master", "Dockerfile").unwrap();
        assert!(file.exists());
        assert_eq!(file.text().unwrap(), "FROM python:3.9\n");
        assert_eq!(file.reference, "master");
        assert_eq!(file.path, "Dockerfile");
    }

    #[test]
    fn test_file_at_unresolvable_reference() {
        let result = inspector().file_at("no-such-branch", "Dockerfile");
        assert!(matches!(
            result,
            Err(HistoryError::Reference { reference }) if reference == "no-such-branch"
        ));
    }

    #[test]
    fn test_absent_file_is_not_an_error() {
        // The Dockerfile was introduced after the commit "test" points at.
        let file = inspector().file_at("test", "Dockerfile").unwrap();
        assert!(!file.exists());
        assert_eq!(file.reference, "test");
    }

    #[test]
    fn test_build_file_at_uses_designated_name() {
        let inspector = inspector();
        let file = inspector.build_file_at("master").unwrap();
        assert_eq!(file.path, inspector.build_file_name());
        assert!(file.exists());
    }

    #[test]
    fn test_diff_references_identical_refs() {
        let (a, b) = inspector()
            .diff_references("master", "master", "pyproject.toml")
            .unwrap();
        assert_eq!(a.content, b.content);
        assert_eq!(a.exists(), b.exists());
    }

    #[test]
    fn test_list_references() {
        let mut names: Vec<String> = inspector()
            .list_references()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["master".to_string(), "test".to_string()]);
    }
}
