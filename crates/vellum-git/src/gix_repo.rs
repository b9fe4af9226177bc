//! The gix-backed implementation of [`ObjectStore`].

use std::path::Path;

use tracing::debug;

use crate::error::GitError;
use crate::repo::ObjectStore;
use crate::types::{CommitInfo, GitOid, NewCommit, RefEdit, RefName, TreeEntry};

/// An [`ObjectStore`] backed by a bare repository, via
/// [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixRepo::open`], [`GixRepo::init`] or
/// [`GixRepo::open_or_init`].
pub struct GixRepo {
    pub(crate) repo: gix::Repository,
}

impl GixRepo {
    /// Open the repository at exactly `path` (no parent discovery).
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = gix::open_opts(path, gix::open::Options::isolated())
            .map_err(|e| GitError::backend(format!("open {}: {e}", path.display())))?;
        Ok(Self { repo })
    }

    /// Create a new bare repository at `path`.
    pub fn init(path: &Path) -> Result<Self, GitError> {
        let repo = gix::init_bare(path)
            .map_err(|e| GitError::backend(format!("init {}: {e}", path.display())))?;
        Ok(Self { repo })
    }

    /// Open the repository at `path`, creating a bare one if the directory
    /// does not exist yet.
    pub fn open_or_init(path: &Path) -> Result<Self, GitError> {
        if path.is_dir() {
            Self::open(path)
        } else {
            debug!(path = %path.display(), "creating bare document repository");
            std::fs::create_dir_all(path)?;
            Self::init(path)
        }
    }

    /// The repository's git directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.repo.path()
    }
}

impl ObjectStore for GixRepo {
    // === Object write ===
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
        crate::objects_impl::write_blob(self, data)
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
        crate::objects_impl::write_tree(self, entries)
    }

    fn create_commit(&self, commit: &NewCommit) -> Result<GitOid, GitError> {
        crate::objects_impl::create_commit(self, commit)
    }

    // === Object read ===
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        crate::objects_impl::read_blob(self, oid)
    }

    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
        crate::objects_impl::read_tree(self, oid)
    }

    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
        crate::objects_impl::read_commit(self, oid)
    }

    // === Refs ===
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError> {
        crate::refs_impl::read_ref(self, name)
    }

    fn compare_and_swap_ref(&self, edit: &RefEdit) -> Result<bool, GitError> {
        crate::refs_impl::compare_and_swap_ref(self, edit)
    }

    fn delete_ref(&self, name: &RefName, expected: GitOid) -> Result<bool, GitError> {
        crate::refs_impl::delete_ref(self, name, expected)
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, GitOid)>, GitError> {
        crate::refs_impl::list_refs(self, prefix)
    }
}
