//! The [`ObjectStore`] trait: the boundary between the document store and
//! the git object model.
//!
//! The trait is object-safe so callers can use `&dyn ObjectStore` or
//! `Box<dyn ObjectStore>`.
//!
//! | Group        | Methods                                            |
//! |--------------|----------------------------------------------------|
//! | Object write | `write_blob`, `write_tree`, `create_commit`        |
//! | Object read  | `read_blob`, `read_tree`, `read_commit`            |
//! | Refs         | `read_ref`, `compare_and_swap_ref`, `delete_ref`, `list_refs` |
//!
//! # Concurrency
//!
//! Objects are immutable and content-addressed, so reads never need
//! locking. Refs are the only mutable state, and every ref mutation is a
//! compare-and-swap against the value the caller last observed. A lost race
//! is reported as `Ok(false)`, never as an error, and never as a silent
//! overwrite.

use crate::error::GitError;
use crate::types::{CommitInfo, GitOid, NewCommit, RefEdit, RefName, TreeEntry};

/// The object store interface used by the document layer.
///
/// Implementations: [`GixRepo`](crate::GixRepo) (bare repository on disk) and
/// [`MemoryRepo`](crate::MemoryRepo) (in-process).
pub trait ObjectStore {
    // -----------------------------------------------------------------------
    // Object write
    // -----------------------------------------------------------------------

    /// Write a blob and return its OID.
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError>;

    /// Write a tree object from a list of entries and return its OID.
    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError>;

    /// Write a commit object and return its OID.
    ///
    /// No ref is touched; use [`compare_and_swap_ref`](Self::compare_and_swap_ref)
    /// to publish the commit.
    fn create_commit(&self, commit: &NewCommit) -> Result<GitOid, GitError>;

    // -----------------------------------------------------------------------
    // Object read
    // -----------------------------------------------------------------------

    /// Read the contents of a blob object.
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError>;

    /// Read the entries of a tree object (one level, not recursive).
    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError>;

    /// Read a commit object's metadata.
    ///
    /// Returns [`GitError::NotFound`] if no commit with this OID exists.
    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError>;

    // -----------------------------------------------------------------------
    // Refs
    // -----------------------------------------------------------------------

    /// Resolve a ref to its OID, returning `None` if the ref does not exist.
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError>;

    /// Atomically set `edit.name` to `edit.new_oid` if it currently holds
    /// `edit.expected_old` (`None` = must not exist).
    ///
    /// Returns `Ok(false)` when the ref held something else, in which case
    /// nothing was changed. A create never succeeds over an existing ref,
    /// even one that already holds `edit.new_oid`.
    fn compare_and_swap_ref(&self, edit: &RefEdit) -> Result<bool, GitError>;

    /// Atomically delete `name` if it currently holds `expected`.
    ///
    /// Returns `Ok(false)` when the ref is absent or holds a different OID.
    fn delete_ref(&self, name: &RefName, expected: GitOid) -> Result<bool, GitError>;

    /// List refs whose name starts with `prefix` (matched literally).
    ///
    /// Returns `(ref_name, oid)` pairs sorted by ref name.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, GitOid)>, GitError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
        (**self).write_blob(data)
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
        (**self).write_tree(entries)
    }

    fn create_commit(&self, commit: &NewCommit) -> Result<GitOid, GitError> {
        (**self).create_commit(commit)
    }

    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        (**self).read_blob(oid)
    }

    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
        (**self).read_tree(oid)
    }

    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
        (**self).read_commit(oid)
    }

    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError> {
        (**self).read_ref(name)
    }

    fn compare_and_swap_ref(&self, edit: &RefEdit) -> Result<bool, GitError> {
        (**self).compare_and_swap_ref(edit)
    }

    fn delete_ref(&self, name: &RefName, expected: GitOid) -> Result<bool, GitError> {
        (**self).delete_ref(name, expected)
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, GitOid)>, GitError> {
        (**self).list_refs(prefix)
    }
}
