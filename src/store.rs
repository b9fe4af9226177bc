//! The document store: commits, reads, history, clone and delete.
//!
//! [`DocumentStore`] layers versioned JSON documents over any
//! [`ObjectStore`]. Each revision is a commit whose tree holds one `data`
//! blob with the document's JSON. Each document's head lives in its own ref
//! (see [`crate::refs`]), and every ref move is a compare-and-swap against
//! the head this call observed. The store keeps no mutable state of its own;
//! two `DocumentStore`s over the same repository are interchangeable.
//!
//! The merge operation lives in [`crate::merge`].

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use vellum_git::{
    EntryMode, GitError, GitOid, Identity, NewCommit, ObjectStore, RefEdit, TreeEntry,
};

use crate::error::StoreError;
use crate::merge::ancestry::Ancestors;
use crate::model::diff::{Diff, diff};
use crate::model::types::{Commit, DATA_ENTRY, Snapshot, snapshot_from_value};
use crate::refs::{DocumentId, document_from_ref, owner_prefix, ref_for, validate_owner};

/// Commit message used when the caller passes an empty one.
pub const DEFAULT_COMMIT_MESSAGE: &str = "commit";

/// Most parents a document commit may have.
pub const MAX_PARENTS: usize = 2;

// ---------------------------------------------------------------------------
// Parents
// ---------------------------------------------------------------------------

/// Which parents a new commit gets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Parents {
    /// The document's head at the start of the call, or none for a new
    /// document.
    #[default]
    CurrentHead,
    /// Exactly these commits, in this order. At most [`MAX_PARENTS`]; each
    /// must exist.
    Explicit(Vec<GitOid>),
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Versioned JSON documents over an object store.
pub struct DocumentStore<R> {
    repo: R,
    default_message: String,
}

impl<R: ObjectStore> DocumentStore<R> {
    /// Wrap an object store.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            default_message: DEFAULT_COMMIT_MESSAGE.to_owned(),
        }
    }

    /// Use `message` for commits made with an empty message.
    #[must_use]
    pub fn with_default_message(mut self, message: impl Into<String>) -> Self {
        self.default_message = message.into();
        self
    }

    /// The underlying object store.
    pub const fn repo(&self) -> &R {
        &self.repo
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The head commit of `id`, or `None` if the document does not exist.
    pub fn head(&self, id: &DocumentId) -> Result<Option<GitOid>, StoreError> {
        Ok(self.repo.read_ref(&ref_for(id))?)
    }

    pub(crate) fn require_head(&self, id: &DocumentId) -> Result<GitOid, StoreError> {
        self.head(id)?.ok_or_else(|| StoreError::NotFound {
            document: id.clone(),
        })
    }

    /// The document's current content, or `None` if it does not exist.
    pub fn get(&self, id: &DocumentId) -> Result<Option<Snapshot>, StoreError> {
        self.head(id)?.map(|head| self.get_at(head)).transpose()
    }

    /// The document content recorded by commit `oid`.
    pub fn get_at(&self, oid: GitOid) -> Result<Snapshot, StoreError> {
        let info = self.repo.read_commit(oid)?;
        let entries = self.repo.read_tree(info.tree_oid)?;
        let data = entries
            .iter()
            .find(|e| e.name == DATA_ENTRY && e.mode == EntryMode::Blob)
            .ok_or_else(|| StoreError::corrupt(info.tree_oid, "tree has no `data` blob"))?;
        let bytes = self.repo.read_blob(data.oid)?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::corrupt(data.oid, format!("blob is not JSON: {e}")))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::corrupt(data.oid, "blob is not a JSON object")),
        }
    }

    /// Metadata of commit `oid`.
    pub fn read_commit(&self, oid: GitOid) -> Result<Commit, StoreError> {
        let info = self.repo.read_commit(oid)?;
        Ok(Commit::from_info(oid, info))
    }

    /// Diff between the heads of two documents. A missing document counts as
    /// "no content".
    pub fn diff_documents(&self, a: &DocumentId, b: &DocumentId) -> Result<Diff, StoreError> {
        let a = self.get(a)?;
        let b = self.get(b)?;
        Ok(diff(a.as_ref(), b.as_ref()))
    }

    /// Diff between two revisions.
    pub fn diff_commits(&self, a: GitOid, b: GitOid) -> Result<Diff, StoreError> {
        let a = self.get_at(a)?;
        let b = self.get_at(b)?;
        Ok(diff(Some(&a), Some(&b)))
    }

    /// Up to `limit` commits of `id`'s history, newest first.
    ///
    /// Walks every parent breadth-first, so both sides of a merge appear and
    /// each commit appears once.
    #[instrument(skip_all, fields(document = %id, limit = limit))]
    pub fn log(&self, id: &DocumentId, limit: usize) -> Result<Vec<Commit>, StoreError> {
        let head = self.require_head(id)?;
        Ancestors::new(&self.repo, head)
            .take(limit)
            .map(|oid| self.read_commit(oid?))
            .collect()
    }

    /// Names of `owner`'s documents, sorted.
    pub fn list(&self, owner: &str) -> Result<Vec<String>, StoreError> {
        validate_owner(owner)?;
        let refs = self.repo.list_refs(&owner_prefix(owner))?;
        let mut names: Vec<String> = refs
            .iter()
            .filter_map(|(name, _)| document_from_ref(name))
            .filter(|id| id.owner() == owner)
            .map(|id| id.name().to_owned())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Record `document` as the next revision of `id`.
    ///
    /// The head is read once at the start; the ref only moves if it still
    /// holds that head when the commit is published.
    ///
    /// # Errors
    /// - [`StoreError::Validation`]: `document` is not a JSON object, or the
    ///   explicit parent list is too long or names a missing commit.
    /// - [`StoreError::ConcurrentModification`]: the head moved meanwhile.
    #[instrument(skip_all, fields(document = %id))]
    pub fn commit(
        &self,
        id: &DocumentId,
        document: Value,
        message: &str,
        author: &Identity,
        parents: Parents,
    ) -> Result<Commit, StoreError> {
        let snapshot = snapshot_from_value(document)?;
        let head = self.head(id)?;
        let parents = match parents {
            Parents::CurrentHead => head.into_iter().collect(),
            Parents::Explicit(parents) => {
                self.check_parents(&parents)?;
                parents
            }
        };
        let message = if message.is_empty() {
            self.default_message.as_str()
        } else {
            message
        };
        self.write_commit(id, &snapshot, message, author, parents, head)
    }

    fn check_parents(&self, parents: &[GitOid]) -> Result<(), StoreError> {
        if parents.len() > MAX_PARENTS {
            return Err(StoreError::validation(format!(
                "a commit has at most {MAX_PARENTS} parents, got {}",
                parents.len()
            )));
        }
        for &parent in parents {
            match self.repo.read_commit(parent) {
                Ok(_) => {}
                Err(GitError::NotFound { .. }) => {
                    return Err(StoreError::validation(format!(
                        "parent commit {parent} does not exist"
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Write `snapshot` as a commit with `parents` and move `id` from
    /// `expected_head` to it.
    pub(crate) fn write_commit(
        &self,
        id: &DocumentId,
        snapshot: &Snapshot,
        message: &str,
        author: &Identity,
        parents: Vec<GitOid>,
        expected_head: Option<GitOid>,
    ) -> Result<Commit, StoreError> {
        let bytes = serde_json::to_vec(snapshot)
            .map_err(|e| StoreError::validation(format!("document cannot be serialized: {e}")))?;
        let blob = self.repo.write_blob(&bytes)?;
        let tree = self.repo.write_tree(&[TreeEntry {
            name: DATA_ENTRY.to_owned(),
            mode: EntryMode::Blob,
            oid: blob,
        }])?;
        let new = NewCommit {
            tree,
            parents,
            message: message.to_owned(),
            author: author.clone(),
            committer: author.clone(),
            timestamp: now_seconds(),
        };
        let oid = self.repo.create_commit(&new)?;
        debug!(commit = %oid, parents = new.parents.len(), "wrote commit object");

        self.advance(id, expected_head, oid)?;
        info!(document = %id, commit = %oid, "document head advanced");

        Ok(Commit {
            oid,
            tree_oid: new.tree,
            parents: new.parents,
            author: new.author,
            committer: new.committer,
            message: new.message,
            timestamp: new.timestamp,
        })
    }

    /// Compare-and-swap `id`'s ref from `expected` to `new`.
    pub(crate) fn advance(
        &self,
        id: &DocumentId,
        expected: Option<GitOid>,
        new: GitOid,
    ) -> Result<(), StoreError> {
        let edit = RefEdit {
            name: ref_for(id),
            new_oid: new,
            expected_old: expected,
        };
        if self.repo.compare_and_swap_ref(&edit)? {
            Ok(())
        } else {
            warn!(document = %id, expected = ?expected, "lost ref compare-and-swap");
            Err(StoreError::ConcurrentModification {
                document: id.clone(),
                expected,
            })
        }
    }

    /// Start document `to` at `from`'s current head.
    ///
    /// No commit is created; both documents share history up to that point.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if `from` does not exist,
    /// [`StoreError::AlreadyExists`] if `to` does (including when it appears
    /// concurrently). `to` is never overwritten.
    #[instrument(skip_all, fields(from = %from, to = %to))]
    pub fn clone(&self, from: &DocumentId, to: &DocumentId) -> Result<GitOid, StoreError> {
        let head = self.require_head(from)?;
        let exists = || StoreError::AlreadyExists {
            document: to.clone(),
        };
        if self.head(to)?.is_some() {
            return Err(exists());
        }
        let edit = RefEdit {
            name: ref_for(to),
            new_oid: head,
            expected_old: None,
        };
        if !self.repo.compare_and_swap_ref(&edit)? {
            warn!(document = %to, "clone target appeared concurrently");
            return Err(exists());
        }
        info!(document = %to, commit = %head, "document cloned");
        Ok(head)
    }

    /// Remove `id`'s ref. Its commits stay in the object store, so clones and
    /// revision reads keep working.
    ///
    /// Returns the head the document had.
    #[instrument(skip_all, fields(document = %id))]
    pub fn delete(&self, id: &DocumentId) -> Result<GitOid, StoreError> {
        let head = self.require_head(id)?;
        if !self.repo.delete_ref(&ref_for(id), head)? {
            warn!(document = %id, "lost ref compare-and-swap on delete");
            return Err(StoreError::ConcurrentModification {
                document: id.clone(),
                expected: Some(head),
            });
        }
        info!(document = %id, commit = %head, "document deleted");
        Ok(head)
    }
}

fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
