//! Error types for document store operations.
//!
//! [`StoreError`] is the single error type returned by
//! [`DocumentStore`](crate::DocumentStore) operations. Each variant names the
//! document involved and says what the caller can do about it.
//!
//! Two merge outcomes that sound like failures, conflicts and unrelated
//! histories, are *not* errors. They are routine results the caller resolves,
//! and come back as [`MergeOutcome`](crate::merge::MergeOutcome) variants.

use thiserror::Error;
use vellum_git::{GitError, GitOid};

use crate::refs::DocumentId;

/// Unified error type for document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before touching the store: a non-object document, a
    /// malformed owner/name, too many parents.
    #[error("invalid input: {reason}")]
    Validation {
        /// Why the input was rejected.
        reason: String,
    },

    /// The referenced document has no history.
    #[error("document `{document}` does not exist")]
    NotFound {
        /// The missing document.
        document: DocumentId,
    },

    /// A clone target is already occupied.
    #[error("document `{document}` already exists; clone never overwrites")]
    AlreadyExists {
        /// The occupied destination.
        document: DocumentId,
    },

    /// The document's head moved between the read and the compare-and-swap.
    ///
    /// Nothing was published. The caller must re-read the head and redo the
    /// operation against it (for merges: recompute the merge entirely).
    #[error(
        "document `{document}` was modified concurrently (expected head {}); \
         re-read the head and retry",
        fmt_head(.expected)
    )]
    ConcurrentModification {
        /// The document whose head moved.
        document: DocumentId,
        /// The head this operation observed before writing.
        expected: Option<GitOid>,
    },

    /// The object store failed, or holds an object that is not a valid
    /// document revision.
    #[error("storage error: {0}")]
    Storage(#[from] GitError),
}

fn fmt_head(head: &Option<GitOid>) -> String {
    head.map_or_else(|| "<none>".to_owned(), |oid| oid.short())
}

impl StoreError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(oid: GitOid, message: impl Into<String>) -> Self {
        Self::Storage(GitError::CorruptObject {
            oid: oid.to_string(),
            message: message.into(),
        })
    }

    /// `true` for errors a caller may resolve by re-reading and retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}
