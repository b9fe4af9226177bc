//! Error types for object store operations.
//!
//! [`GitError`] is the single error type returned by all
//! [`ObjectStore`](crate::ObjectStore) methods. Compare-and-swap losses are
//! *not* errors: the ref methods report them as `Ok(false)` so callers can
//! tell a lost race from a broken store.

use thiserror::Error;

/// Errors returned by [`ObjectStore`](crate::ObjectStore) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A requested object or ref was not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// An object exists but has the wrong type or an unreadable layout
    /// (e.g. a commit OID that points at a blob).
    #[error("corrupt object {oid}: {message}")]
    CorruptObject {
        /// Hex OID of the offending object.
        oid: String,
        /// What was wrong with it.
        message: String,
    },

    /// An OID string could not be parsed or was otherwise invalid.
    #[error("invalid OID `{value}`: {reason}")]
    InvalidOid {
        /// The raw value that failed validation.
        value: String,
        /// Why validation failed.
        reason: String,
    },

    /// An I/O error occurred (opening or creating the repository).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The underlying backend (gix, the in-memory store) returned an
    /// unclassified error.
    ///
    /// The `message` should include enough context to diagnose the failure.
    #[error("object store backend error: {message}")]
    BackendError {
        /// Freeform error description from the backend.
        message: String,
    },
}

impl GitError {
    pub(crate) fn backend(message: impl Into<String>) -> Self {
        Self::BackendError {
            message: message.into(),
        }
    }
}

impl From<crate::types::OidParseError> for GitError {
    fn from(e: crate::types::OidParseError) -> Self {
        Self::InvalidOid {
            value: e.value,
            reason: e.reason,
        }
    }
}
