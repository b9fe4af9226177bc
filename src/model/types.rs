//! Core document types.
//!
//! A document revision is a top-level JSON object ([`Snapshot`]) stored as
//! the single `data` blob of a commit's tree. [`Commit`] is the store's view
//! of one revision's metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vellum_git::{CommitInfo, GitOid, Identity};

use crate::error::StoreError;

/// Name of the only entry in every document tree.
pub const DATA_ENTRY: &str = "data";

/// Commit message used for clean three-way merges.
pub const MERGE_MESSAGE: &str = "Auto-merge";

/// A document's content at one revision: a top-level JSON object.
///
/// `serde_json`'s default map is ordered by key, so serialized snapshots and
/// everything derived from them are deterministic.
pub type Snapshot = Map<String, Value>;

/// Accept a JSON value as a document, rejecting anything but an object.
pub fn snapshot_from_value(value: Value) -> Result<Snapshot, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::validation(format!(
            "documents must be JSON objects, got {}",
            json_kind(&other)
        ))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// One immutable revision in a document's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit's own OID.
    pub oid: GitOid,
    /// Tree holding the `data` blob.
    pub tree_oid: GitOid,
    /// Parent commits: none for a document's first revision, one for a
    /// normal edit, two (`[from, to]`) for a merge.
    pub parents: Vec<GitOid>,
    /// Who wrote the content.
    pub author: Identity,
    /// Who recorded the commit.
    pub committer: Identity,
    /// Commit message.
    pub message: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

impl Commit {
    pub(crate) fn from_info(oid: GitOid, info: CommitInfo) -> Self {
        Self {
            oid,
            tree_oid: info.tree_oid,
            parents: info.parents,
            author: info.author,
            committer: info.committer,
            message: info.message,
            timestamp: info.timestamp,
        }
    }

    /// `true` for commits with more than one parent.
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}
