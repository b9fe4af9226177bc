//! Merge outcomes and conflict records.
//!
//! Every merge ends in exactly one [`MergeOutcome`]. Conflicts and unrelated
//! histories are ordinary outcomes the caller resolves, not errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vellum_git::GitOid;

use crate::model::diff::{Change, ChangeKind};
use crate::model::types::Commit;

// ---------------------------------------------------------------------------
// Conflict
// ---------------------------------------------------------------------------

/// One side's view of a conflicting key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSide {
    /// How this side changed the key relative to the common ancestor.
    pub kind: ChangeKind,
    /// New value for `updated`/`appended`, the ancestor's value for `removed`.
    pub value: Value,
}

impl From<Change<'_>> for ConflictSide {
    fn from(change: Change<'_>) -> Self {
        Self {
            kind: change.kind,
            value: change.value.clone(),
        }
    }
}

/// A top-level key both sides changed incompatibly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// The top-level document key.
    pub key: String,
    /// The change made on the `from` side.
    pub from: ConflictSide,
    /// The change made on the `to` side.
    pub to: ConflictSide,
}

// ---------------------------------------------------------------------------
// MergeOutcome
// ---------------------------------------------------------------------------

/// Result of merging document `from` into document `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// Both documents already point at the same commit. Nothing changed.
    Identical {
        /// The shared head.
        head: GitOid,
    },
    /// One head is an ancestor of the other. No commit was created.
    FastForward {
        /// `to`'s head after the merge.
        head: GitOid,
        /// `true` if `to` moved forward to `from`'s head; `false` if `to`
        /// already contained `from`.
        advanced: bool,
    },
    /// The histories diverged and merged cleanly into a new commit, now
    /// `to`'s head.
    Merged {
        /// The merge commit, parents `[from_head, to_head]`.
        commit: Commit,
    },
    /// The histories diverged and touched the same keys incompatibly.
    /// Neither head moved.
    Conflicted {
        /// The common ancestor both diffs were taken against.
        ancestor: GitOid,
        /// Every conflicting key, ordered by key.
        conflicts: Vec<Conflict>,
    },
    /// The two histories share no commit. Neither head moved.
    NoCommonAncestor,
}

impl MergeOutcome {
    /// `true` for outcomes after which `to` contains `from`'s changes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Identical { .. } | Self::FastForward { .. } | Self::Merged { .. }
        )
    }

    /// Short lowercase state name, as used in serialized output.
    #[must_use]
    pub const fn state(&self) -> &'static str {
        match self {
            Self::Identical { .. } => "identical",
            Self::FastForward { .. } => "fast_forward",
            Self::Merged { .. } => "merged",
            Self::Conflicted { .. } => "conflicted",
            Self::NoCommonAncestor => "no_common_ancestor",
        }
    }
}
