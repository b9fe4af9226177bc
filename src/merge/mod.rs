//! Merging one document's history into another's.
//!
//! `merge(from, to)` brings `from`'s changes into `to` and only ever moves
//! `to`'s ref. The outcome is one of:
//!
//! ```text
//!   from_head == to_head ───────────────────────────▶ Identical
//!   from_head ancestor of to_head ─────────────────▶ FastForward (to stays)
//!   to_head ancestor of from_head ─────────────────▶ FastForward (to advances)
//!   no common ancestor ────────────────────────────▶ NoCommonAncestor
//!   diverged, conflicting keys ────────────────────▶ Conflicted
//!   diverged, compatible keys ─────────────────────▶ Merged (new commit)
//! ```
//!
//! Diffs against the common ancestor are taken per top-level key; see
//! [`conflict`] for what counts as compatible. A merge that loses the race
//! on `to`'s ref fails with
//! [`ConcurrentModification`](crate::StoreError::ConcurrentModification) and
//! must be recomputed from scratch, since the ancestor and both diffs may
//! have changed.

pub mod ancestry;
pub mod conflict;
pub mod types;

pub use types::{Conflict, ConflictSide, MergeOutcome};

use tracing::{debug, info, instrument};
use vellum_git::{Identity, ObjectStore};

use crate::error::StoreError;
use crate::model::diff::diff;
use crate::model::types::MERGE_MESSAGE;
use crate::refs::DocumentId;
use crate::store::DocumentStore;

use ancestry::{is_ancestor, merge_base};
use conflict::{build_merged, detect_conflicts};

impl<R: ObjectStore> DocumentStore<R> {
    /// Merge document `from` into document `to`.
    ///
    /// `author` signs the merge commit when one is needed.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if either document does not exist.
    /// - [`StoreError::ConcurrentModification`] if `to`'s head moved while
    ///   merging. Nothing was published.
    #[instrument(skip_all, fields(from = %from, to = %to))]
    pub fn merge(
        &self,
        from: &DocumentId,
        to: &DocumentId,
        author: &Identity,
    ) -> Result<MergeOutcome, StoreError> {
        let from_head = self.require_head(from)?;
        let to_head = self.require_head(to)?;

        if from_head == to_head {
            debug!(head = %to_head, "heads are identical");
            return Ok(MergeOutcome::Identical { head: to_head });
        }

        if is_ancestor(self.repo(), from_head, to_head)? {
            debug!(head = %to_head, "target already contains source");
            return Ok(MergeOutcome::FastForward {
                head: to_head,
                advanced: false,
            });
        }

        if is_ancestor(self.repo(), to_head, from_head)? {
            self.advance(to, Some(to_head), from_head)?;
            info!(document = %to, from = %to_head, to = %from_head, "fast-forwarded");
            return Ok(MergeOutcome::FastForward {
                head: from_head,
                advanced: true,
            });
        }

        let Some(ancestor) = merge_base(self.repo(), from_head, to_head)? else {
            return Ok(MergeOutcome::NoCommonAncestor);
        };

        let base = self.get_at(ancestor)?;
        let from_doc = self.get_at(from_head)?;
        let to_doc = self.get_at(to_head)?;
        let from_diff = diff(Some(&base), Some(&from_doc));
        let to_diff = diff(Some(&base), Some(&to_doc));

        let conflicts = detect_conflicts(&from_diff, &to_diff);
        if !conflicts.is_empty() {
            info!(
                ancestor = %ancestor,
                conflicts = conflicts.len(),
                "merge has conflicts; no commit written"
            );
            return Ok(MergeOutcome::Conflicted {
                ancestor,
                conflicts,
            });
        }

        let merged = build_merged(&base, &from_diff, &to_diff);
        let commit = self.write_commit(
            to,
            &merged,
            MERGE_MESSAGE,
            author,
            vec![from_head, to_head],
            Some(to_head),
        )?;
        Ok(MergeOutcome::Merged { commit })
    }
}
