//! vellum: versioned JSON documents on a git object store.
//!
//! Each document `(owner, name)` has its own commit history under
//! `refs/<owner>/<name>/HEAD`. Revisions are commits whose tree holds the
//! document's JSON in a single `data` blob.
//!
//! ```no_run
//! use serde_json::json;
//! use vellum::{DocumentId, DocumentStore, Identity, MemoryRepo, MergeOutcome, Parents};
//!
//! # fn main() -> Result<(), vellum::StoreError> {
//! let store = DocumentStore::new(MemoryRepo::new());
//! let me = Identity::new("alice", "alice@example.com");
//! let alice: DocumentId = "alice/recipe".parse()?;
//! let bob: DocumentId = "bob/recipe".parse()?;
//!
//! store.commit(&alice, json!({"flour": "500g"}), "v1", &me, Parents::CurrentHead)?;
//! store.clone(&alice, &bob)?;
//! store.commit(&bob, json!({"flour": "500g", "salt": "5g"}), "salt", &me, Parents::CurrentHead)?;
//!
//! let outcome = store.merge(&bob, &alice, &me)?;
//! assert!(matches!(outcome, MergeOutcome::FastForward { advanced: true, .. }));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod refs;
pub mod store;
pub mod telemetry;

pub use error::StoreError;
pub use merge::{Conflict, ConflictSide, MergeOutcome};
pub use model::diff::{Change, ChangeKind, Diff, diff};
pub use model::types::{Commit, Snapshot};
pub use refs::{DocumentId, ref_for};
pub use store::{DocumentStore, Parents};
pub use vellum_git::{GitOid, GixRepo, Identity, MemoryRepo, ObjectStore};
