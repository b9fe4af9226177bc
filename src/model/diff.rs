//! Structural diff between two document snapshots.
//!
//! Only top-level keys are compared. Nested objects and arrays are compared
//! by value equality and never diffed recursively, so a change deep inside a
//! value is reported as a single `updated` entry for its top-level key. This
//! bounds merge-conflict granularity to top-level keys.
//!
//! Every changed key lands in exactly one of three maps:
//!
//! | Map        | Key present in      | Value recorded |
//! |------------|---------------------|----------------|
//! | `updated`  | both, values differ | new value      |
//! | `appended` | later only          | new value      |
//! | `removed`  | earlier only        | old value      |
//!
//! Applying `updated` and `appended` (set) and then `removed` (delete) to the
//! earlier snapshot reproduces the later one exactly; see [`Diff::apply`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::types::Snapshot;

// ---------------------------------------------------------------------------
// ChangeKind
// ---------------------------------------------------------------------------

/// How a top-level key changed between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present on both sides with different values.
    Updated,
    /// Present only in the later snapshot.
    Appended,
    /// Present only in the earlier snapshot.
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated => write!(f, "updated"),
            Self::Appended => write!(f, "appended"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// A borrowed view of one key's classification in a [`Diff`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Change<'a> {
    /// How the key changed.
    pub kind: ChangeKind,
    /// New value for `Updated`/`Appended`, old value for `Removed`.
    pub value: &'a Value,
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Three-way classified diff between an earlier and a later snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    /// Keys present in both snapshots whose values differ → new value.
    pub updated: BTreeMap<String, Value>,
    /// Keys only in the later snapshot → value.
    pub appended: BTreeMap<String, Value>,
    /// Keys only in the earlier snapshot → old value.
    pub removed: BTreeMap<String, Value>,
}

impl Diff {
    /// `true` when the two snapshots were equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.appended.is_empty() && self.removed.is_empty()
    }

    /// Number of changed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updated.len() + self.appended.len() + self.removed.len()
    }

    /// How `key` changed, or `None` if it did not.
    #[must_use]
    pub fn change(&self, key: &str) -> Option<Change<'_>> {
        if let Some(value) = self.updated.get(key) {
            return Some(Change {
                kind: ChangeKind::Updated,
                value,
            });
        }
        if let Some(value) = self.appended.get(key) {
            return Some(Change {
                kind: ChangeKind::Appended,
                value,
            });
        }
        self.removed.get(key).map(|value| Change {
            kind: ChangeKind::Removed,
            value,
        })
    }

    /// Every changed key, in order.
    #[must_use]
    pub fn changed_keys(&self) -> BTreeSet<&str> {
        self.updated
            .keys()
            .chain(self.appended.keys())
            .chain(self.removed.keys())
            .map(String::as_str)
            .collect()
    }

    /// Reconstruct the later snapshot from the earlier one.
    ///
    /// `None` stands for "document did not exist" and behaves like an empty
    /// object.
    #[must_use]
    pub fn apply(&self, base: Option<&Snapshot>) -> Snapshot {
        let mut out = base.cloned().unwrap_or_default();
        for (key, value) in self.updated.iter().chain(&self.appended) {
            out.insert(key.clone(), value.clone());
        }
        for key in self.removed.keys() {
            out.remove(key);
        }
        out
    }
}

/// Diff two snapshots. `None` means the document did not exist yet.
///
/// - `a = None`: every key of `b` is `appended`.
/// - `b = None`: every key of `a` is `removed`.
/// - both `None`: empty diff.
#[must_use]
pub fn diff(a: Option<&Snapshot>, b: Option<&Snapshot>) -> Diff {
    let mut out = Diff::default();
    match (a, b) {
        (None, None) => {}
        (None, Some(b)) => {
            out.appended = b.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        }
        (Some(a), None) => {
            out.removed = a.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        }
        (Some(a), Some(b)) => {
            for (key, old) in a {
                match b.get(key) {
                    Some(new) if new != old => {
                        out.updated.insert(key.clone(), new.clone());
                    }
                    Some(_) => {}
                    None => {
                        out.removed.insert(key.clone(), old.clone());
                    }
                }
            }
            for (key, new) in b {
                if !a.contains_key(key) {
                    out.appended.insert(key.clone(), new.clone());
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
