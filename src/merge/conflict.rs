//! Three-way conflict detection and merged-snapshot construction.

use crate::merge::types::{Conflict, ConflictSide};
use crate::model::diff::{Change, ChangeKind, Diff};
use crate::model::types::Snapshot;

/// Compare the two sides' diffs against their common ancestor.
///
/// Walks the union of changed keys once. A key changed on only one side never
/// conflicts. A key changed on both sides is compatible when both made the
/// same kind of change and, for `updated`/`appended`, arrived at the same
/// value; removing on both sides is always compatible. Anything else is a
/// conflict. The result is ordered by key.
#[must_use]
pub fn detect_conflicts(from: &Diff, to: &Diff) -> Vec<Conflict> {
    let mut keys = from.changed_keys();
    keys.extend(to.changed_keys());

    keys.into_iter()
        .filter_map(|key| match (from.change(key), to.change(key)) {
            (Some(f), Some(t)) if !compatible(f, t) => Some(Conflict {
                key: key.to_owned(),
                from: ConflictSide::from(f),
                to: ConflictSide::from(t),
            }),
            _ => None,
        })
        .collect()
}

fn compatible(a: Change<'_>, b: Change<'_>) -> bool {
    match (a.kind, b.kind) {
        (ChangeKind::Removed, ChangeKind::Removed) => true,
        (x, y) if x == y => a.value == b.value,
        _ => false,
    }
}

/// Build the merged snapshot for a conflict-free merge.
///
/// Deletes the union of both sides' removals from the ancestor, then sets the
/// union of both sides' updates and appends.
#[must_use]
pub fn build_merged(ancestor: &Snapshot, from: &Diff, to: &Diff) -> Snapshot {
    let mut out = ancestor.clone();
    for key in from.removed.keys().chain(to.removed.keys()) {
        out.remove(key);
    }
    for diff in [from, to] {
        for (key, value) in diff.updated.iter().chain(&diff.appended) {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}
