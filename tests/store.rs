//! Document store behavior, run against both object store backends.
//!
//! Each scenario is written once, generic over `ObjectStore`, and
//! instantiated for `MemoryRepo` and for a gix bare repository.

mod common;

use serde_json::json;
use vellum::model::types::MERGE_MESSAGE;
use vellum::{ChangeKind, DocumentStore, MergeOutcome, ObjectStore, Parents, StoreError};

use common::{commit, head, id, snap, who};

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

fn get_returns_committed_document<R: ObjectStore>(store: &DocumentStore<R>) {
    let doc = json!({
        "load": {"url": "https://example.com/ä", "method": "get"},
        "steps": [1, 2, {"deep": null}],
        "flag": false,
    });
    commit(store, "alice/t", doc.clone());
    assert_eq!(store.get(&id("alice/t")).unwrap(), Some(snap(doc)));
    assert_eq!(store.get(&id("alice/missing")).unwrap(), None);
}

fn history_is_a_chain<R: ObjectStore>(store: &DocumentStore<R>) {
    let v1 = commit(store, "alice/t", json!({"load": "a"}));
    let v2 = commit(store, "alice/t", json!({"load": "b"}));
    assert!(v1.parents.is_empty());
    assert_eq!(v2.parents, vec![v1.oid]);

    let log = store.log(&id("alice/t"), 10).unwrap();
    assert_eq!(
        log.iter().map(|c| c.oid).collect::<Vec<_>>(),
        vec![v2.oid, v1.oid]
    );
    assert_eq!(log[0], store.read_commit(v2.oid).unwrap());
    assert_eq!(store.log(&id("alice/t"), 1).unwrap().len(), 1);
    assert_eq!(store.get_at(v1.oid).unwrap(), snap(json!({"load": "a"})));
}

fn explicit_parent_matches_default<R: ObjectStore>(store: &DocumentStore<R>) {
    let v1 = commit(store, "alice/t", json!({"n": 1}));
    let v2 = store
        .commit(
            &id("alice/t"),
            json!({"n": 2}),
            "retry",
            &who(),
            Parents::Explicit(vec![v1.oid]),
        )
        .unwrap();
    assert_eq!(v2.parents, vec![v1.oid]);
    assert_eq!(head(store, "alice/t"), v2.oid);
}

fn self_merge_is_identical<R: ObjectStore>(store: &DocumentStore<R>) {
    let v1 = commit(store, "alice/t", json!({"a": 1}));
    let outcome = store.merge(&id("alice/t"), &id("alice/t"), &who()).unwrap();
    assert_eq!(outcome, MergeOutcome::Identical { head: v1.oid });
    assert_eq!(store.log(&id("alice/t"), 10).unwrap().len(), 1);
}

fn descendant_fast_forwards_target<R: ObjectStore>(store: &DocumentStore<R>) {
    commit(store, "alice/t", json!({"a": 1}));
    store.clone(&id("alice/t"), &id("bob/t")).unwrap();
    let bob2 = commit(store, "bob/t", json!({"a": 1, "b": 2}));

    let outcome = store.merge(&id("bob/t"), &id("alice/t"), &who()).unwrap();
    assert_eq!(
        outcome,
        MergeOutcome::FastForward {
            head: bob2.oid,
            advanced: true,
        }
    );
    assert_eq!(head(store, "alice/t"), bob2.oid);
    assert_eq!(store.log(&id("alice/t"), 10).unwrap().len(), 2);
}

fn ancestor_source_leaves_target_alone<R: ObjectStore>(store: &DocumentStore<R>) {
    commit(store, "alice/t", json!({"a": 1}));
    store.clone(&id("alice/t"), &id("bob/t")).unwrap();
    let bob2 = commit(store, "bob/t", json!({"a": 2}));

    let outcome = store.merge(&id("alice/t"), &id("bob/t"), &who()).unwrap();
    assert_eq!(
        outcome,
        MergeOutcome::FastForward {
            head: bob2.oid,
            advanced: false,
        }
    );
    assert_eq!(head(store, "bob/t"), bob2.oid);
}

fn disjoint_edits_merge_cleanly<R: ObjectStore>(store: &DocumentStore<R>) {
    commit(store, "alice/t", json!({"a": 0, "b": 0, "gone": true}));
    store.clone(&id("alice/t"), &id("bob/t")).unwrap();
    let bob = commit(store, "bob/t", json!({"a": 0, "b": 1, "gone": true, "new": "x"}));
    let alice = commit(store, "alice/t", json!({"a": 1, "b": 0}));

    let MergeOutcome::Merged { commit: merge } =
        store.merge(&id("bob/t"), &id("alice/t"), &who()).unwrap()
    else {
        panic!("expected a clean merge");
    };
    assert_eq!(merge.parents, vec![bob.oid, alice.oid]);
    assert_eq!(merge.message, MERGE_MESSAGE);
    assert!(merge.is_merge());
    assert_eq!(head(store, "alice/t"), merge.oid);
    assert_eq!(head(store, "bob/t"), bob.oid);
    assert_eq!(
        store.get(&id("alice/t")).unwrap(),
        Some(snap(json!({"a": 1, "b": 1, "new": "x"})))
    );
}

fn same_key_edits_conflict<R: ObjectStore>(store: &DocumentStore<R>) {
    commit(store, "alice/t", json!({"load": "a", "other": 0}));
    store.clone(&id("alice/t"), &id("bob/t")).unwrap();
    let bob = commit(store, "bob/t", json!({"load": "b", "other": 0, "extra": 1}));
    let alice = commit(store, "alice/t", json!({"load": "c", "other": 0}));

    let MergeOutcome::Conflicted { conflicts, .. } =
        store.merge(&id("bob/t"), &id("alice/t"), &who()).unwrap()
    else {
        panic!("expected a conflict");
    };
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].key, "load");
    assert_eq!(conflicts[0].from.kind, ChangeKind::Updated);
    assert_eq!(conflicts[0].from.value, json!("b"));
    assert_eq!(conflicts[0].to.value, json!("c"));
    assert_eq!(head(store, "alice/t"), alice.oid);
    assert_eq!(head(store, "bob/t"), bob.oid);
}

/// The alice/bob clone walkthrough.
fn clone_and_merge_walkthrough<R: ObjectStore>(store: &DocumentStore<R>) {
    let v1 = commit(store, "alice/t", json!({"load": "a"}));
    let v2 = commit(store, "alice/t", json!({"load": "b"}));
    assert_eq!(v2.parents, vec![v1.oid]);

    store.clone(&id("alice/t"), &id("bob/t")).unwrap();
    assert_eq!(
        store.get(&id("bob/t")).unwrap(),
        Some(snap(json!({"load": "b"})))
    );

    commit(store, "bob/t", json!({"load": "b", "extra": 1}));
    commit(store, "alice/t", json!({"load": "c"}));

    // Only alice touched `load`; bob only added `extra`.
    let outcome = store.merge(&id("bob/t"), &id("alice/t"), &who()).unwrap();
    assert!(matches!(outcome, MergeOutcome::Merged { .. }), "{outcome:?}");
    assert_eq!(
        store.get(&id("alice/t")).unwrap(),
        Some(snap(json!({"load": "c", "extra": 1})))
    );

    // Now both change `load` differently; `extra` still merges.
    store.clone(&id("alice/t"), &id("carol/t")).unwrap();
    commit(store, "carol/t", json!({"load": "d", "extra": 1, "more": 2}));
    commit(store, "alice/t", json!({"load": "e", "extra": 1}));
    let MergeOutcome::Conflicted { conflicts, .. } =
        store.merge(&id("carol/t"), &id("alice/t"), &who()).unwrap()
    else {
        panic!("expected a conflict on `load`");
    };
    assert_eq!(
        conflicts.iter().map(|c| c.key.as_str()).collect::<Vec<_>>(),
        vec!["load"]
    );
}

fn base_behind_earlier_merge<R: ObjectStore>(store: &DocumentStore<R>) {
    commit(store, "alice/t", json!({"a": 0, "b": 0}));
    store.clone(&id("alice/t"), &id("bob/t")).unwrap();
    commit(store, "alice/t", json!({"a": 1, "b": 0}));
    commit(store, "bob/t", json!({"a": 0, "b": 1}));

    // bob takes alice's work; the merge commit's first parent is alice's.
    let first = store.merge(&id("alice/t"), &id("bob/t"), &who()).unwrap();
    assert!(matches!(first, MergeOutcome::Merged { .. }), "{first:?}");

    commit(store, "alice/t", json!({"a": 2, "b": 0}));
    commit(store, "bob/t", json!({"a": 1, "b": 2}));

    // The base is alice's previous head, reachable from bob only through the
    // merge commit. A walk that stops at merge commits never finds it.
    let second = store.merge(&id("alice/t"), &id("bob/t"), &who()).unwrap();
    assert!(matches!(second, MergeOutcome::Merged { .. }), "{second:?}");
    assert_eq!(
        store.get(&id("bob/t")).unwrap(),
        Some(snap(json!({"a": 2, "b": 2})))
    );

    // History lists every commit once: root, a1, b1, m1, a2, b2, m2.
    assert_eq!(store.log(&id("bob/t"), 100).unwrap().len(), 7);
}

fn unrelated_histories_do_not_merge<R: ObjectStore>(store: &DocumentStore<R>) {
    let a = commit(store, "alice/x", json!({"from": "alice"}));
    let b = commit(store, "bob/y", json!({"from": "bob"}));
    let outcome = store.merge(&id("alice/x"), &id("bob/y"), &who()).unwrap();
    assert_eq!(outcome, MergeOutcome::NoCommonAncestor);
    assert_eq!(head(store, "alice/x"), a.oid);
    assert_eq!(head(store, "bob/y"), b.oid);
}

fn merge_requires_both_documents<R: ObjectStore>(store: &DocumentStore<R>) {
    commit(store, "alice/t", json!({}));
    let err = store
        .merge(&id("alice/t"), &id("bob/t"), &who())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { ref document } if *document == id("bob/t")));
}

fn clone_never_overwrites<R: ObjectStore>(store: &DocumentStore<R>) {
    commit(store, "alice/t", json!({"who": "alice"}));
    let bob = commit(store, "bob/t", json!({"who": "bob"}));

    let err = store.clone(&id("alice/t"), &id("bob/t")).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
    assert_eq!(head(store, "bob/t"), bob.oid);
    assert_eq!(
        store.get(&id("bob/t")).unwrap(),
        Some(snap(json!({"who": "bob"})))
    );

    let err = store.clone(&id("nobody/t"), &id("carol/t")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(store.head(&id("carol/t")).unwrap(), None);
}

fn clone_shares_history<R: ObjectStore>(store: &DocumentStore<R>) {
    let v1 = commit(store, "alice/t", json!({"n": 1}));
    let cloned = store.clone(&id("alice/t"), &id("bob/t")).unwrap();
    assert_eq!(cloned, v1.oid);
    assert_eq!(head(store, "bob/t"), v1.oid);
    // Editing the clone leaves the source alone.
    commit(store, "bob/t", json!({"n": 2}));
    assert_eq!(head(store, "alice/t"), v1.oid);
}

fn list_and_delete<R: ObjectStore>(store: &DocumentStore<R>) {
    commit(store, "alice/zeta", json!({"z": 1}));
    let alpha = commit(store, "alice/alpha", json!({"a": 1}));
    commit(store, "alicia/other", json!({"o": 1}));
    assert_eq!(store.list("alice").unwrap(), vec!["alpha", "zeta"]);
    assert!(store.list("nobody").unwrap().is_empty());

    assert_eq!(store.delete(&id("alice/alpha")).unwrap(), alpha.oid);
    assert_eq!(store.get(&id("alice/alpha")).unwrap(), None);
    assert_eq!(store.list("alice").unwrap(), vec!["zeta"]);
    // The revision itself is still readable.
    assert_eq!(store.get_at(alpha.oid).unwrap(), snap(json!({"a": 1})));

    let err = store.delete(&id("alice/alpha")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    // A deleted name starts a fresh history.
    let fresh = commit(store, "alice/alpha", json!({"a": 2}));
    assert!(fresh.parents.is_empty());
}

fn diffs_between_documents_and_commits<R: ObjectStore>(store: &DocumentStore<R>) {
    let v1 = commit(store, "alice/t", json!({"keep": 1, "change": 1, "drop": 1}));
    let v2 = commit(store, "alice/t", json!({"keep": 1, "change": 2, "add": 1}));
    commit(store, "bob/t", json!({"keep": 1}));

    let d = store.diff_commits(v1.oid, v2.oid).unwrap();
    assert_eq!(
        d.changed_keys().into_iter().collect::<Vec<_>>(),
        vec!["add", "change", "drop"]
    );
    assert_eq!(d.apply(Some(&store.get_at(v1.oid).unwrap())), store.get_at(v2.oid).unwrap());

    let d = store.diff_documents(&id("bob/t"), &id("alice/t")).unwrap();
    assert_eq!(d.appended.len(), 2);
    assert!(d.removed.is_empty());

    let d = store.diff_documents(&id("nobody/t"), &id("bob/t")).unwrap();
    assert_eq!(d.appended.len(), 1);
}

fn missing_document_errors<R: ObjectStore>(store: &DocumentStore<R>) {
    assert!(matches!(
        store.log(&id("alice/t"), 5),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete(&id("alice/t")),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.commit(&id("alice/t"), json!("text"), "m", &who(), Parents::CurrentHead),
        Err(StoreError::Validation { .. })
    ));
}

// ---------------------------------------------------------------------------
// Instantiation
// ---------------------------------------------------------------------------

macro_rules! backend_tests {
    ($backend:ident, $make:path; $($scenario:ident),+ $(,)?) => {
        mod $backend {
            $(
                #[test]
                fn $scenario() {
                    let (_dir, store) = $make();
                    super::$scenario(&store);
                }
            )+
        }
    };
}

macro_rules! all_scenarios {
    ($backend:ident, $make:path) => {
        backend_tests!(
            $backend, $make;
            get_returns_committed_document,
            history_is_a_chain,
            explicit_parent_matches_default,
            self_merge_is_identical,
            descendant_fast_forwards_target,
            ancestor_source_leaves_target_alone,
            disjoint_edits_merge_cleanly,
            same_key_edits_conflict,
            clone_and_merge_walkthrough,
            base_behind_earlier_merge,
            unrelated_histories_do_not_merge,
            merge_requires_both_documents,
            clone_never_overwrites,
            clone_shares_history,
            list_and_delete,
            diffs_between_documents_and_commits,
            missing_document_errors,
        );
    };
}

all_scenarios!(memory, crate::common::memory_store);
all_scenarios!(gix, crate::common::gix_store);
