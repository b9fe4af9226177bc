//! Ancestry queries over the commit DAG.
//!
//! Both walks follow every parent of every commit, so history behind merge
//! commits is never skipped. Each commit is read at most once per query.

use std::collections::{HashSet, VecDeque};

use tracing::debug;
use vellum_git::{GitOid, ObjectStore};

use crate::error::StoreError;

/// Breadth-first iterator over `start` and all of its ancestors.
///
/// Yields `start` first, then commits in order of increasing distance. A
/// commit reachable along several paths is yielded once.
pub struct Ancestors<'a, R: ObjectStore + ?Sized> {
    repo: &'a R,
    queue: VecDeque<GitOid>,
    seen: HashSet<GitOid>,
}

impl<'a, R: ObjectStore + ?Sized> Ancestors<'a, R> {
    pub fn new(repo: &'a R, start: GitOid) -> Self {
        Self {
            repo,
            queue: VecDeque::from([start]),
            seen: HashSet::from([start]),
        }
    }
}

impl<R: ObjectStore + ?Sized> Iterator for Ancestors<'_, R> {
    type Item = Result<GitOid, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.queue.pop_front()?;
        match self.repo.read_commit(oid) {
            Ok(info) => {
                for parent in info.parents {
                    if self.seen.insert(parent) {
                        self.queue.push_back(parent);
                    }
                }
                Some(Ok(oid))
            }
            Err(e) => {
                self.queue.clear();
                Some(Err(e.into()))
            }
        }
    }
}

/// `true` if `ancestor` is reachable from `descendant` (or equal to it).
pub fn is_ancestor<R: ObjectStore + ?Sized>(
    repo: &R,
    ancestor: GitOid,
    descendant: GitOid,
) -> Result<bool, StoreError> {
    for oid in Ancestors::new(repo, descendant) {
        if oid? == ancestor {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Nearest common ancestor of `a` and `b`, or `None` for unrelated histories.
///
/// Marks every ancestor of `a`, then walks `b` breadth-first; the first
/// marked commit is the one closest to `b`. With criss-cross histories
/// several best bases can exist; the one found first by the walk from `b`
/// wins, which is deterministic for a given DAG.
pub fn merge_base<R: ObjectStore + ?Sized>(
    repo: &R,
    a: GitOid,
    b: GitOid,
) -> Result<Option<GitOid>, StoreError> {
    let from_a = Ancestors::new(repo, a).collect::<Result<HashSet<_>, _>>()?;
    for oid in Ancestors::new(repo, b) {
        let oid = oid?;
        if from_a.contains(&oid) {
            debug!(%a, %b, base = %oid, "found merge base");
            return Ok(Some(oid));
        }
    }
    debug!(%a, %b, "histories are unrelated");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_git::{EntryMode, Identity, MemoryRepo, NewCommit, TreeEntry};

    struct Graph {
        repo: MemoryRepo,
        tree: GitOid,
        counter: std::cell::Cell<i64>,
    }

    impl Graph {
        fn new() -> Self {
            let repo = MemoryRepo::new();
            let blob = repo.write_blob(b"{}").unwrap();
            let tree = repo
                .write_tree(&[TreeEntry {
                    name: "data".into(),
                    mode: EntryMode::Blob,
                    oid: blob,
                }])
                .unwrap();
            Self {
                repo,
                tree,
                counter: std::cell::Cell::new(0),
            }
        }

        fn commit(&self, parents: &[GitOid]) -> GitOid {
            // Distinct timestamps keep otherwise identical commits apart.
            let n = self.counter.get() + 1;
            self.counter.set(n);
            let who = Identity::new("t", "t@example.com");
            self.repo
                .create_commit(&NewCommit {
                    tree: self.tree,
                    parents: parents.to_vec(),
                    message: format!("c{n}"),
                    author: who.clone(),
                    committer: who,
                    timestamp: n,
                })
                .unwrap()
        }
    }

    #[test]
    fn linear_chain() {
        let g = Graph::new();
        let c1 = g.commit(&[]);
        let c2 = g.commit(&[c1]);
        let c3 = g.commit(&[c2]);

        assert!(is_ancestor(&g.repo, c1, c3).unwrap());
        assert!(is_ancestor(&g.repo, c3, c3).unwrap());
        assert!(!is_ancestor(&g.repo, c3, c1).unwrap());

        let order: Vec<_> = Ancestors::new(&g.repo, c3)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(order, vec![c3, c2, c1]);
    }

    #[test]
    fn walks_through_second_parent_of_merges() {
        let g = Graph::new();
        let root = g.commit(&[]);
        let side = g.commit(&[root]);
        let main = g.commit(&[root]);
        let merged = g.commit(&[main, side]);
        let tip = g.commit(&[merged]);

        assert!(is_ancestor(&g.repo, side, tip).unwrap());
        assert_eq!(merge_base(&g.repo, side, tip).unwrap(), Some(side));
    }

    #[test]
    fn diverged_branches_meet_at_fork() {
        let g = Graph::new();
        let root = g.commit(&[]);
        let fork = g.commit(&[root]);
        let left = g.commit(&[fork]);
        let right1 = g.commit(&[fork]);
        let right2 = g.commit(&[right1]);

        assert_eq!(merge_base(&g.repo, left, right2).unwrap(), Some(fork));
        assert_eq!(merge_base(&g.repo, right2, left).unwrap(), Some(fork));
    }

    #[test]
    fn base_after_previous_merge_is_the_merged_side() {
        // from: a ─ b ─────── e
        //         \        /
        // to:      c ─── m(b, c) ─ f
        let g = Graph::new();
        let a = g.commit(&[]);
        let b = g.commit(&[a]);
        let c = g.commit(&[a]);
        let m = g.commit(&[b, c]);
        let f = g.commit(&[m]);
        let e = g.commit(&[b]);

        assert_eq!(merge_base(&g.repo, e, f).unwrap(), Some(b));
    }

    #[test]
    fn unrelated_roots_have_no_base() {
        let g = Graph::new();
        let a = g.commit(&[]);
        let b = g.commit(&[]);
        assert_eq!(merge_base(&g.repo, a, b).unwrap(), None);
        assert!(!is_ancestor(&g.repo, a, b).unwrap());
    }

    #[test]
    fn missing_commit_is_storage_error() {
        let g = Graph::new();
        let ghost = GitOid::from_bytes([7; 20]);
        assert!(matches!(
            is_ancestor(&g.repo, ghost, ghost),
            Err(StoreError::Storage(_))
        ));
    }
}
