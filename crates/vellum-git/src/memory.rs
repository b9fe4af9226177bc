//! In-process [`ObjectStore`] with the same compare-and-swap guarantees as a
//! real repository.
//!
//! Objects are content-addressed with SHA-256 truncated to 20 bytes over a
//! git-like framing (`<kind> <len>\0<payload>`). The ids are stable across
//! runs but are *not* the ids git would compute; never mix them with a
//! [`GixRepo`](crate::GixRepo).
//!
//! All state lives behind one mutex, so every ref compare-and-swap is atomic
//! with respect to every other operation on the same `MemoryRepo`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use crate::error::GitError;
use crate::repo::ObjectStore;
use crate::types::{CommitInfo, EntryMode, GitOid, NewCommit, RefEdit, RefName, TreeEntry};

#[derive(Clone, Debug)]
enum Object {
    Blob(Vec<u8>),
    Tree(Vec<TreeEntry>),
    Commit(CommitInfo),
}

impl Object {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Blob(_) => "blob",
            Self::Tree(_) => "tree",
            Self::Commit(_) => "commit",
        }
    }
}

#[derive(Default)]
struct State {
    objects: HashMap<GitOid, Object>,
    refs: BTreeMap<RefName, GitOid>,
}

/// An in-memory object store.
#[derive(Default)]
pub struct MemoryRepo {
    state: Mutex<State>,
}

impl MemoryRepo {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects of every kind.
    pub fn object_count(&self) -> Result<usize, GitError> {
        Ok(self.lock()?.objects.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, GitError> {
        self.state
            .lock()
            .map_err(|_| GitError::backend("memory store lock poisoned"))
    }

    fn insert(&self, kind: &str, payload: &[u8], object: Object) -> Result<GitOid, GitError> {
        let oid = hash_object(kind, payload);
        self.lock()?.objects.entry(oid).or_insert(object);
        Ok(oid)
    }

    fn get(&self, oid: GitOid, want: &str) -> Result<Object, GitError> {
        let state = self.lock()?;
        state
            .objects
            .get(&oid)
            .cloned()
            .ok_or_else(|| GitError::NotFound {
                message: format!("{want} {oid}"),
            })
    }
}

fn wrong_kind(oid: GitOid, want: &str, found: &Object) -> GitError {
    GitError::CorruptObject {
        oid: oid.to_string(),
        message: format!("expected {want}, found {}", found.kind()),
    }
}

fn hash_object(kind: &str, payload: &[u8]) -> GitOid {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b" ");
    hasher.update(payload.len().to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(payload);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    GitOid::from_bytes(bytes)
}

const fn mode_octal(mode: EntryMode) -> &'static str {
    match mode {
        EntryMode::Blob => "100644",
        EntryMode::BlobExecutable => "100755",
        EntryMode::Tree => "40000",
        EntryMode::Link => "120000",
        EntryMode::Commit => "160000",
    }
}

fn encode_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut payload = Vec::new();
    for entry in entries {
        payload.extend_from_slice(mode_octal(entry.mode).as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(entry.name.as_bytes());
        payload.push(0);
        payload.extend_from_slice(entry.oid.as_bytes());
    }
    payload
}

fn encode_commit(commit: &NewCommit) -> Vec<u8> {
    let mut text = format!("tree {}\n", commit.tree);
    for parent in &commit.parents {
        text.push_str(&format!("parent {parent}\n"));
    }
    text.push_str(&format!("author {} {} +0000\n", commit.author, commit.timestamp));
    text.push_str(&format!(
        "committer {} {} +0000\n\n",
        commit.committer, commit.timestamp
    ));
    text.push_str(&commit.message);
    text.into_bytes()
}

impl ObjectStore for MemoryRepo {
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
        self.insert("blob", data, Object::Blob(data.to_vec()))
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        if sorted.windows(2).any(|w| w[0].name == w[1].name) {
            return Err(GitError::backend("duplicate tree entry name"));
        }
        let payload = encode_tree(&sorted);
        self.insert("tree", &payload, Object::Tree(sorted))
    }

    fn create_commit(&self, commit: &NewCommit) -> Result<GitOid, GitError> {
        self.read_tree(commit.tree)?;
        for parent in &commit.parents {
            self.read_commit(*parent)?;
        }
        let info = CommitInfo {
            tree_oid: commit.tree,
            parents: commit.parents.clone(),
            message: commit.message.clone(),
            author: commit.author.clone(),
            committer: commit.committer.clone(),
            timestamp: commit.timestamp,
        };
        self.insert("commit", &encode_commit(commit), Object::Commit(info))
    }

    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        match self.get(oid, "blob")? {
            Object::Blob(data) => Ok(data),
            other => Err(wrong_kind(oid, "blob", &other)),
        }
    }

    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
        match self.get(oid, "tree")? {
            Object::Tree(entries) => Ok(entries),
            other => Err(wrong_kind(oid, "tree", &other)),
        }
    }

    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
        match self.get(oid, "commit")? {
            Object::Commit(info) => Ok(info),
            other => Err(wrong_kind(oid, "commit", &other)),
        }
    }

    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError> {
        Ok(self.lock()?.refs.get(name).copied())
    }

    fn compare_and_swap_ref(&self, edit: &RefEdit) -> Result<bool, GitError> {
        let mut state = self.lock()?;
        if !matches!(state.objects.get(&edit.new_oid), Some(Object::Commit(_))) {
            return Err(GitError::NotFound {
                message: format!("commit {} for ref `{}`", edit.new_oid, edit.name),
            });
        }
        if state.refs.get(&edit.name).copied() != edit.expected_old {
            return Ok(false);
        }
        state.refs.insert(edit.name.clone(), edit.new_oid);
        Ok(true)
    }

    fn delete_ref(&self, name: &RefName, expected: GitOid) -> Result<bool, GitError> {
        let mut state = self.lock()?;
        if state.refs.get(name) != Some(&expected) {
            return Ok(false);
        }
        state.refs.remove(name);
        Ok(true)
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, GitOid)>, GitError> {
        Ok(self
            .lock()?
            .refs
            .iter()
            .filter(|(name, _)| name.as_str().starts_with(prefix))
            .map(|(name, oid)| (name.clone(), *oid))
            .collect())
    }
}
