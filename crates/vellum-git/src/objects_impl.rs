//! gix-backed object read/write operations.

use crate::error::GitError;
use crate::gix_repo::GixRepo;
use crate::types::{CommitInfo, EntryMode, GitOid, Identity, NewCommit, TreeEntry};

/// Convert our `GitOid` to a `gix::ObjectId`.
pub(crate) fn to_gix_oid(oid: GitOid) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(oid.as_bytes())
}

/// Convert a `gix::ObjectId` (or `&gix::oid`) to our `GitOid`.
pub(crate) fn from_gix_oid(oid: &gix::oid) -> Result<GitOid, GitError> {
    let bytes: [u8; 20] = oid.as_bytes().try_into().map_err(|_| GitError::InvalidOid {
        value: oid.to_string(),
        reason: "only SHA-1 object ids are supported".to_owned(),
    })?;
    Ok(GitOid::from_bytes(bytes))
}

fn from_gix_entry_mode(mode: gix::objs::tree::EntryMode) -> EntryMode {
    match mode.kind() {
        gix::objs::tree::EntryKind::Tree => EntryMode::Tree,
        gix::objs::tree::EntryKind::Blob => EntryMode::Blob,
        gix::objs::tree::EntryKind::BlobExecutable => EntryMode::BlobExecutable,
        gix::objs::tree::EntryKind::Link => EntryMode::Link,
        gix::objs::tree::EntryKind::Commit => EntryMode::Commit,
    }
}

const fn to_gix_entry_kind(mode: EntryMode) -> gix::objs::tree::EntryKind {
    match mode {
        EntryMode::Blob => gix::objs::tree::EntryKind::Blob,
        EntryMode::BlobExecutable => gix::objs::tree::EntryKind::BlobExecutable,
        EntryMode::Tree => gix::objs::tree::EntryKind::Tree,
        EntryMode::Link => gix::objs::tree::EntryKind::Link,
        EntryMode::Commit => gix::objs::tree::EntryKind::Commit,
    }
}

fn to_gix_signature(identity: &Identity, timestamp: i64) -> gix::actor::Signature {
    gix::actor::Signature {
        name: identity.name.as_str().into(),
        email: identity.email.as_str().into(),
        time: gix::date::Time::new(timestamp, 0),
    }
}

pub fn write_blob(repo: &GixRepo, data: &[u8]) -> Result<GitOid, GitError> {
    let id = repo
        .repo
        .write_blob(data)
        .map_err(|e| GitError::backend(format!("failed to write blob: {e}")))?;
    from_gix_oid(&id.detach())
}

pub fn write_tree(repo: &GixRepo, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
    let mut entries: Vec<gix::objs::tree::Entry> = entries
        .iter()
        .map(|e| gix::objs::tree::Entry {
            mode: to_gix_entry_kind(e.mode).into(),
            filename: e.name.as_str().into(),
            oid: to_gix_oid(e.oid),
        })
        .collect();
    // git requires tree entries in canonical order.
    entries.sort();
    let tree = gix::objs::Tree { entries };
    let id = repo
        .repo
        .write_object(&tree)
        .map_err(|e| GitError::backend(format!("failed to write tree: {e}")))?;
    from_gix_oid(&id.detach())
}

pub fn create_commit(repo: &GixRepo, commit: &NewCommit) -> Result<GitOid, GitError> {
    let object = gix::objs::Commit {
        message: commit.message.as_str().into(),
        tree: to_gix_oid(commit.tree),
        author: to_gix_signature(&commit.author, commit.timestamp),
        committer: to_gix_signature(&commit.committer, commit.timestamp),
        encoding: None,
        parents: commit.parents.iter().map(|p| to_gix_oid(*p)).collect(),
        extra_headers: Vec::new(),
    };
    let id = repo
        .repo
        .write_object(&object)
        .map_err(|e| GitError::backend(format!("failed to write commit object: {e}")))?;
    from_gix_oid(&id.detach())
}

pub fn read_blob(repo: &GixRepo, oid: GitOid) -> Result<Vec<u8>, GitError> {
    let mut blob = repo
        .repo
        .find_blob(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("blob {oid}: {e}"),
        })?;
    Ok(blob.take_data())
}

pub fn read_tree(repo: &GixRepo, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
    let tree = repo
        .repo
        .find_tree(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("tree {oid}: {e}"),
        })?;

    let mut entries = Vec::new();
    for result in tree.iter() {
        let entry = result.map_err(|e| GitError::CorruptObject {
            oid: oid.to_string(),
            message: format!("failed to decode tree entry: {e}"),
        })?;
        entries.push(TreeEntry {
            name: entry.inner.filename.to_string(),
            mode: from_gix_entry_mode(entry.inner.mode),
            oid: from_gix_oid(entry.inner.oid)?,
        });
    }
    Ok(entries)
}

pub fn read_commit(repo: &GixRepo, oid: GitOid) -> Result<CommitInfo, GitError> {
    let commit = repo
        .repo
        .find_commit(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("commit {oid}: {e}"),
        })?;

    let corrupt = |message: String| GitError::CorruptObject {
        oid: oid.to_string(),
        message,
    };

    let timestamp = commit
        .time()
        .map_err(|e| corrupt(format!("unreadable commit time: {e}")))?
        .seconds;
    let decoded = commit
        .decode()
        .map_err(|e| corrupt(format!("failed to decode commit: {e}")))?;

    let parents = decoded
        .parents()
        .map(|p| from_gix_oid(&p))
        .collect::<Result<Vec<_>, _>>()?;

    let author_sig = decoded.author();
    let committer_sig = decoded.committer();

    Ok(CommitInfo {
        tree_oid: from_gix_oid(&decoded.tree())?,
        parents,
        message: decoded.message.to_string(),
        author: Identity::new(author_sig.name.to_string(), author_sig.email.to_string()),
        committer: Identity::new(
            committer_sig.name.to_string(),
            committer_sig.email.to_string(),
        ),
        timestamp,
    })
}
