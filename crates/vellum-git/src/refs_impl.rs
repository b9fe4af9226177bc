//! gix-backed ref operations.
//!
//! Every ref write holds an exclusive lock on `<git dir>/vellum.lock` while
//! it re-reads the ref, compares it with the expected value and commits the
//! gix transaction. The lock is shared by every handle on the repository,
//! in this process or another, so check and write form one step.
//! A ref that exists never satisfies a create (`expected_old == None`), even
//! when it already holds the new value.
//!
//! A transaction that still fails under the lock (a foreign git writer) is
//! classified by re-reading the ref.

use std::fs::{File, OpenOptions};

use fs4::fs_std::FileExt;
use gix::refs::transaction::{Change, LogChange, PreviousValue, RefLog};
use gix::refs::{FullName, Target};
use tracing::debug;

use crate::error::GitError;
use crate::gix_repo::GixRepo;
use crate::objects_impl::{from_gix_oid, to_gix_oid};
use crate::types::{GitOid, RefEdit, RefName};

fn full_name(name: &RefName) -> Result<FullName, GitError> {
    name.as_str()
        .try_into()
        .map_err(|e: gix::validate::reference::name::Error| {
            GitError::backend(format!("ref name `{name}`: {e}"))
        })
}

pub fn read_ref(repo: &GixRepo, name: &RefName) -> Result<Option<GitOid>, GitError> {
    match repo.repo.try_find_reference(name.as_str()) {
        Ok(Some(mut r)) => {
            let id = r
                .peel_to_id_in_place()
                .map_err(|e| GitError::backend(format!("peel `{name}`: {e}")))?;
            Ok(Some(from_gix_oid(&id.detach())?))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(GitError::backend(format!("find `{name}`: {e}"))),
    }
}

/// Name of the repository-wide ref lock, inside the git directory.
pub const REF_LOCK_FILE: &str = "vellum.lock";

/// Block until this handle holds the repository's ref lock. Released when
/// the returned file is dropped.
fn lock_refs(repo: &GixRepo) -> Result<File, GitError> {
    let path = repo.repo.path().join(REF_LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)?;
    file.lock_exclusive()?;
    Ok(file)
}

/// Compare the ref's current value with `expected` under the lock.
fn still_expected(
    repo: &GixRepo,
    name: &RefName,
    expected: Option<GitOid>,
) -> Result<bool, GitError> {
    let current = read_ref(repo, name)?;
    if current == expected {
        return Ok(true);
    }
    debug!(
        ref_name = %name,
        expected = ?expected,
        current = ?current,
        "ref compare-and-swap lost"
    );
    Ok(false)
}

fn expected_value(expected: Option<GitOid>) -> PreviousValue {
    match expected {
        None => PreviousValue::MustNotExist,
        Some(oid) => PreviousValue::MustExistAndMatch(Target::Object(to_gix_oid(oid))),
    }
}

/// Decide whether a failed transaction was a lost race.
fn classify_failure(
    repo: &GixRepo,
    name: &RefName,
    expected: Option<GitOid>,
    err: &dyn std::fmt::Display,
) -> Result<bool, GitError> {
    let current = read_ref(repo, name)?;
    if current == expected {
        Err(GitError::backend(format!("update `{name}`: {err}")))
    } else {
        debug!(
            ref_name = %name,
            expected = ?expected,
            current = ?current,
            "ref compare-and-swap lost"
        );
        Ok(false)
    }
}

pub fn compare_and_swap_ref(repo: &GixRepo, edit: &RefEdit) -> Result<bool, GitError> {
    let _lock = lock_refs(repo)?;
    if !still_expected(repo, &edit.name, edit.expected_old)? {
        return Ok(false);
    }

    let gix_edit = gix::refs::transaction::RefEdit {
        change: Change::Update {
            log: LogChange {
                mode: RefLog::AndReference,
                force_create_reflog: false,
                message: "vellum: update document head".into(),
            },
            expected: expected_value(edit.expected_old),
            new: Target::Object(to_gix_oid(edit.new_oid)),
        },
        name: full_name(&edit.name)?,
        deref: false,
    };

    match repo.repo.edit_references([gix_edit]) {
        Ok(_) => Ok(true),
        Err(e) => classify_failure(repo, &edit.name, edit.expected_old, &e),
    }
}

pub fn delete_ref(repo: &GixRepo, name: &RefName, expected: GitOid) -> Result<bool, GitError> {
    let _lock = lock_refs(repo)?;
    if !still_expected(repo, name, Some(expected))? {
        return Ok(false);
    }

    let gix_edit = gix::refs::transaction::RefEdit {
        change: Change::Delete {
            expected: expected_value(Some(expected)),
            log: RefLog::AndReference,
        },
        name: full_name(name)?,
        deref: false,
    };

    match repo.repo.edit_references([gix_edit]) {
        Ok(_) => Ok(true),
        Err(e) => classify_failure(repo, name, Some(expected), &e),
    }
}

pub fn list_refs(repo: &GixRepo, prefix: &str) -> Result<Vec<(RefName, GitOid)>, GitError> {
    let platform = repo
        .repo
        .references()
        .map_err(|e| GitError::backend(e.to_string()))?;
    let refs_iter = platform
        .prefixed(prefix)
        .map_err(|e| GitError::backend(e.to_string()))?;

    let mut result = Vec::new();
    for r in refs_iter {
        let mut r = r.map_err(|e| GitError::backend(e.to_string()))?;
        let name_str = r.name().as_bstr().to_string();
        let id = r
            .peel_to_id_in_place()
            .map_err(|e| GitError::backend(e.to_string()))?;
        let oid = from_gix_oid(&id.detach())?;
        // Refs written by other tools may not pass our stricter validation.
        if let Ok(ref_name) = RefName::new(&name_str) {
            result.push((ref_name, oid));
        }
    }
    result.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(result)
}
