//! Shared helpers for vellum integration tests.
//!
//! Every test gets its own store: in memory, or a bare repository in a temp
//! directory. Nothing touches the real filesystem outside those.

#![allow(dead_code)]

use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;
use vellum::{
    Commit, DocumentId, DocumentStore, GixRepo, Identity, MemoryRepo, ObjectStore, Parents,
    Snapshot,
};

pub fn id(s: &str) -> DocumentId {
    s.parse().expect("valid document id")
}

pub fn who() -> Identity {
    Identity::new("Test User", "test@test.com")
}

pub fn snap(value: Value) -> Snapshot {
    match value {
        Value::Object(map) => map,
        other => panic!("test snapshot must be an object, got {other}"),
    }
}

/// Commit `value` on top of the document's current head.
pub fn commit<R: ObjectStore>(store: &DocumentStore<R>, doc: &str, value: Value) -> Commit {
    store
        .commit(&id(doc), value, "edit", &who(), Parents::CurrentHead)
        .expect("commit")
}

pub fn head<R: ObjectStore>(store: &DocumentStore<R>, doc: &str) -> vellum::GitOid {
    store
        .head(&id(doc))
        .expect("read head")
        .expect("document exists")
}

pub fn memory_store() -> (Option<TempDir>, DocumentStore<MemoryRepo>) {
    (None, DocumentStore::new(MemoryRepo::new()))
}

/// A store over a fresh bare repository created by gix.
pub fn gix_store() -> (Option<TempDir>, DocumentStore<GixRepo>) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let repo = GixRepo::init(&dir.path().join("store.git")).expect("init bare repo");
    (Some(dir), DocumentStore::new(repo))
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Run the `vellum` binary in `dir` with `stdin` piped in.
pub fn vellum_in(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_vellum"))
        .args(args)
        .current_dir(dir)
        .env_remove("VELLUM_CONFIG")
        .env_remove("VELLUM_REPO")
        .env_remove("VELLUM_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn vellum");
    if let Some(mut pipe) = child.stdin.take() {
        // Commands that never read stdin may exit before the write lands.
        let _ = pipe.write_all(stdin.as_bytes());
    }
    child.wait_with_output().expect("wait for vellum")
}

/// Run `vellum`, assert success, and parse stdout as JSON.
pub fn vellum_ok(dir: &Path, args: &[&str], stdin: &str) -> Value {
    let out = vellum_in(dir, args, stdin);
    assert!(
        out.status.success(),
        "vellum {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}

/// Run `vellum`, assert failure, and return stderr.
pub fn vellum_fails(dir: &Path, args: &[&str], stdin: &str) -> (Value, String) {
    let out = vellum_in(dir, args, stdin);
    assert!(!out.status.success(), "vellum {args:?} unexpectedly succeeded");
    let stdout = serde_json::from_slice(&out.stdout).unwrap_or(Value::Null);
    (stdout, String::from_utf8_lossy(&out.stderr).into_owned())
}
