//! Object store adapter for vellum.
//!
//! This crate defines the [`ObjectStore`] trait, the single interface through
//! which the document store reaches the git object model (blobs, trees,
//! commits, refs). The document layer never imports gix directly; it depends
//! on `vellum-git` and programs against the trait.
//!
//! # Crate layout
//!
//! - [`repo`]: the [`ObjectStore`] trait definition.
//! - [`types`]: value types used in trait signatures ([`GitOid`], [`RefName`],
//!   [`TreeEntry`], [`NewCommit`], etc.).
//! - [`error`]: the [`GitError`] enum returned by all trait methods.
//! - [`memory`]: [`MemoryRepo`], an in-process store with the same
//!   compare-and-swap guarantees.
//!
//! [`GixRepo`] is the on-disk implementation over a bare repository.

pub mod error;
pub mod memory;
pub mod repo;
pub mod types;

// gix-backed implementation modules
mod gix_repo;
mod objects_impl;
mod refs_impl;

pub use gix_repo::GixRepo;
pub use memory::MemoryRepo;
pub use refs_impl::REF_LOCK_FILE;

pub use error::GitError;
pub use repo::ObjectStore;
pub use types::{
    CommitInfo, EntryMode, GitOid, Identity, NewCommit, OidParseError, RefEdit, RefName,
    RefNameError, TreeEntry,
};
