//! Document data model: snapshots, commits and the structural diff.

pub mod diff;
pub mod types;
