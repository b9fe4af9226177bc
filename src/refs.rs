//! Document identity and its git ref namespace.
//!
//! Every document's history hangs off exactly one ref:
//!
//! ```text
//! refs/
//! └── <owner>/
//!     └── <name>/
//!         └── HEAD      ← current head commit of document <owner>/<name>
//! ```
//!
//! Owner and name are restricted to ASCII letters, digits, `_` and `-`, so
//! neither can contain `/` and the mapping `(owner, name) → ref` is
//! injective. The same restriction rules out every construct git refuses in
//! a ref component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vellum_git::RefName;

use crate::error::StoreError;

/// Leaf component of every document ref.
pub const HEAD_LEAF: &str = "HEAD";

/// Upper bound on owner and name length, in bytes.
pub const MAX_COMPONENT_LEN: usize = 128;

/// A validated `(owner, name)` pair identifying one document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId {
    owner: String,
    name: String,
    head_ref: RefName,
}

impl DocumentId {
    /// Validate and build a document id.
    ///
    /// # Errors
    /// [`StoreError::Validation`] if either part is empty, too long, or
    /// contains anything other than `[A-Za-z0-9_-]`.
    pub fn new(owner: &str, name: &str) -> Result<Self, StoreError> {
        validate_component("owner", owner)?;
        validate_component("name", name)?;
        let head_ref = RefName::new(&format!("refs/{owner}/{name}/{HEAD_LEAF}"))
            .map_err(|e| StoreError::validation(e.to_string()))?;
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
            head_ref,
        })
    }

    /// The owning account.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The document name, unique per owner.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Validate an owner on its own, for owner-scoped queries.
///
/// # Errors
/// [`StoreError::Validation`] under the same rules as [`DocumentId::new`].
pub fn validate_owner(owner: &str) -> Result<(), StoreError> {
    validate_component("owner", owner)
}

fn validate_component(what: &str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::validation(format!("{what} must not be empty")));
    }
    if value.len() > MAX_COMPONENT_LEN {
        return Err(StoreError::validation(format!(
            "{what} is longer than {MAX_COMPONENT_LEN} bytes"
        )));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(StoreError::validation(format!(
            "{what} {value:?} contains {bad:?}; only letters, digits, '_' and '-' are allowed"
        )));
    }
    Ok(())
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for DocumentId {
    type Err = StoreError;

    /// Parse the `owner/name` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s.split_once('/').ok_or_else(|| {
            StoreError::validation(format!("expected `owner/name`, got {s:?}"))
        })?;
        Self::new(owner, name)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Ref naming
// ---------------------------------------------------------------------------

/// The ref holding the head of `id`'s history: `refs/<owner>/<name>/HEAD`.
///
/// # Example
/// ```
/// use vellum::refs::{ref_for, DocumentId};
/// let id = DocumentId::new("alice", "recipe").unwrap();
/// assert_eq!(ref_for(&id).as_str(), "refs/alice/recipe/HEAD");
/// ```
#[must_use]
pub fn ref_for(id: &DocumentId) -> RefName {
    id.head_ref.clone()
}

/// Prefix under which all of `owner`'s document refs live.
#[must_use]
pub fn owner_prefix(owner: &str) -> String {
    format!("refs/{owner}/")
}

/// Inverse of [`ref_for`]; `None` for refs outside the document namespace.
#[must_use]
pub fn document_from_ref(name: &RefName) -> Option<DocumentId> {
    let rest = name.as_str().strip_prefix("refs/")?;
    let mut parts = rest.split('/');
    let (owner, doc, leaf) = (parts.next()?, parts.next()?, parts.next()?);
    if leaf != HEAD_LEAF || parts.next().is_some() {
        return None;
    }
    DocumentId::new(owner, doc).ok()
}
