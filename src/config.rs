//! Vellum configuration (`vellum.toml`).
//!
//! ```toml
//! [store]
//! path = ".vellum"
//!
//! [commit]
//! default_message = "commit"
//!
//! [identity]
//! name = "vellum"
//! email = "vellum@localhost"
//! ```
//!
//! Every section and field is optional. A missing file means all defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use vellum_git::Identity;

use crate::store::DEFAULT_COMMIT_MESSAGE;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "vellum.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VellumConfig {
    /// Where documents are stored.
    #[serde(default)]
    pub store: StoreConfig,

    /// Commit defaults.
    #[serde(default)]
    pub commit: CommitConfig,

    /// Default author identity.
    #[serde(default)]
    pub identity: IdentityConfig,
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Object store location.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Bare git repository holding every document. Relative paths resolve
    /// against the working directory. Created on first use.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".vellum")
}

// ---------------------------------------------------------------------------
// CommitConfig
// ---------------------------------------------------------------------------

/// Commit defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitConfig {
    /// Message for commits made without one.
    #[serde(default = "default_message")]
    pub default_message: String,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            default_message: default_message(),
        }
    }
}

fn default_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_owned()
}

// ---------------------------------------------------------------------------
// IdentityConfig
// ---------------------------------------------------------------------------

/// Author identity used when the command line names none.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_email")]
    pub email: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            email: default_email(),
        }
    }
}

impl IdentityConfig {
    /// The configured identity.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone(), self.email.clone())
    }
}

fn default_name() -> String {
    "vellum".to_owned()
}

fn default_email() -> String {
    "vellum@localhost".to_owned()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The file being loaded, when known.
    pub path: Option<PathBuf>,
    /// What went wrong, with a line number when the parser gave one.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(p) => write!(f, "{}: {}", p.display(), self.message),
            None => write!(f, "config error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl VellumConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults. Unreadable files, invalid TOML and
    /// unknown fields are errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|e| ConfigError {
            path: Some(path.to_owned()),
            ..e
        })
    }

    /// Parse configuration from TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| {
            let message = match e.span() {
                Some(span) => {
                    let line = text[..span.start].matches('\n').count() + 1;
                    format!("line {line}: {}", e.message())
                }
                None => e.message().to_owned(),
            };
            ConfigError {
                path: None,
                message,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = VellumConfig::parse("").unwrap();
        assert_eq!(cfg, VellumConfig::default());
        assert_eq!(cfg.store.path, PathBuf::from(".vellum"));
        assert_eq!(cfg.commit.default_message, "commit");
        assert_eq!(
            cfg.identity.identity(),
            Identity::new("vellum", "vellum@localhost")
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = VellumConfig::parse(
            r#"
[store]
path = "/srv/docs.git"

[identity]
name = "Ada"
"#,
        )
        .unwrap();
        assert_eq!(cfg.store.path, PathBuf::from("/srv/docs.git"));
        assert_eq!(cfg.identity.name, "Ada");
        assert_eq!(cfg.identity.email, "vellum@localhost");
        assert_eq!(cfg.commit, CommitConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected_with_line() {
        let err = VellumConfig::parse("[commit]\n\nmesage = \"x\"\n").unwrap_err();
        assert!(err.message.starts_with("line 3:"), "{}", err.message);
        assert!(err.path.is_none());
    }

    #[test]
    fn missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = VellumConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, VellumConfig::default());
    }

    #[test]
    fn load_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[store\n").unwrap();
        let err = VellumConfig::load(&path).unwrap_err();
        assert_eq!(err.path.as_deref(), Some(path.as_path()));
        assert!(err.to_string().starts_with(&path.display().to_string()));
    }

    #[test]
    fn error_display_without_path() {
        let err = ConfigError {
            path: None,
            message: "parse error".to_owned(),
        };
        assert_eq!(err.to_string(), "config error: parse error");
    }
}
