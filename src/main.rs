use std::io::{self, Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context as _, Result, bail};
use clap::{CommandFactory as _, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use vellum::config::{DEFAULT_CONFIG_FILE, VellumConfig};
use vellum::{
    DocumentId, DocumentStore, GitOid, GixRepo, Identity, MergeOutcome, Parents, Snapshot, diff,
    telemetry,
};

/// Versioned JSON documents on a git object store
///
/// Every document `owner/name` keeps its own commit history in a bare git
/// repository. Documents are JSON objects; diffs and merges work on their
/// top-level keys.
///
/// QUICK START:
///
///   echo '{"load": "a"}' | vellum commit alice/t -m v1
///   vellum clone alice/t bob/t
///   vellum merge bob/t alice/t
///
/// REVISIONS:
///
///   Wherever a revision is expected, pass either `owner/name` (the
///   document's current head) or a 40-character commit id.
#[derive(Parser)]
#[command(name = "vellum")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'vellum <command> --help' for more information on a specific command.")]
struct Cli {
    /// Config file [default: ./vellum.toml]
    #[arg(long, global = true, env = "VELLUM_CONFIG")]
    config: Option<PathBuf>,

    /// Bare repository holding the documents (overrides `store.path`)
    #[arg(long, global = true, env = "VELLUM_REPO")]
    repo: Option<PathBuf>,

    /// Author name (overrides `identity.name`)
    #[arg(long, global = true)]
    author_name: Option<String>,

    /// Author email (overrides `identity.email`)
    #[arg(long, global = true)]
    author_email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new revision of a document
    ///
    /// Reads the JSON object from --file, or from stdin when no file is
    /// given. Without --parent the new commit follows the current head.
    Commit {
        /// Document to commit to (`owner/name`)
        document: DocumentId,

        /// Commit message (empty uses `commit.default_message`)
        #[arg(short, long, default_value = "")]
        message: String,

        /// Read the document from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Explicit parent commit; repeat for a merge commit
        #[arg(long = "parent", value_name = "OID")]
        parents: Vec<GitOid>,
    },

    /// Print a document at a revision (`null` if it does not exist)
    Get {
        /// `owner/name` or commit id
        revision: Revision,
    },

    /// Print a document's history, newest first
    Log {
        /// Document (`owner/name`)
        document: DocumentId,

        /// Maximum number of commits
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Diff two revisions by top-level key
    Diff {
        /// Earlier revision
        a: Revision,
        /// Later revision
        b: Revision,
    },

    /// Merge one document's history into another's
    ///
    /// Exits with status 1 when the merge conflicts or the histories are
    /// unrelated; the outcome is printed either way.
    Merge {
        /// Source document
        from: DocumentId,
        /// Target document (the only one that moves)
        to: DocumentId,
    },

    /// Start a new document from another document's current head
    Clone {
        /// Source document
        from: DocumentId,
        /// New document; must not exist
        to: DocumentId,
    },

    /// List an owner's documents
    List {
        /// Owner
        owner: String,
    },

    /// Delete a document's ref (its commits are kept)
    Delete {
        /// Document (`owner/name`)
        document: DocumentId,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// A document head or a specific commit.
#[derive(Clone, Debug)]
enum Revision {
    Document(DocumentId),
    Commit(GitOid),
}

impl FromStr for Revision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            return s
                .parse()
                .map(Self::Document)
                .map_err(|e: vellum::StoreError| e.to_string());
        }
        s.parse()
            .map(Self::Commit)
            .map_err(|e| format!("expected `owner/name` or a commit id: {e}"))
    }
}

struct Context {
    store: DocumentStore<GixRepo>,
    author: Identity,
}

impl Context {
    fn open(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config = VellumConfig::load(&config_path)?;

        let repo_path = cli.repo.as_deref().unwrap_or(&config.store.path);
        let repo = GixRepo::open_or_init(repo_path)
            .with_context(|| format!("opening store at {}", repo_path.display()))?;
        tracing::debug!(path = %repo.path().display(), "store opened");

        let mut author = config.identity.identity();
        if let Some(name) = &cli.author_name {
            author.name.clone_from(name);
        }
        if let Some(email) = &cli.author_email {
            author.email.clone_from(email);
        }

        Ok(Self {
            store: DocumentStore::new(repo).with_default_message(config.commit.default_message),
            author,
        })
    }

    fn resolve(&self, revision: &Revision) -> Result<Option<Snapshot>> {
        Ok(match revision {
            Revision::Document(id) => self.store.get(id)?,
            Revision::Commit(oid) => Some(self.store.get_at(*oid)?),
        })
    }
}

fn main() -> Result<ExitCode> {
    telemetry::init();
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "vellum", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = Context::open(&cli)?;
    match &cli.command {
        Commands::Commit {
            document,
            message,
            file,
            parents,
        } => {
            let value = read_document(file.as_deref())?;
            let parents = if parents.is_empty() {
                Parents::CurrentHead
            } else {
                Parents::Explicit(parents.clone())
            };
            let commit = ctx
                .store
                .commit(document, value, message, &ctx.author, parents)?;
            print_json(&commit)?;
        }
        Commands::Get { revision } => print_json(&ctx.resolve(revision)?)?,
        Commands::Log { document, limit } => print_json(&ctx.store.log(document, *limit)?)?,
        Commands::Diff { a, b } => {
            let a = ctx.resolve(a)?;
            let b = ctx.resolve(b)?;
            print_json(&diff(a.as_ref(), b.as_ref()))?;
        }
        Commands::Merge { from, to } => {
            let outcome = ctx.store.merge(from, to, &ctx.author)?;
            print_json(&outcome)?;
            if !outcome.is_success() {
                if let MergeOutcome::Conflicted { conflicts, .. } = &outcome {
                    eprintln!("merge failed: {} conflicting key(s)", conflicts.len());
                } else {
                    eprintln!("merge failed: {from} and {to} share no history");
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Clone { from, to } => {
            let head = ctx.store.clone(from, to)?;
            print_json(&serde_json::json!({ "document": to, "head": head }))?;
        }
        Commands::List { owner } => print_json(&ctx.store.list(owner)?)?,
        Commands::Delete { document } => {
            let head = ctx.store.delete(document)?;
            print_json(&serde_json::json!({ "document": document, "head": head }))?;
        }
        Commands::Completions { .. } => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn read_document(file: Option<&Path>) -> Result<Value> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading document from stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        bail!("no document given; pass --file or pipe JSON on stdin");
    }
    serde_json::from_str(&text).context("document is not valid JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
