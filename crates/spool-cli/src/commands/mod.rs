//! Command-line interface definition and shared command plumbing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use spool_core::{Config, Operation, OperationResult, Session, normalize_path};
use spool_git::Repository;

pub mod blame;
pub mod branch;
pub mod commit;
pub mod completions;
pub mod remote;
pub mod stage;
pub mod stash;
pub mod status;
pub mod tag;

/// Spool - queued git commands with change trees and blame.
#[derive(Debug, Parser)]
#[command(name = "spool", version, about, propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Only print errors and essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show staged and unstaged changes.
    Status {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Include ignored files.
        #[arg(long)]
        ignored: bool,
    },

    /// Show the staging and workspace change trees.
    Tree {
        #[arg(long)]
        json: bool,

        #[arg(long)]
        ignored: bool,

        /// Compare the index against HEAD's parent.
        #[arg(long)]
        amend: bool,
    },

    /// Show who last changed each line of a file.
    Blame {
        path: PathBuf,

        /// Blame the staged version instead of the working copy.
        #[arg(long, conflicts_with = "rev")]
        staged: bool,

        /// Blame history starting at a commit.
        #[arg(long)]
        rev: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Stage files.
    Stage {
        #[arg(required_unless_present = "all")]
        paths: Vec<String>,

        /// Stage every change, including deletions.
        #[arg(short, long)]
        all: bool,
    },

    /// Unstage files.
    Unstage {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Apply a patch file to the index.
    Apply { patch: PathBuf },

    /// Commit the index.
    Commit {
        #[arg(short, long)]
        message: String,

        /// Replace HEAD instead of adding a commit.
        #[arg(long)]
        amend: bool,
    },

    /// List, create or delete branches.
    Branch {
        #[command(subcommand)]
        command: Option<BranchCommand>,
    },

    /// Switch to a local branch.
    Checkout { branch: String },

    /// List, create or delete tags.
    Tag {
        #[command(subcommand)]
        command: Option<TagCommand>,
    },

    /// Save, apply and drop stashes.
    Stash {
        #[command(subcommand)]
        command: Option<StashCommand>,
    },

    /// Fetch from a remote.
    Fetch {
        /// Remote name; defaults to the configured remote.
        remote: Option<String>,
    },

    /// Push a branch to a remote.
    Push {
        remote: Option<String>,

        /// Branch to push; defaults to the current branch.
        branch: Option<String>,

        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions { shell: Shell },
}

#[derive(Debug, Subcommand)]
pub enum BranchCommand {
    /// Create a branch.
    Create {
        name: String,

        /// Commit or branch to start from; defaults to HEAD.
        #[arg(long)]
        from: Option<String>,

        /// Switch to the new branch.
        #[arg(short, long)]
        checkout: bool,
    },

    /// Create a local branch tracking a remote one.
    Track {
        /// Remote branch, e.g. `origin/feature`.
        remote_branch: String,

        /// Local name; defaults to the remote branch name.
        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        checkout: bool,
    },

    /// Delete a branch.
    Delete { name: String },
}

#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// Create a tag; annotated when a message is given.
    Create {
        name: String,

        #[arg(long, default_value = "HEAD")]
        target: String,

        #[arg(short, long)]
        message: Option<String>,
    },

    /// Delete a tag.
    Delete { name: String },
}

#[derive(Debug, Subcommand)]
pub enum StashCommand {
    /// Stash local changes.
    Save {
        #[arg(short, long)]
        message: Option<String>,

        /// Leave staged changes in the index.
        #[arg(long)]
        keep_index: bool,

        /// Leave untracked files alone.
        #[arg(long)]
        tracked_only: bool,

        #[arg(long)]
        include_ignored: bool,
    },

    /// Apply a stash and keep it.
    Apply {
        #[arg(default_value_t = 0)]
        index: usize,
    },

    /// Apply a stash and drop it.
    Pop {
        #[arg(default_value_t = 0)]
        index: usize,
    },

    /// Drop a stash.
    Drop {
        #[arg(default_value_t = 0)]
        index: usize,
    },
}

/// Open a session on the repository containing the current directory.
pub fn open_session() -> Result<Arc<Session>> {
    open_session_with_workdir().map(|(session, _)| session)
}

/// Like [`open_session`], also returning the working directory.
pub fn open_session_with_workdir() -> Result<(Arc<Session>, PathBuf)> {
    let repo = Repository::open_current().context("Not inside a git repository")?;
    let workdir = repo
        .workdir()
        .context("Cannot run in bare repository")?
        .to_path_buf();
    let config = Config::load(Config::path_in(repo.git_dir()))?;

    // Session events only matter to long-lived front ends.
    let (session, _events) = Session::with_repository(repo, config)?;
    Ok((session, workdir))
}

/// Resolve a path given on the command line to one relative to the
/// repository root.
pub fn repo_relative(workdir: &Path, path: &Path) -> Result<String> {
    let cwd = std::env::current_dir().context("Cannot read current directory")?;
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
    let cwd = cwd.canonicalize().unwrap_or(cwd);
    let full = cwd.join(path);

    let Ok(relative) = full.strip_prefix(&workdir) else {
        bail!("'{}' is outside the repository", path.display());
    };
    let relative = relative.to_str().context("Path is not valid UTF-8")?;
    Ok(normalize_path(relative))
}

/// Run an operation to completion, turning a failure into an error that
/// carries its message.
pub fn run_operation<O: Operation>(session: &Arc<Session>, operation: O) -> Result<()> {
    let handle = session.start(operation)?;
    tracing::debug!(id = %handle.id(), operation = handle.operation_name(), "waiting");
    finish(handle.wait())
}

/// Map a terminal result onto the command's exit status.
pub fn finish(result: OperationResult) -> Result<()> {
    match result {
        OperationResult::Success => Ok(()),
        OperationResult::Canceled => bail!("Canceled"),
        OperationResult::Failure(failure) => match failure.message {
            Some(message) => bail!("{message}"),
            None => bail!("{}", failure.error),
        },
    }
}
