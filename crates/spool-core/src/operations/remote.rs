//! Fetch and push.
//!
//! Transfers poll the cancel flag from git2's progress callbacks, so a
//! canceled transfer stops at the next chunk.

use spool_git::Repository;

use crate::cancel::CancelToken;
use crate::operation::Operation;

/// Fetch a remote.
#[derive(Debug, Clone)]
pub struct Fetch {
    pub remote: String,
}

impl Operation for Fetch {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn run(&self, repo: &mut Repository, cancel: &CancelToken) -> spool_git::Result<()> {
        repo.fetch(&self.remote, &|| !cancel.is_canceled())
    }

    fn changes_refs(&self) -> bool {
        true
    }
}

/// Push a branch to a remote.
#[derive(Debug, Clone)]
pub struct Push {
    pub remote: String,
    /// Branch to push; the current branch if `None`.
    pub branch: Option<String>,
    pub force: bool,
}

impl Operation for Push {
    fn name(&self) -> &'static str {
        "push"
    }

    fn run(&self, repo: &mut Repository, cancel: &CancelToken) -> spool_git::Result<()> {
        repo.push(
            &self.remote,
            self.branch.as_deref(),
            self.force,
            &|| !cancel.is_canceled(),
        )
    }

    fn changes_refs(&self) -> bool {
        true
    }
}
