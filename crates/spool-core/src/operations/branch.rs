//! Branch creation, deletion and checkout.

use spool_git::{RepoError, Repository};

use crate::cancel::CancelToken;
use crate::operation::Operation;

/// Create a local branch, optionally checking it out.
#[derive(Debug, Clone)]
pub struct CreateBranch {
    pub name: String,
    /// Revision to branch from; HEAD if `None`.
    pub target: Option<String>,
    pub checkout: bool,
}

impl Operation for CreateBranch {
    fn name(&self) -> &'static str {
        "create-branch"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.require_no_pending_operation()?;
        repo.create_branch(&self.name, self.target.as_deref())?;
        if self.checkout {
            repo.checkout(&self.name)?;
        }
        Ok(())
    }

    fn repo_error_message(&self, error: &RepoError) -> String {
        branch_error_message(&self.name, error)
    }

    fn changes_refs(&self) -> bool {
        true
    }
}

/// Create a local branch tracking a remote branch.
#[derive(Debug, Clone)]
pub struct CheckOutRemote {
    /// Remote branch such as `origin/feature`.
    pub remote_branch: String,
    /// Local name; the part after the remote name if `None`.
    pub name: Option<String>,
    pub checkout: bool,
}

impl CheckOutRemote {
    /// Local branch name that will be created.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| {
            self.remote_branch
                .split_once('/')
                .map_or(self.remote_branch.as_str(), |(_, branch)| branch)
        })
    }
}

impl Operation for CheckOutRemote {
    fn name(&self) -> &'static str {
        "checkout-remote"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.require_no_pending_operation()?;
        let name = self.local_name();
        repo.create_tracking_branch(name, &self.remote_branch)?;
        if self.checkout {
            repo.checkout(name)?;
        }
        Ok(())
    }

    fn repo_error_message(&self, error: &RepoError) -> String {
        branch_error_message(self.local_name(), error)
    }

    fn changes_refs(&self) -> bool {
        true
    }
}

/// Delete a local branch.
#[derive(Debug, Clone)]
pub struct DeleteBranch {
    pub name: String,
}

impl Operation for DeleteBranch {
    fn name(&self) -> &'static str {
        "delete-branch"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.delete_branch(&self.name)
    }

    fn changes_refs(&self) -> bool {
        true
    }
}

/// Check out a local branch.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub branch: String,
}

impl Operation for Checkout {
    fn name(&self) -> &'static str {
        "checkout"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.checkout(&self.branch)
    }

    fn repo_error_message(&self, error: &RepoError) -> String {
        match error {
            RepoError::LocalConflict => format!(
                "cannot check out {} because local changes would be overwritten",
                self.branch
            ),
            RepoError::NotFound => format!("there is no branch named {}", self.branch),
            other => other.to_string(),
        }
    }

    fn changes_refs(&self) -> bool {
        true
    }
}

fn branch_error_message(name: &str, error: &RepoError) -> String {
    match error {
        RepoError::DuplicateName => format!("a branch named {name} already exists"),
        other => other.to_string(),
    }
}
