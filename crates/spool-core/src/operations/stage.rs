//! Index updates: stage, unstage, stage all, and hunk application.

use spool_git::{RepoError, Repository};

use crate::cancel::CancelToken;
use crate::operation::Operation;

/// Copy files from the workspace into the index.
#[derive(Debug, Clone)]
pub struct Stage {
    pub paths: Vec<String>,
}

impl Operation for Stage {
    fn name(&self) -> &'static str {
        "stage"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.stage(&self.paths)
    }
}

/// Reset index entries back to HEAD.
#[derive(Debug, Clone)]
pub struct Unstage {
    pub paths: Vec<String>,
}

impl Operation for Unstage {
    fn name(&self) -> &'static str {
        "unstage"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.unstage(&self.paths)
    }
}

/// Stage every workspace change.
#[derive(Debug, Clone, Copy)]
pub struct StageAll;

impl Operation for StageAll {
    fn name(&self) -> &'static str {
        "stage-all"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.stage_all()
    }
}

/// Apply a unified diff to the index.
#[derive(Debug, Clone)]
pub struct ApplyPatch {
    pub patch: String,
}

impl Operation for ApplyPatch {
    fn name(&self) -> &'static str {
        "apply-patch"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.apply_to_index(&self.patch)
    }

    fn repo_error_message(&self, error: &RepoError) -> String {
        match error {
            RepoError::PatchMismatch => {
                "the selected lines could not be staged because the file has changed".to_string()
            }
            other => other.to_string(),
        }
    }
}
