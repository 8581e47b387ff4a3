//! Stash save, apply, pop and drop.

use spool_git::{RepoError, Repository, StashOptions};

use crate::cancel::CancelToken;
use crate::operation::Operation;

/// Save workspace and index changes to a new stash.
#[derive(Debug, Clone, Default)]
pub struct SaveStash {
    pub message: Option<String>,
    pub keep_index: bool,
    pub include_untracked: bool,
    pub include_ignored: bool,
}

impl SaveStash {
    const fn options(&self) -> StashOptions {
        StashOptions {
            keep_index: self.keep_index,
            include_untracked: self.include_untracked,
            include_ignored: self.include_ignored,
        }
    }
}

impl Operation for SaveStash {
    fn name(&self) -> &'static str {
        "save-stash"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.save_stash(self.message.as_deref(), self.options())?;
        Ok(())
    }

    fn repo_error_message(&self, error: &RepoError) -> String {
        match error {
            RepoError::NotFound => "there are no local changes to stash".to_string(),
            other => other.to_string(),
        }
    }
}

/// Apply a stash, keeping it in the list.
#[derive(Debug, Clone, Copy)]
pub struct ApplyStash {
    pub index: usize,
}

impl Operation for ApplyStash {
    fn name(&self) -> &'static str {
        "apply-stash"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.apply_stash(self.index)
    }
}

/// Apply a stash and remove it.
#[derive(Debug, Clone, Copy)]
pub struct PopStash {
    pub index: usize,
}

impl Operation for PopStash {
    fn name(&self) -> &'static str {
        "pop-stash"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.pop_stash(self.index)
    }
}

/// Remove a stash without applying it.
#[derive(Debug, Clone, Copy)]
pub struct DropStash {
    pub index: usize,
}

impl Operation for DropStash {
    fn name(&self) -> &'static str {
        "drop-stash"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.drop_stash(self.index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;
    use crate::operation::{Failure, OperationResult};
    use crate::operations::testing::{inspect, run_on_queue, test_queue};

    #[test]
    fn test_save_apply_drop() {
        let (temp, queue) = test_queue();
        fs::write(temp.path().join("README.md"), "# Work in progress\n").unwrap();

        let save = SaveStash {
            message: Some("wip".into()),
            ..SaveStash::default()
        };
        assert_eq!(run_on_queue(&queue, save), OperationResult::Success);
        assert_eq!(inspect(&queue, |repo| repo.stashes().unwrap().len()), 1);

        assert_eq!(run_on_queue(&queue, ApplyStash { index: 0 }), OperationResult::Success);
        assert_eq!(
            fs::read_to_string(temp.path().join("README.md")).unwrap(),
            "# Work in progress\n"
        );
        assert_eq!(inspect(&queue, |repo| repo.stashes().unwrap().len()), 1);

        assert_eq!(run_on_queue(&queue, DropStash { index: 0 }), OperationResult::Success);
        assert!(inspect(&queue, |repo| repo.stashes().unwrap()).is_empty());
    }

    #[test]
    fn test_pop_removes_stash() {
        let (temp, queue) = test_queue();
        fs::write(temp.path().join("README.md"), "# Popped\n").unwrap();
        run_on_queue(&queue, SaveStash::default());

        assert_eq!(run_on_queue(&queue, PopStash { index: 0 }), OperationResult::Success);
        assert!(inspect(&queue, |repo| repo.stashes().unwrap()).is_empty());
    }

    #[test]
    fn test_nothing_to_stash() {
        let (_temp, queue) = test_queue();
        assert_eq!(
            run_on_queue(&queue, SaveStash::default()),
            OperationResult::Failure(Failure {
                error: RepoError::NotFound,
                message: Some("there are no local changes to stash".into()),
            })
        );
    }
}
