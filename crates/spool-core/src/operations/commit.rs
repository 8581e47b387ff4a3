//! Commit creation.

use spool_git::Repository;

use crate::cancel::CancelToken;
use crate::operation::Operation;

/// Commit the index, or amend HEAD with it.
#[derive(Debug, Clone)]
pub struct Commit {
    pub message: String,
    pub amend: bool,
}

impl Operation for Commit {
    fn name(&self) -> &'static str {
        if self.amend { "amend" } else { "commit" }
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.commit(&self.message, self.amend)?;
        Ok(())
    }

    fn changes_refs(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use spool_git::RepoError;

    use super::*;
    use crate::operation::OperationResult;
    use crate::operations::testing::{inspect, run_on_queue, test_queue};

    fn head_summary(queue: &crate::RepositoryQueue) -> String {
        inspect(queue, |repo| {
            repo.head_commit()
                .unwrap()
                .and_then(|c| c.summary().map(String::from))
                .unwrap()
        })
    }

    #[test]
    fn test_commit_and_amend() {
        let (temp, queue) = test_queue();
        fs::write(temp.path().join("README.md"), "# Changed\n").unwrap();
        inspect(&queue, |repo| repo.stage(&["README.md".into()]).unwrap());

        let commit = Commit {
            message: "Update readme".into(),
            amend: false,
        };
        assert_eq!(commit.name(), "commit");
        assert_eq!(run_on_queue(&queue, commit), OperationResult::Success);
        assert_eq!(head_summary(&queue), "Update readme");

        let amend = Commit {
            message: "Update readme again".into(),
            amend: true,
        };
        assert_eq!(run_on_queue(&queue, amend), OperationResult::Success);
        assert_eq!(head_summary(&queue), "Update readme again");
    }

    #[test]
    fn test_commit_refused_during_merge() {
        let (temp, queue) = test_queue();
        let head = inspect(&queue, |repo| repo.head_commit().unwrap().unwrap().id());
        fs::write(temp.path().join(".git/MERGE_HEAD"), format!("{head}\n")).unwrap();

        let result = run_on_queue(
            &queue,
            Commit {
                message: "Merge".into(),
                amend: false,
            },
        );
        let OperationResult::Failure(failure) = result else {
            panic!("expected failure");
        };
        assert_eq!(failure.error, RepoError::MergeInProgress);
    }
}
