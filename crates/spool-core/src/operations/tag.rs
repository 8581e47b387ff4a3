//! Tag creation and deletion.

use spool_git::{RepoError, Repository};

use crate::cancel::CancelToken;
use crate::operation::Operation;

/// Create a tag. A message makes it annotated.
#[derive(Debug, Clone)]
pub struct CreateTag {
    pub name: String,
    pub target: String,
    pub message: Option<String>,
}

impl Operation for CreateTag {
    fn name(&self) -> &'static str {
        "create-tag"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.create_tag(&self.name, &self.target, self.message.as_deref())?;
        Ok(())
    }

    fn repo_error_message(&self, error: &RepoError) -> String {
        match error {
            RepoError::DuplicateName => format!("a tag named {} already exists", self.name),
            other => other.to_string(),
        }
    }

    fn changes_refs(&self) -> bool {
        true
    }
}

/// Delete a tag.
#[derive(Debug, Clone)]
pub struct DeleteTag {
    pub name: String,
}

impl Operation for DeleteTag {
    fn name(&self) -> &'static str {
        "delete-tag"
    }

    fn run(&self, repo: &mut Repository, _cancel: &CancelToken) -> spool_git::Result<()> {
        repo.delete_tag(&self.name)
    }

    fn changes_refs(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operation::{Failure, OperationResult};
    use crate::operations::testing::{inspect, run_on_queue, test_queue};

    fn create(name: &str, message: Option<&str>) -> CreateTag {
        CreateTag {
            name: name.into(),
            target: "HEAD".into(),
            message: message.map(String::from),
        }
    }

    #[test]
    fn test_create_and_delete_tag() {
        let (_temp, queue) = test_queue();

        assert_eq!(
            run_on_queue(&queue, create("v1.0", Some("First release"))),
            OperationResult::Success
        );
        let tag = inspect(&queue, |repo| repo.tag("v1.0").unwrap()).unwrap();
        assert_eq!(tag.message().map(str::trim), Some("First release"));

        assert_eq!(
            run_on_queue(&queue, DeleteTag { name: "v1.0".into() }),
            OperationResult::Success
        );
        assert!(inspect(&queue, |repo| repo.tag("v1.0").unwrap()).is_none());
    }

    #[test]
    fn test_duplicate_tag_message() {
        let (_temp, queue) = test_queue();
        run_on_queue(&queue, create("v1.0", None));

        assert_eq!(
            run_on_queue(&queue, create("v1.0", None)),
            OperationResult::Failure(Failure {
                error: RepoError::DuplicateName,
                message: Some("a tag named v1.0 already exists".into()),
            })
        );
    }
}
