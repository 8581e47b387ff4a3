//! Commit creation.

use git2::Oid;

use crate::Repository;
use crate::error::Result;
use crate::repo_error::RepoError;

impl Repository {
    /// Commit the index, or rewrite HEAD with it when `amend` is set.
    ///
    /// Amending keeps the original author and replaces the committer.
    ///
    /// # Errors
    /// Returns `MergeInProgress`/`CherryPickInProgress` while a multi-step
    /// operation is pending, and `NotFound` when amending an unborn branch.
    pub fn commit(&self, message: &str, amend: bool) -> Result<Oid> {
        self.require_no_pending_operation()?;

        let signature = self.signature()?;
        let mut index = self.inner().index()?;
        let tree_id = index.write_tree()?;
        let tree = self.inner().find_tree(tree_id)?;
        let head = self.head_commit()?;

        let oid = if amend {
            let head = head.ok_or(RepoError::NotFound)?;
            head.amend(
                Some("HEAD"),
                None,
                Some(&signature),
                None,
                Some(message),
                Some(&tree),
            )?
        } else {
            let parents: Vec<&git2::Commit<'_>> = head.iter().collect();
            self.inner()
                .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?
        };

        tracing::debug!(%oid, amend, "created commit");
        Ok(oid)
    }
}
