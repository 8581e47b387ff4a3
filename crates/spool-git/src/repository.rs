//! Repository wrapper providing high-level git operations.

use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Oid, RepositoryState};

use crate::blame::Blame;
use crate::error::{Error, Result};
use crate::model::{Commit, FileChange, Signature};
use crate::repo_error::RepoError;
use crate::traits::{CommitLookup, IgnoreCheck, RepoStore};

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => Error::NotARepository,
            _ => Error::Git2(e),
        })?;
        Ok(Self { inner })
    }

    /// Open the repository containing the current directory.
    ///
    /// # Errors
    /// Returns error if not inside a git repository.
    pub fn open_current() -> Result<Self> {
        Self::open(".")
    }

    /// Create a new repository with a working directory.
    ///
    /// # Errors
    /// Returns error if the repository can't be created.
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::init(path)?;
        Ok(Self { inner })
    }

    /// Get the path to the repository root (workdir).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    /// Get the workdir or fail for bare repositories.
    ///
    /// # Errors
    /// Returns `BareRepository` if there is no working directory.
    pub fn require_workdir(&self) -> Result<&Path> {
        self.workdir().ok_or(Error::BareRepository)
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Absolute path of a workdir-relative file.
    ///
    /// # Errors
    /// Returns `BareRepository` if there is no working directory.
    pub fn file_path(&self, path: &str) -> Result<PathBuf> {
        Ok(self.require_workdir()?.join(path))
    }

    /// Get the current repository state.
    #[must_use]
    pub fn state(&self) -> RepositoryState {
        self.inner.state()
    }

    /// Refuse to start a command while a multi-step operation is pending.
    ///
    /// # Errors
    /// Returns `MergeInProgress` or `CherryPickInProgress`.
    pub fn require_no_pending_operation(&self) -> Result<()> {
        match self.state() {
            RepositoryState::Merge => Err(RepoError::MergeInProgress.into()),
            RepositoryState::CherryPick | RepositoryState::CherryPickSequence => {
                Err(RepoError::CherryPickInProgress.into())
            }
            _ => Ok(()),
        }
    }

    // === HEAD ===

    /// Get the name of the current branch.
    ///
    /// # Errors
    /// Returns error if HEAD is detached.
    pub fn current_branch(&self) -> Result<String> {
        let head = match self.inner.head() {
            Ok(head) => head,
            // Unborn branch: HEAD names a branch that has no commits yet.
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.inner.find_reference("HEAD")?;
                return head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(String::from)
                    .ok_or_else(|| RepoError::DetachedHead.into());
            }
            Err(e) => return Err(e.into()),
        };
        if !head.is_branch() {
            return Err(RepoError::DetachedHead.into());
        }

        head.shorthand()
            .map(String::from)
            .ok_or_else(|| RepoError::DetachedHead.into())
    }

    /// Check if HEAD is detached.
    ///
    /// # Errors
    /// Returns error if HEAD can't be read.
    pub fn head_detached(&self) -> Result<bool> {
        Ok(self.inner.head_detached()?)
    }

    /// The commit HEAD points at, `None` on an unborn branch.
    ///
    /// # Errors
    /// Returns error if HEAD can't be resolved.
    pub fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.inner.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Tree of the HEAD commit, `None` on an unborn branch.
    pub(crate) fn head_tree(&self) -> Result<Option<git2::Tree<'_>>> {
        self.head_commit()?
            .map(|commit| commit.tree().map_err(Error::from))
            .transpose()
    }

    // === Branch operations ===

    /// Get the commit SHA for a branch.
    ///
    /// # Errors
    /// Returns `NotFound` if the branch doesn't exist.
    pub fn branch_commit(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .inner
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| RepoError::NotFound)?;

        Ok(branch.get().target().ok_or(RepoError::NotFound)?)
    }

    /// Create a new branch at a target revision (HEAD if none).
    ///
    /// # Errors
    /// Returns `InvalidName`, `DuplicateName` or `CommitNotFound`.
    pub fn create_branch(&self, name: &str, target: Option<&str>) -> Result<Oid> {
        if !git2::Branch::name_is_valid(name)? {
            return Err(RepoError::InvalidName(name.into()).into());
        }
        if self.branch_exists(name) {
            return Err(RepoError::DuplicateName.into());
        }

        let commit = self.resolve_commit(target.unwrap_or("HEAD"))?;
        let branch = self.inner.branch(name, &commit, false)?;
        tracing::debug!(name, target = %commit.id(), "created branch");

        Ok(branch.get().target().ok_or(RepoError::Unexpected)?)
    }

    /// Create a local branch tracking a remote branch such as `origin/main`.
    ///
    /// # Errors
    /// Returns `InvalidName`, `DuplicateName` or `CommitNotFound`.
    pub fn create_tracking_branch(&self, name: &str, remote_branch: &str) -> Result<Oid> {
        let oid = self.create_branch(name, Some(&format!("refs/remotes/{remote_branch}")))?;
        let mut branch = self.inner.find_branch(name, BranchType::Local)?;
        branch.set_upstream(Some(remote_branch))?;
        Ok(oid)
    }

    /// Checkout a branch, refusing to overwrite local changes.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown branches and `LocalConflict` when the
    /// workspace has changes the checkout would clobber.
    pub fn checkout(&self, branch_name: &str) -> Result<()> {
        self.require_no_pending_operation()?;

        let branch = self
            .inner
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| RepoError::NotFound)?;

        let reference = branch.get();
        let object = reference.peel(git2::ObjectType::Commit)?;

        let mut options = git2::build::CheckoutBuilder::new();
        options.safe();
        self.inner
            .checkout_tree(&object, Some(&mut options))
            .map_err(|e| match e.code() {
                ErrorCode::Conflict => Error::from(RepoError::LocalConflict),
                _ => Error::from(e),
            })?;
        self.inner.set_head(&format!("refs/heads/{branch_name}"))?;

        Ok(())
    }

    /// Delete a local branch.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown branches.
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        let mut branch = self
            .inner
            .find_branch(name, BranchType::Local)
            .map_err(|_| RepoError::NotFound)?;
        branch.delete()?;
        Ok(())
    }

    /// List all local branches.
    ///
    /// # Errors
    /// Returns error if branch listing fails.
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let branches = self.inner.branches(Some(BranchType::Local))?;

        let names: Vec<String> = branches
            .filter_map(|b| b.ok())
            .filter_map(|(b, _)| b.name().ok().flatten().map(String::from))
            .collect();

        Ok(names)
    }

    /// Check if a branch exists.
    #[must_use]
    pub fn branch_exists(&self, name: &str) -> bool {
        self.inner.find_branch(name, BranchType::Local).is_ok()
    }

    // === Commit lookup ===

    /// Get a commit snapshot by id.
    ///
    /// # Errors
    /// Returns `CommitNotFound` if the commit can't be read.
    pub fn lookup_commit(&self, oid: Oid) -> Result<Commit> {
        let commit = self
            .inner
            .find_commit(oid)
            .map_err(|_| RepoError::CommitNotFound(Some(oid.to_string())))?;
        Ok(Commit::from(&commit))
    }

    /// Resolve a revision expression to a commit.
    pub(crate) fn resolve_commit(&self, rev: &str) -> Result<git2::Commit<'_>> {
        self.inner
            .revparse_single(rev)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| RepoError::CommitNotFound(Some(rev.into())).into())
    }

    /// Resolve a revision expression such as `HEAD~1` or a tag name to the
    /// commit it names.
    ///
    /// # Errors
    /// Returns `CommitNotFound` if the revision doesn't name a commit.
    pub fn resolve_revision(&self, rev: &str) -> Result<Oid> {
        Ok(self.resolve_commit(rev)?.id())
    }

    // === Signature ===

    /// Get the default signature for commits.
    ///
    /// # Errors
    /// Returns error if git config doesn't have user.name/email.
    pub fn signature(&self) -> Result<git2::Signature<'static>> {
        Ok(self.inner.signature()?)
    }

    // === Low-level access ===

    /// Get a reference to the underlying git2 repository.
    ///
    /// Use sparingly - prefer high-level methods.
    #[must_use]
    pub const fn inner(&self) -> &git2::Repository {
        &self.inner
    }

    /// Mutable access for git2 calls that need it (stash).
    pub(crate) fn inner_mut(&mut self) -> &mut git2::Repository {
        &mut self.inner
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}

impl CommitLookup for Repository {
    fn find_commit(&self, oid: Oid) -> Option<Commit> {
        self.lookup_commit(oid).ok()
    }

    fn default_signature(&self) -> Signature {
        match self.inner.signature() {
            Ok(sig) => Signature::from(&sig),
            Err(e) => {
                tracing::debug!("no configured identity: {e}");
                Signature::now("Local User", "local@localhost")
            }
        }
    }
}

impl IgnoreCheck for Repository {
    fn is_ignored(&self, path: &str) -> bool {
        self.inner.is_path_ignored(path).unwrap_or(false)
    }
}

impl RepoStore for Repository {
    fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    fn staged_changes(&self) -> Result<Vec<FileChange>> {
        Self::staged_changes(self)
    }

    fn amending_staged_changes(&self) -> Result<Vec<FileChange>> {
        Self::amending_staged_changes(self)
    }

    fn unstaged_changes(&self, show_ignored: bool) -> Result<Vec<FileChange>> {
        Self::unstaged_changes(self, show_ignored)
    }

    fn contents_of_file(&self, path: &str) -> Result<Vec<u8>> {
        Self::contents_of_file(self, path)
    }

    fn contents_of_staged_file(&self, path: &str) -> Result<Vec<u8>> {
        Self::contents_of_staged_file(self, path)
    }

    fn staged_diff(&self, path: &str) -> Result<Option<String>> {
        Self::staged_diff(self, path)
    }

    fn amending_staged_diff(&self, path: &str) -> Result<Option<String>> {
        Self::amending_staged_diff(self, path)
    }

    fn unstaged_diff(&self, path: &str) -> Result<Option<String>> {
        Self::unstaged_diff(self, path)
    }

    fn blame(&self, path: &str, from: Option<Oid>) -> Result<Blame> {
        self.blame_file(path, from)
    }

    fn blame_contents(&self, path: &str, data: &[u8]) -> Result<Blame> {
        self.blame_data(path, data)
    }
}
