//! Trait abstractions over the repository store.
//!
//! The tree builder, file lists and blame engine only need a narrow,
//! read-only view of the repository. These traits describe that view so the
//! logic can run against `Repository` in production and against mocks in
//! tests.

use std::path::Path;

use git2::Oid;

use crate::blame::Blame;
use crate::model::{Commit, FileChange, Signature};
use crate::Result;

/// Commit and identity lookups used by the blame engine.
pub trait CommitLookup {
    /// Resolve a commit by id, `None` if it cannot be read.
    fn find_commit(&self, oid: Oid) -> Option<Commit>;

    /// Identity used for uncommitted lines.
    fn default_signature(&self) -> Signature;
}

/// Ignore-rule check used when walking the workspace.
pub trait IgnoreCheck {
    /// Whether a path relative to the workdir is ignored.
    fn is_ignored(&self, path: &str) -> bool;
}

/// Read-only status and content queries.
#[allow(clippy::missing_errors_doc)]
pub trait RepoStore: CommitLookup + IgnoreCheck {
    // === Repository Info ===

    /// Get the working directory path.
    fn workdir(&self) -> Option<&Path>;

    // === Status ===

    /// Changes staged in the index relative to HEAD.
    fn staged_changes(&self) -> Result<Vec<FileChange>>;

    /// Index changes relative to HEAD's first parent, for amending.
    fn amending_staged_changes(&self) -> Result<Vec<FileChange>>;

    /// Workspace changes relative to the index.
    fn unstaged_changes(&self, show_ignored: bool) -> Result<Vec<FileChange>>;

    // === Content ===

    /// Bytes of a file in the working directory.
    fn contents_of_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Bytes of a file as staged in the index.
    fn contents_of_staged_file(&self, path: &str) -> Result<Vec<u8>>;

    // === Diffs ===

    /// Patch text for a staged file.
    fn staged_diff(&self, path: &str) -> Result<Option<String>>;

    /// Patch text for a staged file relative to HEAD's parent.
    fn amending_staged_diff(&self, path: &str) -> Result<Option<String>>;

    /// Patch text for an unstaged file.
    fn unstaged_diff(&self, path: &str) -> Result<Option<String>>;

    // === Blame ===

    /// Blame a file's history, optionally starting at a revision.
    fn blame(&self, path: &str, from: Option<Oid>) -> Result<Blame>;

    /// Blame supplied content against the file's history.
    fn blame_contents(&self, path: &str, data: &[u8]) -> Result<Blame>;
}
