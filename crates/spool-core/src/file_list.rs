//! File lists shown by a staging view.
//!
//! The index list shows staged changes (relative to HEAD, or to HEAD's
//! parent while amending) and the workspace list shows unstaged changes.
//! All three answer the same questions against a [`RepoStore`].

use serde::Serialize;
use spool_git::{Blame, FileChange, RepoStore};

use crate::error::Result;
use crate::tree::{ChangeTreeBuilder, FileChangeNode};

/// Which set of changes a list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "list", rename_all = "snake_case")]
pub enum FileList {
    /// Index relative to HEAD.
    Index,
    /// Index relative to HEAD's parent.
    AmendingIndex,
    /// Working directory relative to the index.
    Workspace { show_ignored: bool },
}

impl FileList {
    /// Heading for this list.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Index => "Staged",
            Self::AmendingIndex => "Staged (amending)",
            Self::Workspace { .. } => "Workspace",
        }
    }

    #[must_use]
    pub const fn is_staged(self) -> bool {
        !matches!(self, Self::Workspace { .. })
    }

    /// Changes in this list.
    ///
    /// # Errors
    /// Returns error if the store can't compute status.
    pub fn changes(self, store: &impl RepoStore) -> Result<Vec<FileChange>> {
        let changes = match self {
            Self::Index => store.staged_changes()?,
            Self::AmendingIndex => store.amending_staged_changes()?,
            Self::Workspace { show_ignored } => store.unstaged_changes(show_ignored)?,
        };
        Ok(changes)
    }

    /// Patch text for one file, `None` if it has no textual diff.
    ///
    /// # Errors
    /// Returns error if the store can't compute the diff.
    pub fn diff_for_file(self, store: &impl RepoStore, path: &str) -> Result<Option<String>> {
        let diff = match self {
            Self::Index => store.staged_diff(path)?,
            Self::AmendingIndex => store.amending_staged_diff(path)?,
            Self::Workspace { .. } => store.unstaged_diff(path)?,
        };
        Ok(diff)
    }

    /// The file's bytes as this list sees them.
    ///
    /// # Errors
    /// Returns `FileNotFound` if the file isn't there.
    pub fn data_for_file(self, store: &impl RepoStore, path: &str) -> Result<Vec<u8>> {
        let data = match self {
            Self::Index | Self::AmendingIndex => store.contents_of_staged_file(path)?,
            Self::Workspace { .. } => store.contents_of_file(path)?,
        };
        Ok(data)
    }

    /// Blame of the file as this list sees it. Lines that differ from
    /// history come back as local hunks.
    ///
    /// # Errors
    /// Returns error if the content can't be read or blame fails.
    pub fn blame(self, store: &impl RepoStore, path: &str) -> Result<Blame> {
        let data = self.data_for_file(store, path)?;
        Ok(store.blame_contents(path, &data)?)
    }

    /// Tree view of this list. Index lists hold only their changes; the
    /// workspace tree lists every file under the working directory.
    ///
    /// # Errors
    /// Returns error if status can't be computed, or `BareRepository` for a
    /// workspace list without a working directory.
    pub fn tree_root<S: RepoStore>(self, store: &S) -> Result<FileChangeNode> {
        let changes = self.changes(store)?;
        match self {
            Self::Index | Self::AmendingIndex => Ok(ChangeTreeBuilder::new(changes).build_staging()),
            Self::Workspace { .. } => {
                let workdir = store
                    .workdir()
                    .ok_or(spool_git::Error::BareRepository)?
                    .to_path_buf();
                Ok(ChangeTreeBuilder::new(changes)
                    .ignore_check(store)
                    .build_workspace(&workdir))
            }
        }
    }
}

/// The pair of lists a staging view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StagingSelection {
    pub amending: bool,
    pub show_ignored: bool,
}

impl StagingSelection {
    /// The index list, switching base while amending.
    #[must_use]
    pub const fn index_list(self) -> FileList {
        if self.amending {
            FileList::AmendingIndex
        } else {
            FileList::Index
        }
    }

    #[must_use]
    pub const fn workspace_list(self) -> FileList {
        FileList::Workspace {
            show_ignored: self.show_ignored,
        }
    }

    /// Index list first, then workspace.
    #[must_use]
    pub const fn lists(self) -> [FileList; 2] {
        [self.index_list(), self.workspace_list()]
    }
}
