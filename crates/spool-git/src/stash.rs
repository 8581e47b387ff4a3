//! Stash management.
//!
//! git2's stash API needs `&mut git2::Repository`, so these methods take
//! `&mut self`; on the command queue that is always available.

use git2::{ErrorCode, Oid, StashApplyOptions, StashFlags};
use serde::Serialize;

use crate::Repository;
use crate::error::{Error, Result};
use crate::repo_error::RepoError;

/// One entry in the stash list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stash {
    pub index: usize,
    pub message: String,
    #[serde(serialize_with = "serialize_oid")]
    pub oid: Oid,
}

/// What to include when saving a stash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StashOptions {
    pub keep_index: bool,
    pub include_untracked: bool,
    pub include_ignored: bool,
}

impl StashOptions {
    const fn flags(self) -> StashFlags {
        let mut flags = StashFlags::DEFAULT;
        if self.keep_index {
            flags = flags.union(StashFlags::KEEP_INDEX);
        }
        if self.include_untracked {
            flags = flags.union(StashFlags::INCLUDE_UNTRACKED);
        }
        if self.include_ignored {
            flags = flags.union(StashFlags::INCLUDE_IGNORED);
        }
        flags
    }
}

impl Repository {
    /// List stashes, newest first.
    ///
    /// # Errors
    /// Returns error if the stash reflog can't be read.
    pub fn stashes(&mut self) -> Result<Vec<Stash>> {
        let mut stashes = Vec::new();
        self.inner_mut().stash_foreach(|index, message, oid| {
            stashes.push(Stash {
                index,
                message: message.to_string(),
                oid: *oid,
            });
            true
        })?;
        Ok(stashes)
    }

    /// Save workspace and index changes to a new stash.
    ///
    /// # Errors
    /// Returns `NotFound` when there is nothing to stash.
    pub fn save_stash(&mut self, message: Option<&str>, options: StashOptions) -> Result<Oid> {
        let stasher = self.signature()?;
        let oid = self
            .inner_mut()
            .stash_save2(&stasher, message, Some(options.flags()))
            .map_err(|error| match error.code() {
                ErrorCode::NotFound => Error::from(RepoError::NotFound),
                _ => error.into(),
            })?;
        tracing::debug!(%oid, "saved stash");
        Ok(oid)
    }

    /// Apply a stash without removing it.
    ///
    /// # Errors
    /// Returns `LocalConflict` if local changes block the apply and
    /// `NotFound` for a missing index.
    pub fn apply_stash(&mut self, index: usize) -> Result<()> {
        let mut options = StashApplyOptions::new();
        self.inner_mut()
            .stash_apply(index, Some(&mut options))
            .map_err(stash_error)
    }

    /// Apply a stash and drop it if the apply succeeded.
    ///
    /// # Errors
    /// Same as [`Repository::apply_stash`].
    pub fn pop_stash(&mut self, index: usize) -> Result<()> {
        let mut options = StashApplyOptions::new();
        self.inner_mut()
            .stash_pop(index, Some(&mut options))
            .map_err(stash_error)
    }

    /// Remove a stash.
    ///
    /// # Errors
    /// Returns `NotFound` for a missing index.
    pub fn drop_stash(&mut self, index: usize) -> Result<()> {
        self.inner_mut().stash_drop(index)?;
        Ok(())
    }
}

fn stash_error(error: git2::Error) -> Error {
    match error.code() {
        ErrorCode::Conflict | ErrorCode::MergeConflict => RepoError::LocalConflict.into(),
        _ => error.into(),
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_oid<S: serde::Serializer>(oid: &Oid, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(oid)
}
