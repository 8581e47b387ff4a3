//! Index and workspace status, file contents, diffs and staging.

use std::fs;
use std::io;
use std::path::Path;

use git2::{ApplyLocation, Diff, DiffFormat, DiffOptions, ErrorCode, IndexAddOption};

use crate::Repository;
use crate::error::{Error, Result};
use crate::model::{DeltaStatus, FileChange};
use crate::repo_error::RepoError;

impl Repository {
    // === Status ===

    /// Changes staged in the index relative to HEAD.
    ///
    /// # Errors
    /// Returns error if the index or HEAD tree can't be read.
    pub fn staged_changes(&self) -> Result<Vec<FileChange>> {
        let head_tree = self.head_tree()?;
        let diff = self
            .inner()
            .diff_tree_to_index(head_tree.as_ref(), None, None)?;
        Ok(changes_from_diff(&diff))
    }

    /// Index changes relative to HEAD's first parent.
    ///
    /// This is what a commit would contain if HEAD were amended with the
    /// current index.
    ///
    /// # Errors
    /// Returns error if the index or parent tree can't be read.
    pub fn amending_staged_changes(&self) -> Result<Vec<FileChange>> {
        let parent_tree = self.amend_base_tree()?;
        let diff = self
            .inner()
            .diff_tree_to_index(parent_tree.as_ref(), None, None)?;
        Ok(changes_from_diff(&diff))
    }

    /// Workspace changes relative to the index.
    ///
    /// # Errors
    /// Returns error if the status scan fails.
    pub fn unstaged_changes(&self, show_ignored: bool) -> Result<Vec<FileChange>> {
        let mut options = DiffOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(show_ignored)
            .recurse_ignored_dirs(show_ignored);
        let diff = self
            .inner()
            .diff_index_to_workdir(None, Some(&mut options))?;
        Ok(changes_from_diff(&diff))
    }

    // === Content ===

    /// Bytes of a workdir file.
    ///
    /// # Errors
    /// Returns `FileNotFound` if the file doesn't exist.
    pub fn contents_of_file(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.file_path(path)?).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::from(RepoError::FileNotFound(path.into())),
            _ => Error::from(e),
        })
    }

    /// Bytes of a file as staged in the index.
    ///
    /// # Errors
    /// Returns `FileNotFound` if the index has no entry for the path.
    pub fn contents_of_staged_file(&self, path: &str) -> Result<Vec<u8>> {
        let index = self.inner().index()?;
        let entry = index
            .get_path(Path::new(path), 0)
            .ok_or_else(|| RepoError::FileNotFound(path.into()))?;
        let blob = self.inner().find_blob(entry.id)?;
        Ok(blob.content().to_vec())
    }

    // === Diffs ===

    /// Patch text for a staged file, `None` if unchanged.
    ///
    /// # Errors
    /// Returns error if the diff can't be computed.
    pub fn staged_diff(&self, path: &str) -> Result<Option<String>> {
        let head_tree = self.head_tree()?;
        let diff = self.inner().diff_tree_to_index(
            head_tree.as_ref(),
            None,
            Some(&mut pathspec_options(path)),
        )?;
        patch_text(&diff)
    }

    /// Patch text for a staged file relative to HEAD's parent.
    ///
    /// # Errors
    /// Returns error if the diff can't be computed.
    pub fn amending_staged_diff(&self, path: &str) -> Result<Option<String>> {
        let parent_tree = self.amend_base_tree()?;
        let diff = self.inner().diff_tree_to_index(
            parent_tree.as_ref(),
            None,
            Some(&mut pathspec_options(path)),
        )?;
        patch_text(&diff)
    }

    /// Patch text for an unstaged file, `None` if unchanged.
    ///
    /// # Errors
    /// Returns error if the diff can't be computed.
    pub fn unstaged_diff(&self, path: &str) -> Result<Option<String>> {
        let mut options = pathspec_options(path);
        options.include_untracked(true).show_untracked_content(true);
        let diff = self
            .inner()
            .diff_index_to_workdir(None, Some(&mut options))?;
        patch_text(&diff)
    }

    // === Staging ===

    /// Copy workdir files into the index. Missing files that are still
    /// tracked are removed from the index.
    ///
    /// # Errors
    /// Returns `FileNotFound` for paths neither on disk nor in the index.
    pub fn stage(&self, paths: &[String]) -> Result<()> {
        let workdir = self.require_workdir()?.to_path_buf();
        let mut index = self.inner().index()?;

        for path in paths {
            let relative = Path::new(path);
            if workdir.join(relative).exists() {
                index.add_path(relative)?;
            } else if index.get_path(relative, 0).is_some() {
                index.remove_path(relative)?;
            } else {
                return Err(RepoError::FileNotFound(path.clone()).into());
            }
        }

        index.write()?;
        Ok(())
    }

    /// Reset index entries back to HEAD.
    ///
    /// # Errors
    /// Returns `FileNotFound` for paths in neither the index nor HEAD.
    pub fn unstage(&self, paths: &[String]) -> Result<()> {
        let head = self.head_commit()?;
        let head_tree = head.as_ref().map(git2::Commit::tree).transpose()?;
        let mut index = self.inner().index()?;

        for path in paths {
            let relative = Path::new(path);
            let in_head = head_tree
                .as_ref()
                .is_some_and(|tree| tree.get_path(relative).is_ok());
            if !in_head && index.get_path(relative, 0).is_none() {
                return Err(RepoError::FileNotFound(path.clone()).into());
            }
        }

        match &head {
            Some(commit) => {
                self.inner()
                    .reset_default(Some(commit.as_object()), paths.iter().map(String::as_str))?;
            }
            None => {
                for path in paths {
                    index.remove_path(Path::new(path))?;
                }
                index.write()?;
            }
        }
        Ok(())
    }

    /// Stage every workspace change, including deletions.
    ///
    /// # Errors
    /// Returns error if the index can't be updated.
    pub fn stage_all(&self) -> Result<()> {
        let mut index = self.inner().index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        Ok(())
    }

    /// Apply a unified diff to the index, staging individual hunks.
    ///
    /// Hunks are matched by context only, so re-applying a staged hunk whose
    /// context still matches stages its lines a second time.
    ///
    /// # Errors
    /// Returns `PatchMismatch` if the patch doesn't parse or no longer
    /// applies to the staged content.
    pub fn apply_to_index(&self, patch: &str) -> Result<()> {
        let diff = Diff::from_buffer(patch.as_bytes()).map_err(|_| RepoError::PatchMismatch)?;
        if diff.deltas().len() == 0 {
            return Err(RepoError::PatchMismatch.into());
        }
        self.inner()
            .apply(&diff, ApplyLocation::Index, None)
            .map_err(|e| match e.code() {
                ErrorCode::ApplyFail | ErrorCode::GenericError => {
                    Error::from(RepoError::PatchMismatch)
                }
                _ => Error::from(e),
            })
    }

    /// Tree that an amended HEAD would be compared against.
    fn amend_base_tree(&self) -> Result<Option<git2::Tree<'_>>> {
        let Some(head) = self.head_commit()? else {
            return Ok(None);
        };
        match head.parent(0) {
            Ok(parent) => Ok(Some(parent.tree()?)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn pathspec_options(path: &str) -> DiffOptions {
    let mut options = DiffOptions::new();
    options.pathspec(path).disable_pathspec_match(true);
    options
}

fn changes_from_diff(diff: &Diff<'_>) -> Vec<FileChange> {
    diff.deltas()
        .filter_map(|delta| {
            let status = DeltaStatus::from(delta.status());
            let new_path = delta.new_file().path();
            let old_path = delta.old_file().path();
            let path = new_path.or(old_path)?.to_string_lossy().into_owned();
            let old_path = match status {
                DeltaStatus::Renamed | DeltaStatus::Copied => {
                    old_path.map(|p| p.to_string_lossy().into_owned())
                }
                _ => None,
            };
            Some(FileChange {
                path,
                old_path,
                status,
            })
        })
        .collect()
}

fn patch_text(diff: &Diff<'_>) -> Result<Option<String>> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            text.push(line.origin());
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(Some(text).filter(|t| !t.is_empty()))
}
