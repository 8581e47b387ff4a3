//! Closed taxonomy of repository failures and the native code classifier.
//!
//! Every failure surfaced to an operation's caller is one of the
//! [`RepoError`] kinds below. Values carry plain payload (a SHA, a path, a
//! raw code) so they can be rendered later without holding any repository
//! handle.

use serde::Serialize;

/// libgit2 error codes that have a dedicated [`RepoError`] kind.
pub mod codes {
    pub const GIT_OK: i32 = 0;
    pub const GIT_ENOTFOUND: i32 = -3;
    pub const GIT_EUNMERGED: i32 = -10;
    pub const GIT_ECONFLICT: i32 = -13;
    pub const GIT_ELOCKED: i32 = -14;
    pub const GIT_EUNCOMMITTED: i32 = -22;
    pub const GIT_EMERGECONFLICT: i32 = -24;
    pub const GIT_EINDEXDIRTY: i32 = -34;
}

/// Repository error kinds reported to operation callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RepoError {
    /// Another mutating operation holds the repository.
    #[error("another operation is already writing to the repository")]
    AlreadyWriting,

    /// A cherry-pick is in progress.
    #[error("a cherry-pick operation is in progress")]
    CherryPickInProgress,

    /// The referenced commit does not exist.
    #[error("{}", commit_not_found(.0.as_deref()))]
    CommitNotFound(Option<String>),

    /// Merge or checkout produced unresolved conflicts.
    #[error("there are conflicted files that must be resolved first")]
    Conflict,

    /// HEAD is not on a named branch.
    #[error("HEAD is detached - check out a branch first")]
    DetachedHead,

    /// Name collides with an existing branch, tag or remote.
    #[error("that name is already in use")]
    DuplicateName,

    /// The referenced path is absent.
    #[error("the file {0} was not found")]
    FileNotFound(String),

    /// Unclassified native code.
    #[error("an internal git error ({0}) occurred")]
    GitError(i32),

    /// Name fails ref validation.
    #[error("the name \"{0}\" is not valid")]
    InvalidName(String),

    /// Local changes would be overwritten.
    #[error("the operation could not be completed because there are conflicts with local changes")]
    LocalConflict,

    /// A merge is in progress.
    #[error("a merge operation is in progress")]
    MergeInProgress,

    /// Generic missing object.
    #[error("the item was not found")]
    NotFound,

    /// A hunk no longer applies to current content.
    #[error("the patch could not be applied because it did not match the file content")]
    PatchMismatch,

    /// Condition nobody anticipated.
    #[error("an unexpected repository error occurred")]
    Unexpected,

    /// The workspace or index has uncommitted changes.
    #[error("the operation requires a clean workspace")]
    WorkspaceDirty,
}

fn commit_not_found(sha: Option<&str>) -> String {
    match sha {
        Some(sha) => format!("the commit {} was not found", short_sha(sha)),
        None => "the commit was not found".to_string(),
    }
}

/// First six characters of a SHA, used when rendering commit references.
#[must_use]
pub fn short_sha(sha: &str) -> &str {
    sha.get(..6).unwrap_or(sha)
}

impl RepoError {
    /// Map a native libgit2 error code to its error kind.
    ///
    /// Total and deterministic: codes without a dedicated kind become
    /// [`RepoError::GitError`] with the original code preserved.
    #[must_use]
    pub const fn classify(code: i32) -> Self {
        match code {
            codes::GIT_ECONFLICT | codes::GIT_EMERGECONFLICT => Self::Conflict,
            codes::GIT_ELOCKED => Self::AlreadyWriting,
            codes::GIT_ENOTFOUND => Self::NotFound,
            codes::GIT_EUNMERGED => Self::MergeInProgress,
            codes::GIT_EUNCOMMITTED | codes::GIT_EINDEXDIRTY => Self::WorkspaceDirty,
            other => Self::GitError(other),
        }
    }

    /// Turn a native return code into a result.
    ///
    /// # Errors
    /// Returns the classified error for any non-zero code.
    pub const fn check_code(code: i32) -> Result<(), Self> {
        if code == codes::GIT_OK {
            Ok(())
        } else {
            Err(Self::classify(code))
        }
    }

    /// Whether this is an opaque passthrough rather than a domain kind.
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self, Self::GitError(_))
    }
}

impl From<&git2::Error> for RepoError {
    /// Classifies on [`git2::ErrorCode`]: `raw_code()` reports some codes,
    /// such as `GIT_EMERGECONFLICT`, as the generic `GIT_ERROR`.
    fn from(error: &git2::Error) -> Self {
        use git2::ErrorCode;

        match error.code() {
            ErrorCode::Conflict | ErrorCode::MergeConflict => Self::Conflict,
            ErrorCode::Locked => Self::AlreadyWriting,
            ErrorCode::NotFound => Self::NotFound,
            ErrorCode::Unmerged => Self::MergeInProgress,
            ErrorCode::Uncommitted | ErrorCode::IndexDirty => Self::WorkspaceDirty,
            _ => Self::GitError(error.raw_code()),
        }
    }
}
