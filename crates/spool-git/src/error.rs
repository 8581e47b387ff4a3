//! Error types for spool-git.

use std::path::PathBuf;

use crate::repo_error::RepoError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
///
/// Domain failures are carried as [`RepoError`]; everything else is a
/// native or environmental failure that callers classify on demand.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// The repository has no working directory.
    #[error("repository has no working directory")]
    BareRepository,

    /// A classified repository failure.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A spawned git command exited unsuccessfully.
    #[error("git command failed: {0}")]
    Command(String),

    /// Output or file content was not valid UTF-8.
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(PathBuf),
}

impl Error {
    /// Classify this error into the repository error taxonomy.
    ///
    /// Native git2 failures go through the code classifier; anything that
    /// has no native code becomes [`RepoError::Unexpected`].
    #[must_use]
    pub fn classify(&self) -> RepoError {
        match self {
            Self::Repo(error) => error.clone(),
            Self::Git2(error) => RepoError::from(error),
            Self::NotARepository | Self::BareRepository => RepoError::NotFound,
            Self::Io(_) | Self::Command(_) | Self::InvalidUtf8(_) => RepoError::Unexpected,
        }
    }

    /// The store's diagnostic string for native failures, if any.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Git2(error) => Some(error.message()).filter(|m| !m.is_empty()),
            Self::Command(stderr) => Some(stderr.as_str()),
            _ => None,
        }
    }
}
