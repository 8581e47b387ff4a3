//! Error types for spool-core.

use spool_git::RepoError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in spool-core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Git store error.
    #[error(transparent)]
    Git(#[from] spool_git::Error),

    /// The repository's queue was shut down before the operation started.
    #[error("repository is closed")]
    RepositoryClosed,

    /// The queue dropped a job without producing a result.
    #[error("repository queue stopped before the job finished")]
    QueueClosed,

    /// The queue thread could not be spawned.
    #[error("failed to start repository queue: {0}")]
    Spawn(std::io::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("toml error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Classification for display, collapsing non-git errors to `Unexpected`.
    #[must_use]
    pub fn classify(&self) -> RepoError {
        match self {
            Self::Git(e) => e.classify(),
            _ => RepoError::Unexpected,
        }
    }
}

impl From<RepoError> for Error {
    fn from(e: RepoError) -> Self {
        Self::Git(e.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_passes_git_errors_through() {
        let err = Error::from(RepoError::DuplicateName);
        assert_eq!(err.classify(), RepoError::DuplicateName);
        assert_eq!(err.to_string(), RepoError::DuplicateName.to_string());
    }

    #[test]
    fn test_classify_other_errors() {
        assert_eq!(Error::RepositoryClosed.classify(), RepoError::Unexpected);
        assert_eq!(Error::QueueClosed.classify(), RepoError::Unexpected);
    }
}
