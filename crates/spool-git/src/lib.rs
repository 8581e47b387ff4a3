//! # spool-git
//!
//! Git store for Spool, built on git2-rs.
//!
//! [`Repository`] wraps a `git2::Repository` and exposes the reads the UI
//! layer needs (status lists, file contents, diffs, blame) alongside the
//! mutating commands run by the operation queue. Failures carry a
//! [`RepoError`] classification so callers can show a uniform message for
//! any libgit2 return code.

mod blame;
mod commit;
mod error;
mod model;
mod remote;
mod repo_error;
mod repository;
mod stash;
mod status;
mod tag;
mod traits;

pub use blame::{Blame, BlameHunk, LineInfo};
pub use error::{Error, Result};
pub use git2::{Oid, RepositoryState};
pub use model::{Commit, DeltaStatus, FileChange, Signature, Tag, payload_is_signed};
pub use repo_error::{RepoError, codes, short_sha};
pub use repository::Repository;
pub use stash::{Stash, StashOptions};
pub use traits::{CommitLookup, IgnoreCheck, RepoStore};
