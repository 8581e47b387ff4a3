//! # spool-core
//!
//! Command execution and change views for Spool.
//!
//! Every mutating repository command runs through a [`RepositoryQueue`],
//! which owns the repository on its own thread and runs jobs one at a time.
//! An [`OperationController`] wraps one command, tracks cancellation, and
//! reports exactly one terminal [`OperationResult`] to its owner and to the
//! caller's [`OperationHandle`]. [`Session`] is the usual owner.
//!
//! Read-only views are built from the store: [`ChangeTreeBuilder`] turns
//! status lists into [`FileChangeNode`] trees, and [`FileList`] picks which
//! status, diff, content and blame a staging view shows.

pub mod cancel;
pub mod config;
pub mod error;
pub mod file_list;
pub mod operation;
pub mod operations;
pub mod queue;
pub mod session;
pub mod tree;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_mocks;

pub use cancel::CancelToken;
pub use config::Config;
pub use error::{Error, Result};
pub use file_list::{FileList, StagingSelection};
pub use operation::{
    Failure, Operation, OperationController, OperationHandle, OperationId, OperationObserver,
    OperationResult, OperationState,
};
pub use queue::{QueueTask, RepositoryQueue, WeakRepositoryQueue};
pub use session::{Session, SessionEvent};
pub use tree::{ChangeTreeBuilder, FileChangeNode, normalize_path};
