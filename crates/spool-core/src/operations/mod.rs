//! Repository commands run through an [`OperationController`].
//!
//! Each command is a small value type implementing [`Operation`]; it holds
//! only its arguments, and the controller supplies the repository on the
//! queue thread.
//!
//! [`OperationController`]: crate::OperationController
//! [`Operation`]: crate::Operation

mod branch;
mod commit;
mod remote;
mod stage;
mod stash;
mod tag;

pub use branch::{CheckOutRemote, Checkout, CreateBranch, DeleteBranch};
pub use commit::Commit;
pub use remote::{Fetch, Push};
pub use stage::{ApplyPatch, Stage, StageAll, Unstage};
pub use stash::{ApplyStash, DropStash, PopStash, SaveStash};
pub use tag::{CreateTag, DeleteTag};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use spool_git::Repository;

    use crate::operation::{Operation, OperationController, OperationResult};
    use crate::queue::RepositoryQueue;
    use crate::test_mocks::init_test_repo;

    /// Start an operation and block for its result.
    pub fn run_on_queue<O: Operation>(queue: &RepositoryQueue, operation: O) -> OperationResult {
        OperationController::new(operation, queue)
            .start()
            .unwrap()
            .wait()
    }

    pub fn test_queue() -> (tempfile::TempDir, RepositoryQueue) {
        let (temp, repo) = init_test_repo();
        (temp, RepositoryQueue::new(repo).unwrap())
    }

    /// Read repository state through the queue.
    pub fn inspect<T: Send + 'static>(
        queue: &RepositoryQueue,
        f: impl FnOnce(&mut Repository) -> T + Send + 'static,
    ) -> T {
        queue.run_sync(f).unwrap()
    }
}
