//! A repository session: the owner side of running operations.
//!
//! A [`Session`] holds the repository queue and configuration, starts
//! operations with itself as their owner, and turns lifecycle notifications
//! into [`SessionEvent`]s on a channel.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use spool_git::{Blame, Oid, Repository};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::Result;
use crate::file_list::{FileList, StagingSelection};
use crate::operation::{
    Operation, OperationController, OperationHandle, OperationId, OperationObserver,
    OperationResult,
};
use crate::queue::RepositoryQueue;
use crate::tree::FileChangeNode;

/// Notifications emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An operation reached its terminal state.
    OperationEnded {
        id: OperationId,
        name: &'static str,
        result: OperationResult,
    },
    /// Branches, tags, HEAD or remote refs moved.
    RefsChanged,
    /// A failed operation has a message to show.
    Failure {
        id: OperationId,
        name: &'static str,
        message: String,
    },
}

/// One open repository.
#[derive(Debug)]
pub struct Session {
    queue: RepositoryQueue,
    config: Config,
    events: mpsc::UnboundedSender<SessionEvent>,
    active: Mutex<ActiveOperations>,
}

/// Running operations. An operation can end before `start` returns, so
/// ids that end unrecorded are remembered until `start` sees them.
#[derive(Debug, Default)]
struct ActiveOperations {
    running: BTreeMap<OperationId, &'static str>,
    ended_early: BTreeSet<OperationId>,
}

impl Session {
    /// Open the repository at `path`, loading its Spool config.
    ///
    /// # Errors
    /// Returns error if the repository or config can't be opened.
    pub fn open(
        path: impl AsRef<Path>,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>)> {
        let repo = Repository::open(path)?;
        let config = Config::load(Config::path_in(repo.git_dir()))?;
        Self::with_repository(repo, config)
    }

    /// Start a session over an already opened repository.
    ///
    /// # Errors
    /// Returns error if the queue can't be started.
    pub fn with_repository(
        repo: Repository,
        config: Config,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>)> {
        let queue = RepositoryQueue::new(repo)?;
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            queue,
            config,
            events,
            active: Mutex::new(ActiveOperations::default()),
        });
        Ok((session, receiver))
    }

    #[must_use]
    pub const fn queue(&self) -> &RepositoryQueue {
        &self.queue
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Start an operation owned by this session.
    ///
    /// # Errors
    /// Returns [`crate::Error::RepositoryClosed`] if the queue is gone.
    pub fn start<O: Operation>(self: &Arc<Self>, operation: O) -> Result<OperationHandle> {
        self.start_controller(OperationController::new(operation, &self.queue))
    }

    /// Start a prepared controller (with success actions) owned by this
    /// session.
    ///
    /// # Errors
    /// Returns [`crate::Error::RepositoryClosed`] if the queue is gone.
    pub fn start_controller<O: Operation>(
        self: &Arc<Self>,
        controller: OperationController<O>,
    ) -> Result<OperationHandle> {
        let owner = Arc::downgrade(self);
        let owner: Weak<dyn OperationObserver> = owner;
        let controller = controller.with_owner(owner);

        let handle = controller.start()?;
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.ended_early.remove(&handle.id()) {
            active.running.insert(handle.id(), handle.operation_name());
        }
        Ok(handle)
    }

    /// Operations started and not yet ended.
    #[must_use]
    pub fn active_operations(&self) -> Vec<(OperationId, &'static str)> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .running
            .iter()
            .map(|(id, name)| (*id, *name))
            .collect()
    }

    /// Tree view of a file list, read on the queue.
    ///
    /// # Errors
    /// Returns error if status can't be computed.
    pub fn tree(&self, list: FileList) -> Result<FileChangeNode> {
        self.queue.run_sync(move |repo| list.tree_root(&*repo))?
    }

    /// Index and workspace trees for a staging view.
    ///
    /// # Errors
    /// Returns error if status can't be computed.
    pub fn staging_trees(
        &self,
        selection: StagingSelection,
    ) -> Result<(FileChangeNode, FileChangeNode)> {
        let index = self.tree(selection.index_list())?;
        let workspace = self.tree(selection.workspace_list())?;
        Ok((index, workspace))
    }

    /// Blame a file as a list sees it.
    ///
    /// # Errors
    /// Returns error if the file can't be read or blame fails.
    pub fn blame(&self, list: FileList, path: &str) -> Result<Blame> {
        let path = path.to_string();
        self.queue.run_sync(move |repo| list.blame(&*repo, &path))?
    }

    /// Blame a file's committed history from a revision, `HEAD` by default.
    ///
    /// # Errors
    /// Returns error if blame fails.
    pub fn blame_history(&self, path: &str, from: Option<Oid>) -> Result<Blame> {
        let path = path.to_string();
        Ok(self
            .queue
            .run_sync(move |repo| repo.blame_file(&path, from))??)
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }
}

impl OperationObserver for Session {
    fn operation_ended(&self, id: OperationId, name: &'static str, result: &OperationResult) {
        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if active.running.remove(&id).is_none() {
                active.ended_early.insert(id);
            }
        }

        if let OperationResult::Failure(failure) = result {
            if let Some(message) = &failure.message {
                self.emit(SessionEvent::Failure {
                    id,
                    name,
                    message: message.clone(),
                });
            }
        }
        self.emit(SessionEvent::OperationEnded {
            id,
            name,
            result: result.clone(),
        });
    }

    fn refs_changed(&self) {
        self.emit(SessionEvent::RefsChanged);
    }
}
