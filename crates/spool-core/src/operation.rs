//! Operation lifecycle.
//!
//! An [`OperationController`] wraps one [`Operation`] and drives it through
//! the repository queue:
//!
//! ```text
//! Created -> Started -> Running -> Succeeded | Failed | Canceled -> Ended
//! ```
//!
//! Completion is handled by a guard that travels with the queued job. It
//! fires when the job finishes, fails, panics, or is dropped unrun, so the
//! owner and the [`OperationHandle`] always see exactly one terminal result.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use spool_git::{RepoError, Repository};
use tokio::sync::oneshot;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::queue::{RepositoryQueue, WeakRepositoryQueue};

/// A repository command run on the queue.
pub trait Operation: Send + Sync + 'static {
    /// Short name for logs and events.
    fn name(&self) -> &'static str;

    /// Perform the command. Long-running work should poll `cancel`.
    ///
    /// # Errors
    /// Any store error; the controller classifies it.
    fn run(&self, repo: &mut Repository, cancel: &CancelToken) -> spool_git::Result<()>;

    /// Stop work that can't observe the cancel flag. No-op by default.
    fn abort(&self) {}

    /// Whether a failure should produce a user-facing message.
    fn should_report(&self, _error: &spool_git::Error) -> bool {
        true
    }

    /// Message shown for a classified failure.
    fn repo_error_message(&self, error: &RepoError) -> String {
        error.to_string()
    }

    /// Whether success moves refs (branches, tags, HEAD, remotes).
    fn changes_refs(&self) -> bool {
        false
    }
}

/// Receives operation notifications. Held weakly by controllers.
pub trait OperationObserver: Send + Sync {
    /// An operation reached its terminal state.
    fn operation_ended(&self, id: OperationId, name: &'static str, result: &OperationResult);

    /// A successful operation moved refs. Sent before `operation_ended`.
    fn refs_changed(&self) {}
}

/// Process-unique operation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Lifecycle state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationState {
    Created,
    Started,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Ended,
}

impl OperationState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Started,
            2 => Self::Running,
            3 => Self::Succeeded,
            4 => Self::Failed,
            5 => Self::Canceled,
            _ => Self::Ended,
        }
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Arc<Self> {
        Arc::new(Self(AtomicU8::new(OperationState::Created as u8)))
    }

    fn set(&self, state: OperationState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    fn get(&self) -> OperationState {
        OperationState::from_u8(self.0.load(Ordering::SeqCst))
    }
}

/// A classified failure and the message to show for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub error: RepoError,
    /// `None` when the operation chose not to report the error.
    pub message: Option<String>,
}

/// Terminal result of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Success,
    Failure(Failure),
    Canceled,
}

impl OperationResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    const fn terminal_state(&self) -> OperationState {
        match self {
            Self::Success => OperationState::Succeeded,
            Self::Failure(_) => OperationState::Failed,
            Self::Canceled => OperationState::Canceled,
        }
    }

    fn unexpected() -> Self {
        Self::Failure(Failure {
            error: RepoError::Unexpected,
            message: Some(RepoError::Unexpected.to_string()),
        })
    }
}

type SuccessAction = Box<dyn FnOnce() + Send>;

/// Observer used when a controller has no owner.
struct Unowned;

impl OperationObserver for Unowned {
    fn operation_ended(&self, _id: OperationId, _name: &'static str, _result: &OperationResult) {}
}

/// Builds and starts one operation.
pub struct OperationController<O: Operation> {
    operation: Arc<O>,
    cancel: CancelToken,
    success_actions: Vec<SuccessAction>,
    owner: Weak<dyn OperationObserver>,
    queue: WeakRepositoryQueue,
}

impl<O: Operation> OperationController<O> {
    /// Create a controller bound to a repository queue. The controller only
    /// holds the queue weakly.
    #[must_use]
    pub fn new(operation: O, queue: &RepositoryQueue) -> Self {
        let owner: Weak<dyn OperationObserver> = Weak::<Unowned>::new();
        Self {
            operation: Arc::new(operation),
            cancel: CancelToken::new(),
            success_actions: Vec::new(),
            owner,
            queue: queue.downgrade(),
        }
    }

    /// Report lifecycle events to `owner` while it is alive.
    #[must_use]
    pub fn with_owner(mut self, owner: Weak<dyn OperationObserver>) -> Self {
        self.owner = owner;
        self
    }

    /// Queue an action to run if the operation succeeds. Actions run in
    /// registration order, at most once.
    pub fn on_success(&mut self, action: impl FnOnce() + Send + 'static) {
        self.success_actions.push(Box::new(action));
    }

    /// The operation's cancellation flag.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Enqueue the operation and return immediately.
    ///
    /// # Errors
    /// Returns [`Error::RepositoryClosed`] if the repository's queue is gone.
    pub fn start(self) -> Result<OperationHandle> {
        let Some(queue) = self.queue.upgrade() else {
            return Err(Error::RepositoryClosed);
        };

        let id = OperationId::next();
        let name = self.operation.name();
        let state = StateCell::new();
        let (sender, receiver) = oneshot::channel();

        let completion = Completion {
            id,
            name,
            result: OperationResult::unexpected(),
            changes_refs: self.operation.changes_refs(),
            success_actions: self.success_actions,
            owner: self.owner,
            state: Arc::clone(&state),
            sender: Some(sender),
        };

        state.set(OperationState::Started);
        tracing::info!(%id, operation = name, repo = queue.label(), "operation started");

        let operation = Arc::clone(&self.operation);
        let cancel = self.cancel.clone();
        queue.execute(move |repo| {
            let mut completion = completion;
            completion.result = perform(operation.as_ref(), repo, &cancel, &completion.state);
        })?;

        Ok(OperationHandle {
            id,
            cancel: self.cancel,
            state,
            operation: self.operation,
            receiver,
        })
    }
}

impl<O: Operation> fmt::Debug for OperationController<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationController")
            .field("operation", &self.operation.name())
            .field("success_actions", &self.success_actions.len())
            .field("canceled", &self.cancel.is_canceled())
            .finish_non_exhaustive()
    }
}

fn perform<O: Operation + ?Sized>(
    operation: &O,
    repo: &mut Repository,
    cancel: &CancelToken,
    state: &StateCell,
) -> OperationResult {
    if cancel.is_canceled() {
        return OperationResult::Canceled;
    }
    state.set(OperationState::Running);

    let outcome = operation.run(repo, cancel);
    if cancel.is_canceled() {
        return OperationResult::Canceled;
    }
    match outcome {
        Ok(()) => OperationResult::Success,
        Err(error) => OperationResult::Failure(failure_for(operation, &error)),
    }
}

fn failure_for<O: Operation + ?Sized>(operation: &O, error: &spool_git::Error) -> Failure {
    let kind = error.classify();
    let message = operation.should_report(error).then(|| {
        let mut message = operation.repo_error_message(&kind);
        if let Some(diagnostic) = error.diagnostic() {
            message.push(' ');
            message.push_str(diagnostic);
        }
        message
    });
    Failure {
        error: kind,
        message,
    }
}

/// Terminal bookkeeping, run exactly once when dropped.
struct Completion {
    id: OperationId,
    name: &'static str,
    result: OperationResult,
    changes_refs: bool,
    success_actions: Vec<SuccessAction>,
    owner: Weak<dyn OperationObserver>,
    state: Arc<StateCell>,
    sender: Option<oneshot::Sender<OperationResult>>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let result = self.result.clone();
        let actions = std::mem::take(&mut self.success_actions);
        self.state.set(result.terminal_state());

        match &result {
            OperationResult::Success => {
                tracing::info!(id = %self.id, operation = self.name, "operation succeeded");
                for action in actions {
                    // A panicking action must not skip the owner or the outcome.
                    if catch_unwind(AssertUnwindSafe(action)).is_err() {
                        tracing::warn!(
                            id = %self.id,
                            operation = self.name,
                            "success action panicked"
                        );
                    }
                }
            }
            OperationResult::Failure(failure) => {
                tracing::warn!(
                    id = %self.id,
                    operation = self.name,
                    error = ?failure.error,
                    message = failure.message.as_deref().unwrap_or(""),
                    "operation failed"
                );
                drop(actions);
            }
            OperationResult::Canceled => {
                tracing::info!(id = %self.id, operation = self.name, "operation canceled");
                drop(actions);
            }
        }

        if let Some(owner) = self.owner.upgrade() {
            if result.is_success() && self.changes_refs {
                owner.refs_changed();
            }
            owner.operation_ended(self.id, self.name, &result);
        }

        self.state.set(OperationState::Ended);
        if let Some(sender) = self.sender.take() {
            // The handle may have been dropped.
            let _ = sender.send(result);
        }
    }
}

/// Caller-side handle to a started operation.
pub struct OperationHandle {
    id: OperationId,
    cancel: CancelToken,
    state: Arc<StateCell>,
    operation: Arc<dyn Operation>,
    receiver: oneshot::Receiver<OperationResult>,
}

impl OperationHandle {
    #[must_use]
    pub const fn id(&self) -> OperationId {
        self.id
    }

    /// Request cancellation. Work that hasn't started is skipped.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    #[must_use]
    pub fn operation_name(&self) -> &'static str {
        self.operation.name()
    }

    #[must_use]
    pub fn state(&self) -> OperationState {
        self.state.get()
    }

    /// Forward to the operation's [`Operation::abort`].
    pub fn abort(&self) {
        self.operation.abort();
    }

    /// Wait for the terminal result.
    pub async fn outcome(self) -> OperationResult {
        self.receiver
            .await
            .unwrap_or_else(|_| OperationResult::unexpected())
    }

    /// Block until the terminal result. Must not be called from inside an
    /// async runtime.
    #[must_use]
    pub fn wait(self) -> OperationResult {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| OperationResult::unexpected())
    }
}

impl fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("id", &self.id)
            .field("operation", &self.operation.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
