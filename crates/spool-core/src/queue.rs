//! Serialized command execution for one repository.
//!
//! A [`RepositoryQueue`] owns the live [`Repository`] on a dedicated thread
//! and runs submitted jobs one at a time, in submission order. Every
//! mutating command goes through it, so at most one job touches repository
//! state at any moment. Separate repositories get separate queues and run
//! in parallel.
//!
//! The thread exits once every strong handle is dropped and the remaining
//! jobs have drained.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};

use spool_git::Repository;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce(&mut Repository) + Send>;

#[derive(Debug, Default)]
struct QueueStatus {
    pending: AtomicUsize,
    writing: AtomicBool,
}

/// Strong handle to a repository's command queue.
#[derive(Debug, Clone)]
pub struct RepositoryQueue {
    sender: mpsc::UnboundedSender<Job>,
    status: Arc<QueueStatus>,
    label: Arc<str>,
}

impl RepositoryQueue {
    /// Open the repository at `path` and start its queue.
    ///
    /// # Errors
    /// Returns error if the repository can't be opened or the queue thread
    /// can't be spawned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Repository::open(path)?)
    }

    /// Start a queue that takes ownership of `repo`.
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] if the queue thread can't be spawned.
    pub fn new(repo: Repository) -> Result<Self> {
        let label: Arc<str> = repo
            .workdir()
            .unwrap_or_else(|| repo.git_dir())
            .display()
            .to_string()
            .into();
        let (sender, receiver) = mpsc::unbounded_channel();
        let status = Arc::new(QueueStatus::default());

        let thread_status = Arc::clone(&status);
        let thread_label = Arc::clone(&label);
        std::thread::Builder::new()
            .name("spool-repo-queue".to_string())
            .spawn(move || drain(repo, receiver, &thread_status, &thread_label))
            .map_err(Error::Spawn)?;

        tracing::debug!(repo = %label, "started repository queue");
        Ok(Self {
            sender,
            status,
            label,
        })
    }

    /// Enqueue a job without waiting for it.
    ///
    /// # Errors
    /// Returns [`Error::RepositoryClosed`] if the queue thread is gone.
    pub fn execute(&self, job: impl FnOnce(&mut Repository) + Send + 'static) -> Result<()> {
        self.status.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(Box::new(job)).is_err() {
            self.status.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::RepositoryClosed);
        }
        Ok(())
    }

    /// Enqueue a job and get a handle to its return value.
    ///
    /// # Errors
    /// Returns [`Error::RepositoryClosed`] if the queue thread is gone.
    pub fn submit<T, F>(&self, job: F) -> Result<QueueTask<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Repository) -> T + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        self.execute(move |repo| {
            // The caller may have stopped waiting.
            let _ = sender.send(job(repo));
        })?;
        Ok(QueueTask { receiver })
    }

    /// Run a job and block until it returns.
    ///
    /// Intended for synchronous callers. Must not be called from a job on
    /// this queue or from inside an async runtime.
    ///
    /// # Errors
    /// Returns [`Error::RepositoryClosed`] if the queue is gone and
    /// [`Error::QueueClosed`] if the job panicked.
    pub fn run_sync<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Repository) -> T + Send + 'static,
    {
        self.submit(job)?.wait()
    }

    /// Whether a job is currently running.
    #[must_use]
    pub fn is_writing(&self) -> bool {
        self.status.writing.load(Ordering::SeqCst)
    }

    /// Number of jobs queued or running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.status.pending.load(Ordering::SeqCst)
    }

    /// Display label (the repository's working directory).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// A handle that doesn't keep the queue alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakRepositoryQueue {
        WeakRepositoryQueue {
            sender: self.sender.downgrade(),
            status: Arc::clone(&self.status),
            label: Arc::clone(&self.label),
        }
    }
}

/// Weak handle to a repository's command queue.
#[derive(Debug, Clone)]
pub struct WeakRepositoryQueue {
    sender: mpsc::WeakUnboundedSender<Job>,
    status: Arc<QueueStatus>,
    label: Arc<str>,
}

impl WeakRepositoryQueue {
    /// The strong handle, if any strong handle is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<RepositoryQueue> {
        self.sender.upgrade().map(|sender| RepositoryQueue {
            sender,
            status: Arc::clone(&self.status),
            label: Arc::clone(&self.label),
        })
    }
}

/// Pending result of a submitted job.
///
/// Await it from async code or call [`QueueTask::wait`] from sync code.
#[derive(Debug)]
pub struct QueueTask<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> QueueTask<T> {
    /// Block until the job finishes.
    ///
    /// # Errors
    /// Returns [`Error::QueueClosed`] if the job was dropped or panicked.
    pub fn wait(self) -> Result<T> {
        self.receiver.blocking_recv().map_err(|_| Error::QueueClosed)
    }
}

impl<T> Future for QueueTask<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| Error::QueueClosed))
    }
}

fn drain(
    mut repo: Repository,
    mut receiver: mpsc::UnboundedReceiver<Job>,
    status: &QueueStatus,
    label: &str,
) {
    while let Some(job) = receiver.blocking_recv() {
        status.writing.store(true, Ordering::SeqCst);
        let outcome = catch_unwind(AssertUnwindSafe(|| job(&mut repo)));
        status.writing.store(false, Ordering::SeqCst);
        status.pending.fetch_sub(1, Ordering::SeqCst);

        if outcome.is_err() {
            tracing::warn!(repo = label, "repository job panicked");
        }
    }
    tracing::debug!(repo = label, "repository queue stopped");
}
