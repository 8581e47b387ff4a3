//! `spool fetch` and `spool push` - Talk to remotes.
//!
//! Network operations can take a while, so Ctrl-C cancels the running
//! operation instead of killing the process mid-transfer.

use std::sync::Arc;

use anyhow::{Context, Result};
use spool_core::operations::{Fetch, Push};
use spool_core::{Operation, OperationController, OperationResult, Session};

use super::{finish, open_session};
use crate::output;

/// Run the fetch command.
pub fn run_fetch(remote: Option<String>) -> Result<()> {
    let session = open_session()?;
    let remote = remote.unwrap_or_else(|| session.config().remote.default_remote.clone());

    output::info(&format!("Fetching from {remote}..."));
    let fetch = Fetch {
        remote: remote.clone(),
    };
    finish(run_cancelable(&session, fetch)?)?;
    output::success(&format!("Fetched {remote}"));
    Ok(())
}

/// Run the push command.
pub fn run_push(remote: Option<String>, branch: Option<String>, force: bool) -> Result<()> {
    let session = open_session()?;
    let remote = remote.unwrap_or_else(|| session.config().remote.default_remote.clone());
    let target = branch.clone().unwrap_or_else(|| "current branch".to_string());

    output::info(&format!("Pushing {target} to {remote}..."));
    let push = Push {
        remote: remote.clone(),
        branch,
        force,
    };
    finish(run_cancelable(&session, push)?)?;
    output::success(&format!("Pushed {target} to {remote}"));
    Ok(())
}

/// Start an operation and wait for it, canceling on Ctrl-C.
fn run_cancelable<O: Operation>(session: &Arc<Session>, operation: O) -> Result<OperationResult> {
    let controller = OperationController::new(operation, session.queue());
    let cancel = controller.cancel_token();
    let handle = session.start_controller(controller)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    Ok(runtime.block_on(async move {
        let outcome = handle.outcome();
        tokio::pin!(outcome);

        tokio::select! {
            result = &mut outcome => result,
            _ = tokio::signal::ctrl_c() => {
                output::warn("Canceling...");
                cancel.cancel();
                outcome.await
            }
        }
    }))
}
