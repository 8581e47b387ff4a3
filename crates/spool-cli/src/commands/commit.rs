//! `spool commit` command - Commit the index.

use anyhow::Result;
use spool_core::operations::Commit;
use spool_git::short_sha;

use super::{open_session, run_operation};
use crate::output;

/// Run the commit command.
pub fn run(message: &str, amend: bool) -> Result<()> {
    let session = open_session()?;
    run_operation(
        &session,
        Commit {
            message: message.to_string(),
            amend,
        },
    )?;

    let head = session
        .queue()
        .run_sync(|repo| repo.head_commit().ok().flatten().map(|c| c.id().to_string()))?;
    let verb = if amend { "Amended" } else { "Committed" };
    match head {
        Some(sha) => output::success(&format!("{verb} {}", short_sha(&sha))),
        None => output::success(verb),
    }
    Ok(())
}
