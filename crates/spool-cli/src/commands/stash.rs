//! `spool stash` command - Save, apply and drop stashes.

use anyhow::Result;
use colored::Colorize;
use spool_core::operations::{ApplyStash, DropStash, PopStash, SaveStash};

use super::{StashCommand, open_session, run_operation};
use crate::output;

/// Run the stash command; lists stashes without a subcommand.
pub fn run(command: Option<StashCommand>) -> Result<()> {
    let session = open_session()?;

    match command {
        None => {
            let stashes = session.queue().run_sync(|repo| repo.stashes())??;
            if stashes.is_empty() {
                output::info("No stashes");
            }
            for stash in &stashes {
                output::essential(&format!(
                    "{} {}",
                    format!("stash@{{{}}}", stash.index).cyan(),
                    stash.message
                ));
            }
        }
        Some(StashCommand::Save {
            message,
            keep_index,
            tracked_only,
            include_ignored,
        }) => {
            let include_untracked = !tracked_only && session.config().stash.include_untracked;
            run_operation(
                &session,
                SaveStash {
                    message,
                    keep_index,
                    include_untracked,
                    include_ignored,
                },
            )?;
            output::success("Saved local changes");
        }
        Some(StashCommand::Apply { index }) => {
            run_operation(&session, ApplyStash { index })?;
            output::success(&format!("Applied stash@{{{index}}}"));
        }
        Some(StashCommand::Pop { index }) => {
            run_operation(&session, PopStash { index })?;
            output::success(&format!("Popped stash@{{{index}}}"));
        }
        Some(StashCommand::Drop { index }) => {
            run_operation(&session, DropStash { index })?;
            output::success(&format!("Dropped stash@{{{index}}}"));
        }
    }
    Ok(())
}
