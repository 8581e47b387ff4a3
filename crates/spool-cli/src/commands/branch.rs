//! `spool branch` and `spool checkout` - Manage local branches.

use anyhow::Result;
use spool_core::operations::{CheckOutRemote, Checkout, CreateBranch, DeleteBranch};

use super::{BranchCommand, open_session, run_operation};
use crate::output;

/// Run the branch command; lists branches without a subcommand.
pub fn run(command: Option<BranchCommand>) -> Result<()> {
    let session = open_session()?;

    match command {
        None => {
            let (branches, current) = session.queue().run_sync(|repo| {
                let current = repo.current_branch().ok();
                repo.list_branches().map(|branches| (branches, current))
            })??;
            for branch in &branches {
                let is_current = current.as_deref() == Some(branch.as_str());
                output::essential(&output::branch_name(branch, is_current));
            }
        }
        Some(BranchCommand::Create { name, from, checkout }) => {
            let message = format!("Created branch '{name}'");
            run_operation(
                &session,
                CreateBranch {
                    name,
                    target: from,
                    checkout,
                },
            )?;
            output::success(&message);
        }
        Some(BranchCommand::Track {
            remote_branch,
            name,
            checkout,
        }) => {
            let operation = CheckOutRemote {
                remote_branch,
                name,
                checkout,
            };
            let message = format!(
                "Branch '{}' tracks '{}'",
                operation.local_name(),
                operation.remote_branch
            );
            run_operation(&session, operation)?;
            output::success(&message);
        }
        Some(BranchCommand::Delete { name }) => {
            let message = format!("Deleted branch '{name}'");
            run_operation(&session, DeleteBranch { name })?;
            output::success(&message);
        }
    }
    Ok(())
}

/// Run the checkout command.
pub fn run_checkout(branch: &str) -> Result<()> {
    let session = open_session()?;
    run_operation(
        &session,
        Checkout {
            branch: branch.to_string(),
        },
    )?;
    output::success(&format!("Switched to branch '{branch}'"));
    Ok(())
}
