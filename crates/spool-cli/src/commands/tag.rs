//! `spool tag` command - List, create and delete tags.

use anyhow::Result;
use colored::Colorize;
use spool_core::operations::{CreateTag, DeleteTag};
use spool_git::{Tag, short_sha};

use super::{TagCommand, open_session, run_operation};
use crate::output;

/// Run the tag command; lists tags without a subcommand.
pub fn run(command: Option<TagCommand>) -> Result<()> {
    let session = open_session()?;

    match command {
        None => {
            let tags = session.queue().run_sync(|repo| repo.tags())??;
            for tag in &tags {
                output::essential(&tag_line(tag));
            }
        }
        Some(TagCommand::Create {
            name,
            target,
            message,
        }) => {
            let kind = if message.is_some() { "annotated tag" } else { "tag" };
            let summary = format!("Created {kind} '{name}' at {target}");
            run_operation(
                &session,
                CreateTag {
                    name,
                    target,
                    message,
                },
            )?;
            output::success(&summary);
        }
        Some(TagCommand::Delete { name }) => {
            let summary = format!("Deleted tag '{name}'");
            run_operation(&session, DeleteTag { name })?;
            output::success(&summary);
        }
    }
    Ok(())
}

fn tag_line(tag: &Tag) -> String {
    let target = tag.target().to_string();
    let mut line = format!("{} {}", short_sha(&target).cyan(), tag.name());
    if let Some(message) = tag.message() {
        let subject = message.lines().next().unwrap_or_default();
        line.push_str(&format!("  {}", subject.dimmed()));
    }
    if tag.is_signed() {
        line.push_str(&format!(" {}", "(signed)".green()));
    }
    line
}
