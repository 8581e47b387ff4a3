//! `spool blame` command - Show line authorship for a file.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use spool_core::StagingSelection;
use spool_git::{Blame, BlameHunk, short_sha};

use super::{open_session_with_workdir, repo_relative};
use crate::output;

/// Run the blame command.
pub fn run(path: &Path, staged: bool, rev: Option<&str>, json: bool) -> Result<()> {
    let (session, workdir) = open_session_with_workdir()?;
    let path = repo_relative(&workdir, path)?;

    let blame = if let Some(rev) = rev {
        let rev = rev.to_string();
        let from = session
            .queue()
            .run_sync(move |repo| repo.resolve_revision(&rev))??;
        session.blame_history(&path, Some(from))?
    } else {
        let selection = StagingSelection {
            amending: false,
            show_ignored: session.config().workspace.show_ignored,
        };
        let list = if staged {
            selection.index_list()
        } else {
            selection.workspace_list()
        };
        tracing::debug!(path = %path, list = list.title(), "blaming");
        session.blame(list, &path)?
    };

    if json {
        output::essential(&serde_json::to_string_pretty(&blame)?);
        return Ok(());
    }

    print_blame(&path, &blame);
    Ok(())
}

fn print_blame(path: &str, blame: &Blame) {
    println!();
    println!("  {} ({} lines)", path.bold(), blame.line_count());
    output::hr();
    for hunk in blame.hunks() {
        println!("  {}", hunk_line(hunk));
    }
}

/// One summary line per hunk: id, author, date and final line range.
fn hunk_line(hunk: &BlameHunk) -> String {
    let first = hunk.final_line.start;
    let last = first + hunk.line_count().saturating_sub(1);
    let range = if first == last {
        format!("{first}")
    } else {
        format!("{first}-{last}")
    };

    if hunk.is_local() {
        return format!(
            "{} {:<20} {} {}",
            "------".yellow(),
            "Not committed yet".yellow(),
            " ".repeat(10),
            range
        );
    }

    let sha = hunk.oid().to_string();
    let signature = &hunk.final_line.signature;
    format!(
        "{} {:<20} {} {}",
        short_sha(&sha).cyan(),
        signature.name,
        signature.when.format("%Y-%m-%d").to_string().dimmed(),
        range
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serial_test::serial;
    use spool_git::{LineInfo, Oid, Signature};

    use super::*;

    fn hunk(oid: Oid, start: usize, count: usize) -> BlameHunk {
        let line = LineInfo {
            oid,
            start,
            signature: Signature::now("Alice", "alice@example.com"),
        };
        BlameHunk::new(count, line.clone(), line)
    }

    #[test]
    #[serial]
    fn test_hunk_line_committed() {
        colored::control::set_override(false);
        let oid = Oid::from_str("abcdef1234567890abcdef1234567890abcdef12").unwrap();

        let line = hunk_line(&hunk(oid, 3, 4));
        assert!(line.starts_with("abcdef Alice"));
        assert!(line.ends_with("3-6"));
    }

    #[test]
    #[serial]
    fn test_hunk_line_local_single() {
        colored::control::set_override(false);

        let line = hunk_line(&hunk(Oid::zero(), 7, 1));
        assert!(line.contains("Not committed yet"));
        assert!(line.ends_with(" 7"));
    }
}
