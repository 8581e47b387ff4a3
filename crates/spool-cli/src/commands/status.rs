//! `spool status` and `spool tree` - Show staged and unstaged changes.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use spool_core::{FileChangeNode, FileList, StagingSelection};
use spool_git::{FileChange, Repository};

use super::open_session;
use crate::output;

/// Run the status command.
pub fn run(json: bool, ignored: bool) -> Result<()> {
    let session = open_session()?;
    let show_ignored = ignored || session.config().workspace.show_ignored;

    let (branch, staged, unstaged) = session.queue().run_sync(move |repo| {
        let branch = current_branch(repo);
        let staged = FileList::Index.changes(&*repo)?;
        let unstaged = FileList::Workspace { show_ignored }.changes(&*repo)?;
        Ok::<_, spool_core::Error>((branch, staged, unstaged))
    })??;

    if json {
        let output = StatusOutput {
            branch,
            staged,
            unstaged,
        };
        output::essential(&serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match &branch {
        Some(name) => output::info(&format!("On branch {}", name.cyan().bold())),
        None => output::warn("HEAD is detached"),
    }

    if staged.is_empty() && unstaged.is_empty() {
        output::success("Nothing to commit, working tree clean");
        return Ok(());
    }

    print_section(FileList::Index.title(), &staged);
    print_section(FileList::Workspace { show_ignored }.title(), &unstaged);
    Ok(())
}

/// Run the tree command.
pub fn run_tree(json: bool, ignored: bool, amend: bool) -> Result<()> {
    let session = open_session()?;
    let selection = StagingSelection {
        amending: amend,
        show_ignored: ignored || session.config().workspace.show_ignored,
    };
    let (index, workspace) = session.staging_trees(selection)?;

    if json {
        let output = TreeOutput {
            index: &index,
            workspace: &workspace,
        };
        output::essential(&serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_tree(selection.index_list().title(), &index);
    print_tree(selection.workspace_list().title(), &workspace);
    Ok(())
}

fn current_branch(repo: &Repository) -> Option<String> {
    match repo.head_detached() {
        Ok(false) => repo.current_branch().ok(),
        _ => None,
    }
}

fn print_section(title: &str, changes: &[FileChange]) {
    if changes.is_empty() {
        return;
    }
    println!();
    println!("  {}", title.bold());
    output::hr();
    for change in changes {
        let renamed = change
            .old_path
            .as_ref()
            .map(|old| format!(" ← {}", old.dimmed()))
            .unwrap_or_default();
        println!("  {} {}{renamed}", output::status_marker(change.status), change.path);
    }
}

fn print_tree(title: &str, root: &FileChangeNode) {
    println!();
    println!("  {}", title.bold());
    output::hr();
    let lines = output::tree_lines(root);
    if lines.is_empty() {
        output::detail(&format!("  {}", "(empty)".dimmed()));
    }
    for line in lines {
        println!("  {line}");
    }
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    branch: Option<String>,
    staged: Vec<FileChange>,
    unstaged: Vec<FileChange>,
}

#[derive(Debug, Serialize)]
struct TreeOutput<'a> {
    index: &'a FileChangeNode,
    workspace: &'a FileChangeNode,
}
