//! `spool stage`, `spool unstage` and `spool apply` - Move changes in and
//! out of the index.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use spool_core::operations::{ApplyPatch, Stage, StageAll, Unstage};

use super::{open_session, open_session_with_workdir, repo_relative, run_operation};
use crate::output;

/// Run the stage command.
pub fn run_stage(paths: Vec<String>, all: bool) -> Result<()> {
    if all {
        let session = open_session()?;
        run_operation(&session, StageAll)?;
        output::success("Staged all changes");
        return Ok(());
    }

    let (session, workdir) = open_session_with_workdir()?;
    let paths = resolve(&workdir, &paths)?;
    let count = paths.len();
    run_operation(&session, Stage { paths })?;
    output::success(&format!("Staged {count} {}", plural(count)));
    Ok(())
}

/// Run the unstage command.
pub fn run_unstage(paths: Vec<String>) -> Result<()> {
    let (session, workdir) = open_session_with_workdir()?;
    let paths = resolve(&workdir, &paths)?;
    let count = paths.len();
    run_operation(&session, Unstage { paths })?;
    output::success(&format!("Unstaged {count} {}", plural(count)));
    Ok(())
}

/// Run the apply command.
pub fn run_apply(patch: &Path) -> Result<()> {
    let patch = fs::read_to_string(patch)
        .with_context(|| format!("Cannot read patch '{}'", patch.display()))?;
    let session = open_session()?;
    run_operation(&session, ApplyPatch { patch })?;
    output::success("Applied patch to the index");
    Ok(())
}

fn resolve(workdir: &Path, paths: &[String]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| repo_relative(workdir, Path::new(path)))
        .collect()
}

const fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
