//! Spool CLI - queued git commands with change trees and blame.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{Cli, Commands};

/// Logs go to stderr so `--json` output stays clean.
///
/// `SPOOL_LOG` takes the usual filter syntax; `--verbose` forces debug.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SPOOL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Status { json, ignored } => commands::status::run(json, ignored),
        Commands::Tree { json, ignored, amend } => commands::status::run_tree(json, ignored, amend),
        Commands::Blame { path, staged, rev, json } => {
            commands::blame::run(&path, staged, rev.as_deref(), json)
        }
        Commands::Stage { paths, all } => commands::stage::run_stage(paths, all),
        Commands::Unstage { paths } => commands::stage::run_unstage(paths),
        Commands::Apply { patch } => commands::stage::run_apply(&patch),
        Commands::Commit { message, amend } => commands::commit::run(&message, amend),
        Commands::Branch { command } => commands::branch::run(command),
        Commands::Checkout { branch } => commands::branch::run_checkout(&branch),
        Commands::Tag { command } => commands::tag::run(command),
        Commands::Stash { command } => commands::stash::run(command),
        Commands::Fetch { remote } => commands::remote::run_fetch(remote),
        Commands::Push { remote, branch, force } => {
            commands::remote::run_push(remote, branch, force)
        }
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
