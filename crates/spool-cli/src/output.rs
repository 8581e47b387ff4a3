//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use spool_core::FileChangeNode;
use spool_git::DeltaStatus;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results that should be available for piping, like JSON.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}

/// Colored one-letter status marker.
#[must_use]
pub fn status_marker(status: DeltaStatus) -> String {
    let marker = status.marker().to_string();
    match status {
        DeltaStatus::Added | DeltaStatus::Copied => marker.green().to_string(),
        DeltaStatus::Deleted | DeltaStatus::Conflicted | DeltaStatus::Unreadable => {
            marker.red().to_string()
        }
        DeltaStatus::Modified | DeltaStatus::Renamed | DeltaStatus::TypeChange => {
            marker.yellow().to_string()
        }
        DeltaStatus::Untracked => marker.cyan().to_string(),
        DeltaStatus::Ignored | DeltaStatus::Unmodified => marker.dimmed().to_string(),
    }
}

/// Get a colored branch name with current indicator.
#[must_use]
pub fn branch_name(name: &str, is_current: bool) -> String {
    if is_current {
        format!("{} {}", "▶".cyan(), name.cyan().bold())
    } else {
        format!("  {name}")
    }
}

/// Indented lines for a change tree, root excluded. Directories end with
/// `/`; files carry their status marker.
#[must_use]
pub fn tree_lines(root: &FileChangeNode) -> Vec<String> {
    let mut lines = Vec::new();
    for child in root.children() {
        push_tree_lines(child, 0, &mut lines);
    }
    lines
}

fn push_tree_lines(node: &FileChangeNode, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    // A replaced file shows beside the directory now at its path.
    if let Some(change) = node.change() {
        lines.push(format!("{} {indent}{}", status_marker(change.status), node.name()));
    }
    if node.is_directory() {
        lines.push(format!("  {indent}{}/", node.name().bold()));
        for child in node.children() {
            push_tree_lines(child, depth + 1, lines);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serial_test::serial;
    use spool_core::ChangeTreeBuilder;
    use spool_git::FileChange;

    use super::*;

    #[test]
    #[serial]
    fn test_status_marker_colors() {
        colored::control::set_override(true);

        assert_eq!(status_marker(DeltaStatus::Added), "A".green().to_string());
        assert_eq!(status_marker(DeltaStatus::Deleted), "D".red().to_string());
        assert_eq!(status_marker(DeltaStatus::Modified), "M".yellow().to_string());
        assert_eq!(status_marker(DeltaStatus::Untracked), "?".cyan().to_string());

        colored::control::set_override(false);
    }

    #[test]
    #[serial]
    fn test_tree_lines_nest_directories() {
        colored::control::set_override(false);

        let root = ChangeTreeBuilder::new([
            FileChange::new("src/lib.rs", DeltaStatus::Modified),
            FileChange::new("README.md", DeltaStatus::Added),
        ])
        .build_staging();

        assert_eq!(tree_lines(&root), vec!["A README.md", "  src/", "M   lib.rs"]);
    }

    #[test]
    #[serial]
    fn test_tree_lines_show_replaced_file_and_directory() {
        colored::control::set_override(false);

        let root = ChangeTreeBuilder::new([
            FileChange::new("foo", DeltaStatus::Deleted),
            FileChange::new("foo/bar.txt", DeltaStatus::Added),
        ])
        .build_staging();

        assert_eq!(tree_lines(&root), vec!["D foo", "  foo/", "A   bar.txt"]);
    }

    #[test]
    fn test_tree_lines_empty_root() {
        assert!(tree_lines(&FileChangeNode::root()).is_empty());
    }

    #[test]
    fn test_branch_name_current() {
        let name = branch_name("feature/test", true);
        assert!(name.contains("feature/test"));
        assert!(name.contains('▶'));
    }

    #[test]
    fn test_branch_name_not_current() {
        let name = branch_name("feature/test", false);
        assert!(name.contains("feature/test"));
        assert!(!name.contains('▶'));
    }

    #[test]
    #[serial]
    fn test_quiet_mode_toggle() {
        set_quiet(true);
        assert!(is_quiet());
        set_quiet(false);
        assert!(!is_quiet());
    }
}
