//! Hierarchical change trees.
//!
//! A change tree merges a status map with, for workspace trees, a walk of
//! the working directory. Leaves are files; directories are synthesized and
//! roll up the status of their leaves.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use spool_git::{DeltaStatus, FileChange, IgnoreCheck};

/// One node of a change tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChangeNode {
    name: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    change: Option<FileChange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<FileChangeNode>,
    #[serde(skip)]
    directory: bool,
}

impl FileChangeNode {
    /// An empty root for the repository top level.
    #[must_use]
    pub const fn root() -> Self {
        Self::directory(String::new(), String::new())
    }

    const fn directory(name: String, path: String) -> Self {
        Self {
            name,
            path,
            change: None,
            children: Vec::new(),
            directory: true,
        }
    }

    fn leaf(name: String, change: FileChange) -> Self {
        Self {
            name,
            path: change.path.clone(),
            change: Some(change),
            children: Vec::new(),
            directory: false,
        }
    }

    /// Last path segment; empty for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the repository root; empty for the root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The change recorded at this path. `None` for synthesized directories;
    /// a directory still carries one when a file at its path was replaced.
    #[must_use]
    pub const fn change(&self) -> Option<&FileChange> {
        self.change.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    #[must_use]
    pub const fn is_directory(&self) -> bool {
        self.directory
    }

    /// A file's status, or for a directory the status shared by every leaf
    /// beneath it. `None` for mixed or empty directories.
    #[must_use]
    pub fn status(&self) -> Option<DeltaStatus> {
        if self.children.is_empty() {
            return self.change.as_ref().map(|change| change.status);
        }
        let mut statuses = self.leaves().into_iter().map(|change| change.status);
        let first = statuses.next()?;
        statuses.all(|status| status == first).then_some(first)
    }

    /// Every file change beneath this node, depth-first in name order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&FileChange> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a FileChange>) {
        if let Some(change) = &self.change {
            leaves.push(change);
        }
        for child in &self.children {
            child.collect_leaves(leaves);
        }
    }

    /// Find a node by path. Paths are normalized first.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Self> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Some(self);
        }
        path.split('/').try_fold(self, |node, segment| node.child(segment))
    }

    fn child(&self, name: &str) -> Option<&Self> {
        self.children
            .binary_search_by(|child| child.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.children[index])
    }

    /// Insert a file change, creating intermediate directories. An existing
    /// node at the same path takes the new change. A change whose path runs
    /// through an existing file keeps both, so `foo` deleted next to
    /// `foo/bar.txt` added yields two leaves.
    pub fn insert(&mut self, mut change: FileChange) {
        let path = normalize_path(&change.path);
        if path.is_empty() {
            return;
        }
        change.path.clone_from(&path);

        let mut node = self;
        let mut segments = path.split('/').peekable();
        let mut prefix = String::new();
        while let Some(segment) = segments.next() {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            let is_last = segments.peek().is_none();
            let index = match node
                .children
                .binary_search_by(|child| child.name.as_str().cmp(segment))
            {
                Ok(index) => index,
                Err(index) => {
                    let child = if is_last {
                        Self::leaf(segment.to_string(), change.clone())
                    } else {
                        Self::directory(segment.to_string(), prefix.clone())
                    };
                    node.children.insert(index, child);
                    index
                }
            };

            let child = &mut node.children[index];
            if is_last {
                // A submodule or ignored directory shows as a single entry
                // unless something beneath it changed.
                if child.leaves().iter().all(|leaf| leaf.status == DeltaStatus::Unmodified) {
                    child.children.clear();
                    child.directory = false;
                }
                child.change = Some(change);
                return;
            }
            child.directory = true;
            node = child;
        }
    }

    /// Drop directories with no files beneath them.
    fn prune_empty(&mut self) {
        for child in &mut self.children {
            child.prune_empty();
        }
        self.children.retain(|child| {
            !child.directory || !child.children.is_empty() || child.change.is_some()
        });
    }
}

/// Normalize a path for comparison: `\` becomes `/`, and a leading `#/`
/// root marker, leading slashes and trailing slashes are removed.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.strip_prefix("#/").unwrap_or(&path);
    let path = if path == "#" { "" } else { path };
    path.trim_start_matches('/').trim_end_matches('/').to_string()
}

/// Builds change trees from a status map.
pub struct ChangeTreeBuilder<'a> {
    changes: BTreeMap<String, FileChange>,
    ignore: Option<&'a dyn IgnoreCheck>,
}

impl<'a> ChangeTreeBuilder<'a> {
    /// A builder over the given changes. Later entries for the same path
    /// replace earlier ones.
    pub fn new(changes: impl IntoIterator<Item = FileChange>) -> Self {
        let changes = changes
            .into_iter()
            .map(|change| (normalize_path(&change.path), change))
            .filter(|(path, _)| !path.is_empty())
            .collect();
        Self {
            changes,
            ignore: None,
        }
    }

    /// Skip walked paths this check marks as ignored.
    #[must_use]
    pub fn ignore_check(mut self, check: &'a dyn IgnoreCheck) -> Self {
        self.ignore = Some(check);
        self
    }

    /// A tree holding only the status entries.
    #[must_use]
    pub fn build_staging(self) -> FileChangeNode {
        let mut root = FileChangeNode::root();
        for change in self.changes.into_values() {
            root.insert(change);
        }
        root
    }

    /// A tree of every file under `root`, with status entries merged in.
    ///
    /// Unreadable entries are skipped; the build never fails.
    #[must_use]
    pub fn build_workspace(self, root: &Path) -> FileChangeNode {
        let mut tree = FileChangeNode::root();
        self.walk(root, "", &mut tree);
        tree.prune_empty();

        for change in self.changes.into_values() {
            tree.insert(change);
        }
        tree
    }

    fn walk(&self, dir: &Path, prefix: &str, node: &mut FileChangeNode) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), "skipping unreadable directory: {e}");
                return;
            }
        };

        let mut entries: Vec<_> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), "skipping entry: {e}");
                    None
                }
            })
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                Some((name, entry))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, entry) in entries {
            if prefix.is_empty() && name == ".git" {
                continue;
            }
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            if self.ignore.is_some_and(|check| check.is_ignored(&path)) {
                continue;
            }
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    tracing::debug!(path = %path, "skipping entry: {e}");
                    continue;
                }
            };

            if file_type.is_dir() {
                let mut child = FileChangeNode::directory(name, path.clone());
                self.walk(&entry.path(), &path, &mut child);
                node.children.push(child);
            } else {
                let change = self
                    .changes
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| FileChange::new(path, DeltaStatus::Unmodified));
                node.children.push(FileChangeNode::leaf(name, change));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use tempfile::TempDir;

    use super::*;

    struct IgnoreList(HashSet<&'static str>);

    impl IgnoreCheck for IgnoreList {
        fn is_ignored(&self, path: &str) -> bool {
            self.0.contains(path)
        }
    }

    fn change(path: &str, status: DeltaStatus) -> FileChange {
        FileChange::new(path, status)
    }

    fn child_names(node: &FileChangeNode) -> Vec<&str> {
        node.children().iter().map(FileChangeNode::name).collect()
    }

    fn workspace() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("README.md"), "readme").unwrap();
        fs::write(root.join("src/lib.rs"), "lib").unwrap();
        fs::write(root.join("src/nested/mod.rs"), "mod").unwrap();
        fs::write(root.join("target/debug/app"), "bin").unwrap();
        temp
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("#/src/lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path("/src/lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path("src\\nested\\mod.rs"), "src/nested/mod.rs");
        assert_eq!(normalize_path("target/"), "target");
        assert_eq!(normalize_path("#"), "");
    }

    #[test]
    fn test_staging_tree_synthesizes_directories() {
        let tree = ChangeTreeBuilder::new([
            change("src/b.rs", DeltaStatus::Modified),
            change("src/a.rs", DeltaStatus::Added),
            change("Cargo.toml", DeltaStatus::Modified),
        ])
        .build_staging();

        assert_eq!(child_names(&tree), vec!["Cargo.toml", "src"]);
        let src = tree.find("src").unwrap();
        assert!(src.is_directory());
        assert_eq!(src.path(), "src");
        assert_eq!(child_names(src), vec!["a.rs", "b.rs"]);
        assert_eq!(src.status(), None);
        assert_eq!(
            tree.find("src/a.rs").and_then(FileChangeNode::status),
            Some(DeltaStatus::Added)
        );
    }

    #[test]
    fn test_directory_rolls_up_common_status() {
        let tree = ChangeTreeBuilder::new([
            change("docs/a.md", DeltaStatus::Added),
            change("docs/deep/b.md", DeltaStatus::Added),
        ])
        .build_staging();

        assert_eq!(tree.find("docs").unwrap().status(), Some(DeltaStatus::Added));
        assert_eq!(tree.status(), Some(DeltaStatus::Added));
    }

    #[test]
    fn test_every_status_path_appears_once() {
        let changes = vec![
            change("a/b/c.txt", DeltaStatus::Modified),
            change("#/a/d.txt", DeltaStatus::Deleted),
            change("/e.txt", DeltaStatus::Untracked),
            change("a\\b\\f.txt", DeltaStatus::Added),
        ];
        let tree = ChangeTreeBuilder::new(changes).build_staging();

        let mut paths: Vec<&str> = tree.leaves().into_iter().map(|c| c.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["a/b/c.txt", "a/b/f.txt", "a/d.txt", "e.txt"]);
    }

    #[test]
    fn test_workspace_walk_merges_status() {
        let temp = workspace();
        let tree = ChangeTreeBuilder::new([
            change("src/lib.rs", DeltaStatus::Modified),
            change("deleted.txt", DeltaStatus::Deleted),
        ])
        .build_workspace(temp.path());

        assert_eq!(
            child_names(&tree),
            vec!["README.md", "deleted.txt", "src", "target"]
        );
        assert_eq!(
            tree.find("README.md").unwrap().status(),
            Some(DeltaStatus::Unmodified)
        );
        assert_eq!(
            tree.find("src/lib.rs").unwrap().status(),
            Some(DeltaStatus::Modified)
        );
        assert_eq!(
            tree.find("deleted.txt").unwrap().status(),
            Some(DeltaStatus::Deleted)
        );
        assert!(tree.find("src/nested/mod.rs").is_some());
        assert!(tree.find(".git").is_none());
        assert!(tree.find("empty").is_none());
    }

    #[test]
    fn test_ignored_paths_are_skipped() {
        let temp = workspace();
        let ignore = IgnoreList(HashSet::from(["target"]));
        let tree = ChangeTreeBuilder::new(Vec::new())
            .ignore_check(&ignore)
            .build_workspace(temp.path());

        assert!(tree.find("target").is_none());
        assert!(tree.leaves().into_iter().all(|c| !c.path.starts_with("target")));
    }

    #[test]
    fn test_ignored_entries_listed_when_requested() {
        let temp = workspace();
        let ignore = IgnoreList(HashSet::from(["target"]));
        let tree = ChangeTreeBuilder::new([change("target/", DeltaStatus::Ignored)])
            .ignore_check(&ignore)
            .build_workspace(temp.path());

        let target = tree.find("target").unwrap();
        assert!(!target.is_directory());
        assert_eq!(target.status(), Some(DeltaStatus::Ignored));
    }

    #[test]
    fn test_insert_replaces_existing_status() {
        let mut tree = ChangeTreeBuilder::new([change("a.txt", DeltaStatus::Unmodified)])
            .build_staging();
        tree.insert(change("a.txt", DeltaStatus::Modified));

        assert_eq!(tree.children().len(), 1);
        assert_eq!(tree.find("a.txt").unwrap().status(), Some(DeltaStatus::Modified));
    }

    #[test]
    fn test_file_replaced_by_directory_keeps_both_entries() {
        let tree = ChangeTreeBuilder::new([
            change("foo", DeltaStatus::Deleted),
            change("foo/bar.txt", DeltaStatus::Added),
        ])
        .build_staging();

        let foo = tree.find("foo").unwrap();
        assert!(foo.is_directory());
        assert_eq!(foo.change().map(|c| c.status), Some(DeltaStatus::Deleted));
        assert_eq!(
            tree.find("foo/bar.txt").and_then(FileChangeNode::status),
            Some(DeltaStatus::Added)
        );

        let paths: Vec<&str> = tree.leaves().into_iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["foo", "foo/bar.txt"]);
        assert_eq!(foo.status(), None);
    }

    #[test]
    fn test_deleted_file_keeps_new_subtree_in_any_order() {
        let mut tree = ChangeTreeBuilder::new([change("foo/bar.txt", DeltaStatus::Untracked)])
            .build_staging();
        tree.insert(change("foo", DeltaStatus::Deleted));

        let mut paths: Vec<&str> = tree.leaves().into_iter().map(|c| c.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["foo", "foo/bar.txt"]);
    }

    #[test]
    fn test_workspace_keeps_deleted_file_under_new_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("foo")).unwrap();
        fs::write(temp.path().join("foo/bar.txt"), "bar").unwrap();

        let tree = ChangeTreeBuilder::new([
            change("foo", DeltaStatus::Deleted),
            change("foo/bar.txt", DeltaStatus::Untracked),
        ])
        .build_workspace(temp.path());

        let foo = tree.find("foo").unwrap();
        assert_eq!(foo.change().map(|c| c.status), Some(DeltaStatus::Deleted));
        assert_eq!(
            tree.find("foo/bar.txt").and_then(FileChangeNode::status),
            Some(DeltaStatus::Untracked)
        );
        assert_eq!(tree.leaves().len(), 2);
    }

    #[test]
    fn test_unchanged_directory_collapses_to_single_entry() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("vendor/lib")).unwrap();
        fs::write(temp.path().join("vendor/lib/a.c"), "a").unwrap();

        let tree = ChangeTreeBuilder::new([change("vendor/lib", DeltaStatus::Modified)])
            .build_workspace(temp.path());

        let lib = tree.find("vendor/lib").unwrap();
        assert!(!lib.is_directory());
        assert!(lib.children().is_empty());
        assert_eq!(lib.status(), Some(DeltaStatus::Modified));
    }

    #[test]
    fn test_missing_root_gives_empty_tree() {
        let temp = TempDir::new().unwrap();
        let tree = ChangeTreeBuilder::new(Vec::new()).build_workspace(&temp.path().join("gone"));
        assert!(tree.children().is_empty());
        assert_eq!(tree.status(), None);
    }
}
