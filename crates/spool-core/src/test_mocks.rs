//! Test doubles shared by spool-core's unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use spool_git::{
    Blame, Commit, CommitLookup, FileChange, IgnoreCheck, Oid, RepoError, RepoStore, Repository,
    Result as GitResult, Signature,
};
use tempfile::TempDir;

use crate::file_list::FileList;
use crate::operation::{OperationId, OperationObserver, OperationResult};

/// A repository with one commit of `README.md`.
pub fn init_test_repo() -> (TempDir, Repository) {
    let temp = TempDir::new().unwrap();
    let repo = git2::Repository::init(temp.path()).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        fs::write(temp.path().join("README.md"), "# Test\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = repo.signature().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
    }
    drop(repo);

    let repo = Repository::open(temp.path()).unwrap();
    (temp, repo)
}

/// Observer that records every notification.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    ended: Mutex<Vec<(OperationId, OperationResult)>>,
    refs_changed: AtomicUsize,
}

impl RecordingObserver {
    pub fn ended(&self) -> Vec<(OperationId, OperationResult)> {
        self.ended.lock().unwrap().clone()
    }

    pub fn refs_changed_count(&self) -> usize {
        self.refs_changed.load(Ordering::SeqCst)
    }
}

impl OperationObserver for RecordingObserver {
    fn operation_ended(&self, id: OperationId, _name: &'static str, result: &OperationResult) {
        self.ended.lock().unwrap().push((id, result.clone()));
    }

    fn refs_changed(&self) {
        self.refs_changed.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory `RepoStore`.
#[derive(Default)]
pub struct MockRepoStore {
    workdir: Option<PathBuf>,
    staged: Vec<FileChange>,
    amending: Vec<FileChange>,
    unstaged: Vec<FileChange>,
    ignored: Vec<FileChange>,
    ignored_paths: HashSet<String>,
    files: HashMap<String, Vec<u8>>,
    staged_files: HashMap<String, Vec<u8>>,
    diffs: HashMap<(&'static str, String), String>,
    commits: HashMap<Oid, Commit>,
    blame_output: String,
    blamed: RefCell<Vec<Vec<u8>>>,
}

impl MockRepoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workdir(mut self, path: &Path) -> Self {
        self.workdir = Some(path.to_path_buf());
        self
    }

    pub fn with_staged(mut self, change: FileChange) -> Self {
        self.staged.push(change);
        self
    }

    pub fn with_amending(mut self, change: FileChange) -> Self {
        self.amending.push(change);
        self
    }

    pub fn with_unstaged(mut self, change: FileChange) -> Self {
        self.unstaged.push(change);
        self
    }

    /// An ignored entry, listed only when ignored files are requested.
    pub fn with_ignored(mut self, change: FileChange) -> Self {
        self.ignored.push(change);
        self
    }

    pub fn with_ignored_path(mut self, path: &str) -> Self {
        self.ignored_paths.insert(path.to_string());
        self
    }

    pub fn with_file(mut self, path: &str, data: &[u8]) -> Self {
        self.files.insert(path.to_string(), data.to_vec());
        self
    }

    pub fn with_staged_file(mut self, path: &str, data: &[u8]) -> Self {
        self.staged_files.insert(path.to_string(), data.to_vec());
        self
    }

    pub fn with_diff(mut self, list: FileList, path: &str, diff: &str) -> Self {
        self.diffs
            .insert((list.title(), path.to_string()), diff.to_string());
        self
    }

    /// A commit with the given id and fixed test signatures.
    pub fn with_commit(mut self, id: Oid) -> Self {
        let author = Signature::now("Author", "author@example.com");
        let committer = Signature::now("Committer", "committer@example.com");
        self.commits.insert(
            id,
            Commit {
                id,
                parent_ids: Vec::new(),
                message: "test commit".into(),
                author,
                committer,
                tree_id: Oid::zero(),
            },
        );
        self
    }

    /// Porcelain text returned by every blame call.
    pub fn with_blame(mut self, porcelain: &str) -> Self {
        self.blame_output = porcelain.to_string();
        self
    }

    /// Contents passed to `blame_contents`, in call order.
    pub fn blamed_contents(&self) -> Vec<Vec<u8>> {
        self.blamed.borrow().clone()
    }

    fn diff(&self, list: FileList, path: &str) -> Option<String> {
        self.diffs.get(&(list.title(), path.to_string())).cloned()
    }
}

impl CommitLookup for MockRepoStore {
    fn find_commit(&self, oid: Oid) -> Option<Commit> {
        self.commits.get(&oid).cloned()
    }

    fn default_signature(&self) -> Signature {
        Signature::now("Local User", "local@localhost")
    }
}

impl IgnoreCheck for MockRepoStore {
    fn is_ignored(&self, path: &str) -> bool {
        self.ignored_paths.contains(path)
    }
}

impl RepoStore for MockRepoStore {
    fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    fn staged_changes(&self) -> GitResult<Vec<FileChange>> {
        Ok(self.staged.clone())
    }

    fn amending_staged_changes(&self) -> GitResult<Vec<FileChange>> {
        Ok(self.amending.clone())
    }

    fn unstaged_changes(&self, show_ignored: bool) -> GitResult<Vec<FileChange>> {
        let mut changes = self.unstaged.clone();
        if show_ignored {
            changes.extend(self.ignored.iter().cloned());
        }
        Ok(changes)
    }

    fn contents_of_file(&self, path: &str) -> GitResult<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| RepoError::FileNotFound(path.into()).into())
    }

    fn contents_of_staged_file(&self, path: &str) -> GitResult<Vec<u8>> {
        self.staged_files
            .get(path)
            .cloned()
            .ok_or_else(|| RepoError::FileNotFound(path.into()).into())
    }

    fn staged_diff(&self, path: &str) -> GitResult<Option<String>> {
        Ok(self.diff(FileList::Index, path))
    }

    fn amending_staged_diff(&self, path: &str) -> GitResult<Option<String>> {
        Ok(self.diff(FileList::AmendingIndex, path))
    }

    fn unstaged_diff(&self, path: &str) -> GitResult<Option<String>> {
        Ok(self.diff(FileList::Workspace { show_ignored: false }, path))
    }

    fn blame(&self, _path: &str, _from: Option<Oid>) -> GitResult<Blame> {
        Ok(Blame::parse(&self.blame_output, self))
    }

    fn blame_contents(&self, _path: &str, data: &[u8]) -> GitResult<Blame> {
        self.blamed.borrow_mut().push(data.to_vec());
        Ok(Blame::parse(&self.blame_output, self))
    }
}
