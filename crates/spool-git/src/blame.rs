//! Blame engine.
//!
//! Authorship comes from `git blame --porcelain` rather than libgit2's blame,
//! which is far slower on long histories. The porcelain stream is parsed
//! into run-length-compressed hunks: consecutive lines blamed on the same
//! commit collapse into one hunk.

use std::io::Write;
use std::process::{Command, Stdio};

use git2::Oid;
use serde::Serialize;

use crate::Repository;
use crate::error::{Error, Result};
use crate::model::Signature;
use crate::traits::CommitLookup;

/// Where a hunk's lines sit in one version of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineInfo {
    /// Blamed commit; zero for uncommitted local lines.
    #[serde(serialize_with = "serialize_oid")]
    pub oid: Oid,
    /// 1-based first line.
    pub start: usize,
    pub signature: Signature,
}

/// A run of consecutive final-file lines attributed to one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameHunk {
    line_count: usize,
    boundary: bool,
    pub original_line: LineInfo,
    pub final_line: LineInfo,
}

impl BlameHunk {
    #[must_use]
    pub const fn new(line_count: usize, original_line: LineInfo, final_line: LineInfo) -> Self {
        Self {
            line_count,
            boundary: false,
            original_line,
            final_line,
        }
    }

    /// Number of lines in the hunk.
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.line_count
    }

    /// Always false: the porcelain stream's `boundary` marker is not
    /// tracked.
    #[must_use]
    pub const fn boundary(&self) -> bool {
        self.boundary
    }

    /// The blamed commit.
    #[must_use]
    pub const fn oid(&self) -> Oid {
        self.final_line.oid
    }

    /// Whether the lines are uncommitted.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.final_line.oid.is_zero()
    }

    /// Whether a 1-based final line falls inside this hunk.
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.final_line.start && line < self.final_line.start + self.line_count
    }
}

/// Blame results for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Blame {
    hunks: Vec<BlameHunk>,
}

impl Blame {
    /// Parse porcelain blame output.
    ///
    /// Malformed header lines and headers naming commits the lookup can't
    /// resolve are skipped; parsing never fails as a whole.
    #[must_use]
    pub fn parse(text: &str, lookup: &impl CommitLookup) -> Self {
        let mut hunks: Vec<BlameHunk> = Vec::new();
        let mut expecting_header = true;

        for line in text.lines() {
            if expecting_header {
                let fields: Vec<&str> = line.split_whitespace().collect();
                let Some(oid) = parse_header_oid(&fields) else {
                    tracing::debug!(line, "skipping malformed blame header");
                    continue;
                };

                if let Some(last) = hunks.last_mut().filter(|last| last.original_line.oid == oid) {
                    last.line_count += 1;
                } else {
                    let (Ok(original_start), Ok(final_start)) =
                        (fields[1].parse::<usize>(), fields[2].parse::<usize>())
                    else {
                        tracing::debug!(line, "skipping blame header with bad line numbers");
                        continue;
                    };
                    let (author, committer) = if oid.is_zero() {
                        let local = lookup.default_signature();
                        (local.clone(), local)
                    } else {
                        let Some(commit) = lookup.find_commit(oid) else {
                            tracing::debug!(%oid, "skipping blame header for unknown commit");
                            continue;
                        };
                        (commit.author, commit.committer)
                    };

                    // The stream carries no separate "original commit"; both
                    // sides use the blamed id.
                    hunks.push(BlameHunk::new(
                        1,
                        LineInfo {
                            oid,
                            start: original_start,
                            signature: author,
                        },
                        LineInfo {
                            oid,
                            start: final_start,
                            signature: committer,
                        },
                    ));
                }
                expecting_header = false;
            } else if line.starts_with('\t') {
                expecting_header = true;
            }
            // Other lines carry author/committer metadata, already taken
            // from the commit itself.
        }

        Self { hunks }
    }

    #[must_use]
    pub fn hunks(&self) -> &[BlameHunk] {
        &self.hunks
    }

    #[must_use]
    pub fn into_hunks(self) -> Vec<BlameHunk> {
        self.hunks
    }

    /// Total number of blamed lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.hunks.iter().map(BlameHunk::line_count).sum()
    }

    /// The hunk covering a 1-based final line.
    #[must_use]
    pub fn hunk_for_line(&self, line: usize) -> Option<&BlameHunk> {
        let index = self
            .hunks
            .partition_point(|hunk| hunk.final_line.start + hunk.line_count <= line);
        self.hunks.get(index).filter(|hunk| hunk.contains_line(line))
    }
}

/// Validate header fields and parse the leading object id.
fn parse_header_oid(fields: &[&str]) -> Option<Oid> {
    let [sha, _, _, ..] = fields else {
        return None;
    };
    let full_length = sha.len() == 40 || sha.len() == 64;
    if !full_length || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Oid::from_str(sha).ok()
}

impl Repository {
    /// Blame a file's committed history, starting at `from` or at `HEAD`.
    ///
    /// Uncommitted edits never show up here; [`Repository::blame_data`]
    /// covers those. Uses `git blame --porcelain <rev> -- <path>`.
    ///
    /// # Errors
    /// Returns error if git fails or the output is not UTF-8.
    pub fn blame_file(&self, path: &str, from: Option<Oid>) -> Result<Blame> {
        let mut args = vec!["blame".to_string(), "-p".to_string()];
        args.push(from.map_or_else(|| "HEAD".to_string(), |rev| rev.to_string()));
        args.push("--".to_string());
        args.push(path.to_string());

        let output = self.run_git(&args, None)?;
        Ok(Blame::parse(&output, self))
    }

    /// Blame supplied content against the file's history.
    ///
    /// Lines that differ from history come back with the zero id and the
    /// default signature. Uses `git blame --porcelain --contents - <path>`.
    ///
    /// # Errors
    /// Returns error if git fails or the output is not UTF-8.
    pub fn blame_data(&self, path: &str, data: &[u8]) -> Result<Blame> {
        let args = ["blame", "-p", "--contents", "-", path].map(String::from);
        let output = self.run_git(&args, Some(data))?;
        Ok(Blame::parse(&output, self))
    }

    /// Run a read-only git command in the workdir and return stdout.
    fn run_git(&self, args: &[String], stdin: Option<&[u8]>) -> Result<String> {
        let workdir = self.workdir().ok_or(Error::BareRepository)?;

        let mut child = Command::new("git")
            .args(args)
            .current_dir(workdir)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(data)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Command(stderr.trim().to_string()));
        }

        String::from_utf8(output.stdout).map_err(|_| Error::InvalidUtf8(args.join(" ").into()))
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_oid<S: serde::Serializer>(
    oid: &Oid,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(oid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::{FixedOffset, TimeZone};

    use super::*;
    use crate::model::Commit;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const C: &str = "cccccccccccccccccccccccccccccccccccccccc";
    const ZERO: &str = "0000000000000000000000000000000000000000";

    struct FakeLookup {
        commits: HashMap<Oid, Commit>,
        local: Signature,
    }

    fn signature(name: &str, seconds: i64) -> Signature {
        Signature {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            when: FixedOffset::east_opt(0)
                .unwrap()
                .timestamp_opt(seconds, 0)
                .unwrap(),
        }
    }

    fn commit(sha: &str, author: &str, committer: &str) -> Commit {
        Commit {
            id: Oid::from_str(sha).unwrap(),
            parent_ids: vec![],
            message: format!("commit {author}"),
            author: signature(author, 100),
            committer: signature(committer, 200),
            tree_id: Oid::zero(),
        }
    }

    impl FakeLookup {
        fn new() -> Self {
            let mut commits = HashMap::new();
            for c in [commit(A, "Alice", "Carol"), commit(B, "Bob", "Bob"), commit(C, "Cy", "Cy")] {
                commits.insert(c.id, c);
            }
            Self {
                commits,
                local: signature("Local", 300),
            }
        }
    }

    impl CommitLookup for FakeLookup {
        fn find_commit(&self, oid: Oid) -> Option<Commit> {
            self.commits.get(&oid).cloned()
        }

        fn default_signature(&self) -> Signature {
            self.local.clone()
        }
    }

    /// Build a porcelain stream from (sha, original, final, group-count) rows.
    fn stream(rows: &[(&str, usize, usize, Option<usize>)]) -> String {
        let mut text = String::new();
        for (sha, original, final_line, count) in rows {
            match count {
                Some(n) => text.push_str(&format!("{sha} {original} {final_line} {n}\n")),
                None => text.push_str(&format!("{sha} {original} {final_line}\n")),
            }
            text.push_str("author Someone\nauthor-mail <someone@example.com>\n");
            text.push_str(&format!("\tline {final_line}\n"));
        }
        text
    }

    #[test]
    fn test_run_of_same_commit_collapses() {
        let lookup = FakeLookup::new();
        let text = stream(&[(A, 1, 1, Some(5)), (A, 2, 2, None), (B, 3, 3, Some(1))]);

        let blame = Blame::parse(&text, &lookup);
        let hunks = blame.hunks();

        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].oid().to_string(), A);
        assert_eq!(hunks[0].line_count(), 2);
        assert_eq!(hunks[1].oid().to_string(), B);
        assert_eq!(hunks[1].line_count(), 1);
        assert_eq!(blame.line_count(), 3);
    }

    #[test]
    fn test_distinct_commits_keep_stream_order() {
        let lookup = FakeLookup::new();
        let text = stream(&[(C, 4, 1, Some(1)), (A, 1, 2, Some(1)), (B, 9, 3, Some(1))]);

        let blame = Blame::parse(&text, &lookup);
        let ids: Vec<String> = blame.hunks().iter().map(|h| h.oid().to_string()).collect();

        assert_eq!(ids, vec![C, A, B]);
        assert_eq!(blame.hunks()[0].original_line.start, 4);
        assert_eq!(blame.hunks()[0].final_line.start, 1);
        assert!(blame.hunks().iter().all(|h| h.line_count() == 1));
    }

    #[test]
    fn test_signatures_come_from_commit() {
        let lookup = FakeLookup::new();
        let blame = Blame::parse(&stream(&[(A, 1, 1, Some(1))]), &lookup);
        let hunk = &blame.hunks()[0];

        assert_eq!(hunk.original_line.signature.name, "Alice");
        assert_eq!(hunk.final_line.signature.name, "Carol");
        assert_eq!(hunk.original_line.oid, hunk.final_line.oid);
        assert!(!hunk.boundary());
    }

    #[test]
    fn test_zero_oid_uses_local_identity() {
        let lookup = FakeLookup::new();
        let blame = Blame::parse(&stream(&[(ZERO, 1, 1, Some(2)), (ZERO, 2, 2, None)]), &lookup);
        let hunk = &blame.hunks()[0];

        assert!(hunk.is_local());
        assert_eq!(hunk.line_count(), 2);
        assert_eq!(hunk.original_line.signature, hunk.final_line.signature);
        assert_eq!(hunk.final_line.signature, lookup.local);
    }

    #[test]
    fn test_malformed_headers_are_skipped() {
        let lookup = FakeLookup::new();
        let unknown = "dddddddddddddddddddddddddddddddddddddddd";
        let text = format!(
            "{A} 1\n\tshort header\n\
             nothex!nothex!nothex!nothex!nothex!nothex 1 1\n\tbad oid\n\
             {B} x y\n\tbad numbers\n\
             {unknown} 1 1 1\n\tunknown commit\n\
             {C} 1 1 1\n\tgood\n"
        );

        let blame = Blame::parse(&text, &lookup);

        assert_eq!(blame.hunks().len(), 1);
        assert_eq!(blame.hunks()[0].oid().to_string(), C);
    }

    #[test]
    fn test_commit_changes_after_local_lines() {
        let lookup = FakeLookup::new();
        let text = stream(&[
            (A, 1, 1, Some(2)),
            (A, 2, 2, None),
            (ZERO, 3, 3, Some(1)),
            (A, 3, 4, Some(1)),
        ]);

        let blame = Blame::parse(&text, &lookup);
        let counts: Vec<usize> = blame.hunks().iter().map(BlameHunk::line_count).collect();

        assert_eq!(counts, vec![2, 1, 1]);
        assert!(blame.hunks()[1].is_local());
    }

    #[test]
    fn test_hunk_for_line() {
        let lookup = FakeLookup::new();
        let text = stream(&[(A, 1, 1, Some(2)), (A, 2, 2, None), (B, 1, 3, Some(1))]);
        let blame = Blame::parse(&text, &lookup);

        assert_eq!(blame.hunk_for_line(1).map(BlameHunk::oid), Some(Oid::from_str(A).unwrap()));
        assert_eq!(blame.hunk_for_line(2).map(BlameHunk::oid), Some(Oid::from_str(A).unwrap()));
        assert_eq!(blame.hunk_for_line(3).map(BlameHunk::oid), Some(Oid::from_str(B).unwrap()));
        assert!(blame.hunk_for_line(4).is_none());
        assert!(blame.hunk_for_line(0).is_none());
    }

    #[test]
    fn test_history_blame_ignores_working_copy() {
        let (temp, repo) = crate::repository::tests::init_test_repo();
        std::fs::write(temp.path().join("README.md"), "# Test\nedited\nmore\n").unwrap();

        let blame = repo.blame_file("README.md", None).unwrap();
        assert_eq!(blame.line_count(), 1);
        assert!(blame.hunks().iter().all(|hunk| !hunk.is_local()));

        let head = repo.resolve_revision("HEAD").unwrap();
        let pinned = repo.blame_file("README.md", Some(head)).unwrap();
        assert_eq!(pinned.line_count(), 1);
        assert_eq!(pinned.hunks()[0].oid(), head);
    }

    #[test]
    fn test_empty_stream() {
        let blame = Blame::parse("", &FakeLookup::new());
        assert!(blame.hunks().is_empty());
        assert_eq!(blame.line_count(), 0);
    }
}
