//! Read-only snapshots of repository objects.
//!
//! Values here are copied out of git2 handles so they can cross threads and
//! outlive the repository borrow that produced them. Nothing in this module
//! mutates the store.

use std::fmt;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use git2::Oid;
use serde::Serialize;

use crate::repo_error::short_sha;

/// Line that opens an ASCII-armored signature in a raw object payload.
const PGP_SIGNATURE_MARKER: &str = "-----BEGIN PGP SIGNATURE-----";

/// Name, email and time attached to commits, tags and local blame lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<FixedOffset>,
}

impl Signature {
    /// Build a signature stamped with the current time.
    #[must_use]
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when: Utc::now().fixed_offset(),
        }
    }

    /// Convert to a git2 signature for writing objects.
    ///
    /// # Errors
    /// Returns error if name or email contain characters git rejects.
    pub fn to_git2(&self) -> Result<git2::Signature<'static>, git2::Error> {
        let time = git2::Time::new(self.when.timestamp(), self.when.offset().local_minus_utc() / 60);
        git2::Signature::new(&self.name, &self.email, &time)
    }
}

impl From<&git2::Signature<'_>> for Signature {
    fn from(sig: &git2::Signature<'_>) -> Self {
        let time = sig.when();
        let when = FixedOffset::east_opt(time.offset_minutes() * 60)
            .and_then(|offset| offset.timestamp_opt(time.seconds(), 0).single())
            .unwrap_or_else(|| Utc::now().fixed_offset());

        Self {
            name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            when,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A commit as read from the object database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    #[serde(serialize_with = "serialize_oid")]
    pub id: Oid,
    #[serde(serialize_with = "serialize_oids")]
    pub parent_ids: Vec<Oid>,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    #[serde(serialize_with = "serialize_oid")]
    pub tree_id: Oid,
}

impl Commit {
    /// First line of the message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Abbreviated id for display.
    #[must_use]
    pub fn short_id(&self) -> String {
        short_sha(&self.id.to_string()).to_string()
    }
}

impl From<&git2::Commit<'_>> for Commit {
    fn from(commit: &git2::Commit<'_>) -> Self {
        Self {
            id: commit.id(),
            parent_ids: commit.parent_ids().collect(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author: Signature::from(&commit.author()),
            committer: Signature::from(&commit.committer()),
            tree_id: commit.tree_id(),
        }
    }
}

/// A tag reference, either bare or backed by a tag object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tag {
    Lightweight {
        name: String,
        #[serde(serialize_with = "serialize_oid")]
        target: Oid,
    },
    Annotated {
        name: String,
        #[serde(serialize_with = "serialize_oid")]
        target: Oid,
        tagger: Option<Signature>,
        message: String,
        signed: bool,
    },
}

impl Tag {
    /// Ref prefix for tags.
    pub const PREFIX: &'static str = "refs/tags/";

    /// Tag name without the `refs/tags/` prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Lightweight { name, .. } | Self::Annotated { name, .. } => name,
        }
    }

    /// The commit the tag points at.
    #[must_use]
    pub const fn target(&self) -> Oid {
        match self {
            Self::Lightweight { target, .. } | Self::Annotated { target, .. } => *target,
        }
    }

    /// Tag message; `None` for lightweight tags.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Lightweight { .. } => None,
            Self::Annotated { message, .. } => Some(message),
        }
    }

    /// Whether the tag object carries a PGP signature.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Annotated { signed: true, .. })
    }

    /// Full ref name for a tag given either form of its name.
    #[must_use]
    pub fn ref_name(name: &str) -> String {
        if name.starts_with(Self::PREFIX) {
            name.to_string()
        } else {
            format!("{}{name}", Self::PREFIX)
        }
    }
}

/// Whether a raw tag object payload contains a signature block.
///
/// Tags don't mark the signature with a header the way commits use
/// `gpgsig`, so the payload is scanned line by line.
#[must_use]
pub fn payload_is_signed(payload: &[u8]) -> bool {
    String::from_utf8_lossy(payload)
        .lines()
        .any(|line| line.starts_with(PGP_SIGNATURE_MARKER))
}

/// Status of one file relative to a comparison base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaStatus {
    #[default]
    Unmodified,
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    Ignored,
    Untracked,
    TypeChange,
    Conflicted,
    Unreadable,
}

impl DeltaStatus {
    /// Single-letter marker in the style of `git status --short`.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::Unmodified => ' ',
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Modified => 'M',
            Self::Renamed => 'R',
            Self::Copied => 'C',
            Self::Ignored => '!',
            Self::Untracked => '?',
            Self::TypeChange => 'T',
            Self::Conflicted => 'U',
            Self::Unreadable => 'X',
        }
    }

    /// Whether this status represents an actual change.
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Unmodified | Self::Ignored)
    }
}

impl From<git2::Delta> for DeltaStatus {
    fn from(delta: git2::Delta) -> Self {
        match delta {
            git2::Delta::Unmodified => Self::Unmodified,
            git2::Delta::Added => Self::Added,
            git2::Delta::Deleted => Self::Deleted,
            git2::Delta::Modified => Self::Modified,
            git2::Delta::Renamed => Self::Renamed,
            git2::Delta::Copied => Self::Copied,
            git2::Delta::Ignored => Self::Ignored,
            git2::Delta::Untracked => Self::Untracked,
            git2::Delta::Typechange => Self::TypeChange,
            git2::Delta::Unreadable => Self::Unreadable,
            git2::Delta::Conflicted => Self::Conflicted,
        }
    }
}

/// One file's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    pub status: DeltaStatus,
}

impl FileChange {
    #[must_use]
    pub fn new(path: impl Into<String>, status: DeltaStatus) -> Self {
        Self {
            path: path.into(),
            old_path: None,
            status,
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_oid<S: serde::Serializer>(oid: &Oid, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(oid)
}

fn serialize_oids<S: serde::Serializer>(oids: &[Oid], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(oids.iter().map(ToString::to_string))
}
