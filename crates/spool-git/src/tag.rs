//! Tag lookup, creation and deletion.

use git2::{ObjectType, Oid};

use crate::Repository;
use crate::error::Result;
use crate::model::{Signature, Tag, payload_is_signed};
use crate::repo_error::RepoError;

impl Repository {
    /// All tags, sorted by name.
    ///
    /// # Errors
    /// Returns error if tag names can't be listed.
    pub fn tags(&self) -> Result<Vec<Tag>> {
        let names = self.inner().tag_names(None)?;
        let mut tags: Vec<Tag> = names
            .iter()
            .flatten()
            .filter_map(|name| self.tag(name).ok().flatten())
            .collect();
        tags.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(tags)
    }

    /// Look up a tag by short or `refs/tags/` name.
    ///
    /// # Errors
    /// Returns error if the reference exists but can't be peeled.
    pub fn tag(&self, name: &str) -> Result<Option<Tag>> {
        let Ok(reference) = self.inner().find_reference(&Tag::ref_name(name)) else {
            return Ok(None);
        };
        if !reference.is_tag() {
            return Ok(None);
        }
        let short_name = name.strip_prefix(Tag::PREFIX).unwrap_or(name).to_string();

        if let Ok(object) = reference.peel(ObjectType::Tag) {
            let Some(tag) = object.as_tag() else {
                return Ok(None);
            };
            let odb = self.inner().odb()?;
            let raw = odb.read(tag.id())?;

            return Ok(Some(Tag::Annotated {
                name: short_name,
                target: tag.target_id(),
                tagger: tag.tagger().as_ref().map(Signature::from),
                message: String::from_utf8_lossy(tag.message_bytes().unwrap_or_default())
                    .into_owned(),
                signed: payload_is_signed(raw.data()),
            }));
        }

        let commit = reference.peel_to_commit()?;
        Ok(Some(Tag::Lightweight {
            name: short_name,
            target: commit.id(),
        }))
    }

    /// Create a tag at a target revision. A message makes it annotated.
    ///
    /// # Errors
    /// Returns `InvalidName`, `DuplicateName` or `CommitNotFound`.
    pub fn create_tag(&self, name: &str, target: &str, message: Option<&str>) -> Result<Oid> {
        let ref_name = Tag::ref_name(name);
        if name.is_empty() || !git2::Reference::is_valid_name(&ref_name) {
            return Err(RepoError::InvalidName(name.into()).into());
        }
        if self.inner().find_reference(&ref_name).is_ok() {
            return Err(RepoError::DuplicateName.into());
        }

        let commit = self.resolve_commit(target)?;
        let oid = match message {
            Some(message) => {
                let tagger = self.signature()?;
                self.inner()
                    .tag(name, commit.as_object(), &tagger, message, false)?
            }
            None => self
                .inner()
                .tag_lightweight(name, commit.as_object(), false)?,
        };
        tracing::debug!(name, %oid, annotated = message.is_some(), "created tag");
        Ok(oid)
    }

    /// Delete a tag.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown tags.
    pub fn delete_tag(&self, name: &str) -> Result<()> {
        let short_name = name.strip_prefix(Tag::PREFIX).unwrap_or(name);
        self.inner().tag_delete(short_name)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::repository::tests::init_test_repo;

    #[test]
    fn test_lightweight_and_annotated_tags() {
        let (_temp, repo) = init_test_repo();
        let head = repo.head_commit().unwrap().unwrap().id();

        repo.create_tag("light", "HEAD", None).unwrap();
        repo.create_tag("heavy", "HEAD", Some("Release notes")).unwrap();

        let light = repo.tag("light").unwrap().unwrap();
        assert!(matches!(light, Tag::Lightweight { .. }));
        assert_eq!(light.target(), head);
        assert_eq!(light.message(), None);

        let heavy = repo.tag("refs/tags/heavy").unwrap().unwrap();
        assert_eq!(heavy.name(), "heavy");
        assert_eq!(heavy.target(), head);
        assert_eq!(heavy.message().map(str::trim), Some("Release notes"));
        assert!(!heavy.is_signed());

        let names: Vec<String> = repo.tags().unwrap().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["heavy", "light"]);
    }

    #[test]
    fn test_create_tag_errors() {
        let (_temp, repo) = init_test_repo();
        repo.create_tag("v1", "HEAD", None).unwrap();

        assert_eq!(
            repo.create_tag("v1", "HEAD", None).unwrap_err().classify(),
            RepoError::DuplicateName
        );
        assert_eq!(
            repo.create_tag("bad name", "HEAD", None).unwrap_err().classify(),
            RepoError::InvalidName("bad name".into())
        );
        assert_eq!(
            repo.create_tag("v2", "missing", None).unwrap_err().classify(),
            RepoError::CommitNotFound(Some("missing".into()))
        );
    }

    #[test]
    fn test_delete_tag() {
        let (_temp, repo) = init_test_repo();
        repo.create_tag("v1", "HEAD", None).unwrap();

        repo.delete_tag("v1").unwrap();
        assert!(repo.tag("v1").unwrap().is_none());
        assert_eq!(
            repo.delete_tag("v1").unwrap_err().classify(),
            RepoError::NotFound
        );
    }
}
