//! Fetch and push with cooperative cancellation.
//!
//! Transfers report progress through git2 callbacks. Each callback polls
//! the caller's `keep_going` check; returning `false` makes libgit2 stop the
//! transfer at the next chunk boundary with a user error.

use std::cell::RefCell;

use git2::{Cred, CredentialType, FetchOptions, PushOptions, RemoteCallbacks};

use crate::Repository;
use crate::error::{Error, Result};
use crate::repo_error::RepoError;

impl Repository {
    /// Names of configured remotes.
    ///
    /// # Errors
    /// Returns error if the config can't be read.
    pub fn remote_names(&self) -> Result<Vec<String>> {
        let remotes = self.inner().remotes()?;
        Ok(remotes.iter().flatten().map(String::from).collect())
    }

    /// Fetch a remote's configured refspecs.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown remote; transfer errors pass
    /// through, including the user error raised when `keep_going` stops.
    pub fn fetch(&self, remote_name: &str, keep_going: &dyn Fn() -> bool) -> Result<()> {
        let mut remote = self
            .inner()
            .find_remote(remote_name)
            .map_err(|_| RepoError::NotFound)?;

        let mut callbacks = self.callbacks();
        callbacks.transfer_progress(|progress| {
            tracing::trace!(
                received = progress.received_objects(),
                total = progress.total_objects(),
                "fetch progress"
            );
            keep_going()
        });
        callbacks.sideband_progress(|_| keep_going());

        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks);
        remote.fetch::<&str>(&[], Some(&mut options), None)?;
        tracing::debug!(remote = remote_name, "fetched");
        Ok(())
    }

    /// Push a branch (the current one if `None`) to a remote.
    ///
    /// # Errors
    /// Returns `DetachedHead` when no branch is named and HEAD is detached,
    /// `NotFound` for an unknown remote, and `Command` when the remote
    /// rejects the update.
    pub fn push(
        &self,
        remote_name: &str,
        branch: Option<&str>,
        force: bool,
        keep_going: &dyn Fn() -> bool,
    ) -> Result<()> {
        let branch = match branch {
            Some(branch) => branch.to_string(),
            None => self.current_branch()?,
        };
        let mut remote = self
            .inner()
            .find_remote(remote_name)
            .map_err(|_| RepoError::NotFound)?;

        let rejection = RefCell::new(None);
        let mut callbacks = self.callbacks();
        callbacks.push_negotiation(|_updates| {
            if keep_going() {
                Ok(())
            } else {
                Err(git2::Error::from_str("push canceled"))
            }
        });
        callbacks.sideband_progress(|_| keep_going());
        callbacks.push_update_reference(|refname, status| {
            if let Some(message) = status {
                *rejection.borrow_mut() = Some(format!("{refname}: {message}"));
            }
            Ok(())
        });

        let prefix = if force { "+" } else { "" };
        let refspec = format!("{prefix}refs/heads/{branch}:refs/heads/{branch}");
        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);
        remote.push(&[refspec.as_str()], Some(&mut options))?;

        let rejected = rejection.borrow_mut().take();
        if let Some(message) = rejected {
            return Err(Error::Command(format!("push rejected: {message}")));
        }
        tracing::debug!(remote = remote_name, branch, "pushed");
        Ok(())
    }

    /// Credential callbacks backed by the user's git configuration.
    fn callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username, allowed| {
            if allowed.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username.unwrap_or("git"));
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                let config = self.inner().config()?;
                return Cred::credential_helper(&config, url, username);
            }
            Cred::default()
        });
        callbacks
    }
}
