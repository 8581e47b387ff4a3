//! Configuration management for Spool.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Spool configuration loaded from `.git/spool/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Workspace listing settings.
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Fetch/push settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Stash defaults.
    #[serde(default)]
    pub stash: StashConfig,
}

impl Config {
    /// Location of the config file inside a git directory.
    #[must_use]
    pub fn path_in(git_dir: &Path) -> PathBuf {
        git_dir.join("spool").join("config.toml")
    }

    /// Load config from a TOML file. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save config to a TOML file, creating its directory.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Workspace listing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// List ignored files in the workspace tree.
    #[serde(default)]
    pub show_ignored: bool,
}

/// Fetch/push settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Remote used when none is given.
    #[serde(default = "default_remote")]
    pub default_remote: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            default_remote: default_remote(),
        }
    }
}

fn default_remote() -> String {
    "origin".into()
}

/// Stash defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashConfig {
    /// Include untracked files when saving.
    #[serde(default = "default_true")]
    pub include_untracked: bool,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            include_untracked: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.workspace.show_ignored);
        assert_eq!(config.remote.default_remote, "origin");
        assert!(config.stash.include_untracked);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = Config::path_in(temp.path());

        let config = Config {
            workspace: WorkspaceConfig { show_ignored: true },
            remote: RemoteConfig {
                default_remote: "upstream".into(),
            },
            stash: StashConfig {
                include_untracked: false,
            },
        };
        config.save(&path).unwrap();

        assert!(path.ends_with("spool/config.toml"));
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str("[remote]\n").unwrap();
        assert_eq!(config.remote.default_remote, "origin");
        assert!(config.stash.include_untracked);

        let config: Config = toml::from_str("[workspace]\nshow_ignored = true\n").unwrap();
        assert!(config.workspace.show_ignored);
    }

    #[test]
    fn test_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "workspace = [").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
