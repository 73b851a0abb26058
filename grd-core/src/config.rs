//! Configuration management for grd
//!
//! Settings are resolved with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GRD_*)
//! 3. Config file (~/.grd.toml, or the file given with --config)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{ErrorPolicy, MigrationConfig};
use crate::{Error, Result};

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "GRD_";

/// Default GitLab instance
pub const DEFAULT_URL: &str = "https://gitlab.com";

/// File name searched for in the home directory
pub const CONFIG_FILE_NAME: &str = ".grd.toml";

/// Fully resolved settings for a run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// New default branch name
    pub new_name: String,

    /// API access token
    pub token: String,

    /// Base URL of the GitLab instance
    pub url: String,

    /// Unprotect the old default branch
    pub unprotect: bool,

    /// Delete the old default branch
    pub delete: bool,

    /// Developers may merge into the new default branch
    pub devs_can_merge: bool,

    /// Developers may push to the new default branch
    pub devs_can_push: bool,

    /// Keep processing projects after one fails
    pub keep_going: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            new_name: "main".to_string(),
            token: String::new(),
            url: DEFAULT_URL.to_string(),
            unprotect: false,
            delete: false,
            devs_can_merge: false,
            devs_can_push: false,
            keep_going: false,
        }
    }
}

/// Values given explicitly on the command line
///
/// Boolean flags only count when present, so they can switch a setting on
/// but never off.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub new_name: Option<String>,
    pub token: Option<String>,
    pub url: Option<String>,
    pub unprotect: bool,
    pub delete: bool,
    pub devs_can_merge: bool,
    pub devs_can_push: bool,
    pub keep_going: bool,
}

impl Settings {
    /// Load settings from an explicit file or the default location
    ///
    /// An explicit path must exist. The default file is optional, but the home
    /// directory must be resolvable to look for it.
    /// Returns the settings and the file actually read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        Self::load_with_home(explicit, dirs::home_dir())
    }

    /// Like [`Settings::load`], with the home directory already resolved
    pub fn load_with_home(
        explicit: Option<&Path>,
        home: Option<PathBuf>,
    ) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_from_file(path)?, Some(path.to_path_buf())));
        }

        let path = home
            .map(|h| h.join(CONFIG_FILE_NAME))
            .ok_or(Error::HomeDirNotFound)?;
        if path.exists() {
            let settings = Self::load_from_file(&path)?;
            return Ok((settings, Some(path)));
        }

        debug!(path = %path.display(), "No config file, using defaults");
        Ok((Self::default(), None))
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.grd.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables: GRD_NEW_NAME, GRD_TOKEN, GRD_URL, GRD_UNPROTECT,
    /// GRD_DELETE, GRD_DEVS_CAN_MERGE, GRD_DEVS_CAN_PUSH, GRD_KEEP_GOING
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (keys carry [`ENV_PREFIX`])
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let flag = |name: &str| -> Result<Option<bool>> {
            let key = format!("{}{}", ENV_PREFIX, name);
            lookup(&key).map(|v| parse_bool(&key, &v)).transpose()
        };

        if let Some(v) = var("NEW_NAME") {
            self.new_name = v;
        }
        if let Some(v) = var("TOKEN") {
            self.token = v;
        }
        if let Some(v) = var("URL") {
            self.url = v;
        }
        if let Some(v) = flag("UNPROTECT")? {
            self.unprotect = v;
        }
        if let Some(v) = flag("DELETE")? {
            self.delete = v;
        }
        if let Some(v) = flag("DEVS_CAN_MERGE")? {
            self.devs_can_merge = v;
        }
        if let Some(v) = flag("DEVS_CAN_PUSH")? {
            self.devs_can_push = v;
        }
        if let Some(v) = flag("KEEP_GOING")? {
            self.keep_going = v;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, cli: CliOverrides) -> Self {
        if let Some(v) = cli.new_name {
            self.new_name = v;
        }
        if let Some(v) = cli.token {
            self.token = v;
        }
        if let Some(v) = cli.url {
            self.url = v;
        }
        self.unprotect |= cli.unprotect;
        self.delete |= cli.delete;
        self.devs_can_merge |= cli.devs_can_merge;
        self.devs_can_push |= cli.devs_can_push;
        self.keep_going |= cli.keep_going;
        self
    }

    /// Load settings with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        explicit: Option<&Path>,
        cli: CliOverrides,
    ) -> Result<(Self, Option<PathBuf>)> {
        let (settings, path) = Self::load(explicit)?;
        let settings = settings.with_env_overrides()?.with_cli_overrides(cli);
        Ok((settings, path))
    }

    /// Build the migrator configuration from these settings
    pub fn migration_config(&self) -> Result<MigrationConfig> {
        let policy = if self.keep_going {
            ErrorPolicy::Continue
        } else {
            ErrorPolicy::FailFast
        };

        let config = MigrationConfig::new(self.new_name.clone())
            .with_delete_old(self.delete)
            .with_unprotect_old(self.unprotect)
            .with_devs_can_push(self.devs_can_push)
            .with_devs_can_merge(self.devs_can_merge)
            .with_error_policy(policy);
        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
