//! Domain types shared between the migrator and API clients

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A group of projects on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID
    pub id: u64,
    /// Display name
    pub name: String,
    /// Projects in the group, in the order the API listed them
    pub projects: Vec<Project>,
}

/// A project as reported by the hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID
    pub id: u64,
    /// Display name
    pub name: String,
    /// Full path including namespace (e.g. `group/app`)
    pub path_with_namespace: String,
    /// Current default branch; empty repositories have none
    pub default_branch: Option<String>,
}

/// A branch of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name
    pub name: String,
    /// Whether push/merge restrictions are enforced on the branch
    pub protected: bool,
}

impl Branch {
    pub fn new(name: impl Into<String>, protected: bool) -> Self {
        Self {
            name: name.into(),
            protected,
        }
    }
}

/// What to do when a single project fails to migrate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first error
    #[default]
    FailFast,
    /// Record the failure and move on to the next project
    Continue,
}

/// Resolved settings for one migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Name of the new default branch
    pub target_branch: String,
    /// Delete the old default branch once the target is promoted
    pub delete_old: bool,
    /// Unprotect the old default branch once the target is promoted
    pub unprotect_old: bool,
    /// Allow developers to push to the protected target branch
    pub devs_can_push: bool,
    /// Allow developers to merge into the protected target branch
    pub devs_can_merge: bool,
    /// Per-project failure handling
    pub error_policy: ErrorPolicy,
}

impl MigrationConfig {
    /// Create a config targeting `target_branch` with every option off
    pub fn new(target_branch: impl Into<String>) -> Self {
        Self {
            target_branch: target_branch.into(),
            delete_old: false,
            unprotect_old: false,
            devs_can_push: false,
            devs_can_merge: false,
            error_policy: ErrorPolicy::FailFast,
        }
    }

    pub fn with_delete_old(mut self, delete_old: bool) -> Self {
        self.delete_old = delete_old;
        self
    }

    pub fn with_unprotect_old(mut self, unprotect_old: bool) -> Self {
        self.unprotect_old = unprotect_old;
        self
    }

    pub fn with_devs_can_push(mut self, devs_can_push: bool) -> Self {
        self.devs_can_push = devs_can_push;
        self
    }

    pub fn with_devs_can_merge(mut self, devs_can_merge: bool) -> Self {
        self.devs_can_merge = devs_can_merge;
        self
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Reject configurations the migrator cannot act on
    pub fn validate(&self) -> Result<()> {
        if self.target_branch.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "new branch name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self::new("main")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_migration_config() {
        let config = MigrationConfig::default();
        assert_eq!(config.target_branch, "main");
        assert!(!config.delete_old);
        assert!(!config.unprotect_old);
        assert!(!config.devs_can_push);
        assert!(!config.devs_can_merge);
        assert_eq!(config.error_policy, ErrorPolicy::FailFast);
    }

    #[test]
    fn test_builder() {
        let config = MigrationConfig::new("trunk")
            .with_delete_old(true)
            .with_devs_can_merge(true)
            .with_error_policy(ErrorPolicy::Continue);

        assert_eq!(config.target_branch, "trunk");
        assert!(config.delete_old);
        assert!(!config.unprotect_old);
        assert!(config.devs_can_merge);
        assert!(!config.devs_can_push);
        assert_eq!(config.error_policy, ErrorPolicy::Continue);
    }

    #[test]
    fn test_validate_rejects_blank_target() {
        assert!(MigrationConfig::new("").validate().is_err());
        assert!(MigrationConfig::new("   ").validate().is_err());
        assert!(MigrationConfig::new("main").validate().is_ok());
    }
}
