//! Capability trait for the remote hosting API

use async_trait::async_trait;

use crate::model::{Branch, Group};
use crate::Result;

/// Operations the migrator needs from a repository-hosting platform
///
/// Implementations wrap their own failures in [`crate::Error::Api`]. Any
/// pagination happens inside the implementation.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Fetch a group together with its projects
    async fn get_group(&self, group_id: &str) -> Result<Group>;

    /// List every branch of a project
    async fn list_branches(&self, project_id: u64) -> Result<Vec<Branch>>;

    /// Create `name` pointing at `source_ref`
    async fn create_branch(&self, project_id: u64, name: &str, source_ref: &str)
        -> Result<Branch>;

    /// Make `branch` the project's default branch
    async fn set_default_branch(&self, project_id: u64, branch: &str) -> Result<()>;

    /// Protect `name`, optionally granting developers push/merge access
    async fn protect_branch(
        &self,
        project_id: u64,
        name: &str,
        devs_can_push: bool,
        devs_can_merge: bool,
    ) -> Result<()>;

    /// Remove protection from `name`
    async fn unprotect_branch(&self, project_id: u64, name: &str) -> Result<()>;

    /// Delete `name`
    async fn delete_branch(&self, project_id: u64, name: &str) -> Result<()>;
}
