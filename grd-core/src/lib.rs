//! grd core - default-branch migration for every project in a group
//!
//! This crate holds the domain model, the [`HostingApi`] capability the
//! migrator drives, the [`BranchMigrator`] itself and configuration loading.
//! Concrete API clients live in their own crates.

pub mod api;
pub mod config;
pub mod error;
pub mod migrator;
pub mod model;

pub use api::HostingApi;
pub use config::Settings;
pub use error::{Error, Result};
pub use migrator::{BranchMigrator, MigrationReport, ProjectOutcome, ProjectReport};
pub use model::{Branch, ErrorPolicy, Group, MigrationConfig, Project};
