//! Default-branch migration across a group's projects
//!
//! For each project the migrator walks `Fetched -> (NoOp | Migrating ->
//! Promoted -> Cleaned)`. Steps are one-shot; nothing is retried or rolled
//! back, so a failure after the target branch was created leaves it in place.
//!
//! The old branch's protection flag comes from the branch list fetched before
//! any mutation and is never refreshed.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::HostingApi;
use crate::model::{ErrorPolicy, MigrationConfig, Project};
use crate::{Error, Result};

const SEPARATOR: &str = "----------------------------------------";

/// Result of migrating a single project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProjectOutcome {
    /// Project has no branches at all
    NoBranches,
    /// Default branch already matches the target
    AlreadyDefault,
    /// Target branch was promoted to default
    Migrated {
        /// Target branch had to be created
        created_target: bool,
        /// Old default branch was unprotected
        unprotected_old: bool,
        /// Old default branch was deleted
        deleted_old: bool,
    },
    /// Migration failed and the run continued (only under [`ErrorPolicy::Continue`])
    Failed { error: String },
}

impl ProjectOutcome {
    pub fn is_migrated(&self) -> bool {
        matches!(self, ProjectOutcome::Migrated { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProjectOutcome::Failed { .. })
    }
}

/// Outcome for one project in a group run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub project_id: u64,
    pub project_name: String,
    pub outcome: ProjectOutcome,
}

/// Summary of a group run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub group_name: String,
    pub projects: Vec<ProjectReport>,
}

impl MigrationReport {
    /// Number of projects whose default branch was changed
    pub fn migrated(&self) -> usize {
        self.projects.iter().filter(|p| p.outcome.is_migrated()).count()
    }

    /// Number of projects that needed no changes
    pub fn unchanged(&self) -> usize {
        self.projects
            .iter()
            .filter(|p| {
                matches!(
                    p.outcome,
                    ProjectOutcome::NoBranches | ProjectOutcome::AlreadyDefault
                )
            })
            .count()
    }

    /// Number of projects that failed
    pub fn failed(&self) -> usize {
        self.projects.iter().filter(|p| p.outcome.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Moves every project in a group onto a new default branch
pub struct BranchMigrator<A, W = io::Stdout> {
    api: A,
    config: MigrationConfig,
    out: W,
}

impl<A: HostingApi> BranchMigrator<A> {
    /// Create a migrator that reports progress on stdout
    pub fn new(api: A, config: MigrationConfig) -> Self {
        Self {
            api,
            config,
            out: io::stdout(),
        }
    }
}

impl<A: HostingApi, W: Write> BranchMigrator<A, W> {
    /// Send progress output somewhere else
    pub fn with_output<O: Write>(self, out: O) -> BranchMigrator<A, O> {
        BranchMigrator {
            api: self.api,
            config: self.config,
            out,
        }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Consume the migrator and hand back its output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// Migrate every project of `group_id` in the order the API lists them
    ///
    /// Under [`ErrorPolicy::FailFast`] the first failing project aborts the run
    /// and its error is returned. Under [`ErrorPolicy::Continue`] the failure
    /// is recorded in the report and the next project is processed. Failing to
    /// resolve the group is always fatal.
    pub async fn migrate_group(&mut self, group_id: &str) -> Result<MigrationReport> {
        debug!(group_id, "Fetching group");
        let group = self.api.get_group(group_id).await?;

        info!(
            group_id,
            group = %group.name,
            projects = group.projects.len(),
            target = %self.config.target_branch,
            "Migrating group"
        );

        let mut report = MigrationReport {
            group_name: group.name.clone(),
            projects: Vec::with_capacity(group.projects.len()),
        };

        for project in &group.projects {
            let outcome = match self.migrate_project(project).await {
                Ok(outcome) => outcome,
                Err(e) if self.config.error_policy == ErrorPolicy::Continue => {
                    warn!(project_id = project.id, error = %e, "Project failed, continuing");
                    ProjectOutcome::Failed {
                        error: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };

            report.projects.push(ProjectReport {
                project_id: project.id,
                project_name: project.name.clone(),
                outcome,
            });
        }

        writeln!(
            self.out,
            "Group {}: {} migrated, {} unchanged, {} failed",
            report.group_name,
            report.migrated(),
            report.unchanged(),
            report.failed()
        )?;

        Ok(report)
    }

    /// Migrate a single project
    ///
    /// A separator line is written after the project whichever way it went.
    pub async fn migrate_project(&mut self, project: &Project) -> Result<ProjectOutcome> {
        writeln!(
            self.out,
            "Project {} ({}, id {})",
            project.name, project.path_with_namespace, project.id
        )?;

        let result = self.run_steps(project).await;
        if let Err(e) = &result {
            writeln!(self.out, "  error: {}", e)?;
        }
        writeln!(self.out, "{}", SEPARATOR)?;

        result
    }

    async fn run_steps(&mut self, project: &Project) -> Result<ProjectOutcome> {
        let Self { api, config, out } = self;
        let target = config.target_branch.as_str();

        debug!(project_id = project.id, "Listing branches");
        let branches = api.list_branches(project.id).await?;

        if branches.is_empty() {
            info!(project_id = project.id, "Project has no branches");
            writeln!(out, "  nothing to do: project has no branches")?;
            return Ok(ProjectOutcome::NoBranches);
        }

        let old_default = project.default_branch.as_deref();
        if old_default == Some(target) {
            info!(project_id = project.id, branch = target, "Already the default branch");
            writeln!(out, "  '{}' is already the default branch, nothing to do", target)?;
            return Ok(ProjectOutcome::AlreadyDefault);
        }

        // Migrating
        let created_target = if branches.iter().any(|b| b.name == target) {
            debug!(project_id = project.id, branch = target, "Target branch already exists");
            writeln!(out, "  branch '{}' already exists", target)?;
            false
        } else {
            let source = old_default.ok_or_else(|| Error::MissingDefaultBranch {
                project: project.path_with_namespace.clone(),
                target: target.to_string(),
            })?;
            api.create_branch(project.id, target, source).await?;
            info!(project_id = project.id, branch = target, source, "Created branch");
            writeln!(out, "  created branch '{}' from '{}'", target, source)?;
            true
        };

        // Promoted
        api.set_default_branch(project.id, target).await?;
        info!(project_id = project.id, branch = target, "Set default branch");
        writeln!(out, "  set default branch to '{}'", target)?;

        api.protect_branch(project.id, target, config.devs_can_push, config.devs_can_merge)
            .await?;
        info!(
            project_id = project.id,
            branch = target,
            devs_can_push = config.devs_can_push,
            devs_can_merge = config.devs_can_merge,
            "Protected branch"
        );
        writeln!(out, "  protected '{}'", target)?;

        // Cleaned
        let old = old_default.and_then(|name| branches.iter().find(|b| b.name == name));
        let mut unprotected_old = false;
        let mut deleted_old = false;

        if config.unprotect_old {
            if let Some(old) = old.filter(|b| b.protected) {
                api.unprotect_branch(project.id, &old.name).await?;
                info!(project_id = project.id, branch = %old.name, "Unprotected branch");
                writeln!(out, "  unprotected '{}'", old.name)?;
                unprotected_old = true;
            }
        }

        if config.delete_old {
            match old {
                Some(old) => {
                    if old.protected {
                        api.unprotect_branch(project.id, &old.name).await?;
                        debug!(project_id = project.id, branch = %old.name, "Unprotected before delete");
                        unprotected_old = true;
                    }
                    api.delete_branch(project.id, &old.name).await?;
                    info!(project_id = project.id, branch = %old.name, "Deleted branch");
                    writeln!(out, "  deleted '{}'", old.name)?;
                    deleted_old = true;
                }
                None => {
                    let name = old_default.unwrap_or("(none)");
                    warn!(project_id = project.id, branch = name, "Old default branch not found, not deleting");
                    writeln!(out, "  warning: old default branch '{}' not found, skipping delete", name)?;
                }
            }
        }

        Ok(ProjectOutcome::Migrated {
            created_target,
            unprotected_old,
            deleted_old,
        })
    }
}
