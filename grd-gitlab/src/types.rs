//! Wire types for GitLab REST responses

use grd_core::{Branch, Group, Project};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct GroupResponse {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub projects: Vec<ProjectResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectResponse {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path_with_namespace: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchResponse {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
}

/// Body for `PUT /projects/:id`
#[derive(Debug, Serialize)]
pub(crate) struct EditProjectRequest<'a> {
    pub default_branch: &'a str,
}

/// Body for `POST /projects/:id/protected_branches`
#[derive(Debug, Serialize)]
pub(crate) struct ProtectBranchRequest<'a> {
    pub name: &'a str,
    pub push_access_level: u8,
    pub merge_access_level: u8,
}

/// GitLab access levels used for branch protection
pub(crate) const DEVELOPER_ACCESS: u8 = 30;
pub(crate) const MAINTAINER_ACCESS: u8 = 40;

/// Access level granted when developers are (or are not) allowed
pub(crate) fn access_level(devs_allowed: bool) -> u8 {
    if devs_allowed {
        DEVELOPER_ACCESS
    } else {
        MAINTAINER_ACCESS
    }
}

impl From<GroupResponse> for Group {
    fn from(group: GroupResponse) -> Self {
        Group {
            id: group.id,
            name: group.name,
            projects: group.projects.into_iter().map(Project::from).collect(),
        }
    }
}

impl From<ProjectResponse> for Project {
    fn from(project: ProjectResponse) -> Self {
        Project {
            id: project.id,
            name: project.name,
            path_with_namespace: project.path_with_namespace,
            // empty repositories report an empty string on some versions
            default_branch: project.default_branch.filter(|b| !b.is_empty()),
        }
    }
}

impl From<BranchResponse> for Branch {
    fn from(branch: BranchResponse) -> Self {
        Branch {
            name: branch.name,
            protected: branch.protected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_conversion() {
        let json = r#"{
            "id": 42,
            "name": "Platform",
            "full_path": "platform",
            "projects": [
                {"id": 1, "name": "api", "path_with_namespace": "platform/api", "default_branch": "master"},
                {"id": 2, "name": "empty", "path_with_namespace": "platform/empty", "default_branch": null}
            ]
        }"#;
        let group: Group = serde_json::from_str::<GroupResponse>(json).unwrap().into();

        assert_eq!(group.id, 42);
        assert_eq!(group.projects.len(), 2);
        assert_eq!(group.projects[0].default_branch.as_deref(), Some("master"));
        assert!(group.projects[1].default_branch.is_none());
    }

    #[test]
    fn test_group_without_projects() {
        let group: GroupResponse = serde_json::from_str(r#"{"id": 1, "name": "g"}"#).unwrap();
        assert!(group.projects.is_empty());
    }

    #[test]
    fn test_empty_default_branch_is_none() {
        let project: Project = serde_json::from_str::<ProjectResponse>(
            r#"{"id": 3, "name": "x", "default_branch": ""}"#,
        )
        .unwrap()
        .into();
        assert!(project.default_branch.is_none());
    }

    #[test]
    fn test_access_level() {
        assert_eq!(access_level(true), 30);
        assert_eq!(access_level(false), 40);
    }
}
