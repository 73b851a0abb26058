//! GitLab REST v4 client

use async_trait::async_trait;
use grd_core::{Branch, Group, HostingApi};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::types::{
    access_level, BranchResponse, EditProjectRequest, GroupResponse, ProtectBranchRequest,
};
use crate::{Error, Result};

/// Page size requested when listing branches
const PER_PAGE: u32 = 100;

/// GitLab API client for group and branch operations
pub struct GitLabClient {
    http: reqwest::Client,
    api_base: Url,
    token: String,
}

impl GitLabClient {
    /// Create a client for the instance at `base_url` (e.g. `https://gitlab.com`)
    ///
    /// An empty token sends unauthenticated requests, which only works for
    /// public read-only calls.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let mut api_base = Url::parse(base_url)?;
        api_base
            .path_segments_mut()
            .map_err(|_| Error::Parse(format!("{} cannot be used as a base URL", base_url)))?
            .pop_if_empty()
            .extend(["api", "v4"]);

        if token.is_empty() {
            warn!("No GitLab token configured, requests will be unauthenticated");
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("grd/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(api = %api_base, "Created GitLab client");

        Ok(Self {
            http,
            api_base,
            token,
        })
    }

    /// Base URL of the v4 API
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Fetch a group by numeric ID or full path, including its projects
    pub async fn group(&self, group_id: &str) -> Result<Group> {
        debug!(group_id, "Fetching group");

        let url = self.endpoint(&["groups", group_id])?;
        let response = self
            .send(self.request(Method::GET, url), &format!("group {}", group_id))
            .await?;
        let group: GroupResponse = parse(response).await?;

        Ok(group.into())
    }

    /// List all branches of a project, following pagination
    pub async fn branches(&self, project_id: u64) -> Result<Vec<Branch>> {
        let id = project_id.to_string();
        let resource = format!("branches of project {}", project_id);
        let mut branches = Vec::new();
        let mut page = 1u32;

        loop {
            debug!(project_id, page, "Listing branches");

            let mut url = self.endpoint(&["projects", &id, "repository", "branches"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let response = self.send(self.request(Method::GET, url), &resource).await?;
            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());

            let batch: Vec<BranchResponse> = parse(response).await?;
            branches.extend(batch.into_iter().map(Branch::from));

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        debug!(project_id, count = branches.len(), "Fetched branches");
        Ok(branches)
    }

    /// Create branch `name` from `source_ref`
    pub async fn create_branch(
        &self,
        project_id: u64,
        name: &str,
        source_ref: &str,
    ) -> Result<Branch> {
        debug!(project_id, name, source_ref, "Creating branch");

        let mut url =
            self.endpoint(&["projects", &project_id.to_string(), "repository", "branches"])?;
        url.query_pairs_mut()
            .append_pair("branch", name)
            .append_pair("ref", source_ref);

        let response = self
            .send(
                self.request(Method::POST, url),
                &format!("project {}", project_id),
            )
            .await?;
        let branch: BranchResponse = parse(response).await?;

        Ok(branch.into())
    }

    /// Change the project's default branch
    pub async fn set_default_branch(&self, project_id: u64, branch: &str) -> Result<()> {
        debug!(project_id, branch, "Setting default branch");

        let url = self.endpoint(&["projects", &project_id.to_string()])?;
        let request = self
            .request(Method::PUT, url)
            .json(&EditProjectRequest {
                default_branch: branch,
            });
        self.send(request, &format!("project {}", project_id))
            .await?;

        Ok(())
    }

    /// Protect a branch
    ///
    /// Developers get push/merge access when the matching flag is set,
    /// otherwise only maintainers do. An existing protection is replaced so
    /// the requested access levels always apply.
    pub async fn protect_branch(
        &self,
        project_id: u64,
        name: &str,
        devs_can_push: bool,
        devs_can_merge: bool,
    ) -> Result<()> {
        debug!(project_id, name, devs_can_push, devs_can_merge, "Protecting branch");

        let body = ProtectBranchRequest {
            name,
            push_access_level: access_level(devs_can_push),
            merge_access_level: access_level(devs_can_merge),
        };
        let resource = format!("protected branch {} of project {}", name, project_id);
        let url = self.endpoint(&["projects", &project_id.to_string(), "protected_branches"])?;

        let response = self
            .request(Method::POST, url.clone())
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            debug!(project_id, name, "Branch already protected, replacing protection");
            self.unprotect_branch(project_id, name).await?;
            self.send(self.request(Method::POST, url).json(&body), &resource)
                .await?;
            return Ok(());
        }

        check(response, &resource).await?;
        Ok(())
    }

    /// Remove protection from a branch
    ///
    /// Unprotecting a branch that is not protected succeeds. A missing
    /// project is still an error.
    pub async fn unprotect_branch(&self, project_id: u64, name: &str) -> Result<()> {
        debug!(project_id, name, "Unprotecting branch");

        let url = self.endpoint(&[
            "projects",
            &project_id.to_string(),
            "protected_branches",
            name,
        ])?;
        let resource = format!("protected branch {} of project {}", name, project_id);

        match self.send(self.request(Method::DELETE, url), &resource).await {
            Ok(_) => Ok(()),
            Err(e @ Error::NotFound { .. }) if e.is_project_not_found() => Err(e),
            Err(Error::NotFound { .. }) => {
                debug!(project_id, name, "Branch was not protected");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a branch
    pub async fn delete_branch(&self, project_id: u64, name: &str) -> Result<()> {
        debug!(project_id, name, "Deleting branch");

        let url = self.endpoint(&[
            "projects",
            &project_id.to_string(),
            "repository",
            "branches",
            name,
        ])?;
        self.send(
            self.request(Method::DELETE, url),
            &format!("branch {} of project {}", name, project_id),
        )
        .await?;

        Ok(())
    }

    /// Build an API URL; each segment is percent-encoded, so `/` in branch
    /// names and group paths stays inside its segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Parse(format!("{} cannot be used as a base URL", self.api_base)))?
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http.request(method, url);
        if self.token.is_empty() {
            request
        } else {
            request.header("PRIVATE-TOKEN", &self.token)
        }
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response> {
        let response = request.send().await?;
        check(response, resource).await
    }
}

/// Turn an unsuccessful response into an error
async fn check(response: Response, resource: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response".to_string());
    Err(Error::from_status(status, resource, body))
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::Parse(format!("Failed to parse GitLab response: {}", e)))
}

impl std::fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabClient")
            .field("api_base", &self.api_base.as_str())
            .field("authenticated", &!self.token.is_empty())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HostingApi for GitLabClient {
    async fn get_group(&self, group_id: &str) -> grd_core::Result<Group> {
        self.group(group_id)
            .await
            .map_err(|e| grd_core::Error::api("get group", e))
    }

    async fn list_branches(&self, project_id: u64) -> grd_core::Result<Vec<Branch>> {
        self.branches(project_id)
            .await
            .map_err(|e| grd_core::Error::api("list branches", e))
    }

    async fn create_branch(
        &self,
        project_id: u64,
        name: &str,
        source_ref: &str,
    ) -> grd_core::Result<Branch> {
        GitLabClient::create_branch(self, project_id, name, source_ref)
            .await
            .map_err(|e| grd_core::Error::api("create branch", e))
    }

    async fn set_default_branch(&self, project_id: u64, branch: &str) -> grd_core::Result<()> {
        GitLabClient::set_default_branch(self, project_id, branch)
            .await
            .map_err(|e| grd_core::Error::api("edit project", e))
    }

    async fn protect_branch(
        &self,
        project_id: u64,
        name: &str,
        devs_can_push: bool,
        devs_can_merge: bool,
    ) -> grd_core::Result<()> {
        GitLabClient::protect_branch(self, project_id, name, devs_can_push, devs_can_merge)
            .await
            .map_err(|e| grd_core::Error::api("protect branch", e))
    }

    async fn unprotect_branch(&self, project_id: u64, name: &str) -> grd_core::Result<()> {
        GitLabClient::unprotect_branch(self, project_id, name)
            .await
            .map_err(|e| grd_core::Error::api("unprotect branch", e))
    }

    async fn delete_branch(&self, project_id: u64, name: &str) -> grd_core::Result<()> {
        GitLabClient::delete_branch(self, project_id, name)
            .await
            .map_err(|e| grd_core::Error::api("delete branch", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_from_root_url() {
        let client = GitLabClient::new("https://gitlab.com", "t").unwrap();
        assert_eq!(client.api_base().as_str(), "https://gitlab.com/api/v4");
    }

    #[test]
    fn test_api_base_keeps_subpath() {
        let client = GitLabClient::new("https://example.com/gitlab/", "t").unwrap();
        assert_eq!(client.api_base().as_str(), "https://example.com/gitlab/api/v4");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            GitLabClient::new("not a url", "t"),
            Err(Error::Url(_))
        ));
    }

    #[test]
    fn test_endpoint_encodes_slashes() {
        let client = GitLabClient::new("https://gitlab.com", "t").unwrap();
        let url = client
            .endpoint(&["projects", "1", "repository", "branches", "feature/x"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.com/api/v4/projects/1/repository/branches/feature%2Fx"
        );

        let url = client.endpoint(&["groups", "platform/backend"]).unwrap();
        assert!(url.as_str().ends_with("/groups/platform%2Fbackend"));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = GitLabClient::new("https://gitlab.com", "glpat-secret").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("glpat-secret"));
        assert!(debug.contains("authenticated: true"));
    }
}
