//! DepScanner backend API client
//!
//! Project CRUD and the dependency-graph endpoint. The backend sits behind an
//! identity provider; callers that have a session pass the already-acquired
//! bearer token and it is attached to every request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};

use super::{ApiError, DependencyGraph, Project, ScanSchedule};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Client for the scanner backend REST API
pub struct BackendClient {
    client: Arc<Client>,
    base_url: String,
    bearer_token: Option<String>,
}

impl BackendClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("depscanner-core")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token: None,
        })
    }

    /// Point the client at a different backend (also used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Attach a bearer token to every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// List the authenticated user's projects.
    pub async fn get_user_projects(&self) -> Result<Vec<Project>, ApiError> {
        let url = format!("{}/project/user", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        check_status("GET /project/user", &response)?;
        Ok(response.json().await?)
    }

    /// Fetch a single project by id.
    pub async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        let url = format!("{}/project/id/{}", self.base_url, id);
        let response = self.authorize(self.client.get(&url)).send().await?;
        check_status("GET /project/id", &response)?;
        Ok(response.json().await?)
    }

    /// Delete a project.
    pub async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        let url = format!("{}/project/id/{}", self.base_url, id);
        let response = self.authorize(self.client.delete(&url)).send().await?;
        check_status("DELETE /project/id", &response)?;
        Ok(())
    }

    /// Update a project's periodic re-scan schedule.
    pub async fn update_scan_schedule(
        &self,
        id: &str,
        schedule: &ScanSchedule,
    ) -> Result<(), ApiError> {
        let url = format!("{}/project/id/{}", self.base_url, id);
        let response = self
            .authorize(self.client.patch(&url))
            .json(schedule)
            .send()
            .await?;
        check_status("PATCH /project/id", &response)?;
        Ok(())
    }

    /// Fetch the resolved dependency graph for one package version.
    pub async fn get_dependencies(
        &self,
        name: &str,
        system: &str,
        version: &str,
    ) -> Result<DependencyGraph, ApiError> {
        let url = format!("{}/vuln/dependencies", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .query(&[("name", name), ("system", system), ("version", version)])
            .send()
            .await?;
        check_status("GET /vuln/dependencies", &response)?;
        Ok(response.json().await?)
    }
}

fn check_status(endpoint: &str, response: &reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
        });
    }
    Ok(())
}
