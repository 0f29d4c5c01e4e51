//! OSV.dev advisory client
//!
//! OSV (Open Source Vulnerabilities) provides a unified API for querying
//! vulnerability data across ecosystems. The advisory page fetches one
//! record per advisory id listed on a dependency.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;

use super::{ApiError, OsvAdvisory};

const OSV_API_BASE: &str = "https://api.osv.dev/v1";

/// OSV.dev API client
pub struct OsvClient {
    client: Arc<Client>,
    base_url: String,
}

impl OsvClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("depscanner-core")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: OSV_API_BASE.to_string(),
        })
    }

    /// Point the client at a different base URL (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch a single advisory by OSV id.
    pub async fn get_advisory(&self, id: &str) -> Result<OsvAdvisory, ApiError> {
        let url = format!("{}/vulns/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: format!("GET /vulns/{id}"),
                status,
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch a batch of advisories concurrently.
    ///
    /// A failed lookup yields `None` for that id rather than failing the
    /// batch; the advisory page renders whatever resolved.
    pub async fn get_advisories(&self, ids: &[String]) -> Vec<Option<OsvAdvisory>> {
        let lookups = ids.iter().map(|id| async move {
            match self.get_advisory(id).await {
                Ok(advisory) => Some(advisory),
                Err(err) => {
                    tracing::warn!("failed to fetch OSV advisory {id}: {err}");
                    None
                }
            }
        });

        join_all(lookups).await
    }
}
