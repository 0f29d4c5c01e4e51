//! Wire models and clients for the external collaborators
//!
//! The scanner backend owns dependency resolution, vulnerability correlation
//! and persistence; OSV.dev owns advisory data. This module only models their
//! JSON response shapes and provides thin async clients. Cancellation is
//! drop-based: abandoning a request future aborts it, so a view tearing down
//! mid-fetch never observes a late response.

pub mod backend;
pub mod osv;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cvss::{self, BaseScore};

/// Error talking to the backend or OSV
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },
}

/// Package coordinates, deps.dev style
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionKey {
    pub system: String,
    pub name: String,
    pub version: String,
}

/// Advisory reference attached to a dependency row
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvisoryKey {
    pub id: String,
}

/// One dependency row in a project's resolved graph
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Dependency {
    pub version_key: VersionKey,
    /// SELF, DIRECT or INDIRECT
    pub relation: String,
    pub licenses: Vec<String>,
    pub advisory_detail: Vec<AdvisoryKey>,
}

/// Directed depends-on relation as index pairs into the dependency list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DependencyEdge {
    pub from_node: usize,
    pub to_node: usize,
}

/// The backend's dependency-graph endpoint response
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DependencyGraph {
    pub dependency: Vec<Dependency>,
    pub edges: Vec<DependencyEdge>,
}

/// A dependency as listed on a project card
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDependency {
    pub id: String,
    pub name: String,
    pub system: String,
    pub version: String,
    /// `None` means the backend has no advisory information for it
    pub is_vulnerable: Option<bool>,
}

/// A scanned project owned by the user
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub project_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub weekly_scanned: bool,
    pub daily_scanned: bool,
    pub project_dependencies_count: u32,
    pub vulnerable_dependencies_count: u32,
    pub dependencies: Vec<ProjectDependency>,
}

/// Re-scan schedule flags, PATCHed onto a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanSchedule {
    pub weekly_scanned: bool,
    pub daily_scanned: bool,
}

/// Reference link on an OSV advisory
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OsvReference {
    #[serde(rename = "type")]
    pub ref_type: String,
    pub url: String,
}

/// Affected package entry on an OSV advisory
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OsvAffected {
    pub package: OsvPackage,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OsvPackage {
    pub name: String,
    pub ecosystem: String,
}

/// Severity entry on an OSV advisory; `score` is a CVSS vector string
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OsvSeverity {
    #[serde(rename = "type")]
    pub severity_type: String,
    pub score: String,
}

/// An OSV.dev vulnerability advisory
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OsvAdvisory {
    pub id: String,
    pub summary: Option<String>,
    pub details: Option<String>,
    pub aliases: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub references: Vec<OsvReference>,
    pub affected: Vec<OsvAffected>,
    pub severity: Vec<OsvSeverity>,
}

impl OsvAdvisory {
    /// Compute the base score from the advisory's first severity vector.
    ///
    /// Advisories without a severity entry score 0 / None, which renders as
    /// "no score" rather than failing the page.
    pub fn base_score(&self) -> BaseScore {
        match self.severity.first() {
            Some(severity) => cvss::score_or_zero(&severity.score),
            None => BaseScore::zero(),
        }
    }

    /// Prefer the CVE alias over the OSV-native id when one exists.
    pub fn display_id(&self) -> &str {
        self.aliases
            .iter()
            .find(|alias| alias.starts_with("CVE-"))
            .map(String::as_str)
            .unwrap_or(&self.id)
    }

    /// First ADVISORY or WEB reference, for linking out.
    pub fn primary_url(&self) -> Option<&str> {
        self.references
            .iter()
            .find(|r| r.ref_type == "ADVISORY" || r.ref_type == "WEB")
            .map(|r| r.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_graph_deserializes_backend_shape() {
        let body = r#"{
            "dependency": [
                {
                    "versionKey": { "system": "NPM", "name": "react", "version": "18.2.0" },
                    "relation": "SELF",
                    "licenses": ["MIT"],
                    "advisoryDetail": []
                },
                {
                    "versionKey": { "system": "NPM", "name": "loose-envify", "version": "1.4.0" },
                    "relation": "DIRECT",
                    "licenses": ["MIT"],
                    "advisoryDetail": [{ "id": "GHSA-xxxx" }]
                }
            ],
            "edges": [{ "fromNode": 0, "toNode": 1 }]
        }"#;

        let graph: DependencyGraph = serde_json::from_str(body).unwrap();
        assert_eq!(graph.dependency.len(), 2);
        assert_eq!(graph.dependency[0].version_key.name, "react");
        assert_eq!(graph.dependency[1].advisory_detail[0].id, "GHSA-xxxx");
        assert_eq!(graph.edges[0], DependencyEdge { from_node: 0, to_node: 1 });
    }

    #[test]
    fn test_advisory_score_and_display_id() {
        let advisory = OsvAdvisory {
            id: "GHSA-abcd-1234".to_string(),
            aliases: vec!["CVE-2023-12345".to_string()],
            severity: vec![OsvSeverity {
                severity_type: "CVSS_V3".to_string(),
                score: "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H".to_string(),
            }],
            ..Default::default()
        };

        assert_eq!(advisory.display_id(), "CVE-2023-12345");
        assert_eq!(advisory.base_score().score, 9.8);
    }

    #[test]
    fn test_advisory_without_severity_scores_zero() {
        let advisory = OsvAdvisory {
            id: "GHSA-none".to_string(),
            ..Default::default()
        };
        assert_eq!(advisory.base_score(), BaseScore::zero());
    }

    #[test]
    fn test_project_tolerates_partial_response() {
        let project: Project = serde_json::from_str(
            r#"{ "id": "42", "name": "my-app", "weeklyScanned": true }"#,
        )
        .unwrap();
        assert_eq!(project.name, "my-app");
        assert!(project.weekly_scanned);
        assert!(!project.daily_scanned);
        assert!(project.created_at.is_none());
    }
}
