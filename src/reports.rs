//! Advisory report generation
//!
//! Pairs OSV advisories with their computed CVSS base scores and renders
//! the result as JSON, Markdown or a terminal summary.

use serde::{Deserialize, Serialize};

use crate::api::OsvAdvisory;
use crate::cvss::{BaseScore, Severity};

/// An advisory together with its computed base score
#[derive(Debug, Clone)]
pub struct ScoredAdvisory {
    pub advisory: OsvAdvisory,
    pub score: BaseScore,
}

/// Per-severity advisory counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: u32,
    pub critical: u32,
    pub high: u32,
    pub moderate: u32,
    pub low: u32,
    pub none: u32,
}

impl ReportSummary {
    pub fn tally(advisories: &[ScoredAdvisory]) -> Self {
        let mut summary = Self::default();
        for scored in advisories {
            summary.total += 1;
            match scored.score.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Moderate => summary.moderate += 1,
                Severity::Low => summary.low += 1,
                Severity::None => summary.none += 1,
            }
        }
        summary
    }
}

/// Score each advisory and keep those at or above `min_severity`.
pub fn score_advisories(advisories: &[OsvAdvisory], min_severity: Severity) -> Vec<ScoredAdvisory> {
    advisories
        .iter()
        .filter_map(|advisory| {
            let score = advisory.base_score();
            score
                .severity
                .meets_threshold(&min_severity)
                .then(|| ScoredAdvisory {
                    advisory: advisory.clone(),
                    score,
                })
        })
        .collect()
}

pub fn generate_json_report(subject: &str, advisories: &[ScoredAdvisory]) -> serde_json::Value {
    let summary = ReportSummary::tally(advisories);

    serde_json::json!({
        "subject": subject,
        "summary": summary,
        "advisories": advisories.iter().map(|scored| {
            serde_json::json!({
                "id": scored.advisory.display_id(),
                "summary": scored.advisory.summary,
                "score": scored.score.score,
                "severity": scored.score.severity.as_str(),
                "url": scored.advisory.primary_url(),
            })
        }).collect::<Vec<_>>(),
    })
}

pub fn generate_markdown_report(subject: &str, advisories: &[ScoredAdvisory]) -> String {
    let summary = ReportSummary::tally(advisories);

    let mut lines = vec![
        "# Advisory Report".to_string(),
        String::new(),
        format!("**Subject**: {subject}"),
        format!("**Date**: {}", chrono::Local::now().format("%Y-%m-%d")),
        String::new(),
        "## Summary".to_string(),
        "| Severity | Count |".to_string(),
        "|----------|-------|".to_string(),
        format!("| ⚠ Critical | {} |", summary.critical),
        format!("| ▲ High | {} |", summary.high),
        format!("| ● Moderate | {} |", summary.moderate),
        format!("| ○ Low | {} |", summary.low),
        format!("| **Total** | **{}** |", summary.total),
        String::new(),
    ];

    if !advisories.is_empty() {
        lines.push("## Advisories".to_string());
        lines.push(String::new());

        for scored in advisories {
            let title = scored
                .advisory
                .summary
                .as_deref()
                .unwrap_or("(no summary)");
            lines.push(format!("### {}", scored.advisory.display_id()));
            lines.push(String::new());
            match scored.advisory.primary_url() {
                Some(url) => lines.push(format!(
                    "- **[{}]({})** ({} {}): {}",
                    scored.advisory.display_id(),
                    url,
                    scored.score.score,
                    scored.score.severity.as_str(),
                    title
                )),
                None => lines.push(format!(
                    "- **{}** ({} {}): {}",
                    scored.advisory.display_id(),
                    scored.score.score,
                    scored.score.severity.as_str(),
                    title
                )),
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

pub fn generate_summary_report(subject: &str, advisories: &[ScoredAdvisory]) -> String {
    let summary = ReportSummary::tally(advisories);

    let mut out = format!("Advisory Report for {subject}\n\n");
    out.push_str(&format!("  ⚠ Critical: {}\n", summary.critical));
    out.push_str(&format!("  ▲ High:     {}\n", summary.high));
    out.push_str(&format!("  ● Moderate: {}\n", summary.moderate));
    out.push_str(&format!("  ○ Low:      {}\n", summary.low));
    out.push_str("  ─────────────\n");
    out.push_str(&format!("  Total:      {}\n\n", summary.total));

    if summary.total == 0 {
        out.push_str("[OK] No advisories at or above the requested severity.\n");
    } else {
        out.push_str(&format!("⚠ {} advisories found!\n", summary.total));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::OsvSeverity;

    fn advisory(id: &str, vector: &str) -> OsvAdvisory {
        OsvAdvisory {
            id: id.to_string(),
            summary: Some(format!("Issue in {id}")),
            severity: vec![OsvSeverity {
                severity_type: "CVSS_V3".to_string(),
                score: vector.to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_tally_counts_by_bucket() {
        let advisories = vec![
            advisory("A-1", "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H"), // 9.8 Critical
            advisory("A-2", "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:L/I:N/A:N"), // 5.3 Moderate
        ];
        let scored = score_advisories(&advisories, Severity::None);
        let summary = ReportSummary::tally(&scored);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.moderate, 1);
    }

    #[test]
    fn test_min_severity_filters() {
        let advisories = vec![
            advisory("A-1", "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H"),
            advisory("A-2", "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:L/I:N/A:N"),
        ];
        let scored = score_advisories(&advisories, Severity::High);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].advisory.id, "A-1");
    }

    #[test]
    fn test_unscorable_advisory_still_reported_at_none() {
        let mut advisories = vec![advisory("A-1", "garbage")];
        advisories[0].severity[0].score = "garbage".to_string();

        let scored = score_advisories(&advisories, Severity::None);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].score.severity, Severity::None);

        // but it disappears above the None threshold
        assert!(score_advisories(&advisories, Severity::Low).is_empty());
    }

    #[test]
    fn test_json_report_shape() {
        let advisories = vec![advisory(
            "A-1",
            "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        )];
        let scored = score_advisories(&advisories, Severity::None);
        let report = generate_json_report("react 18.2.0", &scored);

        assert_eq!(report["subject"], "react 18.2.0");
        assert_eq!(report["summary"]["critical"], 1);
        assert_eq!(report["advisories"][0]["score"], 9.8);
    }

    #[test]
    fn test_markdown_report_lists_advisories() {
        let advisories = vec![advisory(
            "A-1",
            "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        )];
        let scored = score_advisories(&advisories, Severity::None);
        let markdown = generate_markdown_report("react 18.2.0", &scored);

        assert!(markdown.contains("# Advisory Report"));
        assert!(markdown.contains("### A-1"));
        assert!(markdown.contains("Critical"));
    }
}
