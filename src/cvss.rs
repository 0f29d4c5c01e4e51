//! CVSS v3.1 base-score calculation
//!
//! Advisories arrive with a CVSS vector string (e.g.
//! `CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H`); this module decodes the
//! eight base metrics and derives the numeric base score and its qualitative
//! severity bucket. Temporal and environmental metrics, if present, are
//! ignored.

use serde::{Deserialize, Serialize};

/// Qualitative severity rating derived from a base score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    /// Map a base score to its severity bucket.
    ///
    /// Buckets are inclusive at the lower bound and exclusive at the upper:
    /// exactly 7.0 is High, 6.9 is Moderate.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Moderate,
            s if s > 0.0 => Severity::Low,
            _ => Severity::None,
        }
    }

    /// Get numeric rank for severity comparison (higher = more severe)
    pub fn rank(&self) -> u8 {
        match self {
            Severity::None => 0,
            Severity::Low => 1,
            Severity::Moderate => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// Check if this severity meets or exceeds a minimum threshold
    pub fn meets_threshold(&self, min: &Self) -> bool {
        self.rank() >= min.rank()
    }

    /// Parse severity from string (case-insensitive)
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "moderate" | "medium" => Severity::Moderate,
            "low" => Severity::Low,
            _ => Severity::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

/// Computed base score: numeric value (one decimal, 0.0-10.0) plus bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BaseScore {
    pub score: f64,
    pub severity: Severity,
}

impl BaseScore {
    /// The "no data" result: score 0, severity None.
    pub fn zero() -> Self {
        Self {
            score: 0.0,
            severity: Severity::None,
        }
    }
}

/// Error decoding a CVSS vector string
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("vector does not start with a CVSS:3.x prefix: {0:?}")]
    MissingPrefix(String),
    #[error("malformed metric segment {0:?} (expected KEY:VALUE)")]
    MalformedSegment(String),
    #[error("metric {0} appears more than once")]
    DuplicateMetric(&'static str),
    #[error("metric {0} is missing")]
    MissingMetric(&'static str),
    #[error("unknown value {value:?} for metric {metric}")]
    UnknownValue { metric: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackVector {
    Network,
    Adjacent,
    Local,
    Physical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackComplexity {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegesRequired {
    None,
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInteraction {
    None,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Unchanged,
    Changed,
}

/// Impact metric value, shared by Confidentiality, Integrity and Availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    None,
    Low,
    High,
}

impl AttackVector {
    fn weight(self) -> f64 {
        match self {
            AttackVector::Network => 0.85,
            AttackVector::Adjacent => 0.62,
            AttackVector::Local => 0.55,
            AttackVector::Physical => 0.2,
        }
    }
}

impl AttackComplexity {
    fn weight(self) -> f64 {
        match self {
            AttackComplexity::Low => 0.77,
            AttackComplexity::High => 0.44,
        }
    }
}

impl PrivilegesRequired {
    // PR weights depend on Scope: a changed scope raises the Low/High weights.
    fn weight(self, scope: Scope) -> f64 {
        match (self, scope) {
            (PrivilegesRequired::None, _) => 0.85,
            (PrivilegesRequired::Low, Scope::Unchanged) => 0.62,
            (PrivilegesRequired::Low, Scope::Changed) => 0.68,
            (PrivilegesRequired::High, Scope::Unchanged) => 0.27,
            (PrivilegesRequired::High, Scope::Changed) => 0.50,
        }
    }
}

impl UserInteraction {
    fn weight(self) -> f64 {
        match self {
            UserInteraction::None => 0.85,
            UserInteraction::Required => 0.62,
        }
    }
}

impl Impact {
    fn weight(self) -> f64 {
        match self {
            Impact::None => 0.0,
            Impact::Low => 0.22,
            Impact::High => 0.56,
        }
    }
}

/// Decoded CVSS v3.1 base metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvssVector {
    pub attack_vector: AttackVector,
    pub attack_complexity: AttackComplexity,
    pub privileges_required: PrivilegesRequired,
    pub user_interaction: UserInteraction,
    pub scope: Scope,
    pub confidentiality: Impact,
    pub integrity: Impact,
    pub availability: Impact,
}

impl CvssVector {
    /// Parse a CVSS v3.x vector string.
    ///
    /// Each of the eight base metrics must appear exactly once. Segments for
    /// non-base metrics (temporal/environmental) are ignored.
    pub fn parse(vector: &str) -> Result<Self, ParseError> {
        let mut segments = vector.split('/');

        let prefix = segments.next().unwrap_or_default();
        if !prefix.starts_with("CVSS:3") {
            return Err(ParseError::MissingPrefix(prefix.to_string()));
        }

        let mut av = None;
        let mut ac = None;
        let mut pr = None;
        let mut ui = None;
        let mut s = None;
        let mut c = None;
        let mut i = None;
        let mut a = None;

        for segment in segments {
            let Some((key, value)) = segment.split_once(':') else {
                return Err(ParseError::MalformedSegment(segment.to_string()));
            };

            match key {
                "AV" => set_metric(
                    &mut av,
                    "AV",
                    match value {
                        "N" => AttackVector::Network,
                        "A" => AttackVector::Adjacent,
                        "L" => AttackVector::Local,
                        "P" => AttackVector::Physical,
                        _ => return Err(unknown("AV", value)),
                    },
                )?,
                "AC" => set_metric(
                    &mut ac,
                    "AC",
                    match value {
                        "L" => AttackComplexity::Low,
                        "H" => AttackComplexity::High,
                        _ => return Err(unknown("AC", value)),
                    },
                )?,
                "PR" => set_metric(
                    &mut pr,
                    "PR",
                    match value {
                        "N" => PrivilegesRequired::None,
                        "L" => PrivilegesRequired::Low,
                        "H" => PrivilegesRequired::High,
                        _ => return Err(unknown("PR", value)),
                    },
                )?,
                "UI" => set_metric(
                    &mut ui,
                    "UI",
                    match value {
                        "N" => UserInteraction::None,
                        "R" => UserInteraction::Required,
                        _ => return Err(unknown("UI", value)),
                    },
                )?,
                "S" => set_metric(
                    &mut s,
                    "S",
                    match value {
                        "U" => Scope::Unchanged,
                        "C" => Scope::Changed,
                        _ => return Err(unknown("S", value)),
                    },
                )?,
                "C" => set_metric(&mut c, "C", parse_impact("C", value)?)?,
                "I" => set_metric(&mut i, "I", parse_impact("I", value)?)?,
                "A" => set_metric(&mut a, "A", parse_impact("A", value)?)?,
                // Temporal/environmental metrics, not part of the base score
                _ => {}
            }
        }

        Ok(CvssVector {
            attack_vector: av.ok_or(ParseError::MissingMetric("AV"))?,
            attack_complexity: ac.ok_or(ParseError::MissingMetric("AC"))?,
            privileges_required: pr.ok_or(ParseError::MissingMetric("PR"))?,
            user_interaction: ui.ok_or(ParseError::MissingMetric("UI"))?,
            scope: s.ok_or(ParseError::MissingMetric("S"))?,
            confidentiality: c.ok_or(ParseError::MissingMetric("C"))?,
            integrity: i.ok_or(ParseError::MissingMetric("I"))?,
            availability: a.ok_or(ParseError::MissingMetric("A"))?,
        })
    }

    /// Compute the base score from the decoded metrics.
    pub fn base_score(&self) -> BaseScore {
        let iss = 1.0
            - (1.0 - self.confidentiality.weight())
                * (1.0 - self.integrity.weight())
                * (1.0 - self.availability.weight());

        let impact = match self.scope {
            Scope::Unchanged => 6.42 * iss,
            Scope::Changed => 7.52 * (iss - 0.029) - 3.25 * (iss - 0.02).powi(15),
        };

        let exploitability = 8.22
            * self.attack_vector.weight()
            * self.attack_complexity.weight()
            * self.privileges_required.weight(self.scope)
            * self.user_interaction.weight();

        if impact <= 0.0 {
            return BaseScore::zero();
        }

        let score = match self.scope {
            Scope::Unchanged => round_up((impact + exploitability).min(10.0)),
            Scope::Changed => round_up((1.08 * (impact + exploitability)).min(10.0)),
        };

        BaseScore {
            score,
            severity: Severity::from_score(score),
        }
    }
}

fn set_metric<T>(slot: &mut Option<T>, name: &'static str, value: T) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(ParseError::DuplicateMetric(name));
    }
    *slot = Some(value);
    Ok(())
}

fn unknown(metric: &'static str, value: &str) -> ParseError {
    ParseError::UnknownValue {
        metric,
        value: value.to_string(),
    }
}

fn parse_impact(metric: &'static str, value: &str) -> Result<Impact, ParseError> {
    match value {
        "N" => Ok(Impact::None),
        "L" => Ok(Impact::Low),
        "H" => Ok(Impact::High),
        _ => Err(unknown(metric, value)),
    }
}

/// CVSS v3.1 Roundup: ceiling at one-decimal granularity.
///
/// Uses the integer formulation from the v3.1 specification so that values
/// like 8.6 * 1.0 do not round up to 8.7 through IEEE-754 representation
/// drift.
fn round_up(value: f64) -> f64 {
    let scaled = (value * 100_000.0).round() as i64;
    if scaled % 10_000 == 0 {
        scaled as f64 / 100_000.0
    } else {
        ((scaled / 10_000) + 1) as f64 / 10.0
    }
}

/// Compute the base score for a vector string.
///
/// An empty vector is the "no data" case and yields score 0 / severity None
/// without parsing; anything else must be a well-formed vector.
pub fn compute_base_score(vector: &str) -> Result<BaseScore, ParseError> {
    if vector.is_empty() {
        return Ok(BaseScore::zero());
    }
    Ok(CvssVector::parse(vector)?.base_score())
}

/// Compute the base score, collapsing parse failures to score 0.
///
/// A missing or malformed score must not block rendering of the advisory
/// page, so callers that only display the result use this entry point.
pub fn score_or_zero(vector: &str) -> BaseScore {
    match compute_base_score(vector) {
        Ok(score) => score,
        Err(err) => {
            tracing::warn!("unscorable CVSS vector {vector:?}: {err}");
            BaseScore::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_case_unchanged_vector() {
        let result = compute_base_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H").unwrap();
        assert_eq!(result.score, 9.8);
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn test_changed_scope_vector() {
        // Known published score for this vector is 9.9
        let result = compute_base_score("CVSS:3.1/AV:N/AC:L/PR:L/UI:N/S:C/C:H/I:H/A:H").unwrap();
        assert_eq!(result.score, 9.9);
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn test_moderate_vector() {
        let result = compute_base_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:L/I:N/A:N").unwrap();
        assert_eq!(result.score, 5.3);
        assert_eq!(result.severity, Severity::Moderate);
    }

    #[test]
    fn test_low_vector() {
        let result = compute_base_score("CVSS:3.1/AV:L/AC:H/PR:H/UI:R/S:U/C:L/I:N/A:N").unwrap();
        assert_eq!(result.score, 1.8);
        assert_eq!(result.severity, Severity::Low);
    }

    #[test]
    fn test_zero_impact_ignores_exploitability() {
        // C:N/I:N/A:N means impact 0 regardless of how exploitable it is
        let result = compute_base_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:N/A:N").unwrap();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.severity, Severity::None);

        let changed = compute_base_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:C/C:N/I:N/A:N").unwrap();
        assert_eq!(changed.score, 0.0);
        assert_eq!(changed.severity, Severity::None);
    }

    #[test]
    fn test_empty_vector_is_no_data() {
        assert_eq!(compute_base_score("").unwrap(), BaseScore::zero());
    }

    #[test]
    fn test_deterministic() {
        let vector = "CVSS:3.1/AV:A/AC:H/PR:L/UI:R/S:C/C:L/I:L/A:L";
        let first = compute_base_score(vector).unwrap();
        let second = compute_base_score(vector).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_severity_bucket_boundaries() {
        assert_eq!(Severity::from_score(10.0), Severity::Critical);
        assert_eq!(Severity::from_score(9.0), Severity::Critical);
        assert_eq!(Severity::from_score(8.9), Severity::High);
        assert_eq!(Severity::from_score(7.0), Severity::High);
        assert_eq!(Severity::from_score(6.9), Severity::Moderate);
        assert_eq!(Severity::from_score(4.0), Severity::Moderate);
        assert_eq!(Severity::from_score(3.9), Severity::Low);
        assert_eq!(Severity::from_score(0.1), Severity::Low);
        assert_eq!(Severity::from_score(0.0), Severity::None);
    }

    #[test]
    fn test_missing_metric() {
        let err = compute_base_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H").unwrap_err();
        assert_eq!(err, ParseError::MissingMetric("A"));
    }

    #[test]
    fn test_duplicate_metric() {
        let err =
            compute_base_score("CVSS:3.1/AV:N/AV:L/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H").unwrap_err();
        assert_eq!(err, ParseError::DuplicateMetric("AV"));
    }

    #[test]
    fn test_unknown_value() {
        let err = compute_base_score("CVSS:3.1/AV:X/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownValue {
                metric: "AV",
                value: "X".to_string()
            }
        );
    }

    #[test]
    fn test_missing_prefix() {
        assert!(matches!(
            compute_base_score("AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H"),
            Err(ParseError::MissingPrefix(_))
        ));
    }

    #[test]
    fn test_temporal_metrics_ignored() {
        let result =
            compute_base_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/E:P/RL:O/RC:C")
                .unwrap();
        assert_eq!(result.score, 9.8);
    }

    #[test]
    fn test_score_or_zero_collapses_errors() {
        assert_eq!(score_or_zero("not a vector"), BaseScore::zero());
        assert_eq!(score_or_zero("").severity, Severity::None);
        assert_eq!(
            score_or_zero("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H").score,
            9.8
        );
    }

    #[test]
    fn test_round_up_granularity() {
        assert_eq!(round_up(4.0), 4.0);
        assert_eq!(round_up(4.02), 4.1);
        assert_eq!(round_up(4.0000001), 4.0);
        assert_eq!(round_up(9.76), 9.8);
    }

    #[test]
    fn test_severity_threshold() {
        assert!(Severity::High.meets_threshold(&Severity::Moderate));
        assert!(!Severity::Low.meets_threshold(&Severity::High));
        assert_eq!(Severity::from_str_loose("MODERATE"), Severity::Moderate);
        assert_eq!(Severity::from_str_loose("medium"), Severity::Moderate);
    }
}
