use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    MissingInCloud,
    UnmanagedInCloud,
    AttributeMismatch,
    TagMismatch,
    DependencyChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Blast-radius-derived impact level, independent of drift severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactLevel {
    /// 0 -> low, 1-4 -> medium, 5-9 -> high, >=10 -> critical.
    pub fn from_blast_radius(n: usize) -> Self {
        match n {
            0 => ImpactLevel::Low,
            1..=4 => ImpactLevel::Medium,
            5..=9 => ImpactLevel::High,
            _ => ImpactLevel::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftStatus {
    Open,
    Acknowledged,
    Resolved,
    Suppressed,
}

/// One detected inconsistency between a declared resource and its live
/// counterpart (or the absence of one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftRecord {
    pub id: String,
    pub resource_id: String,
    pub resource_type: String,
    pub provider: Provider,
    pub region: String,
    pub kind: DriftKind,
    pub severity: Severity,
    pub impact_level: ImpactLevel,
    #[serde(default)]
    pub expected: Option<Value>,
    #[serde(default)]
    pub actual: Option<Value>,
    /// Dotted path, e.g. `tags.Owner` or `properties.encryption`. Empty for
    /// whole-resource drift kinds such as `missing_in_cloud`.
    pub field: String,
    pub description: String,
    pub detected_at: DateTime<Utc>,
    pub status: DriftStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_level_boundaries() {
        assert_eq!(ImpactLevel::from_blast_radius(0), ImpactLevel::Low);
        assert_eq!(ImpactLevel::from_blast_radius(1), ImpactLevel::Medium);
        assert_eq!(ImpactLevel::from_blast_radius(4), ImpactLevel::Medium);
        assert_eq!(ImpactLevel::from_blast_radius(5), ImpactLevel::High);
        assert_eq!(ImpactLevel::from_blast_radius(9), ImpactLevel::High);
        assert_eq!(ImpactLevel::from_blast_radius(10), ImpactLevel::Critical);
        assert_eq!(ImpactLevel::from_blast_radius(100), ImpactLevel::Critical);
    }
}
