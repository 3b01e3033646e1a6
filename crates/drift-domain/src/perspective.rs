use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::drift::DriftRecord;
use crate::resource::{Provider, Resource};

/// The reconciled view produced by a single drift analysis run: declared
/// resources, live resources, and the drift computed between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perspective {
    pub id: String,
    pub provider: Provider,
    #[serde(default)]
    pub region: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub declared: Vec<Resource>,
    pub live: Vec<Resource>,
    pub drifts: Vec<DriftRecord>,
    pub summary: PerspectiveSummary,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PerspectiveSummary {
    pub total_declared: usize,
    pub total_live: usize,
    pub total_drifted: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
}

impl Perspective {
    pub fn summarize(
        id: String,
        provider: Provider,
        region: Option<String>,
        now: DateTime<Utc>,
        declared: Vec<Resource>,
        live: Vec<Resource>,
        drifts: Vec<DriftRecord>,
    ) -> Self {
        use crate::drift::Severity;

        let mut summary = PerspectiveSummary {
            total_declared: declared.len(),
            total_live: live.len(),
            total_drifted: drifts.len(),
            ..Default::default()
        };
        for d in &drifts {
            match d.severity {
                Severity::Critical => summary.critical_count += 1,
                Severity::High => summary.high_count += 1,
                Severity::Medium => summary.medium_count += 1,
                Severity::Low => summary.low_count += 1,
            }
        }

        Self {
            id,
            provider,
            region,
            generated_at: now,
            declared,
            live,
            drifts,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::{DriftKind, DriftStatus, ImpactLevel, Severity};

    fn drift(severity: Severity) -> DriftRecord {
        DriftRecord {
            id: "d1".into(),
            resource_id: "i-1".into(),
            resource_type: "aws_instance".into(),
            provider: Provider::Aws,
            region: "us-east-1".into(),
            kind: DriftKind::AttributeMismatch,
            severity,
            impact_level: ImpactLevel::Low,
            expected: None,
            actual: None,
            field: "tags.Owner".into(),
            description: "mismatch".into(),
            detected_at: Utc::now(),
            status: DriftStatus::Open,
        }
    }

    #[test]
    fn summary_counts_by_severity() {
        let p = Perspective::summarize(
            "p1".into(),
            Provider::Aws,
            Some("us-east-1".into()),
            Utc::now(),
            vec![],
            vec![],
            vec![drift(Severity::Critical), drift(Severity::Low), drift(Severity::Low)],
        );
        assert_eq!(p.summary.total_drifted, 3);
        assert_eq!(p.summary.critical_count, 1);
        assert_eq!(p.summary.low_count, 2);
    }
}
