use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use drift_domain::{DriftKind, DriftRecord, DriftStatus, ImpactLevel, Resource, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const SECURITY_SENSITIVE_FIELDS: &[&str] = &["public_access", "encryption", "open_to_world_cidr"];
const GOVERNANCE_TAGS: &[&str] = &["Owner", "Environment", "Project"];
const IGNORED_FIELDS: &[&str] = &["arn", "last_modified_time", "updated_at", "etag", "resource_version"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Structural match only, no attribute diff.
    Quick,
    /// Full diff, ignored-field allowlist applied.
    Smart,
    /// Full diff, ignored-field allowlist disabled.
    Deep,
}

fn new_record(
    live: &Resource,
    kind: DriftKind,
    severity: Severity,
    blast_radius: usize,
    expected: Option<Value>,
    actual: Option<Value>,
    field: String,
    description: String,
    now: DateTime<Utc>,
) -> DriftRecord {
    DriftRecord {
        id: Uuid::new_v4().to_string(),
        resource_id: live.id.clone(),
        resource_type: live.resource_type.clone(),
        provider: live.provider,
        region: live.region.clone(),
        kind,
        severity,
        impact_level: ImpactLevel::from_blast_radius(blast_radius),
        expected,
        actual,
        field,
        description,
        detected_at: now,
        status: DriftStatus::Open,
    }
}

pub fn missing_in_cloud(declared: &Resource, blast_radius: usize, on_critical_path: bool, now: DateTime<Utc>) -> DriftRecord {
    let severity = if on_critical_path { Severity::Critical } else { Severity::Medium };
    new_record(
        declared,
        DriftKind::MissingInCloud,
        severity,
        blast_radius,
        Some(serde_json::to_value(declared).unwrap_or(Value::Null)),
        None,
        String::new(),
        format!("{} is declared but has no live counterpart", declared.id),
        now,
    )
}

pub fn unmanaged_in_cloud(live: &Resource, now: DateTime<Utc>) -> DriftRecord {
    new_record(
        live,
        DriftKind::UnmanagedInCloud,
        Severity::High,
        0,
        None,
        Some(serde_json::to_value(live).unwrap_or(Value::Null)),
        String::new(),
        format!("{} exists in the cloud but is not declared", live.id),
        now,
    )
}

fn attribute_mismatch_severity(field: &str, blast_radius: usize) -> Severity {
    let leaf = field.rsplit('.').next().unwrap_or(field);
    if SECURITY_SENSITIVE_FIELDS.contains(&leaf) {
        Severity::Critical
    } else if blast_radius > 10 {
        Severity::High
    } else if blast_radius >= 1 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Recursively diff two JSON trees, collecting `(dotted_path, expected, actual)`
/// for every leaf where the values differ. Lists are compared position-sensitively.
fn diff_values(prefix: &str, expected: &Value, actual: &Value, out: &mut Vec<(String, Value, Value)>) {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => {
            let mut keys: BTreeSet<&String> = e.keys().collect();
            keys.extend(a.keys());
            for key in keys {
                let ev = e.get(key).cloned().unwrap_or(Value::Null);
                let av = a.get(key).cloned().unwrap_or(Value::Null);
                diff_values(&format!("{}.{}", prefix, key), &ev, &av, out);
            }
        }
        (Value::Array(e), Value::Array(a)) => {
            for i in 0..e.len().max(a.len()) {
                let ev = e.get(i).cloned().unwrap_or(Value::Null);
                let av = a.get(i).cloned().unwrap_or(Value::Null);
                diff_values(&format!("{}.{}", prefix, i), &ev, &av, out);
            }
        }
        _ => {
            if expected != actual {
                out.push((prefix.to_string(), expected.clone(), actual.clone()));
            }
        }
    }
}

/// Tag-level and attribute-level diff between a matched declared/live pair.
/// `Quick` mode skips this entirely; callers should not invoke it in that mode.
pub fn compare(declared: &Resource, live: &Resource, blast_radius: usize, mode: AnalysisMode, now: DateTime<Utc>) -> Vec<DriftRecord> {
    let mut records = Vec::new();

    let mut tag_keys: BTreeSet<&String> = declared.tags.keys().collect();
    tag_keys.extend(live.tags.keys());
    for key in tag_keys {
        let expected = declared.tags.get(key);
        let actual = live.tags.get(key);
        if expected != actual {
            let severity = if GOVERNANCE_TAGS.contains(&key.as_str()) {
                Severity::Medium
            } else {
                Severity::Low
            };
            records.push(new_record(
                live,
                DriftKind::TagMismatch,
                severity,
                blast_radius,
                expected.map(|v| Value::String(v.clone())),
                actual.map(|v| Value::String(v.clone())),
                format!("tags.{}", key),
                format!("tag {} differs between declared and live", key),
                now,
            ));
        }
    }

    let expected_props = Value::Object(declared.properties.clone().into_iter().collect());
    let actual_props = Value::Object(live.properties.clone().into_iter().collect());
    let mut diffs = Vec::new();
    diff_values("properties", &expected_props, &actual_props, &mut diffs);
    for (field, expected, actual) in diffs {
        let leaf = field.rsplit('.').next().unwrap_or(&field);
        if mode == AnalysisMode::Smart && IGNORED_FIELDS.contains(&leaf) {
            continue;
        }
        records.push(new_record(
            live,
            DriftKind::AttributeMismatch,
            attribute_mismatch_severity(&field, blast_radius),
            blast_radius,
            Some(expected),
            Some(actual),
            field.clone(),
            format!("{} differs between declared and live", field),
            now,
        ));
    }

    let declared_deps: BTreeSet<&String> = declared.dependencies.iter().collect();
    let live_deps: BTreeSet<&String> = live.dependencies.iter().collect();
    if declared_deps != live_deps {
        records.push(new_record(
            live,
            DriftKind::DependencyChange,
            Severity::Low,
            blast_radius,
            Some(serde_json::to_value(&declared.dependencies).unwrap_or(Value::Null)),
            Some(serde_json::to_value(&live.dependencies).unwrap_or(Value::Null)),
            "dependencies".to_string(),
            "dependency set differs between declared and live".to_string(),
            now,
        ));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resource(tags: HashMap<String, String>, properties: HashMap<String, Value>) -> Resource {
        Resource {
            id: "i-1".into(),
            name: "web".into(),
            resource_type: "aws_instance".into(),
            provider: drift_domain::Provider::Aws,
            region: "us-east-1".into(),
            account: None,
            status: "running".into(),
            tags,
            properties,
            dependencies: vec![],
            modified_at: None,
            last_scanned: None,
        }
    }

    #[test]
    fn security_sensitive_field_mismatch_is_critical() {
        let mut declared_props = HashMap::new();
        declared_props.insert("encryption".to_string(), Value::Bool(true));
        let mut live_props = HashMap::new();
        live_props.insert("encryption".to_string(), Value::Bool(false));

        let declared = resource(HashMap::new(), declared_props);
        let live = resource(HashMap::new(), live_props);
        let records = compare(&declared, &live, 0, AnalysisMode::Deep, Utc::now());
        let mismatch = records.iter().find(|r| r.kind == DriftKind::AttributeMismatch).unwrap();
        assert_eq!(mismatch.severity, Severity::Critical);
    }

    #[test]
    fn governance_tag_mismatch_is_medium() {
        let mut declared_tags = HashMap::new();
        declared_tags.insert("Owner".to_string(), "team-a".to_string());
        let mut live_tags = HashMap::new();
        live_tags.insert("Owner".to_string(), "team-b".to_string());

        let declared = resource(declared_tags, HashMap::new());
        let live = resource(live_tags, HashMap::new());
        let records = compare(&declared, &live, 0, AnalysisMode::Smart, Utc::now());
        let mismatch = records.iter().find(|r| r.kind == DriftKind::TagMismatch).unwrap();
        assert_eq!(mismatch.severity, Severity::Medium);
        assert_eq!(mismatch.field, "tags.Owner");
    }

    #[test]
    fn non_governance_tag_mismatch_is_low() {
        let mut declared_tags = HashMap::new();
        declared_tags.insert("CostCenter".to_string(), "1".to_string());
        let mut live_tags = HashMap::new();
        live_tags.insert("CostCenter".to_string(), "2".to_string());

        let declared = resource(declared_tags, HashMap::new());
        let live = resource(live_tags, HashMap::new());
        let records = compare(&declared, &live, 0, AnalysisMode::Smart, Utc::now());
        assert_eq!(records[0].severity, Severity::Low);
    }

    #[test]
    fn smart_mode_ignores_allowlisted_fields() {
        let mut declared_props = HashMap::new();
        declared_props.insert("arn".to_string(), Value::String("arn:1".into()));
        let mut live_props = HashMap::new();
        live_props.insert("arn".to_string(), Value::String("arn:2".into()));

        let declared = resource(HashMap::new(), declared_props);
        let live = resource(HashMap::new(), live_props);
        let smart_records = compare(&declared, &live, 0, AnalysisMode::Smart, Utc::now());
        assert!(smart_records.is_empty());

        let deep_records = compare(&declared, &live, 0, AnalysisMode::Deep, Utc::now());
        assert_eq!(deep_records.len(), 1);
    }

    #[test]
    fn high_blast_radius_attribute_mismatch_is_high_severity() {
        let mut declared_props = HashMap::new();
        declared_props.insert("instance_type".to_string(), Value::String("t2.micro".into()));
        let mut live_props = HashMap::new();
        live_props.insert("instance_type".to_string(), Value::String("t2.large".into()));

        let declared = resource(HashMap::new(), declared_props);
        let live = resource(HashMap::new(), live_props);
        let records = compare(&declared, &live, 11, AnalysisMode::Smart, Utc::now());
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn dependency_set_change_is_detected() {
        let mut declared = resource(HashMap::new(), HashMap::new());
        declared.dependencies = vec!["aws_vpc.main".to_string()];
        let live = resource(HashMap::new(), HashMap::new());
        let records = compare(&declared, &live, 0, AnalysisMode::Smart, Utc::now());
        assert!(records.iter().any(|r| r.kind == DriftKind::DependencyChange));
    }
}
