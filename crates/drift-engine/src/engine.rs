use std::collections::HashMap;

use chrono::{DateTime, Utc};
use drift_domain::{Perspective, Provider as ProviderKind, Resource};
use drift_graph::{build, Edge, GraphInput, ResourceNode};
use drift_state::{parse_state, ParsedInstance};
use serde_json::Value;
use uuid::Uuid;

use crate::classify::{self, AnalysisMode};
use crate::correlate::correlate;
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub provider: ProviderKind,
    pub region: Option<String>,
    /// Raw `terraform.tfstate` JSON document.
    pub state_body: String,
    /// Live resources for this provider, typically the Hub cache's current slice.
    pub live: Vec<Resource>,
    pub mode: AnalysisMode,
}

/// A completed analysis: the drift perspective plus the dependency graph
/// built from the same state document, for callers that want to render it
/// (e.g. the API's `/graph` endpoint) without re-parsing the state.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub perspective: Perspective,
    pub graph_nodes: Vec<ResourceNode>,
    pub graph_edges: Vec<Edge>,
}

fn to_declared_resource(instance: &ParsedInstance, provider: ProviderKind, now: DateTime<Utc>) -> Resource {
    let id = instance
        .attributes
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| instance.address.clone());
    let region = instance
        .attributes
        .get("region")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();
    let tags = instance
        .attributes
        .get("tags")
        .and_then(Value::as_object)
        .map(|m| m.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect())
        .unwrap_or_default();
    let properties = instance
        .attributes
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|(key, _)| !matches!(key.as_str(), "id" | "region" | "tags"))
        .collect();

    Resource {
        id,
        name: instance.name.clone(),
        resource_type: instance.resource_type.clone(),
        provider,
        region,
        account: None,
        status: "declared".to_string(),
        tags,
        properties,
        dependencies: instance.depends_on.clone(),
        modified_at: None,
        last_scanned: Some(now),
    }
}

fn to_graph_input(instance: &ParsedInstance) -> GraphInput {
    GraphInput {
        address: instance.address.clone(),
        module: instance.module.clone(),
        resource_type: instance.resource_type.clone(),
        name: instance.name.clone(),
        depends_on: instance.depends_on.clone(),
        attributes: instance.attributes.clone(),
    }
}

/// Parse a declared state, correlate it against a live snapshot, and compute
/// a full [`Perspective`] with the drift records it implies. `quick` mode
/// skips attribute comparison entirely and reports structural drift only.
pub fn analyze(request: AnalysisRequest, now: DateTime<Utc>) -> Result<AnalysisOutcome, EngineError> {
    let parsed = parse_state(&request.state_body)?;
    let managed: Vec<&ParsedInstance> = parsed.instances.iter().filter(|i| !i.is_data).collect();

    let mut id_to_address: HashMap<String, String> = HashMap::new();
    let declared: Vec<Resource> = managed
        .iter()
        .map(|instance| {
            let resource = to_declared_resource(instance, request.provider, now);
            id_to_address.insert(resource.id.clone(), instance.address.clone());
            resource
        })
        .collect();

    let graph_inputs: Vec<GraphInput> = parsed.instances.iter().map(to_graph_input).collect();
    let graph = build(graph_inputs)?;
    let critical_path: std::collections::HashSet<String> = graph.critical_path().into_iter().collect();

    let correlation = correlate(declared.clone(), request.live.clone());
    let mut drifts = Vec::new();

    for declared_resource in &correlation.missing {
        let address = id_to_address.get(&declared_resource.id);
        let blast_radius = address.map(|a| graph.blast_radius(a).len()).unwrap_or(0);
        let on_critical_path = address.map(|a| critical_path.contains(a)).unwrap_or(false);
        drifts.push(classify::missing_in_cloud(declared_resource, blast_radius, on_critical_path, now));
    }

    for live_resource in &correlation.unmanaged {
        drifts.push(classify::unmanaged_in_cloud(live_resource, now));
    }

    if request.mode != AnalysisMode::Quick {
        for (declared_resource, live_resource) in &correlation.matched {
            let address = id_to_address.get(&declared_resource.id);
            let blast_radius = address.map(|a| graph.blast_radius(a).len()).unwrap_or(0);
            drifts.extend(classify::compare(declared_resource, live_resource, blast_radius, request.mode, now));
        }
    }

    let graph_nodes: Vec<ResourceNode> = graph.nodes.values().cloned().collect();
    let graph_edges = graph.edges.clone();

    let perspective = Perspective::summarize(
        Uuid::new_v4().to_string(),
        request.provider,
        request.region,
        now,
        declared,
        request.live,
        drifts,
    );

    Ok(AnalysisOutcome { perspective, graph_nodes, graph_edges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn live_resource(id: &str, resource_type: &str) -> Resource {
        Resource {
            id: id.to_string(),
            name: "web".to_string(),
            resource_type: resource_type.to_string(),
            provider: ProviderKind::Aws,
            region: "us-east-1".to_string(),
            account: None,
            status: "running".to_string(),
            tags: Map::new(),
            properties: Map::new(),
            dependencies: vec![],
            modified_at: None,
            last_scanned: None,
        }
    }

    fn state_with_instance(id: &str) -> String {
        format!(
            r#"{{"resources": [{{"mode": "managed", "type": "aws_instance", "name": "web",
                "instances": [{{"attributes": {{"id": "{}", "region": "us-east-1"}}}}]}}]}}"#,
            id
        )
    }

    #[test]
    fn matched_resource_with_no_diff_produces_no_drift() {
        let request = AnalysisRequest {
            provider: ProviderKind::Aws,
            region: Some("us-east-1".into()),
            state_body: state_with_instance("i-1"),
            live: vec![live_resource("i-1", "aws_instance")],
            mode: AnalysisMode::Smart,
        };
        let outcome = analyze(request, Utc::now()).unwrap();
        assert!(outcome.perspective.drifts.is_empty());
        assert_eq!(outcome.perspective.summary.total_drifted, 0);
        assert_eq!(outcome.graph_nodes.len(), 1);
    }

    #[test]
    fn declared_without_live_counterpart_is_missing() {
        let request = AnalysisRequest {
            provider: ProviderKind::Aws,
            region: Some("us-east-1".into()),
            state_body: state_with_instance("i-1"),
            live: vec![],
            mode: AnalysisMode::Smart,
        };
        let outcome = analyze(request, Utc::now()).unwrap();
        assert_eq!(outcome.perspective.drifts.len(), 1);
        assert_eq!(outcome.perspective.drifts[0].kind, drift_domain::DriftKind::MissingInCloud);
    }

    #[test]
    fn live_without_declaration_is_unmanaged() {
        let request = AnalysisRequest {
            provider: ProviderKind::Aws,
            region: Some("us-east-1".into()),
            state_body: r#"{"resources": []}"#.to_string(),
            live: vec![live_resource("i-1", "aws_instance")],
            mode: AnalysisMode::Smart,
        };
        let outcome = analyze(request, Utc::now()).unwrap();
        assert_eq!(outcome.perspective.drifts.len(), 1);
        assert_eq!(outcome.perspective.drifts[0].kind, drift_domain::DriftKind::UnmanagedInCloud);
    }

    #[test]
    fn quick_mode_skips_attribute_comparison() {
        let mut live = live_resource("i-1", "aws_instance");
        live.tags.insert("Owner".to_string(), "someone".to_string());
        let request = AnalysisRequest {
            provider: ProviderKind::Aws,
            region: Some("us-east-1".into()),
            state_body: state_with_instance("i-1"),
            live: vec![live],
            mode: AnalysisMode::Quick,
        };
        let outcome = analyze(request, Utc::now()).unwrap();
        assert!(outcome.perspective.drifts.is_empty());
    }

    #[test]
    fn invalid_state_surfaces_as_engine_error() {
        let request = AnalysisRequest {
            provider: ProviderKind::Aws,
            region: None,
            state_body: "not json".to_string(),
            live: vec![],
            mode: AnalysisMode::Smart,
        };
        assert!(analyze(request, Utc::now()).is_err());
    }
}
