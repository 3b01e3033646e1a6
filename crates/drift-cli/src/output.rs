use drift_domain::{DriftRecord, Perspective};
use drift_graph::{Edge, ResourceNode};

/// Render a perspective's drift records as human-readable text.
pub fn render_drift_text(perspective: &Perspective) -> String {
    if perspective.drifts.is_empty() {
        return "No drift detected.\n".to_string();
    }
    let mut out = String::new();
    for drift in &perspective.drifts {
        out.push_str(&format!(
            "[{}] {} {} — {}\n",
            drift.severity, drift.resource_type, drift.resource_id, drift.description
        ));
    }
    out.push_str(&format!(
        "\n{} drifted of {} declared ({} critical, {} high, {} medium, {} low)\n",
        perspective.summary.total_drifted,
        perspective.summary.total_declared,
        perspective.summary.critical_count,
        perspective.summary.high_count,
        perspective.summary.medium_count,
        perspective.summary.low_count,
    ));
    out
}

pub fn render_drift_records_text(records: &[DriftRecord]) -> String {
    if records.is_empty() {
        return "No retained drift records.\n".to_string();
    }
    let mut out = String::new();
    for drift in records {
        out.push_str(&format!(
            "[{}] {} {} — {}\n",
            drift.severity, drift.resource_type, drift.resource_id, drift.description
        ));
    }
    out
}

/// Render the dependency graph as plain text.
pub fn render_graph_text(nodes: &[ResourceNode], edges: &[Edge]) -> String {
    if nodes.is_empty() {
        return "No graph available. Run `driftctl drift` first.\n".to_string();
    }
    let mut out = String::new();
    for node in nodes {
        out.push_str(&format!("{} ({})\n", node.address, node.resource_type));
        if !node.dependencies.is_empty() {
            out.push_str(&format!("  depends on: {}\n", node.dependencies.join(", ")));
        }
    }
    if !edges.is_empty() {
        out.push_str("\nEdges:\n");
        for edge in edges {
            out.push_str(&format!("  {} -> {} ({:?})\n", edge.from, edge.to, edge.kind));
        }
    }
    out
}

/// Render the dependency graph as Graphviz DOT.
pub fn render_graph_dot(nodes: &[ResourceNode], edges: &[Edge]) -> String {
    let mut out = String::from("digraph drift {\n  rankdir=LR;\n  node [shape=box];\n\n");
    for node in nodes {
        out.push_str(&format!("  \"{}\" [label=\"{}\\n{}\"];\n", node.address, node.name, node.resource_type));
    }
    out.push('\n');
    for edge in edges {
        let style = match edge.kind {
            drift_graph::EdgeKind::Explicit => "solid",
            drift_graph::EdgeKind::Implicit => "dashed",
            drift_graph::EdgeKind::Data => "dotted",
        };
        out.push_str(&format!("  \"{}\" -> \"{}\" [style={}];\n", edge.from, edge.to, style));
    }
    out.push('}');
    out
}
