use std::collections::HashMap;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::GraphError;
use crate::interpolate::{is_data_reference, normalize_reference, scan_attributes};
use crate::node::{Edge, EdgeKind, GraphInput, ResourceNode};

/// The resolved dependency graph: nodes in stable input order, the edges
/// that were added, and a petgraph handle for further traversal.
pub struct DependencyGraph {
    pub nodes: HashMap<String, ResourceNode>,
    pub edges: Vec<Edge>,
    pub(crate) graph: DiGraph<String, ()>,
    pub(crate) index_of: HashMap<String, NodeIndex>,
}

/// Two-pass build: nodes first (with explicit `depends_on` wired), then a
/// second pass scanning every instance's attributes for `${...}`
/// interpolations to add implicit edges.
pub fn build(inputs: Vec<GraphInput>) -> Result<DependencyGraph, GraphError> {
    let mut nodes: HashMap<String, ResourceNode> = HashMap::new();
    let mut normalized_index: HashMap<String, Vec<String>> = HashMap::new();

    for input in &inputs {
        let normalized = format!("{}.{}", input.resource_type, input.name);
        normalized_index
            .entry(normalized)
            .or_default()
            .push(input.address.clone());

        nodes.insert(
            input.address.clone(),
            ResourceNode {
                address: input.address.clone(),
                module: input.module.clone(),
                resource_type: input.resource_type.clone(),
                name: input.name.clone(),
                dependencies: Vec::new(),
                dependents: Vec::new(),
                level: -1,
            },
        );
    }

    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index_of: HashMap<String, NodeIndex> = HashMap::new();
    for address in nodes.keys() {
        index_of.insert(address.clone(), graph.add_node(address.clone()));
    }

    let mut edges: Vec<Edge> = Vec::new();
    let mut seen_edges: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();

    // Self-edges are allowed through so a resource that interpolates its own
    // address builds a self-loop, which `is_cyclic_directed` reports as a cycle.
    let mut add_edge = |from: &str,
                         to: &str,
                         kind: EdgeKind,
                         graph: &mut DiGraph<String, ()>,
                         edges: &mut Vec<Edge>,
                         nodes: &mut HashMap<String, ResourceNode>| {
        let key = (from.to_string(), to.to_string());
        if !seen_edges.insert(key) {
            return;
        }
        if let (Some(&fi), Some(&ti)) = (index_of.get(from), index_of.get(to)) {
            graph.add_edge(fi, ti, ());
            edges.push(Edge {
                from: from.to_string(),
                to: to.to_string(),
                kind,
            });
            if let Some(n) = nodes.get_mut(from) {
                n.dependencies.push(to.to_string());
            }
            if let Some(n) = nodes.get_mut(to) {
                n.dependents.push(from.to_string());
            }
        }
    };

    for input in &inputs {
        for dep in &input.depends_on {
            if let Some(target) = resolve_target(dep, &normalized_index, &nodes) {
                add_edge(&input.address, &target, EdgeKind::Explicit, &mut graph, &mut edges, &mut nodes);
            }
        }
        for expr in scan_attributes(&input.attributes) {
            if let Some(normalized) = normalize_reference(&expr) {
                if let Some(target) = resolve_target(&normalized, &normalized_index, &nodes) {
                    let kind = if is_data_reference(&expr) { EdgeKind::Data } else { EdgeKind::Implicit };
                    add_edge(&input.address, &target, kind, &mut graph, &mut edges, &mut nodes);
                }
            }
        }
    }

    if is_cyclic_directed(&graph) {
        return Err(GraphError::DependencyCycleDetected);
    }
    toposort(&graph, None).map_err(|_| GraphError::DependencyCycleDetected)?;

    assign_levels(&mut nodes, &graph, &index_of);

    Ok(DependencyGraph {
        nodes,
        edges,
        graph,
        index_of,
    })
}

/// Resolve a (possibly already-normalized or explicit) reference to the
/// exact node address it targets, preferring an exact address match, then
/// the normalized `type.name` bucket, falling back to `[0]` when multiple
/// instances share a `type.name` and no index was given.
fn resolve_target(
    reference: &str,
    normalized_index: &HashMap<String, Vec<String>>,
    nodes: &HashMap<String, ResourceNode>,
) -> Option<String> {
    if nodes.contains_key(reference) {
        return Some(reference.to_string());
    }
    let normalized = normalize_reference(reference).unwrap_or_else(|| reference.to_string());
    let candidates = normalized_index.get(&normalized)?;
    if candidates.len() == 1 {
        return Some(candidates[0].clone());
    }
    candidates
        .iter()
        .find(|addr| addr.as_str() == normalized || addr.ends_with("[0]"))
        .cloned()
        .or_else(|| candidates.first().cloned())
}

/// Level(node) = 0 if it has no outgoing (dependency) edges; otherwise
/// 1 + max(level of its dependencies). Computed via memoized DFS since the
/// graph is already known acyclic.
fn assign_levels(nodes: &mut HashMap<String, ResourceNode>, graph: &DiGraph<String, ()>, index_of: &HashMap<String, NodeIndex>) {
    let mut memo: HashMap<String, i64> = HashMap::new();
    let addresses: Vec<String> = nodes.keys().cloned().collect();
    for addr in &addresses {
        level_of(addr, graph, index_of, &mut memo);
    }
    for (addr, level) in memo {
        if let Some(n) = nodes.get_mut(&addr) {
            n.level = level;
        }
    }
}

fn level_of(
    addr: &str,
    graph: &DiGraph<String, ()>,
    index_of: &HashMap<String, NodeIndex>,
    memo: &mut HashMap<String, i64>,
) -> i64 {
    if let Some(&level) = memo.get(addr) {
        return level;
    }
    let Some(&idx) = index_of.get(addr) else {
        return -1;
    };
    let deps: Vec<String> = graph
        .neighbors_directed(idx, petgraph::Direction::Outgoing)
        .map(|n| graph[n].clone())
        .collect();
    let level = if deps.is_empty() {
        0
    } else {
        1 + deps.iter().map(|d| level_of(d, graph, index_of, memo)).max().unwrap_or(0)
    };
    memo.insert(addr.to_string(), level);
    level
}
