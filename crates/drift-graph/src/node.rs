use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One resource instance as surfaced by the state parser, the raw input to
/// graph construction. Decoupled from `drift-state`'s own types so this
/// crate has no dependency on it; `drift-engine` adapts between the two.
#[derive(Debug, Clone)]
pub struct GraphInput {
    /// Fully qualified instance address, e.g. `aws_instance.web[0]` or
    /// `module.net.aws_subnet.a`.
    pub address: String,
    pub module: Option<String>,
    pub resource_type: String,
    pub name: String,
    /// Explicit `depends_on` addresses, in raw (unnormalized) form.
    pub depends_on: Vec<String>,
    /// Attribute tree scanned for `${...}` interpolations.
    pub attributes: Value,
}

/// A node in the resolved dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    pub address: String,
    pub module: Option<String>,
    pub resource_type: String,
    pub name: String,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    pub level: i64,
}

/// How an edge was discovered: an explicit `depends_on` entry, a `${...}`
/// interpolation into another managed resource, or one into a `data.` source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Explicit,
    Implicit,
    Data,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}
