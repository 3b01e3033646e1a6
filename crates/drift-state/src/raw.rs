use serde::Deserialize;
use serde_json::Value;

/// Raw shape of a Terraform/OpenTofu `terraform.tfstate` file. Unknown
/// top-level keys (`outputs`, `lineage`, `check_results`, ...) are ignored
/// by omission rather than rejected.
#[derive(Debug, Deserialize)]
pub struct RawState {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub terraform_version: Option<String>,
    #[serde(default)]
    pub resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
pub struct RawResource {
    /// `"managed"` or `"data"`.
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
    /// Present for resources declared inside a module, e.g. `module.net`.
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub instances: Vec<RawResourceInstance>,
}

fn default_mode() -> String {
    "managed".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RawResourceInstance {
    /// Present for counted/for_each resources; absent for singletons.
    #[serde(default)]
    pub index_key: Option<Value>,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub dependencies: Vec<String>,
}
