use serde_json::Value;

use crate::error::StateError;
use crate::raw::RawState;

/// One resource instance pulled out of a state document, address-qualified
/// and normalized the way the Dependency Graph expects to receive them.
#[derive(Debug, Clone)]
pub struct ParsedInstance {
    /// Fully qualified address, e.g. `aws_instance.web[0]` or
    /// `module.net.aws_subnet.a`.
    pub address: String,
    pub module: Option<String>,
    pub resource_type: String,
    pub name: String,
    /// `true` for a `data` source, `false` for a managed resource.
    pub is_data: bool,
    pub depends_on: Vec<String>,
    pub attributes: Value,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedState {
    pub instances: Vec<ParsedInstance>,
}

/// Parse a `terraform.tfstate` JSON document. Tolerant of singleton vs.
/// counted addresses, module-qualified names, data-source vs. managed
/// resources, and interpolation syntax embedded in string attributes (left
/// untouched here; the graph crate scans it).
pub fn parse_state(body: &str) -> Result<ParsedState, StateError> {
    let raw: RawState = serde_json::from_str(body).map_err(|e| StateError::InvalidState(e.to_string()))?;

    let mut instances = Vec::new();
    for resource in raw.resources {
        let is_data = resource.mode == "data";
        for instance in resource.instances {
            let index_suffix = instance.index_key.as_ref().map(format_index_key);
            let base = format!("{}.{}", resource.resource_type, resource.name);
            let local_address = match &index_suffix {
                Some(idx) => format!("{}[{}]", base, idx),
                None => base.clone(),
            };
            // `resource.module`, when present, already carries the `module.`
            // prefix as Terraform writes it (e.g. `module.net`).
            let address = match &resource.module {
                Some(module) => format!("{}.{}", module, local_address),
                None => local_address,
            };

            instances.push(ParsedInstance {
                address,
                module: resource.module.clone(),
                resource_type: resource.resource_type.clone(),
                name: resource.name.clone(),
                is_data,
                depends_on: instance.dependencies,
                attributes: instance.attributes,
            });
        }
    }

    Ok(ParsedState { instances })
}

fn format_index_key(key: &Value) -> String {
    match key {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_singleton_resource() {
        let body = r#"{
            "version": 4,
            "resources": [{
                "mode": "managed", "type": "aws_vpc", "name": "main",
                "instances": [{"attributes": {"id": "vpc-1"}}]
            }]
        }"#;
        let state = parse_state(body).unwrap();
        assert_eq!(state.instances.len(), 1);
        assert_eq!(state.instances[0].address, "aws_vpc.main");
    }

    #[test]
    fn parses_counted_resource_with_index() {
        let body = r#"{
            "resources": [{
                "mode": "managed", "type": "aws_instance", "name": "web",
                "instances": [
                    {"index_key": 0, "attributes": {"id": "i-0"}},
                    {"index_key": 1, "attributes": {"id": "i-1"}}
                ]
            }]
        }"#;
        let state = parse_state(body).unwrap();
        assert_eq!(state.instances.len(), 2);
        assert_eq!(state.instances[0].address, "aws_instance.web[0]");
        assert_eq!(state.instances[1].address, "aws_instance.web[1]");
    }

    #[test]
    fn parses_for_each_resource_with_string_index() {
        let body = r#"{
            "resources": [{
                "mode": "managed", "type": "aws_subnet", "name": "az",
                "instances": [{"index_key": "us-east-1a", "attributes": {}}]
            }]
        }"#;
        let state = parse_state(body).unwrap();
        assert_eq!(state.instances[0].address, "aws_subnet.az[us-east-1a]");
    }

    #[test]
    fn parses_module_qualified_resource() {
        let body = r#"{
            "resources": [{
                "mode": "managed", "type": "aws_subnet", "name": "a", "module": "module.net",
                "instances": [{"attributes": {}}]
            }]
        }"#;
        let state = parse_state(body).unwrap();
        assert_eq!(state.instances[0].address, "module.net.aws_subnet.a");
        assert_eq!(state.instances[0].module.as_deref(), Some("module.net"));
    }

    #[test]
    fn distinguishes_data_sources_from_managed() {
        let body = r#"{
            "resources": [
                {"mode": "managed", "type": "aws_vpc", "name": "main", "instances": [{"attributes": {}}]},
                {"mode": "data", "type": "aws_ami", "name": "ubuntu", "instances": [{"attributes": {}}]}
            ]
        }"#;
        let state = parse_state(body).unwrap();
        assert!(!state.instances[0].is_data);
        assert!(state.instances[1].is_data);
    }

    #[test]
    fn ignores_unknown_top_level_fields() {
        let body = r#"{
            "version": 4, "lineage": "abc", "serial": 3,
            "outputs": {"vpc_id": {"value": "vpc-1"}},
            "resources": []
        }"#;
        let state = parse_state(body).unwrap();
        assert!(state.instances.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        let result = parse_state("not json");
        assert!(matches!(result, Err(StateError::InvalidState(_))));
    }
}
