use serde_json::Value;

/// Hand-rolled `${...}` scanner, mirroring the manual brace-matching the
/// teacher uses for its own `{{ }}` template syntax rather than pulling in
/// a regex dependency for one narrow pattern.
pub fn find_interpolations(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'{' {
            let start = i + 2;
            if let Some(len) = s[start..].find('}') {
                out.push(s[start..start + len].trim().to_string());
                i = start + len + 1;
                continue;
            }
        }
        i += 1;
    }
    out
}

/// Recursively walk a JSON attribute tree, collecting every interpolation
/// expression found in string leaves.
pub fn scan_attributes(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    scan_into(value, &mut out);
    out
}

fn scan_into(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(find_interpolations(s)),
        Value::Array(items) => {
            for item in items {
                scan_into(item, out);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                scan_into(v, out);
            }
        }
        _ => {}
    }
}

/// Whether a raw interpolated expression's leading reference is a `data.`
/// source (after stripping any `module.` qualifiers), as opposed to a
/// managed resource reference.
pub fn is_data_reference(expr: &str) -> bool {
    let Some(head) = expr.split(|c: char| c == ' ' || c == '(' || c == ',').next() else {
        return false;
    };
    let mut parts: Vec<&str> = head.split('.').collect();
    while parts.len() >= 2 && parts[0] == "module" {
        parts.drain(0..2);
    }
    parts.first() == Some(&"data")
}

/// Resolve a raw interpolated expression's leading reference to a
/// normalized `type.name` resource address, per the `module.`/`data.`
/// stripping rules. Returns `None` if the expression has fewer than two
/// addressable segments (e.g. a bare variable or local reference).
pub fn normalize_reference(expr: &str) -> Option<String> {
    let head = expr.split(|c: char| c == ' ' || c == '(' || c == ',').next()?;
    let mut parts: Vec<&str> = head.split('.').collect();

    while parts.len() >= 2 && parts[0] == "module" {
        parts.drain(0..2);
    }
    if parts.first() == Some(&"data") {
        parts.remove(0);
    }
    if parts.len() < 2 {
        return None;
    }
    let resource_type = parts[0];
    let name_raw = parts[1];
    let name = name_raw.split('[').next().unwrap_or(name_raw);
    if resource_type.is_empty() || name.is_empty() {
        return None;
    }
    Some(format!("{}.{}", resource_type, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_single_interpolation() {
        let found = find_interpolations("id = ${aws_instance.web.id}");
        assert_eq!(found, vec!["aws_instance.web.id".to_string()]);
    }

    #[test]
    fn finds_multiple_interpolations_in_one_string() {
        let found = find_interpolations("${a.b.id}-${c.d.id}");
        assert_eq!(found, vec!["a.b.id".to_string(), "c.d.id".to_string()]);
    }

    #[test]
    fn scans_nested_attribute_tree() {
        let attrs = json!({
            "vpc_id": "${aws_vpc.main.id}",
            "tags": {"owner": "team"},
            "subnets": ["${aws_subnet.a.id}", "${aws_subnet.b.id}"],
        });
        let mut found = scan_attributes(&attrs);
        found.sort();
        assert_eq!(found, vec!["aws_subnet.a.id", "aws_subnet.b.id", "aws_vpc.main.id"]);
    }

    #[test]
    fn normalizes_plain_reference() {
        assert_eq!(normalize_reference("aws_instance.web.id"), Some("aws_instance.web".into()));
    }

    #[test]
    fn normalizes_indexed_reference() {
        assert_eq!(normalize_reference("aws_instance.web[0].id"), Some("aws_instance.web".into()));
    }

    #[test]
    fn normalizes_module_qualified_reference() {
        assert_eq!(normalize_reference("module.net.aws_subnet.a.id"), Some("aws_subnet.a".into()));
    }

    #[test]
    fn normalizes_data_source_reference() {
        assert_eq!(normalize_reference("data.aws_ami.ubuntu.id"), Some("aws_ami.ubuntu".into()));
    }

    #[test]
    fn rejects_single_segment_expression() {
        assert_eq!(normalize_reference("timestamp()"), None);
    }

    #[test]
    fn recognizes_data_source_reference() {
        assert!(is_data_reference("data.aws_ami.ubuntu.id"));
        assert!(!is_data_reference("aws_instance.web.id"));
    }

    #[test]
    fn recognizes_module_qualified_data_source_reference() {
        assert!(is_data_reference("module.net.data.aws_ami.ubuntu.id"));
    }
}
