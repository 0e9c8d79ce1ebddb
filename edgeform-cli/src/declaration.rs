//! Declaration files
//!
//! ```json
//! {
//!   "resources": [{"type": "edgeform_appsec_ip_geo_protection", "name": "web",
//!                  "attributes": {"config_id": 43253, "security_policy_id": "pol1", "enabled": true}}],
//!   "data": [{"type": "edgeform_iam_countries", "name": "all"}]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use edgeform_core::resource::{Resource, Value};
use edgeform_core::schema::ResourceSchema;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeclarationFile {
    #[serde(default)]
    resources: Vec<Block>,
    #[serde(default)]
    data: Vec<Block>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Block {
    #[serde(rename = "type")]
    block_type: String,
    name: String,
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl Block {
    fn into_resource(self, read_only: bool) -> Resource {
        let mut resource = Resource::new(self.block_type, self.name).with_read_only(read_only);
        // null means "not set"
        resource.attributes = self
            .attributes
            .iter()
            .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        resource
    }
}

/// Parse declaration JSON into resources followed by data sources
pub fn parse(content: &str) -> Result<Vec<Resource>, String> {
    let file: DeclarationFile =
        serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))?;

    let blocks: Vec<Resource> = file
        .resources
        .into_iter()
        .map(|b| b.into_resource(false))
        .chain(file.data.into_iter().map(|b| b.into_resource(true)))
        .collect();

    let mut seen = HashSet::new();
    for block in &blocks {
        if block.id.name.is_empty() {
            return Err(format!("{}: block name must not be empty", block.id.resource_type));
        }
        if !seen.insert(&block.id) {
            return Err(format!("Duplicate block {}", block.id));
        }
    }
    Ok(blocks)
}

pub fn load(path: &Path) -> Result<Vec<Resource>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse(&content)
}

/// Check every block against the schema of its type
pub fn validate(
    blocks: &[Resource],
    resources: &[ResourceSchema],
    data_sources: &[ResourceSchema],
) -> Result<(), String> {
    let by_name = |schemas: &[ResourceSchema]| -> HashMap<String, ResourceSchema> {
        schemas
            .iter()
            .map(|s| (s.resource_type.clone(), s.clone()))
            .collect()
    };
    let resources = by_name(resources);
    let data_sources = by_name(data_sources);

    let mut all_errors = Vec::new();
    for block in blocks {
        let (schemas, kind) = if block.is_data_source() {
            (&data_sources, "data source")
        } else {
            (&resources, "resource")
        };
        let Some(schema) = schemas.get(&block.id.resource_type) else {
            all_errors.push(format!(
                "{}: unknown {} type '{}'",
                block.id, kind, block.id.resource_type
            ));
            continue;
        };
        if let Err(errors) = schema.validate(&block.attributes) {
            for error in errors {
                all_errors.push(format!("{}: {}", block.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeform_provider::schemas;
    use std::io::Write;

    const DECLARATIONS: &str = r#"{
        "resources": [
            {
                "type": "edgeform_appsec_ip_geo_protection",
                "name": "web",
                "attributes": {"config_id": 43253, "security_policy_id": "pol1", "enabled": true}
            },
            {
                "type": "edgeform_botman_challenge_action",
                "name": "captcha",
                "attributes": {"config_id": 43253, "challenge_action": "{\"testKey\":\"testValue3\"}"}
            }
        ],
        "data": [
            {"type": "edgeform_iam_states", "name": "us", "attributes": {"country": "USA"}},
            {"type": "edgeform_appsec_configuration", "name": "all", "attributes": {"name": null}}
        ]
    }"#;

    fn check(blocks: &[Resource]) -> Result<(), String> {
        validate(blocks, &schemas::resources(), &schemas::data_sources())
    }

    #[test]
    fn parses_resources_and_data() {
        let blocks = parse(DECLARATIONS).unwrap();

        assert_eq!(blocks.len(), 4);
        assert!(!blocks[0].is_data_source());
        assert!(blocks[2].is_data_source());
        assert_eq!(blocks[0].attributes.get("config_id"), Some(&Value::Int(43253)));
        assert!(blocks[3].attributes.is_empty());
        assert_eq!(check(&blocks), Ok(()));
    }

    #[test]
    fn rejects_duplicate_blocks() {
        let err = parse(
            r#"{"resources": [
                {"type": "edgeform_iam_blocked_user_properties", "name": "a"},
                {"type": "edgeform_iam_blocked_user_properties", "name": "a"}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(err, "Duplicate block edgeform_iam_blocked_user_properties.a");
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(parse(r#"{"resource": []}"#).is_err());
    }

    #[test]
    fn reports_every_schema_error() {
        let blocks = parse(
            r#"{
                "resources": [
                    {"type": "edgeform_appsec_ip_geo_protection", "name": "web",
                     "attributes": {"config_id": -1, "security_policy_id": "pol1"}},
                    {"type": "edgeform_appsec_unknown", "name": "x"}
                ],
                "data": [{"type": "edgeform_appsec_ip_geo_protection", "name": "y"}]
            }"#,
        )
        .unwrap();

        let err = check(&blocks).unwrap_err();
        let lines: Vec<&str> = err.lines().collect();
        assert!(lines.iter().any(|l| l.contains("'enabled' is missing")));
        assert!(lines.iter().any(|l| l.contains("Value must be positive")));
        assert!(lines.contains(&"edgeform_appsec_unknown.x: unknown resource type 'edgeform_appsec_unknown'"));
        assert!(lines.iter().any(|l| l.contains("unknown data source type")));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DECLARATIONS.as_bytes()).unwrap();

        assert_eq!(load(file.path()).unwrap().len(), 4);
        assert!(load(Path::new("/nonexistent/main.json")).is_err());
    }
}
