//! Text tables stored in `output_text`
//!
//! Rendering is best effort: callers drop the error and leave `output_text`
//! unset.

use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template '{0}'")]
    Unknown(String),

    #[error("template '{template}' expects {expected}")]
    Shape {
        template: &'static str,
        expected: &'static str,
    },
}

pub const NETWORK_PROTECTION: &str = "networkProtectionDS";
pub const CONFIGURATION: &str = "configuration";

/// Render the template `name` over `data`
pub fn render(name: &str, data: &Value) -> Result<String, TemplateError> {
    match name {
        NETWORK_PROTECTION => network_protection(data),
        CONFIGURATION => configurations(data),
        other => Err(TemplateError::Unknown(other.to_string())),
    }
}

fn network_protection(data: &Value) -> Result<String, TemplateError> {
    let fields = data.as_object().ok_or(TemplateError::Shape {
        template: NETWORK_PROTECTION,
        expected: "an object",
    })?;

    let mut builder = Builder::default();
    builder.push_record(["PROTECTION", "ENABLED"]);
    for (name, value) in fields {
        builder.push_record([name.clone(), cell(value)]);
    }
    Ok(builder.build().with(Style::ascii()).to_string())
}

fn configurations(data: &Value) -> Result<String, TemplateError> {
    let entries = data.as_array().ok_or(TemplateError::Shape {
        template: CONFIGURATION,
        expected: "a list of configurations",
    })?;

    let mut builder = Builder::default();
    builder.push_record(["ID", "NAME", "LATEST", "STAGING", "PRODUCTION"]);
    for entry in entries {
        let field = |key: &str| entry.get(key).map(cell).unwrap_or_default();
        builder.push_record([
            field("id"),
            field("name"),
            field("latestVersion"),
            field("stagingVersion"),
            field("productionVersion"),
        ]);
    }
    Ok(builder.build().with(Style::ascii()).to_string())
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_protections() {
        let text = render(
            NETWORK_PROTECTION,
            &json!({"applyNetworkLayerControls": false, "applyRateControls": true}),
        )
        .unwrap();

        assert!(text.contains("PROTECTION"));
        assert!(text.contains("applyNetworkLayerControls"));
        assert!(text.contains("false"));
        assert!(text.starts_with('+'));
    }

    #[test]
    fn renders_configurations() {
        let text = render(
            CONFIGURATION,
            &json!([{"id": 43253, "name": "Example", "latestVersion": 15, "productionVersion": 14}]),
        )
        .unwrap();

        assert!(text.contains("43253"));
        assert!(text.contains("Example"));
        assert!(text.contains("14"));
    }

    #[test]
    fn unknown_template_and_wrong_shape_fail() {
        assert_eq!(
            render("nope", &json!({})),
            Err(TemplateError::Unknown("nope".to_string()))
        );
        assert!(render(CONFIGURATION, &json!({})).is_err());
    }
}
