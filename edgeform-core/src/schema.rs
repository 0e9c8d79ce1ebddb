//! Schema - Define type schemas for resources and data sources
//!
//! Every resource type declares a field table: name, type, and exactly one of
//! required / optional / computed. Declared blocks are validated against it
//! before any remote call is made, and values read back from the platform are
//! validated again before they are written into the attribute set.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map with uniform value type
    Map(Box<AttributeType>),
    /// Nested object with a fixed set of fields
    Object(Vec<(String, AttributeType)>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Object(fields), Value::Map(map)) => {
                for (k, v) in map {
                    let field_type = fields
                        .iter()
                        .find(|(name, _)| name == k)
                        .map(|(_, t)| t)
                        .ok_or_else(|| TypeError::UnknownAttribute { name: k.clone() })?;
                    field_type
                        .validate(v)
                        .map_err(|e| TypeError::MapValueError {
                            key: k.clone(),
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Object(fields) => {
                let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
                format!("Object{{{}}}", names.join(", "))
            }
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set in configuration")]
    ComputedAttribute { name: String },

    #[error("Invalid default for attribute '{name}': {reason}")]
    InvalidDefault { name: String, reason: String },

    #[error("Duplicate type name '{name}'")]
    DuplicateType { name: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

/// How an attribute is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMode {
    /// Must be set in configuration
    Required,
    /// May be set in configuration, possibly with a default
    Optional,
    /// Only ever set by reading the remote entity
    Computed,
}

impl fmt::Display for AttributeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeMode::Required => write!(f, "required"),
            AttributeMode::Optional => write!(f, "optional"),
            AttributeMode::Computed => write!(f, "computed"),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub mode: AttributeMode,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            mode: AttributeMode::Optional,
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.mode = AttributeMode::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.mode = AttributeMode::Computed;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.mode == AttributeMode::Required
    }

    pub fn is_computed(&self) -> bool {
        self.mode == AttributeMode::Computed
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    /// Attribute schemas sorted by name
    pub fn sorted_attributes(&self) -> Vec<&AttributeSchema> {
        let mut attrs: Vec<&AttributeSchema> = self.attributes.values().collect();
        attrs.sort_by(|a, b| a.name.cmp(&b.name));
        attrs
    }

    /// Check the field table itself: defaults are only allowed on optional
    /// attributes and must conform to the attribute type.
    pub fn check(&self) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for attr in self.sorted_attributes() {
            let Some(default) = &attr.default else {
                continue;
            };
            if attr.mode != AttributeMode::Optional {
                errors.push(TypeError::InvalidDefault {
                    name: attr.name.clone(),
                    reason: format!("{} attributes cannot have a default", attr.mode),
                });
            } else if let Err(e) = attr.attr_type.validate(default) {
                errors.push(TypeError::InvalidDefault {
                    name: attr.name.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate declared attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        // Check required attributes
        for attr in self.sorted_attributes() {
            if attr.is_required() && !attributes.contains_key(&attr.name) {
                errors.push(TypeError::MissingRequired {
                    name: attr.name.clone(),
                });
            }
        }

        let mut names: Vec<&String> = attributes.keys().collect();
        names.sort();

        // Type check each attribute
        for name in names {
            let value = &attributes[name];
            match self.attributes.get(name) {
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
                Some(schema) if schema.is_computed() => {
                    errors.push(TypeError::ComputedAttribute { name: name.clone() })
                }
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(value) {
                        errors.push(e);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// String holding a JSON object (e.g., a bot management action payload)
    pub fn json_object() -> AttributeType {
        AttributeType::Custom {
            name: "JsonObject".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                let Value::String(s) = value else {
                    return Err("Expected string".to_string());
                };
                match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(serde_json::Value::Object(_)) => Ok(()),
                    Ok(_) => Err("JSON document must be an object".to_string()),
                    Err(e) => Err(format!("Invalid JSON: {}", e)),
                }
            },
        }
    }

    /// List of strings
    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }

    /// Nested object type built from (field, type) pairs
    pub fn object(fields: &[(&str, AttributeType)]) -> AttributeType {
        AttributeType::Object(
            fields
                .iter()
                .map(|(name, t)| (name.to_string(), t.clone()))
                .collect(),
        )
    }

    /// List of nested objects
    pub fn object_list(fields: &[(&str, AttributeType)]) -> AttributeType {
        AttributeType::List(Box::new(object(fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(43253)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
        assert!(matches!(
            t.validate(&Value::String("1".to_string())),
            Err(TypeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn validate_json_object() {
        let t = types::json_object();
        assert!(t.validate(&Value::from(r#"{"testKey":"testValue3"}"#)).is_ok());
        assert!(t.validate(&Value::from("[1,2]")).is_err());
        assert!(t.validate(&Value::from("{not json")).is_err());
    }

    #[test]
    fn validate_object_list() {
        let t = types::object_list(&[
            ("domain", AttributeType::String),
            ("port", AttributeType::Int),
        ]);

        let mut entry = HashMap::new();
        entry.insert("domain".to_string(), Value::from("example.com"));
        entry.insert("port".to_string(), Value::Int(443));
        assert!(t.validate(&Value::List(vec![Value::Map(entry.clone())])).is_ok());

        entry.insert("unknown".to_string(), Value::Bool(true));
        assert!(t.validate(&Value::List(vec![Value::Map(entry)])).is_err());
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("config_id", types::positive_int()).required())
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool))
            .attribute(AttributeSchema::new("output_text", AttributeType::String).computed());

        let mut attrs = HashMap::new();
        attrs.insert("config_id".to_string(), Value::Int(43253));
        attrs.insert("enabled".to_string(), Value::Bool(true));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("config_id", AttributeType::Int).required());

        let result = schema.validate(&HashMap::new());
        assert_eq!(
            result.unwrap_err(),
            vec![TypeError::MissingRequired {
                name: "config_id".to_string()
            }]
        );
    }

    #[test]
    fn computed_and_unknown_attributes_are_rejected() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("output_text", AttributeType::String).computed());

        let mut attrs = HashMap::new();
        attrs.insert("output_text".to_string(), Value::from("text"));
        attrs.insert("bogus".to_string(), Value::Int(1));

        let errors = schema.validate(&attrs).unwrap_err();
        assert!(errors.contains(&TypeError::ComputedAttribute {
            name: "output_text".to_string()
        }));
        assert!(errors.contains(&TypeError::UnknownAttribute {
            name: "bogus".to_string()
        }));
    }

    #[test]
    fn check_rejects_defaults_outside_optional() {
        let schema = ResourceSchema::new("resource")
            .attribute(
                AttributeSchema::new("enabled", AttributeType::Bool)
                    .required()
                    .with_default(true),
            )
            .attribute(AttributeSchema::new("count", AttributeType::Int).with_default("three"))
            .attribute(AttributeSchema::new("flag", AttributeType::Bool).with_default(false));

        let errors = schema.check().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, TypeError::InvalidDefault { .. })));
    }
}
