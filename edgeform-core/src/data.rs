//! ResourceData - The attribute set handed to reconcile operations
//!
//! Holds the composite identifier and attribute values of one entity together
//! with its schema. Reads go through typed getters that distinguish an absent
//! attribute ([`AttributeError::NotFound`]) from a present value of the wrong
//! type; writes are staged and validated as a batch so a failed write leaves
//! the set untouched.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::provider::{ErrorKind, ProviderError, ProviderResult};
use crate::resource::Value;
use crate::schema::{ResourceSchema, TypeError};

/// Errors from typed attribute access
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("attribute '{0}' not found")]
    NotFound(String),

    #[error("attribute '{name}' is {got}, expected {expected}")]
    InvalidType {
        name: String,
        expected: &'static str,
        got: String,
    },

    #[error("cannot set attribute '{name}': {reason}")]
    Write { name: String, reason: String },
}

/// Attribute set of one managed entity
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<ResourceSchema>,
    id: Option<String>,
    attributes: HashMap<String, Value>,
}

impl ResourceData {
    pub fn new(schema: Arc<ResourceSchema>) -> Self {
        Self {
            schema,
            id: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Identifier of the entity, or an InvalidId error when none is set
    pub fn require_id(&self) -> ProviderResult<&str> {
        self.id().ok_or_else(|| {
            ProviderError::new(
                ErrorKind::InvalidId,
                format!("{} has no identifier", self.schema.resource_type),
            )
        })
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clear the identifier and every attribute
    pub fn clear(&mut self) {
        self.id = None;
        self.attributes.clear();
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    pub fn into_attributes(self) -> HashMap<String, Value> {
        self.attributes
    }

    /// Declared value, falling back to the schema default
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes
            .get(name)
            .or_else(|| self.schema.get(name).and_then(|s| s.default.as_ref()))
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &'static str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T, AttributeError> {
        let value = self
            .get(name)
            .ok_or_else(|| AttributeError::NotFound(name.to_string()))?;
        extract(value).ok_or_else(|| AttributeError::InvalidType {
            name: name.to_string(),
            expected,
            got: value.type_name(),
        })
    }

    pub fn get_string(&self, name: &str) -> Result<String, AttributeError> {
        self.typed(name, "String", |v| v.as_str().map(str::to_string))
    }

    pub fn get_int(&self, name: &str) -> Result<i64, AttributeError> {
        self.typed(name, "Int", Value::as_int)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, AttributeError> {
        self.typed(name, "Bool", Value::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Result<Vec<Value>, AttributeError> {
        self.typed(name, "List", |v| v.as_list().map(<[Value]>::to_vec))
    }

    /// Like [`get_string`](Self::get_string), but an absent attribute is `None`
    pub fn get_optional_string(&self, name: &str) -> Result<Option<String>, AttributeError> {
        optional(self.get_string(name))
    }

    pub fn get_optional_int(&self, name: &str) -> Result<Option<i64>, AttributeError> {
        optional(self.get_int(name))
    }

    /// Check configurable attributes against the schema. Computed values
    /// stored by an earlier read are skipped.
    pub fn validate(&self) -> ProviderResult<()> {
        let configurable: HashMap<String, Value> = self
            .attributes
            .iter()
            .filter(|(name, _)| !self.schema.get(name).is_some_and(|s| s.is_computed()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let Err(errors) = self.schema.validate(&configurable) else {
            return Ok(());
        };
        let kind = if errors
            .iter()
            .any(|e| matches!(e, TypeError::MissingRequired { .. }))
        {
            ErrorKind::MissingAttribute
        } else {
            ErrorKind::InvalidAttributeType
        };
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(ProviderError::new(kind, message))
    }

    /// Write a batch of values. Every value is checked against the schema
    /// first; nothing is written unless all of them conform.
    pub fn set_all(&mut self, values: HashMap<String, Value>) -> Result<(), AttributeError> {
        for (name, value) in &values {
            let schema = self.schema.get(name).ok_or_else(|| AttributeError::Write {
                name: name.clone(),
                reason: "not declared in schema".to_string(),
            })?;
            schema
                .attr_type
                .validate(value)
                .map_err(|e| AttributeError::Write {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
        }
        self.attributes.extend(values);
        Ok(())
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), AttributeError> {
        self.set_all(HashMap::from([(name.to_string(), value.into())]))
    }

    /// Drop a value, e.g. a computed field the last read could not produce
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }
}

fn optional<T>(result: Result<T, AttributeError>) -> Result<Option<T>, AttributeError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(AttributeError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
