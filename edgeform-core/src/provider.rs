//! Provider - Traits abstracting resource operations
//!
//! A Provider exposes the resource and data source types of one remote
//! platform. Each resource type owns its reconcile cycle
//! (create/read/update/delete/import) over a [`ResourceData`] attribute set.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::data::{AttributeError, ResourceData};
use crate::identifier::IdError;
use crate::resource::ResourceId;
use crate::schema::{ResourceSchema, TypeError};

/// Category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required attribute is absent from configuration
    MissingAttribute,
    /// An attribute is present but has the wrong type
    InvalidAttributeType,
    /// A value read from the platform could not be stored in the attribute set
    AttributeWrite,
    /// A composite identifier has the wrong shape
    InvalidId,
    /// The remote API returned an error
    RemoteApi,
    /// The parent configuration version could not be resolved
    VersionResolution,
    /// No resource or data source type is registered under the name
    UnknownType,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::MissingAttribute => "missing attribute",
            ErrorKind::InvalidAttributeType => "invalid attribute type",
            ErrorKind::AttributeWrite => "attribute write error",
            ErrorKind::InvalidId => "invalid ID",
            ErrorKind::RemoteApi => "remote API error",
            ErrorKind::VersionResolution => "version resolution error",
            ErrorKind::UnknownType => "unknown type",
        };
        write!(f, "{}", s)
    }
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn missing_attribute(name: &str) -> Self {
        Self::new(
            ErrorKind::MissingAttribute,
            format!("required attribute '{}' is missing", name),
        )
    }

    /// Error returned by a remote client; the message is the client's own
    pub fn remote(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::RemoteApi, cause.to_string()).with_cause(cause)
    }

    pub fn unknown_type(type_name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownType,
            format!("Unknown resource type: {}", type_name),
        )
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl From<IdError> for ProviderError {
    fn from(e: IdError) -> Self {
        ProviderError::new(ErrorKind::InvalidId, e.to_string()).with_cause(e)
    }
}

impl From<AttributeError> for ProviderError {
    fn from(e: AttributeError) -> Self {
        let kind = match e {
            AttributeError::NotFound(_) => ErrorKind::MissingAttribute,
            AttributeError::InvalidType { .. } => ErrorKind::InvalidAttributeType,
            AttributeError::Write { .. } => ErrorKind::AttributeWrite,
        };
        ProviderError::new(kind, e.to_string()).with_cause(e)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A resource type and its reconcile cycle
#[async_trait]
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "edgeform_appsec_ip_geo_protection")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;

    /// Create the remote entity from `data` and store its composite identifier
    async fn create(&self, data: &mut ResourceData) -> ProviderResult<()>;

    /// Refresh `data` from the remote entity named by `data.id()`
    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()>;

    /// Push the attributes in `data` to the remote entity, then refresh
    async fn update(&self, data: &mut ResourceData) -> ProviderResult<()>;

    /// Delete (or disable) the remote entity and clear `data`
    async fn delete(&self, data: &mut ResourceData) -> ProviderResult<()>;

    /// Adopt an existing remote entity whose identifier is already in `data`
    async fn import(&self, data: &mut ResourceData) -> ProviderResult<()> {
        self.read(data).await
    }
}

/// A read-only data source type
#[async_trait]
pub trait DataSourceType: Send + Sync {
    fn name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    /// Populate computed attributes and set the identifier
    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()>;
}

/// Main Provider trait
///
/// Implementations receive their remote clients at construction; nothing is
/// looked up from global state.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "edgeform")
    fn name(&self) -> &'static str;

    /// Resource types this Provider can handle
    fn resource_types(&self) -> Vec<Arc<dyn ResourceType>>;

    /// Data source types this Provider can handle
    fn data_source_types(&self) -> Vec<Arc<dyn DataSourceType>>;

    fn resource_type(&self, name: &str) -> Option<Arc<dyn ResourceType>> {
        self.resource_types().into_iter().find(|t| t.name() == name)
    }

    fn data_source_type(&self, name: &str) -> Option<Arc<dyn DataSourceType>> {
        self.data_source_types()
            .into_iter()
            .find(|t| t.name() == name)
    }

    /// Check every registered schema and reject duplicate type names
    fn validate_schemas(&self) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for name in self.resource_types().iter().map(|t| t.name()) {
            if !seen.insert(name) {
                errors.push(TypeError::DuplicateType {
                    name: name.to_string(),
                });
            }
        }
        let mut seen = HashSet::new();
        for name in self.data_source_types().iter().map(|t| t.name()) {
            if !seen.insert(name) {
                errors.push(TypeError::DuplicateType {
                    name: name.to_string(),
                });
            }
        }

        let schemas = self
            .resource_types()
            .iter()
            .map(|t| t.schema())
            .chain(self.data_source_types().iter().map(|t| t.schema()))
            .collect::<Vec<_>>();
        for schema in schemas {
            if let Err(errs) = schema.check() {
                errors.extend(errs);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
