//! Reconciler - Shared reconcile cycle for versioned configuration objects
//!
//! Objects that live inside a versioned security configuration all follow
//! the same cycle: writes go to a modifiable version, reads come from the
//! latest one, and the composite identifier carries the configuration id
//! plus the object's local key. [`Reconciler`] drives that cycle; a
//! [`VersionedEntity`] supplies only the entity-specific remote calls and
//! attribute mapping.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::data::ResourceData;
use crate::identifier::{IdError, IdFormat};
use crate::provider::{ProviderResult, ResourceType};
use crate::resource::Value;
use crate::schema::ResourceSchema;
use crate::version::VersionResolver;

/// Attribute holding the parent configuration id
pub const CONFIG_ID_ATTR: &str = "config_id";

/// Attribute holding rendered text output, when a schema declares it
pub const OUTPUT_TEXT_ATTR: &str = "output_text";

/// Entity-specific half of a versioned resource type
#[async_trait]
pub trait VersionedEntity: Send + Sync {
    /// Decoded composite identifier
    type Key: Send + Sync;
    /// Entity as returned by the platform
    type Remote: Send + Sync;

    fn type_name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    fn id_format(&self) -> IdFormat;

    /// Label used when a new configuration version has to be cloned
    fn rule_name(&self) -> &'static str;

    fn config_id(&self, key: &Self::Key) -> i64;

    /// Identifier parts in [`id_format`](Self::id_format) order
    fn key_parts(&self, key: &Self::Key) -> Vec<String>;

    fn parse_key(&self, parts: Vec<String>) -> Result<Self::Key, IdError>;

    /// Identifier parts pinned by the declared attributes, in
    /// [`id_format`](Self::id_format) order; `None` for parts the platform
    /// assigns
    fn declared_key_parts(&self, data: &ResourceData) -> ProviderResult<Vec<Option<String>>>;

    /// Create the entity in `version` and return its key
    async fn create(
        &self,
        data: &ResourceData,
        config_id: i64,
        version: i64,
    ) -> ProviderResult<Self::Key>;

    async fn fetch(&self, key: &Self::Key, version: i64) -> ProviderResult<Self::Remote>;

    async fn update(&self, key: &Self::Key, version: i64, data: &ResourceData)
    -> ProviderResult<()>;

    /// Remove or disable the entity in `version`
    async fn disable(&self, key: &Self::Key, version: i64) -> ProviderResult<()>;

    /// Attribute values for the fetched entity
    fn flatten(
        &self,
        key: &Self::Key,
        remote: &Self::Remote,
    ) -> ProviderResult<HashMap<String, Value>>;

    /// Text rendering stored in `output_text`
    fn render(&self, _remote: &Self::Remote) -> Option<String> {
        None
    }
}

/// Resource type driving a [`VersionedEntity`] through its reconcile cycle
pub struct Reconciler<E> {
    entity: E,
    versions: VersionResolver,
}

impl<E: VersionedEntity> Reconciler<E> {
    pub fn new(entity: E, versions: VersionResolver) -> Self {
        Self { entity, versions }
    }

    pub fn into_arc(self) -> Arc<dyn ResourceType>
    where
        E: 'static,
    {
        Arc::new(self)
    }

    fn key(&self, data: &ResourceData) -> ProviderResult<E::Key> {
        let parts = self.entity.id_format().decode(data.require_id()?)?;
        Ok(self.entity.parse_key(parts)?)
    }

    async fn refresh(&self, key: &E::Key, data: &mut ResourceData) -> ProviderResult<()> {
        let config_id = self.entity.config_id(key);
        let version = self.versions.latest(config_id).await?;
        let remote = self.entity.fetch(key, version).await?;

        let mut values = self.entity.flatten(key, &remote)?;
        if data.schema().get(OUTPUT_TEXT_ATTR).is_none() {
            data.set_all(values)?;
            return Ok(());
        }
        let text = self.entity.render(&remote);
        if let Some(text) = &text {
            values.insert(OUTPUT_TEXT_ATTR.to_string(), Value::String(text.clone()));
        }
        data.set_all(values)?;
        if text.is_none() {
            data.unset(OUTPUT_TEXT_ATTR);
        }
        Ok(())
    }
}

#[async_trait]
impl<E: VersionedEntity> ResourceType for Reconciler<E> {
    fn name(&self) -> &'static str {
        self.entity.type_name()
    }

    fn schema(&self) -> ResourceSchema {
        self.entity.schema()
    }

    async fn create(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.create", self.name());
        data.validate()?;
        self.entity
            .id_format()
            .check_declared(&self.entity.declared_key_parts(data)?)?;

        let config_id = data.get_int(CONFIG_ID_ATTR)?;
        let version = self
            .versions
            .modifiable(config_id, self.entity.rule_name())
            .await?;
        let key = self.entity.create(data, config_id, version).await?;

        let id = self.entity.id_format().encode(&self.entity.key_parts(&key))?;
        data.set_id(id);
        self.refresh(&key, data).await
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.read", self.name());
        let key = self.key(data)?;
        self.refresh(&key, data).await
    }

    async fn update(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.update", self.name());
        data.validate()?;

        let key = self.key(data)?;
        let declared = self.entity.declared_key_parts(data)?;
        self.entity
            .id_format()
            .verify_unchanged(data.require_id()?, &declared)?;

        let version = self
            .versions
            .modifiable(self.entity.config_id(&key), self.entity.rule_name())
            .await?;
        self.entity.update(&key, version, data).await?;
        self.refresh(&key, data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.delete", self.name());
        let key = self.key(data)?;
        let version = self
            .versions
            .modifiable(self.entity.config_id(&key), self.entity.rule_name())
            .await?;
        self.entity.disable(&key, version).await?;
        data.clear();
        Ok(())
    }

    async fn import(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.import", self.name());
        let key = self.key(data)?;
        self.refresh(&key, data).await
    }
}
