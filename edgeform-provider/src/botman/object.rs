//! `edgeform_botman_<kind>` resources
//!
//! The object body is declared as a JSON document. The server assigns the
//! key on create; it is kept in the identifier and the key attribute, and is
//! stripped from the stored document so that a read reproduces what was
//! declared.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use edgeform_core::data::ResourceData;
use edgeform_core::identifier::{IdError, IdFormat, parse_int};
use edgeform_core::provider::{ErrorKind, ProviderError, ProviderResult};
use edgeform_core::reconciler::VersionedEntity;
use edgeform_core::resource::Value;
use edgeform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::type_name;
use crate::client::BotmanApi;
use crate::client::botman::{
    CreateObjectRequest, GetObjectRequest, ObjectKind, Payload, RemoveObjectRequest,
    UpdateObjectRequest,
};
use crate::remote_error;

const ID_FORMAT: IdFormat = IdFormat::new("configID:objectID");

pub fn schema(kind: ObjectKind) -> ResourceSchema {
    ResourceSchema::new(type_name(kind))
        .attribute(AttributeSchema::new("config_id", types::positive_int()).required())
        .attribute(
            AttributeSchema::new(kind.name(), types::json_object())
                .required()
                .with_description("JSON document describing the object"),
        )
        .attribute(AttributeSchema::new(kind.key_attribute(), AttributeType::String).computed())
}

pub struct ObjectKey {
    pub config_id: i64,
    pub object_id: String,
}

pub struct BotmanObject {
    kind: ObjectKind,
    client: Arc<dyn BotmanApi>,
}

impl BotmanObject {
    pub fn new(kind: ObjectKind, client: Arc<dyn BotmanApi>) -> Self {
        Self { kind, client }
    }

    /// Declared document as a JSON object
    fn payload(&self, data: &ResourceData) -> ProviderResult<Payload> {
        let document = data.get_string(self.kind.name())?;
        serde_json::from_str(&document).map_err(|e| {
            ProviderError::new(
                ErrorKind::InvalidAttributeType,
                format!("{} must be a JSON object: {}", self.kind.name(), e),
            )
        })
    }
}

#[async_trait]
impl VersionedEntity for BotmanObject {
    type Key = ObjectKey;
    type Remote = Payload;

    fn type_name(&self) -> &'static str {
        type_name(self.kind)
    }

    fn schema(&self) -> ResourceSchema {
        schema(self.kind)
    }

    fn id_format(&self) -> IdFormat {
        ID_FORMAT
    }

    fn rule_name(&self) -> &'static str {
        self.kind.name()
    }

    fn config_id(&self, key: &ObjectKey) -> i64 {
        key.config_id
    }

    fn key_parts(&self, key: &ObjectKey) -> Vec<String> {
        vec![key.config_id.to_string(), key.object_id.clone()]
    }

    fn parse_key(&self, parts: Vec<String>) -> Result<ObjectKey, IdError> {
        let [config_id, object_id]: [String; 2] =
            parts.try_into().map_err(|parts: Vec<String>| IdError::PartCount {
                expected: 2,
                got: parts.len(),
            })?;
        Ok(ObjectKey {
            config_id: parse_int(&config_id, "configID")?,
            object_id,
        })
    }

    fn declared_key_parts(&self, data: &ResourceData) -> ProviderResult<Vec<Option<String>>> {
        // the object key is assigned on create
        Ok(vec![Some(data.get_int("config_id")?.to_string()), None])
    }

    async fn create(
        &self,
        data: &ResourceData,
        config_id: i64,
        version: i64,
    ) -> ProviderResult<ObjectKey> {
        let req = CreateObjectRequest {
            kind: self.kind,
            config_id,
            version,
            json_payload: self.payload(data)?,
        };
        let created = self
            .client
            .create_object(&req)
            .await
            .map_err(remote_error("create_object"))?;

        let object_id = created
            .get(self.kind.key_field())
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                ProviderError::new(
                    ErrorKind::RemoteApi,
                    format!(
                        "created {} has no '{}'",
                        self.kind,
                        self.kind.key_field()
                    ),
                )
            })?;
        Ok(ObjectKey {
            config_id,
            object_id: object_id.to_string(),
        })
    }

    async fn fetch(&self, key: &ObjectKey, version: i64) -> ProviderResult<Payload> {
        let req = GetObjectRequest {
            kind: self.kind,
            config_id: key.config_id,
            version,
            object_id: key.object_id.clone(),
        };
        self.client
            .get_object(&req)
            .await
            .map_err(remote_error("get_object"))
    }

    async fn update(&self, key: &ObjectKey, version: i64, data: &ResourceData) -> ProviderResult<()> {
        let mut payload = self.payload(data)?;
        payload.insert(
            self.kind.key_field().to_string(),
            serde_json::Value::String(key.object_id.clone()),
        );
        let req = UpdateObjectRequest {
            kind: self.kind,
            config_id: key.config_id,
            version,
            object_id: key.object_id.clone(),
            json_payload: payload,
        };
        self.client
            .update_object(&req)
            .await
            .map_err(remote_error("update_object"))?;
        Ok(())
    }

    async fn disable(&self, key: &ObjectKey, version: i64) -> ProviderResult<()> {
        let req = RemoveObjectRequest {
            kind: self.kind,
            config_id: key.config_id,
            version,
            object_id: key.object_id.clone(),
        };
        self.client
            .remove_object(&req)
            .await
            .map_err(remote_error("remove_object"))
    }

    fn flatten(&self, key: &ObjectKey, remote: &Payload) -> ProviderResult<HashMap<String, Value>> {
        let mut document = remote.clone();
        document.remove(self.kind.key_field());
        let document = serde_json::Value::Object(document).to_string();

        Ok(HashMap::from([
            ("config_id".to_string(), Value::Int(key.config_id)),
            (
                self.kind.key_attribute().to_string(),
                Value::String(key.object_id.clone()),
            ),
            (self.kind.name().to_string(), Value::String(document)),
        ]))
    }
}
