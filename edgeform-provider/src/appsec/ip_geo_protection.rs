//! `edgeform_appsec_ip_geo_protection`: network layer controls of a policy
//!
//! Enabling or disabling IP/Geo protection toggles
//! `applyNetworkLayerControls` on the policy's protections. There is nothing
//! to remove, so delete writes `false`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use edgeform_core::data::ResourceData;
use edgeform_core::identifier::{IdError, IdFormat, parse_int};
use edgeform_core::provider::ProviderResult;
use edgeform_core::reconciler::VersionedEntity;
use edgeform_core::resource::Value;
use edgeform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::templates;
use crate::client::appsec::{
    AppSecApi, GetIpGeoProtectionRequest, PolicyProtections, UpdateIpGeoProtectionRequest,
};
use crate::remote_error;

pub const TYPE_NAME: &str = "edgeform_appsec_ip_geo_protection";
const ID_FORMAT: IdFormat = IdFormat::new("configID:securityPolicyID");

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("IP/Geo firewall protection of a security policy")
        .attribute(AttributeSchema::new("config_id", types::positive_int()).required())
        .attribute(AttributeSchema::new("security_policy_id", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("enabled", AttributeType::Bool)
                .required()
                .with_description("Whether network layer controls are applied"),
        )
        .attribute(
            AttributeSchema::new("output_text", AttributeType::String)
                .computed()
                .with_description("Text Export representation"),
        )
}

pub struct PolicyKey {
    pub config_id: i64,
    pub policy_id: String,
}

pub struct IpGeoProtection {
    client: Arc<dyn AppSecApi>,
}

impl IpGeoProtection {
    pub fn new(client: Arc<dyn AppSecApi>) -> Self {
        Self { client }
    }

    async fn apply(&self, key: &PolicyKey, version: i64, enabled: bool) -> ProviderResult<()> {
        let req = UpdateIpGeoProtectionRequest {
            config_id: key.config_id,
            version,
            policy_id: key.policy_id.clone(),
            apply_network_layer_controls: enabled,
        };
        self.client
            .update_ip_geo_protection(&req)
            .await
            .map_err(remote_error("update_ip_geo_protection"))?;
        Ok(())
    }
}

#[async_trait]
impl VersionedEntity for IpGeoProtection {
    type Key = PolicyKey;
    type Remote = PolicyProtections;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    fn id_format(&self) -> IdFormat {
        ID_FORMAT
    }

    fn rule_name(&self) -> &'static str {
        "ipgeoProtection"
    }

    fn config_id(&self, key: &PolicyKey) -> i64 {
        key.config_id
    }

    fn key_parts(&self, key: &PolicyKey) -> Vec<String> {
        vec![key.config_id.to_string(), key.policy_id.clone()]
    }

    fn parse_key(&self, parts: Vec<String>) -> Result<PolicyKey, IdError> {
        let [config_id, policy_id]: [String; 2] =
            parts.try_into().map_err(|parts: Vec<String>| IdError::PartCount {
                expected: 2,
                got: parts.len(),
            })?;
        Ok(PolicyKey {
            config_id: parse_int(&config_id, "configID")?,
            policy_id,
        })
    }

    fn declared_key_parts(&self, data: &ResourceData) -> ProviderResult<Vec<Option<String>>> {
        Ok(vec![
            Some(data.get_int("config_id")?.to_string()),
            Some(data.get_string("security_policy_id")?),
        ])
    }

    async fn create(
        &self,
        data: &ResourceData,
        config_id: i64,
        version: i64,
    ) -> ProviderResult<PolicyKey> {
        let key = PolicyKey {
            config_id,
            policy_id: data.get_string("security_policy_id")?,
        };
        self.apply(&key, version, data.get_bool("enabled")?).await?;
        Ok(key)
    }

    async fn fetch(&self, key: &PolicyKey, version: i64) -> ProviderResult<PolicyProtections> {
        let req = GetIpGeoProtectionRequest {
            config_id: key.config_id,
            version,
            policy_id: key.policy_id.clone(),
        };
        self.client
            .get_ip_geo_protection(&req)
            .await
            .map_err(remote_error("get_ip_geo_protection"))
    }

    async fn update(&self, key: &PolicyKey, version: i64, data: &ResourceData) -> ProviderResult<()> {
        self.apply(key, version, data.get_bool("enabled")?).await
    }

    async fn disable(&self, key: &PolicyKey, version: i64) -> ProviderResult<()> {
        self.apply(key, version, false).await
    }

    fn flatten(
        &self,
        key: &PolicyKey,
        remote: &PolicyProtections,
    ) -> ProviderResult<HashMap<String, Value>> {
        Ok(HashMap::from([
            ("config_id".to_string(), Value::Int(key.config_id)),
            (
                "security_policy_id".to_string(),
                Value::String(key.policy_id.clone()),
            ),
            (
                "enabled".to_string(),
                Value::Bool(remote.apply_network_layer_controls),
            ),
        ]))
    }

    fn render(&self, remote: &PolicyProtections) -> Option<String> {
        let data = serde_json::to_value(remote).ok()?;
        templates::render(templates::NETWORK_PROTECTION, &data).ok()
    }
}
