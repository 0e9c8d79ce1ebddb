//! Application security configurations and their versioned sub-objects

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ClientResult;

/// One security configuration with its version pointers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSummary {
    pub id: i64,
    pub name: String,
    pub latest_version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_version: Option<i64>,
}

/// Where one configuration version is activated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationVersion {
    pub version: i64,
    #[serde(default)]
    pub staging: NetworkActivation,
    #[serde(default)]
    pub production: NetworkActivation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkActivation {
    /// `Active`, `Inactive`, `Pending` or `Deactivated`
    pub status: String,
}

impl Default for NetworkActivation {
    fn default() -> Self {
        Self {
            status: "Inactive".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetIpGeoProtectionRequest {
    pub config_id: i64,
    pub version: i64,
    pub policy_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIpGeoProtectionRequest {
    pub config_id: i64,
    pub version: i64,
    pub policy_id: String,
    pub apply_network_layer_controls: bool,
}

/// Protection toggles of one security policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyProtections {
    #[serde(default)]
    pub apply_api_constraints: bool,
    #[serde(default)]
    pub apply_application_layer_controls: bool,
    #[serde(default)]
    pub apply_botman_controls: bool,
    #[serde(default)]
    pub apply_network_layer_controls: bool,
    #[serde(default)]
    pub apply_rate_controls: bool,
    #[serde(default)]
    pub apply_reputation_controls: bool,
    #[serde(default)]
    pub apply_slow_post_controls: bool,
}

#[async_trait]
pub trait AppSecApi: Send + Sync {
    async fn get_configurations(&self) -> ClientResult<Vec<ConfigurationSummary>>;

    async fn get_configuration_version(
        &self,
        config_id: i64,
        version: i64,
    ) -> ClientResult<ConfigurationVersion>;

    /// Clone `from_version` into a new version and return its number
    async fn create_configuration_version(
        &self,
        config_id: i64,
        from_version: i64,
    ) -> ClientResult<i64>;

    async fn get_ip_geo_protection(
        &self,
        req: &GetIpGeoProtectionRequest,
    ) -> ClientResult<PolicyProtections>;

    async fn update_ip_geo_protection(
        &self,
        req: &UpdateIpGeoProtectionRequest,
    ) -> ClientResult<PolicyProtections>;
}
