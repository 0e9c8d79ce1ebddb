//! Application security resources and data sources

pub mod configuration;
pub mod ip_geo_protection;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use edgeform_core::provider::{DataSourceType, ResourceType};
use edgeform_core::reconciler::Reconciler;
use edgeform_core::version::{
    ActivationStatus, ConfigVersionSource, ConfigVersions, SourceError, VersionResolver,
};

use crate::Subprovider;
use crate::client::{AppSecApi, ClientError};

/// Configuration versions looked up through the AppSec API
pub struct AppSecVersions {
    client: Arc<dyn AppSecApi>,
}

impl AppSecVersions {
    pub fn new(client: Arc<dyn AppSecApi>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigVersionSource for AppSecVersions {
    async fn config_versions(&self, config_id: i64) -> Result<ConfigVersions, SourceError> {
        let config = self
            .client
            .get_configurations()
            .await?
            .into_iter()
            .find(|c| c.id == config_id)
            .ok_or_else(|| ClientError::NotFound(format!("configuration {}", config_id)))?;
        let latest = self
            .client
            .get_configuration_version(config.id, config.latest_version)
            .await?;
        Ok(ConfigVersions {
            config_id: config.id,
            latest_version: config.latest_version,
            staging: ActivationStatus::parse(&latest.staging.status),
            production: ActivationStatus::parse(&latest.production.status),
        })
    }

    async fn clone_version(&self, config_id: i64, from_version: i64) -> Result<i64, SourceError> {
        Ok(self
            .client
            .create_configuration_version(config_id, from_version)
            .await?)
    }
}

pub struct AppSecSubprovider {
    client: Arc<dyn AppSecApi>,
    versions: VersionResolver,
}

impl AppSecSubprovider {
    pub fn new(client: Arc<dyn AppSecApi>, versions: VersionResolver) -> Self {
        Self { client, versions }
    }
}

impl Subprovider for AppSecSubprovider {
    fn resources(&self) -> Vec<Arc<dyn ResourceType>> {
        vec![
            Reconciler::new(
                ip_geo_protection::IpGeoProtection::new(self.client.clone()),
                self.versions.clone(),
            )
            .into_arc(),
        ]
    }

    fn data_sources(&self) -> Vec<Arc<dyn DataSourceType>> {
        vec![Arc::new(configuration::ConfigurationDataSource::new(
            self.client.clone(),
        ))]
    }
}
