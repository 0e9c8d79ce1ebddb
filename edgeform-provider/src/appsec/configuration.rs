//! `edgeform_appsec_configuration`: look up security configurations

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use edgeform_core::data::ResourceData;
use edgeform_core::provider::{DataSourceType, ProviderError, ProviderResult};
use edgeform_core::resource::Value;
use edgeform_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use log::debug;

use super::templates;
use crate::client::appsec::{AppSecApi, ConfigurationSummary};
use crate::client::ClientError;
use crate::remote_error;

pub const TYPE_NAME: &str = "edgeform_appsec_configuration";

/// Identifier used when no configuration name is given
pub const ALL_CONFIGURATIONS_ID: &str = "appsec_configurations";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Security configuration versions, by name or all at once")
        .attribute(AttributeSchema::new("name", AttributeType::String))
        .attribute(AttributeSchema::new("config_id", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("latest_version", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("staging_version", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("production_version", AttributeType::Int).computed())
        .attribute(
            AttributeSchema::new("output_text", AttributeType::String)
                .computed()
                .with_description("Text Export representation"),
        )
}

pub struct ConfigurationDataSource {
    client: Arc<dyn AppSecApi>,
}

impl ConfigurationDataSource {
    pub fn new(client: Arc<dyn AppSecApi>) -> Self {
        Self { client }
    }
}

fn render(configs: &[ConfigurationSummary]) -> Option<String> {
    let data = serde_json::to_value(configs).ok()?;
    templates::render(templates::CONFIGURATION, &data).ok()
}

#[async_trait]
impl DataSourceType for ConfigurationDataSource {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.read", TYPE_NAME);
        let name = data.get_optional_string("name")?;
        let configs = self
            .client
            .get_configurations()
            .await
            .map_err(remote_error("get_configurations"))?;

        let Some(name) = name else {
            let mut values = HashMap::new();
            if let Some(text) = render(&configs) {
                values.insert("output_text".to_string(), Value::String(text));
            }
            data.set_all(values)?;
            data.set_id(ALL_CONFIGURATIONS_ID);
            return Ok(());
        };

        let config = configs
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                ProviderError::remote(ClientError::NotFound(format!("configuration '{}'", name)))
            })?;

        let mut values = HashMap::from([
            ("config_id".to_string(), Value::Int(config.id)),
            ("latest_version".to_string(), Value::Int(config.latest_version)),
        ]);
        if let Some(v) = config.staging_version {
            values.insert("staging_version".to_string(), Value::Int(v));
        }
        if let Some(v) = config.production_version {
            values.insert("production_version".to_string(), Value::Int(v));
        }
        if let Some(text) = render(std::slice::from_ref(&config)) {
            values.insert("output_text".to_string(), Value::String(text));
        }
        data.set_all(values)?;
        data.set_id(config.id.to_string());
        Ok(())
    }
}
