//! Edgeform Provider
//!
//! Resource and data source types for an edge platform: application
//! security, bot management, certificate provisioning, and identity and
//! access management. Every family receives its remote client at
//! construction; tests build the provider from mock clients.

pub mod appsec;
pub mod botman;
pub mod client;
pub mod config;
pub mod cps;
pub mod iam;
pub mod schemas;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use edgeform_core::provider::{DataSourceType, Provider, ProviderError, ResourceType};
use edgeform_core::version::VersionResolver;
use log::error;

use crate::appsec::{AppSecSubprovider, AppSecVersions};
use crate::botman::BotmanSubprovider;
use crate::client::{AppSecApi, BotmanApi, ClientError, ClientResult, CpsApi, HttpClient, IamApi};
use crate::config::ProviderConfig;
use crate::cps::CpsSubprovider;
use crate::iam::IamSubprovider;

/// Resource and data source types of one entity family
pub trait Subprovider: Send + Sync {
    fn resources(&self) -> Vec<Arc<dyn ResourceType>>;

    fn data_sources(&self) -> Vec<Arc<dyn DataSourceType>>;
}

/// One client per entity family
#[derive(Clone)]
pub struct Clients {
    pub appsec: Arc<dyn AppSecApi>,
    pub botman: Arc<dyn BotmanApi>,
    pub cps: Arc<dyn CpsApi>,
    pub iam: Arc<dyn IamApi>,
}

impl Clients {
    /// Serve every family from a single REST client
    pub fn http(client: HttpClient) -> Self {
        let client = Arc::new(client);
        Self {
            appsec: client.clone(),
            botman: client.clone(),
            cps: client.clone(),
            iam: client,
        }
    }
}

/// The edgeform Provider
pub struct EdgeformProvider {
    resources: Vec<Arc<dyn ResourceType>>,
    data_sources: Vec<Arc<dyn DataSourceType>>,
}

impl EdgeformProvider {
    pub fn new(clients: Clients) -> Self {
        let versions =
            VersionResolver::new(Arc::new(AppSecVersions::new(clients.appsec.clone())));
        let subproviders: Vec<Box<dyn Subprovider>> = vec![
            Box::new(AppSecSubprovider::new(clients.appsec, versions.clone())),
            Box::new(BotmanSubprovider::new(clients.botman, versions)),
            Box::new(CpsSubprovider::new(clients.cps)),
            Box::new(IamSubprovider::new(clients.iam)),
        ];

        Self {
            resources: subproviders.iter().flat_map(|s| s.resources()).collect(),
            data_sources: subproviders.iter().flat_map(|s| s.data_sources()).collect(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> ClientResult<Self> {
        Ok(Self::new(Clients::http(HttpClient::new(config)?)))
    }
}

impl Provider for EdgeformProvider {
    fn name(&self) -> &'static str {
        "edgeform"
    }

    fn resource_types(&self) -> Vec<Arc<dyn ResourceType>> {
        self.resources.clone()
    }

    fn data_source_types(&self) -> Vec<Arc<dyn DataSourceType>> {
        self.data_sources.clone()
    }
}

/// Log a failed client call and convert it into a provider error
pub(crate) fn remote_error(method: &'static str) -> impl Fn(ClientError) -> ProviderError {
    move |e| {
        error!("calling '{}': {}", method, e);
        ProviderError::remote(e)
    }
}
