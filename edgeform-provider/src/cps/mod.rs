//! Certificate provisioning data sources

pub mod enrollment;

use std::sync::Arc;

use edgeform_core::provider::{DataSourceType, ResourceType};

use crate::Subprovider;
use crate::client::CpsApi;

pub struct CpsSubprovider {
    client: Arc<dyn CpsApi>,
}

impl CpsSubprovider {
    pub fn new(client: Arc<dyn CpsApi>) -> Self {
        Self { client }
    }
}

impl Subprovider for CpsSubprovider {
    fn resources(&self) -> Vec<Arc<dyn ResourceType>> {
        vec![]
    }

    fn data_sources(&self) -> Vec<Arc<dyn DataSourceType>> {
        vec![Arc::new(enrollment::EnrollmentDataSource::new(
            self.client.clone(),
        ))]
    }
}
