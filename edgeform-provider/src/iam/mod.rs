//! Identity and access management
//!
//! User administration is not versioned, so these types talk to the client
//! directly instead of going through the version resolver.

pub mod blocked_user_properties;
pub mod lists;

use std::sync::Arc;

use edgeform_core::provider::{DataSourceType, ResourceType};

use crate::Subprovider;
use crate::client::IamApi;

pub struct IamSubprovider {
    client: Arc<dyn IamApi>,
}

impl IamSubprovider {
    pub fn new(client: Arc<dyn IamApi>) -> Self {
        Self { client }
    }
}

impl Subprovider for IamSubprovider {
    fn resources(&self) -> Vec<Arc<dyn ResourceType>> {
        vec![Arc::new(blocked_user_properties::BlockedUserProperties::new(
            self.client.clone(),
        ))]
    }

    fn data_sources(&self) -> Vec<Arc<dyn DataSourceType>> {
        lists::data_sources(&self.client)
    }
}
