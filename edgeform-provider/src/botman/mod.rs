//! Bot management resources and data sources
//!
//! Every [`ObjectKind`] is exposed twice under the same type name: as a
//! resource managing one object, and as a data source listing them.

pub mod object;
pub mod object_list;

use std::sync::Arc;

use edgeform_core::provider::{DataSourceType, ResourceType};
use edgeform_core::reconciler::Reconciler;
use edgeform_core::version::VersionResolver;

use crate::Subprovider;
use crate::client::BotmanApi;
use crate::client::botman::ObjectKind;

/// Type name of the resource and data source for `kind`
pub fn type_name(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::ChallengeAction => "edgeform_botman_challenge_action",
        ObjectKind::ConditionalAction => "edgeform_botman_conditional_action",
        ObjectKind::ServeAlternateAction => "edgeform_botman_serve_alternate_action",
        ObjectKind::CustomDefinedBot => "edgeform_botman_custom_defined_bot",
    }
}

pub struct BotmanSubprovider {
    client: Arc<dyn BotmanApi>,
    versions: VersionResolver,
}

impl BotmanSubprovider {
    pub fn new(client: Arc<dyn BotmanApi>, versions: VersionResolver) -> Self {
        Self { client, versions }
    }
}

impl Subprovider for BotmanSubprovider {
    fn resources(&self) -> Vec<Arc<dyn ResourceType>> {
        ObjectKind::ALL
            .into_iter()
            .map(|kind| {
                Reconciler::new(
                    object::BotmanObject::new(kind, self.client.clone()),
                    self.versions.clone(),
                )
                .into_arc()
            })
            .collect()
    }

    fn data_sources(&self) -> Vec<Arc<dyn DataSourceType>> {
        ObjectKind::ALL
            .into_iter()
            .map(|kind| {
                Arc::new(object_list::BotmanObjectList::new(
                    kind,
                    self.client.clone(),
                    self.versions.clone(),
                )) as Arc<dyn DataSourceType>
            })
            .collect()
    }
}
