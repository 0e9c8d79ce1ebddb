//! `edgeform_botman_<kind>` data sources

use std::sync::Arc;

use async_trait::async_trait;
use edgeform_core::data::ResourceData;
use edgeform_core::identifier::encode;
use edgeform_core::provider::{DataSourceType, ProviderResult};
use edgeform_core::reconciler::CONFIG_ID_ATTR;
use edgeform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use edgeform_core::version::VersionResolver;
use log::debug;

use super::type_name;
use crate::client::BotmanApi;
use crate::client::botman::{GetObjectListRequest, ObjectKind};
use crate::remote_error;

pub fn schema(kind: ObjectKind) -> ResourceSchema {
    ResourceSchema::new(type_name(kind))
        .attribute(AttributeSchema::new(CONFIG_ID_ATTR, types::positive_int()).required())
        .attribute(
            AttributeSchema::new(kind.key_attribute(), AttributeType::String)
                .with_description("Only return the object with this key"),
        )
        .attribute(
            AttributeSchema::new("json", AttributeType::String)
                .computed()
                .with_description("Compact JSON of the list response"),
        )
}

/// Lists objects of one kind in the latest configuration version
pub struct BotmanObjectList {
    kind: ObjectKind,
    client: Arc<dyn BotmanApi>,
    versions: VersionResolver,
}

impl BotmanObjectList {
    pub fn new(kind: ObjectKind, client: Arc<dyn BotmanApi>, versions: VersionResolver) -> Self {
        Self {
            kind,
            client,
            versions,
        }
    }
}

#[async_trait]
impl DataSourceType for BotmanObjectList {
    fn name(&self) -> &'static str {
        type_name(self.kind)
    }

    fn schema(&self) -> ResourceSchema {
        schema(self.kind)
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.read", self.name());
        let config_id = data.get_int(CONFIG_ID_ATTR)?;
        let object_id = data
            .get_optional_string(self.kind.key_attribute())?
            .filter(|id| !id.is_empty());
        let version = self.versions.latest(config_id).await?;

        let req = GetObjectListRequest {
            kind: self.kind,
            config_id,
            version,
            object_id: object_id.clone(),
        };
        let list = self
            .client
            .get_object_list(&req)
            .await
            .map_err(remote_error("get_object_list"))?;

        data.set("json", list.to_json().to_string())?;
        let id = match object_id {
            Some(object_id) => encode(&[config_id.to_string(), object_id])?,
            None => config_id.to_string(),
        };
        data.set_id(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appsec::AppSecVersions;
    use crate::testing::{MockAppSec, MockBotman, payload};
    use serde_json::json;

    fn source(botman: &Arc<MockBotman>) -> BotmanObjectList {
        let appsec = Arc::new(MockAppSec::with_config(43253, 15, None, None));
        BotmanObjectList::new(
            ObjectKind::ChallengeAction,
            botman.clone(),
            VersionResolver::new(Arc::new(AppSecVersions::new(appsec))),
        )
    }

    fn seeded() -> Arc<MockBotman> {
        let botman = Arc::new(MockBotman::assigning("unused"));
        botman.insert(payload(json!({"actionId": "a1", "testKey": "testValue1"})));
        botman.insert(payload(json!({"actionId": "a2", "testKey": "testValue2"})));
        botman
    }

    #[tokio::test]
    async fn lists_all_objects() {
        let botman = seeded();
        let mut data = ResourceData::new(Arc::new(schema(ObjectKind::ChallengeAction)));
        data.set("config_id", 43253i64).unwrap();

        source(&botman).read(&mut data).await.unwrap();

        assert_eq!(data.id(), Some("43253"));
        assert_eq!(
            data.get_string("json").unwrap(),
            r#"{"challengeActions":[{"actionId":"a1","testKey":"testValue1"},{"actionId":"a2","testKey":"testValue2"}]}"#
        );
        assert_eq!(botman.list_requests.lock().unwrap()[0].version, 15);
    }

    #[tokio::test]
    async fn filter_returns_matching_object_only() {
        let botman = seeded();
        let mut data = ResourceData::new(Arc::new(schema(ObjectKind::ChallengeAction)));
        data.set("config_id", 43253i64).unwrap();
        data.set("action_id", "a2").unwrap();

        source(&botman).read(&mut data).await.unwrap();

        assert_eq!(data.id(), Some("43253:a2"));
        assert_eq!(
            data.get_string("json").unwrap(),
            r#"{"challengeActions":[{"actionId":"a2","testKey":"testValue2"}]}"#
        );
    }
}
