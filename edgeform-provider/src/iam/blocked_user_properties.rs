//! `edgeform_iam_blocked_user_properties`: properties a user may not access
//! within a group

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use edgeform_core::data::ResourceData;
use edgeform_core::identifier::{IdFormat, parse_int};
use edgeform_core::provider::{ProviderResult, ResourceType};
use edgeform_core::resource::Value;
use edgeform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use log::debug;

use crate::client::IamApi;
use crate::remote_error;

pub const TYPE_NAME: &str = "edgeform_iam_blocked_user_properties";

const ID_FORMAT: IdFormat = IdFormat::new("identityID:groupID");

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Blocked properties of a user within a group")
        .attribute(
            AttributeSchema::new("identity_id", AttributeType::String)
                .required()
                .with_description("Unique identifier of the user"),
        )
        .attribute(
            AttributeSchema::new("group_id", types::positive_int())
                .required()
                .with_description("Group the properties belong to"),
        )
        .attribute(
            AttributeSchema::new(
                "blocked_properties",
                AttributeType::List(Box::new(AttributeType::Int)),
            )
            .required()
            .with_description("Property IDs the user may not access"),
        )
}

struct UserGroup {
    identity_id: String,
    group_id: i64,
}

impl UserGroup {
    fn from_id(id: &str) -> ProviderResult<Self> {
        let parts = ID_FORMAT.decode(id)?;
        Ok(Self {
            group_id: parse_int(&parts[1], "groupID")?,
            identity_id: parts[0].clone(),
        })
    }

    fn from_attributes(data: &ResourceData) -> ProviderResult<Self> {
        Ok(Self {
            identity_id: data.get_string("identity_id")?,
            group_id: data.get_int("group_id")?,
        })
    }

    fn parts(&self) -> [String; 2] {
        [self.identity_id.clone(), self.group_id.to_string()]
    }

    fn id(&self) -> ProviderResult<String> {
        Ok(ID_FORMAT.encode(&self.parts())?)
    }
}

fn declared_properties(data: &ResourceData) -> ProviderResult<Vec<i64>> {
    // element types are enforced by validate()
    Ok(data
        .get_list("blocked_properties")?
        .iter()
        .filter_map(Value::as_int)
        .collect())
}

pub struct BlockedUserProperties {
    client: Arc<dyn IamApi>,
}

impl BlockedUserProperties {
    pub fn new(client: Arc<dyn IamApi>) -> Self {
        Self { client }
    }

    /// Replace the blocked properties of `user`. Fails without a remote call
    /// when `user` has no valid id.
    async fn write(&self, user: &UserGroup, data: &mut ResourceData) -> ProviderResult<()> {
        let id = user.id()?;
        let properties = declared_properties(data)?;
        self.client
            .update_blocked_properties(&user.identity_id, user.group_id, &properties)
            .await
            .map_err(remote_error("update_blocked_properties"))?;
        data.set_id(id);
        self.refresh(user, data).await
    }

    async fn refresh(&self, user: &UserGroup, data: &mut ResourceData) -> ProviderResult<()> {
        let properties = self
            .client
            .list_blocked_properties(&user.identity_id, user.group_id)
            .await
            .map_err(remote_error("list_blocked_properties"))?;
        data.set_all(HashMap::from([
            (
                "identity_id".to_string(),
                Value::String(user.identity_id.clone()),
            ),
            ("group_id".to_string(), Value::Int(user.group_id)),
            ("blocked_properties".to_string(), Value::from(properties)),
        ]))?;
        Ok(())
    }
}

#[async_trait]
impl ResourceType for BlockedUserProperties {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn create(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.create", TYPE_NAME);
        data.validate()?;
        let user = UserGroup::from_attributes(data)?;
        self.write(&user, data).await
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.read", TYPE_NAME);
        let user = UserGroup::from_id(data.require_id()?)?;
        self.refresh(&user, data).await
    }

    async fn update(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.update", TYPE_NAME);
        data.validate()?;
        let id = data.require_id()?;
        let recorded = UserGroup::from_id(id)?;
        let declared = UserGroup::from_attributes(data)?.parts().map(Some);
        ID_FORMAT.verify_unchanged(id, &declared)?;
        self.write(&recorded, data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.delete", TYPE_NAME);
        let user = UserGroup::from_id(data.require_id()?)?;
        self.client
            .update_blocked_properties(&user.identity_id, user.group_id, &[])
            .await
            .map_err(remote_error("update_blocked_properties"))?;
        data.clear();
        Ok(())
    }
}
