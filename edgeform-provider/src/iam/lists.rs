//! Read-only user administration lookups

use std::sync::Arc;

use async_trait::async_trait;
use edgeform_core::data::ResourceData;
use edgeform_core::provider::{DataSourceType, ProviderResult};
use edgeform_core::resource::Value;
use edgeform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use log::debug;

use crate::client::{ClientResult, IamApi};
use crate::remote_error;

/// A fixed list of strings such as supported countries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Countries,
    ContactTypes,
    SupportedLanguages,
}

impl Lookup {
    pub const ALL: [Lookup; 3] = [
        Lookup::Countries,
        Lookup::ContactTypes,
        Lookup::SupportedLanguages,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            Lookup::Countries => "edgeform_iam_countries",
            Lookup::ContactTypes => "edgeform_iam_contact_types",
            Lookup::SupportedLanguages => "edgeform_iam_supported_langs",
        }
    }

    /// Attribute holding the list; doubles as the data source id
    fn attribute(self) -> &'static str {
        match self {
            Lookup::Countries => "countries",
            Lookup::ContactTypes => "contact_types",
            Lookup::SupportedLanguages => "languages",
        }
    }

    pub fn schema(self) -> ResourceSchema {
        ResourceSchema::new(self.type_name())
            .attribute(AttributeSchema::new(self.attribute(), types::string_list()).computed())
    }

    fn method(self) -> &'static str {
        match self {
            Lookup::Countries => "list_countries",
            Lookup::ContactTypes => "list_contact_types",
            Lookup::SupportedLanguages => "list_supported_languages",
        }
    }
}

pub fn data_sources(client: &Arc<dyn IamApi>) -> Vec<Arc<dyn DataSourceType>> {
    let mut sources: Vec<Arc<dyn DataSourceType>> = Lookup::ALL
        .into_iter()
        .map(|lookup| {
            Arc::new(LookupDataSource::new(lookup, client.clone())) as Arc<dyn DataSourceType>
        })
        .collect();
    sources.push(Arc::new(StatesDataSource::new(client.clone())));
    sources.extend(Records::ALL.into_iter().map(|records| {
        Arc::new(RecordsDataSource::new(records, client.clone())) as Arc<dyn DataSourceType>
    }));
    sources
}

pub struct LookupDataSource {
    lookup: Lookup,
    client: Arc<dyn IamApi>,
}

impl LookupDataSource {
    pub fn new(lookup: Lookup, client: Arc<dyn IamApi>) -> Self {
        Self { lookup, client }
    }

    async fn fetch(&self) -> ClientResult<Vec<String>> {
        match self.lookup {
            Lookup::Countries => self.client.list_countries().await,
            Lookup::ContactTypes => self.client.list_contact_types().await,
            Lookup::SupportedLanguages => self.client.list_supported_languages().await,
        }
    }
}

#[async_trait]
impl DataSourceType for LookupDataSource {
    fn name(&self) -> &'static str {
        self.lookup.type_name()
    }

    fn schema(&self) -> ResourceSchema {
        self.lookup.schema()
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.read", self.name());
        let items = self
            .fetch()
            .await
            .map_err(remote_error(self.lookup.method()))?;
        data.set(self.lookup.attribute(), items)?;
        data.set_id(self.lookup.attribute());
        Ok(())
    }
}

pub const STATES_TYPE_NAME: &str = "edgeform_iam_states";

pub fn states_schema() -> ResourceSchema {
    ResourceSchema::new(STATES_TYPE_NAME)
        .attribute(AttributeSchema::new("country", AttributeType::String).required())
        .attribute(AttributeSchema::new("states", types::string_list()).computed())
}

/// States or provinces of one country
pub struct StatesDataSource {
    client: Arc<dyn IamApi>,
}

impl StatesDataSource {
    pub fn new(client: Arc<dyn IamApi>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSourceType for StatesDataSource {
    fn name(&self) -> &'static str {
        STATES_TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        states_schema()
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.read", STATES_TYPE_NAME);
        let country = data.get_string("country")?;
        let states = self
            .client
            .list_states(&country)
            .await
            .map_err(remote_error("list_states"))?;
        data.set("states", states)?;
        data.set_id(country);
        Ok(())
    }
}

/// A list of structured records such as roles or timezones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Records {
    TimeoutPolicies,
    Timezones,
    Groups,
    Roles,
    GrantableRoles,
}

impl Records {
    pub const ALL: [Records; 5] = [
        Records::TimeoutPolicies,
        Records::Timezones,
        Records::Groups,
        Records::Roles,
        Records::GrantableRoles,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            Records::TimeoutPolicies => "edgeform_iam_timeout_policies",
            Records::Timezones => "edgeform_iam_timezones",
            Records::Groups => "edgeform_iam_groups",
            Records::Roles => "edgeform_iam_roles",
            Records::GrantableRoles => "edgeform_iam_grantable_roles",
        }
    }

    fn attribute(self) -> &'static str {
        match self {
            Records::TimeoutPolicies => "policies",
            Records::Timezones => "timezones",
            Records::Groups => "groups",
            Records::Roles => "roles",
            Records::GrantableRoles => "grantable_roles",
        }
    }

    /// Constant identifier of the data source
    fn id(self) -> &'static str {
        match self {
            Records::TimeoutPolicies => "timeout_policies",
            other => other.attribute(),
        }
    }

    fn fields(self) -> Vec<(&'static str, AttributeType)> {
        match self {
            Records::TimeoutPolicies => vec![
                ("name", AttributeType::String),
                ("value", AttributeType::Int),
            ],
            Records::Timezones => vec![
                ("timezone", AttributeType::String),
                ("description", AttributeType::String),
                ("offset", AttributeType::String),
                ("posix", AttributeType::String),
            ],
            Records::Groups => vec![
                ("group_id", AttributeType::Int),
                ("group_name", AttributeType::String),
                ("parent_group_id", AttributeType::Int),
            ],
            Records::Roles => vec![
                ("role_id", AttributeType::Int),
                ("role_name", AttributeType::String),
                ("role_description", AttributeType::String),
                ("role_type", AttributeType::String),
            ],
            Records::GrantableRoles => vec![
                ("granted_role_id", AttributeType::Int),
                ("granted_role_name", AttributeType::String),
                ("granted_role_description", AttributeType::String),
            ],
        }
    }

    pub fn schema(self) -> ResourceSchema {
        ResourceSchema::new(self.type_name()).attribute(
            AttributeSchema::new(self.attribute(), types::object_list(&self.fields())).computed(),
        )
    }

    fn method(self) -> &'static str {
        match self {
            Records::TimeoutPolicies => "list_timeout_policies",
            Records::Timezones => "list_timezones",
            Records::Groups => "list_groups",
            Records::Roles => "list_roles",
            Records::GrantableRoles => "list_grantable_roles",
        }
    }
}

fn record<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Map(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

pub struct RecordsDataSource {
    records: Records,
    client: Arc<dyn IamApi>,
}

impl RecordsDataSource {
    pub fn new(records: Records, client: Arc<dyn IamApi>) -> Self {
        Self { records, client }
    }

    async fn fetch(&self) -> ClientResult<Vec<Value>> {
        let items = match self.records {
            Records::TimeoutPolicies => self
                .client
                .list_timeout_policies()
                .await?
                .into_iter()
                .map(|p| record([("name", Value::String(p.name)), ("value", Value::Int(p.value))]))
                .collect(),
            Records::Timezones => self
                .client
                .list_timezones()
                .await?
                .into_iter()
                .map(|t| {
                    record([
                        ("timezone", Value::String(t.timezone)),
                        ("description", Value::String(t.description)),
                        ("offset", Value::String(t.offset)),
                        ("posix", Value::String(t.posix)),
                    ])
                })
                .collect(),
            Records::Groups => {
                let roots = self.client.list_groups().await?;
                roots
                    .iter()
                    .flat_map(|root| root.flatten())
                    .map(|g| {
                        let mut item = record([
                            ("group_id", Value::Int(g.group_id)),
                            ("group_name", Value::String(g.group_name.clone())),
                        ]);
                        if let (Value::Map(map), Some(parent)) = (&mut item, g.parent_group_id) {
                            map.insert("parent_group_id".to_string(), Value::Int(parent));
                        }
                        item
                    })
                    .collect()
            }
            Records::Roles => self
                .client
                .list_roles()
                .await?
                .into_iter()
                .map(|r| {
                    record([
                        ("role_id", Value::Int(r.role_id)),
                        ("role_name", Value::String(r.role_name)),
                        ("role_description", Value::String(r.role_description)),
                        ("role_type", Value::String(r.role_type)),
                    ])
                })
                .collect(),
            Records::GrantableRoles => self
                .client
                .list_grantable_roles()
                .await?
                .into_iter()
                .map(|r| {
                    record([
                        ("granted_role_id", Value::Int(r.granted_role_id)),
                        ("granted_role_name", Value::String(r.granted_role_name)),
                        (
                            "granted_role_description",
                            Value::String(r.granted_role_description),
                        ),
                    ])
                })
                .collect(),
        };
        Ok(items)
    }
}

#[async_trait]
impl DataSourceType for RecordsDataSource {
    fn name(&self) -> &'static str {
        self.records.type_name()
    }

    fn schema(&self) -> ResourceSchema {
        self.records.schema()
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.read", self.name());
        let items = self
            .fetch()
            .await
            .map_err(remote_error(self.records.method()))?;
        data.set(self.records.attribute(), items)?;
        data.set_id(self.records.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockIam;
    use edgeform_core::provider::ErrorKind;

    fn client() -> Arc<dyn IamApi> {
        Arc::new(MockIam::default())
    }

    async fn read(source: &dyn DataSourceType) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new(Arc::new(source.schema()));
        source.read(&mut data).await?;
        Ok(data)
    }

    #[tokio::test]
    async fn countries() {
        let source = LookupDataSource::new(Lookup::Countries, client());
        let data = read(&source).await.unwrap();

        assert_eq!(data.id(), Some("countries"));
        assert_eq!(
            data.get_list("countries").unwrap(),
            vec![
                Value::from("Canada"),
                Value::from("Poland"),
                Value::from("USA")
            ]
        );
    }

    #[tokio::test]
    async fn supported_languages() {
        let source = LookupDataSource::new(Lookup::SupportedLanguages, client());
        let data = read(&source).await.unwrap();

        assert_eq!(data.get_list("languages").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn states_of_country() {
        let source = StatesDataSource::new(client());
        let mut data = ResourceData::new(Arc::new(source.schema()));
        data.set("country", "Canada").unwrap();
        source.read(&mut data).await.unwrap();

        assert_eq!(data.id(), Some("Canada"));
        assert_eq!(
            data.get_list("states").unwrap(),
            vec![Value::from("AB"), Value::from("BC")]
        );
    }

    #[tokio::test]
    async fn states_require_country() {
        let source = StatesDataSource::new(client());
        let err = read(&source).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingAttribute);
    }

    #[tokio::test]
    async fn states_of_unknown_country_fail() {
        let source = StatesDataSource::new(client());
        let mut data = ResourceData::new(Arc::new(source.schema()));
        data.set("country", "Atlantis").unwrap();
        let err = source.read(&mut data).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::RemoteApi);
        assert!(data.get_optional_string("states").unwrap().is_none());
    }

    #[tokio::test]
    async fn timeout_policies() {
        let source = RecordsDataSource::new(Records::TimeoutPolicies, client());
        let data = read(&source).await.unwrap();

        assert_eq!(data.id(), Some("timeout_policies"));
        let policies = data.get_list("policies").unwrap();
        assert_eq!(policies.len(), 2);
        let first = policies[0].as_map().unwrap();
        assert_eq!(first.get("name"), Some(&Value::from("after15Minutes")));
        assert_eq!(first.get("value"), Some(&Value::Int(900)));
    }

    #[tokio::test]
    async fn groups_are_flattened_with_parent() {
        let source = RecordsDataSource::new(Records::Groups, client());
        let data = read(&source).await.unwrap();

        assert_eq!(data.id(), Some("groups"));
        let groups = data.get_list("groups").unwrap();
        let names: Vec<&str> = groups
            .iter()
            .filter_map(|g| g.as_map()?.get("group_name")?.as_str())
            .collect();
        assert_eq!(names, vec!["Acme", "Acme-Web", "Acme-Web-Ops", "Acme-Media"]);

        let root = groups[0].as_map().unwrap();
        assert!(!root.contains_key("parent_group_id"));
        let nested = groups[2].as_map().unwrap();
        assert_eq!(nested.get("parent_group_id"), Some(&Value::Int(11)));
    }

    #[tokio::test]
    async fn roles_and_grantable_roles() {
        let roles = read(&RecordsDataSource::new(Records::Roles, client()))
            .await
            .unwrap();
        let first = roles.get_list("roles").unwrap()[0].as_map().unwrap().clone();
        assert_eq!(first.get("role_name"), Some(&Value::from("Admin")));
        assert_eq!(first.get("role_type"), Some(&Value::from("standard")));

        let grantable = read(&RecordsDataSource::new(Records::GrantableRoles, client()))
            .await
            .unwrap();
        assert_eq!(grantable.id(), Some("grantable_roles"));
        assert_eq!(grantable.get_list("grantable_roles").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn timezones() {
        let data = read(&RecordsDataSource::new(Records::Timezones, client()))
            .await
            .unwrap();
        let zones = data.get_list("timezones").unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(
            zones[1].as_map().unwrap().get("offset"),
            Some(&Value::from("+1"))
        );
    }

    #[test]
    fn record_schemas_accept_their_records() {
        let group = record([
            ("group_id", Value::Int(1)),
            ("group_name", Value::from("root")),
        ]);
        let schema = Records::Groups.schema();
        let attribute = schema.get("groups").unwrap();
        assert!(attribute.attr_type.validate(&Value::List(vec![group])).is_ok());
    }
}
