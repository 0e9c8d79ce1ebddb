//! REST implementation of every family client

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::appsec::{
    AppSecApi, ConfigurationSummary, ConfigurationVersion, GetIpGeoProtectionRequest,
    PolicyProtections, UpdateIpGeoProtectionRequest,
};
use super::botman::{
    BotmanApi, CreateObjectRequest, GetObjectListRequest, GetObjectRequest, ObjectKind,
    ObjectList, Payload, RemoveObjectRequest, UpdateObjectRequest,
};
use super::cps::{CpsApi, DvChallenges, Enrollment};
use super::iam::{GrantableRole, Group, IamApi, Role, TimeoutPolicy, Timezone};
use super::{ClientError, ClientResult};
use crate::config::ProviderConfig;

const ENROLLMENT_MEDIA_TYPE: &str = "application/vnd.akamai.cps.enrollment.v11+json";
const DV_CHALLENGES_MEDIA_TYPE: &str = "application/vnd.akamai.cps.dv-challenges.v2+json";
const USER_ADMIN: &str = "identity-management/v3/user-admin";

/// Problem details body of an error response
#[derive(Debug, Default, Deserialize)]
struct Problem {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigurationList {
    #[serde(default)]
    configurations: Vec<ConfigurationSummary>,
}

#[derive(Debug, Deserialize)]
struct CreatedVersion {
    version: i64,
}

/// Path below the API base URL.
///
/// Routes are fixed text split on `/`; every parameter becomes exactly one
/// percent-encoded segment, so ids containing `/`, `?` or `#` cannot
/// address a different endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ApiPath {
    segments: Vec<String>,
}

impl ApiPath {
    fn new(route: &str) -> Self {
        Self::default().route(route)
    }

    fn route(mut self, route: &str) -> Self {
        self.segments.extend(
            route
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        );
        self
    }

    fn param(mut self, value: impl ToString) -> Self {
        self.segments.push(value.to_string());
        self
    }

    fn version(config_id: i64, version: i64) -> Self {
        Self::new("appsec/v1/configs")
            .param(config_id)
            .route("versions")
            .param(version)
    }

    fn objects(kind: ObjectKind, config_id: i64, version: i64) -> Self {
        Self::version(config_id, version).route(kind.path())
    }

    fn protections(config_id: i64, version: i64, policy_id: &str) -> Self {
        Self::version(config_id, version)
            .route("security-policies")
            .param(policy_id)
            .route("protections")
    }

    fn blocked_properties(identity_id: &str, group_id: i64) -> Self {
        Self::new(USER_ADMIN)
            .route("ui-identities")
            .param(identity_id)
            .route("groups")
            .param(group_id)
            .route("blocked-properties")
    }

    fn user_admin(route: &str) -> Self {
        Self::new(USER_ADMIN).route(route)
    }
}

/// Client for the platform REST API, authenticated with a bearer token
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
    account_key: Option<String>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("account_key", &self.account_key)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> ClientResult<Self> {
        config.validate()?;
        let base = config.base_url();
        let base_url = Url::parse(&base).map_err(|_| ClientError::InvalidUrl(base.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url,
            access_token: config.access_token.clone(),
            account_key: config.account_key.clone(),
        })
    }

    fn url(&self, path: &ApiPath) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(&path.segments);
        Ok(url)
    }

    fn request(&self, method: Method, path: &ApiPath) -> ClientResult<RequestBuilder> {
        let url = self.url(path)?;
        debug!("{} {}", method, url.path());
        let mut builder = self.http.request(method, url).bearer_auth(&self.access_token);
        if let Some(key) = &self.account_key {
            builder = builder.query(&[("accountSwitchKey", key)]);
        }
        Ok(builder)
    }

    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let problem: Problem = serde_json::from_str(&body).unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            title: problem
                .title
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string()),
            detail: problem.detail.unwrap_or(body),
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = Self::check(builder.send().await?).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> ClientResult<()> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &ApiPath) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)?).await
    }
}

#[async_trait]
impl AppSecApi for HttpClient {
    async fn get_configurations(&self) -> ClientResult<Vec<ConfigurationSummary>> {
        let list: ConfigurationList = self.get(&ApiPath::new("appsec/v1/configs")).await?;
        Ok(list.configurations)
    }

    async fn get_configuration_version(
        &self,
        config_id: i64,
        version: i64,
    ) -> ClientResult<ConfigurationVersion> {
        self.get(&ApiPath::version(config_id, version)).await
    }

    async fn create_configuration_version(
        &self,
        config_id: i64,
        from_version: i64,
    ) -> ClientResult<i64> {
        let path = ApiPath::new("appsec/v1/configs")
            .param(config_id)
            .route("versions");
        let created: CreatedVersion = self
            .send(
                self.request(Method::POST, &path)?
                    .json(&json!({"createFromVersion": from_version, "ruleUpdate": false})),
            )
            .await?;
        Ok(created.version)
    }

    async fn get_ip_geo_protection(
        &self,
        req: &GetIpGeoProtectionRequest,
    ) -> ClientResult<PolicyProtections> {
        self.get(&ApiPath::protections(
            req.config_id,
            req.version,
            &req.policy_id,
        ))
        .await
    }

    async fn update_ip_geo_protection(
        &self,
        req: &UpdateIpGeoProtectionRequest,
    ) -> ClientResult<PolicyProtections> {
        let path = ApiPath::protections(req.config_id, req.version, &req.policy_id);
        self.send(
            self.request(Method::PUT, &path)?
                .json(&json!({"applyNetworkLayerControls": req.apply_network_layer_controls})),
        )
        .await
    }
}

#[async_trait]
impl BotmanApi for HttpClient {
    async fn get_object_list(&self, req: &GetObjectListRequest) -> ClientResult<ObjectList> {
        let mut body: Payload = self
            .get(&ApiPath::objects(req.kind, req.config_id, req.version))
            .await?;

        let objects = match body.remove(req.kind.list_field()) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(object) => Ok(object),
                    other => Err(ClientError::Decode(format!(
                        "expected {} entries to be objects, got {}",
                        req.kind, other
                    ))),
                })
                .collect::<ClientResult<Vec<_>>>()?,
            Some(other) => {
                return Err(ClientError::Decode(format!(
                    "expected '{}' to be an array, got {}",
                    req.kind.list_field(),
                    other
                )));
            }
            None => Vec::new(),
        };

        let mut list = ObjectList {
            kind: req.kind,
            objects,
        };
        if let Some(object_id) = req.object_id.as_deref().filter(|id| !id.is_empty()) {
            list.retain_key(object_id);
        }
        Ok(list)
    }

    async fn get_object(&self, req: &GetObjectRequest) -> ClientResult<Payload> {
        let path = ApiPath::objects(req.kind, req.config_id, req.version).param(&req.object_id);
        self.get(&path).await
    }

    async fn create_object(&self, req: &CreateObjectRequest) -> ClientResult<Payload> {
        let path = ApiPath::objects(req.kind, req.config_id, req.version);
        self.send(self.request(Method::POST, &path)?.json(&req.json_payload))
            .await
    }

    async fn update_object(&self, req: &UpdateObjectRequest) -> ClientResult<Payload> {
        let path = ApiPath::objects(req.kind, req.config_id, req.version).param(&req.object_id);
        self.send(self.request(Method::PUT, &path)?.json(&req.json_payload))
            .await
    }

    async fn remove_object(&self, req: &RemoveObjectRequest) -> ClientResult<()> {
        let path = ApiPath::objects(req.kind, req.config_id, req.version).param(&req.object_id);
        self.send_empty(self.request(Method::DELETE, &path)?).await
    }
}

#[async_trait]
impl CpsApi for HttpClient {
    async fn get_enrollment(&self, enrollment_id: i64) -> ClientResult<Enrollment> {
        let path = ApiPath::new("cps/v2/enrollments").param(enrollment_id);
        self.send(
            self.request(Method::GET, &path)?
                .header(ACCEPT, ENROLLMENT_MEDIA_TYPE),
        )
        .await
    }

    async fn get_dv_challenges(
        &self,
        enrollment_id: i64,
        change_id: i64,
    ) -> ClientResult<DvChallenges> {
        let path = ApiPath::new("cps/v2/enrollments")
            .param(enrollment_id)
            .route("changes")
            .param(change_id)
            .route("input/info/lets-encrypt-challenges");
        self.send(
            self.request(Method::GET, &path)?
                .header(ACCEPT, DV_CHALLENGES_MEDIA_TYPE),
        )
        .await
    }
}

#[async_trait]
impl IamApi for HttpClient {
    async fn list_blocked_properties(
        &self,
        identity_id: &str,
        group_id: i64,
    ) -> ClientResult<Vec<i64>> {
        self.get(&ApiPath::blocked_properties(identity_id, group_id))
            .await
    }

    async fn update_blocked_properties(
        &self,
        identity_id: &str,
        group_id: i64,
        properties: &[i64],
    ) -> ClientResult<Vec<i64>> {
        let path = ApiPath::blocked_properties(identity_id, group_id);
        self.send(self.request(Method::PUT, &path)?.json(properties))
            .await
    }

    async fn list_countries(&self) -> ClientResult<Vec<String>> {
        self.get(&ApiPath::user_admin("common/countries")).await
    }

    async fn list_contact_types(&self) -> ClientResult<Vec<String>> {
        self.get(&ApiPath::user_admin("common/contact-types")).await
    }

    async fn list_states(&self, country: &str) -> ClientResult<Vec<String>> {
        let path = ApiPath::user_admin("common/countries")
            .param(country)
            .route("states");
        self.get(&path).await
    }

    async fn list_timeout_policies(&self) -> ClientResult<Vec<TimeoutPolicy>> {
        self.get(&ApiPath::user_admin("common/timeout-policies"))
            .await
    }

    async fn list_supported_languages(&self) -> ClientResult<Vec<String>> {
        self.get(&ApiPath::user_admin("common/supported-languages"))
            .await
    }

    async fn list_timezones(&self) -> ClientResult<Vec<Timezone>> {
        self.get(&ApiPath::user_admin("common/timezones")).await
    }

    async fn list_groups(&self) -> ClientResult<Vec<Group>> {
        self.get(&ApiPath::user_admin("groups")).await
    }

    async fn list_roles(&self) -> ClientResult<Vec<Role>> {
        self.get(&ApiPath::user_admin("roles")).await
    }

    async fn list_grantable_roles(&self) -> ClientResult<Vec<GrantableRole>> {
        self.get(&ApiPath::user_admin("roles/grantable-roles"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(host: &str) -> HttpClient {
        HttpClient::new(&ProviderConfig::new(host, "token-1")).unwrap()
    }

    #[test]
    fn parameters_are_single_escaped_segments() {
        let url = client("https://host.example.net")
            .url(&ApiPath::protections(43253, 15, "pol/1?x#y"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://host.example.net/appsec/v1/configs/43253/versions/15/security-policies/pol%2F1%3Fx%23y/protections"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let url = client("http://localhost:8080/proxy/")
            .url(&ApiPath::user_admin("common/countries").param("Sri Lanka").route("states"))
            .unwrap();
        assert_eq!(
            url.path(),
            "/proxy/identity-management/v3/user-admin/common/countries/Sri%20Lanka/states"
        );
    }
}
