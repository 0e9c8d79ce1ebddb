//! In-memory clients for unit tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::Clients;
use crate::client::appsec::{
    ConfigurationSummary, ConfigurationVersion, GetIpGeoProtectionRequest, NetworkActivation,
    PolicyProtections, UpdateIpGeoProtectionRequest,
};
use crate::client::botman::{
    CreateObjectRequest, GetObjectListRequest, GetObjectRequest, ObjectList, Payload,
    RemoveObjectRequest, UpdateObjectRequest,
};
use crate::client::cps::{DvChallenges, Enrollment};
use crate::client::iam::{GrantableRole, Group, Role, TimeoutPolicy, Timezone};
use crate::client::{AppSecApi, BotmanApi, ClientError, ClientResult, CpsApi, IamApi};

pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

type PolicyKey = (i64, i64, String);

#[derive(Default)]
pub struct MockAppSec {
    pub configurations: Mutex<Vec<ConfigurationSummary>>,
    /// (config_id, version) -> (staging, production) status
    activations: Mutex<HashMap<(i64, i64), (String, String)>>,
    pub protections: Mutex<HashMap<PolicyKey, PolicyProtections>>,
    pub updates: Mutex<Vec<UpdateIpGeoProtectionRequest>>,
    pub clones: Mutex<Vec<(i64, i64)>>,
    calls: AtomicUsize,
}

impl MockAppSec {
    pub fn with_config(
        config_id: i64,
        latest: i64,
        staging: Option<i64>,
        production: Option<i64>,
    ) -> Self {
        let mock = Self::default();
        mock.configurations
            .lock()
            .unwrap()
            .push(ConfigurationSummary {
                id: config_id,
                name: format!("config-{}", config_id),
                latest_version: latest,
                staging_version: staging,
                production_version: production,
            });
        mock
    }

    /// Override the activation status derived from the version pointers
    pub fn set_activation(&self, config_id: i64, version: i64, staging: &str, production: &str) {
        self.activations.lock().unwrap().insert(
            (config_id, version),
            (staging.to_string(), production.to_string()),
        );
    }

    pub fn set_protections(&self, config_id: i64, version: i64, policy_id: &str, enabled: bool) {
        self.protections.lock().unwrap().insert(
            (config_id, version, policy_id.to_string()),
            PolicyProtections {
                apply_network_layer_controls: enabled,
                ..Default::default()
            },
        );
    }

    /// Number of client calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AppSecApi for MockAppSec {
    async fn get_configurations(&self) -> ClientResult<Vec<ConfigurationSummary>> {
        self.record();
        Ok(self.configurations.lock().unwrap().clone())
    }

    async fn get_configuration_version(
        &self,
        config_id: i64,
        version: i64,
    ) -> ClientResult<ConfigurationVersion> {
        self.record();
        let status = |active: bool| if active { "Active" } else { "Inactive" }.to_string();
        let (staging, production) = match self.activations.lock().unwrap().get(&(config_id, version))
        {
            Some(statuses) => statuses.clone(),
            None => {
                let configurations = self.configurations.lock().unwrap();
                let config = configurations
                    .iter()
                    .find(|c| c.id == config_id)
                    .ok_or_else(|| ClientError::NotFound(format!("configuration {}", config_id)))?;
                (
                    status(config.staging_version == Some(version)),
                    status(config.production_version == Some(version)),
                )
            }
        };
        Ok(ConfigurationVersion {
            version,
            staging: NetworkActivation { status: staging },
            production: NetworkActivation { status: production },
        })
    }

    async fn create_configuration_version(
        &self,
        config_id: i64,
        from_version: i64,
    ) -> ClientResult<i64> {
        self.record();
        self.clones.lock().unwrap().push((config_id, from_version));
        let mut configurations = self.configurations.lock().unwrap();
        let config = configurations
            .iter_mut()
            .find(|c| c.id == config_id)
            .ok_or_else(|| ClientError::NotFound(format!("configuration {}", config_id)))?;
        config.latest_version += 1;
        Ok(config.latest_version)
    }

    async fn get_ip_geo_protection(
        &self,
        req: &GetIpGeoProtectionRequest,
    ) -> ClientResult<PolicyProtections> {
        self.record();
        self.protections
            .lock()
            .unwrap()
            .get(&(req.config_id, req.version, req.policy_id.clone()))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("security policy {}", req.policy_id)))
    }

    async fn update_ip_geo_protection(
        &self,
        req: &UpdateIpGeoProtectionRequest,
    ) -> ClientResult<PolicyProtections> {
        self.record();
        self.updates.lock().unwrap().push(req.clone());
        let mut protections = self.protections.lock().unwrap();
        let entry = protections
            .entry((req.config_id, req.version, req.policy_id.clone()))
            .or_default();
        entry.apply_network_layer_controls = req.apply_network_layer_controls;
        Ok(entry.clone())
    }
}

/// Bot management objects of every kind in one store. Created objects get
/// the key passed to [`MockBotman::assigning`].
pub struct MockBotman {
    assigned_id: String,
    objects: Mutex<Vec<Payload>>,
    pub created: Mutex<Vec<CreateObjectRequest>>,
    pub updated: Mutex<Vec<UpdateObjectRequest>>,
    pub removed: Mutex<Vec<String>>,
    pub list_requests: Mutex<Vec<GetObjectListRequest>>,
}

impl MockBotman {
    pub fn assigning(object_id: &str) -> Self {
        Self {
            assigned_id: object_id.to_string(),
            objects: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            list_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, object: Payload) {
        self.objects.lock().unwrap().push(object);
    }

    fn key_of<'a>(object: &'a Payload, field: &str) -> Option<&'a str> {
        object.get(field).and_then(Value::as_str)
    }
}

#[async_trait]
impl BotmanApi for MockBotman {
    async fn get_object_list(&self, req: &GetObjectListRequest) -> ClientResult<ObjectList> {
        self.list_requests.lock().unwrap().push(req.clone());
        let mut list = ObjectList {
            kind: req.kind,
            objects: self.objects.lock().unwrap().clone(),
        };
        if let Some(object_id) = &req.object_id {
            list.retain_key(object_id);
        }
        Ok(list)
    }

    async fn get_object(&self, req: &GetObjectRequest) -> ClientResult<Payload> {
        let field = req.kind.key_field();
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| Self::key_of(o, field) == Some(req.object_id.as_str()))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{} {}", req.kind, req.object_id)))
    }

    async fn create_object(&self, req: &CreateObjectRequest) -> ClientResult<Payload> {
        self.created.lock().unwrap().push(req.clone());
        let mut object = req.json_payload.clone();
        object.insert(
            req.kind.key_field().to_string(),
            Value::String(self.assigned_id.clone()),
        );
        self.insert(object.clone());
        Ok(object)
    }

    async fn update_object(&self, req: &UpdateObjectRequest) -> ClientResult<Payload> {
        self.updated.lock().unwrap().push(req.clone());
        let field = req.kind.key_field();
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .iter_mut()
            .find(|o| Self::key_of(o, field) == Some(req.object_id.as_str()))
            .ok_or_else(|| ClientError::NotFound(format!("{} {}", req.kind, req.object_id)))?;
        *object = req.json_payload.clone();
        Ok(object.clone())
    }

    async fn remove_object(&self, req: &RemoveObjectRequest) -> ClientResult<()> {
        self.removed.lock().unwrap().push(req.object_id.clone());
        let field = req.kind.key_field();
        self.objects
            .lock()
            .unwrap()
            .retain(|o| Self::key_of(o, field) != Some(req.object_id.as_str()));
        Ok(())
    }
}

/// Serves a single enrollment regardless of the id asked for
#[derive(Default)]
pub struct MockCps {
    enrollment: Enrollment,
    pub challenges: Mutex<DvChallenges>,
    pub challenge_requests: Mutex<Vec<(i64, i64)>>,
}

impl MockCps {
    pub fn new(enrollment: Enrollment) -> Self {
        Self {
            enrollment,
            ..Default::default()
        }
    }
}

#[async_trait]
impl CpsApi for MockCps {
    async fn get_enrollment(&self, _enrollment_id: i64) -> ClientResult<Enrollment> {
        Ok(self.enrollment.clone())
    }

    async fn get_dv_challenges(
        &self,
        enrollment_id: i64,
        change_id: i64,
    ) -> ClientResult<DvChallenges> {
        self.challenge_requests
            .lock()
            .unwrap()
            .push((enrollment_id, change_id));
        Ok(self.challenges.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MockIam {
    pub blocked: Mutex<HashMap<(String, i64), Vec<i64>>>,
    pub blocked_updates: Mutex<Vec<(String, i64, Vec<i64>)>>,
}

impl MockIam {
    pub fn block(&self, identity_id: &str, group_id: i64, properties: Vec<i64>) {
        self.blocked
            .lock()
            .unwrap()
            .insert((identity_id.to_string(), group_id), properties);
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl IamApi for MockIam {
    async fn list_blocked_properties(
        &self,
        identity_id: &str,
        group_id: i64,
    ) -> ClientResult<Vec<i64>> {
        self.blocked
            .lock()
            .unwrap()
            .get(&(identity_id.to_string(), group_id))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("user {}", identity_id)))
    }

    async fn update_blocked_properties(
        &self,
        identity_id: &str,
        group_id: i64,
        properties: &[i64],
    ) -> ClientResult<Vec<i64>> {
        self.blocked_updates.lock().unwrap().push((
            identity_id.to_string(),
            group_id,
            properties.to_vec(),
        ));
        self.block(identity_id, group_id, properties.to_vec());
        Ok(properties.to_vec())
    }

    async fn list_countries(&self) -> ClientResult<Vec<String>> {
        Ok(strings(&["Canada", "Poland", "USA"]))
    }

    async fn list_contact_types(&self) -> ClientResult<Vec<String>> {
        Ok(strings(&["Billing", "Technical"]))
    }

    async fn list_states(&self, country: &str) -> ClientResult<Vec<String>> {
        match country {
            "USA" => Ok(strings(&["AK", "AL", "AZ"])),
            "Canada" => Ok(strings(&["AB", "BC"])),
            _ => Err(ClientError::Api {
                status: 400,
                title: "Bad Request".to_string(),
                detail: format!("country {} has no states", country),
            }),
        }
    }

    async fn list_timeout_policies(&self) -> ClientResult<Vec<TimeoutPolicy>> {
        Ok(vec![
            TimeoutPolicy {
                name: "after15Minutes".to_string(),
                value: 900,
            },
            TimeoutPolicy {
                name: "after30Minutes".to_string(),
                value: 1800,
            },
        ])
    }

    async fn list_supported_languages(&self) -> ClientResult<Vec<String>> {
        Ok(strings(&["English", "Deutsch"]))
    }

    async fn list_timezones(&self) -> ClientResult<Vec<Timezone>> {
        let zone = |timezone: &str, offset: &str, posix: &str| Timezone {
            timezone: timezone.to_string(),
            description: format!("{} (GMT {})", timezone, offset),
            offset: offset.to_string(),
            posix: posix.to_string(),
        };
        Ok(vec![
            zone("GMT", "0", "GMT"),
            zone("Europe/Warsaw", "+1", "Europe/Warsaw"),
        ])
    }

    async fn list_groups(&self) -> ClientResult<Vec<Group>> {
        let group = |id: i64, name: &str, parent: Option<i64>, sub_groups: Vec<Group>| Group {
            group_id: id,
            group_name: name.to_string(),
            parent_group_id: parent,
            sub_groups,
        };
        Ok(vec![group(
            10,
            "Acme",
            None,
            vec![
                group(
                    11,
                    "Acme-Web",
                    Some(10),
                    vec![group(12, "Acme-Web-Ops", Some(11), Vec::new())],
                ),
                group(13, "Acme-Media", Some(10), Vec::new()),
            ],
        )])
    }

    async fn list_roles(&self) -> ClientResult<Vec<Role>> {
        Ok(vec![
            Role {
                role_id: 1,
                role_name: "Admin".to_string(),
                role_description: "Full access".to_string(),
                role_type: "standard".to_string(),
            },
            Role {
                role_id: 2,
                role_name: "Purge".to_string(),
                role_description: "Content purge only".to_string(),
                role_type: "custom".to_string(),
            },
        ])
    }

    async fn list_grantable_roles(&self) -> ClientResult<Vec<GrantableRole>> {
        Ok(vec![GrantableRole {
            granted_role_id: 7,
            granted_role_name: "Viewer".to_string(),
            granted_role_description: "Read-only access".to_string(),
        }])
    }
}

/// Provider clients backed by fresh mocks
pub fn mock_clients() -> (
    Clients,
    Arc<MockAppSec>,
    Arc<MockBotman>,
    Arc<MockCps>,
    Arc<MockIam>,
) {
    let appsec = Arc::new(MockAppSec::with_config(43253, 15, None, None));
    let botman = Arc::new(MockBotman::assigning("object-1"));
    let cps = Arc::new(MockCps::default());
    let iam = Arc::new(MockIam::default());
    let clients = Clients {
        appsec: appsec.clone(),
        botman: botman.clone(),
        cps: cps.clone(),
        iam: iam.clone(),
    };
    (clients, appsec, botman, cps, iam)
}
