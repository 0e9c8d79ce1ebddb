//! Persisted bindings between declared blocks and remote entities

use std::collections::HashMap;

use edgeform_core::resource::{ResourceId, State, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    /// Format version
    pub version: u32,
    /// Bumped on every write
    pub serial: u64,
    /// Identity of this state history; a write with another lineage is refused
    pub lineage: String,
    /// Version of edgeform that last wrote the file
    pub edgeform_version: String,
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            edgeform_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.edgeform_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Insert or replace the entry of `resource`, keeping entries sorted so
    /// that the file diffs cleanly
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        match self
            .resources
            .binary_search_by(|r| r.sort_key().cmp(&resource.sort_key()))
        {
            Ok(pos) => self.resources[pos] = resource,
            Err(pos) => self.resources.insert(pos, resource),
        }
    }

    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(pos))
    }

    /// Recorded states, as consumed by the planner
    pub fn states(&self) -> Vec<State> {
        self.resources.iter().map(ResourceState::to_state).collect()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// One managed resource as last observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub resource_type: String,
    pub name: String,
    /// Composite identifier of the remote entity
    pub identifier: String,
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            identifier: identifier.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Entry for an existing state; `None` when the state has no identifier
    pub fn from_state(state: &State) -> Option<Self> {
        let identifier = state.identifier.as_ref().filter(|_| state.exists)?;
        Some(Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            identifier: identifier.clone(),
            attributes: state
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        })
    }

    pub fn to_state(&self) -> State {
        let attributes: HashMap<String, Value> = self
            .attributes
            .iter()
            .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        State::existing(
            ResourceId::new(&self.resource_type, &self.name),
            attributes,
        )
        .with_identifier(&self.identifier)
    }

    fn sort_key(&self) -> (&str, &str) {
        (&self.resource_type, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy(name: &str, enabled: bool) -> ResourceState {
        ResourceState::new("edgeform_appsec_ip_geo_protection", name, "43253:pol1")
            .with_attribute("config_id", json!(43253))
            .with_attribute("enabled", json!(enabled))
    }

    #[test]
    fn new_state_file() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn upsert_replaces_and_sorts() {
        let mut state = StateFile::new();
        state.upsert_resource(policy("web", true));
        state.upsert_resource(policy("api", true));
        state.upsert_resource(policy("web", false));

        let names: Vec<&str> = state.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["api", "web"]);
        assert_eq!(
            state
                .find_resource("edgeform_appsec_ip_geo_protection", "web")
                .unwrap()
                .attributes
                .get("enabled"),
            Some(&json!(false))
        );
    }

    #[test]
    fn remove_resource() {
        let mut state = StateFile::new();
        state.upsert_resource(policy("web", true));

        assert!(
            state
                .remove_resource("edgeform_appsec_ip_geo_protection", "web")
                .is_some()
        );
        assert!(
            state
                .remove_resource("edgeform_appsec_ip_geo_protection", "web")
                .is_none()
        );
    }

    #[test]
    fn converts_to_and_from_core_state() {
        let recorded = policy("web", true).to_state();
        assert!(recorded.exists);
        assert_eq!(recorded.identifier.as_deref(), Some("43253:pol1"));
        assert_eq!(recorded.attributes.get("config_id"), Some(&Value::Int(43253)));

        assert_eq!(ResourceState::from_state(&recorded), Some(policy("web", true)));
    }

    #[test]
    fn states_without_identifier_are_not_recorded() {
        let state = State::existing(
            ResourceId::new("edgeform_appsec_ip_geo_protection", "web"),
            HashMap::new(),
        );
        assert_eq!(ResourceState::from_state(&state), None);
    }

    #[test]
    fn serialization_keeps_bindings() {
        let mut state = StateFile::new();
        state.upsert_resource(policy("web", true));

        let json = serde_json::to_string_pretty(&state).unwrap();
        let read: StateFile = serde_json::from_str(&json).unwrap();
        assert_eq!(read, state);
    }
}
