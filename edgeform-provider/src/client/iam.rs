//! Identity and access management

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ClientResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timezone {
    pub timezone: String,
    pub description: String,
    pub offset: String,
    pub posix: String,
}

/// A group and, recursively, the groups below it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: i64,
    pub group_name: String,
    #[serde(default)]
    pub parent_group_id: Option<i64>,
    #[serde(default)]
    pub sub_groups: Vec<Group>,
}

impl Group {
    /// This group followed by every group below it, depth first
    pub fn flatten(&self) -> Vec<&Group> {
        let mut groups = vec![self];
        for sub in &self.sub_groups {
            groups.extend(sub.flatten());
        }
        groups
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: i64,
    pub role_name: String,
    #[serde(default)]
    pub role_description: String,
    /// `standard` or `custom`
    #[serde(rename = "type", default)]
    pub role_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantableRole {
    pub granted_role_id: i64,
    pub granted_role_name: String,
    #[serde(default)]
    pub granted_role_description: String,
}

#[async_trait]
pub trait IamApi: Send + Sync {
    /// Properties the user may not access within a group
    async fn list_blocked_properties(
        &self,
        identity_id: &str,
        group_id: i64,
    ) -> ClientResult<Vec<i64>>;

    /// Replace the blocked properties; returns the stored list
    async fn update_blocked_properties(
        &self,
        identity_id: &str,
        group_id: i64,
        properties: &[i64],
    ) -> ClientResult<Vec<i64>>;

    async fn list_countries(&self) -> ClientResult<Vec<String>>;

    async fn list_contact_types(&self) -> ClientResult<Vec<String>>;

    async fn list_states(&self, country: &str) -> ClientResult<Vec<String>>;

    async fn list_timeout_policies(&self) -> ClientResult<Vec<TimeoutPolicy>>;

    async fn list_supported_languages(&self) -> ClientResult<Vec<String>>;

    async fn list_timezones(&self) -> ClientResult<Vec<Timezone>>;

    /// Top-level groups with their subgroups nested
    async fn list_groups(&self) -> ClientResult<Vec<Group>>;

    async fn list_roles(&self) -> ClientResult<Vec<Role>>;

    /// Roles the caller may grant to others
    async fn list_grantable_roles(&self) -> ClientResult<Vec<GrantableRole>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_groups_flatten_depth_first() {
        let root: Group = serde_json::from_value(json!({
            "groupId": 1,
            "groupName": "root",
            "subGroups": [
                {"groupId": 2, "groupName": "a", "parentGroupId": 1, "subGroups": [
                    {"groupId": 4, "groupName": "a1", "parentGroupId": 2}
                ]},
                {"groupId": 3, "groupName": "b", "parentGroupId": 1}
            ]
        }))
        .unwrap();

        let ids: Vec<i64> = root.flatten().iter().map(|g| g.group_id).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
        assert_eq!(root.parent_group_id, None);
    }
}
