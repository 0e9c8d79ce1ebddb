//! Bot management objects
//!
//! Objects are opaque JSON documents scoped to a configuration version. Each
//! kind has its own endpoint and names its server-assigned key differently.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::ClientResult;

/// JSON object as exchanged with the bot management API
pub type Payload = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    ChallengeAction,
    ConditionalAction,
    ServeAlternateAction,
    CustomDefinedBot,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::ChallengeAction,
        ObjectKind::ConditionalAction,
        ObjectKind::ServeAlternateAction,
        ObjectKind::CustomDefinedBot,
    ];

    /// Name used in type names and as the payload attribute
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::ChallengeAction => "challenge_action",
            ObjectKind::ConditionalAction => "conditional_action",
            ObjectKind::ServeAlternateAction => "serve_alternate_action",
            ObjectKind::CustomDefinedBot => "custom_defined_bot",
        }
    }

    /// Field holding the server-assigned key in payloads
    pub fn key_field(self) -> &'static str {
        match self {
            ObjectKind::CustomDefinedBot => "botId",
            _ => "actionId",
        }
    }

    /// Attribute exposing the key
    pub fn key_attribute(self) -> &'static str {
        match self {
            ObjectKind::CustomDefinedBot => "bot_id",
            _ => "action_id",
        }
    }

    /// Endpoint below a configuration version
    pub fn path(self) -> &'static str {
        match self {
            ObjectKind::ChallengeAction => "response-actions/challenge-actions",
            ObjectKind::ConditionalAction => "response-actions/conditional-actions",
            ObjectKind::ServeAlternateAction => "response-actions/serve-alternate-actions",
            ObjectKind::CustomDefinedBot => "custom-bots",
        }
    }

    /// Field holding the objects in a list response
    pub fn list_field(self) -> &'static str {
        match self {
            ObjectKind::ChallengeAction => "challengeActions",
            ObjectKind::ConditionalAction => "conditionalActions",
            ObjectKind::ServeAlternateAction => "serveAlternateActions",
            ObjectKind::CustomDefinedBot => "bots",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetObjectListRequest {
    pub kind: ObjectKind,
    pub config_id: i64,
    pub version: i64,
    /// Only return the object with this key
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetObjectRequest {
    pub kind: ObjectKind,
    pub config_id: i64,
    pub version: i64,
    pub object_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateObjectRequest {
    pub kind: ObjectKind,
    pub config_id: i64,
    pub version: i64,
    pub json_payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateObjectRequest {
    pub kind: ObjectKind,
    pub config_id: i64,
    pub version: i64,
    pub object_id: String,
    pub json_payload: Payload,
}

pub type RemoveObjectRequest = GetObjectRequest;

/// Objects of one kind, in server order
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectList {
    pub kind: ObjectKind,
    pub objects: Vec<Payload>,
}

impl ObjectList {
    /// List response body: the objects under the kind's list field
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert(
            self.kind.list_field().to_string(),
            Value::Array(self.objects.iter().cloned().map(Value::Object).collect()),
        );
        Value::Object(body)
    }

    /// Keep only the object whose key equals `object_id`
    pub fn retain_key(&mut self, object_id: &str) {
        let field = self.kind.key_field();
        self.objects
            .retain(|o| o.get(field).and_then(Value::as_str) == Some(object_id));
    }
}

#[async_trait]
pub trait BotmanApi: Send + Sync {
    async fn get_object_list(&self, req: &GetObjectListRequest) -> ClientResult<ObjectList>;

    async fn get_object(&self, req: &GetObjectRequest) -> ClientResult<Payload>;

    async fn create_object(&self, req: &CreateObjectRequest) -> ClientResult<Payload>;

    async fn update_object(&self, req: &UpdateObjectRequest) -> ClientResult<Payload>;

    async fn remove_object(&self, req: &RemoveObjectRequest) -> ClientResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn list_filters_by_key_and_serializes_compactly() {
        let mut list = ObjectList {
            kind: ObjectKind::ChallengeAction,
            objects: vec![
                payload(json!({"actionId": "a1", "testKey": "testValue1"})),
                payload(json!({"actionId": "a2", "testKey": "testValue2"})),
            ],
        };
        list.retain_key("a2");

        assert_eq!(
            list.to_json().to_string(),
            r#"{"challengeActions":[{"actionId":"a2","testKey":"testValue2"}]}"#
        );
    }

    #[test]
    fn custom_bots_use_bot_id() {
        let kind = ObjectKind::CustomDefinedBot;
        assert_eq!(kind.key_field(), "botId");
        assert_eq!(kind.key_attribute(), "bot_id");
        assert_eq!(kind.list_field(), "bots");
    }
}
