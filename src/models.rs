//! Typed views of the backend's JSON payloads.
//!
//! The client itself passes bodies through untouched; these are optional
//! targets for [`crate::api::ResponseBody::decode`] and request payloads for
//! the bindings. Every field defaults so partial payloads still decode.
//! Timestamps stay as the RFC 3339 strings the backend sends.

use serde::{Deserialize, Serialize};

/// A chat persona.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: u64,
    pub created_at: String,
    pub updated_at: String,
    pub name: String,
    pub background: String,
    pub style: String,
    pub persona_hint: String,
    /// How the persona addresses the user.
    pub call_me: String,
}

/// Create/update payload for a role. `name` is required by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleInput {
    pub name: String,
    pub background: String,
    pub style: String,
    pub persona_hint: String,
    pub call_me: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversation {
    pub id: u64,
    pub created_at: String,
    pub updated_at: String,
    pub role_id: u64,
    /// Empty until the backend generates one after the first reply.
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationInput {
    pub title: String,
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    #[default]
    User,
    Ai,
    System,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    pub id: u64,
    pub created_at: String,
    pub role_id: u64,
    pub conversation_id: u64,
    pub sender: Sender,
    pub content: String,
}

/// Summarised context the backend keeps per role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Memory {
    pub id: u64,
    pub created_at: String,
    pub role_id: u64,
    pub summary: String,
}

/// `{"deleted": id}` acknowledgement from DELETE routes.
///
/// The backend echoes the path segment, so the id is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deleted {
    pub deleted: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResponseBody;
    use serde_json::json;

    #[test]
    fn role_decodes_from_backend_shape() {
        let body = ResponseBody::Json(json!({
            "id": 3,
            "created_at": "2026-01-02T03:04:05Z",
            "updated_at": "2026-01-02T03:04:05Z",
            "name": "Mia",
            "background": "librarian",
            "style": "dry",
            "persona_hint": "",
            "call_me": "boss"
        }));
        let role: Role = body.decode().unwrap();
        assert_eq!(role.id, 3);
        assert_eq!(role.call_me, "boss");
    }

    #[test]
    fn partial_payload_fills_defaults() {
        let conv: Conversation = ResponseBody::Json(json!({"id": 9, "role_id": 3})).decode().unwrap();
        assert_eq!(conv.id, 9);
        assert!(conv.title.is_empty());
    }

    #[test]
    fn message_list_with_senders() {
        let msgs: Vec<ChatMessage> = ResponseBody::Json(json!([
            {"id": 1, "sender": "user", "content": "hi"},
            {"id": 2, "sender": "ai", "content": "hello"},
            {"id": 3, "sender": "system", "content": "note"}
        ]))
        .decode()
        .unwrap();
        let senders: Vec<Sender> = msgs.iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Ai, Sender::System]);
    }

    #[test]
    fn deleted_keeps_raw_id() {
        let d: Deleted = ResponseBody::Json(json!({"deleted": "7"})).decode().unwrap();
        assert_eq!(d.deleted, json!("7"));
    }

    #[test]
    fn role_input_serialises_all_fields() {
        let v = serde_json::to_value(RoleInput { name: "x".into(), ..Default::default() }).unwrap();
        assert_eq!(v["name"], "x");
        assert_eq!(v["call_me"], "");
    }
}
