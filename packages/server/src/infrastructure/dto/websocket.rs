//! WebSocket event DTOs for the chat application.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::domain::{Message, ToxicityVerdict};

/// Reference to a document by id, as `{"_id": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    #[serde(rename = "_id")]
    pub id: String,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Payload of an inbound `chat message` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub content: String,
    pub user: IdRef,
    pub group: IdRef,
    /// Unix timestamp (milliseconds); the server assigns one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Client → server events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "join group")]
    JoinGroup(String),
    #[serde(rename = "leave group")]
    LeaveGroup(String),
    #[serde(rename = "chat message")]
    ChatMessage(ChatMessagePayload),
}

/// Sender information attached to outbound messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderDto {
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name at delivery time; `None` if the user record is gone
    pub name: Option<String>,
}

/// A persisted chat message as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub user: SenderDto,
    pub group: String,
    /// Unix timestamp (milliseconds)
    pub timestamp: i64,
}

impl MessageDto {
    pub fn new(message: &Message, sender_name: Option<String>) -> Self {
        Self {
            id: message.id.as_str().to_string(),
            content: message.content.as_str().to_string(),
            user: SenderDto {
                id: message.sender.as_str().to_string(),
                name: sender_name,
            },
            group: message.group.as_str().to_string(),
            timestamp: message.timestamp.value(),
        }
    }
}

/// Private notice that a message was rejected by the toxicity gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBlockedDto {
    pub reason: Option<String>,
    pub score: f64,
}

impl From<&ToxicityVerdict> for MessageBlockedDto {
    fn from(verdict: &ToxicityVerdict) -> Self {
        Self {
            reason: verdict.reason.clone(),
            score: verdict.score,
        }
    }
}

/// Error kinds reported to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Authorization,
    Dependency,
    Validation,
}

/// Error reported privately to the session that triggered it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub kind: ErrorKind,
    pub message: String,
}

/// Server → client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "previous messages")]
    PreviousMessages(Vec<MessageDto>),
    #[serde(rename = "chat message")]
    ChatMessage(MessageDto),
    #[serde(rename = "messageBlocked")]
    MessageBlocked(MessageBlockedDto),
    #[serde(rename = "error")]
    Error(ErrorDto),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_chat_message_parses_wire_shape() {
        // テスト項目: chat message イベントをワイヤ形式から読み取れる
        // given (前提条件):
        let raw = json!({
            "event": "chat message",
            "data": {
                "content": "hello",
                "user": {"_id": "u1"},
                "group": {"_id": "g1"}
            }
        });

        // when (操作):
        let event: ClientEvent = serde_json::from_value(raw).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::ChatMessage(ChatMessagePayload {
                content: "hello".to_string(),
                user: IdRef::new("u1"),
                group: IdRef::new("g1"),
                timestamp: None,
            })
        );
    }

    #[test]
    fn test_client_event_join_group_parses_wire_shape() {
        // テスト項目: join group イベントはグループ ID 文字列を持つ
        // when (操作):
        let event: ClientEvent =
            serde_json::from_value(json!({"event": "join group", "data": "g1"})).unwrap();

        // then (期待する結果):
        assert_eq!(event, ClientEvent::JoinGroup("g1".to_string()));
    }

    #[test]
    fn test_client_event_missing_field_is_rejected() {
        // テスト項目: 必須フィールドが欠けたイベントは拒否される
        // given (前提条件): group がない
        let raw = json!({
            "event": "chat message",
            "data": {"content": "hello", "user": {"_id": "u1"}}
        });

        // when (操作):
        let result = serde_json::from_value::<ClientEvent>(raw);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_server_message_blocked_wire_shape() {
        // テスト項目: messageBlocked イベントのワイヤ形式
        // given (前提条件):
        let message = ServerMessage::MessageBlocked(MessageBlockedDto::from(
            &ToxicityVerdict::deny("toxic", 0.9),
        ));

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({"event": "messageBlocked", "data": {"reason": "toxic", "score": 0.9}})
        );
    }

    #[test]
    fn test_server_message_error_kind_is_snake_case() {
        // テスト項目: error イベントの kind はスネークケースで出力される
        // given (前提条件):
        let message = ServerMessage::Error(ErrorDto {
            kind: ErrorKind::NotFound,
            message: "group missing".to_string(),
        });

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(value["event"], "error");
        assert_eq!(value["data"]["kind"], "not_found");
    }
}
