//! Wire types for the agent conversation API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Activity type for chat messages.
pub const MESSAGE: &str = "message";

/// A Bot Framework activity streamed by the agent.
///
/// Fields this client does not interpret are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    /// An outgoing message activity for `conversation_id`.
    pub fn message(text: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            kind: MESSAGE.to_string(),
            id: None,
            text: Some(text.into()),
            conversation: Some(ConversationAccount {
                id: conversation_id.into(),
            }),
            extra: Map::new(),
        }
    }

    pub fn is_message(&self) -> bool {
        self.kind == MESSAGE
    }

    /// Message text, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation
            .as_ref()
            .map(|c| c.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Conversation reference carried on an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    #[serde(default)]
    pub id: String,
}

/// Body for starting a conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub emit_start_conversation_event: bool,
}

impl Default for StartRequest {
    fn default() -> Self {
        Self {
            emit_start_conversation_event: true,
        }
    }
}

/// Body for one turn of an existing conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteTurnRequest {
    pub activity: Activity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_request_body() {
        assert_eq!(
            serde_json::to_value(StartRequest::default()).unwrap(),
            json!({"emitStartConversationEvent": true})
        );
    }

    #[test]
    fn test_turn_request_body() {
        let body = ExecuteTurnRequest {
            activity: Activity::message("How much is the Adventure Dining Table?", "conv-1"),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "activity": {
                    "type": "message",
                    "text": "How much is the Adventure Dining Table?",
                    "conversation": {"id": "conv-1"}
                }
            })
        );
    }

    #[test]
    fn test_activity_keeps_unknown_fields() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "message",
            "id": "a-1",
            "text": "The Adventure Dining Table is $90.",
            "conversation": {"id": "conv-1"},
            "from": {"id": "bot", "role": "bot"},
            "textFormat": "markdown"
        }))
        .unwrap();

        assert!(activity.is_message());
        assert_eq!(activity.conversation_id(), Some("conv-1"));
        assert_eq!(activity.extra["textFormat"], "markdown");
        assert_eq!(activity.extra["from"]["role"], "bot");
    }

    #[test]
    fn test_activity_minimal() {
        let activity: Activity = serde_json::from_str(r#"{"type":"typing"}"#).unwrap();
        assert!(!activity.is_message());
        assert_eq!(activity.text(), None);
        assert_eq!(activity.conversation_id(), None);

        let empty: Activity = serde_json::from_str(r#"{"type":"message","text":""}"#).unwrap();
        assert_eq!(empty.text(), None);
    }
}
