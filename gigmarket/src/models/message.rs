//! Conversation and message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, MessageId, Pagination, UserId};

/// A chat message confirmed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned message ID.
    pub id: MessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author's user ID.
    pub sender_id: UserId,
    /// Message body.
    pub text: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Check whether the given user wrote this message.
    pub fn is_from(&self, user_id: &UserId) -> bool {
        &self.sender_id == user_id
    }
}

/// A conversation participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// User ID.
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Participant {
    /// Name to show for this participant.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}

/// Conversation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation ID.
    pub id: ConversationId,
    /// Everyone taking part, including the current user.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Most recent message, when the server includes it.
    #[serde(default)]
    pub last_message: Option<Message>,
    /// Last activity time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Participants other than the given user.
    pub fn others<'a>(&'a self, me: Option<&'a UserId>) -> impl Iterator<Item = &'a Participant> {
        self.participants
            .iter()
            .filter(move |p| Some(&p.id) != me)
    }
}

/// One page of conversation history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Messages, newest first.
    pub messages: Vec<Message>,
    /// Offset pagination info.
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_page_wire_shape() {
        let json = r#"{
            "messages": [
                {"id": "m2", "conversationId": "c1", "senderId": "u2", "text": "yo", "createdAt": "2024-05-01T10:00:05.000Z"},
                {"id": "m1", "conversationId": "c1", "senderId": "u1", "text": "hi", "createdAt": "2024-05-01T10:00:00.000Z"}
            ],
            "pagination": {"page": 1, "limit": 50, "total": 2, "totalPages": 1}
        }"#;

        let page: MessagePage = serde_json::from_str(json).unwrap();
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.messages[0].id, MessageId::from("m2"));
        assert!(page.messages[1].is_from(&UserId::from("u1")));
        assert_eq!(page.pagination.total_pages, 1);
    }

    #[test]
    fn test_conversation_others() {
        let conv: Conversation = serde_json::from_str(
            r#"{"id": "c1", "participants": [{"id": "u1", "name": "Ana"}, {"id": "u2"}]}"#,
        )
        .unwrap();

        let me = UserId::from("u1");
        let others: Vec<_> = conv.others(Some(&me)).collect();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].display_name(), "u2");
        assert!(conv.last_message.is_none());
    }
}
