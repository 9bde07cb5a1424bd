//! Window entries: confirmed messages and optimistic placeholders.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ConversationId, Message, MessageId, UserId};

/// Client-generated identifier of an unconfirmed message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LocalId(String);

impl LocalId {
    /// Generate a fresh temporary ID.
    pub fn generate() -> Self {
        LocalId(format!("temp-{}", Uuid::new_v4()))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message shown before the server has confirmed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMessage {
    /// Temporary ID.
    pub local_id: LocalId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author, when the session knows the current user.
    pub sender_id: Option<UserId>,
    /// Message body.
    pub text: String,
    /// Client clock at send time.
    pub created_at: DateTime<Utc>,
}

impl PendingMessage {
    /// Create a placeholder stamped with the current time.
    pub fn new(
        conversation_id: ConversationId,
        sender_id: Option<UserId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            local_id: LocalId::generate(),
            conversation_id,
            sender_id,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// One row of a conversation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ChatEntry {
    /// Sent, awaiting the server.
    Pending(PendingMessage),
    /// Confirmed by the server.
    Confirmed(Message),
}

impl ChatEntry {
    /// Server ID, for confirmed entries.
    pub fn server_id(&self) -> Option<&MessageId> {
        match self {
            ChatEntry::Confirmed(m) => Some(&m.id),
            ChatEntry::Pending(_) => None,
        }
    }

    /// Temporary ID, for pending entries.
    pub fn local_id(&self) -> Option<&LocalId> {
        match self {
            ChatEntry::Pending(p) => Some(&p.local_id),
            ChatEntry::Confirmed(_) => None,
        }
    }

    /// Display key: server ID or temporary ID.
    pub fn key(&self) -> &str {
        match self {
            ChatEntry::Confirmed(m) => m.id.as_str(),
            ChatEntry::Pending(p) => p.local_id.as_str(),
        }
    }

    /// Message body.
    pub fn text(&self) -> &str {
        match self {
            ChatEntry::Confirmed(m) => &m.text,
            ChatEntry::Pending(p) => &p.text,
        }
    }

    /// Author, if known.
    pub fn sender_id(&self) -> Option<&UserId> {
        match self {
            ChatEntry::Confirmed(m) => Some(&m.sender_id),
            ChatEntry::Pending(p) => p.sender_id.as_ref(),
        }
    }

    /// Creation time (client clock for pending entries).
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ChatEntry::Confirmed(m) => m.created_at,
            ChatEntry::Pending(p) => p.created_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ChatEntry::Pending(_))
    }
}

impl From<Message> for ChatEntry {
    fn from(message: Message) -> Self {
        ChatEntry::Confirmed(message)
    }
}
