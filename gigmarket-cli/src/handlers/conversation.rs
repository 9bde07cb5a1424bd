//! Conversation handlers.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use gigmarket::{Conversation, MarketClient, Message, UserId};
use serde::Serialize;

use crate::output::{format_opt_time, format_relative_time, truncate, PlainPrint, TableRow};

/// Conversation summary.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationInfo {
    pub id: String,
    pub with: String,
    pub with_ids: Vec<String>,
    pub last_message: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConversationInfo {
    fn new(c: &Conversation, me: Option<&UserId>) -> Self {
        let others: Vec<_> = c.others(me).collect();
        Self {
            id: c.id.to_string(),
            with: others
                .iter()
                .map(|p| p.display_name())
                .collect::<Vec<_>>()
                .join(", "),
            with_ids: others.iter().map(|p| p.id.to_string()).collect(),
            last_message: c
                .last_message
                .as_ref()
                .map(|m| m.text.clone())
                .unwrap_or_default(),
            updated_at: c
                .updated_at
                .or_else(|| c.last_message.as_ref().map(|m| m.created_at)),
        }
    }
}

impl TableRow for ConversationInfo {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "With", "Last Message", "Updated"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.with.clone(),
            truncate(&self.last_message, 40),
            format_opt_time(self.updated_at),
        ]
    }
}

impl PlainPrint for ConversationInfo {
    fn plain_print(&self) {
        let updated = self
            .updated_at
            .map(format_relative_time)
            .unwrap_or_default();
        println!(
            "[{}] {} {}",
            self.id.cyan(),
            self.with.green(),
            updated.dimmed()
        );
        if !self.last_message.is_empty() {
            println!("   {}", truncate(&self.last_message, 72));
        }
    }
}

/// Message row.
#[derive(Debug, Clone, Serialize)]
pub struct MessageInfo {
    pub id: String,
    pub from: String,
    pub is_mine: bool,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl MessageInfo {
    pub fn new(m: &Message, me: Option<&UserId>) -> Self {
        Self {
            id: m.id.to_string(),
            from: m.sender_id.to_string(),
            is_mine: me.is_some_and(|me| m.is_from(me)),
            text: m.text.clone(),
            created_at: m.created_at,
        }
    }
}

impl TableRow for MessageInfo {
    fn headers() -> Vec<&'static str> {
        vec!["From", "Message", "Time"]
    }
    fn row(&self) -> Vec<String> {
        let from = if self.is_mine {
            format!("{} (me)", self.from)
        } else {
            self.from.clone()
        };
        vec![from, self.text.clone(), format_opt_time(Some(self.created_at))]
    }
}

impl PlainPrint for MessageInfo {
    fn plain_print(&self) {
        let from = if self.is_mine {
            self.from.blue()
        } else {
            self.from.green()
        };
        println!(
            "{} {}",
            from,
            format_relative_time(self.created_at).dimmed()
        );
        for line in self.text.lines() {
            println!("   {}", line);
        }
    }
}

/// One page of conversation history, oldest first for reading.
#[derive(Debug, Clone, Serialize)]
pub struct MessageListResult {
    pub conversation_id: String,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub messages: Vec<MessageInfo>,
}

/// List the current user's conversations.
pub async fn list(client: &MarketClient) -> Result<Vec<ConversationInfo>> {
    let me = client.current_user_id();
    let conversations = client.conversations().list().await?;
    Ok(conversations
        .iter()
        .map(|c| ConversationInfo::new(c, me.as_ref()))
        .collect())
}

/// Show one conversation.
pub async fn show(client: &MarketClient, id: &str) -> Result<ConversationInfo> {
    let me = client.current_user_id();
    let conversation = client.conversations().get(id).await?;
    Ok(ConversationInfo::new(&conversation, me.as_ref()))
}

/// Start (or reopen) a conversation with another user.
pub async fn start(client: &MarketClient, participant_id: &str) -> Result<ConversationInfo> {
    let me = client.current_user_id();
    let conversation = client.conversations().start(participant_id).await?;
    Ok(ConversationInfo::new(&conversation, me.as_ref()))
}

/// Fetch one page of history.
pub async fn messages(
    client: &MarketClient,
    id: &str,
    page: u32,
    limit: u32,
) -> Result<MessageListResult> {
    let me = client.current_user_id();
    let result = client
        .conversations()
        .messages(id)
        .page(page)
        .limit(limit)
        .send()
        .await?;

    Ok(MessageListResult {
        conversation_id: id.to_string(),
        page: result.pagination.page,
        total_pages: result.pagination.total_pages,
        total: result.pagination.total,
        messages: result
            .messages
            .iter()
            .rev()
            .map(|m| MessageInfo::new(m, me.as_ref()))
            .collect(),
    })
}

/// Send a message.
pub async fn send(client: &MarketClient, id: &str, text: &str) -> Result<MessageInfo> {
    let me = client.current_user_id();
    let message = client.conversations().send(id, text).await?;
    Ok(MessageInfo::new(&message, me.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gigmarket::Participant;
    use pretty_assertions::assert_eq;

    fn participant(id: &str, name: Option<&str>) -> Participant {
        Participant {
            id: id.into(),
            name: name.map(str::to_string),
            avatar_url: None,
        }
    }

    #[test]
    fn test_conversation_info_hides_current_user() {
        let sent = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let conversation = Conversation {
            id: "c1".into(),
            participants: vec![participant("u1", Some("Me")), participant("u2", Some("Ada"))],
            last_message: Some(Message {
                id: "m1".into(),
                conversation_id: "c1".into(),
                sender_id: "u2".into(),
                text: "hello".into(),
                created_at: sent,
            }),
            updated_at: None,
        };

        let info = ConversationInfo::new(&conversation, Some(&UserId::from("u1")));

        assert_eq!(info.with, "Ada");
        assert_eq!(info.with_ids, vec!["u2".to_string()]);
        assert_eq!(info.last_message, "hello");
        assert_eq!(info.updated_at, Some(sent));
    }

    #[test]
    fn test_message_info_marks_own_messages() {
        let message = Message {
            id: "m1".into(),
            conversation_id: "c1".into(),
            sender_id: "u1".into(),
            text: "hi".into(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        };

        assert!(MessageInfo::new(&message, Some(&UserId::from("u1"))).is_mine);
        assert!(!MessageInfo::new(&message, Some(&UserId::from("u2"))).is_mine);
        assert!(!MessageInfo::new(&message, None).is_mine);
    }
}
