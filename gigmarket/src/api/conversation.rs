//! Conversation API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    client::MarketClientInner,
    error::{Error, Result},
    models::{Conversation, ConversationId, Message, MessagePage, UserId},
};

/// Longest message body the input surface accepts.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Default and largest history page size.
pub const MESSAGE_PAGE_LIMIT: u32 = 50;

/// The two calls a live conversation needs from the REST API.
#[async_trait]
pub trait ConversationTransport: Send + Sync {
    /// Fetch one page of history, newest first.
    async fn fetch_messages(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage>;

    /// Create a message and return the server's copy.
    async fn create_message(&self, conversation_id: &ConversationId, text: &str)
        -> Result<Message>;
}

/// API for conversation operations.
pub struct ConversationApi {
    client: Arc<MarketClientInner>,
}

impl ConversationApi {
    pub(crate) fn new(client: Arc<MarketClientInner>) -> Self {
        Self { client }
    }

    /// List the current user's conversations.
    pub async fn list(&self) -> Result<Vec<Conversation>> {
        self.client.get_authed("conversations", &[]).await
    }

    /// Get conversation metadata.
    pub async fn get(&self, id: impl Into<ConversationId>) -> Result<Conversation> {
        let id = id.into();
        ensure_id(&id)?;
        self.client
            .get_authed(&format!("conversations/{}", id), &[])
            .await
    }

    /// Open (or reuse) a conversation with another user.
    pub async fn start(&self, participant_id: impl Into<UserId>) -> Result<Conversation> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct StartBody<'a> {
            participant_id: &'a UserId,
        }

        let participant_id = participant_id.into();
        if participant_id.is_empty() {
            return Err(Error::InvalidArgument("Participant ID is required".into()));
        }

        self.client
            .post_authed(
                "conversations",
                &StartBody {
                    participant_id: &participant_id,
                },
            )
            .await
    }

    /// Get messages in a conversation.
    pub fn messages(&self, id: impl Into<ConversationId>) -> MessagesBuilder {
        MessagesBuilder {
            client: self.client.clone(),
            id: id.into(),
            page: 1,
            limit: MESSAGE_PAGE_LIMIT,
        }
    }

    /// Send a message to a conversation.
    pub async fn send(&self, id: impl Into<ConversationId>, text: &str) -> Result<Message> {
        #[derive(Serialize)]
        struct SendBody<'a> {
            text: &'a str,
        }

        let id = id.into();
        ensure_id(&id)?;

        if text.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Message text cannot be empty".into(),
            ));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(Error::InvalidArgument(format!(
                "Message text exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        self.client
            .post_authed(&format!("conversations/{}/messages", id), &SendBody { text })
            .await
    }
}

#[async_trait]
impl ConversationTransport for ConversationApi {
    async fn fetch_messages(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage> {
        self.messages(conversation_id.clone())
            .page(page)
            .limit(limit)
            .send()
            .await
    }

    async fn create_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<Message> {
        self.send(conversation_id.clone(), text).await
    }
}

/// Builder for conversation history requests.
pub struct MessagesBuilder {
    client: Arc<MarketClientInner>,
    id: ConversationId,
    page: u32,
    limit: u32,
}

impl MessagesBuilder {
    /// Set the page number (1-based).
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MESSAGE_PAGE_LIMIT);
        self
    }

    /// Execute the request.
    pub async fn send(self) -> Result<MessagePage> {
        ensure_id(&self.id)?;

        let page_str = self.page.to_string();
        let limit_str = self.limit.to_string();

        self.client
            .get_authed(
                &format!("conversations/{}/messages", self.id),
                &[("page", &page_str), ("limit", &limit_str)],
            )
            .await
    }
}

fn ensure_id(id: &ConversationId) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidArgument("Conversation ID is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MarketClient;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MarketClient {
        MarketClient::builder()
            .base_url(format!("{}/api/", server.uri()))
            .auth("tok", "u1")
            .build()
            .unwrap()
    }

    fn message_json(id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "conversationId": "c1",
            "senderId": "u1",
            "text": text,
            "createdAt": "2024-05-01T10:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn test_fetch_messages_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations/c1/messages"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "50"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [message_json("m2", "b"), message_json("m1", "a")],
                "pagination": {"page": 2, "limit": 50, "total": 52, "totalPages": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let page = client
            .conversations()
            .messages("c1")
            .page(2)
            .send()
            .await
            .unwrap();

        let ids: Vec<_> = page.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert!(!page.pagination.has_more());
    }

    #[tokio::test]
    async fn test_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/conversations/c1/messages"))
            .and(body_json(serde_json::json!({"text": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(message_json("m9", "hello")))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let msg = client.conversations().send("c1", "hello").await.unwrap();
        assert_eq!(msg.id.as_str(), "m9");
        assert_eq!(msg.text, "hello");
    }

    #[tokio::test]
    async fn test_send_rejects_blank_and_oversized_text() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client.conversations().send("c1", "   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let err = client.conversations().send("c1", &long).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_statuses_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "Conversation not found"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/conversations/c1/messages"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);

        match client.conversations().get("missing").await.unwrap_err() {
            Error::Application { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Conversation not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = client.conversations().send("c1", "hi").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(matches!(err, Error::Http { .. }));
    }

    #[tokio::test]
    async fn test_unauthorized_clears_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Invalid token"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let client = MarketClient::builder()
            .base_url(format!("{}/api", server.uri()))
            .auth("stale", "u1")
            .on_unauthorized(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        let err = client.conversations().list().await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(!client.is_authenticated());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let err = client.conversations().list().await.unwrap_err();
        assert!(matches!(err, Error::AuthRequired));
    }

    #[tokio::test]
    async fn test_start_conversation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/conversations"))
            .and(body_json(serde_json::json!({"participantId": "u2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c7",
                "participants": [{"id": "u1"}, {"id": "u2", "name": "Bo"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let conv = client.conversations().start("u2").await.unwrap();
        assert_eq!(conv.id.as_str(), "c7");
        assert_eq!(conv.participants.len(), 2);
    }
}
