//! Rust client library for the gig marketplace API.

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod paging;
pub mod session;

// Re-export main types
pub use client::{AuthInfo, HttpConfig, MarketClient, MarketClientBuilder};
pub use error::{Error, Result};

// Re-export commonly used models
pub use models::{
    Conversation, ConversationId, Message, MessageId, MessagePage, Pagination, Participant, Reel,
    ReelId, ReelPage, UserId,
};

// Re-export paging and session types
pub use paging::{CursorEngine, MessageHistory, Page, PageSource, ReelFeed};
pub use session::{
    AppActivity, ChatEntry, ConversationSession, ForegroundGate, PollOutcome, Poller,
    SendOutcome, SessionConfig, SessionPhase,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = MarketClient::builder().build();
        assert!(client.is_ok());

        let client = client.unwrap();
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_client_with_auth() {
        let client = MarketClient::builder()
            .auth("test_token", "u1")
            .build()
            .unwrap();

        assert!(client.is_authenticated());
        assert_eq!(client.current_user_id(), Some(UserId::from("u1")));

        client.sign_out();
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_bad_base_url_is_rejected() {
        assert!(MarketClient::builder().base_url("not a url").build().is_err());
    }

    #[test]
    fn test_session_from_client_stamps_sender() {
        let client = MarketClient::builder().auth("t", "u1").build().unwrap();
        let session = client.conversation_session("c1").build();
        assert_eq!(session.conversation_id().as_str(), "c1");
        assert_eq!(session.phase(), SessionPhase::Idle);
    }
}
