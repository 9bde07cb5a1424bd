//! Data models for marketplace entities.

mod ids;
mod message;
mod pagination;
mod reel;

pub use ids::{ConversationId, MessageId, ReelId, UserId};
pub use message::{Conversation, Message, MessagePage, Participant};
pub use pagination::Pagination;
pub use reel::{Reel, ReelPage};
