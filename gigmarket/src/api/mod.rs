//! API modules.

mod conversation;
mod reel;

pub use conversation::{
    ConversationApi, ConversationTransport, MessagesBuilder, MAX_MESSAGE_CHARS,
    MESSAGE_PAGE_LIMIT,
};
pub use reel::{ReelApi, ReelFeedBuilder, REEL_PAGE_MAX, REEL_PAGE_MIN};
