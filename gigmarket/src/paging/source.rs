//! Paged resources the engine can walk.

use std::sync::Arc;

use async_trait::async_trait;

use super::{PageRequest, PageResult, PagingMode};
use crate::{
    api::{ConversationTransport, ReelApi},
    error::{Error, Result},
    models::{ConversationId, Message, Reel},
};

/// A resource served one page at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Item type of the resource.
    type Item: Send;

    /// Pagination style of the resource.
    fn mode(&self) -> PagingMode;

    /// Fetch one page.
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<Self::Item>>;
}

/// History of one conversation, offset-paged, newest first.
#[derive(Clone)]
pub struct MessageHistory {
    transport: Arc<dyn ConversationTransport>,
    conversation_id: ConversationId,
}

impl MessageHistory {
    /// Create a history source for a conversation.
    pub fn new(transport: Arc<dyn ConversationTransport>, conversation_id: ConversationId) -> Self {
        Self {
            transport,
            conversation_id,
        }
    }

    /// The conversation this source reads.
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }
}

#[async_trait]
impl PageSource for MessageHistory {
    type Item = Message;

    fn mode(&self) -> PagingMode {
        PagingMode::Offset
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<Message>> {
        let PageRequest::Offset { page, limit } = request else {
            return Err(Error::Internal(
                "message history is page-number paginated".into(),
            ));
        };

        let result = self
            .transport
            .fetch_messages(&self.conversation_id, page, limit)
            .await?;

        Ok(PageResult::Offset {
            items: result.messages,
            page: result.pagination.page,
            total_pages: result.pagination.total_pages,
        })
    }
}

/// The public reel feed, cursor-paged, newest first.
#[derive(Clone)]
pub struct ReelFeed {
    api: ReelApi,
}

impl ReelFeed {
    /// Create a feed source.
    pub fn new(api: ReelApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for ReelFeed {
    type Item = Reel;

    fn mode(&self) -> PagingMode {
        PagingMode::Cursor
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<Reel>> {
        let PageRequest::Cursor { cursor, limit } = request else {
            return Err(Error::Internal("reel feed is cursor paginated".into()));
        };

        let page = self.api.feed().cursor(cursor).limit(limit).send().await?;

        Ok(PageResult::Cursor {
            items: page.items,
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }
}
