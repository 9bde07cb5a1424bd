//! Reel feed API.

use std::sync::Arc;

use crate::{client::MarketClientInner, error::Result, models::ReelPage};

/// Smallest page the feed endpoint serves.
pub const REEL_PAGE_MIN: u32 = 10;

/// Largest page the feed endpoint serves.
pub const REEL_PAGE_MAX: u32 = 50;

/// API for the reel feed.
#[derive(Clone)]
pub struct ReelApi {
    client: Arc<MarketClientInner>,
}

impl ReelApi {
    pub(crate) fn new(client: Arc<MarketClientInner>) -> Self {
        Self { client }
    }

    /// Get a page of the feed.
    pub fn feed(&self) -> ReelFeedBuilder {
        ReelFeedBuilder {
            client: self.client.clone(),
            cursor: None,
            limit: REEL_PAGE_MIN,
        }
    }
}

/// Builder for feed page requests.
pub struct ReelFeedBuilder {
    client: Arc<MarketClientInner>,
    cursor: Option<String>,
    limit: u32,
}

impl ReelFeedBuilder {
    /// Continue after the given cursor.
    pub fn cursor(mut self, cursor: Option<impl Into<String>>) -> Self {
        self.cursor = cursor.map(Into::into);
        self
    }

    /// Set the page size, clamped to what the server accepts.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(REEL_PAGE_MIN, REEL_PAGE_MAX);
        self
    }

    /// Execute the request.
    pub async fn send(self) -> Result<ReelPage> {
        let limit_str = self.limit.to_string();
        let cursor = self.cursor.unwrap_or_default();

        self.client
            .get("reels", &[("cursor", &cursor), ("limit", &limit_str)])
            .await
    }
}
