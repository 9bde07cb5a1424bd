//! Reel handlers.

use anyhow::Result;
use colored::Colorize;
use chrono::{DateTime, Utc};
use gigmarket::{CursorEngine, MarketClient, Reel, ReelFeed};
use serde::Serialize;

use crate::output::{format_relative_time, truncate, PlainPrint, TableRow};

/// Reel summary.
#[derive(Debug, Clone, Serialize)]
pub struct ReelInfo {
    pub id: String,
    pub author: String,
    pub author_id: String,
    pub caption: String,
    pub likes: u64,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Reel> for ReelInfo {
    fn from(r: &Reel) -> Self {
        Self {
            id: r.id.to_string(),
            author: r.author_name().to_string(),
            author_id: r.user_id.to_string(),
            caption: r.caption.clone().unwrap_or_default(),
            likes: r.likes_count,
            video_url: r.video_url.clone(),
            created_at: r.created_at,
        }
    }
}

impl TableRow for ReelInfo {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Author", "Caption", "Likes", "Posted"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.author.clone(),
            truncate(&self.caption, 48),
            self.likes.to_string(),
            format_relative_time(self.created_at),
        ]
    }
}

impl PlainPrint for ReelInfo {
    fn plain_print(&self) {
        println!(
            "{} {} {}",
            format!("[Reel {}]", self.id).cyan(),
            self.author.green(),
            format!("[UID: {}]", self.author_id).dimmed()
        );
        if !self.caption.is_empty() {
            println!("   {}", self.caption.bold());
        }
        println!(
            "   {} likes | {} | {}",
            self.likes,
            format_relative_time(self.created_at).dimmed(),
            self.video_url.dimmed()
        );
    }
}

/// Reels collected from one or more feed pages.
#[derive(Debug, Clone, Serialize)]
pub struct ReelFeedResult {
    pub pages: u32,
    pub has_more: bool,
    pub reels: Vec<ReelInfo>,
}

/// Walk the feed from the newest reel for up to `pages` pages.
pub async fn fetch_feed(client: &MarketClient, limit: u32, pages: u32) -> Result<ReelFeedResult> {
    let engine = CursorEngine::new(ReelFeed::new(client.reels()));

    let first = engine.fetch_first_page(limit).await?;
    let mut reels: Vec<ReelInfo> = first.items.iter().map(ReelInfo::from).collect();
    let mut fetched = 1;

    while fetched < pages.max(1) && engine.has_more() {
        let page = engine.fetch_next_page().await?;
        reels.extend(page.items.iter().map(ReelInfo::from));
        fetched += 1;
    }

    Ok(ReelFeedResult {
        pages: fetched,
        has_more: engine.has_more(),
        reels,
    })
}
