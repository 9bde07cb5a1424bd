//! Reel feed models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Participant, ReelId, UserId};

/// A short video posted by a freelancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reel {
    /// Reel ID.
    pub id: ReelId,
    /// Author's user ID.
    pub user_id: UserId,
    /// Video URL.
    pub video_url: String,
    /// Poster frame URL.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Caption text.
    #[serde(default)]
    pub caption: Option<String>,
    /// Like count.
    #[serde(default)]
    pub likes_count: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Embedded author profile.
    #[serde(default)]
    pub user: Option<Participant>,
}

impl Reel {
    /// Name of the author, falling back to the user ID.
    pub fn author_name(&self) -> &str {
        self.user
            .as_ref()
            .map(Participant::display_name)
            .unwrap_or(self.user_id.as_str())
    }
}

/// One page of the reel feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelPage {
    /// Reels, newest first.
    pub items: Vec<Reel>,
    /// Cursor for the following page.
    #[serde(default)]
    pub next_cursor: Option<String>,
    /// Whether another page exists.
    #[serde(default)]
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reel_page_wire_shape() {
        let json = r#"{
            "items": [{
                "id": "r1", "userId": "u1", "videoUrl": "https://cdn/x.mp4",
                "createdAt": "2024-05-01T10:00:00Z",
                "user": {"id": "u1", "name": "Ana"}
            }],
            "nextCursor": "r1",
            "hasMore": true
        }"#;

        let page: ReelPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items[0].author_name(), "Ana");
        assert_eq!(page.items[0].likes_count, 0);
        assert_eq!(page.next_cursor.as_deref(), Some("r1"));
        assert!(page.has_more);
    }

    #[test]
    fn test_reel_page_end_of_feed() {
        let page: ReelPage =
            serde_json::from_str(r#"{"items": [], "nextCursor": null, "hasMore": false}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }
}
