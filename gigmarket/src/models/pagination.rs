//! Offset pagination envelope.

use serde::{Deserialize, Serialize};

/// Pagination info returned by offset-paged endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page, 1-based.
    pub page: u32,
    /// Page size used by the server.
    #[serde(default)]
    pub limit: u32,
    /// Total item count.
    #[serde(default)]
    pub total: u64,
    /// Total page count.
    pub total_pages: u32,
}

impl Pagination {
    /// Whether a later page exists.
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}
