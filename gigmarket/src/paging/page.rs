//! Page requests and the two pagination envelopes.

/// How a resource continues from one page to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// Opaque id-cursor (`{cursor?, limit}` → `{items, nextCursor, hasMore}`).
    Cursor,
    /// Page number (`{page, limit}` → `{items, page, totalPages}`).
    Offset,
}

impl PagingMode {
    /// Request for the newest page.
    pub fn first_request(self, limit: u32) -> PageRequest {
        match self {
            PagingMode::Cursor => PageRequest::Cursor {
                cursor: None,
                limit,
            },
            PagingMode::Offset => PageRequest::Offset { page: 1, limit },
        }
    }
}

/// One request against a paged resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Continue after `cursor`; `None` asks for the first page.
    Cursor { cursor: Option<String>, limit: u32 },
    /// Fetch page `page` (1-based).
    Offset { page: u32, limit: u32 },
}

impl PageRequest {
    /// Requested page size.
    pub fn limit(&self) -> u32 {
        match self {
            PageRequest::Cursor { limit, .. } | PageRequest::Offset { limit, .. } => *limit,
        }
    }
}

/// A page as the resource returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult<T> {
    /// Id-cursor envelope.
    Cursor {
        items: Vec<T>,
        next_cursor: Option<String>,
        has_more: bool,
    },
    /// Page-number envelope.
    Offset {
        items: Vec<T>,
        page: u32,
        total_pages: u32,
    },
}

impl<T> PageResult<T> {
    /// Normalize into items plus the request that continues after them.
    ///
    /// A cursor page claiming `has_more` without a cursor cannot be continued
    /// and counts as the last page.
    pub fn split(self, limit: u32) -> (Vec<T>, Option<PageRequest>) {
        match self {
            PageResult::Cursor {
                items,
                next_cursor,
                has_more,
            } => {
                let next = next_cursor
                    .filter(|c| has_more && !c.is_empty())
                    .map(|c| PageRequest::Cursor {
                        cursor: Some(c),
                        limit,
                    });
                (items, next)
            }
            PageResult::Offset {
                items,
                page,
                total_pages,
            } => {
                let next = (page < total_pages).then(|| PageRequest::Offset {
                    page: page + 1,
                    limit,
                });
                (items, next)
            }
        }
    }
}

/// Items of one page in the resource's native order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items, newest first for both marketplace resources.
    pub items: Vec<T>,
    /// Whether an older page can still be fetched.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// A page with nothing in it and nothing after it.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_continuation() {
        let result = PageResult::Offset {
            items: vec![3, 2, 1],
            page: 1,
            total_pages: 2,
        };
        let (items, next) = result.split(50);
        assert_eq!(items, vec![3, 2, 1]);
        assert_eq!(next, Some(PageRequest::Offset { page: 2, limit: 50 }));

        let last = PageResult::<u8>::Offset {
            items: vec![],
            page: 2,
            total_pages: 2,
        };
        assert_eq!(last.split(50).1, None);
    }

    #[test]
    fn test_cursor_continuation() {
        let result = PageResult::Cursor {
            items: vec!["r2", "r1"],
            next_cursor: Some("r1".to_string()),
            has_more: true,
        };
        assert_eq!(
            result.split(10).1,
            Some(PageRequest::Cursor {
                cursor: Some("r1".into()),
                limit: 10
            })
        );
    }

    #[test]
    fn test_cursor_without_token_is_last_page() {
        let result = PageResult::<u8>::Cursor {
            items: vec![],
            next_cursor: None,
            has_more: true,
        };
        assert_eq!(result.split(10).1, None);

        let result = PageResult::<u8>::Cursor {
            items: vec![],
            next_cursor: Some("r1".into()),
            has_more: false,
        };
        assert_eq!(result.split(10).1, None);
    }

    #[test]
    fn test_first_request() {
        assert_eq!(
            PagingMode::Offset.first_request(50),
            PageRequest::Offset { page: 1, limit: 50 }
        );
        assert_eq!(PagingMode::Cursor.first_request(10).limit(), 10);
    }
}
