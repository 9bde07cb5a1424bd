//! Cursor-based pagination shared by the reel feed and conversation history.

mod engine;
mod page;
mod source;

pub use engine::CursorEngine;
pub use page::{Page, PageRequest, PageResult, PagingMode};
pub use source::{MessageHistory, PageSource, ReelFeed};
