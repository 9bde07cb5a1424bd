//! Continuation tracking over a paged resource.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use super::{Page, PageRequest, PageSource};
use crate::error::{Error, Result};

/// Walks a [`PageSource`] from its newest page towards older ones.
///
/// At most one continuation fetch is in flight per engine; overlapping
/// [`fetch_next_page`](Self::fetch_next_page) calls fail with
/// [`Error::NoMoreData`] instead of issuing a second request.
pub struct CursorEngine<S: PageSource> {
    source: S,
    state: Mutex<EngineState>,
}

#[derive(Debug, Default)]
struct EngineState {
    /// Request for the next older page, `None` when exhausted or unstarted.
    next: Option<PageRequest>,
    in_flight: bool,
    /// Bumped by every reset so stale continuations are dropped.
    epoch: u64,
}

/// Clears the in-flight flag on every exit path, cancellation included.
struct InFlight<'a> {
    state: &'a Mutex<EngineState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight = false;
    }
}

impl<S: PageSource> CursorEngine<S> {
    /// Create an engine over a source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an older page can be fetched.
    pub fn has_more(&self) -> bool {
        self.lock().next.is_some()
    }

    /// Whether a continuation fetch is running.
    pub fn is_fetching(&self) -> bool {
        self.lock().in_flight
    }

    /// Forget the continuation and fetch the newest page.
    pub async fn fetch_first_page(&self, limit: u32) -> Result<Page<S::Item>> {
        let epoch = {
            let mut state = self.lock();
            state.next = None;
            state.epoch += 1;
            state.epoch
        };

        let request = self.source.mode().first_request(limit);
        debug!("fetching first page: {:?}", request);
        let (items, next) = self.source.fetch_page(request).await?.split(limit);

        let mut state = self.lock();
        if state.epoch == epoch {
            state.next = next;
        }
        Ok(Page {
            has_more: state.next.is_some(),
            items,
        })
    }

    /// Fetch the page after the stored continuation.
    pub async fn fetch_next_page(&self) -> Result<Page<S::Item>> {
        let (request, epoch) = {
            let mut state = self.lock();
            if state.in_flight {
                return Err(Error::NoMoreData);
            }
            let Some(request) = state.next.clone() else {
                return Err(Error::NoMoreData);
            };
            state.in_flight = true;
            (request, state.epoch)
        };
        let _guard = InFlight { state: &self.state };

        debug!("fetching next page: {:?}", request);
        let limit = request.limit();
        let (items, next) = self.source.fetch_page(request).await?.split(limit);

        let mut state = self.lock();
        if state.epoch == epoch {
            state.next = next;
        }
        Ok(Page {
            has_more: state.next.is_some(),
            items,
        })
    }

    /// Fetch the newest page without touching the continuation.
    pub async fn refetch_newest(&self, limit: u32) -> Result<Page<S::Item>> {
        let request = self.source.mode().first_request(limit);
        let (items, next) = self.source.fetch_page(request).await?.split(limit);
        Ok(Page {
            items,
            has_more: next.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::{PageResult, PagingMode};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Serves `total_pages` offset pages of three descending numbers each.
    struct Numbers {
        total_pages: u32,
        requests: Mutex<Vec<PageRequest>>,
        gate: Option<Arc<Notify>>,
    }

    impl Numbers {
        fn new(total_pages: u32) -> Self {
            Self {
                total_pages,
                requests: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PageSource for Numbers {
        type Item = u32;

        fn mode(&self) -> PagingMode {
            PagingMode::Offset
        }

        async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<u32>> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let PageRequest::Offset { page, .. } = request else {
                unreachable!()
            };
            let top = (self.total_pages - page + 1) * 3;
            Ok(PageResult::Offset {
                items: vec![top, top - 1, top - 2],
                page,
                total_pages: self.total_pages,
            })
        }
    }

    /// Cursor source scripted with canned responses.
    struct Scripted {
        responses: Mutex<VecDeque<Result<PageResult<&'static str>>>>,
        requests: Mutex<Vec<PageRequest>>,
    }

    #[async_trait]
    impl PageSource for Scripted {
        type Item = &'static str;

        fn mode(&self) -> PagingMode {
            PagingMode::Cursor
        }

        async fn fetch_page(&self, request: PageRequest) -> Result<PageResult<&'static str>> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(Error::NoMoreData))
        }
    }

    #[tokio::test]
    async fn test_walks_offset_pages_to_the_end() {
        let engine = CursorEngine::new(Numbers::new(3));

        let first = engine.fetch_first_page(3).await.unwrap();
        assert_eq!(first.items, vec![9, 8, 7]);
        assert!(first.has_more);

        let second = engine.fetch_next_page().await.unwrap();
        assert_eq!(second.items, vec![6, 5, 4]);

        let third = engine.fetch_next_page().await.unwrap();
        assert_eq!(third.items, vec![3, 2, 1]);
        assert!(!third.has_more);
        assert!(!engine.has_more());

        let requests_before = engine.source().request_count();
        assert!(matches!(
            engine.fetch_next_page().await,
            Err(Error::NoMoreData)
        ));
        assert_eq!(engine.source().request_count(), requests_before);
    }

    #[tokio::test]
    async fn test_next_page_before_first_page_is_no_more_data() {
        let engine = CursorEngine::new(Numbers::new(2));
        assert!(matches!(
            engine.fetch_next_page().await,
            Err(Error::NoMoreData)
        ));
        assert_eq!(engine.source().request_count(), 0);
    }

    #[tokio::test]
    async fn test_single_flight_next_page() {
        let gate = Arc::new(Notify::new());
        let source = Numbers {
            gate: Some(gate.clone()),
            ..Numbers::new(3)
        };
        let engine = CursorEngine::new(source);

        gate.notify_one();
        engine.fetch_first_page(3).await.unwrap();

        let (first, second, _) = tokio::join!(
            engine.fetch_next_page(),
            engine.fetch_next_page(),
            async {
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        assert_eq!(first.unwrap().items, vec![6, 5, 4]);
        assert!(matches!(second, Err(Error::NoMoreData)));
        assert_eq!(engine.source().request_count(), 2);
        assert!(!engine.is_fetching());
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_in_flight_and_keeps_cursor() {
        let source = Scripted {
            responses: Mutex::new(VecDeque::from(vec![
                Ok(PageResult::Cursor {
                    items: vec!["r3", "r2"],
                    next_cursor: Some("r2".into()),
                    has_more: true,
                }),
                Err(Error::from_status(503, "down")),
                Ok(PageResult::Cursor {
                    items: vec!["r1"],
                    next_cursor: None,
                    has_more: false,
                }),
            ])),
            requests: Mutex::new(Vec::new()),
        };
        let engine = CursorEngine::new(source);

        engine.fetch_first_page(10).await.unwrap();
        assert!(engine.fetch_next_page().await.is_err());
        assert!(!engine.is_fetching());
        assert!(engine.has_more());

        let last = engine.fetch_next_page().await.unwrap();
        assert_eq!(last.items, vec!["r1"]);
        assert!(!last.has_more);

        let requests = engine.source().requests.lock().unwrap().clone();
        let retry = PageRequest::Cursor {
            cursor: Some("r2".into()),
            limit: 10,
        };
        assert_eq!(
            requests,
            vec![PagingMode::Cursor.first_request(10), retry.clone(), retry]
        );
    }

    #[tokio::test]
    async fn test_refetch_newest_keeps_continuation() {
        let engine = CursorEngine::new(Numbers::new(3));
        engine.fetch_first_page(3).await.unwrap();
        engine.fetch_next_page().await.unwrap();

        let newest = engine.refetch_newest(3).await.unwrap();
        assert_eq!(newest.items, vec![9, 8, 7]);

        let third = engine.fetch_next_page().await.unwrap();
        assert_eq!(third.items, vec![3, 2, 1]);
    }
}
