//! Live state of one open conversation.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::watch;

use super::entry::{ChatEntry, LocalId, PendingMessage};
use super::gate::{AppActivity, ForegroundGate};
use super::window::MessageWindow;
use crate::{
    api::{ConversationTransport, MESSAGE_PAGE_LIMIT},
    client::DEFAULT_TIMEOUT,
    error::{Error, Result},
    models::{ConversationId, Message, MessageId, UserId},
    paging::{CursorEngine, MessageHistory},
};

/// Default interval between background refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Tuning for a conversation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Messages per history request.
    pub page_size: u32,
    /// Interval between background refreshes.
    pub poll_interval: Duration,
    /// Upper bound on every network call.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: MESSAGE_PAGE_LIMIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "error", rename_all = "lowercase")]
pub enum SessionPhase {
    /// Built, not opened yet.
    Idle,
    /// Initial page requested.
    Loading,
    /// Window populated; sends, history and polls are accepted.
    Ready,
    /// Initial load failed; `retry` re-enters `Loading`.
    Failed(String),
    /// Torn down; late responses are dropped.
    Closed,
}

/// Why a send did not go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    EmptyText,
    AlreadySending,
    NotReady,
}

/// Result of [`ConversationSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The server confirmed the message.
    Sent(Message),
    /// Nothing was sent.
    Ignored(SendRejection),
}

/// Result of one background refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The host reports the app is in the background; no request made.
    Suspended,
    /// Not ready, closed, or a refresh is already running.
    Skipped,
    /// Newest message is the one already seen.
    Unchanged,
    /// New messages were appended.
    Merged(usize),
    /// The request failed; nothing changed.
    Failed,
}

/// Point-in-time view for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub entries: Vec<ChatEntry>,
    pub has_more: bool,
    pub sending: bool,
    pub loading_older: bool,
    pub revision: u64,
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    window: MessageWindow,
    last_seen_id: Option<MessageId>,
    sending: Option<LocalId>,
    loading_older: bool,
    polling: bool,
    /// Bumped on every observable change and broadcast to subscribers.
    version: u64,
}

enum Activity {
    Sending(LocalId),
    LoadingOlder,
    Polling,
}

/// Releases a guard flag however the owning call ends.
///
/// A send dropped mid-flight also takes its placeholder with it.
struct Busy<'a> {
    session: &'a ConversationSession,
    activity: Activity,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        let mut state = self.session.lock();
        let changed = match &self.activity {
            Activity::Sending(local) => {
                let cleared = state.sending.as_ref() == Some(local);
                if cleared {
                    state.sending = None;
                }
                state.window.remove_pending(local) || cleared
            }
            Activity::LoadingOlder => {
                state.loading_older = false;
                false
            }
            Activity::Polling => {
                state.polling = false;
                false
            }
        };
        if changed {
            self.session.publish(&mut state);
        }
    }
}

/// Owns the message window of one open conversation.
///
/// Initial load, sends, history loads and polls may interleave; guard flags
/// reject conflicting calls instead of queueing them. Every response is
/// applied only if the session has not been closed meanwhile.
pub struct ConversationSession {
    conversation_id: ConversationId,
    sender: Option<UserId>,
    transport: Arc<dyn ConversationTransport>,
    history: CursorEngine<MessageHistory>,
    gate: Arc<dyn ForegroundGate>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    changes: watch::Sender<u64>,
}

impl ConversationSession {
    /// Start building a session.
    pub fn builder(
        transport: Arc<dyn ConversationTransport>,
        conversation_id: impl Into<ConversationId>,
    ) -> SessionBuilder {
        SessionBuilder::new(transport, conversation_id)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &mut SessionState) {
        state.version += 1;
        self.changes.send_replace(state.version);
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.config.request_timeout)),
        }
    }

    /// Load the newest page and enter `Ready`.
    ///
    /// A no-op while loading or ready. On failure the session enters
    /// `Failed` and the error is returned for display.
    pub async fn open(&self) -> Result<()> {
        {
            let mut state = self.lock();
            match &state.phase {
                SessionPhase::Idle | SessionPhase::Failed(_) => {}
                SessionPhase::Loading | SessionPhase::Ready => return Ok(()),
                SessionPhase::Closed => return Err(Error::SessionClosed),
            }
            state.phase = SessionPhase::Loading;
            self.publish(&mut state);
        }

        debug!("opening conversation {}", self.conversation_id);
        let result = self
            .bounded(self.history.fetch_first_page(self.config.page_size))
            .await;

        let mut state = self.lock();
        if state.phase == SessionPhase::Closed {
            debug!("conversation {} closed during load", self.conversation_id);
            return Err(Error::SessionClosed);
        }

        let outcome = match result {
            Ok(page) => {
                state.last_seen_id = page.items.first().map(|m| m.id.clone());
                state.window.replace_all(page.items);
                state.phase = SessionPhase::Ready;
                debug!(
                    "conversation {} ready with {} messages",
                    self.conversation_id,
                    state.window.len()
                );
                Ok(())
            }
            Err(e) => {
                warn!("loading conversation {} failed: {}", self.conversation_id, e);
                state.phase = SessionPhase::Failed(e.to_string());
                Err(e)
            }
        };
        self.publish(&mut state);
        outcome
    }

    /// Re-run the initial load after a failure.
    pub async fn retry(&self) -> Result<()> {
        if !matches!(self.phase(), SessionPhase::Failed(_)) {
            return Ok(());
        }
        self.open().await
    }

    /// Send a message with an optimistic placeholder.
    ///
    /// The placeholder is appended at once, then swapped for the server's
    /// message on success or removed on failure. The error is returned so
    /// the caller can show it; the typed text is not kept anywhere else.
    pub async fn send(&self, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored(SendRejection::EmptyText));
        }

        let local_id = {
            let mut state = self.lock();
            if state.phase != SessionPhase::Ready {
                return Ok(SendOutcome::Ignored(SendRejection::NotReady));
            }
            if state.sending.is_some() {
                return Ok(SendOutcome::Ignored(SendRejection::AlreadySending));
            }

            let pending =
                PendingMessage::new(self.conversation_id.clone(), self.sender.clone(), text);
            let local_id = pending.local_id.clone();
            state.window.push_pending(pending);
            state.sending = Some(local_id.clone());
            self.publish(&mut state);
            local_id
        };
        let _busy = Busy {
            session: self,
            activity: Activity::Sending(local_id.clone()),
        };

        debug!("sending {} to conversation {}", local_id, self.conversation_id);
        let result = self
            .bounded(self.transport.create_message(&self.conversation_id, text))
            .await;

        let mut state = self.lock();
        state.sending = None;
        if state.phase == SessionPhase::Closed {
            return result.map(SendOutcome::Sent);
        }

        match result {
            Ok(message) => {
                // A poll that already merged the message has also moved
                // last_seen_id at or past it.
                if state.window.confirm(&local_id, message.clone()) {
                    state.last_seen_id = Some(message.id.clone());
                }
                self.publish(&mut state);
                Ok(SendOutcome::Sent(message))
            }
            Err(e) => {
                warn!("send to conversation {} failed: {}", self.conversation_id, e);
                state.window.remove_pending(&local_id);
                self.publish(&mut state);
                Err(e)
            }
        }
    }

    /// Prepend the next older page of history.
    ///
    /// Returns how many messages were added. Does nothing while another
    /// history load runs or once history is exhausted. Failures are logged
    /// and otherwise ignored; calling again retries.
    pub async fn load_older(&self) -> usize {
        {
            let mut state = self.lock();
            if state.phase != SessionPhase::Ready
                || state.loading_older
                || !self.history.has_more()
            {
                return 0;
            }
            state.loading_older = true;
            self.publish(&mut state);
        }
        let _busy = Busy {
            session: self,
            activity: Activity::LoadingOlder,
        };

        let result = self.bounded(self.history.fetch_next_page()).await;

        let mut state = self.lock();
        state.loading_older = false;
        if state.phase == SessionPhase::Closed {
            return 0;
        }

        let added = match result {
            Ok(page) => state.window.prepend_older(page.items),
            Err(Error::NoMoreData) => 0,
            Err(e) => {
                warn!(
                    "loading older messages of {} failed: {}",
                    self.conversation_id, e
                );
                0
            }
        };
        self.publish(&mut state);
        added
    }

    /// Refresh the newest page and merge it if something new arrived.
    ///
    /// Skips the request entirely while the host reports background.
    /// Failures are logged and never surfaced.
    pub async fn poll(&self) -> PollOutcome {
        if !self.gate.is_foreground() {
            return PollOutcome::Suspended;
        }

        {
            let mut state = self.lock();
            if state.phase != SessionPhase::Ready || state.polling {
                return PollOutcome::Skipped;
            }
            state.polling = true;
        }
        let _busy = Busy {
            session: self,
            activity: Activity::Polling,
        };

        let result = self
            .bounded(self.history.refetch_newest(self.config.page_size))
            .await;

        let mut state = self.lock();
        state.polling = false;
        if state.phase == SessionPhase::Closed {
            return PollOutcome::Skipped;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("polling conversation {} failed: {}", self.conversation_id, e);
                return PollOutcome::Failed;
            }
        };

        let Some(newest) = page.items.first().map(|m| m.id.clone()) else {
            return PollOutcome::Unchanged;
        };
        if state.last_seen_id.as_ref() == Some(&newest) {
            return PollOutcome::Unchanged;
        }

        let revision = state.window.revision();
        let added = state.window.merge_newer(page.items);
        state.last_seen_id = Some(newest.clone());
        if state.window.revision() == revision {
            return PollOutcome::Unchanged;
        }

        debug!(
            "conversation {} advanced to {} ({} new)",
            self.conversation_id, newest, added
        );
        self.publish(&mut state);
        PollOutcome::Merged(added)
    }

    /// Tear the session down. Responses still in flight are ignored.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.phase == SessionPhase::Closed {
            return;
        }
        debug!("closing conversation {}", self.conversation_id);
        state.phase = SessionPhase::Closed;
        self.publish(&mut state);
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().phase == SessionPhase::Closed
    }

    pub fn is_sending(&self) -> bool {
        self.lock().sending.is_some()
    }

    pub fn is_loading_older(&self) -> bool {
        self.lock().loading_older
    }

    /// Whether older history can still be loaded.
    pub fn has_more(&self) -> bool {
        self.history.has_more()
    }

    /// ID of the newest message known to the session.
    pub fn last_seen_id(&self) -> Option<MessageId> {
        self.lock().last_seen_id.clone()
    }

    /// Window entries, oldest first.
    pub fn entries(&self) -> Vec<ChatEntry> {
        self.lock().window.entries().to_vec()
    }

    /// Window mutation counter.
    pub fn revision(&self) -> u64 {
        self.lock().window.revision()
    }

    /// Everything a renderer needs, captured under one lock.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            phase: state.phase.clone(),
            entries: state.window.entries().to_vec(),
            has_more: self.history.has_more(),
            sending: state.sending.is_some(),
            loading_older: state.loading_older,
            revision: state.window.revision(),
        }
    }

    /// Receive a tick whenever the session changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ConversationSession")
            .field("conversation_id", &self.conversation_id)
            .field("phase", &state.phase)
            .field("messages", &state.window.len())
            .field("sending", &state.sending.is_some())
            .finish()
    }
}

/// Builder for [`ConversationSession`].
pub struct SessionBuilder {
    transport: Arc<dyn ConversationTransport>,
    conversation_id: ConversationId,
    sender: Option<UserId>,
    gate: Option<Arc<dyn ForegroundGate>>,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create a builder for a conversation.
    pub fn new(
        transport: Arc<dyn ConversationTransport>,
        conversation_id: impl Into<ConversationId>,
    ) -> Self {
        Self {
            transport,
            conversation_id: conversation_id.into(),
            sender: None,
            gate: None,
            config: SessionConfig::default(),
        }
    }

    /// Author stamped on optimistic placeholders.
    pub fn sender(mut self, user_id: impl Into<UserId>) -> Self {
        self.sender = Some(user_id.into());
        self
    }

    /// Foreground gate consulted before each poll.
    pub fn gate(mut self, gate: Arc<dyn ForegroundGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the history page size.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size.clamp(1, MESSAGE_PAGE_LIMIT);
        self
    }

    /// Set the poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the per-call timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the session in the `Idle` phase.
    pub fn build(self) -> ConversationSession {
        let history = MessageHistory::new(self.transport.clone(), self.conversation_id.clone());
        let (changes, _) = watch::channel(0);

        ConversationSession {
            conversation_id: self.conversation_id,
            sender: self.sender,
            transport: self.transport,
            history: CursorEngine::new(history),
            gate: self
                .gate
                .unwrap_or_else(|| Arc::new(AppActivity::default())),
            config: self.config,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Idle,
                window: MessageWindow::new(),
                last_seen_id: None,
                sending: None,
                loading_older: false,
                polling: false,
                version: 0,
            }),
            changes,
        }
    }
}
