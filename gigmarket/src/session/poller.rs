//! Fixed-interval background refresh for an open conversation.

use std::sync::Arc;

use log::{debug, trace};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::controller::{ConversationSession, PollOutcome};

/// Drives [`ConversationSession::poll`] on the session's poll interval.
///
/// The task ends when the session closes, on [`stop`](Self::stop), or when
/// the handle is dropped.
#[derive(Debug)]
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn the polling task on the current tokio runtime.
    pub fn spawn(session: Arc<ConversationSession>) -> Self {
        let every = session.config().poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + every, every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                if session.is_closed() {
                    break;
                }
                match session.poll().await {
                    PollOutcome::Merged(n) => {
                        debug!("poll merged {} into {}", n, session.conversation_id())
                    }
                    outcome => trace!("poll {}: {:?}", session.conversation_id(), outcome),
                }
            }
            debug!("poller for {} stopped", session.conversation_id());
        });

        Self { handle }
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop polling now.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
