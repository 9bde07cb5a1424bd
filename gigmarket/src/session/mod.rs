//! Live conversation sessions: optimistic sends, history paging and polling.

mod controller;
mod entry;
mod gate;
mod poller;
mod window;

pub use controller::{
    ConversationSession, PollOutcome, SendOutcome, SendRejection, SessionBuilder, SessionConfig,
    SessionPhase, SessionSnapshot, DEFAULT_POLL_INTERVAL,
};
pub use entry::{ChatEntry, LocalId, PendingMessage};
pub use gate::{AppActivity, ForegroundGate};
pub use poller::Poller;
pub use window::MessageWindow;
