//! Host-supplied permission to touch the network in the background.

use std::sync::atomic::{AtomicBool, Ordering};

/// Answers "may a background refresh call the network right now?".
///
/// Checked before every poll; an in-flight request is never cancelled.
pub trait ForegroundGate: Send + Sync {
    fn is_foreground(&self) -> bool;
}

/// Foreground flag flipped by the host's app-lifecycle events.
#[derive(Debug)]
pub struct AppActivity {
    foreground: AtomicBool,
}

impl AppActivity {
    /// Create a flag starting in the given state.
    pub fn new(foreground: bool) -> Self {
        Self {
            foreground: AtomicBool::new(foreground),
        }
    }

    /// Record that the app came to the foreground.
    pub fn set_foreground(&self) {
        self.foreground.store(true, Ordering::Release);
    }

    /// Record that the app went to the background.
    pub fn set_background(&self) {
        self.foreground.store(false, Ordering::Release);
    }
}

impl Default for AppActivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ForegroundGate for AppActivity {
    fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::Acquire)
    }
}
