//! Authentication state management.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::UserId;

/// Bearer credentials for the marketplace API.
#[derive(Debug, Clone)]
pub struct AuthInfo {
    /// Bearer token.
    pub token: String,
    /// User ID the token belongs to.
    pub user_id: UserId,
}

impl AuthInfo {
    /// Create new auth info.
    pub fn new(token: impl Into<String>, user_id: impl Into<UserId>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
        }
    }

    /// Check if auth looks valid.
    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty() && !self.user_id.is_empty()
    }
}

/// Callback fired once the server rejects the stored credentials.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Shared, clearable credential store.
///
/// Cloned handles observe the same state, so clearing on a 401 signs out
/// every API handle and session built from the same client.
#[derive(Clone, Default)]
pub struct Credentials {
    inner: Arc<RwLock<Option<AuthInfo>>>,
}

impl Credentials {
    /// Create a store holding the given credentials.
    pub fn new(auth: Option<AuthInfo>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(auth)),
        }
    }

    /// Current credentials, if any.
    pub fn get(&self) -> Option<AuthInfo> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.get().map(|a| a.token)
    }

    /// Current user ID, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.get().map(|a| a.user_id)
    }

    /// Replace the stored credentials.
    pub fn set(&self, auth: AuthInfo) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(auth);
    }

    /// Forget the stored credentials.
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether credentials are present.
    pub fn is_present(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id())
            .finish()
    }
}
