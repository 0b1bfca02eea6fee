//! Session Handling
//!
//! The session is a single opaque token issued by the backend at login and
//! sent verbatim on every authenticated request. It lives in a persistent
//! [`SessionStore`] under the fixed key [`TOKEN_KEY`].
//!
//! ## Architecture
//!
//! - **SessionStore**: pluggable persistence (file on disk, or memory)
//! - **Session**: cheap-to-clone context handed to views and the guard
//!
//! Logout is purely local: the token is cleared and the caller is sent to
//! [`Route::Home`]. The backend is never contacted.

mod store;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

use crate::routes::Route;
use std::sync::Arc;
use thiserror::Error;

/// Storage key the token is kept under
pub const TOKEN_KEY: &str = "token";

/// Errors raised by a session store
#[derive(Error, Debug)]
pub enum SessionError {
    /// No persistent storage is available in this environment
    #[error("no persistent session storage available")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Lock error: {0}")]
    Lock(String),
}

/// Session context passed explicitly to views and handlers
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Session backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::default()))
    }

    /// Current token, if any.
    ///
    /// Storage failures are logged and treated as "no token", so this is safe
    /// to call where no persistent storage exists.
    pub fn get_token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(SessionError::Unavailable) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    pub fn is_authed(&self) -> bool {
        self.get_token().is_some()
    }

    /// Persist a freshly issued token
    pub fn store_token(&self, token: &str) -> Result<(), SessionError> {
        self.store.set(TOKEN_KEY, token)
    }

    /// Clear the token and return the route to navigate to
    pub fn logout(&self) -> Route {
        match self.store.remove(TOKEN_KEY) {
            Ok(()) | Err(SessionError::Unavailable) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to clear session token"),
        }
        tracing::info!("Logged out");
        Route::Home
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authed", &self.is_authed())
            .finish()
    }
}
