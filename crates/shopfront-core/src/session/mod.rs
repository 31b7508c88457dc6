//! Authentication session management.
//!
//! [`SessionManager`] is the single source of truth for whether the user is
//! signed in. It owns the token pair, persists it through a
//! [`TokenStorage`], and publishes every change on a watch channel so other
//! components (the cart in particular) can react to sign-in and sign-out.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──► loading ──initialize()──► ready
//!                                      │  login() / logout()
//!                                      ▼
//!                                    ready
//! ```
//!
//! `is_authenticated` is derived from the presence of the access token and is
//! never stored separately.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::storage::{StorageKeys, TokenStorage};

const STORAGE_READ_ERROR: &str = "Could not access token storage.";
const STORAGE_WRITE_ERROR: &str = "Could not save session. Please try again.";

/// Bearer credential used to authorize API requests.
///
/// The value is redacted from `Debug` output so it never ends up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

/// Credential payload produced by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Access token
    pub access: AccessToken,
    /// Optional refresh token; some backends omit it
    pub refresh: Option<String>,
}

impl TokenPair {
    /// Create a token pair. An empty refresh token is treated as absent.
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: AccessToken::new(access),
            refresh: refresh.filter(|r| !r.is_empty()),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &self.access)
            .field("refresh", &self.refresh.as_ref().map(|_| "****"))
            .finish()
    }
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Access token; present iff authenticated
    pub access_token: Option<AccessToken>,
    /// Refresh token, stored and cleared but never exchanged
    pub refresh_token: Option<String>,
    /// True only until the persisted tokens have been read
    pub is_loading: bool,
    /// Most recent user-facing failure
    pub last_error: Option<String>,
}

impl Session {
    fn loading() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            is_loading: true,
            last_error: None,
        }
    }

    /// Whether an access token is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Owns the authentication tokens for the lifetime of the application.
pub struct SessionManager {
    storage: Arc<dyn TokenStorage>,
    keys: StorageKeys,
    state: watch::Sender<Session>,
    initialized: AtomicBool,
}

impl SessionManager {
    /// Create a manager in the loading state. Call [`initialize`](Self::initialize)
    /// to hydrate it from storage.
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self::with_keys(storage, StorageKeys::V1)
    }

    /// Create a manager using a specific storage key layout.
    pub fn with_keys(storage: Arc<dyn TokenStorage>, keys: StorageKeys) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self {
            storage,
            keys,
            state,
            initialized: AtomicBool::new(false),
        }
    }

    /// Read persisted tokens. Runs at most once; later calls are no-ops.
    ///
    /// A storage fault is not fatal: the session starts unauthenticated and
    /// the fault is recorded in `last_error`.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("session already initialized, skipping storage read");
            return;
        }

        let loaded = self.read_tokens();
        self.state.send_modify(|s| {
            match loaded {
                Ok(Some(pair)) => {
                    s.access_token = Some(pair.access);
                    s.refresh_token = pair.refresh;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to read tokens from storage: {e}");
                    s.last_error = Some(STORAGE_READ_ERROR.to_string());
                }
            }
            s.is_loading = false;
        });

        tracing::debug!(
            authenticated = self.is_authenticated(),
            "session initialized"
        );
    }

    fn read_tokens(&self) -> Result<Option<TokenPair>> {
        let Some(access) = self.storage.get(self.keys.access)? else {
            return Ok(None);
        };
        let refresh = self.storage.get(self.keys.refresh)?;
        Ok(Some(TokenPair::new(access, refresh)))
    }

    /// Persist and activate a token pair.
    ///
    /// On a storage fault the in-memory state is rolled back to signed-out,
    /// `last_error` is set and the fault is returned.
    pub fn login(&self, tokens: TokenPair) -> Result<()> {
        self.initialized.store(true, Ordering::SeqCst);

        match self.persist(&tokens) {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.access_token = Some(tokens.access);
                    s.refresh_token = tokens.refresh;
                    s.is_loading = false;
                    s.last_error = None;
                });
                tracing::info!("signed in, tokens stored");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to save tokens to storage: {e}");
                self.clear_persisted();
                self.state.send_modify(|s| {
                    s.access_token = None;
                    s.refresh_token = None;
                    s.is_loading = false;
                    s.last_error = Some(STORAGE_WRITE_ERROR.to_string());
                });
                Err(e)
            }
        }
    }

    fn persist(&self, tokens: &TokenPair) -> Result<()> {
        self.storage.set(self.keys.access, tokens.access.as_str())?;
        match &tokens.refresh {
            Some(refresh) => self.storage.set(self.keys.refresh, refresh),
            None => self.storage.remove(self.keys.refresh),
        }
    }

    /// Clear both tokens from storage and memory.
    ///
    /// Storage faults are logged and ignored; the in-memory session is always
    /// cleared.
    pub fn logout(&self) {
        self.initialized.store(true, Ordering::SeqCst);
        self.clear_persisted();
        self.state.send_modify(|s| {
            s.access_token = None;
            s.refresh_token = None;
            s.is_loading = false;
            s.last_error = None;
        });
        tracing::info!("signed out, tokens cleared");
    }

    fn clear_persisted(&self) {
        for key in [self.keys.access, self.keys.refresh] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, "Failed to remove token from storage: {e}");
            }
        }
    }

    /// Reset `last_error`.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.last_error.take().is_some());
    }

    /// Record a user-facing failure, e.g. a rejected login.
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|s| s.last_error = Some(message));
    }

    /// Current access token, if signed in.
    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.state.borrow().access_token.clone()
    }

    /// Access token or [`Error::NotAuthenticated`].
    pub fn require_token(&self) -> Result<AccessToken> {
        self.access_token().ok_or(Error::NotAuthenticated)
    }

    /// Whether an access token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Whether the persisted tokens are still being read.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Most recent user-facing failure.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// Copy of the current session state.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("keys", &self.keys)
            .field("session", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
