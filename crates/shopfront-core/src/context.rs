//! Application wiring.
//!
//! [`AppContext`] is built once at startup and handed to every entry point.
//! It owns the shared session and cart containers, so nothing in the crate
//! relies on global state.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::{HttpApi, StorefrontApi};
use crate::cart::CartSynchronizer;
use crate::config::Config;
use crate::error::Result;
use crate::session::{AccessToken, SessionManager};
use crate::storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};

/// Where session tokens are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageMode {
    /// JSON file at [`Config::session_path`]
    #[default]
    Durable,
    /// In memory only; the session ends with the process
    Ephemeral,
}

/// Shared state for one application run.
pub struct AppContext {
    config: Config,
    api: Arc<dyn StorefrontApi>,
    session: Arc<SessionManager>,
    cart: Arc<CartSynchronizer>,
}

impl AppContext {
    /// Build a context talking to the configured HTTP API.
    ///
    /// The session is initialized from storage before this returns.
    pub fn new(config: Config, mode: StorageMode) -> Result<Self> {
        let api: Arc<dyn StorefrontApi> = Arc::new(HttpApi::new(&config.api)?);
        let storage: Arc<dyn TokenStorage> = match mode {
            StorageMode::Durable => {
                let path = config.session_path();
                tracing::debug!(path = %path.display(), "using durable session storage");
                Arc::new(FileTokenStorage::new(path))
            }
            StorageMode::Ephemeral => {
                tracing::debug!("using in-memory session storage");
                Arc::new(MemoryTokenStorage::new())
            }
        };
        Ok(Self::with_parts(config, api, storage))
    }

    /// Build a context from explicit parts.
    pub fn with_parts(
        config: Config,
        api: Arc<dyn StorefrontApi>,
        storage: Arc<dyn TokenStorage>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(storage));
        session.initialize();

        let cart = Arc::new(CartSynchronizer::new(Arc::clone(&api), session.subscribe()));

        Self {
            config,
            api,
            session,
            cart,
        }
    }

    /// Loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// API client.
    pub fn api(&self) -> &dyn StorefrontApi {
        self.api.as_ref()
    }

    /// Session manager.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Cart synchronizer.
    pub fn cart(&self) -> &Arc<CartSynchronizer> {
        &self.cart
    }

    /// Access token, or [`Error::NotAuthenticated`](crate::Error::NotAuthenticated).
    pub fn token(&self) -> Result<AccessToken> {
        self.session.require_token()
    }

    /// Keep the cart in step with sign-in and sign-out for as long as the
    /// returned task runs.
    pub fn watch_session(&self) -> JoinHandle<()> {
        self.cart.watch_session()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}
