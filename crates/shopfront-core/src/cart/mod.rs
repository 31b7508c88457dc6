//! Cart synchronization.
//!
//! [`CartSynchronizer`] keeps an in-memory [`CartState`] consistent with the
//! signed-in user's remote cart. It resolves (or creates) the cart, enriches
//! every line with listing details, and applies add and remove mutations.
//!
//! ## Consistency rules
//!
//! - Mutations are serialized: a second `load`, `add_item` or `remove_item`
//!   waits for the one in flight, so a cart is created at most once per
//!   session and duplicate checks see the latest items.
//! - Removal is confirm-then-update: the line leaves local state only after
//!   the server acknowledged the delete.
//! - The state is tagged with the access token it was loaded for. When the
//!   session's token changes the state is reset, and responses that belong
//!   to the previous token are discarded with [`Error::SessionChanged`].

mod state;

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

pub use state::{CartLineItem, CartPhase, CartState, ListingSummary, UNAVAILABLE_LISTING_NAME};

use crate::api::{CartItemRecord, NewCartItem, StorefrontApi};
use crate::error::{Error, Result};
use crate::session::{AccessToken, Session};

/// Quantity used by [`CartSynchronizer::add_item`].
pub const DEFAULT_QUANTITY: u32 = 1;

/// Token and state generation an operation runs against.
struct Epoch {
    token: Option<AccessToken>,
    generation: u64,
}

/// Mirrors the signed-in user's remote cart.
pub struct CartSynchronizer {
    api: Arc<dyn StorefrontApi>,
    session: watch::Receiver<Session>,
    state: watch::Sender<CartState>,
    mutations: Mutex<()>,
}

impl CartSynchronizer {
    /// Create a synchronizer bound to a session channel.
    ///
    /// Nothing is fetched until [`load`](Self::load) is called or
    /// [`watch_session`](Self::watch_session) is running.
    pub fn new(api: Arc<dyn StorefrontApi>, session: watch::Receiver<Session>) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            api,
            session,
            state,
            mutations: Mutex::new(()),
        }
    }

    /// Current cart state.
    ///
    /// Reflects a sign-out or account switch even if no load has run since.
    pub fn snapshot(&self) -> CartState {
        self.reconcile();
        self.state.borrow().clone()
    }

    /// Subscribe to cart state changes.
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Fetch the cart and its items from the server and replace local state.
    ///
    /// Without an access token the cart is reset to empty and nothing is
    /// fetched. A listing that cannot be fetched yields a placeholder line
    /// rather than failing the load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CartUnavailable`] when the cart cannot be resolved or
    /// created, any API error from the item fetch, or
    /// [`Error::SessionChanged`] if the session changed mid-flight.
    pub async fn load(&self) -> Result<()> {
        let _queue = self.mutations.lock().await;
        let epoch = self.reconcile();

        let Some(token) = epoch.token else {
            tracing::debug!("no access token, cart stays empty");
            return Ok(());
        };

        self.refresh(&token, epoch.generation).await
    }

    /// Add one unit of a listing to the cart.
    ///
    /// # Errors
    ///
    /// See [`add_item_with_quantity`](Self::add_item_with_quantity).
    pub async fn add_item(&self, product_id: &str) -> Result<CartLineItem> {
        self.add_item_with_quantity(product_id, DEFAULT_QUANTITY)
            .await
    }

    /// Add a listing to the cart.
    ///
    /// If the cart has not been loaded for the current session it is loaded
    /// first, so the duplicate check sees the server's items. On failure the
    /// items are left unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidQuantity`] if `quantity` is zero
    /// - [`Error::NotAuthenticated`] without an access token
    /// - [`Error::DuplicateItem`] if the listing already has a line
    /// - [`Error::CartUnavailable`] or an API error from the add request
    pub async fn add_item_with_quantity(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> Result<CartLineItem> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity(quantity));
        }

        let _queue = self.mutations.lock().await;
        let epoch = self.reconcile();
        let token = epoch.token.ok_or(Error::NotAuthenticated)?;
        let generation = epoch.generation;

        if self.state.borrow().phase == CartPhase::Uninitialized {
            self.refresh(&token, generation).await?;
        }

        let known_cart = {
            let state = self.state.borrow();
            if state.contains_listing(product_id) {
                tracing::debug!(product_id, "listing already in cart");
                return Err(Error::DuplicateItem(product_id.to_string()));
            }
            state.cart_id.clone()
        };

        let previous = self.begin(generation)?;
        let added = async {
            let cart_id = match known_cart {
                Some(id) => id,
                None => self.resolve_cart_id(&token).await?,
            };
            let record = self
                .api
                .add_cart_item(
                    &token,
                    &NewCartItem {
                        product_id: product_id.to_string(),
                        quantity,
                        cart: cart_id.clone(),
                    },
                )
                .await?;
            let line = self.enrich(&token, record).await;
            Ok::<_, Error>((cart_id, line))
        }
        .await;

        match added {
            Ok((cart_id, line)) => {
                let published = line.clone();
                self.publish(generation, move |state| {
                    state.cart_id = Some(cart_id);
                    state.items.push(published);
                    state.phase = CartPhase::Ready;
                })?;
                tracing::info!(product_id, line_item = %line.id, quantity, "added to cart");
                Ok(line)
            }
            Err(e) => {
                tracing::warn!(product_id, "failed to add to cart: {e}");
                self.restore(generation, previous);
                Err(e)
            }
        }
    }

    /// Remove a line item from the cart.
    ///
    /// The line is removed locally only after the server confirms the delete.
    /// A delete answered with 404 counts as confirmed. On failure the items
    /// are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] without an access token, or the API
    /// error from the delete request.
    pub async fn remove_item(&self, line_item_id: &str) -> Result<()> {
        let _queue = self.mutations.lock().await;
        let epoch = self.reconcile();
        let token = epoch.token.ok_or(Error::NotAuthenticated)?;
        let generation = epoch.generation;

        let previous = self.begin(generation)?;
        match self.api.delete_cart_item(&token, line_item_id).await {
            Ok(()) => {}
            Err(Error::NotFound(_)) => {
                tracing::debug!(line_item = line_item_id, "line item already gone on server");
            }
            Err(e) => {
                tracing::warn!(line_item = line_item_id, "failed to remove from cart: {e}");
                self.restore(generation, previous);
                return Err(e);
            }
        }

        self.publish(generation, |state| {
            state.items.retain(|item| item.id != line_item_id);
            state.phase = previous;
        })?;
        tracing::info!(line_item = line_item_id, "removed from cart");
        Ok(())
    }

    /// Follow the session: load the cart on sign-in and reset it on
    /// sign-out or account switch.
    ///
    /// The task ends when the session manager is dropped.
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let cart = Arc::clone(self);
        let mut session = self.session.clone();

        tokio::spawn(async move {
            let mut last = session.borrow_and_update().access_token.clone();
            if last.is_some() {
                cart.load_in_background().await;
            }

            while session.changed().await.is_ok() {
                let current = session.borrow_and_update().access_token.clone();
                if current == last {
                    continue;
                }
                last = current;

                if last.is_some() {
                    cart.load_in_background().await;
                } else {
                    cart.reconcile();
                    tracing::debug!("signed out, cart cleared");
                }
            }
        })
    }

    async fn load_in_background(&self) {
        match self.load().await {
            Ok(()) => {}
            Err(Error::SessionChanged) => tracing::debug!("cart load superseded"),
            Err(e) => tracing::warn!("failed to load cart: {e}"),
        }
    }

    /// Reset local state if the session's token differs from the one the
    /// state was loaded for.
    fn reconcile(&self) -> Epoch {
        let current = self.session.borrow().access_token.clone();
        let mut generation = 0;

        self.state.send_if_modified(|state| {
            let changed = state.owner != current;
            if changed {
                *state = CartState {
                    owner: current.clone(),
                    generation: state.generation + 1,
                    ..CartState::default()
                };
            }
            generation = state.generation;
            changed
        });

        Epoch {
            token: current,
            generation,
        }
    }

    /// Apply `update` if the state still belongs to `generation`.
    fn publish(&self, generation: u64, update: impl FnOnce(&mut CartState)) -> Result<()> {
        self.reconcile();

        let mut applied = false;
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            update(state);
            applied = true;
            true
        });

        if applied {
            Ok(())
        } else {
            tracing::debug!("discarding cart response for a previous session");
            Err(Error::SessionChanged)
        }
    }

    /// Enter the loading phase, returning the phase to restore afterwards.
    fn begin(&self, generation: u64) -> Result<CartPhase> {
        let mut previous = CartPhase::Uninitialized;
        self.publish(generation, |state| {
            previous = state.phase;
            state.phase = CartPhase::Loading;
        })?;
        Ok(previous)
    }

    fn restore(&self, generation: u64, phase: CartPhase) {
        // A newer session owns the state now; nothing to restore.
        let _ = self.publish(generation, |state| state.phase = phase);
    }

    /// Full fetch of cart id and items for `generation`.
    async fn refresh(&self, token: &AccessToken, generation: u64) -> Result<()> {
        let previous = self.begin(generation)?;

        match self.fetch_contents(token).await {
            Ok((cart_id, items)) => {
                let count = items.len();
                self.publish(generation, move |state| {
                    state.cart_id = Some(cart_id);
                    state.items = items;
                    state.phase = CartPhase::Ready;
                })?;
                tracing::debug!(items = count, "cart loaded");
                Ok(())
            }
            Err(e) => {
                self.restore(generation, previous);
                Err(e)
            }
        }
    }

    async fn fetch_contents(&self, token: &AccessToken) -> Result<(String, Vec<CartLineItem>)> {
        let cart_id = self.resolve_cart_id(token).await?;
        let records = self.api.cart_items(token).await?;

        let mut unique: Vec<CartItemRecord> = Vec::with_capacity(records.len());
        for record in records.into_iter().filter(|r| r.cart == cart_id) {
            if unique.iter().any(|u| u.product_id == record.product_id) {
                tracing::warn!(
                    product_id = %record.product_id,
                    line_item = %record.id,
                    "cart holds the same listing twice, keeping the first line"
                );
                continue;
            }
            unique.push(record);
        }

        let items = join_all(unique.into_iter().map(|record| self.enrich(token, record))).await;
        Ok((cart_id, items))
    }

    /// Find the user's cart, creating one if none exists.
    async fn resolve_cart_id(&self, token: &AccessToken) -> Result<String> {
        if let Some(cart) = self.api.fetch_cart(token).await.map_err(cart_unavailable)? {
            return Ok(cart.id);
        }

        tracing::info!("no cart found, creating one");
        let created = self.api.create_cart(token).await.map_err(cart_unavailable)?;

        match self.api.fetch_cart(token).await.map_err(cart_unavailable)? {
            Some(cart) => Ok(cart.id),
            None => {
                tracing::warn!(cart_id = %created.id, "new cart not listed yet, using creation response");
                Ok(created.id)
            }
        }
    }

    async fn enrich(&self, token: &AccessToken, record: CartItemRecord) -> CartLineItem {
        let listing = match self.api.listing(Some(token), &record.product_id).await {
            Ok(listing) => ListingSummary::from(&listing),
            Err(e) => {
                tracing::warn!(
                    product_id = %record.product_id,
                    "listing unavailable for cart line: {e}"
                );
                ListingSummary::unavailable()
            }
        };

        CartLineItem {
            id: record.id,
            product_id: record.product_id,
            quantity: record.quantity,
            listing,
        }
    }
}

impl std::fmt::Debug for CartSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("CartSynchronizer")
            .field("cart_id", &state.cart_id)
            .field("items", &state.items.len())
            .field("phase", &state.phase)
            .finish_non_exhaustive()
    }
}

fn cart_unavailable(err: Error) -> Error {
    match err {
        Error::Unauthorized | Error::CartUnavailable(_) => err,
        other => Error::CartUnavailable(other.to_string()),
    }
}
