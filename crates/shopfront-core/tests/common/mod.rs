//! Common test utilities for `Shopfront` integration tests.
//!
//! [`FakeStorefront`] is an in-memory implementation of the storefront API
//! with knobs for the failure modes the cart and session have to survive.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use shopfront_core::account::Credentials;
use shopfront_core::api::{
    CartItemRecord, CartRecord, CreatedResource, Listing, ListingDraft, ListingUpdate,
    NewCartItem, NewOrder, Order, Price, StorefrontApi, UserProfile,
};
use shopfront_core::session::{AccessToken, SessionManager, TokenPair};
use shopfront_core::storage::{MemoryTokenStorage, TokenStorage};
use shopfront_core::{Error, Result};

#[derive(Default)]
struct Backend {
    users: HashMap<String, String>,
    tokens: HashMap<String, String>,
    carts: Vec<CartRecord>,
    items: Vec<CartItemRecord>,
    listings: Vec<Listing>,
    orders: Vec<(String, Order)>,
    next_id: u64,
}

impl Backend {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn user_for(&self, token: &AccessToken) -> Result<String> {
        self.tokens
            .get(token.as_str())
            .cloned()
            .ok_or(Error::Unauthorized)
    }

    fn owns_cart(&self, user: &str, cart_id: &str) -> bool {
        self.carts
            .iter()
            .any(|c| c.id == cart_id && c.user.as_deref() == Some(user))
    }
}

/// In-memory storefront backend.
#[derive(Default)]
pub struct FakeStorefront {
    backend: Mutex<Backend>,
    failing_listings: Mutex<HashSet<String>>,
    create_cart_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_deletes: AtomicBool,
    hide_carts: AtomicBool,
    delete_gate: Mutex<Option<Arc<Semaphore>>>,
    delete_started: Notify,
}

impl FakeStorefront {
    /// Create an empty backend.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register an account.
    pub fn add_user(&self, username: &str, password: &str) {
        self.backend
            .lock()
            .unwrap()
            .users
            .insert(username.to_string(), password.to_string());
    }

    /// Issue an access token for an existing or new user.
    pub fn issue_token(&self, username: &str) -> String {
        let mut backend = self.backend.lock().unwrap();
        backend
            .users
            .entry(username.to_string())
            .or_insert_with(|| "password".to_string());
        let token = format!("token-{}", uuid::Uuid::new_v4());
        backend.tokens.insert(token.clone(), username.to_string());
        token
    }

    /// Publish a listing.
    pub fn add_listing(&self, id: &str, name: &str, cents: u64, category: &str) {
        self.backend.lock().unwrap().listings.push(Listing {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} description"),
            price: Price::from_cents(cents),
            image: None,
            category: category.to_string(),
            brand: "Acme".to_string(),
            status: Some("active".to_string()),
            created_at: None,
            updated_at: None,
            seller: Some("seller@example.com".to_string()),
        });
    }

    /// Create a cart for `username` directly on the server.
    pub fn seed_cart(&self, username: &str) -> String {
        let mut backend = self.backend.lock().unwrap();
        let id = backend.next_id("cart");
        backend.carts.push(cart_record(&id, username));
        id
    }

    /// Add a line item directly on the server.
    pub fn seed_item(&self, cart_id: &str, product_id: &str, quantity: u32) -> String {
        let mut backend = self.backend.lock().unwrap();
        let id = backend.next_id("item");
        backend.items.push(CartItemRecord {
            id: id.clone(),
            product_id: product_id.to_string(),
            quantity,
            cart: cart_id.to_string(),
        });
        id
    }

    /// Store an order directly on the server.
    pub fn seed_order(&self, username: &str, order: Order) {
        self.backend
            .lock()
            .unwrap()
            .orders
            .push((username.to_string(), order));
    }

    /// Make fetching this listing fail with a server error.
    pub fn fail_listing(&self, id: &str) {
        self.failing_listings.lock().unwrap().insert(id.to_string());
    }

    /// Make every delete fail with a server error.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Stop listing carts, as if the server were slow to index new ones.
    pub fn hide_carts(&self, hide: bool) {
        self.hide_carts.store(hide, Ordering::SeqCst);
    }

    /// Hold deletes until [`release_deletes`](Self::release_deletes).
    pub fn hold_deletes(&self) {
        *self.delete_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let held deletes proceed.
    pub fn release_deletes(&self) {
        if let Some(gate) = self.delete_gate.lock().unwrap().take() {
            gate.close();
        }
    }

    /// Resolves once a delete request has reached the server.
    pub async fn delete_started(&self) {
        self.delete_started.notified().await;
    }

    /// Number of `POST /cart/` requests.
    pub fn create_cart_calls(&self) -> usize {
        self.create_cart_calls.load(Ordering::SeqCst)
    }

    /// Number of `DELETE /cart/items/{id}/` requests.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Carts owned by `username`.
    pub fn carts_of(&self, username: &str) -> Vec<String> {
        self.backend
            .lock()
            .unwrap()
            .carts
            .iter()
            .filter(|c| c.user.as_deref() == Some(username))
            .map(|c| c.id.clone())
            .collect()
    }

    /// Line items stored in a cart.
    pub fn items_in(&self, cart_id: &str) -> Vec<CartItemRecord> {
        self.backend
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|i| i.cart == cart_id)
            .cloned()
            .collect()
    }

    /// Orders placed by `username`.
    pub fn orders_of(&self, username: &str) -> Vec<Order> {
        self.backend
            .lock()
            .unwrap()
            .orders
            .iter()
            .filter(|(user, _)| user == username)
            .map(|(_, order)| order.clone())
            .collect()
    }

    /// Listings currently on the server.
    pub fn listing_ids(&self) -> Vec<String> {
        self.backend
            .lock()
            .unwrap()
            .listings
            .iter()
            .map(|l| l.id.clone())
            .collect()
    }
}

fn cart_record(id: &str, username: &str) -> CartRecord {
    CartRecord {
        id: id.to_string(),
        user: Some(username.to_string()),
        status: Some("active".to_string()),
        shipping_address: String::new(),
        billing_address: String::new(),
        items: Vec::new(),
        created_at: None,
    }
}

fn server_error(message: &str) -> Error {
    Error::Api {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl StorefrontApi for FakeStorefront {
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        let known = self
            .backend
            .lock()
            .unwrap()
            .users
            .get(&credentials.username)
            .is_some_and(|p| *p == credentials.password);
        if !known {
            return Err(Error::AuthenticationFailed(
                "No active account found with the given credentials".to_string(),
            ));
        }
        let access = self.issue_token(&credentials.username);
        Ok(TokenPair::new(access, Some(format!("refresh-{}", credentials.username))))
    }

    async fn register(&self, credentials: &Credentials) -> Result<()> {
        let mut backend = self.backend.lock().unwrap();
        if backend.users.contains_key(&credentials.username) {
            return Err(Error::Api {
                status: 400,
                message: "A user with that username already exists.".to_string(),
            });
        }
        backend
            .users
            .insert(credentials.username.clone(), credentials.password.clone());
        Ok(())
    }

    async fn current_user(&self, token: &AccessToken) -> Result<UserProfile> {
        let username = self.backend.lock().unwrap().user_for(token)?;
        Ok(UserProfile { username })
    }

    async fn fetch_cart(&self, token: &AccessToken) -> Result<Option<CartRecord>> {
        let backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        if self.hide_carts.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(backend
            .carts
            .iter()
            .find(|c| c.user.as_deref() == Some(user.as_str()))
            .cloned())
    }

    async fn create_cart(&self, token: &AccessToken) -> Result<CartRecord> {
        self.create_cart_calls.fetch_add(1, Ordering::SeqCst);
        let user = self.backend.lock().unwrap().user_for(token)?;

        // Widen the window in which a second caller could race the creation.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut backend = self.backend.lock().unwrap();
        let id = backend.next_id("cart");
        let cart = cart_record(&id, &user);
        backend.carts.push(cart.clone());
        Ok(cart)
    }

    async fn cart_by_id(&self, token: &AccessToken, cart_id: &str) -> Result<CartRecord> {
        let backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        backend
            .carts
            .iter()
            .find(|c| c.id == cart_id && c.user.as_deref() == Some(user.as_str()))
            .cloned()
            .ok_or_else(|| Error::NotFound("cart".to_string()))
    }

    async fn cart_items(&self, token: &AccessToken) -> Result<Vec<CartItemRecord>> {
        let backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        Ok(backend
            .items
            .iter()
            .filter(|i| backend.owns_cart(&user, &i.cart))
            .cloned()
            .collect())
    }

    async fn add_cart_item(&self, token: &AccessToken, item: &NewCartItem) -> Result<CartItemRecord> {
        let mut backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        if !backend.owns_cart(&user, &item.cart) {
            return Err(Error::Api {
                status: 400,
                message: "Invalid cart".to_string(),
            });
        }
        let record = CartItemRecord {
            id: backend.next_id("item"),
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            cart: item.cart.clone(),
        };
        backend.items.push(record.clone());
        Ok(record)
    }

    async fn delete_cart_item(&self, token: &AccessToken, item_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.delete_started.notify_one();

        let gate = self.delete_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(server_error("delete failed"));
        }

        let mut backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        let position = backend
            .items
            .iter()
            .position(|i| i.id == item_id && backend.owns_cart(&user, &i.cart))
            .ok_or_else(|| Error::NotFound("cart item".to_string()))?;
        backend.items.remove(position);
        Ok(())
    }

    async fn listing(&self, _token: Option<&AccessToken>, listing_id: &str) -> Result<Listing> {
        if self.failing_listings.lock().unwrap().contains(listing_id) {
            return Err(server_error("listing lookup failed"));
        }
        self.backend
            .lock()
            .unwrap()
            .listings
            .iter()
            .find(|l| l.id == listing_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("listing".to_string()))
    }

    async fn listings(&self) -> Result<Vec<Listing>> {
        Ok(self.backend.lock().unwrap().listings.clone())
    }

    async fn my_listings(&self, token: &AccessToken) -> Result<Vec<Listing>> {
        let backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        Ok(backend
            .listings
            .iter()
            .filter(|l| l.seller.as_deref() == Some(user.as_str()))
            .cloned()
            .collect())
    }

    async fn create_listing(&self, token: &AccessToken, draft: &ListingDraft) -> Result<CreatedResource> {
        let mut backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        let id = backend.next_id("listing");
        backend.listings.push(Listing {
            id: id.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            image: draft.image.clone(),
            category: draft.category.clone(),
            brand: draft.brand.clone(),
            status: Some("active".to_string()),
            created_at: None,
            updated_at: None,
            seller: Some(user),
        });
        Ok(CreatedResource { id })
    }

    async fn update_listing(
        &self,
        token: &AccessToken,
        listing_id: &str,
        update: &ListingUpdate,
    ) -> Result<CreatedResource> {
        let mut backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        let listing = backend
            .listings
            .iter_mut()
            .find(|l| l.id == listing_id && l.seller.as_deref() == Some(user.as_str()))
            .ok_or_else(|| Error::NotFound("listing".to_string()))?;
        if let Some(name) = &update.name {
            listing.name.clone_from(name);
        }
        if let Some(price) = update.price {
            listing.price = price;
        }
        if let Some(description) = &update.description {
            listing.description.clone_from(description);
        }
        Ok(CreatedResource {
            id: listing_id.to_string(),
        })
    }

    async fn delete_listing(&self, token: &AccessToken, listing_id: &str) -> Result<()> {
        let mut backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        let before = backend.listings.len();
        backend
            .listings
            .retain(|l| !(l.id == listing_id && l.seller.as_deref() == Some(user.as_str())));
        if backend.listings.len() == before {
            return Err(Error::NotFound("listing".to_string()));
        }
        Ok(())
    }

    async fn orders(&self, token: &AccessToken) -> Result<Vec<Order>> {
        let backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        Ok(backend
            .orders
            .iter()
            .filter(|(owner, _)| *owner == user)
            .map(|(_, order)| order.clone())
            .collect())
    }

    async fn order(&self, token: &AccessToken, order_id: &str) -> Result<Order> {
        let backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        backend
            .orders
            .iter()
            .find(|(owner, order)| *owner == user && order.id == order_id)
            .map(|(_, order)| order.clone())
            .ok_or_else(|| Error::NotFound("order".to_string()))
    }

    async fn place_order(&self, token: &AccessToken, order: &NewOrder) -> Result<Order> {
        let mut backend = self.backend.lock().unwrap();
        let user = backend.user_for(token)?;
        if !backend.owns_cart(&user, &order.cart) {
            return Err(Error::Api {
                status: 400,
                message: "Invalid cart".to_string(),
            });
        }
        let placed = Order {
            id: backend.next_id("order"),
            created_at: order.created_at.to_rfc3339(),
            status: order.status,
            cart: Some(order.cart.clone()),
        };
        backend.orders.push((user, placed.clone()));
        Ok(placed)
    }
}

/// Token storage that fails on demand.
#[derive(Default)]
pub struct FailingStorage {
    inner: MemoryTokenStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStorage {
    /// Storage whose reads fail.
    pub fn unreadable() -> Arc<Self> {
        let storage = Self::default();
        storage.fail_reads.store(true, Ordering::SeqCst);
        Arc::new(storage)
    }

    /// Storage whose writes fail.
    pub fn unwritable() -> Arc<Self> {
        let storage = Self::default();
        storage.fail_writes.store(true, Ordering::SeqCst);
        Arc::new(storage)
    }

    /// Whether a key holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }
}

impl TokenStorage for FailingStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage("read refused".to_string()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("disk full".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

/// Initialized session manager over in-memory storage.
pub fn memory_session() -> Arc<SessionManager> {
    let session = Arc::new(SessionManager::new(Arc::new(MemoryTokenStorage::new())));
    session.initialize();
    session
}

/// Sign `username` in on `session` with a freshly issued token.
pub fn sign_in_as(api: &FakeStorefront, session: &SessionManager, username: &str) {
    let token = api.issue_token(username);
    session
        .login(TokenPair::new(token, None))
        .expect("Failed to store session");
}
