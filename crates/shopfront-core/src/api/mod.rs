//! Storefront REST API.
//!
//! [`StorefrontApi`] is the seam between the client state containers and the
//! remote service. [`HttpApi`] is the production implementation; tests plug
//! in an in-memory backend.
//!
//! ## Endpoints
//!
//! | Operation | Method & path |
//! |-----------|---------------|
//! | Login | `POST /users/login/` |
//! | Register | `POST /users/register/` |
//! | Current user | `GET /users/me/` |
//! | Get/Create cart | `GET /cart/`, `POST /cart/` |
//! | Cart by id | `GET /cart/{id}/` |
//! | List/Add cart items | `GET /cart/items/`, `POST /cart/items/` |
//! | Delete cart item | `DELETE /cart/items/{id}/` |
//! | Listings | `GET /products/`, `GET /products/{id}/`, `GET /products/user-products/` |
//! | Manage listing | `POST /products/`, `PATCH /products/{id}/edit/`, `DELETE /products/{id}/delete/` |
//! | Orders | `GET /orders/`, `GET /orders/{id}/`, `POST /orders/` |

mod http;
pub mod models;

use async_trait::async_trait;

pub use http::HttpApi;
pub use models::{
    CartItemRecord, CartRecord, CreatedResource, Listing, ListingDraft, ListingUpdate, NewCartItem,
    NewOrder, Order, OrderStatus, Price, UserProfile,
};

use crate::account::Credentials;
use crate::error::Result;
use crate::session::{AccessToken, TokenPair};

/// Operations the client needs from the storefront service.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Exchange credentials for a token pair.
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair>;

    /// Create an account.
    async fn register(&self, credentials: &Credentials) -> Result<()>;

    /// Profile of the token's owner.
    async fn current_user(&self, token: &AccessToken) -> Result<UserProfile>;

    /// The user's cart, or `None` when no cart exists yet.
    async fn fetch_cart(&self, token: &AccessToken) -> Result<Option<CartRecord>>;

    /// Create a cart for the user.
    async fn create_cart(&self, token: &AccessToken) -> Result<CartRecord>;

    /// A cart by identifier.
    async fn cart_by_id(&self, token: &AccessToken, cart_id: &str) -> Result<CartRecord>;

    /// All line items visible to the user.
    async fn cart_items(&self, token: &AccessToken) -> Result<Vec<CartItemRecord>>;

    /// Add a line item.
    async fn add_cart_item(&self, token: &AccessToken, item: &NewCartItem) -> Result<CartItemRecord>;

    /// Delete a line item.
    async fn delete_cart_item(&self, token: &AccessToken, item_id: &str) -> Result<()>;

    /// Listing details.
    async fn listing(&self, token: Option<&AccessToken>, listing_id: &str) -> Result<Listing>;

    /// All active listings.
    async fn listings(&self) -> Result<Vec<Listing>>;

    /// Listings owned by the user.
    async fn my_listings(&self, token: &AccessToken) -> Result<Vec<Listing>>;

    /// Publish a new listing.
    async fn create_listing(
        &self,
        token: &AccessToken,
        draft: &ListingDraft,
    ) -> Result<CreatedResource>;

    /// Change fields of an existing listing.
    async fn update_listing(
        &self,
        token: &AccessToken,
        listing_id: &str,
        update: &ListingUpdate,
    ) -> Result<CreatedResource>;

    /// Delete a listing.
    async fn delete_listing(&self, token: &AccessToken, listing_id: &str) -> Result<()>;

    /// The user's orders.
    async fn orders(&self, token: &AccessToken) -> Result<Vec<Order>>;

    /// One order.
    async fn order(&self, token: &AccessToken, order_id: &str) -> Result<Order>;

    /// Place an order for a cart.
    async fn place_order(&self, token: &AccessToken, order: &NewOrder) -> Result<Order>;
}
