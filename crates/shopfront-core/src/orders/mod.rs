//! Order history and checkout.

mod checkout;

use std::cmp::Reverse;

use futures::future::join_all;
use serde::Serialize;

pub use checkout::{Checkout, CheckoutOutcome, CheckoutReview, ShippingAddress};

use crate::api::{CartItemRecord, CartRecord, Order, Price, StorefrontApi};
use crate::cart::UNAVAILABLE_LISTING_NAME;
use crate::error::{Error, Result};
use crate::session::AccessToken;

/// One purchased line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Line item identifier
    pub id: String,
    /// Listing purchased
    pub product_id: String,
    /// Listing title, or a placeholder when the listing is gone
    pub name: String,
    /// Current unit price of the listing
    pub price: Price,
    /// Quantity
    pub quantity: u32,
    /// Whether the listing could be fetched
    pub available: bool,
}

impl OrderLine {
    /// Unit price times quantity.
    #[must_use]
    pub const fn subtotal(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// An order with its cart and purchased lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    /// The order
    pub order: Order,
    /// Cart the order was placed from, if it still exists
    pub cart: Option<CartRecord>,
    /// Purchased lines
    pub lines: Vec<OrderLine>,
}

impl OrderDetails {
    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}

/// The user's orders, newest first.
pub async fn order_history(api: &dyn StorefrontApi, token: &AccessToken) -> Result<Vec<Order>> {
    let mut orders = api.orders(token).await?;
    sort_newest_first(&mut orders);
    Ok(orders)
}

/// One order with its lines, or `None` if it does not exist.
pub async fn order_details(
    api: &dyn StorefrontApi,
    token: &AccessToken,
    order_id: &str,
) -> Result<Option<OrderDetails>> {
    let order = match api.order(token, order_id).await {
        Ok(order) => order,
        Err(Error::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    let Some(cart_id) = order.cart.clone() else {
        tracing::debug!(order = order_id, "order has no cart");
        return Ok(Some(OrderDetails {
            order,
            cart: None,
            lines: Vec::new(),
        }));
    };

    let cart = match api.cart_by_id(token, &cart_id).await {
        Ok(cart) => Some(cart),
        Err(Error::NotFound(_)) => {
            tracing::debug!(order = order_id, cart = %cart_id, "order cart no longer exists");
            None
        }
        Err(e) => return Err(e),
    };

    let records: Vec<CartItemRecord> = api
        .cart_items(token)
        .await?
        .into_iter()
        .filter(|item| item.cart == cart_id)
        .collect();

    let lines = join_all(records.into_iter().map(|record| order_line(api, token, record))).await;

    Ok(Some(OrderDetails { order, cart, lines }))
}

async fn order_line(api: &dyn StorefrontApi, token: &AccessToken, record: CartItemRecord) -> OrderLine {
    let (name, price, available) = match api.listing(Some(token), &record.product_id).await {
        Ok(listing) => (listing.name, listing.price, true),
        Err(e) => {
            tracing::warn!(product_id = %record.product_id, "listing unavailable for order line: {e}");
            (UNAVAILABLE_LISTING_NAME.to_string(), Price::ZERO, false)
        }
    };

    OrderLine {
        id: record.id,
        product_id: record.product_id,
        name,
        price,
        quantity: record.quantity,
        available,
    }
}

/// Orders with a readable timestamp come first, newest first; the rest
/// follow in reverse string order.
fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by_cached_key(|o| {
        let placed = o.placed_at();
        Reverse((placed.is_some(), placed, o.created_at.clone()))
    });
}
