//! Multi-step checkout: shipping, review, place.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::{NewOrder, Order, OrderStatus, Price, StorefrontApi};
use crate::cart::{CartLineItem, CartState, CartSynchronizer};
use crate::error::{Error, Result};
use crate::session::AccessToken;

/// Where the order is shipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient name
    pub full_name: String,
    /// Street address
    pub line1: String,
    /// Apartment, suite, etc.
    #[serde(default)]
    pub line2: Option<String>,
    /// City
    pub city: String,
    /// State or province
    pub state: String,
    /// Postal code
    pub zip: String,
    /// Country
    pub country: String,
}

impl ShippingAddress {
    /// Check that every required field is filled in.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("full_name", &self.full_name),
            ("line1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("country", &self.country),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::validation(field, "is required"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.full_name, self.line1)?;
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.trim().is_empty()) {
            write!(f, ", {line2}")?;
        }
        write!(f, ", {}, {} {}, {}", self.city, self.state, self.zip, self.country)
    }
}

/// What the user confirms before placing the order.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReview {
    /// Lines being ordered
    pub lines: Vec<CartLineItem>,
    /// Sum of price times quantity
    pub total: Price,
    /// Destination
    pub shipping: Option<ShippingAddress>,
}

/// Result of a placed order.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    /// The created order
    pub order: Order,
    /// Line items removed from the cart
    pub removed: Vec<String>,
    /// Line items that could not be removed, with the reason
    pub failed_removals: Vec<(String, String)>,
}

impl CheckoutOutcome {
    /// Whether the cart was fully emptied after placing the order.
    #[must_use]
    pub fn cart_cleared(&self) -> bool {
        self.failed_removals.is_empty()
    }
}

/// Checkout of a cart snapshot.
#[derive(Debug, Clone)]
pub struct Checkout {
    cart: CartState,
    shipping: Option<ShippingAddress>,
}

impl Checkout {
    /// Start a checkout from a cart snapshot.
    pub fn new(cart: CartState) -> Self {
        Self {
            cart,
            shipping: None,
        }
    }

    /// Set the shipping address.
    pub fn shipping(&mut self, address: ShippingAddress) -> Result<&mut Self> {
        address.validate()?;
        self.shipping = Some(address);
        Ok(self)
    }

    /// Lines, total and destination.
    pub fn review(&self) -> CheckoutReview {
        CheckoutReview {
            lines: self.cart.items.clone(),
            total: self.cart.total(),
            shipping: self.shipping.clone(),
        }
    }

    /// Place the order, then empty the cart.
    ///
    /// If posting the order fails the cart is untouched. Once the order
    /// exists, line removal failures are reported in the outcome.
    pub async fn place(
        &self,
        api: &dyn StorefrontApi,
        token: &AccessToken,
        cart: &CartSynchronizer,
    ) -> Result<CheckoutOutcome> {
        if self.cart.is_empty() {
            return Err(Error::validation("cart", "is empty"));
        }
        if self.shipping.is_none() {
            return Err(Error::validation("shipping", "address is required"));
        }
        let cart_id = self
            .cart
            .cart_id
            .clone()
            .ok_or_else(|| Error::CartUnavailable("cart has not been loaded".to_string()))?;

        let order = api
            .place_order(
                token,
                &NewOrder {
                    created_at: Utc::now(),
                    status: OrderStatus::Received,
                    cart: cart_id.clone(),
                },
            )
            .await?;
        tracing::info!(order = %order.id, cart = %cart_id, total = %self.cart.total(), "order placed");

        let mut removed = Vec::with_capacity(self.cart.items.len());
        let mut failed_removals = Vec::new();
        for item in &self.cart.items {
            match cart.remove_item(&item.id).await {
                Ok(()) => removed.push(item.id.clone()),
                Err(e) => {
                    tracing::warn!(line_item = %item.id, "could not clear cart line after order: {e}");
                    failed_removals.push((item.id.clone(), e.to_string()));
                }
            }
        }

        Ok(CheckoutOutcome {
            order,
            removed,
            failed_removals,
        })
    }
}
