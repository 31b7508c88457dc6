//! Observable cart state.

use serde::Serialize;

use crate::api::{Listing, Price};
use crate::session::AccessToken;

/// Title shown for a line whose listing could not be fetched.
pub const UNAVAILABLE_LISTING_NAME: &str = "Product unavailable";

/// Snapshot of listing details taken when a line item was loaded.
///
/// May go stale relative to the live listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingSummary {
    /// Listing title
    pub name: String,
    /// Unit price at load time
    pub price: Price,
    /// Image URL
    pub image: Option<String>,
    /// False when this is a placeholder for a listing that failed to load
    pub available: bool,
}

impl ListingSummary {
    /// Placeholder used when the listing fetch fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            name: UNAVAILABLE_LISTING_NAME.to_string(),
            price: Price::ZERO,
            image: None,
            available: false,
        }
    }
}

impl From<&Listing> for ListingSummary {
    fn from(listing: &Listing) -> Self {
        Self {
            name: listing.name.clone(),
            price: listing.price,
            image: listing.image.clone(),
            available: true,
        }
    }
}

/// One listing plus quantity in the cart, enriched with listing details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineItem {
    /// Remote line item identifier
    pub id: String,
    /// Listing being purchased
    pub product_id: String,
    /// Quantity, at least one
    pub quantity: u32,
    /// Denormalized listing details
    pub listing: ListingSummary,
}

impl CartLineItem {
    /// Unit price times quantity.
    #[must_use]
    pub const fn subtotal(&self) -> Price {
        self.listing.price.times(self.quantity)
    }
}

/// Where the cart is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartPhase {
    /// Nothing loaded for the current session
    #[default]
    Uninitialized,
    /// A fetch or mutation is in flight
    Loading,
    /// Cart id and items reflect the server
    Ready,
}

/// In-memory view of the signed-in user's cart.
///
/// Holds at most one line per listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartState {
    /// Remote cart identifier, once resolved
    pub cart_id: Option<String>,
    /// Line items
    pub items: Vec<CartLineItem>,
    /// Lifecycle phase
    pub phase: CartPhase,
    #[serde(skip)]
    pub(super) owner: Option<AccessToken>,
    #[serde(skip)]
    pub(super) generation: u64,
}

impl CartState {
    /// Whether a fetch or mutation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == CartPhase::Loading
    }

    /// Whether the listing already has a line.
    #[must_use]
    pub fn contains_listing(&self, product_id: &str) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    /// Line item by its identifier.
    #[must_use]
    pub fn item(&self, line_item_id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == line_item_id)
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartLineItem::subtotal).sum()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, product: &str, cents: u64, quantity: u32) -> CartLineItem {
        CartLineItem {
            id: id.to_string(),
            product_id: product.to_string(),
            quantity,
            listing: ListingSummary {
                name: format!("Listing {product}"),
                price: Price::from_cents(cents),
                image: None,
                available: true,
            },
        }
    }

    #[test]
    fn test_totals() {
        let state = CartState {
            items: vec![line("l1", "p1", 250, 2), line("l2", "p2", 1000, 1)],
            ..CartState::default()
        };
        assert_eq!(state.total(), Price::from_cents(1500));
        assert_eq!(state.len(), 2);
        assert!(state.contains_listing("p2"));
        assert!(!state.contains_listing("p3"));
        assert_eq!(state.item("l1").map(|i| i.quantity), Some(2));
    }

    #[test]
    fn test_default_state() {
        let state = CartState::default();
        assert_eq!(state.phase, CartPhase::Uninitialized);
        assert!(state.cart_id.is_none());
        assert!(state.is_empty());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_unavailable_placeholder() {
        let summary = ListingSummary::unavailable();
        assert!(!summary.available);
        assert_eq!(summary.name, UNAVAILABLE_LISTING_NAME);
        assert_eq!(summary.price, Price::ZERO);
    }

    #[test]
    fn test_serialization_hides_owner() {
        let state = CartState {
            owner: Some(AccessToken::new("secret")),
            ..CartState::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"phase\":\"uninitialized\""));
    }
}
