//! Wire types exchanged with the storefront REST API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// A non-negative amount of money held as integer cents.
///
/// The API sends decimal strings (`"12.50"`) and sometimes plain numbers;
/// both are accepted. Serialized back as a two-decimal string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u64);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Create a price from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Multiply by a quantity, saturating on overflow.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }
}

impl std::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

impl FromStr for Price {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::validation("price", format!("'{s}' is not a valid amount"));
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        // Cents are the first two fraction digits; the third decides rounding.
        let digits: Vec<u64> = frac.bytes().map(|b| u64::from(b - b'0')).collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = u64::from(digits.get(2).is_some_and(|&d| d >= 5));

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + round_up))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(u64),
            Float(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Int(n) => n
                .checked_mul(100)
                .map(Self)
                .ok_or_else(|| serde::de::Error::custom("price out of range")),
            Raw::Float(n) if n.is_finite() && n >= 0.0 => format!("{n:.2}")
                .parse()
                .map_err(serde::de::Error::custom),
            Raw::Float(n) => Err(serde::de::Error::custom(format!("invalid price {n}"))),
        }
    }
}

/// Accepts identifiers sent either as strings or as numbers.
fn optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        },
    )
}

/// Parse a server timestamp, with or without a UTC offset.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// A product listing as returned by `GET /products/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Listing identifier
    pub id: String,
    /// Title shown to buyers
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Unit price
    pub price: Price,
    /// Image URL, if any
    #[serde(default)]
    pub image: Option<String>,
    /// Category
    #[serde(default, rename = "type")]
    pub category: String,
    /// Brand
    #[serde(default)]
    pub brand: String,
    /// Listing status (`active`, `archive`)
    #[serde(default)]
    pub status: Option<String>,
    /// Creation timestamp as sent by the server
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp as sent by the server
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Seller reference
    #[serde(default, rename = "user", deserialize_with = "optional_id")]
    pub seller: Option<String>,
}

/// Fields sent when creating a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingDraft {
    /// Title
    pub name: String,
    /// Description
    pub description: String,
    /// Unit price
    pub price: Price,
    /// Image URL
    pub image: Option<String>,
    /// Category
    #[serde(rename = "type")]
    pub category: String,
    /// Brand
    pub brand: String,
}

/// Partial update of a listing; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingUpdate {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// New image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// New category
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New brand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl ListingUpdate {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image.is_none()
            && self.category.is_none()
            && self.brand.is_none()
    }
}

/// Identifier returned by create and update endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    /// Identifier of the created or updated resource
    pub id: String,
}

/// A cart as returned by `GET /cart/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRecord {
    /// Cart identifier
    pub id: String,
    /// Owner username
    #[serde(default, deserialize_with = "optional_id")]
    pub user: Option<String>,
    /// Cart status
    #[serde(default)]
    pub status: Option<String>,
    /// Shipping address text
    #[serde(default)]
    pub shipping_address: String,
    /// Billing address text
    #[serde(default)]
    pub billing_address: String,
    /// Line item identifiers
    #[serde(default)]
    pub items: Vec<String>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A bare cart line item as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemRecord {
    /// Line item identifier
    pub id: String,
    /// Listing being purchased
    pub product_id: String,
    /// Quantity
    pub quantity: u32,
    /// Owning cart
    pub cart: String,
}

/// Body of `POST /cart/items/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    /// Listing to add
    pub product_id: String,
    /// Quantity, at least one
    pub quantity: u32,
    /// Cart to add to
    pub cart: String,
}

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    /// Order placed
    Received,
    /// Handed to the carrier
    Shipped,
    /// Arrived
    Delivered,
    /// Any status this client does not know
    Unknown,
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "Received" => Self::Received,
            "Shipped" => Self::Shipped,
            "Delivered" => Self::Delivered,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "Received"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// An order as returned by `GET /orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: String,
    /// Placement timestamp as sent by the server
    pub created_at: String,
    /// Fulfilment status
    pub status: OrderStatus,
    /// Cart the order was placed from
    #[serde(default)]
    pub cart: Option<String>,
}

impl Order {
    /// Placement time, if the server timestamp parses.
    #[must_use]
    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// Body of `POST /orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    /// Placement time
    pub created_at: DateTime<Utc>,
    /// Initial status
    pub status: OrderStatus,
    /// Cart being ordered
    pub cart: String,
}

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Username (the sign-in email)
    pub username: String,
}
