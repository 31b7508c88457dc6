//! Integration tests for listings, order history and checkout.

mod common;

use std::sync::Arc;

use common::FakeStorefront;
use shopfront_core::api::{ListingDraft, ListingUpdate, Order, OrderStatus, Price};
use shopfront_core::cart::CartSynchronizer;
use shopfront_core::listings::{self, ListingQuery};
use shopfront_core::orders::{self, Checkout, ShippingAddress};
use shopfront_core::session::AccessToken;
use shopfront_core::Error;

const ADA: &str = "ada@example.com";

fn catalogue() -> Arc<FakeStorefront> {
    let api = FakeStorefront::new();
    api.add_listing("p1", "Desk Lamp", 2500, "Home");
    api.add_listing("p2", "Coffee Mug", 800, "Kitchen");
    api.add_listing("p3", "Lamp Shade", 1200, "home");
    api
}

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ada Lovelace".into(),
        line1: "12 Analytical St".into(),
        line2: None,
        city: "London".into(),
        state: "LDN".into(),
        zip: "N1 1AA".into(),
        country: "UK".into(),
    }
}

#[tokio::test]
async fn test_browse_filters_in_api_order() {
    let api = catalogue();

    let all = listings::browse(api.as_ref(), &ListingQuery::all()).await.unwrap();
    assert_eq!(all.len(), 3);

    let lamps = listings::browse(
        api.as_ref(),
        &ListingQuery::all().category("HOME").search("lamp"),
    )
    .await
    .unwrap();
    let ids: Vec<_> = lamps.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["p1", "p3"]);
}

#[tokio::test]
async fn test_details_missing_listing() {
    let api = catalogue();

    let found = listings::details(api.as_ref(), None, "p2").await.unwrap();
    assert_eq!(found.unwrap().name, "Coffee Mug");

    let missing = listings::details(api.as_ref(), None, "nope").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_seller_manages_listings() {
    let api = catalogue();
    let token = AccessToken::new(api.issue_token(ADA));

    let draft = ListingDraft {
        name: "Fountain Pen".into(),
        description: "Refillable".into(),
        price: "19.99".parse().unwrap(),
        image: None,
        category: "Office".into(),
        brand: "Inkwell".into(),
    };
    let created = listings::create_listing(api.as_ref(), &token, &draft).await.unwrap();

    let mine = listings::my_listings(api.as_ref(), &token).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].price, Price::from_cents(1999));

    let update = ListingUpdate {
        price: Some(Price::from_cents(1500)),
        ..ListingUpdate::default()
    };
    listings::update_listing(api.as_ref(), &token, &created.id, &update)
        .await
        .unwrap();
    let updated = listings::details(api.as_ref(), Some(&token), &created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.price, Price::from_cents(1500));

    let empty = listings::update_listing(api.as_ref(), &token, &created.id, &ListingUpdate::default()).await;
    assert!(matches!(empty, Err(Error::Validation { .. })));

    listings::delete_listing(api.as_ref(), &token, &created.id)
        .await
        .unwrap();
    assert!(!api.listing_ids().contains(&created.id));
}

#[tokio::test]
async fn test_order_history_newest_first() {
    let api = catalogue();
    let token = AccessToken::new(api.issue_token(ADA));
    for (id, created_at) in [
        ("o1", "2024-01-05T09:00:00Z"),
        ("o2", "2024-03-01T09:00:00Z"),
        ("o3", "2024-02-01T09:00:00Z"),
    ] {
        api.seed_order(
            ADA,
            Order {
                id: id.into(),
                created_at: created_at.into(),
                status: OrderStatus::Shipped,
                cart: None,
            },
        );
    }

    let history = orders::order_history(api.as_ref(), &token).await.unwrap();
    let ids: Vec<_> = history.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["o2", "o3", "o1"]);
}

#[tokio::test]
async fn test_order_details_with_missing_product() {
    let api = catalogue();
    let token = AccessToken::new(api.issue_token(ADA));
    let cart_id = api.seed_cart(ADA);
    api.seed_item(&cart_id, "p1", 2);
    api.seed_item(&cart_id, "p2", 1);
    api.fail_listing("p2");
    api.seed_order(
        ADA,
        Order {
            id: "o1".into(),
            created_at: "2024-01-05T09:00:00Z".into(),
            status: OrderStatus::Received,
            cart: Some(cart_id.clone()),
        },
    );

    let details = orders::order_details(api.as_ref(), &token, "o1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(details.cart.as_ref().unwrap().id, cart_id);
    assert_eq!(details.lines.len(), 2);
    let missing = details.lines.iter().find(|l| l.product_id == "p2").unwrap();
    assert_eq!(missing.name, "Product unavailable");
    assert_eq!(missing.price, Price::ZERO);
    assert_eq!(details.total(), Price::from_cents(5000));

    let none = orders::order_details(api.as_ref(), &token, "o404").await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let api = catalogue();
    let session = common::memory_session();
    let cart = CartSynchronizer::new(api.clone(), session.subscribe());
    common::sign_in_as(&api, &session, ADA);

    cart.add_item_with_quantity("p1", 2).await.unwrap();
    cart.add_item("p2").await.unwrap();
    let cart_id = cart.snapshot().cart_id.unwrap();

    let mut checkout = Checkout::new(cart.snapshot());
    checkout.shipping(address()).unwrap();
    assert_eq!(checkout.review().total, Price::from_cents(5800));

    let token = session.require_token().unwrap();
    let outcome = checkout.place(api.as_ref(), &token, &cart).await.unwrap();

    assert!(outcome.cart_cleared());
    assert_eq!(outcome.removed.len(), 2);
    assert_eq!(outcome.order.status, OrderStatus::Received);
    assert_eq!(outcome.order.cart.as_deref(), Some(cart_id.as_str()));
    assert_eq!(api.orders_of(ADA).len(), 1);
    assert!(cart.snapshot().is_empty());
    assert!(api.items_in(&cart_id).is_empty());
}

#[tokio::test]
async fn test_checkout_reports_failed_removals() {
    let api = catalogue();
    let session = common::memory_session();
    let cart = CartSynchronizer::new(api.clone(), session.subscribe());
    common::sign_in_as(&api, &session, ADA);
    cart.add_item("p1").await.unwrap();

    let mut checkout = Checkout::new(cart.snapshot());
    checkout.shipping(address()).unwrap();

    api.fail_deletes(true);
    let token = session.require_token().unwrap();
    let outcome = checkout.place(api.as_ref(), &token, &cart).await.unwrap();

    assert!(!outcome.cart_cleared());
    assert_eq!(outcome.failed_removals.len(), 1);
    assert_eq!(api.orders_of(ADA).len(), 1);
    assert_eq!(cart.snapshot().len(), 1);
}

#[tokio::test]
async fn test_checkout_requires_items_and_address() {
    let api = catalogue();
    let session = common::memory_session();
    let cart = CartSynchronizer::new(api.clone(), session.subscribe());
    common::sign_in_as(&api, &session, ADA);
    cart.load().await.unwrap();
    let token = session.require_token().unwrap();

    let mut empty = Checkout::new(cart.snapshot());
    empty.shipping(address()).unwrap();
    let result = empty.place(api.as_ref(), &token, &cart).await;
    assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "cart"));

    cart.add_item("p3").await.unwrap();
    let no_address = Checkout::new(cart.snapshot());
    let result = no_address.place(api.as_ref(), &token, &cart).await;
    assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "shipping"));

    assert!(api.orders_of(ADA).is_empty());
    assert_eq!(cart.snapshot().len(), 1);
}
