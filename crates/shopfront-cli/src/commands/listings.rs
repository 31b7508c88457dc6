//! Listings command implementation.

use anyhow::{Context, Result};

use shopfront_core::api::{Listing, ListingDraft, ListingUpdate, Price};
use shopfront_core::listings::{self, ListingQuery};

use super::{GlobalArgs, ListingsAction, ListingsArgs};
use crate::ui;

/// Run the listings command.
pub async fn run(args: ListingsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let json = global.wants_json(ctx.config());
    let symbol = ctx.config().display.currency_symbol.clone();

    match args.action {
        ListingsAction::Browse { category, search } => {
            let query = ListingQuery { category, search };
            let found = listings::browse(ctx.api(), &query).await?;
            if json {
                ui::print_json(&serde_json::to_value(&found)?)?;
            } else {
                display_listings(&found, &symbol);
            }
        }

        ListingsAction::Show { id } => {
            let token = ctx.session().access_token();
            let Some(listing) = listings::details(ctx.api(), token.as_ref(), &id).await? else {
                anyhow::bail!("Listing not found: {id}");
            };
            if json {
                ui::print_json(&serde_json::to_value(&listing)?)?;
            } else {
                display_listing(&listing, &symbol);
            }
        }

        ListingsAction::Mine => {
            let token = ctx.token()?;
            let mine = listings::my_listings(ctx.api(), &token).await?;
            if json {
                ui::print_json(&serde_json::to_value(&mine)?)?;
            } else if mine.is_empty() {
                println!("You have no listings.");
            } else {
                display_listings(&mine, &symbol);
            }
        }

        ListingsAction::Create {
            name,
            price,
            category,
            description,
            brand,
            image,
        } => {
            let token = ctx.token()?;
            let draft = ListingDraft {
                name,
                description,
                price: parse_price(&price)?,
                image,
                category,
                brand,
            };
            let created = listings::create_listing(ctx.api(), &token, &draft).await?;
            if json {
                ui::print_json(&serde_json::json!({ "id": created.id }))?;
            } else {
                println!("Created listing {}", created.id);
            }
        }

        ListingsAction::Edit {
            id,
            name,
            price,
            category,
            description,
            brand,
            image,
        } => {
            let token = ctx.token()?;
            let update = ListingUpdate {
                name,
                description,
                price: price.as_deref().map(parse_price).transpose()?,
                image,
                category,
                brand,
            };
            let updated = listings::update_listing(ctx.api(), &token, &id, &update).await?;
            if json {
                ui::print_json(&serde_json::json!({ "id": updated.id }))?;
            } else {
                println!("Updated listing {}", updated.id);
            }
        }

        ListingsAction::Delete { id } => {
            let token = ctx.token()?;
            listings::delete_listing(ctx.api(), &token, &id).await?;
            if json {
                ui::print_json(&serde_json::json!({ "deleted": id }))?;
            } else {
                println!("Deleted listing {id}");
            }
        }
    }

    Ok(())
}

fn parse_price(raw: &str) -> Result<Price> {
    raw.parse::<Price>()
        .with_context(|| format!("Invalid price: {raw}"))
}

fn display_listings(listings: &[Listing], symbol: &str) {
    if listings.is_empty() {
        println!("No listings found.");
        return;
    }

    println!();
    println!("  {:36}  {:28}  {:12}  {:>10}", "ID", "NAME", "CATEGORY", "PRICE");
    ui::rule();
    for listing in listings {
        println!(
            "  {:36}  {:28}  {:12}  {:>10}",
            listing.id,
            ui::truncate(&listing.name, 28),
            ui::truncate(&listing.category, 12),
            ui::price(listing.price, symbol)
        );
    }
    ui::rule();
    println!("  {} listing(s)", listings.len());
}

fn display_listing(listing: &Listing, symbol: &str) {
    println!();
    println!("{}", listing.name);
    ui::rule();
    println!("  ID:        {}", listing.id);
    println!("  Price:     {}", ui::price(listing.price, symbol));
    println!("  Category:  {}", listing.category);
    if !listing.brand.is_empty() {
        println!("  Brand:     {}", listing.brand);
    }
    if let Some(status) = &listing.status {
        println!("  Status:    {status}");
    }
    if let Some(image) = &listing.image {
        println!("  Image:     {image}");
    }
    if !listing.description.is_empty() {
        println!();
        println!("  {}", listing.description);
    }
    ui::rule();
}
