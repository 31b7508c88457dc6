//! Cart command implementation.

use anyhow::Result;

use shopfront_core::cart::{CartLineItem, CartState};

use super::{CartAction, CartArgs, GlobalArgs};
use crate::ui;

/// Run the cart command.
pub async fn run(args: CartArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let json = global.wants_json(ctx.config());
    let symbol = ctx.config().display.currency_symbol.clone();
    let cart = ctx.cart();

    ctx.token()?;

    match args.action {
        CartAction::Show => {
            cart.load().await?;
            let state = cart.snapshot();
            if json {
                ui::print_json(&serde_json::to_value(&state)?)?;
            } else {
                display_cart(&state, &symbol);
            }
        }

        CartAction::Add {
            listing_id,
            quantity,
        } => {
            let line = cart.add_item_with_quantity(&listing_id, quantity).await?;
            if json {
                ui::print_json(&serde_json::to_value(&line)?)?;
            } else {
                println!(
                    "Added {} x {} ({})",
                    line.quantity,
                    line.listing.name,
                    ui::price(line.subtotal(), &symbol)
                );
                println!("Cart total: {}", ui::price(cart.snapshot().total(), &symbol));
            }
        }

        CartAction::Remove { line_item_id } => {
            cart.remove_item(&line_item_id).await?;
            if json {
                ui::print_json(&serde_json::json!({ "removed": line_item_id }))?;
            } else {
                println!("Removed {line_item_id} from the cart.");
            }
        }
    }

    Ok(())
}

/// Print the cart as a table.
pub fn display_cart(state: &CartState, symbol: &str) {
    if state.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    println!();
    println!("Cart");
    print_lines(&state.items, symbol);
    println!("  {:>66}", format!("Total: {}", ui::price(state.total(), symbol)));
}

/// Print line items as a table.
pub fn print_lines(items: &[CartLineItem], symbol: &str) {
    println!("  {:36}  {:14}  {:>3}  {:>10}", "LINE", "NAME", "QTY", "SUBTOTAL");
    ui::rule();
    for item in items {
        let name = if item.listing.available {
            ui::truncate(&item.listing.name, 14)
        } else {
            ui::truncate(&format!("{} ({})", item.listing.name, item.product_id), 14)
        };
        println!(
            "  {:36}  {:14}  {:>3}  {:>10}",
            item.id,
            name,
            item.quantity,
            ui::price(item.subtotal(), symbol)
        );
    }
    ui::rule();
}
