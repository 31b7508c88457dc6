//! Checkout command implementation.

use anyhow::{bail, Result};

use shopfront_core::orders::{Checkout, ShippingAddress};

use super::{CheckoutArgs, GlobalArgs};
use crate::ui;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let json = global.wants_json(ctx.config());
    let symbol = ctx.config().display.currency_symbol.clone();
    let token = ctx.token()?;

    ctx.cart().load().await?;
    let snapshot = ctx.cart().snapshot();
    if snapshot.is_empty() {
        bail!("Your cart is empty. Add something with `shopfront cart add <listing>` first.");
    }

    let mut checkout = Checkout::new(snapshot);
    checkout.shipping(ShippingAddress {
        full_name: args.full_name,
        line1: args.line1,
        line2: args.line2,
        city: args.city,
        state: args.state,
        zip: args.zip,
        country: args.country,
    })?;

    let review = checkout.review();
    if !json {
        println!();
        println!("Order review");
        super::cart::print_lines(&review.lines, &symbol);
        println!("  Total:    {}", ui::price(review.total, &symbol));
        if let Some(shipping) = &review.shipping {
            println!("  Ship to:  {shipping}");
        }
        println!();

        if !args.yes && !ui::confirm("Place this order?")? {
            println!("Checkout cancelled.");
            return Ok(());
        }
    } else if !args.yes {
        bail!("Pass --yes to place the order when using --json.");
    }

    let outcome = checkout.place(ctx.api(), &token, ctx.cart()).await?;

    if json {
        return ui::print_json(&serde_json::to_value(&outcome)?);
    }

    println!("Order {} placed ({}).", outcome.order.id, outcome.order.status);
    if !outcome.cart_cleared() {
        println!();
        println!("Some items could not be removed from your cart:");
        for (line, reason) in &outcome.failed_removals {
            println!("  {line}: {reason}");
        }
        println!("Remove them with `shopfront cart remove <line>`.");
    }
    Ok(())
}
