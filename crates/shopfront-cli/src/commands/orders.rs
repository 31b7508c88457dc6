//! Orders command implementation.

use anyhow::Result;

use shopfront_core::orders;

use super::{GlobalArgs, OrdersAction, OrdersArgs};
use crate::ui;

/// Run the orders command.
pub async fn run(args: OrdersArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let json = global.wants_json(ctx.config());
    let symbol = ctx.config().display.currency_symbol.clone();
    let token = ctx.token()?;

    match args.action {
        OrdersAction::List => {
            let history = orders::order_history(ctx.api(), &token).await?;
            if json {
                return ui::print_json(&serde_json::to_value(&history)?);
            }
            if history.is_empty() {
                println!("No orders yet.");
                return Ok(());
            }

            println!();
            println!("  {:36}  {:25}  {:10}", "ORDER", "PLACED", "STATUS");
            ui::rule();
            for order in &history {
                let placed = order.placed_at().map_or_else(
                    || order.created_at.clone(),
                    |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
                );
                println!("  {:36}  {:25}  {:10}", order.id, placed, order.status);
            }
            ui::rule();
        }

        OrdersAction::Show { id } => {
            let Some(details) = orders::order_details(ctx.api(), &token, &id).await? else {
                anyhow::bail!("Order not found: {id}");
            };
            if json {
                return ui::print_json(&serde_json::to_value(&details)?);
            }

            println!();
            println!("Order {}", details.order.id);
            ui::rule();
            println!("  Status:   {}", details.order.status);
            println!("  Placed:   {}", details.order.created_at);
            if let Some(cart) = details.cart.as_ref().filter(|c| !c.shipping_address.is_empty()) {
                println!("  Ship to:  {}", cart.shipping_address);
            }
            println!();
            for line in &details.lines {
                println!(
                    "  {:3} x {:40}  {:>10}",
                    line.quantity,
                    ui::truncate(&line.name, 40),
                    ui::price(line.subtotal(), &symbol)
                );
            }
            ui::rule();
            println!("  Total: {}", ui::price(details.total(), &symbol));
        }
    }

    Ok(())
}
