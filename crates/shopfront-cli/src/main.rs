//! Shopfront CLI - storefront client
//!
//! Sign in, browse listings, manage the cart, check out and review orders
//! against a storefront REST API.
//!
//! ## Quick Start
//!
//! ```bash
//! # Sign in (the session is kept between runs)
//! shopfront login ada@example.com --password-stdin
//!
//! # Find something and add it to the cart
//! shopfront listings browse --category home --search lamp
//! shopfront cart add 3f6c0d2e-...
//!
//! # Check out
//! shopfront checkout --full-name "Ada Lovelace" --line1 "12 Analytical St" \
//!     --city London --state LDN --zip "N1 1AA" --country UK
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

use std::process::ExitCode;

use clap::Parser;

mod commands;
pub mod ui;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let global = cli.global;

    match cli.command {
        Command::Login(args) => commands::account::login(args, &global).await,
        Command::Register(args) => commands::account::register(args, &global).await,
        Command::Logout => commands::account::logout(&global),
        Command::Whoami => commands::account::whoami(&global).await,
        Command::Listings(args) => commands::listings::run(args, &global).await,
        Command::Cart(args) => commands::cart::run(args, &global).await,
        Command::Checkout(args) => commands::checkout::run(args, &global).await,
        Command::Orders(args) => commands::orders::run(args, &global).await,
        Command::Config(args) => commands::config::run(args),
        Command::Completions(args) => {
            commands::completions::run(args.shell);
            Ok(())
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,shopfront=info,shopfront_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
