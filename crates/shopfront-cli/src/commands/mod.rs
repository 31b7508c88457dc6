//! CLI command definitions and handlers.

use clap::{Args, Parser, Subcommand, ValueEnum};

use shopfront_core::config::Config;
use shopfront_core::context::{AppContext, StorageMode};

/// Load configuration with graceful fallback to defaults.
///
/// A broken config file is reported and otherwise ignored.
pub fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("{e}, using defaults");
        Config::default()
    })
}

/// Build the application context for a command run.
///
/// Applies `--api-url` over the config file and picks durable or in-memory
/// session storage.
pub fn context(global: &GlobalArgs) -> anyhow::Result<AppContext> {
    let mut config = load_config();
    if let Some(url) = &global.api_url {
        config.api.base_url.clone_from(url);
    }

    let mode = if global.ephemeral {
        StorageMode::Ephemeral
    } else {
        StorageMode::Durable
    };

    let ctx = AppContext::new(config, mode)?;
    if let Some(message) = ctx.session().last_error() {
        tracing::warn!("{message}");
    }
    Ok(ctx)
}

pub mod account;
pub mod cart;
pub mod checkout;
pub mod completions;
pub mod config;
pub mod listings;
pub mod orders;

/// Shopfront - storefront client
#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Storefront API base URL
    #[arg(long, global = true, env = "SHOPFRONT_API_URL")]
    pub api_url: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Keep the session in memory only (nothing is written to disk)
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

impl GlobalArgs {
    /// Whether output should be JSON, from the flag or the config file.
    pub fn wants_json(&self, config: &Config) -> bool {
        self.json || config.display.json
    }
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Sign in
    Login(LoginArgs),

    /// Create an account and sign in
    Register(LoginArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Browse and manage listings
    Listings(ListingsArgs),

    /// View and change the cart
    Cart(CartArgs),

    /// Place an order for the cart
    Checkout(CheckoutArgs),

    /// View order history
    Orders(OrdersArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the login and register commands
#[derive(Parser)]
pub struct LoginArgs {
    /// Username (your email address)
    pub username: String,

    /// Password
    #[arg(long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long, conflicts_with = "password")]
    pub password_stdin: bool,
}

/// Arguments for the listings command
#[derive(Parser)]
pub struct ListingsArgs {
    /// Listings action
    #[command(subcommand)]
    pub action: ListingsAction,
}

/// Listings subcommands
#[derive(Subcommand)]
pub enum ListingsAction {
    /// Browse active listings
    Browse {
        /// Only show this category ("all" shows everything)
        #[arg(short, long)]
        category: Option<String>,

        /// Only show titles containing this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one listing
    Show {
        /// Listing ID
        id: String,
    },

    /// Show your own listings
    Mine,

    /// Publish a new listing
    Create {
        /// Title
        #[arg(long)]
        name: String,

        /// Unit price (e.g. 19.99)
        #[arg(long)]
        price: String,

        /// Category
        #[arg(long)]
        category: String,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Brand
        #[arg(long, default_value = "")]
        brand: String,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Change fields of one of your listings
    Edit {
        /// Listing ID
        id: String,

        /// New title
        #[arg(long)]
        name: Option<String>,

        /// New unit price
        #[arg(long)]
        price: Option<String>,

        /// New category
        #[arg(long)]
        category: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New brand
        #[arg(long)]
        brand: Option<String>,

        /// New image URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Delete one of your listings
    Delete {
        /// Listing ID
        id: String,
    },
}

/// Arguments for the cart command
#[derive(Parser)]
pub struct CartArgs {
    /// Cart action
    #[command(subcommand)]
    pub action: CartAction,
}

/// Cart subcommands
#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,

    /// Add a listing to the cart
    Add {
        /// Listing ID
        listing_id: String,

        /// Quantity
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },

    /// Remove a line from the cart
    Remove {
        /// Line item ID (see `shopfront cart show`)
        line_item_id: String,
    },
}

/// Arguments for the checkout command
#[derive(Parser)]
pub struct CheckoutArgs {
    /// Recipient name
    #[arg(long)]
    pub full_name: String,

    /// Street address
    #[arg(long)]
    pub line1: String,

    /// Apartment, suite, etc.
    #[arg(long)]
    pub line2: Option<String>,

    /// City
    #[arg(long)]
    pub city: String,

    /// State or province
    #[arg(long)]
    pub state: String,

    /// Postal code
    #[arg(long)]
    pub zip: String,

    /// Country
    #[arg(long)]
    pub country: String,

    /// Place the order without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the orders command
#[derive(Parser)]
pub struct OrdersArgs {
    /// Orders action
    #[command(subcommand)]
    pub action: OrdersAction,
}

/// Orders subcommands
#[derive(Subcommand)]
pub enum OrdersAction {
    /// List your orders, newest first
    List,

    /// Show one order with its items
    Show {
        /// Order ID
        id: String,
    },
}

/// Arguments for the config command
#[derive(Parser)]
pub struct ConfigArgs {
    /// Config action
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key (e.g. api.base_url)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Show all configuration
    Show,

    /// Show where configuration and session files live
    Path,

    /// Reset to defaults
    Reset,
}

/// Arguments for the completions command
#[derive(Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,
}

/// Supported shell types for completions
#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell
    Elvish,
}
