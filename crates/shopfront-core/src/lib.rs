//! # Shopfront Core Library
//!
//! `shopfront-core` is the client core of a marketplace storefront. It keeps
//! the user's authentication session and shopping cart consistent with a
//! remote REST API.
//!
//! ## Features
//!
//! - **Durable sessions**: tokens survive restarts through a pluggable store
//! - **Cart synchronization**: cart resolution, enrichment and serialized
//!   mutations, reset automatically on sign-out or account switch
//! - **Catalogue and orders**: browsing, seller listing management, order
//!   history and checkout
//!
//! ## Modules
//!
//! - [`account`] - Sign-in and sign-up
//! - [`api`] - REST API trait, HTTP client and wire models
//! - [`cart`] - Cart synchronizer and observable cart state
//! - [`config`] - Configuration management
//! - [`context`] - Application wiring
//! - [`listings`] - Listing browse and management
//! - [`orders`] - Order history and checkout
//! - [`session`] - Authentication session
//! - [`storage`] - Durable key-value token storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use shopfront_core::account::{self, Credentials};
//! use shopfront_core::context::{AppContext, StorageMode};
//!
//! let ctx = AppContext::new(Config::load()?, StorageMode::Durable)?;
//! account::sign_in(ctx.api(), ctx.session(), &Credentials::new("me@example.com", "secret")).await?;
//!
//! ctx.cart().load().await?;
//! ctx.cart().add_item("42").await?;
//! println!("total: {}", ctx.cart().snapshot().total());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::significant_drop_tightening)]

pub mod account;
pub mod api;
pub mod cart;
pub mod config;
pub mod context;
pub mod error;
pub mod listings;
pub mod orders;
pub mod session;
pub mod storage;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default storefront API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/v1";

/// Default HTTP request timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
