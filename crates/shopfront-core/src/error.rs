//! Error types for Shopfront.
//!
//! This module provides a unified error type for all Shopfront operations,
//! with specific error variants for different failure modes.

use thiserror::Error;

/// A specialized `Result` type for Shopfront operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Shopfront.
#[derive(Error, Debug)]
pub enum Error {
    /// Durable token storage could not be read or written (E001)
    #[error("token storage error: {0}")]
    Storage(String),

    /// Login was rejected by the server (E002)
    #[error("login failed: {0}")]
    AuthenticationFailed(String),

    /// Operation requires a signed-in user (E003)
    #[error("not signed in")]
    NotAuthenticated,

    /// Server rejected the access token (E004)
    #[error("unauthorized, please sign in again")]
    Unauthorized,

    /// Requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Server answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Request could not be sent or the response could not be read (E005)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The user's cart could not be resolved or created (E006)
    #[error("cart unavailable: {0}")]
    CartUnavailable(String),

    /// Listing already has a line in the cart (E007)
    #[error("listing '{0}' is already in the cart")]
    DuplicateItem(String),

    /// Line item quantity must be at least one
    #[error("invalid quantity {0}: must be at least 1")]
    InvalidQuantity(u32),

    /// User input failed validation
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Reason for failure
        reason: String,
    },

    /// The session changed while the operation was in flight (E008)
    #[error("session changed while the request was in flight")]
    SessionChanged,

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code associated with this error, if any.
    ///
    /// Error codes follow the pattern EXXX where XXX is a 3-digit number.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Storage(_) => Some("E001"),
            Self::AuthenticationFailed(_) => Some("E002"),
            Self::NotAuthenticated => Some("E003"),
            Self::Unauthorized => Some("E004"),
            Self::Http(_) => Some("E005"),
            Self::CartUnavailable(_) => Some("E006"),
            Self::DuplicateItem(_) => Some("E007"),
            Self::SessionChanged => Some("E008"),
            _ => None,
        }
    }

    /// Returns whether this error is recoverable (can be retried).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::CartUnavailable(_) | Self::SessionChanged | Self::Storage(_) => {
                true
            }
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns a helpful suggestion for resolving the error, if applicable.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotAuthenticated | Self::Unauthorized => Some(
                "Sign in first:\n\
                   shopfront login <username>",
            ),
            Self::Http(_) => Some(
                "Check that the storefront API is reachable.\n\
                 The API address can be changed with:\n\
                   shopfront config set api.base_url <url>",
            ),
            Self::CartUnavailable(_) => Some("Try loading the cart again: shopfront cart show"),
            Self::DuplicateItem(_) => Some(
                "Only one line per listing is allowed.\n\
                 Remove the existing line first to change the quantity.",
            ),
            Self::Storage(_) => Some(
                "The session file could not be accessed. Check its permissions, or use\n\
                   shopfront --ephemeral ...",
            ),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
