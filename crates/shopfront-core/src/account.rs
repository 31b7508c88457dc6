//! Sign-in and sign-up.
//!
//! The network half of authentication: these functions talk to the API and
//! hand the resulting tokens to the [`SessionManager`].

use std::fmt;

use serde::Serialize;

use crate::api::{StorefrontApi, UserProfile};
use crate::error::{Error, Result};
use crate::session::SessionManager;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Username and password as sent to the login and register endpoints.
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Username (the sign-in email)
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check the input before it is sent.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::validation("username", "must not be empty"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters long"),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// Sign in and store the resulting tokens.
///
/// Failures are recorded as the session's `last_error` and returned.
pub async fn sign_in(
    api: &dyn StorefrontApi,
    session: &SessionManager,
    credentials: &Credentials,
) -> Result<()> {
    session.clear_error();
    credentials.validate()?;

    let tokens = match api.login(credentials).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::info!(username = %credentials.username, "login rejected: {e}");
            session.record_error(login_message(&e));
            return Err(e);
        }
    };

    session.login(tokens)
}

/// Create an account, then sign in with it.
pub async fn sign_up(
    api: &dyn StorefrontApi,
    session: &SessionManager,
    credentials: &Credentials,
) -> Result<()> {
    session.clear_error();
    credentials.validate()?;

    if let Err(e) = api.register(credentials).await {
        session.record_error(format!("Registration failed: {e}"));
        return Err(e);
    }
    tracing::info!(username = %credentials.username, "account created");

    sign_in(api, session, credentials).await
}

/// Profile of the signed-in user.
pub async fn current_user(api: &dyn StorefrontApi, session: &SessionManager) -> Result<UserProfile> {
    let token = session.require_token()?;
    api.current_user(&token).await
}

fn login_message(err: &Error) -> String {
    match err {
        Error::AuthenticationFailed(message) => message.clone(),
        Error::Http(_) => "Could not reach the server. Please try again.".to_string(),
        other => other.to_string(),
    }
}
