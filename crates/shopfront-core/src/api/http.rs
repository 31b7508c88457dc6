//! `reqwest` implementation of [`StorefrontApi`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::models::{
    CartItemRecord, CartRecord, CreatedResource, Listing, ListingDraft, ListingUpdate,
    NewCartItem, NewOrder, Order, UserProfile,
};
use super::StorefrontApi;
use crate::account::Credentials;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::session::{AccessToken, TokenPair};

/// Storefront API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: Option<String>,
    refresh: Option<String>,
}

impl HttpApi {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL or
    /// the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).map_err(|e| Error::InvalidConfig {
            key: "api.base_url".to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidConfig {
                key: "api.base_url".to_string(),
                reason: format!("'{base_url}' cannot hold a path"),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url,
            base,
        })
    }

    /// Base URL all paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve path segments against the base URL, with a trailing slash.
    ///
    /// Each segment is percent-encoded, so an identifier can never address a
    /// different endpoint.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(Error::validation("id", format!("'{bad}' is not a valid identifier")));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidConfig {
                key: "api.base_url".to_string(),
                reason: format!("'{}' cannot hold a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&AccessToken>,
    ) -> Result<RequestBuilder> {
        let builder = self
            .client
            .request(method, self.endpoint(segments)?)
            .header(reqwest::header::ACCEPT, "application/json");

        Ok(match token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder, resource: &str) -> Result<T> {
        let response = Self::check(builder.send().await?, resource).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(builder: RequestBuilder, resource: &str) -> Result<()> {
        Self::check(builder.send().await?, resource).await?;
        Ok(())
    }

    async fn check(response: Response, resource: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::debug!(%status, resource, "storefront API request failed");

        match status {
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
            StatusCode::NOT_FOUND => Err(Error::NotFound(resource.to_string())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Api {
                    status: status.as_u16(),
                    message: error_message(&body, status),
                })
            }
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Django REST framework puts it in `detail`; other handlers use `error` or
/// `message`.
fn error_message(body: &str, status: StatusCode) -> String {
    body_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
    })
}

fn body_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
}

#[async_trait]
impl StorefrontApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        let response = self
            .request(Method::POST, &["users", "login"], None)?
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = body_message(&body)
                .unwrap_or_else(|| format!("Login failed (Status: {})", status.as_u16()));
            return Err(Error::AuthenticationFailed(message));
        }

        let body: LoginResponse = response.json().await?;
        match body.access.filter(|a| !a.is_empty()) {
            Some(access) => {
                if body.refresh.as_deref().unwrap_or_default().is_empty() {
                    tracing::debug!("login endpoint only returned an access token");
                }
                Ok(TokenPair::new(access, body.refresh))
            }
            None => Err(Error::AuthenticationFailed(
                "Login successful, but tokens were not received.".to_string(),
            )),
        }
    }

    async fn register(&self, credentials: &Credentials) -> Result<()> {
        let builder = self
            .request(Method::POST, &["users", "register"], None)?
            .json(credentials);
        Self::send_empty(builder, "registration").await
    }

    async fn current_user(&self, token: &AccessToken) -> Result<UserProfile> {
        Self::send_json(self.request(Method::GET, &["users", "me"], Some(token))?, "user").await
    }

    async fn fetch_cart(&self, token: &AccessToken) -> Result<Option<CartRecord>> {
        let carts: Vec<CartRecord> =
            Self::send_json(self.request(Method::GET, &["cart"], Some(token))?, "cart").await?;
        Ok(carts.into_iter().next())
    }

    async fn create_cart(&self, token: &AccessToken) -> Result<CartRecord> {
        let builder = self
            .request(Method::POST, &["cart"], Some(token))?
            .json(&serde_json::json!({}));
        Self::send_json(builder, "cart").await
    }

    async fn cart_by_id(&self, token: &AccessToken, cart_id: &str) -> Result<CartRecord> {
        let builder = self.request(Method::GET, &["cart", cart_id], Some(token))?;
        Self::send_json(builder, "cart").await
    }

    async fn cart_items(&self, token: &AccessToken) -> Result<Vec<CartItemRecord>> {
        Self::send_json(
            self.request(Method::GET, &["cart", "items"], Some(token))?,
            "cart items",
        )
        .await
    }

    async fn add_cart_item(&self, token: &AccessToken, item: &NewCartItem) -> Result<CartItemRecord> {
        let builder = self
            .request(Method::POST, &["cart", "items"], Some(token))?
            .json(item);
        Self::send_json(builder, "cart item").await
    }

    async fn delete_cart_item(&self, token: &AccessToken, item_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &["cart", "items", item_id], Some(token))?;
        Self::send_empty(builder, "cart item").await
    }

    async fn listing(&self, token: Option<&AccessToken>, listing_id: &str) -> Result<Listing> {
        let builder = self.request(Method::GET, &["products", listing_id], token)?;
        Self::send_json(builder, "listing").await
    }

    async fn listings(&self) -> Result<Vec<Listing>> {
        Self::send_json(self.request(Method::GET, &["products"], None)?, "listings").await
    }

    async fn my_listings(&self, token: &AccessToken) -> Result<Vec<Listing>> {
        Self::send_json(
            self.request(Method::GET, &["products", "user-products"], Some(token))?,
            "listings",
        )
        .await
    }

    async fn create_listing(
        &self,
        token: &AccessToken,
        draft: &ListingDraft,
    ) -> Result<CreatedResource> {
        let builder = self
            .request(Method::POST, &["products"], Some(token))?
            .json(draft);
        Self::send_json(builder, "listing").await
    }

    async fn update_listing(
        &self,
        token: &AccessToken,
        listing_id: &str,
        update: &ListingUpdate,
    ) -> Result<CreatedResource> {
        let builder = self
            .request(Method::PATCH, &["products", listing_id, "edit"], Some(token))?
            .json(update);
        Self::send_json(builder, "listing").await
    }

    async fn delete_listing(&self, token: &AccessToken, listing_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &["products", listing_id, "delete"], Some(token))?;
        Self::send_empty(builder, "listing").await
    }

    async fn orders(&self, token: &AccessToken) -> Result<Vec<Order>> {
        Self::send_json(self.request(Method::GET, &["orders"], Some(token))?, "orders").await
    }

    async fn order(&self, token: &AccessToken, order_id: &str) -> Result<Order> {
        let builder = self.request(Method::GET, &["orders", order_id], Some(token))?;
        Self::send_json(builder, "order").await
    }

    async fn place_order(&self, token: &AccessToken, order: &NewOrder) -> Result<Order> {
        let builder = self
            .request(Method::POST, &["orders"], Some(token))?
            .json(order);
        Self::send_json(builder, "order").await
    }
}
