//! Browsing and managing product listings.

use serde::{Deserialize, Serialize};

use crate::api::{CreatedResource, Listing, ListingDraft, ListingUpdate, StorefrontApi};
use crate::error::{Error, Result};
use crate::session::AccessToken;

/// Category value that matches every listing.
pub const ALL_CATEGORIES: &str = "all";

/// Filter applied to the public listing catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    /// Category to keep; `None` or `"all"` keeps everything
    pub category: Option<String>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

impl ListingQuery {
    /// Query that keeps every listing.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restrict to titles containing `text`.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Whether a listing passes the filter.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        let category_ok = match self.category.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(c) if c.eq_ignore_ascii_case(ALL_CATEGORIES) => true,
            Some(c) => listing.category.eq_ignore_ascii_case(c),
        };

        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => listing
                .name
                .to_lowercase()
                .contains(&text.to_lowercase()),
        };

        category_ok && search_ok
    }

    /// Keep matching listings in their original order.
    #[must_use]
    pub fn apply(&self, listings: Vec<Listing>) -> Vec<Listing> {
        listings.into_iter().filter(|l| self.matches(l)).collect()
    }
}

/// Public listings matching `query`, in API order.
pub async fn browse(api: &dyn StorefrontApi, query: &ListingQuery) -> Result<Vec<Listing>> {
    let listings = api.listings().await?;
    let total = listings.len();
    let kept = query.apply(listings);
    tracing::debug!(total, kept = kept.len(), "filtered listings");
    Ok(kept)
}

/// One listing, or `None` if it does not exist.
pub async fn details(
    api: &dyn StorefrontApi,
    token: Option<&AccessToken>,
    listing_id: &str,
) -> Result<Option<Listing>> {
    match api.listing(token, listing_id).await {
        Ok(listing) => Ok(Some(listing)),
        Err(Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Listings owned by the signed-in user.
pub async fn my_listings(api: &dyn StorefrontApi, token: &AccessToken) -> Result<Vec<Listing>> {
    api.my_listings(token).await
}

/// Publish a new listing.
pub async fn create_listing(
    api: &dyn StorefrontApi,
    token: &AccessToken,
    draft: &ListingDraft,
) -> Result<CreatedResource> {
    validate_draft(draft)?;
    let created = api.create_listing(token, draft).await?;
    tracing::info!(listing = %created.id, name = %draft.name, "listing created");
    Ok(created)
}

/// Change fields of one of the user's listings.
pub async fn update_listing(
    api: &dyn StorefrontApi,
    token: &AccessToken,
    listing_id: &str,
    update: &ListingUpdate,
) -> Result<CreatedResource> {
    if update.is_empty() {
        return Err(Error::validation("update", "at least one field must be set"));
    }
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(Error::validation("name", "must not be empty"));
    }

    let updated = api.update_listing(token, listing_id, update).await?;
    tracing::info!(listing = listing_id, "listing updated");
    Ok(updated)
}

/// Delete one of the user's listings.
pub async fn delete_listing(
    api: &dyn StorefrontApi,
    token: &AccessToken,
    listing_id: &str,
) -> Result<()> {
    api.delete_listing(token, listing_id).await?;
    tracing::info!(listing = listing_id, "listing deleted");
    Ok(())
}

fn validate_draft(draft: &ListingDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    if draft.category.trim().is_empty() {
        return Err(Error::validation("category", "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Price;

    fn listing(id: &str, name: &str, category: &str) -> Listing {
        Listing {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            price: Price::from_cents(100),
            image: None,
            category: category.to_string(),
            brand: String::new(),
            status: Some("active".to_string()),
            created_at: None,
            updated_at: None,
            seller: None,
        }
    }

    fn catalogue() -> Vec<Listing> {
        vec![
            listing("1", "Red Shirt", "Clothing"),
            listing("2", "Blue Mug", "Kitchen"),
            listing("3", "red kettle", "kitchen"),
        ]
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_query_all() {
        assert_eq!(ids(&ListingQuery::all().apply(catalogue())), ["1", "2", "3"]);
        assert_eq!(
            ids(&ListingQuery::all().category("ALL").apply(catalogue())),
            ["1", "2", "3"]
        );
    }

    #[test]
    fn test_query_category_case_insensitive() {
        let kept = ListingQuery::all().category("KITCHEN").apply(catalogue());
        assert_eq!(ids(&kept), ["2", "3"]);
    }

    #[test]
    fn test_query_search() {
        let kept = ListingQuery::all().search("RED").apply(catalogue());
        assert_eq!(ids(&kept), ["1", "3"]);

        let kept = ListingQuery::all()
            .category("kitchen")
            .search("red")
            .apply(catalogue());
        assert_eq!(ids(&kept), ["3"]);
    }

    #[test]
    fn test_validate_draft() {
        let mut draft = ListingDraft {
            name: "Lamp".to_string(),
            description: String::new(),
            price: Price::ZERO,
            image: None,
            category: "Home".to_string(),
            brand: String::new(),
        };
        assert!(validate_draft(&draft).is_ok());

        draft.name = "  ".to_string();
        assert!(matches!(
            validate_draft(&draft),
            Err(Error::Validation { ref field, .. }) if field == "name"
        ));
    }
}
