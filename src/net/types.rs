//! Backend JSON schema for the endpoints the storefront calls.
//!
//! DESIGN
//! ======
//! Field names follow the backend's camelCase JSON. Optional fields default
//! so older or trimmed responses still decode.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// AUTH
// =============================================================================

/// Token pair issued by login, social exchange and refresh.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Usually `"Bearer"`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Access token lifetime as reported by the backend.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<UserSummary>,
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Account summary returned alongside issued tokens.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct PasswordLoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SocialLoginRequest<'a> {
    pub token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

// =============================================================================
// CATALOG
// =============================================================================

/// A catalog book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock_quantity: Option<i32>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<i64>,
}

/// One page of a paginated listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
}

/// Filters for `GET /books`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl BookQuery {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self { keyword: Some(keyword.into()), ..Self::default() }
    }

    /// Query pairs in request order. A blank keyword is omitted.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(keyword) = self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            pairs.push(("keyword".to_owned(), keyword.to_owned()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_owned(), page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size".to_owned(), size.to_string()));
        }
        pairs
    }
}

// =============================================================================
// CART
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    #[serde(default)]
    pub book_author: Option<String>,
    pub unit_price: f64,
    pub quantity: u32,
    pub subtotal: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartItemRequest {
    pub book_id: i64,
    pub quantity: u32,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Problem-details error body (`title`, `status`, `detail`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProblemDetail {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
}
