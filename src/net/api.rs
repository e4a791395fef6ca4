//! Typed backend endpoints.
//!
//! Every call goes through `ApiClient::execute`, so the bearer credential is
//! attached and `401`s are detected uniformly. Paths are relative to the
//! configured base URL, which already carries the `/api` prefix.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::Serialize;

use super::client::ApiClient;
use super::error::ApiError;
use super::pipeline::ApiRequest;
use super::transport::Transport;
use super::types::{
    AddCartItemRequest, AuthTokens, Book, BookQuery, Cart, Page, PasswordLoginRequest, RefreshTokenRequest,
    SocialLoginRequest,
};

pub const BOOKS_ENDPOINT: &str = "/books";
pub const CART_ENDPOINT: &str = "/cart";
pub const CART_ITEMS_ENDPOINT: &str = "/cart/items";
pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const SOCIAL_LOGIN_ENDPOINT: &str = "/auth/social";
pub const REFRESH_ENDPOINT: &str = "/auth/refresh";
pub const LOGOUT_ENDPOINT: &str = "/auth/logout";

fn book_endpoint(book_id: i64) -> String {
    format!("{BOOKS_ENDPOINT}/{book_id}")
}

fn json_body(body: &impl Serialize) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

impl<T: Transport> ApiClient<T> {
    /// `GET /books` with optional keyword and paging.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or decode failure.
    pub async fn list_books(&self, query: &BookQuery) -> Result<Page<Book>, ApiError> {
        let mut request = ApiRequest::get(BOOKS_ENDPOINT);
        request.query = query.to_pairs();
        self.execute_json(request).await
    }

    /// `GET /books/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or decode failure.
    pub async fn get_book(&self, book_id: i64) -> Result<Book, ApiError> {
        self.execute_json(ApiRequest::get(book_endpoint(book_id))).await
    }

    /// `GET /cart` for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or decode failure.
    pub async fn get_cart(&self) -> Result<Cart, ApiError> {
        self.execute_json(ApiRequest::get(CART_ENDPOINT)).await
    }

    /// `POST /cart/items`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` for a zero quantity, otherwise any
    /// transport, status or decode failure.
    pub async fn add_cart_item(&self, book_id: i64, quantity: u32) -> Result<Cart, ApiError> {
        if quantity == 0 {
            return Err(ApiError::InvalidRequest("quantity must be at least 1".to_owned()));
        }
        let body = json_body(&AddCartItemRequest { book_id, quantity })?;
        self.execute_json(ApiRequest::post(CART_ITEMS_ENDPOINT).with_json(body)).await
    }

    /// `POST /auth/login` with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for rejected credentials, otherwise any
    /// transport, status or decode failure.
    pub async fn password_login(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let body = json_body(&PasswordLoginRequest { email: email.trim(), password })?;
        self.execute_json(ApiRequest::post(LOGIN_ENDPOINT).with_json(body)).await
    }

    /// `POST /auth/social`: trade a provider token for application tokens.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the backend rejects the provider
    /// token, otherwise any transport, status or decode failure.
    pub async fn exchange_social_token(&self, provider_token: &str) -> Result<AuthTokens, ApiError> {
        let body = json_body(&SocialLoginRequest { token: provider_token })?;
        self.execute_json(ApiRequest::post(SOCIAL_LOGIN_ENDPOINT).with_json(body)).await
    }

    /// `POST /auth/refresh`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for an invalid refresh token, otherwise
    /// any transport, status or decode failure.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        let body = json_body(&RefreshTokenRequest { refresh_token })?;
        self.execute_json(ApiRequest::post(REFRESH_ENDPOINT).with_json(body)).await
    }

    /// `POST /auth/logout`. The backend keeps no session; this is a courtesy call.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failure.
    pub async fn server_logout(&self) -> Result<(), ApiError> {
        self.execute(ApiRequest::post(LOGOUT_ENDPOINT)).await.map(|_| ())
    }
}
