//! Bearer-authenticated HTTP client for the cloud API
//!
//! Wraps a `reqwest::Client` and an [`AccessTokenProvider`]; every request
//! gets an `Authorization: Bearer` header from the provider, which renews
//! the token transparently when it is about to expire.
//!
//! ```rust,no_run
//! use cloudauth_sdk::{AuthManager, AuthManagerSettings, AuthenticatedClient, ClientCredentialsSettings};
//! use std::sync::Arc;
//!
//! # async fn example() -> cloudauth_sdk::AuthResult<()> {
//! let settings = ClientCredentialsSettings::new(
//!     AuthManagerSettings::new("https://auth.example.com/oauth2", "client-id").with_scope("api"),
//!     "client-secret",
//! );
//! let manager = Arc::new(AuthManager::client_credentials(settings)?);
//! let client = AuthenticatedClient::new("https://api.example.com", manager)?;
//! let projects: serde_json::Value = client.get_json("/projects").await?;
//! # Ok(())
//! # }
//! ```

use crate::auth::{
    manager::AccessTokenProvider,
    types::{AuthError, AuthResult, ServerError},
};
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout in seconds for API requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP client attaching access tokens to every request
pub struct AuthenticatedClient {
    http_client: reqwest::Client,
    base_url: String,
    token_provider: Arc<dyn AccessTokenProvider>,
}

impl AuthenticatedClient {
    /// Create a client with the default timeout
    pub fn new(
        base_url: impl Into<String>,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> AuthResult<Self> {
        Self::with_timeout(
            base_url,
            token_provider,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        token_provider: Arc<dyn AccessTokenProvider>,
        timeout: Duration,
    ) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_provider,
        })
    }

    /// Attach the current access token to `request`
    pub async fn apply_auth(&self, request: RequestBuilder) -> AuthResult<RequestBuilder> {
        let token = self.token_provider.get_access_token().await?;
        Ok(request.bearer_auth(token))
    }

    /// Authenticated GET, decoding a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        let request = self.http_client.get(self.url(path));
        let response = self.send(request).await?;
        Self::handle_response(response).await
    }

    /// Authenticated POST with a JSON body, decoding a JSON body
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AuthResult<T> {
        let request = self.http_client.post(self.url(path)).json(body);
        let response = self.send(request).await?;
        Self::handle_response(response).await
    }

    /// Authenticated DELETE, ignoring any body
    pub async fn delete(&self, path: &str) -> AuthResult<()> {
        let request = self.http_client.delete(self.url(path));
        let response = self.send(request).await?;
        Self::check_status(response).await.map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> AuthResult<Response> {
        let request = self.apply_auth(request).await?;
        request
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))
    }

    async fn check_status(response: Response) -> AuthResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::Server(ServerError::from_payload(
            Some(status.as_u16()),
            &body,
        )))
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> AuthResult<T> {
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse response: {e}")))
    }
}
