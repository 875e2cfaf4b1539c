//! Transport to the identity provider
//!
//! [`AuthProxy`] is the seam between the token managers and the network.
//! [`HttpAuthProxy`] is the `reqwest` implementation; tests substitute their
//! own implementations to count calls or inject failures.

use super::types::{AuthError, AuthResult, ServerError, TokenResponse};
use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// CSRF token plus the session cookies issued with it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsrfTokenResponse {
    #[serde(alias = "csrfToken")]
    pub csrf_token: String,
    /// `name=value` pairs, filled from `Set-Cookie` headers
    #[serde(default)]
    pub cookies: Vec<String>,
}

/// Session established from user credentials
#[derive(Clone, Default, Deserialize)]
pub struct SessionTokenResponse {
    #[serde(alias = "sessionToken")]
    pub session_token: String,
}

/// Parameters of the authorization code request
#[derive(Clone, Serialize)]
pub struct AuthorizationCodeRequest {
    pub client_id: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub prompt: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub scope: String,
    pub session_token: String,
    /// Milliseconds since the Unix epoch, defeats intermediary caching
    #[serde(rename = "t")]
    pub timestamp: i64,
}

/// Authorization code issued for a session
#[derive(Clone, Default, Deserialize)]
pub struct AuthorizationCodeResponse {
    #[serde(alias = "authorization_code")]
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Form body of a refresh token grant
#[derive(Clone, Serialize)]
pub struct RefreshTokenRequest {
    pub grant_type: String,
    pub scope: String,
    pub refresh_token: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

/// Network operations needed by the token managers
#[async_trait]
pub trait AuthProxy: Send + Sync {
    /// Fetch a CSRF token and the session cookies bound to it
    async fn csrf_token(&self) -> AuthResult<CsrfTokenResponse>;

    /// Exchange user credentials for a session token
    async fn session_token(
        &self,
        username: &str,
        password: &str,
        csrf_token: &str,
        cookies: &[String],
    ) -> AuthResult<SessionTokenResponse>;

    /// Exchange a session token and code challenge for an authorization code
    async fn authorization_code(
        &self,
        request: &AuthorizationCodeRequest,
    ) -> AuthResult<AuthorizationCodeResponse>;

    /// Exchange an authorization code and its verifier for tokens
    async fn access_token(
        &self,
        client_id: &str,
        auth_code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> AuthResult<TokenResponse>;

    /// Redeem a refresh token
    async fn refresh_access_token(&self, request: &RefreshTokenRequest)
        -> AuthResult<TokenResponse>;

    /// Client credentials grant, authenticated with HTTP Basic
    async fn client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
        grant_type: &str,
        scope: &str,
    ) -> AuthResult<TokenResponse>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// `reqwest` backed proxy talking to `{host}/csrf`, `/session`, `/authorize`
/// and `/token`
#[derive(Debug, Clone)]
pub struct HttpAuthProxy {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpAuthProxy {
    /// Create a proxy for `host` without a request timeout
    pub fn new(host: &str) -> AuthResult<Self> {
        Self::with_timeout(host, None)
    }

    /// Create a proxy for `host`, optionally bounding every request
    pub fn with_timeout(host: &str, timeout: Option<Duration>) -> AuthResult<Self> {
        let parsed = url::Url::parse(host)
            .map_err(|e| AuthError::ConfigError(format!("Invalid host '{host}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuthError::ConfigError(format!(
                "Unsupported scheme for host '{host}'"
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| AuthError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: host.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> AuthResult<Response> {
        request
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(format!("{what} request failed: {e}")))
    }

    /// Map non-2xx responses to `AuthError::Server` and decode the body
    async fn handle_response<T: DeserializeOwned>(response: Response, what: &str) -> AuthResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("{} failed with status {}", what, status);
            return Err(AuthError::Server(ServerError::from_payload(
                Some(status.as_u16()),
                &body,
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse {what} response: {e}")))
    }
}

/// Keep the `name=value` part of a `Set-Cookie` header
fn cookie_pair(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    pair.contains('=').then(|| pair.to_string())
}

#[async_trait]
impl AuthProxy for HttpAuthProxy {
    async fn csrf_token(&self) -> AuthResult<CsrfTokenResponse> {
        debug!("Fetching CSRF token");
        let response = self
            .send(self.http_client.get(self.endpoint("csrf")), "CSRF token")
            .await?;

        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(cookie_pair)
            .collect();

        let mut csrf: CsrfTokenResponse = Self::handle_response(response, "CSRF token").await?;
        csrf.cookies.extend(cookies);
        Ok(csrf)
    }

    async fn session_token(
        &self,
        username: &str,
        password: &str,
        csrf_token: &str,
        cookies: &[String],
    ) -> AuthResult<SessionTokenResponse> {
        debug!("Requesting session token for {}", username);
        let mut request = self
            .http_client
            .post(self.endpoint("session"))
            .header("X-CSRF-Token", csrf_token)
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "csrf_token": csrf_token,
            }));
        if !cookies.is_empty() {
            request = request.header(COOKIE, cookies.join("; "));
        }

        let response = self.send(request, "Session token").await?;
        Self::handle_response(response, "session token").await
    }

    async fn authorization_code(
        &self,
        request: &AuthorizationCodeRequest,
    ) -> AuthResult<AuthorizationCodeResponse> {
        debug!("Requesting authorization code for client {}", request.client_id);
        let response = self
            .send(
                self.http_client.get(self.endpoint("authorize")).query(request),
                "Authorization code",
            )
            .await?;
        Self::handle_response(response, "authorization code").await
    }

    async fn access_token(
        &self,
        client_id: &str,
        auth_code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> AuthResult<TokenResponse> {
        debug!("Exchanging authorization code for tokens");
        let request = self.http_client.post(self.endpoint("token")).form(&[
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("code", auth_code),
            ("code_verifier", code_verifier),
            ("redirect_uri", redirect_uri),
        ]);
        let response = self.send(request, "Token exchange").await?;
        Self::handle_response(response, "token").await
    }

    async fn refresh_access_token(
        &self,
        request: &RefreshTokenRequest,
    ) -> AuthResult<TokenResponse> {
        debug!("Refreshing access token");
        let response = self
            .send(
                self.http_client.post(self.endpoint("token")).form(request),
                "Token refresh",
            )
            .await?;
        Self::handle_response(response, "token").await
    }

    async fn client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
        grant_type: &str,
        scope: &str,
    ) -> AuthResult<TokenResponse> {
        debug!("Authenticating with client credentials grant");
        let request = self
            .http_client
            .post(self.endpoint("token"))
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", grant_type), ("scope", scope)]);
        let response = self.send(request, "Client credentials").await?;
        Self::handle_response(response, "token").await
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_host() {
        assert!(matches!(
            HttpAuthProxy::new("not a url"),
            Err(AuthError::ConfigError(_))
        ));
        assert!(matches!(
            HttpAuthProxy::new("ftp://auth.example.com"),
            Err(AuthError::ConfigError(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let proxy = HttpAuthProxy::new("https://auth.example.com/oauth2/").unwrap();
        assert_eq!(proxy.base_url(), "https://auth.example.com/oauth2");
        assert_eq!(proxy.endpoint("token"), "https://auth.example.com/oauth2/token");
    }

    #[test]
    fn test_cookie_pair_strips_attributes() {
        assert_eq!(
            cookie_pair("sid=abc123; Path=/; HttpOnly").as_deref(),
            Some("sid=abc123")
        );
        assert_eq!(cookie_pair("garbage"), None);
    }

    #[test]
    fn test_refresh_request_omits_missing_tenant() {
        let request = RefreshTokenRequest {
            grant_type: "refresh_token".to_string(),
            scope: "openid".to_string(),
            refresh_token: "rt".to_string(),
            client_id: "id".to_string(),
            tenant: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("tenant").is_none());
        assert_eq!(body["client_id"], "id");
    }
}
