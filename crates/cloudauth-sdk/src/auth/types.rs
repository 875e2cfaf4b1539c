//! Authentication-related types and data structures
//!
//! This module defines the token cache held by each manager, the raw token
//! endpoint response, and the error type shared by the whole SDK.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Margin before expiry at which a cached token is proactively renewed
pub const EXPIRY_BUFFER_MS: i64 = 30_000;

/// Lifetime assumed when a token response carries neither `expires_in` nor a JWT `exp`
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Error payload mirrored from an authorization server response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    /// Human readable message
    pub message: String,
    /// Server error code (`error` / `code` field)
    pub code: Option<String>,
    /// HTTP status of the failed response
    pub http_status_code: Option<u16>,
    /// Structured details, passed through untouched
    pub details: Option<Value>,
    /// Link or hint for further information
    pub more_info: Option<String>,
}

impl ServerError {
    /// Build from a response status and raw body.
    ///
    /// Understands both OAuth style (`error`, `error_description`) and
    /// API style (`code`, `message`, `details`, `moreInfo`) payloads. A body
    /// that is not JSON becomes the message verbatim.
    pub fn from_payload(http_status_code: Option<u16>, body: &str) -> Self {
        let payload: Value = serde_json::from_str(body).unwrap_or(Value::Null);

        let code = str_field(&payload, &["code", "error", "errorCode"]);
        let message = str_field(&payload, &["message", "error_description", "errorSummary"])
            .or_else(|| code.clone())
            .unwrap_or_else(|| match (body.trim(), http_status_code) {
                ("", Some(status)) => format!("HTTP {status}"),
                ("", None) => "Unknown error".to_string(),
                (text, _) => text.to_string(),
            });

        Self {
            message,
            code,
            http_status_code,
            details: payload.get("details").cloned(),
            more_info: str_field(&payload, &["moreInfo", "more_info"]),
        }
    }
}

/// First string-valued field among `names`
fn str_field(payload: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| payload.get(*name).and_then(Value::as_str))
        .map(str::to_string)
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        if let Some(status) = self.http_status_code {
            write!(f, " [HTTP {status}]")?;
        }
        Ok(())
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required setting is blank or absent
    #[error("Missing required setting: {field}")]
    MissingField { field: &'static str },

    /// No verifier length was supplied
    #[error("Code verifier length is required")]
    MissingVerifierLength,

    /// Verifier length outside RFC 7636 bounds
    #[error("Code verifier length must be between 43 and 128, got {0}")]
    InvalidVerifierLength(usize),

    /// Transport failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Non-success response from the authorization server
    #[error("Server error: {0}")]
    Server(ServerError),

    /// Token response without an access token
    #[error("No access_token in response{}", .code.as_ref().map(|c| format!(" (code: {c})")).unwrap_or_default())]
    MissingAccessToken { code: Option<String> },

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AuthError {
    /// Server-supplied error code, when one was returned
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Server(err) => err.code.as_deref(),
            Self::MissingAccessToken { code } => code.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of the failed response, when the failure came from one
    pub fn http_status_code(&self) -> Option<u16> {
        match self {
            Self::Server(err) => err.http_status_code,
            _ => None,
        }
    }

    /// Name of the missing setting for configuration failures
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field } => Some(*field),
            _ => None,
        }
    }
}

impl From<cloudauth_common::ConfigurationError> for AuthError {
    fn from(err: cloudauth_common::ConfigurationError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Token endpoint response as returned on the wire
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// OAuth error code, some servers answer 200 with an error body
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("error", &self.error)
            .finish()
    }
}

/// Token state held by one manager.
///
/// A non-empty `access_token` always comes with the `token_expiration`
/// computed from the same response: the struct is only ever replaced whole.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Bearer credential, empty until the first successful authentication
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    /// Milliseconds since the Unix epoch, 0 when never authenticated
    pub token_expiration: i64,
    pub token_type: String,
}

impl AuthContext {
    /// Build a context from a token response received at `now_ms`.
    ///
    /// Fails when the response carries no access token, keeping any error
    /// code the server supplied.
    pub fn from_token_response(response: TokenResponse, now_ms: i64) -> AuthResult<Self> {
        let access_token = match response.access_token {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(AuthError::MissingAccessToken {
                    code: response.error,
                })
            }
        };

        // Server supplied values saturate instead of wrapping into the past
        let token_expiration = match response.expires_in {
            Some(seconds) => now_ms.saturating_add(secs_to_millis(seconds)),
            None => match decode_jwt_exp(&access_token) {
                Some(exp) => exp.saturating_mul(1000),
                None => now_ms.saturating_add(secs_to_millis(DEFAULT_TOKEN_LIFETIME_SECS)),
            },
        };

        Ok(Self {
            access_token,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            scope: response.scope,
            // An already-expired JWT still marks the context as authenticated once
            token_expiration: token_expiration.max(1),
            token_type: response
                .token_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Bearer".to_string()),
        })
    }

    /// Token present and not yet expired at `now_ms`
    pub fn is_authenticated_at(&self, now_ms: i64) -> bool {
        !self.access_token.is_empty() && self.token_expiration > now_ms
    }

    /// Token present and valid beyond `now_ms + buffer_ms`
    pub fn is_fresh_at(&self, now_ms: i64, buffer_ms: i64) -> bool {
        !self.access_token.is_empty() && self.token_expiration > now_ms.saturating_add(buffer_ms)
    }

    /// Milliseconds left before expiry, `None` when unauthenticated
    pub fn remaining_millis(&self, now_ms: i64) -> Option<i64> {
        if self.access_token.is_empty() {
            return None;
        }
        Some(self.token_expiration.saturating_sub(now_ms).max(0))
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |present: bool| if present { "<redacted>" } else { "<none>" };
        f.debug_struct("AuthContext")
            .field("access_token", &redact(!self.access_token.is_empty()))
            .field("id_token", &redact(self.id_token.is_some()))
            .field("refresh_token", &redact(self.refresh_token.is_some()))
            .field("scope", &self.scope)
            .field("token_expiration", &self.token_expiration)
            .field("token_type", &self.token_type)
            .finish()
    }
}

fn secs_to_millis(seconds: u64) -> i64 {
    i64::try_from(seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000)
}

/// Extract the `exp` claim (seconds) from a JWT without verifying it
pub fn decode_jwt_exp(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('=').as_bytes())
        .ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    claims.get("exp")?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp }).to_string());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn test_context_from_response_uses_expires_in_millis() {
        let response = TokenResponse {
            access_token: Some("abc".to_string()),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
            refresh_token: Some("rt".to_string()),
            scope: Some("read write".to_string()),
            ..Default::default()
        };

        let ctx = AuthContext::from_token_response(response, 1_000).unwrap();
        assert_eq!(ctx.access_token, "abc");
        assert_eq!(ctx.token_expiration, 1_000 + 3_600_000);
        assert_eq!(ctx.refresh_token.as_deref(), Some("rt"));
        assert_eq!(ctx.scope.as_deref(), Some("read write"));
        assert_eq!(ctx.token_type, "Bearer");
    }

    #[test]
    fn test_context_from_response_without_token_keeps_code() {
        let response = TokenResponse {
            error: Some("invalid_grant".to_string()),
            ..Default::default()
        };

        let err = AuthContext::from_token_response(response, 0).unwrap_err();
        assert!(matches!(err, AuthError::MissingAccessToken { .. }));
        assert_eq!(err.code(), Some("invalid_grant"));
    }

    #[test]
    fn test_context_falls_back_to_jwt_exp() {
        let now = 1_700_000_000_000;
        let response = TokenResponse {
            access_token: Some(jwt_with_exp(1_700_000_600)),
            ..Default::default()
        };

        let ctx = AuthContext::from_token_response(response, now).unwrap();
        assert_eq!(ctx.token_expiration, 1_700_000_600_000);
        assert_eq!(ctx.token_type, "Bearer");
    }

    #[test]
    fn test_context_falls_back_to_default_lifetime() {
        let response = TokenResponse {
            access_token: Some("opaque".to_string()),
            ..Default::default()
        };

        let ctx = AuthContext::from_token_response(response, 10).unwrap();
        assert_eq!(ctx.token_expiration, 10 + DEFAULT_TOKEN_LIFETIME_SECS as i64 * 1000);
    }

    #[test]
    fn test_huge_lifetimes_saturate() {
        let now = 1_700_000_000_000;
        let response = TokenResponse {
            access_token: Some("abc".to_string()),
            expires_in: Some(10_u64.pow(16)),
            ..Default::default()
        };
        let ctx = AuthContext::from_token_response(response, now).unwrap();
        assert_eq!(ctx.token_expiration, i64::MAX);
        assert!(ctx.is_fresh_at(now, EXPIRY_BUFFER_MS));

        let response = TokenResponse {
            access_token: Some("abc".to_string()),
            expires_in: Some(u64::MAX),
            ..Default::default()
        };
        let ctx = AuthContext::from_token_response(response, now).unwrap();
        assert_eq!(ctx.token_expiration, i64::MAX);

        let response = TokenResponse {
            access_token: Some(jwt_with_exp(i64::MAX / 10)),
            ..Default::default()
        };
        let ctx = AuthContext::from_token_response(response, now).unwrap();
        assert_eq!(ctx.token_expiration, i64::MAX);
    }

    #[test]
    fn test_is_authenticated_boundaries() {
        let now = 5_000_000;
        let mut ctx = AuthContext {
            access_token: "token".to_string(),
            token_expiration: now + 1,
            ..Default::default()
        };
        assert!(ctx.is_authenticated_at(now));

        ctx.token_expiration = now;
        assert!(!ctx.is_authenticated_at(now));

        ctx.token_expiration = now - 1;
        assert!(!ctx.is_authenticated_at(now));

        ctx.token_expiration = now + 999_999;
        ctx.access_token.clear();
        assert!(!ctx.is_authenticated_at(now));
    }

    #[test]
    fn test_freshness_respects_buffer() {
        let now = 1_000_000;
        let ctx = AuthContext {
            access_token: "token".to_string(),
            token_expiration: now + EXPIRY_BUFFER_MS,
            ..Default::default()
        };

        // Nominally valid, but inside the renewal window
        assert!(ctx.is_authenticated_at(now));
        assert!(!ctx.is_fresh_at(now, EXPIRY_BUFFER_MS));
        assert!(ctx.is_fresh_at(now - 1, EXPIRY_BUFFER_MS));
    }

    #[test]
    fn test_server_error_from_oauth_payload() {
        let body = r#"{"error":"invalid_client","error_description":"Client authentication failed"}"#;
        let err = ServerError::from_payload(Some(401), body);

        assert_eq!(err.code.as_deref(), Some("invalid_client"));
        assert_eq!(err.message, "Client authentication failed");
        assert_eq!(err.http_status_code, Some(401));
    }

    #[test]
    fn test_server_error_from_api_payload() {
        let body = json!({
            "code": "E0000004",
            "message": "Authentication failed",
            "details": [{"field": "password"}],
            "moreInfo": "https://docs.example.com/errors/E0000004"
        })
        .to_string();
        let err = ServerError::from_payload(Some(403), &body);

        assert_eq!(err.code.as_deref(), Some("E0000004"));
        assert_eq!(err.details, Some(json!([{"field": "password"}])));
        assert_eq!(
            err.more_info.as_deref(),
            Some("https://docs.example.com/errors/E0000004")
        );

        let auth_err = AuthError::Server(err);
        assert_eq!(auth_err.code(), Some("E0000004"));
        assert_eq!(auth_err.http_status_code(), Some(403));
    }

    #[test]
    fn test_server_error_from_plain_body() {
        let err = ServerError::from_payload(Some(502), "Bad Gateway");
        assert_eq!(err.message, "Bad Gateway");
        assert!(err.code.is_none());

        let err = ServerError::from_payload(Some(500), "");
        assert_eq!(err.message, "HTTP 500");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let ctx = AuthContext {
            access_token: "super-secret".to_string(),
            refresh_token: Some("also-secret".to_string()),
            token_expiration: 1,
            ..Default::default()
        };
        let printed = format!("{ctx:?}");
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("also-secret"));
    }

    #[test]
    fn test_decode_jwt_exp_rejects_non_jwt() {
        assert_eq!(decode_jwt_exp("not-a-jwt"), None);
        assert_eq!(decode_jwt_exp("a.b.c.d"), None);
        assert_eq!(decode_jwt_exp(&jwt_with_exp(42)), Some(42));
    }
}
