//! Per-flow manager configuration
//!
//! Settings are immutable once a manager is built. Each flow embeds the
//! common [`AuthManagerSettings`] and adds its own fields.

use super::types::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default grant type of the refresh flow
pub const REFRESH_GRANT_TYPE: &str = "refresh_token";

/// Default grant type of the client credentials flow
pub const CLIENT_CREDENTIALS_GRANT_TYPE: &str = "client_credentials";

/// Fail with `MissingField` when `value` is blank
pub(crate) fn require(field: &'static str, value: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingField { field });
    }
    Ok(())
}

/// Settings shared by every flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthManagerSettings {
    /// Base URL of the authorization/token endpoint
    pub host: String,
    /// Space-delimited OAuth scope string
    pub scope: String,
    /// OAuth client identifier
    pub client_id: String,
}

impl AuthManagerSettings {
    pub fn new(host: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scope: String::new(),
            client_id: client_id.into(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// `client_id` is required by every flow
    pub fn validate(&self) -> AuthResult<()> {
        require("client_id", &self.client_id)
    }
}

/// Authorization code + PKCE flow settings
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkceSettings {
    #[serde(flatten)]
    pub common: AuthManagerSettings,
    pub redirect_uri: String,
    pub username: String,
    pub password: String,
}

impl PkceSettings {
    pub fn new(
        common: AuthManagerSettings,
        redirect_uri: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            common,
            redirect_uri: redirect_uri.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> AuthResult<()> {
        self.common.validate()?;
        require("username", &self.username)?;
        require("password", &self.password)?;
        require("redirect_uri", &self.redirect_uri)
    }
}

impl fmt::Debug for PkceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceSettings")
            .field("common", &self.common)
            .field("redirect_uri", &self.redirect_uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Refresh token flow settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    #[serde(flatten)]
    pub common: AuthManagerSettings,
    pub grant_type: String,
    /// Initial refresh token; superseded by any token the server rotates in
    pub refresh_token: String,
    /// Optional tenant forwarded with refresh requests
    pub tenant: Option<String>,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            common: AuthManagerSettings::default(),
            grant_type: REFRESH_GRANT_TYPE.to_string(),
            refresh_token: String::new(),
            tenant: None,
        }
    }
}

impl RefreshSettings {
    pub fn new(common: AuthManagerSettings, refresh_token: impl Into<String>) -> Self {
        Self {
            common,
            refresh_token: refresh_token.into(),
            ..Default::default()
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Validate static fields; the refresh token itself is checked against
    /// the manager's current context since the server may rotate it.
    pub fn validate(&self) -> AuthResult<()> {
        self.common.validate()?;
        require("grant_type", &self.grant_type)
    }
}

impl fmt::Debug for RefreshSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshSettings")
            .field("common", &self.common)
            .field("grant_type", &self.grant_type)
            .field("refresh_token", &"<redacted>")
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// Client credentials flow settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientCredentialsSettings {
    #[serde(flatten)]
    pub common: AuthManagerSettings,
    pub client_secret: String,
    pub grant_type: String,
}

impl Default for ClientCredentialsSettings {
    fn default() -> Self {
        Self {
            common: AuthManagerSettings::default(),
            client_secret: String::new(),
            grant_type: CLIENT_CREDENTIALS_GRANT_TYPE.to_string(),
        }
    }
}

impl ClientCredentialsSettings {
    pub fn new(common: AuthManagerSettings, client_secret: impl Into<String>) -> Self {
        Self {
            common,
            client_secret: client_secret.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> AuthResult<()> {
        self.common.validate()?;
        require("client_secret", &self.client_secret)?;
        require("grant_type", &self.grant_type)
    }
}

impl fmt::Debug for ClientCredentialsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsSettings")
            .field("common", &self.common)
            .field("client_secret", &"<redacted>")
            .field("grant_type", &self.grant_type)
            .finish()
    }
}
