//! Token lifecycle management
//!
//! An [`AuthManager`] owns one [`AuthContext`] and one flow configuration.
//! `get_access_token` serves the cached token while it is outside the expiry
//! buffer and otherwise runs the flow's acquisition protocol, replacing the
//! whole context on success.
//!
//! Overlapping renewals are collapsed: the renewal runs under a per-manager
//! lock and callers that waited on it re-check the context before starting
//! their own network round trip.

use super::providers;
use super::proxy::{AuthProxy, HttpAuthProxy};
use super::settings::{
    require, AuthManagerSettings, ClientCredentialsSettings, PkceSettings, RefreshSettings,
};
use super::types::{now_millis, AuthContext, AuthResult, EXPIRY_BUFFER_MS};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Capability exposed to SDK consumers
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Valid access token, renewing it when stale
    async fn get_access_token(&self) -> AuthResult<String>;

    /// Whether the cached token is still nominally valid (no buffer)
    async fn is_authenticated(&self) -> bool;
}

/// The flow a manager runs, with its configuration
#[derive(Debug, Clone)]
pub enum Flow {
    Pkce(PkceSettings),
    Refresh(RefreshSettings),
    ClientCredentials(ClientCredentialsSettings),
}

impl Flow {
    /// Flow name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Flow::Pkce(_) => "pkce",
            Flow::Refresh(_) => "refresh",
            Flow::ClientCredentials(_) => "client_credentials",
        }
    }

    /// Settings common to every flow
    pub fn settings(&self) -> &AuthManagerSettings {
        match self {
            Flow::Pkce(s) => &s.common,
            Flow::Refresh(s) => &s.common,
            Flow::ClientCredentials(s) => &s.common,
        }
    }

    /// Check every field the flow needs before touching the network
    fn validate(&self, current: &AuthContext) -> AuthResult<()> {
        match self {
            Flow::Pkce(s) => s.validate(),
            Flow::ClientCredentials(s) => s.validate(),
            Flow::Refresh(s) => {
                s.validate()?;
                require(
                    "refresh_token",
                    providers::refresh::effective_refresh_token(s, current),
                )
            }
        }
    }

    async fn acquire(&self, proxy: &dyn AuthProxy, current: &AuthContext) -> AuthResult<AuthContext> {
        match self {
            Flow::Pkce(s) => providers::pkce::acquire(s, proxy).await,
            Flow::Refresh(s) => providers::refresh::acquire(s, proxy, current).await,
            Flow::ClientCredentials(s) => providers::client_credentials::acquire(s, proxy).await,
        }
    }
}

/// Whether `context` must be renewed at `now_ms` given the buffer
pub fn needs_renewal(context: &AuthContext, now_ms: i64, buffer_ms: i64) -> bool {
    !context.is_fresh_at(now_ms, buffer_ms)
}

/// Obtains, caches and renews access tokens for one flow
pub struct AuthManager {
    flow: Flow,
    proxy: Arc<dyn AuthProxy>,
    context: RwLock<AuthContext>,
    renewal: Mutex<()>,
    expiry_buffer_ms: i64,
}

impl AuthManager {
    /// Manager for the PKCE flow over HTTP
    pub fn pkce(settings: PkceSettings) -> AuthResult<Self> {
        let proxy = HttpAuthProxy::new(&settings.common.host)?;
        Ok(Self::with_proxy(Flow::Pkce(settings), Arc::new(proxy)))
    }

    /// Manager for the refresh token flow over HTTP
    pub fn refresh(settings: RefreshSettings) -> AuthResult<Self> {
        let proxy = HttpAuthProxy::new(&settings.common.host)?;
        Ok(Self::with_proxy(Flow::Refresh(settings), Arc::new(proxy)))
    }

    /// Manager for the client credentials flow over HTTP
    pub fn client_credentials(settings: ClientCredentialsSettings) -> AuthResult<Self> {
        let proxy = HttpAuthProxy::new(&settings.common.host)?;
        Ok(Self::with_proxy(Flow::ClientCredentials(settings), Arc::new(proxy)))
    }

    /// Manager for `flow` using a caller supplied transport
    pub fn with_proxy(flow: Flow, proxy: Arc<dyn AuthProxy>) -> Self {
        debug!("Creating {} auth manager via {} proxy", flow.name(), proxy.name());
        Self {
            flow,
            proxy,
            context: RwLock::new(AuthContext::default()),
            renewal: Mutex::new(()),
            expiry_buffer_ms: EXPIRY_BUFFER_MS,
        }
    }

    /// Override the 30 second renewal margin
    pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer_ms = i64::try_from(buffer.as_millis()).unwrap_or(i64::MAX);
        self
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    /// Get valid access token (renews when missing or inside the expiry buffer)
    pub async fn get_access_token(&self) -> AuthResult<String> {
        if let Some(token) = self.fresh_token().await {
            debug!("Using cached token");
            return Ok(token);
        }

        let current = self.context.read().await.clone();
        self.flow.validate(&current)?;

        let _renewal = self.renewal.lock().await;

        // A concurrent caller may have renewed while we waited for the lock
        if let Some(token) = self.fresh_token().await {
            debug!("Token renewed by concurrent caller");
            return Ok(token);
        }

        let current = self.context.read().await.clone();
        info!("Access token missing or expiring, running {} flow", self.flow.name());

        let renewed = match self.flow.acquire(self.proxy.as_ref(), &current).await {
            Ok(context) => context,
            Err(e) => {
                warn!("{} flow failed: {}", self.flow.name(), e);
                return Err(e);
            }
        };

        let token = renewed.access_token.clone();
        *self.context.write().await = renewed;
        Ok(token)
    }

    /// Token present and not past its expiration (no buffer applied)
    pub async fn is_authenticated(&self) -> bool {
        self.context.read().await.is_authenticated_at(now_millis())
    }

    /// `Authorization` header value for the current token, renewing if needed
    pub async fn authorization_header(&self) -> AuthResult<String> {
        let token = self.get_access_token().await?;
        let context = self.context.read().await;
        let token_type = if context.token_type.is_empty() {
            "Bearer"
        } else {
            context.token_type.as_str()
        };
        Ok(format!("{token_type} {token}"))
    }

    /// Snapshot of the current context
    pub async fn context(&self) -> AuthContext {
        self.context.read().await.clone()
    }

    /// Seed the context, e.g. from persisted storage
    pub async fn restore_context(&self, context: AuthContext) {
        debug!("Restoring {} auth context", self.flow.name());
        *self.context.write().await = context;
    }

    /// Forget cached tokens locally; nothing is revoked server side
    pub async fn sign_out(&self) {
        info!("Clearing {} auth context", self.flow.name());
        *self.context.write().await = AuthContext::default();
    }

    async fn fresh_token(&self) -> Option<String> {
        let context = self.context.read().await;
        if needs_renewal(&context, now_millis(), self.expiry_buffer_ms) {
            return None;
        }
        Some(context.access_token.clone())
    }
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("flow", &self.flow)
            .field("proxy", &self.proxy.name())
            .field("expiry_buffer_ms", &self.expiry_buffer_ms)
            .finish()
    }
}

#[async_trait]
impl AccessTokenProvider for AuthManager {
    async fn get_access_token(&self) -> AuthResult<String> {
        AuthManager::get_access_token(self).await
    }

    async fn is_authenticated(&self) -> bool {
        AuthManager::is_authenticated(self).await
    }
}
