//! Authentication module for the cloudauth SDK
//!
//! This module provides OAuth 2.0 token management including:
//! - PKCE (Proof Key for Code Exchange) helpers
//! - Authorization code + PKCE, refresh token and client credentials flows
//! - Token caching with proactive renewal before expiry

pub mod manager;
pub mod pkce;
pub mod providers;
pub mod proxy;
pub mod settings;
pub mod types;

// Re-export commonly used types and functions
pub use manager::{AccessTokenProvider, AuthManager, Flow};
pub use pkce::{create_code_challenge, create_code_verifier, PkcePair};
pub use proxy::{AuthProxy, HttpAuthProxy};
pub use settings::{AuthManagerSettings, ClientCredentialsSettings, PkceSettings, RefreshSettings};
pub use types::{AuthContext, AuthError, AuthResult, ServerError, TokenResponse};
