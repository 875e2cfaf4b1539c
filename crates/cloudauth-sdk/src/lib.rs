//! # cloudauth SDK
//!
//! Client-side OAuth 2.0 / OIDC token managers for cloud API calls.
//!
//! This crate provides:
//! - PKCE verifier/challenge generation (RFC 7636)
//! - [`AuthManager`] for the authorization code + PKCE, refresh token and
//!   client credentials flows, caching the token and renewing it shortly
//!   before expiry
//! - [`StorageManager`] for persisting tokens and redirect state
//! - [`SdkConfig`] to build a manager from `cloudauth.toml` and the environment
//!
//! ## Architecture
//!
//! - Managers talk to the identity provider through the [`AuthProxy`] trait;
//!   [`HttpAuthProxy`] is the `reqwest` implementation
//! - Storage backends implement [`StorageBackend`]
//! - Consumers depend on the [`AccessTokenProvider`] capability

pub mod auth;
pub mod client;
pub mod config;
pub mod storage;

pub use auth::{
    create_code_challenge, create_code_verifier, AccessTokenProvider, AuthContext, AuthError,
    AuthManager, AuthManagerSettings, AuthProxy, AuthResult, ClientCredentialsSettings, Flow,
    HttpAuthProxy, PkcePair, PkceSettings, RefreshSettings, ServerError, TokenResponse,
};
pub use client::AuthenticatedClient;
pub use config::{FlowKind, SdkConfig};
pub use storage::{
    CookieOptions, CookieStorage, LocalStorage, SessionStorage, StorageBackend, StorageManager,
};
