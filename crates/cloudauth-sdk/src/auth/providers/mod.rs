//! Flow-specific token acquisition protocols
//!
//! Each protocol takes its settings, the proxy and the manager's current
//! context, and yields the replacement context. None of them touch the
//! manager state themselves.

pub mod client_credentials;
pub mod pkce;
pub mod refresh;
