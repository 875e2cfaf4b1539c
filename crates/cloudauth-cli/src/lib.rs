//! # cloudauth CLI
//!
//! Command-line front end for the cloudauth SDK.
//!
//! - `token` obtains an access token for the configured flow
//! - `pkce` prints a fresh code verifier and challenge
//! - `config` shows the effective configuration or an example file
//!
//! Configuration is read from `cloudauth.toml` (or `--config`) with
//! `CLOUDAUTH_*` environment overrides.

pub mod cli;
pub mod error;
pub mod output;

pub use cli::*;
pub use error::*;
