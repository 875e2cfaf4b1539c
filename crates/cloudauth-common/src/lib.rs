//! Shared building blocks for the cloudauth crates
//!
//! - `config`: layered configuration loading (defaults, TOML file, environment)
//! - `logging`: tracing subscriber initialisation honouring CLI verbosity

pub mod config;
pub mod logging;

pub use config::{ConfigLoader, ConfigurationError};
