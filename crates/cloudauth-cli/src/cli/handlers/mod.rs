//! Command handlers for the cloudauth CLI

pub mod config;
pub mod pkce;
pub mod token;
