use crate::cli::{commands::Commands, handlers};
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{OffLevel, Verbosity};
use std::path::PathBuf;

/// cloudauth CLI - OAuth access tokens for cloud APIs
#[derive(Parser, Debug)]
#[command(
    name = "cloudauth",
    version,
    about = "cloudauth CLI - OAuth access tokens for cloud APIs",
    long_about = "Obtain, cache and inspect OAuth 2.0 access tokens.

QUICK START:
  cloudauth config example > cloudauth.toml   # Write a starting configuration
  cloudauth token                             # Print an access token
  cloudauth token --header                    # Print an Authorization header value

FLOWS:
  cloudauth token --flow client-credentials   # Client id + secret
  cloudauth token --flow refresh              # Redeem a refresh token
  cloudauth token --flow pkce                 # Username/password via the auth proxy

UTILITIES:
  cloudauth pkce --length 64                  # Generate a verifier/challenge pair
  cloudauth config show                       # Show effective configuration"
)]
pub struct Args {
    /// Configuration file path (defaults to ./cloudauth.toml when present)
    #[arg(short, long, global = true, env = "CLOUDAUTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit log events as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<OffLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config_path = self.config.as_deref();

        match self.command {
            Commands::Token {
                flow,
                header,
                cache,
                fresh,
            } => {
                let options = handlers::token::TokenOptions {
                    flow: flow.map(Into::into),
                    header,
                    cache,
                    fresh,
                    json: self.json,
                };
                handlers::token::handle_token(config_path, options).await
            }
            Commands::Pkce { length } => handlers::pkce::handle_pkce(length, self.json),
            Commands::Config { action } => {
                handlers::config::handle_config(action, config_path, self.json)
            }
        }
    }
}
