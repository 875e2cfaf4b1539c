use clap::{Subcommand, ValueEnum};
use cloudauth_sdk::{auth::pkce::DEFAULT_VERIFIER_LENGTH, FlowKind};

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Obtain an access token for the configured flow
    Token {
        /// Flow to run instead of the configured one
        #[arg(long, value_enum)]
        flow: Option<FlowArg>,

        /// Print an Authorization header value instead of the bare token
        #[arg(long)]
        header: bool,

        /// Reuse and persist the token in local storage between runs
        #[arg(long)]
        cache: bool,

        /// Drop any cached token before authenticating
        #[arg(long, requires = "cache")]
        fresh: bool,
    },

    /// Generate a PKCE code verifier and its S256 challenge
    Pkce {
        /// Random bytes of entropy in the verifier (43-128)
        #[arg(short, long, default_value_t = DEFAULT_VERIFIER_LENGTH)]
        length: usize,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration with secrets redacted
    Show,

    /// Print an example configuration file
    Example,
}

/// Flow names accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowArg {
    Pkce,
    Refresh,
    ClientCredentials,
}

impl From<FlowArg> for FlowKind {
    fn from(flow: FlowArg) -> Self {
        match flow {
            FlowArg::Pkce => FlowKind::Pkce,
            FlowArg::Refresh => FlowKind::Refresh,
            FlowArg::ClientCredentials => FlowKind::ClientCredentials,
        }
    }
}
