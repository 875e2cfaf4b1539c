//! Main entry point for the cloudauth CLI

use clap::Parser;
use clap_verbosity_flag::LevelFilter;
use cloudauth_cli::cli::Args;
use cloudauth_common::logging::{self, LogFormat};
use color_eyre::eyre::{eyre, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Disable location display (file paths and line numbers)
    color_eyre::config::HookBuilder::default()
        .display_location_section(false)
        .display_env_section(false)
        .install()?;

    match args.verbosity.log_level_filter() {
        LevelFilter::Off | LevelFilter::Error => {}
        _ => {
            std::env::set_var("RUST_LIB_BACKTRACE", "1");
        }
    }

    // Silent unless -v or RUST_LOG asks for events; stdout stays scriptable
    let binary_name = env!("CARGO_BIN_NAME").replace('-', "_");
    let default_filter = format!("{binary_name}=info,cloudauth_sdk=info");
    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logging::init_cli_logging(&args.verbosity, &default_filter, format)
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    Ok(args.run().await?)
}
