//! Configuration inspection handlers

use crate::cli::commands::ConfigAction;
use crate::error::{CliError, Result};
use crate::output::json_output;
use cloudauth_sdk::SdkConfig;
use std::path::Path;

/// Handle `config` subcommands
pub fn handle_config(action: ConfigAction, config_path: Option<&Path>, json: bool) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = SdkConfig::load(config_path)?.redacted();
            if json {
                return json_output(&config);
            }
            print!("{}", render_toml(&config)?);
        }
        ConfigAction::Example => print!("{}", SdkConfig::generate_example()?),
    }
    Ok(())
}

fn render_toml(config: &SdkConfig) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| CliError::internal(format!("Failed to render configuration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_show_reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\nclient_id = \"from-file\"").unwrap();

        assert!(handle_config(ConfigAction::Show, Some(file.path()), true).is_ok());
    }

    #[test]
    fn test_show_missing_file_fails() {
        let result = handle_config(
            ConfigAction::Show,
            Some(Path::new("/nonexistent/cloudauth.toml")),
            false,
        );
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_rendered_config_hides_secrets() {
        let mut config = SdkConfig::default();
        config.client_credentials.client_secret = "s3cr3t".to_string();

        let rendered = render_toml(&config.redacted()).unwrap();
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("s3cr3t"));
    }
}
