//! File and environment configuration for building managers
//!
//! Values are layered: defaults, then `cloudauth.toml` (or an explicit path),
//! then `CLOUDAUTH_*` environment variables with `__` separating sections,
//! e.g. `CLOUDAUTH_AUTH__CLIENT_ID` or `CLOUDAUTH_HTTP__TIMEOUT_SECS`.

use crate::auth::{
    manager::{AuthManager, Flow},
    proxy::HttpAuthProxy,
    settings::{
        AuthManagerSettings, ClientCredentialsSettings, PkceSettings, RefreshSettings,
        CLIENT_CREDENTIALS_GRANT_TYPE, REFRESH_GRANT_TYPE,
    },
    types::{AuthError, AuthResult, EXPIRY_BUFFER_MS},
};
use cloudauth_common::config::{extract, layered, with_env_overrides, ConfigLoader};
use cloudauth_common::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// File read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cloudauth.toml";

/// Prefix of overriding environment variables
pub const ENV_PREFIX: &str = "CLOUDAUTH_";

const REDACTED: &str = "<redacted>";

/// Which flow [`SdkConfig::build_manager`] builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Pkce,
    Refresh,
    #[default]
    ClientCredentials,
}

/// PKCE specific values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkceConfig {
    pub redirect_uri: String,
    pub username: String,
    pub password: String,
}

/// Refresh token specific values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub grant_type: String,
    pub refresh_token: String,
    pub tenant: Option<String>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            grant_type: REFRESH_GRANT_TYPE.to_string(),
            refresh_token: String::new(),
            tenant: None,
        }
    }
}

/// Client credentials specific values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientCredentialsConfig {
    pub client_secret: String,
    pub grant_type: String,
}

impl Default for ClientCredentialsConfig {
    fn default() -> Self {
        Self {
            client_secret: String::new(),
            grant_type: CLIENT_CREDENTIALS_GRANT_TYPE.to_string(),
        }
    }
}

/// Transport settings for [`HttpAuthProxy`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout; unset means no timeout
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Root configuration of the SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Flow to run
    pub flow: FlowKind,

    /// Renewal margin before token expiry, in milliseconds
    pub expiry_buffer_ms: i64,

    /// Settings shared by every flow
    pub auth: AuthManagerSettings,

    pub pkce: PkceConfig,

    pub refresh: RefreshConfig,

    pub client_credentials: ClientCredentialsConfig,

    pub http: HttpConfig,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            flow: FlowKind::default(),
            expiry_buffer_ms: EXPIRY_BUFFER_MS,
            auth: AuthManagerSettings::default(),
            pkce: PkceConfig::default(),
            refresh: RefreshConfig::default(),
            client_credentials: ClientCredentialsConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl SdkConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigurationError> {
        match config_path {
            Some(path) => <SdkConfig as ConfigLoader<SdkConfig>>::load_from_file(path),
            None => <SdkConfig as ConfigLoader<SdkConfig>>::load(None),
        }
    }

    /// Generate example configuration file
    pub fn generate_example() -> Result<String, ConfigurationError> {
        let config = Self {
            auth: AuthManagerSettings::new("https://auth.example.com/oauth2", "my-client-id")
                .with_scope("openid profile"),
            ..Default::default()
        };
        toml::to_string_pretty(&config).map_err(|e| ConfigurationError::ParseError {
            details: format!("Failed to serialize config: {e}"),
        })
    }

    /// Copy with every secret replaced, for display
    pub fn redacted(&self) -> Self {
        fn hide(value: &mut String) {
            if !value.is_empty() {
                *value = REDACTED.to_string();
            }
        }

        let mut config = self.clone();
        hide(&mut config.pkce.password);
        hide(&mut config.refresh.refresh_token);
        hide(&mut config.client_credentials.client_secret);
        config
    }

    pub fn expiry_buffer(&self) -> AuthResult<Duration> {
        u64::try_from(self.expiry_buffer_ms)
            .map(Duration::from_millis)
            .map_err(|_| {
                AuthError::ConfigError(format!(
                    "expiry_buffer_ms must not be negative, got {}",
                    self.expiry_buffer_ms
                ))
            })
    }

    /// Flow settings assembled from the shared and flow specific sections
    pub fn flow(&self) -> Flow {
        let common = self.auth.clone();
        match self.flow {
            FlowKind::Pkce => Flow::Pkce(PkceSettings::new(
                common,
                self.pkce.redirect_uri.clone(),
                self.pkce.username.clone(),
                self.pkce.password.clone(),
            )),
            FlowKind::Refresh => Flow::Refresh(RefreshSettings {
                common,
                grant_type: self.refresh.grant_type.clone(),
                refresh_token: self.refresh.refresh_token.clone(),
                tenant: self.refresh.tenant.clone(),
            }),
            FlowKind::ClientCredentials => {
                Flow::ClientCredentials(ClientCredentialsSettings {
                    common,
                    client_secret: self.client_credentials.client_secret.clone(),
                    grant_type: self.client_credentials.grant_type.clone(),
                })
            }
        }
    }

    /// Manager for the configured flow over HTTP
    pub fn build_manager(&self) -> AuthResult<AuthManager> {
        let buffer = self.expiry_buffer()?;
        let proxy = HttpAuthProxy::with_timeout(&self.auth.host, self.http.timeout())?;
        debug!("Building {:?} manager for {}", self.flow, proxy.base_url());

        Ok(AuthManager::with_proxy(self.flow(), Arc::new(proxy)).with_expiry_buffer(buffer))
    }
}

impl ConfigLoader<SdkConfig> for SdkConfig {
    fn load(path: Option<PathBuf>) -> Result<SdkConfig, ConfigurationError> {
        let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        extract(layered(&SdkConfig::default(), &path, ENV_PREFIX))
    }

    fn load_from_file(path: &Path) -> Result<SdkConfig, ConfigurationError> {
        if !path.exists() {
            return Err(ConfigurationError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        extract(layered(&SdkConfig::default(), path, ENV_PREFIX))
    }

    fn apply_env_overrides(config: &mut SdkConfig, prefix: &str) -> Result<(), ConfigurationError> {
        *config = with_env_overrides(config, prefix)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SdkConfig::default();
        assert_eq!(config.flow, FlowKind::ClientCredentials);
        assert_eq!(config.expiry_buffer_ms, 30_000);
        assert_eq!(config.refresh.grant_type, "refresh_token");
        assert_eq!(config.client_credentials.grant_type, "client_credentials");
        assert_eq!(config.http.timeout(), None);
    }

    #[test]
    fn test_example_round_trips() {
        let example = SdkConfig::generate_example().unwrap();
        let parsed: SdkConfig = toml::from_str(&example).unwrap();

        assert_eq!(parsed.auth.client_id, "my-client-id");
        assert_eq!(parsed.flow, FlowKind::ClientCredentials);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
flow = "refresh"
expiry_buffer_ms = 5000

[auth]
host = "https://auth.example.com"
client_id = "cli"
scope = "offline_access"

[refresh]
refresh_token = "rt-from-file"
tenant = "acme"

[http]
timeout_secs = 10
"#
        )
        .unwrap();

        let config = SdkConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.flow, FlowKind::Refresh);
        assert_eq!(config.auth.scope, "offline_access");
        assert_eq!(config.refresh.grant_type, "refresh_token");
        assert_eq!(config.http.timeout(), Some(Duration::from_secs(10)));

        match config.flow() {
            Flow::Refresh(settings) => {
                assert_eq!(settings.common.client_id, "cli");
                assert_eq!(settings.refresh_token, "rt-from-file");
                assert_eq!(settings.tenant.as_deref(), Some("acme"));
            }
            other => panic!("unexpected flow {}", other.name()),
        }

        let manager = config.build_manager().unwrap();
        assert_eq!(manager.flow().name(), "refresh");
    }

    #[test]
    fn test_explicit_missing_file() {
        let result = SdkConfig::load(Some(Path::new("/nonexistent/cloudauth.toml")));
        assert!(matches!(
            result,
            Err(ConfigurationError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut config = SdkConfig::default();
        config.pkce.password = "hunter2".to_string();
        config.client_credentials.client_secret = "s3cr3t".to_string();

        let shown = toml::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("s3cr3t"));
        assert_eq!(config.redacted().refresh.refresh_token, "");
    }

    #[test]
    fn test_negative_buffer_rejected() {
        let config = SdkConfig {
            expiry_buffer_ms: -1,
            auth: AuthManagerSettings::new("https://auth.example.com", "cli"),
            ..Default::default()
        };
        assert!(matches!(
            config.build_manager(),
            Err(AuthError::ConfigError(_))
        ));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let config = SdkConfig::default();
        assert!(matches!(
            config.build_manager(),
            Err(AuthError::ConfigError(_))
        ));
    }
}
