//! Token acquisition handler

use crate::error::Result;
use crate::output::{json_output, print_info, print_success};
use chrono::{DateTime, TimeZone, Utc};
use cloudauth_sdk::{
    storage::LocalStorage, AuthContext, AuthManager, FlowKind, SdkConfig, StorageManager,
};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Key the context is cached under
const CONTEXT_KEY: &str = "context";

/// Options of the `token` command
#[derive(Debug, Clone, Default)]
pub struct TokenOptions {
    pub flow: Option<FlowKind>,
    pub header: bool,
    pub cache: bool,
    pub fresh: bool,
    pub json: bool,
}

/// Token details printed with `--json`
#[derive(Debug, Serialize)]
pub struct TokenReport {
    pub flow: &'static str,
    pub token_type: String,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenReport {
    pub fn new(flow: &'static str, context: &AuthContext) -> Self {
        Self {
            flow,
            token_type: context.token_type.clone(),
            access_token: context.access_token.clone(),
            expires_at: Utc.timestamp_millis_opt(context.token_expiration).single(),
            scope: context.scope.clone(),
        }
    }
}

/// Storage namespace for a flow/client pair
pub fn cache_namespace(config: &SdkConfig) -> String {
    let flow = config.flow();
    format!("token-{}-{}", flow.name(), config.auth.client_id)
}

/// Handle the `token` command
pub async fn handle_token(config_path: Option<&Path>, options: TokenOptions) -> Result<()> {
    let mut config = SdkConfig::load(config_path)?;
    if let Some(flow) = options.flow {
        config.flow = flow;
    }

    let manager = config.build_manager()?;
    let storage = if options.cache {
        Some(StorageManager::local(
            cache_namespace(&config),
            LocalStorage::default_dir()?,
        ))
    } else {
        None
    };

    if let Some(storage) = &storage {
        restore(storage, &manager, options.fresh).await?;
    }

    let header = manager.authorization_header().await?;
    let context = manager.context().await;

    if let Some(storage) = &storage {
        storage.add(CONTEXT_KEY, &context).await?;
        debug!("Cached token in namespace {}", storage.namespace());
    }

    if options.json {
        return json_output(&TokenReport::new(manager.flow().name(), &context));
    }

    if options.header {
        println!("{header}");
    } else {
        println!("{}", context.access_token);
    }

    if let Some(expires_at) = Utc.timestamp_millis_opt(context.token_expiration).single() {
        print_info(&format!(
            "Token expires at {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    Ok(())
}

async fn restore(storage: &StorageManager, manager: &AuthManager, fresh: bool) -> Result<()> {
    if fresh {
        storage.delete().await?;
        print_success("Cleared cached token");
        return Ok(());
    }

    if let Some(context) = storage.get::<AuthContext>(CONTEXT_KEY).await? {
        debug!("Restoring cached token from {}", storage.namespace());
        manager.restore_context(context).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudauth_sdk::AuthManagerSettings;

    #[test]
    fn test_report_from_context() {
        let context = AuthContext {
            access_token: "abc".to_string(),
            token_type: "Bearer".to_string(),
            token_expiration: 1_700_000_000_000,
            scope: Some("openid".to_string()),
            ..Default::default()
        };

        let report = TokenReport::new("refresh", &context);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["flow"], "refresh");
        assert_eq!(json["access_token"], "abc");
        assert_eq!(json["expires_at"], "2023-11-14T22:13:20Z");
        assert_eq!(json["scope"], "openid");
    }

    #[test]
    fn test_cache_namespace_per_flow_and_client() {
        let mut config = SdkConfig {
            auth: AuthManagerSettings::new("https://auth.example.com", "cli-app"),
            ..Default::default()
        };
        assert_eq!(cache_namespace(&config), "token-client_credentials-cli-app");

        config.flow = FlowKind::Pkce;
        assert_eq!(cache_namespace(&config), "token-pkce-cli-app");
    }

    #[tokio::test]
    async fn test_restore_seeds_manager() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = StorageManager::local("tokens", dir.path());
        let context = AuthContext {
            access_token: "cached".to_string(),
            token_type: "Bearer".to_string(),
            token_expiration: Utc::now().timestamp_millis() + 3_600_000,
            ..Default::default()
        };
        storage.add(CONTEXT_KEY, &context).await.unwrap();

        let config = SdkConfig {
            auth: AuthManagerSettings::new("https://auth.example.com", "cli-app"),
            ..Default::default()
        };
        let manager = config.build_manager().unwrap();
        restore(&storage, &manager, false).await.unwrap();

        assert_eq!(manager.get_access_token().await.unwrap(), "cached");

        restore(&storage, &manager, true).await.unwrap();
        assert_eq!(storage.get::<AuthContext>(CONTEXT_KEY).await.unwrap(), None);
    }
}
