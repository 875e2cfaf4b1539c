//! OAuth 2.0 refresh token grant
//!
//! The refresh token sent is the most recent one the server issued, falling
//! back to the configured one. Servers that do not rotate refresh tokens
//! leave the previous one in place.

use crate::auth::{
    proxy::{AuthProxy, RefreshTokenRequest},
    settings::{require, RefreshSettings},
    types::{now_millis, AuthContext, AuthResult},
};
use tracing::{debug, info};

/// Refresh token to present for the next renewal
pub fn effective_refresh_token<'a>(settings: &'a RefreshSettings, current: &'a AuthContext) -> &'a str {
    current
        .refresh_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .unwrap_or(&settings.refresh_token)
}

/// Redeem the current refresh token for a new access token
pub async fn acquire(
    settings: &RefreshSettings,
    proxy: &dyn AuthProxy,
    current: &AuthContext,
) -> AuthResult<AuthContext> {
    let refresh_token = effective_refresh_token(settings, current);
    require("refresh_token", refresh_token)?;

    debug!(
        "Refreshing access token for client {}",
        settings.common.client_id
    );

    let request = RefreshTokenRequest {
        grant_type: settings.grant_type.clone(),
        scope: settings.common.scope.clone(),
        refresh_token: refresh_token.to_string(),
        client_id: settings.common.client_id.clone(),
        tenant: settings.tenant.clone(),
    };
    let response = proxy.refresh_access_token(&request).await?;

    let mut context = AuthContext::from_token_response(response, now_millis())?;
    if context.refresh_token.is_none() {
        context.refresh_token = Some(request.refresh_token);
    }

    info!("Token refresh completed successfully");
    Ok(context)
}
