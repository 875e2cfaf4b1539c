//! OAuth 2.0 client credentials grant
//!
//! Machine-to-machine authentication: one call to the token endpoint,
//! authenticated with the client secret. No refresh token is involved.

use crate::auth::{
    proxy::AuthProxy,
    settings::ClientCredentialsSettings,
    types::{now_millis, AuthContext, AuthResult},
};
use tracing::{debug, info};

/// Request a new token with the configured client credentials
pub async fn acquire(
    settings: &ClientCredentialsSettings,
    proxy: &dyn AuthProxy,
) -> AuthResult<AuthContext> {
    debug!(
        "Requesting client credentials token for client {}",
        settings.common.client_id
    );

    let response = proxy
        .client_credentials(
            &settings.common.client_id,
            &settings.client_secret,
            &settings.grant_type,
            &settings.common.scope,
        )
        .await?;

    let context = AuthContext::from_token_response(response, now_millis())?;
    info!("Successfully authenticated with client credentials");
    Ok(context)
}
