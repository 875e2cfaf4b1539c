//! Authorization code flow with PKCE, driven through the auth proxy
//!
//! 1. CSRF token and session cookies
//! 2. Username/password exchanged for a session token
//! 3. Fresh code verifier and challenge
//! 4. Session token and challenge exchanged for an authorization code
//! 5. Authorization code and verifier exchanged for tokens
//!
//! Every step depends on the previous one; the first failure aborts the
//! sequence. The verifier lives only for the duration of this call.

use crate::auth::{
    pkce::{PkcePair, DEFAULT_VERIFIER_LENGTH},
    proxy::{AuthProxy, AuthorizationCodeRequest},
    settings::PkceSettings,
    types::{now_millis, AuthContext, AuthError, AuthResult},
};
use tracing::{debug, info};

/// Prompt value asking the provider not to show any UI
pub const PROMPT_NONE: &str = "none";

/// Response type of the authorization request
pub const RESPONSE_TYPE_CODE: &str = "code";

fn non_empty(value: String, what: &str) -> AuthResult<String> {
    if value.is_empty() {
        return Err(AuthError::InvalidResponse(format!("Empty {what} in response")));
    }
    Ok(value)
}

/// Run the full PKCE sequence and return the resulting context
pub async fn acquire(settings: &PkceSettings, proxy: &dyn AuthProxy) -> AuthResult<AuthContext> {
    info!("Starting PKCE authentication via {} proxy", proxy.name());

    let csrf = proxy.csrf_token().await?;
    let csrf_token = non_empty(csrf.csrf_token, "CSRF token")?;
    debug!("CSRF token received with {} cookies", csrf.cookies.len());

    let session = proxy
        .session_token(&settings.username, &settings.password, &csrf_token, &csrf.cookies)
        .await?;
    let session_token = non_empty(session.session_token, "session token")?;
    debug!("Session established");

    let pair = PkcePair::generate(DEFAULT_VERIFIER_LENGTH)?;

    let request = AuthorizationCodeRequest {
        client_id: settings.common.client_id.clone(),
        code_challenge: pair.challenge.clone(),
        code_challenge_method: pair.method().to_string(),
        prompt: PROMPT_NONE.to_string(),
        redirect_uri: settings.redirect_uri.clone(),
        response_type: RESPONSE_TYPE_CODE.to_string(),
        scope: settings.common.scope.clone(),
        session_token,
        timestamp: now_millis(),
    };
    let authorization = proxy.authorization_code(&request).await?;
    let code = non_empty(authorization.code, "authorization code")?;
    debug!("Authorization code received");

    let response = proxy
        .access_token(
            &settings.common.client_id,
            &code,
            &pair.verifier,
            &settings.redirect_uri,
        )
        .await?;

    let context = AuthContext::from_token_response(response, now_millis())?;
    info!("PKCE authentication completed successfully");
    Ok(context)
}
